//! Chat-side handling: classifying incoming text, remembering each chat's link
//! and turning search outcomes into replies.

use crate::crawlers::{SearchError, SearchRequest};
use crate::results::PageResult;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const GREETING: &str =
    "Hello! Send me a link and a word to search for across pages on that site.";
pub const LINK_RECEIVED: &str = "Thanks for receiving the link! Now send me a word to search for on that page and its subsequent pages.";
pub const LINK_REQUIRED: &str = "Please send a link first.";
pub const NOT_FOUND: &str = "Reached the last page. The word was not found.";

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"]+"#).expect("URL pattern is valid"));

/// Identifier of a conversation (a Telegram chat id, or 0 on the command line)
pub type ChatId = i64;

/// What a user message asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Help,
    Cancel,
    UnknownCommand(String),
    Link(String),
    Word(String),
}

/// Strips a `@botname` suffix from a command, keeping any arguments
pub fn normalize_command(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with('/') {
        return trimmed.to_string();
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or("").trim();

    let command = command
        .split_once('@')
        .map(|(base, _)| base)
        .unwrap_or(command);

    if rest.is_empty() {
        command.to_string()
    } else {
        format!("{} {}", command, rest)
    }
}

/// Sorts a message into a command, a link or a search word
pub fn classify(text: &str) -> Incoming {
    let text = normalize_command(text);

    if text.starts_with('/') {
        let command = text.split_whitespace().next().unwrap_or_default();
        return match command {
            "/start" | "/help" => Incoming::Help,
            "/cancel" => Incoming::Cancel,
            _ => Incoming::UnknownCommand(command.to_string()),
        };
    }

    if let Some(found) = URL_PATTERN.find(&text) {
        let link = found.as_str().trim_end_matches(['.', ',', ';', ')']);
        return Incoming::Link(link.to_string());
    }

    Incoming::Word(text)
}

/// A search started for a chat
struct Running {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Running {
    fn is_active(&self) -> bool {
        !self.cancel.is_cancelled() && self.task.as_ref().is_none_or(|task| !task.is_finished())
    }
}

/// State kept for one chat between messages
#[derive(Default)]
struct Session {
    last_link: Option<String>,
    running: Option<Running>,
}

impl Session {
    /// Cancels the running search, returning whether one was still active
    fn cancel_running(&mut self) -> bool {
        match self.running.take() {
            Some(running) => {
                let active = running.is_active();
                running.cancel.cancel();
                active
            }
            None => false,
        }
    }
}

/// What the front end should do in response to a message
#[derive(Debug)]
pub enum Action {
    /// Send this text back
    Reply(String),
    /// Run this search, honouring `cancel`, and reply with [`render`]
    Search {
        request: SearchRequest,
        cancel: CancellationToken,
    },
}

/// Per-chat sessions; each chat has its own link and its own running search
#[derive(Default)]
pub struct Sessions {
    sessions: HashMap<ChatId, Session>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// The link most recently sent in `chat`
    pub fn last_link(&self, chat: ChatId) -> Option<&str> {
        self.sessions.get(&chat)?.last_link.as_deref()
    }

    /// Whether `chat` has a search that has neither finished nor been cancelled
    pub fn is_searching(&self, chat: ChatId) -> bool {
        self.sessions
            .get(&chat)
            .and_then(|session| session.running.as_ref())
            .is_some_and(Running::is_active)
    }

    /// Decides how to answer one message from `chat`
    pub fn handle(&mut self, chat: ChatId, text: &str) -> Action {
        let session = self.sessions.entry(chat).or_default();

        match classify(text) {
            Incoming::Help => Action::Reply(GREETING.to_string()),
            Incoming::UnknownCommand(command) => {
                Action::Reply(format!("Unknown command {}. Use /help", command))
            }
            Incoming::Cancel => {
                if session.cancel_running() {
                    Action::Reply("Search cancelled.".to_string())
                } else {
                    Action::Reply("No search is running.".to_string())
                }
            }
            Incoming::Link(link) => {
                session.cancel_running();
                ::log::info!("Chat {} set link {}", chat, link);
                session.last_link = Some(link);
                Action::Reply(LINK_RECEIVED.to_string())
            }
            Incoming::Word(word) => {
                let Some(link) = session.last_link.as_deref() else {
                    return Action::Reply(LINK_REQUIRED.to_string());
                };

                match SearchRequest::new(link, &word) {
                    Ok(request) => {
                        session.cancel_running();
                        let cancel = CancellationToken::new();
                        session.running = Some(Running {
                            cancel: cancel.clone(),
                            task: None,
                        });
                        Action::Search { request, cancel }
                    }
                    Err(e) => Action::Reply(usage(&e)),
                }
            }
        }
    }

    /// Attaches the task running the chat's current search
    pub fn track(&mut self, chat: ChatId, task: JoinHandle<()>) {
        if let Some(running) = self
            .sessions
            .get_mut(&chat)
            .and_then(|session| session.running.as_mut())
        {
            running.task = Some(task);
        }
    }
}

/// Reply for input rejected before searching
pub fn usage(error: &SearchError) -> String {
    format!(
        "Cannot search: {}. Send a link starting with http:// or https://, then a word to look for.",
        error
    )
}

/// Reply describing the outcome of a search for `word`
pub fn render(word: &str, result: &PageResult) -> String {
    match result {
        PageResult::Found(found) => format!(
            "The word \"{}\" was found on this page: {}\nSubdomain: {}\nDate: {}",
            word, found.page_url, found.subdomain, found.date
        ),
        PageResult::NotFound { .. } => NOT_FOUND.to_string(),
        PageResult::FetchError { url, reason } => {
            format!("Failed to fetch the page: {} ({})", url, reason)
        }
        PageResult::CycleDetected { url } => format!(
            "The pagination loops back to {}. The word was not found.",
            url
        ),
        PageResult::PageLimitReached { limit } => {
            format!("Stopped after {} pages. The word was not found.", limit)
        }
        PageResult::Cancelled { .. } => "Search cancelled.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::PublishedDate;
    use crate::results::{FetchFailure, FoundPage};
    use chrono::NaiveDate;

    #[test]
    fn test_normalize_command() {
        assert_eq!(normalize_command("/start@seek_page_bot"), "/start");
        assert_eq!(normalize_command("/cancel@seek_page_bot now"), "/cancel now");
        assert_eq!(normalize_command("  hello "), "hello");
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("/start"), Incoming::Help);
        assert_eq!(classify("/help@bot"), Incoming::Help);
        assert_eq!(classify("/cancel"), Incoming::Cancel);
        assert_eq!(
            classify("/frobnicate"),
            Incoming::UnknownCommand("/frobnicate".to_string())
        );
        assert_eq!(
            classify("look at https://news.example.com/list?page=1."),
            Incoming::Link("https://news.example.com/list?page=1".to_string())
        );
        assert_eq!(classify("  Tehran  "), Incoming::Word("Tehran".to_string()));
        assert_eq!(classify("تهران"), Incoming::Word("تهران".to_string()));
    }

    #[test]
    fn test_word_before_link() {
        let mut sessions = Sessions::new();
        match sessions.handle(1, "election") {
            Action::Reply(text) => assert_eq!(text, LINK_REQUIRED),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_link_then_word_starts_search() {
        let mut sessions = Sessions::new();
        assert!(matches!(
            sessions.handle(1, "https://news.example.com/list"),
            Action::Reply(ref text) if text == LINK_RECEIVED
        ));
        assert_eq!(sessions.last_link(1), Some("https://news.example.com/list"));

        match sessions.handle(1, "election") {
            Action::Search { request, cancel } => {
                assert_eq!(request.start_url().as_str(), "https://news.example.com/list");
                assert_eq!(request.search_term(), "election");
                assert!(!cancel.is_cancelled());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(sessions.is_searching(1));
    }

    #[test]
    fn test_sessions_are_independent() {
        let mut sessions = Sessions::new();
        sessions.handle(1, "https://a.example.com/");
        sessions.handle(2, "https://b.example.com/");

        assert_eq!(sessions.last_link(1), Some("https://a.example.com/"));
        assert_eq!(sessions.last_link(2), Some("https://b.example.com/"));
        assert_eq!(sessions.last_link(3), None);

        let Action::Search { request, .. } = sessions.handle(2, "word") else {
            panic!("expected a search");
        };
        assert_eq!(request.start_url().host_str(), Some("b.example.com"));
        assert!(!sessions.is_searching(1));
    }

    #[test]
    fn test_new_word_cancels_previous_search() {
        let mut sessions = Sessions::new();
        sessions.handle(1, "https://news.example.com/");
        let Action::Search { cancel: first, .. } = sessions.handle(1, "one") else {
            panic!("expected a search");
        };
        let Action::Search { cancel: second, .. } = sessions.handle(1, "two") else {
            panic!("expected a search");
        };

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
    }

    #[test]
    fn test_cancel_command() {
        let mut sessions = Sessions::new();
        assert!(matches!(
            sessions.handle(1, "/cancel"),
            Action::Reply(ref text) if text == "No search is running."
        ));

        sessions.handle(1, "https://news.example.com/");
        let Action::Search { cancel, .. } = sessions.handle(1, "word") else {
            panic!("expected a search");
        };
        assert!(matches!(
            sessions.handle(1, "/cancel"),
            Action::Reply(ref text) if text == "Search cancelled."
        ));
        assert!(cancel.is_cancelled());
        assert!(!sessions.is_searching(1));
    }

    #[test]
    fn test_new_link_cancels_running_search() {
        let mut sessions = Sessions::new();
        sessions.handle(1, "https://news.example.com/");
        let Action::Search { cancel, .. } = sessions.handle(1, "word") else {
            panic!("expected a search");
        };
        sessions.handle(1, "https://other.example.com/");
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_finished_task_is_not_running() {
        let mut sessions = Sessions::new();
        sessions.handle(1, "https://news.example.com/");
        let Action::Search { .. } = sessions.handle(1, "word") else {
            panic!("expected a search");
        };

        let task = tokio::spawn(async {});
        tokio::task::yield_now().await;
        while !task.is_finished() {
            tokio::task::yield_now().await;
        }
        sessions.track(1, task);

        assert!(!sessions.is_searching(1));
    }

    #[test]
    fn test_render() {
        let found = PageResult::Found(FoundPage {
            page_url: "https://news.example.com/list?page=3".to_string(),
            subdomain: "news.example.com".to_string(),
            date: PublishedDate::Gregorian(NaiveDate::from_ymd_opt(2023, 7, 25).unwrap()),
            pages_visited: 3,
        });
        assert_eq!(
            render("election", &found),
            "The word \"election\" was found on this page: https://news.example.com/list?page=3\nSubdomain: news.example.com\nDate: 2023-07-25"
        );

        assert_eq!(
            render("election", &PageResult::NotFound { pages_visited: 2 }),
            NOT_FOUND
        );

        let failed = PageResult::FetchError {
            url: "https://news.example.com/list?page=2".to_string(),
            reason: FetchFailure::Status(503),
        };
        assert_eq!(
            render("election", &failed),
            "Failed to fetch the page: https://news.example.com/list?page=2 (server responded with status 503)"
        );
    }

    #[test]
    fn test_usage_message_names_the_problem() {
        let message = usage(&SearchError::EmptySearchTerm);
        assert!(message.contains("the search term is empty"));
    }
}
