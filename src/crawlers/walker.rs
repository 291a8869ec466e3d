use crate::config::SearchConfig;
use crate::crawlers::Fetcher;
use crate::dates::{self, PublishedDate};
use crate::parsers::Document;
use crate::results::{FoundPage, PageResult};
use crate::utils::{extract_subdomain, normalize_url, resolve_link};
use std::collections::HashSet;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Input rejected before any page is requested
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("the search term is empty")]
    EmptySearchTerm,

    #[error("{url:?} is not a valid absolute URL: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unsupported URL scheme {0:?}, expected http or https")]
    UnsupportedScheme(String),

    #[error("cannot create HTTP client: {0}")]
    HttpClient(String),
}

/// A validated search: where to start and what to look for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    start_url: Url,
    search_term: String,
}

impl SearchRequest {
    /// Validates the start URL and the term; surrounding whitespace of the term is dropped
    pub fn new(start_url: &str, search_term: &str) -> Result<Self, SearchError> {
        let search_term = search_term.trim();
        if search_term.is_empty() {
            return Err(SearchError::EmptySearchTerm);
        }

        let raw_url = start_url.trim();
        let start_url = Url::parse(raw_url).map_err(|e| SearchError::InvalidUrl {
            url: raw_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(start_url.scheme(), "http" | "https") {
            return Err(SearchError::UnsupportedScheme(start_url.scheme().to_string()));
        }

        Ok(Self {
            start_url,
            search_term: search_term.to_string(),
        })
    }

    pub fn start_url(&self) -> &Url {
        &self.start_url
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Lower-cased term used for matching
    fn needle(&self) -> String {
        self.search_term.to_lowercase()
    }
}

/// What one page told the walker to do next
enum PageStep {
    Matched(PublishedDate),
    Next(Option<Url>),
}

/// Walks a paginated listing until a page contains the search term.
///
/// The walker keeps no state between searches; every call to [`Walker::search`]
/// owns its current URL and visited set, so one walker can serve many concurrent
/// searches.
#[derive(Debug, Clone)]
pub struct Walker<F> {
    fetcher: F,
    max_pages: usize,
}

impl<F: Fetcher> Walker<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            max_pages: SearchConfig::default().max_pages,
        }
    }

    /// Builds a walker honouring the page cap of `config`
    pub fn with_config(fetcher: F, config: &SearchConfig) -> Self {
        Self::new(fetcher).with_max_pages(config.max_pages)
    }

    /// Caps the number of pages a single search may fetch
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Runs a search to completion
    pub async fn search(&self, request: &SearchRequest) -> PageResult {
        self.search_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Runs a search that stops early once `cancel` fires.
    ///
    /// Cancellation is observed before every page and interrupts a request in flight.
    pub async fn search_with_cancel(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> PageResult {
        let needle = request.needle();
        let mut current = request.start_url().clone();
        let mut visited = HashSet::from([normalize_url(&current)]);
        let mut pages_visited = 0;

        ::log::info!(
            "Searching for {:?} starting at {}",
            request.search_term(),
            current
        );

        loop {
            if cancel.is_cancelled() {
                ::log::info!("Search cancelled before {}", current);
                return PageResult::Cancelled {
                    url: current.to_string(),
                };
            }

            if pages_visited >= self.max_pages {
                ::log::warn!("Page limit of {} reached at {}", self.max_pages, current);
                return PageResult::PageLimitReached {
                    limit: self.max_pages,
                };
            }

            ::log::info!("Fetching page {}: {}", pages_visited + 1, current);
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    ::log::info!("Search cancelled while fetching {}", current);
                    return PageResult::Cancelled { url: current.to_string() };
                }
                fetched = self.fetcher.fetch(&current) => fetched,
            };
            pages_visited += 1;

            let body = match fetched {
                Ok(body) => body,
                Err(reason) => {
                    ::log::error!("Failed to fetch {}: {}", current, reason);
                    return PageResult::FetchError {
                        url: current.to_string(),
                        reason,
                    };
                }
            };

            match inspect_page(&body, &current, &needle) {
                PageStep::Matched(date) => {
                    ::log::info!("Found {:?} on {}", request.search_term(), current);
                    return PageResult::Found(FoundPage {
                        subdomain: extract_subdomain(current.as_str()),
                        page_url: current.to_string(),
                        date,
                        pages_visited,
                    });
                }
                PageStep::Next(Some(next)) => {
                    if !visited.insert(normalize_url(&next)) {
                        ::log::warn!("Pagination of {} loops back to {}", current, next);
                        return PageResult::CycleDetected {
                            url: next.to_string(),
                        };
                    }
                    ::log::debug!("Next page: {}", next);
                    current = next;
                }
                PageStep::Next(None) => {
                    ::log::info!("Reached the last page after {} pages", pages_visited);
                    return PageResult::NotFound { pages_visited };
                }
            }
        }
    }
}

/// Parses a fetched page and decides between a match and the next page.
///
/// The document never outlives this call, so it is not held across an await.
fn inspect_page(body: &str, page_url: &Url, needle: &str) -> PageStep {
    let doc = Document::parse(body);

    if contains_term(&doc, needle) {
        let raw_date = dates::extract_date(&doc);
        return PageStep::Matched(dates::to_gregorian(raw_date.as_deref()));
    }

    PageStep::Next(
        doc.next_page_href()
            .and_then(|href| resolve_link(page_url, &href)),
    )
}

/// Case-insensitive substring test over the document's content blocks, first match wins
pub fn contains_term(doc: &Document, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    doc.content_blocks().any(|block| {
        let text = block.to_lowercase();
        if ::log::log_enabled!(::log::Level::Trace) {
            let snippet: String = text.chars().take(100).collect();
            ::log::trace!("Searching content: {}", snippet);
        }
        text.contains(&needle)
    })
}
