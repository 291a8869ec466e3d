use crate::dates::PublishedDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a page could not be retrieved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum FetchFailure {
    /// The server answered with a non-2xx status
    #[error("server responded with status {0}")]
    Status(u16),

    /// The request did not complete within the configured timeout
    #[error("request timed out")]
    Timeout,

    /// Connection, DNS, TLS or body read failure
    #[error("transport failure: {0}")]
    Transport(String),
}

/// A page whose content contains the search term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundPage {
    /// URL of the matching page
    pub page_url: String,

    /// Host (and port) of the matching page
    pub subdomain: String,

    /// Publication date read from the page
    pub date: PublishedDate,

    /// Number of pages fetched, the matching one included
    pub pages_visited: usize,
}

/// Terminal outcome of one search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PageResult {
    /// The term was found
    Found(FoundPage),

    /// The last page was reached without a match
    NotFound { pages_visited: usize },

    /// A page could not be fetched; nothing after it was visited
    FetchError { url: String, reason: FetchFailure },

    /// The next page link pointed back to a page already visited
    CycleDetected { url: String },

    /// The configured page cap was hit before the pagination ended
    PageLimitReached { limit: usize },

    /// The caller cancelled the search before it finished
    Cancelled { url: String },
}

impl PageResult {
    pub fn is_found(&self) -> bool {
        matches!(self, PageResult::Found(_))
    }

    /// The matching page, if any
    pub fn found(&self) -> Option<&FoundPage> {
        match self {
            PageResult::Found(page) => Some(page),
            _ => None,
        }
    }
}
