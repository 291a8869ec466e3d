// Re-export modules
pub mod config;
pub mod crawlers;
pub mod dates;
pub mod parsers;
pub mod results;
pub mod session;
pub mod telegram;
pub mod utils;

// Re-export commonly used types for convenience
pub use crawlers::{Fetcher, HttpFetcher, SearchError, SearchRequest, Walker};
pub use dates::PublishedDate;
pub use results::{FetchFailure, FoundPage, PageResult};
pub use utils::extract_subdomain;

use config::SearchConfig;

/// Searches the paginated listing starting at `start_url` for `search_term`.
///
/// Input is validated before any request is made; everything that happens
/// afterwards is reported through the returned [`PageResult`].
pub async fn search(start_url: &str, search_term: &str) -> Result<PageResult, SearchError> {
    search_with_config(start_url, search_term, &SearchConfig::default()).await
}

/// Same as [`search`] with explicit timeouts and page cap
pub async fn search_with_config(
    start_url: &str,
    search_term: &str,
    config: &SearchConfig,
) -> Result<PageResult, SearchError> {
    let request = SearchRequest::new(start_url, search_term)?;
    let walker = build_walker(config)?;
    Ok(walker.search(&request).await)
}

/// Creates an HTTP-backed walker from configuration
pub fn build_walker(config: &SearchConfig) -> Result<Walker<HttpFetcher>, SearchError> {
    let fetcher =
        HttpFetcher::new(config).map_err(|e| SearchError::HttpClient(e.to_string()))?;
    Ok(Walker::with_config(fetcher, config))
}
