use crate::results::FetchFailure;
use async_trait::async_trait;
use url::Url;

/// Source of raw page bodies for the walker
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieves `url` with a single GET and returns the body of a 2xx response.
    ///
    /// Implementations must not retry: the walker treats any error as the end
    /// of the search.
    async fn fetch(&self, url: &Url) -> Result<String, FetchFailure>;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for std::sync::Arc<F> {
    async fn fetch(&self, url: &Url) -> Result<String, FetchFailure> {
        (**self).fetch(url).await
    }
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for &F {
    async fn fetch(&self, url: &Url) -> Result<String, FetchFailure> {
        (**self).fetch(url).await
    }
}
