pub mod fetcher;
pub mod http;
pub mod walker;


pub use fetcher::Fetcher;
pub use http::HttpFetcher;
pub use walker::{SearchError, SearchRequest, Walker};
