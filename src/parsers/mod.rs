pub mod html;


pub use html::Document;

/// Tags whose text is searched, in document order
pub const CONTENT_TAGS: &str = "article, div, p";

/// Element carrying the page's publication date
pub const DATE_MARKER: &str = "span.post-date";

/// Pagination link of the page currently displayed
pub const ACTIVE_PAGE_MARKER: &str = "a.active";
