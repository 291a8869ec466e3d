use crate::parsers::{ACTIVE_PAGE_MARKER, CONTENT_TAGS, DATE_MARKER};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static CONTENT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(CONTENT_TAGS).expect("content selector is valid"));
static DATE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(DATE_MARKER).expect("date selector is valid"));
static ACTIVE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(ACTIVE_PAGE_MARKER).expect("pagination selector is valid"));

/// A parsed HTML page that can be queried for content, its date and its pagination.
///
/// The underlying tree is not `Send`; documents are built, queried and dropped
/// within a single step of the walker.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses a full HTML document; malformed markup is repaired, never rejected
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    /// Trimmed text of every content block (`article`, `div`, `p`) in document order.
    ///
    /// Nested blocks are yielded separately, so the text of an inner paragraph
    /// also appears inside the text of its enclosing container.
    pub fn content_blocks(&self) -> impl Iterator<Item = String> + '_ {
        self.html
            .select(&CONTENT_SELECTOR)
            .map(|block| element_text(&block))
    }

    /// Trimmed text of the first post date marker
    pub fn date_marker_text(&self) -> Option<String> {
        self.html
            .select(&DATE_SELECTOR)
            .next()
            .map(|marker| element_text(&marker))
    }

    /// Raw `href` of the first link that follows the active pagination marker.
    ///
    /// The link is looked up in document order, not among siblings. If the first
    /// following link has no `href` there is no next page.
    pub fn next_page_href(&self) -> Option<String> {
        let active = self.html.select(&ACTIVE_SELECTOR).next()?;
        let active_id = active.id();

        let next_link = self
            .html
            .tree
            .root()
            .descendants()
            .skip_while(|node| node.id() != active_id)
            .skip(1)
            .filter_map(ElementRef::wrap)
            .find(|element| element.value().name() == "a")?;

        let href = next_link.value().attr("href");
        ::log::debug!("Link after active page marker: {:?}", href);
        href.map(str::to_string)
    }
}

/// Concatenated text of an element and its descendants with outer whitespace removed
fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}
