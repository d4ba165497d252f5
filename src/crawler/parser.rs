//! HTML parser for extracting listings from a result page
//!
//! All knowledge of the result-page template lives here. A template change
//! should only ever require edits to this module.
//!
//! # Template
//!
//! ```html
//! <div class="search-results organic">
//!   <div class="result">
//!     <a class="business-name" href="/biz/a-pools"><span>A Pools</span></a>
//!     <a class="track-visit-website" href="https://apools.example">Website</a>
//!     <div class="phones phone primary">(555) 123-4567</div>
//!     <div class="categories"><a>Pool Service</a><a>Spas</a></div>
//!   </div>
//!   <div class="result ad">...</div>
//! </div>
//! <div class="pagination"><a class="next" href="?page=2">Next</a></div>
//! ```

use crate::record::RawListing;
use scraper::{ElementRef, Html, Selector};

/// Selectors for one parse, compiled up front
struct ListingSelectors {
    result: Selector,
    name: Selector,
    website: Selector,
    phone: Selector,
    categories: Selector,
    category_tag: Selector,
    next_page: Selector,
}

impl ListingSelectors {
    fn build() -> Option<Self> {
        Some(Self {
            result: Selector::parse("div.result").ok()?,
            name: Selector::parse("a.business-name").ok()?,
            website: Selector::parse("a.track-visit-website[href]").ok()?,
            phone: Selector::parse("div.phones").ok()?,
            categories: Selector::parse("div.categories").ok()?,
            category_tag: Selector::parse("a").ok()?,
            next_page: Selector::parse("div.pagination a.next").ok()?,
        })
    }
}

/// What one result page holds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultPage {
    /// Organic listings in document order
    pub listings: Vec<RawListing>,

    /// Whether the page links to a following page
    pub has_next: bool,
}

/// Extracts every organic listing on a result page, plus the next-page signal
///
/// A page without any listing container (end of results, or a template we
/// no longer recognise) yields no listings; this is never an error.
/// Sponsored results (`ad` / `advertisement` class) are skipped.
///
/// # Example
///
/// ```
/// use listing_sweep::crawler::parse_result_page;
///
/// let html = r#"<div class="result"><a class="business-name">A Pools</a></div>"#;
/// let page = parse_result_page(html);
/// assert_eq!(page.listings.len(), 1);
/// assert_eq!(page.listings[0].name.as_deref(), Some("A Pools"));
/// assert!(!page.has_next);
/// ```
pub fn parse_result_page(html: &str) -> ResultPage {
    let Some(selectors) = ListingSelectors::build() else {
        return ResultPage::default();
    };

    let document = Html::parse_document(html);

    let listings = document
        .select(&selectors.result)
        .filter(|result| !is_advertisement(result))
        .map(|result| extract_listing(&result, &selectors))
        .collect();

    let has_next = document.select(&selectors.next_page).next().is_some();

    ResultPage { listings, has_next }
}

/// Returns true for sponsored result blocks
fn is_advertisement(result: &ElementRef) -> bool {
    result
        .value()
        .classes()
        .any(|class| class == "ad" || class == "advertisement")
}

/// Maps one listing container to a candidate record
fn extract_listing(result: &ElementRef, selectors: &ListingSelectors) -> RawListing {
    let name = result.select(&selectors.name).next().map(|el| element_text(&el));

    let website = result
        .select(&selectors.website)
        .next()
        .and_then(|el| el.value().attr("href"))
        .map(str::to_string);

    let phone = result.select(&selectors.phone).next().map(|el| element_text(&el));

    let categories = result
        .select(&selectors.categories)
        .next()
        .map(|container| extract_categories(&container, selectors))
        .unwrap_or_default();

    RawListing {
        name,
        website,
        phone,
        categories,
    }
}

/// Collects category tags in document order
///
/// Some listings render categories as plain text rather than links; the
/// container text is then taken as a single tag.
fn extract_categories(container: &ElementRef, selectors: &ListingSelectors) -> Vec<String> {
    let tags: Vec<String> = container
        .select(&selectors.category_tag)
        .map(|tag| element_text(&tag))
        .collect();

    if !tags.is_empty() {
        return tags;
    }

    let text = element_text(container);
    if text.is_empty() {
        Vec::new()
    } else {
        vec![text]
    }
}

/// Text content with runs of whitespace collapsed to single spaces
fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
