use scraper::{ElementRef, Html, Selector};

use crate::error::{Result, ScrapeError};
use crate::film::FilmRecord;

pub const LISTING_CONTAINER: &str = "ul.film-list";
pub const POSTER: &str = "div.film-poster";
pub const NEXT_PAGE_LINK: &str = "a.paginate-next";

pub const ATTR_SLUG: &str = "data-film-slug";
pub const ATTR_ID: &str = "data-film-id";
pub const ATTR_NAME: &str = "data-film-name";
pub const ATTR_YEAR: &str = "data-film-release-year";

/// One listing page worth of data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchlistPage {
    /// Film slugs in document order
    pub films: Vec<String>,
    /// Path of the next listing page, if the page links to one
    pub next: Option<String>,
}

/// Pre-parsed selectors for the structural classes the site uses.
#[derive(Debug, Clone)]
pub struct Selectors {
    listing: Selector,
    poster: Selector,
    next_page: Selector,
}

impl Selectors {
    pub fn new() -> Result<Self> {
        Ok(Self {
            listing: parse_selector(LISTING_CONTAINER)?,
            poster: parse_selector(POSTER)?,
            next_page: parse_selector(NEXT_PAGE_LINK)?,
        })
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ScrapeError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Parse a watchlist page.
///
/// Returns `Ok(None)` when the listing container is missing, which ends
/// pagination. `page` is only used for error messages.
pub fn parse_watchlist_page(
    html: &str,
    page: &str,
    selectors: &Selectors,
) -> Result<Option<WatchlistPage>> {
    let document = Html::parse_document(html);

    let Some(container) = document.select(&selectors.listing).next() else {
        return Ok(None);
    };

    let films = container
        .select(&selectors.poster)
        .filter_map(|poster| poster.value().attr(ATTR_SLUG))
        .map(str::to_string)
        .collect();

    let next = match document.select(&selectors.next_page).next() {
        Some(link) => match link.value().attr("href") {
            Some(href) => Some(href.to_string()),
            None => {
                return Err(ScrapeError::MissingHref {
                    page: page.to_string(),
                });
            }
        },
        None => None,
    };

    Ok(Some(WatchlistPage { films, next }))
}

/// Parse a film detail page into a record.
///
/// `slug` is stored verbatim as the record's URL; the page's own
/// `data-film-link` attribute is ignored.
pub fn parse_film_page(html: &str, slug: &str, selectors: &Selectors) -> Option<FilmRecord> {
    let document = Html::parse_document(html);
    let poster = document.select(&selectors.poster).next()?;

    Some(FilmRecord {
        id: attr(&poster, ATTR_ID),
        name: attr(&poster, ATTR_NAME),
        year: attr(&poster, ATTR_YEAR),
        letterboxd_url: slug.to_string(),
    })
}

fn attr(element: &ElementRef<'_>, name: &str) -> Option<String> {
    element.value().attr(name).map(str::to_string)
}
