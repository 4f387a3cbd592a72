use tracing::{info, warn};

use crate::client::PageClient;
use crate::error::Result;
use crate::parser::{self, Selectors};

/// Walks a watchlist one listing page at a time.
///
/// There is no revisit detection: a next-page chain that loops back on
/// itself is followed until `max_pages` is reached, or forever if unset.
pub struct Paginator<'a> {
    client: &'a PageClient,
    selectors: &'a Selectors,
    next_path: Option<String>,
    max_pages: Option<usize>,
    pages_fetched: usize,
}

impl<'a> Paginator<'a> {
    pub fn new(
        client: &'a PageClient,
        selectors: &'a Selectors,
        entry_path: impl Into<String>,
        max_pages: Option<usize>,
    ) -> Self {
        Self {
            client,
            selectors,
            next_path: Some(entry_path.into()),
            max_pages,
            pages_fetched: 0,
        }
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Fetch the next listing page and return its slugs.
    ///
    /// `Ok(None)` means the listing is exhausted; every later call also
    /// returns `Ok(None)` without touching the network.
    pub async fn next_page(&mut self) -> Result<Option<Vec<String>>> {
        let Some(path) = self.next_path.take() else {
            return Ok(None);
        };

        if let Some(max) = self.max_pages {
            if self.pages_fetched >= max {
                warn!(max_pages = max, next = %path, "page limit reached, stopping pagination");
                return Ok(None);
            }
        }

        info!("watchlist {}", path);
        let html = self.client.fetch(&path).await?;
        self.pages_fetched += 1;

        match parser::parse_watchlist_page(&html, &path, self.selectors)? {
            Some(page) => {
                self.next_path = page.next;
                Ok(Some(page.films))
            }
            None => Ok(None),
        }
    }
}

/// Remove repeated slugs while preserving first-seen order.
pub fn dedupe(films: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    films
        .into_iter()
        .filter(|film| seen.insert(film.clone()))
        .collect()
}
