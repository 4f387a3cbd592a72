use serde::Serialize;
use tracing::{debug, info};

use crate::client::PageClient;
use crate::error::Result;
use crate::parser::{self, Selectors};

/// One output row. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilmRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub year: Option<String>,
    pub letterboxd_url: String,
}

/// Fetch a film page. `Ok(None)` means the page had no poster element.
pub async fn fetch_film(
    client: &PageClient,
    selectors: &Selectors,
    slug: &str,
) -> Result<Option<FilmRecord>> {
    info!("film {}", slug);
    let html = client.fetch(slug).await?;

    let record = parser::parse_film_page(&html, slug, selectors);
    if record.is_none() {
        debug!(slug, "no poster element, skipping");
    }
    Ok(record)
}
