pub mod client;
pub mod error;
pub mod film;
pub mod parser;
pub mod scrape_engine;
pub mod sink;
pub mod watchlist;

pub use error::{Result, ScrapeError};
pub use film::FilmRecord;
pub use scrape_engine::{ConfigBuilder, FileConfig, ScrapeConfig, ScrapeEngine, ScrapeSummary};
