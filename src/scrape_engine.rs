use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::client::PageClient;
use crate::error::{Result, ScrapeError};
use crate::film;
use crate::parser::Selectors;
use crate::sink::CsvSink;
use crate::watchlist::{self, Paginator};

pub const DEFAULT_BASE_URL: &str = "https://letterboxd.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeConfig {
    pub user: String,
    pub output_path: PathBuf,
    pub base_url: String,
    pub max_pages: Option<usize>,
    pub timeout: Option<Duration>,
    pub user_agent: String,
    pub dedupe: bool,
}

impl ScrapeConfig {
    /// First listing page for the configured user.
    pub fn entry_path(&self) -> String {
        format!("/{}/watchlist", self.user)
    }
}

/// Default output location for a user's watchlist export.
pub fn default_output_path(user: &str) -> PathBuf {
    PathBuf::from("data").join(format!("{}_watchlist.csv", user))
}

/// Settings accepted from a TOML config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub user: Option<String>,
    pub output_path: Option<PathBuf>,
    pub base_url: Option<String>,
    pub max_pages: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    pub dedupe: Option<bool>,
}

impl FileConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents, path)
    }

    pub fn parse(contents: &str, path: &Path) -> Result<Self> {
        toml::from_str(contents).map_err(|source| ScrapeError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Builds a `ScrapeConfig`. Later calls override earlier ones, so apply
/// the config file first and command-line values after it.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    user: Option<String>,
    output_path: Option<PathBuf>,
    base_url: Option<String>,
    max_pages: Option<usize>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    dedupe: Option<bool>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, file: FileConfig) -> Self {
        self.user = file.user.or(self.user);
        self.output_path = file.output_path.or(self.output_path);
        self.base_url = file.base_url.or(self.base_url);
        self.max_pages = file.max_pages.or(self.max_pages);
        self.timeout = file.timeout_secs.map(Duration::from_secs).or(self.timeout);
        self.user_agent = file.user_agent.or(self.user_agent);
        self.dedupe = file.dedupe.or(self.dedupe);
        self
    }

    pub fn user(mut self, user: Option<String>) -> Self {
        if user.is_some() {
            self.user = user;
        }
        self
    }

    pub fn output_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.output_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    pub fn base_url(mut self, base_url: Option<String>) -> Self {
        if base_url.is_some() {
            self.base_url = base_url;
        }
        self
    }

    pub fn max_pages(mut self, max_pages: Option<usize>) -> Self {
        if max_pages.is_some() {
            self.max_pages = max_pages;
        }
        self
    }

    pub fn timeout_secs(mut self, secs: Option<u64>) -> Self {
        if let Some(secs) = secs {
            self.timeout = Some(Duration::from_secs(secs));
        }
        self
    }

    pub fn user_agent(mut self, user_agent: Option<String>) -> Self {
        if user_agent.is_some() {
            self.user_agent = user_agent;
        }
        self
    }

    /// `None` leaves the file's value alone.
    pub fn dedupe(mut self, dedupe: Option<bool>) -> Self {
        if dedupe.is_some() {
            self.dedupe = dedupe;
        }
        self
    }

    pub fn build(self) -> Result<ScrapeConfig> {
        let user = self
            .user
            .map(|u| u.trim().trim_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ScrapeError::Config("a watchlist user is required".to_string()))?;

        if user.contains('/') {
            return Err(ScrapeError::Config(format!("invalid user name: {}", user)));
        }

        if self.max_pages == Some(0) {
            return Err(ScrapeError::Config("max_pages must be at least 1".to_string()));
        }

        if self.timeout == Some(Duration::ZERO) {
            return Err(ScrapeError::Config("timeout_secs must be at least 1".to_string()));
        }

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ScrapeError::Config(format!(
                "base URL must start with http:// or https://: {}",
                base_url
            )));
        }

        let output_path = self
            .output_path
            .unwrap_or_else(|| default_output_path(&user));

        Ok(ScrapeConfig {
            user,
            output_path,
            base_url,
            max_pages: self.max_pages,
            timeout: self.timeout,
            user_agent: self
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            dedupe: self.dedupe.unwrap_or(false),
        })
    }
}

/// Counters for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub pages: usize,
    pub films_found: usize,
    pub records_written: usize,
    pub skipped: usize,
}

#[derive(Debug)]
pub struct ScrapeEngine {
    config: ScrapeConfig,
    client: PageClient,
    selectors: Selectors,
}

impl ScrapeEngine {
    pub fn new(config: ScrapeConfig) -> Result<Self> {
        let client = PageClient::new(&config.base_url, &config.user_agent, config.timeout)?;
        let selectors = Selectors::new()?;

        Ok(Self {
            config,
            client,
            selectors,
        })
    }

    /// Walk every listing page and return the film slugs in order.
    ///
    /// Returns the slugs and the number of pages fetched.
    pub async fn collect_films(&self) -> Result<(Vec<String>, usize)> {
        let mut paginator = Paginator::new(
            &self.client,
            &self.selectors,
            self.config.entry_path(),
            self.config.max_pages,
        );

        let mut films = Vec::new();
        while let Some(batch) = paginator.next_page().await? {
            films.extend(batch);
        }

        if self.config.dedupe {
            films = watchlist::dedupe(films);
        }

        Ok((films, paginator.pages_fetched()))
    }

    /// Fetch each film and write a row for every page with a poster.
    ///
    /// Returns `(written, skipped)`.
    pub async fn export_films<W: std::io::Write>(
        &self,
        films: &[String],
        sink: &mut CsvSink<W>,
    ) -> Result<(usize, usize)> {
        let mut skipped = 0;

        for slug in films {
            match film::fetch_film(&self.client, &self.selectors, slug).await? {
                Some(record) => sink.write(&record)?,
                None => skipped += 1,
            }
        }

        Ok((sink.rows(), skipped))
    }

    /// Run both stages. The output file is only created once every slug has
    /// been collected.
    pub async fn run(&self) -> Result<ScrapeSummary> {
        let (films, pages) = self.collect_films().await?;
        info!(
            pages,
            films = films.len(),
            "collected watchlist, writing {}",
            self.config.output_path.display()
        );

        let mut sink = CsvSink::create(&self.config.output_path)?;
        let (records_written, skipped) = self.export_films(&films, &mut sink).await?;

        Ok(ScrapeSummary {
            pages,
            films_found: films.len(),
            records_written,
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder_defaults() {
        let config = ConfigBuilder::new()
            .user(Some("pzingg".to_string()))
            .build()
            .unwrap();

        assert_eq!(config.entry_path(), "/pzingg/watchlist");
        assert_eq!(config.output_path, PathBuf::from("data/pzingg_watchlist.csv"));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.max_pages, None);
        assert_eq!(config.timeout, None);
        assert!(!config.dedupe);
    }

    #[test]
    fn test_config_builder_requires_user() {
        let err = ConfigBuilder::new().build().unwrap_err();
        assert!(matches!(err, ScrapeError::Config(_)));

        let err = ConfigBuilder::new().user(Some("  ".to_string())).build().unwrap_err();
        assert!(matches!(err, ScrapeError::Config(_)));
    }

    #[test]
    fn test_config_builder_rejects_bad_values() {
        let user = || Some("someone".to_string());

        assert!(ConfigBuilder::new().user(user()).max_pages(Some(0)).build().is_err());
        assert!(
            ConfigBuilder::new()
                .user(user())
                .base_url(Some("letterboxd.com".to_string()))
                .build()
                .is_err()
        );
        assert!(ConfigBuilder::new().user(Some("a/b".to_string())).build().is_err());
    }

    #[test]
    fn test_command_line_overrides_file() {
        let file = FileConfig::parse(
            r#"
            user = "from-file"
            base_url = "http://localhost:8080/"
            max_pages = 3
            timeout_secs = 10
            dedupe = true
            "#,
            Path::new("lb.toml"),
        )
        .unwrap();

        let config = ConfigBuilder::new()
            .file(file)
            .user(Some("from-cli".to_string()))
            .output_path(Some("out.csv"))
            .max_pages(None)
            .dedupe(None)
            .build()
            .unwrap();

        assert_eq!(config.user, "from-cli");
        assert_eq!(config.output_path, PathBuf::from("out.csv"));
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.max_pages, Some(3));
        assert_eq!(config.timeout, Some(Duration::from_secs(10)));
        assert!(config.dedupe);
    }

    #[test]
    fn test_command_line_can_turn_off_file_dedupe() {
        let file = FileConfig::parse("dedupe = true", Path::new("lb.toml")).unwrap();

        let config = ConfigBuilder::new()
            .file(file)
            .user(Some("someone".to_string()))
            .dedupe(Some(false))
            .build()
            .unwrap();
        assert!(!config.dedupe);

        let config = ConfigBuilder::new()
            .user(Some("someone".to_string()))
            .dedupe(Some(true))
            .build()
            .unwrap();
        assert!(config.dedupe);
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let err = ConfigBuilder::new()
            .user(Some("someone".to_string()))
            .timeout_secs(Some(0))
            .build()
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Config(_)));

        let file = FileConfig::parse("timeout_secs = 0", Path::new("lb.toml")).unwrap();
        let err = ConfigBuilder::new()
            .file(file)
            .user(Some("someone".to_string()))
            .build()
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Config(_)));
    }

    #[test]
    fn test_unknown_config_key_is_rejected() {
        let err = FileConfig::parse("usr = \"typo\"", Path::new("lb.toml")).unwrap_err();
        assert!(matches!(err, ScrapeError::ConfigFile { .. }));
    }
}
