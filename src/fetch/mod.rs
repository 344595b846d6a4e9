//! Schema document retrieval.
//!
//! A [`Fetcher`] turns a reference relative to the schema root (e.g.
//! `layers/water/mapping.yaml`) into a parsed YAML document. Fetching is
//! blocking and never retried.

mod crawl;

pub use crawl::{Schema, crawl};

use serde::de::DeserializeOwned;
use serde_yaml::Value;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to fetch {url}: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },

    #[error("Failed to fetch {url}: HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {reference}: {source}")]
    Parse {
        reference: String,
        source: serde_yaml::Error,
    },
}

pub trait Fetcher {
    /// Raw text of the document at `reference`.
    fn fetch_text(&self, reference: &str) -> Result<String, FetchError>;

    /// Parsed document with anchors, aliases and `<<` merge keys resolved.
    fn fetch(&self, reference: &str) -> Result<Value, FetchError> {
        let text = self.fetch_text(reference)?;
        parse_document(reference, &text)
    }
}

pub fn parse_document(reference: &str, text: &str) -> Result<Value, FetchError> {
    let parse_error = |source| FetchError::Parse {
        reference: reference.to_string(),
        source,
    };
    let mut value: Value = serde_yaml::from_str(text).map_err(parse_error)?;
    value.apply_merge().map_err(parse_error)?;
    Ok(value)
}

/// Fetch `reference` and map it onto `T`.
pub fn load<T: DeserializeOwned>(fetcher: &dyn Fetcher, reference: &str) -> Result<T, FetchError> {
    let value = fetcher.fetch(reference)?;
    serde_yaml::from_value(value).map_err(|source| FetchError::Parse {
        reference: reference.to_string(),
        source,
    })
}

/// Fetches documents over HTTP from a base URL.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    base: String,
}

impl HttpFetcher {
    pub fn new(base: impl Into<String>) -> Result<Self, FetchError> {
        let base = base.into();
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|source| FetchError::Http {
                url: base.clone(),
                source,
            })?;
        Ok(Self { client, base })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_text(&self, reference: &str) -> Result<String, FetchError> {
        let url = format!("{}{}", self.base, reference);
        tracing::info!("Reading {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|source| FetchError::Http {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url, status });
        }
        response
            .text()
            .map_err(|source| FetchError::Http { url, source })
    }
}

/// Reads documents from a local checkout of the schema.
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Fetcher for DirFetcher {
    fn fetch_text(&self, reference: &str) -> Result<String, FetchError> {
        let path = self.root.join(reference);
        tracing::info!("Reading {:?}", path);
        std::fs::read_to_string(&path).map_err(|source| FetchError::Io { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MappingDocument;

    #[test]
    fn merge_keys_are_resolved() {
        let text = r#"
base: &base
  type: point
  columns: []
tables:
  poi:
    <<: *base
    mapping: {amenity: [cafe]}
"#;
        let value = parse_document("mapping.yaml", text).unwrap();
        let doc: MappingDocument = serde_yaml::from_value(value).unwrap();
        assert_eq!(doc.tables["poi"].table_type, "point");
    }

    #[test]
    fn dir_fetcher_reads_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("layers/water")).unwrap();
        std::fs::write(
            dir.path().join("layers/water/mapping.yaml"),
            "tables: {}\n",
        )
        .unwrap();

        let fetcher = DirFetcher::new(dir.path());
        let doc: MappingDocument = load(&fetcher, "layers/water/mapping.yaml").unwrap();
        assert!(doc.tables.is_empty());
    }

    #[test]
    fn missing_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = DirFetcher::new(dir.path());
        assert!(matches!(
            fetcher.fetch("nope.yaml"),
            Err(FetchError::Io { .. })
        ));
    }

    #[test]
    fn invalid_yaml_is_a_parse_error() {
        assert!(matches!(
            parse_document("bad.yaml", "a: [unclosed"),
            Err(FetchError::Parse { .. })
        ));
    }
}
