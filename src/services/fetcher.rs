use crate::error::{Result, SyllabusSplitterError};
use crate::types::{DocumentMetadata, SourceType};
use std::path::Path;
use tokio::fs;
use tracing::info;
use url::Url;

pub struct ContentFetcher;

impl ContentFetcher {
    /// Raw PDF bytes from a local path or an `http(s)://` URL.
    pub async fn fetch_content(source: &str) -> Result<(Vec<u8>, DocumentMetadata)> {
        if Self::is_url(source) {
            Self::fetch_from_url(source).await
        } else {
            Self::fetch_from_file(source).await
        }
    }

    async fn fetch_from_url(url: &str) -> Result<(Vec<u8>, DocumentMetadata)> {
        info!("Downloading PDF from URL: {}", url);

        let parsed_url = Url::parse(url)?;
        let response = reqwest::Client::new().get(url).send().await?;

        if !response.status().is_success() {
            return Err(SyllabusSplitterError::HttpStatus {
                status: response.status().as_u16(),
            });
        }

        let bytes = response.bytes().await?.to_vec();
        let metadata = DocumentMetadata {
            filename: Self::extract_filename_from_url(&parsed_url),
            source_type: SourceType::Url,
            fetched_at: chrono::Utc::now().to_rfc3339(),
            size_bytes: bytes.len(),
        };

        Ok((bytes, metadata))
    }

    async fn fetch_from_file(file_path: &str) -> Result<(Vec<u8>, DocumentMetadata)> {
        info!("Reading file: {}", file_path);

        let path = Path::new(file_path);
        if !path.is_file() {
            return Err(SyllabusSplitterError::FileNotFound {
                path: file_path.to_string(),
            });
        }

        let bytes = fs::read(path).await?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown.pdf")
            .to_string();

        let metadata = DocumentMetadata {
            filename,
            source_type: SourceType::LocalFile,
            fetched_at: chrono::Utc::now().to_rfc3339(),
            size_bytes: bytes.len(),
        };

        Ok((bytes, metadata))
    }

    fn is_url(source: &str) -> bool {
        source.starts_with("http://") || source.starts_with("https://")
    }

    fn extract_filename_from_url(url: &Url) -> String {
        url.path_segments()
            .and_then(|segments| segments.last())
            .filter(|name| !name.is_empty())
            .unwrap_or("downloaded.pdf")
            .to_string()
    }

    /// Checks every source is a parseable URL or an existing file.
    pub fn validate_sources(sources: &[String]) -> Result<Vec<String>> {
        sources
            .iter()
            .map(|source| -> Result<String> {
                if Self::is_url(source) {
                    Url::parse(source)?;
                } else if !Path::new(source).is_file() {
                    return Err(SyllabusSplitterError::FileNotFound {
                        path: source.clone(),
                    });
                }
                Ok(source.clone())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("silabos.pdf");
        std::fs::write(&path, b"%PDF-1.5 fake").unwrap();

        let (bytes, metadata) = ContentFetcher::fetch_content(path.to_str().unwrap())
            .await
            .unwrap();

        assert_eq!(bytes, b"%PDF-1.5 fake".to_vec());
        assert_eq!(metadata.filename, "silabos.pdf");
        assert_eq!(metadata.size_bytes, 13);
        assert!(matches!(metadata.source_type, SourceType::LocalFile));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let result = ContentFetcher::fetch_content("/definitely/not/here.pdf").await;
        assert!(matches!(
            result,
            Err(SyllabusSplitterError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_validate_sources() {
        let ok = ContentFetcher::validate_sources(&["https://example.com/a.pdf".to_string()]);
        assert!(ok.is_ok());

        let missing = ContentFetcher::validate_sources(&["missing.pdf".to_string()]);
        assert!(missing.is_err());
    }

    #[test]
    fn test_filename_from_url() {
        let url = Url::parse("https://example.com/files/silabos.pdf").unwrap();
        assert_eq!(ContentFetcher::extract_filename_from_url(&url), "silabos.pdf");

        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(ContentFetcher::extract_filename_from_url(&url), "downloaded.pdf");
    }
}
