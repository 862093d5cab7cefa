use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// The URL list document: a YAML mapping with a `urls` sequence.
///
/// ```yaml
/// urls:
///   - example.org
///   - http://example.com/health
/// ```
#[derive(Debug, Default, Clone, Deserialize)]
pub struct UrlList {
    /// Entries are handed to the resolver as-is; no validation happens here.
    #[serde(default)]
    pub urls: Vec<String>,
}

impl UrlList {
    pub fn parse(yaml: &str, origin: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::Yaml {
            origin: origin.to_string(),
            source,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let origin = path.display().to_string();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: origin.clone(),
            source,
        })?;
        Self::parse(&yaml, &origin)
    }

    pub async fn from_url(url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let fetch_failed = |source| ConfigError::Fetch {
            url: url.to_string(),
            source,
        };

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(fetch_failed)?;
        let yaml = client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(fetch_failed)?
            .text()
            .await
            .map_err(fetch_failed)?;

        Self::parse(&yaml, url)
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_url_list_deserialization() {
        let yaml = r#"
                    urls:
                        - example.org
                        - http://example.com/health
                        - https://example.net:8443
                    "#;

        let list = UrlList::parse(yaml, "inline").expect("Invalid YAML");
        assert_eq!(
            list.urls,
            vec![
                "example.org",
                "http://example.com/health",
                "https://example.net:8443"
            ]
        );
    }

    #[test]
    fn test_missing_urls_key_is_empty() {
        let list = UrlList::parse("other: 1\n", "inline").expect("Invalid YAML");
        assert!(list.urls.is_empty());
    }

    #[test]
    fn test_invalid_yaml_names_origin() {
        let err = UrlList::parse("urls: [unterminated", "urls.yml").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { ref origin, .. } if origin == "urls.yml"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "urls:\n  - example.org").unwrap();

        let list = UrlList::from_file(file.path()).expect("readable list");
        assert_eq!(list.urls, vec!["example.org"]);
    }

    #[test]
    fn test_missing_file() {
        let err = UrlList::from_file(Path::new("/nonexistent/urls.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[tokio::test]
    async fn test_from_url() {
        let mut server = mockito::Server::new_async().await;
        let _list = server
            .mock("GET", "/urls.yml")
            .with_status(200)
            .with_body("urls:\n  - example.org\n  - example.com\n")
            .create_async()
            .await;
        let _missing = server
            .mock("GET", "/missing.yml")
            .with_status(404)
            .create_async()
            .await;

        let list = UrlList::from_url(&format!("{}/urls.yml", server.url()), Duration::from_secs(2))
            .await
            .expect("fetchable list");
        assert_eq!(list.urls, vec!["example.org", "example.com"]);

        let err = UrlList::from_url(&format!("{}/missing.yml", server.url()), Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Fetch { .. }));
    }
}
