//! # Resource Locator
//!
//! Best-effort existence check run before a resource is scanned. Never
//! fails: any I/O or transport error means "not available".

use std::time::Duration;

use orv_table::source::is_remote;
use reqwest::StatusCode;

use crate::registry::PackageResource;

/// Probes local files and remote URLs.
#[derive(Debug, Clone)]
pub struct ResourceLocator {
    http: reqwest::Client,
}

impl ResourceLocator {
    /// Build a locator whose HEAD probes time out after `timeout` and never
    /// follow redirects.
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { http })
    }

    /// Whether every part of the resource's data can be reached. Inline
    /// data always exists; a resource without data never does.
    pub async fn exists(&self, resource: &PackageResource) -> bool {
        if resource.has_inline_data() {
            return true;
        }
        let Some(source) = resource.definition().source.as_ref() else {
            return false;
        };
        for part in source.parts() {
            if !self.exists_at(part).await {
                return false;
            }
        }
        true
    }

    /// Existence of a single path or URL. Only an exact `200 OK` answer to
    /// a HEAD request counts for remote locations.
    pub async fn exists_at(&self, location: &str) -> bool {
        if !is_remote(location) {
            return tokio::fs::metadata(location)
                .await
                .map(|meta| meta.is_file())
                .unwrap_or(false);
        }
        match self.http.head(location).send().await {
            Ok(response) => {
                let status = response.status();
                tracing::debug!(location, %status, "existence probe");
                status == StatusCode::OK
            }
            Err(err) => {
                tracing::debug!(location, error = %err, "existence probe failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DataPackage;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn locator() -> ResourceLocator {
        ResourceLocator::with_timeout(Duration::from_secs(5)).unwrap()
    }

    async fn server_with(status: u16) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/data.csv"))
            .respond_with(ResponseTemplate::new(status).insert_header("location", "/elsewhere.csv"))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn local_file_presence() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(locator().exists_at(&file.path().display().to_string()).await);
        assert!(!locator().exists_at("/definitely/not/here.csv").await);
        let dir = tempfile::tempdir().unwrap();
        assert!(!locator().exists_at(&dir.path().display().to_string()).await);
    }

    #[tokio::test]
    async fn remote_ok_exists() {
        let server = server_with(200).await;
        assert!(locator().exists_at(&format!("{}/data.csv", server.uri())).await);
    }

    #[tokio::test]
    async fn remote_redirect_does_not_exist() {
        let server = server_with(302).await;
        assert!(!locator().exists_at(&format!("{}/data.csv", server.uri())).await);
    }

    #[tokio::test]
    async fn remote_errors_do_not_exist() {
        for status in [204, 404, 500] {
            let server = server_with(status).await;
            assert!(
                !locator().exists_at(&format!("{}/data.csv", server.uri())).await,
                "status {status}"
            );
        }
    }

    #[tokio::test]
    async fn unreachable_host_does_not_exist() {
        assert!(!locator().exists_at("http://127.0.0.1:9/data.csv").await);
    }

    #[tokio::test]
    async fn multipart_needs_every_part() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.csv"), "id\n").unwrap();
        let location = dir.path().join("datapackage.json");
        std::fs::write(
            &location,
            json!({
                "resources": [
                    {"name": "one", "path": "a.csv"},
                    {"name": "both", "path": ["a.csv", "b.csv"]},
                    {"name": "inline", "data": [["id"], ["1"]]}
                ]
            })
            .to_string(),
        )
        .unwrap();
        let http = reqwest::Client::new();
        let package = DataPackage::load(&location.display().to_string(), &http)
            .await
            .unwrap();

        let locator = locator();
        assert!(locator.exists(package.resource("one").unwrap()).await);
        assert!(!locator.exists(package.resource("both").unwrap()).await);
        assert!(locator.exists(package.resource("inline").unwrap()).await);
    }
}
