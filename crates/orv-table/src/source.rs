//! # Tabular Sources
//!
//! Every source is reduced to a forward-only stream of raw string rows.
//! CSV input is read without a header interpretation and with flexible row
//! lengths: headers and row shape are checked later, against the schema.

use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;

use crate::error::TableError;

/// Forward-only stream of raw rows.
pub type RawRows = Box<dyn Iterator<Item = Result<Vec<String>, TableError>> + Send>;

/// Where table data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSource {
    /// Rows already in memory.
    Inline(Vec<Vec<String>>),
    /// CSV text, e.g. an uploaded file. Cloning shares the buffer.
    Bytes(Bytes),
    /// A CSV file on disk.
    Path(PathBuf),
    /// A CSV document behind an `http(s)` URL.
    Url(String),
    /// Several paths or URLs read back to back as one table. Only the
    /// first part may carry a header row.
    Multipart(Vec<String>),
}

impl TableSource {
    /// Classify a single location string as a URL or a local path.
    pub fn from_location(location: &str) -> Self {
        if is_remote(location) {
            Self::Url(location.to_string())
        } else {
            Self::Path(PathBuf::from(location))
        }
    }

    /// One source for a list of parts. A single part is not multipart.
    pub fn from_parts(mut parts: Vec<String>) -> Self {
        if parts.len() == 1 {
            let part = parts.remove(0);
            Self::from_location(&part)
        } else {
            Self::Multipart(parts)
        }
    }

    /// Short human-readable description for logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Inline(rows) => format!("inline ({} rows)", rows.len()),
            Self::Bytes(bytes) => format!("bytes ({} bytes)", bytes.len()),
            Self::Path(path) => path.display().to_string(),
            Self::Url(url) => url.clone(),
            Self::Multipart(parts) => parts.join(", "),
        }
    }

    /// Open the source as a raw row stream. Remote documents are fetched in
    /// full before the stream starts.
    pub async fn open(&self, http: &reqwest::Client) -> Result<RawRows, TableError> {
        match self {
            Self::Inline(rows) => Ok(Box::new(rows.clone().into_iter().map(Ok::<_, TableError>))),
            Self::Bytes(bytes) => Ok(csv_rows(Cursor::new(bytes.clone()))),
            Self::Path(path) => open_path(path).await,
            Self::Url(url) => fetch(http, url).await,
            Self::Multipart(parts) => {
                let mut streams = Vec::with_capacity(parts.len());
                for part in parts {
                    let stream = if is_remote(part) {
                        fetch(http, part).await?
                    } else {
                        open_path(&PathBuf::from(part)).await?
                    };
                    streams.push(stream);
                }
                Ok(Box::new(streams.into_iter().flatten()))
            }
        }
    }
}

/// Whether a location names an `http(s)` resource.
pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// HTTP client used for remote sources and existence probes.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, TableError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| TableError::unreadable("http client", e))
}

async fn open_path(path: &std::path::Path) -> Result<RawRows, TableError> {
    let contents = tokio::fs::read(path)
        .await
        .map_err(|e| TableError::unreadable(path.display().to_string(), e))?;
    Ok(csv_rows(Cursor::new(Bytes::from(contents))))
}

async fn fetch(http: &reqwest::Client, url: &str) -> Result<RawRows, TableError> {
    tracing::debug!(url, "fetching remote table");
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| TableError::unreadable(url, e))?;
    let status = response.status();
    if !status.is_success() {
        return Err(TableError::unreadable(url, format!("HTTP {status}")));
    }
    let body = response
        .bytes()
        .await
        .map_err(|e| TableError::unreadable(url, e))?;
    Ok(csv_rows(Cursor::new(body)))
}

fn csv_rows<R: std::io::Read + Send + 'static>(reader: R) -> RawRows {
    let reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    Box::new(reader.into_records().map(|record| {
        record
            .map(|r| r.iter().map(str::to_string).collect())
            .map_err(TableError::from)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn client() -> reqwest::Client {
        http_client(Duration::from_secs(5)).unwrap()
    }

    fn collect(rows: RawRows) -> Vec<Vec<String>> {
        rows.map(|r| r.unwrap()).collect()
    }

    #[test]
    fn location_classification() {
        assert_eq!(
            TableSource::from_location("https://example.com/a.csv"),
            TableSource::Url("https://example.com/a.csv".into())
        );
        assert_eq!(
            TableSource::from_location("data/a.csv"),
            TableSource::Path(PathBuf::from("data/a.csv"))
        );
        assert!(matches!(
            TableSource::from_parts(vec!["a.csv".into(), "b.csv".into()]),
            TableSource::Multipart(_)
        ));
        assert!(matches!(
            TableSource::from_parts(vec!["a.csv".into()]),
            TableSource::Path(_)
        ));
    }

    #[tokio::test]
    async fn bytes_keep_ragged_rows() {
        let source = TableSource::Bytes(Bytes::from_static(b"id,name\n1,a,extra\n2\n"));
        let rows = collect(source.open(&client()).await.unwrap());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], vec!["1", "a", "extra"]);
        assert_eq!(rows[2], vec!["2"]);
    }

    #[tokio::test]
    async fn bytes_source_can_be_opened_twice() {
        let source = TableSource::Bytes(Bytes::from_static(b"id\n1\n"));
        let copy = source.clone();
        let TableSource::Bytes(inner) = &copy else { unreachable!() };
        let TableSource::Bytes(original) = &source else { unreachable!() };
        assert_eq!(inner.as_ptr(), original.as_ptr());
        assert_eq!(collect(source.open(&client()).await.unwrap()).len(), 2);
        assert_eq!(collect(source.open(&client()).await.unwrap()).len(), 2);
    }

    #[tokio::test]
    async fn path_source_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,name").unwrap();
        writeln!(file, "1,\"quoted, name\"").unwrap();
        let source = TableSource::Path(file.path().to_path_buf());
        let rows = collect(source.open(&client()).await.unwrap());
        assert_eq!(rows[1], vec!["1", "quoted, name"]);
    }

    #[tokio::test]
    async fn missing_path_is_a_source_error() {
        let source = TableSource::Path(PathBuf::from("/definitely/not/here.csv"));
        let err = source.open(&client()).await.err().unwrap();
        assert!(matches!(err, TableError::Source { .. }));
    }

    #[tokio::test]
    async fn multipart_chains_parts() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        std::fs::write(&a, "id\n1\n").unwrap();
        std::fs::write(&b, "2\n3\n").unwrap();
        let source = TableSource::Multipart(vec![
            a.display().to_string(),
            b.display().to_string(),
        ]);
        let rows = collect(source.open(&client()).await.unwrap());
        assert_eq!(rows, vec![vec!["id"], vec!["1"], vec!["2"], vec!["3"]]);
    }

    #[tokio::test]
    async fn url_source_fetches_csv() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/program.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string("id,name\n1,x\n"))
            .mount(&server)
            .await;

        let source = TableSource::Url(format!("{}/program.csv", server.uri()));
        let rows = collect(source.open(&client()).await.unwrap());
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn url_source_non_success_is_source_error() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = TableSource::Url(format!("{}/missing.csv", server.uri()));
        let err = source.open(&client()).await.err().unwrap();
        assert!(err.to_string().contains("404"));
    }
}
