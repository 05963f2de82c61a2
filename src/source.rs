use crate::error::SourceError;
use crate::models::SeatRecord;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

/// Where the full record set comes from. Always returns the entire collection.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn list(&self) -> Result<Vec<SeatRecord>, SourceError>;

    fn describe(&self) -> String;
}

pub struct HttpRecordSource {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpRecordSource {
    pub fn new(url: &str, timeout: Duration) -> Self {
        Self::with_client(reqwest::Client::new(), url, timeout)
    }

    pub fn with_client(client: reqwest::Client, url: &str, timeout: Duration) -> Self {
        Self {
            client,
            url: url.to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl RecordSource for HttpRecordSource {
    async fn list(&self) -> Result<Vec<SeatRecord>, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|source| SourceError::Http { url: self.url.clone(), source })?;

        if !response.status().is_success() {
            return Err(SourceError::Status {
                url: self.url.clone(),
                status: response.status(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| SourceError::Http { url: self.url.clone(), source })?;

        decode_records(&body, &self.url)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

pub struct FileRecordSource {
    path: PathBuf,
}

impl FileRecordSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RecordSource for FileRecordSource {
    async fn list(&self) -> Result<Vec<SeatRecord>, SourceError> {
        let origin = self.path.display().to_string();
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Io { path: origin.clone(), source })?;

        decode_records(&content, &origin)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Pick a source from a configured location: http(s) URLs are fetched,
/// anything else is read as a local JSON file.
pub fn source_for(location: &str, timeout: Duration) -> Box<dyn RecordSource> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Box::new(HttpRecordSource::new(location, timeout))
    } else {
        Box::new(FileRecordSource::new(location))
    }
}

/// Decode a JSON array of records. Elements that don't decode are logged and
/// skipped so one bad row never empties the whole set.
fn decode_records(body: &str, origin: &str) -> Result<Vec<SeatRecord>, SourceError> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(|source| SourceError::Decode {
        origin: origin.to_string(),
        source,
    })?;

    let serde_json::Value::Array(items) = value else {
        return Err(SourceError::NotASequence { origin: origin.to_string() });
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<SeatRecord>(item) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!(index, origin, error = %e, "skipping undecodable record"),
        }
    }
    Ok(records)
}

/// Fetch the full set once. Any failure leaves the browser with no records
/// rather than aborting.
pub async fn load_full_set(source: &dyn RecordSource) -> Vec<SeatRecord> {
    match source.list().await {
        Ok(records) => {
            tracing::info!(count = records.len(), source = %source.describe(), "loaded records");
            records
        }
        Err(e) => {
            tracing::warn!(error = %e, "record source unavailable, continuing with no records");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, RankValue};
    use std::io::Write;

    fn json_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn file_source_reads_a_json_array() {
        let file = json_file(
            r#"[
                {"instCode": "CBIT", "instituteName": "CBIT", "branchCode": "CSE", "ocBoys": 1200},
                {"instCode": "MVSR", "instituteName": "MVSR", "branchCode": "ECE", "ocBoys": "5400"}
            ]"#,
        );

        let records = FileRecordSource::new(file.path()).list().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].rank(Category::OcBoys), Some(&RankValue::Number(1200.0)));
        assert_eq!(records[1].rank(Category::OcBoys), Some(&RankValue::Text("5400".to_string())));
    }

    #[tokio::test]
    async fn bad_rows_are_skipped_without_losing_the_rest() {
        let file = json_file(
            r#"[
                {"instCode": "CBIT", "instituteName": "CBIT", "branchCode": "CSE", "ocBoys": 1200},
                {"instCode": "MVSR", "instituteName": "MVSR", "place": null, "branchCode": "ECE"},
                {"instCode": 1234, "instituteName": "VASAVI", "branchCode": "MEC"},
                {"instCode": "BAD1", "instituteName": "BROKEN", "ocBoys": true},
                42
            ]"#,
        );

        let records = FileRecordSource::new(file.path()).list().await.unwrap();
        let codes: Vec<&str> = records.iter().map(|r| r.inst_code.as_str()).collect();
        assert_eq!(codes, vec!["CBIT", "MVSR", "1234"]);
        assert!(records[1].place.is_empty());
    }

    /// Serve one canned HTTP/1.1 response on a loopback port and return its URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{}/api/students", addr)
    }

    fn loopback_source(url: &str) -> HttpRecordSource {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        HttpRecordSource::with_client(client, url, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn http_source_decodes_array_response() {
        let url = serve_once("200 OK", r#"[{"instCode": "CBIT", "ocBoys": "4512"}]"#).await;
        let records = loopback_source(&url).list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].inst_code, "CBIT");
    }

    #[tokio::test]
    async fn http_source_reports_error_status() {
        let url = serve_once("500 Internal Server Error", r#"{"error": "Failed to fetch students"}"#).await;
        let err = loopback_source(&url).list().await.unwrap_err();
        match err {
            SourceError::Status { status, .. } => assert_eq!(status.as_u16(), 500),
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn http_source_rejects_non_array_body() {
        let url = serve_once("200 OK", r#"{"error": "Failed to fetch students"}"#).await;
        let err = loopback_source(&url).list().await.unwrap_err();
        assert!(matches!(err, SourceError::NotASequence { .. }));
    }

    #[tokio::test]
    async fn non_array_payload_is_rejected() {
        let file = json_file(r#"{"error": "Failed to fetch students"}"#);
        let err = FileRecordSource::new(file.path()).list().await.unwrap_err();
        assert!(matches!(err, SourceError::NotASequence { .. }));
    }

    #[tokio::test]
    async fn unavailable_source_degrades_to_empty_set() {
        let missing = FileRecordSource::new("/nonexistent/seats.json");
        assert!(load_full_set(&missing).await.is_empty());

        let garbage = json_file("not json");
        assert!(load_full_set(&FileRecordSource::new(garbage.path())).await.is_empty());
    }

    #[test]
    fn picks_source_kind_from_location() {
        let timeout = Duration::from_secs(5);
        assert_eq!(
            source_for("https://example.com/api/students", timeout).describe(),
            "https://example.com/api/students"
        );
        assert_eq!(source_for("data/seats.json", timeout).describe(), "data/seats.json");
    }
}
