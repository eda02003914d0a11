//! Best-effort copy of uploads to S3-compatible object storage.
use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;

use pdfqa_core::config::MirrorSettings;
use pdfqa_core::traits::UploadMirror;

const DEFAULT_ENDPOINT: &str = "https://s3.amazonaws.com";

/// `PUT {endpoint}/{bucket}/{object}` with an optional bearer token.
#[derive(Debug, Clone)]
pub struct HttpPutMirror {
    client: reqwest::Client,
    endpoint: String,
    bucket: Option<String>,
    token: Option<String>,
}

impl HttpPutMirror {
    pub fn from_settings(settings: &MirrorSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(settings.timeout_secs)).build()?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.clone().unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            bucket: settings.bucket.clone().filter(|b| !b.trim().is_empty()),
            token: settings.token.clone(),
        })
    }

    pub fn object_url(&self, bucket: &str, object_name: &str) -> anyhow::Result<Url> {
        let mut url = Url::parse(&self.endpoint)?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("mirror endpoint '{}' cannot take a path", self.endpoint))?
            .pop_if_empty()
            .push(bucket)
            .push(object_name);
        Ok(url)
    }
}

#[async_trait]
impl UploadMirror for HttpPutMirror {
    async fn mirror(&self, bytes: &[u8], object_name: &str) -> anyhow::Result<bool> {
        let Some(bucket) = &self.bucket else { return Ok(false) };
        let url = self.object_url(bucket, object_name)?;
        let mut request = self.client.put(url.clone()).header(reqwest::header::CONTENT_TYPE, "application/pdf").body(bytes.to_vec());
        if let Some(token) = &self.token { request = request.bearer_auth(token); }
        let response = request.send().await?;
        if !response.status().is_success() {
            anyhow::bail!("mirror PUT {} returned {}", url, response.status());
        }
        tracing::info!(%url, bytes = bytes.len(), "upload mirrored");
        Ok(true)
    }
}

/// Mirror that never copies anything.
#[derive(Debug, Clone, Default)]
pub struct NoopMirror;

#[async_trait]
impl UploadMirror for NoopMirror {
    async fn mirror(&self, _bytes: &[u8], _object_name: &str) -> anyhow::Result<bool> { Ok(false) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(endpoint: Option<&str>, bucket: Option<&str>) -> MirrorSettings {
        MirrorSettings { endpoint: endpoint.map(String::from), bucket: bucket.map(String::from), token: None, timeout_secs: 5 }
    }

    #[test]
    fn object_url_is_path_style_and_encoded() {
        let m = HttpPutMirror::from_settings(&settings(Some("http://minio:9000/"), Some("docs"))).unwrap();
        let url = m.object_url("docs", "annual report.pdf").unwrap();
        assert_eq!(url.as_str(), "http://minio:9000/docs/annual%20report.pdf");
    }

    #[tokio::test]
    async fn no_bucket_means_not_mirrored() {
        let m = HttpPutMirror::from_settings(&settings(None, None)).unwrap();
        assert!(!m.mirror(b"%PDF", "a.pdf").await.unwrap());
        assert!(!NoopMirror.mirror(b"%PDF", "a.pdf").await.unwrap());
    }
}
