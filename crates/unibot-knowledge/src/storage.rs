//! Program handbook PDFs in a Supabase Storage bucket.
//!
//! Talks to the Storage REST API directly: list the bucket, mint signed
//! URLs, download files.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error};
use unibot_core::{config::SupabaseConfig, error::UnibotError};

/// A handbook file with a time-limited download link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handbook {
    pub major: String,
    pub file_name: String,
    pub url: String,
}

/// Derive a display name from a file name:
/// `computer_science_handbook.pdf` becomes `Computer Science`.
pub fn major_from_file_name(file_name: &str) -> String {
    let stem = file_name
        .replace("_handbook.pdf", "")
        .replace(".pdf", "")
        .replace('_', " ");
    stem.split_whitespace()
        .map(title_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Source of handbook download links.
#[async_trait]
pub trait HandbookCatalog: Send + Sync {
    /// All handbooks, sorted by file name, each with a fresh download URL.
    async fn list_handbooks(&self) -> Result<Vec<Handbook>, UnibotError>;

    /// Fetch a handbook's bytes from its URL.
    async fn download(&self, url: &str) -> Result<Vec<u8>, UnibotError>;
}

#[derive(Deserialize)]
struct StorageObject {
    name: Option<String>,
    /// Folders come back without an id.
    id: Option<String>,
}

#[derive(Deserialize)]
struct SignedUrl {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

/// Client for the handbook bucket.
pub struct HandbookStorage {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
    bucket: String,
    ttl_secs: u64,
}

impl HandbookStorage {
    pub fn from_config(config: &SupabaseConfig) -> Result<Self, UnibotError> {
        if !config.is_configured() {
            return Err(UnibotError::Config(
                "Supabase url and service role key are required for handbooks".into(),
            ));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: format!("{}/storage/v1", config.url.trim_end_matches('/')),
            service_key: config.service_role_key.clone(),
            bucket: config.handbook_bucket.clone(),
            ttl_secs: config.signed_url_ttl_secs,
        })
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("Authorization", format!("Bearer {}", self.service_key))
            .header("apikey", &self.service_key)
    }

    /// Every PDF in the bucket with a fresh signed URL.
    ///
    /// Files whose URL cannot be signed are logged and skipped.
    pub async fn list_bucket(&self) -> Result<Vec<Handbook>, UnibotError> {
        let url = format!("{}/object/list/{}", self.base_url, self.bucket);
        let body = json!({
            "prefix": "",
            "limit": 1000,
            "offset": 0,
            "sortBy": { "column": "name", "order": "asc" },
        });

        let resp = self
            .authed(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| UnibotError::Storage(format!("bucket list failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(UnibotError::Storage(format!(
                "bucket list returned {status}: {text}"
            )));
        }

        let objects: Vec<StorageObject> = resp
            .json()
            .await
            .map_err(|e| UnibotError::Storage(format!("failed to parse bucket listing: {e}")))?;

        let mut handbooks = Vec::new();
        for object in objects {
            let (Some(file_name), Some(_)) = (object.name, object.id) else {
                continue;
            };
            match self.signed_url(&file_name).await {
                Ok(url) => handbooks.push(Handbook {
                    major: major_from_file_name(&file_name),
                    file_name,
                    url,
                }),
                Err(e) => error!("Error generating signed URL for {file_name}: {e}"),
            }
        }

        debug!("found {} handbooks in bucket {}", handbooks.len(), self.bucket);
        Ok(handbooks)
    }

    /// A download URL for one object, valid for `signed_url_ttl_secs`.
    pub async fn signed_url(&self, file_name: &str) -> Result<String, UnibotError> {
        let url = format!("{}/object/sign/{}/{file_name}", self.base_url, self.bucket);
        let resp = self
            .authed(self.client.post(&url))
            .json(&json!({ "expiresIn": self.ttl_secs }))
            .send()
            .await
            .map_err(|e| UnibotError::Storage(format!("sign request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(UnibotError::Storage(format!("sign returned {status}: {text}")));
        }

        let signed: SignedUrl = resp
            .json()
            .await
            .map_err(|e| UnibotError::Storage(format!("failed to parse signed URL: {e}")))?;

        Ok(absolute_signed_url(&self.base_url, &signed.signed_url))
    }

    /// Fetch a file's bytes (typically from a signed URL).
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, UnibotError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UnibotError::Storage(format!("download failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(UnibotError::Storage(format!(
                "download returned {}",
                resp.status()
            )));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| UnibotError::Storage(format!("download read failed: {e}")))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl HandbookCatalog for HandbookStorage {
    async fn list_handbooks(&self) -> Result<Vec<Handbook>, UnibotError> {
        self.list_bucket().await
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, UnibotError> {
        self.fetch(url).await
    }
}

/// Storage returns signed URLs relative to `/storage/v1`.
fn absolute_signed_url(base_url: &str, signed: &str) -> String {
    if signed.starts_with("http") {
        signed.to_string()
    } else {
        format!("{base_url}/{}", signed.trim_start_matches('/'))
    }
}
