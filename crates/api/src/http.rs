use crate::backend::{ContactBackend, CONTACTS_PATH};
use crate::error::{ApiError, Result};
use async_trait::async_trait;
use contact_protocol::{decode_contact, decode_contact_list, ContactPayload, ContactRecord};
use reqwest::{Client, Method, Response};
use serde_json::Value;
use std::time::Duration;

/// JSON-over-HTTP backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    contacts_path: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidPath(format!(
                "base url must start with http:// or https:// (got '{base_url}')"
            )));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            contacts_path: CONTACTS_PATH.to_string(),
        })
    }

    pub fn with_contacts_path(mut self, path: &str) -> Self {
        self.contacts_path = path.to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn contacts_path(&self) -> &str {
        &self.contacts_path
    }

    /// Absolute URLs pass through; paths are joined to the base URL.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, method: Method, path: &str, body: Option<&ContactPayload>) -> Result<Response> {
        let url = self.url(path);
        log::debug!("{method} {url}");
        let mut request = self.client.request(method, &url);
        if let Some(payload) = body {
            request = request.json(payload);
        }
        let response = request.send().await.map_err(|err| {
            log::warn!("{url}: {err}");
            err
        })?;
        ensure_success(response)
    }

    async fn send_json(&self, method: Method, path: &str, body: Option<&ContactPayload>) -> Result<Value> {
        let response = self.send(method, path, body).await?;
        Ok(response.json::<Value>().await?)
    }
}

fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let reason = status.canonical_reason().unwrap_or("unknown").to_string();
    log::warn!("{} ({reason})", status.as_u16());
    Err(ApiError::Status {
        status: status.as_u16(),
        reason,
    })
}

#[async_trait]
impl ContactBackend for HttpBackend {
    async fn fetch_contacts(&self) -> Result<Vec<ContactRecord>> {
        let body = self.send_json(Method::GET, &self.contacts_path, None).await?;
        let records = decode_contact_list(body)?;
        log::info!("Fetched {} contacts from {}", records.len(), self.base_url);
        Ok(records)
    }

    async fn create_contact(&self, path: &str, payload: &ContactPayload) -> Result<ContactRecord> {
        let body = self.send_json(Method::POST, path, Some(payload)).await?;
        Ok(decode_contact(body)?)
    }

    async fn update_contact(&self, path: &str, payload: &ContactPayload) -> Result<ContactRecord> {
        let body = self.send_json(Method::PUT, path, Some(payload)).await?;
        Ok(decode_contact(body)?)
    }

    async fn delete_contact(&self, path: &str) -> Result<()> {
        self.send(Method::DELETE, path, None).await?;
        Ok(())
    }
}
