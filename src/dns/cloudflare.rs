use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::provider::{DnsProvider, LocatedRecord};
use crate::config::Settings;
use crate::error::{Result, SyncError};

const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Cloudflare v4 API client, shared by record lookup and record writes.
///
/// Every request carries the account credentials in `X-Auth-Email` /
/// `X-Auth-Key` headers and goes through a fully-validating TLS client.
pub struct CloudflareProvider {
    client: Client,
    settings: Settings,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    result: Vec<RecordResponse>,
    result_info: ResultInfo,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    count: u32,
    #[serde(default)]
    #[allow(dead_code)]
    total_count: u32,
}

#[derive(Debug, Deserialize)]
struct RecordResponse {
    id: String,
    content: String,
}

/// Body for record creation and update. Proxying is always disabled.
#[derive(Debug, Serialize)]
struct RecordPayload<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    content: &'a str,
    proxied: bool,
}

impl CloudflareProvider {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(SyncError::Transport)?;

        Ok(Self {
            client,
            settings: settings.clone(),
            base_url: CLOUDFLARE_API_BASE.to_string(),
        })
    }

    /// Point the provider at an alternate API base (used by tests).
    pub fn with_base_url(settings: &Settings, base_url: &str) -> Result<Self> {
        let mut provider = Self::new(settings)?;
        provider.base_url = base_url.to_string();
        Ok(provider)
    }

    fn records_url(&self) -> String {
        format!(
            "{}/zones/{}/dns_records",
            self.base_url, self.settings.zone_id
        )
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("X-Auth-Email", &self.settings.email)
            .header("X-Auth-Key", &self.settings.api_key)
            .header("Content-Type", "application/json")
    }

    /// Issue a write (POST or PUT), validate the status, and log the raw
    /// response body when the debug flag is on.
    async fn send_write(&self, request: reqwest::RequestBuilder, url: &str) -> Result<()> {
        let response = request.send().await.map_err(SyncError::from_request)?;

        if !response.status().is_success() {
            return Err(SyncError::Upstream {
                status: response.status(),
                url: url.to_string(),
            });
        }

        if self.settings.debug {
            let body = response.text().await.unwrap_or_default();
            debug!("Cloudflare write response: {}", body);
        }

        Ok(())
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn locate_record(
        &self,
        record_type: &str,
        name: &str,
    ) -> Result<Option<LocatedRecord>> {
        let url = self.records_url();
        let response = self
            .authed(self.client.get(&url))
            .query(&[("type", record_type), ("name", name)])
            .send()
            .await
            .map_err(SyncError::from_request)?;

        if !response.status().is_success() {
            return Err(SyncError::Upstream {
                status: response.status(),
                url,
            });
        }

        let list: ListResponse = response.json().await.map_err(SyncError::from_request)?;

        match list.result_info.count {
            0 => {
                debug!("No {} record found for {}", record_type, name);
                Ok(None)
            }
            1 => {
                let record = list.result.into_iter().next().ok_or_else(|| {
                    SyncError::Malformed(
                        "result_info.count is 1 but result list is empty".to_string(),
                    )
                })?;
                Ok(Some(LocatedRecord {
                    id: record.id,
                    content: record.content,
                }))
            }
            count => {
                // Ambiguous listing; externally indistinguishable from
                // "not found", but worth flagging since the record should
                // be unique per (zone, type, name).
                warn!(
                    "Expected at most one {} record for {}, provider returned {}; treating as absent",
                    record_type, name, count
                );
                Ok(None)
            }
        }
    }

    async fn create_record(&self, record_type: &str, content: &str) -> Result<()> {
        let url = self.records_url();
        let payload = RecordPayload {
            record_type,
            name: &self.settings.record_name,
            content,
            proxied: false,
        };

        self.send_write(self.authed(self.client.post(&url)).json(&payload), &url)
            .await
    }

    async fn update_record(&self, id: &str, record_type: &str, content: &str) -> Result<()> {
        let url = format!("{}/{}", self.records_url(), id);
        let payload = RecordPayload {
            record_type,
            name: &self.settings.record_name,
            content,
            proxied: false,
        };

        self.send_write(self.authed(self.client.put(&url)).json(&payload), &url)
            .await
    }
}
