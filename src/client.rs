//! HTTP implementation of the provider API
//!
//! Thin adapter over the provider's REST surface: bearer-token auth, JSON
//! bodies, unfiltered listings. No retry or backoff lives here; a failed
//! call aborts the run.

use async_trait::async_trait;
use reqwest::header;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::compute::{ComputeApi, ElasticIp, ElasticIpAttach, Instance, NetworkInterface};
use crate::error::{Error, Result};

/// Default provider endpoint
pub const DEFAULT_API_URL: &str = "https://api.flow.swiss";

/// Listing responses are paginated containers; with `no_filter=1` the
/// provider returns the whole collection in one page.
#[derive(Debug, Deserialize)]
struct ListBody<T> {
    items: Vec<T>,
}

/// Error body shape returned by the provider on non-success responses
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// REST client for the provider's compute API
pub struct ComputeClient {
    http: reqwest::Client,
    base_url: String,
}

impl ComputeClient {
    /// Create a client for the given endpoint, authenticating every request
    /// with the given API token.
    pub fn new(base_url: impl Into<String>, token: &str) -> Result<Self> {
        let mut auth = header::HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| Error::config("API token contains characters invalid in a header"))?;
        auth.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);

        let http = reqwest::Client::builder().default_headers(headers).build()?;

        let base_url: String = base_url.into();
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!(path, "GET");
        let response = self.http.get(self.url(path)).send().await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let body: ListBody<T> = self.get_json(&format!("{path}?no_filter=1")).await?;
        Ok(body.items)
    }

    /// Map a non-success response to a provider error, surfacing the
    /// provider's own message when the body carries one.
    async fn checked(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        Err(Error::provider(format!("{status}: {message}")))
    }
}

#[async_trait]
impl ComputeApi for ComputeClient {
    async fn list_elastic_ips(&self) -> Result<Vec<ElasticIp>> {
        self.list("/v4/compute/elastic-ips").await
    }

    async fn list_instances(&self) -> Result<Vec<Instance>> {
        self.list("/v4/compute/instances").await
    }

    async fn get_instance(&self, id: u64) -> Result<Instance> {
        self.get_json(&format!("/v4/compute/instances/{id}")).await
    }

    async fn list_network_interfaces(&self, instance_id: u64) -> Result<Vec<NetworkInterface>> {
        self.list(&format!("/v4/compute/instances/{instance_id}/network-interfaces"))
            .await
    }

    async fn detach_elastic_ip(&self, instance_id: u64, elastic_ip_id: u64) -> Result<()> {
        debug!(instance_id, elastic_ip_id, "DELETE elastic ip attachment");
        let response = self
            .http
            .delete(self.url(&format!(
                "/v4/compute/instances/{instance_id}/elastic-ips/{elastic_ip_id}"
            )))
            .send()
            .await?;
        Self::checked(response).await?;
        Ok(())
    }

    async fn attach_elastic_ip(
        &self,
        instance_id: u64,
        attach: ElasticIpAttach,
    ) -> Result<ElasticIp> {
        debug!(
            instance_id,
            elastic_ip_id = attach.elastic_ip_id,
            network_interface_id = attach.network_interface_id,
            "POST elastic ip attachment"
        );
        let response = self
            .http
            .post(self.url(&format!("/v4/compute/instances/{instance_id}/elastic-ips")))
            .json(&attach)
            .send()
            .await?;
        Ok(Self::checked(response).await?.json().await?)
    }
}
