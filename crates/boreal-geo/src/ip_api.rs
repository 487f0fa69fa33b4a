//! ip-api.com geolocation client.
//!
//! Free tier, 45 req/min: good enough for the field-trial fleet. Production
//! migrates to a local GeoIP database, behind the same provider trait.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use boreal_core::defaults::{GEOLOCATION_API_URL, GEOLOCATION_TIMEOUT_SECS};
use boreal_core::Result;

use crate::provider::{is_global_ip, GeolocationProvider, ResolvedIp};

/// Response fields requested from ip-api.com (trimmed for payload size).
const IP_API_FIELDS: &str = "status,regionName,lat,lon";

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(rename = "regionName", default)]
    region_name: String,
    #[serde(default)]
    lat: f64,
    #[serde(default)]
    lon: f64,
}

/// HTTP client for an ip-api.com style geolocation endpoint.
pub struct IpApiClient {
    client: Client,
    base_url: String,
}

impl IpApiClient {
    /// Create a client against the default public endpoint.
    pub fn new() -> Self {
        Self::with_config(GEOLOCATION_API_URL.to_string())
    }

    /// Create a client against a custom endpoint.
    pub fn with_config(base_url: String) -> Self {
        // Hard per-lookup timeout, shorter than the request timeout: a slow
        // provider degrades to "unavailable" instead of stalling ingestion.
        let client = Client::builder()
            .timeout(Duration::from_secs(GEOLOCATION_TIMEOUT_SECS))
            .build()
            .expect("failed to build geolocation HTTP client");

        Self { client, base_url }
    }

    /// Create from the `GEOLOCATION_API_URL` environment variable.
    pub fn from_env() -> Self {
        let base_url = std::env::var("GEOLOCATION_API_URL")
            .unwrap_or_else(|_| GEOLOCATION_API_URL.to_string());
        Self::with_config(base_url)
    }

    async fn query(&self, ip: IpAddr) -> Result<Option<ResolvedIp>> {
        let url = format!(
            "{}/{}?fields={}",
            self.base_url.trim_end_matches('/'),
            ip,
            IP_API_FIELDS
        );

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(
                    subsystem = "geo",
                    component = "ip_api",
                    op = "lookup",
                    %ip,
                    error = %e,
                    "Geolocation request failed"
                );
                return Ok(None);
            }
        };

        if !response.status().is_success() {
            warn!(
                subsystem = "geo",
                component = "ip_api",
                op = "lookup",
                %ip,
                status = %response.status(),
                "Geolocation endpoint returned non-success status"
            );
            return Ok(None);
        }

        let body: IpApiResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                warn!(
                    subsystem = "geo",
                    component = "ip_api",
                    op = "lookup",
                    %ip,
                    error = %e,
                    "Geolocation response was not valid JSON"
                );
                return Ok(None);
            }
        };

        if body.status != "success" {
            warn!(
                subsystem = "geo",
                component = "ip_api",
                op = "lookup",
                %ip,
                provider_status = %body.status,
                "Geolocation lookup unsuccessful"
            );
            return Ok(None);
        }

        Ok(Some(ResolvedIp {
            region: body.region_name,
            lat: body.lat,
            lon: body.lon,
        }))
    }
}

impl Default for IpApiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GeolocationProvider for IpApiClient {
    async fn lookup(&self, ip: IpAddr) -> Result<Option<ResolvedIp>> {
        if !is_global_ip(ip) {
            debug!(
                subsystem = "geo",
                component = "ip_api",
                op = "lookup",
                %ip,
                "Skipping geolocation for non-global address"
            );
            return Ok(None);
        }
        self.query(ip).await
    }
}
