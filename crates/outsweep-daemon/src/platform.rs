//! HTTP client for the trading platform.
//!
//! Reads the collectibles inventory page by page and declines trades. Write
//! requests need a CSRF token, which the platform hands out on a 403 response.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use outsweep_policy::{Inventory, PlatformError, TradingPlatform};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::PlatformConfig;
use crate::error::DaemonError;

const CSRF_HEADER: &str = "x-csrf-token";

#[derive(Debug, Deserialize)]
struct CollectiblesPage {
    #[serde(rename = "nextPageCursor")]
    next_page_cursor: Option<String>,
    data: Vec<Collectible>,
}

#[derive(Debug, Deserialize)]
struct Collectible {
    #[serde(rename = "userAssetId")]
    user_asset_id: u64,
}

pub struct HttpPlatform {
    client: Client,
    config: PlatformConfig,
    cookie: String,
    csrf_token: Mutex<Option<String>>,
}

fn http_error(e: reqwest::Error) -> PlatformError {
    PlatformError::Http(e.to_string())
}

/// Map a non-success status to a platform error.
fn status_error(status: StatusCode, body: String) -> PlatformError {
    match status {
        StatusCode::UNAUTHORIZED => PlatformError::Unauthorized(body),
        StatusCode::TOO_MANY_REQUESTS => PlatformError::RateLimited,
        _ => PlatformError::Status {
            status: status.as_u16(),
            body,
        },
    }
}

impl HttpPlatform {
    pub fn new(config: PlatformConfig, session_cookie: &str) -> Result<Self, DaemonError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| DaemonError::Http(e.to_string()))?;
        let cookie = format!("{}={}", config.cookie_name, session_cookie);
        Ok(Self {
            client,
            config,
            cookie,
            csrf_token: Mutex::new(None),
        })
    }

    fn inventory_page_url(&self, cursor: Option<&str>) -> String {
        format!(
            "{}/v1/users/{}/assets/collectibles?limit={}&sortOrder=Asc&cursor={}",
            self.config.inventory_url.trim_end_matches('/'),
            self.config.user_id,
            self.config.page_size,
            cursor.unwrap_or_default()
        )
    }

    fn decline_url(&self, offer_id: u64) -> String {
        format!(
            "{}/v1/trades/{}/decline",
            self.config.trades_url.trim_end_matches('/'),
            offer_id
        )
    }

    async fn fetch_page(&self, cursor: Option<&str>) -> Result<CollectiblesPage, PlatformError> {
        let url = self.inventory_page_url(cursor);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::COOKIE, &self.cookie)
            .send()
            .await
            .map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }
        response.json().await.map_err(http_error)
    }

    async fn post_decline(&self, offer_id: u64) -> Result<Response, PlatformError> {
        let token = self.csrf_token.lock().await.clone();
        let mut request = self
            .client
            .post(self.decline_url(offer_id))
            .header(reqwest::header::COOKIE, &self.cookie);
        if let Some(token) = token {
            request = request.header(CSRF_HEADER, token);
        }
        request.send().await.map_err(http_error)
    }
}

#[async_trait]
impl TradingPlatform for HttpPlatform {
    async fn current_inventory(&self) -> Result<Inventory, PlatformError> {
        let mut uaids = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self.fetch_page(cursor.as_deref()).await?;
            uaids.extend(page.data.iter().map(|c| c.user_asset_id));
            match page.next_page_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        debug!(count = uaids.len(), "Fetched inventory");
        Ok(Inventory::new(uaids, Utc::now()))
    }

    async fn decline_offer(&self, offer_id: u64) -> Result<(), PlatformError> {
        let mut response = self.post_decline(offer_id).await?;

        // A 403 carrying a fresh token means ours was missing or stale.
        if response.status() == StatusCode::FORBIDDEN {
            let fresh = response
                .headers()
                .get(CSRF_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            if let Some(token) = fresh {
                debug!("Refreshed CSRF token");
                *self.csrf_token.lock().await = Some(token);
                response = self.post_decline(offer_id).await?;
            }
        }

        let status = response.status();
        if status.is_success() {
            info!(offer_id, "Declined trade on platform");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => Err(PlatformError::OfferNotFound(offer_id)),
            _ => {
                warn!(offer_id, status = status.as_u16(), "Decline rejected by platform");
                Err(status_error(status, body))
            }
        }
    }
}
