//! Seam for the external analytics, search-console and ads data sources.

mod credentials;
mod snapshot;

pub use credentials::ServiceAccountKey;
pub use snapshot::{SnapshotGateway, UnconfiguredGateway};

use crate::config::AnalyticsConfig;
use crate::report::data::{AdsMonth, SearchQuery};
use crate::report::Quantity;
use axum::http::StatusCode;
use serde::Serialize;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{info, warn};

pub const SNAPSHOT_PATH_VAR: &str = "ANALYTICS_SNAPSHOT_PATH";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionTotals {
    pub sessions: Quantity,
    pub period: String,
}

impl SessionTotals {
    pub fn message(&self) -> String {
        format!("{}のセッション数: {}", self.period, self.sessions)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchQueries {
    pub month: String,
    pub queries: Vec<SearchQuery>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("環境変数が設定されていません。{} を設定してください。", .missing.join(" と "))]
    NotConfigured { missing: Vec<&'static str> },
    #[error("SERVICE_ACCOUNT_JSON の形式が正しくありません")]
    InvalidCredentials { details: String },
    #[error("no data available for {0}")]
    NoData(String),
    #[error("upstream data source failed: {0}")]
    Upstream(String),
}

impl FetchError {
    pub fn status(&self) -> StatusCode {
        match self {
            FetchError::NoData(_) => StatusCode::NOT_FOUND,
            FetchError::Upstream(_) => StatusCode::BAD_GATEWAY,
            FetchError::NotConfigured { .. } | FetchError::InvalidCredentials { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Operator guidance attached to failed responses.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            FetchError::NotConfigured { .. } | FetchError::InvalidCredentials { .. } => None,
            FetchError::NoData(_) | FetchError::Upstream(_) => {
                Some("GA4のプロパティIDとサービスアカウントの設定を確認してください")
            }
        }
    }

    pub fn details(&self) -> Option<&str> {
        match self {
            FetchError::InvalidCredentials { details } => Some(details),
            _ => None,
        }
    }
}

pub trait MarketingDataGateway: Debug + Send + Sync {
    /// Session total for the most recent period the source covers.
    fn ga4_sessions(&self) -> Result<SessionTotals, FetchError>;

    /// Search queries for `month` (`ym_short`), or the latest month.
    fn search_queries(&self, month: Option<&str>) -> Result<SearchQueries, FetchError>;

    /// Ads monthly rows, oldest first.
    fn ads_monthly(&self) -> Result<Vec<AdsMonth>, FetchError>;
}

/// Picks the data source the configuration supports.
///
/// Missing or malformed credentials yield a gateway that reports the problem
/// on every call, so the service still starts and `/health` stays green.
pub fn gateway_from_config(config: &AnalyticsConfig) -> Arc<dyn MarketingDataGateway> {
    let missing = config.missing_ga4_settings();
    if !missing.is_empty() {
        warn!(missing = ?missing, "analytics credentials not configured");
        return Arc::new(UnconfiguredGateway::new(FetchError::NotConfigured { missing }));
    }

    let raw_key = config.service_account_json.as_deref().unwrap_or_default();
    let key = match ServiceAccountKey::parse(raw_key) {
        Ok(key) => key,
        Err(err) => {
            warn!(error = %err, "service account key rejected");
            return Arc::new(UnconfiguredGateway::new(err));
        }
    };

    match &config.snapshot_path {
        Some(path) => {
            info!(
                client_email = %key.client_email,
                snapshot = %path.display(),
                "serving analytics from snapshot"
            );
            Arc::new(SnapshotGateway::new(path.clone(), key))
        }
        None => {
            warn!("no analytics data source available");
            Arc::new(UnconfiguredGateway::new(FetchError::NotConfigured {
                missing: vec![SNAPSHOT_PATH_VAR],
            }))
        }
    }
}
