use super::{FetchError, MarketingDataGateway, SearchQueries, ServiceAccountKey, SessionTotals};
use crate::report::data::AdsMonth;
use crate::report::ReportData;
use std::path::PathBuf;
use tracing::debug;

/// Serves analytics from a report-data document on disk.
///
/// The file is re-read on every call so an export job can replace it while
/// the service runs.
#[derive(Debug, Clone)]
pub struct SnapshotGateway {
    path: PathBuf,
    key: ServiceAccountKey,
}

impl SnapshotGateway {
    pub fn new(path: PathBuf, key: ServiceAccountKey) -> Self {
        Self { path, key }
    }

    fn load(&self) -> Result<ReportData, FetchError> {
        debug!(
            snapshot = %self.path.display(),
            client_email = %self.key.client_email,
            "reading analytics snapshot"
        );
        ReportData::from_path(&self.path).map_err(|err| FetchError::Upstream(err.to_string()))
    }
}

impl MarketingDataGateway for SnapshotGateway {
    fn ga4_sessions(&self) -> Result<SessionTotals, FetchError> {
        let data = self.load()?;
        data.ga4_monthly
            .iter()
            .rev()
            .find_map(|month| {
                month.sessions.map(|sessions| SessionTotals {
                    sessions,
                    period: if month.ym.is_empty() {
                        month.ym_short.clone()
                    } else {
                        month.ym.clone()
                    },
                })
            })
            .ok_or_else(|| FetchError::NoData("ga4_monthly".to_string()))
    }

    fn search_queries(&self, month: Option<&str>) -> Result<SearchQueries, FetchError> {
        let data = self.load()?;
        let found = match month {
            Some(wanted) => data.gsc_monthly.iter().find(|m| m.ym_short == wanted),
            None => data.gsc_monthly.last(),
        };
        let found = found.ok_or_else(|| {
            FetchError::NoData(format!("gsc_monthly {}", month.unwrap_or("latest")))
        })?;
        Ok(SearchQueries {
            month: found.ym_short.clone(),
            queries: found.queries.clone(),
        })
    }

    fn ads_monthly(&self) -> Result<Vec<AdsMonth>, FetchError> {
        let mut months = self.load()?.ads_monthly;
        if months.is_empty() {
            return Err(FetchError::NoData("ads_monthly".to_string()));
        }
        months.sort_by(|a, b| a.ym_raw.cmp(&b.ym_raw));
        Ok(months)
    }
}

/// Stands in for a data source that cannot be reached with the current
/// configuration; every call returns the same error.
#[derive(Debug, Clone)]
pub struct UnconfiguredGateway {
    error: FetchError,
}

impl UnconfiguredGateway {
    pub fn new(error: FetchError) -> Self {
        Self { error }
    }
}

impl MarketingDataGateway for UnconfiguredGateway {
    fn ga4_sessions(&self) -> Result<SessionTotals, FetchError> {
        Err(self.error.clone())
    }

    fn search_queries(&self, _month: Option<&str>) -> Result<SearchQueries, FetchError> {
        Err(self.error.clone())
    }

    fn ads_monthly(&self) -> Result<Vec<AdsMonth>, FetchError> {
        Err(self.error.clone())
    }
}
