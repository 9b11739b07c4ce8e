use super::quantity::Quantity;
use super::summary::{complete_summary, SummaryBlock};
use super::ReportError;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// The full input document for one monthly report.
///
/// Every section is optional; a missing section renders as an empty slide or
/// is skipped, never as a parse failure. The same goes for individual values
/// of the wrong type: a count of `"many"` reads as absent, so one bad cell
/// cannot keep the rest of the document from being completed and planned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportData {
    #[serde(deserialize_with = "lenient")]
    pub store_name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub period: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub period_1st: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub ga4_monthly: Vec<MonthlySnapshot>,
    #[serde(deserialize_with = "lenient_list")]
    pub cv_months: Vec<ConversionMonth>,
    #[serde(deserialize_with = "lenient")]
    pub cv_comment: String,
    #[serde(deserialize_with = "lenient_list")]
    pub gsc_monthly: Vec<SearchConsoleMonth>,
    #[serde(deserialize_with = "lenient_list")]
    pub gsc_area_monthly: Vec<AreaSearchMonth>,
    #[serde(deserialize_with = "lenient")]
    pub summary: SummaryBlock,
    #[serde(deserialize_with = "lenient")]
    pub analysis: Analysis,
    #[serde(deserialize_with = "lenient_list")]
    pub proposals: Vec<Proposal>,
    #[serde(deserialize_with = "lenient_list")]
    pub page_metrics_1st: Vec<PageMetric>,
    #[serde(deserialize_with = "lenient_list")]
    pub page_metrics_2nd: Vec<PageMetric>,
    #[serde(deserialize_with = "lenient_list")]
    pub traffic_sources_1st: Vec<TrafficSource>,
    #[serde(deserialize_with = "lenient_list")]
    pub traffic_sources_2nd: Vec<TrafficSource>,
    #[serde(deserialize_with = "lenient_list")]
    pub area_traffic_1st: Vec<TrafficSource>,
    #[serde(deserialize_with = "lenient_list")]
    pub area_traffic_2nd: Vec<TrafficSource>,
    #[serde(deserialize_with = "lenient_list")]
    pub ads_monthly: Vec<AdsMonth>,
    #[serde(deserialize_with = "lenient_list")]
    pub ads_weekly: Vec<AdsWeek>,
    #[serde(deserialize_with = "lenient_list")]
    pub ads_campaigns: Vec<AdsCampaignMonth>,
}

impl ReportData {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ReportError> {
        let value: Value = serde_json::from_reader(reader).map_err(ReportError::InvalidJson)?;
        Self::from_value(value)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ReportError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ReportError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Only a document that is not a JSON object is rejected.
    pub fn from_value(value: Value) -> Result<Self, ReportError> {
        if !value.is_object() {
            return Err(ReportError::InvalidJson(serde_json::Error::custom(
                "report data must be a JSON object",
            )));
        }
        serde_json::from_value(value).map_err(ReportError::InvalidJson)
    }

    /// Reads a document and completes its summary block.
    pub fn load_path<P: AsRef<Path>>(path: P) -> Result<Self, ReportError> {
        Self::from_path(path).map(Self::completed)
    }

    pub fn load_reader<R: Read>(reader: R) -> Result<Self, ReportError> {
        Self::from_reader(reader).map(Self::completed)
    }

    pub fn load_value(value: Value) -> Result<Self, ReportError> {
        Self::from_value(value).map(Self::completed)
    }

    fn completed(mut self) -> Self {
        self.complete_summary();
        self
    }

    /// Fills the derived month-over-month fields of `summary` in place.
    pub fn complete_summary(&mut self) -> &SummaryBlock {
        debug!(
            ga4_months = self.ga4_monthly.len(),
            cv_months = self.cv_months.len(),
            "completing summary block"
        );
        complete_summary(&self.ga4_monthly, &self.cv_months, &mut self.summary)
    }

    pub fn has_ads(&self) -> bool {
        !self.ads_monthly.is_empty()
    }
}

/// One calendar month of web-analytics metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonthlySnapshot {
    #[serde(deserialize_with = "lenient")]
    pub ym: String,
    #[serde(deserialize_with = "lenient")]
    pub ym_short: String,
    #[serde(deserialize_with = "lenient")]
    pub sessions: Option<Quantity>,
    #[serde(deserialize_with = "lenient")]
    pub users: Option<Quantity>,
    #[serde(deserialize_with = "lenient")]
    pub pvs: Option<Quantity>,
    #[serde(deserialize_with = "lenient")]
    pub bounce: Option<Quantity>,
    #[serde(deserialize_with = "deserialize_text")]
    pub duration: String,
    #[serde(deserialize_with = "lenient")]
    pub organic: Option<Quantity>,
    #[serde(deserialize_with = "lenient")]
    pub cpc: Option<Quantity>,
    #[serde(deserialize_with = "lenient")]
    pub direct: Option<Quantity>,
    #[serde(deserialize_with = "lenient")]
    pub referral: Option<Quantity>,
    #[serde(deserialize_with = "lenient")]
    pub social: Option<Quantity>,
    #[serde(deserialize_with = "lenient")]
    pub area_sessions: Option<Quantity>,
    #[serde(deserialize_with = "lenient")]
    pub area_rate: Option<Quantity>,
    #[serde(deserialize_with = "lenient")]
    pub inquiry_views: Option<Quantity>,
    #[serde(deserialize_with = "lenient")]
    pub inquiry_rate: Option<Quantity>,
    #[serde(deserialize_with = "lenient")]
    pub mobile: Option<Quantity>,
    #[serde(deserialize_with = "lenient")]
    pub desktop: Option<Quantity>,
    #[serde(deserialize_with = "lenient_list")]
    pub inquiry_details: Vec<InquiryPathViews>,
    #[serde(deserialize_with = "lenient_list")]
    pub area_by_city: Vec<CitySessions>,
    #[serde(deserialize_with = "lenient")]
    pub key_events: KeyEvents,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InquiryPathViews {
    #[serde(deserialize_with = "lenient")]
    pub path: String,
    #[serde(deserialize_with = "lenient")]
    pub views: Quantity,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CitySessions {
    #[serde(deserialize_with = "lenient")]
    pub city: String,
    #[serde(deserialize_with = "lenient")]
    pub sessions: Quantity,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyEvents {
    #[serde(deserialize_with = "lenient")]
    pub total: Quantity,
    #[serde(deserialize_with = "lenient_list")]
    pub details: Vec<KeyEventCount>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyEventCount {
    #[serde(deserialize_with = "lenient")]
    pub event_name: String,
    #[serde(deserialize_with = "lenient")]
    pub count: Quantity,
}

/// Conversion results for one month.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionMonth {
    #[serde(deserialize_with = "lenient")]
    pub ym: String,
    #[serde(deserialize_with = "lenient")]
    pub ym_short: String,
    #[serde(deserialize_with = "lenient")]
    pub target: Quantity,
    #[serde(deserialize_with = "lenient")]
    pub actual: Option<Quantity>,
    #[serde(deserialize_with = "lenient")]
    pub budget: Quantity,
    #[serde(deserialize_with = "lenient")]
    pub cpa: Quantity,
}

impl ConversionMonth {
    pub fn achieved(&self) -> bool {
        self.actual.unwrap_or_default() >= self.target
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConsoleMonth {
    #[serde(deserialize_with = "lenient")]
    pub ym_short: String,
    #[serde(deserialize_with = "lenient")]
    pub clicks: Quantity,
    #[serde(deserialize_with = "lenient")]
    pub impressions: Quantity,
    #[serde(deserialize_with = "lenient")]
    pub ctr: f64,
    #[serde(deserialize_with = "lenient")]
    pub position: f64,
    #[serde(deserialize_with = "lenient_list")]
    pub queries: Vec<SearchQuery>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    #[serde(deserialize_with = "lenient")]
    pub query: String,
    #[serde(deserialize_with = "lenient")]
    pub clicks: Quantity,
    #[serde(deserialize_with = "lenient")]
    pub imps: Quantity,
    #[serde(deserialize_with = "lenient")]
    pub ctr: f64,
    #[serde(deserialize_with = "lenient")]
    pub pos: f64,
}

/// Search-console results restricted to the store's trade area.
///
/// Unlike the other monthly series this one arrives newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaSearchMonth {
    #[serde(deserialize_with = "lenient")]
    pub ym_short: String,
    #[serde(deserialize_with = "lenient_list")]
    pub areas: Vec<AreaQueries>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaQueries {
    #[serde(deserialize_with = "lenient")]
    pub area: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub queries: Vec<AreaQuery>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaQuery {
    #[serde(deserialize_with = "lenient")]
    pub query: String,
    #[serde(deserialize_with = "lenient")]
    pub clicks: Quantity,
    #[serde(deserialize_with = "lenient")]
    pub impressions: Quantity,
    #[serde(deserialize_with = "lenient")]
    pub ctr: f64,
    #[serde(deserialize_with = "lenient")]
    pub position: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Analysis {
    #[serde(deserialize_with = "lenient_list")]
    pub good: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub issues: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub analysis_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Proposal {
    #[serde(deserialize_with = "lenient")]
    pub color: String,
    #[serde(deserialize_with = "lenient")]
    pub title: String,
    #[serde(deserialize_with = "lenient")]
    pub body: String,
}

impl Default for Proposal {
    fn default() -> Self {
        Self {
            color: "blue".to_string(),
            title: String::new(),
            body: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PageMetric {
    #[serde(deserialize_with = "lenient")]
    pub ym: String,
    #[serde(deserialize_with = "lenient")]
    pub page_path: String,
    #[serde(deserialize_with = "lenient")]
    pub pageviews: Quantity,
    #[serde(deserialize_with = "deserialize_text")]
    pub duration: String,
    #[serde(deserialize_with = "lenient")]
    pub total_users: Quantity,
}

/// A source/medium row, optionally scoped to a city of the trade area.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficSource {
    #[serde(deserialize_with = "lenient")]
    pub ym: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub source_medium: String,
    #[serde(deserialize_with = "lenient")]
    pub city: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub sessions: Quantity,
    #[serde(deserialize_with = "lenient")]
    pub sessions_delta: Option<Quantity>,
    #[serde(deserialize_with = "lenient")]
    pub total_users: Quantity,
    #[serde(deserialize_with = "lenient")]
    pub total_users_delta: Option<Quantity>,
}

/// Metrics shared by every ads row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdsMetrics {
    #[serde(deserialize_with = "lenient")]
    pub cost: Quantity,
    #[serde(deserialize_with = "lenient")]
    pub cv: Quantity,
    #[serde(deserialize_with = "lenient")]
    pub cpa: Option<Quantity>,
    #[serde(deserialize_with = "lenient")]
    pub clicks: Quantity,
    #[serde(deserialize_with = "lenient")]
    pub cpc: Option<Quantity>,
    #[serde(deserialize_with = "lenient")]
    pub ctr: Quantity,
    #[serde(deserialize_with = "lenient")]
    pub impressions: Quantity,
    #[serde(deserialize_with = "lenient")]
    pub cvr: Quantity,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdsMonth {
    #[serde(deserialize_with = "lenient")]
    pub ym: String,
    #[serde(deserialize_with = "lenient")]
    pub ym_raw: String,
    #[serde(flatten)]
    pub metrics: AdsMetrics,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdsWeek {
    #[serde(deserialize_with = "lenient")]
    pub week: String,
    #[serde(flatten)]
    pub metrics: AdsMetrics,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdsCampaignMonth {
    #[serde(deserialize_with = "lenient")]
    pub ym: String,
    #[serde(deserialize_with = "lenient")]
    pub ym_raw: String,
    #[serde(deserialize_with = "lenient")]
    pub campaign: String,
    #[serde(flatten)]
    pub metrics: AdsMetrics,
}

/// Reads a field, falling back to its default when the value has the wrong
/// shape (`None` for optional metrics).
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Like [`lenient`], per element: a malformed row becomes a default row and
/// still counts toward the series length.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    })
}

/// Accepts strings, numbers and null for free-text fields such as durations.
fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_sections_default_to_empty() {
        let data = ReportData::from_value(json!({ "store_name": "川口" })).expect("parses");
        assert_eq!(data.store_name.as_deref(), Some("川口"));
        assert!(data.ga4_monthly.is_empty());
        assert!(data.summary.is_empty());
        assert!(!data.has_ads());
    }

    #[test]
    fn load_completes_summary() {
        let data = ReportData::load_value(json!({
            "ga4_monthly": [
                { "sessions": 100, "area_sessions": 40, "area_rate": 40.0,
                  "inquiry_views": 10, "inquiry_rate": 10.0 },
                { "sessions": 150, "area_sessions": 60, "area_rate": 40.0,
                  "inquiry_views": 12, "inquiry_rate": 8.0 }
            ]
        }))
        .expect("parses");

        let sessions = data.summary.get("sessions").expect("sessions filled");
        assert_eq!(sessions["value"], json!(150));
        assert_eq!(sessions["diff_pct"], json!(50.0));
    }

    #[test]
    fn durations_accept_numbers_and_text() {
        let data = ReportData::from_value(json!({
            "ga4_monthly": [ { "duration": "1分23秒" }, { "duration": 83 }, { "duration": null } ]
        }))
        .expect("parses");
        let durations: Vec<&str> = data
            .ga4_monthly
            .iter()
            .map(|month| month.duration.as_str())
            .collect();
        assert_eq!(durations, vec!["1分23秒", "83", ""]);
    }

    #[test]
    fn ads_rows_flatten_metrics() {
        let data = ReportData::from_value(json!({
            "ads_monthly": [
                { "ym": "2025年6月", "ym_raw": "202506", "cost": 12000.5, "cv": 3,
                  "cpa": 4000, "clicks": 210, "ctr": 0.031, "impressions": 6800, "cvr": 1.4 }
            ]
        }))
        .expect("parses");
        let month = &data.ads_monthly[0];
        assert_eq!(month.ym_raw, "202506");
        assert_eq!(month.metrics.clicks, Quantity::Int(210));
        assert_eq!(month.metrics.cost, Quantity::Float(12000.5));
        assert!(month.metrics.cpc.is_none());
    }

    #[test]
    fn mistyped_values_read_as_absent() {
        let data = ReportData::from_value(json!({
            "store_name": 123,
            "ga4_monthly": [ { "sessions": "many", "ym": 202506, "area_sessions": 40 }, "oops" ],
            "ads_weekly": [ { "week": "2025-06-02", "ctr": "n/a", "clicks": 12 } ],
            "proposals": { "color": "red" },
            "summary": "later"
        }))
        .expect("parses");

        assert!(data.store_name.is_none());
        assert_eq!(data.ga4_monthly.len(), 2);
        assert!(data.ga4_monthly[0].sessions.is_none());
        assert_eq!(data.ga4_monthly[0].ym, "");
        assert_eq!(data.ga4_monthly[0].area_sessions, Some(Quantity::Int(40)));
        assert!(data.ga4_monthly[1].area_sessions.is_none());
        assert_eq!(data.ads_weekly[0].metrics.ctr, Quantity::Int(0));
        assert_eq!(data.ads_weekly[0].metrics.clicks, Quantity::Int(12));
        assert!(data.proposals.is_empty());
        assert!(data.summary.is_empty());
    }

    #[test]
    fn rejects_documents_that_are_not_objects() {
        let err = ReportData::from_value(json!([1, 2, 3])).expect_err("array rejected");
        assert!(matches!(err, ReportError::InvalidJson(_)));
    }
}
