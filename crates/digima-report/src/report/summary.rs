//! Month-over-month summary block.
//!
//! The block is a free-form JSON mapping so that values supplied by the
//! caller (including presentation-only keys such as `badge`) pass through
//! untouched. Completion only ever adds keys that are absent.

use super::data::{ConversionMonth, MonthlySnapshot};
use super::quantity::Quantity;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metric families tracked by the summary block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricFamily {
    Sessions,
    AreaSessions,
    Inquiry,
    Cv,
}

impl MetricFamily {
    pub const fn ordered() -> [MetricFamily; 4] {
        [
            MetricFamily::Sessions,
            MetricFamily::AreaSessions,
            MetricFamily::Inquiry,
            MetricFamily::Cv,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            MetricFamily::Sessions => "sessions",
            MetricFamily::AreaSessions => "area_sessions",
            MetricFamily::Inquiry => "inquiry",
            MetricFamily::Cv => "cv",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            MetricFamily::Sessions => "セッション数",
            MetricFamily::AreaSessions => "商圏内アクセス数",
            MetricFamily::Inquiry => "問合せページ遷移数",
            MetricFamily::Cv => "実CV数",
        }
    }
}

/// Summary block keyed by metric family name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SummaryBlock(Map<String, Value>);

impl SummaryBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Typed read of one family, tolerant of missing or odd-shaped entries.
    pub fn metric(&self, family: MetricFamily) -> MetricSummary {
        match self.0.get(family.key()) {
            Some(Value::Object(entry)) => MetricSummary::from_entry(entry),
            _ => MetricSummary::default(),
        }
    }

    /// Returns the family's sub-mapping, creating it when absent.
    ///
    /// `None` when the caller put something other than an object under the
    /// family key; that value is left alone.
    fn family_entry(&mut self, family: MetricFamily) -> Option<&mut Map<String, Value>> {
        match self
            .0
            .entry(family.key())
            .or_insert_with(|| Value::Object(Map::new()))
        {
            Value::Object(entry) => Some(entry),
            _ => None,
        }
    }
}

impl From<Map<String, Value>> for SummaryBlock {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

/// Read-only view of one summary family as consumed by the renderers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricSummary {
    pub value: Option<Value>,
    pub prev: Option<Value>,
    pub diff_pct: Option<f64>,
    pub diff: Option<Value>,
    pub rate: Option<Value>,
    pub prev_rate: Option<Value>,
    pub badge: Option<String>,
    pub badge_sub: Option<String>,
}

impl MetricSummary {
    fn from_entry(entry: &Map<String, Value>) -> Self {
        let present = |key: &str| entry.get(key).filter(|value| !value.is_null()).cloned();
        let text = |key: &str| entry.get(key).and_then(Value::as_str).map(str::to_string);

        Self {
            value: present("value"),
            prev: present("prev"),
            diff_pct: entry.get("diff_pct").and_then(Value::as_f64),
            diff: present("diff"),
            rate: present("rate"),
            prev_rate: present("prev_rate"),
            badge: text("badge"),
            badge_sub: text("badge_sub"),
        }
    }
}

/// Fills absent month-over-month fields from the two latest months.
///
/// Sessions, area sessions and inquiry views need at least two entries in
/// `ga4_monthly`; the conversion family needs at least two in `cv_months`.
/// The two guards are independent. Keys already present are never
/// overwritten, so a second call is a no-op. A snapshot missing a source
/// field only skips the keys derived from it.
pub fn complete_summary<'a>(
    ga4_monthly: &[MonthlySnapshot],
    cv_months: &[ConversionMonth],
    summary: &'a mut SummaryBlock,
) -> &'a mut SummaryBlock {
    if let [.., previous, current] = ga4_monthly {
        if let Some(entry) = summary.family_entry(MetricFamily::Sessions) {
            fill_counts(entry, current.sessions, previous.sessions);
        }
        if let Some(entry) = summary.family_entry(MetricFamily::AreaSessions) {
            fill_counts(entry, current.area_sessions, previous.area_sessions);
            fill_rates(entry, current.area_rate, previous.area_rate);
        }
        if let Some(entry) = summary.family_entry(MetricFamily::Inquiry) {
            fill_counts(entry, current.inquiry_views, previous.inquiry_views);
            fill_rates(entry, current.inquiry_rate, previous.inquiry_rate);
        }
    }

    if let [.., previous, current] = cv_months {
        if let Some(entry) = summary.family_entry(MetricFamily::Cv) {
            set_default(entry, "value", current.actual);
            set_default(entry, "prev", previous.actual);
            if let (Some(current), Some(previous)) = (current.actual, previous.actual) {
                set_default(entry, "diff", Some(current.delta(previous)));
            }
        }
    }

    summary
}

/// Percentage change with the denominator floored at 1.
///
/// A previous value of 0 therefore yields `current * 100`; historical
/// reports were produced this way.
pub fn percent_change(current: Quantity, previous: Quantity) -> f64 {
    let denominator = previous.as_f64().max(1.0);
    round_to_tenth((current.as_f64() - previous.as_f64()) / denominator * 100.0)
}

/// Rounds to one decimal, ties to even on the exact binary value.
pub fn round_to_tenth(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{value:.1}").parse().unwrap_or(value)
}

fn fill_counts(entry: &mut Map<String, Value>, current: Option<Quantity>, previous: Option<Quantity>) {
    set_default(entry, "value", current);
    set_default(entry, "prev", previous);
    if let (Some(current), Some(previous)) = (current, previous) {
        if !entry.contains_key("diff_pct") {
            entry.insert(
                "diff_pct".to_string(),
                Value::from(percent_change(current, previous)),
            );
        }
    }
}

fn fill_rates(entry: &mut Map<String, Value>, current: Option<Quantity>, previous: Option<Quantity>) {
    set_default(entry, "rate", current);
    set_default(entry, "prev_rate", previous);
}

fn set_default(entry: &mut Map<String, Value>, key: &str, value: Option<Quantity>) {
    if let Some(value) = value {
        entry
            .entry(key.to_string())
            .or_insert_with(|| Value::from(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn month(sessions: i64) -> MonthlySnapshot {
        MonthlySnapshot {
            sessions: Some(Quantity::Int(sessions)),
            area_sessions: Some(Quantity::Int(sessions / 2)),
            area_rate: Some(Quantity::Float(50.0)),
            inquiry_views: Some(Quantity::Int(sessions / 10)),
            inquiry_rate: Some(Quantity::Float(10.0)),
            ..MonthlySnapshot::default()
        }
    }

    fn cv(actual: i64) -> ConversionMonth {
        ConversionMonth {
            actual: Some(Quantity::Int(actual)),
            ..ConversionMonth::default()
        }
    }

    #[test]
    fn percent_change_floors_denominator_at_one() {
        assert_eq!(percent_change(Quantity::Int(150), Quantity::Int(100)), 50.0);
        assert_eq!(percent_change(Quantity::Int(20), Quantity::Int(0)), 2000.0);
        assert_eq!(percent_change(Quantity::Int(1), Quantity::Int(3)), -66.7);
        assert_eq!(
            percent_change(Quantity::Float(0.9), Quantity::Float(0.5)),
            40.0
        );
    }

    #[test]
    fn rounding_matches_tie_to_even_on_binary_value() {
        assert_eq!(round_to_tenth(0.25), 0.2);
        assert_eq!(round_to_tenth(0.35), 0.3);
        assert_eq!(round_to_tenth(-12.34), -12.3);
        assert_eq!(round_to_tenth(12.36), 12.4);
    }

    #[test]
    fn only_creates_families_that_pass_their_guard() {
        let mut summary = SummaryBlock::new();
        complete_summary(&[month(100)], &[cv(5), cv(8)], &mut summary);

        assert!(summary.get("sessions").is_none());
        assert!(summary.get("area_sessions").is_none());
        assert_eq!(
            summary.get("cv"),
            Some(&json!({ "value": 8, "prev": 5, "diff": 3 }))
        );
    }

    #[test]
    fn non_object_family_values_are_left_alone() {
        let mut summary = SummaryBlock::from(
            json!({ "sessions": "n/a" })
                .as_object()
                .cloned()
                .expect("object"),
        );
        complete_summary(&[month(100), month(150)], &[], &mut summary);
        assert_eq!(summary.get("sessions"), Some(&json!("n/a")));
        assert!(summary.get("inquiry").is_some());
    }

    #[test]
    fn missing_source_fields_skip_dependent_keys() {
        let mut previous = month(100);
        previous.sessions = None;
        let mut summary = SummaryBlock::new();
        complete_summary(&[previous, month(150)], &[], &mut summary);

        let sessions = summary.get("sessions").expect("family created");
        assert_eq!(sessions, &json!({ "value": 150 }));
    }

    #[test]
    fn metric_view_reads_badges_and_ignores_nulls() {
        let summary = SummaryBlock::from(
            json!({
                "inquiry": { "value": 12, "prev": null, "diff_pct": -3.5,
                             "badge": "要改善", "badge_sub": "CTA見直し" }
            })
            .as_object()
            .cloned()
            .expect("object"),
        );
        let inquiry = summary.metric(MetricFamily::Inquiry);
        assert_eq!(inquiry.value, Some(json!(12)));
        assert_eq!(inquiry.prev, None);
        assert_eq!(inquiry.diff_pct, Some(-3.5));
        assert_eq!(inquiry.badge.as_deref(), Some("要改善"));
        assert_eq!(summary.metric(MetricFamily::Cv), MetricSummary::default());
    }
}
