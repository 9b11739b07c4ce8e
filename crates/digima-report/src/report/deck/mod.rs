//! Slide-by-slide content plan for the monthly report deck.
//!
//! A plan says what goes on each slide (titles, tables, cards, chart series)
//! but not where; placing blocks on the template is left to the renderer.

mod ads;
mod sections;

use super::data::ReportData;
use super::summary::MetricFamily;
use super::ReportError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Report sections in deck order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Conversions,
    Summary,
    Detail,
    MonthlyAnalytics,
    MonthlySearch,
    AreaSearch,
    Analysis,
    Proposals,
    PageMetrics,
    TrafficCurrent,
    TrafficPrevious,
    AreaTrafficCurrent,
    AreaTrafficPrevious,
    AdsMonthly,
    AdsWeekly,
    AdsCampaigns,
}

impl SectionKind {
    pub const fn ordered() -> [SectionKind; 16] {
        [
            SectionKind::Conversions,
            SectionKind::Summary,
            SectionKind::Detail,
            SectionKind::MonthlyAnalytics,
            SectionKind::MonthlySearch,
            SectionKind::AreaSearch,
            SectionKind::Analysis,
            SectionKind::Proposals,
            SectionKind::PageMetrics,
            SectionKind::TrafficCurrent,
            SectionKind::TrafficPrevious,
            SectionKind::AreaTrafficCurrent,
            SectionKind::AreaTrafficPrevious,
            SectionKind::AdsMonthly,
            SectionKind::AdsWeekly,
            SectionKind::AdsCampaigns,
        ]
    }

    pub const fn name(self) -> &'static str {
        match self {
            SectionKind::Conversions => "cv",
            SectionKind::Summary => "summary",
            SectionKind::Detail => "detail",
            SectionKind::MonthlyAnalytics => "ga4",
            SectionKind::MonthlySearch => "gsc",
            SectionKind::AreaSearch => "gsc_area",
            SectionKind::Analysis => "analysis",
            SectionKind::Proposals => "proposals",
            SectionKind::PageMetrics => "pages",
            SectionKind::TrafficCurrent => "traffic_current",
            SectionKind::TrafficPrevious => "traffic_previous",
            SectionKind::AreaTrafficCurrent => "area_traffic_current",
            SectionKind::AreaTrafficPrevious => "area_traffic_previous",
            SectionKind::AdsMonthly => "ads_monthly",
            SectionKind::AdsWeekly => "ads_weekly",
            SectionKind::AdsCampaigns => "ads_campaigns",
        }
    }

    /// Ads slides are only produced when the input carries ads data.
    pub const fn is_ads(self) -> bool {
        matches!(
            self,
            SectionKind::AdsMonthly | SectionKind::AdsWeekly | SectionKind::AdsCampaigns
        )
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for SectionKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl FromStr for SectionKind {
    type Err = ReportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        SectionKind::ordered()
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| ReportError::UnknownSection(value.to_string()))
    }
}

/// Text replacements applied to the fixed cover slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverText {
    pub addressee: String,
    pub branch: String,
    pub meeting: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeckPlan {
    pub store_name: String,
    pub period: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_path: Option<String>,
    pub cover: CoverText,
    pub slides: Vec<Slide>,
}

impl DeckPlan {
    pub fn with_template(mut self, template_path: impl Into<String>) -> Self {
        self.template_path = Some(template_path.into());
        self
    }

    /// Slides belonging to one section, continuation slides included.
    pub fn section(&self, kind: SectionKind) -> Vec<&Slide> {
        self.slides
            .iter()
            .filter(|slide| slide.section == kind)
            .collect()
    }

    /// Same as [`DeckPlan::section`], addressed by the section's name.
    pub fn section_named(&self, name: &str) -> Result<Vec<&Slide>, ReportError> {
        let kind: SectionKind = name.parse()?;
        Ok(self.section(kind))
    }

    pub fn tables(&self, kind: SectionKind) -> Vec<&DeckTable> {
        self.section(kind)
            .into_iter()
            .flat_map(|slide| slide.blocks.iter())
            .filter_map(|block| match block {
                Block::Table(table) => Some(table),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Slide {
    pub section: SectionKind,
    pub title: String,
    pub blocks: Vec<Block>,
}

impl Slide {
    pub(crate) fn new(section: SectionKind, title: impl Into<String>) -> Self {
        Self {
            section,
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    pub(crate) fn heading(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Text {
            role: TextRole::Heading,
            text: text.into(),
        });
    }

    pub(crate) fn text(&mut self, role: TextRole, text: impl Into<String>) {
        self.blocks.push(Block::Text {
            role,
            text: text.into(),
        });
    }

    pub(crate) fn notice(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Notice { text: text.into() });
    }

    /// Tables without data rows are dropped, the way the template leaves
    /// their area blank.
    pub(crate) fn table(&mut self, table: DeckTable) {
        if !table.rows.is_empty() {
            self.blocks.push(Block::Table(table));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextRole {
    Heading,
    Period,
    Caption,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Text { role: TextRole, text: String },
    Notice { text: String },
    Table(DeckTable),
    MetricCard(MetricCard),
    MonthCard(MonthCard),
    Callout(Callout),
    Proposal(ProposalCard),
    Chart(ChartSpec),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DeckTable {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_rows(mut self, rows: Vec<Vec<String>>, limit: usize) -> Self {
        self.rows = rows.into_iter().take(limit).collect();
        self
    }

    pub fn column(&self, header: &str) -> Option<Vec<&str>> {
        let idx = self.headers.iter().position(|h| h == header)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map(String::as_str).unwrap_or_default())
                .collect(),
        )
    }
}

/// Colour family of a badge, callout or proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Positive,
    Highlight,
    Negative,
    Caution,
    Neutral,
    Plain,
}

impl Tone {
    /// `(background, foreground)` as RGB hex.
    pub const fn palette(self) -> (&'static str, &'static str) {
        match self {
            Tone::Positive => ("E8F5E9", "27AE60"),
            Tone::Highlight => ("E3F2FD", "2E86AB"),
            Tone::Negative => ("FFEBEE", "E5533C"),
            Tone::Caution => ("FFF3E0", "F5A523"),
            Tone::Neutral => ("FAFAFA", "BBBBBB"),
            Tone::Plain => ("F0F4FA", "1A1A2E"),
        }
    }

    /// Tone of a free-text status badge written by the analyst.
    pub fn for_badge(badge: &str) -> Tone {
        match badge {
            "増加傾向" | "目標達成" | "回復傾向" => Tone::Positive,
            "大幅改善" => Tone::Highlight,
            "要改善" | "悪化" | "未達" => Tone::Negative,
            "横ばい" => Tone::Neutral,
            _ => Tone::Plain,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Badge {
    pub label: String,
    pub tone: Tone,
}

/// One of the four headline cards on the overall summary slide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    pub family: MetricFamily,
    pub title: String,
    pub value: String,
    pub detail: String,
    pub change: String,
    pub badge: Badge,
    pub note: String,
}

/// Per-month conversion card on the CV/CPA slide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthCard {
    pub month: String,
    pub achieved: bool,
    pub status: String,
    pub items: Vec<CardItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardItem {
    pub label: String,
    pub value: String,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Callout {
    pub heading: String,
    pub tone: Tone,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProposalCard {
    pub priority: String,
    pub tone: Tone,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Combo,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesStyle {
    Bar,
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub style: SeriesStyle,
    pub secondary_axis: bool,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    /// Serialized as `chart`; `kind` is taken by the block tag.
    #[serde(rename = "chart")]
    pub kind: ChartKind,
    pub categories: Vec<String>,
    pub series: Vec<ChartSeries>,
}

impl ChartSpec {
    pub(crate) fn bar(title: &str, categories: Vec<String>, name: &str, values: Vec<f64>) -> Self {
        Self {
            title: title.to_string(),
            kind: ChartKind::Bar,
            categories,
            series: vec![ChartSeries {
                name: name.to_string(),
                style: SeriesStyle::Bar,
                secondary_axis: false,
                values,
            }],
        }
    }

    /// Bars on the primary axis, a line on the secondary one.
    pub(crate) fn combo(
        title: &str,
        categories: Vec<String>,
        bar: (&str, Vec<f64>),
        line: (&str, Vec<f64>),
    ) -> Self {
        Self {
            title: title.to_string(),
            kind: ChartKind::Combo,
            categories,
            series: vec![
                ChartSeries {
                    name: bar.0.to_string(),
                    style: SeriesStyle::Bar,
                    secondary_axis: false,
                    values: bar.1,
                },
                ChartSeries {
                    name: line.0.to_string(),
                    style: SeriesStyle::Line,
                    secondary_axis: true,
                    values: line.1,
                },
            ],
        }
    }
}

/// Builds the content plan for every slide after the fixed cover and
/// table of contents.
pub fn plan_deck(data: &ReportData) -> DeckPlan {
    let store_name = data.store_name.clone().unwrap_or_else(|| "○○".to_string());
    let period = data.period.clone().unwrap_or_else(|| "○年○月".to_string());
    let cover = CoverText {
        addressee: format!("{store_name}様"),
        branch: format!("（プロタイムズ {store_name}）"),
        meeting: format!("{period}　アクセル定例MTG"),
    };

    let mut slides = Vec::new();
    for kind in SectionKind::ordered() {
        if kind.is_ads() && !data.has_ads() {
            continue;
        }
        let produced = plan_section(data, kind);
        debug!(section = %kind, slides = produced.len(), "planned section");
        slides.extend(produced);
    }

    info!(
        store = %store_name,
        slides = slides.len(),
        ads = data.has_ads(),
        "deck plan ready"
    );

    DeckPlan {
        store_name,
        period,
        template_path: None,
        cover,
        slides,
    }
}

/// Slides for a single section. Most sections produce one slide; the area
/// search section adds continuation slides when its queries overflow.
pub fn plan_section(data: &ReportData, kind: SectionKind) -> Vec<Slide> {
    match kind {
        SectionKind::Conversions => vec![sections::conversions(data)],
        SectionKind::Summary => vec![sections::summary(data)],
        SectionKind::Detail => vec![sections::detail(data)],
        SectionKind::MonthlyAnalytics => vec![sections::monthly_analytics(data)],
        SectionKind::MonthlySearch => vec![sections::monthly_search(data)],
        SectionKind::AreaSearch => sections::area_search(data),
        SectionKind::Analysis => vec![sections::analysis(data)],
        SectionKind::Proposals => vec![sections::proposals(data)],
        SectionKind::PageMetrics => vec![sections::page_metrics(data)],
        SectionKind::TrafficCurrent => vec![sections::traffic(
            kind,
            &data.traffic_sources_1st,
            sections::CURRENT_MONTH,
        )],
        SectionKind::TrafficPrevious => vec![sections::traffic(
            kind,
            &data.traffic_sources_2nd,
            sections::PREVIOUS_MONTH,
        )],
        SectionKind::AreaTrafficCurrent => vec![sections::area_traffic(
            kind,
            &data.area_traffic_1st,
            sections::CURRENT_MONTH,
        )],
        SectionKind::AreaTrafficPrevious => vec![sections::area_traffic(
            kind,
            &data.area_traffic_2nd,
            sections::PREVIOUS_MONTH,
        )],
        SectionKind::AdsMonthly => vec![ads::monthly(data)],
        SectionKind::AdsWeekly => vec![ads::weekly(data)],
        SectionKind::AdsCampaigns => vec![ads::campaigns(data)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_names_round_trip_through_from_str() {
        for kind in SectionKind::ordered() {
            assert_eq!(kind.name().parse::<SectionKind>().expect("known"), kind);
        }
        assert!(matches!(
            "slides".parse::<SectionKind>(),
            Err(ReportError::UnknownSection(name)) if name == "slides"
        ));
    }

    #[test]
    fn badge_tones_follow_badge_table() {
        assert_eq!(Tone::for_badge("増加傾向"), Tone::Positive);
        assert_eq!(Tone::for_badge("大幅改善"), Tone::Highlight);
        assert_eq!(Tone::for_badge("未達"), Tone::Negative);
        assert_eq!(Tone::for_badge("横ばい"), Tone::Neutral);
        assert_eq!(Tone::for_badge(""), Tone::Plain);
    }

    #[test]
    fn empty_tables_are_not_placed() {
        let mut slide = Slide::new(SectionKind::Detail, "詳細サマリー");
        slide.table(DeckTable::new(["月"]));
        assert!(slide.blocks.is_empty());
    }

    #[test]
    fn cover_defaults_to_placeholders() {
        let plan = plan_deck(&ReportData::default());
        assert_eq!(plan.cover.addressee, "○○様");
        assert_eq!(plan.cover.meeting, "○年○月　アクセル定例MTG");
        assert!(plan.section(SectionKind::AdsMonthly).is_empty());
    }
}
