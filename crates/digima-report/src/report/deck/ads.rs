use super::{Block, ChartKind, ChartSeries, ChartSpec, DeckTable, SectionKind, SeriesStyle, Slide, TextRole};
use crate::report::data::{AdsMetrics, ReportData};
use crate::report::format::{amount, month_short, ratio_percent, thousands, thousands_fixed, week_label};
use crate::report::quantity::Quantity;
use std::collections::BTreeSet;

const TOP_CAMPAIGNS: usize = 5;
const NO_DATA: &str = "データがありません";

pub(crate) fn monthly(data: &ReportData) -> Slide {
    let mut slide = Slide::new(SectionKind::AdsMonthly, "広告基本指標 (Ads)");
    if data.ads_monthly.is_empty() {
        slide.notice(NO_DATA);
        return slide;
    }

    let mut months: Vec<_> = data.ads_monthly.iter().collect();
    months.sort_by(|a, b| a.ym_raw.cmp(&b.ym_raw));

    let rows = months
        .iter()
        .map(|m| metrics_row(m.ym.clone(), &m.metrics))
        .collect();
    slide.table(DeckTable::new(metric_headers("年月（日付）")).with_rows(rows, usize::MAX));

    let categories: Vec<String> = months.iter().map(|m| month_short(&m.ym)).collect();
    slide.blocks.push(Block::Chart(ChartSpec::bar(
        "コスト (Ads)\nby Month",
        categories.clone(),
        "Cost",
        months.iter().map(|m| m.metrics.cost.as_f64()).collect(),
    )));
    slide.blocks.push(Block::Chart(ChartSpec::combo(
        "CV・CVR (Ads)\nby Month",
        categories,
        ("CV", months.iter().map(|m| m.metrics.cv.as_f64()).collect()),
        ("CVR", months.iter().map(|m| m.metrics.cvr.as_f64()).collect()),
    )));
    slide
}

pub(crate) fn weekly(data: &ReportData) -> Slide {
    let mut slide = Slide::new(SectionKind::AdsWeekly, "広告基本指標_週次 (Ads)");
    if data.ads_weekly.is_empty() {
        slide.notice(NO_DATA);
        return slide;
    }

    let mut weeks: Vec<_> = data.ads_weekly.iter().collect();
    weeks.sort_by(|a, b| a.week.cmp(&b.week));

    let rows = weeks
        .iter()
        .map(|w| metrics_row(w.week.clone(), &w.metrics))
        .collect();
    slide.table(DeckTable::new(metric_headers("週毎（日付）")).with_rows(rows, usize::MAX));

    let categories: Vec<String> = weeks.iter().map(|w| week_label(&w.week)).collect();
    let series = |pick: fn(&AdsMetrics) -> f64| weeks.iter().map(|w| pick(&w.metrics)).collect::<Vec<_>>();
    slide.blocks.push(Block::Chart(ChartSpec::combo(
        "表示回数-クリック数 (Ads)",
        categories.clone(),
        ("Click", series(|m| m.clicks.as_f64())),
        ("Imp", series(|m| m.impressions.as_f64())),
    )));
    slide.blocks.push(Block::Chart(ChartSpec::combo(
        "CV-CPA (Ads)",
        categories,
        ("CPA", series(|m| m.cpa.unwrap_or_default().as_f64())),
        ("CV", series(|m| m.cv.as_f64())),
    )));
    slide
}

/// Cost trend of the costliest campaigns plus a breakdown of the latest month.
pub(crate) fn campaigns(data: &ReportData) -> Slide {
    const TITLE: &str = "キャンペーン指標推移（費用）";
    let mut slide = Slide::new(SectionKind::AdsCampaigns, TITLE);
    let rows = &data.ads_campaigns;
    if rows.is_empty() {
        slide.notice(NO_DATA);
        return slide;
    }

    let months: Vec<&str> = rows
        .iter()
        .map(|row| row.ym_raw.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut costs: Vec<(&str, Vec<f64>)> = Vec::new();
    for row in rows {
        let idx = match costs.iter().position(|(name, _)| *name == row.campaign) {
            Some(idx) => idx,
            None => {
                costs.push((row.campaign.as_str(), vec![0.0; months.len()]));
                costs.len() - 1
            }
        };
        if let Some(slot) = months.iter().position(|ym| *ym == row.ym_raw) {
            costs[idx].1[slot] += row.metrics.cost.as_f64();
        }
    }
    costs.sort_by(|a, b| {
        let total = |values: &Vec<f64>| values.iter().sum::<f64>();
        total(&b.1).total_cmp(&total(&a.1))
    });
    costs.truncate(TOP_CAMPAIGNS);

    slide.heading(TITLE);
    slide.blocks.push(Block::Chart(ChartSpec {
        title: TITLE.to_string(),
        kind: ChartKind::Line,
        categories: months.iter().map(|ym| ym.to_string()).collect(),
        series: costs
            .into_iter()
            .map(|(name, values)| ChartSeries {
                name: name.to_string(),
                style: SeriesStyle::Line,
                secondary_axis: false,
                values,
            })
            .collect(),
    }));

    slide.text(TextRole::Caption, "広告基本指標_週次・キャンペーン (Ads)");
    let latest = months.last().copied().unwrap_or_default();
    let latest_rows = rows
        .iter()
        .filter(|row| row.ym_raw == latest)
        .map(|row| {
            let m = &row.metrics;
            vec![
                month_short(&row.ym),
                row.campaign.clone(),
                thousands_fixed(m.cost.as_f64(), 0),
                format!("{:.2}", m.cv.as_f64()),
                nonzero_fixed(m.cpa),
                thousands(m.clicks),
                nonzero_fixed(m.cpc),
                format!("{:.2}%", m.ctr.as_f64() * 100.0),
                thousands(m.impressions),
                ratio_percent(m.cvr),
            ]
        })
        .collect();
    slide.table(
        DeckTable::new([
            "年月",
            "キャンペーン名",
            "費用",
            "CV",
            "CPA",
            "クリック",
            "CPC",
            "CTR",
            "表示回数",
            "CVR",
        ])
        .with_rows(latest_rows, usize::MAX),
    );
    slide
}

fn metric_headers(first: &str) -> [&str; 9] {
    [first, "費用", "CV", "CPA", "クリック", "CPC", "CTR", "表示回数", "CVR"]
}

fn metrics_row(label: String, m: &AdsMetrics) -> Vec<String> {
    let cpa = if m.cv.as_f64() > 0.0 {
        thousands_fixed(m.cpa.unwrap_or_default().as_f64(), 0)
    } else {
        String::new()
    };
    vec![
        label,
        amount(m.cost),
        thousands_fixed(m.cv.as_f64(), 2),
        cpa,
        thousands(m.clicks),
        thousands_fixed(m.cpc.unwrap_or_default().as_f64(), 0),
        ratio_percent(m.ctr),
        thousands(m.impressions),
        ratio_percent(m.cvr),
    ]
}

fn nonzero_fixed(value: Option<Quantity>) -> String {
    match value {
        Some(v) if !v.is_zero() => thousands_fixed(v.as_f64(), 0),
        _ => String::new(),
    }
}
