use super::{
    Badge, Block, Callout, CardItem, DeckTable, MetricCard, MonthCard, ProposalCard, SectionKind,
    Slide, TextRole, Tone,
};
use crate::report::data::{MonthlySnapshot, ReportData, TrafficSource};
use crate::report::format::{
    percent, period_label, signed_delta, signed_percent, thousands, thousands_opt, yen, MISSING,
};
use crate::report::quantity::Quantity;
use crate::report::summary::{MetricFamily, MetricSummary};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

pub(crate) const CURRENT_MONTH: &str = "当月";
pub(crate) const PREVIOUS_MONTH: &str = "前月";

const CPA_CEILING: i64 = 50_000;
const MONTH_CARDS: usize = 3;
const AREA_QUERIES_PER_PAGE: usize = 8;
const ANALYSIS_MARKERS: [&str; 3] = ["①", "②", "③"];

pub(crate) fn conversions(data: &ReportData) -> Slide {
    let mut slide = Slide::new(SectionKind::Conversions, "実績比較（CV・CPA）");
    push_period(&mut slide, data);

    let newest_first: Vec<_> = data.cv_months.iter().rev().collect();
    for month in newest_first.iter().take(MONTH_CARDS) {
        let actual = month.actual.unwrap_or_default();
        let achieved = month.achieved();
        let cpa_tone = if month.cpa <= Quantity::Int(CPA_CEILING) {
            Tone::Positive
        } else {
            Tone::Negative
        };
        slide.blocks.push(Block::MonthCard(MonthCard {
            month: month.ym.clone(),
            achieved,
            status: if achieved { "✅ 達成" } else { "❌ 未達" }.to_string(),
            items: vec![
                card_item("目標CV", format!("{}件", month.target), Tone::Plain),
                card_item("実績CV", format!("{actual}件"), Tone::Plain),
                card_item("広告費", yen(month.budget), Tone::Plain),
                card_item("CPA", yen(month.cpa), cpa_tone),
            ],
        }));
    }

    let rows = newest_first
        .iter()
        .map(|month| {
            vec![
                month.ym_short.clone(),
                month.target.to_string(),
                month
                    .actual
                    .map(|actual| actual.to_string())
                    .unwrap_or_else(|| MISSING.to_string()),
                yen(month.budget),
                yen(month.cpa),
            ]
        })
        .collect();
    slide.table(DeckTable::new(["月", "目標CV", "実績CV", "広告費", "CPA"]).with_rows(rows, usize::MAX));

    slide.blocks.push(Block::Callout(Callout {
        heading: "📝 コメント".to_string(),
        tone: Tone::Plain,
        items: vec![data.cv_comment.clone()],
    }));
    slide
}

pub(crate) fn summary(data: &ReportData) -> Slide {
    let mut slide = Slide::new(SectionKind::Summary, "全体サマリー");
    push_period(&mut slide, data);

    for family in MetricFamily::ordered() {
        let metric = data.summary.metric(family);
        slide.blocks.push(Block::MetricCard(metric_card(family, &metric)));
    }

    slide.blocks.push(Block::Callout(Callout {
        heading: "📊 サマリー分析".to_string(),
        tone: Tone::Plain,
        items: vec![data.analysis.analysis_text.clone()],
    }));
    slide
}

fn metric_card(family: MetricFamily, metric: &MetricSummary) -> MetricCard {
    let value = integer(&metric.value);
    let (value, detail, change) = match family {
        MetricFamily::Sessions => (
            value.map(|v| thousands(Quantity::Int(v))),
            integer(&metric.prev)
                .map(|prev| format!("前月: {}", thousands(Quantity::Int(prev))))
                .unwrap_or_default(),
            percent_line(metric),
        ),
        MetricFamily::AreaSessions | MetricFamily::Inquiry => (
            value.map(|v| thousands(Quantity::Int(v))),
            format!(
                "率: {}%→{}%",
                plain(&metric.prev_rate),
                plain(&metric.rate)
            ),
            percent_line(metric),
        ),
        MetricFamily::Cv => {
            let diff = metric.diff.clone().unwrap_or_else(|| Value::from(0));
            let sign = if diff.as_f64().unwrap_or_default() >= 0.0 {
                "+"
            } else {
                ""
            };
            (
                value.map(|v| format!("{v}件")),
                format!("前月: {}件", plain(&metric.prev)),
                format!("前月比 {sign}{}件", plain(&Some(diff))),
            )
        }
    };

    let badge = metric.badge.clone().unwrap_or_default();
    MetricCard {
        family,
        title: family.label().to_string(),
        value: value.unwrap_or_else(|| MISSING.to_string()),
        detail,
        change,
        badge: Badge {
            tone: Tone::for_badge(&badge),
            label: badge,
        },
        note: metric.badge_sub.clone().unwrap_or_default(),
    }
}

fn percent_line(metric: &MetricSummary) -> String {
    format!("前月比 {}", signed_percent(metric.diff_pct.unwrap_or_default()))
}

pub(crate) fn detail(data: &ReportData) -> Slide {
    let mut slide = Slide::new(SectionKind::Detail, "詳細サマリー");
    let newest_first: Vec<&MonthlySnapshot> = data.ga4_monthly.iter().rev().collect();

    slide.heading("■ 全体指標（3ヶ月）");
    let overall = newest_first
        .iter()
        .map(|m| {
            vec![
                m.ym_short.clone(),
                thousands_opt(m.sessions),
                thousands_opt(m.users),
                thousands_opt(m.pvs),
                percent(m.bounce),
                m.duration.clone(),
            ]
        })
        .collect();
    slide.table(
        DeckTable::new(["月", "セッション", "ユーザー", "PV", "直帰率", "滞在時間"])
            .with_rows(overall, usize::MAX),
    );

    slide.heading("■ 流入元内訳（5分類）");
    let channels = newest_first
        .iter()
        .map(|m| {
            let mut row = vec![m.ym_short.clone()];
            row.extend(
                [m.organic, m.cpc, m.direct, m.referral, m.social]
                    .into_iter()
                    .map(raw),
            );
            row
        })
        .collect();
    slide.table(
        DeckTable::new(["月", "自然流入", "広告流入", "直接流入", "被リンク流入", "SNS流入"])
            .with_rows(channels, usize::MAX),
    );

    slide.heading("■ 商圏・問い合わせ・デバイス");
    let reach = newest_first
        .iter()
        .map(|m| {
            vec![
                m.ym_short.clone(),
                thousands_opt(m.area_sessions),
                percent(m.area_rate),
                thousands_opt(m.inquiry_views),
                percent(m.inquiry_rate),
                percent(m.mobile),
                percent(m.desktop),
            ]
        })
        .collect();
    slide.table(
        DeckTable::new(["月", "商圏セッション", "商圏率", "問合遷移", "問合率", "モバイル%", "PC%"])
            .with_rows(reach, usize::MAX),
    );
    slide
}

pub(crate) fn monthly_analytics(data: &ReportData) -> Slide {
    let mut slide = Slide::new(SectionKind::MonthlyAnalytics, "月別GA4分析");
    let months = &data.ga4_monthly;
    let newest_first: Vec<&MonthlySnapshot> = months.iter().rev().collect();
    let month_headers = || newest_first.iter().map(|m| m.ym_short.clone());

    slide.heading("■ 問い合わせページ内訳");
    let paths = first_seen(
        months
            .iter()
            .flat_map(|m| m.inquiry_details.iter().map(|it| it.path.as_str())),
    );
    let per_month: Vec<HashMap<&str, Quantity>> = newest_first
        .iter()
        .map(|m| {
            m.inquiry_details
                .iter()
                .map(|it| (it.path.as_str(), it.views))
                .collect()
        })
        .collect();
    slide.table(
        DeckTable::new(std::iter::once("パス".to_string()).chain(month_headers()))
            .with_rows(merged_rows(&paths, &per_month, zero_as_missing), 3),
    );

    slide.heading("■ 商圏内 市区町村別SS");
    let cities = first_seen(
        months
            .iter()
            .flat_map(|m| m.area_by_city.iter().map(|c| c.city.as_str())),
    );
    let per_month: Vec<HashMap<&str, Quantity>> = newest_first
        .iter()
        .map(|m| {
            m.area_by_city
                .iter()
                .map(|c| (c.city.as_str(), c.sessions))
                .collect()
        })
        .collect();
    slide.table(
        DeckTable::new(std::iter::once("市区町村".to_string()).chain(month_headers()))
            .with_rows(merged_rows(&cities, &per_month, thousands), 8),
    );

    slide.heading("■ キーイベント内訳");
    let events = first_seen(months.iter().flat_map(|m| {
        m.key_events
            .details
            .iter()
            .map(|it| it.event_name.as_str())
    }));
    let per_month: Vec<HashMap<&str, Quantity>> = newest_first
        .iter()
        .map(|m| {
            m.key_events
                .details
                .iter()
                .map(|it| (it.event_name.as_str(), it.count))
                .collect()
        })
        .collect();
    let mut rows: Vec<Vec<String>> = vec![std::iter::once("【合計】".to_string())
        .chain(newest_first.iter().map(|m| thousands(m.key_events.total)))
        .collect()];
    rows.extend(merged_rows(&events, &per_month, zero_as_missing));
    slide.table(
        DeckTable::new(std::iter::once("イベント名".to_string()).chain(month_headers()))
            .with_rows(rows, 15),
    );
    slide
}

pub(crate) fn monthly_search(data: &ReportData) -> Slide {
    let mut slide = Slide::new(SectionKind::MonthlySearch, "月別サーチコンソール分析");
    let months = &data.gsc_monthly;

    slide.heading("■ 全体指標");
    let overall = months
        .iter()
        .rev()
        .map(|m| {
            vec![
                m.ym_short.clone(),
                thousands(m.clicks),
                thousands(m.impressions),
                format!("{:.2}%", m.ctr),
                format!("{:.1}", m.position),
            ]
        })
        .collect();
    slide.table(
        DeckTable::new(["月", "クリック", "表示回数", "CTR(%)", "平均順位"]).with_rows(overall, usize::MAX),
    );

    if let [.., previous, current] = months.as_slice() {
        for (month, label) in [(current, CURRENT_MONTH), (previous, PREVIOUS_MONTH)] {
            slide.heading(format!("■ クエリ Top（{}:{label}）", month.ym_short));
            let rows = month
                .queries
                .iter()
                .map(|q| {
                    vec![
                        q.query.clone(),
                        q.clicks.to_string(),
                        q.imps.to_string(),
                        format!("{:.1}%", q.ctr),
                        format!("{:.1}", q.pos),
                    ]
                })
                .collect();
            slide.table(DeckTable::new(["クエリ", "CL", "Imp", "CTR", "順位"]).with_rows(rows, 7));
        }
    }
    slide
}

/// Area search results, paged eight queries at a time.
///
/// The input lists months newest first: index 0 is the current month and
/// index 1, when present, the previous one.
pub(crate) fn area_search(data: &ReportData) -> Vec<Slide> {
    const TITLE: &str = "商圏サーチコンソール分析";
    if data.gsc_area_monthly.is_empty() {
        let mut slide = Slide::new(SectionKind::AreaSearch, TITLE);
        slide.notice("データがありません");
        return vec![slide];
    }

    let columns: Vec<(String, Vec<Vec<String>>)> = data
        .gsc_area_monthly
        .iter()
        .zip([CURRENT_MONTH, PREVIOUS_MONTH])
        .map(|(month, label)| {
            let rows = month
                .areas
                .iter()
                .flat_map(|area| area.queries.iter())
                .map(|q| {
                    vec![
                        q.query.clone(),
                        q.clicks.to_string(),
                        q.impressions.to_string(),
                        format!("{:.1}%", q.ctr),
                        format!("{:.1}", q.position),
                    ]
                })
                .collect();
            (format!("■ 商圏クエリ実績（{}:{label}）", month.ym_short), rows)
        })
        .collect();

    let longest = columns.iter().map(|(_, rows)| rows.len()).max().unwrap_or(0);
    let pages = longest.div_ceil(AREA_QUERIES_PER_PAGE).max(1);

    (0..pages)
        .map(|page| {
            let title = if page == 0 {
                TITLE.to_string()
            } else {
                format!("{TITLE}（続き）")
            };
            let mut slide = Slide::new(SectionKind::AreaSearch, title);
            let start = page * AREA_QUERIES_PER_PAGE;
            for (heading, rows) in &columns {
                slide.heading(heading.clone());
                let page_rows: Vec<Vec<String>> = rows
                    .iter()
                    .skip(start)
                    .take(AREA_QUERIES_PER_PAGE)
                    .cloned()
                    .collect();
                if page_rows.is_empty() {
                    slide.notice("表示するクエリがありません");
                } else {
                    slide.table(
                        DeckTable::new(["クエリ", "CL", "Imp", "CTR", "順位"])
                            .with_rows(page_rows, usize::MAX),
                    );
                }
            }
            slide
        })
        .collect()
}

pub(crate) fn analysis(data: &ReportData) -> Slide {
    let mut slide = Slide::new(SectionKind::Analysis, "当月分析");
    slide.blocks.push(Block::Callout(Callout {
        heading: "✅ 良かった点".to_string(),
        tone: Tone::Positive,
        items: numbered(&data.analysis.good),
    }));
    slide.blocks.push(Block::Callout(Callout {
        heading: "⚠️ 課題・改善点".to_string(),
        tone: Tone::Negative,
        items: numbered(&data.analysis.issues),
    }));
    slide
}

pub(crate) fn proposals(data: &ReportData) -> Slide {
    let mut slide = Slide::new(SectionKind::Proposals, "改善提案（優先度順）");
    for proposal in &data.proposals {
        let (tone, priority) = match proposal.color.as_str() {
            "red" => (Tone::Negative, "🔴 最優先"),
            "orange" => (Tone::Caution, "🟠 優先"),
            "blue" => (Tone::Highlight, "🔵 適宜"),
            _ => (Tone::Plain, "●"),
        };
        slide.blocks.push(Block::Proposal(ProposalCard {
            priority: priority.to_string(),
            tone,
            title: proposal.title.clone(),
            body: proposal.body.clone(),
        }));
    }
    slide
}

pub(crate) fn page_metrics(data: &ReportData) -> Slide {
    let mut slide = Slide::new(SectionKind::PageMetrics, "ページ別指標（GA4）2ヶ月並列");
    for pages in [&data.page_metrics_1st, &data.page_metrics_2nd] {
        let Some(first) = pages.first() else {
            continue;
        };
        slide.heading(format!("■ {}", first.ym));
        let rows = pages
            .iter()
            .map(|page| {
                vec![
                    page.page_path.clone(),
                    thousands(page.pageviews),
                    page.duration.clone(),
                    thousands(page.total_users),
                ]
            })
            .collect();
        slide.table(DeckTable::new(["ページパス", "PV", "滞在時間", "ユーザー"]).with_rows(rows, 10));
    }
    slide
}

pub(crate) fn traffic(kind: SectionKind, sources: &[TrafficSource], month_label: &str) -> Slide {
    let mut slide = Slide::new(kind, format!("分析：流入（{month_label}）（GA4）"));
    let Some(first) = sources.first() else {
        return slide;
    };
    slide.heading(format!("■ {}", first.ym.as_deref().unwrap_or_default()));
    let rows = sources
        .iter()
        .map(|source| {
            vec![
                source.source_medium.clone(),
                thousands(source.sessions),
                signed_delta(source.sessions_delta),
                thousands(source.total_users),
                signed_delta(source.total_users_delta),
            ]
        })
        .collect();
    slide.table(
        DeckTable::new([
            "参照元/メディア",
            "セッション",
            "セッション前月差分",
            "ユーザー",
            "ユーザー前月差分",
        ])
        .with_rows(rows, 10),
    );
    slide
}

pub(crate) fn area_traffic(kind: SectionKind, sources: &[TrafficSource], month_label: &str) -> Slide {
    let mut slide = Slide::new(kind, format!("分析：商圏内流入（{month_label}）（GA4）"));
    let Some(first) = sources.first() else {
        return slide;
    };
    let label = first.ym.as_deref().unwrap_or(month_label);
    slide.heading(format!("■ {label}　対象エリア: 設定された各商圏"));
    let rows = sources
        .iter()
        .map(|source| {
            vec![
                source.source_medium.clone(),
                source.city.clone().unwrap_or_else(|| MISSING.to_string()),
                thousands(source.sessions),
                signed_delta(source.sessions_delta),
                thousands(source.total_users),
                signed_delta(source.total_users_delta),
            ]
        })
        .collect();
    slide.table(
        DeckTable::new([
            "セッションの参照元/メディア",
            "対象エリア",
            "セッション",
            "セッション前月差分",
            "ユーザー",
            "ユーザー前月差分",
        ])
        .with_rows(rows, 15),
    );
    slide
}

/// Only three numbered slots exist per column; extra items are dropped.
fn numbered(items: &[String]) -> Vec<String> {
    ANALYSIS_MARKERS
        .iter()
        .zip(items)
        .map(|(marker, item)| format!("{marker}  {item}"))
        .collect()
}

fn push_period(slide: &mut Slide, data: &ReportData) {
    if let Some(period) = data.period_1st.as_deref().filter(|p| !p.is_empty()) {
        slide.text(TextRole::Period, format!("【対象期間：{}】", period_label(period)));
    }
}

fn card_item(label: &str, value: String, tone: Tone) -> CardItem {
    CardItem {
        label: label.to_string(),
        value,
        tone,
    }
}

/// Keys in the order they first appear across all months.
fn first_seen<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    keys.filter(|key| seen.insert(*key)).collect()
}

fn merged_rows(
    keys: &[&str],
    per_month: &[HashMap<&str, Quantity>],
    cell: fn(Quantity) -> String,
) -> Vec<Vec<String>> {
    keys.iter()
        .map(|key| {
            std::iter::once(key.to_string())
                .chain(
                    per_month
                        .iter()
                        .map(|month| cell(month.get(*key).copied().unwrap_or_default())),
                )
                .collect()
        })
        .collect()
}

fn zero_as_missing(value: Quantity) -> String {
    if value.is_zero() {
        MISSING.to_string()
    } else {
        thousands(value)
    }
}

fn raw(value: Option<Quantity>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| MISSING.to_string())
}

/// Summary values count as whole numbers only when stored as JSON integers.
fn integer(value: &Option<Value>) -> Option<i64> {
    value.as_ref().and_then(Value::as_i64)
}

fn plain(value: &Option<Value>) -> String {
    match value {
        None => MISSING.to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Value) -> ReportData {
        ReportData::load_value(value).expect("valid report data")
    }

    fn tables(slide: &Slide) -> Vec<&DeckTable> {
        slide
            .blocks
            .iter()
            .filter_map(|block| match block {
                Block::Table(table) => Some(table),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn conversion_cards_run_newest_first_and_flag_cpa() {
        let data = data(json!({
            "period_1st": "2025年6月 (2025-06-20 時点)",
            "cv_months": [
                { "ym": "2025年5月", "ym_short": "5月", "target": 5, "actual": 6, "budget": 300000, "cpa": 50000 },
                { "ym": "2025年6月", "ym_short": "6月", "target": 5, "actual": 3, "budget": 300000, "cpa": 100000 }
            ]
        }));
        let slide = conversions(&data);

        assert!(matches!(
            &slide.blocks[0],
            Block::Text { role: TextRole::Period, text } if text == "【対象期間：2025/6/1～2025/6/20】"
        ));
        let cards: Vec<&MonthCard> = slide
            .blocks
            .iter()
            .filter_map(|block| match block {
                Block::MonthCard(card) => Some(card),
                _ => None,
            })
            .collect();
        assert_eq!(cards[0].month, "2025年6月");
        assert_eq!(cards[0].status, "❌ 未達");
        assert_eq!(cards[0].items[3].value, "¥100,000");
        assert_eq!(cards[0].items[3].tone, Tone::Negative);
        assert!(cards[1].achieved);
        assert_eq!(cards[1].items[3].tone, Tone::Positive);
        assert_eq!(tables(&slide)[0].rows[0], vec!["6月", "5", "3", "¥300,000", "¥100,000"]);
    }

    #[test]
    fn summary_cards_format_each_family() {
        let data = data(json!({
            "ga4_monthly": [
                { "sessions": 1000, "area_sessions": 300, "area_rate": 30.0, "inquiry_views": 50, "inquiry_rate": 5.0 },
                { "sessions": 1500, "area_sessions": 300, "area_rate": 20.0, "inquiry_views": 40, "inquiry_rate": 2.7 }
            ],
            "cv_months": [ { "actual": 4 }, { "actual": 2 } ],
            "summary": { "sessions": { "badge": "増加傾向" } }
        }));
        let slide = summary(&data);
        let cards: Vec<&MetricCard> = slide
            .blocks
            .iter()
            .filter_map(|block| match block {
                Block::MetricCard(card) => Some(card),
                _ => None,
            })
            .collect();

        assert_eq!(cards[0].value, "1,500");
        assert_eq!(cards[0].detail, "前月: 1,000");
        assert_eq!(cards[0].change, "前月比 +50.0%");
        assert_eq!(cards[0].badge.tone, Tone::Positive);
        assert_eq!(cards[1].detail, "率: 30.0%→20.0%");
        assert_eq!(cards[1].change, "前月比 +0.0%");
        assert_eq!(cards[2].change, "前月比 -20.0%");
        assert_eq!(cards[3].value, "2件");
        assert_eq!(cards[3].detail, "前月: 4件");
        assert_eq!(cards[3].change, "前月比 -2件");
        assert_eq!(cards[3].badge.tone, Tone::Plain);
    }

    #[test]
    fn conversion_card_prints_zero_previous_month() {
        let data = data(json!({ "cv_months": [ { "actual": 0 }, { "actual": 3 } ] }));
        let card = metric_card(MetricFamily::Cv, &data.summary.metric(MetricFamily::Cv));
        assert_eq!(card.value, "3件");
        assert_eq!(card.detail, "前月: 0件");
        assert_eq!(card.change, "前月比 +3件");

        let empty = metric_card(MetricFamily::Cv, &MetricSummary::default());
        assert_eq!(empty.detail, "前月: -件");
    }

    #[test]
    fn merged_tables_keep_first_seen_order_and_dash_zeroes() {
        let data = data(json!({
            "ga4_monthly": [
                { "ym_short": "5月",
                  "inquiry_details": [ { "path": "/contact", "views": 4 } ],
                  "area_by_city": [ { "city": "川口市", "sessions": 10 } ],
                  "key_events": { "total": 3, "details": [ { "event_name": "tel_tap", "count": 3 } ] } },
                { "ym_short": "6月",
                  "inquiry_details": [ { "path": "/estimate", "views": 1200 }, { "path": "/contact", "views": 2 } ],
                  "area_by_city": [ { "city": "蕨市", "sessions": 5 } ],
                  "key_events": { "total": 1, "details": [ { "event_name": "form_submit", "count": 1 } ] } }
            ]
        }));
        let slide = monthly_analytics(&data);
        let tables = tables(&slide);

        assert_eq!(tables[0].headers, vec!["パス", "6月", "5月"]);
        assert_eq!(tables[0].rows[0], vec!["/contact", "2", "4"]);
        assert_eq!(tables[0].rows[1], vec!["/estimate", "1,200", "-"]);
        assert_eq!(tables[1].rows[0], vec!["川口市", "0", "10"]);
        assert_eq!(tables[2].rows[0], vec!["【合計】", "1", "3"]);
        assert_eq!(tables[2].rows[1], vec!["tel_tap", "-", "3"]);
    }

    #[test]
    fn query_tables_need_two_months() {
        let one = data(json!({ "gsc_monthly": [ { "ym_short": "6月", "queries": [ { "query": "外壁塗装" } ] } ] }));
        assert_eq!(tables(&monthly_search(&one)).len(), 1);

        let queries: Vec<Value> = (0..9)
            .map(|i| json!({ "query": format!("q{i}"), "clicks": i, "imps": 10, "ctr": 12.345, "pos": 3.21 }))
            .collect();
        let two = data(json!({
            "gsc_monthly": [
                { "ym_short": "5月", "ctr": 1.5, "position": 9.87 },
                { "ym_short": "6月", "queries": queries }
            ]
        }));
        let slide = monthly_search(&two);
        let tables = tables(&slide);
        assert_eq!(tables[0].rows[1], vec!["5月", "0", "0", "1.50%", "9.9"]);
        assert_eq!(tables[1].rows.len(), 7);
        assert_eq!(tables[1].rows[0], vec!["q0", "0", "10", "12.3%", "3.2"]);
        assert!(slide.blocks.iter().any(|block| matches!(
            block,
            Block::Text { text, .. } if text == "■ クエリ Top（6月:当月）"
        )));
    }

    #[test]
    fn area_search_pages_overflowing_queries() {
        let queries: Vec<Value> = (0..10)
            .map(|i| json!({ "query": format!("塗装 {i}"), "clicks": 1, "impressions": 5 }))
            .collect();
        let data = data(json!({
            "gsc_area_monthly": [
                { "ym_short": "6月", "areas": [ { "area": "川口", "queries": queries } ] },
                { "ym_short": "5月", "areas": [] }
            ]
        }));
        let slides = area_search(&data);

        assert_eq!(slides.len(), 2);
        assert_eq!(slides[1].title, "商圏サーチコンソール分析（続き）");
        assert_eq!(tables(&slides[0])[0].rows.len(), 8);
        assert_eq!(tables(&slides[1])[0].rows.len(), 2);
        assert!(slides[0].blocks.iter().any(|block| matches!(
            block,
            Block::Notice { text } if text == "表示するクエリがありません"
        )));
    }

    #[test]
    fn empty_area_search_is_a_single_notice() {
        let slides = area_search(&ReportData::default());
        assert_eq!(slides.len(), 1);
        assert!(matches!(&slides[0].blocks[..], [Block::Notice { text }] if text == "データがありません"));
    }

    #[test]
    fn analysis_items_are_numbered_up_to_three() {
        let data = data(json!({
            "analysis": { "good": ["a", "b", "c", "d"], "issues": ["x"] }
        }));
        let slide = analysis(&data);
        let Block::Callout(good) = &slide.blocks[0] else {
            panic!("expected callout");
        };
        assert_eq!(good.items, vec!["①  a", "②  b", "③  c"]);
    }

    #[test]
    fn proposal_priority_follows_colour() {
        let data = data(json!({
            "proposals": [ { "color": "red", "title": "A" }, { "title": "B" }, { "color": "green" } ]
        }));
        let slide = proposals(&data);
        let priorities: Vec<&str> = slide
            .blocks
            .iter()
            .filter_map(|block| match block {
                Block::Proposal(card) => Some(card.priority.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(priorities, vec!["🔴 最優先", "🔵 適宜", "●"]);
    }

    #[test]
    fn area_traffic_falls_back_to_month_label_and_dash_city() {
        let sources = vec![TrafficSource {
            source_medium: "google / organic".to_string(),
            sessions: Quantity::Int(1200),
            sessions_delta: Some(Quantity::Int(30)),
            ..TrafficSource::default()
        }];
        let slide = area_traffic(SectionKind::AreaTrafficCurrent, &sources, CURRENT_MONTH);
        assert_eq!(slide.title, "分析：商圏内流入（当月）（GA4）");
        assert!(matches!(
            &slide.blocks[0],
            Block::Text { text, .. } if text == "■ 当月　対象エリア: 設定された各商圏"
        ));
        assert_eq!(
            tables(&slide)[0].rows[0],
            vec!["google / organic", "-", "1,200", "+30", "0", "-"]
        );
        assert!(traffic(SectionKind::TrafficPrevious, &[], PREVIOUS_MONTH)
            .blocks
            .is_empty());
    }
}
