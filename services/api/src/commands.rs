use crate::infra::write_artifact;
use clap::{Args, Subcommand};
use digima_report::analytics::gateway_from_config;
use digima_report::config::AppConfig;
use digima_report::error::AppError;
use digima_report::report::deck::{Block, DeckTable, Slide};
use digima_report::report::{plan_deck, DeckPlan, ReportData, SectionKind};
use digima_report::telemetry::{self, LogSink};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Subcommand, Debug)]
pub(crate) enum ReportCommand {
    /// Print the summary block with month-over-month fields filled in
    Summary(InputArgs),
    /// Plan the report deck and print it
    Deck(DeckArgs),
    /// Print the tables of one section as CSV
    Tables(TablesArgs),
}

#[derive(Args, Debug)]
pub(crate) struct InputArgs {
    /// Report-data JSON document
    pub(crate) input: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct DeckArgs {
    /// Report-data JSON document
    pub(crate) input: PathBuf,
    /// Only show one section (e.g. summary, gsc_area, ads_monthly)
    #[arg(long)]
    pub(crate) section: Option<String>,
    /// Emit JSON instead of the console listing
    #[arg(long)]
    pub(crate) json: bool,
    /// Also write the plan as deck_plan.json under REPORT_OUTPUT_DIR
    #[arg(long)]
    pub(crate) save: bool,
}

#[derive(Args, Debug)]
pub(crate) struct TablesArgs {
    /// Report-data JSON document
    pub(crate) input: PathBuf,
    /// Section whose tables are exported
    #[arg(long)]
    pub(crate) section: String,
}

#[derive(Subcommand, Debug)]
pub(crate) enum AnalyticsCommand {
    /// Latest session total
    Sessions,
    /// Search queries for a month (defaults to the latest)
    Queries {
        #[arg(long)]
        month: Option<String>,
    },
    /// Ads metrics per month
    Ads,
}

pub(crate) fn run_report(command: ReportCommand) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init_with_sink(&config.telemetry, LogSink::Stderr)?;

    match command {
        ReportCommand::Summary(args) => {
            let data = ReportData::load_path(&args.input)?;
            print_json(&data.summary)
        }
        ReportCommand::Deck(args) => run_deck(&config, args),
        ReportCommand::Tables(args) => {
            let kind: SectionKind = args.section.parse()?;
            let data = ReportData::load_path(&args.input)?;
            let tables = plan_deck(&data).tables_csv(kind)?;
            info!(section = %kind, tables = tables.len(), "exporting section tables");
            println!("{}", tables.join("\n"));
            Ok(())
        }
    }
}

fn run_deck(config: &AppConfig, args: DeckArgs) -> Result<(), AppError> {
    let DeckArgs {
        input,
        section,
        json,
        save,
    } = args;

    let section = section.as_deref().map(str::parse::<SectionKind>).transpose()?;
    let data = ReportData::load_path(&input)?;
    let plan = plan_deck(&data).with_template(config.report.template_path.display().to_string());

    if save {
        let contents = serde_json::to_string_pretty(&plan).map_err(std::io::Error::from)?;
        let path = write_artifact(&config.report.output_dir, "deck_plan.json", &contents)?;
        eprintln!("Deck plan saved to {}", path.display());
    }

    match (section, json) {
        (Some(kind), true) => print_json(&plan.section(kind)),
        (None, true) => print_json(&plan),
        (Some(kind), false) => {
            render_slides(&plan.section(kind));
            Ok(())
        }
        (None, false) => {
            render_plan(&plan);
            Ok(())
        }
    }
}

pub(crate) fn run_analytics(command: AnalyticsCommand) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init_with_sink(&config.telemetry, LogSink::Stderr)?;
    let gateway = gateway_from_config(&config.analytics);

    match command {
        AnalyticsCommand::Sessions => {
            let totals = gateway.ga4_sessions()?;
            println!("{}", totals.message());
            Ok(())
        }
        AnalyticsCommand::Queries { month } => {
            let found = gateway.search_queries(month.as_deref())?;
            print_json(&found)
        }
        AnalyticsCommand::Ads => print_json(&gateway.ads_monthly()?),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let text = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{text}");
    Ok(())
}

fn render_plan(plan: &DeckPlan) {
    println!("Report deck plan: {} ({})", plan.store_name, plan.period);
    if let Some(template) = &plan.template_path {
        println!("Template: {template}");
    }
    println!(
        "Cover: {} / {} / {}",
        plan.cover.addressee, plan.cover.branch, plan.cover.meeting
    );
    println!("Slides: {}", plan.slides.len());
    let slides: Vec<&Slide> = plan.slides.iter().collect();
    render_slides(&slides);
}

fn render_slides(slides: &[&Slide]) {
    if slides.is_empty() {
        println!("\nNo slides for this section");
        return;
    }
    for slide in slides {
        println!("\n[{}] {}", slide.section, slide.title);
        for block in &slide.blocks {
            render_block(block);
        }
    }
}

fn render_block(block: &Block) {
    match block {
        Block::Text { text, .. } => println!("{text}"),
        Block::Notice { text } => println!("  ({text})"),
        Block::Table(table) => render_table(table),
        Block::MetricCard(card) => println!(
            "- {}: {} | {} | {} [{}] {}",
            card.title, card.value, card.detail, card.change, card.badge.label, card.note
        ),
        Block::MonthCard(card) => {
            let items: Vec<String> = card
                .items
                .iter()
                .map(|item| format!("{} {}", item.label, item.value))
                .collect();
            println!("- {} {}: {}", card.month, card.status, items.join(", "));
        }
        Block::Callout(callout) => {
            println!("{}", callout.heading);
            for item in &callout.items {
                println!("  {item}");
            }
        }
        Block::Proposal(proposal) => {
            println!("- {} {}", proposal.priority, proposal.title);
            println!("  {}", proposal.body);
        }
        Block::Chart(chart) => {
            let series: Vec<&str> = chart.series.iter().map(|s| s.name.as_str()).collect();
            println!(
                "- chart {} ({:?}): {} over {}",
                chart.title.replace('\n', " "),
                chart.kind,
                series.join(", "),
                chart.categories.join(", ")
            );
        }
    }
}

fn render_table(table: &DeckTable) {
    println!("  {}", table.headers.join(" | "));
    for row in &table.rows {
        println!("  {}", row.join(" | "));
    }
}
