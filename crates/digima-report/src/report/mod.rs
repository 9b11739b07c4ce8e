pub mod data;
pub mod deck;
mod export;
pub mod format;
mod quantity;
pub mod summary;

pub use data::ReportData;
pub use deck::{plan_deck, DeckPlan, SectionKind};
pub use quantity::Quantity;
pub use summary::{complete_summary, MetricFamily, MetricSummary, SummaryBlock};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to read report data from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid report data: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("unknown report section '{0}'")]
    UnknownSection(String),
    #[error("failed to export table: {0}")]
    Export(#[from] csv::Error),
}
