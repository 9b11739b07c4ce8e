use crate::commands::{run_analytics, run_report, AnalyticsCommand, ReportCommand};
use crate::server;
use clap::{Args, Parser, Subcommand};
use digima_report::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "digima-report",
    about = "Plan monthly marketing report decks and serve report data over HTTP",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Work with a report-data JSON document
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },
    /// Query the configured analytics data source
    Analytics {
        #[command(subcommand)]
        command: AnalyticsCommand,
    },
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Report { command } => run_report(command),
        Command::Analytics { command } => run_analytics(command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["digima-report"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn tables_require_a_section() {
        assert!(Cli::try_parse_from(["digima-report", "report", "tables", "data.json"]).is_err());
        let cli = Cli::try_parse_from([
            "digima-report",
            "report",
            "deck",
            "data.json",
            "--section",
            "gsc_area",
            "--json",
        ])
        .expect("parses");
        assert!(matches!(
            cli.command,
            Some(Command::Report {
                command: ReportCommand::Deck(ref args)
            }) if args.json && args.section.as_deref() == Some("gsc_area")
        ));
    }
}
