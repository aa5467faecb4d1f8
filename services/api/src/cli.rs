use crate::commands::{run_catalog, run_demo, run_export, run_score, DemoArgs, ExportArgs, ScoreArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use site_inspection::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Site Inspection",
    about = "Run scored site inspections and export audit reports from the command line",
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
    /// Print the configured sections, questions and answer options
    Catalog,
    /// Score a saved audit file
    Score(ScoreArgs),
    /// Render a saved audit file to PDF
    Export(ExportArgs),
    /// Fill in a sample audit and export it
    Demo(DemoArgs),
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
        Command::Catalog => run_catalog(),
        Command::Score(args) => run_score(args),
        Command::Export(args) => run_export(args),
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve_without_subcommand() {
        let cli = Cli::try_parse_from(["site-inspection-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn snapshot_flags_are_mutually_exclusive() {
        let parsed = Cli::try_parse_from([
            "site-inspection-api",
            "export",
            "--audit",
            "audit.json",
            "--snapshot",
            "grid.png",
            "--skip-snapshot",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn parses_export_arguments() {
        let cli = Cli::try_parse_from([
            "site-inspection-api",
            "export",
            "--audit",
            "audit.json",
            "--output-dir",
            "out",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Export(args)) => {
                assert_eq!(args.audit.to_str(), Some("audit.json"));
                assert_eq!(args.output_dir.to_str(), Some("out"));
                assert!(!args.skip_snapshot);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
