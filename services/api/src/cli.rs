use crate::demo::{run_demo, run_eligibility_report, DemoArgs, EligibilityReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use recruit_ops::config::AppConfig;
use recruit_ops::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Recruiting Ops Internal Team",
    about = "Run and demonstrate the internal team candidate eligibility service",
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
    /// Candidate eligibility reporting
    Eligibility {
        #[command(subcommand)]
        command: EligibilityCommand,
    },
    /// Walk through a scripted block, decline and unblock scenario
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum EligibilityCommand {
    /// Print status counts and the blocked candidate list as of a date
    Report(EligibilityReportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Candidate selection CSV export used to seed the candidate roster
    #[arg(long)]
    pub(crate) selections: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Eligibility {
            command: EligibilityCommand::Report(args),
        } => run_eligibility_report(args, AppConfig::load()?.eligibility),
        Command::Demo(args) => run_demo(args, AppConfig::load()?.eligibility),
    }
}
