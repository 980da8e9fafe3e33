use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, PartialEq)]
#[command(name = "activity-feed")]
#[command(about = "Desktop viewer for a paginated repository activity stream")]
pub struct CliArgs {
    /// Base URL of the activity server (overrides config)
    #[arg(long)]
    pub server: Option<String>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}
