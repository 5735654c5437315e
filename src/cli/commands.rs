use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "solarleads",
    about = "Aggregate, score and export solar installation and repair leads",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Target location (defaults to SOLARLEADS_DEFAULT_LOCATION)
    pub location: Option<String>,

    /// Raw record file to include, as KIND:NAME:PATH (kind: permit, incentive, websearch, social)
    #[arg(long = "records", value_name = "KIND:NAME:PATH")]
    pub records: Vec<String>,

    /// Skip the Reddit collector
    #[arg(long)]
    pub no_reddit: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run all sources once (the default)
    Run(RunArgs),
    /// List recent runs from the session log
    History {
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Show the current run lock, if any
    LockStatus,
}

impl Cli {
    /// The effective command, with a bare invocation meaning `run`.
    pub fn into_command(self) -> Commands {
        self.command.unwrap_or(Commands::Run(self.run))
    }
}
