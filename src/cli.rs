use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::context::{InstallContext, UnattendedSettings};
use crate::control::normalize_module_name;
use crate::types::{Mode, Stage};

/// Installation proposal runner
#[derive(Parser, Debug)]
#[command(name = "instproposal")]
#[command(about = "Aggregates submodule proposals into one installation overview")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Write logs to this file instead of the default location
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which proposal to show
#[derive(Args, Debug, Clone)]
pub struct ProposalSelection {
    /// Path to the product control file (JSON)
    #[arg(short, long)]
    pub control: PathBuf,

    /// Installation stage
    #[arg(long, default_value = "initial")]
    pub stage: Stage,

    /// Installation mode
    #[arg(long, default_value = "installation")]
    pub mode: Mode,

    /// Proposal type, e.g. initial, network, hardware
    #[arg(long, default_value = "initial")]
    pub proposal: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a proposal session
    Run {
        #[command(flatten)]
        selection: ProposalSelection,

        /// Directory with one executable per submodule
        #[arg(short, long)]
        submodules: PathBuf,

        /// Replay user actions from this file instead of opening the terminal UI
        #[arg(long)]
        actions: Option<PathBuf>,

        /// Show the proposal even in unattended modes
        #[arg(long)]
        autoinst_confirm: bool,

        /// Only display these submodules (comma separated)
        #[arg(long, value_delimiter = ',')]
        proposal_list: Vec<String>,

        /// Hide the back button
        #[arg(long)]
        no_back: bool,
    },
    /// Load and validate a control file
    Validate {
        /// Path to the product control file (JSON)
        #[arg(short, long)]
        control: PathBuf,
    },
    /// Print the submodule orders a proposal would use
    Order {
        #[command(flatten)]
        selection: ProposalSelection,

        /// Tab whose presentation order to print
        #[arg(long, default_value_t = 0)]
        tab: usize,
    },
}

impl ProposalSelection {
    pub fn context(&self) -> InstallContext {
        InstallContext::new(self.stage, self.mode, self.proposal.clone())
    }
}

/// Session context for `run`
pub fn run_context(
    selection: &ProposalSelection,
    autoinst_confirm: bool,
    proposal_list: &[String],
    no_back: bool,
) -> InstallContext {
    InstallContext {
        enable_back: !no_back,
        unattended: UnattendedSettings {
            confirm: autoinst_confirm,
            proposal_list: proposal_list
                .iter()
                .map(|name| name.trim())
                .filter(|name| !name.is_empty())
                .map(normalize_module_name)
                .collect(),
        },
        ..selection.context()
    }
}
