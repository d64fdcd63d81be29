//! Installation proposal runner - main entry point

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, info, warn};

use instproposal::cli::{Cli, Commands, ProposalSelection, run_context};
use instproposal::logging::{DEFAULT_LOG_FILE, LogConfig, init_logging};
use instproposal::registry::{self, RegistryQuery};
use instproposal::{
    InstallContext, ProductControl, ProposalSession, RenderSink, ScriptedSink, SessionGuard,
    SubmoduleSet, TerminalSink, WorkflowSequence, process_guard,
};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // The terminal UI owns the screen, so its logs go to a file
    let uses_terminal = matches!(&cli.command, Commands::Run { actions: None, .. });
    let log_file = cli
        .log_file
        .clone()
        .or_else(|| uses_terminal.then(|| PathBuf::from(DEFAULT_LOG_FILE)));
    if let Err(e) = init_logging(&LogConfig::from_verbosity(cli.verbose).with_log_file(log_file)) {
        eprintln!("Failed to initialize logging: {:#}", e);
    }

    info!("Installation proposal runner starting up");

    match execute(cli.command) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("✗ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Validate { control } => {
            load_control(&control)?;
            println!("✓ Control file is valid: {}", control.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Order { selection, tab } => {
            print_order(&selection, tab)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run {
            selection,
            submodules,
            actions,
            autoinst_confirm,
            proposal_list,
            no_back,
        } => {
            let context = run_context(&selection, autoinst_confirm, &proposal_list, no_back);
            let sequence = run_session(&selection.control, &submodules, actions.as_deref(), context)?;
            println!("{}", sequence);
            Ok(exit_code(sequence))
        }
    }
}

fn load_control(path: &Path) -> Result<ProductControl> {
    info!("Loading control file: {}", path.display());
    let control = ProductControl::load_from_file(path)?;
    control
        .validate()
        .with_context(|| format!("Invalid control file {}", path.display()))?;
    Ok(control)
}

fn print_order(selection: &ProposalSelection, tab: usize) -> Result<()> {
    let control = load_control(&selection.control)?;
    let context = selection.context();
    let key = context.key();
    let layout = registry::load(
        &control,
        &RegistryQuery {
            key: &key,
            current_tab: tab,
            allow_list: &[],
        },
    )?;

    println!("execution:    {}", layout.execution.join(", "));
    println!("presentation: {}", layout.presentation.join(", "));
    println!("locked:       {}", layout.locked.join(", "));
    println!("display-only: {}", layout.display_only.join(", "));
    Ok(())
}

fn run_session(
    control: &Path,
    submodules: &Path,
    actions: Option<&Path>,
    context: InstallContext,
) -> Result<WorkflowSequence> {
    let control = load_control(control)?;
    let submodules = SubmoduleSet::from_directory(submodules)
        .with_context(|| format!("Failed to read submodule directory {}", submodules.display()))?;

    if let Err(e) = process_guard::init_signal_handlers() {
        warn!("Failed to initialize signal handlers: {}", e);
    }
    let _guard = SessionGuard::new();
    debug!(submodules = submodules.len(), "Starting proposal session");

    match actions {
        Some(path) => {
            let script = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read action script {}", path.display()))?;
            let sink = ScriptedSink::from_script(&script);
            let (sequence, sink) = run_with(context, control, submodules, sink);
            for error in &sink.errors {
                eprintln!("{}", error.trim_end());
            }
            Ok(sequence)
        }
        None => {
            let sink = TerminalSink::new().context("Failed to initialize terminal")?;
            let (sequence, _) = run_with(context, control, submodules, sink);
            Ok(sequence)
        }
    }
}

fn run_with<S: RenderSink>(
    context: InstallContext,
    control: ProductControl,
    submodules: SubmoduleSet,
    sink: S,
) -> (WorkflowSequence, S) {
    let mut session = ProposalSession::new(context, Box::new(control), submodules, sink);
    let sequence = session.run();
    info!(%sequence, "Proposal finished");
    (sequence, session.into_sink())
}

fn exit_code(sequence: WorkflowSequence) -> ExitCode {
    match sequence {
        WorkflowSequence::Next | WorkflowSequence::Finish | WorkflowSequence::Auto => {
            ExitCode::SUCCESS
        }
        WorkflowSequence::Back => ExitCode::from(2),
        WorkflowSequence::Abort | WorkflowSequence::Cancel => ExitCode::FAILURE,
    }
}
