//! Installation Proposal Library
//!
//! Orchestrates independent configuration submodules into one installation
//! overview: which submodules take part and in what order, their combined
//! summary, and the interactive loop in which the user edits and accepts.

pub mod aggregator;
pub mod cli;
pub mod context;
pub mod control;
pub mod dialog;
pub mod error;
pub mod gateway;
pub mod headless;
pub mod help;
pub mod logging;
pub mod markup;
pub mod process_guard;
pub mod registry;
pub mod session;
pub mod sink;
pub mod submodule;
pub mod submodule_script;
pub mod theme;
pub mod types;
pub mod ui;

pub use aggregator::{AggregateDocument, MAX_LANGUAGE_RESTARTS, format_sub_proposal};
pub use context::{InstallContext, UnattendedSettings};
pub use control::{ControlSource, ProductControl, ProposalEntry, ProposalKey, ProposalProperties};
pub use error::{ProposalError, Result};
pub use gateway::{BusyGuard, Gateway};
pub use headless::ScriptedSink;
pub use process_guard::{ChildRegistry, CommandProcessGroup, SessionGuard};
pub use registry::{RegistryQuery, SubmoduleLayout};
pub use session::{ProposalSession, SessionState};
pub use sink::{RenderSink, UserAction, Widget};
pub use submodule::{ProposalClient, SubmoduleSet};
pub use submodule_script::ScriptClient;
pub use types::{Mode, Severity, Stage, WorkflowSequence};
pub use ui::TerminalSink;
