//! Error handling module for the proposal runner
//!
//! Provides the error taxonomy of the proposal engine using thiserror.
//! Registry failures end the session, submodule failures are isolated by the
//! gateway, and the rest are surfaced to the user as a single short message.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the proposal runner
#[derive(Error, Debug)]
pub enum ProposalError {
    /// The control source could not provide the proposal configuration
    #[error("Error loading proposals: {0}")]
    ConfigLoad(String),

    /// The control source returned an empty module list
    #[error("No proposals available for stage '{stage}', mode '{mode}', proposal '{proposal}'")]
    NoProposalsAvailable {
        stage: String,
        mode: String,
        proposal: String,
    },

    /// A submodule returned no response or a malformed one
    #[error("{operation}() failed for submodule {submodule}: {reason}")]
    SubmoduleCall {
        submodule: String,
        operation: &'static str,
        reason: String,
    },

    /// No client is registered under the requested name
    #[error("Unknown submodule: {0}")]
    UnknownSubmodule(String),

    /// The proposal contains a blocker that was not skipped
    #[error("The proposal contains an error that must be\nresolved before continuing.\n")]
    BlockingProposal,

    /// The export target was not created by the export submodule
    #[error("Failed to store configuration to {}. Details can be found in log.", path.display())]
    Export { path: PathBuf },

    /// A display widget the core expects is gone
    #[error("Widget `{0}` does not exist")]
    RenderTargetMissing(String),

    /// IO errors (files, child processes, terminal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for proposal operations
pub type Result<T> = std::result::Result<T, ProposalError>;

impl ProposalError {
    /// Create a configuration load error
    pub fn config_load(msg: impl Into<String>) -> Self {
        Self::ConfigLoad(msg.into())
    }

    /// Create a submodule call error
    pub fn submodule_call(
        submodule: impl Into<String>,
        operation: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::SubmoduleCall {
            submodule: submodule.into(),
            operation,
            reason: reason.into(),
        }
    }

    /// Errors that end the whole proposal session with `abort`
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ConfigLoad(_) | Self::NoProposalsAvailable { .. })
    }
}
