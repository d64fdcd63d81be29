//! Script-backed submodules
//!
//! Every executable in a submodule directory is a proposal client named
//! after the file. An operation runs `<dir>/<name> <Function>` with the
//! JSON request on stdin; the script prints the JSON response on stdout.
//! Anything on stderr is logged.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

use crate::error::{ProposalError, Result};
use crate::process_guard::{ChildRegistry, CommandProcessGroup};
use crate::submodule::{
    AskUserRequest, AskUserResult, Description, ProposalClient, ProposalRequest, ProposalResult,
    SubmoduleSet, WriteRequest, WriteResult,
};

#[derive(Serialize)]
struct Empty {}

/// Client running one submodule executable per call
#[derive(Debug, Clone)]
pub struct ScriptClient {
    name: String,
    path: PathBuf,
}

impl ScriptClient {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn call<Req, Resp>(&self, operation: &'static str, request: &Req) -> Result<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let fail = |reason: String| ProposalError::submodule_call(&self.name, operation, reason);
        let input = serde_json::to_vec(request)?;

        debug!(submodule = %self.name, operation, "Calling submodule script");

        let mut child = Command::new(&self.path)
            .arg(operation)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .in_new_process_group()
            .spawn()
            .map_err(|e| fail(format!("cannot start {}: {}", self.path.display(), e)))?;

        let pid = child.id();
        if let Ok(mut registry) = ChildRegistry::global().lock() {
            registry.register(pid);
        }

        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&input),
            None => Ok(()),
        };
        let output = child.wait_with_output();

        if let Ok(mut registry) = ChildRegistry::global().lock() {
            registry.unregister(pid);
        }

        let output = output.map_err(|e| fail(format!("wait failed: {}", e)))?;
        if let Err(e) = written {
            warn!(submodule = %self.name, operation, "Request not fully delivered: {}", e);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            debug!(submodule = %self.name, "{}", line);
        }

        if !output.status.success() {
            return Err(fail(match output.status.code() {
                Some(code) => format!("exited with status {}", code),
                None => "killed by signal".to_string(),
            }));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| fail(format!("invalid response: {}", e)))
    }
}

impl ProposalClient for ScriptClient {
    fn describe(&mut self) -> Result<Option<Description>> {
        self.call("Description", &Empty {})
    }

    fn make_proposal(&mut self, request: &ProposalRequest) -> Result<ProposalResult> {
        self.call("MakeProposal", request)
    }

    fn ask_user(&mut self, request: &AskUserRequest) -> Result<AskUserResult> {
        self.call("AskUser", request)
    }

    fn write(&mut self, request: &WriteRequest) -> Result<WriteResult> {
        self.call("Write", request)
    }
}

fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

impl SubmoduleSet {
    /// Register every executable file in `dir` as a script client
    pub fn from_directory(dir: &Path) -> Result<Self> {
        let mut set = SubmoduleSet::new();

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !is_executable(&path) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let name = name.to_string();
            set.register(name.clone(), Box::new(ScriptClient::new(name, path)));
        }

        info!(
            "Found {} submodule script(s) in {}",
            set.len(),
            dir.display()
        );
        Ok(set)
    }
}
