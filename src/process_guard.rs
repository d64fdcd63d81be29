//! Submodule process lifecycle
//!
//! Script-backed submodules run as child processes. Each child gets its own
//! process group so a whole script tree can be signalled at once, and dies
//! with the proposal if the proposal is killed. Live children are tracked
//! in a global registry that is drained when the session guard drops or a
//! termination signal arrives.

use nix::libc;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

static SUBMODULE_CHILDREN: OnceLock<Arc<Mutex<ChildRegistry>>> = OnceLock::new();

/// Grace period between SIGTERM and SIGKILL on normal shutdown
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Grace period when a termination signal was received
pub const SIGNAL_GRACE: Duration = Duration::from_secs(3);

/// Process groups of running submodule scripts
#[derive(Debug, Default)]
pub struct ChildRegistry {
    groups: HashSet<u32>,
    terminated: bool,
}

impl ChildRegistry {
    pub fn global() -> Arc<Mutex<ChildRegistry>> {
        SUBMODULE_CHILDREN
            .get_or_init(|| Arc::new(Mutex::new(ChildRegistry::default())))
            .clone()
    }

    pub fn register(&mut self, pid: u32) {
        self.groups.insert(pid);
        debug!(pid, "Tracking submodule process");
    }

    pub fn unregister(&mut self, pid: u32) {
        self.groups.remove(&pid);
        debug!(pid, "Submodule process finished");
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// SIGTERM every group, wait up to `grace`, SIGKILL the survivors.
    /// Runs at most once per registry.
    pub fn terminate_all(&mut self, grace: Duration) {
        if std::mem::replace(&mut self.terminated, true) {
            return;
        }
        if self.groups.is_empty() {
            return;
        }

        let pids: Vec<u32> = self.groups.drain().collect();
        info!(count = pids.len(), "Terminating submodule processes");

        for &pid in &pids {
            signal_group(pid, Signal::SIGTERM);
        }

        let deadline = Instant::now() + grace;
        while Instant::now() < deadline {
            if !pids.iter().any(|&pid| is_alive(pid)) {
                return;
            }
            std::thread::sleep(Duration::from_millis(100));
        }

        for &pid in pids.iter().filter(|&&pid| is_alive(pid)) {
            warn!(pid, "Submodule process ignored SIGTERM, killing it");
            signal_group(pid, Signal::SIGKILL);
        }
    }
}

/// Signal the process group led by `pid`, falling back to the process itself
fn signal_group(pid: u32, sig: Signal) {
    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    if let Err(e) = signal::kill(Pid::from_raw(-raw), sig) {
        debug!(pid, ?sig, "Group signal failed ({}), signalling process", e);
        if let Err(e) = signal::kill(Pid::from_raw(raw), sig) {
            warn!(pid, ?sig, "Failed to signal submodule process: {}", e);
        }
    }
}

/// Zombies count as dead
fn is_alive(pid: u32) -> bool {
    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    if signal::kill(Pid::from_raw(raw), None).is_err() {
        return false;
    }
    match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Ok(stat) => !matches!(stat.split_whitespace().nth(2), Some("Z" | "X")),
        Err(_) => true,
    }
}

/// Terminates all tracked submodule processes when dropped
pub struct SessionGuard {
    registry: Arc<Mutex<ChildRegistry>>,
}

impl SessionGuard {
    pub fn new() -> Self {
        Self {
            registry: ChildRegistry::global(),
        }
    }
}

impl Default for SessionGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Ok(mut registry) = self.registry.lock() {
            registry.terminate_all(SHUTDOWN_GRACE);
        }
    }
}

/// Clean up children on SIGINT, SIGTERM and SIGHUP, then exit with 128+signal
pub fn init_signal_handlers() -> std::io::Result<()> {
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;

    std::thread::spawn(move || {
        if let Some(sig) = signals.forever().next() {
            info!(signal = sig, "Termination signal received, stopping submodules");
            if let Ok(mut registry) = ChildRegistry::global().lock() {
                registry.terminate_all(SIGNAL_GRACE);
            }
            std::process::exit(128 + sig);
        }
    });

    Ok(())
}

/// Spawn a command as leader of its own process group
pub trait CommandProcessGroup {
    fn in_new_process_group(&mut self) -> &mut Self;
}

impl CommandProcessGroup for std::process::Command {
    fn in_new_process_group(&mut self) -> &mut Self {
        use std::os::unix::process::CommandExt;
        // SAFETY: only async-signal-safe calls between fork and exec
        unsafe {
            self.pre_exec(|| {
                nix::unistd::setpgid(Pid::from_raw(0), Pid::from_raw(0))
                    .map_err(std::io::Error::other)?;
                if libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM) == -1 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }
        self
    }
}
