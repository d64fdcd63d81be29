//! End-to-end tests of the `instproposal` binary
//!
//! Submodules are small shell scripts in a temporary directory; sessions
//! replay an action script instead of opening the terminal UI.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use instproposal::{
    InstallContext, ProductControl, ProposalSession, ScriptedSink, SubmoduleSet, WorkflowSequence,
};
use tempfile::TempDir;

const CONTROL: &str = r#"{
    "proposals": [{
        "name": "initial",
        "stage": "initial",
        "mode": "installation,autoinstallation",
        "proposal_modules": [
            {"name": "software", "presentation_order": 20},
            {"name": "net", "presentation_order": 10}
        ]
    }]
}"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("clients")).unwrap();
        fs::write(dir.path().join("control.json"), CONTROL).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn written(&self) -> Vec<String> {
        fs::read_to_string(self.path("written.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Submodule script answering `Description` with `title` and
    /// `MakeProposal` with `proposal`; `Write` is recorded in written.log
    fn submodule(&self, name: &str, title: &str, proposal: &str) {
        let body = format!(
            r#"#!/bin/sh
cat > /dev/null
case "$1" in
  Description) echo '{{"rich_text_title": "{title}", "menu_title": "&{title}"}}' ;;
  MakeProposal) echo '{proposal}' ;;
  AskUser) echo '{{"workflow_sequence": "next"}}' ;;
  Write) echo {name} >> "{log}"; echo '{{"success": true}}' ;;
  *) exit 2 ;;
esac
"#,
            log = self.path("written.log").display(),
        );
        let path = self.path("clients").join(name);
        fs::write(&path, body).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn standard_submodules(&self) {
        self.submodule("net_proposal", "Network", r#"{"raw_proposal": ["DHCP on eth0"]}"#);
        self.submodule(
            "software_proposal",
            "Software",
            r#"{"raw_proposal": ["GNOME desktop"], "warning": "Large download", "warning_level": "notice"}"#,
        );
    }

    fn actions(&self, script: &str) -> PathBuf {
        let path = self.path("actions.txt");
        fs::write(&path, script).unwrap();
        path
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_instproposal"))
            .args(args)
            .env_remove("RUST_LOG")
            .output()
            .unwrap()
    }

    fn run_session(&self, actions: &Path, extra: &[&str]) -> Output {
        let control = self.path("control.json");
        let clients = self.path("clients");
        let mut args = vec![
            "run",
            "--control",
            control.to_str().unwrap(),
            "--submodules",
            clients.to_str().unwrap(),
            "--actions",
            actions.to_str().unwrap(),
        ];
        args.extend_from_slice(extra);
        self.run(&args)
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

// =============================================================================
// validate / order
// =============================================================================

#[test]
fn test_validate_accepts_control_file() {
    let fixture = Fixture::new();
    let output = fixture.run(&["validate", "--control", fixture.path("control.json").to_str().unwrap()]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("Control file is valid"));
}

#[test]
fn test_validate_rejects_unknown_mode() {
    let fixture = Fixture::new();
    let control = fixture.path("broken.json");
    fs::write(
        &control,
        r#"{"proposals": [{"name": "initial", "stage": "initial", "mode": "sideways"}]}"#,
    )
    .unwrap();

    let output = fixture.run(&["validate", "--control", control.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("sideways"));
}

#[test]
fn test_order_prints_both_orders() {
    let fixture = Fixture::new();
    let output = fixture.run(&["order", "--control", fixture.path("control.json").to_str().unwrap()]);

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("execution:    software_proposal, net_proposal"));
    assert!(out.contains("presentation: net_proposal, software_proposal"));
}

// =============================================================================
// run
// =============================================================================

#[test]
fn test_run_next_writes_every_submodule() {
    let fixture = Fixture::new();
    fixture.standard_submodules();
    let actions = fixture.actions("# accept the proposal\nnext\n");

    let output = fixture.run_session(&actions, &[]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout(&output).trim(), "next");
    assert_eq!(fixture.written(), ["software_proposal", "net_proposal"]);
}

#[test]
fn test_run_blocker_refuses_next() {
    let fixture = Fixture::new();
    fixture.submodule("net_proposal", "Network", r#"{"raw_proposal": ["DHCP on eth0"]}"#);
    fixture.submodule(
        "software_proposal",
        "Software",
        r#"{"warning": "Not enough disk space", "warning_level": "blocker"}"#,
    );
    let actions = fixture.actions("next\n");

    let output = fixture.run_session(&actions, &[]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output).trim(), "abort");
    assert!(String::from_utf8_lossy(&output.stderr).contains("must be"));
    assert!(fixture.written().is_empty());
}

#[test]
fn test_run_back_exit_code() {
    let fixture = Fixture::new();
    fixture.standard_submodules();
    let actions = fixture.actions("back\n");

    let output = fixture.run_session(&actions, &[]);
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stdout(&output).trim(), "back");
}

#[test]
fn test_run_unattended_skips_dialog() {
    let fixture = Fixture::new();
    fixture.standard_submodules();
    let actions = fixture.actions("next\n");

    let output = fixture.run_session(&actions, &["--mode", "autoinstallation"]);

    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "auto");
    assert!(fixture.written().is_empty());
}

#[test]
fn test_broken_submodule_does_not_stop_session() {
    let fixture = Fixture::new();
    fixture.submodule("net_proposal", "Network", "this is not json");
    fixture.submodule("software_proposal", "Software", r#"{"raw_proposal": ["GNOME desktop"]}"#);
    let actions = fixture.actions("next\n");

    let output = fixture.run_session(&actions, &[]);

    assert!(output.status.success());
    assert_eq!(fixture.written(), ["software_proposal", "net_proposal"]);
}

// =============================================================================
// Library session over script submodules
// =============================================================================

#[test]
fn test_session_over_script_directory() {
    let fixture = Fixture::new();
    fixture.standard_submodules();
    let control = ProductControl::load_from_file(fixture.path("control.json")).unwrap();
    let submodules = SubmoduleSet::from_directory(&fixture.path("clients")).unwrap();

    let mut session = ProposalSession::new(
        InstallContext::default(),
        Box::new(control),
        submodules,
        ScriptedSink::new(["accept"]),
    );

    assert_eq!(session.run(), WorkflowSequence::Next);
    let content = session.sink().content();
    let network = content.find("Network").unwrap();
    let software = content.find("Software").unwrap();
    assert!(network < software);
    assert!(content.contains("<p><b>Large download</b></p><ul><li>GNOME desktop</li></ul>"));
    assert!(fixture.written().is_empty());
}
