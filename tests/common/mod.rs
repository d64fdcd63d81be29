//! Shared fixtures for the integration tests: recording fake submodules and
//! control sources built from JSON.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use instproposal::control::{ControlSource, ProductControl};
use instproposal::error::Result;
use instproposal::submodule::{
    AskUserRequest, AskUserResult, Description, ProposalClient, ProposalRequest, ProposalResult,
    SubmoduleSet, WriteRequest, WriteResult,
};
use instproposal::{InstallContext, ProposalSession, ScriptedSink};

/// One recorded protocol call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub submodule: String,
    pub operation: &'static str,
    pub force_reset: bool,
    pub language_changed: bool,
    pub chosen_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn all(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    /// Submodules called with `operation`, in call order
    pub fn submodules(&self, operation: &str) -> Vec<String> {
        self.all()
            .into_iter()
            .filter(|c| c.operation == operation)
            .map(|c| c.submodule)
            .collect()
    }

    pub fn calls(&self, operation: &str) -> Vec<Call> {
        self.all()
            .into_iter()
            .filter(|c| c.operation == operation)
            .collect()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// Submodule answering from canned responses
pub struct FakeClient {
    name: String,
    log: CallLog,
    description: Option<Description>,
    results: Vec<ProposalResult>,
    proposals_made: usize,
    ask_user: Vec<AskUserResult>,
    asked: usize,
    write_success: bool,
    exports: bool,
}

impl FakeClient {
    pub fn new(name: &str, log: &CallLog) -> Self {
        let title = name.trim_end_matches("_proposal").to_string();
        Self {
            name: name.to_string(),
            log: log.clone(),
            description: Some(Description {
                rich_text_title: Some(title.clone()),
                menu_title: Some(format!("&{}", title)),
                ..Default::default()
            }),
            results: vec![ProposalResult {
                raw_proposal: Some(vec![format!("{} summary", title)]),
                ..Default::default()
            }],
            proposals_made: 0,
            ask_user: Vec::new(),
            asked: 0,
            write_success: true,
            exports: false,
        }
    }

    /// Describes itself as not applicable
    pub fn unavailable(mut self) -> Self {
        self.description = None;
        self
    }

    pub fn with_description(mut self, description: Description) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        if let Some(d) = self.description.as_mut() {
            d.id = Some(id.to_string());
        }
        self
    }

    /// Results returned by successive `MakeProposal` calls; the last repeats
    pub fn with_results(mut self, results: Vec<ProposalResult>) -> Self {
        self.results = results;
        self
    }

    pub fn with_result(self, result: ProposalResult) -> Self {
        self.with_results(vec![result])
    }

    /// Results of successive `AskUser` calls; the last repeats
    pub fn with_ask_user(mut self, results: Vec<AskUserResult>) -> Self {
        self.ask_user = results;
        self
    }

    pub fn failing_write(mut self) -> Self {
        self.write_success = false;
        self
    }

    /// Creates the export target on a forced write
    pub fn exporting(mut self) -> Self {
        self.exports = true;
        self
    }

    fn record(&self, operation: &'static str) -> Call {
        Call {
            submodule: self.name.clone(),
            operation,
            force_reset: false,
            language_changed: false,
            chosen_id: None,
        }
    }
}

fn nth_or_last<T: Clone + Default>(items: &[T], index: usize) -> T {
    items
        .get(index)
        .or_else(|| items.last())
        .cloned()
        .unwrap_or_default()
}

impl ProposalClient for FakeClient {
    fn describe(&mut self) -> Result<Option<Description>> {
        self.log.push(self.record("Description"));
        Ok(self.description.clone())
    }

    fn make_proposal(&mut self, request: &ProposalRequest) -> Result<ProposalResult> {
        self.log.push(Call {
            force_reset: request.force_reset,
            language_changed: request.language_changed,
            ..self.record("MakeProposal")
        });
        let result = nth_or_last(&self.results, self.proposals_made);
        self.proposals_made += 1;
        Ok(result)
    }

    fn ask_user(&mut self, request: &AskUserRequest) -> Result<AskUserResult> {
        self.log.push(Call {
            chosen_id: request.chosen_id.clone(),
            ..self.record("AskUser")
        });
        let result = nth_or_last(&self.ask_user, self.asked);
        self.asked += 1;
        Ok(result)
    }

    fn write(&mut self, request: &WriteRequest) -> Result<WriteResult> {
        self.log.push(self.record("Write"));
        if self.exports && request.force {
            if let Some(path) = &request.target_path {
                std::fs::write(path, "<profile/>")?;
            }
        }
        Ok(WriteResult {
            success: self.write_success,
        })
    }
}

/// Product control from a JSON value
pub fn control(json: serde_json::Value) -> Box<dyn ControlSource> {
    let control: ProductControl = serde_json::from_value(json).unwrap();
    control.validate().unwrap();
    Box::new(control)
}

/// Initial installation proposal over `modules`
pub fn simple_control(modules: &[&str]) -> Box<dyn ControlSource> {
    control(serde_json::json!({
        "proposals": [{
            "name": "initial",
            "stage": "initial",
            "mode": "installation,update",
            "proposal_modules": modules,
        }]
    }))
}

/// Fake submodules for `names`, all with default behaviour
pub fn fakes(names: &[&str], log: &CallLog) -> SubmoduleSet {
    names.iter().fold(SubmoduleSet::new(), |set, name| {
        set.with(*name, Box::new(FakeClient::new(name, log)))
    })
}

pub fn session(
    context: InstallContext,
    control: Box<dyn ControlSource>,
    submodules: SubmoduleSet,
    actions: &[&str],
) -> ProposalSession<ScriptedSink> {
    ProposalSession::new(context, control, submodules, ScriptedSink::new(actions))
}
