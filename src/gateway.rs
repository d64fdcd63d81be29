//! Submodule Gateway
//!
//! Invokes a named submodule's protocol operations and normalises the
//! outcome. Nothing here returns an error: a missing client or a broken
//! response is logged and replaced by the empty result, so the proposal
//! screen survives any single submodule.
//!
//! `describe` and `propose` run under a `BusyGuard` and check for dialog
//! layers the submodule left open afterwards.

use std::ops::{Deref, DerefMut};
use tracing::{debug, error, info, warn};

use crate::sink::{RenderSink, Widget};
use crate::submodule::{
    AskUserRequest, AskUserResult, Description, ProposalRequest, ProposalResult, SubmoduleSet,
    WriteRequest,
};

/// Busy cursor held for the lifetime of the guard.
///
/// Released on drop, so every exit path of a submodule call restores the
/// normal cursor.
pub struct BusyGuard<'a> {
    sink: &'a mut dyn RenderSink,
}

impl<'a> BusyGuard<'a> {
    pub fn acquire(sink: &'a mut dyn RenderSink) -> Self {
        sink.set_busy(true);
        Self { sink }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.sink.set_busy(false);
    }
}

impl<'a> Deref for BusyGuard<'a> {
    type Target = dyn RenderSink + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.sink
    }
}

impl<'a> DerefMut for BusyGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.sink
    }
}

/// Close and report dialog layers a submodule left behind
pub fn close_leftover_layers(sink: &mut dyn RenderSink, submodule: &str) {
    let closed = sink.close_leftover_layers();
    if closed > 0 {
        warn!(submodule, closed, "Submodule left dialog layers open, closed them");
    }
    if !sink.widget_exists(Widget::Proposal) {
        error!(submodule, "Widget `proposal` is not active after submodule call");
    }
}

/// Short-lived view over the submodule set and the sink
pub struct Gateway<'a> {
    submodules: &'a mut SubmoduleSet,
    sink: &'a mut dyn RenderSink,
}

impl<'a> Gateway<'a> {
    pub fn new(submodules: &'a mut SubmoduleSet, sink: &'a mut dyn RenderSink) -> Self {
        Self { submodules, sink }
    }

    /// Describe a submodule; `None` means it is not installed or not applicable
    pub fn describe(&mut self, submodule: &str) -> Option<Description> {
        let mut busy = BusyGuard::acquire(&mut *self.sink);

        let description = match self.submodules.resolve(submodule) {
            Ok(client) => client.describe(),
            Err(e) => Err(e),
        };
        close_leftover_layers(&mut *busy, submodule);

        match description {
            Ok(Some(description)) if !description.is_empty() => Some(description),
            Ok(_) => {
                info!("Submodule {} not available (not installed?)", submodule);
                None
            }
            Err(e) => {
                error!("Description failed: {}", e);
                None
            }
        }
    }

    /// Call `MakeProposal`; failures yield the empty result
    pub fn propose(&mut self, submodule: &str, request: ProposalRequest) -> ProposalResult {
        let mut busy = BusyGuard::acquire(&mut *self.sink);

        let result = match self.submodules.resolve(submodule) {
            Ok(client) => client.make_proposal(&request),
            Err(e) => Err(e),
        };
        close_leftover_layers(&mut *busy, submodule);

        match result {
            Ok(result) => {
                debug!("{} MakeProposal() returns {:?}", submodule, result);
                result
            }
            Err(e) => {
                error!("{}", e);
                ProposalResult::default()
            }
        }
    }

    /// Run the submodule's own dialog; failures yield the empty result
    pub fn ask_user(&mut self, submodule: &str, request: &AskUserRequest) -> AskUserResult {
        let result = match self.submodules.resolve(submodule) {
            Ok(client) => client.ask_user(request),
            Err(e) => Err(e),
        };

        match result {
            Ok(result) => {
                debug!("{} AskUser() returns {:?}", submodule, result);
                result
            }
            Err(e) => {
                error!("{}", e);
                AskUserResult::default()
            }
        }
    }

    /// Call `Write`; returns whether it succeeded
    pub fn write(&mut self, submodule: &str, request: &WriteRequest) -> bool {
        let result = match self.submodules.resolve(submodule) {
            Ok(client) => client.write(request),
            Err(e) => Err(e),
        };

        match result {
            Ok(result) => result.success,
            Err(e) => {
                error!("{}", e);
                false
            }
        }
    }
}
