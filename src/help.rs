//! Help text of the proposal dialog
//!
//! Composed from a paragraph specific to the proposal type, the general
//! "how to change" paragraph, a note about locked proposals and the help
//! texts individual submodules returned with their proposal.

use crate::control::ProposalProperties;
use crate::types::Mode;

const HOW_TO_CHANGE: &str = "<p>\nChange the values by clicking on the respective headline\nor by using the <b>Change...</b> menu.\n</p>\n";

const SAFE_TO_ABORT: &str =
    "<p>\nYour hard disk has not been modified yet. You can still safely abort.\n</p>\n";

const LOCKED_NOTE: &str = "<p>Some proposals might be\nlocked by the system administrator and therefore cannot be changed. If a\nlocked proposal needs to be changed, ask your system administrator.</p>\n";

/// Build the dialog help.
///
/// `submodule_helps` must already be in presentation order.
pub fn help_text<'a>(
    proposal_type: &str,
    mode: Mode,
    properties: &ProposalProperties,
    has_locked: bool,
    submodule_helps: impl IntoIterator<Item = &'a str>,
) -> String {
    let mut help = match proposal_type {
        "initial" if mode.is_installation() => format!(
            "<p>\nSelect <b>Install</b> to perform a new installation with the values displayed.\n</p>\n{}{}",
            HOW_TO_CHANGE, SAFE_TO_ABORT
        ),
        "initial" if mode.is_update() => format!(
            "<p>\nSelect <b>Update</b> to perform an update with the values displayed.\n</p>\n{}{}",
            HOW_TO_CHANGE, SAFE_TO_ABORT
        ),
        "network" => format!(
            "<p>\nPut the network settings into effect by pressing <b>Next</b>.\n</p>\n{}",
            HOW_TO_CHANGE
        ),
        "service" => format!(
            "<p>\nPut the service settings into effect by pressing <b>Next</b>.\n</p>\n{}",
            HOW_TO_CHANGE
        ),
        "hardware" => format!(
            "<p>\nPut the hardware settings into effect by pressing <b>Next</b>.\n</p>\n{}",
            HOW_TO_CHANGE
        ),
        "uml" => "<P><B>UML Installation Proposal</B></P><P>UML (User Mode Linux) installation allows you to start independent\nLinux virtual machines in the host system.</P>".to_string(),
        _ => match properties.help.as_deref().filter(|h| !h.is_empty()) {
            Some(own) => format!("{}{}", own, HOW_TO_CHANGE),
            None => format!(
                "<p>\nTo use the settings as displayed, press <b>Next</b>.\n</p>\n{}",
                HOW_TO_CHANGE
            ),
        },
    };

    if has_locked {
        help.push_str(LOCKED_NOTE);
    }

    for submodule_help in submodule_helps {
        help.push_str(submodule_help);
    }

    help
}
