//! Campaign lifecycle state machine.
//!
//! ```text
//! draft | scheduled --start--> running --complete--> completed
//!                              running --pause-----> paused
//! ```
//!
//! Edits may move a campaign between the editable states (draft, scheduled,
//! cancelled) but never into or out of running/completed.

use crm_core::{CrmError, CrmResult};
use serde::{Deserialize, Serialize};

use crate::models::CampaignStatus;

pub const CANNOT_EDIT: &str = "Cannot edit running or completed campaigns";
pub const CANNOT_DELETE: &str = "Cannot delete running campaigns";
pub const CANNOT_START: &str = "Campaign cannot be started";
pub const CANNOT_PAUSE: &str = "Only running campaigns can be paused";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CampaignAction {
    /// Draft | Scheduled -> Running
    Start,
    /// Running -> Paused
    Pause,
    /// Running -> Completed, fired by the delivery timer.
    Complete,
}

/// Resolve the status an action leads to, or reject it.
pub fn transition(current: CampaignStatus, action: CampaignAction) -> CrmResult<CampaignStatus> {
    match (current, action) {
        (CampaignStatus::Draft, CampaignAction::Start)
        | (CampaignStatus::Scheduled, CampaignAction::Start) => Ok(CampaignStatus::Running),
        (CampaignStatus::Running, CampaignAction::Pause) => Ok(CampaignStatus::Paused),
        (CampaignStatus::Running, CampaignAction::Complete) => Ok(CampaignStatus::Completed),
        (_, CampaignAction::Start) => Err(CrmError::invalid_state(CANNOT_START)),
        (_, CampaignAction::Pause) => Err(CrmError::invalid_state(CANNOT_PAUSE)),
        (_, CampaignAction::Complete) => Err(CrmError::invalid_state(format!(
            "Cannot complete a {} campaign",
            current.as_str()
        ))),
    }
}

pub fn ensure_editable(current: CampaignStatus) -> CrmResult<()> {
    match current {
        CampaignStatus::Running | CampaignStatus::Completed => Err(CrmError::invalid_state(CANNOT_EDIT)),
        _ => Ok(()),
    }
}

pub fn ensure_deletable(current: CampaignStatus) -> CrmResult<()> {
    match current {
        CampaignStatus::Running => Err(CrmError::invalid_state(CANNOT_DELETE)),
        _ => Ok(()),
    }
}

/// Statuses a client may set directly through an update.
pub fn is_assignable(status: CampaignStatus) -> bool {
    matches!(
        status,
        CampaignStatus::Draft | CampaignStatus::Scheduled | CampaignStatus::Cancelled
    )
}

pub fn ensure_assignable(status: CampaignStatus) -> CrmResult<()> {
    if is_assignable(status) {
        Ok(())
    } else {
        Err(CrmError::validation(format!(
            "Status can only be set to draft, scheduled or cancelled, not {}",
            status.as_str()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [CampaignStatus; 6] = [
        CampaignStatus::Draft,
        CampaignStatus::Scheduled,
        CampaignStatus::Running,
        CampaignStatus::Completed,
        CampaignStatus::Paused,
        CampaignStatus::Cancelled,
    ];

    #[test]
    fn test_start_only_from_draft_or_scheduled() {
        for status in ALL {
            let result = transition(status, CampaignAction::Start);
            match status {
                CampaignStatus::Draft | CampaignStatus::Scheduled => {
                    assert_eq!(result.unwrap(), CampaignStatus::Running)
                }
                _ => assert_eq!(result.unwrap_err().to_string(), CANNOT_START),
            }
        }
    }

    #[test]
    fn test_pause_and_complete_only_from_running() {
        for status in ALL {
            let pause = transition(status, CampaignAction::Pause);
            let complete = transition(status, CampaignAction::Complete);
            if status == CampaignStatus::Running {
                assert_eq!(pause.unwrap(), CampaignStatus::Paused);
                assert_eq!(complete.unwrap(), CampaignStatus::Completed);
            } else {
                assert_eq!(pause.unwrap_err().to_string(), CANNOT_PAUSE);
                assert!(complete.is_err());
            }
        }
    }

    #[test]
    fn test_edit_and_delete_guards() {
        assert!(ensure_editable(CampaignStatus::Paused).is_ok());
        assert!(ensure_editable(CampaignStatus::Cancelled).is_ok());
        assert_eq!(ensure_editable(CampaignStatus::Running).unwrap_err().to_string(), CANNOT_EDIT);
        assert_eq!(ensure_editable(CampaignStatus::Completed).unwrap_err().to_string(), CANNOT_EDIT);

        assert!(ensure_deletable(CampaignStatus::Completed).is_ok());
        assert_eq!(ensure_deletable(CampaignStatus::Running).unwrap_err().to_string(), CANNOT_DELETE);
    }

    #[test]
    fn test_assignable_statuses() {
        let assignable: Vec<_> = ALL.into_iter().filter(|s| is_assignable(*s)).collect();
        assert_eq!(
            assignable,
            vec![CampaignStatus::Draft, CampaignStatus::Scheduled, CampaignStatus::Cancelled]
        );
        assert!(ensure_assignable(CampaignStatus::Running).is_err());
    }
}
