//! Event lifecycle state machine
//!
//! The single place where event-status legality lives: which operations are
//! allowed in which status, and which stored-status transitions exist.
//! Services never compare statuses themselves; they go through this module.

use crate::models::event::EventStatus;
use crate::utils::errors::{GiftBuddyError, Result};

/// Operations gated by the event status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleAction {
    InviteParticipant,
    RespondToInvitation,
    RemoveParticipant,
    EditDetails,
    DrawNames,
    RedrawNames,
    RevealAssignment,
    MarkGiftDone,
    MarkComplete,
    DeleteEvent,
}

impl LifecycleAction {
    /// Every gated action, for exhaustive checks
    pub const ALL: [LifecycleAction; 10] = [
        LifecycleAction::InviteParticipant,
        LifecycleAction::RespondToInvitation,
        LifecycleAction::RemoveParticipant,
        LifecycleAction::EditDetails,
        LifecycleAction::DrawNames,
        LifecycleAction::RedrawNames,
        LifecycleAction::RevealAssignment,
        LifecycleAction::MarkGiftDone,
        LifecycleAction::MarkComplete,
        LifecycleAction::DeleteEvent,
    ];

    /// Statuses in which this action is legal
    pub fn allowed_in(&self) -> &'static [EventStatus] {
        use EventStatus::{Completed, Drawn, InProgress, Pending};

        match self {
            // Roster and detail edits freeze once names are drawn
            LifecycleAction::InviteParticipant
            | LifecycleAction::RespondToInvitation
            | LifecycleAction::RemoveParticipant
            | LifecycleAction::EditDetails
            | LifecycleAction::DrawNames => &[Pending],
            LifecycleAction::RedrawNames => &[Drawn, InProgress],
            // Givers may still look up their receiver after completion
            LifecycleAction::RevealAssignment => &[Drawn, InProgress, Completed],
            LifecycleAction::MarkGiftDone => &[Drawn, InProgress],
            LifecycleAction::MarkComplete => &[Drawn, InProgress],
            LifecycleAction::DeleteEvent => &[Pending, Drawn, InProgress, Completed],
        }
    }

    pub fn is_allowed_in(&self, status: EventStatus) -> bool {
        self.allowed_in().contains(&status)
    }

    /// Operation name used in error messages and logs
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleAction::InviteParticipant => "invite_participant",
            LifecycleAction::RespondToInvitation => "respond_to_invitation",
            LifecycleAction::RemoveParticipant => "remove_participant",
            LifecycleAction::EditDetails => "edit_details",
            LifecycleAction::DrawNames => "draw_names",
            LifecycleAction::RedrawNames => "redraw_names",
            LifecycleAction::RevealAssignment => "reveal_assignment",
            LifecycleAction::MarkGiftDone => "mark_gift_done",
            LifecycleAction::MarkComplete => "mark_complete",
            LifecycleAction::DeleteEvent => "delete_event",
        }
    }
}

impl std::fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Fail with `InvalidState` unless the action is legal in the given status
pub fn ensure_allowed(action: LifecycleAction, status: EventStatus) -> Result<()> {
    if action.is_allowed_in(status) {
        Ok(())
    } else {
        Err(GiftBuddyError::InvalidState {
            operation: action.name().to_string(),
            status: status.to_string(),
        })
    }
}

/// Check whether a stored-status transition exists.
///
/// PENDING is initial and unreachable afterwards; COMPLETED is terminal.
/// IN_PROGRESS -> DRAWN happens only on a redraw, which discards the
/// revealed set.
pub fn can_transition(from: EventStatus, to: EventStatus) -> bool {
    use EventStatus::{Completed, Drawn, InProgress, Pending};

    matches!(
        (from, to),
        (Pending, Drawn)
            | (Drawn, InProgress)
            | (Drawn, Completed)
            | (InProgress, Completed)
            | (InProgress, Drawn)
    )
}

/// Fail with `InvalidStateTransition` unless the move is in the table
pub fn ensure_transition(from: EventStatus, to: EventStatus) -> Result<()> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(GiftBuddyError::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use EventStatus::{Completed, Drawn, InProgress, Pending};

    #[test]
    fn test_pending_only_actions() {
        for action in [
            LifecycleAction::InviteParticipant,
            LifecycleAction::RespondToInvitation,
            LifecycleAction::RemoveParticipant,
            LifecycleAction::EditDetails,
            LifecycleAction::DrawNames,
        ] {
            assert!(action.is_allowed_in(Pending), "{action} must allow pending");
            assert!(!action.is_allowed_in(Drawn));
            assert!(!action.is_allowed_in(InProgress));
            assert!(!action.is_allowed_in(Completed));
        }
    }

    #[test]
    fn test_reveal_allowed_after_completion() {
        assert!(LifecycleAction::RevealAssignment.is_allowed_in(Completed));
        assert!(!LifecycleAction::MarkGiftDone.is_allowed_in(Completed));
        assert!(!LifecycleAction::MarkComplete.is_allowed_in(Completed));
    }

    #[test]
    fn test_delete_allowed_everywhere() {
        for status in EventStatus::ALL {
            assert!(LifecycleAction::DeleteEvent.is_allowed_in(status));
        }
    }

    // Every action either passes ensure_allowed or fails with InvalidState
    // naming the operation, in every status.
    #[test]
    fn test_guard_completeness() {
        for action in LifecycleAction::ALL {
            for status in EventStatus::ALL {
                match ensure_allowed(action, status) {
                    Ok(()) => assert!(action.allowed_in().contains(&status)),
                    Err(GiftBuddyError::InvalidState { operation, status: s }) => {
                        assert!(!action.allowed_in().contains(&status));
                        assert_eq!(operation, action.name());
                        assert_eq!(s, status.to_string());
                    }
                    Err(other) => panic!("unexpected error: {other:?}"),
                }
            }
        }
    }

    #[test]
    fn test_transition_table() {
        assert!(can_transition(Pending, Drawn));
        assert!(can_transition(Drawn, InProgress));
        assert!(can_transition(Drawn, Completed));
        assert!(can_transition(InProgress, Completed));
        assert!(can_transition(InProgress, Drawn));

        // No way back to pending, nothing leaves completed
        for status in EventStatus::ALL {
            assert!(!can_transition(status, Pending));
            assert!(!can_transition(Completed, status));
        }

        assert!(ensure_transition(Pending, Completed).is_err());
        assert!(ensure_transition(Drawn, Drawn).is_err());
    }
}
