// --- File: crates/termin_booking/src/lifecycle.rs ---

//! Appointment state machine.
//!
//! ```text
//! pending ──confirm──▶ confirmed
//!    │                    │
//!    ├──cancel──▶ cancelled ◀──cancel──┤
//!    └──block───▶ blocked   ◀──block───┘
//! ```
//!
//! `cancelled` and `blocked` are terminal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use termin_common::{AppointmentStatus, NotificationKind};

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleAction {
    Confirm,
    Cancel,
    Block,
}

impl LifecycleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleAction::Confirm => "confirm",
            LifecycleAction::Cancel => "cancel",
            LifecycleAction::Block => "block",
        }
    }

    /// State reached when the action applies.
    pub fn target(&self) -> AppointmentStatus {
        match self {
            LifecycleAction::Confirm => AppointmentStatus::Confirmed,
            LifecycleAction::Cancel => AppointmentStatus::Cancelled,
            LifecycleAction::Block => AppointmentStatus::Blocked,
        }
    }

    pub fn notification_kind(&self) -> NotificationKind {
        match self {
            LifecycleAction::Confirm => NotificationKind::AppointmentConfirmed,
            LifecycleAction::Cancel => NotificationKind::AppointmentCancelled,
            LifecycleAction::Block => NotificationKind::AppointmentBlocked,
        }
    }
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirm" => Ok(LifecycleAction::Confirm),
            "cancel" => Ok(LifecycleAction::Cancel),
            "block" => Ok(LifecycleAction::Block),
            other => Err(format!("unknown action: {other}")),
        }
    }
}

/// Outcome of applying an action to a status. Only `Applied` changes anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
    AlreadyInState(AppointmentStatus),
    Invalid {
        from: AppointmentStatus,
        action: LifecycleAction,
    },
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied { .. })
    }

    /// Status the appointment has after the attempt.
    pub fn resulting_status(&self) -> AppointmentStatus {
        match *self {
            Transition::Applied { to, .. } => to,
            Transition::AlreadyInState(status) => status,
            Transition::Invalid { from, .. } => from,
        }
    }
}

pub trait Lifecycle {
    fn apply(self, action: LifecycleAction) -> Transition;
}

impl Lifecycle for AppointmentStatus {
    fn apply(self, action: LifecycleAction) -> Transition {
        use AppointmentStatus::*;
        use LifecycleAction::*;

        match (self, action) {
            (Pending, Confirm) => Transition::Applied { from: self, to: Confirmed },
            (Confirmed, Confirm) => Transition::AlreadyInState(self),
            (Cancelled, Cancel) | (Blocked, Block) => Transition::AlreadyInState(self),
            (Pending | Confirmed, Cancel | Block) => Transition::Applied {
                from: self,
                to: action.target(),
            },
            (Cancelled | Blocked, _) => Transition::Invalid { from: self, action },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AppointmentStatus::*;

    #[test]
    fn pending_moves_forward() {
        assert_eq!(
            Pending.apply(LifecycleAction::Confirm),
            Transition::Applied { from: Pending, to: Confirmed }
        );
        assert_eq!(
            Pending.apply(LifecycleAction::Cancel),
            Transition::Applied { from: Pending, to: Cancelled }
        );
        assert_eq!(
            Confirmed.apply(LifecycleAction::Block),
            Transition::Applied { from: Confirmed, to: Blocked }
        );
    }

    #[test]
    fn repeated_actions_are_idempotent() {
        assert_eq!(Confirmed.apply(LifecycleAction::Confirm), Transition::AlreadyInState(Confirmed));
        assert_eq!(Cancelled.apply(LifecycleAction::Cancel), Transition::AlreadyInState(Cancelled));
        assert_eq!(Blocked.apply(LifecycleAction::Block), Transition::AlreadyInState(Blocked));
    }

    #[test]
    fn terminal_states_do_not_reactivate() {
        for action in [LifecycleAction::Confirm, LifecycleAction::Cancel, LifecycleAction::Block] {
            for terminal in [Cancelled, Blocked] {
                let transition = terminal.apply(action);
                assert!(!transition.is_applied(), "{terminal} --{action}--> must not apply");
                assert_eq!(transition.resulting_status(), terminal);
            }
        }
        assert_eq!(
            Cancelled.apply(LifecycleAction::Confirm),
            Transition::Invalid { from: Cancelled, action: LifecycleAction::Confirm }
        );
    }

    #[test]
    fn actions_parse_from_path_segments() {
        assert_eq!("confirm".parse(), Ok(LifecycleAction::Confirm));
        assert!("delete".parse::<LifecycleAction>().is_err());
    }
}
