use serde_json::json;

use crate::api::{ApiError, Backend};
use crate::model::BroadcastNotification;
use crate::session::Session;

/// Exact phrase the operator must type before a cascading activation is
/// committed. Case-sensitive; only surrounding whitespace is forgiven.
pub const CONFIRM_PHRASE: &str = "KONFIRMASI";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Year,
    Semester,
}

impl TargetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Year => "year",
            TargetKind::Semester => "semester",
        }
    }

    pub fn parse(s: &str) -> Option<TargetKind> {
        match s {
            "year" => Some(TargetKind::Year),
            "semester" => Some(TargetKind::Semester),
            _ => None,
        }
    }
}

/// Immutable activation request, snapshotted the moment the operator
/// proceeds past the choice dialog. The cascade flag is captured here and
/// never re-read from the live checkbox afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingActivation {
    pub kind: TargetKind,
    pub target_id: i64,
    pub display_name: String,
    pub cascade: bool,
}

/// Activation flow states. Linear: Idle -> ChoiceConfirm -> (CascadeConfirm ->)
/// Committing -> Idle, with cancel edges back to Idle from both dialogs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Flow {
    #[default]
    Idle,
    ChoiceConfirm {
        kind: TargetKind,
        target_id: i64,
        display_name: String,
        /// Live checkbox value, defaulting to true. Only `proceed` reads it.
        cascade: bool,
    },
    CascadeConfirm {
        pending: PendingActivation,
    },
    Committing {
        pending: PendingActivation,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// The target is already the active period; no call is made.
    AlreadyActive { display_name: String },
    /// Another activation dialog is open.
    DialogOpen,
    /// The method does not apply to the current state.
    WrongState { expected: &'static str },
    /// Typed phrase does not match `CONFIRM_PHRASE`; the flow stays put.
    PhraseMismatch,
}

impl FlowError {
    pub fn code(&self) -> &'static str {
        match self {
            FlowError::AlreadyActive { .. } => "already_active",
            FlowError::DialogOpen => "dialog_open",
            FlowError::WrongState { .. } => "wrong_state",
            FlowError::PhraseMismatch => "phrase_mismatch",
        }
    }

    pub fn message(&self) -> String {
        match self {
            FlowError::AlreadyActive { display_name } => {
                format!("{} is already the active period", display_name)
            }
            FlowError::DialogOpen => "another activation is already in progress".to_string(),
            FlowError::WrongState { expected } => {
                format!("activation flow is not in the {} step", expected)
            }
            FlowError::PhraseMismatch => format!(
                "type {} exactly to confirm the student-semester update",
                CONFIRM_PHRASE
            ),
        }
    }
}

/// Result of `proceed`: either the phrase dialog opens, or the request is
/// ready to commit straight away (cascade declined).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proceeded {
    NeedsPhrase,
    ReadyToCommit(PendingActivation),
}

pub fn commit_enabled(typed: &str) -> bool {
    typed.trim() == CONFIRM_PHRASE
}

impl Flow {
    /// Opens the choice dialog for an inactive target. Rejects already-active
    /// targets inline, before any state change or network call.
    pub fn begin(
        &mut self,
        kind: TargetKind,
        target_id: i64,
        display_name: &str,
        target_is_active: bool,
    ) -> Result<(), FlowError> {
        if !matches!(self, Flow::Idle) {
            return Err(FlowError::DialogOpen);
        }
        if target_is_active {
            return Err(FlowError::AlreadyActive {
                display_name: display_name.to_string(),
            });
        }
        *self = Flow::ChoiceConfirm {
            kind,
            target_id,
            display_name: display_name.to_string(),
            cascade: true,
        };
        Ok(())
    }

    /// Updates the live cascade checkbox while the choice dialog is open.
    pub fn set_cascade(&mut self, value: bool) -> Result<(), FlowError> {
        match self {
            Flow::ChoiceConfirm { cascade, .. } => {
                *cascade = value;
                Ok(())
            }
            _ => Err(FlowError::WrongState {
                expected: "choice-confirm",
            }),
        }
    }

    /// Leaves the choice dialog, snapshotting the checkbox into an immutable
    /// pending request. Toggling the checkbox after this has no effect.
    pub fn proceed(&mut self) -> Result<Proceeded, FlowError> {
        let Flow::ChoiceConfirm {
            kind,
            target_id,
            display_name,
            cascade,
        } = self
        else {
            return Err(FlowError::WrongState {
                expected: "choice-confirm",
            });
        };
        let pending = PendingActivation {
            kind: *kind,
            target_id: *target_id,
            display_name: std::mem::take(display_name),
            cascade: *cascade,
        };
        if pending.cascade {
            *self = Flow::CascadeConfirm {
                pending: pending.clone(),
            };
            Ok(Proceeded::NeedsPhrase)
        } else {
            *self = Flow::Committing {
                pending: pending.clone(),
            };
            Ok(Proceeded::ReadyToCommit(pending))
        }
    }

    /// Validates the typed phrase and arms the commit. On mismatch the flow
    /// stays in the phrase dialog.
    pub fn confirm_phrase(&mut self, typed: &str) -> Result<PendingActivation, FlowError> {
        let Flow::CascadeConfirm { pending } = self else {
            return Err(FlowError::WrongState {
                expected: "cascade-confirm",
            });
        };
        if !commit_enabled(typed) {
            return Err(FlowError::PhraseMismatch);
        }
        let pending = pending.clone();
        *self = Flow::Committing {
            pending: pending.clone(),
        };
        Ok(pending)
    }

    /// Discards the pending request from either dialog. No network call was
    /// or will be made for it.
    pub fn cancel(&mut self) -> Result<(), FlowError> {
        match self {
            Flow::ChoiceConfirm { .. } | Flow::CascadeConfirm { .. } => {
                *self = Flow::Idle;
                Ok(())
            }
            Flow::Idle => Ok(()),
            Flow::Committing { .. } => Err(FlowError::WrongState {
                expected: "a cancellable",
            }),
        }
    }

    /// Unconditional exit from Committing once the attempt has settled.
    pub fn finish(&mut self) {
        *self = Flow::Idle;
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Flow::Idle => json!({ "state": "idle" }),
            Flow::ChoiceConfirm {
                kind,
                target_id,
                display_name,
                cascade,
            } => json!({
                "state": "choice-confirm",
                "targetKind": kind.as_str(),
                "targetId": target_id,
                "displayName": display_name,
                "cascade": cascade,
            }),
            Flow::CascadeConfirm { pending } => json!({
                "state": "cascade-confirm",
                "targetKind": pending.kind.as_str(),
                "targetId": pending.target_id,
                "displayName": pending.display_name,
                "cascade": pending.cascade,
                "confirmPhrase": CONFIRM_PHRASE,
            }),
            Flow::Committing { pending } => json!({
                "state": "committing",
                "targetKind": pending.kind.as_str(),
                "targetId": pending.target_id,
            }),
        }
    }
}

/// Outcome of one commit attempt, before the authoritative list re-fetch.
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    pub success: bool,
    pub message: String,
    pub broadcast_attempted: bool,
}

/// Calls the activation endpoint for the pending request and, on success,
/// fires the best-effort broadcast. Broadcast failures are logged to stderr
/// and never surface; the caller still owes the list re-fetch regardless of
/// the outcome here.
pub fn run_commit(
    backend: &dyn Backend,
    session: Option<&Session>,
    pending: &PendingActivation,
) -> CommitOutcome {
    let result = match pending.kind {
        TargetKind::Year => backend.activate_tahun_ajaran(pending.target_id, pending.cascade),
        TargetKind::Semester => backend.activate_semester(pending.target_id, pending.cascade),
    };

    match result {
        Ok(()) => {
            let notification = broadcast_for(session, pending);
            if let Err(e) = backend.broadcast_notification(&notification) {
                // Non-critical side effect: swallow, log only.
                eprintln!("broadcast notification failed: {}", e);
            }
            CommitOutcome {
                success: true,
                message: format!("{} is now the active period", pending.display_name),
                broadcast_attempted: true,
            }
        }
        Err(e) => CommitOutcome {
            success: false,
            message: commit_error_message(pending, &e),
            broadcast_attempted: false,
        },
    }
}

fn broadcast_for(session: Option<&Session>, pending: &PendingActivation) -> BroadcastNotification {
    let by = session
        .map(|s| format!(" by {}", s.name))
        .unwrap_or_default();
    BroadcastNotification {
        title: "Periode akademik diperbarui".to_string(),
        message: format!("{} has been activated{}", pending.display_name, by),
        kind: "academic-period".to_string(),
        send_to_all: true,
    }
}

/// A 5xx during activation is the known data-conflict case when moving to a
/// previously-active period, so it earns the cascade-off retry hint. Other
/// failures keep their own message.
fn commit_error_message(pending: &PendingActivation, error: &ApiError) -> String {
    if error.is_server_error() && pending.cascade {
        format!(
            "failed to activate {}: the student-semester update conflicted with existing \
             records; try again with the update disabled",
            pending.display_name
        )
    } else {
        format!("failed to activate {}: {}", pending.display_name, error.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_choice(flow: &mut Flow) {
        flow.begin(TargetKind::Year, 7, "2024/2025", false)
            .expect("begin");
    }

    #[test]
    fn commit_enabled_only_for_exact_phrase() {
        assert!(commit_enabled("KONFIRMASI"));
        assert!(commit_enabled("  KONFIRMASI  "));
        assert!(!commit_enabled("konfirmasi"));
        assert!(!commit_enabled("Konfirmasi"));
        assert!(!commit_enabled("KONFIRMAS"));
        assert!(!commit_enabled("KONFIRMASI!"));
        assert!(!commit_enabled(""));
        assert!(!commit_enabled("KON FIRMASI"));
    }

    #[test]
    fn begin_rejects_active_target_without_transition() {
        let mut flow = Flow::default();
        let err = flow
            .begin(TargetKind::Year, 7, "2024/2025", true)
            .unwrap_err();
        assert!(matches!(err, FlowError::AlreadyActive { .. }));
        assert_eq!(flow, Flow::Idle);
    }

    #[test]
    fn begin_rejects_second_dialog() {
        let mut flow = Flow::default();
        open_choice(&mut flow);
        let err = flow
            .begin(TargetKind::Semester, 9, "Ganjil 2024/2025", false)
            .unwrap_err();
        assert_eq!(err, FlowError::DialogOpen);
    }

    #[test]
    fn cascade_choice_is_snapshotted_at_proceed() {
        let mut flow = Flow::default();
        open_choice(&mut flow);
        flow.set_cascade(true).expect("set cascade");
        let step = flow.proceed().expect("proceed");
        assert_eq!(step, Proceeded::NeedsPhrase);

        // The checkbox no longer exists; flipping it is a state error and
        // the pending request keeps cascade=true.
        assert!(matches!(
            flow.set_cascade(false),
            Err(FlowError::WrongState { .. })
        ));
        let pending = flow.confirm_phrase("KONFIRMASI").expect("confirm");
        assert!(pending.cascade);
    }

    #[test]
    fn declining_cascade_skips_phrase_dialog() {
        let mut flow = Flow::default();
        open_choice(&mut flow);
        flow.set_cascade(false).expect("set cascade");
        match flow.proceed().expect("proceed") {
            Proceeded::ReadyToCommit(pending) => {
                assert!(!pending.cascade);
                assert_eq!(pending.target_id, 7);
            }
            Proceeded::NeedsPhrase => panic!("expected direct commit"),
        }
        assert!(matches!(flow, Flow::Committing { .. }));
    }

    #[test]
    fn phrase_mismatch_keeps_flow_in_place() {
        let mut flow = Flow::default();
        open_choice(&mut flow);
        flow.proceed().expect("proceed");
        assert_eq!(
            flow.confirm_phrase("konfirmasi").unwrap_err(),
            FlowError::PhraseMismatch
        );
        assert!(matches!(flow, Flow::CascadeConfirm { .. }));
        // Exact phrase still works afterwards.
        assert!(flow.confirm_phrase("KONFIRMASI").is_ok());
    }

    #[test]
    fn cancel_discards_pending_from_either_dialog() {
        let mut flow = Flow::default();
        open_choice(&mut flow);
        flow.cancel().expect("cancel choice");
        assert_eq!(flow, Flow::Idle);

        open_choice(&mut flow);
        flow.proceed().expect("proceed");
        flow.cancel().expect("cancel phrase dialog");
        assert_eq!(flow, Flow::Idle);
    }

    #[test]
    fn finish_always_returns_to_idle() {
        let mut flow = Flow::default();
        open_choice(&mut flow);
        flow.set_cascade(false).expect("set cascade");
        flow.proceed().expect("proceed");
        flow.finish();
        assert_eq!(flow, Flow::Idle);
    }
}
