//! Pure derivation of the display step from status plus audit history.
//!
//! Every consumer (status stepper, review dialogs, dashboards) derives the
//! active step through this single function, so the rendered position can
//! never drift between surfaces.

use crate::domain::{ApplicationStatus, AuditAction, AuditEvent};

/// Position of an application along the review pipeline, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Created,
    Submitted,
    AnalystApproved,
    UnderReview,
    Decided,
}

impl Step {
    /// Zero-based index for stepper widgets.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

fn step_for_action(action: AuditAction) -> Option<Step> {
    match action {
        AuditAction::Created => Some(Step::Created),
        AuditAction::Submitted => Some(Step::Submitted),
        AuditAction::MarkReady => Some(Step::AnalystApproved),
        AuditAction::UnderReview => Some(Step::UnderReview),
        AuditAction::Approved | AuditAction::Declined | AuditAction::Rejected => {
            Some(Step::Decided)
        }
        // Bookkeeping actions do not move the stepper.
        AuditAction::NeedsInfo
        | AuditAction::Updated
        | AuditAction::DocumentUploaded
        | AuditAction::DocumentVerified
        | AuditAction::PaymentRecorded => None,
    }
}

fn step_for_status(status: ApplicationStatus) -> Step {
    match status {
        ApplicationStatus::Draft => Step::Created,
        ApplicationStatus::Submitted | ApplicationStatus::NeedsInfo => Step::Submitted,
        ApplicationStatus::AnalystApproved => Step::AnalystApproved,
        ApplicationStatus::UnderReview => Step::UnderReview,
        ApplicationStatus::Approved | ApplicationStatus::Declined | ApplicationStatus::Rejected => {
            Step::Decided
        }
    }
}

/// Compute the active step.
///
/// Any terminal decision event wins outright. Otherwise the latest
/// step-bearing event determines the position, with timestamp ties resolved
/// toward the later pipeline stage. With no step-bearing events at all, the
/// stored status decides. When the audit trail and the status disagree (for
/// example a `mark_ready` event recorded while the status column still says
/// `submitted`), the audit trail is authoritative.
pub fn current_step(status: ApplicationStatus, events: &[AuditEvent]) -> Step {
    if events.iter().any(|e| e.action.is_terminal()) {
        return Step::Decided;
    }

    events
        .iter()
        .filter_map(|e| step_for_action(e.action).map(|s| (e.created_at, s)))
        .max()
        .map(|(_, step)| step)
        .unwrap_or_else(|| step_for_status(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ApplicationId, AuditEvent, Role};
    use chrono::{Duration, Utc};

    fn event_at(action: AuditAction, offset_secs: i64) -> AuditEvent {
        let mut event = AuditEvent::new(
            ApplicationId::new(),
            action,
            Role::Customer,
            "cust-1".into(),
        );
        event.created_at = Utc::now() + Duration::seconds(offset_secs);
        event
    }

    #[test]
    fn no_events_falls_back_to_status() {
        assert_eq!(
            current_step(ApplicationStatus::Draft, &[]),
            Step::Created
        );
        assert_eq!(
            current_step(ApplicationStatus::UnderReview, &[]),
            Step::UnderReview
        );
        assert_eq!(
            current_step(ApplicationStatus::Declined, &[]),
            Step::Decided
        );
    }

    #[test]
    fn terminal_event_wins_over_everything() {
        let events = vec![
            event_at(AuditAction::Created, 0),
            event_at(AuditAction::Submitted, 1),
            event_at(AuditAction::Declined, 2),
        ];
        assert_eq!(
            current_step(ApplicationStatus::Submitted, &events),
            Step::Decided
        );
    }

    #[test]
    fn latest_event_determines_step() {
        let events = vec![
            event_at(AuditAction::Created, 0),
            event_at(AuditAction::Submitted, 1),
            event_at(AuditAction::UnderReview, 3),
            event_at(AuditAction::MarkReady, 2),
        ];
        assert_eq!(
            current_step(ApplicationStatus::UnderReview, &events),
            Step::UnderReview
        );
    }

    #[test]
    fn audit_trail_beats_stale_status() {
        // mark_ready recorded but the status column still says submitted:
        // the trail is authoritative.
        let events = vec![
            event_at(AuditAction::Submitted, 0),
            event_at(AuditAction::MarkReady, 1),
        ];
        assert_eq!(
            current_step(ApplicationStatus::Submitted, &events),
            Step::AnalystApproved
        );
    }

    #[test]
    fn timestamp_tie_resolves_to_later_stage() {
        let mut a = event_at(AuditAction::Submitted, 0);
        let mut b = event_at(AuditAction::MarkReady, 0);
        let now = Utc::now();
        a.created_at = now;
        b.created_at = now;
        assert_eq!(
            current_step(ApplicationStatus::Submitted, &[a, b]),
            Step::AnalystApproved
        );
    }

    #[test]
    fn bookkeeping_events_do_not_move_the_stepper() {
        let events = vec![
            event_at(AuditAction::Submitted, 0),
            event_at(AuditAction::DocumentUploaded, 1),
            event_at(AuditAction::DocumentVerified, 2),
            event_at(AuditAction::NeedsInfo, 3),
        ];
        assert_eq!(
            current_step(ApplicationStatus::NeedsInfo, &events),
            Step::Submitted
        );
    }

    #[test]
    fn step_indices_are_ordered() {
        assert_eq!(Step::Created.index(), 0);
        assert_eq!(Step::Decided.index(), 4);
        assert!(Step::Submitted < Step::UnderReview);
    }
}
