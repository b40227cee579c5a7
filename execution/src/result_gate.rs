//! Result dialog gate.
//!
//! Decides when the round-result dialog may be shown:
//!
//! ```text
//! Idle --(bets closed, user has placements)--> AwaitingResult
//! AwaitingResult --(resolved outcome for this round)--> ShowingResult
//! ShowingResult --(newer resolution for this round)--> ShowingResult (refresh)
//! ShowingResult --(dismiss | newer round)--> Idle
//! ```
//!
//! The dialog never opens before the backend's outcome is available, no matter how long
//! the round has been finished: market-linked games settle a few seconds after round-end.
//! Rounds without user placements never leave `Idle`.

use serde::Serialize;
use tracing::debug;

use crate::outcome::Resolution;
use crate::round_clock::Phase;

/// Current gate state.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GateState {
    Idle,
    AwaitingResult { round_id: u64 },
    ShowingResult { round_id: u64, resolution: Resolution },
}

/// Result dialog state machine for one game screen.
#[derive(Clone, Debug)]
pub struct ResultGate {
    state: GateState,
    /// Last round whose dialog was shown (or skipped); never re-entered.
    closed_round: Option<u64>,
}

impl Default for ResultGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultGate {
    pub fn new() -> Self {
        Self {
            state: GateState::Idle,
            closed_round: None,
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, GateState::Idle)
    }

    /// The resolution currently on display.
    pub fn showing(&self) -> Option<&Resolution> {
        match &self.state {
            GateState::ShowingResult { resolution, .. } => Some(resolution),
            _ => None,
        }
    }

    /// Feed the latest clock reading for `round_id`.
    ///
    /// A round first observed after it has already finished still qualifies, so a
    /// late-joining screen shows the result of bets it placed.
    pub fn observe(&mut self, round_id: u64, phase: Phase, placement_count: usize) {
        if !matches!(self.state, GateState::Idle) {
            return;
        }
        if self.closed_round == Some(round_id) {
            return;
        }
        if phase.is_closed() && placement_count > 0 {
            debug!(round_id, "awaiting round result");
            self.state = GateState::AwaitingResult { round_id };
        }
    }

    /// Offer a resolution. Only a resolved outcome for the awaited round opens the dialog.
    ///
    /// Returns whether the dialog opened.
    pub fn outcome_available(&mut self, resolution: &Resolution) -> bool {
        let GateState::AwaitingResult { round_id } = self.state else {
            return false;
        };
        if resolution.round_id != round_id || !resolution.is_resolved() {
            return false;
        }
        self.state = GateState::ShowingResult {
            round_id,
            resolution: resolution.clone(),
        };
        true
    }

    /// Replace the displayed resolution with a newer one for the same round.
    ///
    /// A placements refetch can bring the backend's settled amounts after the dialog
    /// opened; the dialog must show the same figures as the rest of the screen.
    pub fn refresh(&mut self, resolution: &Resolution) {
        if let GateState::ShowingResult {
            round_id,
            resolution: shown,
        } = &mut self.state
        {
            if resolution.round_id == *round_id
                && resolution.is_resolved()
                && *shown != *resolution
            {
                debug!(round_id = *round_id, "refreshing shown round result");
                *shown = resolution.clone();
            }
        }
    }

    /// Explicit user dismissal.
    pub fn dismiss(&mut self) {
        if let GateState::ShowingResult { round_id, .. } = self.state {
            self.closed_round = Some(round_id);
            self.state = GateState::Idle;
        }
    }

    /// A newer round replaced the one the gate is tracking.
    pub fn round_superseded(&mut self, new_round_id: u64) {
        let tracked = match &self.state {
            GateState::Idle => return,
            GateState::AwaitingResult { round_id } => *round_id,
            GateState::ShowingResult { round_id, .. } => *round_id,
        };
        if new_round_id != tracked {
            debug!(tracked, new_round_id, "result gate reset by newer round");
            self.closed_round = Some(tracked);
            self.state = GateState::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::ResolutionStatus;
    use std::collections::BTreeSet;

    fn resolution(round_id: u64, status: ResolutionStatus) -> Resolution {
        Resolution {
            round_id,
            status,
            winners: BTreeSet::new(),
            ranking: Vec::new(),
            placements: Vec::new(),
            net_result: Some(0),
            target_angle_degrees: None,
        }
    }

    #[test]
    fn test_full_cycle() {
        let mut gate = ResultGate::new();
        gate.observe(1, Phase::AcceptingBets, 2);
        assert!(gate.is_idle());

        gate.observe(1, Phase::BetsClosed, 2);
        assert_eq!(gate.state(), &GateState::AwaitingResult { round_id: 1 });

        assert!(gate.outcome_available(&resolution(1, ResolutionStatus::Resolved)));
        assert!(gate.showing().is_some());

        gate.dismiss();
        assert!(gate.is_idle());

        // Same round keeps ticking after dismissal.
        gate.observe(1, Phase::Finished, 2);
        assert!(gate.is_idle());
    }

    #[test]
    fn test_no_placements_stays_idle() {
        let mut gate = ResultGate::new();
        for phase in [Phase::AcceptingBets, Phase::BetsClosed, Phase::Finished] {
            gate.observe(1, phase, 0);
            assert!(gate.is_idle());
        }
        assert!(!gate.outcome_available(&resolution(1, ResolutionStatus::Resolved)));
        assert!(gate.is_idle());
    }

    #[test]
    fn test_waits_for_outcome_after_finish() {
        let mut gate = ResultGate::new();
        gate.observe(1, Phase::BetsClosed, 1);
        for _ in 0..10_000 {
            gate.observe(1, Phase::Finished, 1);
            assert!(!gate.outcome_available(&resolution(1, ResolutionStatus::Pending)));
            assert_eq!(gate.state(), &GateState::AwaitingResult { round_id: 1 });
        }
    }

    #[test]
    fn test_inconsistent_or_foreign_outcome_ignored() {
        let mut gate = ResultGate::new();
        gate.observe(3, Phase::BetsClosed, 1);
        assert!(!gate.outcome_available(&resolution(3, ResolutionStatus::Inconsistent)));
        assert!(!gate.outcome_available(&resolution(2, ResolutionStatus::Resolved)));
        assert_eq!(gate.state(), &GateState::AwaitingResult { round_id: 3 });
    }

    #[test]
    fn test_late_join_after_finish() {
        let mut gate = ResultGate::new();
        gate.observe(5, Phase::Finished, 1);
        assert_eq!(gate.state(), &GateState::AwaitingResult { round_id: 5 });
    }

    #[test]
    fn test_superseded_while_showing() {
        let mut gate = ResultGate::new();
        gate.observe(1, Phase::BetsClosed, 1);
        gate.outcome_available(&resolution(1, ResolutionStatus::Resolved));
        gate.round_superseded(1);
        assert!(gate.showing().is_some());

        gate.round_superseded(2);
        assert!(gate.is_idle());

        gate.observe(2, Phase::BetsClosed, 1);
        assert_eq!(gate.state(), &GateState::AwaitingResult { round_id: 2 });
    }

    #[test]
    fn test_superseded_while_awaiting() {
        let mut gate = ResultGate::new();
        gate.observe(1, Phase::BetsClosed, 1);
        gate.round_superseded(2);
        assert!(gate.is_idle());
        // A late outcome for the abandoned round does nothing.
        assert!(!gate.outcome_available(&resolution(1, ResolutionStatus::Resolved)));
        gate.observe(1, Phase::Finished, 1);
        assert!(gate.is_idle());
    }

    #[test]
    fn test_state_serialization() {
        assert_eq!(
            serde_json::to_value(GateState::Idle).unwrap(),
            serde_json::json!({"state": "idle"})
        );
        assert_eq!(
            serde_json::to_value(GateState::AwaitingResult { round_id: 3 }).unwrap(),
            serde_json::json!({"state": "awaiting_result", "round_id": 3})
        );
    }

    #[test]
    fn test_dismiss_without_dialog_is_noop() {
        let mut gate = ResultGate::new();
        gate.dismiss();
        assert!(gate.is_idle());
        gate.observe(1, Phase::BetsClosed, 1);
        gate.dismiss();
        assert_eq!(gate.state(), &GateState::AwaitingResult { round_id: 1 });
    }

    #[test]
    fn test_refresh_updates_shown_result() {
        let mut gate = ResultGate::new();
        gate.observe(1, Phase::BetsClosed, 1);

        // Nothing to refresh before the dialog opens.
        let mut settled = resolution(1, ResolutionStatus::Resolved);
        settled.net_result = Some(500);
        gate.refresh(&settled);
        assert_eq!(gate.state(), &GateState::AwaitingResult { round_id: 1 });

        assert!(gate.outcome_available(&resolution(1, ResolutionStatus::Resolved)));
        assert_eq!(gate.showing().and_then(|r| r.net_result), Some(0));

        gate.refresh(&settled);
        assert_eq!(gate.showing().and_then(|r| r.net_result), Some(500));

        // Foreign or unresolved results never replace the shown one.
        gate.refresh(&resolution(2, ResolutionStatus::Resolved));
        gate.refresh(&resolution(1, ResolutionStatus::Inconsistent));
        assert_eq!(gate.showing().and_then(|r| r.net_result), Some(500));
    }
}
