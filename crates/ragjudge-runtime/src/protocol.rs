//! The judge-protocol state machine.
//!
//! ```text
//! Init → Extracted → Judged → Scored ─┬─→ Done
//!                                      └─→ Reasoned → Done
//! ```
//!
//! `Failed` is reachable from every non-terminal state. A transition is
//! recorded when the stage it names has completed, so a stage made of several
//! judge calls (claims then truths, or one call per turn) is one transition.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use ragjudge_core::MetricKey;

/// Where one metric execution currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolState {
    Init,
    Extracted,
    Judged,
    Scored,
    Reasoned,
    Done,
    Failed,
}

impl ProtocolState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProtocolState::Done | ProtocolState::Failed)
    }

    /// Whether `next` may follow this state.
    pub fn can_advance_to(&self, next: ProtocolState) -> bool {
        use ProtocolState::*;
        match (self, next) {
            (Done, _) | (Failed, _) => false,
            (_, Failed) => true,
            (Init, Extracted)
            | (Extracted, Judged)
            | (Judged, Scored)
            | (Scored, Reasoned)
            | (Scored, Done)
            | (Reasoned, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ProtocolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProtocolState::Init => "init",
            ProtocolState::Extracted => "extracted",
            ProtocolState::Judged => "judged",
            ProtocolState::Scored => "scored",
            ProtocolState::Reasoned => "reasoned",
            ProtocolState::Done => "done",
            ProtocolState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// An illegal transition was requested.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Invalid protocol transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: ProtocolState,
    pub to: ProtocolState,
}

/// Tracks the state of one metric execution.
#[derive(Debug, Clone)]
pub struct Protocol {
    key: MetricKey,
    state: ProtocolState,
    history: Vec<ProtocolState>,
}

impl Protocol {
    pub fn new(key: MetricKey) -> Self {
        Self {
            key,
            state: ProtocolState::Init,
            history: vec![ProtocolState::Init],
        }
    }

    pub fn state(&self) -> ProtocolState {
        self.state
    }

    /// Every state visited, in order, starting with `Init`.
    pub fn history(&self) -> &[ProtocolState] {
        &self.history
    }

    pub fn advance(&mut self, next: ProtocolState) -> Result<(), InvalidTransition> {
        if !self.state.can_advance_to(next) {
            return Err(InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::trace!(metric = %self.key, from = %self.state, to = %next, "Protocol transition");
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    /// Move to `Failed` unless already terminal.
    pub fn fail(&mut self) {
        if !self.state.is_terminal() {
            self.state = ProtocolState::Failed;
            self.history.push(ProtocolState::Failed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ProtocolState::*;

    #[test]
    fn test_full_path_with_reason() {
        let mut p = Protocol::new(MetricKey::AnswerRelevancy);
        for next in [Extracted, Judged, Scored, Reasoned, Done] {
            p.advance(next).unwrap();
        }
        assert_eq!(p.state(), Done);
        assert_eq!(p.history(), &[Init, Extracted, Judged, Scored, Reasoned, Done]);
    }

    #[test]
    fn test_reason_is_optional() {
        let mut p = Protocol::new(MetricKey::GEval);
        for next in [Extracted, Judged, Scored, Done] {
            p.advance(next).unwrap();
        }
        assert_eq!(p.state(), Done);
    }

    #[test]
    fn test_skipping_a_stage_is_rejected() {
        let mut p = Protocol::new(MetricKey::Faithfulness);
        let err = p.advance(Judged).unwrap_err();
        assert_eq!(err, InvalidTransition { from: Init, to: Judged });
        assert_eq!(p.state(), Init);
    }

    #[test]
    fn test_failed_reachable_from_any_live_state() {
        for stop_after in 0..4 {
            let mut p = Protocol::new(MetricKey::Hallucination);
            for next in [Extracted, Judged, Scored, Reasoned].into_iter().take(stop_after) {
                p.advance(next).unwrap();
            }
            p.fail();
            assert_eq!(p.state(), Failed);
        }
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut p = Protocol::new(MetricKey::Faithfulness);
        p.fail();
        assert!(p.advance(Extracted).is_err());
        p.fail();
        assert_eq!(p.history(), &[Init, Failed]);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn state_strategy() -> impl Strategy<Value = ProtocolState> {
            prop_oneof![
                Just(Init),
                Just(Extracted),
                Just(Judged),
                Just(Scored),
                Just(Reasoned),
                Just(Done),
                Just(Failed),
            ]
        }

        proptest! {
            #[test]
            fn history_records_only_accepted_transitions(
                steps in proptest::collection::vec(state_strategy(), 0..12)
            ) {
                let mut p = Protocol::new(MetricKey::Faithfulness);
                let mut accepted = 0;
                for next in steps {
                    let before = p.state();
                    match p.advance(next) {
                        Ok(()) => {
                            accepted += 1;
                            prop_assert!(before.can_advance_to(next));
                        }
                        Err(_) => prop_assert_eq!(p.state(), before),
                    }
                }
                prop_assert_eq!(p.history().len(), accepted + 1);
                prop_assert_eq!(p.history()[0], Init);
            }
        }
    }
}
