//! Verification stage tracking.
//!
//! ```text
//! Received → Validated → Classified → Rejected
//!                                   → Accepted → Minted
//!                                              → MintFailed
//! Received → Invalid
//! Validated → ClassificationFailed
//! ```

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VerificationStage {
    Received,
    Validated,
    Classified,
    Accepted,
    /// Terminal: classifier ran, policy said no.
    Rejected,
    /// Terminal: ledger confirmed the mint.
    Minted,
    /// Terminal: verified but not rewarded.
    MintFailed,
    /// Terminal: caller-fixable input errors.
    Invalid,
    /// Terminal: the classifier could not assess the image.
    ClassificationFailed,
}

impl VerificationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStage::Received => "received",
            VerificationStage::Validated => "validated",
            VerificationStage::Classified => "classified",
            VerificationStage::Accepted => "accepted",
            VerificationStage::Rejected => "rejected",
            VerificationStage::Minted => "minted",
            VerificationStage::MintFailed => "mint_failed",
            VerificationStage::Invalid => "invalid",
            VerificationStage::ClassificationFailed => "classification_failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            VerificationStage::Rejected
                | VerificationStage::Minted
                | VerificationStage::MintFailed
                | VerificationStage::Invalid
                | VerificationStage::ClassificationFailed
        )
    }

    pub fn can_advance_to(&self, next: VerificationStage) -> bool {
        use VerificationStage::*;
        matches!(
            (self, next),
            (Received, Validated)
                | (Received, Invalid)
                | (Validated, Classified)
                | (Validated, ClassificationFailed)
                | (Classified, Accepted)
                | (Classified, Rejected)
                | (Accepted, Minted)
                | (Accepted, MintFailed)
        )
    }
}

/// The stage of one request. Starts at `Received` and only moves along the
/// transitions in the diagram above.
#[derive(Debug)]
pub struct StageTracker {
    current: VerificationStage,
}

impl StageTracker {
    pub fn new() -> Self {
        Self {
            current: VerificationStage::Received,
        }
    }

    pub fn current(&self) -> VerificationStage {
        self.current
    }

    /// Move to `next` and return it.
    ///
    /// Panics in debug builds on a transition the machine does not allow.
    pub fn advance(&mut self, next: VerificationStage) -> VerificationStage {
        debug_assert!(
            self.current.can_advance_to(next),
            "illegal stage transition {} -> {}",
            self.current,
            next
        );
        self.current = next;
        next
    }
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VerificationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::StageTracker;
    use super::VerificationStage::*;

    #[test]
    fn terminal_stages_do_not_advance() {
        for stage in [Rejected, Minted, MintFailed, Invalid, ClassificationFailed] {
            assert!(stage.is_terminal());
            for next in [Received, Validated, Classified, Accepted, Minted] {
                assert!(!stage.can_advance_to(next));
            }
        }
    }

    #[test]
    fn invalid_input_never_reaches_classification() {
        assert!(!Received.can_advance_to(Classified));
        assert!(!Invalid.can_advance_to(Classified));
        assert!(Received.can_advance_to(Invalid));
    }

    #[test]
    fn mint_only_follows_acceptance() {
        assert!(!Classified.can_advance_to(Minted));
        assert!(!Rejected.can_advance_to(Minted));
        assert!(Accepted.can_advance_to(Minted));
    }

    #[test]
    fn tracker_follows_the_mint_path() {
        let mut stage = StageTracker::new();
        assert_eq!(stage.current(), Received);
        for next in [Validated, Classified, Accepted, Minted] {
            assert_eq!(stage.advance(next), next);
        }
        assert!(stage.current().is_terminal());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "illegal stage transition classified -> minted")]
    fn tracker_refuses_to_skip_acceptance() {
        let mut stage = StageTracker::new();
        stage.advance(Validated);
        stage.advance(Classified);
        stage.advance(Minted);
    }
}
