//! A small credit-based send budget, used on both sides of a `ReplyHandler`.
//!
//! This is a much narrower cousin of
//! `h2::proto::streams::flow_control::FlowControl`: there is no
//! window/available split here because neither side of this adapter ever
//! advertises capacity it hasn't already granted — the spec's budgets are
//! single numbers that WINDOW increases and emitted frames decrease.

/// Bytes currently available to spend, as granted by WINDOW frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreditWindow {
    budget: i32,
}

impl CreditWindow {
    pub fn new() -> Self {
        CreditWindow { budget: 0 }
    }

    pub fn budget(&self) -> i32 {
        self.budget
    }

    /// Applies a WINDOW frame's credit.
    pub fn grant(&mut self, credit: i32) {
        self.budget += credit;
    }

    /// Spends `cost` only if the window currently covers it, leaving the
    /// budget untouched otherwise. Used on the network side, where a frame
    /// that doesn't fit must be deferred rather than partially sent.
    pub fn try_spend(&mut self, cost: i32) -> bool {
        if self.budget >= cost {
            self.budget -= cost;
            true
        } else {
            false
        }
    }

    /// Spends `cost` unconditionally. Used on the application side, where
    /// the spec requires decrementing first and resetting the stream if the
    /// result goes negative, rather than refusing the write.
    pub fn spend(&mut self, cost: i32) {
        self.budget -= cost;
    }

    pub fn is_negative(&self) -> bool {
        self.budget < 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_spend_refuses_when_short_by_one() {
        let mut w = CreditWindow::new();
        w.grant(10);
        assert!(!w.try_spend(11));
        assert_eq!(w.budget(), 10);
    }

    #[test]
    fn try_spend_exact_fit_drains_window() {
        let mut w = CreditWindow::new();
        w.grant(10);
        assert!(w.try_spend(10));
        assert_eq!(w.budget(), 0);
    }

    #[test]
    fn spend_can_go_negative_for_caller_to_detect() {
        let mut w = CreditWindow::new();
        w.grant(5);
        w.spend(6);
        assert!(w.is_negative());
    }
}
