//! Text shown around the wheel: trigger label, status line, result line.

use crate::spin::{SpinOutcome, SpinRejected};

pub const ALREADY_PLAYED: &str = "You already played (demo).";
pub const SPIN_AGAIN_MESSAGE: &str = "Spin again! 🔁 Your luck isn't done yet.";
const STATUS_LOCKED: &str = "One spin per visit.";
const STATUS_OPEN: &str = "One spin per visit (demo).";

pub fn result_message(outcome: &SpinOutcome) -> String {
    if outcome.spin_again {
        SPIN_AGAIN_MESSAGE.to_string()
    } else {
        format!("{} 🎉", outcome.label)
    }
}

/// Trigger button and the two text lines under the wheel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Panel {
    pub button_label: &'static str,
    pub button_enabled: bool,
    pub status: &'static str,
    pub result: Option<String>,
}

impl Panel {
    pub fn new(locked: bool) -> Self {
        let mut panel = Self::default();
        panel.refresh(locked);
        panel
    }

    /// Re-derive button and status from the gate.
    pub fn refresh(&mut self, locked: bool) {
        if locked {
            self.button_label = "SPIN (locked)";
            self.button_enabled = false;
            self.status = STATUS_LOCKED;
        } else {
            self.button_label = "SPIN";
            self.button_enabled = true;
            self.status = STATUS_OPEN;
        }
    }

    pub fn spinning(&mut self) {
        self.button_enabled = false;
    }

    pub fn landed(&mut self, outcome: &SpinOutcome, locked: bool) {
        self.result = Some(result_message(outcome));
        if outcome.spin_again {
            self.button_label = "SPIN AGAIN";
            self.button_enabled = true;
        } else {
            self.refresh(locked);
        }
    }

    pub fn rejected(&mut self, reason: SpinRejected) {
        if reason == SpinRejected::Locked {
            self.result = Some(ALREADY_PLAYED.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(label: &str, spin_again: bool) -> SpinOutcome {
        SpinOutcome {
            index: 0,
            label: label.to_string(),
            rotation: 0.0,
            spin_again,
        }
    }

    #[test]
    fn prize_message_has_party_popper() {
        assert_eq!(result_message(&outcome("5% OFF", false)), "5% OFF 🎉");
    }

    #[test]
    fn spin_again_has_its_own_message() {
        assert_eq!(
            result_message(&outcome("Spin again", true)),
            SPIN_AGAIN_MESSAGE
        );
    }

    #[test]
    fn panel_tracks_lock_state() {
        let mut panel = Panel::new(false);
        assert_eq!(panel.button_label, "SPIN");
        assert!(panel.button_enabled);
        assert_eq!(panel.status, "One spin per visit (demo).");

        panel.spinning();
        assert!(!panel.button_enabled);

        panel.landed(&outcome("Free keychain", false), true);
        assert_eq!(panel.button_label, "SPIN (locked)");
        assert!(!panel.button_enabled);
        assert_eq!(panel.status, "One spin per visit.");
        assert_eq!(panel.result.as_deref(), Some("Free keychain 🎉"));
    }

    #[test]
    fn spin_again_reenables_trigger() {
        let mut panel = Panel::new(false);
        panel.spinning();
        panel.landed(&outcome("Spin again", true), false);
        assert_eq!(panel.button_label, "SPIN AGAIN");
        assert!(panel.button_enabled);
    }

    #[test]
    fn only_locked_rejections_produce_a_message() {
        let mut panel = Panel::new(false);
        panel.rejected(SpinRejected::AlreadySpinning);
        assert_eq!(panel.result, None);
        panel.rejected(SpinRejected::Locked);
        assert_eq!(panel.result.as_deref(), Some(ALREADY_PLAYED));
    }
}
