//! Spin engine: trajectory, eased animation and exact landing.
//!
//! The engine is frame-agnostic. A host calls [`SpinEngine::start_spin`],
//! then [`SpinEngine::advance`] with the elapsed time on every frame until it
//! returns [`SpinStep::Done`], redrawing at [`SpinEngine::rotation`] after
//! each call.

use std::f64::consts::TAU;
use std::ops::{Range, RangeInclusive};

use tracing::{debug, info};

use crate::error::{Result, WheelError};
use crate::random::SpinRandom;
use crate::store::{KeyValueStore, LockGate};
use crate::wheel::{normalize_angle, Wheel};

/// Cubic ease-out: fast start, decelerating finish.
pub fn ease_out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}

/// Fewest whole turns that keep every spin moving forward. The wheel rests
/// in `[0, 2π)` and a slice center sits up to `2.5π` behind the pointer, so
/// two turns can end short of the start.
pub const MIN_TURNS: u32 = 3;

/// Ranges the random draws are taken from.
#[derive(Debug, Clone, PartialEq)]
pub struct SpinTuning {
    pub turns: RangeInclusive<u32>,
    pub duration_ms: Range<f64>,
}

impl Default for SpinTuning {
    fn default() -> Self {
        Self {
            turns: 5..=8,
            duration_ms: 3200.0..4000.0,
        }
    }
}

impl SpinTuning {
    pub fn validate(&self) -> Result<()> {
        if self.turns.is_empty() {
            return Err(WheelError::Configuration(format!(
                "turn range {:?} is empty",
                self.turns
            )));
        }
        if *self.turns.start() < MIN_TURNS {
            return Err(WheelError::Configuration(format!(
                "spins need at least {} turns, got {}",
                MIN_TURNS,
                self.turns.start()
            )));
        }
        let d = &self.duration_ms;
        if !(d.start.is_finite() && d.end.is_finite()) || d.start <= 0.0 || d.is_empty() {
            return Err(WheelError::Configuration(format!(
                "duration range {:?} must be positive and non-empty",
                d
            )));
        }
        Ok(())
    }
}

/// Everything decided when a spin starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinPlan {
    pub target_index: usize,
    pub turns: u32,
    pub duration_ms: f64,
    pub start_rotation: f64,
    pub final_rotation: f64,
}

impl SpinPlan {
    pub fn delta(&self) -> f64 {
        self.final_rotation - self.start_rotation
    }

    /// Rotation `elapsed_ms` into the animation, and whether it has ended.
    pub fn rotation_at(&self, elapsed_ms: f64) -> (f64, bool) {
        let t = (elapsed_ms / self.duration_ms).clamp(0.0, 1.0);
        let rotation = self.start_rotation + self.delta() * ease_out_cubic(t);
        (rotation, t >= 1.0)
    }
}

/// Why a spin request did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinRejected {
    AlreadySpinning,
    Locked,
}

/// Result of a finished spin.
#[derive(Debug, Clone, PartialEq)]
pub struct SpinOutcome {
    pub index: usize,
    pub label: String,
    /// Snapped rotation the wheel rests at, within `[0, 2π)`.
    pub rotation: f64,
    /// The landing re-opened the gate.
    pub spin_again: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpinStep {
    /// No spin in flight.
    Idle,
    Continue,
    Done(SpinOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    Spinning(SpinPlan),
}

pub struct SpinEngine<S, R> {
    wheel: Wheel,
    tuning: SpinTuning,
    rotation: f64,
    phase: Phase,
    gate: LockGate<S>,
    rng: R,
    last_outcome: Option<SpinOutcome>,
}

impl<S: KeyValueStore, R: SpinRandom> SpinEngine<S, R> {
    /// Runs first-run gate setup and starts idle at rotation zero.
    pub fn new(wheel: Wheel, tuning: SpinTuning, mut gate: LockGate<S>, rng: R) -> Result<Self> {
        tuning.validate()?;
        gate.init();
        Ok(Self {
            wheel,
            tuning,
            rotation: 0.0,
            phase: Phase::Idle,
            gate,
            rng,
            last_outcome: None,
        })
    }

    pub fn wheel(&self) -> &Wheel {
        &self.wheel
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn is_spinning(&self) -> bool {
        matches!(self.phase, Phase::Spinning(_))
    }

    pub fn is_locked(&self) -> bool {
        self.gate.is_locked()
    }

    /// A spin request would be accepted right now.
    pub fn can_spin(&self) -> bool {
        !self.is_spinning() && !self.is_locked()
    }

    pub fn plan(&self) -> Option<&SpinPlan> {
        match &self.phase {
            Phase::Spinning(plan) => Some(plan),
            Phase::Idle => None,
        }
    }

    pub fn last_outcome(&self) -> Option<&SpinOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn gate(&self) -> &LockGate<S> {
        &self.gate
    }

    /// Clear the persisted lock from outside a spin.
    pub fn unlock(&mut self) {
        self.gate.reset();
    }

    pub fn start_spin(&mut self) -> std::result::Result<SpinPlan, SpinRejected> {
        if self.is_spinning() {
            return Err(SpinRejected::AlreadySpinning);
        }
        if self.gate.is_locked() {
            debug!("spin rejected, gate locked");
            return Err(SpinRejected::Locked);
        }

        let target_index = self.rng.target_index(self.wheel.len());
        let turns = self.rng.turns(self.tuning.turns.clone());
        let duration_ms = self.rng.duration_ms(self.tuning.duration_ms.clone());

        let base_target = self.wheel.rotation_to_center(target_index);
        let plan = SpinPlan {
            target_index,
            turns,
            duration_ms,
            start_rotation: self.rotation,
            final_rotation: base_target + f64::from(turns) * TAU,
        };
        info!(
            slice = target_index,
            turns,
            duration_ms = duration_ms.round(),
            "spin started"
        );
        self.phase = Phase::Spinning(plan);
        Ok(plan)
    }

    /// Move the animation to `elapsed_ms` after its start.
    pub fn advance(&mut self, elapsed_ms: f64) -> SpinStep {
        let Phase::Spinning(plan) = self.phase else {
            return SpinStep::Idle;
        };
        let (rotation, done) = plan.rotation_at(elapsed_ms);
        self.rotation = rotation;
        if done {
            SpinStep::Done(self.finish_spin())
        } else {
            SpinStep::Continue
        }
    }

    /// Drop an in-flight spin. The wheel stays at the angle the last frame
    /// drew, with whole turns folded out, and nothing is persisted.
    pub fn cancel(&mut self) {
        if let Phase::Spinning(plan) = self.phase {
            self.rotation = normalize_angle(self.rotation);
            debug!(slice = plan.target_index, rotation = self.rotation, "spin cancelled");
            self.phase = Phase::Idle;
        }
    }

    fn finish_spin(&mut self) -> SpinOutcome {
        let index = self.wheel.index_at_pointer(self.rotation);
        let full_turns = (self.rotation / TAU).round();
        let snapped = self.wheel.rotation_to_center(index) + full_turns * TAU;
        // Rest at the snapped angle with the travelled turns folded out. The
        // render is identical and the next spin starts inside [0, 2π), so its
        // delta stays forward.
        self.rotation = normalize_angle(self.wheel.rotation_to_center(index));
        debug!(snapped, rest = self.rotation, "spin snapped");
        self.phase = Phase::Idle;

        let slice = &self.wheel.slices()[index];
        let spin_again = slice.is_spin_again();
        self.gate.set_locked(!spin_again);

        let outcome = SpinOutcome {
            index,
            label: slice.label.clone(),
            rotation: self.rotation,
            spin_again,
        };
        info!(index, label = %outcome.label, spin_again, "spin finished");
        self.last_outcome = Some(outcome.clone());
        outcome
    }
}
