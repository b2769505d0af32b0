//! Wheel geometry: slice bookkeeping and the index ⇄ rotation mapping.
//!
//! Angles follow the screen convention used by the renderer: zero points
//! right, y grows downward, so a growing angle turns clockwise on screen.
//! Slice `i` covers `[i·θ, (i+1)·θ)` of the unrotated wheel, `θ = 2π / N`.

use std::f64::consts::{FRAC_PI_2, TAU};

use crate::error::{Result, WheelError};

/// The fixed pointer sits at the top of the wheel.
pub const POINTER_ANGLE: f64 = -FRAC_PI_2;

/// Label whose landing re-opens the gate instead of closing it.
pub const SPIN_AGAIN_LABEL: &str = "Spin again";

/// Map any real angle into `[0, 2π)`.
///
/// Rounding can push a tiny negative input up to exactly `2π`; callers that
/// bucket the result must clamp.
pub fn normalize_angle(angle: f64) -> f64 {
    ((angle % TAU) + TAU) % TAU
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    pub label: String,
    pub color_index: usize,
}

impl Slice {
    pub fn new(label: impl Into<String>, color_index: usize) -> Self {
        Self {
            label: label.into(),
            color_index,
        }
    }

    pub fn is_spin_again(&self) -> bool {
        self.label == SPIN_AGAIN_LABEL
    }
}

/// Ordered, immutable list of slices.
#[derive(Debug, Clone)]
pub struct Wheel {
    slices: Vec<Slice>,
}

impl Wheel {
    pub fn new(slices: Vec<Slice>) -> Result<Self> {
        if slices.is_empty() {
            return Err(WheelError::Configuration(
                "a wheel needs at least one slice".to_string(),
            ));
        }
        Ok(Self { slices })
    }

    /// Build a wheel whose slice colours follow label order.
    pub fn from_labels<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let slices = labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| Slice::new(label, i))
            .collect();
        Self::new(slices)
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Slice> {
        self.slices.iter()
    }

    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    pub fn slice(&self, index: usize) -> Option<&Slice> {
        self.slices.get(index)
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.slices.get(index).map(|s| s.label.as_str())
    }

    pub fn slice_angle(&self) -> f64 {
        TAU / self.slices.len() as f64
    }

    /// Index of the slice under the fixed pointer at `rotation`.
    pub fn index_at_pointer(&self, rotation: f64) -> usize {
        let a = normalize_angle(POINTER_ANGLE - rotation);
        let raw = (a / self.slice_angle()).floor();
        // `a` may round up to exactly 2π, which would index one past the end.
        (raw.max(0.0) as usize).min(self.slices.len() - 1)
    }

    /// Rotation that puts the center of slice `index` under the pointer.
    pub fn rotation_to_center(&self, index: usize) -> f64 {
        POINTER_ANGLE - (index as f64 + 0.5) * self.slice_angle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_wheel() -> Wheel {
        Wheel::from_labels([
            "10% OFF",
            "Free keychain",
            "Free bracelet",
            "5% OFF",
            "Spin again",
            "15% OFF",
        ])
        .unwrap()
    }

    #[test]
    fn empty_wheel_is_a_configuration_error() {
        let err = Wheel::new(Vec::new()).unwrap_err();
        assert!(matches!(err, WheelError::Configuration(_)));
    }

    #[test]
    fn slice_angle_divides_full_turn() {
        let wheel = demo_wheel();
        assert!((wheel.slice_angle() * 6.0 - TAU).abs() < 1e-12);
        assert_eq!(Wheel::from_labels(["only"]).unwrap().slice_angle(), TAU);
    }

    #[test]
    fn normalize_lands_in_half_open_turn() {
        for x in [-100.0, -TAU, -0.5, 0.0, 0.5, TAU, 3.0 * TAU + 1.0, 1e6] {
            let a = normalize_angle(x);
            assert!((0.0..=TAU).contains(&a), "{x} -> {a}");
        }
        assert!((normalize_angle(-FRAC_PI_2) - 1.5 * std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn rotation_to_center_is_exact_inverse() {
        for n in 1..=24 {
            let labels: Vec<String> = (0..n).map(|i| format!("slice {i}")).collect();
            let wheel = Wheel::from_labels(labels).unwrap();
            for i in 0..n {
                assert_eq!(wheel.index_at_pointer(wheel.rotation_to_center(i)), i);
            }
        }
    }

    #[test]
    fn index_is_invariant_under_full_turns() {
        let wheel = demo_wheel();
        for i in 0..wheel.len() {
            let center = wheel.rotation_to_center(i);
            for offset in [-0.3, 0.0, 0.3] {
                let rotation = center + offset * wheel.slice_angle();
                for k in [-1000i64, -7, -1, 1, 5, 8, 12345] {
                    let turned = rotation + k as f64 * TAU;
                    assert_eq!(wheel.index_at_pointer(turned), i, "k = {k}");
                }
            }
        }
    }

    #[test]
    fn zero_rotation_puts_last_slice_under_pointer() {
        // Pointer at -π/2 normalizes to 3π/2, inside slice 4 of 6.
        let wheel = demo_wheel();
        assert_eq!(wheel.index_at_pointer(0.0), 4);
        assert_eq!(wheel.label(4), Some("Spin again"));
    }

    #[test]
    fn boundary_angles_stay_in_range() {
        let wheel = demo_wheel();
        let theta = wheel.slice_angle();
        for k in 0..=6 {
            let rotation = POINTER_ANGLE - k as f64 * theta;
            assert!(wheel.index_at_pointer(rotation) < wheel.len());
        }
        assert!(wheel.index_at_pointer(POINTER_ANGLE + 1e-18) < wheel.len());
    }

    #[test]
    fn spin_again_slice_is_detected_by_label() {
        let wheel = demo_wheel();
        let flagged: Vec<usize> = wheel
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_spin_again())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(flagged, vec![4]);
    }
}
