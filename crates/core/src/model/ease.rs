use serde::{Deserialize, Serialize};
use std::fmt;

//
// ─── EASE FACTOR ───────────────────────────────────────────────────────────────
//

/// Retention multiplier stored as fixed-point hundredths.
///
/// Persisted as an integer (2.50 is stored as 250) so repeated updates never
/// accumulate floating-point drift. Every constructor and adjustment clamps
/// to the 1.30 floor, so a value below the minimum is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EaseFactor(u32);

impl EaseFactor {
    /// Lowest permitted ease, 1.30.
    pub const MINIMUM: EaseFactor = EaseFactor(130);

    /// Ease assigned to a record on its first grading, 2.50.
    pub const DEFAULT: EaseFactor = EaseFactor(250);

    /// Build from a scaled (x100) integer, clamping to the floor.
    #[must_use]
    pub fn from_scaled(scaled: u32) -> Self {
        Self(scaled.max(Self::MINIMUM.0))
    }

    /// The scaled (x100) integer representation, as persisted.
    #[must_use]
    pub fn scaled(self) -> u32 {
        self.0
    }

    /// Floating-point view for display only; never fed back into updates.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 100.0
    }

    /// SM-2 ease adjustment for a recall quality in `0..=5`.
    ///
    /// `ef' = ef + (0.1 - (5-q) * (0.08 + (5-q) * 0.02))`, which in
    /// hundredths is the exact integer `10 - (5-q) * (8 + 2 * (5-q))`.
    /// Quality 5 earns +0.10, quality 4 holds steady, everything lower
    /// drops increasingly steeply down to -0.80 at quality 0.
    #[must_use]
    pub fn adjusted(self, quality: u8) -> Self {
        let miss = i64::from(5u8.saturating_sub(quality));
        let delta = 10 - miss * (8 + 2 * miss);

        let next = i64::from(self.0) + delta;
        let floored = next.max(i64::from(Self::MINIMUM.0));

        // floored is within [130, u32::MAX + 10] and delta is at most +10,
        // so the conversion cannot fail for any reachable value.
        Self(u32::try_from(floored).unwrap_or(u32::MAX))
    }

    /// Next interval after a successful mature review: `round(interval * ef)`
    /// with round-half-up, computed entirely in integer hundredths.
    #[must_use]
    pub fn grow_interval(self, interval_days: u32) -> u32 {
        let product = u64::from(interval_days) * u64::from(self.0);
        let rounded = (product + 50) / 100;
        u32::try_from(rounded).unwrap_or(u32::MAX)
    }
}

impl Default for EaseFactor {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for EaseFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_scaled_clamps_to_floor() {
        assert_eq!(EaseFactor::from_scaled(100), EaseFactor::MINIMUM);
        assert_eq!(EaseFactor::from_scaled(0), EaseFactor::MINIMUM);
        assert_eq!(EaseFactor::from_scaled(250).scaled(), 250);
    }

    #[test]
    fn adjustment_deltas_match_sm2_table() {
        let ef = EaseFactor::DEFAULT;
        // quality 5: +0.10, quality 4: 0, quality 3: -0.14,
        // quality 2: -0.32, quality 1: -0.54, quality 0: -0.80
        assert_eq!(ef.adjusted(5).scaled(), 260);
        assert_eq!(ef.adjusted(4).scaled(), 250);
        assert_eq!(ef.adjusted(3).scaled(), 236);
        assert_eq!(ef.adjusted(2).scaled(), 218);
        assert_eq!(ef.adjusted(1).scaled(), 196);
        assert_eq!(ef.adjusted(0).scaled(), 170);
    }

    #[test]
    fn adjustment_never_drops_below_floor() {
        let mut ef = EaseFactor::MINIMUM;
        for _ in 0..20 {
            ef = ef.adjusted(0);
        }
        assert_eq!(ef, EaseFactor::MINIMUM);
    }

    #[test]
    fn interval_growth_rounds_half_up() {
        // 6 * 2.50 = 15.00 exactly
        assert_eq!(EaseFactor::from_scaled(250).grow_interval(6), 15);
        // 3 * 1.35 = 4.05 -> 4
        assert_eq!(EaseFactor::from_scaled(135).grow_interval(3), 4);
        // 2 * 1.75 = 3.50 -> rounds up to 4
        assert_eq!(EaseFactor::from_scaled(175).grow_interval(2), 4);
        // 1 * 1.49 = 1.49 -> 1
        assert_eq!(EaseFactor::from_scaled(149).grow_interval(1), 1);
    }

    #[test]
    fn display_formats_as_decimal() {
        assert_eq!(EaseFactor::DEFAULT.to_string(), "2.50");
        assert_eq!(EaseFactor::from_scaled(136).to_string(), "1.36");
    }
}
