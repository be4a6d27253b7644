//! Vehicle density buckets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse traffic level derived from the total vehicle count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DensityLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl DensityLevel {
    /// Buckets a total count: `< 5` low, `5..=10` medium, `11..=15` high,
    /// anything above very high.
    pub fn from_total(total: u32) -> Self {
        match total {
            0..=4 => DensityLevel::Low,
            5..=10 => DensityLevel::Medium,
            11..=15 => DensityLevel::High,
            _ => DensityLevel::VeryHigh,
        }
    }

    /// Sums per-class counts and buckets the result.
    pub fn from_counts(counts: &[u32]) -> (u32, Self) {
        let total = counts.iter().fold(0u32, |acc, c| acc.saturating_add(*c));
        (total, Self::from_total(total))
    }

    pub fn label(&self) -> &'static str {
        match self {
            DensityLevel::Low => "low",
            DensityLevel::Medium => "medium",
            DensityLevel::High => "high",
            DensityLevel::VeryHigh => "very high",
        }
    }
}

impl fmt::Display for DensityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn boundaries_are_inclusive() {
        let cases = [
            (4, "low"),
            (5, "medium"),
            (10, "medium"),
            (11, "high"),
            (15, "high"),
            (16, "very high"),
        ];
        for (total, expected) in cases {
            assert_eq!(DensityLevel::from_total(total).label(), expected, "total {}", total);
        }
    }

    #[test]
    fn zero_is_low() {
        assert_eq!(DensityLevel::from_total(0), DensityLevel::Low);
    }

    #[test]
    fn from_counts_sums_every_class() {
        let (total, level) = DensityLevel::from_counts(&[2, 3, 0, 1, 0, 0]);
        assert_eq!(total, 6);
        assert_eq!(level, DensityLevel::Medium);
    }

    #[test]
    fn from_counts_of_empty_slice_is_low() {
        assert_eq!(DensityLevel::from_counts(&[]), (0, DensityLevel::Low));
    }

    proptest! {
        #[test]
        fn bucketing_is_monotonic(a in 0u32..1000, b in 0u32..1000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(DensityLevel::from_total(lo) as u8 <= DensityLevel::from_total(hi) as u8);
        }
    }
}
