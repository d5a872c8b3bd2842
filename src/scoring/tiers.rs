//! Threshold tables that map metrics to points and points to tiers.
//!
//! Every lookup takes the best row whose condition holds, so the order
//! of rows in a table does not matter and raising an input never lowers
//! the result.

use serde::{Deserialize, Serialize};

/// Awards `points` when a value is at least `min`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AtLeast<N> {
    pub min: N,
    pub points: u32,
}

impl<N> AtLeast<N> {
    pub const fn new(min: N, points: u32) -> Self {
        Self { min, points }
    }
}

/// Awards `points` when a value is strictly below `below`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Below {
    pub below: f64,
    pub points: u32,
}

impl Below {
    pub const fn new(below: f64, points: u32) -> Self {
        Self { below, points }
    }
}

/// Assigns `tier` to point totals of at least `min`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierCutoff<T> {
    pub min: u32,
    pub tier: T,
}

impl<T> TierCutoff<T> {
    pub const fn new(min: u32, tier: T) -> Self {
        Self { min, tier }
    }
}

pub fn points_at_least<N: PartialOrd + Copy>(table: &[AtLeast<N>], value: N) -> u32 {
    table
        .iter()
        .filter(|row| value >= row.min)
        .map(|row| row.points)
        .max()
        .unwrap_or(0)
}

pub fn points_below(table: &[Below], value: f64) -> u32 {
    table
        .iter()
        .filter(|row| value < row.below)
        .map(|row| row.points)
        .max()
        .unwrap_or(0)
}

/// Highest tier whose cutoff the score reaches, or `floor` if none does.
pub fn tier_for<T: Ord + Copy>(cutoffs: &[TierCutoff<T>], score: u32, floor: T) -> T {
    cutoffs
        .iter()
        .filter(|cutoff| score >= cutoff.min)
        .map(|cutoff| cutoff.tier)
        .max()
        .map_or(floor, |tier| tier.max(floor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MoneyTier;

    #[test]
    fn test_points_at_least_picks_best_row() {
        let table = [AtLeast::new(15u64, 1), AtLeast::new(80, 3), AtLeast::new(40, 2)];
        assert_eq!(points_at_least(&table, 10), 0);
        assert_eq!(points_at_least(&table, 15), 1);
        assert_eq!(points_at_least(&table, 79), 2);
        assert_eq!(points_at_least(&table, 80), 3);
    }

    #[test]
    fn test_points_below_is_strict() {
        let table = [Below::new(0.20, 3), Below::new(0.40, 2)];
        assert_eq!(points_below(&table, 0.19), 3);
        assert_eq!(points_below(&table, 0.20), 2);
        assert_eq!(points_below(&table, 0.40), 0);
    }

    #[test]
    fn test_tier_for_falls_back_to_floor() {
        let cutoffs = [
            TierCutoff::new(2, MoneyTier::Two),
            TierCutoff::new(6, MoneyTier::Four),
            TierCutoff::new(4, MoneyTier::Three),
        ];
        assert_eq!(tier_for(&cutoffs, 0, MoneyTier::One), MoneyTier::One);
        assert_eq!(tier_for(&cutoffs, 5, MoneyTier::One), MoneyTier::Three);
        assert_eq!(tier_for(&cutoffs, 9, MoneyTier::One), MoneyTier::Four);
    }
}
