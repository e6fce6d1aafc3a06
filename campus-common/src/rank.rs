//! XP and rank gamification rules
//!
//! Users accumulate XP from quiz submissions, reviews, and live-class
//! attendance. Rank is a pure function of XP so it can never drift from the
//! stored score.

use serde::{Deserialize, Serialize};

/// Rank tiers in ascending order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl Rank {
    /// XP thresholds for each tier (inclusive lower bounds)
    const THRESHOLDS: [(Rank, i64); 5] = [
        (Rank::Diamond, 5000),
        (Rank::Platinum, 2500),
        (Rank::Gold, 1000),
        (Rank::Silver, 250),
        (Rank::Bronze, 0),
    ];

    /// Derive the rank for an XP total
    pub fn from_xp(xp: i64) -> Self {
        Self::THRESHOLDS
            .iter()
            .find(|(_, min)| xp >= *min)
            .map(|(rank, _)| *rank)
            .unwrap_or(Rank::Bronze)
    }

    /// XP still needed to reach the next tier, None at the top
    pub fn xp_to_next(xp: i64) -> Option<i64> {
        Self::THRESHOLDS
            .iter()
            .rev()
            .find(|(_, min)| *min > xp)
            .map(|(_, min)| min - xp)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Rank::Bronze => "Bronze",
            Rank::Silver => "Silver",
            Rank::Gold => "Gold",
            Rank::Platinum => "Platinum",
            Rank::Diamond => "Diamond",
        }
    }
}

/// XP awarded for a quiz submission
///
/// Scales with the graded percentage: `round(percentage * factor)`.
pub fn quiz_xp(percentage: f64, factor: f64) -> i64 {
    (percentage * factor).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_boundaries() {
        assert_eq!(Rank::from_xp(0), Rank::Bronze);
        assert_eq!(Rank::from_xp(249), Rank::Bronze);
        assert_eq!(Rank::from_xp(250), Rank::Silver);
        assert_eq!(Rank::from_xp(999), Rank::Silver);
        assert_eq!(Rank::from_xp(1000), Rank::Gold);
        assert_eq!(Rank::from_xp(2500), Rank::Platinum);
        assert_eq!(Rank::from_xp(5000), Rank::Diamond);
        assert_eq!(Rank::from_xp(1_000_000), Rank::Diamond);
    }

    #[test]
    fn test_xp_to_next() {
        assert_eq!(Rank::xp_to_next(0), Some(250));
        assert_eq!(Rank::xp_to_next(900), Some(100));
        assert_eq!(Rank::xp_to_next(4999), Some(1));
        assert_eq!(Rank::xp_to_next(5000), None);
    }

    #[test]
    fn test_quiz_xp_scaling() {
        assert_eq!(quiz_xp(100.0, 0.5), 50);
        assert_eq!(quiz_xp(66.67, 0.5), 33);
        assert_eq!(quiz_xp(0.0, 0.5), 0);
    }
}
