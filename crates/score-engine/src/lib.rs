//! Pure scoring for the House leaderboard. No I/O, no clocks: identical
//! inputs always produce identical outputs.

use common::HouseId;
use serde::{Deserialize, Serialize};

/// A 30-day streak scores 100; longer streaks stay capped there.
pub const MAX_STREAK_DAYS: u64 = 30;

/// Primary 40/30/30 weighting plus the 40/60 fallback pair applied when
/// a wallet's OnChat share is unavailable. Each set sums to 1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub streak: f64,
    pub stake: f64,
    pub onchat: f64,
    pub streak_fallback: f64,
    pub stake_fallback: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            streak: 0.40,
            stake: 0.30,
            onchat: 0.30,
            streak_fallback: 0.40,
            stake_fallback: 0.60,
        }
    }
}

/// One wallet's raw metric readings. `onchat_pct: None` means the metric
/// was unavailable for this wallet and selects the fallback weighting;
/// it is a first-class value, not an error.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WalletMetrics {
    pub streak_days: u64,
    pub stake_pct: f64,
    pub onchat_pct: Option<f64>,
}

/// Normalized per-metric components alongside the composite score, for
/// score-breakdown display.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WalletBreakdown {
    pub streak_pct: f64,
    pub stake_pct: f64,
    pub onchat_pct: Option<f64>,
    pub score: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HouseStanding {
    pub house: HouseId,
    pub score: f64,
    pub member_count: usize,
    pub total_staked: u128,
}

/// Linear 0-100 scale, clamped at 100. Non-positive or non-finite
/// values, and non-positive maxima, score 0.
pub fn normalize(value: f64, max: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 || !max.is_finite() || max <= 0.0 {
        return 0.0;
    }
    (value / max * 100.0).min(100.0)
}

pub fn wallet_score(metrics: &WalletMetrics, weights: &ScoringWeights) -> f64 {
    wallet_breakdown(metrics, weights).score
}

pub fn wallet_breakdown(metrics: &WalletMetrics, weights: &ScoringWeights) -> WalletBreakdown {
    let streak_pct = normalize(metrics.streak_days as f64, MAX_STREAK_DAYS as f64);
    let stake_pct = metrics.stake_pct.clamp(0.0, 100.0);

    let (onchat_pct, score) = match metrics.onchat_pct {
        None => (
            None,
            streak_pct * weights.streak_fallback + stake_pct * weights.stake_fallback,
        ),
        Some(onchat) => {
            let onchat_pct = onchat.clamp(0.0, 100.0);
            (
                Some(onchat_pct),
                streak_pct * weights.streak + stake_pct * weights.stake
                    + onchat_pct * weights.onchat,
            )
        }
    };

    WalletBreakdown {
        streak_pct,
        stake_pct,
        onchat_pct,
        score,
    }
}

pub fn house_score(wallet_scores: &[f64]) -> f64 {
    wallet_scores.iter().sum()
}

/// Returns a new ranking, descending by score with ties broken
/// descending by `total_staked`. The input is never mutated.
pub fn rank_houses(standings: &[HouseStanding]) -> Vec<HouseStanding> {
    let mut ranked = standings.to_vec();
    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.total_staked.cmp(&a.total_staked))
    });
    ranked
}
