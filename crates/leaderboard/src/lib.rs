//! Drives the full leaderboard pipeline: holder enumeration per House,
//! tolerant per-wallet metric fan-out, scoring, and ranking.
//!
//! Every network branch degrades independently to a documented default;
//! nothing below the pure scoring layer may abort a run.

use anyhow::Result;
use common::{Address, BoardConfig, Clock, HouseConfig, HouseId, SystemClock, format_address};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use score_engine::{
    HouseStanding, ScoringWeights, WalletBreakdown, WalletMetrics, house_score, normalize,
    rank_houses, wallet_breakdown,
};

mod sources;

pub use holder_set::HolderSource;
pub use sources::{MessageSource, PoolState, StakePosition, StakingSource, StreakSource};

/// One ranked row of a leaderboard snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub house: HouseId,
    pub display_name: String,
    pub member_count: usize,
    pub score: f64,
    pub total_staked: u128,
    pub last_updated_unix_ms: i64,
}

struct WalletOutcome {
    breakdown: WalletBreakdown,
    staked: u128,
}

pub struct LeaderboardOrchestrator<H, K, S, M, C = SystemClock> {
    config: BoardConfig,
    holders: H,
    streaks: K,
    staking: S,
    messages: M,
    weights: ScoringWeights,
    clock: C,
}

impl<H, K, S, M> LeaderboardOrchestrator<H, K, S, M, SystemClock>
where
    H: HolderSource,
    K: StreakSource,
    S: StakingSource,
    M: MessageSource,
{
    pub fn new(config: BoardConfig, holders: H, streaks: K, staking: S, messages: M) -> Self {
        Self {
            config,
            holders,
            streaks,
            staking,
            messages,
            weights: ScoringWeights::default(),
            clock: SystemClock,
        }
    }
}

impl<H, K, S, M, C> LeaderboardOrchestrator<H, K, S, M, C>
where
    H: HolderSource,
    K: StreakSource,
    S: StakingSource,
    M: MessageSource,
    C: Clock,
{
    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_clock<C2: Clock>(self, clock: C2) -> LeaderboardOrchestrator<H, K, S, M, C2> {
        LeaderboardOrchestrator {
            config: self.config,
            holders: self.holders,
            streaks: self.streaks,
            staking: self.staking,
            messages: self.messages,
            weights: self.weights,
            clock,
        }
    }

    /// Computes one complete ranked board. Always recomputes: caching is
    /// layered strictly above this call.
    ///
    /// The result carries one entry per configured House, descending by
    /// score (ties broken by total staked), all stamped with a single
    /// shared timestamp.
    pub async fn compute_leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        let computed_at = self.clock.now_unix_ms();
        let (total_staked, total_messages) = self.shared_denominators().await;

        let standings = join_all(
            self.config
                .houses
                .iter()
                .map(|house| self.score_house(house, total_staked, total_messages)),
        )
        .await;

        let ranked = rank_houses(&standings);
        Ok(ranked
            .into_iter()
            .map(|standing| self.entry_from_standing(standing, computed_at))
            .collect())
    }

    /// Normalized component view for a single wallet, for score
    /// breakdown display. Shares the degradation rules of a full run.
    pub async fn wallet_breakdown(&self, wallet: Address) -> WalletBreakdown {
        let (total_staked, total_messages) = self.shared_denominators().await;
        self.score_wallet(wallet, total_staked, total_messages)
            .await
            .breakdown
    }

    /// The two shared denominators, fetched once per run. Either may be
    /// unavailable without aborting: a missing pool total degrades every
    /// stake share to zero, a missing message total sends every wallet
    /// down the fallback weighting.
    async fn shared_denominators(&self) -> (u128, Option<u64>) {
        let pool_total = async {
            let Some(pool) = self.config.staking_pool else {
                return 0;
            };
            match self.staking.pool_state(pool).await {
                Ok(Some(state)) => state.total_staked,
                Ok(None) => 0,
                Err(err) => {
                    tracing::warn!(error = %err, "pool state unavailable; stake shares score zero");
                    0
                }
            }
        };
        let message_total = async {
            match self.messages.total_messages().await {
                Ok(total) => total,
                Err(err) => {
                    tracing::warn!(error = %err, "message total unavailable; using fallback weighting");
                    None
                }
            }
        };
        tokio::join!(pool_total, message_total)
    }

    async fn score_house(
        &self,
        house: &HouseConfig,
        total_staked: u128,
        total_messages: Option<u64>,
    ) -> HouseStanding {
        let holders = match self.holders.holders(house.asset_address).await {
            Ok(holders) => holders,
            Err(err) => {
                tracing::warn!(house = %house.id, error = %err, "holder enumeration failed; house scores zero");
                return HouseStanding {
                    house: house.id.clone(),
                    score: 0.0,
                    member_count: 0,
                    total_staked: 0,
                };
            }
        };

        let outcomes = join_all(
            holders
                .iter()
                .map(|wallet| self.score_wallet(*wallet, total_staked, total_messages)),
        )
        .await;

        let scores: Vec<f64> = outcomes
            .iter()
            .map(|outcome| outcome.breakdown.score)
            .collect();
        let house_staked = outcomes
            .iter()
            .fold(0_u128, |sum, outcome| sum.saturating_add(outcome.staked));

        HouseStanding {
            house: house.id.clone(),
            score: house_score(&scores),
            member_count: holders.len(),
            total_staked: house_staked,
        }
    }

    /// Fans out the three metric queries for one wallet and captures each
    /// outcome independently: a failed streak or position read scores 0,
    /// a failed message count leaves OnChat unavailable for this wallet
    /// only. Sibling queries and sibling wallets are never affected.
    async fn score_wallet(
        &self,
        wallet: Address,
        total_staked: u128,
        total_messages: Option<u64>,
    ) -> WalletOutcome {
        let (streak, position, messages) = tokio::join!(
            self.streaks.current_streak(wallet),
            self.user_position(wallet),
            self.messages
                .message_count(wallet, self.config.season_start_block),
        );

        let streak_days = match streak {
            Ok(Some(days)) => days,
            Ok(None) => 0,
            Err(err) => {
                tracing::warn!(wallet = %format_address(&wallet), error = %err, "streak read failed; scoring zero");
                0
            }
        };

        let staked = match position {
            Ok(Some(position)) => position.staked,
            Ok(None) => 0,
            Err(err) => {
                tracing::warn!(wallet = %format_address(&wallet), error = %err, "stake position read failed; scoring zero");
                0
            }
        };
        let stake_pct = normalize(staked as f64, total_staked as f64);

        let onchat_pct = match (messages, total_messages) {
            (Ok(Some(count)), Some(total)) => Some(normalize(count as f64, total as f64)),
            (Err(err), _) => {
                tracing::warn!(wallet = %format_address(&wallet), error = %err, "message count read failed; using fallback weighting");
                None
            }
            _ => None,
        };

        let breakdown = wallet_breakdown(
            &WalletMetrics {
                streak_days,
                stake_pct,
                onchat_pct,
            },
            &self.weights,
        );
        WalletOutcome { breakdown, staked }
    }

    /// Position reads short-circuit to absent when no pool is configured.
    async fn user_position(&self, wallet: Address) -> Result<Option<StakePosition>> {
        match self.config.staking_pool {
            None => Ok(None),
            Some(pool) => self.staking.user_position(pool, wallet).await,
        }
    }

    fn entry_from_standing(&self, standing: HouseStanding, computed_at: i64) -> LeaderboardEntry {
        let display_name = self
            .config
            .houses
            .iter()
            .find(|house| house.id == standing.house)
            .map(|house| house.display_name.clone())
            .unwrap_or_default();
        LeaderboardEntry {
            house: standing.house,
            display_name,
            member_count: standing.member_count,
            score: standing.score,
            total_staked: standing.total_staked,
            last_updated_unix_ms: computed_at,
        }
    }
}
