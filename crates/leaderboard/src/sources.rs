use anyhow::Result;
use async_trait::async_trait;
use common::Address;
use serde::{Deserialize, Serialize};

/// A wallet's position in the global staking pool.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct StakePosition {
    pub staked: u128,
    pub pending_rewards: u128,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PoolState {
    pub total_staked: u128,
}

/// Consecutive-activity counter from the attestation resolver.
/// `Ok(None)` means the source answered but has no value for the wallet.
#[async_trait]
pub trait StreakSource: Send + Sync {
    async fn current_streak(&self, wallet: Address) -> Result<Option<u64>>;
}

#[async_trait]
pub trait StakingSource: Send + Sync {
    async fn pool_state(&self, pool: Address) -> Result<Option<PoolState>>;

    async fn user_position(&self, pool: Address, wallet: Address)
    -> Result<Option<StakePosition>>;
}

/// Message counts for the season channel, windowed from the season
/// start block.
#[async_trait]
pub trait MessageSource: Send + Sync {
    async fn total_messages(&self) -> Result<Option<u64>>;

    async fn message_count(&self, wallet: Address, from_block: u64) -> Result<Option<u64>>;
}
