//! Reconstructs the current holder set of a House membership token.
//!
//! The membership assets are ERC-1155 tokens with no enumeration
//! surface, so the holder list is rebuilt by replaying `TransferSingle`
//! mint events (`from == 0x0`) and confirming each distinct recipient
//! still holds a positive balance.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chain_rpc::{EthRpc, FastSet, LogFilter, ToBlock, fetch_logs_paginated};
use common::{Address, ZERO_ADDRESS, address_topic, decode_u256_saturating, topic_address};
use futures::future::join_all;

/// keccak256("TransferSingle(address,address,address,uint256,uint256)")
pub const TRANSFER_SINGLE_TOPIC: [u8; 32] = [
    0xc3, 0xd5, 0x81, 0x68, 0xc5, 0xae, 0x73, 0x97, 0x73, 0x1d, 0x06, 0x3d, 0x5b, 0xbf, 0x3d,
    0x65, 0x78, 0x54, 0x42, 0x73, 0x43, 0xf4, 0xc0, 0x83, 0x24, 0x0f, 0x7a, 0xac, 0xaa, 0x2d,
    0x0f, 0x62,
];

/// Selector of balanceOf(address,uint256).
pub const BALANCE_OF_SELECTOR: [u8; 4] = [0x00, 0xfd, 0xd5, 0x8e];

/// The membership tokens always use id 0.
pub const MEMBERSHIP_TOKEN_ID: u128 = 0;

// TransferSingle(operator indexed, from indexed, to indexed, id, value)
const FROM_TOPIC_POSITION: usize = 2;
const TO_TOPIC_POSITION: usize = 3;

/// Abstraction the orchestrator scores against; [`HolderEnumerator`] is
/// the live chain-backed implementation.
#[async_trait]
pub trait HolderSource: Send + Sync {
    async fn holders(&self, asset_address: Option<Address>) -> Result<Vec<Address>>;
}

pub struct HolderEnumerator<R> {
    rpc: R,
}

impl<R: EthRpc> HolderEnumerator<R> {
    pub fn new(rpc: R) -> Self {
        Self { rpc }
    }

    /// Enumerates wallets currently holding at least one unit of the
    /// asset, in first-mint order. `None` returns empty without issuing
    /// any query. A wallet whose balance read fails is excluded exactly
    /// like a wallet that sold; one bad read must not block the board.
    pub async fn enumerate(&self, asset_address: Option<Address>) -> Result<Vec<Address>> {
        let Some(asset) = asset_address else {
            return Ok(Vec::new());
        };

        let filter = LogFilter::event(asset, TRANSFER_SINGLE_TOPIC)
            .indexed(FROM_TOPIC_POSITION, address_topic(ZERO_ADDRESS));
        let logs = fetch_logs_paginated(&self.rpc, &filter, 0, ToBlock::Latest)
            .await
            .with_context(|| format!("fetch mint events for {}", common::format_address(&asset)))?;

        let mut seen = FastSet::default();
        let mut candidates = Vec::new();
        for log in &logs {
            let Some(topic) = log.indexed(TO_TOPIC_POSITION) else {
                continue;
            };
            let recipient = topic_address(topic);
            if recipient != ZERO_ADDRESS && seen.insert(recipient) {
                candidates.push(recipient);
            }
        }
        if candidates.is_empty() {
            return Ok(candidates);
        }

        let balances = join_all(
            candidates
                .iter()
                .map(|holder| self.balance_of(asset, *holder)),
        )
        .await;

        Ok(candidates
            .into_iter()
            .zip(balances)
            .filter_map(|(holder, balance)| match balance {
                Ok(balance) if balance > 0 => Some(holder),
                Ok(_) => None,
                Err(err) => {
                    tracing::debug!(
                        holder = %common::format_address(&holder),
                        error = %err,
                        "balance read failed; excluding candidate",
                    );
                    None
                }
            })
            .collect())
    }

    async fn balance_of(&self, asset: Address, holder: Address) -> Result<u128> {
        let mut data = Vec::with_capacity(4 + 64);
        data.extend_from_slice(&BALANCE_OF_SELECTOR);
        data.extend_from_slice(&address_topic(holder));
        data.extend_from_slice(&MEMBERSHIP_TOKEN_ID.to_be_bytes_padded());
        let word = self.rpc.call(asset, data).await?;
        decode_u256_saturating(&word)
            .with_context(|| format!("balanceOf returned {} bytes", word.len()))
    }
}

trait U256Encode {
    fn to_be_bytes_padded(&self) -> [u8; 32];
}

impl U256Encode for u128 {
    fn to_be_bytes_padded(&self) -> [u8; 32] {
        let mut word = [0_u8; 32];
        word[16..].copy_from_slice(&self.to_be_bytes());
        word
    }
}

#[async_trait]
impl<R: EthRpc> HolderSource for HolderEnumerator<R> {
    async fn holders(&self, asset_address: Option<Address>) -> Result<Vec<Address>> {
        self.enumerate(asset_address).await
    }
}
