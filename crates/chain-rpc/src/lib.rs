use async_trait::async_trait;
use common::{Address, Topic, TxHash};
use thiserror::Error;

mod http;
mod paginate;

pub use http::HttpRpcClient;
pub use paginate::{MAX_BLOCK_SPAN, fetch_logs_paginated, resolve_block_timestamps};

pub type FastMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;
pub type FastSet<T> = hashbrown::HashSet<T, ahash::RandomState>;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("rpc transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("rpc returned error: {0}")]
    Node(String),
    #[error("malformed rpc response: {0}")]
    Decode(String),
}

/// Event log filter: `topics[0]` is the event signature, positions 1-3
/// match the event's indexed arguments (`None` matches anything).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogFilter {
    pub address: Address,
    pub topics: Vec<Option<Topic>>,
}

impl LogFilter {
    pub fn event(address: Address, signature: Topic) -> Self {
        Self {
            address,
            topics: vec![Some(signature)],
        }
    }

    pub fn indexed(mut self, position: usize, topic: Topic) -> Self {
        debug_assert!((1..=3).contains(&position), "indexed topic positions are 1-3");
        while self.topics.len() <= position {
            self.topics.push(None);
        }
        self.topics[position] = Some(topic);
        self
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<Topic>,
    pub data: Vec<u8>,
    pub block_number: u64,
    pub transaction_hash: TxHash,
    pub log_index: u64,
}

impl RawLog {
    pub fn indexed(&self, position: usize) -> Option<&Topic> {
        self.topics.get(position)
    }
}

/// Upper bound of a log query. `Latest` is resolved to a concrete block
/// number exactly once per paginated fetch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ToBlock {
    Latest,
    Number(u64),
}

#[async_trait]
pub trait EthRpc: Send + Sync {
    async fn block_number(&self) -> Result<u64, RpcError>;

    async fn get_logs(
        &self,
        filter: &LogFilter,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RawLog>, RpcError>;

    async fn block_timestamp(&self, block_number: u64) -> Result<i64, RpcError>;

    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, RpcError>;
}

#[async_trait]
impl<R: EthRpc + ?Sized> EthRpc for &R {
    async fn block_number(&self) -> Result<u64, RpcError> {
        (**self).block_number().await
    }

    async fn get_logs(
        &self,
        filter: &LogFilter,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RawLog>, RpcError> {
        (**self).get_logs(filter, from_block, to_block).await
    }

    async fn block_timestamp(&self, block_number: u64) -> Result<i64, RpcError> {
        (**self).block_timestamp(block_number).await
    }

    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, RpcError> {
        (**self).call(to, data).await
    }
}

#[async_trait]
impl<R: EthRpc + ?Sized> EthRpc for std::sync::Arc<R> {
    async fn block_number(&self) -> Result<u64, RpcError> {
        (**self).block_number().await
    }

    async fn get_logs(
        &self,
        filter: &LogFilter,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RawLog>, RpcError> {
        (**self).get_logs(filter, from_block, to_block).await
    }

    async fn block_timestamp(&self, block_number: u64) -> Result<i64, RpcError> {
        (**self).block_timestamp(block_number).await
    }

    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, RpcError> {
        (**self).call(to, data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_builder_pads_skipped_positions_with_wildcards() {
        let filter = LogFilter::event([0x11; 20], [0xaa; 32]).indexed(2, [0xbb; 32]);
        assert_eq!(
            filter.topics,
            vec![Some([0xaa; 32]), None, Some([0xbb; 32])]
        );
    }
}
