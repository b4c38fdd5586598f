use crate::{EthRpc, FastMap, FastSet, LogFilter, RawLog, RpcError, ToBlock};
use futures::future::join_all;

/// Base mainnet public RPC rejects eth_getLogs spans much above ~3k
/// blocks. 2k keeps headroom on both mainnet and Sepolia.
pub const MAX_BLOCK_SPAN: u64 = 2_000;

/// Fetches every matching log in `[from_block, to_block]`, splitting the
/// range into consecutive sub-ranges no wider than [`MAX_BLOCK_SPAN`].
///
/// Sub-ranges are fetched in ascending order and concatenated in order,
/// so the result preserves chronological first-occurrence semantics.
/// Any sub-range failure propagates unchanged; retry policy belongs to
/// the caller.
pub async fn fetch_logs_paginated<R: EthRpc>(
    rpc: &R,
    filter: &LogFilter,
    from_block: u64,
    to_block: ToBlock,
) -> Result<Vec<RawLog>, RpcError> {
    let latest = match to_block {
        ToBlock::Latest => rpc.block_number().await?,
        ToBlock::Number(number) => number,
    };

    let mut logs = Vec::new();
    let mut cursor = from_block;
    while cursor <= latest {
        let end = latest.min(cursor.saturating_add(MAX_BLOCK_SPAN - 1));
        let chunk = rpc.get_logs(filter, cursor, end).await?;
        logs.extend(chunk);
        match end.checked_add(1) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    Ok(logs)
}

/// Resolves the timestamp of every block touched by `logs`.
///
/// Block numbers are deduplicated first, so the number of follow-up
/// queries is bounded by the number of distinct blocks, not the number
/// of log records.
pub async fn resolve_block_timestamps<R: EthRpc>(
    rpc: &R,
    logs: &[RawLog],
) -> Result<FastMap<u64, i64>, RpcError> {
    let mut seen = FastSet::default();
    let distinct: Vec<u64> = logs
        .iter()
        .map(|log| log.block_number)
        .filter(|number| seen.insert(*number))
        .collect();

    let resolved = join_all(distinct.iter().map(|number| async move {
        let timestamp = rpc.block_timestamp(*number).await?;
        Ok::<_, RpcError>((*number, timestamp))
    }))
    .await;

    let mut timestamps = FastMap::default();
    for entry in resolved {
        let (number, timestamp) = entry?;
        timestamps.insert(number, timestamp);
    }
    Ok(timestamps)
}
