use crate::{EthRpc, LogFilter, RawLog, RpcError};
use async_trait::async_trait;
use common::{
    Address, encode_bytes, encode_quantity, format_address, parse_fixed_hex, parse_hex_bytes,
    parse_hex_u64,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON-RPC over HTTP implementation of [`EthRpc`].
#[derive(Clone, Debug)]
pub struct HttpRpcClient {
    http_url: String,
    client: reqwest::Client,
}

impl HttpRpcClient {
    pub fn new(http_url: impl Into<String>) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http_url: http_url.into(),
            client,
        })
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response: Value = self
            .client
            .post(&self.http_url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error_value) = response.get("error") {
            return Err(RpcError::Node(error_value.to_string()));
        }
        match response.get("result") {
            Some(value) => Ok(value.clone()),
            None => Err(RpcError::Decode(format!("{method}: missing result"))),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcLog {
    address: String,
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    data: Option<String>,
    block_number: String,
    #[serde(default)]
    transaction_hash: Option<String>,
    #[serde(default)]
    log_index: Option<String>,
}

impl RpcLog {
    fn into_raw(self) -> Result<RawLog, RpcError> {
        let address = parse_fixed_hex::<20>(&self.address)
            .ok_or_else(|| RpcError::Decode(format!("invalid log address {}", self.address)))?;
        let topics = self
            .topics
            .iter()
            .map(|topic| {
                parse_fixed_hex::<32>(topic)
                    .ok_or_else(|| RpcError::Decode(format!("invalid log topic {topic}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let block_number = parse_hex_u64(&self.block_number)
            .ok_or_else(|| RpcError::Decode(format!("invalid block number {}", self.block_number)))?;
        let data = self
            .data
            .as_deref()
            .and_then(parse_hex_bytes)
            .unwrap_or_default();
        let transaction_hash = self
            .transaction_hash
            .as_deref()
            .and_then(parse_fixed_hex::<32>)
            .unwrap_or([0_u8; 32]);
        let log_index = self
            .log_index
            .as_deref()
            .and_then(parse_hex_u64)
            .unwrap_or_default();

        Ok(RawLog {
            address,
            topics,
            data,
            block_number,
            transaction_hash,
            log_index,
        })
    }
}

fn topics_json(filter: &LogFilter) -> Value {
    Value::Array(
        filter
            .topics
            .iter()
            .map(|topic| match topic {
                Some(topic) => json!(encode_bytes(topic)),
                None => Value::Null,
            })
            .collect(),
    )
}

#[async_trait]
impl EthRpc for HttpRpcClient {
    async fn block_number(&self) -> Result<u64, RpcError> {
        let result = self.request("eth_blockNumber", json!([])).await?;
        result
            .as_str()
            .and_then(parse_hex_u64)
            .ok_or_else(|| RpcError::Decode(format!("invalid block number {result}")))
    }

    async fn get_logs(
        &self,
        filter: &LogFilter,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RawLog>, RpcError> {
        let params = json!([{
            "address": format_address(&filter.address),
            "topics": topics_json(filter),
            "fromBlock": encode_quantity(from_block),
            "toBlock": encode_quantity(to_block),
        }]);
        let result = self.request("eth_getLogs", params).await?;
        let logs: Vec<RpcLog> = serde_json::from_value(result)
            .map_err(|err| RpcError::Decode(format!("eth_getLogs: {err}")))?;
        logs.into_iter().map(RpcLog::into_raw).collect()
    }

    async fn block_timestamp(&self, block_number: u64) -> Result<i64, RpcError> {
        let params = json!([encode_quantity(block_number), false]);
        let result = self.request("eth_getBlockByNumber", params).await?;
        result
            .get("timestamp")
            .and_then(Value::as_str)
            .and_then(parse_hex_u64)
            .map(|seconds| seconds as i64)
            .ok_or_else(|| RpcError::Decode(format!("block {block_number}: missing timestamp")))
    }

    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, RpcError> {
        let params = json!([
            { "to": format_address(&to), "data": encode_bytes(&data) },
            "latest",
        ]);
        let result = self.request("eth_call", params).await?;
        result
            .as_str()
            .and_then(parse_hex_bytes)
            .ok_or_else(|| RpcError::Decode(format!("eth_call: non-hex result {result}")))
    }
}
