//! JSON-RPC `eth_call` implementation of [`ChainReader`].

use super::abi::{
    decimals_calldata, decode_decimals_return, decode_pool_return, decode_positions_return,
    decode_string_return, get_pool_calldata, name_calldata, positions_calldata, symbol_calldata,
};
use super::{CallResult, ChainError, ChainReader, PositionView};
use crate::domain::{Address, TokenId, TokenMetadata};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// EIP-1474 code for execution errors.
const EXECUTION_ERROR_CODE: i64 = 3;

/// Raw reply of an `eth_call`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum EthCallReply {
    Data(Vec<u8>),
    Reverted(String),
}

/// Chain reader backed by an HTTP JSON-RPC endpoint.
///
/// Transport failures, 429s and 5xx responses are retried with exponential backoff;
/// execution reverts are returned immediately as [`CallResult::Reverted`].
#[derive(Debug, Clone)]
pub struct RpcChainReader {
    client: Client,
    url: String,
    max_elapsed: Duration,
}

impl RpcChainReader {
    pub fn new(url: String) -> Self {
        Self {
            client: Client::new(),
            url,
            max_elapsed: Duration::from_secs(30),
        }
    }

    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = max_elapsed;
        self
    }

    async fn eth_call(
        &self,
        to: &Address,
        calldata: &[u8],
        block: u64,
    ) -> Result<EthCallReply, ChainError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [
                {
                    "to": to.to_hex(),
                    "data": format!("0x{}", hex::encode(calldata)),
                },
                format!("0x{:x}", block),
            ],
        });
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.max_elapsed),
            ..Default::default()
        };

        let response = retry(backoff, || async {
            let response = self
                .client
                .post(&self.url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(ChainError::Network(e.to_string())))?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(ChainError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(ChainError::Http {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(ChainError::Http {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<Value>()
                .await
                .map_err(|e| backoff::Error::permanent(ChainError::Decode(e.to_string())))
        })
        .await?;

        parse_eth_call_response(&response)
    }
}

/// Interpret a JSON-RPC `eth_call` response body.
fn parse_eth_call_response(response: &Value) -> Result<EthCallReply, ChainError> {
    if let Some(error) = response.get("error") {
        let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or_default();
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or_default()
            .to_string();
        if code == EXECUTION_ERROR_CODE || message.to_lowercase().contains("revert") {
            return Ok(EthCallReply::Reverted(message));
        }
        return Err(ChainError::Rpc { code, message });
    }

    let result = response
        .get("result")
        .and_then(|r| r.as_str())
        .ok_or_else(|| ChainError::Decode("Missing result".to_string()))?;
    let bytes = hex::decode(result.strip_prefix("0x").unwrap_or(result))
        .map_err(|e| ChainError::Decode(format!("eth_call result: {}", e)))?;
    Ok(EthCallReply::Data(bytes))
}

#[async_trait]
impl ChainReader for RpcChainReader {
    async fn positions(
        &self,
        manager: &Address,
        token_id: &TokenId,
        block: u64,
    ) -> Result<CallResult<PositionView>, ChainError> {
        match self
            .eth_call(manager, &positions_calldata(token_id), block)
            .await?
        {
            EthCallReply::Reverted(reason) => {
                debug!(token_id = %token_id, block, %reason, "positions() reverted");
                Ok(CallResult::Reverted)
            }
            // An empty return means no code answered the call; the node reports it as
            // success but there is no position state behind it.
            EthCallReply::Data(data) if data.is_empty() => Ok(CallResult::Reverted),
            EthCallReply::Data(data) => decode_positions_return(&data)
                .map(CallResult::Value)
                .map_err(ChainError::Decode),
        }
    }

    async fn get_pool(
        &self,
        factory: &Address,
        token0: &Address,
        token1: &Address,
        fee: u32,
        block: u64,
    ) -> Result<CallResult<Address>, ChainError> {
        match self
            .eth_call(factory, &get_pool_calldata(token0, token1, fee), block)
            .await?
        {
            EthCallReply::Reverted(reason) => {
                debug!(%token0, %token1, fee, %reason, "getPool() reverted");
                Ok(CallResult::Reverted)
            }
            EthCallReply::Data(data) if data.is_empty() => Ok(CallResult::Reverted),
            EthCallReply::Data(data) => decode_pool_return(&data)
                .map(CallResult::Value)
                .map_err(ChainError::Decode),
        }
    }

    async fn erc20_metadata(
        &self,
        token: &Address,
        block: u64,
    ) -> Result<TokenMetadata, ChainError> {
        let name = self.expect_data(token, &name_calldata(), block).await?;
        let symbol = self.expect_data(token, &symbol_calldata(), block).await?;
        let decimals = self.expect_data(token, &decimals_calldata(), block).await?;

        Ok(TokenMetadata {
            name: decode_string_return(&name).map_err(ChainError::Decode)?,
            symbol: decode_string_return(&symbol).map_err(ChainError::Decode)?,
            decimals: decode_decimals_return(&decimals).map_err(ChainError::Decode)?,
        })
    }
}

impl RpcChainReader {
    async fn expect_data(
        &self,
        to: &Address,
        calldata: &[u8],
        block: u64,
    ) -> Result<Vec<u8>, ChainError> {
        match self.eth_call(to, calldata, block).await? {
            EthCallReply::Data(data) => Ok(data),
            EthCallReply::Reverted(reason) => Err(ChainError::Rpc {
                code: EXECUTION_ERROR_CODE,
                message: format!("{} reverted: {}", to, reason),
            }),
        }
    }
}
