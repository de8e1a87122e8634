//! Contract bindings for the views the indexer calls, and their return decoding.

use crate::chain::PositionView;
use crate::domain::{Address, TokenId};
use alloy::primitives::aliases::U24;
use alloy::primitives::U256;
use alloy::sol;
use alloy::sol_types::SolCall;

sol! {
    interface INonfungiblePositionManager {
        function positions(uint256 tokenId) external view returns (
            uint96 nonce,
            address operator,
            address token0,
            address token1,
            uint24 fee,
            int24 tickLower,
            int24 tickUpper,
            uint128 liquidity,
            uint256 feeGrowthInside0LastX128,
            uint256 feeGrowthInside1LastX128,
            uint128 tokensOwed0,
            uint128 tokensOwed1
        );
    }

    interface IUniswapV3Factory {
        function getPool(address tokenA, address tokenB, uint24 fee) external view returns (address pool);
    }

    interface IERC20Metadata {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
    }
}

use IERC20Metadata::{decimalsCall, nameCall, symbolCall};
use INonfungiblePositionManager::positionsCall;
use IUniswapV3Factory::getPoolCall;

pub fn positions_calldata(token_id: &TokenId) -> Vec<u8> {
    positionsCall {
        tokenId: token_id.as_u256(),
    }
    .abi_encode()
}

/// Fee tiers are uint24 on chain; a larger value saturates.
pub fn get_pool_calldata(token0: &Address, token1: &Address, fee: u32) -> Vec<u8> {
    getPoolCall {
        tokenA: token0.to_evm(),
        tokenB: token1.to_evm(),
        fee: U24::saturating_from(fee),
    }
    .abi_encode()
}

pub fn name_calldata() -> Vec<u8> {
    nameCall {}.abi_encode()
}

pub fn symbol_calldata() -> Vec<u8> {
    symbolCall {}.abi_encode()
}

pub fn decimals_calldata() -> Vec<u8> {
    decimalsCall {}.abi_encode()
}

pub fn decode_positions_return(data: &[u8]) -> Result<PositionView, String> {
    let ret = positionsCall::abi_decode_returns(data, true)
        .map_err(|e| format!("positions() return: {}", e))?;
    let tick_lower =
        i32::try_from(ret.tickLower).map_err(|e| format!("positions() tickLower: {}", e))?;
    let tick_upper =
        i32::try_from(ret.tickUpper).map_err(|e| format!("positions() tickUpper: {}", e))?;
    Ok(PositionView {
        nonce: U256::from(ret.nonce),
        operator: ret.operator.into(),
        token0: ret.token0.into(),
        token1: ret.token1.into(),
        fee: ret.fee.to::<u32>(),
        tick_lower,
        tick_upper,
        liquidity: ret.liquidity,
        fee_growth_inside0_last_x128: ret.feeGrowthInside0LastX128,
        fee_growth_inside1_last_x128: ret.feeGrowthInside1LastX128,
        tokens_owed0: ret.tokensOwed0,
        tokens_owed1: ret.tokensOwed1,
    })
}

pub fn decode_pool_return(data: &[u8]) -> Result<Address, String> {
    getPoolCall::abi_decode_returns(data, true)
        .map(|ret| ret.pool.into())
        .map_err(|e| format!("getPool() return: {}", e))
}

pub fn decode_decimals_return(data: &[u8]) -> Result<u8, String> {
    decimalsCall::abi_decode_returns(data, true)
        .map(|ret| ret._0)
        .map_err(|e| format!("decimals() return: {}", e))
}

/// Decode a `name()` / `symbol()` return. Tokens that predate string-typed metadata
/// return a single NUL-padded `bytes32` word instead.
pub fn decode_string_return(data: &[u8]) -> Result<String, String> {
    if data.len() == 32 {
        let trimmed: Vec<u8> = data.iter().copied().take_while(|b| *b != 0).collect();
        return Ok(String::from_utf8_lossy(&trimmed).into_owned());
    }
    nameCall::abi_decode_returns(data, true)
        .map(|ret| ret._0)
        .map_err(|e| format!("string return: {}", e))
}
