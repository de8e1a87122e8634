#![allow(dead_code)]

use alloy::primitives::U256;
use lpledger::chain::PositionView;
use lpledger::db::init_db;
use lpledger::domain::event::PoolCreated;
use lpledger::domain::TokenMetadata;
use lpledger::{
    Address, ChainEvent, EventContext, EventKind, Indexer, IndexerSettings, MockChainReader,
    Repository, TxHash,
};
use std::sync::Arc;
use tempfile::TempDir;

pub const POSITION_MANAGER: &str = "0xc36442b4a4522e871399cd717abdd847ab11fe88";
pub const FACTORY: &str = "0x1f98431c8ad98523631ae4a59f267346ea31f984";
pub const STAKER: &str = "0xe34139463ba50bd61336e0c446bd8c0867c6fe65";
pub const USDC: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
pub const WETH: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";
pub const POOL: &str = "0x88e6a0c2ddd26feeb64f039a2c41296fcb3f5640";
pub const OPERATOR: &str = "0x00000000000000000000000000000000000000a1";
pub const ALICE: &str = "0x00000000000000000000000000000000000a11ce";
pub const BOB: &str = "0x0000000000000000000000000000000000000b0b";
pub const FEE: u32 = 500;

pub fn addr(s: &str) -> Address {
    Address::parse(s).unwrap()
}

pub fn usdc_metadata() -> TokenMetadata {
    TokenMetadata {
        name: "USD Coin".to_string(),
        symbol: "USDC".to_string(),
        decimals: 6,
    }
}

pub fn weth_metadata() -> TokenMetadata {
    TokenMetadata {
        name: "Wrapped Ether".to_string(),
        symbol: "WETH".to_string(),
        decimals: 18,
    }
}

/// A USDC/WETH position as `positions()` reports it.
pub fn usdc_weth_view(fee_growth0: u64, fee_growth1: u64) -> PositionView {
    PositionView {
        nonce: U256::ZERO,
        operator: addr(OPERATOR),
        token0: addr(USDC),
        token1: addr(WETH),
        fee: FEE,
        tick_lower: -201_000,
        tick_upper: -199_000,
        liquidity: 0,
        fee_growth_inside0_last_x128: U256::from(fee_growth0),
        fee_growth_inside1_last_x128: U256::from(fee_growth1),
        tokens_owed0: 0,
        tokens_owed1: 0,
    }
}

/// Mock with both pool tokens' metadata and the USDC/WETH pool registered.
pub fn mainnet_mock() -> MockChainReader {
    MockChainReader::new()
        .with_token(addr(USDC), usdc_metadata())
        .with_token(addr(WETH), weth_metadata())
        .with_pool(addr(USDC), addr(WETH), FEE, addr(POOL))
}

pub fn default_settings() -> IndexerSettings {
    IndexerSettings::new(addr(POSITION_MANAGER), addr(FACTORY))
}

pub async fn setup_indexer(
    chain: MockChainReader,
    settings: IndexerSettings,
) -> (Indexer, Arc<MockChainReader>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));
    let chain = Arc::new(chain);
    let indexer = Indexer::new(repo, chain.clone(), settings);
    (indexer, chain, temp_dir)
}

pub fn tx_hash(seed: u8) -> TxHash {
    TxHash::new([seed; 32])
}

pub fn ctx(block: u64, log_index: u64) -> EventContext {
    EventContext {
        address: addr(POSITION_MANAGER),
        block_number: block,
        block_timestamp: 1_700_000_000 + block * 12,
        tx_hash: tx_hash((block % 251) as u8),
        log_index,
        tx_from: addr(ALICE),
    }
}

pub fn event(context: EventContext, event: EventKind) -> ChainEvent {
    ChainEvent { context, event }
}

/// Register the USDC/WETH pool and both tokens.
pub async fn register_pool(indexer: &Indexer) {
    let created = PoolCreated {
        token0: addr(USDC),
        token1: addr(WETH),
        fee: FEE,
        tick_spacing: 10,
        pool: addr(POOL),
    };
    let mut context = ctx(1, 0);
    context.address = addr(FACTORY);
    indexer
        .handle(&event(context, EventKind::PoolCreated(created)))
        .await
        .expect("pool registration failed");
}
