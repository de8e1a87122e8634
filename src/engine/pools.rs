//! Factory `PoolCreated` handler: registers the pool and its two tokens.
//!
//! The liquidity handlers scale amounts by the registered tokens' decimals and the
//! incentive handler requires a registered pool, so this runs ahead of both.

use super::{HandlerOutcome, Indexer};
use crate::domain::event::PoolCreated;
use crate::domain::{Address, EventContext, Pool, Token};
use crate::error::LedgerError;
use tracing::info;

impl Indexer {
    pub async fn handle_pool_created(
        &self,
        created: &PoolCreated,
        ctx: &EventContext,
    ) -> Result<HandlerOutcome, LedgerError> {
        self.get_or_create_token(created.token0, ctx.block_number)
            .await?;
        self.get_or_create_token(created.token1, ctx.block_number)
            .await?;

        if self.repo.get_pool(&created.pool).await?.is_none() {
            let pool = Pool {
                id: created.pool,
                token0: created.token0,
                token1: created.token1,
                fee_tier: created.fee,
                tick_spacing: created.tick_spacing,
                created_at_block: ctx.block_number,
            };
            self.repo.insert_pool(&pool).await?;
            info!(
                pool = %pool.id,
                token0 = %pool.token0,
                token1 = %pool.token1,
                fee = pool.fee_tier,
                "Pool registered"
            );
        }

        Ok(HandlerOutcome::Applied)
    }

    /// Load a pool token, reading its metadata from chain on first sight.
    pub async fn get_or_create_token(
        &self,
        address: Address,
        block: u64,
    ) -> Result<Token, LedgerError> {
        if let Some(token) = self.repo.get_token(&address).await? {
            return Ok(token);
        }
        let metadata = self.chain.erc20_metadata(&address, block).await?;
        let token = Token {
            id: address,
            symbol: metadata.symbol,
            name: metadata.name,
            decimals: metadata.decimals,
        };
        self.repo.insert_token(&token).await?;
        Ok(token)
    }
}
