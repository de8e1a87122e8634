//! Position materialization from on-chain state.
//!
//! A position is created the first time any event references its token id. The
//! position manager's `positions(tokenId)` view supplies the pool key and ticks; the
//! factory resolves the pool address. Either read can revert (the position was burned
//! in the same block it was minted, or the pool key is unknown), in which case the
//! position is still created with zero sentinels so later events have a record to
//! attach to.

use super::Indexer;
use crate::chain::CallResult;
use crate::domain::{Address, EventContext, Position, TokenId};
use crate::error::LedgerError;
use tracing::{info, warn};

impl Indexer {
    /// Load the position for `token_id`, materializing it from chain on first sight.
    ///
    /// Never fails on a reverted read; only store or transport failures are errors.
    pub async fn get_or_create_position(
        &self,
        token_id: &TokenId,
        ctx: &EventContext,
    ) -> Result<Position, LedgerError> {
        let id = token_id.to_string();
        if let Some(position) = self.repo.get_position(&id).await? {
            return Ok(position);
        }

        let zero = self.get_or_create_identity(Address::ZERO).await?;
        let tx = self.load_transaction(ctx).await?;
        let block = ctx.block_number;

        let view = match self
            .chain
            .positions(&self.settings.position_manager, token_id, block)
            .await?
        {
            CallResult::Value(view) => view,
            CallResult::Reverted => {
                warn!(token_id = %token_id, block, "positions() reverted, materializing empty position");
                let position = Position::degenerate(id, zero.id, zero.id, tx.id);
                self.repo.save_position(&position).await?;
                return Ok(position);
            }
        };

        let owner = self.get_or_create_identity(view.operator).await?;
        let position = match self
            .chain
            .get_pool(
                &self.settings.factory,
                &view.token0,
                &view.token1,
                view.fee,
                block,
            )
            .await?
        {
            CallResult::Reverted => {
                warn!(
                    token_id = %token_id,
                    token0 = %view.token0,
                    token1 = %view.token1,
                    fee = view.fee,
                    "getPool() reverted, materializing position without pool"
                );
                Position::degenerate(id, owner.id, owner.id, tx.id)
            }
            // Minter stays the zero sentinel until the mint transfer back-fills it.
            CallResult::Value(pool) => Position::degenerate(id, owner.id, zero.id, tx.id)
                .with_pool_state(
                    pool,
                    view.token0,
                    view.token1,
                    view.tick_lower,
                    view.tick_upper,
                    view.fee_growth_inside0_last_x128,
                    view.fee_growth_inside1_last_x128,
                ),
        };

        self.repo.save_position(&position).await?;
        info!(
            token_id = %token_id,
            owner = %position.owner,
            pool = %position.pool,
            block,
            "Position materialized"
        );
        Ok(position)
    }

    /// Overwrite both fee-growth checkpoints with the current on-chain values. A
    /// reverted read leaves them unchanged.
    pub async fn refresh_fee_growth(
        &self,
        position: &mut Position,
        token_id: &TokenId,
        ctx: &EventContext,
    ) -> Result<(), LedgerError> {
        if let CallResult::Value(view) = self
            .chain
            .positions(&self.settings.position_manager, token_id, ctx.block_number)
            .await?
        {
            position.fee_growth_inside0_last_x128 = view.fee_growth_inside0_last_x128;
            position.fee_growth_inside1_last_x128 = view.fee_growth_inside1_last_x128;
        }
        Ok(())
    }
}
