//! Position manager event handlers: liquidity changes, fee collection, NFT transfers.
//!
//! Each handler resolves the position, applies its preconditions, mutates, refreshes
//! the fee-growth checkpoints, persists, and appends a snapshot.

use super::{HandlerOutcome, Indexer, SkipReason};
use crate::config::CollectFeesMode;
use crate::domain::event::{Collect, LiquidityChange, NftTransfer};
use crate::domain::{Address, Decimal, EventContext, Position, Token};
use crate::error::LedgerError;
use alloy::primitives::{I256, U256};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Increase,
    Decrease,
}

/// A uint128 liquidity delta as a signed accumulator delta.
fn liquidity_delta(raw: U256) -> I256 {
    I256::from_raw(raw.min(I256::MAX.into_raw()))
}

/// Scale `raw` to token units and add it to `total`. `None` when either step leaves
/// the decimal range.
fn accumulate(total: Decimal, raw: U256, decimals: u8) -> Option<Decimal> {
    Decimal::from_raw_units(raw, decimals)
        .ok()
        .and_then(|amount| total.checked_add(amount))
}

fn amount_overflow(position: &Position, ctx: &EventContext) -> HandlerOutcome {
    warn!(
        token_id = %position.id,
        block = ctx.block_number,
        log_index = ctx.log_index,
        "Amount exceeds decimal range, event ignored"
    );
    HandlerOutcome::Skipped(SkipReason::AmountOverflow)
}

impl Indexer {
    pub async fn handle_increase_liquidity(
        &self,
        change: &LiquidityChange,
        ctx: &EventContext,
    ) -> Result<HandlerOutcome, LedgerError> {
        self.apply_liquidity_change(change, ctx, Direction::Increase)
            .await
    }

    pub async fn handle_decrease_liquidity(
        &self,
        change: &LiquidityChange,
        ctx: &EventContext,
    ) -> Result<HandlerOutcome, LedgerError> {
        self.apply_liquidity_change(change, ctx, Direction::Decrease)
            .await
    }

    async fn apply_liquidity_change(
        &self,
        change: &LiquidityChange,
        ctx: &EventContext,
        direction: Direction,
    ) -> Result<HandlerOutcome, LedgerError> {
        // Checked before materializing: nothing from an excluded block is persisted.
        if self.settings.exclusions.is_block_excluded(ctx.block_number) {
            return Ok(HandlerOutcome::Skipped(SkipReason::ExcludedBlock));
        }

        let mut position = self.get_or_create_position(&change.token_id, ctx).await?;
        if self.settings.exclusions.is_pool_excluded(&position.pool) {
            return Ok(HandlerOutcome::Skipped(SkipReason::ExcludedPool));
        }

        let token0 = match self.pool_token(&position, position.token0).await? {
            Ok(token) => token,
            Err(reason) => return Ok(HandlerOutcome::Skipped(reason)),
        };
        let token1 = match self.pool_token(&position, position.token1).await? {
            Ok(token) => token,
            Err(reason) => return Ok(HandlerOutcome::Skipped(reason)),
        };

        let (deposited, withdrawn) = (
            (position.deposited_token0, position.deposited_token1),
            (position.withdrawn_token0, position.withdrawn_token1),
        );
        let totals = match direction {
            Direction::Increase => deposited,
            Direction::Decrease => withdrawn,
        };
        // Both totals are computed before anything is mutated.
        let Some((total0, total1)) = accumulate(totals.0, change.amount0, token0.decimals)
            .zip(accumulate(totals.1, change.amount1, token1.decimals))
        else {
            return Ok(amount_overflow(&position, ctx));
        };
        let delta = liquidity_delta(change.liquidity);

        match direction {
            Direction::Increase => {
                position.liquidity = position.liquidity.saturating_add(delta);
                position.deposited_token0 = total0;
                position.deposited_token1 = total1;
            }
            Direction::Decrease => {
                // No floor: a decrease beyond what was recorded drives liquidity negative.
                position.liquidity = position.liquidity.saturating_sub(delta);
                position.withdrawn_token0 = total0;
                position.withdrawn_token1 = total1;
            }
        }

        self.refresh_fee_growth(&mut position, &change.token_id, ctx)
            .await?;
        self.repo.save_position(&position).await?;
        self.append_snapshot(&position, ctx).await?;
        Ok(HandlerOutcome::Applied)
    }

    pub async fn handle_collect(
        &self,
        collect: &Collect,
        ctx: &EventContext,
    ) -> Result<HandlerOutcome, LedgerError> {
        let mut position = self.get_or_create_position(&collect.token_id, ctx).await?;
        if self.settings.exclusions.is_pool_excluded(&position.pool) {
            return Ok(HandlerOutcome::Skipped(SkipReason::ExcludedPool));
        }

        let token0 = match self.pool_token(&position, position.token0).await? {
            Ok(token) => token,
            Err(reason) => return Ok(HandlerOutcome::Skipped(reason)),
        };
        let Ok(fees0) = Decimal::from_raw_units(collect.amount0, token0.decimals) else {
            return Ok(amount_overflow(&position, ctx));
        };

        let fees1 = match self.settings.collect_fees_mode {
            CollectFeesMode::Legacy => fees0,
            CollectFeesMode::Corrected => {
                let token1 = match self.pool_token(&position, position.token1).await? {
                    Ok(token) => token,
                    Err(reason) => return Ok(HandlerOutcome::Skipped(reason)),
                };
                let Ok(fees1) = Decimal::from_raw_units(collect.amount1, token1.decimals) else {
                    return Ok(amount_overflow(&position, ctx));
                };
                fees1
            }
        };

        let Some((total0, total1)) = position
            .collected_fees_token0
            .checked_add(fees0)
            .zip(position.collected_fees_token1.checked_add(fees1))
        else {
            return Ok(amount_overflow(&position, ctx));
        };
        position.collected_fees_token0 = total0;
        position.collected_fees_token1 = total1;

        self.refresh_fee_growth(&mut position, &collect.token_id, ctx)
            .await?;
        self.repo.save_position(&position).await?;
        self.append_snapshot(&position, ctx).await?;
        Ok(HandlerOutcome::Applied)
    }

    pub async fn handle_transfer(
        &self,
        transfer: &NftTransfer,
        ctx: &EventContext,
    ) -> Result<HandlerOutcome, LedgerError> {
        let mut position = self.get_or_create_position(&transfer.token_id, ctx).await?;
        let old_owner = self.get_or_create_identity(transfer.from).await?;
        let new_owner = self.get_or_create_identity(transfer.to).await?;

        position.transfer_ownership(old_owner.id, new_owner.id);

        self.repo.save_position(&position).await?;
        self.append_snapshot(&position, ctx).await?;
        Ok(HandlerOutcome::Applied)
    }

    /// Load a registered pool token, or the skip reason when it was never registered.
    async fn pool_token(
        &self,
        position: &Position,
        token: Address,
    ) -> Result<Result<Token, SkipReason>, LedgerError> {
        match self.repo.get_token(&token).await? {
            Some(found) => Ok(Ok(found)),
            None => {
                warn!(
                    token_id = %position.id,
                    token = %token,
                    "Position token not registered, event ignored"
                );
                Ok(Err(SkipReason::MissingToken(token)))
            }
        }
    }
}
