//! Vested liquidity-mining staker handlers.
//!
//! Incentives are content-addressed by the keccak256 of their key, so a repeated
//! `IncentiveCreated` for the same parameters resolves to the same record. Stakes,
//! unstakes and claims are append-only and keyed by `<txHash>#<logIndexHex>`.

use super::{HandlerOutcome, Indexer, SkipReason};
use crate::domain::event::{
    DepositTransferred, IncentiveCreated, IncentiveEnded, RewardClaimed, TokenStaked,
    TokenUnstaked,
};
use crate::domain::staking::{event_entity_id, incentive_position_id};
use crate::domain::{
    Claim, EventContext, Hash32, Incentive, IncentiveKey, IncentivePosition, Stake, TokenId,
    Unstake,
};
use crate::error::LedgerError;
use tracing::{info, warn};

impl Indexer {
    pub async fn handle_incentive_created(
        &self,
        created: &IncentiveCreated,
        ctx: &EventContext,
    ) -> Result<HandlerOutcome, LedgerError> {
        let id = IncentiveKey::from(created).id();
        let existing = self.repo.get_incentive(&id).await?;

        // The reward token is cached even when the pool turns out to be unknown.
        let reward_token = self
            .get_or_create_erc20(created.reward_token, ctx.block_number)
            .await?;

        let Some(pool) = self.repo.get_pool(&created.pool).await? else {
            warn!(incentive = %id, pool = %created.pool, "Incentive pool not registered");
            return Ok(HandlerOutcome::Skipped(SkipReason::MissingPool(created.pool)));
        };

        let incentive = Incentive {
            id,
            contract: ctx.address,
            reward_token: reward_token.id,
            pool: pool.id,
            start_time: created.start_time,
            end_time: created.end_time,
            refundee: created.refundee,
            reward: created.reward,
            vesting_period: created.vesting_period,
            // Ended is terminal; a replayed creation does not reopen it.
            ended: existing.map(|i| i.ended).unwrap_or(false),
        };
        self.repo.save_incentive(&incentive).await?;

        info!(
            incentive = %id,
            pool = %incentive.pool,
            reward_token = %incentive.reward_token,
            "Incentive created"
        );
        Ok(HandlerOutcome::Applied)
    }

    pub async fn handle_incentive_ended(
        &self,
        ended: &IncentiveEnded,
    ) -> Result<HandlerOutcome, LedgerError> {
        let Some(mut incentive) = self.repo.get_incentive(&ended.incentive_id).await? else {
            return Ok(HandlerOutcome::Skipped(SkipReason::UnknownIncentive));
        };

        incentive.ended = true;
        self.repo.save_incentive(&incentive).await?;
        info!(incentive = %incentive.id, "Incentive ended");
        Ok(HandlerOutcome::Applied)
    }

    pub async fn handle_token_staked(
        &self,
        staked: &TokenStaked,
        ctx: &EventContext,
    ) -> Result<HandlerOutcome, LedgerError> {
        let position = self.get_or_create_position(&staked.token_id, ctx).await?;
        let farmer = self.get_or_create_identity(ctx.tx_from).await?;

        let incentive_position = self
            .get_or_create_incentive_position(&staked.incentive_id, &staked.token_id)
            .await?;

        // The incentive-position link above is kept even when the incentive is unknown.
        let Some(incentive) = self.repo.get_incentive(&incentive_position.incentive).await? else {
            warn!(
                token_id = %staked.token_id,
                incentive = %staked.incentive_id,
                "Stake references unknown incentive"
            );
            return Ok(HandlerOutcome::Skipped(SkipReason::MissingIncentive));
        };

        let stake = Stake {
            id: event_entity_id(&ctx.tx_hash, ctx.log_index),
            farmer: farmer.id,
            position: position.id,
            reward_token: incentive.reward_token,
            block_number: ctx.block_number,
            timestamp: ctx.block_timestamp,
            tx_hash: ctx.tx_hash,
        };
        self.repo.insert_stake(&stake).await?;
        Ok(HandlerOutcome::Applied)
    }

    pub async fn handle_token_unstaked(
        &self,
        unstaked: &TokenUnstaked,
        ctx: &EventContext,
    ) -> Result<HandlerOutcome, LedgerError> {
        // Unlike staking, an unstake never materializes a position.
        let Some(position) = self
            .repo
            .get_position(&unstaked.token_id.to_string())
            .await?
        else {
            return Ok(HandlerOutcome::Skipped(SkipReason::MissingPosition));
        };

        let farmer = self.get_or_create_identity(ctx.tx_from).await?;

        let ip_id = incentive_position_id(&unstaked.incentive_id, &unstaked.token_id);
        let Some(incentive_position) = self.repo.get_incentive_position(&ip_id).await? else {
            return Ok(HandlerOutcome::Skipped(SkipReason::MissingIncentivePosition));
        };
        let Some(incentive) = self.repo.get_incentive(&incentive_position.incentive).await? else {
            return Ok(HandlerOutcome::Skipped(SkipReason::MissingIncentive));
        };

        let unstake = Unstake {
            id: event_entity_id(&ctx.tx_hash, ctx.log_index),
            farmer: farmer.id,
            position: position.id,
            reward_token: incentive.reward_token,
            block_number: ctx.block_number,
            timestamp: ctx.block_timestamp,
            tx_hash: ctx.tx_hash,
        };
        self.repo.insert_unstake(&unstake).await?;
        Ok(HandlerOutcome::Applied)
    }

    pub async fn handle_reward_claimed(
        &self,
        claimed: &RewardClaimed,
        ctx: &EventContext,
    ) -> Result<HandlerOutcome, LedgerError> {
        // The claimant is the transaction originator, not the `to` recipient.
        let farmer = self.get_or_create_identity(ctx.tx_from).await?;
        let reward_token = self
            .get_or_create_erc20(claimed.reward_token, ctx.block_number)
            .await?;

        let claim = Claim {
            id: event_entity_id(&ctx.tx_hash, ctx.log_index),
            farmer: farmer.id,
            reward_token: reward_token.id,
            amount: claimed.reward,
            block_number: ctx.block_number,
            timestamp: ctx.block_timestamp,
            tx_hash: ctx.tx_hash,
        };
        self.repo.insert_claim(&claim).await?;
        Ok(HandlerOutcome::Applied)
    }

    /// Staker-level ownership change. Updates owner and minter; records no snapshot.
    pub async fn handle_deposit_transferred(
        &self,
        transferred: &DepositTransferred,
        ctx: &EventContext,
    ) -> Result<HandlerOutcome, LedgerError> {
        let mut position = self
            .get_or_create_position(&transferred.token_id, ctx)
            .await?;
        let old_owner = self.get_or_create_identity(transferred.old_owner).await?;
        let new_owner = self.get_or_create_identity(transferred.new_owner).await?;

        position.transfer_ownership(old_owner.id, new_owner.id);
        self.repo.save_position(&position).await?;
        Ok(HandlerOutcome::Applied)
    }

    async fn get_or_create_incentive_position(
        &self,
        incentive: &Hash32,
        token_id: &TokenId,
    ) -> Result<IncentivePosition, LedgerError> {
        let id = incentive_position_id(incentive, token_id);
        if let Some(existing) = self.repo.get_incentive_position(&id).await? {
            return Ok(existing);
        }
        let created = IncentivePosition::new(*incentive, token_id);
        self.repo.insert_incentive_position(&created).await?;
        Ok(created)
    }
}
