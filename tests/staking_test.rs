mod common;

use alloy::primitives::U256;
use common::*;
use lpledger::domain::event::{
    DepositTransferred, IncentiveCreated, IncentiveEnded, RewardClaimed, TokenStaked,
    TokenUnstaked,
};
use lpledger::domain::staking::{event_entity_id, incentive_position_id};
use lpledger::domain::{IncentiveKey, TokenMetadata};
use lpledger::{
    ChainEvent, EventContext, EventKind, Hash32, HandlerOutcome, MockChainReader, SkipReason,
    TokenId,
};

const REWARD: &str = "0x1f9840a85d5af5bf1d1762f925bdaddc4201f984";

fn staking_mock() -> MockChainReader {
    mainnet_mock().with_token(
        addr(REWARD),
        TokenMetadata {
            name: "Uniswap".to_string(),
            symbol: "UNI".to_string(),
            decimals: 18,
        },
    )
}

fn staker_ctx(block: u64, log_index: u64) -> EventContext {
    let mut context = ctx(block, log_index);
    context.address = addr(STAKER);
    context
}

fn incentive_created() -> IncentiveCreated {
    IncentiveCreated {
        reward_token: addr(REWARD),
        pool: addr(POOL),
        start_time: U256::from(1_700_000_000u64),
        end_time: U256::from(1_702_592_000u64),
        vesting_period: U256::from(2_592_000u64),
        refundee: addr(OPERATOR),
        reward: U256::from(1_000_000_000_000_000_000_000u128),
    }
}

fn create_event(block: u64) -> ChainEvent {
    event(
        staker_ctx(block, 0),
        EventKind::IncentiveCreated(incentive_created()),
    )
}

fn stake_event(block: u64, log_index: u64, incentive_id: Hash32) -> ChainEvent {
    event(
        staker_ctx(block, log_index),
        EventKind::TokenStaked(TokenStaked {
            token_id: TokenId::from(5),
            incentive_id,
            liquidity: U256::from(42u8),
        }),
    )
}

fn incentive_id() -> Hash32 {
    IncentiveKey::from(&incentive_created()).id()
}

#[tokio::test]
async fn test_incentive_created_is_content_addressed() {
    let (indexer, _chain, _temp) = setup_indexer(staking_mock(), default_settings()).await;
    register_pool(&indexer).await;

    assert!(indexer.handle(&create_event(200)).await.unwrap().is_applied());
    assert!(indexer.handle(&create_event(201)).await.unwrap().is_applied());

    let counts = indexer.repo().entity_counts().await.unwrap();
    assert_eq!(counts.incentives, 1);

    let incentive = indexer
        .repo()
        .get_incentive(&incentive_id())
        .await
        .unwrap()
        .expect("incentive stored");
    assert_eq!(incentive.contract, addr(STAKER));
    assert_eq!(incentive.reward_token, addr(REWARD));
    assert_eq!(incentive.pool, addr(POOL));
    assert_eq!(incentive.vesting_period, U256::from(2_592_000u64));
    assert!(!incentive.ended);

    let reward = indexer
        .repo()
        .get_erc20_token(&addr(REWARD))
        .await
        .unwrap()
        .expect("reward token cached");
    assert_eq!(reward.symbol, "UNI");
    assert_eq!(reward.decimals, 18);
}

#[tokio::test]
async fn test_incentive_for_unregistered_pool_still_caches_reward_token() {
    let (indexer, _chain, _temp) = setup_indexer(staking_mock(), default_settings()).await;

    let outcome = indexer.handle(&create_event(200)).await.unwrap();
    assert_eq!(
        outcome,
        HandlerOutcome::Skipped(SkipReason::MissingPool(addr(POOL)))
    );
    assert!(indexer
        .repo()
        .get_erc20_token(&addr(REWARD))
        .await
        .unwrap()
        .is_some());
    assert!(indexer
        .repo()
        .get_incentive(&incentive_id())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_incentive_ended_is_terminal() {
    let (indexer, _chain, _temp) = setup_indexer(staking_mock(), default_settings()).await;
    register_pool(&indexer).await;
    indexer.handle(&create_event(200)).await.unwrap();

    let ended = event(
        staker_ctx(300, 0),
        EventKind::IncentiveEnded(IncentiveEnded {
            incentive_id: incentive_id(),
            refund: U256::ZERO,
        }),
    );
    assert!(indexer.handle(&ended).await.unwrap().is_applied());
    let incentive = indexer.repo().get_incentive(&incentive_id()).await.unwrap().unwrap();
    assert!(incentive.ended);

    // A replayed creation does not reopen it.
    indexer.handle(&create_event(301)).await.unwrap();
    let incentive = indexer.repo().get_incentive(&incentive_id()).await.unwrap().unwrap();
    assert!(incentive.ended);
}

#[tokio::test]
async fn test_ending_unknown_incentive_is_skipped() {
    let (indexer, _chain, _temp) = setup_indexer(staking_mock(), default_settings()).await;

    let unknown = Hash32::new([0xee; 32]);
    let ended = event(
        staker_ctx(300, 0),
        EventKind::IncentiveEnded(IncentiveEnded {
            incentive_id: unknown,
            refund: U256::ZERO,
        }),
    );
    assert_eq!(
        indexer.handle(&ended).await.unwrap(),
        HandlerOutcome::Skipped(SkipReason::UnknownIncentive)
    );
    assert!(indexer.repo().get_incentive(&unknown).await.unwrap().is_none());
}

#[tokio::test]
async fn test_token_staked_records_stake_for_tx_originator() {
    let chain = staking_mock().with_position(TokenId::from(5), usdc_weth_view(0, 0));
    let (indexer, _chain, _temp) = setup_indexer(chain, default_settings()).await;
    register_pool(&indexer).await;
    indexer.handle(&create_event(200)).await.unwrap();

    let staked = stake_event(300, 2, incentive_id());
    assert!(indexer.handle(&staked).await.unwrap().is_applied());

    let stake_id = event_entity_id(&staked.context.tx_hash, 2);
    assert!(stake_id.ends_with("#0x2"));
    let stake = indexer
        .repo()
        .get_stake(&stake_id)
        .await
        .unwrap()
        .expect("stake recorded");
    assert_eq!(stake.farmer, addr(ALICE));
    assert_eq!(stake.position, "5");
    assert_eq!(stake.reward_token, addr(REWARD));
    assert_eq!(stake.block_number, 300);

    let link = indexer
        .repo()
        .get_incentive_position(&incentive_position_id(&incentive_id(), &TokenId::from(5)))
        .await
        .unwrap()
        .expect("incentive position created");
    assert_eq!(link.claimed, U256::ZERO);
    assert_eq!(link.incentive, incentive_id());
}

#[tokio::test]
async fn test_stake_for_unknown_incentive_keeps_only_the_link() {
    let chain = staking_mock().with_position(TokenId::from(5), usdc_weth_view(0, 0));
    let (indexer, _chain, _temp) = setup_indexer(chain, default_settings()).await;
    register_pool(&indexer).await;

    let unknown = Hash32::new([0xee; 32]);
    let outcome = indexer.handle(&stake_event(300, 0, unknown)).await.unwrap();
    assert_eq!(outcome, HandlerOutcome::Skipped(SkipReason::MissingIncentive));

    assert!(indexer
        .repo()
        .get_incentive_position(&incentive_position_id(&unknown, &TokenId::from(5)))
        .await
        .unwrap()
        .is_some());
    assert!(indexer.repo().get_position("5").await.unwrap().is_some());
    assert_eq!(indexer.repo().entity_counts().await.unwrap().stakes, 0);
}

#[tokio::test]
async fn test_unstake_of_unknown_position_changes_nothing() {
    let (indexer, chain, _temp) = setup_indexer(staking_mock(), default_settings()).await;

    let mut context = staker_ctx(300, 0);
    context.tx_from = addr(BOB);
    let unstaked = event(
        context,
        EventKind::TokenUnstaked(TokenUnstaked {
            token_id: TokenId::from(77),
            incentive_id: incentive_id(),
        }),
    );

    assert_eq!(
        indexer.handle(&unstaked).await.unwrap(),
        HandlerOutcome::Skipped(SkipReason::MissingPosition)
    );
    assert!(indexer.repo().get_position("77").await.unwrap().is_none());
    assert!(indexer.repo().get_identity(&addr(BOB)).await.unwrap().is_none());
    assert_eq!(chain.position_calls(), 0);
}

#[tokio::test]
async fn test_unstake_after_stake_is_recorded() {
    let chain = staking_mock().with_position(TokenId::from(5), usdc_weth_view(0, 0));
    let (indexer, _chain, _temp) = setup_indexer(chain, default_settings()).await;
    register_pool(&indexer).await;
    indexer.handle(&create_event(200)).await.unwrap();
    indexer
        .handle(&stake_event(300, 0, incentive_id()))
        .await
        .unwrap();

    let unstaked = event(
        staker_ctx(400, 7),
        EventKind::TokenUnstaked(TokenUnstaked {
            token_id: TokenId::from(5),
            incentive_id: incentive_id(),
        }),
    );
    assert!(indexer.handle(&unstaked).await.unwrap().is_applied());

    let unstake = indexer
        .repo()
        .get_unstake(&event_entity_id(&unstaked.context.tx_hash, 7))
        .await
        .unwrap()
        .expect("unstake recorded");
    assert_eq!(unstake.farmer, addr(ALICE));
    assert_eq!(unstake.position, "5");
    assert_eq!(unstake.reward_token, addr(REWARD));

    let counts = indexer.repo().entity_counts().await.unwrap();
    assert_eq!(counts.stakes, 1);
    assert_eq!(counts.unstakes, 1);
}

#[tokio::test]
async fn test_reward_claim_stores_raw_amount_for_tx_originator() {
    let (indexer, _chain, _temp) = setup_indexer(staking_mock(), default_settings()).await;

    let amount = U256::from(1_234_567_890_123_456_789_012u128);
    let claimed = event(
        staker_ctx(500, 1),
        EventKind::RewardClaimed(RewardClaimed {
            reward_token: addr(REWARD),
            to: addr(BOB),
            reward: amount,
        }),
    );
    assert!(indexer.handle(&claimed).await.unwrap().is_applied());

    let claim = indexer
        .repo()
        .get_claim(&event_entity_id(&claimed.context.tx_hash, 1))
        .await
        .unwrap()
        .expect("claim recorded");
    assert_eq!(claim.farmer, addr(ALICE));
    assert_eq!(claim.amount, amount);
    assert_eq!(claim.reward_token, addr(REWARD));
    assert!(indexer
        .repo()
        .get_erc20_token(&addr(REWARD))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_deposit_transfer_moves_owner_without_snapshot() {
    let chain = staking_mock().with_position(TokenId::from(5), usdc_weth_view(0, 0));
    let (indexer, _chain, _temp) = setup_indexer(chain, default_settings()).await;
    register_pool(&indexer).await;

    let transferred = event(
        staker_ctx(300, 0),
        EventKind::DepositTransferred(DepositTransferred {
            token_id: TokenId::from(5),
            old_owner: addr(ALICE),
            new_owner: addr(BOB),
        }),
    );
    assert!(indexer.handle(&transferred).await.unwrap().is_applied());

    let position = indexer.repo().get_position("5").await.unwrap().unwrap();
    assert_eq!(position.owner, addr(BOB));
    assert_eq!(position.minter, addr(ALICE));
    assert!(indexer
        .repo()
        .query_snapshots_for_position("5")
        .await
        .unwrap()
        .is_empty());
}
