//! Incentive, incentive-position and stake-log operations for the repository.

use crate::domain::{Claim, Hash32, Incentive, IncentivePosition, Stake, Unstake};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{get_address, get_hash, get_u256, get_u64, Repository};

impl Repository {
    pub async fn get_incentive(&self, id: &Hash32) -> Result<Option<Incentive>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, contract, reward_token, pool, start_time, end_time, refundee, reward,
                   vesting_period, ended
            FROM incentives
            WHERE id = ?
            "#,
        )
        .bind(id.to_hex())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(incentive_from_row).transpose()
    }

    /// Insert or overwrite an incentive.
    ///
    /// # Errors
    /// Returns an error if the upsert fails.
    pub async fn save_incentive(&self, incentive: &Incentive) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO incentives
            (id, contract, reward_token, pool, start_time, end_time, refundee, reward,
             vesting_period, ended)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                contract = excluded.contract,
                reward_token = excluded.reward_token,
                pool = excluded.pool,
                start_time = excluded.start_time,
                end_time = excluded.end_time,
                refundee = excluded.refundee,
                reward = excluded.reward,
                vesting_period = excluded.vesting_period,
                ended = excluded.ended
            "#,
        )
        .bind(incentive.id.to_hex())
        .bind(incentive.contract.to_hex())
        .bind(incentive.reward_token.to_hex())
        .bind(incentive.pool.to_hex())
        .bind(incentive.start_time.to_string())
        .bind(incentive.end_time.to_string())
        .bind(incentive.refundee.to_hex())
        .bind(incentive.reward.to_string())
        .bind(incentive.vesting_period.to_string())
        .bind(incentive.ended)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_incentive_position(
        &self,
        id: &str,
    ) -> Result<Option<IncentivePosition>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, position, incentive, claimed FROM incentive_positions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(incentive_position_from_row).transpose()
    }

    pub async fn insert_incentive_position(
        &self,
        incentive_position: &IncentivePosition,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO incentive_positions (id, position, incentive, claimed)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&incentive_position.id)
        .bind(&incentive_position.position)
        .bind(incentive_position.incentive.to_hex())
        .bind(incentive_position.claimed.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Append-only stake log
    // =========================================================================

    /// Record a stake. Returns false if a stake with this id already exists.
    pub async fn insert_stake(&self, stake: &Stake) -> Result<bool, sqlx::Error> {
        self.insert_stake_row("stakes", stake_columns(stake)).await
    }

    /// Record an unstake. Returns false if an unstake with this id already exists.
    pub async fn insert_unstake(&self, unstake: &Unstake) -> Result<bool, sqlx::Error> {
        self.insert_stake_row("unstakes", unstake_columns(unstake)).await
    }

    async fn insert_stake_row(&self, table: &str, row: StakeRow<'_>) -> Result<bool, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO {} (id, farmer, position, reward_token, block_number, timestamp, tx_hash)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
            table
        );
        let result = sqlx::query(&sql)
            .bind(row.id)
            .bind(row.farmer)
            .bind(row.position)
            .bind(row.reward_token)
            .bind(row.block_number)
            .bind(row.timestamp)
            .bind(row.tx_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_stake(&self, id: &str) -> Result<Option<Stake>, sqlx::Error> {
        let row = sqlx::query(&format!("{} FROM stakes WHERE id = ?", STAKE_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(stake_from_row).transpose()
    }

    pub async fn get_unstake(&self, id: &str) -> Result<Option<Unstake>, sqlx::Error> {
        let row = sqlx::query(&format!("{} FROM unstakes WHERE id = ?", STAKE_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(unstake_from_row).transpose()
    }

    /// Record a reward claim. Returns false if a claim with this id already exists.
    pub async fn insert_claim(&self, claim: &Claim) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO claims (id, farmer, reward_token, amount, block_number, timestamp, tx_hash)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&claim.id)
        .bind(claim.farmer.to_hex())
        .bind(claim.reward_token.to_hex())
        .bind(claim.amount.to_string())
        .bind(claim.block_number as i64)
        .bind(claim.timestamp as i64)
        .bind(claim.tx_hash.to_hex())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_claim(&self, id: &str) -> Result<Option<Claim>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, farmer, reward_token, amount, block_number, timestamp, tx_hash
            FROM claims
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(claim_from_row).transpose()
    }
}

const STAKE_SELECT: &str =
    "SELECT id, farmer, position, reward_token, block_number, timestamp, tx_hash";

/// Column values shared by the `stakes` and `unstakes` tables.
struct StakeRow<'a> {
    id: &'a str,
    farmer: String,
    position: &'a str,
    reward_token: String,
    block_number: i64,
    timestamp: i64,
    tx_hash: String,
}

fn stake_columns(stake: &Stake) -> StakeRow<'_> {
    StakeRow {
        id: &stake.id,
        farmer: stake.farmer.to_hex(),
        position: &stake.position,
        reward_token: stake.reward_token.to_hex(),
        block_number: stake.block_number as i64,
        timestamp: stake.timestamp as i64,
        tx_hash: stake.tx_hash.to_hex(),
    }
}

fn unstake_columns(unstake: &Unstake) -> StakeRow<'_> {
    StakeRow {
        id: &unstake.id,
        farmer: unstake.farmer.to_hex(),
        position: &unstake.position,
        reward_token: unstake.reward_token.to_hex(),
        block_number: unstake.block_number as i64,
        timestamp: unstake.timestamp as i64,
        tx_hash: unstake.tx_hash.to_hex(),
    }
}

fn stake_from_row(row: &SqliteRow) -> Result<Stake, sqlx::Error> {
    Ok(Stake {
        id: row.try_get("id")?,
        farmer: get_address(row, "farmer")?,
        position: row.try_get("position")?,
        reward_token: get_address(row, "reward_token")?,
        block_number: get_u64(row, "block_number")?,
        timestamp: get_u64(row, "timestamp")?,
        tx_hash: get_hash(row, "tx_hash")?,
    })
}

fn unstake_from_row(row: &SqliteRow) -> Result<Unstake, sqlx::Error> {
    Ok(Unstake {
        id: row.try_get("id")?,
        farmer: get_address(row, "farmer")?,
        position: row.try_get("position")?,
        reward_token: get_address(row, "reward_token")?,
        block_number: get_u64(row, "block_number")?,
        timestamp: get_u64(row, "timestamp")?,
        tx_hash: get_hash(row, "tx_hash")?,
    })
}

fn incentive_from_row(row: &SqliteRow) -> Result<Incentive, sqlx::Error> {
    Ok(Incentive {
        id: get_hash(row, "id")?,
        contract: get_address(row, "contract")?,
        reward_token: get_address(row, "reward_token")?,
        pool: get_address(row, "pool")?,
        start_time: get_u256(row, "start_time")?,
        end_time: get_u256(row, "end_time")?,
        refundee: get_address(row, "refundee")?,
        reward: get_u256(row, "reward")?,
        vesting_period: get_u256(row, "vesting_period")?,
        ended: row.try_get("ended")?,
    })
}

fn incentive_position_from_row(row: &SqliteRow) -> Result<IncentivePosition, sqlx::Error> {
    Ok(IncentivePosition {
        id: row.try_get("id")?,
        position: row.try_get("position")?,
        incentive: get_hash(row, "incentive")?,
        claimed: get_u256(row, "claimed")?,
    })
}

fn claim_from_row(row: &SqliteRow) -> Result<Claim, sqlx::Error> {
    Ok(Claim {
        id: row.try_get("id")?,
        farmer: get_address(row, "farmer")?,
        reward_token: get_address(row, "reward_token")?,
        amount: get_u256(row, "amount")?,
        block_number: get_u64(row, "block_number")?,
        timestamp: get_u64(row, "timestamp")?,
        tx_hash: get_hash(row, "tx_hash")?,
    })
}

#[cfg(test)]
mod tests {
    use crate::db::{init_db, Repository};
    use crate::domain::{
        Address, Claim, Hash32, Incentive, IncentivePosition, Stake, TokenId, TxHash, Unstake,
    };
    use alloy::primitives::U256;
    use tempfile::TempDir;

    async fn setup_test_db() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let pool = init_db(db_path.to_str().unwrap()).await.unwrap();
        (Repository::new(pool), temp_dir)
    }

    fn incentive() -> Incentive {
        Incentive {
            id: Hash32::new([0xcc; 32]),
            contract: Address::from_bytes([0x01; 20]),
            reward_token: Address::from_bytes([0x02; 20]),
            pool: Address::from_bytes([0x03; 20]),
            start_time: U256::from(1_700_000_000u64),
            end_time: U256::from(1_700_086_400u64),
            refundee: Address::from_bytes([0x04; 20]),
            reward: U256::from(10u8).pow(U256::from(24u8)),
            vesting_period: U256::from(604_800u64),
            ended: false,
        }
    }

    #[tokio::test]
    async fn test_incentive_round_trip_and_end() {
        let (repo, _temp) = setup_test_db().await;
        let mut stored = incentive();
        repo.save_incentive(&stored).await.unwrap();
        assert_eq!(repo.get_incentive(&stored.id).await.unwrap(), Some(stored.clone()));

        stored.ended = true;
        repo.save_incentive(&stored).await.unwrap();
        assert!(repo.get_incentive(&stored.id).await.unwrap().unwrap().ended);
    }

    #[tokio::test]
    async fn test_incentive_position_insert_if_absent() {
        let (repo, _temp) = setup_test_db().await;
        let ip = IncentivePosition::new(Hash32::new([0xcc; 32]), &TokenId::from(5));

        assert!(repo.insert_incentive_position(&ip).await.unwrap());
        assert!(!repo.insert_incentive_position(&ip).await.unwrap());
        assert_eq!(repo.get_incentive_position(&ip.id).await.unwrap(), Some(ip));
    }

    #[tokio::test]
    async fn test_stake_and_unstake_tables_are_separate() {
        let (repo, _temp) = setup_test_db().await;
        let stake = Stake {
            id: "0xab#0x1".to_string(),
            farmer: Address::from_bytes([0x05; 20]),
            position: "5".to_string(),
            reward_token: Address::from_bytes([0x02; 20]),
            block_number: 100,
            timestamp: 1_000,
            tx_hash: TxHash::new([0xab; 32]),
        };
        assert!(repo.insert_stake(&stake).await.unwrap());
        assert!(!repo.insert_stake(&stake).await.unwrap());
        assert_eq!(repo.get_stake(&stake.id).await.unwrap(), Some(stake.clone()));
        assert_eq!(repo.get_unstake(&stake.id).await.unwrap(), None);

        let unstake = Unstake {
            id: stake.id.clone(),
            farmer: stake.farmer,
            position: stake.position.clone(),
            reward_token: stake.reward_token,
            block_number: 101,
            timestamp: 1_012,
            tx_hash: stake.tx_hash,
        };
        assert!(repo.insert_unstake(&unstake).await.unwrap());
        assert_eq!(repo.get_unstake(&unstake.id).await.unwrap(), Some(unstake));
    }

    #[tokio::test]
    async fn test_claim_keeps_raw_amount() {
        let (repo, _temp) = setup_test_db().await;
        let claim = Claim {
            id: "0xab#0x2".to_string(),
            farmer: Address::from_bytes([0x05; 20]),
            reward_token: Address::from_bytes([0x02; 20]),
            amount: U256::from(123_456_789_000_000_000_000u128),
            block_number: 100,
            timestamp: 1_000,
            tx_hash: TxHash::new([0xab; 32]),
        };
        repo.insert_claim(&claim).await.unwrap();
        let loaded = repo.get_claim(&claim.id).await.unwrap().unwrap();
        assert_eq!(loaded.amount, U256::from(123_456_789_000_000_000_000u128));
    }
}
