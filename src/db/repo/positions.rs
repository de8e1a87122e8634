//! Position and position snapshot operations for the repository.

use crate::domain::{Position, PositionSnapshot};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{get_address, get_decimal, get_hash, get_i256, get_u256, get_u64, Repository};

impl Repository {
    /// Load a position by its token id key.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored column cannot be decoded.
    pub async fn get_position(&self, id: &str) -> Result<Option<Position>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, owner, minter, pool, token0, token1, tick_lower, tick_upper, liquidity,
                   deposited_token0, deposited_token1, withdrawn_token0, withdrawn_token1,
                   collected_fees_token0, collected_fees_token1,
                   fee_growth_inside0_last_x128, fee_growth_inside1_last_x128, transaction_id
            FROM positions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(position_from_row).transpose()
    }

    /// Insert or overwrite a position.
    ///
    /// # Errors
    /// Returns an error if the upsert fails.
    pub async fn save_position(&self, position: &Position) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO positions
            (id, owner, minter, pool, token0, token1, tick_lower, tick_upper, liquidity,
             deposited_token0, deposited_token1, withdrawn_token0, withdrawn_token1,
             collected_fees_token0, collected_fees_token1,
             fee_growth_inside0_last_x128, fee_growth_inside1_last_x128, transaction_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                owner = excluded.owner,
                minter = excluded.minter,
                pool = excluded.pool,
                token0 = excluded.token0,
                token1 = excluded.token1,
                tick_lower = excluded.tick_lower,
                tick_upper = excluded.tick_upper,
                liquidity = excluded.liquidity,
                deposited_token0 = excluded.deposited_token0,
                deposited_token1 = excluded.deposited_token1,
                withdrawn_token0 = excluded.withdrawn_token0,
                withdrawn_token1 = excluded.withdrawn_token1,
                collected_fees_token0 = excluded.collected_fees_token0,
                collected_fees_token1 = excluded.collected_fees_token1,
                fee_growth_inside0_last_x128 = excluded.fee_growth_inside0_last_x128,
                fee_growth_inside1_last_x128 = excluded.fee_growth_inside1_last_x128,
                transaction_id = excluded.transaction_id
            "#,
        )
        .bind(&position.id)
        .bind(position.owner.to_hex())
        .bind(position.minter.to_hex())
        .bind(position.pool.to_hex())
        .bind(position.token0.to_hex())
        .bind(position.token1.to_hex())
        .bind(&position.tick_lower)
        .bind(&position.tick_upper)
        .bind(position.liquidity.to_string())
        .bind(position.deposited_token0.to_canonical_string())
        .bind(position.deposited_token1.to_canonical_string())
        .bind(position.withdrawn_token0.to_canonical_string())
        .bind(position.withdrawn_token1.to_canonical_string())
        .bind(position.collected_fees_token0.to_canonical_string())
        .bind(position.collected_fees_token1.to_canonical_string())
        .bind(position.fee_growth_inside0_last_x128.to_string())
        .bind(position.fee_growth_inside1_last_x128.to_string())
        .bind(position.transaction.to_hex())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Write a snapshot. A snapshot with the same `<position>#<block>` key is replaced.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn save_snapshot(&self, snapshot: &PositionSnapshot) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO position_snapshots
            (id, owner, pool, position, block_number, timestamp, liquidity,
             deposited_token0, deposited_token1, withdrawn_token0, withdrawn_token1,
             collected_fees_token0, collected_fees_token1,
             fee_growth_inside0_last_x128, fee_growth_inside1_last_x128, transaction_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&snapshot.id)
        .bind(snapshot.owner.to_hex())
        .bind(snapshot.pool.to_hex())
        .bind(&snapshot.position)
        .bind(snapshot.block_number as i64)
        .bind(snapshot.timestamp as i64)
        .bind(snapshot.liquidity.to_string())
        .bind(snapshot.deposited_token0.to_canonical_string())
        .bind(snapshot.deposited_token1.to_canonical_string())
        .bind(snapshot.withdrawn_token0.to_canonical_string())
        .bind(snapshot.withdrawn_token1.to_canonical_string())
        .bind(snapshot.collected_fees_token0.to_canonical_string())
        .bind(snapshot.collected_fees_token1.to_canonical_string())
        .bind(snapshot.fee_growth_inside0_last_x128.to_string())
        .bind(snapshot.fee_growth_inside1_last_x128.to_string())
        .bind(snapshot.transaction.to_hex())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_snapshot(&self, id: &str) -> Result<Option<PositionSnapshot>, sqlx::Error> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SNAPSHOT_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(snapshot_from_row).transpose()
    }

    /// All snapshots of a position, oldest block first.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored column cannot be decoded.
    pub async fn query_snapshots_for_position(
        &self,
        position_id: &str,
    ) -> Result<Vec<PositionSnapshot>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "{} WHERE position = ? ORDER BY block_number ASC",
            SNAPSHOT_SELECT
        ))
        .bind(position_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(snapshot_from_row).collect()
    }
}

const SNAPSHOT_SELECT: &str = r#"
    SELECT id, owner, pool, position, block_number, timestamp, liquidity,
           deposited_token0, deposited_token1, withdrawn_token0, withdrawn_token1,
           collected_fees_token0, collected_fees_token1,
           fee_growth_inside0_last_x128, fee_growth_inside1_last_x128, transaction_id
    FROM position_snapshots
"#;

fn position_from_row(row: &SqliteRow) -> Result<Position, sqlx::Error> {
    Ok(Position {
        id: row.try_get("id")?,
        owner: get_address(row, "owner")?,
        minter: get_address(row, "minter")?,
        pool: get_address(row, "pool")?,
        token0: get_address(row, "token0")?,
        token1: get_address(row, "token1")?,
        tick_lower: row.try_get("tick_lower")?,
        tick_upper: row.try_get("tick_upper")?,
        liquidity: get_i256(row, "liquidity")?,
        deposited_token0: get_decimal(row, "deposited_token0")?,
        deposited_token1: get_decimal(row, "deposited_token1")?,
        withdrawn_token0: get_decimal(row, "withdrawn_token0")?,
        withdrawn_token1: get_decimal(row, "withdrawn_token1")?,
        collected_fees_token0: get_decimal(row, "collected_fees_token0")?,
        collected_fees_token1: get_decimal(row, "collected_fees_token1")?,
        fee_growth_inside0_last_x128: get_u256(row, "fee_growth_inside0_last_x128")?,
        fee_growth_inside1_last_x128: get_u256(row, "fee_growth_inside1_last_x128")?,
        transaction: get_hash(row, "transaction_id")?,
    })
}

fn snapshot_from_row(row: &SqliteRow) -> Result<PositionSnapshot, sqlx::Error> {
    Ok(PositionSnapshot {
        id: row.try_get("id")?,
        owner: get_address(row, "owner")?,
        pool: get_address(row, "pool")?,
        position: row.try_get("position")?,
        block_number: get_u64(row, "block_number")?,
        timestamp: get_u64(row, "timestamp")?,
        liquidity: get_i256(row, "liquidity")?,
        deposited_token0: get_decimal(row, "deposited_token0")?,
        deposited_token1: get_decimal(row, "deposited_token1")?,
        withdrawn_token0: get_decimal(row, "withdrawn_token0")?,
        withdrawn_token1: get_decimal(row, "withdrawn_token1")?,
        collected_fees_token0: get_decimal(row, "collected_fees_token0")?,
        collected_fees_token1: get_decimal(row, "collected_fees_token1")?,
        fee_growth_inside0_last_x128: get_u256(row, "fee_growth_inside0_last_x128")?,
        fee_growth_inside1_last_x128: get_u256(row, "fee_growth_inside1_last_x128")?,
        transaction: get_hash(row, "transaction_id")?,
    })
}
