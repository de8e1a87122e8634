//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all keyed entity loads and saves.
//! Methods are organized across submodules by domain:
//! - `mod.rs` - identities, token caches, pools, transactions
//! - `positions.rs` - positions and position snapshots
//! - `staking.rs` - incentives, incentive positions, stakes, unstakes, claims

mod positions;
mod staking;

use crate::domain::{
    primitives::parse_u256, Address, Decimal, Erc20Token, Hash32, Identity, Pool, Token,
    Transaction, TxHash,
};
use alloy::primitives::{I256, U256};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::fmt;

/// Row counts per entity kind, for ingestion summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityCounts {
    pub identities: i64,
    pub pools: i64,
    pub positions: i64,
    pub snapshots: i64,
    pub incentives: i64,
    pub stakes: i64,
    pub unstakes: i64,
    pub claims: i64,
}

/// Repository for database operations.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    // =========================================================================
    // Identity operations
    // =========================================================================

    pub async fn get_identity(&self, id: &Address) -> Result<Option<Identity>, sqlx::Error> {
        let row = sqlx::query("SELECT id FROM identities WHERE id = ?")
            .bind(id.to_hex())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref()
            .map(|r| get_address(r, "id").map(|id| Identity { id }))
            .transpose()
    }

    /// Insert an identity if absent. Returns true if a row was created.
    pub async fn insert_identity(&self, identity: &Identity) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("INSERT INTO identities (id) VALUES (?) ON CONFLICT(id) DO NOTHING")
            .bind(identity.id.to_hex())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Token operations
    // =========================================================================

    pub async fn get_token(&self, id: &Address) -> Result<Option<Token>, sqlx::Error> {
        let row = sqlx::query("SELECT id, symbol, name, decimals FROM tokens WHERE id = ?")
            .bind(id.to_hex())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(token_from_row).transpose()
    }

    pub async fn insert_token(&self, token: &Token) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO tokens (id, symbol, name, decimals)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(token.id.to_hex())
        .bind(&token.symbol)
        .bind(&token.name)
        .bind(i64::from(token.decimals))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_erc20_token(&self, id: &Address) -> Result<Option<Erc20Token>, sqlx::Error> {
        let row = sqlx::query("SELECT id, name, symbol, decimals FROM erc20_tokens WHERE id = ?")
            .bind(id.to_hex())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(erc20_token_from_row).transpose()
    }

    pub async fn insert_erc20_token(&self, token: &Erc20Token) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO erc20_tokens (id, name, symbol, decimals)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(token.id.to_hex())
        .bind(&token.name)
        .bind(&token.symbol)
        .bind(i64::from(token.decimals))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Pool operations
    // =========================================================================

    pub async fn get_pool(&self, id: &Address) -> Result<Option<Pool>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, token0, token1, fee_tier, tick_spacing, created_at_block
            FROM pools
            WHERE id = ?
            "#,
        )
        .bind(id.to_hex())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(pool_from_row).transpose()
    }

    pub async fn insert_pool(&self, pool: &Pool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO pools (id, token0, token1, fee_tier, tick_spacing, created_at_block)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(pool.id.to_hex())
        .bind(pool.token0.to_hex())
        .bind(pool.token1.to_hex())
        .bind(i64::from(pool.fee_tier))
        .bind(i64::from(pool.tick_spacing))
        .bind(pool.created_at_block as i64)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Transaction operations
    // =========================================================================

    pub async fn get_transaction(&self, id: &TxHash) -> Result<Option<Transaction>, sqlx::Error> {
        let row = sqlx::query("SELECT id, block_number, timestamp FROM transactions WHERE id = ?")
            .bind(id.to_hex())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(transaction_from_row).transpose()
    }

    pub async fn insert_transaction(&self, tx: &Transaction) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO transactions (id, block_number, timestamp)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(tx.id.to_hex())
        .bind(tx.block_number as i64)
        .bind(tx.timestamp as i64)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Summary
    // =========================================================================

    pub async fn entity_counts(&self) -> Result<EntityCounts, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM identities) AS identities,
                (SELECT COUNT(*) FROM pools) AS pools,
                (SELECT COUNT(*) FROM positions) AS positions,
                (SELECT COUNT(*) FROM position_snapshots) AS snapshots,
                (SELECT COUNT(*) FROM incentives) AS incentives,
                (SELECT COUNT(*) FROM stakes) AS stakes,
                (SELECT COUNT(*) FROM unstakes) AS unstakes,
                (SELECT COUNT(*) FROM claims) AS claims
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(EntityCounts {
            identities: row.try_get("identities")?,
            pools: row.try_get("pools")?,
            positions: row.try_get("positions")?,
            snapshots: row.try_get("snapshots")?,
            incentives: row.try_get("incentives")?,
            stakes: row.try_get("stakes")?,
            unstakes: row.try_get("unstakes")?,
            claims: row.try_get("claims")?,
        })
    }
}

// =============================================================================
// Row decoding
// =============================================================================

fn token_from_row(row: &SqliteRow) -> Result<Token, sqlx::Error> {
    Ok(Token {
        id: get_address(row, "id")?,
        symbol: row.try_get("symbol")?,
        name: row.try_get("name")?,
        decimals: get_u8(row, "decimals")?,
    })
}

fn erc20_token_from_row(row: &SqliteRow) -> Result<Erc20Token, sqlx::Error> {
    Ok(Erc20Token {
        id: get_address(row, "id")?,
        name: row.try_get("name")?,
        symbol: row.try_get("symbol")?,
        decimals: get_u8(row, "decimals")?,
    })
}

fn pool_from_row(row: &SqliteRow) -> Result<Pool, sqlx::Error> {
    let fee_tier: i64 = row.try_get("fee_tier")?;
    let tick_spacing: i64 = row.try_get("tick_spacing")?;
    Ok(Pool {
        id: get_address(row, "id")?,
        token0: get_address(row, "token0")?,
        token1: get_address(row, "token1")?,
        fee_tier: u32::try_from(fee_tier)
            .map_err(|e| decode_error("fee_tier", &fee_tier.to_string(), e))?,
        tick_spacing: i32::try_from(tick_spacing)
            .map_err(|e| decode_error("tick_spacing", &tick_spacing.to_string(), e))?,
        created_at_block: get_u64(row, "created_at_block")?,
    })
}

fn transaction_from_row(row: &SqliteRow) -> Result<Transaction, sqlx::Error> {
    Ok(Transaction {
        id: get_hash(row, "id")?,
        block_number: get_u64(row, "block_number")?,
        timestamp: get_u64(row, "timestamp")?,
    })
}

fn decode_error(column: &str, value: &str, err: impl fmt::Display) -> sqlx::Error {
    sqlx::Error::Decode(format!("column {}: invalid value {:?}: {}", column, value, err).into())
}

fn get_address(row: &SqliteRow, column: &str) -> Result<Address, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    Address::parse(&raw).map_err(|e| decode_error(column, &raw, e))
}

fn get_hash(row: &SqliteRow, column: &str) -> Result<Hash32, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    Hash32::parse(&raw).map_err(|e| decode_error(column, &raw, e))
}

fn get_u256(row: &SqliteRow, column: &str) -> Result<U256, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    parse_u256(&raw).map_err(|e| decode_error(column, &raw, e))
}

fn get_i256(row: &SqliteRow, column: &str) -> Result<I256, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    I256::from_dec_str(&raw).map_err(|e| decode_error(column, &raw, e))
}

fn get_decimal(row: &SqliteRow, column: &str) -> Result<Decimal, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str_canonical(&raw).map_err(|e| decode_error(column, &raw, e))
}

fn get_u64(row: &SqliteRow, column: &str) -> Result<u64, sqlx::Error> {
    let raw: i64 = row.try_get(column)?;
    u64::try_from(raw).map_err(|e| decode_error(column, &raw.to_string(), e))
}

fn get_u8(row: &SqliteRow, column: &str) -> Result<u8, sqlx::Error> {
    let raw: i64 = row.try_get(column)?;
    u8::try_from(raw).map_err(|e| decode_error(column, &raw.to_string(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use tempfile::TempDir;

    async fn setup_test_db() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let pool = init_db(db_path.to_str().unwrap()).await.unwrap();
        (Repository::new(pool), temp_dir)
    }

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    #[tokio::test]
    async fn test_identity_insert_is_idempotent() {
        let (repo, _temp) = setup_test_db().await;
        let identity = Identity { id: Address::ZERO };

        assert!(repo.insert_identity(&identity).await.unwrap());
        assert!(!repo.insert_identity(&identity).await.unwrap());
        assert_eq!(repo.get_identity(&Address::ZERO).await.unwrap(), Some(identity));
        assert_eq!(repo.get_identity(&addr(1)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_token_round_trip() {
        let (repo, _temp) = setup_test_db().await;
        let token = Token {
            id: addr(1),
            symbol: "USDC".to_string(),
            name: "USD Coin".to_string(),
            decimals: 6,
        };
        repo.insert_token(&token).await.unwrap();
        assert_eq!(repo.get_token(&addr(1)).await.unwrap(), Some(token));
        assert_eq!(repo.get_erc20_token(&addr(1)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_pool_round_trip() {
        let (repo, _temp) = setup_test_db().await;
        let pool = Pool {
            id: addr(9),
            token0: addr(1),
            token1: addr(2),
            fee_tier: 3000,
            tick_spacing: 60,
            created_at_block: 12_369_739,
        };
        repo.insert_pool(&pool).await.unwrap();
        assert_eq!(repo.get_pool(&addr(9)).await.unwrap(), Some(pool));
    }

    #[tokio::test]
    async fn test_transaction_first_write_wins() {
        let (repo, _temp) = setup_test_db().await;
        let id = TxHash::new([7; 32]);
        repo.insert_transaction(&Transaction {
            id,
            block_number: 10,
            timestamp: 100,
        })
        .await
        .unwrap();
        repo.insert_transaction(&Transaction {
            id,
            block_number: 11,
            timestamp: 111,
        })
        .await
        .unwrap();

        let tx = repo.get_transaction(&id).await.unwrap().unwrap();
        assert_eq!(tx.block_number, 10);
    }

    #[tokio::test]
    async fn test_entity_counts_empty() {
        let (repo, _temp) = setup_test_db().await;
        assert_eq!(repo.entity_counts().await.unwrap(), EntityCounts::default());
    }
}
