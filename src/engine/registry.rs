//! Load-or-create helpers for identities, token caches and transactions.

use super::Indexer;
use crate::domain::{Address, Erc20Token, EventContext, Identity, Transaction};
use crate::error::LedgerError;
use tracing::debug;

impl Indexer {
    /// Load the identity for `address`, persisting it on first observation. The zero
    /// address is a valid identity (the "nobody" sentinel).
    pub async fn get_or_create_identity(&self, address: Address) -> Result<Identity, LedgerError> {
        if let Some(identity) = self.repo.get_identity(&address).await? {
            return Ok(identity);
        }
        let identity = Identity { id: address };
        self.repo.insert_identity(&identity).await?;
        debug!(address = %address, "Identity registered");
        Ok(identity)
    }

    /// Load the reward-token metadata cache entry, reading it from chain on a miss.
    ///
    /// # Errors
    /// A failed metadata read is an infrastructure error, not a skip.
    pub async fn get_or_create_erc20(
        &self,
        address: Address,
        block: u64,
    ) -> Result<Erc20Token, LedgerError> {
        if let Some(token) = self.repo.get_erc20_token(&address).await? {
            return Ok(token);
        }
        let metadata = self.chain.erc20_metadata(&address, block).await?;
        let token = Erc20Token {
            id: address,
            name: metadata.name,
            symbol: metadata.symbol,
            decimals: metadata.decimals,
        };
        self.repo.insert_erc20_token(&token).await?;
        debug!(token = %address, symbol = %token.symbol, "Reward token cached");
        Ok(token)
    }

    /// Load-or-create the transaction record for the event's enclosing transaction.
    pub async fn load_transaction(&self, ctx: &EventContext) -> Result<Transaction, LedgerError> {
        if let Some(tx) = self.repo.get_transaction(&ctx.tx_hash).await? {
            return Ok(tx);
        }
        let tx = Transaction {
            id: ctx.tx_hash,
            block_number: ctx.block_number,
            timestamp: ctx.block_timestamp,
        };
        self.repo.insert_transaction(&tx).await?;
        Ok(tx)
    }
}
