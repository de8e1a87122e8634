use super::Indexer;
use crate::domain::{EventContext, Position, PositionSnapshot};
use crate::error::LedgerError;

impl Indexer {
    /// Record the position's state as of this event's block.
    ///
    /// Keyed `<positionId>#<blockNumber>`: a second mutation in the same block
    /// replaces the earlier snapshot.
    pub async fn append_snapshot(
        &self,
        position: &Position,
        ctx: &EventContext,
    ) -> Result<PositionSnapshot, LedgerError> {
        let tx = self.load_transaction(ctx).await?;
        let snapshot =
            PositionSnapshot::capture(position, ctx.block_number, ctx.block_timestamp, tx.id);
        self.repo.save_snapshot(&snapshot).await?;
        Ok(snapshot)
    }
}
