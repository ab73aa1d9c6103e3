//! # Event Pump
//!
//! Merges the block and transaction notice streams into one sequence and
//! handles each notice to completion before taking the next. A block that
//! arrives while a transaction lookup is in flight waits for that
//! transaction to be tracked and published, so a sighting from before a
//! block can never land in the tracker, or on the wire, after the block's
//! snapshot.

use crate::handlers::{BlockPump, PumpError, TxPump};
use bc_01_chain_cache::ChainCacheApi;
use bc_03_feed::{BlockNotice, TxNotice};
use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use tracing::info;

enum Notice {
    Block(BlockNotice),
    Tx(TxNotice),
    /// The named feed stream ended.
    Closed(&'static str),
}

pub struct EventPump<C: ChainCacheApi> {
    blocks: BlockPump<C>,
    transactions: TxPump,
}

impl<C: ChainCacheApi> EventPump<C> {
    pub fn new(blocks: BlockPump<C>, transactions: TxPump) -> Self {
        Self {
            blocks,
            transactions,
        }
    }

    /// Consume both streams until either ends or a block fails fatally.
    ///
    /// ## Errors
    ///
    /// `StreamClosed` names the stream that ended first. Block failures are
    /// returned as-is; transaction failures never stop the pump.
    pub async fn run(
        mut self,
        blocks: BoxStream<'static, BlockNotice>,
        transactions: BoxStream<'static, TxNotice>,
    ) -> Result<(), PumpError> {
        let blocks = blocks
            .map(Notice::Block)
            .chain(stream::once(future::ready(Notice::Closed("block"))));
        let transactions = transactions
            .map(Notice::Tx)
            .chain(stream::once(future::ready(Notice::Closed("transaction"))));
        let mut notices = stream::select(blocks, transactions);

        info!("Event pump started");
        while let Some(notice) = notices.next().await {
            match notice {
                Notice::Block(notice) => {
                    self.blocks.handle(notice).await?;
                }
                Notice::Tx(notice) => {
                    self.transactions.handle(notice).await;
                }
                Notice::Closed(stream) => return Err(PumpError::StreamClosed { stream }),
            }
        }
        Err(PumpError::StreamClosed { stream: "feed" })
    }
}
