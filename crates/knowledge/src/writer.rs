//! Single-writer queue in front of an [`IndexStore`].
//!
//! One tokio task owns every write to the index file. Appends and clears are
//! sent to it over a channel and applied strictly one at a time, so each
//! load/modify/save cycle sees the result of the previous one.

use crate::store::IndexStore;
use crate::types::ChunkRecord;
use ragdesk_core::{AppError, AppResult};
use tokio::sync::{mpsc, oneshot};

/// Pending write requests before senders wait.
const WRITE_QUEUE_DEPTH: usize = 64;

enum WriteCommand {
    Append {
        records: Vec<ChunkRecord>,
        reply: oneshot::Sender<AppResult<usize>>,
    },
    Clear {
        reply: oneshot::Sender<AppResult<()>>,
    },
}

/// Handle to the writer task. Cheap to clone; the task stops once every
/// handle is dropped.
#[derive(Debug, Clone)]
pub struct IndexWriter {
    tx: mpsc::Sender<WriteCommand>,
}

impl IndexWriter {
    /// Start the writer task for `store`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(store: IndexStore) -> Self {
        let (tx, rx) = mpsc::channel(WRITE_QUEUE_DEPTH);
        tokio::spawn(run(store, rx));
        Self { tx }
    }

    /// Append records to the index, returning the new record count.
    ///
    /// # Errors
    /// `AppError::Index` if the vectors differ in length from those already
    /// stored (the index is left unchanged) or if the save fails.
    pub async fn append(&self, records: Vec<ChunkRecord>) -> AppResult<usize> {
        let (reply, rx) = oneshot::channel();
        self.send(WriteCommand::Append { records, reply }).await?;
        rx.await.map_err(|_| writer_gone())?
    }

    /// Replace the index with an empty one.
    pub async fn clear(&self) -> AppResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(WriteCommand::Clear { reply }).await?;
        rx.await.map_err(|_| writer_gone())?
    }

    async fn send(&self, command: WriteCommand) -> AppResult<()> {
        self.tx.send(command).await.map_err(|_| writer_gone())
    }
}

fn writer_gone() -> AppError {
    AppError::Index("Index writer is not running".to_string())
}

async fn run(store: IndexStore, mut rx: mpsc::Receiver<WriteCommand>) {
    tracing::debug!("Index writer started for {:?}", store.path());

    while let Some(command) = rx.recv().await {
        match command {
            WriteCommand::Append { records, reply } => {
                let result = append_records(&store, records).await;
                if let Err(e) = &result {
                    tracing::warn!("Index append failed: {}", e);
                }
                let _ = reply.send(result);
            }
            WriteCommand::Clear { reply } => {
                let result = store.save(&[]).await;
                if result.is_ok() {
                    tracing::info!("Cleared index {:?}", store.path());
                }
                let _ = reply.send(result);
            }
        }
    }

    tracing::debug!("Index writer for {:?} stopped", store.path());
}

async fn append_records(store: &IndexStore, records: Vec<ChunkRecord>) -> AppResult<usize> {
    let mut existing = store.load().await;

    let expected = existing
        .first()
        .or_else(|| records.first())
        .map(|record| record.embedding.len());

    if let Some(expected) = expected {
        if let Some(bad) = records.iter().find(|r| r.embedding.len() != expected) {
            return Err(AppError::Index(format!(
                "Embedding dimension mismatch: index uses {}, new record has {}. \
                 Clear the index to switch embedding models.",
                expected,
                bad.embedding.len()
            )));
        }
    }

    let added = records.len();
    existing.extend(records);
    store.save(&existing).await?;

    tracing::info!("Appended {} records, index now holds {}", added, existing.len());
    Ok(existing.len())
}
