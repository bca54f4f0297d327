//! Clear command handler.

use clap::Args;
use ragdesk_core::{config::AppConfig, AppResult};
use ragdesk_knowledge::{IndexStore, IndexWriter};

/// Remove every indexed chunk
#[derive(Args, Debug)]
pub struct ClearCommand {}

impl ClearCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing clear command");

        let store = IndexStore::new(config.index_path());
        let before = store.stats().await.chunks;

        IndexWriter::spawn(store).clear().await?;

        println!("Removed {} chunks", before);
        Ok(())
    }
}
