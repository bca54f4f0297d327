//! Stats command handler.
//!
//! Reads the index directly so it works without any model credentials.

use clap::Args;
use ragdesk_core::{config::AppConfig, AppResult};
use ragdesk_knowledge::{IndexStats, IndexStore};

/// Show index statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let store = IndexStore::new(config.index_path());
        let stats = store.stats().await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!("Index: {}", store.path().display());
            print!("{}", render(&stats));
        }

        Ok(())
    }
}

fn render(stats: &IndexStats) -> String {
    let dimensions = stats
        .dimensions
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());
    let modified = stats
        .modified_at
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());

    format!(
        "Chunks:     {}\nFiles:      {}\nDimensions: {}\nSize:       {} bytes\nModified:   {}\n",
        stats.chunks, stats.files, dimensions, stats.index_bytes, modified
    )
}
