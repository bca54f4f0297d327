//! Serve command handler.

use crate::server;
use clap::Args;
use ragdesk_core::{config::AppConfig, AppResult};
use ragdesk_knowledge::RagPipeline;
use std::sync::Arc;

/// Run the HTTP server
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Socket address to listen on (overrides config)
    #[arg(short, long, env = "RAGDESK_BIND")]
    pub bind: Option<String>,
}

impl ServeCommand {
    pub async fn execute(&self, mut config: AppConfig) -> AppResult<()> {
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }

        let pipeline = Arc::new(RagPipeline::from_config(&config)?);
        server::serve(pipeline, &config.server).await
    }
}
