//! Ask command handler.

use clap::Args;
use ragdesk_core::{config::AppConfig, AppResult};
use ragdesk_knowledge::types::DEFAULT_TOP_K;
use ragdesk_knowledge::{AskRequest, AskResponse, RagPipeline};

/// Ask a question against the index
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Number of passages to retrieve (clamped to 1..=10)
    #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: i64,

    /// Answer from the documents only
    #[arg(long)]
    pub no_general: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let pipeline = RagPipeline::from_config(config)?;
        let request = AskRequest::new(self.question.clone())
            .with_top_k(self.top_k)
            .with_general_knowledge(!self.no_general);

        let response = pipeline.ask(request).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&response)?);
        } else {
            print!("{}", render(&response));
        }

        Ok(())
    }
}

fn render(response: &AskResponse) -> String {
    let mut out = format!("{}\n", response.answer);

    if !response.sources.is_empty() {
        out.push_str("\nSources:\n");
        for source in &response.sources {
            out.push_str(&format!(
                "  {} {} ({:.3}): {}\n",
                source.marker, source.file_name, source.score, source.preview
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragdesk_knowledge::Citation;

    #[test]
    fn test_render_lists_sources() {
        let response = AskResponse {
            answer: "Ferritin is low [1].".to_string(),
            sources: vec![Citation {
                marker: "[1]".to_string(),
                file_name: "iron.txt".to_string(),
                preview: "Ferritin 12 ng/mL".to_string(),
                score: 0.912,
            }],
            used_general_knowledge: true,
        };

        assert_eq!(
            render(&response),
            "Ferritin is low [1].\n\nSources:\n  [1] iron.txt (0.912): Ferritin 12 ng/mL\n"
        );
    }
}
