//! Command handlers for the ragdesk CLI.

pub mod ask;
pub mod clear;
pub mod serve;
pub mod stats;
pub mod upload;

pub use ask::AskCommand;
pub use clear::ClearCommand;
pub use serve::ServeCommand;
pub use stats::StatsCommand;
pub use upload::UploadCommand;
