pub mod config;
pub mod dispatcher;
pub mod ingest;
pub mod logging;
pub mod rag;
pub mod tui;

pub use config::{ApiKey, Config, ConfigBuilder, ConfigError, PageConfig, TextDirection};
pub use dispatcher::{DispatchState, LoadOutcome, Outcome, QueryDispatcher};
pub use ingest::{IngestError, IngestReport};
pub use rag::{DataType, RagClient, RagClientBuilder, RagError, RagService};
