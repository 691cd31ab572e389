//! Tutorín orchestrator
//!
//! Ties the step engines, the progress store and the hint selector into the
//! per-turn tutoring protocol, and serves it over HTTP.

pub mod answer;
pub mod api;
pub mod config;
pub mod error;
pub mod hints;
pub mod nlu;
pub mod session;

pub use api::{
    create_router, AnalyzeRequest, AnalyzeResponse, AppState, ErrorResponse, HistoryQuery,
    HistoryResponse, RootResponse,
};
pub use config::{Config, HintsConfig, HistoryConfig, CONFIG_FILE_NAME};
pub use error::{HintBackendError, Result, TutorError};
pub use hints::{HintBackend, HintKey, HintRequest, HintSelector, OpenAiBackend, Tier};
pub use nlu::{classify, Nlu};
pub use session::{SolveRequest, SolveResponse, SolveStatus, Tutor};
