pub mod config;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod evaluator;
pub mod history;
pub mod session;
pub mod storage;
pub mod typeset;
pub mod value;

// Re-export common types
pub use error::{CalcError, Result};
pub use evaluation::{EvaluationResult, Outcome};
pub use evaluator::ExpressionEvaluator;
pub use history::{HistoryCursor, HistoryLog};
pub use session::{Session, SessionStore, StorePersister};
pub use value::{Scope, Value};
