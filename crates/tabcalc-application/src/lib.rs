pub mod context;

pub use context::{CalculatorContext, ContextOptions};
