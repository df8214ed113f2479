pub mod error;
pub mod evaluator;
pub mod executor;
pub mod platform;

pub mod test_support;

pub use error::PolicyError;
pub use evaluator::{evaluate, evaluate_detailed, Evaluation};
pub use executor::{ActionExecutor, DeclineReport, StepOutcome};
pub use platform::{Inventory, PlatformError, TradingPlatform};
