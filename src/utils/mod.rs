pub mod logging;
pub mod retry;
pub mod strategy;

pub use retry::{RetryConfig, RetryPolicy};
