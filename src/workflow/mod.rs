pub mod record_ctx;
pub mod record_flow;

pub use record_ctx::RecordCtx;
pub use record_flow::{classify, RecordFlow, TagResult, ALREADY_PRESENT};
