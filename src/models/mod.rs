pub mod loaders;
pub mod record;
pub mod selectors;
pub mod session;
pub mod tag;

pub use loaders::load_selectors;
pub use record::{BatchReport, RecordOutcome, RecordStatus};
pub use selectors::{FrameSelectors, LoginSelectors, RecordSelectors, Selectors};
pub use session::{SessionSnapshot, StoredCookie};
pub use tag::Tag;
