pub mod cdp_portal;
pub mod js_executor;
pub mod portal;

pub use cdp_portal::CdpPortal;
pub use js_executor::JsExecutor;
pub use portal::{frame_named, screenshot_best_effort, Frame, PortalDriver};
