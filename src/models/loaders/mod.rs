pub mod selector_loader;

pub use selector_loader::{load_selectors, parse_selectors};
