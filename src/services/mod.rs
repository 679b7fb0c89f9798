pub mod auth_service;
pub mod input_service;
pub mod session_store;

pub use auth_service::{AuthService, AuthState};
pub use input_service::{parse_identifiers, InputService};
pub use session_store::SessionStore;
