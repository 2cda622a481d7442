pub mod error;
pub mod health;
pub mod pagination;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use state::{ApiState, ApiStateBuilder, ApiStateError};
