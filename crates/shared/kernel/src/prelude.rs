pub use crate::security::{Admin, Authenticator, Caller};
pub use crate::server::error::{ApiError, ErrorBody};
pub use crate::server::pagination::{Page, PageQuery};
pub use crate::server::state::ApiState;
