//! Wire and row models.
//!
//! Row types derive `sqlx::FromRow` only when the `db` feature is enabled so that
//! consumers without a database (tests, clients) stay free of `sqlx`.

pub mod object;
pub mod security;
pub mod source;

pub use object::{ObjectRecord, ObjectCreate, ObjectUpdate, Scheme};
pub use security::{AuthClaims, GroupsResponse, TokenRequest, TokenResponse};
pub use source::{CopyColumnRequest, PolygonRow, PolygonUpdate, Source};
