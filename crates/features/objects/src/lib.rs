//! Objects feature slice.
//!
//! CRUD over `macrostrat.objects`, the registry of files kept in object storage.
//! Deletes are soft: rows keep their data and get `deleted_on` set.

mod error;
mod handlers;
mod repository;

pub use crate::error::{ObjectsError, ObjectsErrorExt};
use ingest_domain::registry::{FeatureSlice, InitializedSlice};
use ingest_kernel::prelude::ApiState;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Objects slice state. Stateless; registered so the slice shows up at startup.
#[derive(Debug, Clone, Default)]
pub struct Objects;

impl FeatureSlice for Objects {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Initialize the objects feature.
///
/// # Errors
/// Currently infallible.
pub fn init() -> Result<InitializedSlice, ObjectsError> {
    tracing::info!("Objects slice initialized");
    Ok(InitializedSlice::new("objects", Objects))
}

/// Routes of the objects slice.
pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::list_objects, handlers::create_object))
        .routes(routes!(handlers::get_object, handlers::update_object, handlers::delete_object))
}
