//! Facade crate for the ingest API features and shared modules.
//! Re-exports domain/kernel primitives and aggregates feature initialization.
//! Keep this crate thin: it should compose other crates, not implement business logic.
//!
//! ## Usage
//! - Depend on `ingest` with the slices you need (all are on by default).
//! - Call [`init`] to build the feature slices and [`router`] for their routes.

pub use ingest_database as database;
pub use ingest_domain as domain;
pub use ingest_kernel as kernel;

use ingest_domain::registry::InitializedSlice;
use ingest_kernel::prelude::ApiState;
use utoipa_axum::router::OpenApiRouter;

pub mod server {
    pub mod router {
        pub use ingest_kernel::server::router::system_router;
    }
}

/// Feature registry for runtime introspection.
pub mod features {
    #[cfg(feature = "objects")]
    pub use ingest_objects as objects;
    #[cfg(feature = "security")]
    pub use ingest_security as security;
    #[cfg(feature = "sources")]
    pub use ingest_sources as sources;

    /// Build-time enabled features (by Cargo feature).
    pub const ENABLED: &[&str] = &[
        #[cfg(feature = "sources")]
        "sources",
        #[cfg(feature = "objects")]
        "objects",
        #[cfg(feature = "security")]
        "security",
    ];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}

/// Initialize all enabled features.
///
/// # Errors
/// Returns an error if any feature initialization fails.
pub fn init() -> Result<Vec<InitializedSlice>, Box<dyn std::error::Error + Send + Sync>> {
    #[allow(unused_mut)]
    let mut slices = Vec::new();

    #[cfg(feature = "sources")]
    slices.push(features::sources::init()?);

    #[cfg(feature = "objects")]
    slices.push(features::objects::init()?);

    #[cfg(feature = "security")]
    slices.push(features::security::init()?);

    Ok(slices)
}

/// System routes plus the routes of every enabled feature.
pub fn router() -> OpenApiRouter<ApiState> {
    #[allow(unused_mut)]
    let mut router = server::router::system_router();

    #[cfg(feature = "sources")]
    {
        router = router.merge(features::sources::router());
    }

    #[cfg(feature = "objects")]
    {
        router = router.merge(features::objects::router());
    }

    #[cfg(feature = "security")]
    {
        router = router.merge(features::security::router());
    }

    router
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_features_initialize() {
        let slices = init().expect("slices");
        assert_eq!(slices.len(), features::ENABLED.len());
        for slice in &slices {
            assert!(features::is_enabled(slice.name));
        }
    }

    #[test]
    fn every_enabled_feature_contributes_documented_paths() {
        let (_router, api) = router().split_for_parts();
        assert!(api.paths.paths.contains_key("/health"));
        #[cfg(feature = "sources")]
        assert!(api.paths.paths.contains_key("/sources/{source_id}/polygons"));
        #[cfg(feature = "objects")]
        assert!(api.paths.paths.contains_key("/object/{id}"));
        #[cfg(feature = "security")]
        assert!(api.paths.paths.contains_key("/security/token"));
    }
}
