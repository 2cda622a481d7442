use super::error::ApiError;
use super::state::ApiState;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::Deserialize;
use utoipa::IntoParams;

/// Raw paging parameters as they appear in the query string.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Zero-based page number.
    pub page: Option<u32>,
    /// Rows per page, clamped to the configured maximum.
    pub page_size: Option<u32>,
}

/// Resolved paging window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
}

impl Page {
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.page_size)
    }

    #[must_use]
    pub const fn next(&self) -> Self {
        Self { page: self.page.saturating_add(1), page_size: self.page_size }
    }
}

impl FromRequestParts<ApiState> for Page {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ApiState) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<PageQuery>::try_from_uri(&parts.uri)
            .map_err(|e| ApiError::bad_request(e.body_text()))?;

        Ok(Self {
            page: query.page.unwrap_or_default(),
            page_size: state.config.pagination.page_size(query.page_size),
        })
    }
}
