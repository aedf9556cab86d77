//! `GET /get_columns`: attribute names of a vector layer.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::metrics::{self, OUTCOME_OK};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ColumnsQuery {
    pub workspace: String,
    pub layername: String,
}

pub async fn columns_handler(
    Extension(state): Extension<Arc<AppState>>,
    query: Result<Query<ColumnsQuery>, QueryRejection>,
) -> Response {
    let result = match query {
        Ok(Query(query)) => list_columns(&state, &query).await,
        Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
    };

    match result {
        Ok(columns) => {
            metrics::record_columns(OUTCOME_OK);
            Json(columns).into_response()
        }
        Err(e) => {
            warn!(error = %e, "Column listing failed");
            metrics::record_columns(e.outcome());
            e.into_response_with(state.legacy_error_status)
        }
    }
}

async fn list_columns(state: &AppState, query: &ColumnsQuery) -> Result<Vec<String>, ApiError> {
    let collection = state
        .layers
        .fetch_layer(&query.workspace, &query.layername)
        .await?;
    let columns = collection.columns();
    info!(
        workspace = %query.workspace,
        layer = %query.layername,
        columns = columns.len(),
        "Listed layer columns"
    );
    Ok(columns)
}
