//! `POST /classify`: classify a layer column and return colored features.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, warn};

use classification::classify;

use crate::assemble::{self, ClassifiedCollection, ColumnValues};
use crate::error::ApiError;
use crate::metrics::{self, OUTCOME_OK};
use crate::request::ClassifyRequest;
use crate::state::AppState;

pub async fn classify_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<ClassifyRequest>, JsonRejection>,
) -> Response {
    let start = Instant::now();
    let result = match payload {
        Ok(Json(request)) => classify_layer(&state, request).await,
        Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
    };

    match result {
        Ok(collection) => {
            metrics::record_classify(OUTCOME_OK, start.elapsed());
            Json(collection).into_response()
        }
        Err(e) => {
            warn!(error = %e, "Classification request failed");
            metrics::record_classify(e.outcome(), start.elapsed());
            e.into_response_with(state.legacy_error_status)
        }
    }
}

/// Validate, fetch, classify and assemble.
///
/// Nothing is fetched unless the request passes validation.
pub async fn classify_layer(
    state: &AppState,
    request: ClassifyRequest,
) -> Result<ClassifiedCollection, ApiError> {
    let method = request.validate()?;

    let collection = state
        .layers
        .fetch_layer(&request.workspace, &request.layername)
        .await?;
    let ColumnValues { rows, values } = assemble::column_values(&collection, &request.column)?;

    let k = request.k_classes;
    let bins = request.bins.clone();
    let classification =
        tokio::task::spawn_blocking(move || classify(&values, method, k, bins.as_deref()))
            .await
            .map_err(|e| ApiError::Preparation(e.to_string()))??;

    info!(
        workspace = %request.workspace,
        layer = %request.layername,
        column = %request.column,
        method = %classification.method(),
        classes = classification.k(),
        values = rows.len(),
        "Classified layer"
    );

    assemble::assemble(collection, &rows, &classification, &request.color)
}
