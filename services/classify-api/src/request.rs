//! The `/classify` request body and its up-front checks.

use serde::Deserialize;

use classification::{ClassifyError, Method, ParameterKind};

use crate::error::ApiError;

/// Message returned when colors and classes disagree.
pub const COLOR_MISMATCH: &str = "color layers must equal number of classes";

/// Body of `POST /classify`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifyRequest {
    pub layername: String,
    pub workspace: String,
    /// Numeric attribute to classify.
    pub column: String,
    #[serde(rename = "K_classes", default)]
    pub k_classes: Option<usize>,
    pub method: String,
    /// One color per class, in class order.
    pub color: Vec<String>,
    /// Percentiles or bin upper bounds, for `Percentiles` and `UserDefined`.
    #[serde(default)]
    pub bins: Option<Vec<f64>>,
}

impl ClassifyRequest {
    /// Check everything that can be checked without fetching the layer.
    ///
    /// Color counts are compared first, then the method name, then the
    /// parameters the method needs.
    pub fn validate(&self) -> Result<Method, ApiError> {
        let parsed = self.method.parse::<Method>();

        if let Ok(method) = &parsed {
            if method.takes_edges() {
                let bins = self.bins.as_ref().ok_or_else(|| missing(*method, "bins"))?;
                if bins.len() != self.color.len() {
                    return Err(ApiError::Validation(COLOR_MISMATCH.to_string()));
                }
            }
        }

        if let Some(k) = self.k_classes.filter(|k| *k > 0) {
            if k != self.color.len() {
                return Err(ApiError::Validation(COLOR_MISMATCH.to_string()));
            }
        }

        let method = parsed.map_err(|e| ApiError::Validation(e.to_string()))?;
        if method.parameter_kind() == ParameterKind::ClassCount && self.k_classes.is_none() {
            return Err(missing(method, "K_classes"));
        }

        Ok(method)
    }
}

fn missing(method: Method, parameter: &'static str) -> ApiError {
    ApiError::Validation(
        ClassifyError::MissingParameter {
            method: method.as_str(),
            parameter,
        }
        .to_string(),
    )
}
