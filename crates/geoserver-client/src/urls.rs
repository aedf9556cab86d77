//! URL construction for OGC services and the GeoServer REST API.

use reqwest::Url;

use crate::error::{GeoServerError, GeoServerResult};

/// Reject names that would escape their path segment or query value.
pub fn validate_name(kind: &'static str, value: &str) -> GeoServerResult<()> {
    if value.is_empty() || value.contains(|c: char| matches!(c, '/' | '?' | '#' | ':')) {
        return Err(GeoServerError::InvalidName {
            kind,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Append path segments to the base URL.
pub fn join_segments(base: &Url, segments: &[&str]) -> GeoServerResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| GeoServerError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// WFS 1.0.0 GetFeature URL returning the layer as GeoJSON.
pub fn vector_layer_url(base: &Url, workspace: &str, layer: &str) -> GeoServerResult<Url> {
    validate_name("workspace", workspace)?;
    validate_name("layer", layer)?;

    let mut url = join_segments(base, &[workspace, "ows"])?;
    url.query_pairs_mut()
        .append_pair("service", "WFS")
        .append_pair("version", "1.0.0")
        .append_pair("request", "GetFeature")
        .append_pair("typeName", &format!("{workspace}:{layer}"))
        .append_pair("outputFormat", "application/json");
    Ok(url)
}

/// GDAL WCS connection string for a raster layer.
pub fn wcs_coverage_url(base: &Url, workspace: &str, layer: &str) -> GeoServerResult<String> {
    validate_name("workspace", workspace)?;
    validate_name("layer", layer)?;

    let base = base.as_str().trim_end_matches('/');
    Ok(format!(
        "WCS:{base}/wcs?service=WCS&version=1.0.0&request=GetCoverage\
         &coverage={workspace}:{layer}&format=GeoTIFF"
    ))
}

/// `{base}/rest/workspaces/{workspace}/...`
pub fn rest_url(base: &Url, workspace: &str, rest: &[&str]) -> GeoServerResult<Url> {
    validate_name("workspace", workspace)?;
    let mut segments = vec!["rest", "workspaces", workspace];
    segments.extend_from_slice(rest);
    join_segments(base, &segments)
}
