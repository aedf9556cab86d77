//! GeoServer client.
//!
//! Fetches vector layers through WFS GetFeature (as GeoJSON), builds WCS
//! connection strings for raster layers, and drives the GeoServer REST API
//! to publish rasters and shapefiles.

pub mod client;
pub mod config;
pub mod error;
pub mod features;
pub mod rest;
pub mod shapefile;
pub mod urls;

pub use client::{decode_feature_collection, GeoServerClient, LayerSource};
pub use config::{GeoServerArgs, GeoServerConfig};
pub use error::{GeoServerError, GeoServerResult};
pub use features::{Feature, FeatureCollection, GEOMETRY_COLUMN};
pub use rest::{CoverageStoreRequest, UploadMethod};
pub use shapefile::zip_shapefile;
