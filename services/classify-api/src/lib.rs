//! Layer classification service library.
//!
//! Fetches a vector layer from GeoServer, classifies one numeric column
//! into ordered classes and returns the features as GeoJSON carrying their
//! class, range and color.

pub mod assemble;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod request;
pub mod routes;
pub mod state;
