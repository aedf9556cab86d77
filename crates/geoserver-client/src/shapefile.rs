//! Packaging shapefiles for datastore upload.

use std::fs::File;
use std::io;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::GeoServerResult;

/// Shapefile component extensions GeoServer expects in the archive.
pub const SHAPEFILE_EXTENSIONS: [&str; 5] = ["shp", "shx", "dbf", "prj", "cpg"];

fn is_shapefile_component(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SHAPEFILE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Zip every shapefile component found under `dir` into `zip_path`.
///
/// Entries are stored under their base names. Returns the number of files
/// written.
pub fn zip_shapefile(dir: &Path, zip_path: &Path) -> GeoServerResult<usize> {
    let file = File::create(zip_path)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut written = 0;
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || !is_shapefile_component(path) {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        debug!(file = %path.display(), "Adding to shapefile archive");
        writer.start_file(name, options)?;
        let mut source = File::open(path)?;
        io::copy(&mut source, &mut writer)?;
        written += 1;
    }

    writer.finish()?;
    Ok(written)
}
