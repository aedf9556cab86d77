//! Command-line access to the GeoServer operations used by the
//! classification service and by data publishing scripts.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use geoserver_client::{
    zip_shapefile, CoverageStoreRequest, GeoServerArgs, GeoServerClient, LayerSource,
    UploadMethod,
};

#[derive(Parser)]
#[command(name = "geoserver-cli")]
#[command(about = "Publish and inspect GeoServer layers", long_about = None)]
struct Cli {
    #[command(flatten)]
    geoserver: GeoServerArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the WFS GetFeature URL of a vector layer
    WfsUrl {
        #[arg(short, long)]
        workspace: String,
        #[arg(short, long)]
        layer: String,
    },

    /// Print the GDAL WCS connection string of a raster layer
    WcsUrl {
        #[arg(short, long)]
        workspace: String,
        #[arg(short, long)]
        layer: String,
    },

    /// List the attribute columns of a vector layer
    Columns {
        #[arg(short, long)]
        workspace: String,
        #[arg(short, long)]
        layer: String,
    },

    /// Create a coverage store from a raster file or location
    CreateCoverageStore {
        /// File path (method=file) or URL / server path
        path: String,
        #[arg(short, long)]
        workspace: Option<String>,
        /// Store name (defaults to the file stem)
        #[arg(short, long)]
        layer: Option<String>,
        #[arg(long, default_value = "GeoTIFF")]
        file_type: String,
        #[arg(long, default_value = "image/tiff")]
        content_type: String,
        #[arg(long, value_enum, default_value_t = UploadMethod::File)]
        method: UploadMethod,
    },

    /// Upload a GeoTIFF into a coverage store and publish it
    UploadRaster {
        #[arg(short, long)]
        workspace: String,
        #[arg(short, long)]
        store: String,
        #[arg(short, long)]
        layer: String,
        file: PathBuf,
    },

    /// Set the SRS of a published coverage
    SetCrs {
        #[arg(short, long)]
        workspace: String,
        #[arg(short, long)]
        store: String,
        #[arg(short, long)]
        layer: String,
        /// e.g. EPSG:4326
        #[arg(long)]
        srs: String,
    },

    /// Zip the shapefile components found in a directory
    ZipShapefile {
        dir: PathBuf,
        /// Output archive (defaults to <dir>/output.zip)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Upload a zipped shapefile into a datastore
    UploadShapefile {
        #[arg(short, long)]
        workspace: String,
        #[arg(short, long)]
        datastore: String,
        zip: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = cli.geoserver.to_config().context("Invalid GeoServer configuration")?;
    let client = GeoServerClient::new(config)?;

    match cli.command {
        Commands::WfsUrl { workspace, layer } => {
            println!("{}", client.vector_layer_url(&workspace, &layer)?);
        }
        Commands::WcsUrl { workspace, layer } => {
            println!("{}", client.wcs_coverage_url(&workspace, &layer)?);
        }
        Commands::Columns { workspace, layer } => {
            let collection = client.fetch_layer(&workspace, &layer).await?;
            println!("{}", serde_json::to_string_pretty(&collection.columns())?);
        }
        Commands::CreateCoverageStore {
            path,
            workspace,
            layer,
            file_type,
            content_type,
            method,
        } => {
            let request = CoverageStoreRequest {
                path,
                workspace,
                layer_name: layer,
                file_type,
                content_type,
                method,
            };
            let store = client.create_coverage_store(&request).await?;
            println!("Created coverage store '{}'", store);
        }
        Commands::UploadRaster {
            workspace,
            store,
            layer,
            file,
        } => {
            let status = client
                .upload_raster(&workspace, &store, &layer, &file)
                .await
                .with_context(|| format!("Error uploading {}", file.display()))?;
            println!("Uploaded raster (HTTP {})", status);
        }
        Commands::SetCrs {
            workspace,
            store,
            layer,
            srs,
        } => {
            let status = client.set_crs(&workspace, &store, &layer, &srs).await?;
            println!("Set SRS to {} (HTTP {})", srs, status);
        }
        Commands::ZipShapefile { dir, output } => {
            let output = output.unwrap_or_else(|| dir.join("output.zip"));
            let count = tokio::task::spawn_blocking({
                let output = output.clone();
                move || zip_shapefile(&dir, &output)
            })
            .await??;
            println!("Wrote {} files to {}", count, output.display());
        }
        Commands::UploadShapefile {
            workspace,
            datastore,
            zip,
        } => {
            let status = client
                .upload_shapefile(&workspace, &datastore, &zip)
                .await
                .with_context(|| format!("cannot upload the shapefile {}", zip.display()))?;
            println!("Uploaded shapefile (HTTP {})", status);
        }
    }

    Ok(())
}
