//! Command-line surface for `grid`.

use std::path::PathBuf;

use anyhow::bail;
use clap::{ArgAction, Parser, Subcommand};
use gridapi::{FileExportMode, PointcloudExportOptions, Terrain};

#[derive(Parser, Debug)]
#[command(name = "grid", version, about = "Command-line client for the GRiD AOI API", long_about = None)]
pub struct Cli {
    /// GRiD base URL (overrides GRID_URL and the credentials file)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Per-request timeout in seconds
    #[arg(long, global = true, value_name = "SECS", default_value_t = 60)]
    pub timeout: u64,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add an AOI for each geometry, named after its suggested geoname
    Add {
        #[arg(required = true, value_name = "WKT")]
        geoms: Vec<String>,
    },
    /// Store GRiD credentials in ~/.grid/config.json
    Configure {
        /// Only update the base URL
        #[arg(short = 'b', long = "base-url", alias = "base_url", value_name = "URL")]
        base_url: Option<String>,
        /// Only update the API key
        #[arg(short, long)]
        key: Option<String>,
    },
    /// Initiate a point-cloud export of collects within an AOI
    Export(ExportArgs),
    /// Suggest a name for each geometry
    Lookup {
        #[arg(required = true, value_name = "WKT")]
        geoms: Vec<String>,
    },
    /// List AOIs, or show AOI/export details for primary keys
    Ls {
        #[arg(value_name = "PK")]
        pks: Vec<String>,
        /// Primary key to show; may be repeated and mixed with positional keys
        #[arg(long = "pk", value_name = "PK")]
        pk: Vec<i64>,
        /// Only AOIs intersecting this WKT geometry
        #[arg(long, value_name = "WKT", conflicts_with_all = ["pks", "pk"])]
        geom: Option<String>,
    },
    /// Download export files by primary key
    Pull {
        #[arg(required = true, value_name = "PK")]
        pks: Vec<i64>,
        /// Directory to write into
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        /// Do not draw a progress bar
        #[arg(long)]
        no_progress: bool,
    },
    /// Show the state of export tasks
    Task {
        #[arg(required = true, value_name = "TASK_ID")]
        ids: Vec<String>,
    },
    /// Print the version
    Version,
}

#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// AOI primary key; without it the first positional argument is the AOI
    #[arg(long = "pk", value_name = "PK")]
    pub pk: Option<i64>,
    /// `[AOI] COLLECT...`
    #[arg(required = true, value_name = "ARGS")]
    pub targets: Vec<String>,
    /// Leave intensity out of the exported points
    #[arg(long)]
    pub no_intensity: bool,
    /// Leave classification out of the exported points
    #[arg(long)]
    pub no_classification: bool,
    /// Horizontal spatial reference (EPSG code)
    #[arg(long)]
    pub hsrs: Option<String>,
    /// individual or collect
    #[arg(long, default_value = "individual")]
    pub mode: FileExportMode,
    #[arg(long, default_value = "las12")]
    pub format: String,
    #[arg(long)]
    pub uncompressed: bool,
    #[arg(long)]
    pub send_email: bool,
    /// Also generate a DEM
    #[arg(long)]
    pub generate_dem: bool,
    /// DEM cell spacing
    #[arg(long, default_value_t = 1.0, requires = "generate_dem")]
    pub cell_spacing: f64,
    /// urban, mountainous, suburban or foliated
    #[arg(long)]
    pub terrain: Option<Terrain>,
    #[arg(long)]
    pub sri_hres: Option<f64>,
    #[arg(long)]
    pub decimation_radius: Option<f64>,
    #[arg(long)]
    pub retile_size: Option<f64>,
    #[arg(long)]
    pub retile_area: Option<f64>,
}

impl ExportArgs {
    /// The AOI key and the collects to export.
    pub fn target(&self) -> anyhow::Result<(i64, &[String])> {
        let (aoi, collects) = match self.pk {
            Some(pk) => (pk, self.targets.as_slice()),
            None => {
                let (first, rest) = self
                    .targets
                    .split_first()
                    .ok_or_else(|| anyhow::anyhow!("Please provide an AOI"))?;
                let pk: i64 = first.trim().parse().map_err(|_| {
                    anyhow::anyhow!("Error parsing {first:?}; provide the AOI primary key as an integer")
                })?;
                (pk, rest)
            }
        };
        if collects.is_empty() {
            bail!("Please provide a collect");
        }
        Ok((aoi, collects))
    }

    pub fn options(&self) -> PointcloudExportOptions {
        PointcloudExportOptions {
            intensity: !self.no_intensity,
            dim_classification: !self.no_classification,
            hsrs: self.hsrs.clone(),
            file_export_options: self.mode,
            file_export_format: self.format.clone(),
            compressed: !self.uncompressed,
            send_email: self.send_email,
            generate_dem: self.generate_dem,
            cell_spacing: self.cell_spacing,
            pcl_terrain: self.terrain,
            sri_hres: self.sri_hres,
            decimation_radius: self.decimation_radius,
            retile_size: self.retile_size,
            retile_area: self.retile_area,
        }
    }
}
