use std::path::PathBuf;

/// Voter-to-parcel linkage CLI (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "parcelvote", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Geocode active voters by exact address match
    Geocode(RunArgs),

    /// Geocode, join voters to parcels, and combine counties
    Join(ResumeArgs),

    /// Run the full pipeline, including derived metrics and the summary report
    Analyze(ResumeArgs),

    /// Print the canonical lookup key for each address
    Normalize(NormalizeArgs),
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Pipeline configuration file (JSON)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Read at most this many voters per county (quick test)
    #[arg(short, long)]
    pub limit: Option<usize>,
}

#[derive(clap::Args, Debug)]
pub struct ResumeArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Start from an earlier run's outputs: the directory holding
    /// `<county>_voters_geocoded.geojson` for join, the combined GeoJSON for analyze
    #[arg(long, value_hint = clap::ValueHint::AnyPath)]
    pub from: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct NormalizeArgs {
    /// Raw street addresses
    #[arg(required = true)]
    pub addresses: Vec<String>,
}
