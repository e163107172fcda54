use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "sensorfeed",
    version,
    about = "Stream, quantise and pool sensor CSV data for on-device inference",
    long_about = "Stream comma-separated sensor recordings into channel-major windows,\n\
                  quantise them to uint8 the way TFLite Micro inputs expect,\n\
                  and average-pool per-window feature vectors."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check a CSV file against an expected column count and summarise it
    Inspect(InspectArgs),
    /// Stream a CSV file into ring windows and print each full window
    Stream(StreamArgs),
    /// Average-pool the rows of a feature CSV into one vector
    Pool(PoolArgs),
    /// Inspect many CSV files in parallel
    Batch(BatchArgs),
}

#[derive(Args)]
pub struct InspectArgs {
    /// Input CSV file path
    #[arg(long)]
    pub file: String,

    /// Expected number of columns
    #[arg(long)]
    pub columns: usize,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct StreamArgs {
    /// Dispenser configuration as JSON (path, columns, rows, quantisation)
    #[arg(long, env = "SENSORFEED_CONFIG")]
    pub config: Option<String>,

    /// Input CSV file path (overrides the config)
    #[arg(long)]
    pub file: Option<String>,

    /// Number of columns per row (overrides the config)
    #[arg(long)]
    pub columns: Option<usize>,

    /// Rows per window (overrides the config)
    #[arg(long)]
    pub rows: Option<usize>,

    /// Quantisation scale (overrides the config)
    #[arg(long)]
    pub scale: Option<f32>,

    /// Quantisation zero point (overrides the config)
    #[arg(long, allow_hyphen_values = true)]
    pub zero_point: Option<i32>,

    /// Destinations to fill: float, quantized or both
    #[arg(long, default_value = "float")]
    pub format: String,

    /// Stop after this many full windows
    #[arg(long)]
    pub max_windows: Option<usize>,

    /// Skip malformed rows instead of failing
    #[arg(long, default_value_t = false)]
    pub skip_malformed: bool,

    /// Read the file through a memory map
    #[arg(long, default_value_t = false)]
    pub mmap: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Compact JSON output (no indentation)
    #[arg(long, default_value_t = false)]
    pub compact: bool,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct PoolArgs {
    /// Feature CSV file path, one feature vector per row
    #[arg(long)]
    pub file: String,

    /// Feature vector width
    #[arg(long)]
    pub dim: usize,

    /// Skip malformed rows instead of failing
    #[arg(long, default_value_t = false)]
    pub skip_malformed: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Compact JSON output (no indentation)
    #[arg(long, default_value_t = false)]
    pub compact: bool,
}

#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern for input files (e.g. "data/**/*.csv")
    #[arg(long, conflicts_with = "files")]
    pub glob: Option<String>,

    /// Explicit list of input files
    #[arg(long, num_args = 1..)]
    pub files: Option<Vec<String>>,

    /// Expected number of columns
    #[arg(long)]
    pub columns: usize,

    /// Print matching files and exit
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}
