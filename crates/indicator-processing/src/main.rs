//! CLI entry point for the indicator processing pipeline.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use dotenv::dotenv;
use indicator_processing::acquire::{
    DatasetRequest, Fetcher, HdiQuery, acquire_dataset, acquire_undp_hdi, acquire_worldbank_tb,
};
use indicator_processing::schema::constants::{
    DEFAULT_ARCHIVE_EXCLUDE, DEFAULT_ARCHIVE_INCLUDE, HDRO_API_KEY_ENV,
};
use indicator_processing::{
    MetadataLog, OutputFormat, Pipeline, PipelineConfig, ProcessingSummary, ReportGenerator,
};
use std::env;
use std::path::PathBuf;
use tracing::{debug, info};

#[cfg(feature = "fetch")]
use indicator_processing::acquire::HttpFetcher;

/// CLI-compatible output format enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutputFormat {
    /// Comma-separated values with a header row
    Csv,
    /// Apache Parquet
    Parquet,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(cli: CliOutputFormat) -> Self {
        match cli {
            CliOutputFormat::Csv => OutputFormat::Csv,
            CliOutputFormat::Parquet => OutputFormat::Parquet,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Public health indicator acquisition and normalization",
    long_about = "Downloads World Bank, WHO and UNDP indicator exports and normalizes them into\n\
                  long format (country_code, year, indicator, value).\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  HDRO_API_KEY    API key for the UNDP HDRO API (required for acquire-hdi)\n\n\
                  EXAMPLES:\n  \
                  # Download and register a World Bank bulk export\n  \
                  indicator-processing acquire --url <zip-url> --prefix worldbank_population\n\n  \
                  # Reshape a registered source\n  \
                  indicator-processing clean -i data/raw/worldbank_population.csv -s worldbank_population\n\n  \
                  # Quality report as JSON\n  \
                  indicator-processing assess -i data/raw/worldbank_population.csv --json"
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// JSON configuration file; flags given on the command line override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download a ZIP export, extract its main CSV and register it
    Acquire {
        /// Download URL of the archive
        #[arg(long)]
        url: String,

        /// Base name of the saved archive and CSV
        #[arg(long)]
        prefix: String,

        /// Destination directory (defaults to the configured raw directory)
        #[arg(long)]
        dest: Option<PathBuf>,

        /// Substrings an archive entry name must contain (any of)
        #[arg(long, num_args = 1.., default_values_t = [DEFAULT_ARCHIVE_INCLUDE.to_string()])]
        include: Vec<String>,

        /// Substrings that exclude an archive entry
        #[arg(long, num_args = 1.., default_values_t = [DEFAULT_ARCHIVE_EXCLUDE.to_string()])]
        exclude: Vec<String>,
    },

    /// Download the World Bank tuberculosis incidence export and register it
    AcquireTb {
        /// Destination directory (defaults to the configured raw directory)
        #[arg(long)]
        dest: Option<PathBuf>,
    },

    /// Query the UNDP HDRO API and register the CSV it returns
    AcquireHdi {
        /// Country codes or "all"
        #[arg(long, default_value = "all")]
        countries: String,

        /// Comma-separated years
        #[arg(long, default_value = "2020,2021,2022")]
        years: String,

        /// Composite indicator codes
        #[arg(long, default_value = "HDI")]
        indicators: String,

        /// Base name of the saved CSV
        #[arg(long, default_value = "undp_hdi")]
        prefix: String,

        /// Destination directory (defaults to the configured raw directory)
        #[arg(long)]
        dest: Option<PathBuf>,
    },

    /// Reshape a raw export into the canonical long table
    Clean {
        /// Path to the raw CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Registered source identifier (unknown ids pass through)
        #[arg(short, long)]
        source: String,

        /// Output file (defaults to <processed_dir>/<stem>_long.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum)]
        format: Option<CliOutputFormat>,
    },

    /// Melt every numeric column of an arbitrary table
    Transform {
        /// Path to the CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (defaults to <processed_dir>/<stem>_long.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a quality report for a raw file
    Assess {
        /// Path to the CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Report file (defaults to <quality_dir>/<stem>_quality_report.txt)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the report as JSON to stdout instead of a summary
        ///
        /// Disables all progress logs; only outputs the JSON report.
        #[arg(long)]
        json: bool,
    },

    /// Print the number of preamble lines before the header row
    DetectHeader {
        /// Path to the CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Header keyword (defaults to the configured keyword)
        #[arg(short, long)]
        keyword: Option<String>,

        /// Number of leading lines to scan
        #[arg(long)]
        max_lines: Option<usize>,
    },

    /// List the registered source identifiers
    Sources,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let json_output = matches!(cli.command, Command::Assess { json: true, .. });
    init_logging(&cli.log_level, cli.quiet, json_output);

    // Load environment variables from .env file
    dotenv().ok();

    let config = load_config(&cli)?;
    debug!("Configuration: {:?}", config);

    match cli.command {
        Command::Acquire {
            url,
            prefix,
            dest,
            include,
            exclude,
        } => {
            let dest = dest.unwrap_or_else(|| config.raw_dir.clone());
            let request = DatasetRequest::new(url, prefix, dest)
                .include(include)
                .exclude(exclude);
            let fetcher = build_fetcher(&config)?;
            let log = MetadataLog::new(&config.metadata_log);

            let acquisition = acquire_dataset(fetcher.as_ref(), &request, &config, &log)?;
            println!("Saved: {}", acquisition.csv_path.display());
            println!("Header offset: {}", acquisition.header_offset);
            println!("Rows: {}", acquisition.record.rows);
            println!("SHA-256: {}", acquisition.record.hash);
        }

        Command::AcquireTb { dest } => {
            let dest = dest.unwrap_or_else(|| config.raw_dir.clone());
            let fetcher = build_fetcher(&config)?;
            let log = MetadataLog::new(&config.metadata_log);

            let acquisition = acquire_worldbank_tb(fetcher.as_ref(), &dest, &config, &log)?;
            println!("Saved: {}", acquisition.csv_path.display());
            println!("Header offset: {}", acquisition.header_offset);
            println!("Rows: {}", acquisition.record.rows);
            println!("SHA-256: {}", acquisition.record.hash);
        }

        Command::AcquireHdi {
            countries,
            years,
            indicators,
            prefix,
            dest,
        } => {
            let api_key = env::var(HDRO_API_KEY_ENV)
                .with_context(|| format!("{} is not set", HDRO_API_KEY_ENV))?;
            let query = HdiQuery {
                countries,
                years,
                indicators,
                prefix,
            };
            let dest = dest.unwrap_or_else(|| config.raw_dir.clone());
            let fetcher = build_fetcher(&config)?;
            let log = MetadataLog::new(&config.metadata_log);

            let acquisition = acquire_undp_hdi(fetcher.as_ref(), &api_key, &query, &dest, &log)?;
            println!("Saved: {}", acquisition.csv_path.display());
            println!("Rows: {}", acquisition.record.rows);
            println!("SHA-256: {}", acquisition.record.hash);
        }

        Command::Clean {
            input,
            source,
            output,
            format,
        } => {
            ensure_exists(&input)?;
            let pipeline = Pipeline::builder().config(config).build()?;
            let summary =
                pipeline.clean_file(&input, &source, output.as_deref(), format.map(Into::into))?;
            print_summary(&summary);
        }

        Command::Transform { input, output } => {
            ensure_exists(&input)?;
            let pipeline = Pipeline::builder().config(config).build()?;
            let summary = pipeline.transform_file(&input, output.as_deref())?;
            print_summary(&summary);
        }

        Command::Assess {
            input,
            output,
            json,
        } => {
            ensure_exists(&input)?;
            let pipeline = Pipeline::builder().config(config).build()?;
            let (report, path) = pipeline.assess_file(&input, output.as_deref())?;

            if json {
                println!("{}", ReportGenerator::to_json(&report)?);
                return Ok(());
            }
            println!("{}", report);
            info!("Quality report written to: {}", path.display());
        }

        Command::DetectHeader {
            input,
            keyword,
            max_lines,
        } => {
            ensure_exists(&input)?;
            let keyword = keyword.unwrap_or_else(|| config.header_keyword.clone());
            let max_lines = max_lines.unwrap_or(config.max_scan_lines);
            let offset =
                indicator_processing::detect_header_offset_in_file(&input, &keyword, max_lines)?;
            println!("{}", offset);
        }

        Command::Sources => {
            let pipeline = Pipeline::builder().config(config).build()?;
            println!("{:<42} {:<12} {}", "Source", "Mode", "Indicator");
            println!("{}", "-".repeat(80));
            for entry in pipeline.registry().entries() {
                let indicator = entry.constant_indicator().unwrap_or("(rename map)");
                println!(
                    "{:<42} {:<12} {}",
                    entry.id,
                    format!("{:?}", entry.reshape_mode),
                    indicator
                );
            }
        }
    }

    Ok(())
}

/// Load the configuration file when given, else the defaults.
fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    match &cli.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            PipelineConfig::from_json_file(path)
                .with_context(|| format!("Invalid configuration file {}", path.display()))
        }
        None => Ok(PipelineConfig::default()),
    }
}

fn ensure_exists(path: &std::path::Path) -> Result<()> {
    if !path.exists() {
        return Err(anyhow!("Input file not found: {}", path.display()));
    }
    Ok(())
}

/// Build the HTTP fetcher with the configured timeout.
#[cfg(feature = "fetch")]
fn build_fetcher(config: &PipelineConfig) -> Result<Box<dyn Fetcher>> {
    Ok(Box::new(HttpFetcher::with_timeout(
        config.request_timeout_secs,
    )?))
}

/// Downloads are unavailable when the "fetch" feature is disabled
#[cfg(not(feature = "fetch"))]
fn build_fetcher(_config: &PipelineConfig) -> Result<Box<dyn Fetcher>> {
    Err(anyhow!(
        "HTTP support not compiled in. Compile with --features fetch to enable downloads."
    ))
}

/// Print a human-readable summary of a clean or transform run.
fn print_summary(summary: &ProcessingSummary) {
    println!();
    println!("{}", "=".repeat(80));
    println!("PROCESSING COMPLETE");
    println!("{}", "=".repeat(80));
    println!("  Source: {}", summary.source);
    println!("  Input: {}", summary.input);
    println!("  Header offset: {}", summary.header_offset);
    println!("  Rows: {} -> {}", summary.input_rows, summary.output_rows);
    if summary.pass_through {
        println!("  No schema registered; table passed through after sanitizing");
    }
    println!("  Output: {}", summary.output);
    println!("{}", "=".repeat(80));
}
