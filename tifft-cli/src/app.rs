use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing::{debug, warn};

use tifft_config::{load_config, AppConfig};
use tifft_data::io::{render_frame, render_table, write_frame_csv, write_table_csv};
use tifft_data::{fetch_history, reader_for, DataSource, PriceFrame, SeriesRequest};
use tifft_indicators::{IndicatorKind, IndicatorSpec};

use crate::telemetry;

#[derive(Parser, Debug)]
#[command(name = "tifft", author, version, about = "Technical indicators for financial trading")]
pub struct Cli {
    /// Configuration profile loaded from config/<NAME>.toml on top of config/default.toml
    #[arg(long, global = true)]
    env: Option<String>,
    /// Log debug messages
    #[arg(long, global = true, conflicts_with = "info")]
    debug: bool,
    /// Log info messages
    #[arg(short = 'v', long, global = true)]
    info: bool,
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn log_level(&self) -> LevelFilter {
        if self.debug {
            LevelFilter::DEBUG
        } else if self.info {
            LevelFilter::INFO
        } else {
            LevelFilter::WARN
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch historical data and print it
    History(DataArgs),
    /// Calculate Bollinger Bands
    Bb(BbArgs),
    /// Calculate MACD
    Macd(MacdArgs),
    /// Calculate RSI
    Rsi(RsiArgs),
    /// Calculate an indicator selected by name, using configured parameters
    Calc(CalcArgs),
    /// Print the effective configuration
    Config,
}

#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// Dataset names (series ids, tickers or file paths)
    #[arg(required = true)]
    names: Vec<String>,
    /// Data source: fred, stooq or csv
    #[arg(long)]
    data_source: Option<DataSource>,
    /// API key for the data source
    #[arg(long)]
    api_key: Option<String>,
    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,
    /// End date (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,
    /// Maximum number of rows to print; 0 prints every row
    #[arg(long)]
    max_rows: Option<usize>,
    /// Drop rows holding missing values
    #[arg(long)]
    drop_na: bool,
    /// Write the result to a CSV file
    #[arg(long, value_name = "PATH")]
    output_csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct BbArgs {
    #[command(flatten)]
    data: DataArgs,
    /// Window size for the moving average
    #[arg(long)]
    bb_window: Option<usize>,
    /// Multiplier for the standard deviation
    #[arg(long)]
    sd_multiplier: Option<f64>,
    /// Label each window at its centre
    #[arg(long)]
    center: bool,
    /// Minimum observations in a window
    #[arg(long)]
    min_periods: Option<usize>,
}

#[derive(Args, Debug)]
pub struct MacdArgs {
    #[command(flatten)]
    data: DataArgs,
    /// Span for the fast EMA
    #[arg(long)]
    fast_ema_span: Option<usize>,
    /// Span for the slow EMA
    #[arg(long)]
    slow_ema_span: Option<usize>,
    /// Span for the MACD signal EMA
    #[arg(long)]
    macd_ema_span: Option<usize>,
    /// Use bias-corrected EMA weights
    #[arg(long)]
    adjust: bool,
}

#[derive(Args, Debug)]
pub struct RsiArgs {
    #[command(flatten)]
    data: DataArgs,
    /// Window size for the average gains and losses
    #[arg(long)]
    rsi_window: Option<usize>,
    /// Overbought threshold
    #[arg(long)]
    upper_rsi: Option<f64>,
    /// Oversold threshold
    #[arg(long)]
    lower_rsi: Option<f64>,
    /// Label each window at its centre
    #[arg(long)]
    center: bool,
    /// Minimum observations in a window
    #[arg(long)]
    min_periods: Option<usize>,
}

#[derive(Args, Debug)]
pub struct CalcArgs {
    #[command(flatten)]
    data: DataArgs,
    /// Indicator name: bb, macd, rsi (or bands, divergence, oscillator)
    #[arg(long)]
    indicator: String,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.log_level())?;
    debug!(?cli, "parsed arguments");
    let config = load_config(cli.env.as_deref())?;
    let mut stdout = io::stdout();
    execute(cli.command, &config, &mut stdout).await
}

/// Runs one command, printing its report to `out`.
pub async fn execute<W: Write>(command: Commands, config: &AppConfig, out: &mut W) -> Result<()> {
    match command {
        Commands::History(data) => run_history(data, config, out).await,
        Commands::Bb(args) => {
            let mut cfg = config.indicators.bands;
            if let Some(window) = args.bb_window {
                cfg.window_size = window;
            }
            if let Some(multiplier) = args.sd_multiplier {
                cfg.sd_multiplier = multiplier;
            }
            cfg.rolling.center |= args.center;
            if args.min_periods.is_some() {
                cfg.rolling.min_periods = args.min_periods;
            }
            run_indicator(IndicatorSpec::Bands(cfg), args.data, config, out).await
        }
        Commands::Macd(args) => {
            let mut cfg = config.indicators.divergence;
            if let Some(span) = args.fast_ema_span {
                cfg.fast_span = span;
            }
            if let Some(span) = args.slow_ema_span {
                cfg.slow_span = span;
            }
            if let Some(span) = args.macd_ema_span {
                cfg.signal_span = span;
            }
            cfg.ewm.adjust |= args.adjust;
            run_indicator(IndicatorSpec::Divergence(cfg), args.data, config, out).await
        }
        Commands::Rsi(args) => {
            let mut cfg = config.indicators.oscillator;
            if let Some(window) = args.rsi_window {
                cfg.window_size = window;
            }
            if let Some(line) = args.upper_rsi {
                cfg.upper_line = line;
            }
            if let Some(line) = args.lower_rsi {
                cfg.lower_line = line;
            }
            cfg.rolling.center |= args.center;
            if args.min_periods.is_some() {
                cfg.rolling.min_periods = args.min_periods;
            }
            run_indicator(IndicatorSpec::Oscillator(cfg), args.data, config, out).await
        }
        Commands::Calc(args) => {
            let kind: IndicatorKind = args.indicator.parse()?;
            let spec = config.indicators.spec_for(kind);
            run_indicator(spec, args.data, config, out).await
        }
        Commands::Config => {
            write!(out, "{}", config.to_toml_string()?)?;
            Ok(())
        }
    }
}

async fn run_history<W: Write>(data: DataArgs, config: &AppConfig, out: &mut W) -> Result<()> {
    let label = data.names.join(", ");
    let frame = load_history(&data, data.names.clone(), config, out).await?;
    writeln!(out, ">>\tPrint results:\t{label}")?;
    write!(out, "{}", render_frame(&frame, max_rows(&data, config)))?;
    if let Some(path) = &data.output_csv {
        let path = announce_csv(path, out)?;
        write_frame_csv(&path, &frame)?;
    }
    Ok(())
}

async fn run_indicator<W: Write>(
    spec: IndicatorSpec,
    data: DataArgs,
    config: &AppConfig,
    out: &mut W,
) -> Result<()> {
    let kind = spec.kind();
    let calculator = spec.build()?;
    let Some(name) = data.names.first().cloned() else {
        return Err(anyhow!("a dataset name is required"));
    };
    if data.names.len() > 1 {
        warn!(indicator = %kind, "only the first dataset ({name}) is used");
    }

    let frame = load_history(&data, vec![name.clone()], config, out).await?;
    writeln!(out, ">>\tCalculate {}:\t{name}", kind.title())?;
    for (key, value) in spec.parameters() {
        writeln!(out, "{}:\t{value}", key.to_uppercase().replace('_', " "))?;
    }
    let series = frame
        .primary()
        .ok_or_else(|| anyhow!("{name} holds no data columns"))?;
    let mut table = calculator.calculate(&series.values);
    if config.display.uppercase_headers {
        table = table.with_uppercase_headers();
    }
    debug!(indicator = %kind, column = %series.name, rows = table.len(), "calculated indicator");

    writeln!(out, ">>\tPrint results:\t{name}")?;
    write!(
        out,
        "{}",
        render_table(frame.index(), &table, max_rows(&data, config))
    )?;
    if let Some(path) = &data.output_csv {
        let path = announce_csv(path, out)?;
        write_table_csv(&path, frame.index(), &table)?;
    }
    Ok(())
}

async fn load_history<W: Write>(
    data: &DataArgs,
    mut names: Vec<String>,
    config: &AppConfig,
    out: &mut W,
) -> Result<PriceFrame> {
    let source = data.data_source.unwrap_or(config.data.source);
    if !source.joins_names() && names.len() > 1 {
        warn!(%source, "only the first dataset ({}) is fetched", names[0]);
        names.truncate(1);
    }
    writeln!(out, ">>\tGet data from {source}:\t{}", names.join(", "))?;
    let api_key = data.api_key.clone().or_else(|| config.data.api_key.clone());
    let request = SeriesRequest::new(names, source)
        .with_api_key(api_key)
        .with_range(data.start, data.end);
    let reader = reader_for(source, &config.data.endpoints())?;
    let frame = fetch_history(reader.as_ref(), &request).await?;
    Ok(if data.drop_na { frame.drop_na() } else { frame })
}

fn max_rows(data: &DataArgs, config: &AppConfig) -> Option<usize> {
    data.max_rows.or(config.display.max_rows)
}

fn announce_csv<W: Write>(path: &Path, out: &mut W) -> Result<PathBuf> {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("failed to resolve the working directory")?
            .join(path)
    };
    writeln!(out, ">>\tWrite a CSV file:\t{}", path.display())?;
    Ok(path)
}
