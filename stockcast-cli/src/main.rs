//! Stockcast CLI: price history, ARIMA forecasts, and fundamentals.
//!
//! Commands:
//! - `history` print OHLCV bars for a ticker and period
//! - `forecast` fit ARIMA and print the forecast on the display axis
//! - `axis` print the display axis (month anchors + forecast days)
//! - `info` print the fundamentals panel and recommendation

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use stockcast_core::fundamentals::FundamentalsPanel;
use stockcast_core::period::PeriodSelection;
use stockcast_runner::export::write_artifact;
use stockcast_runner::{export_json, export_view_csv, Dashboard, DashboardConfig, StockDataView};

#[derive(Parser)]
#[command(name = "stockcast", about = "Stockcast CLI: stock history and ARIMA forecasts")]
struct Cli {
    /// Config file (default: <config_dir>/stockcast/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use deterministic offline data instead of Yahoo Finance.
    #[arg(long, global = true, default_value_t = false)]
    synthetic: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ViewArgs {
    /// Ticker symbol (e.g., AAPL).
    ticker: String,

    /// Period: 24h, 5d, 1mo, or max. Anything else means max.
    #[arg(long, default_value = "max")]
    period: String,

    /// Print JSON instead of a table.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Also write history + forecast rows as CSV to this path.
    #[arg(long)]
    csv: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print OHLCV bars for a ticker.
    History {
        #[command(flatten)]
        view: ViewArgs,

        /// Only print the most recent N bars (tables only).
        #[arg(long, default_value_t = 20)]
        tail: usize,
    },
    /// Fit ARIMA on the close prices and print the forecast.
    Forecast {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Print the display axis used to label the forecast chart.
    Axis {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Print company fundamentals and the analyst recommendation.
    Info {
        /// Ticker symbol (e.g., AAPL).
        ticker: String,

        /// Print JSON instead of text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let dashboard = build_dashboard(cli.config.as_deref(), cli.synthetic)?;

    match cli.command {
        Commands::History { view, tail } => run_history(&dashboard, &view, tail),
        Commands::Forecast { view } => run_forecast(&dashboard, &view),
        Commands::Axis { view } => run_axis(&dashboard, &view),
        Commands::Info { ticker, json } => run_info(&dashboard, &ticker, json),
    }
}

fn build_dashboard(config_path: Option<&Path>, synthetic: bool) -> Result<Dashboard> {
    let mut config = DashboardConfig::load(config_path).context("failed to load configuration")?;
    if synthetic {
        config.provider.synthetic = true;
    }
    let provider = config
        .build_provider()
        .context("failed to build data provider")?;
    tracing::debug!(provider = provider.name(), "provider ready");
    Ok(config.dashboard(provider))
}

/// Run the Stock Data pipeline and write the CSV artifact when asked.
fn load_view(dashboard: &Dashboard, args: &ViewArgs) -> Result<StockDataView> {
    let ticker = args.ticker.trim().to_ascii_uppercase();
    let selection = PeriodSelection::parse(&args.period);
    let view = dashboard.stock_data(&ticker, selection);

    for issue in &view.issues {
        eprintln!("Warning: {issue}");
    }
    if let Some(path) = &args.csv {
        write_artifact(path, &export_view_csv(&view)?)?;
        println!("CSV saved to: {}", path.display());
    }
    Ok(view)
}

fn run_history(dashboard: &Dashboard, args: &ViewArgs, tail: usize) -> Result<()> {
    let view = load_view(dashboard, args)?;
    if args.json {
        println!("{}", export_json(&view.series)?);
        return Ok(());
    }
    if !view.has_data() {
        println!("No price data for {} ({}).", view.ticker, view.selection);
        std::process::exit(1);
    }

    println!("{}", view.candle_title());
    println!(
        "Source: {}  Interval: {}  Bars: {}",
        view.source.label(),
        view.interval,
        view.series.len()
    );
    println!();
    println!(
        "{:<19} {:>10} {:>10} {:>10} {:>10} {:>12}",
        "Timestamp", "Open", "High", "Low", "Close", "Volume"
    );
    println!("{}", "-".repeat(76));
    let bars = view.series.bars();
    for b in &bars[bars.len().saturating_sub(tail)..] {
        println!(
            "{:<19} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>12}",
            b.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        );
    }
    Ok(())
}

fn run_forecast(dashboard: &Dashboard, args: &ViewArgs) -> Result<()> {
    let view = load_view(dashboard, args)?;
    if args.json {
        let out = serde_json::json!({
            "ticker": view.ticker,
            "period": view.selection,
            "forecast": view.forecast,
            "trace": view.forecast_trace,
            "issues": view.issues,
        });
        println!("{}", export_json(&out)?);
        return Ok(());
    }

    let Some(forecast) = &view.forecast else {
        println!("{}: no forecast for {} ({}).", view.forecast_title(), view.ticker, view.selection);
        std::process::exit(1);
    };

    println!("{} for {}", view.forecast_title(), view.ticker);
    if let Some(last) = view.series.last_close() {
        println!("Last close: {last:.2}");
    }
    match forecast.confidence {
        Some(c) => println!("Prediction band: {:.0}%", c * 100.0),
        None => println!("Prediction band: off"),
    }
    println!();
    println!("{:<12} {:>12} {:>12} {:>12}", "Date", "Forecast", "Lower", "Upper");
    println!("{}", "-".repeat(51));
    for p in &forecast.points {
        let (lower, upper) = match p.band {
            Some(b) => (format!("{:.2}", b.lower), format!("{:.2}", b.upper)),
            None => ("-".to_string(), "-".to_string()),
        };
        println!(
            "{:<12} {:>12.2} {:>12} {:>12}",
            p.timestamp.format("%Y-%m-%d").to_string(),
            p.predicted_close,
            lower,
            upper
        );
    }
    Ok(())
}

fn run_axis(dashboard: &Dashboard, args: &ViewArgs) -> Result<()> {
    let view = load_view(dashboard, args)?;
    let Some(axis) = &view.axis else {
        println!("No price data for {} ({}); no axis.", view.ticker, view.selection);
        std::process::exit(1);
    };
    if args.json {
        println!("{}", export_json(axis)?);
        return Ok(());
    }

    println!(
        "Display axis for {}: {} anchors, {} forecast days",
        view.ticker,
        axis.anchors().len(),
        axis.forecast_days().len()
    );
    if let Some(last) = view.series.last_timestamp() {
        println!("Last observation: {}", last.format("%Y-%m-%d %H:%M"));
    }
    println!();
    for t in axis.anchors() {
        println!("  anchor    {}", t.format("%Y-%m-%d"));
    }
    for t in axis.forecast_days() {
        println!("  forecast  {}", t.format("%Y-%m-%d"));
    }
    Ok(())
}

fn run_info(dashboard: &Dashboard, ticker: &str, json: bool) -> Result<()> {
    let ticker = ticker.trim().to_ascii_uppercase();
    let view = dashboard.stock_info(&ticker);
    for issue in &view.issues {
        eprintln!("Warning: {issue}");
    }
    if json {
        println!("{}", export_json(&view.panel)?);
        return Ok(());
    }
    print_panel(&view.panel);
    let first_close = view.history.bars().first().map(|b| b.close);
    if let (Some(first), Some(last)) = (first_close, view.history.last_close()) {
        println!();
        println!(
            "{}: {:.2} -> {:.2} ({:+.2}%)",
            view.history_title(),
            first,
            last,
            (last / first - 1.0) * 100.0
        );
    }
    Ok(())
}

fn print_panel(panel: &FundamentalsPanel) {
    println!("Fundamentals for {}", panel.ticker);
    for section in &panel.sections {
        println!();
        println!("{}", section.title);
        println!("{}", "-".repeat(section.title.len()));
        for row in &section.rows {
            println!("  {:<26} {}", format!("{}:", row.label), row.value);
        }
    }
    if !panel.valuation.is_empty() {
        println!();
        println!("Valuation Metrics");
        println!("{}", "-".repeat(17));
        for (label, value) in &panel.valuation {
            println!("  {:<26} {value:.2}", format!("{label}:"));
        }
    }
}
