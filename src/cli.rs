//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, warn};

use crate::adapters::csv_adapter::{write_trades_csv, write_trajectory_csv, CsvAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::html_report::HtmlReportAdapter;
use crate::domain::backtest::{run_backtest, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    parse_backtest_config, parse_data_config, parse_sweep_grid, report_output, validate_windows,
    DataConfig,
};
use crate::domain::error::SmacrossError;
use crate::domain::indicator_helpers::{compute_indicators, drop_warmup};
use crate::domain::metrics::{summarize, MetricsSummary};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::position::pair_round_trips;
use crate::domain::signal::generate_signals;
use crate::domain::sweep::{best, ranked, run_sweep, SweepGrid, SweepResult};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::{Dashboard, ReportPort};

#[derive(Parser, Debug)]
#[command(name = "smacross", about = "Moving-average crossover backtester")]
pub struct Cli {
    /// Log per-stage and per-fill detail
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest and write the dashboard
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        /// Short moving-average window
        #[arg(long)]
        short: Option<usize>,
        /// Long moving-average window
        #[arg(long)]
        long: Option<usize>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Directory for trajectory and trade CSV files
        #[arg(long)]
        export_dir: Option<PathBuf>,
        /// Also sweep the window grid and report the best pair
        #[arg(long)]
        optimize: bool,
        #[arg(long)]
        dry_run: bool,
    },
    /// Sweep the window grid and rank pairs by Sharpe ratio
    Optimize {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Show the data range for a symbol
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
}

/// Command-line overrides for a backtest run.
#[derive(Debug, Clone, Default)]
pub struct BacktestArgs {
    pub symbol: Option<String>,
    pub short: Option<usize>,
    pub long: Option<usize>,
    pub output: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
    pub optimize: bool,
}

/// Fully resolved settings for one backtest run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
    pub data: DataConfig,
    pub backtest: BacktestConfig,
    pub grid: Option<SweepGrid>,
    pub output: PathBuf,
    pub export_dir: Option<PathBuf>,
}

/// What a finished pipeline produced, besides the files it wrote.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub bars_loaded: usize,
    pub result: BacktestResult,
    pub metrics: MetricsSummary,
    pub best: Option<SweepResult>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            symbol,
            short,
            long,
            output,
            export_dir,
            optimize,
            dry_run,
        } => {
            let args = BacktestArgs {
                symbol,
                short,
                long,
                output,
                export_dir,
                optimize,
            };
            if dry_run {
                run_dry_run(&config, &args)
            } else {
                run_backtest_command(&config, &args)
            }
        }
        Command::Optimize { config, symbol } => run_optimize(&config, symbol.as_deref()),
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
    }
}

fn fail(err: &SmacrossError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

pub fn build_plan(config: &dyn ConfigPort, args: &BacktestArgs) -> Result<RunPlan, SmacrossError> {
    let data = parse_data_config(config, args.symbol.as_deref())?;
    let mut backtest = parse_backtest_config(config)?;

    if let Some(short) = args.short {
        backtest.indicators.short_window = short;
    }
    if let Some(long) = args.long {
        backtest.indicators.long_window = long;
    }
    validate_windows(
        backtest.indicators.short_window,
        backtest.indicators.long_window,
    )?;

    let grid = if args.optimize {
        Some(parse_sweep_grid(config)?)
    } else {
        None
    };

    Ok(RunPlan {
        data,
        backtest,
        grid,
        output: args.output.clone().unwrap_or_else(|| report_output(config)),
        export_dir: args.export_dir.clone(),
    })
}

fn run_backtest_command(config_path: &Path, args: &BacktestArgs) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let plan = match build_plan(&adapter, args) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    // Stages 2-8
    let data_port = CsvAdapter::new(plan.data.data_dir.clone());
    match run_backtest_pipeline(&data_port, &HtmlReportAdapter::new(), &plan) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn load_bars(data_port: &dyn DataPort, data: &DataConfig) -> Result<Vec<OhlcvBar>, SmacrossError> {
    let bars = data_port.fetch_ohlcv(&data.symbol, data.start_date, data.end_date)?;
    if bars.is_empty() {
        return Err(SmacrossError::EmptyInput {
            reason: format!("no price data for {} in the requested range", data.symbol),
        });
    }
    info!(symbol = %data.symbol, bars = bars.len(), "loaded price history");
    Ok(bars)
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    report: &dyn ReportPort,
    plan: &RunPlan,
) -> Result<RunOutcome, SmacrossError> {
    let params = &plan.backtest.indicators;

    // Stage 2: Load price history
    let bars = load_bars(data_port, &plan.data)?;

    // Stage 3: Indicators and warm-up filtering
    let enriched = drop_warmup(compute_indicators(&bars, params));
    if enriched.is_empty() {
        return Err(SmacrossError::EmptyInput {
            reason: format!(
                "{} bars loaded but SMA({}) needs at least {}",
                bars.len(),
                params.long_window,
                params.long_window
            ),
        });
    }
    debug!(
        warmup = bars.len() - enriched.len(),
        remaining = enriched.len(),
        "dropped warm-up bars"
    );

    // Stage 4: Signals and simulation
    let signals = generate_signals(&enriched);
    info!(
        bars = signals.len(),
        short = params.short_window,
        long = params.long_window,
        "running backtest"
    );
    let result = run_backtest(&signals, plan.backtest.initial_capital)?;
    let metrics = summarize(&result.derived, &signals);

    // Stage 5: Optional parameter sweep
    let best_pair = match &plan.grid {
        Some(grid) => {
            let results = run_sweep(&bars, grid, params, plan.backtest.initial_capital);
            let top = best(&results).cloned();
            if top.is_none() {
                warn!("no window pair produced a defined Sharpe ratio");
            }
            top
        }
        None => None,
    };

    // Stage 6: Console summary
    print_summary(&plan.data.symbol, &result, &metrics, best_pair.as_ref());

    // Stage 7: Dashboard
    let dashboard = Dashboard {
        symbol: &plan.data.symbol,
        params,
        bars: &enriched,
        result: &result,
        metrics: &metrics,
        best: best_pair.as_ref(),
    };
    report.write(&dashboard, &plan.output)?;
    eprintln!("\nDashboard written to: {}", plan.output.display());

    // Stage 8: Optional CSV export
    if let Some(dir) = &plan.export_dir {
        fs::create_dir_all(dir)?;
        let trajectory = dir.join(format!("{}_trajectory.csv", plan.data.symbol));
        let trades = dir.join(format!("{}_trades.csv", plan.data.symbol));
        write_trajectory_csv(&trajectory, &signals, &result)?;
        write_trades_csv(&trades, &result.trades)?;
        eprintln!("Exported {} and {}", trajectory.display(), trades.display());
    }

    Ok(RunOutcome {
        bars_loaded: bars.len(),
        result,
        metrics,
        best: best_pair,
    })
}

fn fmt_metric(value: &Result<f64, String>, fmt: fn(f64) -> String) -> String {
    match value {
        Ok(v) => fmt(*v),
        Err(reason) => format!("n/a ({})", reason),
    }
}

fn print_summary(
    symbol: &str,
    result: &BacktestResult,
    metrics: &MetricsSummary,
    best: Option<&SweepResult>,
) {
    let round_trips = pair_round_trips(&result.trades);

    eprintln!("\n=== {} Results ===", symbol);
    eprintln!("Initial Capital:  {:.2}", result.initial_capital);
    eprintln!("Final Value:      {:.2}", result.final_value());
    eprintln!("Total Return:     {:.2}%", metrics.total_return * 100.0);
    eprintln!(
        "Sharpe Ratio:     {}",
        fmt_metric(&metrics.sharpe, |v| format!("{:.2}", v))
    );
    eprintln!("Max Drawdown:     {:.2}%", metrics.max_drawdown * 100.0);
    eprintln!(
        "Win Rate:         {}",
        fmt_metric(&metrics.win_rate, |v| format!("{:.2}%", v))
    );
    eprintln!("Fills:            {}", result.trades.len());
    eprintln!("Round Trips:      {}", round_trips.closed.len());
    if let Some(open) = &round_trips.open {
        eprintln!("Open Position:    {:.4} shares since {}", open.shares, open.date);
    }
    if let Some(b) = best {
        eprintln!(
            "Best Windows:     SMA {} / SMA {}",
            b.short_window, b.long_window
        );
    }
}

pub fn print_plan(plan: &RunPlan) {
    let p = &plan.backtest.indicators;
    let range = |d: Option<chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "-".into());

    eprintln!("\nData:");
    eprintln!("  symbol:   {}", plan.data.symbol);
    eprintln!("  data_dir: {}", plan.data.data_dir.display());
    eprintln!(
        "  range:    {} to {}",
        range(plan.data.start_date),
        range(plan.data.end_date)
    );

    eprintln!("\nBacktest:");
    eprintln!("  initial_capital: {:.2}", plan.backtest.initial_capital);

    eprintln!("\nIndicators to compute:");
    for indicator in p.indicator_types() {
        eprintln!("  {}", indicator);
    }

    if let Some(grid) = &plan.grid {
        eprintln!(
            "\nSweep: {} window pairs",
            grid.combinations().len()
        );
    }

    eprintln!("\nOutput:");
    eprintln!("  dashboard: {}", plan.output.display());
    if let Some(dir) = &plan.export_dir {
        eprintln!("  export:    {}", dir.display());
    }
}

pub fn run_dry_run(config_path: &Path, args: &BacktestArgs) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let plan = match build_plan(&adapter, args) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };
    eprintln!("Config validated successfully");

    print_plan(&plan);

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

/// Runs the configured sweep and returns every grid entry in grid order.
pub fn run_optimize_pipeline(
    data_port: &dyn DataPort,
    data: &DataConfig,
    backtest: &BacktestConfig,
    grid: &SweepGrid,
) -> Result<Vec<SweepResult>, SmacrossError> {
    let bars = load_bars(data_port, data)?;
    Ok(run_sweep(&bars, grid, &backtest.indicators, backtest.initial_capital))
}

fn run_optimize(config_path: &Path, symbol: Option<&str>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let setup = parse_data_config(&adapter, symbol).and_then(|data| {
        Ok((data, parse_backtest_config(&adapter)?, parse_sweep_grid(&adapter)?))
    });
    let (data, backtest, grid) = match setup {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let data_port = CsvAdapter::new(data.data_dir.clone());
    let results = match run_optimize_pipeline(&data_port, &data, &backtest, &grid) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    let ok = ranked(&results);
    let failed = results.len() - ok.len();

    println!("short\tlong\tsharpe\ttotal_return\tmax_drawdown\ttrades");
    for (r, o) in &ok {
        println!(
            "{}\t{}\t{:.4}\t{:.4}\t{:.4}\t{}",
            r.short_window, r.long_window, o.sharpe, o.total_return, o.max_drawdown, o.trades
        );
    }
    if failed > 0 {
        eprintln!("{} of {} window pairs produced no result", failed, results.len());
        for r in &results {
            if let Err(reason) = &r.outcome {
                debug!(short = r.short_window, long = r.long_window, %reason, "sweep run failed");
            }
        }
    }

    match best(&results) {
        Some(b) => {
            eprintln!(
                "\nBest: SMA Short Window = {} and SMA Long Window = {}",
                b.short_window, b.long_window
            );
            ExitCode::SUCCESS
        }
        None => fail(&SmacrossError::undefined(
            "sharpe",
            "no window pair produced a defined Sharpe ratio",
        )),
    }
}

fn run_info(config_path: &Path, symbol: Option<&str>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let data = match parse_data_config(&adapter, symbol) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };

    let data_port = CsvAdapter::new(data.data_dir.clone());
    match data_port.get_data_range(&data.symbol) {
        Ok(Some((min_date, max_date, count))) => {
            println!("{}: {} bars, {} to {}", data.symbol, count, min_date, max_date);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("{}: no data found", data.symbol);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}
