//! CLI integration tests for command orchestration.
//!
//! Tests cover:
//! - Run plan building from INI content and command-line overrides
//! - Dry-run mode with real INI files on disk
//! - Full backtest command over a CSV directory, writing the dashboard and exports
//! - Optimize and info commands
//! - Exit codes for configuration and data failures

mod common;

use clap::Parser;
use common::*;
use smacross::adapters::file_config_adapter::FileConfigAdapter;
use smacross::cli::{self, BacktestArgs, Cli};
use smacross::domain::error::SmacrossError;
use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tempfile::TempDir;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn same_code(actual: ExitCode, expected: ExitCode) -> bool {
    format!("{actual:?}") == format!("{expected:?}")
}

fn write_price_csv(dir: &Path, symbol: &str, closes: &[f64]) {
    let mut csv = String::from("Date,Open,High,Low,Close,Adj Close,Volume\n");
    for (i, close) in closes.iter().enumerate() {
        writeln!(
            csv,
            "{},{c},{c},{c},{c},{c},1000",
            day(i),
            c = close
        )
        .unwrap();
    }
    std::fs::write(dir.join(format!("{symbol}.csv")), csv).unwrap();
}

const VALID_INI: &str = r#"
[data]
symbol = AAPL
data_dir = data
start_date = 2021-01-01
end_date = 2023-11-28

[backtest]
initial_capital = 25000

[strategy]
short_window = 20
long_window = 100
rsi_period = 14
bollinger_period = 20
bollinger_stddev = 2.0

[optimize]
short_windows = 10, 20
long_windows = 50, 100

[report]
output = reports/aapl.html
"#;

mod config_loading {
    use super::*;

    #[test]
    fn build_plan_valid_full() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let plan = cli::build_plan(&adapter, &BacktestArgs::default()).unwrap();

        assert_eq!(plan.data.symbol, "AAPL");
        assert_eq!(plan.data.data_dir, PathBuf::from("data"));
        assert_eq!(plan.data.start_date, Some(date(2021, 1, 1)));
        assert_eq!(plan.data.end_date, Some(date(2023, 11, 28)));
        assert!((plan.backtest.initial_capital - 25_000.0).abs() < f64::EPSILON);
        assert_eq!(plan.backtest.indicators.short_window, 20);
        assert_eq!(plan.backtest.indicators.long_window, 100);
        assert_eq!(plan.output, PathBuf::from("reports/aapl.html"));
        assert!(plan.grid.is_none());
        assert!(plan.export_dir.is_none());
    }

    #[test]
    fn build_plan_uses_defaults() {
        let adapter = FileConfigAdapter::from_string("[data]\nsymbol = spy\n").unwrap();
        let plan = cli::build_plan(&adapter, &BacktestArgs::default()).unwrap();

        assert_eq!(plan.data.symbol, "SPY");
        assert!((plan.backtest.initial_capital - 10_000.0).abs() < f64::EPSILON);
        assert_eq!(plan.backtest.indicators.short_window, 50);
        assert_eq!(plan.backtest.indicators.long_window, 200);
        assert_eq!(plan.output, PathBuf::from("dashboard.html"));
    }

    #[test]
    fn command_line_overrides_win() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let args = BacktestArgs {
            symbol: Some("msft".into()),
            short: Some(5),
            long: Some(30),
            output: Some(PathBuf::from("x.html")),
            export_dir: Some(PathBuf::from("exports")),
            optimize: true,
        };
        let plan = cli::build_plan(&adapter, &args).unwrap();

        assert_eq!(plan.data.symbol, "MSFT");
        assert_eq!(plan.backtest.indicators.short_window, 5);
        assert_eq!(plan.backtest.indicators.long_window, 30);
        assert_eq!(plan.output, PathBuf::from("x.html"));
        assert_eq!(plan.export_dir, Some(PathBuf::from("exports")));
        let grid = plan.grid.unwrap();
        assert_eq!(grid.short_windows, vec![10, 20]);
        assert_eq!(grid.long_windows, vec![50, 100]);
    }

    #[test]
    fn override_cannot_invert_windows() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let args = BacktestArgs {
            short: Some(150),
            ..BacktestArgs::default()
        };
        let err = cli::build_plan(&adapter, &args).unwrap_err();
        assert!(matches!(err, SmacrossError::ConfigInvalid { ref key, .. } if key == "long_window"));
    }

    #[test]
    fn missing_symbol_is_config_error() {
        let adapter = FileConfigAdapter::from_string("[backtest]\ninitial_capital = 1\n").unwrap();
        let err = cli::build_plan(&adapter, &BacktestArgs::default()).unwrap_err();
        assert!(matches!(err, SmacrossError::ConfigMissing { ref key, .. } if key == "symbol"));
        assert!(same_code((&err).into(), ExitCode::from(2)));
    }
}

mod dry_run {
    use super::*;

    #[test]
    fn dry_run_valid_config_succeeds() {
        let file = write_temp_ini(VALID_INI);
        let exit_code = cli::run_dry_run(file.path(), &BacktestArgs::default());
        assert!(same_code(exit_code, ExitCode::SUCCESS));
    }

    #[test]
    fn dry_run_missing_file_fails() {
        let exit_code = cli::run_dry_run(
            Path::new("/nonexistent/path/config.ini"),
            &BacktestArgs::default(),
        );
        assert!(same_code(exit_code, ExitCode::from(2)));
    }

    #[test]
    fn dry_run_invalid_capital_fails() {
        let file = write_temp_ini("[data]\nsymbol = AAPL\n[backtest]\ninitial_capital = -5\n");
        let exit_code = cli::run_dry_run(file.path(), &BacktestArgs::default());
        assert!(same_code(exit_code, ExitCode::from(2)));
    }
}

mod end_to_end {
    use super::*;

    fn setup(closes: &[f64]) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("data");
        std::fs::create_dir_all(&data_dir).unwrap();
        write_price_csv(&data_dir, "WAVE", closes);

        let ini = format!(
            "[data]\nsymbol = WAVE\ndata_dir = {}\n\n[strategy]\nshort_window = 5\nlong_window = 20\n\n\
             [optimize]\nshort_windows = 3,5\nlong_windows = 15,25\n\n[report]\noutput = {}\n",
            data_dir.display(),
            dir.path().join("out").join("dashboard.html").display()
        );
        let config = dir.path().join("run.ini");
        std::fs::write(&config, ini).unwrap();
        (dir, config)
    }

    fn run_cli(args: &[&str]) -> ExitCode {
        let mut argv = vec!["smacross"];
        argv.extend_from_slice(args);
        cli::run(Cli::parse_from(argv))
    }

    #[test]
    fn backtest_writes_dashboard_and_exports() {
        let (dir, config) = setup(&wave_closes(160));
        let export = dir.path().join("exports");

        let code = run_cli(&[
            "backtest",
            "-c",
            config.to_str().unwrap(),
            "--export-dir",
            export.to_str().unwrap(),
            "--optimize",
        ]);
        assert!(same_code(code, ExitCode::SUCCESS));

        let html = std::fs::read_to_string(dir.path().join("out").join("dashboard.html")).unwrap();
        assert!(html.contains("WAVE"));
        assert!(html.contains("Best SMA Short Window"));
        assert_eq!(html.matches("<svg").count(), 3);

        let trajectory = std::fs::read_to_string(export.join("WAVE_trajectory.csv")).unwrap();
        assert_eq!(trajectory.lines().count(), 1 + 160 - 19);
        assert!(trajectory.starts_with("date,close,signal,portfolio_value"));
        assert!(export.join("WAVE_trades.csv").exists());
    }

    #[test]
    fn backtest_output_flag_overrides_config() {
        let (dir, config) = setup(&wave_closes(80));
        let output = dir.path().join("custom.html");

        let code = run_cli(&[
            "-v",
            "backtest",
            "--config",
            config.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
            "--short",
            "4",
            "--long",
            "12",
        ]);
        assert!(same_code(code, ExitCode::SUCCESS));
        assert!(output.exists());
        assert!(!dir.path().join("out").join("dashboard.html").exists());
    }

    #[test]
    fn backtest_with_short_history_is_empty_input() {
        let (_dir, config) = setup(&wave_closes(10));
        let code = run_cli(&["backtest", "-c", config.to_str().unwrap()]);
        assert!(same_code(code, ExitCode::from(4)));
    }

    #[test]
    fn backtest_unknown_symbol_is_data_error() {
        let (_dir, config) = setup(&wave_closes(60));
        let code = run_cli(&["backtest", "-c", config.to_str().unwrap(), "--symbol", "NOPE"]);
        assert!(same_code(code, ExitCode::from(3)));
    }

    #[test]
    fn optimize_ranks_pairs() {
        let (_dir, config) = setup(&wave_closes(160));
        let code = run_cli(&["optimize", "-c", config.to_str().unwrap()]);
        assert!(same_code(code, ExitCode::SUCCESS));
    }

    #[test]
    fn optimize_flat_prices_has_no_defined_sharpe() {
        let (_dir, config) = setup(&[100.0; 60]);
        let code = run_cli(&["optimize", "-c", config.to_str().unwrap()]);
        assert!(same_code(code, ExitCode::from(5)));
    }

    #[test]
    fn info_reports_range() {
        let (_dir, config) = setup(&wave_closes(30));
        let code = run_cli(&["info", "-c", config.to_str().unwrap()]);
        assert!(same_code(code, ExitCode::SUCCESS));
    }
}
