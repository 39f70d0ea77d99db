//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvDataSource;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::static_quotes::StaticQuotes;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig};
use crate::domain::config_validation::{parse_date, validate_config};
use crate::domain::error::TbtraderError;
use crate::domain::optimizer;
use crate::domain::repository::MarketDataRepository;
use crate::domain::screener;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataSource;

#[derive(Parser, Debug)]
#[command(name = "tbtrader", about = "Treynor-Black equity strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a walk-forward backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Write the equity curve as CSV (date,equity)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override the configured first trade date
        #[arg(long)]
        start_date: Option<chrono::NaiveDate>,
        /// Override the configured last trade date
        #[arg(long)]
        end_date: Option<chrono::NaiveDate>,
    },
    /// Screen the universe as of the configured start date
    Screen {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Compute the optimal risky portfolio as of the start date
    Allocate {
        #[arg(short, long)]
        config: PathBuf,
        /// Cash to allocate; defaults to initial_capital
        #[arg(long)]
        cash: Option<f64>,
    },
    /// Show data coverage for the configured universe
    Info {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            output,
            start_date,
            end_date,
        } => run_backtest(&config, output.as_ref(), start_date, end_date),
        Command::Screen { config } => run_screen(&config),
        Command::Allocate { config, cash } => run_allocate(&config, cash),
        Command::Info { config } => run_info(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = TbtraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, TbtraderError> {
    Ok(BacktestConfig {
        data_from: parse_date(adapter, "backtest", "from")?,
        start_date: parse_date(adapter, "backtest", "start_date")?,
        end_date: parse_date(adapter, "backtest", "end_date")?,
        initial_capital: adapter.get_double("backtest", "initial_capital", 100_000.0),
        risk_free_rate: adapter.get_double("backtest", "risk_free_rate", 0.05),
    })
}

/// Load config, validate, apply any date overrides, and initialize a
/// repository positioned at the start date. Shared front half of every
/// subcommand.
fn setup(
    config_path: &PathBuf,
    start_override: Option<chrono::NaiveDate>,
    end_override: Option<chrono::NaiveDate>,
) -> Result<(FileConfigAdapter, BacktestConfig, MarketDataRepository), ExitCode> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;

    if let Err(e) = validate_config(&adapter) {
        eprintln!("error: {e}");
        return Err((&e).into());
    }

    let mut bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return Err((&e).into());
        }
    };
    if let Some(start) = start_override {
        bt_config.start_date = start;
    }
    if let Some(end) = end_override {
        bt_config.end_date = end;
    }
    if bt_config.start_date < bt_config.data_from || bt_config.end_date < bt_config.start_date {
        eprintln!("error: overridden dates fall outside the data window");
        return Err(ExitCode::from(2));
    }

    let data_path = adapter
        .get_string("data", "path")
        .expect("validated above");
    let source = CsvDataSource::new(PathBuf::from(data_path));

    eprintln!(
        "Loading market data: {} to {}",
        bt_config.data_from, bt_config.end_date
    );
    let repo = match MarketDataRepository::initialize(
        &source,
        bt_config.start_date,
        bt_config.data_from,
        bt_config.end_date,
    ) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return Err((&e).into());
        }
    };
    eprintln!("Universe: {} symbols with sufficient history", repo.symbols().len());

    Ok((adapter, bt_config, repo))
}

fn run_backtest(
    config_path: &PathBuf,
    output_path: Option<&PathBuf>,
    start_override: Option<chrono::NaiveDate>,
    end_override: Option<chrono::NaiveDate>,
) -> ExitCode {
    let (_adapter, bt_config, mut repo) = match setup(config_path, start_override, end_override) {
        Ok(parts) => parts,
        Err(code) => return code,
    };

    eprintln!(
        "Running backtest: {} to {}",
        bt_config.start_date, bt_config.end_date
    );

    let result = match backtest_engine::run_backtest(&mut repo, &bt_config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let metrics = &result.metrics;
    eprintln!("\n=== Results ===");
    eprintln!("Simulated Days:   {}", result.simulated_days);
    eprintln!("Skipped Days:     {}", result.skipped_days);
    eprintln!("Total Return:     {:.2}%", metrics.total_return * 100.0);
    eprintln!("Annualized:       {:.2}%", metrics.annualized_return * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
    eprintln!("Sortino Ratio:    {:.2}", metrics.sortino_ratio);
    eprintln!("Max Drawdown:     -{:.1}%", metrics.max_drawdown * 100.0);
    eprintln!("Drawdown Days:    {}", metrics.max_drawdown_duration);

    if let Some(output) = output_path {
        if let Err(e) = write_equity_curve(output, &result.equity_curve) {
            eprintln!("error: failed to write equity curve: {e}");
            return ExitCode::from(1);
        }
        eprintln!("\nEquity curve written to: {}", output.display());
    }

    ExitCode::SUCCESS
}

fn write_equity_curve(
    path: &PathBuf,
    curve: &[crate::domain::metrics::EquityPoint],
) -> Result<(), TbtraderError> {
    let mut wtr = csv::Writer::from_path(path).map_err(csv_io)?;
    for point in curve {
        wtr.write_record([point.date.to_string(), format!("{:.2}", point.equity)])
            .map_err(csv_io)?;
    }
    wtr.flush()?;
    Ok(())
}

fn csv_io(e: csv::Error) -> TbtraderError {
    TbtraderError::DataSource {
        reason: e.to_string(),
    }
}

fn run_screen(config_path: &PathBuf) -> ExitCode {
    let (_adapter, bt_config, mut repo) = match setup(config_path, None, None) {
        Ok(parts) => parts,
        Err(code) => return code,
    };

    if let Err(e) = repo.recompute_regressions() {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let selection = screener::screen_equities(&repo);
    for symbol in &selection {
        println!("{symbol}");
    }
    eprintln!(
        "{} of {} symbols pass the screen on {}",
        selection.len(),
        repo.symbols().len(),
        bt_config.start_date
    );
    ExitCode::SUCCESS
}

fn run_allocate(config_path: &PathBuf, cash_override: Option<f64>) -> ExitCode {
    let (adapter, bt_config, mut repo) = match setup(config_path, None, None) {
        Ok(parts) => parts,
        Err(code) => return code,
    };

    if let Err(e) = repo.recompute_regressions() {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let selection = screener::screen_equities(&repo);
    eprintln!("{} symbols pass the screen", selection.len());

    // Whole-share rounding is priced off each symbol's last known close.
    let mut quotes = StaticQuotes::new();
    for symbol in &selection {
        if let Some((_, price)) = repo.past_stock_prices(symbol).last() {
            quotes.set_price(symbol, price);
        }
    }

    let cash = cash_override.unwrap_or(bt_config.initial_capital);
    let max_adjustment = adapter.get_double("backtest", "max_adjustment", 0.2);

    let allocation =
        match optimizer::calculate_with_adjustment(&repo, &selection, &quotes, cash, max_adjustment)
        {
            Ok(a) => a,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

    let mut weights: Vec<(&String, &f64)> = allocation.iter().collect();
    weights.sort_by(|a, b| a.0.cmp(b.0));
    for (symbol, weight) in weights {
        println!("{symbol}\t{weight:.6}\t{:.2}", weight * cash);
    }
    ExitCode::SUCCESS
}

fn run_info(config_path: &PathBuf) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let data_path = adapter.get_string("data", "path").expect("validated above");
    let source = CsvDataSource::new(PathBuf::from(data_path));

    let symbols = match source.list_symbols() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let from = bt_config.data_from;
    let to = bt_config.end_date;

    match source.index_prices(from, to) {
        Ok(index) => print_range("index", &index),
        Err(e) => eprintln!("index: {e}"),
    }
    match source.tbill_returns(from, to) {
        Ok(tbills) => print_range("tbill", &tbills),
        Err(e) => eprintln!("tbill: {e}"),
    }

    let symbol_set = symbols.iter().cloned().collect();
    let prices = match source.stock_prices(&symbol_set, from, to) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    for symbol in &symbols {
        print_range(symbol, &prices[symbol]);
    }
    ExitCode::SUCCESS
}

fn print_range(name: &str, series: &crate::domain::series::DatedSeries) {
    match (series.first(), series.last()) {
        (Some((first, _)), Some((last, _))) => {
            println!("{}: {} points, {} to {}", name, series.len(), first, last);
        }
        _ => println!("{name}: no data"),
    }
}
