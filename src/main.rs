use analytics::{nearest, return_between, AnalysisReport, AnalyticsEngine};
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime, Utc};
use clap::{Args, Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use configuration::{load_config, Config, DcaFrequency, RegimeStrategyKind};
use core_types::{AnalysisSession, ColumnRole};
use dca::{project, simulate, DcaProjection, DcaResult, DcaValuation};
use ingest::{
    normalize, resolve_mapping, trailing_window_start, window_filter, NormalizedSeries, RawTable,
};
use rust_decimal::prelude::*;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// The main entry point for the Cycle Lens analysis tool.
fn main() -> Result<()> {
    // A missing .env file is fine; RUST_LOG and CYCLE_LENS__* may come from the shell.
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Analyze(args) => handle_analyze(args, config),
        Commands::Returns(args) => handle_returns(args, config),
        Commands::Dca(args) => handle_dca(args, config),
        Commands::ProjectDca(args) => handle_project_dca(args, config),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Cycle analytics for a daily price history.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file (defaults to ./config.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Yearly extremes, smoothing, regime means and market-cap scenarios.
    Analyze(AnalyzeArgs),
    /// Return between the observations nearest to two dates.
    Returns(ReturnsArgs),
    /// Replay a dollar-cost-averaging plan against history.
    Dca(DcaArgs),
    /// Estimate a recurring purchase plan at the recent average price.
    ProjectDca(ProjectDcaArgs),
}

#[derive(Args)]
struct SourceArgs {
    /// The CSV file holding the price history.
    #[arg(long, short)]
    file: PathBuf,
}

#[derive(Args)]
struct AnalyzeArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Analyze the full history instead of the trailing window.
    #[arg(long)]
    all_history: bool,

    /// Override the trailing window length in days.
    #[arg(long, conflicts_with = "all_history")]
    window_days: Option<u32>,

    /// Override the bull/bear mean algorithm.
    #[arg(long, value_enum)]
    regime: Option<RegimeStrategyKind>,

    /// Emit the full report as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ReturnsArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// First date (format: YYYY-MM-DD).
    #[arg(long)]
    from: NaiveDate,

    /// Second date (format: YYYY-MM-DD).
    #[arg(long)]
    to: NaiveDate,
}

#[derive(Args)]
struct DcaArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Amount spent on each purchase.
    #[arg(long)]
    amount: Option<Decimal>,

    /// Rows between purchases.
    #[arg(long)]
    cadence: Option<u32>,

    /// First day of the plan (format: YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last day of the plan (format: YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Price the accumulated units are valued at (defaults to the last price).
    #[arg(long)]
    reference_price: Option<Decimal>,

    /// List every simulated purchase.
    #[arg(long)]
    purchases: bool,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ProjectDcaArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[arg(long)]
    amount: Option<Decimal>,

    #[arg(long, value_enum)]
    frequency: Option<DcaFrequency>,

    #[arg(long)]
    years: Option<u32>,

    #[arg(long)]
    json: bool,
}

// ==============================================================================
// Session Loading
// ==============================================================================

/// Reads, classifies and normalizes the CSV into a fresh session.
fn load_session(path: &Path, config: &Config) -> Result<AnalysisSession> {
    let table = RawTable::from_csv_path(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mapping = resolve_mapping(&table.headers, &config.columns)
        .context("Failed to resolve the column mapping")?;
    let normalized = normalize(&table, &config.columns, &mapping)
        .with_context(|| format!("No usable rows in {}", path.display()))?;

    if let Some(notice) = cleanup_notice(&normalized) {
        eprintln!("{notice}");
    }
    tracing::info!(
        source = %path.display(),
        observations = normalized.series.len(),
        "Loaded price history"
    );

    Ok(AnalysisSession::new(
        path.display().to_string(),
        normalized.series,
        mapping,
    ))
}

/// Summarizes the rows normalization threw away, if any.
fn cleanup_notice(normalized: &NormalizedSeries) -> Option<String> {
    if normalized.skipped.is_empty() && normalized.duplicates_dropped == 0 {
        return None;
    }
    Some(format!(
        "Skipped {} unparsable row(s), dropped {} duplicate timestamp(s).",
        normalized.skipped.len(),
        normalized.duplicates_dropped
    ))
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ==============================================================================
// Analyze Command Logic
// ==============================================================================

fn handle_analyze(args: AnalyzeArgs, mut config: Config) -> Result<()> {
    if let Some(kind) = args.regime {
        config.analysis.regime_strategy = kind;
    }
    let window_days = if args.all_history {
        None
    } else {
        args.window_days.or(config.analysis.window_days)
    };

    let mut session = load_session(&args.source.file, &config)?;
    if let Some(days) = window_days {
        let since = trailing_window_start(Utc::now(), days);
        let windowed = window_filter(session.series(), since).with_context(|| {
            format!("No observations in the last {days} days; try --all-history")
        })?;
        session.replace_series(windowed);
    }

    let engine = AnalyticsEngine::new(config.analysis);
    let report = engine
        .calculate(session.series())
        .context("Failed to calculate the analysis report")?;

    if args.json {
        return print_json(&report);
    }
    render_report(&session, &report);
    Ok(())
}

fn render_report(session: &AnalysisSession, report: &AnalysisReport) {
    let summary = &report.summary;
    println!("--- {} ---", session.source);
    println!(
        "{} observations from {} to {}",
        summary.observation_count,
        summary.first_timestamp.date_naive(),
        summary.last_timestamp.date_naive()
    );
    let columns: Vec<String> = ColumnRole::ALL
        .into_iter()
        .map(|role| match session.mapping.get(role) {
            Some(column) => format!("{role}: {column}"),
            None => format!("{role}: -"),
        })
        .collect();
    println!("Columns: {}", columns.join(", "));

    let mut overview = new_table(vec!["Metric", "Value"]);
    overview
        .add_row(vec!["Last price".to_string(), format!("{:.2}", summary.last_price)])
        .add_row(vec!["Max price".to_string(), format!("{:.2}", summary.max_price)])
        .add_row(vec!["Min price".to_string(), format!("{:.2}", summary.min_price)]);
    for ma in &report.moving_averages {
        overview.add_row(vec![format!("SMA {}", ma.window), fmt_opt(ma.values.last_defined())]);
    }
    overview.add_row(vec![format!("EMA {}", report.ema_span), fmt_opt(report.ema.last_defined())]);
    println!("{overview}");

    let mut yearly = new_table(vec!["Year", "Min", "Max", "Range", "Growth x"]);
    for y in &report.yearly {
        yearly.add_row(vec![
            y.year.to_string(),
            format!("{:.2}", y.min),
            format!("{:.2}", y.max),
            format!("{:.2}", y.range),
            format!("{:.2}", y.growth_multiple),
        ]);
    }
    println!("{yearly}");
    println!(
        "Mean yearly range {:.2}, mean growth {:.2}x ({:.1}%)",
        report.yearly_summary.mean_range,
        report.yearly_summary.mean_growth_multiple,
        report.yearly_summary.average_growth_pct
    );

    let regime = &report.regime;
    println!(
        "Regime ({}): bull mean target {:.2}, bear mean target {:.2}",
        regime.strategy, regime.bull_mean_target, regime.bear_mean_target
    );

    if let Some(targets) = &report.targets {
        let mut table = new_table(vec!["Multiplier", "Projected price"]);
        for t in targets {
            table.add_row(vec![format!("{}x", t.multiplier), t.projected_price.to_string()]);
        }
        println!("{table}");
    }
    if let Some(risks) = &report.risks {
        let mut table = new_table(vec!["Drawdown", "Projected price"]);
        for r in risks {
            table.add_row(vec![format!("{}%", r.drawdown_pct), r.projected_price.to_string()]);
        }
        println!("{table}");
    }
    for skipped in &report.unavailable {
        println!("{} unavailable: {}", skipped.panel, skipped.reason);
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

// ==============================================================================
// Returns Command Logic
// ==============================================================================

fn handle_returns(args: ReturnsArgs, config: Config) -> Result<()> {
    let session = load_session(&args.source.file, &config)?;
    let series = session.series();

    let a = nearest(series, args.from.and_time(NaiveTime::MIN).and_utc())?;
    let b = nearest(series, args.to.and_time(NaiveTime::MIN).and_utc())?;
    let period = return_between(a, b).context("Failed to compute the return")?;

    let mut table = new_table(vec!["", "Date", "Price"]);
    table
        .add_row(vec![
            "From".to_string(),
            period.from.date_naive().to_string(),
            format!("{:.2}", period.price_from),
        ])
        .add_row(vec![
            "To".to_string(),
            period.to.date_naive().to_string(),
            format!("{:.2}", period.price_to),
        ]);
    println!("{table}");
    println!("Return {:.2}% ({:.2}x)", period.percent, period.multiple);
    Ok(())
}

// ==============================================================================
// DCA Command Logic
// ==============================================================================

fn handle_dca(args: DcaArgs, config: Config) -> Result<()> {
    let mut session = load_session(&args.source.file, &config)?;
    let series = session.series();
    let (first, last) = match (series.first(), series.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => anyhow::bail!("The series is empty"),
    };

    let mut settings = config.dca;
    settings.amount = args.amount.unwrap_or(settings.amount);
    settings.cadence_days = args.cadence.unwrap_or(settings.cadence_days);
    settings.start = args.from.or(settings.start);
    settings.end = args.to.or(settings.end);
    let plan = settings
        .to_plan(first.timestamp.date_naive(), last.timestamp.date_naive())
        .context("Invalid DCA plan")?;
    let last_price = Decimal::from_f64(last.price).context("Last price is not representable")?;

    let result = simulate(series, &plan).context("DCA simulation failed")?;
    let valuation = result
        .valuate(args.reference_price.unwrap_or(last_price))
        .context("DCA valuation failed")?;
    session.set_plan(plan);

    if args.json {
        return print_json(&serde_json::json!({ "result": result, "valuation": valuation }));
    }
    render_dca(&result, &valuation, args.purchases);
    Ok(())
}

fn render_dca(result: &DcaResult, valuation: &DcaValuation, with_purchases: bool) {
    let mut table = new_table(vec!["Metric", "Value"]);
    table
        .add_row(vec!["Purchases".to_string(), result.purchase_count.to_string()])
        .add_row(vec!["Total spent".to_string(), result.total_spent.round_dp(2).to_string()])
        .add_row(vec!["Units".to_string(), result.total_units.round_dp(8).to_string()])
        .add_row(vec!["Average cost".to_string(), result.average_cost.round_dp(2).to_string()])
        .add_row(vec![
            "Reference price".to_string(),
            valuation.reference_price.round_dp(2).to_string(),
        ])
        .add_row(vec![
            "Current value".to_string(),
            valuation.current_value.round_dp(2).to_string(),
        ])
        .add_row(vec!["Profit".to_string(), valuation.profit.round_dp(2).to_string()])
        .add_row(vec![
            "ROI".to_string(),
            valuation
                .roi_pct
                .map_or_else(|| "-".to_string(), |r| format!("{}%", r.round_dp(2))),
        ]);
    println!("{table}");

    if with_purchases {
        let mut purchases = new_table(vec!["Date", "Price", "Units", "Spent"]);
        for p in &result.purchases {
            purchases.add_row(vec![
                p.timestamp.date_naive().to_string(),
                p.price.round_dp(2).to_string(),
                p.units.round_dp(8).to_string(),
                p.cumulative_spent.round_dp(2).to_string(),
            ]);
        }
        println!("{purchases}");
    }
}

fn handle_project_dca(args: ProjectDcaArgs, config: Config) -> Result<()> {
    let session = load_session(&args.source.file, &config)?;

    let mut settings = config.dca;
    settings.amount = args.amount.unwrap_or(settings.amount);
    settings.frequency = args.frequency.unwrap_or(settings.frequency);
    settings.years = args.years.unwrap_or(settings.years);

    let projection = project(session.series(), &settings).context("DCA projection failed")?;

    if args.json {
        return print_json(&projection);
    }
    render_projection(&projection);
    Ok(())
}

fn render_projection(projection: &DcaProjection) {
    let frequency = match projection.frequency {
        DcaFrequency::Weekly => "weekly",
        DcaFrequency::Monthly => "monthly",
    };
    let mut table = new_table(vec!["Metric", "Value"]);
    table
        .add_row(vec![
            "Plan".to_string(),
            format!("{frequency} for {} year(s)", projection.years),
        ])
        .add_row(vec!["Purchases".to_string(), projection.purchase_count.to_string()])
        .add_row(vec![
            "Total invested".to_string(),
            projection.total_invested.round_dp(2).to_string(),
        ])
        .add_row(vec![
            "Average price".to_string(),
            projection.average_price.round_dp(2).to_string(),
        ])
        .add_row(vec!["Units".to_string(), projection.total_units.round_dp(8).to_string()]);
    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Series;
    use ingest::IngestError;

    fn normalized(skipped: usize, duplicates_dropped: usize) -> NormalizedSeries {
        NormalizedSeries {
            series: Series::default(),
            skipped: (0..skipped)
                .map(|i| IngestError::Parse {
                    row: i + 1,
                    reason: "bad price".to_string(),
                })
                .collect(),
            duplicates_dropped,
        }
    }

    #[test]
    fn clean_input_has_no_notice() {
        assert_eq!(cleanup_notice(&normalized(0, 0)), None);
    }

    #[test]
    fn duplicates_alone_are_reported() {
        assert_eq!(
            cleanup_notice(&normalized(0, 2)).as_deref(),
            Some("Skipped 0 unparsable row(s), dropped 2 duplicate timestamp(s).")
        );
    }

    #[test]
    fn skipped_rows_are_reported() {
        assert_eq!(
            cleanup_notice(&normalized(1, 0)).as_deref(),
            Some("Skipped 1 unparsable row(s), dropped 0 duplicate timestamp(s).")
        );
    }
}
