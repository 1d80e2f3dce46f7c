use anyhow::Context;
use battlecard_core::analysis::competitors::{write_competitor_template, COMPETITOR_TEMPLATE_PATH};
use battlecard_core::analysis::quarterly::{load_history, sample_history, write_history_template, DEFAULT_QUARTERS, HISTORY_TEMPLATE_PATH};
use battlecard_core::analysis::{
    compare_competitors, parse_competitors, split_quarters, ComparisonSummary, MetricSet, QuarterlyHistory, SummaryTables,
};
use battlecard_core::compute::{FlowPreparer, PreparedFlow};
use battlecard_core::config::AppConfig;
use battlecard_core::display::chart::{chart_title, comparison_title};
use battlecard_core::display::{
    format_comparison, format_competitor_report, format_quarterly_report, format_summary, ChartRenderer, ChartSize, ChartSpec, OutputFormat, PlotlyHtmlRenderer, TableFormat,
};
use battlecard_core::external::news::sample_articles;
use battlecard_core::external::{
    categorize_news, filter_by_keywords, recent_developments_markdown, NewsReport, NewsSource, StaticNewsSource,
    UnimplementedNewsSource,
};
use battlecard_core::graph::FlowGraph;
use battlecard_core::store::template::{
    company_template, company_template_path, generic_template, sample_records, write_template, DEFAULT_TEMPLATE_PATH,
};
use battlecard_core::store::{FlowRecord, Loader};
use battlecard_core::{logging, Error, ValidationError};
use chrono::{Days, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::warn;

const COMPARISON_SIZE: ChartSize = ChartSize { width: 1400, height: 700 };

/// Revenue-flow Sankey charts and comparison tables for memory-semiconductor
/// battle cards.
#[derive(Parser, Debug)]
#[command(name = "battlecard", version, about, long_about = None)]
struct Cli {
    /// TOML config file (default: $BATTLECARD_CONFIG, then ./battlecard.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log more (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print segment/end-market summaries and write a Sankey chart
    Sankey(SankeyArgs),
    /// Side-by-side Sankey of two companies, or two quarters of one table
    Compare(CompareArgs),
    /// Write a pre-filled input file
    Template(TemplateArgs),
    /// Collect recent news for the battle card
    News(NewsArgs),
    /// Quarter-over-quarter trend tables from a results history
    Quarterly(QuarterlyArgs),
    /// Side-by-side financial, technology and market tables for competitors
    Competitors(CompetitorsArgs),
}

#[derive(Args, Debug)]
struct SankeyArgs {
    /// Flow table (source,target,value)
    #[arg(short, long, conflicts_with = "demo")]
    data: Option<PathBuf>,
    /// Use the built-in Micron Q2 FY25 data
    #[arg(long)]
    demo: bool,
    /// Company name, selects segment colours (Micron, SK Hynix, Samsung, ...)
    #[arg(short, long)]
    company: Option<String>,
    /// Quarter label, e.g. "Q2 FY25"
    #[arg(short, long)]
    quarter: Option<String>,
    /// Chart title (default from config)
    #[arg(short, long)]
    title: Option<String>,
    #[arg(short, long, default_value = "sankey_revenue.html")]
    output: PathBuf,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Html)]
    format: OutputFormat,
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    /// Show every flow as a percentage of total revenue
    #[arg(long)]
    normalize: bool,
    /// Map free-form end-market names onto the standard set
    #[arg(long)]
    canonicalize_markets: bool,
}

#[derive(Args, Debug)]
struct CompareArgs {
    /// First company's flow table
    #[arg(long, requires = "company2")]
    company1: Option<PathBuf>,
    /// Second company's flow table
    #[arg(long, requires = "company1")]
    company2: Option<PathBuf>,
    /// First company name (default: derived from the file name)
    #[arg(long)]
    name1: Option<String>,
    #[arg(long)]
    name2: Option<String>,
    /// Single table with a quarter column
    #[arg(short, long, conflicts_with_all = ["company1", "company2"])]
    data: Option<PathBuf>,
    /// Two comma-separated quarters, e.g. "Q1 FY25,Q2 FY25"
    #[arg(short, long, requires = "data")]
    quarters: Option<String>,
    #[arg(short, long, default_value = "comparison_sankey.html")]
    output: PathBuf,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Html)]
    format: OutputFormat,
    #[arg(long)]
    normalize: bool,
    /// Print the category comparison table
    #[arg(long)]
    summary: bool,
    /// Also write the comparison table to this file
    #[arg(long)]
    summary_out: Option<PathBuf>,
    /// Render the comparison table as markdown
    #[arg(long)]
    markdown: bool,
    #[arg(long)]
    canonicalize_markets: bool,
}

#[derive(Args, Debug)]
struct TemplateArgs {
    /// Use this company's segment names
    #[arg(short, long)]
    company: Option<String>,
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum NewsFormat {
    Json,
    Markdown,
}

#[derive(Args, Debug)]
struct NewsArgs {
    #[arg(short, long)]
    company: Option<String>,
    #[arg(short, long)]
    ticker: Option<String>,
    /// Comma-separated keywords, e.g. "HBM,AI,datacenter"
    #[arg(short, long)]
    keywords: Option<String>,
    /// Days to look back
    #[arg(long, default_value_t = 180)]
    days: u32,
    /// Most recent articles listed in the markdown section
    #[arg(long, default_value_t = 10)]
    limit: usize,
    #[arg(short, long, value_enum, default_value_t = NewsFormat::Json)]
    format: NewsFormat,
    /// Markdown output uses the same name with a `.md` extension
    #[arg(short, long, default_value = "recent_developments.json")]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct QuarterlyArgs {
    #[arg(short, long)]
    company: String,
    /// Results history (Quarter,Fiscal_Year,Date,Revenue_Total_B,...); sample data if omitted
    #[arg(short, long)]
    data: Option<PathBuf>,
    /// Most recent quarters to show
    #[arg(short, long, default_value_t = DEFAULT_QUARTERS)]
    quarters: usize,
    #[arg(short, long, default_value = "quarterly_comparison.md")]
    output: PathBuf,
    /// Write historical_data_template.csv and exit
    #[arg(long)]
    create_template: bool,
}

#[derive(Args, Debug)]
struct CompetitorsArgs {
    /// Comma-separated names, e.g. "Micron,Samsung,SK Hynix"
    #[arg(long)]
    competitors: Option<String>,
    #[arg(short, long, value_enum, default_value_t = MetricSet::All)]
    metrics: MetricSet,
    /// Directory holding the <name>_data.json files
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,
    #[arg(short, long, default_value = "competitor_comparison.md")]
    output: PathBuf,
    /// Write competitor_comparison_template.csv and exit
    #[arg(long)]
    create_template: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain().find_map(|e| e.downcast_ref::<Error>()).map(Error::exit_code).unwrap_or(1)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load(cli.config.as_deref()).map_err(Error::from)?;
    match cli.command {
        Command::Sankey(args) => sankey(&config, args),
        Command::Compare(args) => compare(&config, args),
        Command::Template(args) => template(args),
        Command::News(args) => news(args),
        Command::Quarterly(args) => quarterly(args),
        Command::Competitors(args) => competitors(args),
    }
}

fn preparer<'a>(config: &'a AppConfig, company: Option<&str>, normalize: bool) -> FlowPreparer<'a> {
    FlowPreparer::new(&config.palette)
        .with_company(company)
        .normalized(normalize)
        .with_root_candidates(config.normalize.root_candidates.clone())
}

fn load_records(loader: &Loader, path: &Path) -> anyhow::Result<Vec<FlowRecord>> {
    let table = loader.load(path).map_err(Error::from).with_context(|| format!("loading {}", path.display()))?;
    Ok(table.records)
}

fn render(spec: &ChartSpec<'_>, size: ChartSize, output: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let written = PlotlyHtmlRenderer.render(spec, size, output, format).map_err(Error::from)?;
    for path in &written {
        println!("Saved: {}", path.display());
    }
    if let Some(first) = written.first() {
        println!("\nOpen {} in a web browser to view the interactive diagram.", first.display());
    }
    Ok(())
}

fn sankey(config: &AppConfig, mut args: SankeyArgs) -> anyhow::Result<()> {
    let loader = Loader::new().canonicalize_markets(args.canonicalize_markets);
    let records = match (&args.data, args.demo) {
        (Some(path), _) => load_records(&loader, path)?,
        (None, true) => {
            println!("Running demo with sample Micron Q2 FY25 data...\n");
            args.company.get_or_insert_with(|| "Micron".to_string());
            args.quarter.get_or_insert_with(|| "Q2 FY25".to_string());
            sample_records()
        }
        (None, false) => return Err(Error::from(ValidationError::MissingData).into()),
    };

    let raw = FlowGraph::build(&records).map_err(Error::from)?;
    print!("{}", format_summary(&SummaryTables::build(&raw), TableFormat::Plain));

    let prepared = preparer(config, args.company.as_deref(), args.normalize).prepare(&records).map_err(Error::from)?;

    println!("\nGenerating Sankey diagram...");
    let title = args.title.as_deref().unwrap_or(&config.chart.title);
    let spec = ChartSpec::Single {
        data: &prepared.sankey,
        title: chart_title(title, args.company.as_deref(), args.quarter.as_deref()),
    };
    let size = ChartSize {
        width: args.width.unwrap_or(config.chart.width),
        height: args.height.unwrap_or(config.chart.height),
    };
    render(&spec, size, &args.output, args.format)
}

/// `sk_hynix_q2.csv` -> `Sk Hynix Q2`
fn name_from_path(path: &Path) -> String {
    let stem = path.file_stem().map(|s| s.to_string_lossy().replace('_', " ")).unwrap_or_default();
    stem.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Prepared flows and unscaled graphs for both sides of a comparison.
struct Sides {
    names: (String, String),
    titles: (String, String),
    /// Without the unit suffix.
    main_title: String,
    prepared: (PreparedFlow, PreparedFlow),
    raw: (FlowGraph, FlowGraph),
}

fn compare(config: &AppConfig, args: CompareArgs) -> anyhow::Result<()> {
    let loader = Loader::new().canonicalize_markets(args.canonicalize_markets);

    let sides = match (&args.company1, &args.company2, &args.data, &args.quarters) {
        (Some(path1), Some(path2), _, _) => {
            let name1 = args.name1.clone().unwrap_or_else(|| name_from_path(path1));
            let name2 = args.name2.clone().unwrap_or_else(|| name_from_path(path2));
            let (left, right) = (load_records(&loader, path1)?, load_records(&loader, path2)?);
            println!("Creating comparison: {name1} vs {name2}");
            Sides {
                prepared: (
                    preparer(config, Some(name1.as_str()), args.normalize).prepare(&left).map_err(Error::from)?,
                    preparer(config, Some(name2.as_str()), args.normalize).prepare(&right).map_err(Error::from)?,
                ),
                raw: (FlowGraph::build(&left).map_err(Error::from)?, FlowGraph::build(&right).map_err(Error::from)?),
                titles: (name1.clone(), name2.clone()),
                names: (name1, name2),
                main_title: "Revenue Flow Comparison".to_string(),
            }
        }
        (_, _, Some(path), Some(quarters)) => {
            let quarters: Vec<&str> = quarters.split(',').map(str::trim).filter(|q| !q.is_empty()).collect();
            let [q1, q2] = quarters[..] else {
                return Err(Error::from(ValidationError::QuarterCount(quarters.len())).into());
            };
            let table = loader.load(path).map_err(Error::from).with_context(|| format!("loading {}", path.display()))?;
            let (left, right) = split_quarters(&table, q1, q2).map_err(Error::from)?;

            let company = args.name1.as_deref();
            let prefix = company.map(|c| format!("{c} ")).unwrap_or_default();
            println!("Creating quarterly comparison: {q1} vs {q2}");
            Sides {
                prepared: (
                    preparer(config, company, args.normalize).prepare(&left).map_err(Error::from)?,
                    preparer(config, company, args.normalize).prepare(&right).map_err(Error::from)?,
                ),
                raw: (FlowGraph::build(&left).map_err(Error::from)?, FlowGraph::build(&right).map_err(Error::from)?),
                names: (q1.to_string(), q2.to_string()),
                titles: (format!("{prefix}{q1}"), format!("{prefix}{q2}")),
                main_title: format!("{prefix}Quarterly Revenue Comparison"),
            }
        }
        _ => return Err(Error::from(ValidationError::MissingComparisonInputs).into()),
    };

    let spec = ChartSpec::Comparison {
        left: (&sides.prepared.0.sankey, sides.titles.0.clone()),
        right: (&sides.prepared.1.sankey, sides.titles.1.clone()),
        title: comparison_title(&sides.main_title, sides.prepared.0.sankey.scale),
    };
    render(&spec, COMPARISON_SIZE, &args.output, args.format)?;

    if args.summary || args.summary_out.is_some() {
        let summary = ComparisonSummary::build(&sides.raw.0, &sides.names.0, &sides.raw.1, &sides.names.1);
        let format = if args.markdown { TableFormat::Markdown } else { TableFormat::Plain };
        let text = format_comparison(&summary, format);
        if args.summary {
            print!("{text}");
        }
        if let Some(path) = &args.summary_out {
            fs::write(path, &text).with_context(|| format!("writing {}", path.display()))?;
            println!("Summary saved: {}", path.display());
        }
    }
    Ok(())
}

fn template(args: TemplateArgs) -> anyhow::Result<()> {
    let (path, contents) = match &args.company {
        Some(company) => (args.output.clone().unwrap_or_else(|| company_template_path(company)), company_template(company)),
        None => (args.output.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_PATH)), generic_template()),
    };
    write_template(&path, &contents).with_context(|| format!("writing {}", path.display()))?;
    println!("Created template: {}", path.display());
    println!("Fill in the values and run: battlecard sankey --data {}", path.display());
    Ok(())
}

fn news(args: NewsArgs) -> anyhow::Result<()> {
    let since = lookback_start(chrono::Local::now().date_naive(), args.days).map_err(Error::from)?;

    let (company, ticker, articles) = match (&args.company, &args.ticker) {
        (Some(company), Some(ticker)) => {
            let articles = match UnimplementedNewsSource.fetch_by_ticker(ticker, since) {
                Ok(found) if !found.is_empty() => found,
                Ok(_) => {
                    warn!(ticker = %ticker, "no articles found; using sample data");
                    sample_news(ticker, since)?
                }
                Err(err) => {
                    warn!(error = %err, "news service unavailable; using sample data");
                    sample_news(ticker, since)?
                }
            };
            (company.clone(), ticker.clone(), articles)
        }
        _ => {
            warn!("no --company/--ticker given; running with sample data");
            ("Micron".to_string(), "MU".to_string(), sample_news("MU", since)?)
        }
    };

    println!("{}", "=".repeat(60));
    println!("Tracking News: {company} ({ticker})");
    println!("Period: Last {} days", args.days);
    println!("{}\n", "=".repeat(60));

    let articles = match &args.keywords {
        Some(keywords) => {
            let keywords: Vec<&str> = keywords.split(',').map(str::trim).filter(|k| !k.is_empty()).collect();
            println!("Filtering by keywords: {}", keywords.join(", "));
            filter_by_keywords(articles, &keywords[..])
        }
        None => articles,
    };
    println!("Found {} relevant articles\n", articles.len());

    println!("Articles by category:");
    for (category, items) in categorize_news(&articles) {
        if !items.is_empty() {
            println!("   {}: {} articles", category.as_str(), items.len());
        }
    }

    let (path, contents) = match args.format {
        NewsFormat::Json => {
            let report = NewsReport::new(&company, &ticker, args.days, articles);
            (args.output.clone(), serde_json::to_string_pretty(&report)?)
        }
        NewsFormat::Markdown => (args.output.with_extension("md"), recent_developments_markdown(&articles, args.limit)),
    };
    fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
    println!("\nNews data saved to: {}", path.display());
    Ok(())
}

fn quarterly(args: QuarterlyArgs) -> anyhow::Result<()> {
    if args.create_template {
        let path = Path::new(HISTORY_TEMPLATE_PATH);
        write_history_template(path).map_err(Error::from).with_context(|| format!("writing {}", path.display()))?;
        println!("Created template: {}", path.display());
        println!("Fill in actual results and run: battlecard quarterly --company \"{}\" --data {}", args.company, path.display());
        return Ok(());
    }

    let records = match &args.data {
        Some(path) => load_history(path).map_err(Error::from).with_context(|| format!("loading {}", path.display()))?,
        None => {
            println!("No data file provided. Using sample data for demonstration...\n");
            sample_history()
        }
    };
    let history = QuarterlyHistory::build(records);

    let report = format_quarterly_report(&args.company, &history, args.quarters, chrono::Local::now().naive_local());
    print!("{report}");
    fs::write(&args.output, &report).with_context(|| format!("writing {}", args.output.display()))?;
    println!("\nSaved comparison to {}", args.output.display());
    Ok(())
}

fn competitors(args: CompetitorsArgs) -> anyhow::Result<()> {
    if args.create_template {
        let path = Path::new(COMPETITOR_TEMPLATE_PATH);
        write_competitor_template(path).map_err(Error::from).with_context(|| format!("writing {}", path.display()))?;
        println!("Template created: {}", path.display());
        println!("Edit this file with actual competitor data, then use for comparisons.");
        return Ok(());
    }

    let names = args.competitors.as_deref().map(parse_competitors).unwrap_or_default();
    if names.is_empty() {
        return Err(Error::from(ValidationError::MissingCompetitors).into());
    }

    println!("{}", "=".repeat(60));
    println!("Comparing Competitors: {}", names.join(", "));
    println!("{}\n", "=".repeat(60));

    let tables = compare_competitors(&args.data_dir, &names, args.metrics).map_err(Error::from)?;
    fs::write(&args.output, format_competitor_report(&tables)).with_context(|| format!("writing {}", args.output.display()))?;
    println!("Comparison saved to: {}", args.output.display());
    Ok(())
}

/// First day of the `days`-long window ending on `today`.
fn lookback_start(today: NaiveDate, days: u32) -> Result<NaiveDate, ValidationError> {
    today.checked_sub_days(Days::new(u64::from(days))).ok_or(ValidationError::DaysOutOfRange(days))
}

fn sample_news(ticker: &str, since: NaiveDate) -> anyhow::Result<Vec<battlecard_core::external::Article>> {
    let today = chrono::Local::now().date_naive();
    Ok(StaticNewsSource::new(sample_articles(today)).fetch_by_ticker(ticker, since).map_err(Error::from)?)
}
