use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use ruleq::config::Settings;
use ruleq::query::{self, Combinator, QueryBuilder, RuleGroup};
use ruleq::{dataset, record, table, values, Record, Schema};

#[derive(Parser)]
#[command(name = "ruleq", about = "Filter JSON/YAML records with nested rule groups")]
struct Cli {
    #[arg(long, env = "RULEQ_DATA", help = "Record file or directory of record files")]
    data: Option<PathBuf>,

    #[arg(long, env = "RULEQ_CONFIG", help = "Settings file (schema, today, date_format)")]
    config: Option<PathBuf>,

    #[arg(long, help = "Read record file paths from stdin")]
    stdin: bool,

    #[arg(long, conflicts_with = "rules", help = "Rule group as a JSON or YAML file")]
    query: Option<PathBuf>,

    #[arg(
        long = "where",
        value_name = "RULE",
        help = "Rule in `field operator [value]` form (repeatable)"
    )]
    rules: Vec<String>,

    #[arg(long, requires = "rules", help = "Match any --where rule instead of all")]
    any: bool,

    #[arg(long, value_name = "YYYY-MM-DD", help = "Reference date for relative operators")]
    today: Option<NaiveDate>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[arg(long, value_name = "FIELD", help = "List unique values of a field among matches")]
    values: Option<String>,

    #[arg(long, help = "Show count for each value (use with --values)")]
    count: bool,

    #[arg(long, help = "List schema fields and their operators")]
    fields: bool,

    #[arg(short, long, help = "Log progress to stderr")]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(true) => ExitCode::from(0),
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

/// `Ok(true)` when something was printed for the user.
fn run(cli: Cli) -> Result<bool> {
    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    if cli.fields {
        return Ok(run_fields_mode(&settings.fields));
    }

    let query = build_query(&cli)?;
    let today = cli
        .today
        .or(settings.today)
        .unwrap_or_else(|| Local::now().date_naive());

    let files = if cli.stdin {
        dataset::read_paths_from_stdin()
    } else {
        let Some(root) = cli.data.as_deref() else {
            bail!("No data path specified. Use --data or set RULEQ_DATA");
        };
        if !root.exists() {
            bail!("Data path {} does not exist", root.display());
        }
        dataset::collect_record_files(root)
    };

    let records = record::load_dataset(&files, &settings.fields)?;
    tracing::info!(files = files.len(), records = records.len(), %today, "dataset loaded");

    let matched = query::apply_filters_at(&records, &query, today);
    tracing::info!(matched = matched.len(), "filters applied");

    if let Some(field) = cli.values.as_deref() {
        return Ok(run_values_mode(&matched, field, cli.count));
    }

    match cli.format {
        OutputFormat::Table => print!(
            "{}",
            table::render_table(&matched, records.len(), &settings.fields, &settings.date_format)
        ),
        OutputFormat::Json => print!(
            "{}",
            table::render_json_lines(&matched).context("Failed to encode records")?
        ),
    }

    Ok(!matched.is_empty())
}

/// No query at all matches every record.
fn build_query(cli: &Cli) -> Result<RuleGroup> {
    if let Some(path) = cli.query.as_deref() {
        return query::load_query(path).context("Failed to load query");
    }

    let mut builder = QueryBuilder::empty();
    for line in &cli.rules {
        let rule = query::parse_rule(line).with_context(|| format!("Invalid rule `{line}`"))?;
        builder = builder.with_row(&rule.field, rule.operator.as_str(), &rule.value.encoded());
    }
    if cli.any {
        builder = builder.with_combinator(Combinator::Or);
    }

    let group = builder.build();
    let dropped = builder.rows().len() - group.rules.len();
    if dropped > 0 {
        tracing::warn!(dropped, "ignoring incomplete rules");
    }
    Ok(group)
}

fn run_values_mode(matched: &[&Record], field: &str, show_count: bool) -> bool {
    let counts = values::collect_values(matched, field);

    if counts.is_empty() {
        return false;
    }

    for line in values::format_values(counts, show_count) {
        println!("{}", line);
    }

    true
}

fn run_fields_mode(schema: &Schema) -> bool {
    for field in schema.fields() {
        let operators: Vec<String> = field
            .kind
            .operators()
            .iter()
            .map(|op| format!("{} ({})", op, field.kind.operator_label(op)))
            .collect();
        println!("{} [{}]: {}", field.name, field.kind, operators.join(", "));
    }

    !schema.fields().is_empty()
}
