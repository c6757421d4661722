use anyhow::{Context, Result, bail};
use clap::Parser;
use dbdoc::annotations::Annotations;
use dbdoc::render::{DanglingPolicy, RenderOptions};
use dbdoc::sink::DirectorySink;
use dbdoc::sql::{Dialect, parse_sql};
use std::fs;
use std::path::PathBuf;
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Generate cross-linked HTML documentation from a SQL schema dump
#[derive(Parser, Debug)]
#[command(name = "dbdoc", version, about, long_about = None)]
struct Cli {
    /// SQL file containing CREATE TABLE / CREATE INDEX / ALTER TABLE statements
    #[arg(value_name = "SCHEMA_SQL")]
    schema: PathBuf,

    /// Directory receiving index.html and one table-<name>.html per table
    #[arg(value_name = "OUTDIR")]
    outdir: PathBuf,

    /// Properties file with schema/table/column/index annotations
    #[arg(value_name = "ANNOTATIONS", env = "DBDOC_ANNOTATIONS")]
    annotations: Option<PathBuf>,

    /// SQL dialect: auto, generic, postgres, mysql
    #[arg(short, long, default_value = "auto")]
    dialect: Dialect,

    /// Schema name shown in page titles (default: SQL file stem)
    #[arg(short = 'n', long)]
    schema_name: Option<String>,

    /// Only document these tables, in this order (repeatable)
    #[arg(short, long = "table", value_name = "TABLE")]
    tables: Vec<String>,

    /// Render foreign keys to unknown tables/columns without a link instead of failing
    #[arg(long)]
    allow_dangling: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let sql = fs::read_to_string(&cli.schema)
        .with_context(|| format!("Failed to read {}", cli.schema.display()))?;
    let schema_name = match cli.schema_name {
        Some(name) => name,
        None => cli
            .schema
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "schema".to_string()),
    };
    let schema = parse_sql(&sql, cli.dialect, &schema_name)
        .with_context(|| format!("Failed to parse {}", cli.schema.display()))?;
    if schema.tables().is_empty() {
        bail!("no CREATE TABLE statements found in {}", cli.schema.display());
    }

    let annotations = match &cli.annotations {
        Some(path) => Annotations::load(path)?,
        None => Annotations::new(),
    };
    info!(tables = schema.tables().len(), annotations = annotations.len(), "loaded inputs");

    fs::create_dir_all(&cli.outdir)
        .with_context(|| format!("Failed to create {}", cli.outdir.display()))?;
    let mut sink = DirectorySink::new(&cli.outdir);

    let options = RenderOptions {
        dangling: if cli.allow_dangling {
            DanglingPolicy::Unlinked
        } else {
            DanglingPolicy::Reject
        },
    };
    let subset = (!cli.tables.is_empty()).then_some(cli.tables.as_slice());
    let summary = dbdoc::render_schema(&schema, &annotations, subset, options, &mut sink)?;

    info!(
        tables = summary.tables,
        outdir = %cli.outdir.display(),
        "documentation written"
    );
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
