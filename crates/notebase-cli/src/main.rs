//! Notebase CLI - evaluate formula and rollup columns of a workspace file

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use notebase::prelude::*;
use notebase::{check_rollup, parse_formula, CalculationOptions, DependencyGraph};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "notebase")]
#[command(author, version, about = "Formula and rollup evaluation for database tables")]
struct Cli {
    /// More log output (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a formula against the rows of a table
    Eval {
        /// Workspace file (json)
        input: PathBuf,

        /// Formula source, e.g. 'prop("Price") * 2'
        formula: String,

        /// Table id or name
        #[arg(short, long)]
        table: String,

        /// Only evaluate this row
        #[arg(short, long)]
        row: Option<String>,

        /// Date used by now() (YYYY-MM-DD, default: today)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Render a table with its computed columns as CSV
    #[command(alias = "csv")]
    Render {
        /// Workspace file (json)
        input: PathBuf,

        /// Table id or name
        #[arg(short, long)]
        table: String,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Field delimiter (default: comma)
        #[arg(short, long, default_value = ",")]
        delimiter: char,

        /// Date used by now() (YYYY-MM-DD, default: today)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Report formula and rollup columns that cannot be computed
    Check {
        /// Workspace file (json)
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Eval {
            input,
            formula,
            table,
            row,
            today,
        } => eval(&input, &table, row.as_deref(), &formula, today),
        Commands::Render {
            input,
            table,
            output,
            delimiter,
            today,
        } => render(&input, &table, output.as_deref(), delimiter, today),
        Commands::Check { input } => check(&input),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn open(input: &Path) -> Result<Workspace> {
    Workspace::open(input).with_context(|| format!("Failed to open '{}'", input.display()))
}

fn find_table<'w>(workspace: &'w Workspace, table: &str) -> Result<&'w Table> {
    workspace
        .find_table(table)
        .with_context(|| format!("Table '{}' not found", table))
}

fn calculation_options(today: Option<NaiveDate>) -> CalculationOptions {
    CalculationOptions {
        today,
        ..Default::default()
    }
}

fn eval(
    input: &Path,
    table: &str,
    row: Option<&str>,
    formula: &str,
    today: Option<NaiveDate>,
) -> Result<()> {
    let workspace = open(input)?;
    let table = find_table(&workspace, table)?;
    let options = calculation_options(today);

    if let Err(e) = parse_formula(formula) {
        bail!("Invalid formula: {}", e);
    }

    let rows: Vec<&Row> = match row {
        Some(id) => vec![table
            .row(id)
            .with_context(|| format!("Row '{}' not found in '{}'", id, table.name))?],
        None => table.rows.iter().collect(),
    };

    for row in rows {
        let outcome = table.evaluate_formula(formula, row, &workspace, &options);
        if let FormulaOutcome::Error(e) = &outcome {
            log::info!("row {}: {}", row.id, e);
        }
        println!("{}\t{}", row.id, outcome.display());
    }

    Ok(())
}

fn render(
    input: &Path,
    table: &str,
    output: Option<&Path>,
    delimiter: char,
    today: Option<NaiveDate>,
) -> Result<()> {
    if !delimiter.is_ascii() {
        bail!("Delimiter must be a single ASCII character");
    }

    let workspace = open(input)?;
    let table = find_table(&workspace, table)?;
    let calculation =
        table.calculate_with_options(&workspace, &calculation_options(today));

    if calculation.stats.errors > 0 {
        eprintln!(
            "Calculated {} cells ({} errors)",
            calculation.stats.cells_calculated, calculation.stats.errors
        );
    }

    let sink: Box<dyn io::Write> = match output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to write '{}'", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter as u8)
        .from_writer(sink);

    writer
        .write_record(table.columns.iter().map(|c| c.name.as_str()))
        .context("Failed to write header")?;
    for row in &table.rows {
        writer
            .write_record(table.display_row(row, calculation.row(&row.id)))
            .with_context(|| format!("Failed to write row '{}'", row.id))?;
    }
    writer.flush().context("Failed to flush output")?;

    if let Some(path) = output {
        eprintln!("Wrote {} rows to '{}'", table.row_count(), path.display());
    }

    Ok(())
}

fn check(input: &Path) -> Result<()> {
    let workspace = open(input)?;
    let mut problems = 0;

    for table in workspace.tables() {
        println!("Table \"{}\" ({})", table.name, table.id);

        let circular = DependencyGraph::from_columns(&table.columns).circular_columns();

        for column in &table.columns {
            let status = match column.column_type {
                ColumnType::Formula => formula_status(column, &table.columns, &circular),
                ColumnType::Rollup => rollup_status(column, table, &workspace),
                _ => continue,
            };
            if status != "ok" {
                problems += 1;
            }
            println!("  {:<8} {:<24} {}", column.column_type.as_str(), column.name, status);
        }
    }

    if problems > 0 {
        bail!("{} column(s) cannot be computed", problems);
    }
    Ok(())
}

fn formula_status(column: &Column, columns: &[Column], circular: &[String]) -> String {
    let options = match column.formula_options() {
        Some(options) if options.has_valid_config() => options,
        _ => return "not configured".to_string(),
    };
    let ast = match parse_formula(&options.source) {
        Ok(ast) => ast,
        Err(e) => return format!("error: {}", e),
    };
    if circular.iter().any(|id| id == &column.id) {
        return "error: circular reference".to_string();
    }

    // bound id first, then the current name
    let resolves = |name: &str| {
        options
            .references
            .get(name)
            .map_or(false, |id| columns.iter().any(|c| &c.id == id))
            || columns.iter().any(|c| c.name == name)
    };
    let missing: Vec<&str> = ast
        .property_refs()
        .into_iter()
        .map(|r| r.name.as_str())
        .filter(|&name| !resolves(name))
        .collect();
    if missing.is_empty() {
        "ok".to_string()
    } else {
        format!("error: unknown property {}", missing.join(", "))
    }
}

fn rollup_status(column: &Column, table: &Table, workspace: &Workspace) -> String {
    let options = match column.rollup_options() {
        Some(options) => options,
        None => return "not configured".to_string(),
    };
    match check_rollup(options, table, workspace) {
        Ok(()) => "ok".to_string(),
        Err(reason) => format!("not configured: {}", reason),
    }
}
