//! rowpage: translate logical query plans into row-number paged SQL.
//!
//! # Usage
//!
//! ```bash
//! # Translate a plan file for SQL Server
//! rowpage translate demos/skip_take.json
//!
//! # Oracle, single line, as JSON
//! rowpage translate demos/skip_take.json --dialect oracle --compact --format json
//!
//! # Show the plan tree next to the SQL
//! rowpage explain demos/take_skip.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use rowpage::prelude::*;

#[derive(Parser)]
#[command(name = "rowpage")]
#[command(version)]
#[command(about = "Skip/take paging for SQL dialects without OFFSET/FETCH", long_about = None)]
#[command(after_help = "EXAMPLES:
    rowpage translate plan.json
    rowpage translate plan.json --dialect oracle --compact
    rowpage explain plan.json
    rowpage dialects")]
struct Cli {
    /// Configuration file (defaults to ./rowpage.toml, then the user config dir)
    #[arg(long, global = true, env = "ROWPAGE_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output (debug logs on stderr)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a JSON plan file into SQL
    Translate {
        /// Plan file, `-` for stdin
        plan: PathBuf,

        /// Target dialect (overrides the config file)
        #[arg(short, long)]
        dialect: Option<Dialect>,

        /// Emit the statement on a single line
        #[arg(long)]
        compact: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Show the plan tree and the statement it becomes
    Explain {
        /// Plan file, `-` for stdin
        plan: PathBuf,

        /// Target dialect (overrides the config file)
        #[arg(short, long)]
        dialect: Option<Dialect>,
    },
    /// List supported dialects
    Dialects,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Translate {
            plan,
            dialect,
            compact,
            format,
        } => {
            let mut config = load_config(cli, *dialect)?;
            if *compact {
                config.layout = Layout::Compact;
            }
            translate(plan, &config, *format)
        }
        Commands::Explain { plan, dialect } => {
            let config = load_config(cli, *dialect)?;
            explain(plan, &config)
        }
        Commands::Dialects => {
            show_dialects();
            Ok(())
        }
    }
}

fn load_config(cli: &Cli, dialect: Option<Dialect>) -> anyhow::Result<TranslatorConfig> {
    let mut config = TranslatorConfig::load(cli.config.as_deref())?;
    if let Some(dialect) = dialect {
        config.dialect = dialect;
    }
    tracing::debug!(dialect = %config.dialect, layout = ?config.layout, "configuration loaded");
    Ok(config)
}

fn read_plan(path: &Path) -> anyhow::Result<Plan> {
    let content = if path == Path::new("-") {
        std::io::read_to_string(std::io::stdin()).context("failed to read plan from stdin")?
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?
    };
    let plan = serde_json::from_str(&content)
        .map_err(RowPageError::from)
        .with_context(|| format!("invalid plan in {}", path.display()))?;
    Ok(plan)
}

fn translate(path: &Path, config: &TranslatorConfig, format: OutputFormat) -> anyhow::Result<()> {
    let plan = read_plan(path)?;
    let translation = Translator::new(config.clone()).translate(&plan)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&translation)?);
        }
        OutputFormat::Text => {
            if !translation.parameters.is_empty() {
                for (placeholder, parameter) in translation.bindings() {
                    println!("{}", parameter.describe(placeholder).yellow());
                }
                println!();
            }
            println!("{}", translation.sql.white());
        }
    }
    Ok(())
}

fn explain(path: &Path, config: &TranslatorConfig) -> anyhow::Result<()> {
    let plan = read_plan(path)?;

    println!("{}", "Plan:".green().bold());
    for line in plan.to_string().lines() {
        println!("  {}", line.cyan());
    }
    println!();

    let translator = Translator::new(config.clone());
    let translation = translator.translate(&plan)?;
    println!(
        "{} {}",
        "Dialect:".dimmed(),
        translator.config().dialect.to_string().white()
    );
    if !translation.parameters.is_empty() {
        println!("{}", "Parameters:".green().bold());
        for (placeholder, parameter) in translation.bindings() {
            println!("  {}", parameter.describe(placeholder).yellow());
        }
    }
    println!();
    println!("{}", "Generated SQL:".green().bold());
    for line in translation.sql.lines() {
        println!("  {}", line.white());
    }
    Ok(())
}

fn show_dialects() {
    println!(
        "{:12} {:8} {}",
        "Dialect".white().bold(),
        "TOP(n)".white().bold(),
        "Vacuous order key".white().bold()
    );
    println!("{}", "─".repeat(50).dimmed());
    for dialect in Dialect::ALL {
        let generator = dialect.generator();
        let top = if generator.supports_top() { "yes" } else { "no" };
        println!(
            "{:12} {:8} {}",
            dialect.to_string().cyan().bold(),
            top,
            generator.vacuous_order_key().dimmed()
        );
    }
}
