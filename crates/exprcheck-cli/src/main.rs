//! exprcheck - validate filter/formula expressions from the command line
//!
//! Usage:
//! - `exprcheck validate --catalog catalog.yaml "ROUND(amount, 2) * 3"`
//! - `echo "age + name" | exprcheck validate --catalog catalog.json`
//! - `exprcheck parse "CASE WHEN a > 1 THEN 'x' END"`
//! - `exprcheck functions --catalog catalog.yaml --category "Numeric Functions"`

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use exprcheck_ast::Node;
use exprcheck_catalog::search::ALL_CATEGORY;
use exprcheck_catalog::{CatalogItem, CatalogQuery, TypeCatalog, OPERATORS};
use exprcheck_validate::{validate_expression, ValidationResult, Validator};
use serde::Serialize;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

mod config;
mod logging;

use config::Config;

#[derive(Parser, Debug)]
#[command(name = "exprcheck")]
#[command(about = "Validate filter/formula expressions against a field and function catalog")]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate expressions (arguments, or one per stdin line)
    Validate {
        /// JSON or YAML catalog of fields and functions
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Inputs are JSON ASTs rather than expression text
        #[arg(long)]
        ast: bool,

        /// Pretty-print JSON results
        #[arg(long)]
        pretty: bool,

        expressions: Vec<String>,
    },

    /// Print the JSON AST of each expression
    Parse {
        /// Pretty-print the AST
        #[arg(long)]
        pretty: bool,

        expressions: Vec<String>,
    },

    /// List fields, function signatures and operators
    Functions {
        /// JSON or YAML catalog of fields and functions
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// "All", "Available Fields" or a function category
        #[arg(long)]
        category: Option<String>,

        /// Case-insensitive text filter
        #[arg(long)]
        search: Option<String>,
    },
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {}: {}", path.display(), e);
                return ExitCode::from(2);
            }
        },
        None => Config::from_env(),
    };
    config.apply_logging_env();
    logging::init();

    match run(cli.command, &config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Returns whether every input was valid
fn run(command: Command, config: &Config) -> Result<bool> {
    match command {
        Command::Validate { catalog, ast, pretty, expressions } => {
            let catalog = match catalog.as_ref().or(config.catalog.path.as_ref()) {
                Some(path) => load_catalog(path)?,
                None => {
                    warn!("no catalog configured; every field and function will be unknown");
                    TypeCatalog::default()
                }
            };
            let pretty = pretty || config.output.pretty;

            let mut all_valid = true;
            for input in read_inputs(expressions)? {
                let result = if ast {
                    validate_ast_json(&input, &catalog)
                } else {
                    validate_expression(&input, &catalog)
                };
                all_valid &= result.is_valid;
                print_json(&result, pretty)?;
            }
            Ok(all_valid)
        }
        Command::Parse { pretty, expressions } => {
            let pretty = pretty || config.output.pretty;
            let mut all_parsed = true;
            for input in read_inputs(expressions)? {
                match exprcheck_ast::parse(&input) {
                    Ok(node) => print_json(&node, pretty)?,
                    Err(e) => {
                        all_parsed = false;
                        print_json(&serde_json::json!({ "error": e.to_string() }), pretty)?;
                    }
                }
            }
            Ok(all_parsed)
        }
        Command::Functions { catalog, category, search } => {
            let Some(path) = catalog.as_ref().or(config.catalog.path.as_ref()) else {
                bail!("no catalog given; pass --catalog or set EXPRCHECK_CATALOG");
            };
            let catalog = load_catalog(path)?;
            print_catalog(&catalog, CatalogQuery { category, text: search });
            Ok(true)
        }
    }
}

fn load_catalog(path: &Path) -> Result<TypeCatalog> {
    let catalog = TypeCatalog::from_path(path)
        .with_context(|| format!("failed to load catalog {}", path.display()))?;
    info!(
        path = %path.display(),
        fields = catalog.fields().len(),
        functions = catalog.functions().len(),
        "catalog loaded"
    );
    Ok(catalog)
}

fn read_inputs(expressions: Vec<String>) -> Result<Vec<String>> {
    if !expressions.is_empty() {
        return Ok(expressions);
    }
    std::io::stdin()
        .lock()
        .lines()
        .collect::<std::io::Result<Vec<_>>>()
        .context("failed to read expressions from stdin")
}

fn validate_ast_json(input: &str, catalog: &TypeCatalog) -> ValidationResult {
    match serde_json::from_str::<Node>(input) {
        Ok(node) => Validator::new(catalog).validate_ast(&node),
        Err(e) => ValidationResult::from_errors(vec![format!("Invalid AST: {}", e)]),
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}

fn print_catalog(catalog: &TypeCatalog, query: CatalogQuery) {
    let show_operators = query.text.is_none()
        && query.category.as_deref().map_or(true, |c| c == ALL_CATEGORY);

    for item in catalog.search(&query) {
        match item {
            CatalogItem::Field(field) => println!("{}: {}", field.name, field.data_type),
            CatalogItem::Function(func) => {
                println!("{}", func.signature());
                if let Some(description) = &func.description {
                    println!("    {}", description);
                }
            }
        }
    }

    if show_operators {
        for op in OPERATORS {
            println!("{:<4}{}", op.symbol, op.description);
        }
    }
}
