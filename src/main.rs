//! sqtc - annotated Squirrel type checker
//!
//! Extracts declarations from annotated Squirrel source and checks them
//! against their type annotations.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};

use sqtyped::checker::{Checker, CheckerOptions};
use sqtyped::extract::{extract, extract_source};
use sqtyped::frontend::parse_source;
use sqtyped::symbols::ExtractionResult;

/// Annotated Squirrel type checker
#[derive(Parser, Debug)]
#[command(name = "sqtc")]
#[command(author = "Z1529")]
#[command(version = "0.1.0")]
#[command(about = "Type checking and declaration extraction for annotated Squirrel")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input source file (.nut); checked with default options
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the declarations found in a source file
    Extract {
        /// Input source file
        input: PathBuf,

        /// Print the extraction result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check a source file against its type annotations
    Check {
        /// Input source file
        input: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Report declarations without a type annotation
        #[arg(long)]
        report_untyped: bool,

        /// Treat warnings as errors
        #[arg(long)]
        warnings_as_errors: bool,
    },
    /// Print version information
    Version,

    /// (Hidden) Print the syntax tree
    #[command(hide = true)]
    DumpTree {
        input: PathBuf,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let outcome = match &cli.command {
        Some(Commands::Extract { input, json }) => extract_file(input, *json),
        Some(Commands::Check { input, json, report_untyped, warnings_as_errors }) => {
            let options = CheckerOptions {
                report_untyped: *report_untyped,
                warnings_as_errors: *warnings_as_errors,
            };
            check_file(input, options, *json)
        }
        Some(Commands::Version) => {
            println!("sqtc 0.1.0");
            println!("Annotated Squirrel type checker");
            println!("License: Apache-2.0");
            Ok(true)
        }
        Some(Commands::DumpTree { input }) => dump_tree(input),
        None => match &cli.input {
            Some(input) => check_file(input, CheckerOptions::default(), false),
            None => {
                eprintln!("Error: No input file specified");
                eprintln!("Usage: sqtc <FILE> or sqtc check <FILE>");
                process::exit(1);
            }
        },
    };

    match outcome {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn read_source(input: &Path) -> Result<String> {
    fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))
}

/// Print the declarations of a file
fn extract_file(input: &Path, json: bool) -> Result<bool> {
    let source = read_source(input)?;
    let result = extract_source(&source);

    if json {
        println!("{}", result.to_json().context("serializing extraction result")?);
    } else {
        print_extraction(&result);
    }
    Ok(result.success)
}

/// Check a file and print its diagnostics
fn check_file(input: &Path, options: CheckerOptions, json: bool) -> Result<bool> {
    let source = read_source(input)?;
    let result = extract_source(&source);
    let report = Checker::new(options).check(&result);

    if json {
        println!("{}", report.to_json().context("serializing check report")?);
        return Ok(report.success);
    }

    println!("Checking: {}", input.display());
    for diagnostic in &report.diagnostics {
        println!("{}:{}", input.display(), diagnostic);
    }

    let errors = report.errors().count();
    let warnings = report.warnings().count();
    if report.success {
        println!("No errors found ({} warnings)", warnings);
    } else {
        println!("Found {} errors, {} warnings", errors, warnings);
    }
    Ok(report.success)
}

fn dump_tree(input: &Path) -> Result<bool> {
    let source = read_source(input)?;
    let tree = parse_source(&source).context("parsing source")?;
    print!("{}", tree.dump());
    let result = extract(&tree);
    println!("{} variables, {} functions, {} classes", result.variables.len(), result.functions.len(), result.classes.len());
    Ok(true)
}

fn print_extraction(result: &ExtractionResult) {
    if !result.success {
        println!("Error: {}", result.error.as_deref().unwrap_or("extraction failed"));
        return;
    }

    println!("=== EXTRACTED TYPE INFORMATION ===");

    if !result.variables.is_empty() {
        println!("\nVARIABLES ({})", result.variables.len());
        println!("{}", "-".repeat(40));
        for var in &result.variables {
            let mut flags = Vec::new();
            if var.is_local {
                flags.push("local");
            }
            if var.is_parameter {
                flags.push("param");
            }
            if var.is_field {
                flags.push("field");
            }
            let default = var.default_value.as_deref().map(|d| format!(" = {}", d)).unwrap_or_default();
            println!("  {}: {} ({}) [{}]{}", var.name, var.type_display(), flags.join(", "), var.scope_path, default);
            println!("    Location: line {}, col {}", var.location.line, var.location.column);
        }
    }

    if !result.functions.is_empty() {
        println!("\nFUNCTIONS ({})", result.functions.len());
        println!("{}", "-".repeat(40));
        for func in &result.functions {
            println!("  {}", func.signature());
            println!("    Scope: {}", func.scope_path);
            println!("    Location: line {}, col {}", func.location.line, func.location.column);
        }
    }

    if !result.classes.is_empty() {
        println!("\nCLASSES ({})", result.classes.len());
        println!("{}", "-".repeat(40));
        for class in &result.classes {
            match &class.base_class {
                Some(base) => println!("  class {} extends {}", class.name, base),
                None => println!("  class {}", class.name),
            }
            println!("    Location: line {}, col {}", class.location.line, class.location.column);

            if !class.fields.is_empty() {
                println!("    Fields ({}):", class.fields.len());
                for field in &class.fields {
                    let default = field.default_value.as_deref().map(|d| format!(" = {}", d)).unwrap_or_default();
                    println!("      {}: {}{}", field.name, field.type_display(), default);
                }
            }
            if let Some(constructor) = &class.constructor {
                println!("    Constructor({})", constructor.parameter_list());
            }
            if !class.methods.is_empty() {
                println!("    Methods ({}):", class.methods.len());
                for method in &class.methods {
                    println!("      {}", method.signature());
                }
            }
        }
    }
}
