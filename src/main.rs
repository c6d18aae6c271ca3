//! SeedWork CLI - Command-line interface
//!
//! Commands:
//!   check     - Report convention violations
//!   generate  - Write synthesized fragments
//!   fix       - Apply automated fixes to a file
//!   rules     - List the rule catalog
//!   schema    - Print JSON schemas
//!   sexp      - Dump the raw syntax tree of a file

use seedwork::manifest::Manifest;
use seedwork::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Flags that take a value; their values are not positional arguments
const VALUE_FLAGS: &[&str] = &["--config", "--output", "-o", "--rule", "--templates"];

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    let result = match args[1].as_str() {
        "check" => cmd_check(&args[2..]),
        "generate" => cmd_generate(&args[2..]),
        "fix" => cmd_fix(&args[2..]),
        "rules" => cmd_rules(&args[2..]),
        "schema" => cmd_schema(&args[2..]),
        "sexp" => cmd_sexp(&args[2..]),
        "version" | "--version" | "-v" => {
            println!("seedwork {}", VERSION);
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            Err("Unknown command".into())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

/// Log to stderr, filtered by `SEEDWORK_LOG` (default `warn`)
fn init_tracing() {
    let filter = EnvFilter::try_from_env("SEEDWORK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_usage() {
    println!(
        r#"
SeedWork - conventions and boilerplate for C# value objects and smart enums

USAGE:
    seedwork <COMMAND> [OPTIONS]

COMMANDS:
    check <files|dirs...>            Report convention violations
    generate <files|dirs...>         Write synthesized fragments
    fix <file.cs>                    Apply automated fixes until none are left
    rules                            List rules with their effective severity
    schema [config|manifest]         Print JSON schema
    sexp <file.cs>                   Print the tree-sitter S-expression
    version                          Print version

OPTIONS:
    --config <seedwork.yaml>         Config file (default: discovered upwards)
    --output, -o <dir>               Fragment directory for generate
    --templates <dir>                Override embedded templates (generate)
    --rule <SEEDxxxx>                Fix only this rule (fix)
    --dry-run                        Print instead of writing (generate, fix)
    --json                           JSON output format (check, generate, fix, rules)

ENVIRONMENT:
    SEEDWORK_LOG                     Log filter, e.g. `debug` (default: warn)

EXAMPLES:
    seedwork check src/Domain
    seedwork generate src/Domain --output src/Domain/Generated
    seedwork fix src/Domain/Money.cs --rule SEED0001
    seedwork rules --json
"#
    );
}

fn cmd_check(args: &[String]) -> Result<()> {
    let paths = positional(args);
    if paths.is_empty() {
        return Err("Usage: seedwork check <files|dirs...> [--json] [--config f]".into());
    }
    let json_output = args.contains(&"--json".to_string());
    let (config, _) = load_config(args)?;

    let sources = util::load_sources(&paths)?;
    let result = Pipeline::new(config)
        .check_only()
        .run(&sources, &CancellationToken::new())?;
    let violations: Vec<&Violation> = result.violations().collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&violations)?);
    } else {
        for violation in &violations {
            println!("{}", violation);
        }
        println!(
            "{} violation(s) in {} declaration(s), {} file(s)",
            violations.len(),
            result.reports.len(),
            result.files_parsed
        );
    }

    if result.has_errors() {
        Err("Check failed".into())
    } else {
        Ok(())
    }
}

fn cmd_generate(args: &[String]) -> Result<()> {
    let paths = positional(args);
    if paths.is_empty() {
        return Err("Usage: seedwork generate <files|dirs...> [--output dir] [--json]".into());
    }
    let json_output = args.contains(&"--json".to_string());
    let dry_run = args.contains(&"--dry-run".to_string());
    let (config, config_path) = load_config(args)?;

    let output_dir = match option_value(args, &["--output", "-o"]) {
        Some(dir) => PathBuf::from(dir),
        None => config_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(&config.generation.output_dir),
    };

    let mut pipeline = Pipeline::new(config);
    if let Some(dir) = option_value(args, &["--templates"]) {
        pipeline = pipeline.with_templates(templates::engine_with_override(Path::new(dir))?);
    }

    let sources = util::load_sources(&paths)?;
    let result = pipeline.run(&sources, &CancellationToken::new())?;
    let fragments: Vec<GeneratedFragment> = result.fragments().cloned().collect();

    if dry_run {
        if json_output {
            println!("{}", serde_json::to_string_pretty(&fragments)?);
        } else {
            for fragment in &fragments {
                println!("// ==== {} ====", fragment.slot_name);
                print!("{}", fragment.text);
            }
        }
        return Ok(());
    }

    let summary = write_fragments(&output_dir, &fragments)?;
    if json_output {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for name in &summary.written {
            println!("  wrote     {}", name);
        }
        for name in &summary.removed {
            println!("  removed   {}", name);
        }
        println!(
            "{} written, {} unchanged, {} removed in {}",
            summary.written.len(),
            summary.unchanged.len(),
            summary.removed.len(),
            output_dir.display()
        );
    }
    Ok(())
}

fn cmd_fix(args: &[String]) -> Result<()> {
    let paths = positional(args);
    let Some(path) = paths.first() else {
        return Err("Usage: seedwork fix <file.cs> [--rule ID] [--dry-run] [--json]".into());
    };
    let json_output = args.contains(&"--json".to_string());
    let dry_run = args.contains(&"--dry-run".to_string());
    let only = option_value(args, &["--rule"]);
    if let Some(id) = only {
        if rules::rule(id).is_none() {
            return Err(format!("Unknown rule: {}", id).into());
        }
    }
    let (config, _) = load_config(args)?;

    let source = fs::read_to_string(path).map_err(Error::Io)?;
    let (fixed, result) = fix_source(&util::normalize(path), &source, &config, only)?;

    if dry_run {
        print!("{}", fixed);
    } else if fixed != source {
        fs::write(path, &fixed).map_err(Error::Io)?;
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for applied in &result.applied {
            eprintln!("  fixed     {}", applied);
        }
        for skipped in &result.skipped {
            eprintln!("  no fix    {}", skipped);
        }
        for error in &result.errors {
            eprintln!("  failed    {}", error);
        }
    }

    if result.errors.is_empty() {
        Ok(())
    } else {
        Err("Some fixes could not be applied".into())
    }
}

fn cmd_rules(args: &[String]) -> Result<()> {
    let json_output = args.contains(&"--json".to_string());
    let (config, _) = load_config(args)?;

    if json_output {
        let rows: Vec<serde_json::Value> = CATALOG
            .iter()
            .map(|rule| {
                serde_json::json!({
                    "id": rule.id,
                    "pattern": rule.candidate.label(),
                    "category": rules::CATEGORY,
                    "title": rule.title,
                    "severity": rule.severity(&config),
                    "fixable": rule.fixable,
                    "enforced": rule.is_active(&config),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{:<10} {:<6} {:<12} {:<4} TITLE", "ID", "SEV", "PATTERN", "FIX");
    for rule in CATALOG {
        let severity = if rule.is_active(&config) {
            rule.severity(&config).to_string()
        } else {
            "off".to_string()
        };
        println!(
            "{:<10} {:<6} {:<12} {:<4} {}",
            rule.id,
            severity,
            rule.candidate.label(),
            if rule.fixable { "yes" } else { "no" },
            rule.title
        );
    }
    Ok(())
}

fn cmd_schema(args: &[String]) -> Result<()> {
    let schema_name = args.first().map(|s| s.as_str()).unwrap_or("list");

    match schema_name {
        "list" => {
            println!("Available schemas: config, manifest");
            Ok(())
        }
        "config" => {
            println!("{}", Config::json_schema()?);
            Ok(())
        }
        "manifest" => print_schema::<Manifest>(),
        _ => Err(format!("Unknown schema: {}", schema_name).into()),
    }
}

fn print_schema<T: schemars::JsonSchema>() -> Result<()> {
    let schema = schemars::schema_for!(T);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn cmd_sexp(args: &[String]) -> Result<()> {
    let Some(path) = args.first() else {
        return Err("Usage: seedwork sexp <file.cs>".into());
    };
    let source = fs::read_to_string(path).map_err(Error::Io)?;
    println!("{}", to_sexp(&source)?);
    Ok(())
}

/// `--config` if given, otherwise discovered from the working directory
fn load_config(args: &[String]) -> Result<(Config, Option<PathBuf>)> {
    if let Some(path) = option_value(args, &["--config"]) {
        let path = PathBuf::from(path);
        return Ok((Config::load(&path)?, Some(path)));
    }
    let cwd = std::env::current_dir().map_err(Error::Io)?;
    Config::discover(&cwd)
}

fn option_value<'a>(args: &'a [String], names: &[&str]) -> Option<&'a str> {
    args.iter()
        .position(|arg| names.contains(&arg.as_str()))
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Arguments that are neither flags nor flag values
fn positional(args: &[String]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
        } else if VALUE_FLAGS.contains(&arg.as_str()) {
            skip_next = true;
        } else if !arg.starts_with('-') {
            paths.push(PathBuf::from(arg));
        }
    }
    paths
}
