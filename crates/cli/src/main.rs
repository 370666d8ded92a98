mod schema;

use anyhow::{Context, Result};
use argbank::{ParseOutcome, help};
use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use serde_json::Value;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};

use crate::schema::{Declared, Schema, resolve_schema_path, write_sample_schema};

/// Exit code used when the parsed arguments asked for help.
const EXIT_HELP: i32 = 2;

/// Exit code for failures, including usage errors in argbank's own arguments.
const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "argbank")]
#[command(version, about = "Typed command-line arguments for shell scripts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a sample argbank.json schema
    Init(InitArgs),

    /// Parse arguments against a schema and print the resolved values
    Parse(ParseArgs),

    /// Print usage text generated from a schema
    Usage(UsageArgs),
}

#[derive(Parser)]
struct InitArgs {
    /// Project directory (default: current directory)
    #[arg(value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Overwrite an existing schema
    #[arg(long)]
    force: bool,
}

#[derive(Parser)]
struct ParseArgs {
    /// Path to the schema (default: ./argbank.json)
    #[arg(short, long, value_name = "FILE")]
    schema: Option<PathBuf>,

    /// Print the resolved values as a JSON object
    #[arg(long)]
    json: bool,

    /// Arguments to parse, after `--`
    #[arg(last = true, value_name = "ARGS", allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Parser)]
struct UsageArgs {
    /// Path to the schema (default: ./argbank.json)
    #[arg(short, long, value_name = "FILE")]
    schema: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // `--help`/`--version` for argbank itself exit 0.
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            let _ = err.print();
            std::process::exit(EXIT_FAILURE);
        }
    };

    match cli.command {
        Commands::Init(args) => init(args),
        Commands::Parse(args) => parse_command(args),
        Commands::Usage(args) => usage(args),
    }
}

fn init(args: InitArgs) -> Result<()> {
    let dir = args.dir.unwrap_or_else(|| PathBuf::from("."));
    let path = write_sample_schema(&dir, args.force)?;

    eprintln!("Created: {}", path.display());
    eprintln!("\nNext steps:");
    eprintln!("  1. Edit {} to declare your arguments", path.display());
    eprintln!("  2. Run: argbank parse --json -- \"$@\"");

    Ok(())
}

fn load(schema: Option<PathBuf>) -> Result<(Schema, Declared)> {
    let path = resolve_schema_path(schema.as_deref())?;
    tracing::debug!(path = %path.display(), "loading schema");
    let schema = Schema::from_file(&path)?;
    let declared = schema
        .declare()
        .with_context(|| format!("failed to declare arguments from {}", path.display()))?;
    Ok((schema, declared))
}

fn parse_command(args: ParseArgs) -> Result<()> {
    tracing::debug!("executing parse command");

    let (schema, declared) = load(args.schema)?;
    let argv: Vec<String> = std::iter::once(schema.program.clone())
        .chain(args.args)
        .collect();

    let parsed = match argbank::parse_with_summary(&declared.registry, &argv, &schema.summary)
        .with_context(|| format!("invalid arguments for {}", schema.program))?
    {
        ParseOutcome::Parsed(parsed) => parsed,
        ParseOutcome::Help(usage) => {
            print!("{usage}");
            std::process::exit(EXIT_HELP);
        }
    };

    let mut values: IndexMap<String, Value> = IndexMap::new();
    for handle in &declared.handles {
        let value = match handle.resolve(&parsed) {
            Ok(value) => value,
            // Optional argument with no default and no occurrence.
            Err(argbank::Error::InvalidArgument(_)) => Value::Null,
            Err(err) => {
                return Err(err).with_context(|| format!("invalid value for '{}'", handle.key()));
            }
        };
        values.insert(handle.key().to_string(), value);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else {
        for (key, value) in &values {
            match value {
                Value::Null => println!("{key}="),
                Value::String(s) => println!("{key}={s}"),
                other => println!("{key}={other}"),
            }
        }
    }

    Ok(())
}

fn usage(args: UsageArgs) -> Result<()> {
    let (schema, declared) = load(args.schema)?;
    print!(
        "{}",
        help::render_with_summary(&declared.registry, &schema.program, &schema.summary)
    );
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
