//! # beanmap
//!
//! Command-line front end for the beanmap object graph mapper.
//!
//! Loads a class registry and an optional mapper configuration, decodes a
//! JSON object graph, maps it to a target type and prints the result as JSON.

mod json;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use beanmap_core::{Mapper, MapperConfig};
use beanmap_model::{ClassRegistry, TypeHierarchy, TypeRef};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "beanmap")]
#[command(about = "Convention-based object graph mapper")]
#[command(version)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map a JSON object graph to a target type
    Map {
        /// Input JSON file
        input: PathBuf,

        /// Class registry file (YAML)
        #[arg(long)]
        types: PathBuf,

        /// Mapper configuration file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Destination type (e.g., BookDTO, List<BookDTO>)
        #[arg(short, long)]
        target: String,

        /// Fail on missing getters and incompatible values
        #[arg(long)]
        strict: bool,

        /// Output file path; prints to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load a class registry and list its declarations
    Check {
        /// Class registry file (YAML)
        #[arg(long)]
        types: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Map {
            input,
            types,
            config,
            target,
            strict,
            output,
        } => run_map(&MapArgs {
            input,
            types,
            config,
            target,
            strict,
            output,
        }),
        Commands::Check { types } => run_check(&types),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

struct MapArgs {
    input: PathBuf,
    types: PathBuf,
    config: Option<PathBuf>,
    target: String,
    strict: bool,
    output: Option<PathBuf>,
}

fn load_registry(path: &Path) -> anyhow::Result<ClassRegistry> {
    ClassRegistry::from_yaml_file(path)
        .with_context(|| format!("Failed to load class registry {}", path.display()))
}

fn run_map(args: &MapArgs) -> anyhow::Result<()> {
    let registry = Arc::new(load_registry(&args.types)?);

    let mut config = match &args.config {
        Some(path) => MapperConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load mapper configuration {}", path.display()))?,
        None => MapperConfig::default(),
    };
    config.strict |= args.strict;

    let target = TypeRef::parse(&args.target)
        .with_context(|| format!("Invalid target type '{}'", args.target))?;

    let content = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let document: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", args.input.display()))?;
    let source = json::decode(&document, &TypeRef::Any, &registry)
        .with_context(|| format!("Failed to decode {}", args.input.display()))?;

    let mapper = Mapper::from_config(registry.clone(), &config);
    let mapped = mapper
        .map(&source, &target)
        .with_context(|| format!("Failed to map {} -> {target}", source.type_name()))?;

    let rendered = serde_json::to_string_pretty(&json::encode(&mapped))?;
    match &args.output {
        Some(path) => {
            fs::write(path, format!("{rendered}\n"))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} to {}", target, path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn run_check(types: &Path) -> anyhow::Result<()> {
    let registry = load_registry(types)?;

    let classes = registry.class_names();
    println!("classes ({}):", classes.len());
    for class in classes {
        let mut line = format!("  {class}");
        if registry.is_abstract(class) {
            line.push_str(" (abstract)");
        }
        if let Some(parent) = registry.parent(class) {
            line.push_str(&format!(" extends {parent}"));
        }
        println!("{line}");
    }

    let enums = registry.enum_names();
    println!("enums ({}):", enums.len());
    for name in enums {
        let variants = registry
            .enum_def(name)
            .map(|definition| definition.variants.join(", "))
            .unwrap_or_default();
        println!("  {name} [{variants}]");
    }
    Ok(())
}
