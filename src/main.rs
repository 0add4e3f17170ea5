use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use settings_tree::config::CliConfig;
use settings_tree::schema::{self, render};
use settings_tree::{script, InMemoryService, Path, SchemaDescriptor, TreeBuilder};

#[derive(Parser)]
#[command(name = "stree")]
#[command(about = "Inspect settings schemas and drive proxy trees from scripts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a schema as an ASCII tree
    Schema {
        /// JSON schema file (defaults to the builtin case tree)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Type to render (defaults to the schema root)
        #[arg(short = 't', long = "type")]
        type_id: Option<String>,
    },
    /// Load and validate a JSON schema file
    Check {
        file: PathBuf,
    },
    /// Print the builtin schema as JSON
    Export,
    /// Run a script against a fresh in-memory service
    Run {
        script: PathBuf,

        /// JSON schema file (defaults to the builtin case tree)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Remote path of the root container
        #[arg(short, long)]
        root: Option<String>,
    },
}

/// Initialize tracing with output to stderr so stdout carries only results
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "settings_tree=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_schema(file: &FsPath) -> Result<Arc<SchemaDescriptor>> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read schema file {}", file.display()))?;
    let schema = SchemaDescriptor::from_json(&json)
        .with_context(|| format!("Failed to parse schema file {}", file.display()))?;
    schema
        .validate()
        .with_context(|| format!("Schema file {} is inconsistent", file.display()))?;
    Ok(Arc::new(schema))
}

fn select_schema(flag: Option<PathBuf>, config: &CliConfig) -> Result<Arc<SchemaDescriptor>> {
    match flag.or_else(|| config.schema.clone()) {
        Some(file) => load_schema(&file),
        None => Ok(schema::builtin()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = CliConfig::load();

    match cli.command {
        Commands::Schema { schema, type_id } => {
            let schema = select_schema(schema, &config)?;
            let type_id = type_id.unwrap_or_else(|| schema.root_type().to_string());
            if schema.get(&type_id).is_none() {
                anyhow::bail!("Type '{}' is not declared in the schema", type_id);
            }
            print!("{}", render::render_schema(&schema, &type_id));
        }
        Commands::Check { file } => {
            let schema = load_schema(&file)?;
            println!(
                "{}: ok ({} types, root '{}')",
                file.display(),
                schema.types().count(),
                schema.root_type()
            );
        }
        Commands::Export => {
            println!("{}", schema::builtin().to_json_pretty()?);
        }
        Commands::Run {
            script: script_file,
            schema,
            root,
        } => {
            let custom_schema = schema.is_some() || config.schema.is_some();
            let schema = select_schema(schema, &config)?;
            let root: Path = match root.or_else(|| config.root.clone()) {
                Some(text) => text
                    .parse()
                    .with_context(|| format!("Invalid root path '{}'", text))?,
                None if custom_schema => Path::root(),
                None => schema::builtin::root_path(),
            };

            let text = std::fs::read_to_string(&script_file)
                .with_context(|| format!("Failed to read script {}", script_file.display()))?;
            let lines = script::parse(&text)?;

            let service = Arc::new(InMemoryService::new(schema.clone(), root.clone()));
            let tree = TreeBuilder::new(service.clone(), schema)
                .root_path(root)
                .build()?;

            tracing::info!("Running {} step(s) from {}", lines.len(), script_file.display());
            let mut stdout = std::io::stdout().lock();
            let count = script::run(&tree, &service, &lines, &mut stdout)?;
            tracing::info!("Script finished after {} step(s)", count);
        }
    }

    Ok(())
}
