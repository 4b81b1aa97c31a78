//! Schema Compiler CLI
//!
//! Generates Rust source, Turtle shapes and JSON Schema from a schema file,
//! and validates or converts data documents against it.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use schemac::{Compilation, Compiler, CompilerConfig, Format};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schemac")]
#[command(about = "Compile a declarative schema into object models, graph shapes and validators")]
struct Cli {
    /// Schema file to compile
    #[arg(short, long)]
    schema: PathBuf,

    /// Extra configuration file (on top of schemac.toml and SCHEMAC__* variables)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write output here instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render Rust structs for every class
    Rust,

    /// Render the semantic graph
    Graph {
        #[arg(short, long, value_enum, default_value_t = GraphFormat::Turtle)]
        format: GraphFormat,
    },

    /// Render the JSON Schema validation document
    JsonSchema {
        /// Root the document at one class
        #[arg(long)]
        class: Option<String>,
    },

    /// Validate a data document against one class
    Validate {
        data: PathBuf,
        #[arg(long)]
        class: String,
        /// Input format (guessed from the extension when omitted)
        #[arg(short, long)]
        format: Option<Format>,
    },

    /// Convert a data document between JSON and block (YAML) format
    Convert {
        data: PathBuf,
        #[arg(long)]
        class: String,
        #[arg(long)]
        to: Format,
        #[arg(short, long)]
        format: Option<Format>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum GraphFormat {
    Turtle,
    Dot,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CompilerConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    let compiler = Compiler::new(config);
    let compilation = compiler
        .compile_file(&cli.schema)
        .with_context(|| format!("compiling {}", cli.schema.display()))?;

    match cli.command {
        Commands::Rust => {
            let output = compilation.rust_source();
            eprintln!("Generated {} types", output.type_count);
            emit(cli.output.as_deref(), &output.code)
        }

        Commands::Graph { format } => {
            let text = match format {
                GraphFormat::Turtle => compilation.turtle(),
                GraphFormat::Dot => compilation.graph.to_dot(),
            };
            emit(cli.output.as_deref(), &text)
        }

        Commands::JsonSchema { class } => {
            let text = match class {
                Some(class) => {
                    let schema = compilation
                        .validation
                        .for_class(&class)
                        .with_context(|| format!("no class '{}' in schema", class))?;
                    serde_json::to_string_pretty(&schema)?
                }
                None => compilation.json_schema()?,
            };
            emit(cli.output.as_deref(), &text)
        }

        Commands::Validate { data, class, format } => {
            let (text, format) = read_data(&data, format)?;
            let check = compilation
                .validate_document(&text, format, &class)
                .with_context(|| format!("validating {}", data.display()))?;
            if check.passed() {
                println!("✅ {} is a valid {}", data.display(), class);
                Ok(())
            } else {
                println!("❌ {} is not a valid {}", data.display(), class);
                for violation in &check.report.violations {
                    println!("   └─ {}", violation);
                }
                if let Some(err) = &check.load_error {
                    println!("   └─ does not load: {}", err);
                }
                std::process::exit(1);
            }
        }

        Commands::Convert { data, class, to, format } => {
            let instance = load_data(&compilation, &data, &class, format)?;
            let text = compilation.dump(&instance, to)?;
            emit(cli.output.as_deref(), &text)
        }
    }
}

fn read_data(path: &Path, format: Option<Format>) -> anyhow::Result<(String, Format)> {
    let format = match format {
        Some(format) => format,
        None => match path.extension().and_then(|e| e.to_str()).and_then(Format::from_extension) {
            Some(format) => format,
            None => bail!("cannot tell the format of {}; pass --format", path.display()),
        },
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok((text, format))
}

fn load_data(
    compilation: &Compilation,
    path: &Path,
    class: &str,
    format: Option<Format>,
) -> anyhow::Result<schemac::Instance> {
    let (text, format) = read_data(path, format)?;
    compilation
        .load(&text, format, class)
        .with_context(|| format!("loading {}", path.display()))
}

fn emit(output: Option<&Path>, text: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
            eprintln!("✅ Wrote {}", path.display());
        }
        None => {
            print!("{}", text);
            if !text.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}
