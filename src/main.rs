use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use glsl_gen::graph::Graph;
use glsl_gen::{presets, Builder, ShaderOutput};

#[derive(Parser)]
#[command(name = "glsl-gen", version)]
#[command(about = "Generate GLSL fragment shaders from expression graphs")]
struct Cli {
    /// Log generation steps (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a built-in preset
    Build {
        /// Preset name (see `list`)
        preset: String,

        /// Write output to file instead of stdout
        #[arg(short)]
        o: Option<PathBuf>,

        /// Print source and metadata as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render a JSON expression graph
    Graph {
        /// Input .json graph file
        file: PathBuf,

        /// Write output to file instead of stdout
        #[arg(short)]
        o: Option<PathBuf>,

        /// Print source and metadata as JSON
        #[arg(long)]
        json: bool,
    },

    /// List built-in presets
    List,
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "glsl_gen=debug" } else { "warn" }));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Build { preset, o, json } => {
            let p = presets::preset(&preset).ok_or_else(|| {
                anyhow!("unknown preset '{preset}' (run `glsl-gen list` to see presets)")
            })?;
            let output = p
                .build(&mut Builder::new())
                .with_context(|| format!("failed to build preset '{preset}'"))?;
            emit(&output, o, json)
        }

        Commands::Graph { file, o, json } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("cannot read '{}'", file.display()))?;
            let graph = Graph::from_json(&text)
                .with_context(|| format!("cannot parse '{}'", file.display()))?;
            let output = graph
                .build(&mut Builder::new())
                .with_context(|| format!("failed to generate '{}'", file.display()))?;
            emit(&output, o, json)
        }

        Commands::List => {
            for p in presets::PRESETS {
                println!("{:<12} {}", p.name, p.description);
            }
            Ok(())
        }
    }
}

fn emit(output: &ShaderOutput, out_path: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let text = if json {
        serde_json::to_string_pretty(output)?
    } else {
        output.source.clone()
    };

    match out_path {
        Some(path) => {
            fs::write(&path, &text)
                .with_context(|| format!("cannot write '{}'", path.display()))?;
            eprintln!("wrote {} ({} bytes)", path.display(), text.len());
        }
        None => println!("{text}"),
    }
    Ok(())
}
