// Command-line entry point for callvault.

use std::path::PathBuf;
use std::process::exit;

use anyhow::{bail, Result};
use clap::{ArgGroup, Parser, ValueEnum};

use callvault::application::{GenerateUsecase, RunSummary};
use callvault::domain::scope::ScopeFilter;
use callvault::infrastructure::concurrency::init_thread_pool;
use callvault::infrastructure::project_loader::ProjectLoader;
use callvault::infrastructure::scip_resolver::load_scip_index;
use callvault::infrastructure::syn_resolver::SynResolver;
use callvault::ports::{NoteMode, SemanticResolver};

/// Generate cross-referenced call-graph notes for a Cargo workspace.
#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(group(ArgGroup::new("mode").required(true).args(["per_file", "per_unit"])))]
struct Cli {
    /// Project directory (or Cargo.toml) to analyze
    project: PathBuf,

    /// Write one note per source file
    #[arg(long)]
    per_file: bool,

    /// Write one note per callable unit
    #[arg(long)]
    per_unit: bool,

    /// Directory the notes are written into
    #[arg(short, long, default_value = "notes")]
    output: PathBuf,

    /// Analysis engine backing the run
    #[arg(long, value_enum, default_value = "syn")]
    engine: Engine,

    /// SCIP index file (defaults to <project>/index.scip with --engine scip)
    #[arg(long)]
    scip_index: Option<PathBuf>,

    /// Also export the resolved graph as JSON
    #[arg(long)]
    graph_json: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Engine {
    /// Parse sources directly with syn
    Syn,
    /// Ingest a pre-built SCIP index
    Scip,
}

fn main() {
    let cli = Cli::parse();

    if !cli.project.exists() {
        eprintln!(
            "[callvault] error: project path {} does not exist",
            cli.project.display()
        );
        exit(2);
    }

    match run(&cli) {
        Ok(summary) => {
            println!(
                "[callvault] {} units, {} edges, {} notes written to {}",
                summary.units,
                summary.edges,
                summary.notes,
                cli.output.display()
            );
        }
        Err(e) => {
            eprintln!("[callvault] error: {:#}", e);
            exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<RunSummary> {
    if init_thread_pool().is_err() {
        eprintln!("WARN: thread pool was already initialized, reusing it");
    }

    let workspace = ProjectLoader::load(&cli.project)?;
    println!(
        "[callvault] Loaded {} member crate(s), {} source file(s)",
        workspace.members.len(),
        workspace.files.len()
    );
    let scope = ScopeFilter::new(workspace.members.iter().cloned());

    let resolver: Box<dyn SemanticResolver> = match cli.engine {
        Engine::Syn => Box::new(SynResolver::build(&workspace)),
        Engine::Scip => {
            let index_path = match &cli.scip_index {
                Some(path) => path.clone(),
                None => {
                    let fallback = workspace.root.join("index.scip");
                    if !fallback.is_file() {
                        bail!(
                            "no SCIP index at {}, pass --scip-index explicitly",
                            fallback.display()
                        );
                    }
                    fallback
                }
            };
            Box::new(load_scip_index(&index_path)?)
        }
    };

    let mode = if cli.per_unit {
        NoteMode::PerUnit
    } else {
        NoteMode::PerFile
    };

    let usecase = GenerateUsecase {
        resolver: resolver.as_ref(),
        scope: &scope,
        mode,
        graph_json: cli.graph_json.clone(),
    };
    usecase.run(&cli.output)
}
