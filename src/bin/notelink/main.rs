//! notelink CLI tool
//!
//! Command-line interface for expanding embedded note references with notelink-core.
//!
//! ## Commands
//!
//! - `compile <vault> <note>`: Print a note with its `![[embeds]]` expanded
//! - `refs <file>`: List the notes a file embeds
//!
//! Resolver limits come from `--config` (a TOML file, see `ResolverOptions`) and can be
//! overridden per invocation with `--max-depth` and `--max-content-size`.

use clap::{Parser, Subcommand};
use notelink_core::{
    compiler::LinkedNotesCompiler,
    config::ResolverOptions,
    reference::extract_note_names,
    store::{find_note_file, FsNoteStore},
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "notelink")]
#[command(author, version, about = "A tool for expanding embedded note references", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand every embed in a note and print the result
    Compile {
        /// Path to the vault directory
        vault: PathBuf,

        /// Note name (file stem or file name) to compile
        note: String,

        /// Configuration file path (default: <vault>/notelink.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the recursion ceiling
        #[arg(long)]
        max_depth: Option<usize>,

        /// Override the per-fragment size ceiling, in bytes
        #[arg(long)]
        max_content_size: Option<usize>,

        /// Write the expanded note here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the notes embedded by a markdown file
    Refs {
        /// Path to the markdown file
        path: PathBuf,

        /// Print the names as a JSON array
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Compile {
            vault,
            note,
            config,
            max_depth,
            max_content_size,
            output,
        } => {
            let config_path = config.unwrap_or_else(|| vault.join("notelink.toml"));
            let mut options = ResolverOptions::load(&config_path)?;
            if let Some(max_depth) = max_depth {
                options.max_depth = max_depth;
            }
            if let Some(max_content_size) = max_content_size {
                options.max_content_size = max_content_size;
            }
            tracing::debug!("Resolver options: {:?}", options);

            let store = FsNoteStore::new(&vault)?;
            let compiler = LinkedNotesCompiler::with_options(store, options)?;

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;

            let published = runtime.block_on(async {
                let Some(document) = find_note_file(compiler.store(), &note).await else {
                    return Err(notelink_core::LinkedNotesError::NotFound(format!(
                        "No note named '{note}' in {vault:?}"
                    )));
                };
                tracing::info!("Compiling {:?}", document.path);
                compiler.compile_document(&document).await
            })?;

            let stats = compiler.cache_stats();
            tracing::debug!(
                "Resolved {} fragments ({} cache hits, {} misses)",
                stats.entries,
                stats.hits,
                stats.misses
            );

            match output {
                Some(path) => {
                    std::fs::write(&path, published)?;
                    if cli.verbose {
                        eprintln!("Wrote {}", path.display());
                    }
                }
                None => print!("{published}"),
            }
            Ok(())
        }

        Commands::Refs { path, json } => {
            let content = std::fs::read_to_string(&path)?;
            let names = extract_note_names(&content);
            if json {
                println!("{}", serde_json::to_string_pretty(&names)?);
            } else {
                for name in names {
                    println!("{name}");
                }
            }
            Ok(())
        }
    }
}
