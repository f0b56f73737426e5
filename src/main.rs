//! Tapedeck CLI for inspecting cassette files

use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use tapedeck::cassette::Outcome;
use tapedeck::storage::CassetteStore;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Tapedeck v{}", env!("CARGO_PKG_VERSION"));
        eprintln!();
        eprintln!("Usage: tapedeck <command> [options]");
        eprintln!();
        eprintln!("Commands:");
        eprintln!("  list <cassette-dir>           List cassettes with interaction counts");
        eprintln!("  show <cassette-dir> <name>    Print a cassette's interactions");
        process::exit(1);
    }

    match args[1].as_str() {
        "list" => {
            if args.len() < 3 {
                eprintln!("Usage: tapedeck list <cassette-dir>");
                process::exit(1);
            }
            list(&PathBuf::from(&args[2]))
        }
        "show" => {
            if args.len() < 4 {
                eprintln!("Usage: tapedeck show <cassette-dir> <name>");
                process::exit(1);
            }
            show(&PathBuf::from(&args[2]), &args[3])
        }
        command => {
            eprintln!("Unknown command: {command}");
            eprintln!("Run 'tapedeck' for usage information.");
            process::exit(1);
        }
    }
}

fn list(dir: &Path) -> anyhow::Result<()> {
    let store = CassetteStore::new(dir);
    let names = store.list().context("failed to list cassette directory")?;

    if names.is_empty() {
        println!("No cassettes in {}", dir.display());
        return Ok(());
    }

    for name in names {
        let cassette = store
            .load(&name)
            .with_context(|| format!("failed to load cassette '{name}'"))?;
        let count = cassette.map_or(0, |c| c.interactions.len());
        println!("{name}: {count} interactions");
    }

    Ok(())
}

fn show(dir: &Path, name: &str) -> anyhow::Result<()> {
    let store = CassetteStore::new(dir);
    let cassette = store
        .load(name)
        .with_context(|| format!("failed to load cassette '{name}'"))?
        .with_context(|| format!("cassette '{name}' not found in {}", dir.display()))?;

    println!("Cassette '{}': {} interactions", cassette.name, cassette.interactions.len());
    for (index, interaction) in cassette.interactions.iter().enumerate() {
        let summary = match &interaction.outcome {
            Outcome::Response(response) => format!(
                "{} ({} byte body)",
                response.status,
                response.body.as_bytes().len()
            ),
            Outcome::Error(failure) => format!("error: {failure}"),
        };
        println!(
            "  {index}: {} {} -> {summary}",
            interaction.request.method, interaction.request.url
        );
    }

    Ok(())
}
