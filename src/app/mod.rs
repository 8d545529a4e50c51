use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use tagmap::{GeometryKind, Mapping, TableFilters};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Mapping configuration file (YAML)
    #[arg(short, long)]
    pub mapping: PathBuf,

    /// Dump the classification index for one geometry kind
    #[arg(short, long)]
    pub kind: Option<GeometryKind>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn run(cli: &Cli) -> Result<()> {
    let mapping = Mapping::from_path(&cli.mapping)
        .with_context(|| format!("CLI: Failed to load mapping {}", cli.mapping.display()))?;

    tracing::info!(
        "Mapping: {} tables, {} generalized tables",
        mapping.tables.len(),
        mapping.generalized_tables.len()
    );

    let filters = mapping
        .element_filters()
        .context("CLI: Failed to compile element filters")?;

    if let Some(kind) = cli.kind {
        dump_index(&mapping, kind);
        return Ok(());
    }

    summarize(&mapping, &filters);
    Ok(())
}

/// Prints one `key=value -> table[:sub]` line per route, in index order.
fn dump_index(mapping: &Mapping, kind: GeometryKind) {
    let index = mapping.tag_tables(kind);
    for (key, values) in index.iter() {
        for (value, dests) in values {
            for dest in dests {
                println!("{key}={value} -> {}", dest.table);
            }
        }
    }
}

fn summarize(mapping: &Mapping, filters: &TableFilters) {
    println!("tables: {}", mapping.tables.len());
    for kind in GeometryKind::ALL {
        let index = mapping.tag_tables(kind);
        println!(
            "{kind}: {} keys, {} routes",
            index.key_count(),
            index.route_count()
        );
    }
    for (table, chain) in filters.iter() {
        println!("filters[{table}]: {} predicates", chain.len());
    }
}
