//! Schema Visit CLI
//!
//! Inspects schema documents through the visitor: variant outlines, variant
//! counts and shape checks.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use schema_visitor::config::OutputFormat;
use schema_visitor::loader::{load_path, SchemaDocument};
use schema_visitor::schema::SchemaNode;
use schema_visitor::{SchemaVisitor, VisitContext, VisitorConfig};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-visit")]
#[command(about = "Inspect schema documents with the schema visitor")]
struct Cli {
    /// Config file layered over the default locations
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the variant outline of each document
    Variants {
        /// Schema file or directory
        path: PathBuf,
    },

    /// Count nodes per variant across all documents
    Stats {
        /// Schema file or directory
        path: PathBuf,
    },

    /// Check that every document has a recognized shape
    Check {
        /// Schema file or directory
        path: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = VisitorConfig::load_from(cli.config.as_deref())?;
    let options = config.parse.options();
    debug!(?options, "loaded configuration");

    match cli.command {
        Commands::Variants { path } => {
            let outline = outline_visitor();
            for SchemaDocument { path, value } in load_path(&path, &config.loader)? {
                let node = SchemaNode::from_value_with(&value, &options)?;
                println!("{}", path.display());
                for line in outline.visit(&node).unwrap_or_default() {
                    println!("  {}", line);
                }
                println!();
            }
            Ok(())
        }

        Commands::Stats { path } => {
            let counter = count_visitor();
            let mut totals: BTreeMap<String, usize> = BTreeMap::new();
            for doc in load_path(&path, &config.loader)? {
                let node = SchemaNode::from_value_with(&doc.value, &options)?;
                for (variant, n) in counter.visit(&node).unwrap_or_default() {
                    *totals.entry(variant).or_default() += n;
                }
            }
            let rendered = match config.output.format {
                OutputFormat::Pretty => serde_json::to_string_pretty(&totals)?,
                OutputFormat::Compact => serde_json::to_string(&totals)?,
            };
            println!("{}", rendered);
            Ok(())
        }

        Commands::Check { path } => {
            let mut all_valid = true;
            for doc in load_path(&path, &config.loader)? {
                match SchemaNode::from_value_with(&doc.value, &options) {
                    Ok(node) => {
                        println!("  ✅ {} - {} ({} nodes)", doc.path.display(), node.variant(), node.node_count());
                    }
                    Err(e) => {
                        println!("  ❌ {} - {}", doc.path.display(), e);
                        all_valid = false;
                    }
                }
            }
            if !all_valid {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

/// One line per node, children indented under their parent
fn outline_visitor() -> SchemaVisitor<'static, Vec<String>> {
    SchemaVisitor::new().fallback(|node, ctx| {
        let mut lines = vec![label(node)];
        match ctx {
            VisitContext::Leaf => {}
            VisitContext::Item(inner) => nest(&mut lines, "items", inner),
            VisitContext::Items(items) => {
                for (i, inner) in items.into_iter().enumerate() {
                    nest(&mut lines, &format!("[{}]", i), inner);
                }
            }
            VisitContext::Object(result) => {
                if let Some(additional) = result.additional_properties {
                    nest(&mut lines, "additionalProperties", Some(additional));
                }
                for (key, inner) in result.properties.into_iter().flatten() {
                    nest(&mut lines, &key, inner);
                }
                for (key, inner) in result.pattern_properties.into_iter().flatten() {
                    nest(&mut lines, &format!("/{}/", key), inner);
                }
            }
            VisitContext::Record(result) => {
                for (key, inner) in result.properties {
                    nest(&mut lines, &key, inner);
                }
            }
        }
        Some(lines)
    })
}

fn nest(lines: &mut Vec<String>, key: &str, child: Option<Vec<String>>) {
    let mut child = child.unwrap_or_default().into_iter();
    if let Some(first) = child.next() {
        lines.push(format!("  {}: {}", key, first));
    }
    lines.extend(child.map(|line| format!("  {}", line)));
}

fn label(node: &SchemaNode) -> String {
    match node {
        SchemaNode::Ref(r) => format!("Ref -> {}", r.target().unwrap_or("?")),
        SchemaNode::ResolveRef(r) => format!("ResolveRef -> {}", r.target().unwrap_or("?")),
        SchemaNode::Enum(e) => {
            let values: Vec<String> = e.values().iter().map(|v| v.to_string()).collect();
            format!("Enum [{}]", values.join(", "))
        }
        SchemaNode::String(s) => match s.pattern() {
            Some(pattern) => format!("String /{}/", pattern),
            None => "String".to_string(),
        },
        other => other.variant().to_string(),
    }
}

/// Node counts per variant, using only the generic handler
fn count_visitor() -> SchemaVisitor<'static, BTreeMap<String, usize>> {
    SchemaVisitor::new().fallback(|node, ctx| {
        let children: Vec<Option<BTreeMap<String, usize>>> = match ctx {
            VisitContext::Leaf => Vec::new(),
            VisitContext::Item(inner) => vec![inner],
            VisitContext::Items(items) => items,
            VisitContext::Object(result) => result
                .properties
                .into_iter()
                .flatten()
                .chain(result.pattern_properties.into_iter().flatten())
                .map(|(_, v)| v)
                .chain(std::iter::once(result.additional_properties))
                .collect(),
            VisitContext::Record(result) => result.properties.into_values().collect(),
        };

        let mut counts = BTreeMap::new();
        counts.insert(node.variant().to_string(), 1);
        for child in children.into_iter().flatten() {
            for (variant, n) in child {
                *counts.entry(variant).or_default() += n;
            }
        }
        Some(counts)
    })
}
