//! Command implementations for the wgraph CLI.
//!
//! Every command runs against one [`Session`]: a file-backed graph with
//! `String` labels and `f64` costs summed along paths. Mutating commands save
//! before returning.

use crate::output::{self, OutputFormat, TableBuilder};
use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use wgraph_core::{CostComparer, StoreConfig, WeightedGraphStore};
use wgraph_engine::{CostAccumulator, WeightedGraph};
use wgraph_storage::{FileGraphStore, InstrumentedStore, StoreStats};

type SessionStore = InstrumentedStore<FileGraphStore<String, f64>>;

/// An open graph plus the counters of the store under it
pub struct Session {
    graph: WeightedGraph<String, f64>,
    store: Arc<SessionStore>,
    root: PathBuf,
}

impl Session {
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        let file_store = FileGraphStore::open(config.clone())
            .await
            .with_context(|| format!("Failed to open graph store at {}", config.root.display()))?;
        let store = Arc::new(InstrumentedStore::new(file_store));
        let graph: WeightedGraph<String, f64> =
            WeightedGraph::new(store.clone(), CostAccumulator::additive());

        Ok(Self {
            graph,
            store,
            root: config.root.clone(),
        })
    }

    pub fn graph(&self) -> &WeightedGraph<String, f64> {
        &self.graph
    }

    pub fn stats(&self) -> StoreStats {
        self.store.stats()
    }

    async fn save(&self) -> Result<usize> {
        let written = self.graph.save().await.context("Failed to save graph")?;
        debug!("Wrote {} vertices to {}", written, self.root.display());
        Ok(written)
    }
}

#[derive(Debug, Serialize)]
struct EdgeRow {
    target: String,
    cost: f64,
}

#[derive(Debug, Serialize)]
struct StatsReport {
    root: PathBuf,
    vertices: usize,
    store: StoreStats,
}

/// Create or overwrite the edge `from -> to`
pub async fn connect(session: &Session, from: String, to: String, cost: f64) -> Result<()> {
    let graph = session.graph();
    let node = graph.find_or_create_vertex(&from).await?;
    node.connect_to(graph, to.clone(), cost)
        .await
        .with_context(|| format!("Failed to connect {} -> {}", from, to))?;
    session.save().await?;

    output::success(format!("{} -> {} ({})", from, to, output::format_cost(cost)));
    Ok(())
}

/// Add `delta` to the existing edge `from -> to`
pub async fn increment(session: &Session, from: String, to: String, delta: f64) -> Result<()> {
    let graph = session.graph();
    let Some(node) = graph.find_vertex(&from, true).await? else {
        bail!("Vertex '{}' does not exist", from);
    };
    node.increment_weight(graph, &to, |cost| cost + delta)
        .await
        .with_context(|| format!("Failed to increment {} -> {}", from, to))?;
    let cost = node.edge_cost(graph, &to).await?.unwrap_or_default();
    session.save().await?;

    output::success(format!("{} -> {} ({})", from, to, output::format_cost(cost)));
    Ok(())
}

/// Remove the edge `from -> to`
pub async fn disconnect(session: &Session, from: String, to: String) -> Result<()> {
    let graph = session.graph();
    let Some(node) = graph.find_vertex(&from, true).await? else {
        bail!("Vertex '{}' does not exist", from);
    };
    match node.disconnect_from(graph, &to).await? {
        Some(cost) => {
            session.save().await?;
            output::success(format!(
                "Removed {} -> {} ({})",
                from,
                to,
                output::format_cost(cost)
            ));
        }
        None => output::warning(format!("No edge {} -> {}", from, to)),
    }
    Ok(())
}

/// Show the outgoing edges of a vertex
pub async fn edges(session: &Session, label: String, format: OutputFormat) -> Result<()> {
    let graph = session.graph();
    let Some(node) = graph.find_vertex(&label, true).await? else {
        bail!("Vertex '{}' does not exist", label);
    };

    let mut rows: Vec<EdgeRow> = node
        .edge_map(graph)
        .await?
        .into_iter()
        .map(|(target, cost)| EdgeRow { target, cost })
        .collect();
    rows.sort_by(|a, b| a.target.cmp(&b.target));

    match format {
        OutputFormat::Json => output::json(&rows)?,
        OutputFormat::Human => {
            if rows.is_empty() {
                output::warning(format!("'{}' has no outgoing edges", label));
                return Ok(());
            }
            output::header(format!("Edges of {}", label));
            rows.iter()
                .fold(TableBuilder::new().header(vec!["Target", "Cost"]), |table, row| {
                    table.row(vec![row.target.clone(), output::format_cost(row.cost)])
                })
                .print();
        }
    }
    Ok(())
}

/// List vertex labels, optionally filtered by prefix
pub async fn list(session: &Session, prefix: Option<String>, format: OutputFormat) -> Result<()> {
    let prefix = prefix.unwrap_or_default();
    let mut labels = session
        .graph()
        .find_vertices(&|label: &String| label.starts_with(prefix.as_str()))
        .await?;
    labels.sort();

    match format {
        OutputFormat::Json => output::json(&labels)?,
        OutputFormat::Human => {
            if labels.is_empty() {
                output::warning("No vertices found");
                return Ok(());
            }
            for label in &labels {
                println!("  {}", label);
            }
            output::kv("Total", labels.len());
        }
    }
    Ok(())
}

/// Find the best path between two vertices.
///
/// `maximize` searches for the most expensive route instead of the cheapest.
pub async fn path(
    session: &Session,
    from: String,
    to: String,
    maximize: bool,
    format: OutputFormat,
) -> Result<()> {
    let comparer = if maximize {
        CostComparer::descending()
    } else {
        CostComparer::natural()
    };

    let found = session
        .graph()
        .find_best_path(&from, &to, Some(&comparer))
        .await
        .with_context(|| format!("Path search from '{}' failed", from))?;

    match (format, found) {
        (OutputFormat::Json, found) => output::json(&found)?,
        (OutputFormat::Human, None) => {
            output::warning(format!("No path from {} to {}", from, to));
        }
        (OutputFormat::Human, Some(steps)) => {
            output::header(format!("Path {} -> {}", from, to));
            steps
                .iter()
                .enumerate()
                .fold(
                    TableBuilder::new().header(vec!["#", "Vertex", "Cost"]),
                    |table, (i, step)| {
                        table.row(vec![
                            i.to_string(),
                            step.label.clone(),
                            output::format_cost(step.cost),
                        ])
                    },
                )
                .print();
        }
    }
    Ok(())
}

/// Delete every vertex in the store
pub async fn clear(session: &Session, force: bool) -> Result<()> {
    if !force {
        output::warning(format!(
            "This deletes every vertex under {}. Re-run with --force to confirm.",
            session.root.display()
        ));
        return Ok(());
    }

    session.graph().delete_all_data().await?;
    output::success(format!("Cleared {}", session.root.display()));
    Ok(())
}

/// Show store location, size and the calls made in this session
pub async fn stats(session: &Session, format: OutputFormat) -> Result<()> {
    let report = StatsReport {
        root: session.root.clone(),
        vertices: session.store.vertex_count().await?,
        store: session.stats(),
    };

    match format {
        OutputFormat::Json => output::json(&report)?,
        OutputFormat::Human => {
            output::header("Graph store");
            output::kv("Root", report.root.display());
            output::kv("Vertices", report.vertices);
            output::kv("Edge reads", report.store.edge_reads);
            output::kv("Vertex writes", report.store.vertex_writes);
            output::kv("Existence checks", report.store.existence_checks);
        }
    }
    Ok(())
}
