//! Memoized optimal path search.
//!
//! From a start vertex the search builds a cost table by greedy expansion:
//!
//! 1. The start is recorded at `C::default()` and marked visited.
//! 2. For each edge `(child, weight)` of the current vertex the candidate cost
//!    is `combine(weight, current cost)`. Unknown children are recorded; known
//!    ones are overwritten when the candidate is lower under the comparer.
//! 3. The next current vertex is the lowest-cost unvisited child of the
//!    current vertex. Unvisited vertices reached from earlier vertices are not
//!    candidates.
//! 4. Expansion stops when the current vertex has no unvisited child.
//!
//! Step 3 makes this a frontier-limited walk rather than Dijkstra: it can miss
//! a cheaper route that branches off an earlier vertex. Paths are read back
//! from the table by following `previous` links from the end vertex.
//!
//! Tables are cached per `(start label, comparer id)` until the graph is
//! modified or the cache is cleared.

use crate::accumulator::CostAccumulator;
use crate::graph::WeightedGraph;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};
use wgraph_core::error::{GraphError, Result};
use wgraph_core::{ComparerId, CostComparer, EdgeCost, VertexLabel};

/// One vertex of a reconstructed path with its accumulated cost
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathStep<T, C> {
    pub label: T,
    pub cost: C,
}

/// Cost record of one reached vertex
#[derive(Debug, Clone, PartialEq)]
pub struct CostEntry<T, C> {
    pub previous: Option<T>,
    pub cost: C,
    pub visited: bool,
}

/// Costs of every vertex reached from one start vertex
#[derive(Debug, Clone)]
pub struct CostTable<T, C> {
    start: T,
    entries: HashMap<T, CostEntry<T, C>>,
    version: u64,
}

impl<T: VertexLabel, C: EdgeCost> CostTable<T, C> {
    pub fn start(&self) -> &T {
        &self.start
    }

    /// Graph version the table was computed at
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn get(&self, label: &T) -> Option<&CostEntry<T, C>> {
        self.entries.get(label)
    }

    /// Every reached vertex with its cost record
    pub fn iter(&self) -> impl Iterator<Item = (&T, &CostEntry<T, C>)> {
        self.entries.iter()
    }

    pub fn reached(&self, label: &T) -> bool {
        self.entries.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Walk `previous` links back from `end` to the start.
    ///
    /// `None` when `end` was not reached or the links form a cycle.
    pub fn path_to(&self, end: &T) -> Option<Vec<PathStep<T, C>>> {
        let mut steps = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor = end.clone();

        loop {
            let entry = self.entries.get(&cursor)?;
            if !seen.insert(cursor.clone()) {
                warn!(
                    "Cycle in path links from {:?} to {:?} at {:?}",
                    self.start, end, cursor
                );
                return None;
            }
            let previous = entry.previous.clone();
            steps.push(PathStep {
                label: cursor,
                cost: entry.cost.clone(),
            });
            match previous {
                Some(prev) => cursor = prev,
                None => break,
            }
        }

        steps.reverse();
        Some(steps)
    }
}

type CacheKey<T> = (T, ComparerId);

/// Path search with a per-(start, comparer) result cache
pub struct OptimalPathSearch<T, C> {
    accumulator: CostAccumulator<C>,
    cache: RwLock<HashMap<CacheKey<T>, Arc<CostTable<T, C>>>>,
    computations: AtomicU64,
}

impl<T: VertexLabel, C: EdgeCost> OptimalPathSearch<T, C> {
    pub fn new(accumulator: CostAccumulator<C>) -> Self {
        Self {
            accumulator,
            cache: RwLock::new(HashMap::new()),
            computations: AtomicU64::new(0),
        }
    }

    /// Number of cost tables computed (cache misses)
    pub fn computations(&self) -> u64 {
        self.computations.load(Ordering::Relaxed)
    }

    /// Number of cached cost tables
    pub fn cached_entries(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_cached(&self, start: &T, comparer: &CostComparer<C>) -> bool {
        self.cache.read().contains_key(&(start.clone(), comparer.id()))
    }

    pub fn clear_cache(&self) {
        let mut cache = self.cache.write();
        if !cache.is_empty() {
            debug!("Clearing {} cached path tables", cache.len());
            cache.clear();
        }
    }

    /// Drop cached tables computed from `start`
    pub fn clear_cache_for(&self, start: &T) {
        self.cache.write().retain(|(label, _), _| label != start);
    }

    /// Lowest-cost path from `start` to `end`, `None` when `end` is not reached
    pub async fn find_best_path(
        &self,
        graph: &WeightedGraph<T, C>,
        start: &T,
        end: &T,
        comparer: Option<&CostComparer<C>>,
    ) -> Result<Option<Vec<PathStep<T, C>>>> {
        let table = self.costs_from(graph, start, comparer).await?;
        Ok(table.path_to(end))
    }

    /// Cost table from `start`, computed on a cache miss.
    ///
    /// Fails with [`GraphError::InvalidOperation`] when `start` does not
    /// resolve to a vertex.
    pub async fn costs_from(
        &self,
        graph: &WeightedGraph<T, C>,
        start: &T,
        comparer: Option<&CostComparer<C>>,
    ) -> Result<Arc<CostTable<T, C>>> {
        let natural;
        let comparer = match comparer {
            Some(comparer) => comparer,
            None => {
                natural = CostComparer::natural();
                &natural
            }
        };

        let key = (start.clone(), comparer.id());
        let cached = self.cache.read().get(&key).cloned();
        if let Some(table) = cached {
            debug!("Path cache hit for {:?} ({})", start, comparer.id());
            return Ok(table);
        }

        let version = graph.version();
        let table = Arc::new(self.compute(graph, start, comparer, version).await?);

        // Checked under the cache lock: a concurrent modification either bumped
        // the version already or clears the cache after this insert
        let mut cache = self.cache.write();
        if graph.version() == version {
            cache.insert(key, Arc::clone(&table));
        } else {
            debug!("Graph modified while computing from {:?}, not caching", start);
        }
        Ok(table)
    }

    async fn compute(
        &self,
        graph: &WeightedGraph<T, C>,
        start: &T,
        comparer: &CostComparer<C>,
        version: u64,
    ) -> Result<CostTable<T, C>> {
        let mut current = graph.find_vertex(start, true).await?.ok_or_else(|| {
            GraphError::invalid_operation(format!("start vertex {:?} does not exist", start))
        })?;
        self.computations.fetch_add(1, Ordering::Relaxed);

        let mut entries = HashMap::new();
        entries.insert(
            start.clone(),
            CostEntry {
                previous: None,
                cost: C::default(),
                visited: true,
            },
        );

        loop {
            let current_label = current.label().clone();
            let current_cost = entries
                .get(&current_label)
                .map(|e: &CostEntry<T, C>| e.cost.clone())
                .unwrap_or_default();
            let edges = current.get_edges(graph).await?;

            for (child, weight) in &edges {
                let child_label = child.label();
                let new_cost = self.accumulator.combine(weight, &current_cost);
                match entries.get_mut(child_label) {
                    None => {
                        entries.insert(
                            child_label.clone(),
                            CostEntry {
                                previous: Some(current_label.clone()),
                                cost: new_cost,
                                visited: false,
                            },
                        );
                    }
                    // The start keeps its default cost
                    Some(_) if child_label == start => {}
                    Some(entry) => {
                        if comparer.is_lower(&new_cost, &entry.cost) {
                            entry.cost = new_cost;
                            entry.previous = Some(current_label.clone());
                        }
                    }
                }
            }

            let mut next: Option<(&T, &C)> = None;
            for (child, _) in &edges {
                let Some(entry) = entries.get(child.label()) else {
                    continue;
                };
                if entry.visited {
                    continue;
                }
                let better = match next {
                    None => true,
                    Some((_, best)) => comparer.is_lower(&entry.cost, best),
                };
                if better {
                    next = Some((child.label(), &entry.cost));
                }
            }

            let Some(next_label) = next.map(|(label, _)| label.clone()) else {
                break;
            };
            if let Some(entry) = entries.get_mut(&next_label) {
                entry.visited = true;
            }
            current = edges
                .into_iter()
                .find(|(child, _)| child.label() == &next_label)
                .map(|(child, _)| child)
                .ok_or_else(|| GraphError::internal("expansion target vanished from edge list"))?;
        }

        debug!(
            "Computed path table from {:?}: {} vertices reached",
            start,
            entries.len()
        );

        Ok(CostTable {
            start: start.clone(),
            entries,
            version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, Option<&str>, u32)]) -> CostTable<String, u32> {
        CostTable {
            start: pairs[0].0.to_string(),
            entries: pairs
                .iter()
                .map(|(label, prev, cost)| {
                    (
                        label.to_string(),
                        CostEntry {
                            previous: prev.map(str::to_string),
                            cost: *cost,
                            visited: true,
                        },
                    )
                })
                .collect(),
            version: 0,
        }
    }

    #[test]
    fn test_path_to_walks_previous_links() {
        let t = table(&[("a", None, 0), ("b", Some("a"), 1), ("c", Some("b"), 2)]);
        let path = t.path_to(&"c".to_string()).unwrap();
        let labels: Vec<_> = path.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
        assert_eq!(path[2].cost, 2);
    }

    #[test]
    fn test_path_to_start_is_single_step() {
        let t = table(&[("a", None, 0)]);
        assert_eq!(
            t.path_to(&"a".to_string()).unwrap(),
            vec![PathStep { label: "a".to_string(), cost: 0 }]
        );
    }

    #[test]
    fn test_unreached_end_has_no_path() {
        let t = table(&[("a", None, 0)]);
        assert!(t.path_to(&"z".to_string()).is_none());
    }

    #[test]
    fn test_cyclic_links_have_no_path() {
        let t = table(&[("a", None, 0), ("b", Some("c"), 1), ("c", Some("b"), 2)]);
        assert!(t.path_to(&"c".to_string()).is_none());
    }
}
