//! Path search tests
//!
//! This test suite covers:
//! - Path reconstruction and accumulated costs
//! - Cache hits and invalidation on modification
//! - Comparer-specific caching (ascending, descending, custom)
//! - The frontier-limited expansion order
//! - Search over a file-backed graph

use async_trait::async_trait;
use proptest::prelude::*;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use tempfile::TempDir;
use tokio::sync::Notify;
use wgraph_core::error::Result;
use wgraph_core::{CostComparer, EdgeMap, LabelPredicate, VertexAttributes, WeightedGraphStore};
use wgraph_engine::{CostAccumulator, PathStep, WeightedGraph};
use wgraph_storage::{FileGraphStore, InMemoryGraphStore};

fn s(label: &str) -> String {
    label.to_string()
}

async fn build(edges: &[(&str, &str, f64)]) -> WeightedGraph<String, f64> {
    let graph = WeightedGraph::in_memory(CostAccumulator::additive());
    for (from, to, cost) in edges {
        let node = graph.find_or_create_vertex(&s(from)).await.unwrap();
        node.connect_to(&graph, s(to), *cost).await.unwrap();
    }
    graph
}

fn labels(path: &[PathStep<String, f64>]) -> Vec<&str> {
    path.iter().map(|step| step.label.as_str()).collect()
}

// ==============================================================================
// Path reconstruction
// ==============================================================================

#[tokio::test]
async fn test_cheaper_two_hop_route_wins() {
    let graph = build(&[("A", "B", 1.0), ("B", "C", 1.0), ("A", "C", 5.0)]).await;

    let path = graph.find_best_path(&s("A"), &s("C"), None).await.unwrap().unwrap();
    assert_eq!(
        path,
        vec![
            PathStep { label: s("A"), cost: 0.0 },
            PathStep { label: s("B"), cost: 1.0 },
            PathStep { label: s("C"), cost: 2.0 },
        ]
    );
}

#[tokio::test]
async fn test_path_to_start_is_start_alone() {
    let graph = build(&[("A", "B", 1.0)]).await;
    let path = graph.find_best_path(&s("A"), &s("A"), None).await.unwrap().unwrap();
    assert_eq!(labels(&path), vec!["A"]);
    assert_eq!(path[0].cost, 0.0);
}

#[tokio::test]
async fn test_unreachable_end_has_no_path() {
    let graph = build(&[("A", "B", 1.0)]).await;
    graph.find_or_create_vertex(&s("Z")).await.unwrap();

    assert!(graph.find_best_path(&s("A"), &s("Z"), None).await.unwrap().is_none());
}

#[tokio::test]
async fn test_unknown_start_is_invalid_operation() {
    let graph = build(&[("A", "B", 1.0)]).await;
    let err = graph
        .find_best_path(&s("nowhere"), &s("A"), None)
        .await
        .unwrap_err();
    assert!(err.is_invalid_operation());
}

#[tokio::test]
async fn test_cycle_back_to_start_keeps_start_cost() {
    let graph = build(&[("A", "B", 1.0), ("B", "A", 1.0), ("B", "C", 1.0)]).await;

    let table = graph.path_search().costs_from(&graph, &s("A"), None).await.unwrap();
    let start = table.get(&s("A")).unwrap();
    assert_eq!(start.cost, 0.0);
    assert!(start.previous.is_none());

    let path = table.path_to(&s("C")).unwrap();
    assert_eq!(labels(&path), vec!["A", "B", "C"]);
}

#[tokio::test]
async fn test_expansion_only_follows_current_vertex_edges() {
    // B is expanded first and leads to D at 11. C (and its cheaper route to D)
    // is never expanded because it is not a child of B.
    let graph = build(&[
        ("A", "B", 1.0),
        ("A", "C", 2.0),
        ("B", "D", 10.0),
        ("C", "D", 1.0),
    ])
    .await;

    let path = graph.find_best_path(&s("A"), &s("D"), None).await.unwrap().unwrap();
    assert_eq!(labels(&path), vec!["A", "B", "D"]);
    assert_eq!(path.last().unwrap().cost, 11.0);

    let table = graph.path_search().costs_from(&graph, &s("A"), None).await.unwrap();
    assert!(!table.get(&s("C")).unwrap().visited);
}

#[tokio::test]
async fn test_bottleneck_accumulator() {
    let graph: WeightedGraph<String, u32> = WeightedGraph::in_memory(CostAccumulator::bottleneck());
    for (from, to, cost) in [("A", "B", 3u32), ("B", "C", 7), ("C", "D", 2)] {
        let node = graph.find_or_create_vertex(&s(from)).await.unwrap();
        node.connect_to(&graph, s(to), cost).await.unwrap();
    }

    let path = graph.find_best_path(&s("A"), &s("D"), None).await.unwrap().unwrap();
    let costs: Vec<u32> = path.iter().map(|step| step.cost).collect();
    assert_eq!(costs, vec![0, 3, 7, 7]);
}

// ==============================================================================
// Comparers
// ==============================================================================

#[tokio::test]
async fn test_descending_comparer_prefers_expensive_route() {
    let graph = build(&[
        ("A", "B", 1.0),
        ("A", "C", 5.0),
        ("B", "D", 1.0),
        ("C", "D", 1.0),
    ])
    .await;

    let cheapest = graph.find_best_path(&s("A"), &s("D"), None).await.unwrap().unwrap();
    assert_eq!(labels(&cheapest), vec!["A", "B", "D"]);
    assert_eq!(cheapest.last().unwrap().cost, 2.0);

    let descending = CostComparer::descending();
    let priciest = graph
        .find_best_path(&s("A"), &s("D"), Some(&descending))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(labels(&priciest), vec!["A", "C", "D"]);
    assert_eq!(priciest.last().unwrap().cost, 6.0);

    assert_eq!(graph.path_search().cached_entries(), 2);
}

#[tokio::test]
async fn test_custom_comparer_gets_its_own_cache_entry() {
    let graph = build(&[("A", "B", 1.0)]).await;
    let custom = CostComparer::new(|a: &f64, b: &f64| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let search = graph.path_search();

    graph.find_best_path(&s("A"), &s("B"), None).await.unwrap();
    graph.find_best_path(&s("A"), &s("B"), Some(&custom)).await.unwrap();
    graph.find_best_path(&s("A"), &s("B"), Some(&custom.clone())).await.unwrap();

    assert_eq!(search.computations(), 2);
    assert!(search.is_cached(&s("A"), &custom));
    assert!(search.is_cached(&s("A"), &CostComparer::natural()));
}

// ==============================================================================
// Caching
// ==============================================================================

#[tokio::test]
async fn test_repeated_query_hits_cache() {
    let graph = build(&[("A", "B", 1.0), ("B", "C", 1.0)]).await;
    let search = graph.path_search();

    let first = graph.find_best_path(&s("A"), &s("C"), None).await.unwrap();
    let second = graph.find_best_path(&s("A"), &s("B"), None).await.unwrap();
    let third = graph.find_best_path(&s("A"), &s("C"), None).await.unwrap();

    assert_eq!(search.computations(), 1);
    assert_eq!(first, third);
    assert_eq!(labels(&second.unwrap()), vec!["A", "B"]);
}

#[tokio::test]
async fn test_any_modification_invalidates_cache() {
    let graph = build(&[("A", "B", 1.0), ("B", "C", 1.0), ("X", "Y", 1.0)]).await;
    let search = graph.path_search();
    let natural = CostComparer::natural();

    graph.find_best_path(&s("A"), &s("C"), None).await.unwrap();
    assert!(search.is_cached(&s("A"), &natural));

    // Unrelated to anything reachable from A, still clears the cache
    let x = graph.find_vertex(&s("X"), false).await.unwrap().unwrap();
    x.connect_to(&graph, s("Z"), 2.0).await.unwrap();
    assert!(!search.is_cached(&s("A"), &natural));

    graph.find_best_path(&s("A"), &s("C"), None).await.unwrap();
    assert_eq!(search.computations(), 2);
}

#[tokio::test]
async fn test_new_edge_is_seen_after_invalidation() {
    let graph = build(&[("A", "B", 1.0)]).await;
    assert!(graph.find_best_path(&s("A"), &s("C"), None).await.unwrap().is_none());

    let b = graph.find_vertex(&s("B"), false).await.unwrap().unwrap();
    b.connect_to(&graph, s("C"), 4.0).await.unwrap();

    let path = graph.find_best_path(&s("A"), &s("C"), None).await.unwrap().unwrap();
    assert_eq!(path.last().unwrap().cost, 5.0);
}

#[tokio::test]
async fn test_clear_cache_for_start() {
    let graph = build(&[("A", "B", 1.0), ("B", "C", 1.0)]).await;
    let search = graph.path_search();
    let natural = CostComparer::natural();

    graph.find_best_path(&s("A"), &s("C"), None).await.unwrap();
    graph.find_best_path(&s("B"), &s("C"), None).await.unwrap();

    search.clear_cache_for(&s("A"));
    assert!(!search.is_cached(&s("A"), &natural));
    assert!(search.is_cached(&s("B"), &natural));

    search.clear_cache();
    assert_eq!(search.cached_entries(), 0);
}

#[tokio::test]
async fn test_save_does_not_change_results() {
    let graph = build(&[("A", "B", 2.0), ("B", "C", 3.0)]).await;
    let before = graph.find_best_path(&s("A"), &s("C"), None).await.unwrap();

    graph.save().await.unwrap();
    graph.path_search().clear_cache();

    let after = graph.find_best_path(&s("A"), &s("C"), None).await.unwrap();
    assert_eq!(before, after);
}

/// Store that pauses the first edge read of one label until released
struct GatedStore {
    inner: InMemoryGraphStore<String, f64>,
    gated: String,
    armed: AtomicBool,
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl WeightedGraphStore<String, f64> for GatedStore {
    async fn delete_all_data(&self) -> Result<bool> {
        self.inner.delete_all_data().await
    }

    async fn create_or_update_vertex(
        &self,
        label: &String,
        edges: Option<EdgeMap<String, f64>>,
    ) -> Result<bool> {
        self.inner.create_or_update_vertex(label, edges).await
    }

    async fn find_vertices(&self, predicate: LabelPredicate<'_, String>) -> Result<Vec<String>> {
        self.inner.find_vertices(predicate).await
    }

    async fn get_vertex_edges(&self, label: &String) -> Result<EdgeMap<String, f64>> {
        if label == &self.gated && self.armed.swap(false, AtomicOrdering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.get_vertex_edges(label).await
    }

    async fn get_vertex_attributes(&self, label: &String) -> Result<VertexAttributes> {
        self.inner.get_vertex_attributes(label).await
    }

    async fn update_vertex_attributes(
        &self,
        label: &String,
        attributes: VertexAttributes,
    ) -> Result<bool> {
        self.inner.update_vertex_attributes(label, attributes).await
    }

    async fn vertex_exists(&self, label: &String) -> Result<bool> {
        self.inner.vertex_exists(label).await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_table_computed_across_modification_is_not_cached() {
    let inner = InMemoryGraphStore::new();
    let mut out = EdgeMap::new();
    out.insert(s("B"), 1.0);
    inner.create_or_update_vertex(&s("A"), Some(out)).await.unwrap();
    inner.create_or_update_vertex(&s("B"), None).await.unwrap();

    let store = Arc::new(GatedStore {
        inner,
        gated: s("A"),
        armed: AtomicBool::new(true),
        entered: Notify::new(),
        release: Notify::new(),
    });
    let graph: Arc<WeightedGraph<String, f64>> =
        Arc::new(WeightedGraph::new(store.clone(), CostAccumulator::additive()));
    let natural = CostComparer::natural();

    let pending = {
        let graph = Arc::clone(&graph);
        tokio::spawn(async move { graph.path_search().costs_from(&graph, &s("A"), None).await })
    };

    // The search is parked inside the edge read of A; modify the graph meanwhile
    store.entered.notified().await;
    graph.find_or_create_vertex(&s("Z")).await.unwrap();
    store.release.notify_one();

    let table = pending.await.unwrap().unwrap();
    assert!(table.reached(&s("B")));
    assert!(!graph.path_search().is_cached(&s("A"), &natural));

    graph.path_search().costs_from(&graph, &s("A"), None).await.unwrap();
    assert!(graph.path_search().is_cached(&s("A"), &natural));
    assert_eq!(graph.path_search().computations(), 2);
}

// ==============================================================================
// File-backed graph
// ==============================================================================

#[tokio::test]
async fn test_search_over_reopened_file_store() {
    let dir = TempDir::new().unwrap();

    {
        let store = FileGraphStore::<String, f64>::open_at(dir.path()).await.unwrap();
        let graph: WeightedGraph<String, f64> =
            WeightedGraph::new(Arc::new(store), CostAccumulator::additive());
        for (from, to, cost) in [("home", "park", 2.0), ("park", "shop", 1.5), ("home", "shop", 9.0)] {
            let node = graph.find_or_create_vertex(&s(from)).await.unwrap();
            node.connect_to(&graph, s(to), cost).await.unwrap();
        }
        assert_eq!(graph.save().await.unwrap(), 3);
    }

    let store = FileGraphStore::<String, f64>::open_at(dir.path()).await.unwrap();
    let graph: WeightedGraph<String, f64> =
        WeightedGraph::new(Arc::new(store), CostAccumulator::additive());

    let path = graph
        .find_best_path(&s("home"), &s("shop"), None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(labels(&path), vec!["home", "park", "shop"]);
    assert_eq!(path.last().unwrap().cost, 3.5);
}

// ==============================================================================
// Properties
// ==============================================================================

/// Shortest distances by relaxation, for comparison
fn shortest_distances(edges: &HashMap<u32, EdgeMap<u32, u64>>, start: u32) -> HashMap<u32, u64> {
    let mut dist = HashMap::from([(start, 0u64)]);
    loop {
        let mut changed = false;
        for (from, targets) in edges {
            let Some(&base) = dist.get(from) else {
                continue;
            };
            for (to, weight) in targets {
                let candidate = base + weight;
                if dist.get(to).is_none_or(|&d| candidate < d) {
                    dist.insert(*to, candidate);
                    changed = true;
                }
            }
        }
        if !changed {
            return dist;
        }
    }
}

proptest! {
    #[test]
    fn prop_reached_vertices_have_valid_paths(
        raw in prop::collection::vec((0u32..6, 0u32..6, 1u64..50), 0..20)
    ) {
        let mut edges: HashMap<u32, EdgeMap<u32, u64>> = HashMap::new();
        edges.entry(0).or_default();
        for (from, to, weight) in raw {
            edges.entry(from).or_default().insert(to, weight);
            edges.entry(to).or_default();
        }

        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let table = runtime.block_on(async {
            let store = InMemoryGraphStore::new();
            for (label, targets) in &edges {
                store.create_or_update_vertex(label, Some(targets.clone())).await.unwrap();
            }
            let graph: WeightedGraph<u32, u64> =
                WeightedGraph::new(Arc::new(store), CostAccumulator::additive());
            graph.path_search().costs_from(&graph, &0, None).await.unwrap()
        });

        let optimal = shortest_distances(&edges, 0);
        for (label, entry) in table.iter() {
            prop_assert!(optimal.contains_key(label));
            prop_assert!(entry.cost >= optimal[label]);

            let path = table.path_to(label);
            prop_assert!(path.is_some());
            let path = path.unwrap();
            prop_assert_eq!(path[0].label, 0);
            prop_assert_eq!(path[0].cost, 0);
            prop_assert_eq!(path.last().unwrap().label, *label);
            prop_assert_eq!(path.last().unwrap().cost, entry.cost);

            for pair in path.windows(2) {
                prop_assert!(edges[&pair[0].label].contains_key(&pair[1].label));
                prop_assert!(pair[1].cost > pair[0].cost);
            }
        }
    }
}
