//! Cost comparer adapter.
//!
//! Wraps an arbitrary ordering function into a reusable comparer object so
//! path search can be parameterized by custom cost semantics (minimum cost,
//! maximum cost, lexicographic costs, ...).

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Identity of a comparer, shared by all clones of it.
///
/// Path search caches its results per `(start label, ComparerId)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComparerId(u64);

impl ComparerId {
    /// Id of [`CostComparer::natural`]
    pub const NATURAL: ComparerId = ComparerId(0);
    /// Id of [`CostComparer::descending`]
    pub const DESCENDING: ComparerId = ComparerId(1);

    fn next() -> Self {
        // 0 and 1 are reserved for the built-in comparers.
        static NEXT: AtomicU64 = AtomicU64::new(16);
        Self(NEXT.fetch_add(1, AtomicOrdering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ComparerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cmp#{}", self.0)
    }
}

type CompareFn<C> = dyn Fn(&C, &C) -> Ordering + Send + Sync;

/// Ordering over edge costs backed by a stored function.
pub struct CostComparer<C> {
    id: ComparerId,
    compare: Arc<CompareFn<C>>,
}

impl<C> CostComparer<C> {
    /// Wrap an ordering function. Every call allocates a fresh identity.
    pub fn new<F>(compare: F) -> Self
    where
        F: Fn(&C, &C) -> Ordering + Send + Sync + 'static,
    {
        Self {
            id: ComparerId::next(),
            compare: Arc::new(compare),
        }
    }

    /// Identity used as the comparer half of cache keys
    pub fn id(&self) -> ComparerId {
        self.id
    }

    /// Compare two costs
    pub fn compare(&self, a: &C, b: &C) -> Ordering {
        (self.compare)(a, b)
    }

    /// True when both costs are equal under this ordering
    pub fn equals(&self, a: &C, b: &C) -> bool {
        self.compare(a, b) == Ordering::Equal
    }

    /// True when `a` orders strictly before `b`
    pub fn is_lower(&self, a: &C, b: &C) -> bool {
        self.compare(a, b) == Ordering::Less
    }

    /// A comparer with the opposite ordering and a new identity
    pub fn reversed(&self) -> Self
    where
        C: 'static,
    {
        let inner = Arc::clone(&self.compare);
        Self::new(move |a, b| inner(b, a))
    }
}

impl<C: PartialOrd + 'static> CostComparer<C> {
    /// Ascending natural order: lower cost wins.
    ///
    /// Incomparable values (e.g. `NaN`) compare as equal.
    pub fn natural() -> Self {
        Self {
            id: ComparerId::NATURAL,
            compare: Arc::new(|a: &C, b: &C| a.partial_cmp(b).unwrap_or(Ordering::Equal)),
        }
    }

    /// Descending natural order: higher cost wins.
    pub fn descending() -> Self {
        Self {
            id: ComparerId::DESCENDING,
            compare: Arc::new(|a: &C, b: &C| b.partial_cmp(a).unwrap_or(Ordering::Equal)),
        }
    }
}

impl<C> Clone for CostComparer<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            compare: Arc::clone(&self.compare),
        }
    }
}

impl<C: PartialOrd + 'static> Default for CostComparer<C> {
    fn default() -> Self {
        Self::natural()
    }
}

impl<C> fmt::Debug for CostComparer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CostComparer").field("id", &self.id).finish()
    }
}
