//! Cost accumulation used by path search.

use std::fmt;
use std::ops::Add;
use std::sync::Arc;

type CombineFn<C> = dyn Fn(&C, &C) -> C + Send + Sync;

/// Combines an edge weight with the cost accumulated so far.
pub struct CostAccumulator<C> {
    combine: Arc<CombineFn<C>>,
}

impl<C> CostAccumulator<C> {
    /// Wrap `combine(weight, current) -> new cost`
    pub fn new<F>(combine: F) -> Self
    where
        F: Fn(&C, &C) -> C + Send + Sync + 'static,
    {
        Self {
            combine: Arc::new(combine),
        }
    }

    pub fn combine(&self, weight: &C, current: &C) -> C {
        (self.combine)(weight, current)
    }
}

impl<C> CostAccumulator<C>
where
    C: Add<Output = C> + Clone + 'static,
{
    /// Sum of edge weights
    pub fn additive() -> Self {
        Self::new(|weight: &C, current: &C| current.clone() + weight.clone())
    }
}

impl<C: PartialOrd + Clone + 'static> CostAccumulator<C> {
    /// Largest edge weight seen along the path
    pub fn bottleneck() -> Self {
        Self::new(|weight: &C, current: &C| {
            if weight > current {
                weight.clone()
            } else {
                current.clone()
            }
        })
    }
}

impl<C> Clone for CostAccumulator<C> {
    fn clone(&self) -> Self {
        Self {
            combine: Arc::clone(&self.combine),
        }
    }
}

impl<C> fmt::Debug for CostAccumulator<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CostAccumulator").finish_non_exhaustive()
    }
}
