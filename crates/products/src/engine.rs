//! Read-side composition engine over a [`ProductRepository`].
//!
//! Every algorithm walks the graph recursively from one root and keeps a
//! **path-scoped** visited list: a node is pushed when the walk enters it and
//! popped when it leaves, so siblings never see each other's nodes. A node
//! reached twice through different branches (diamond reuse) is legitimate; a
//! node reached again on its own path is a cycle.

use rust_decimal::Decimal;

use crate::error::{CompositionError, CycleOrigin};
use crate::product::{Product, ProductId};
use crate::repository::ProductRepository;

/// Default bound on BOM depth (levels below the root).
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Cycle validation, BOM expansion, price/cost resolution and weight aggregation.
///
/// Holds no cache: each call reads the graph as it is at call time.
#[derive(Debug, Clone)]
pub struct BomEngine<R> {
    repo: R,
    max_depth: usize,
}

impl<R: ProductRepository> BomEngine<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Fail traversals that go deeper than `max_depth` levels below their root.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Fetch a product that a traversal expects to exist.
    pub(crate) fn product(&self, id: &ProductId) -> Result<Product, CompositionError> {
        self.repo.get_product(id).ok_or_else(|| {
            tracing::error!(product_id = %id, "product referenced by the BOM graph is missing");
            CompositionError::ProductNotFound(*id)
        })
    }
}

/// Nodes on the current traversal path, root first.
#[derive(Debug)]
pub(crate) struct TraversalPath {
    nodes: Vec<ProductId>,
    max_depth: usize,
    origin: CycleOrigin,
}

impl TraversalPath {
    pub(crate) fn new(max_depth: usize, origin: CycleOrigin) -> Self {
        Self {
            nodes: Vec::new(),
            max_depth,
            origin,
        }
    }

    /// Push `id`, failing if it already sits on the path or the path is too deep.
    pub(crate) fn enter(&mut self, id: ProductId) -> Result<(), CompositionError> {
        if self.nodes.contains(&id) {
            return Err(self.cycle(self.through(id)));
        }
        // The root is level 0, so a path of n nodes reaches level n - 1.
        if self.nodes.len() > self.max_depth {
            tracing::warn!(limit = self.max_depth, product_id = %id, "BOM depth limit exceeded");
            return Err(CompositionError::DepthLimitExceeded {
                limit: self.max_depth,
                path: self.through(id),
            });
        }
        self.nodes.push(id);
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.nodes.pop();
    }

    /// Nodes on the path, root first.
    pub(crate) fn current(&self) -> Vec<ProductId> {
        self.nodes.clone()
    }

    /// Nodes on the path followed by `next`, the node being stepped into.
    pub(crate) fn through(&self, next: ProductId) -> Vec<ProductId> {
        let mut path = self.nodes.clone();
        path.push(next);
        path
    }

    pub(crate) fn cycle(&self, path: Vec<ProductId>) -> CompositionError {
        match self.origin {
            CycleOrigin::Validation => {
                tracing::warn!(length = path.len(), "rejected component edge closing a cycle");
            }
            CycleOrigin::Traversal => {
                tracing::error!(
                    length = path.len(),
                    "cycle found in persisted BOM graph; aborting traversal"
                );
            }
        }
        CompositionError::CycleDetected {
            path,
            origin: self.origin,
        }
    }
}

/// `a * b`, failing on overflow and when two non-zero factors round to zero.
///
/// `path` is only built on failure.
pub(crate) fn checked_mul(
    a: Decimal,
    b: Decimal,
    path: impl FnOnce() -> Vec<ProductId>,
) -> Result<Decimal, CompositionError> {
    match a.checked_mul(b) {
        Some(product) if product.is_zero() && !a.is_zero() && !b.is_zero() => {
            let path = path();
            tracing::error!(%a, %b, length = path.len(), "decimal product underflowed to zero");
            Err(CompositionError::ArithmeticUnderflow { path })
        }
        Some(product) => Ok(product),
        None => Err(overflow(a, b, path())),
    }
}

pub(crate) fn checked_add(
    a: Decimal,
    b: Decimal,
    path: impl FnOnce() -> Vec<ProductId>,
) -> Result<Decimal, CompositionError> {
    a.checked_add(b).ok_or_else(|| overflow(a, b, path()))
}

/// `a / b`; division by zero is reported as an overflow.
pub(crate) fn checked_div(
    a: Decimal,
    b: Decimal,
    path: impl FnOnce() -> Vec<ProductId>,
) -> Result<Decimal, CompositionError> {
    a.checked_div(b).ok_or_else(|| overflow(a, b, path()))
}

fn overflow(a: Decimal, b: Decimal, path: Vec<ProductId>) -> CompositionError {
    tracing::error!(%a, %b, length = path.len(), "decimal arithmetic overflowed");
    CompositionError::ArithmeticOverflow { path }
}
