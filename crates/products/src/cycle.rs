//! Pre-flight check for candidate component edges.

use std::collections::HashSet;

use crate::engine::{BomEngine, TraversalPath};
use crate::error::{CompositionError, CycleOrigin};
use crate::product::ProductId;
use crate::repository::ProductRepository;

impl<R: ProductRepository> BomEngine<R> {
    /// Decide whether the edge `parent_id -> candidate_id` may be added.
    ///
    /// Walks the candidate's own components depth-first. Reaching `parent_id`
    /// (or any node already on the current path) means the edge would close a
    /// cycle; the error carries the full loop, starting and ending at the parent.
    ///
    /// Must run in the same critical section as the edge write it guards.
    pub fn validate_no_cycle(
        &self,
        parent_id: ProductId,
        candidate_id: ProductId,
    ) -> Result<(), CompositionError> {
        if parent_id == candidate_id {
            tracing::warn!(product_id = %parent_id, "rejected self-referencing component edge");
            return Err(CompositionError::SelfReference(parent_id));
        }

        let mut path = TraversalPath::new(self.max_depth(), CycleOrigin::Validation);
        path.enter(parent_id)?;
        // Nodes whose whole sub-graph was searched without reaching the path.
        let mut cleared = HashSet::new();
        self.search_back_edge(candidate_id, &mut path, &mut cleared)
    }

    fn search_back_edge(
        &self,
        node: ProductId,
        path: &mut TraversalPath,
        cleared: &mut HashSet<ProductId>,
    ) -> Result<(), CompositionError> {
        if cleared.contains(&node) {
            return Ok(());
        }
        path.enter(node)?;
        for edge in self.repository().get_outgoing_edges(&node) {
            self.search_back_edge(edge.component_id(), path, cleared)?;
        }
        path.leave();
        cleared.insert(node);
        Ok(())
    }
}
