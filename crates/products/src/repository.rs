//! Read port for the product graph.
//!
//! Every traversal reads nodes and edges through this trait, one call per node
//! visited. Implementations must return outgoing edges in a stable order
//! (insertion order) so traversals are deterministic.

use std::sync::Arc;

use crate::component::ComponentEdge;
use crate::product::{Product, ProductId};

pub trait ProductRepository {
    fn get_product(&self, id: &ProductId) -> Option<Product>;
    fn get_outgoing_edges(&self, parent_id: &ProductId) -> Vec<ComponentEdge>;
}

impl<R> ProductRepository for &R
where
    R: ProductRepository + ?Sized,
{
    fn get_product(&self, id: &ProductId) -> Option<Product> {
        (**self).get_product(id)
    }

    fn get_outgoing_edges(&self, parent_id: &ProductId) -> Vec<ComponentEdge> {
        (**self).get_outgoing_edges(parent_id)
    }
}

impl<R> ProductRepository for Arc<R>
where
    R: ProductRepository + ?Sized,
{
    fn get_product(&self, id: &ProductId) -> Option<Product> {
        (**self).get_product(id)
    }

    fn get_outgoing_edges(&self, parent_id: &ProductId) -> Vec<ComponentEdge> {
        (**self).get_outgoing_edges(parent_id)
    }
}
