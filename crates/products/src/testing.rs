//! In-memory graph fixture for engine tests.
//!
//! Unlike the catalog store it performs no cycle validation, so tests can
//! build corrupted graphs on purpose.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;

use crate::component::ComponentEdge;
use crate::product::{CreateProduct, Product, ProductAttributes, ProductId, ProductType};
use crate::repository::ProductRepository;

/// 1e20: two of these multiplied overflow `Decimal`.
pub(crate) fn huge() -> Decimal {
    Decimal::from_i128_with_scale(100_000_000_000_000_000_000, 0)
}

/// 1e-15: two of these multiplied fall below `Decimal` precision.
pub(crate) fn tiny() -> Decimal {
    Decimal::new(1, 15)
}

#[derive(Debug, Default)]
pub(crate) struct MemoryGraph {
    products: HashMap<ProductId, Product>,
    edges: HashMap<ProductId, Vec<ComponentEdge>>,
}

impl MemoryGraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(
        &mut self,
        product_type: ProductType,
        reference: &str,
        attributes: ProductAttributes,
    ) -> ProductId {
        let product = Product::create(CreateProduct {
            product_id: ProductId::new(),
            product_type,
            reference: reference.to_string(),
            name: reference.to_string(),
            attributes,
            occurred_at: Utc::now(),
        })
        .unwrap();
        let id = product.id_typed();
        self.products.insert(id, product);
        id
    }

    pub(crate) fn article(&mut self, reference: &str, attributes: ProductAttributes) -> ProductId {
        self.add(ProductType::Article, reference, attributes)
    }

    pub(crate) fn kit(&mut self, reference: &str, attributes: ProductAttributes) -> ProductId {
        self.add(ProductType::Nomenclature, reference, attributes)
    }

    pub(crate) fn link(&mut self, parent: ProductId, component: ProductId, quantity: Decimal) {
        let edge = ComponentEdge::new(parent, component, quantity).unwrap();
        self.edges.entry(parent).or_default().push(edge);
    }

    pub(crate) fn forget(&mut self, id: ProductId) {
        self.products.remove(&id);
    }

    pub(crate) fn get(&self, id: ProductId) -> &Product {
        &self.products[&id]
    }
}

impl ProductRepository for MemoryGraph {
    fn get_product(&self, id: &ProductId) -> Option<Product> {
        self.products.get(id).cloned()
    }

    fn get_outgoing_edges(&self, parent_id: &ProductId) -> Vec<ComponentEdge> {
        self.edges.get(parent_id).cloned().unwrap_or_default()
    }
}
