//! In-memory product catalog: the write side of the product graph.
//!
//! Products and component edges live behind a single `RwLock`. Readers
//! (traversals) take the read lock once per node visited. Every structural
//! edit takes the write lock for the whole validate-then-write sequence, so
//! two concurrent inserts that are each acyclic can never jointly close a
//! cycle: the second one is validated against a graph that already contains
//! the first.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rust_decimal::Decimal;

use kitbom_core::{AggregateRoot, ExpectedVersion};
use kitbom_products::{
    BomEngine, ComponentEdge, CompositionError, CreateProduct, Product, ProductId,
    ProductRepository, UpdateProduct, normalize_reference,
};

use crate::config::EngineConfig;

#[derive(Debug, Default)]
struct CatalogState {
    products: HashMap<ProductId, Product>,
    references: HashMap<String, ProductId>,
    /// Outgoing edges per parent, in insertion order.
    edges: HashMap<ProductId, Vec<ComponentEdge>>,
}

impl CatalogState {
    fn require(&self, id: ProductId) -> Result<&Product, CompositionError> {
        self.products
            .get(&id)
            .ok_or(CompositionError::ProductNotFound(id))
    }

    fn parents_of(&self, component_id: ProductId) -> Vec<ProductId> {
        let mut parents: Vec<ProductId> = self
            .edges
            .iter()
            .filter(|(_, edges)| edges.iter().any(|e| e.component_id() == component_id))
            .map(|(parent, _)| *parent)
            .collect();
        parents.sort();
        parents
    }

    fn edge_position(&self, parent_id: ProductId, component_id: ProductId) -> Option<usize> {
        self.edges
            .get(&parent_id)?
            .iter()
            .position(|e| e.connects(parent_id, component_id))
    }
}

impl ProductRepository for CatalogState {
    fn get_product(&self, id: &ProductId) -> Option<Product> {
        self.products.get(id).cloned()
    }

    fn get_outgoing_edges(&self, parent_id: &ProductId) -> Vec<ComponentEdge> {
        self.edges.get(parent_id).cloned().unwrap_or_default()
    }
}

/// Thread-safe in-memory catalog for tests/dev.
#[derive(Debug)]
pub struct InMemoryCatalog {
    state: RwLock<CatalogState>,
    config: EngineConfig,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            state: RwLock::new(CatalogState::default()),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Read-side engine over this catalog, bounded by the configured depth.
    pub fn engine(&self) -> BomEngine<&Self> {
        BomEngine::new(self).with_max_depth(self.config.max_depth)
    }

    // Validation happens before any mutation, so a poisoned lock still guards
    // a consistent state.
    fn read(&self) -> RwLockReadGuard<'_, CatalogState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CatalogState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert_product(&self, cmd: CreateProduct) -> Result<Product, CompositionError> {
        let product = Product::create(cmd)?;
        let mut state = self.write();

        if state.products.contains_key(&product.id_typed()) {
            return Err(kitbom_core::DomainError::conflict(format!(
                "product {} already exists",
                product.id_typed()
            ))
            .into());
        }
        if state.references.contains_key(product.reference()) {
            return Err(CompositionError::DuplicateReference(
                product.reference().to_string(),
            ));
        }

        state
            .references
            .insert(product.reference().to_string(), product.id_typed());
        state.products.insert(product.id_typed(), product.clone());
        tracing::info!(
            product_id = %product.id_typed(),
            reference = product.reference(),
            product_type = ?product.product_type(),
            "product created"
        );
        Ok(product)
    }

    pub fn update_product(
        &self,
        cmd: UpdateProduct,
        expected: ExpectedVersion,
    ) -> Result<Product, CompositionError> {
        let mut state = self.write();
        let current = state.require(cmd.product_id)?;
        expected.check(current.version())?;
        let updated = current.update(cmd)?;

        if updated.reference() != current.reference() {
            if state.references.contains_key(updated.reference()) {
                return Err(CompositionError::DuplicateReference(
                    updated.reference().to_string(),
                ));
            }
            let old_reference = current.reference().to_string();
            state.references.remove(&old_reference);
            state
                .references
                .insert(updated.reference().to_string(), updated.id_typed());
        }

        state.products.insert(updated.id_typed(), updated.clone());
        tracing::info!(
            product_id = %updated.id_typed(),
            version = updated.version(),
            "product updated"
        );
        Ok(updated)
    }

    /// Delete a product and its own BOM. Refused while it is a component of
    /// any other product.
    pub fn delete_product(&self, id: ProductId) -> Result<Product, CompositionError> {
        let mut state = self.write();
        state.require(id)?;

        let parents = state.parents_of(id);
        if !parents.is_empty() {
            tracing::warn!(product_id = %id, parents = parents.len(), "refused to delete product in use");
            return Err(CompositionError::ProductInUse {
                product: id,
                parents,
            });
        }

        let removed_edges = state.edges.remove(&id).map_or(0, |edges| edges.len());
        let product = state
            .products
            .remove(&id)
            .ok_or(CompositionError::ProductNotFound(id))?;
        state.references.remove(product.reference());
        tracing::info!(product_id = %id, removed_edges, "product deleted");
        Ok(product)
    }

    /// Add `quantity` x `component_id` to the BOM of `parent_id`.
    pub fn add_component(
        &self,
        parent_id: ProductId,
        component_id: ProductId,
        quantity: Decimal,
    ) -> Result<ComponentEdge, CompositionError> {
        let edge = ComponentEdge::new(parent_id, component_id, quantity)?;

        let mut state = self.write();
        state.require(parent_id)?;
        state.require(component_id)?;
        if state.edge_position(parent_id, component_id).is_some() {
            tracing::warn!(%parent_id, %component_id, "rejected duplicate component edge");
            return Err(CompositionError::DuplicateEdge {
                parent: parent_id,
                component: component_id,
            });
        }

        BomEngine::new(&*state)
            .with_max_depth(self.config.max_depth)
            .validate_no_cycle(parent_id, component_id)?;

        state.edges.entry(parent_id).or_default().push(edge.clone());
        tracing::info!(%parent_id, %component_id, %quantity, "component added");
        Ok(edge)
    }

    /// Change the quantity of an existing edge, keeping its position.
    pub fn set_component_quantity(
        &self,
        parent_id: ProductId,
        component_id: ProductId,
        quantity: Decimal,
    ) -> Result<ComponentEdge, CompositionError> {
        let mut state = self.write();
        let position = state.edge_position(parent_id, component_id).ok_or(
            CompositionError::EdgeNotFound {
                parent: parent_id,
                component: component_id,
            },
        )?;

        let edges = state.edges.entry(parent_id).or_default();
        let updated = edges[position].with_quantity(quantity)?;
        edges[position] = updated.clone();
        tracing::info!(%parent_id, %component_id, %quantity, "component quantity updated");
        Ok(updated)
    }

    pub fn remove_component(
        &self,
        parent_id: ProductId,
        component_id: ProductId,
    ) -> Result<ComponentEdge, CompositionError> {
        let mut state = self.write();
        let position = state.edge_position(parent_id, component_id).ok_or(
            CompositionError::EdgeNotFound {
                parent: parent_id,
                component: component_id,
            },
        )?;

        let edges = state.edges.entry(parent_id).or_default();
        let removed = edges.remove(position);
        if edges.is_empty() {
            state.edges.remove(&parent_id);
        }
        tracing::info!(%parent_id, %component_id, "component removed");
        Ok(removed)
    }

    /// Direct parents using `component_id`, sorted by id.
    pub fn where_used(&self, component_id: ProductId) -> Vec<ProductId> {
        self.read().parents_of(component_id)
    }

    pub fn find_by_reference(&self, reference: &str) -> Option<Product> {
        let reference = normalize_reference(reference).ok()?;
        let state = self.read();
        let id = state.references.get(&reference)?;
        state.products.get(id).cloned()
    }

    pub fn list_products(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self.read().products.values().cloned().collect();
        products.sort_by(|a, b| a.reference().cmp(b.reference()));
        products
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductRepository for InMemoryCatalog {
    fn get_product(&self, id: &ProductId) -> Option<Product> {
        self.read().get_product(id)
    }

    fn get_outgoing_edges(&self, parent_id: &ProductId) -> Vec<ComponentEdge> {
        self.read().get_outgoing_edges(parent_id)
    }
}
