//! Single-level BOM view: consolidated quantity per component.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use kitbom_core::ValueObject;

use crate::engine::{BomEngine, TraversalPath, checked_add, checked_div, checked_mul};
use crate::error::{CompositionError, CycleOrigin};
use crate::product::{Product, ProductId, ProductType};
use crate::repository::ProductRepository;

/// Consolidated requirement for one component of a flattened BOM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatLine {
    pub reference: String,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    /// Total quantity per unit of the root, summed over every path.
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub unit_price: Option<Decimal>,
}

impl FlatLine {
    /// `unit_cost * quantity`; `None` without a unit cost or on overflow.
    pub fn total_cost(&self) -> Option<Decimal> {
        self.unit_cost?.checked_mul(self.quantity)
    }

    /// `unit_price * quantity`; `None` without a unit price or on overflow.
    pub fn total_price(&self) -> Option<Decimal> {
        self.unit_price?.checked_mul(self.quantity)
    }
}

impl ValueObject for FlatLine {}

/// Flattened BOM keyed by component id.
pub type FlatBom = BTreeMap<ProductId, FlatLine>;

/// Which components a flattened BOM records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlattenScope {
    /// Only components without components of their own.
    #[default]
    LeavesOnly,
    /// Leaves plus every intermediate sub-assembly.
    AllComponents,
}

impl<R: ProductRepository> BomEngine<R> {
    /// Leaf components reachable from `root_id`, quantities multiplied along
    /// each path and summed across paths. The root itself is never listed.
    pub fn flatten(&self, root_id: ProductId) -> Result<FlatBom, CompositionError> {
        self.flatten_with(root_id, FlattenScope::LeavesOnly)
    }

    pub fn flatten_with(
        &self,
        root_id: ProductId,
        scope: FlattenScope,
    ) -> Result<FlatBom, CompositionError> {
        let mut path = TraversalPath::new(self.max_depth(), CycleOrigin::Traversal);
        let mut acc = FlatBom::new();

        path.enter(root_id)?;
        self.product(&root_id)?;
        for edge in self.repository().get_outgoing_edges(&root_id) {
            self.accumulate(edge.component_id(), edge.quantity(), scope, &mut path, &mut acc)?;
        }
        path.leave();

        tracing::debug!(root_id = %root_id, lines = acc.len(), ?scope, "flattened BOM");
        Ok(acc)
    }

    /// Visit `id`, reached with `quantity` units per unit of the root.
    fn accumulate(
        &self,
        id: ProductId,
        quantity: Decimal,
        scope: FlattenScope,
        path: &mut TraversalPath,
        acc: &mut FlatBom,
    ) -> Result<(), CompositionError> {
        path.enter(id)?;
        let product = self.product(&id)?;
        let edges = self.repository().get_outgoing_edges(&id);

        if edges.is_empty() || scope == FlattenScope::AllComponents {
            self.record(&product, quantity, path, acc)?;
        }
        for edge in edges {
            let next = edge.component_id();
            let extended = checked_mul(quantity, edge.quantity(), || path.through(next))?;
            self.accumulate(next, extended, scope, path, acc)?;
        }

        path.leave();
        Ok(())
    }

    fn record(
        &self,
        product: &Product,
        quantity: Decimal,
        path: &TraversalPath,
        acc: &mut FlatBom,
    ) -> Result<(), CompositionError> {
        if let Some(line) = acc.get_mut(&product.id_typed()) {
            line.quantity = checked_add(line.quantity, quantity, || path.current())?;
            return Ok(());
        }
        acc.insert(
            product.id_typed(),
            FlatLine {
                reference: product.reference().to_string(),
                product_type: product.product_type(),
                quantity,
                unit_cost: self.effective_cost(product)?,
                unit_price: self.effective_price(product)?,
            },
        );
        Ok(())
    }

    /// How many units of `root_id` the current article stock can assemble.
    ///
    /// Takes the minimum of `floor(stock / quantity)` over flattened leaves
    /// that are stock-tracked articles. `None` when no leaf tracks stock.
    pub fn max_buildable(&self, root_id: ProductId) -> Result<Option<Decimal>, CompositionError> {
        let mut buildable: Option<Decimal> = None;
        for (id, line) in self.flatten(root_id)? {
            if line.product_type != ProductType::Article {
                continue;
            }
            let Some(stock) = self.product(&id)?.stock_quantity() else {
                continue;
            };
            let units = checked_div(stock, line.quantity, || vec![root_id, id])?.trunc();
            buildable = Some(buildable.map_or(units, |current| current.min(units)));
        }
        Ok(buildable)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::product::{PricingMode, ProductAttributes};
    use crate::testing::{MemoryGraph, huge, tiny};

    fn costing(cost: Decimal) -> ProductAttributes {
        ProductAttributes::default().with_cost_price(cost)
    }

    fn from_components() -> ProductAttributes {
        ProductAttributes::default().with_pricing_mode(PricingMode::FromComponents)
    }

    #[test]
    fn nested_kits_flatten_to_leaves() {
        let mut graph = MemoryGraph::new();
        let kit = graph.kit("KIT", from_components());
        let sub = graph.kit("SUB", from_components());
        let part = graph.article("PART", costing(dec!(2.00)));
        graph.link(kit, sub, dec!(1));
        graph.link(sub, part, dec!(3));

        let engine = BomEngine::new(&graph);
        let flat = engine.flatten(kit).unwrap();
        assert_eq!(flat.len(), 1);
        let line = &flat[&part];
        assert_eq!(line.quantity, dec!(3));
        assert_eq!(line.reference, "PART");
        assert_eq!(line.total_cost(), Some(dec!(6.00)));
    }

    #[test]
    fn diamond_paths_are_summed() {
        let mut graph = MemoryGraph::new();
        let root = graph.kit("ROOT", ProductAttributes::default());
        let left = graph.kit("LEFT", ProductAttributes::default());
        let right = graph.kit("RIGHT", ProductAttributes::default());
        let screw = graph.article("SCREW", ProductAttributes::default());
        graph.link(root, left, dec!(2));
        graph.link(root, right, dec!(3));
        graph.link(left, screw, dec!(4));
        graph.link(right, screw, dec!(5));
        graph.link(root, screw, dec!(1));

        let engine = BomEngine::new(&graph);
        let flat = engine.flatten(root).unwrap();
        // 2*4 + 3*5 + 1
        assert_eq!(flat[&screw].quantity, dec!(24));
        assert_eq!(flat.len(), 1);
    }

    #[test]
    fn all_components_scope_keeps_sub_assemblies() {
        let mut graph = MemoryGraph::new();
        let kit = graph.kit("KIT", ProductAttributes::default());
        let sub = graph.kit("SUB", ProductAttributes::default());
        let part = graph.article("PART", ProductAttributes::default());
        graph.link(kit, sub, dec!(2));
        graph.link(sub, part, dec!(3));

        let engine = BomEngine::new(&graph);
        let flat = engine.flatten_with(kit, FlattenScope::AllComponents).unwrap();
        assert_eq!(flat[&sub].quantity, dec!(2));
        assert_eq!(flat[&part].quantity, dec!(6));
        assert!(!flat.contains_key(&kit));
    }

    #[test]
    fn empty_nomenclature_flattens_to_nothing() {
        let mut graph = MemoryGraph::new();
        let kit = graph.kit("KIT", ProductAttributes::default());
        let engine = BomEngine::new(&graph);
        assert!(engine.flatten(kit).unwrap().is_empty());
    }

    #[test]
    fn flatten_is_idempotent() {
        let mut graph = MemoryGraph::new();
        let kit = graph.kit("KIT", ProductAttributes::default());
        let a = graph.article("A", costing(dec!(1)));
        let b = graph.article("B", costing(dec!(2)));
        graph.link(kit, a, dec!(1.5));
        graph.link(kit, b, dec!(2));

        let engine = BomEngine::new(&graph);
        assert_eq!(engine.flatten(kit).unwrap(), engine.flatten(kit).unwrap());
    }

    #[test]
    fn cycle_is_an_error_not_a_partial_result() {
        let mut graph = MemoryGraph::new();
        let kit = graph.kit("KIT", ProductAttributes::default());
        let a = graph.kit("A", ProductAttributes::default());
        let b = graph.kit("B", ProductAttributes::default());
        let leaf = graph.article("LEAF", ProductAttributes::default());
        graph.link(kit, leaf, dec!(1));
        graph.link(kit, a, dec!(1));
        graph.link(a, b, dec!(1));
        graph.link(b, a, dec!(1));

        let engine = BomEngine::new(&graph);
        match engine.flatten(kit) {
            Err(CompositionError::CycleDetected { path, origin }) => {
                assert_eq!(path, vec![kit, a, b, a]);
                assert_eq!(origin, CycleOrigin::Traversal);
            }
            other => panic!("Expected CycleDetected, got {other:?}"),
        }
    }

    #[test]
    fn missing_leaf_is_an_error() {
        let mut graph = MemoryGraph::new();
        let kit = graph.kit("KIT", ProductAttributes::default());
        let ghost = graph.article("GHOST", ProductAttributes::default());
        graph.link(kit, ghost, dec!(1));
        graph.forget(ghost);

        let engine = BomEngine::new(&graph);
        assert_eq!(engine.flatten(kit), Err(CompositionError::ProductNotFound(ghost)));
    }

    #[test]
    fn max_buildable_uses_scarcest_article() {
        let mut graph = MemoryGraph::new();
        let kit = graph.kit("KIT", ProductAttributes::default());
        let bolt = graph.article("BOLT", ProductAttributes::default().with_stock(dec!(9), dec!(0)));
        let washer =
            graph.article("WASHER", ProductAttributes::default().with_stock(dec!(100), dec!(0)));
        let service = graph.add(ProductType::Service, "ASSEMBLY", ProductAttributes::default());
        graph.link(kit, bolt, dec!(2));
        graph.link(kit, washer, dec!(1));
        graph.link(kit, service, dec!(1));

        let engine = BomEngine::new(&graph);
        assert_eq!(engine.max_buildable(kit).unwrap(), Some(dec!(4)));
    }

    #[test]
    fn max_buildable_without_stock_is_none() {
        let mut graph = MemoryGraph::new();
        let kit = graph.kit("KIT", ProductAttributes::default());
        let part = graph.article("PART", ProductAttributes::default());
        graph.link(kit, part, dec!(1));

        let engine = BomEngine::new(&graph);
        assert_eq!(engine.max_buildable(kit).unwrap(), None);
    }

    #[test]
    fn overflowing_quantities_are_an_error_not_a_panic() {
        let mut graph = MemoryGraph::new();
        let kit = graph.kit("KIT", ProductAttributes::default());
        let sub = graph.kit("SUB", ProductAttributes::default());
        let part = graph.article("PART", ProductAttributes::default());
        graph.link(kit, sub, huge());
        graph.link(sub, part, huge());

        let engine = BomEngine::new(&graph);
        assert_eq!(
            engine.flatten(kit),
            Err(CompositionError::ArithmeticOverflow {
                path: vec![kit, sub, part]
            })
        );
    }

    #[test]
    fn diamond_sum_overflow_is_an_error() {
        let mut graph = MemoryGraph::new();
        let kit = graph.kit("KIT", ProductAttributes::default());
        let part = graph.article("PART", ProductAttributes::default());
        let sub = graph.kit("SUB", ProductAttributes::default());
        graph.link(kit, part, Decimal::MAX);
        graph.link(kit, sub, dec!(1));
        graph.link(sub, part, Decimal::MAX);

        let engine = BomEngine::new(&graph);
        assert!(matches!(
            engine.flatten(kit),
            Err(CompositionError::ArithmeticOverflow { .. })
        ));
    }

    #[test]
    fn vanishing_quantities_are_not_reported_as_zero() {
        let mut graph = MemoryGraph::new();
        let kit = graph.kit("KIT", ProductAttributes::default());
        let sub = graph.kit("SUB", ProductAttributes::default());
        let stocked = ProductAttributes::default().with_stock(dec!(5), dec!(0));
        let part = graph.article("PART", stocked);
        graph.link(kit, sub, tiny());
        graph.link(sub, part, tiny());

        let engine = BomEngine::new(&graph);
        let underflow = CompositionError::ArithmeticUnderflow {
            path: vec![kit, sub, part],
        };
        assert_eq!(engine.flatten(kit), Err(underflow.clone()));
        assert_eq!(engine.max_buildable(kit), Err(underflow));
    }

    #[test]
    fn max_buildable_overflow_is_an_error() {
        let mut graph = MemoryGraph::new();
        let kit = graph.kit("KIT", ProductAttributes::default());
        let stocked = ProductAttributes::default().with_stock(Decimal::MAX, dec!(0));
        let part = graph.article("PART", stocked);
        graph.link(kit, part, Decimal::new(1, 20));

        let engine = BomEngine::new(&graph);
        assert_eq!(
            engine.max_buildable(kit),
            Err(CompositionError::ArithmeticOverflow {
                path: vec![kit, part]
            })
        );
    }

    #[test]
    fn line_totals_are_none_on_overflow() {
        let line = FlatLine {
            reference: "PART".to_string(),
            product_type: ProductType::Article,
            quantity: huge(),
            unit_cost: Some(huge()),
            unit_price: None,
        };
        assert_eq!(line.total_cost(), None);
        assert_eq!(line.total_price(), None);
    }
}
