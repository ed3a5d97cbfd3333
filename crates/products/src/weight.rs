//! Net weight aggregation over the BOM.

use rust_decimal::Decimal;

use crate::engine::{BomEngine, TraversalPath, checked_add, checked_mul};
use crate::error::{CompositionError, CycleOrigin};
use crate::product::{Product, ProductType};
use crate::repository::ProductRepository;

impl<R: ProductRepository> BomEngine<R> {
    /// Total net weight of a product.
    ///
    /// Services weigh nothing (`None`), articles report their own net weight.
    /// A nomenclature sums `child weight * quantity` over its components,
    /// skipping children without a weight; with no components, or a sum of
    /// exactly zero, it falls back to its own net weight.
    pub fn total_weight(&self, product: &Product) -> Result<Option<Decimal>, CompositionError> {
        let mut path = TraversalPath::new(self.max_depth(), CycleOrigin::Traversal);
        self.weight_on_path(product, &mut path)
    }

    fn weight_on_path(
        &self,
        product: &Product,
        path: &mut TraversalPath,
    ) -> Result<Option<Decimal>, CompositionError> {
        match product.product_type() {
            ProductType::Service => Ok(None),
            ProductType::Article => Ok(product.net_weight()),
            ProductType::Nomenclature => {
                path.enter(product.id_typed())?;
                let mut sum = Decimal::ZERO;
                for edge in self.repository().get_outgoing_edges(&product.id_typed()) {
                    let next = edge.component_id();
                    let child = self.product(&next)?;
                    if let Some(weight) = self.weight_on_path(&child, path)? {
                        let line = checked_mul(weight, edge.quantity(), || path.through(next))?;
                        sum = checked_add(sum, line, || path.through(next))?;
                    }
                }
                path.leave();

                if sum.is_zero() {
                    Ok(product.net_weight())
                } else {
                    Ok(Some(sum))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::product::ProductAttributes;
    use crate::testing::{MemoryGraph, huge, tiny};

    fn weighing(net: Decimal) -> ProductAttributes {
        ProductAttributes::default().with_net_weight(net)
    }

    #[test]
    fn kit_weight_multiplies_component_quantities() {
        let mut graph = MemoryGraph::new();
        let kit = graph.kit("KIT", ProductAttributes::default());
        let bolt = graph.article("BOLT-A", weighing(dec!(0.010)));
        let washer = graph.article("WASHER-B", weighing(dec!(0.005)));
        graph.link(kit, bolt, dec!(2));
        graph.link(kit, washer, dec!(1));

        let engine = BomEngine::new(&graph);
        assert_eq!(engine.total_weight(graph.get(kit)).unwrap(), Some(dec!(0.025)));
    }

    #[test]
    fn nested_kits_recurse() {
        let mut graph = MemoryGraph::new();
        let kit = graph.kit("KIT", weighing(dec!(99)));
        let sub = graph.kit("SUB", ProductAttributes::default());
        let part = graph.article("PART", weighing(dec!(1.5)));
        graph.link(kit, sub, dec!(2));
        graph.link(sub, part, dec!(3));

        let engine = BomEngine::new(&graph);
        assert_eq!(engine.total_weight(graph.get(kit)).unwrap(), Some(dec!(9)));
    }

    #[test]
    fn empty_kit_falls_back_to_own_weight() {
        let mut graph = MemoryGraph::new();
        let kit = graph.kit("KIT", weighing(dec!(4.2)));
        let engine = BomEngine::new(&graph);
        assert_eq!(engine.total_weight(graph.get(kit)).unwrap(), Some(dec!(4.2)));
    }

    #[test]
    fn weightless_components_fall_back_to_own_weight() {
        let mut graph = MemoryGraph::new();
        let kit = graph.kit("KIT", weighing(dec!(1.1)));
        let service = graph.add(ProductType::Service, "INSTALL", ProductAttributes::default());
        let zero = graph.article("LABEL", weighing(dec!(0)));
        graph.link(kit, service, dec!(1));
        graph.link(kit, zero, dec!(10));

        let engine = BomEngine::new(&graph);
        assert_eq!(engine.total_weight(graph.get(kit)).unwrap(), Some(dec!(1.1)));
    }

    #[test]
    fn services_have_no_weight() {
        let mut graph = MemoryGraph::new();
        let service = graph.add(ProductType::Service, "INSTALL", weighing(dec!(3)));
        let engine = BomEngine::new(&graph);
        assert_eq!(engine.total_weight(graph.get(service)).unwrap(), None);
    }

    #[test]
    fn articles_ignore_their_edges() {
        let mut graph = MemoryGraph::new();
        let article = graph.article("FRAME", weighing(dec!(2)));
        let part = graph.article("PART", weighing(dec!(50)));
        graph.link(article, part, dec!(1));

        let engine = BomEngine::new(&graph);
        assert_eq!(engine.total_weight(graph.get(article)).unwrap(), Some(dec!(2)));
    }

    #[test]
    fn corrupted_cycle_terminates_with_error() {
        let mut graph = MemoryGraph::new();
        let a = graph.kit("A", ProductAttributes::default());
        let b = graph.kit("B", ProductAttributes::default());
        graph.link(a, b, dec!(1));
        graph.link(b, a, dec!(1));

        let engine = BomEngine::new(&graph);
        assert!(matches!(
            engine.total_weight(graph.get(a)),
            Err(CompositionError::CycleDetected {
                origin: CycleOrigin::Traversal,
                ..
            })
        ));
    }

    #[test]
    fn overflowing_weight_is_an_error() {
        let mut graph = MemoryGraph::new();
        let kit = graph.kit("KIT", ProductAttributes::default());
        let sub = graph.kit("SUB", ProductAttributes::default());
        let part = graph.article("PART", weighing(huge()));
        graph.link(kit, sub, huge());
        graph.link(sub, part, dec!(1));

        let engine = BomEngine::new(&graph);
        assert_eq!(
            engine.total_weight(graph.get(kit)),
            Err(CompositionError::ArithmeticOverflow {
                path: vec![kit, sub]
            })
        );
    }

    #[test]
    fn vanishing_weight_is_an_error() {
        let mut graph = MemoryGraph::new();
        let kit = graph.kit("KIT", weighing(dec!(7)));
        let part = graph.article("PART", weighing(tiny()));
        graph.link(kit, part, tiny());

        let engine = BomEngine::new(&graph);
        assert_eq!(
            engine.total_weight(graph.get(kit)),
            Err(CompositionError::ArithmeticUnderflow {
                path: vec![kit, part]
            })
        );
    }
}
