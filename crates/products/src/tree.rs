//! Nested BOM view.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use kitbom_core::ValueObject;

use crate::engine::{BomEngine, TraversalPath, checked_mul};
use crate::error::{CompositionError, CycleOrigin};
use crate::product::{ProductId, ProductType};
use crate::repository::ProductRepository;

/// One line of a BOM tree.
///
/// `quantity` is the edge quantity (per unit of the parent); `extended_quantity`
/// is the product of quantities from the root. The root has both at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomNode {
    pub id: ProductId,
    pub reference: String,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub level: usize,
    pub quantity: Decimal,
    pub extended_quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    /// `unit_cost * quantity`.
    pub line_cost: Option<Decimal>,
    /// `unit_price * quantity`.
    pub line_price: Option<Decimal>,
    /// `unit_cost * extended_quantity`.
    pub extended_cost: Option<Decimal>,
    /// `unit_price * extended_quantity`.
    pub extended_price: Option<Decimal>,
    pub children: Vec<BomNode>,
}

impl BomNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Leaf nodes in pre-order.
    pub fn leaves(&self) -> Vec<&BomNode> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a BomNode>) {
        if self.is_leaf() {
            out.push(self);
        }
        for child in &self.children {
            child.collect_leaves(out);
        }
    }

    /// Deepest level in this sub-tree.
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(BomNode::depth)
            .max()
            .unwrap_or(self.level)
    }

    /// Number of nodes, this one included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(BomNode::node_count).sum::<usize>()
    }
}

impl ValueObject for BomNode {}

impl<R: ProductRepository> BomEngine<R> {
    /// Expand `root_id` into a nested tree, children in edge order.
    pub fn build_tree(&self, root_id: ProductId) -> Result<BomNode, CompositionError> {
        let mut path = TraversalPath::new(self.max_depth(), CycleOrigin::Traversal);
        let tree = self.expand(root_id, 0, Decimal::ONE, Decimal::ONE, &mut path)?;
        tracing::debug!(
            root_id = %root_id,
            nodes = tree.node_count(),
            depth = tree.depth(),
            "built BOM tree"
        );
        Ok(tree)
    }

    fn expand(
        &self,
        id: ProductId,
        level: usize,
        quantity: Decimal,
        extended_quantity: Decimal,
        path: &mut TraversalPath,
    ) -> Result<BomNode, CompositionError> {
        path.enter(id)?;
        let product = self.product(&id)?;
        let unit_cost = self.effective_cost(&product)?;
        let unit_price = self.effective_price(&product)?;

        let line = |unit: Option<Decimal>, factor: Decimal| {
            unit.map(|u| checked_mul(u, factor, || path.current()))
                .transpose()
        };
        let line_cost = line(unit_cost, quantity)?;
        let line_price = line(unit_price, quantity)?;
        let extended_cost = line(unit_cost, extended_quantity)?;
        let extended_price = line(unit_price, extended_quantity)?;

        let mut children = Vec::new();
        for edge in self.repository().get_outgoing_edges(&id) {
            let next = edge.component_id();
            let child_extended =
                checked_mul(extended_quantity, edge.quantity(), || path.through(next))?;
            children.push(self.expand(next, level + 1, edge.quantity(), child_extended, path)?);
        }
        path.leave();

        Ok(BomNode {
            id,
            reference: product.reference().to_string(),
            product_type: product.product_type(),
            level,
            quantity,
            extended_quantity,
            unit_cost,
            unit_price,
            line_cost,
            line_price,
            extended_cost,
            extended_price,
            children,
        })
    }
}
