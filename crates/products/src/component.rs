use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use kitbom_core::ValueObject;

use crate::error::CompositionError;
use crate::product::ProductId;

/// Directed, quantity-weighted edge from a parent product to one of its components.
///
/// Owned by the parent; only references the component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentEdge {
    parent_id: ProductId,
    component_id: ProductId,
    quantity: Decimal,
}

impl ComponentEdge {
    /// Build an edge, rejecting self-loops before anything else and then
    /// non-positive quantities.
    pub fn new(
        parent_id: ProductId,
        component_id: ProductId,
        quantity: Decimal,
    ) -> Result<Self, CompositionError> {
        if parent_id == component_id {
            return Err(CompositionError::SelfReference(parent_id));
        }
        ensure_positive(quantity)?;
        Ok(Self {
            parent_id,
            component_id,
            quantity,
        })
    }

    pub fn parent_id(&self) -> ProductId {
        self.parent_id
    }

    pub fn component_id(&self) -> ProductId {
        self.component_id
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    /// Same edge with a new quantity.
    pub fn with_quantity(&self, quantity: Decimal) -> Result<Self, CompositionError> {
        ensure_positive(quantity)?;
        Ok(Self {
            quantity,
            ..self.clone()
        })
    }

    pub fn connects(&self, parent_id: ProductId, component_id: ProductId) -> bool {
        self.parent_id == parent_id && self.component_id == component_id
    }
}

impl ValueObject for ComponentEdge {}

fn ensure_positive(quantity: Decimal) -> Result<(), CompositionError> {
    if quantity <= Decimal::ZERO {
        return Err(CompositionError::InvalidQuantity(quantity));
    }
    Ok(())
}
