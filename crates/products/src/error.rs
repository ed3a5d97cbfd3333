//! Composition engine errors.

use rust_decimal::Decimal;
use thiserror::Error;

use kitbom_core::DomainError;

use crate::product::{PricingMode, ProductId, ProductType};

/// Where a cycle was detected.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CycleOrigin {
    /// Pre-flight check on a candidate edge (a rejected edit).
    Validation,
    /// Found while walking a persisted graph (data-integrity failure).
    Traversal,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompositionError {
    #[error("cycle detected: {}", format_path(.path))]
    CycleDetected {
        path: Vec<ProductId>,
        origin: CycleOrigin,
    },

    #[error("product {0} cannot be a component of itself")]
    SelfReference(ProductId),

    #[error("component quantity must be strictly positive (got {0})")]
    InvalidQuantity(Decimal),

    #[error("component {component} is already part of {parent}")]
    DuplicateEdge {
        parent: ProductId,
        component: ProductId,
    },

    #[error("component {component} is not part of {parent}")]
    EdgeNotFound {
        parent: ProductId,
        component: ProductId,
    },

    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("pricing mode {mode:?} is not valid for {product_type:?} products")]
    InvalidPricingModeForType {
        mode: PricingMode,
        product_type: ProductType,
    },

    #[error("reference already in use: {0}")]
    DuplicateReference(String),

    #[error("product {product} is still used as a component by {} parent(s)", .parents.len())]
    ProductInUse {
        product: ProductId,
        parents: Vec<ProductId>,
    },

    #[error("BOM deeper than the configured limit of {limit} levels: {}", format_path(.path))]
    DepthLimitExceeded { limit: usize, path: Vec<ProductId> },

    #[error("decimal overflow along {}", format_path(.path))]
    ArithmeticOverflow { path: Vec<ProductId> },

    #[error("non-zero values multiplied to zero past decimal precision along {}", format_path(.path))]
    ArithmeticUnderflow { path: Vec<ProductId> },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl CompositionError {
    /// `true` for errors that reject an edit and should be shown to the end user.
    ///
    /// Everything else means the stored graph is inconsistent (or too deep) and
    /// should be reported as an internal error.
    pub fn is_user_error(&self) -> bool {
        match self {
            CompositionError::CycleDetected { origin, .. } => *origin == CycleOrigin::Validation,
            CompositionError::SelfReference(_)
            | CompositionError::InvalidQuantity(_)
            | CompositionError::DuplicateEdge { .. }
            | CompositionError::EdgeNotFound { .. }
            | CompositionError::InvalidPricingModeForType { .. }
            | CompositionError::DuplicateReference(_)
            | CompositionError::ProductInUse { .. }
            | CompositionError::Domain(_) => true,
            CompositionError::ProductNotFound(_)
            | CompositionError::DepthLimitExceeded { .. }
            | CompositionError::ArithmeticOverflow { .. }
            | CompositionError::ArithmeticUnderflow { .. } => false,
        }
    }
}

fn format_path(path: &[ProductId]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
