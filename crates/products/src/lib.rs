//! Product composition engine.
//!
//! A unified product model (articles, services and nomenclatures) linked by
//! quantity-weighted component edges, plus the algorithms that read that
//! graph: cycle validation, BOM tree building, BOM flattening, price/cost
//! resolution and weight aggregation.
//!
//! Pure domain logic: the graph is read through [`ProductRepository`], and
//! nothing here performs IO of its own.

pub mod component;
pub mod cycle;
pub mod engine;
pub mod error;
pub mod flatten;
pub mod pricing;
pub mod product;
pub mod repository;
pub mod tree;
pub mod weight;

#[cfg(test)]
pub(crate) mod testing;

pub use component::ComponentEdge;
pub use engine::{BomEngine, DEFAULT_MAX_DEPTH};
pub use error::{CompositionError, CycleOrigin};
pub use flatten::{FlatBom, FlatLine, FlattenScope};
pub use pricing::CostSummary;
pub use product::{
    CreateProduct, PricingMode, Product, ProductAttributes, ProductId, ProductType,
    UpdateProduct, normalize_reference,
};
pub use repository::ProductRepository;
pub use tree::BomNode;
