//! Value object trait: equality by value, not identity.
//!
//! Component edges, BOM lines and cost summaries are value objects: two of them
//! with the same attributes are interchangeable.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one with the new values.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
