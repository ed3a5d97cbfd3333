use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use kitbom_core::{AggregateRoot, DomainError, EntityId};

use crate::error::CompositionError;

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub EntityId);

impl ProductId {
    pub fn new() -> Self {
        Self(EntityId::new())
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Kind of product. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    /// Finished, stocked article.
    Article,
    /// Kit/assembly defined by its bill of materials.
    Nomenclature,
    /// Non-physical service (no stock, no weight).
    Service,
}

/// Rule deriving a product's effective price and cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    #[default]
    Manual,
    /// Sum of the direct components' effective values (nomenclatures only).
    FromComponents,
    /// `cost_price * (1 + margin_percentage / 100)`.
    FromCostMargin,
}

impl PricingMode {
    pub fn is_allowed_for(self, product_type: ProductType) -> bool {
        match self {
            PricingMode::Manual | PricingMode::FromCostMargin => true,
            PricingMode::FromComponents => product_type == ProductType::Nomenclature,
        }
    }
}

pub const MIN_MARGIN_PERCENTAGE: Decimal = Decimal::from_parts(100, 0, 0, true, 0);
pub const MAX_MARGIN_PERCENTAGE: Decimal = Decimal::ONE_THOUSAND;

/// Mutable, type-dependent attributes of a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAttributes {
    pub pricing_mode: PricingMode,
    pub cost_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub purchase_price: Option<Decimal>,
    pub margin_percentage: Option<Decimal>,
    pub stock_quantity: Option<Decimal>,
    pub minimum_stock: Option<Decimal>,
    pub net_weight: Option<Decimal>,
    pub gross_weight: Option<Decimal>,
}

impl ProductAttributes {
    pub fn with_pricing_mode(mut self, mode: PricingMode) -> Self {
        self.pricing_mode = mode;
        self
    }

    pub fn with_cost_price(mut self, amount: Decimal) -> Self {
        self.cost_price = Some(amount);
        self
    }

    pub fn with_sale_price(mut self, amount: Decimal) -> Self {
        self.sale_price = Some(amount);
        self
    }

    pub fn with_purchase_price(mut self, amount: Decimal) -> Self {
        self.purchase_price = Some(amount);
        self
    }

    pub fn with_margin_percentage(mut self, margin: Decimal) -> Self {
        self.margin_percentage = Some(margin);
        self
    }

    pub fn with_stock(mut self, quantity: Decimal, minimum: Decimal) -> Self {
        self.stock_quantity = Some(quantity);
        self.minimum_stock = Some(minimum);
        self
    }

    pub fn with_net_weight(mut self, weight: Decimal) -> Self {
        self.net_weight = Some(weight);
        self
    }

    pub fn with_gross_weight(mut self, weight: Decimal) -> Self {
        self.gross_weight = Some(weight);
        self
    }

    fn validate(&self, product_type: ProductType) -> Result<(), CompositionError> {
        if !self.pricing_mode.is_allowed_for(product_type) {
            return Err(CompositionError::InvalidPricingModeForType {
                mode: self.pricing_mode,
                product_type,
            });
        }

        for (field, value) in [
            ("cost_price", self.cost_price),
            ("sale_price", self.sale_price),
            ("purchase_price", self.purchase_price),
            ("stock_quantity", self.stock_quantity),
            ("minimum_stock", self.minimum_stock),
            ("net_weight", self.net_weight),
            ("gross_weight", self.gross_weight),
        ] {
            if matches!(value, Some(v) if v < Decimal::ZERO) {
                return Err(DomainError::validation(format!("{field} cannot be negative")).into());
            }
        }

        if let Some(margin) = self.margin_percentage {
            if !(MIN_MARGIN_PERCENTAGE..=MAX_MARGIN_PERCENTAGE).contains(&margin) {
                return Err(DomainError::validation(format!(
                    "margin_percentage must be between {MIN_MARGIN_PERCENTAGE} and {MAX_MARGIN_PERCENTAGE} (got {margin})"
                ))
                .into());
            }
        }

        let tracks_stock = self.stock_quantity.is_some() || self.minimum_stock.is_some();
        if tracks_stock && product_type != ProductType::Article {
            return Err(DomainError::validation(format!(
                "stock can only be tracked on articles, not {product_type:?}"
            ))
            .into());
        }

        Ok(())
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProduct {
    pub product_id: ProductId,
    pub product_type: ProductType,
    pub reference: String,
    pub name: String,
    pub attributes: ProductAttributes,
    pub occurred_at: DateTime<Utc>,
}

/// Input for updating a product. The product type cannot change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProduct {
    pub product_id: ProductId,
    pub reference: String,
    pub name: String,
    pub attributes: ProductAttributes,
    pub occurred_at: DateTime<Utc>,
}

/// A node of the product graph: article, service or nomenclature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    #[serde(rename = "type")]
    product_type: ProductType,
    reference: String,
    name: String,
    attributes: ProductAttributes,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl Product {
    pub fn create(cmd: CreateProduct) -> Result<Self, CompositionError> {
        let reference = normalize_reference(&cmd.reference)?;
        let name = validate_name(&cmd.name)?;
        cmd.attributes.validate(cmd.product_type)?;

        Ok(Self {
            id: cmd.product_id,
            product_type: cmd.product_type,
            reference,
            name,
            attributes: cmd.attributes,
            created_at: cmd.occurred_at,
            updated_at: cmd.occurred_at,
            version: 1,
        })
    }

    /// Apply an update, returning the new state. `self` is left untouched.
    pub fn update(&self, cmd: UpdateProduct) -> Result<Self, CompositionError> {
        if cmd.product_id != self.id {
            return Err(DomainError::invariant("product_id mismatch").into());
        }
        let reference = normalize_reference(&cmd.reference)?;
        let name = validate_name(&cmd.name)?;
        cmd.attributes.validate(self.product_type)?;

        Ok(Self {
            id: self.id,
            product_type: self.product_type,
            reference,
            name,
            attributes: cmd.attributes,
            created_at: self.created_at,
            updated_at: cmd.occurred_at,
            version: self.version + 1,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn product_type(&self) -> ProductType {
        self.product_type
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &ProductAttributes {
        &self.attributes
    }

    pub fn pricing_mode(&self) -> PricingMode {
        self.attributes.pricing_mode
    }

    pub fn cost_price(&self) -> Option<Decimal> {
        self.attributes.cost_price
    }

    pub fn sale_price(&self) -> Option<Decimal> {
        self.attributes.sale_price
    }

    pub fn purchase_price(&self) -> Option<Decimal> {
        self.attributes.purchase_price
    }

    pub fn margin_percentage(&self) -> Option<Decimal> {
        self.attributes.margin_percentage
    }

    pub fn stock_quantity(&self) -> Option<Decimal> {
        self.attributes.stock_quantity
    }

    pub fn minimum_stock(&self) -> Option<Decimal> {
        self.attributes.minimum_stock
    }

    pub fn net_weight(&self) -> Option<Decimal> {
        self.attributes.net_weight
    }

    pub fn gross_weight(&self) -> Option<Decimal> {
        self.attributes.gross_weight
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Stock at or under its minimum. `false` when stock is not tracked.
    pub fn is_below_minimum_stock(&self) -> bool {
        match (self.stock_quantity(), self.minimum_stock()) {
            (Some(stock), Some(minimum)) => stock <= minimum,
            _ => false,
        }
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Trim and upper-case a reference code.
pub fn normalize_reference(reference: &str) -> Result<String, CompositionError> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("reference cannot be empty").into());
    }
    Ok(trimmed.to_uppercase())
}

fn validate_name(name: &str) -> Result<String, CompositionError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("name cannot be empty").into());
    }
    Ok(trimmed.to_string())
}
