//! Effective cost and price resolution.
//!
//! | mode             | effective cost                  | effective price                                    |
//! |------------------|---------------------------------|----------------------------------------------------|
//! | `Manual`         | `cost_price`                    | `sale_price`                                       |
//! | `FromCostMargin` | `cost_price`                    | `cost_price * (1 + margin / 100)`, else `sale_price` |
//! | `FromComponents` | sum of `child cost * quantity`  | sum of `child price * quantity`                    |
//!
//! `FromComponents` recurses one level into the resolver for each direct
//! component; the child resolves according to its own mode.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use kitbom_core::ValueObject;

use crate::engine::{BomEngine, TraversalPath, checked_add, checked_div, checked_mul};
use crate::error::{CompositionError, CycleOrigin};
use crate::product::{PricingMode, Product, ProductType};
use crate::repository::ProductRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Amount {
    Cost,
    Price,
}

/// Effective cost, price and margin of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostSummary {
    pub effective_cost: Option<Decimal>,
    pub effective_price: Option<Decimal>,
    pub margin: Option<Decimal>,
    pub margin_percent: Option<Decimal>,
}

impl ValueObject for CostSummary {}

impl<R: ProductRepository> BomEngine<R> {
    pub fn effective_cost(&self, product: &Product) -> Result<Option<Decimal>, CompositionError> {
        self.resolve(product, Amount::Cost)
    }

    pub fn effective_price(&self, product: &Product) -> Result<Option<Decimal>, CompositionError> {
        self.resolve(product, Amount::Price)
    }

    /// `effective_price - effective_cost`, when both resolve.
    pub fn margin(&self, product: &Product) -> Result<Option<Decimal>, CompositionError> {
        Ok(self.cost_summary(product)?.margin)
    }

    /// `margin / effective_cost * 100`, when the cost is strictly positive.
    pub fn margin_percent(&self, product: &Product) -> Result<Option<Decimal>, CompositionError> {
        Ok(self.cost_summary(product)?.margin_percent)
    }

    pub fn cost_summary(&self, product: &Product) -> Result<CostSummary, CompositionError> {
        let effective_cost = self.effective_cost(product)?;
        let effective_price = self.effective_price(product)?;
        let at = || vec![product.id_typed()];
        let margin = match (effective_price, effective_cost) {
            (Some(price), Some(cost)) => Some(checked_add(price, -cost, at)?),
            _ => None,
        };
        let margin_percent = match (margin, effective_cost) {
            (Some(margin), Some(cost)) if cost > Decimal::ZERO => {
                let ratio = checked_div(margin, cost, at)?;
                Some(checked_mul(ratio, Decimal::ONE_HUNDRED, at)?)
            }
            _ => None,
        };

        Ok(CostSummary {
            effective_cost,
            effective_price,
            margin,
            margin_percent,
        })
    }

    fn resolve(&self, product: &Product, amount: Amount) -> Result<Option<Decimal>, CompositionError> {
        let mut path = TraversalPath::new(self.max_depth(), CycleOrigin::Traversal);
        self.resolve_on_path(product, amount, &mut path)
    }

    fn resolve_on_path(
        &self,
        product: &Product,
        amount: Amount,
        path: &mut TraversalPath,
    ) -> Result<Option<Decimal>, CompositionError> {
        match (product.product_type(), product.pricing_mode()) {
            (_, PricingMode::Manual) => Ok(match amount {
                Amount::Cost => product.cost_price(),
                Amount::Price => product.sale_price(),
            }),
            (_, PricingMode::FromCostMargin) => match amount {
                Amount::Cost => Ok(product.cost_price()),
                Amount::Price => match (product.cost_price(), product.margin_percentage()) {
                    (Some(cost), Some(margin)) => {
                        let at = || path.through(product.id_typed());
                        let rate = checked_div(margin, Decimal::ONE_HUNDRED, at)?;
                        let factor = checked_add(Decimal::ONE, rate, at)?;
                        Ok(Some(checked_mul(cost, factor, at)?))
                    }
                    _ => Ok(product.sale_price()),
                },
            },
            (ProductType::Nomenclature, PricingMode::FromComponents) => {
                self.sum_components(product, amount, path)
            }
            (product_type @ (ProductType::Article | ProductType::Service), mode) => {
                Err(CompositionError::InvalidPricingModeForType { mode, product_type })
            }
        }
    }

    /// `None` when the product has no components, or none of them resolves.
    fn sum_components(
        &self,
        product: &Product,
        amount: Amount,
        path: &mut TraversalPath,
    ) -> Result<Option<Decimal>, CompositionError> {
        path.enter(product.id_typed())?;

        let mut total: Option<Decimal> = None;
        for edge in self.repository().get_outgoing_edges(&product.id_typed()) {
            let next = edge.component_id();
            let child = self.product(&next)?;
            if let Some(value) = self.resolve_on_path(&child, amount, path)? {
                let line = checked_mul(value, edge.quantity(), || path.through(next))?;
                let subtotal = total.unwrap_or(Decimal::ZERO);
                total = Some(checked_add(subtotal, line, || path.through(next))?);
            }
        }

        path.leave();
        Ok(total)
    }
}
