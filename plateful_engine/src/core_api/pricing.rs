//! The pricing engine.
//!
//! Pure reads: given a restaurant and a list of requested lines, resolve each reference against the catalog and
//! produce the total the wallet will be debited for. Since amounts are integer kuruş throughout, the total is an
//! exact sum; there is no per-line rounding to drift. Decimal inputs were already rounded, once, when they became
//! [`Money`].
use log::trace;
use plateful_common::Money;

use crate::{
    db_types::{ComboId, ItemId, OrderLineSpec, RestaurantId},
    traits::{CatalogManagement, OrderGatewayError},
};

/// A validated line reference: exactly one of item or combo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRef {
    Item(ItemId),
    Combo(ComboId),
}

/// An order line together with the unit price the catalog reported for it at pricing time. This is the snapshot that
/// gets persisted onto the order.
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub spec: OrderLineSpec,
    pub unit_price: Money,
}

impl PricedLine {
    pub fn amount(&self) -> Money {
        self.unit_price * self.spec.quantity
    }
}

/// The most units a single line may carry. Keeps line amounts far away from i64 overflow no matter what the catalog
/// prices are.
pub const MAX_LINE_QUANTITY: i64 = 1_000;

/// Checks the structural validity of a line: exactly one reference set, quantity between 1 and
/// [`MAX_LINE_QUANTITY`].
pub fn validate_line(spec: &OrderLineSpec) -> Result<LineRef, OrderGatewayError> {
    let line_ref = match (spec.item_id, spec.combo_id) {
        (Some(item), None) => LineRef::Item(item),
        (None, Some(combo)) => LineRef::Combo(combo),
        (None, None) => {
            return Err(OrderGatewayError::MalformedLine("a line must reference an item or a combo".to_string()))
        },
        (Some(_), Some(_)) => {
            return Err(OrderGatewayError::MalformedLine(
                "a line cannot reference both an item and a combo".to_string(),
            ))
        },
    };
    if spec.quantity < 1 {
        return Err(OrderGatewayError::MalformedLine(format!("quantity must be at least 1, got {}", spec.quantity)));
    }
    if spec.quantity > MAX_LINE_QUANTITY {
        return Err(OrderGatewayError::MalformedLine(format!(
            "quantity must be at most {MAX_LINE_QUANTITY}, got {}",
            spec.quantity
        )));
    }
    Ok(line_ref)
}

/// The exact sum of the line amounts.
pub fn total_of(lines: &[PricedLine]) -> Money {
    lines.iter().map(PricedLine::amount).sum()
}

/// Prices the requested lines against the catalog. Pure read; no side effects.
///
/// Each line must validate per [`validate_line`], and each reference must resolve within the stated restaurant, or
/// the whole quote fails with [`OrderGatewayError::InvalidReference`]. A combo prices at its stored combo price, not
/// at the sum of its members.
pub async fn quote_order<B: CatalogManagement>(
    catalog: &B,
    restaurant_id: RestaurantId,
    specs: &[OrderLineSpec],
) -> Result<(Money, Vec<PricedLine>), OrderGatewayError> {
    let mut lines = Vec::with_capacity(specs.len());
    for spec in specs {
        let unit_price = match validate_line(spec)? {
            LineRef::Item(item_id) => catalog
                .resolve_item(restaurant_id, item_id)
                .await?
                .ok_or_else(|| OrderGatewayError::InvalidReference(format!("item {item_id} of restaurant {restaurant_id}")))?,
            LineRef::Combo(combo_id) => {
                let (price, _members) = catalog.resolve_combo(restaurant_id, combo_id).await?.ok_or_else(|| {
                    OrderGatewayError::InvalidReference(format!("combo {combo_id} of restaurant {restaurant_id}"))
                })?;
                price
            },
        };
        lines.push(PricedLine { spec: spec.clone(), unit_price });
    }
    let total = total_of(&lines);
    trace!("🧮️ Quoted {} lines for restaurant {restaurant_id}: total {total}", lines.len());
    Ok((total, lines))
}
