use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;

use spector_core::{decode_nullable, ChangeItem, OperationType};
use spector_shopify::{AdminApi, VariantPriceUpdate};

use super::{invalid_value, unknown_field, ResourceGroup, RevertHandler};
use crate::HandlerError;

/// Restores `price` and `compareAtPrice` on a variant.
#[derive(Debug, Clone, Copy)]
pub struct PricingHandler;

fn parse_price(item: &ChangeItem, raw: &str) -> Result<Decimal, HandlerError> {
    Decimal::from_str(raw.trim()).map_err(|e| invalid_value(item, format!("\"{raw}\": {e}")))
}

/// Builds the variant update restoring every recorded old value.
pub(crate) fn plan(group: &ResourceGroup<'_>) -> Result<VariantPriceUpdate, HandlerError> {
    let variant_id = group.variant_id.ok_or(HandlerError::MissingVariant {
        operation_type: OperationType::Pricing,
    })?;

    let mut update = VariantPriceUpdate {
        variant_id: variant_id.to_owned(),
        price: None,
        compare_at_price: None,
    };

    for item in &group.items {
        let old = decode_nullable(item.old_value.as_deref());
        match item.field.as_str() {
            "price" => {
                let old = old.ok_or_else(|| invalid_value(item, "price cannot be null"))?;
                update.price = Some(parse_price(item, old)?);
            }
            "compareAtPrice" | "compare_at_price" => {
                update.compare_at_price = Some(old.map(|v| parse_price(item, v)).transpose()?);
            }
            _ => return Err(unknown_field(OperationType::Pricing, item)),
        }
    }

    Ok(update)
}

#[async_trait]
impl RevertHandler for PricingHandler {
    fn operation_type(&self) -> OperationType {
        OperationType::Pricing
    }

    async fn revert_group(
        &self,
        api: &dyn AdminApi,
        group: &ResourceGroup<'_>,
    ) -> Result<(), HandlerError> {
        let update = plan(group)?;
        api.update_variant_prices(group.product_id, &[update]).await?;
        Ok(())
    }
}
