use async_trait::async_trait;

use spector_core::{decode_nullable, OperationType};
use spector_shopify::{AdminApi, ProductContentUpdate};

use super::{invalid_value, unknown_field, ResourceGroup, RevertHandler};
use crate::HandlerError;

/// Restores product title and description.
#[derive(Debug, Clone, Copy)]
pub struct ContentHandler;

pub(crate) fn plan_content(
    group: &ResourceGroup<'_>,
) -> Result<ProductContentUpdate, HandlerError> {
    let mut update = ProductContentUpdate::default();

    for item in &group.items {
        let old = decode_nullable(item.old_value.as_deref());
        match item.field.as_str() {
            "title" => {
                let title = old
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| invalid_value(item, "title cannot be blank"))?;
                update.title = Some(title.to_owned());
            }
            "description" | "descriptionHtml" | "body_html" | "bodyHtml" => {
                update.description_html = Some(old.unwrap_or_default().to_owned());
            }
            _ => return Err(unknown_field(OperationType::Content, item)),
        }
    }

    Ok(update)
}

#[async_trait]
impl RevertHandler for ContentHandler {
    fn operation_type(&self) -> OperationType {
        OperationType::Content
    }

    async fn revert_group(
        &self,
        api: &dyn AdminApi,
        group: &ResourceGroup<'_>,
    ) -> Result<(), HandlerError> {
        let update = plan_content(group)?;
        api.update_product_content(group.product_id, &update).await?;
        Ok(())
    }
}
