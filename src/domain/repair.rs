//! Finds and rewrites derived identifiers that drifted from their inputs, e.g. rows
//! loaded by a bulk import that bypassed the write path.

use crate::domain::propagation::{refresh_pictures, refresh_variants, CascadeReport, NamingContext};
use crate::error::CatalogResult;
use crate::storage::CatalogTx;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleField {
    VariantSku,
    PictureName,
    PictureComponent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleIdentifier {
    pub field: StaleField,
    pub row_id: i64,
    pub stored: String,
    pub expected: String,
}

pub async fn audit<T: CatalogTx>(tx: &mut T) -> CatalogResult<Vec<StaleIdentifier>> {
    let mut ctx = NamingContext::new();
    let mut stale = Vec::new();

    for variant in tx.all_variants().await? {
        let expected = ctx
            .variant_sku(tx, variant.component_id, variant.color_id)
            .await?;
        if expected != variant.variant_sku {
            stale.push(StaleIdentifier {
                field: StaleField::VariantSku,
                row_id: variant.id,
                stored: variant.variant_sku,
                expected,
            });
        }
    }

    for picture in tx.all_pictures().await? {
        let owner = match picture.variant_id {
            Some(variant_id) => ctx.picture_owner(tx, None, Some(variant_id)).await?,
            None => picture.component_id,
        };
        if owner != picture.component_id {
            stale.push(StaleIdentifier {
                field: StaleField::PictureComponent,
                row_id: picture.id,
                stored: picture.component_id.to_string(),
                expected: owner.to_string(),
            });
        }
        let expected = ctx
            .picture_name(tx, owner, picture.variant_id, picture.picture_order)
            .await?;
        if expected != picture.picture_name {
            stale.push(StaleIdentifier {
                field: StaleField::PictureName,
                row_id: picture.id,
                stored: picture.picture_name,
                expected,
            });
        }
    }

    if !stale.is_empty() {
        warn!(count = stale.len(), "stale derived identifiers found");
    }
    Ok(stale)
}

/// Rewrites every stale row through the regular refresh, uniqueness checks included.
pub async fn repair<T: CatalogTx>(tx: &mut T) -> CatalogResult<CascadeReport> {
    let variants = tx.all_variants().await?;
    let pictures = tx.all_pictures().await?;

    let mut ctx = NamingContext::new();
    let mut report = CascadeReport::default();
    refresh_variants(tx, &mut ctx, variants, &mut report).await?;
    refresh_pictures(tx, &mut ctx, pictures, &mut report).await?;

    info!(
        variants = report.variants.len(),
        pictures = report.pictures.len(),
        "derived identifiers repaired"
    );
    Ok(report)
}
