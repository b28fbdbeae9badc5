//! Write-time duplicate detection for derived identifiers.
//!
//! A cascade plans a whole batch of new values before writing any of them, so the
//! check has to look at the batch as a unit: a value currently held by a row that
//! is itself being rewritten is free to take.

use crate::domain::model::{ColorId, ComponentId, ComponentVariant, VariantId};
use crate::error::{CatalogError, CatalogResult};
use crate::storage::CatalogTx;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    VariantSku,
    PictureName,
}

impl IdentifierKind {
    pub fn column(&self) -> &'static str {
        match self {
            IdentifierKind::VariantSku => "variant_sku",
            IdentifierKind::PictureName => "picture_name",
        }
    }
}

/// A value about to be written. `row_id` is `None` for inserts.
///
/// Rows of an update batch must be planned only when their value actually changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Planned {
    pub row_id: Option<i64>,
    pub value: String,
}

impl Planned {
    pub fn insert(value: impl Into<String>) -> Self {
        Self {
            row_id: None,
            value: value.into(),
        }
    }

    pub fn update(row_id: i64, value: impl Into<String>) -> Self {
        Self {
            row_id: Some(row_id),
            value: value.into(),
        }
    }
}

/// Checks a planned batch against the rows currently holding each value
/// (`holders[i]` is the holder of `planned[i].value`, if any).
pub fn check_planned(
    kind: IdentifierKind,
    planned: &[Planned],
    holders: &[Option<i64>],
) -> CatalogResult<()> {
    let batch: HashSet<i64> = planned.iter().filter_map(|p| p.row_id).collect();
    let mut seen: HashSet<&str> = HashSet::with_capacity(planned.len());

    for (plan, holder) in planned.iter().zip(holders) {
        if !seen.insert(plan.value.as_str()) {
            return Err(CatalogError::conflict(kind.column(), plan.value.clone()));
        }
        if let Some(holder) = holder {
            let same_row = plan.row_id == Some(*holder);
            if !same_row && !batch.contains(holder) {
                return Err(CatalogError::conflict(kind.column(), plan.value.clone()));
            }
        }
    }
    Ok(())
}

pub async fn ensure_available<T: CatalogTx>(
    tx: &mut T,
    kind: IdentifierKind,
    planned: &[Planned],
) -> CatalogResult<()> {
    let mut holders = Vec::with_capacity(planned.len());
    for plan in planned {
        let holder = match kind {
            IdentifierKind::VariantSku => tx.variant_id_by_sku(&plan.value).await?,
            IdentifierKind::PictureName => tx.picture_id_by_name(&plan.value).await?,
        };
        holders.push(holder);
    }
    check_planned(kind, planned, &holders)
}

/// One variant per (component, color). `variant_id` is the row being written, if it exists.
pub async fn ensure_variant_pair_available<T: CatalogTx>(
    tx: &mut T,
    variant_id: Option<VariantId>,
    component_id: ComponentId,
    color_id: ColorId,
) -> CatalogResult<()> {
    match tx.variant_id_by_pair(component_id, color_id).await? {
        Some(existing) if Some(existing) != variant_id => Err(CatalogError::conflict(
            ComponentVariant::ENTITY,
            format!("component {} / color {}", component_id, color_id),
        )),
        _ => Ok(()),
    }
}
