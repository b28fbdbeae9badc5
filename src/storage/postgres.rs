//! Catalog store backed by PostgreSQL.

use crate::domain::model::{
    Color, ColorId, Component, ComponentId, ComponentVariant, NewColor, NewComponent, NewSupplier,
    Picture, PictureDraft, PictureId, Supplier, SupplierId, VariantDraft, VariantId,
};
use crate::error::{CatalogError, CatalogResult};
use crate::storage::catalog::{CatalogStore, CatalogTx};
use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPoolOptions, PgQueryResult};
use sqlx::{PgPool, Postgres, Transaction};
use std::path::Path;

const SUPPLIER_COLUMNS: &str = "id, name, supplier_code, created_at";
const COLOR_COLUMNS: &str = "id, name, created_at";
const COMPONENT_COLUMNS: &str = "id, product_number, description, supplier_id, created_at";
const VARIANT_COLUMNS: &str = "id, component_id, color_id, variant_sku, created_at, updated_at";
const PICTURE_COLUMNS: &str =
    "id, component_id, variant_id, picture_order, picture_name, created_at, updated_at";

#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> CatalogResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn ping(&self) -> CatalogResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Applies every pending migration found in `migrations_dir`.
    pub async fn migrate(&self, migrations_dir: &Path) -> CatalogResult<()> {
        let migrator = Migrator::new(migrations_dir).await?;
        migrator.run(&self.pool).await?;
        Ok(())
    }

    /// Runs down-migrations until `target_version` is the latest applied one.
    ///
    /// Some down scripts are lossy (see the category migration); this is not an undo button.
    pub async fn revert_to(&self, migrations_dir: &Path, target_version: i64) -> CatalogResult<()> {
        let migrator = Migrator::new(migrations_dir).await?;
        migrator.undo(&self.pool, target_version).await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    type Tx = PgCatalogTx;

    async fn begin(&self) -> CatalogResult<PgCatalogTx> {
        Ok(PgCatalogTx {
            tx: self.pool.begin().await?,
        })
    }
}

pub struct PgCatalogTx {
    tx: Transaction<'static, Postgres>,
}

fn expect_row(result: PgQueryResult, entity: &'static str, id: i64) -> CatalogResult<()> {
    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found(entity, id));
    }
    Ok(())
}

#[async_trait]
impl CatalogTx for PgCatalogTx {
    async fn supplier(&mut self, id: SupplierId) -> CatalogResult<Option<Supplier>> {
        let sql = format!("SELECT {} FROM supplier WHERE id = $1", SUPPLIER_COLUMNS);
        Ok(sqlx::query_as::<_, Supplier>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn color(&mut self, id: ColorId) -> CatalogResult<Option<Color>> {
        let sql = format!("SELECT {} FROM color WHERE id = $1", COLOR_COLUMNS);
        Ok(sqlx::query_as::<_, Color>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn component(&mut self, id: ComponentId) -> CatalogResult<Option<Component>> {
        let sql = format!("SELECT {} FROM component WHERE id = $1", COMPONENT_COLUMNS);
        Ok(sqlx::query_as::<_, Component>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn variant(&mut self, id: VariantId) -> CatalogResult<Option<ComponentVariant>> {
        let sql = format!("SELECT {} FROM component_variant WHERE id = $1", VARIANT_COLUMNS);
        Ok(sqlx::query_as::<_, ComponentVariant>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn picture(&mut self, id: PictureId) -> CatalogResult<Option<Picture>> {
        let sql = format!("SELECT {} FROM picture WHERE id = $1", PICTURE_COLUMNS);
        Ok(sqlx::query_as::<_, Picture>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    // FOR SHARE blocks behind an uncommitted rename of the parent and then reads the
    // committed value, and keeps the parent from changing until this transaction ends.

    async fn supplier_for_naming(&mut self, id: SupplierId) -> CatalogResult<Option<Supplier>> {
        let sql = format!(
            "SELECT {} FROM supplier WHERE id = $1 FOR SHARE",
            SUPPLIER_COLUMNS
        );
        Ok(sqlx::query_as::<_, Supplier>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn color_for_naming(&mut self, id: ColorId) -> CatalogResult<Option<Color>> {
        let sql = format!("SELECT {} FROM color WHERE id = $1 FOR SHARE", COLOR_COLUMNS);
        Ok(sqlx::query_as::<_, Color>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn component_for_naming(&mut self, id: ComponentId) -> CatalogResult<Option<Component>> {
        let sql = format!(
            "SELECT {} FROM component WHERE id = $1 FOR SHARE",
            COMPONENT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Component>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn variant_for_naming(
        &mut self,
        id: VariantId,
    ) -> CatalogResult<Option<ComponentVariant>> {
        let sql = format!(
            "SELECT {} FROM component_variant WHERE id = $1 FOR SHARE",
            VARIANT_COLUMNS
        );
        Ok(sqlx::query_as::<_, ComponentVariant>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn components_of_supplier(
        &mut self,
        supplier_id: SupplierId,
    ) -> CatalogResult<Vec<Component>> {
        let sql = format!(
            "SELECT {} FROM component WHERE supplier_id = $1 ORDER BY id",
            COMPONENT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Component>(&sql)
            .bind(supplier_id)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn variants_of_component(
        &mut self,
        component_id: ComponentId,
    ) -> CatalogResult<Vec<ComponentVariant>> {
        let sql = format!(
            "SELECT {} FROM component_variant WHERE component_id = $1 ORDER BY id",
            VARIANT_COLUMNS
        );
        Ok(sqlx::query_as::<_, ComponentVariant>(&sql)
            .bind(component_id)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn variants_of_color(
        &mut self,
        color_id: ColorId,
    ) -> CatalogResult<Vec<ComponentVariant>> {
        let sql = format!(
            "SELECT {} FROM component_variant WHERE color_id = $1 ORDER BY id",
            VARIANT_COLUMNS
        );
        Ok(sqlx::query_as::<_, ComponentVariant>(&sql)
            .bind(color_id)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn pictures_of_component(
        &mut self,
        component_id: ComponentId,
    ) -> CatalogResult<Vec<Picture>> {
        let sql = format!(
            "SELECT {} FROM picture
             WHERE component_id = $1
                OR variant_id IN (SELECT id FROM component_variant WHERE component_id = $1)
             ORDER BY id",
            PICTURE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Picture>(&sql)
            .bind(component_id)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn pictures_of_variant(&mut self, variant_id: VariantId) -> CatalogResult<Vec<Picture>> {
        let sql = format!(
            "SELECT {} FROM picture WHERE variant_id = $1 ORDER BY id",
            PICTURE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Picture>(&sql)
            .bind(variant_id)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn max_picture_order(
        &mut self,
        component_id: ComponentId,
        variant_id: Option<VariantId>,
    ) -> CatalogResult<Option<i32>> {
        let max: Option<i32> = sqlx::query_scalar(
            "SELECT MAX(picture_order) FROM picture
             WHERE component_id = $1 AND variant_id IS NOT DISTINCT FROM $2",
        )
        .bind(component_id)
        .bind(variant_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(max)
    }

    async fn variant_id_by_sku(&mut self, sku: &str) -> CatalogResult<Option<VariantId>> {
        Ok(
            sqlx::query_scalar("SELECT id FROM component_variant WHERE variant_sku = $1")
                .bind(sku)
                .fetch_optional(&mut *self.tx)
                .await?,
        )
    }

    async fn variant_id_by_pair(
        &mut self,
        component_id: ComponentId,
        color_id: ColorId,
    ) -> CatalogResult<Option<VariantId>> {
        Ok(sqlx::query_scalar(
            "SELECT id FROM component_variant WHERE component_id = $1 AND color_id = $2",
        )
        .bind(component_id)
        .bind(color_id)
        .fetch_optional(&mut *self.tx)
        .await?)
    }

    async fn picture_id_by_name(&mut self, name: &str) -> CatalogResult<Option<PictureId>> {
        Ok(
            sqlx::query_scalar("SELECT id FROM picture WHERE picture_name = $1")
                .bind(name)
                .fetch_optional(&mut *self.tx)
                .await?,
        )
    }

    async fn all_variants(&mut self) -> CatalogResult<Vec<ComponentVariant>> {
        let sql = format!("SELECT {} FROM component_variant ORDER BY id", VARIANT_COLUMNS);
        Ok(sqlx::query_as::<_, ComponentVariant>(&sql)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn all_pictures(&mut self) -> CatalogResult<Vec<Picture>> {
        let sql = format!("SELECT {} FROM picture ORDER BY id", PICTURE_COLUMNS);
        Ok(sqlx::query_as::<_, Picture>(&sql)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn insert_supplier(&mut self, new: &NewSupplier) -> CatalogResult<Supplier> {
        let sql = format!(
            "INSERT INTO supplier (name, supplier_code) VALUES ($1, $2) RETURNING {}",
            SUPPLIER_COLUMNS
        );
        Ok(sqlx::query_as::<_, Supplier>(&sql)
            .bind(&new.name)
            .bind(new.cleaned_code())
            .fetch_one(&mut *self.tx)
            .await?)
    }

    async fn update_supplier(&mut self, supplier: &Supplier) -> CatalogResult<()> {
        let result = sqlx::query("UPDATE supplier SET name = $2, supplier_code = $3 WHERE id = $1")
            .bind(supplier.id)
            .bind(&supplier.name)
            .bind(&supplier.supplier_code)
            .execute(&mut *self.tx)
            .await?;
        expect_row(result, Supplier::ENTITY, supplier.id)
    }

    async fn delete_supplier(&mut self, id: SupplierId) -> CatalogResult<()> {
        // component.supplier_id is ON DELETE SET NULL
        sqlx::query("DELETE FROM supplier WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn insert_color(&mut self, new: &NewColor) -> CatalogResult<Color> {
        let sql = format!(
            "INSERT INTO color (name) VALUES ($1) RETURNING {}",
            COLOR_COLUMNS
        );
        Ok(sqlx::query_as::<_, Color>(&sql)
            .bind(&new.name)
            .fetch_one(&mut *self.tx)
            .await?)
    }

    async fn update_color(&mut self, color: &Color) -> CatalogResult<()> {
        let result = sqlx::query("UPDATE color SET name = $2 WHERE id = $1")
            .bind(color.id)
            .bind(&color.name)
            .execute(&mut *self.tx)
            .await?;
        expect_row(result, Color::ENTITY, color.id)
    }

    async fn delete_color(&mut self, id: ColorId) -> CatalogResult<()> {
        sqlx::query("DELETE FROM color WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn insert_component(&mut self, new: &NewComponent) -> CatalogResult<Component> {
        let sql = format!(
            "INSERT INTO component (product_number, description, supplier_id)
             VALUES ($1, $2, $3) RETURNING {}",
            COMPONENT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Component>(&sql)
            .bind(&new.product_number)
            .bind(&new.description)
            .bind(new.supplier_id)
            .fetch_one(&mut *self.tx)
            .await?)
    }

    async fn update_component(&mut self, component: &Component) -> CatalogResult<()> {
        let result = sqlx::query(
            "UPDATE component SET product_number = $2, description = $3, supplier_id = $4
             WHERE id = $1",
        )
        .bind(component.id)
        .bind(&component.product_number)
        .bind(&component.description)
        .bind(component.supplier_id)
        .execute(&mut *self.tx)
        .await?;
        expect_row(result, Component::ENTITY, component.id)
    }

    async fn delete_component(&mut self, id: ComponentId) -> CatalogResult<()> {
        // variants and pictures go with it (ON DELETE CASCADE)
        sqlx::query("DELETE FROM component WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn insert_variant(&mut self, draft: &VariantDraft) -> CatalogResult<ComponentVariant> {
        let sql = format!(
            "INSERT INTO component_variant (component_id, color_id, variant_sku)
             VALUES ($1, $2, $3) RETURNING {}",
            VARIANT_COLUMNS
        );
        Ok(sqlx::query_as::<_, ComponentVariant>(&sql)
            .bind(draft.component_id)
            .bind(draft.color_id)
            .bind(&draft.variant_sku)
            .fetch_one(&mut *self.tx)
            .await?)
    }

    async fn update_variant(&mut self, variant: &ComponentVariant) -> CatalogResult<()> {
        let result = sqlx::query(
            "UPDATE component_variant
             SET component_id = $2, color_id = $3, variant_sku = $4, updated_at = now()
             WHERE id = $1",
        )
        .bind(variant.id)
        .bind(variant.component_id)
        .bind(variant.color_id)
        .bind(&variant.variant_sku)
        .execute(&mut *self.tx)
        .await?;
        expect_row(result, ComponentVariant::ENTITY, variant.id)
    }

    async fn delete_variant(&mut self, id: VariantId) -> CatalogResult<()> {
        sqlx::query("DELETE FROM component_variant WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn insert_picture(&mut self, draft: &PictureDraft) -> CatalogResult<Picture> {
        let sql = format!(
            "INSERT INTO picture (component_id, variant_id, picture_order, picture_name)
             VALUES ($1, $2, $3, $4) RETURNING {}",
            PICTURE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Picture>(&sql)
            .bind(draft.component_id)
            .bind(draft.variant_id)
            .bind(draft.picture_order)
            .bind(&draft.picture_name)
            .fetch_one(&mut *self.tx)
            .await?)
    }

    async fn update_picture(&mut self, picture: &Picture) -> CatalogResult<()> {
        let result = sqlx::query(
            "UPDATE picture
             SET component_id = $2, variant_id = $3, picture_order = $4, picture_name = $5,
                 updated_at = now()
             WHERE id = $1",
        )
        .bind(picture.id)
        .bind(picture.component_id)
        .bind(picture.variant_id)
        .bind(picture.picture_order)
        .bind(&picture.picture_name)
        .execute(&mut *self.tx)
        .await?;
        expect_row(result, Picture::ENTITY, picture.id)
    }

    async fn delete_picture(&mut self, id: PictureId) -> CatalogResult<()> {
        sqlx::query("DELETE FROM picture WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self) -> CatalogResult<()> {
        // deferred unique constraints are checked here
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> CatalogResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
