//! In-memory catalog store.
//!
//! A transaction takes the store's lock for its whole lifetime (single writer) and
//! writes straight into the tables, journaling the previous version of every row it
//! touches. Commit drops the journal; rollback, or dropping the transaction, replays
//! it in reverse. Ids handed out by a rolled back transaction are not reused.

use crate::domain::model::{
    Color, ColorId, Component, ComponentId, ComponentVariant, NewColor, NewComponent, NewSupplier,
    Picture, PictureDraft, PictureId, Supplier, SupplierId, VariantDraft, VariantId,
};
use crate::error::{CatalogError, CatalogResult};
use crate::storage::catalog::{CatalogStore, CatalogTx};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Default, Debug)]
struct Tables {
    next_id: i64,
    suppliers: BTreeMap<SupplierId, Supplier>,
    colors: BTreeMap<ColorId, Color>,
    components: BTreeMap<ComponentId, Component>,
    variants: BTreeMap<VariantId, ComponentVariant>,
    pictures: BTreeMap<PictureId, Picture>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// A row type stored in one of the tables.
trait Row: Clone + Send + 'static {
    const ENTITY: &'static str;
    fn table(tables: &mut Tables) -> &mut BTreeMap<i64, Self>;
}

macro_rules! row {
    ($ty:ty, $table:ident) => {
        impl Row for $ty {
            const ENTITY: &'static str = <$ty>::ENTITY;
            fn table(tables: &mut Tables) -> &mut BTreeMap<i64, Self> {
                &mut tables.$table
            }
        }
    };
}

row!(Supplier, suppliers);
row!(Color, colors);
row!(Component, components);
row!(ComponentVariant, variants);
row!(Picture, pictures);

type Undo = Box<dyn FnOnce(&mut Tables) + Send>;

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> CatalogResult<MemoryTx> {
        Ok(MemoryTx {
            tables: self.tables.clone().lock_owned().await,
            journal: Vec::new(),
        })
    }
}

pub struct MemoryTx {
    tables: OwnedMutexGuard<Tables>,
    journal: Vec<Undo>,
}

impl MemoryTx {
    fn put<R: Row>(&mut self, id: i64, row: R) {
        let previous = R::table(&mut *self.tables).insert(id, row);
        self.journal.push(Box::new(move |tables: &mut Tables| {
            let table = R::table(tables);
            match previous {
                Some(row) => table.insert(id, row),
                None => table.remove(&id),
            };
        }));
    }

    fn take<R: Row>(&mut self, id: i64) {
        if let Some(previous) = R::table(&mut *self.tables).remove(&id) {
            self.journal.push(Box::new(move |tables: &mut Tables| {
                R::table(tables).insert(id, previous);
            }));
        }
    }

    fn existing<R: Row>(&mut self, id: i64) -> CatalogResult<R> {
        R::table(&mut *self.tables)
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(R::ENTITY, id))
    }

    fn revert(&mut self) {
        while let Some(undo) = self.journal.pop() {
            undo(&mut *self.tables);
        }
    }
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        self.revert();
    }
}

#[async_trait]
impl CatalogTx for MemoryTx {
    async fn supplier(&mut self, id: SupplierId) -> CatalogResult<Option<Supplier>> {
        Ok(self.tables.suppliers.get(&id).cloned())
    }

    async fn color(&mut self, id: ColorId) -> CatalogResult<Option<Color>> {
        Ok(self.tables.colors.get(&id).cloned())
    }

    async fn component(&mut self, id: ComponentId) -> CatalogResult<Option<Component>> {
        Ok(self.tables.components.get(&id).cloned())
    }

    async fn variant(&mut self, id: VariantId) -> CatalogResult<Option<ComponentVariant>> {
        Ok(self.tables.variants.get(&id).cloned())
    }

    async fn picture(&mut self, id: PictureId) -> CatalogResult<Option<Picture>> {
        Ok(self.tables.pictures.get(&id).cloned())
    }

    async fn components_of_supplier(
        &mut self,
        supplier_id: SupplierId,
    ) -> CatalogResult<Vec<Component>> {
        Ok(self
            .tables
            .components
            .values()
            .filter(|c| c.supplier_id == Some(supplier_id))
            .cloned()
            .collect())
    }

    async fn variants_of_component(
        &mut self,
        component_id: ComponentId,
    ) -> CatalogResult<Vec<ComponentVariant>> {
        Ok(self
            .tables
            .variants
            .values()
            .filter(|v| v.component_id == component_id)
            .cloned()
            .collect())
    }

    async fn variants_of_color(
        &mut self,
        color_id: ColorId,
    ) -> CatalogResult<Vec<ComponentVariant>> {
        Ok(self
            .tables
            .variants
            .values()
            .filter(|v| v.color_id == color_id)
            .cloned()
            .collect())
    }

    async fn pictures_of_component(
        &mut self,
        component_id: ComponentId,
    ) -> CatalogResult<Vec<Picture>> {
        let variants = &self.tables.variants;
        let via_variant = |variant_id: Option<VariantId>| {
            variant_id
                .and_then(|id| variants.get(&id))
                .is_some_and(|v| v.component_id == component_id)
        };
        Ok(self
            .tables
            .pictures
            .values()
            .filter(|p| p.component_id == component_id || via_variant(p.variant_id))
            .cloned()
            .collect())
    }

    async fn pictures_of_variant(&mut self, variant_id: VariantId) -> CatalogResult<Vec<Picture>> {
        Ok(self
            .tables
            .pictures
            .values()
            .filter(|p| p.variant_id == Some(variant_id))
            .cloned()
            .collect())
    }

    async fn max_picture_order(
        &mut self,
        component_id: ComponentId,
        variant_id: Option<VariantId>,
    ) -> CatalogResult<Option<i32>> {
        Ok(self
            .tables
            .pictures
            .values()
            .filter(|p| p.component_id == component_id && p.variant_id == variant_id)
            .map(|p| p.picture_order)
            .max())
    }

    async fn variant_id_by_sku(&mut self, sku: &str) -> CatalogResult<Option<VariantId>> {
        Ok(self
            .tables
            .variants
            .values()
            .find(|v| v.variant_sku == sku)
            .map(|v| v.id))
    }

    async fn variant_id_by_pair(
        &mut self,
        component_id: ComponentId,
        color_id: ColorId,
    ) -> CatalogResult<Option<VariantId>> {
        Ok(self
            .tables
            .variants
            .values()
            .find(|v| v.component_id == component_id && v.color_id == color_id)
            .map(|v| v.id))
    }

    async fn picture_id_by_name(&mut self, name: &str) -> CatalogResult<Option<PictureId>> {
        Ok(self
            .tables
            .pictures
            .values()
            .find(|p| p.picture_name == name)
            .map(|p| p.id))
    }

    async fn all_variants(&mut self) -> CatalogResult<Vec<ComponentVariant>> {
        Ok(self.tables.variants.values().cloned().collect())
    }

    async fn all_pictures(&mut self) -> CatalogResult<Vec<Picture>> {
        Ok(self.tables.pictures.values().cloned().collect())
    }

    async fn insert_supplier(&mut self, new: &NewSupplier) -> CatalogResult<Supplier> {
        let supplier = Supplier {
            id: self.tables.allocate_id(),
            name: new.name.clone(),
            supplier_code: new.cleaned_code(),
            created_at: Utc::now(),
        };
        self.put(supplier.id, supplier.clone());
        Ok(supplier)
    }

    async fn update_supplier(&mut self, supplier: &Supplier) -> CatalogResult<()> {
        let mut row: Supplier = self.existing(supplier.id)?;
        row.name = supplier.name.clone();
        row.supplier_code = supplier.supplier_code.clone();
        self.put(row.id, row);
        Ok(())
    }

    async fn delete_supplier(&mut self, id: SupplierId) -> CatalogResult<()> {
        let detached: Vec<Component> = self
            .tables
            .components
            .values()
            .filter(|c| c.supplier_id == Some(id))
            .cloned()
            .collect();
        for component in detached {
            self.put(
                component.id,
                Component {
                    supplier_id: None,
                    ..component
                },
            );
        }
        self.take::<Supplier>(id);
        Ok(())
    }

    async fn insert_color(&mut self, new: &NewColor) -> CatalogResult<Color> {
        let color = Color {
            id: self.tables.allocate_id(),
            name: new.name.clone(),
            created_at: Utc::now(),
        };
        self.put(color.id, color.clone());
        Ok(color)
    }

    async fn update_color(&mut self, color: &Color) -> CatalogResult<()> {
        let mut row: Color = self.existing(color.id)?;
        row.name = color.name.clone();
        self.put(row.id, row);
        Ok(())
    }

    async fn delete_color(&mut self, id: ColorId) -> CatalogResult<()> {
        self.take::<Color>(id);
        Ok(())
    }

    async fn insert_component(&mut self, new: &NewComponent) -> CatalogResult<Component> {
        let component = Component {
            id: self.tables.allocate_id(),
            product_number: new.product_number.clone(),
            description: new.description.clone(),
            supplier_id: new.supplier_id,
            created_at: Utc::now(),
        };
        self.put(component.id, component.clone());
        Ok(component)
    }

    async fn update_component(&mut self, component: &Component) -> CatalogResult<()> {
        let mut row: Component = self.existing(component.id)?;
        row.product_number = component.product_number.clone();
        row.description = component.description.clone();
        row.supplier_id = component.supplier_id;
        self.put(row.id, row);
        Ok(())
    }

    async fn delete_component(&mut self, id: ComponentId) -> CatalogResult<()> {
        let variants: Vec<VariantId> = self
            .tables
            .variants
            .values()
            .filter(|v| v.component_id == id)
            .map(|v| v.id)
            .collect();
        let pictures: Vec<PictureId> = self
            .tables
            .pictures
            .values()
            .filter(|p| {
                p.component_id == id || p.variant_id.is_some_and(|vid| variants.contains(&vid))
            })
            .map(|p| p.id)
            .collect();
        for picture_id in pictures {
            self.take::<Picture>(picture_id);
        }
        for variant_id in variants {
            self.take::<ComponentVariant>(variant_id);
        }
        self.take::<Component>(id);
        Ok(())
    }

    async fn insert_variant(&mut self, draft: &VariantDraft) -> CatalogResult<ComponentVariant> {
        let now = Utc::now();
        let variant = ComponentVariant {
            id: self.tables.allocate_id(),
            component_id: draft.component_id,
            color_id: draft.color_id,
            variant_sku: draft.variant_sku.clone(),
            created_at: now,
            updated_at: now,
        };
        self.put(variant.id, variant.clone());
        Ok(variant)
    }

    async fn update_variant(&mut self, variant: &ComponentVariant) -> CatalogResult<()> {
        let mut row: ComponentVariant = self.existing(variant.id)?;
        row.component_id = variant.component_id;
        row.color_id = variant.color_id;
        row.variant_sku = variant.variant_sku.clone();
        row.updated_at = Utc::now();
        self.put(row.id, row);
        Ok(())
    }

    async fn delete_variant(&mut self, id: VariantId) -> CatalogResult<()> {
        let pictures: Vec<PictureId> = self
            .tables
            .pictures
            .values()
            .filter(|p| p.variant_id == Some(id))
            .map(|p| p.id)
            .collect();
        for picture_id in pictures {
            self.take::<Picture>(picture_id);
        }
        self.take::<ComponentVariant>(id);
        Ok(())
    }

    async fn insert_picture(&mut self, draft: &PictureDraft) -> CatalogResult<Picture> {
        let now = Utc::now();
        let picture = Picture {
            id: self.tables.allocate_id(),
            component_id: draft.component_id,
            variant_id: draft.variant_id,
            picture_order: draft.picture_order,
            picture_name: draft.picture_name.clone(),
            created_at: now,
            updated_at: now,
        };
        self.put(picture.id, picture.clone());
        Ok(picture)
    }

    async fn update_picture(&mut self, picture: &Picture) -> CatalogResult<()> {
        let mut row: Picture = self.existing(picture.id)?;
        row.component_id = picture.component_id;
        row.variant_id = picture.variant_id;
        row.picture_order = picture.picture_order;
        row.picture_name = picture.picture_name.clone();
        row.updated_at = Utc::now();
        self.put(row.id, row);
        Ok(())
    }

    async fn delete_picture(&mut self, id: PictureId) -> CatalogResult<()> {
        self.take::<Picture>(id);
        Ok(())
    }

    async fn commit(self) -> CatalogResult<()> {
        let mut tx = self;
        tx.journal.clear();
        Ok(())
    }

    async fn rollback(self) -> CatalogResult<()> {
        let mut tx = self;
        tx.revert();
        Ok(())
    }
}
