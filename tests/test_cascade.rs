//! Write path and change propagation on the in-memory store.

use component_catalog::app::writes;
use component_catalog::storage::CatalogTx;
use component_catalog::{
    CatalogError, CatalogService, CatalogStore, ComponentChanges, MemoryStore, NewColor,
    NewComponent, NewPicture, NewSupplier, NewVariant, PictureChanges, SupplierChanges,
    VariantChanges,
};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn catalog() -> CatalogService<MemoryStore> {
    CatalogService::new(MemoryStore::new())
}

#[tokio::test]
async fn end_to_end_color_rename() -> TestResult {
    let catalog = catalog();
    let sup = catalog
        .create_supplier(NewSupplier::new("Supplies Inc", Some("SUP")))
        .await?;
    let x1 = catalog
        .create_component(NewComponent::new("X-1").with_supplier(sup.id))
        .await?;
    let blue = catalog.create_color(NewColor::new("Dark Blue")).await?;
    let red = catalog.create_color(NewColor::new("Red")).await?;

    let blue_variant = catalog.add_variant(NewVariant::new(x1.id, blue.id)).await?;
    let red_variant = catalog.add_variant(NewVariant::new(x1.id, red.id)).await?;
    assert_eq!(blue_variant.variant_sku, "sup_x-1_dark_blue");
    assert_eq!(red_variant.variant_sku, "sup_x-1_red");

    let blue_front = catalog.add_picture(NewPicture::for_variant(blue_variant.id)).await?;
    let blue_back = catalog.add_picture(NewPicture::for_variant(blue_variant.id)).await?;
    let red_pic = catalog.add_picture(NewPicture::for_variant(red_variant.id)).await?;
    let main = catalog.add_picture(NewPicture::for_component(x1.id)).await?;
    assert_eq!(blue_back.picture_name, "sup_x-1_dark_blue_2");

    let (_, report) = catalog.rename_color(blue.id, "Navy").await?;
    assert_eq!(report.variants, vec![blue_variant.id]);
    assert_eq!(report.pictures, vec![blue_front.id, blue_back.id]);

    assert_eq!(catalog.variant(blue_variant.id).await?.variant_sku, "sup_x-1_navy");
    assert_eq!(catalog.picture(blue_front.id).await?.picture_name, "sup_x-1_navy_1");
    assert_eq!(catalog.picture(blue_back.id).await?.picture_name, "sup_x-1_navy_2");

    assert_eq!(catalog.variant(red_variant.id).await?, red_variant);
    assert_eq!(catalog.picture(red_pic.id).await?, red_pic);
    assert_eq!(catalog.picture(main.id).await?, main);
    Ok(())
}

#[tokio::test]
async fn product_number_change_rewrites_every_variant_and_picture() -> TestResult {
    let catalog = catalog();
    let x1 = catalog.create_component(NewComponent::new("X-1")).await?;
    let mut variants = Vec::new();
    for name in ["Red", "Green", "Blue"] {
        let color = catalog.create_color(NewColor::new(name)).await?;
        variants.push(catalog.add_variant(NewVariant::new(x1.id, color.id)).await?);
    }
    let main = catalog.add_picture(NewPicture::for_component(x1.id)).await?;
    let red_pic = catalog
        .add_picture(NewPicture::for_variant(variants[0].id))
        .await?;
    assert_eq!(main.picture_name, "x-1_main_1");
    assert_eq!(red_pic.picture_name, "x-1_red_1");

    let (_, report) = catalog
        .update_component(x1.id, ComponentChanges::product_number("Y 2"))
        .await?;
    assert_eq!(report.variants.len(), 3);
    assert_eq!(report.pictures.len(), 2);

    for variant in catalog.variants_of_component(x1.id).await? {
        assert!(variant.variant_sku.starts_with("y_2_"), "{}", variant.variant_sku);
    }
    assert_eq!(catalog.picture(main.id).await?.picture_name, "y_2_main_1");
    assert_eq!(catalog.picture(red_pic.id).await?.picture_name, "y_2_red_1");
    Ok(())
}

#[tokio::test]
async fn description_change_does_not_cascade() -> TestResult {
    let catalog = catalog();
    let x1 = catalog.create_component(NewComponent::new("X-1")).await?;
    let red = catalog.create_color(NewColor::new("Red")).await?;
    catalog.add_variant(NewVariant::new(x1.id, red.id)).await?;

    let changes = ComponentChanges {
        description: Some(Some("A sturdy part".to_string())),
        ..Default::default()
    };
    let (component, report) = catalog.update_component(x1.id, changes).await?;
    assert!(report.is_empty());
    assert_eq!(component.description.as_deref(), Some("A sturdy part"));
    Ok(())
}

#[tokio::test]
async fn supplier_code_change_is_scoped_to_its_components() -> TestResult {
    let catalog = catalog();
    let sup = catalog
        .create_supplier(NewSupplier::new("Supplies Inc", Some("SUP")))
        .await?;
    let other = catalog
        .create_supplier(NewSupplier::new("Other", Some("OTH")))
        .await?;
    let red = catalog.create_color(NewColor::new("Red")).await?;

    let mine = catalog
        .create_component(NewComponent::new("A-1").with_supplier(sup.id))
        .await?;
    let theirs = catalog
        .create_component(NewComponent::new("B-1").with_supplier(other.id))
        .await?;
    let orphan = catalog.create_component(NewComponent::new("C-1")).await?;

    let mine_v = catalog.add_variant(NewVariant::new(mine.id, red.id)).await?;
    let mine_pic = catalog.add_picture(NewPicture::for_component(mine.id)).await?;
    let theirs_v = catalog.add_variant(NewVariant::new(theirs.id, red.id)).await?;
    let orphan_v = catalog.add_variant(NewVariant::new(orphan.id, red.id)).await?;

    let (_, report) = catalog
        .update_supplier(sup.id, SupplierChanges::code(Some("NEW")))
        .await?;
    assert_eq!(report.variants, vec![mine_v.id]);
    assert_eq!(report.pictures, vec![mine_pic.id]);

    assert_eq!(catalog.variant(mine_v.id).await?.variant_sku, "new_a-1_red");
    assert_eq!(catalog.picture(mine_pic.id).await?.picture_name, "new_a-1_main_1");
    assert_eq!(catalog.variant(theirs_v.id).await?.variant_sku, "oth_b-1_red");
    assert_eq!(catalog.variant(orphan_v.id).await?.variant_sku, "c-1_red");
    Ok(())
}

#[tokio::test]
async fn clearing_supplier_code_drops_prefix() -> TestResult {
    let catalog = catalog();
    let sup = catalog
        .create_supplier(NewSupplier::new("Supplies Inc", Some("SUP")))
        .await?;
    let x1 = catalog
        .create_component(NewComponent::new("X-1").with_supplier(sup.id))
        .await?;
    let red = catalog.create_color(NewColor::new("Red")).await?;
    let v = catalog.add_variant(NewVariant::new(x1.id, red.id)).await?;

    let (supplier, _) = catalog
        .update_supplier(sup.id, SupplierChanges::code(Some("  ")))
        .await?;
    assert_eq!(supplier.supplier_code, None);
    assert_eq!(catalog.variant(v.id).await?.variant_sku, "x-1_red");
    Ok(())
}

#[tokio::test]
async fn changing_component_supplier_cascades() -> TestResult {
    let catalog = catalog();
    let sup = catalog
        .create_supplier(NewSupplier::new("Supplies Inc", Some("SUP")))
        .await?;
    let x1 = catalog.create_component(NewComponent::new("X-1")).await?;
    let red = catalog.create_color(NewColor::new("Red")).await?;
    let v = catalog.add_variant(NewVariant::new(x1.id, red.id)).await?;
    assert_eq!(v.variant_sku, "x-1_red");

    let (_, report) = catalog
        .update_component(x1.id, ComponentChanges::supplier(Some(sup.id)))
        .await?;
    assert_eq!(report.variants, vec![v.id]);
    assert_eq!(catalog.variant(v.id).await?.variant_sku, "sup_x-1_red");

    let err = catalog
        .update_component(x1.id, ComponentChanges::supplier(Some(9_999)))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { entity: "supplier", .. }));
    Ok(())
}

#[tokio::test]
async fn deleting_supplier_detaches_and_renames() -> TestResult {
    let catalog = catalog();
    let sup = catalog
        .create_supplier(NewSupplier::new("Supplies Inc", Some("SUP")))
        .await?;
    let x1 = catalog
        .create_component(NewComponent::new("X-1").with_supplier(sup.id))
        .await?;
    let red = catalog.create_color(NewColor::new("Red")).await?;
    let v = catalog.add_variant(NewVariant::new(x1.id, red.id)).await?;

    let report = catalog.delete_supplier(sup.id).await?;
    assert_eq!(report.variants, vec![v.id]);
    assert_eq!(catalog.component(x1.id).await?.supplier_id, None);
    assert_eq!(catalog.variant(v.id).await?.variant_sku, "x-1_red");
    assert!(catalog.supplier(sup.id).await.is_err());
    Ok(())
}

#[tokio::test]
async fn deleting_supplier_renames_siblings_as_one_batch() -> TestResult {
    let catalog = catalog();
    let sup = catalog
        .create_supplier(NewSupplier::new("Supplies Inc", Some("SUP")))
        .await?;
    let red = catalog.create_color(NewColor::new("Red")).await?;
    let sup_y = catalog
        .create_component(NewComponent::new("sup y").with_supplier(sup.id))
        .await?;
    let y = catalog
        .create_component(NewComponent::new("y").with_supplier(sup.id))
        .await?;
    let sup_y_red = catalog.add_variant(NewVariant::new(sup_y.id, red.id)).await?;
    let y_red = catalog.add_variant(NewVariant::new(y.id, red.id)).await?;
    assert_eq!(sup_y_red.variant_sku, "sup_sup_y_red");
    assert_eq!(y_red.variant_sku, "sup_y_red");

    // "sup y" takes "sup_y_red", which "y" gives up in the same delete
    let report = catalog.delete_supplier(sup.id).await?;
    assert_eq!(report.variants.len(), 2);
    assert_eq!(catalog.variant(sup_y_red.id).await?.variant_sku, "sup_y_red");
    assert_eq!(catalog.variant(y_red.id).await?.variant_sku, "y_red");
    assert!(catalog.audit().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn dropped_transaction_restores_every_row() -> TestResult {
    let catalog = catalog();
    let sup = catalog
        .create_supplier(NewSupplier::new("Supplies Inc", Some("SUP")))
        .await?;
    let x1 = catalog
        .create_component(NewComponent::new("X-1").with_supplier(sup.id))
        .await?;
    let red = catalog.create_color(NewColor::new("Red")).await?;
    let v = catalog.add_variant(NewVariant::new(x1.id, red.id)).await?;
    let pic = catalog.add_picture(NewPicture::for_variant(v.id)).await?;

    {
        let mut tx = catalog.store().begin().await?;
        writes::rename_color(&mut tx, red.id, "Crimson").await?;
        writes::delete_supplier(&mut tx, sup.id).await?;
        writes::delete_component(&mut tx, x1.id).await?;
        writes::create_color(&mut tx, NewColor::new("Teal")).await?;
        // dropped without commit
    }

    assert_eq!(catalog.supplier(sup.id).await?, sup);
    assert_eq!(catalog.component(x1.id).await?, x1);
    assert_eq!(catalog.color(red.id).await?, red);
    assert_eq!(catalog.variant(v.id).await?, v);
    assert_eq!(catalog.picture(pic.id).await?, pic);

    let mut tx = catalog.store().begin().await?;
    writes::rename_color(&mut tx, red.id, "Crimson").await?;
    tx.rollback().await?;
    assert_eq!(catalog.variant(v.id).await?.variant_sku, "sup_x-1_red");
    assert!(catalog.audit().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn second_variant_for_same_pair_conflicts() -> TestResult {
    let catalog = catalog();
    let x1 = catalog.create_component(NewComponent::new("X-1")).await?;
    let red = catalog.create_color(NewColor::new("Red")).await?;
    catalog.add_variant(NewVariant::new(x1.id, red.id)).await?;

    let err = catalog
        .add_variant(NewVariant::new(x1.id, red.id))
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(catalog.variants_of_component(x1.id).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn cascade_producing_duplicate_sku_leaves_store_unchanged() -> TestResult {
    let catalog = catalog();
    let a = catalog.create_component(NewComponent::new("A-1")).await?;
    let b = catalog.create_component(NewComponent::new("B-1")).await?;
    let red = catalog.create_color(NewColor::new("Red")).await?;
    let a_red = catalog.add_variant(NewVariant::new(a.id, red.id)).await?;
    let b_red = catalog.add_variant(NewVariant::new(b.id, red.id)).await?;
    let b_pic = catalog.add_picture(NewPicture::for_component(b.id)).await?;

    // b-1_red would become a-1_red, already held by a's variant
    let err = catalog
        .update_component(b.id, ComponentChanges::product_number("A-1"))
        .await
        .unwrap_err();
    match err {
        CatalogError::Conflict { identifier, value } => {
            assert_eq!(identifier, "variant_sku");
            assert_eq!(value, "a-1_red");
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(catalog.component(b.id).await?.product_number, "B-1");
    assert_eq!(catalog.variant(b_red.id).await?.variant_sku, "b-1_red");
    assert_eq!(catalog.variant(a_red.id).await?.variant_sku, "a-1_red");
    assert_eq!(catalog.picture(b_pic.id).await?.picture_name, "b-1_main_1");
    Ok(())
}

#[tokio::test]
async fn color_names_that_normalize_alike_conflict() -> TestResult {
    let catalog = catalog();
    let x1 = catalog.create_component(NewComponent::new("X-1")).await?;
    let navy = catalog.create_color(NewColor::new("Navy")).await?;
    let blue = catalog.create_color(NewColor::new("Blue")).await?;
    catalog.add_variant(NewVariant::new(x1.id, navy.id)).await?;
    let blue_v = catalog.add_variant(NewVariant::new(x1.id, blue.id)).await?;

    let err = catalog.rename_color(blue.id, " NAVY ").await.unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(catalog.color(blue.id).await?.name, "Blue");
    assert_eq!(catalog.variant(blue_v.id).await?.variant_sku, "x-1_blue");
    Ok(())
}

#[tokio::test]
async fn variant_picture_takes_component_from_variant() -> TestResult {
    let catalog = catalog();
    let x1 = catalog.create_component(NewComponent::new("X-1")).await?;
    let x2 = catalog.create_component(NewComponent::new("X-2")).await?;
    let red = catalog.create_color(NewColor::new("Red")).await?;
    let v = catalog.add_variant(NewVariant::new(x1.id, red.id)).await?;

    let pic = catalog.add_picture(NewPicture::for_variant(v.id)).await?;
    assert_eq!(pic.component_id, x1.id);
    assert_eq!(pic.picture_name, "x-1_red_1");

    let unknown = catalog
        .add_picture(NewPicture::for_variant(9_999))
        .await
        .unwrap_err();
    assert!(matches!(unknown, CatalogError::NotFound { .. }));

    let neither = catalog.add_picture(NewPicture::default()).await.unwrap_err();
    assert!(matches!(neither, CatalogError::Validation(_)));

    let contradicting = NewPicture {
        component_id: Some(x2.id),
        variant_id: Some(v.id),
        picture_order: None,
    };
    let err = catalog.add_picture(contradicting).await.unwrap_err();
    assert!(matches!(err, CatalogError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn picture_order_defaults_to_next_in_group() -> TestResult {
    let catalog = catalog();
    let x1 = catalog.create_component(NewComponent::new("X-1")).await?;
    let red = catalog.create_color(NewColor::new("Red")).await?;
    let v = catalog.add_variant(NewVariant::new(x1.id, red.id)).await?;

    let first = catalog.add_picture(NewPicture::for_component(x1.id)).await?;
    let fifth = catalog.add_picture(NewPicture::for_component(x1.id).at(5)).await?;
    let next = catalog.add_picture(NewPicture::for_component(x1.id)).await?;
    let variant_first = catalog.add_picture(NewPicture::for_variant(v.id)).await?;

    assert_eq!(first.picture_order, 1);
    assert_eq!(fifth.picture_order, 5);
    assert_eq!(next.picture_order, 6);
    assert_eq!(variant_first.picture_order, 1);

    let taken = catalog
        .add_picture(NewPicture::for_component(x1.id).at(5))
        .await
        .unwrap_err();
    assert!(taken.is_conflict());

    let negative = catalog
        .add_picture(NewPicture::for_component(x1.id).at(-1))
        .await
        .unwrap_err();
    assert!(matches!(negative, CatalogError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn moving_picture_between_scopes_renames_it() -> TestResult {
    let catalog = catalog();
    let x1 = catalog.create_component(NewComponent::new("X-1")).await?;
    let red = catalog.create_color(NewColor::new("Red")).await?;
    let v = catalog.add_variant(NewVariant::new(x1.id, red.id)).await?;
    let pic = catalog.add_picture(NewPicture::for_component(x1.id).at(2)).await?;

    let moved = catalog
        .update_picture(
            pic.id,
            PictureChanges {
                variant_id: Some(Some(v.id)),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(moved.picture_name, "x-1_red_2");
    assert_eq!(moved.component_id, x1.id);

    let back = catalog
        .update_picture(
            pic.id,
            PictureChanges {
                variant_id: Some(None),
                picture_order: Some(7),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(back.picture_name, "x-1_main_7");
    assert!(back.is_component_level());
    Ok(())
}

#[tokio::test]
async fn moving_variant_carries_its_pictures() -> TestResult {
    let catalog = catalog();
    let x1 = catalog.create_component(NewComponent::new("X-1")).await?;
    let x2 = catalog.create_component(NewComponent::new("X-2")).await?;
    let red = catalog.create_color(NewColor::new("Red")).await?;
    let blue = catalog.create_color(NewColor::new("Blue")).await?;
    let v = catalog.add_variant(NewVariant::new(x1.id, red.id)).await?;
    let pic = catalog.add_picture(NewPicture::for_variant(v.id)).await?;

    let changes = VariantChanges {
        component_id: Some(x2.id),
        color_id: Some(blue.id),
    };
    let (moved, report) = catalog.update_variant(v.id, changes).await?;
    assert_eq!(moved.variant_sku, "x-2_blue");
    assert_eq!(report.pictures, vec![pic.id]);

    let pic_after = catalog.picture(pic.id).await?;
    assert_eq!(pic_after.component_id, x2.id);
    assert_eq!(pic_after.picture_name, "x-2_blue_1");
    assert!(catalog.variants_of_component(x1.id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn deletes_follow_ownership() -> TestResult {
    let catalog = catalog();
    let x1 = catalog.create_component(NewComponent::new("X-1")).await?;
    let red = catalog.create_color(NewColor::new("Red")).await?;
    let v = catalog.add_variant(NewVariant::new(x1.id, red.id)).await?;
    let first = catalog.add_picture(NewPicture::for_variant(v.id)).await?;
    let second = catalog.add_picture(NewPicture::for_variant(v.id)).await?;

    // no renumbering of siblings
    catalog.delete_picture(first.id).await?;
    assert_eq!(catalog.picture(second.id).await?.picture_order, 2);

    let in_use = catalog.delete_color(red.id).await.unwrap_err();
    assert!(matches!(in_use, CatalogError::Validation(_)));

    catalog.delete_variant(v.id).await?;
    assert!(catalog.picture(second.id).await.is_err());
    catalog.delete_color(red.id).await?;

    let main = catalog.add_picture(NewPicture::for_component(x1.id)).await?;
    catalog.delete_component(x1.id).await?;
    assert!(matches!(
        catalog.picture(main.id).await.unwrap_err(),
        CatalogError::NotFound { entity: "picture", .. }
    ));
    Ok(())
}

#[tokio::test]
async fn blank_inputs_are_rejected() -> TestResult {
    let catalog = catalog();
    let blank_pn = catalog
        .create_component(NewComponent::new("   "))
        .await
        .unwrap_err();
    assert!(matches!(blank_pn, CatalogError::Validation(_)));

    let color = catalog.create_color(NewColor::new("Red")).await?;
    let blank_color = catalog.rename_color(color.id, "").await.unwrap_err();
    assert!(matches!(blank_color, CatalogError::Validation(_)));

    let missing = catalog
        .add_variant(NewVariant::new(12_345, color.id))
        .await
        .unwrap_err();
    assert!(matches!(missing, CatalogError::NotFound { entity: "component", .. }));
    Ok(())
}

#[tokio::test]
async fn writes_compose_inside_one_transaction() -> TestResult {
    let store = MemoryStore::new();
    let mut tx = store.begin().await?;
    let x1 = writes::create_component(&mut tx, NewComponent::new("X-1")).await?;
    let red = writes::create_color(&mut tx, NewColor::new("Red")).await?;
    let v = writes::add_variant(&mut tx, NewVariant::new(x1.id, red.id)).await?;
    tx.rollback().await?;

    let catalog = CatalogService::new(store);
    assert!(catalog.variant(v.id).await.is_err());
    assert!(catalog.component(x1.id).await.is_err());

    let mut tx = catalog.store().begin().await?;
    let x1 = writes::create_component(&mut tx, NewComponent::new("X-1")).await?;
    let red = writes::create_color(&mut tx, NewColor::new("Red")).await?;
    let v = writes::add_variant(&mut tx, NewVariant::new(x1.id, red.id)).await?;
    writes::rename_color(&mut tx, red.id, "Crimson").await?;
    tx.commit().await?;

    assert_eq!(catalog.variant(v.id).await?.variant_sku, "x-1_crimson");
    Ok(())
}
