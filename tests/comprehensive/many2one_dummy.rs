//! many2one fields whose inverse was never declared: the synthesized
//! dummy inverse still cascades deletions back to the referencing side.

use relata::{StoreError, Values};

use crate::test_utils::{create_line, create_product, read, sales_store};

#[test]
fn deleting_the_product_unsets_product_id_on_the_line() {
    let mut store = sales_store();
    let product = create_product(&mut store, "productA", 100.0);
    let line = create_line(&mut store, product.id(), 10);
    assert_eq!(line.one("product_id"), Some(product.id()));

    store.model("product").unwrap().delete(product.id()).unwrap();
    assert_eq!(read(&mut store, "orderline", line.id()).one("product_id"), None);
}

#[test]
fn dummy_fields_do_not_appear_by_name_in_caller_input() {
    let mut store = sales_store();
    let product = create_product(&mut store, "productA", 100.0);
    // The synthesized inverse lives on product, but the caller never
    // spelled it; unknown field names in values are ignored.
    store
        .model("product")
        .unwrap()
        .update(product.id(), Values::new().set("nonexistent_field", 1))
        .unwrap();
    assert!(store.model("product").unwrap().read(product.id()).is_some());
}

#[test]
fn required_many2one_is_enforced_on_create() {
    let mut store = sales_store();
    let err = store
        .model("orderline")
        .unwrap()
        .create(Values::new().set("quantity", 1))
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)), "got {err}");
    assert!(err.to_string().contains("'product_id' field is required"));
    assert!(store.model("orderline").unwrap().read_all().is_empty());
}
