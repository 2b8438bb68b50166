//! Read paths: `read_all`, `read_many`, predicate finds.

use relata::Value;

use crate::test_utils::{create_product, sales_store};

#[test]
fn read_all_returns_records_in_creation_order() {
    let mut store = sales_store();
    let burger = create_product(&mut store, "Burger", 10.0);
    let water = create_product(&mut store, "Water", 2.5);
    let ice_cream = create_product(&mut store, "Ice Cream", 3.0);

    let all = store.model("product").unwrap().read_all();
    let ids: Vec<&str> = all.iter().map(|r| r.id().as_str()).collect();
    assert_eq!(
        ids,
        vec![burger.id().as_str(), water.id().as_str(), ice_cream.id().as_str()]
    );
}

#[test]
fn read_many_aligns_results_with_the_requested_ids() {
    let mut store = sales_store();
    let burger = create_product(&mut store, "Burger", 10.0);
    let _water = create_product(&mut store, "Water", 2.5);
    let ice_cream = create_product(&mut store, "Ice Cream", 3.0);

    let products = store.model("product").unwrap();
    let results = products.read_many(&[
        burger.id().clone(),
        "product_404".into(),
        ice_cream.id().clone(),
    ]);
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().map(|r| r.id()), Some(burger.id()));
    assert!(results[1].is_none());
    assert_eq!(results[2].as_ref().map(|r| r.id()), Some(ice_cream.id()));
}

#[test]
fn find_all_filters_on_scalar_values() {
    let mut store = sales_store();
    create_product(&mut store, "Burger", 10.0);
    create_product(&mut store, "Water", 2.5);
    create_product(&mut store, "Ice Cream", 3.0);

    let products = store.model("product").unwrap();
    let results = products.find_all(|r| r.get("price") == Some(&Value::from(10.0)));
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].get("name"), Some(&Value::from("Burger")));
}

#[test]
fn read_of_missing_record_is_none() {
    let mut store = sales_store();
    assert!(store.model("product").unwrap().read(&"nope".into()).is_none());
}
