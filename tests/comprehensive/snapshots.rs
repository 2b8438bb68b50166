//! Snapshot export, JSON round-trip, and rehydration.

use relata::commands::{create, link};
use relata::{ModelStore, Snapshot, StoreError, Values};

use crate::test_utils::{create_product, create_tax, order_total, read, sales_defs, sales_store};

fn populated() -> ModelStore {
    let mut store = sales_store();
    let p1 = create_product(&mut store, "Burger", 10.0);
    let p2 = create_product(&mut store, "Water", 2.5);
    let tax = create_tax(&mut store, "vat", 21);
    store
        .model("order")
        .unwrap()
        .create(Values::new().many(
            "orderline_ids",
            [create([
                Values::new()
                    .one("product_id", p1.id().clone())
                    .set("quantity", 2)
                    .many("tax_ids", [link([tax.id().clone()])]),
                Values::new()
                    .one("product_id", p2.id().clone())
                    .set("quantity", 4),
            ])],
        ))
        .unwrap();
    store
}

#[test]
fn rehydrated_store_serves_the_same_reads() {
    let source = populated();
    let snapshot = source.snapshot();

    let mut restored = ModelStore::new(sales_defs()).unwrap();
    restored.load(snapshot).unwrap();

    let order_id = "order_1".into();
    assert_eq!(
        order_total(&mut restored, &order_id),
        2.0 * 10.0 + 4.0 * 2.5
    );
    let line = read(&mut restored, "orderline", &"orderline_1".into());
    assert_eq!(line.many("tax_ids").len(), 1);
}

#[test]
fn rehydrated_store_accepts_mutations_and_stays_consistent() {
    let snapshot = populated().snapshot();
    let mut restored = ModelStore::new(sales_defs()).unwrap();
    restored.load(snapshot).unwrap();

    restored
        .model("orderline")
        .unwrap()
        .delete(&"orderline_1".into())
        .unwrap();
    let order = read(&mut restored, "order", &"order_1".into());
    assert_eq!(order.many("orderline_ids").len(), 1);
}

#[test]
fn snapshot_round_trips_through_json() {
    let snapshot = populated().snapshot();
    let json = serde_json::to_string_pretty(&snapshot).unwrap();
    let parsed: Snapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, snapshot);
}

#[test]
fn load_requires_an_empty_store() {
    let mut store = populated();
    let snapshot = store.snapshot();
    let err = store.load(snapshot).unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)), "got {err}");
}
