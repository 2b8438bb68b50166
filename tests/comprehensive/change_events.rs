//! Change notification batching and coalescing as observed through the
//! listener callback.

use std::cell::RefCell;
use std::rc::Rc;

use relata::commands::{create, link};
use relata::{ChangeEvent, ChangeKind, ChangeTarget, Values};

use crate::test_utils::{create_product, sales_store};

type Batches = Rc<RefCell<Vec<Vec<ChangeEvent>>>>;

fn with_listener() -> (relata::ModelStore, Batches) {
    let mut store = sales_store();
    let batches: Batches = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&batches);
    store.set_listener(move |events| sink.borrow_mut().push(events.to_vec()));
    (store, batches)
}

fn record_events(batch: &[ChangeEvent]) -> Vec<&ChangeEvent> {
    batch
        .iter()
        .filter(|e| e.target == ChangeTarget::Record)
        .collect()
}

#[test]
fn one_batch_per_public_call_even_with_nested_creates() {
    let (mut store, batches) = with_listener();
    let product = create_product(&mut store, "Burger", 10.0);
    assert_eq!(batches.borrow().len(), 1);

    store
        .model("order")
        .unwrap()
        .create(Values::new().many(
            "orderline_ids",
            [create([
                Values::new().one("product_id", product.id().clone()).set("quantity", 1),
                Values::new().one("product_id", product.id().clone()).set("quantity", 2),
            ])],
        ))
        .unwrap();
    // Order plus two nested lines, still a single batch.
    assert_eq!(batches.borrow().len(), 2);

    let batches = batches.borrow();
    let records = record_events(&batches[1]);
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|e| e.kind == ChangeKind::Created));
}

#[test]
fn create_batch_carries_record_node_and_link_events() {
    let (mut store, batches) = with_listener();
    let tag = store
        .model("tag")
        .unwrap()
        .create(Values::new().set("name", "tag1"))
        .unwrap();
    store
        .model("product")
        .unwrap()
        .create(
            Values::new()
                .set("name", "productA")
                .set("price", 10)
                .many("tag_ids", [link([tag.id().clone()])]),
        )
        .unwrap();

    let batches = batches.borrow();
    let batch = &batches[1];
    assert!(batch.iter().any(|e| e.target == ChangeTarget::Record
        && e.kind == ChangeKind::Created
        && e.namespace == "product"));
    assert!(batch.iter().any(|e| e.target == ChangeTarget::Node));
    assert!(batch.iter().any(|e| e.target == ChangeTarget::Link
        && e.kind == ChangeKind::Created
        && e.namespace == "product_tag_rel"));
}

#[test]
fn created_payload_carries_the_scalar_values() {
    let (mut store, batches) = with_listener();
    create_product(&mut store, "Burger", 10.0);

    let batches = batches.borrow();
    let records = record_events(&batches[0]);
    assert_eq!(records.len(), 1);
    let payload = records[0].payload.as_ref().unwrap();
    assert_eq!(payload["name"], "Burger");
    assert_eq!(payload["price"], 10.0);
}

#[test]
fn scalar_update_produces_a_single_modified_event() {
    let (mut store, batches) = with_listener();
    let product = create_product(&mut store, "Burger", 10.0);
    store
        .model("product")
        .unwrap()
        .update(product.id(), Values::new().set("price", 12.0))
        .unwrap();

    let batches = batches.borrow();
    assert_eq!(batches[1].len(), 1);
    assert_eq!(batches[1][0].kind, ChangeKind::Modified);
    assert_eq!(batches[1][0].id, product.id().as_str());
}

#[test]
fn delete_batch_reports_the_record_and_its_severed_links() {
    let (mut store, batches) = with_listener();
    let tag = store
        .model("tag")
        .unwrap()
        .create(Values::new().set("name", "tag1"))
        .unwrap();
    let product = store
        .model("product")
        .unwrap()
        .create(
            Values::new()
                .set("name", "productA")
                .set("price", 10)
                .many("tag_ids", [link([tag.id().clone()])]),
        )
        .unwrap();

    store.model("product").unwrap().delete(product.id()).unwrap();

    let batches = batches.borrow();
    let batch = batches.last().unwrap();
    assert!(batch.iter().any(|e| e.target == ChangeTarget::Record
        && e.kind == ChangeKind::Deleted
        && e.id == product.id().as_str()));
    assert!(batch.iter().any(|e| e.target == ChangeTarget::Link
        && e.kind == ChangeKind::Deleted));
}

#[test]
fn nested_create_and_link_coalesce_per_identity() {
    let (mut store, batches) = with_listener();
    // A single call that creates an order and immediately links two new
    // lines: each line's node appears once, not once per touch.
    let product = create_product(&mut store, "Burger", 10.0);
    store
        .model("order")
        .unwrap()
        .create(Values::new().many(
            "orderline_ids",
            [create([Values::new()
                .one("product_id", product.id().clone())
                .set("quantity", 1)])],
        ))
        .unwrap();

    let batches = batches.borrow();
    let batch = &batches[1];
    let mut seen = std::collections::HashSet::new();
    for event in batch.iter() {
        assert!(
            seen.insert((event.target, event.namespace.clone(), event.id.clone())),
            "duplicate event for {:?} {}/{}",
            event.target,
            event.namespace,
            event.id
        );
    }
}
