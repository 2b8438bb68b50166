//! many2many lifecycle, declared-pair (product/tag) and dummy-inverse
//! (orderline/tax) variants.

use relata::commands::{clear, create, link, unlink};
use relata::{RecordId, Values};

use crate::test_utils::{create_product, create_tax, read, sales_store};

#[test]
fn linking_products_on_create_is_visible_from_both_sides() {
    let mut store = sales_store();
    let p1 = create_product(&mut store, "Product A1", 10.0);
    let p2 = create_product(&mut store, "Product A2", 100.0);
    let tag = store
        .model("tag")
        .unwrap()
        .create(
            Values::new()
                .set("name", "Tag A")
                .many("product_ids", [link([p1.id().clone(), p2.id().clone()])]),
        )
        .unwrap();

    assert_eq!(tag.many("product_ids"), &[p1.id().clone(), p2.id().clone()]);
    assert_eq!(
        read(&mut store, "product", p1.id()).many("tag_ids"),
        std::slice::from_ref(tag.id())
    );
    assert_eq!(
        read(&mut store, "product", p2.id()).many("tag_ids"),
        std::slice::from_ref(tag.id())
    );
}

#[test]
fn create_command_on_many2many_links_new_tags() {
    let mut store = sales_store();
    let product = store
        .model("product")
        .unwrap()
        .create(
            Values::new()
                .set("name", "Product A")
                .set("price", 10)
                .many(
                    "tag_ids",
                    [create([
                        Values::new().set("name", "Tag 1"),
                        Values::new().set("name", "Tag 2"),
                    ])],
                ),
        )
        .unwrap();

    assert_eq!(product.many("tag_ids").len(), 2);
    for tag_id in product.many("tag_ids") {
        let tag = read(&mut store, "tag", tag_id);
        assert_eq!(tag.many("product_ids"), std::slice::from_ref(product.id()));
    }
}

#[test]
fn replace_mode_clears_then_links() {
    let mut store = sales_store();
    let pa = create_product(&mut store, "productA", 10.0);
    let pb = create_product(&mut store, "productB", 100.0);
    let tag = store
        .model("tag")
        .unwrap()
        .create(
            Values::new()
                .set("name", "Tag 1")
                .many("product_ids", [link([pa.id().clone(), pb.id().clone()])]),
        )
        .unwrap();
    let pc = create_product(&mut store, "productC", 1000.0);

    store
        .model("tag")
        .unwrap()
        .update(
            tag.id(),
            Values::new().many("product_ids", [clear(), link([pc.id().clone()])]),
        )
        .unwrap();

    assert_eq!(
        read(&mut store, "tag", tag.id()).many("product_ids"),
        std::slice::from_ref(pc.id())
    );
    assert!(read(&mut store, "product", pa.id()).many("tag_ids").is_empty());
    assert!(read(&mut store, "product", pb.id()).many("tag_ids").is_empty());
    assert_eq!(
        read(&mut store, "product", pc.id()).many("tag_ids"),
        std::slice::from_ref(tag.id())
    );
}

#[test]
fn add_mode_extends_the_existing_links() {
    let mut store = sales_store();
    let tag1 = store
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
                .set("price", 5)
                .many("tag_ids", [link([tag1.id().clone()])]),
        )
        .unwrap();
    assert_eq!(product.many("tag_ids"), std::slice::from_ref(tag1.id()));

    let tag2 = store
        .model("tag")
        .unwrap()
        .create(Values::new().set("name", "tag2"))
        .unwrap();
    store
        .model("product")
        .unwrap()
        .update(
            product.id(),
            Values::new().many("tag_ids", [link([tag2.id().clone()])]),
        )
        .unwrap();

    assert_eq!(
        read(&mut store, "product", product.id()).many("tag_ids"),
        &[tag1.id().clone(), tag2.id().clone()]
    );
    assert_eq!(
        read(&mut store, "tag", tag1.id()).many("product_ids"),
        std::slice::from_ref(product.id())
    );
    assert_eq!(
        read(&mut store, "tag", tag2.id()).many("product_ids"),
        std::slice::from_ref(product.id())
    );
}

#[test]
fn remove_mode_unlinks_selected_products() {
    let mut store = sales_store();
    let pa = create_product(&mut store, "productA", 10.0);
    let pb = create_product(&mut store, "productB", 100.0);
    let pc = create_product(&mut store, "productC", 1000.0);
    let tag = store
        .model("tag")
        .unwrap()
        .create(Values::new().set("name", "Tag 1").many(
            "product_ids",
            [link([pa.id().clone(), pb.id().clone(), pc.id().clone()])],
        ))
        .unwrap();

    store
        .model("tag")
        .unwrap()
        .update(
            tag.id(),
            Values::new().many("product_ids", [unlink([pb.id().clone()])]),
        )
        .unwrap();

    assert_eq!(
        read(&mut store, "tag", tag.id()).many("product_ids"),
        &[pa.id().clone(), pc.id().clone()]
    );
    assert!(read(&mut store, "product", pb.id()).many("tag_ids").is_empty());
    assert_eq!(
        read(&mut store, "product", pa.id()).many("tag_ids"),
        std::slice::from_ref(tag.id())
    );
}

#[test]
fn create_mode_on_update_builds_and_links_tags() {
    let mut store = sales_store();
    let product = create_product(&mut store, "productA", 10.0);
    assert!(product.many("tag_ids").is_empty());

    store
        .model("product")
        .unwrap()
        .update(
            product.id(),
            Values::new().many(
                "tag_ids",
                [create([
                    Values::new().set("name", "Tag1"),
                    Values::new().set("name", "Tag2"),
                    Values::new().set("name", "Tag3"),
                ])],
            ),
        )
        .unwrap();

    let product = read(&mut store, "product", product.id());
    assert_eq!(product.many("tag_ids").len(), 3);
    for tag_id in product.many("tag_ids") {
        assert_eq!(
            read(&mut store, "tag", tag_id).many("product_ids"),
            std::slice::from_ref(product.id())
        );
    }
}

#[test]
fn deleting_products_removes_them_from_their_tags() {
    let mut store = sales_store();
    let pa = create_product(&mut store, "productA", 10.0);
    let pb = create_product(&mut store, "productB", 100.0);
    let pc = create_product(&mut store, "productC", 1000.0);
    let tag = store
        .model("tag")
        .unwrap()
        .create(Values::new().set("name", "Tag 1").many(
            "product_ids",
            [link([pa.id().clone(), pb.id().clone(), pc.id().clone()])],
        ))
        .unwrap();

    store
        .model("product")
        .unwrap()
        .delete_many(&[pa.id().clone(), pc.id().clone()])
        .unwrap();

    assert_eq!(
        read(&mut store, "tag", tag.id()).many("product_ids"),
        std::slice::from_ref(pb.id())
    );
}

#[test]
fn interleaved_deletions_keep_every_remaining_pairing() {
    let mut store = sales_store();
    let pa = create_product(&mut store, "productA", 10.0);
    let pb = create_product(&mut store, "productB", 100.0);
    let pc = create_product(&mut store, "productC", 1000.0);
    let mut tags = store.model("tag").unwrap();
    let tag1 = tags
        .create(Values::new().set("name", "tag1").many(
            "product_ids",
            [link([pa.id().clone(), pb.id().clone()])],
        ))
        .unwrap();
    let tag2 = tags
        .create(Values::new().set("name", "tag2").many(
            "product_ids",
            [link([pb.id().clone(), pc.id().clone()])],
        ))
        .unwrap();
    let tag3 = tags
        .create(Values::new().set("name", "tag3").many(
            "product_ids",
            [link([pa.id().clone(), pc.id().clone()])],
        ))
        .unwrap();

    assert_eq!(
        read(&mut store, "product", pa.id()).many("tag_ids"),
        &[tag1.id().clone(), tag3.id().clone()]
    );
    assert_eq!(
        read(&mut store, "product", pb.id()).many("tag_ids"),
        &[tag1.id().clone(), tag2.id().clone()]
    );

    store
        .model("tag")
        .unwrap()
        .delete_many(&[tag1.id().clone(), tag2.id().clone()])
        .unwrap();
    assert_eq!(
        read(&mut store, "product", pa.id()).many("tag_ids"),
        std::slice::from_ref(tag3.id())
    );
    assert!(read(&mut store, "product", pb.id()).many("tag_ids").is_empty());
    assert_eq!(
        read(&mut store, "product", pc.id()).many("tag_ids"),
        std::slice::from_ref(tag3.id())
    );

    store
        .model("product")
        .unwrap()
        .delete_many(&[pa.id().clone(), pb.id().clone()])
        .unwrap();
    assert_eq!(
        read(&mut store, "tag", tag3.id()).many("product_ids"),
        std::slice::from_ref(pc.id())
    );
}

#[test]
fn tax_links_resolve_through_the_synthesized_inverse() {
    let mut store = sales_store();
    let product = create_product(&mut store, "Burger", 10.0);
    let tax1 = create_tax(&mut store, "tax1", 20);
    let tax2 = create_tax(&mut store, "tax2", 50);
    let line = store
        .model("orderline")
        .unwrap()
        .create(
            Values::new()
                .one("product_id", product.id().clone())
                .set("quantity", 1)
                .many("tax_ids", [link([tax1.id().clone()])]),
        )
        .unwrap();
    assert_eq!(line.many("tax_ids"), std::slice::from_ref(tax1.id()));

    store
        .model("orderline")
        .unwrap()
        .update(
            line.id(),
            Values::new().many("tax_ids", [link([tax2.id().clone()])]),
        )
        .unwrap();
    assert_eq!(
        read(&mut store, "orderline", line.id()).many("tax_ids"),
        &[tax1.id().clone(), tax2.id().clone()]
    );

    store
        .model("orderline")
        .unwrap()
        .update(
            line.id(),
            Values::new().many("tax_ids", [unlink([tax2.id().clone()])]),
        )
        .unwrap();
    assert_eq!(
        read(&mut store, "orderline", line.id()).many("tax_ids"),
        std::slice::from_ref(tax1.id())
    );
}

#[test]
fn deleting_taxes_cascades_into_line_tax_ids() {
    let mut store = sales_store();
    let product = create_product(&mut store, "Burger", 10.0);
    let taxes: Vec<RecordId> = [("tax1", 20), ("tax2", 50), ("tax3", 150)]
        .iter()
        .map(|(name, pct)| create_tax(&mut store, name, *pct).id().clone())
        .collect();
    let line = store
        .model("orderline")
        .unwrap()
        .create(
            Values::new()
                .one("product_id", product.id().clone())
                .set("quantity", 1)
                .many("tax_ids", [link(taxes.clone())]),
        )
        .unwrap();
    assert_eq!(line.many("tax_ids").len(), 3);

    store
        .model("tax")
        .unwrap()
        .delete_many(&[taxes[1].clone(), taxes[2].clone()])
        .unwrap();
    assert_eq!(
        read(&mut store, "orderline", line.id()).many("tax_ids"),
        std::slice::from_ref(&taxes[0])
    );
}
