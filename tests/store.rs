use std::collections::HashMap;

use product_inventory::{ensure_schema, Operation, Product, ProductStore, StoreError};
use proptest::prelude::*;
use rust_decimal::Decimal;
use tempfile::TempDir;

fn fresh_store() -> (TempDir, ProductStore) {
    let dir = TempDir::new().unwrap();
    let store = ensure_schema(dir.path().join("data").join("Product.db")).unwrap();
    (dir, store)
}

fn product(id: &str, name: &str, category: &str, cents: i64, quantity: i64) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        unit_price: Decimal::new(cents, 2),
        quantity,
        supplier: String::new(),
        status: String::new(),
    }
}

#[test]
fn widget_and_gadget_walkthrough() {
    let (_dir, store) = fresh_store();
    let widget = Product {
        supplier: "Acme".into(),
        status: "Active".into(),
        ..product("P1", "Widget", "Tools", 999, 3)
    };
    let gadget = product("P2", "Gadget", "Tools", 1999, 0);
    store.insert(&widget).unwrap();
    store.insert(&gadget).unwrap();

    assert_eq!(store.total_inventory_value().unwrap(), Decimal::new(2997, 2));

    let low: Vec<_> = store.low_stock(0).unwrap().into_iter().map(|p| p.id).collect();
    assert_eq!(low, vec!["P2"]);

    let tools: Vec<_> = store
        .by_category("tools")
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(tools, vec!["Gadget", "Widget"]);

    assert_eq!(store.list_all().unwrap(), vec![gadget, widget]);
}

#[test]
fn data_survives_reopening_the_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Product.db");

    let store = ensure_schema(&path).unwrap();
    store.insert(&product("P1", "Widget", "Tools", 999, 3)).unwrap();
    drop(store);

    let reopened = ensure_schema(&path).unwrap();
    assert_eq!(reopened.list_all().unwrap().len(), 1);
}

#[test]
fn update_then_delete_lifecycle() {
    let (_dir, store) = fresh_store();
    store.insert(&product("P1", "Widget", "Tools", 999, 3)).unwrap();

    let revised = Product {
        supplier: "Globex".into(),
        status: "Discontinued".into(),
        ..product("P1", "Widget Mk2", "", 1050, 7)
    };
    store.update(&revised).unwrap();
    assert_eq!(store.list_all().unwrap(), vec![revised]);

    store.delete("P1").unwrap();
    assert!(store.list_all().unwrap().is_empty());

    assert!(matches!(
        store.delete("P1").unwrap_err(),
        StoreError::NotFound { operation: Operation::Delete, .. }
    ));
    assert!(matches!(
        store.update(&product("P1", "Widget", "", 0, 0)).unwrap_err(),
        StoreError::NotFound { operation: Operation::Update, .. }
    ));
}

#[test]
fn errors_carry_operation_and_id() {
    let (_dir, store) = fresh_store();
    store.insert(&product("P1", "Widget", "", 100, 1)).unwrap();

    let duplicate = store.insert(&product("P1", "Other", "", 100, 1)).unwrap_err();
    assert!(duplicate.to_string().contains("P1"));
    assert!(duplicate.is_rejection());

    let missing = store.delete("P9").unwrap_err();
    assert!(missing.to_string().starts_with("delete:"));
    assert!(missing.to_string().contains("P9"));
}

fn arb_product() -> impl Strategy<Value = Product> {
    (
        "[A-C][0-9]",
        "[a-z]{1,6}",
        prop_oneof![Just(""), Just("Tools"), Just("tools"), Just("Garden")],
        0i64..100_000,
        0i64..500,
    )
        .prop_map(|(id, name, category, cents, quantity)| {
            product(&id, &name, category, cents, quantity)
        })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 32,
        ..ProptestConfig::default()
    })]

    /// Property: whatever sequence of inserts is attempted, each id is stored
    /// once, holding the first record that claimed it.
    #[test]
    fn ids_stay_unique_and_first_insert_wins(
        products in prop::collection::vec(arb_product(), 1..20)
    ) {
        let (_dir, store) = fresh_store();
        let mut expected: HashMap<String, Product> = HashMap::new();

        for product in &products {
            let result = store.insert(product);
            if expected.contains_key(&product.id) {
                let is_duplicate = matches!(result, Err(StoreError::DuplicateKey { .. }));
                prop_assert!(is_duplicate);
            } else {
                prop_assert!(result.is_ok());
                expected.insert(product.id.clone(), product.clone());
            }
        }

        let stored = store.list_all().unwrap();
        prop_assert_eq!(stored.len(), expected.len());
        for product in &stored {
            prop_assert_eq!(Some(product), expected.get(&product.id));
        }
    }

    /// Property: the total equals the exact sum of price times quantity, and
    /// the filters return exactly the matching rows in the promised order.
    #[test]
    fn aggregates_and_filters_match_the_stored_rows(
        products in prop::collection::vec(arb_product(), 0..20),
        threshold in 0i64..500,
    ) {
        let (_dir, store) = fresh_store();
        for product in &products {
            let _ = store.insert(product);
        }
        let stored = store.list_all().unwrap();

        let expected_total: Decimal = stored
            .iter()
            .map(|p| p.unit_price * Decimal::from(p.quantity))
            .sum();
        prop_assert_eq!(store.total_inventory_value().unwrap(), expected_total);

        let low = store.low_stock(threshold).unwrap();
        prop_assert!(low.iter().all(|p| p.quantity <= threshold));
        prop_assert!(low.windows(2).all(|pair| pair[0].quantity <= pair[1].quantity));
        prop_assert_eq!(
            low.len(),
            stored.iter().filter(|p| p.quantity <= threshold).count()
        );

        let tools = store.by_category("TOOLS").unwrap();
        prop_assert!(tools.iter().all(|p| p.category.eq_ignore_ascii_case("tools")));
        prop_assert!(tools.windows(2).all(|pair| pair[0].name <= pair[1].name));
        prop_assert_eq!(
            tools.len(),
            stored.iter().filter(|p| p.category.eq_ignore_ascii_case("tools")).count()
        );

        prop_assert_eq!(store.by_category("").unwrap(), stored);
    }
}
