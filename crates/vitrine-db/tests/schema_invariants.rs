//! End-to-end checks of the schema rules and workflows against an
//! in-memory database (and a file database where several connections are
//! needed).

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use vitrine_core::{
    Boutique, CoreError, Money, NewAuditLog, NewBoutique, NewPaymentLine, NewProduct,
    NewReceiptLine, NewSale, NewSaleLine, NewSaleOrder, NewStock, NewStockReceipt, NewSupplier,
    NewUserAccount, Product, Role, User, ValidationError, SALE_STATUS_VOIDED,
};
use vitrine_db::query::{Aggregate, Changes, ColumnExt, Direction, Filter, FindMany, GroupBy, Value};
use vitrine_db::schema::{
    BoutiqueColumn, BoutiqueKey, PaymentColumn, ProductColumn, ProductKey, SaleColumn, SaleKey,
    StockColumn, StockEntryItemColumn, StockKey, SupplierColumn, UserColumn, UserKey,
};
use vitrine_db::{Database, DbConfig, DbError};

// =============================================================================
// Fixtures
// =============================================================================

async fn setup() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn boutique(db: &Database, code: &str) -> Boutique {
    db.boutiques()
        .create(NewBoutique {
            name: format!("Boutique {}", code),
            code: code.to_string(),
            ..Default::default()
        })
        .await
        .unwrap()
}

async fn cashier(db: &Database, email: &str) -> User {
    db.user_repo()
        .register(NewUserAccount {
            email: email.to_string(),
            password: "mot-de-passe-123".to_string(),
            full_name: "Awa Ndiaye".to_string(),
            role: Some(Role::Employee),
        })
        .await
        .unwrap()
}

async fn product(db: &Database, sku: &str, price: Money) -> Product {
    db.products()
        .create(NewProduct {
            sku: sku.to_string(),
            name: format!("Produit {}", sku),
            price,
            ..Default::default()
        })
        .await
        .unwrap()
}

async fn stock(db: &Database, boutique_id: &str, product_id: &str, quantity: i64) {
    db.stocks()
        .create(NewStock {
            id: None,
            boutique_id: boutique_id.to_string(),
            product_id: product_id.to_string(),
            quantity: Some(quantity),
        })
        .await
        .unwrap();
}

fn order(boutique_id: &str, cashier_id: &str, product_id: &str, quantity: i64) -> NewSaleOrder {
    NewSaleOrder {
        boutique_id: boutique_id.to_string(),
        cashier_user_id: cashier_id.to_string(),
        payment_method: "cash".to_string(),
        items: vec![NewSaleLine {
            product_id: product_id.to_string(),
            quantity,
            unit_price: Money::new(dec!(500)),
            discount: Money::zero(),
        }],
        ..Default::default()
    }
}

// =============================================================================
// Uniqueness
// =============================================================================

#[tokio::test]
async fn duplicate_email_is_a_unique_violation() {
    let db = setup().await;
    cashier(&db, "awa@vitrine.sn").await;

    let err = db
        .user_repo()
        .register(NewUserAccount {
            email: "AWA@vitrine.sn".to_string(),
            password: "autre-mot-de-passe".to_string(),
            full_name: "Awa Bis".to_string(),
            role: None,
        })
        .await
        .unwrap_err();
    assert!(err.is_unique_violation(), "got {:?}", err);
}

#[tokio::test]
async fn one_stock_row_per_boutique_and_product() {
    let db = setup().await;
    let b = boutique(&db, "DKR-01").await;
    let p = product(&db, "BOI-BIS-0001", Money::new(dec!(500))).await;
    stock(&db, &b.id, &p.id, 3).await;

    let err = db
        .stocks()
        .create(NewStock {
            id: None,
            boutique_id: b.id.clone(),
            product_id: p.id.clone(),
            quantity: Some(1),
        })
        .await
        .unwrap_err();
    assert!(err.is_unique_violation(), "got {:?}", err);
}

#[tokio::test]
async fn offline_id_is_unique_but_many_sales_may_omit_it() {
    let db = setup().await;
    let b = boutique(&db, "DKR-01").await;
    let u = cashier(&db, "caisse@vitrine.sn").await;
    let p = product(&db, "BOI-BIS-0001", Money::new(dec!(500))).await;
    stock(&db, &b.id, &p.id, 10).await;

    let sales = db.sale_repo();
    sales.record_sale(order(&b.id, &u.id, &p.id, 1)).await.unwrap();
    sales.record_sale(order(&b.id, &u.id, &p.id, 1)).await.unwrap();

    let without_offline_id = db
        .sales()
        .count(SaleColumn::OfflineId.is_null())
        .await
        .unwrap();
    assert_eq!(without_offline_id, 2);
}

#[tokio::test]
async fn create_many_can_skip_duplicates() {
    let db = setup().await;
    product(&db, "EPI-RIZ-0001", Money::new(dec!(650))).await;

    let batch = vec![
        NewProduct {
            sku: "EPI-RIZ-0001".to_string(),
            name: "Riz".to_string(),
            price: Money::new(dec!(650)),
            ..Default::default()
        },
        NewProduct {
            sku: "EPI-MIL-0002".to_string(),
            name: "Mil".to_string(),
            price: Money::new(dec!(400)),
            ..Default::default()
        },
    ];

    let inserted = db.products().create_many(batch.clone(), true).await.unwrap();
    assert_eq!(inserted, 1);

    // Without skipping, the whole batch fails and nothing is written.
    let err = db.products().create_many(batch, false).await.unwrap_err();
    assert!(err.is_unique_violation(), "got {:?}", err);
    assert_eq!(db.products().count(Filter::everything()).await.unwrap(), 2);
}

// =============================================================================
// Referential actions
// =============================================================================

#[tokio::test]
async fn deleting_a_boutique_cascades_to_its_stock() {
    let db = setup().await;
    let b = boutique(&db, "DKR-01").await;
    let p = product(&db, "BOI-BIS-0001", Money::new(dec!(500))).await;
    stock(&db, &b.id, &p.id, 4).await;

    db.boutiques()
        .delete(BoutiqueKey::Id(b.id.clone()))
        .await
        .unwrap();

    let left = db
        .stocks()
        .count(StockColumn::BoutiqueId.equals(&b.id))
        .await
        .unwrap();
    assert_eq!(left, 0);
    // The product itself is untouched.
    assert!(db
        .products()
        .find_unique(ProductKey::Id(p.id))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn boutique_with_sales_cannot_be_deleted() {
    let db = setup().await;
    let b = boutique(&db, "DKR-01").await;
    let u = cashier(&db, "caisse@vitrine.sn").await;
    let p = product(&db, "BOI-BIS-0001", Money::new(dec!(500))).await;
    stock(&db, &b.id, &p.id, 5).await;
    db.sale_repo()
        .record_sale(order(&b.id, &u.id, &p.id, 1))
        .await
        .unwrap();

    let err = db
        .boutiques()
        .delete(BoutiqueKey::Id(b.id))
        .await
        .unwrap_err();
    assert!(err.is_foreign_key_violation(), "got {:?}", err);
}

#[tokio::test]
async fn stock_for_unknown_product_is_rejected() {
    let db = setup().await;
    let b = boutique(&db, "DKR-01").await;

    let err = db
        .stocks()
        .create(NewStock {
            id: None,
            boutique_id: b.id,
            product_id: "does-not-exist".to_string(),
            quantity: Some(1),
        })
        .await
        .unwrap_err();
    assert!(err.is_foreign_key_violation(), "got {:?}", err);
}

// =============================================================================
// Values
// =============================================================================

#[tokio::test]
async fn decimals_round_trip_exactly() {
    let db = setup().await;
    let created = product(&db, "COS-KAR-0001", Money::new(dec!(1234.5678))).await;

    let read = db
        .products()
        .find_unique_or_throw(ProductKey::Sku("COS-KAR-0001".to_string()))
        .await
        .unwrap();
    assert_eq!(read.id, created.id);
    assert_eq!(read.price.amount(), dec!(1234.5678));
}

#[tokio::test]
async fn find_unique_misses_are_none_or_not_found() {
    let db = setup().await;

    let missing = db
        .users()
        .find_unique(UserKey::Email("personne@vitrine.sn".to_string()))
        .await
        .unwrap();
    assert!(missing.is_none());

    let err = db
        .users()
        .find_unique_or_throw(UserKey::Email("personne@vitrine.sn".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "User"));
}

#[tokio::test]
async fn update_of_missing_row_is_not_found() {
    let db = setup().await;
    let err = db
        .boutiques()
        .update(
            BoutiqueKey::Code("NOPE-00".to_string()),
            Changes::new().set(BoutiqueColumn::Name, "Fantome"),
        )
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn arithmetic_on_text_column_is_rejected() {
    let db = setup().await;
    let b = boutique(&db, "DKR-01").await;

    let err = db
        .boutiques()
        .update(
            BoutiqueKey::Id(b.id),
            Changes::new().increment(BoutiqueColumn::Name, 1),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidArgument(_)), "got {:?}", err);
}

// =============================================================================
// Bulk operations and aggregates
// =============================================================================

#[tokio::test]
async fn update_many_and_delete_many_report_counts() {
    let db = setup().await;
    db.suppliers()
        .create_many(
            vec![
                NewSupplier {
                    name: "Sandaga Gros".to_string(),
                    ..Default::default()
                },
                NewSupplier {
                    name: "Sandaga Detail".to_string(),
                    ..Default::default()
                },
                NewSupplier {
                    name: "Kaolack Karite".to_string(),
                    ..Default::default()
                },
            ],
            false,
        )
        .await
        .unwrap();

    let updated = db
        .suppliers()
        .update_many(
            SupplierColumn::Name.starts_with("Sandaga"),
            Changes::new().set(SupplierColumn::Address, "Marche Sandaga"),
        )
        .await
        .unwrap();
    assert_eq!(updated, 2);

    let deleted = db
        .suppliers()
        .delete_many(SupplierColumn::Address.is_null())
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(db.suppliers().count(Filter::everything()).await.unwrap(), 2);
}

#[tokio::test]
async fn decimal_sum_has_no_float_drift() {
    let db = setup().await;
    product(&db, "A-1", Money::new(dec!(0.10))).await;
    product(&db, "A-2", Money::new(dec!(0.20))).await;

    let result = db
        .products()
        .aggregate(
            Aggregate::new()
                .count_all()
                .sum(ProductColumn::Price)
                .max(ProductColumn::Price),
        )
        .await
        .unwrap();

    assert_eq!(result.count_all, Some(2));
    assert_eq!(result.sum(ProductColumn::Price), Some(dec!(0.30)));
    assert_eq!(
        result.max(ProductColumn::Price),
        Some(&Value::Decimal(dec!(0.20)))
    );
}

#[tokio::test]
async fn decimal_filters_compare_numerically() {
    let db = setup().await;
    product(&db, "A-1", Money::new(dec!(900))).await;
    product(&db, "A-2", Money::new(dec!(1500))).await;

    // As text "900" > "1500"; numerically it is not.
    let pricey = db
        .products()
        .find_many(
            FindMany::new()
                .filter(ProductColumn::Price.gt(dec!(1000)))
                .order_by(ProductColumn::Price, Direction::Desc),
        )
        .await
        .unwrap();
    assert_eq!(pricey.len(), 1);
    assert_eq!(pricey[0].sku, "A-2");
}

#[tokio::test]
async fn group_by_sums_stock_per_boutique() {
    let db = setup().await;
    let dakar = boutique(&db, "DKR-01").await;
    let thies = boutique(&db, "THS-01").await;
    let p1 = product(&db, "P-1", Money::new(dec!(100))).await;
    let p2 = product(&db, "P-2", Money::new(dec!(200))).await;
    stock(&db, &dakar.id, &p1.id, 4).await;
    stock(&db, &dakar.id, &p2.id, 6).await;
    stock(&db, &thies.id, &p1.id, 1).await;

    let groups = db
        .stocks()
        .group_by(
            GroupBy::new([StockColumn::BoutiqueId])
                .count_all()
                .sum(StockColumn::Quantity),
        )
        .await
        .unwrap();
    assert_eq!(groups.len(), 2);

    let dakar_group = groups
        .iter()
        .find(|g| g.get(StockColumn::BoutiqueId) == Some(&Value::Text(dakar.id.clone())))
        .unwrap();
    assert_eq!(dakar_group.aggregates.count_all, Some(2));
    assert_eq!(
        dakar_group.aggregates.sum(StockColumn::Quantity),
        Some(dec!(10))
    );
}

#[tokio::test]
async fn relation_filter_finds_boutiques_with_low_stock() {
    let db = setup().await;
    let dakar = boutique(&db, "DKR-01").await;
    let thies = boutique(&db, "THS-01").await;
    let p = product(&db, "P-1", Money::new(dec!(100))).await;
    stock(&db, &dakar.id, &p.id, 2).await;
    stock(&db, &thies.id, &p.id, 50).await;

    let low = db
        .boutiques()
        .find_many(FindMany::new().filter(BoutiqueColumn::STOCKS.some(StockColumn::Quantity.lt(5))))
        .await
        .unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].code, "DKR-01");
}

// =============================================================================
// Workflows
// =============================================================================

#[tokio::test]
async fn record_sale_decrements_stock_and_is_idempotent() {
    let db = setup().await;
    let b = boutique(&db, "DKR-01").await;
    let u = cashier(&db, "caisse@vitrine.sn").await;
    let p = product(&db, "BOI-BIS-0001", Money::new(dec!(500))).await;
    stock(&db, &b.id, &p.id, 10).await;

    let mut sale = order(&b.id, &u.id, &p.id, 3);
    sale.offline_id = Some("REG1-000001".to_string());

    let first = db.sale_repo().record_sale(sale.clone()).await.unwrap();
    assert_eq!(first.sale.total.amount(), dec!(1500));
    assert_eq!(first.sale.currency, "XOF");
    assert_eq!(first.items.len(), 1);
    assert_eq!(first.payments.len(), 1);
    assert!(first.balance_due().is_zero());

    let replay = db.sale_repo().record_sale(sale).await.unwrap();
    assert_eq!(replay.sale.id, first.sale.id);

    assert_eq!(db.stock_repo().level(&b.id, &p.id).await.unwrap(), 7);
    assert_eq!(db.sales().count(Filter::everything()).await.unwrap(), 1);
    assert!(db
        .sales()
        .find_unique(SaleKey::OfflineId("REG1-000001".to_string()))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn insufficient_stock_rolls_back_the_whole_sale() {
    let db = setup().await;
    let b = boutique(&db, "DKR-01").await;
    let u = cashier(&db, "caisse@vitrine.sn").await;
    let p1 = product(&db, "P-1", Money::new(dec!(500))).await;
    let p2 = product(&db, "P-2", Money::new(dec!(500))).await;
    stock(&db, &b.id, &p1.id, 10).await;
    stock(&db, &b.id, &p2.id, 1).await;

    let mut sale = order(&b.id, &u.id, &p1.id, 2);
    sale.items.push(NewSaleLine {
        product_id: p2.id.clone(),
        quantity: 5,
        unit_price: Money::new(dec!(500)),
        discount: Money::zero(),
    });

    let err = db.sale_repo().record_sale(sale).await.unwrap_err();
    assert!(
        matches!(
            err,
            DbError::Core(CoreError::InsufficientStock { available: 1, .. })
        ),
        "got {:?}",
        err
    );

    // The first line's decrement was undone with the rest.
    assert_eq!(db.stock_repo().level(&b.id, &p1.id).await.unwrap(), 10);
    assert_eq!(db.sales().count(Filter::everything()).await.unwrap(), 0);
    assert_eq!(db.sale_items().count(Filter::everything()).await.unwrap(), 0);
}

#[tokio::test]
async fn void_sale_restocks_once() {
    let db = setup().await;
    let b = boutique(&db, "DKR-01").await;
    let u = cashier(&db, "caisse@vitrine.sn").await;
    let p = product(&db, "P-1", Money::new(dec!(500))).await;
    stock(&db, &b.id, &p.id, 5).await;

    let details = db
        .sale_repo()
        .record_sale(order(&b.id, &u.id, &p.id, 2))
        .await
        .unwrap();
    let voided = db.sale_repo().void_sale(&details.sale.id).await.unwrap();
    assert_eq!(voided.status, SALE_STATUS_VOIDED);
    assert_eq!(db.stock_repo().level(&b.id, &p.id).await.unwrap(), 5);

    let err = db.sale_repo().void_sale(&details.sale.id).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::Core(CoreError::InvalidSaleStatus { .. })
    ));
    assert_eq!(db.stock_repo().level(&b.id, &p.id).await.unwrap(), 5);
}

#[tokio::test]
async fn adjust_never_goes_below_zero() {
    let db = setup().await;
    let b = boutique(&db, "DKR-01").await;
    let p = product(&db, "P-1", Money::new(dec!(500))).await;

    let created = db.stock_repo().adjust(&b.id, &p.id, 3).await.unwrap();
    assert_eq!(created.quantity, 3);

    let err = db.stock_repo().adjust(&b.id, &p.id, -4).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::Core(CoreError::InsufficientStock { available: 3, .. })
    ));

    let after = db.stock_repo().adjust(&b.id, &p.id, -3).await.unwrap();
    assert_eq!(after.quantity, 0);
}

#[tokio::test]
async fn authenticate_checks_password_and_status() {
    let db = setup().await;
    let u = cashier(&db, "caisse@vitrine.sn").await;
    let users = db.user_repo();

    let signed_in = users
        .authenticate("Caisse@Vitrine.sn", "mot-de-passe-123")
        .await
        .unwrap();
    assert_eq!(signed_in.id, u.id);
    assert!(signed_in.last_login_at.is_some());

    let err = users
        .authenticate("caisse@vitrine.sn", "mauvais")
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Core(CoreError::InvalidCredentials)));

    users.set_status(&u.id, "disabled").await.unwrap();
    let err = users
        .authenticate("caisse@vitrine.sn", "mot-de-passe-123")
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Core(CoreError::UserInactive { .. })));
}

// =============================================================================
// Transactions and raw SQL
// =============================================================================

#[tokio::test]
async fn dropped_transaction_rolls_back() {
    let db = setup().await;
    {
        let mut tx = db.transaction().await.unwrap();
        tx.boutiques()
            .create(NewBoutique {
                name: "Ephemere".to_string(),
                code: "TMP-01".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        // Dropped without commit.
    }

    let found = db
        .boutiques()
        .find_unique(BoutiqueKey::Code("TMP-01".to_string()))
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn committed_transaction_is_visible() {
    let db = setup().await;
    let mut tx = db.transaction().await.unwrap();
    let b = tx
        .boutiques()
        .create(NewBoutique {
            name: "Plateau".to_string(),
            code: "DKR-01".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let p = tx
        .products()
        .create(NewProduct {
            sku: "P-1".to_string(),
            name: "Bissap".to_string(),
            price: Money::new(dec!(300)),
            ..Default::default()
        })
        .await
        .unwrap();
    tx.stocks()
        .upsert(
            StockKey::pair(&b.id, &p.id),
            NewStock {
                boutique_id: b.id.clone(),
                product_id: p.id.clone(),
                quantity: Some(8),
                ..Default::default()
            },
            Changes::new().increment(StockColumn::Quantity, 8),
        )
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(db.stock_repo().level(&b.id, &p.id).await.unwrap(), 8);
}

#[tokio::test]
async fn raw_queries_return_json_rows() {
    let db = setup().await;
    product(&db, "P-1", Money::new(dec!(12.50))).await;

    let rows = db
        .query_raw(
            r#"SELECT "sku", "price", "isActive" FROM "Product" WHERE "sku" = ?"#,
            vec![Value::from("P-1")],
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["sku"], "P-1");
    assert_eq!(rows[0]["price"], "12.50");
    assert_eq!(rows[0]["isActive"], 1);

    let changed = db
        .execute_raw(
            r#"UPDATE "Product" SET "category" = ? WHERE "sku" = ?"#,
            vec![Value::from("boissons"), Value::from("P-1")],
        )
        .await
        .unwrap();
    assert_eq!(changed, 1);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_replays_of_one_offline_sale_record_it_once() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(DbConfig::new(dir.path().join("vitrine.db")))
        .await
        .unwrap();
    let b = boutique(&db, "DKR-01").await;
    let u = cashier(&db, "caisse@vitrine.sn").await;
    let p = product(&db, "BOI-BIS-0001", Money::new(dec!(500))).await;
    stock(&db, &b.id, &p.id, 100).await;

    for round in 0..10 {
        let mut sale = order(&b.id, &u.id, &p.id, 1);
        sale.offline_id = Some(format!("REG1-{:06}", round));

        let register = |sale: NewSaleOrder| {
            let db = db.clone();
            tokio::spawn(async move { db.sale_repo().record_sale(sale).await })
        };
        let first = register(sale.clone());
        let second = register(sale);

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();
        assert_eq!(first.sale.id, second.sale.id, "round {}", round);
    }

    assert_eq!(db.stock_repo().level(&b.id, &p.id).await.unwrap(), 90);
    assert_eq!(db.sales().count(Filter::everything()).await.unwrap(), 10);
}

// =============================================================================
// Normalisation
// =============================================================================

#[tokio::test]
async fn email_updates_are_normalized_and_stay_unique() {
    let db = setup().await;
    cashier(&db, "awa@shop.sn").await;
    let bob = cashier(&db, "bob@shop.sn").await;

    let err = db
        .users()
        .update(
            UserKey::Id(bob.id.clone()),
            Changes::new().set(UserColumn::Email, "AWA@shop.sn"),
        )
        .await
        .unwrap_err();
    assert!(err.is_unique_violation(), "got {:?}", err);

    let updated = db
        .users()
        .update(
            UserKey::Id(bob.id.clone()),
            Changes::new().set(UserColumn::Email, " Bob2@Shop.sn "),
        )
        .await
        .unwrap();
    assert_eq!(updated.email, "bob2@shop.sn");

    // The column itself ignores case, even for writes around the delegate.
    let err = db
        .execute_raw(
            r#"UPDATE "User" SET "email" = ? WHERE "id" = ?"#,
            vec![Value::from("AWA@SHOP.SN"), Value::from(bob.id.as_str())],
        )
        .await
        .unwrap_err();
    assert!(err.is_unique_violation(), "got {:?}", err);
}

#[tokio::test]
async fn sku_and_code_lookups_are_trimmed_like_inserts() {
    let db = setup().await;
    let p = product(&db, " BISSAP-1L ", Money::new(dec!(1000))).await;
    assert_eq!(p.sku, "BISSAP-1L");
    boutique(&db, "DKR-01 ").await;

    let found = db
        .products()
        .find_unique(ProductKey::Sku(" BISSAP-1L".to_string()))
        .await
        .unwrap();
    assert_eq!(found.map(|f| f.id), Some(p.id.clone()));
    assert!(db
        .boutiques()
        .find_unique(BoutiqueKey::Code(" DKR-01".to_string()))
        .await
        .unwrap()
        .is_some());

    let renamed = db
        .products()
        .update(
            ProductKey::Id(p.id),
            Changes::new().set(ProductColumn::Sku, "  BISSAP-50CL "),
        )
        .await
        .unwrap();
    assert_eq!(renamed.sku, "BISSAP-50CL");
}

#[tokio::test]
async fn stored_timestamps_share_one_text_layout() {
    let db = setup().await;
    product(&db, "P-1", Money::new(dec!(100))).await;
    db.execute_raw(
        r#"INSERT INTO "AuditLog" ("id", "action", "resource") VALUES (?, ?, ?)"#,
        vec![Value::from("a-1"), Value::from("seed"), Value::from("Product")],
    )
    .await
    .unwrap();

    // 2024-05-01T09:30:00.125Z
    let assert_layout = |text: &str| {
        assert_eq!(text.len(), 24, "{}", text);
        assert!(text.ends_with('Z'), "{}", text);
        assert_eq!(&text[19..20], ".", "{}", text);
    };

    let bound = db
        .query_raw(r#"SELECT "createdAt", "updatedAt" FROM "Product""#, vec![])
        .await
        .unwrap();
    assert_layout(bound[0]["createdAt"].as_str().unwrap());
    assert_layout(bound[0]["updatedAt"].as_str().unwrap());

    let defaulted = db
        .query_raw(r#"SELECT "createdAt" FROM "AuditLog""#, vec![])
        .await
        .unwrap();
    assert_layout(defaulted[0]["createdAt"].as_str().unwrap());
}

// =============================================================================
// Arithmetic bounds
// =============================================================================

#[tokio::test]
async fn adjust_rejects_a_delta_without_a_negation() {
    let db = setup().await;
    let b = boutique(&db, "DKR-01").await;
    let p = product(&db, "P-1", Money::new(dec!(500))).await;
    db.stock_repo().adjust(&b.id, &p.id, 3).await.unwrap();

    let err = db
        .stock_repo()
        .adjust(&b.id, &p.id, i64::MIN)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidArgument(_)), "got {:?}", err);
    assert_eq!(db.stock_repo().level(&b.id, &p.id).await.unwrap(), 3);
}

#[tokio::test]
async fn oversized_prices_are_rejected_before_any_arithmetic() {
    let db = setup().await;
    let b = boutique(&db, "DKR-01").await;
    let u = cashier(&db, "caisse@vitrine.sn").await;
    let p = product(&db, "P-1", Money::new(dec!(500))).await;
    stock(&db, &b.id, &p.id, 10).await;

    let mut sale = order(&b.id, &u.id, &p.id, 2);
    sale.items[0].unit_price = Money::new(Decimal::MAX);

    let err = db.sale_repo().record_sale(sale).await.unwrap_err();
    assert!(
        matches!(
            err,
            DbError::Core(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ),
        "got {:?}",
        err
    );
    assert_eq!(db.stock_repo().level(&b.id, &p.id).await.unwrap(), 10);
}

#[tokio::test]
async fn decimal_arithmetic_updates_are_exact() {
    let db = setup().await;
    let p1 = product(&db, "P-1", Money::new(dec!(12.50))).await;
    let p2 = product(&db, "P-2", Money::new(dec!(0.10))).await;

    let updated = db
        .products()
        .update(
            ProductKey::Id(p1.id.clone()),
            Changes::new().increment(ProductColumn::Price, dec!(0.10)),
        )
        .await
        .unwrap();
    assert_eq!(updated.price.amount(), dec!(12.60));

    let n = db
        .products()
        .update_many(
            ProductColumn::Sku.starts_with("P-"),
            Changes::new().multiply(ProductColumn::Price, 3),
        )
        .await
        .unwrap();
    assert_eq!(n, 2);

    let read = |id: String| {
        let db = db.clone();
        async move {
            db.products()
                .find_unique_or_throw(ProductKey::Id(id))
                .await
                .unwrap()
                .price
                .amount()
        }
    };
    assert_eq!(read(p1.id.clone()).await, dec!(37.80));
    assert_eq!(read(p2.id.clone()).await, dec!(0.30));

    let mut tx = db.transaction().await.unwrap();
    tx.products()
        .update(
            ProductKey::Id(p1.id.clone()),
            Changes::new().decrement(ProductColumn::Price, dec!(0.80)),
        )
        .await
        .unwrap();
    tx.commit().await.unwrap();
    assert_eq!(read(p1.id.clone()).await, dec!(37.00));

    let err = db
        .products()
        .update(
            ProductKey::Id(p1.id),
            Changes::new().divide(ProductColumn::Price, dec!(0)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidArgument(_)), "got {:?}", err);
}

// =============================================================================
// Aggregates in SQL
// =============================================================================

#[tokio::test]
async fn aggregate_window_and_empty_results() {
    let db = setup().await;
    let b = boutique(&db, "DKR-01").await;
    for (i, quantity) in [1, 2, 3, 4, 5].into_iter().enumerate() {
        let p = product(&db, &format!("P-{}", i), Money::new(dec!(100))).await;
        stock(&db, &b.id, &p.id, quantity).await;
    }

    let top_two = db
        .stocks()
        .aggregate(
            Aggregate::new()
                .order_by(StockColumn::Quantity, Direction::Desc)
                .take(2)
                .count_all()
                .sum(StockColumn::Quantity)
                .avg(StockColumn::Quantity)
                .min(StockColumn::Quantity),
        )
        .await
        .unwrap();
    assert_eq!(top_two.count_all, Some(2));
    assert_eq!(top_two.sum(StockColumn::Quantity), Some(dec!(9)));
    assert_eq!(top_two.avg(StockColumn::Quantity), Some(dec!(4.5)));
    assert_eq!(top_two.min(StockColumn::Quantity), Some(&Value::Int(4)));

    let nothing = db
        .stocks()
        .aggregate(
            Aggregate::new()
                .filter(StockColumn::Quantity.gt(100))
                .count_all()
                .sum(StockColumn::Quantity)
                .max(StockColumn::UpdatedAt),
        )
        .await
        .unwrap();
    assert_eq!(nothing.count_all, Some(0));
    assert_eq!(nothing.sum(StockColumn::Quantity), None);
    assert_eq!(nothing.max(StockColumn::UpdatedAt), Some(&Value::Null));
}

#[tokio::test]
async fn equal_decimals_fall_into_one_group() {
    let db = setup().await;
    product(&db, "P-1", Money::new(dec!(1.0))).await;
    product(&db, "P-2", Money::new(dec!(1.00))).await;
    product(&db, "P-3", Money::new(dec!(2))).await;

    let groups = db
        .products()
        .group_by(
            GroupBy::new([ProductColumn::Price])
                .count_all()
                .order_by(ProductColumn::Price, Direction::Asc),
        )
        .await
        .unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].get(ProductColumn::Price), Some(&Value::Decimal(dec!(1))));
    assert_eq!(groups[0].aggregates.count_all, Some(2));
    assert_eq!(groups[1].aggregates.count_all, Some(1));
}

// =============================================================================
// Reads
// =============================================================================

#[tokio::test]
async fn find_first_follows_the_order() {
    let db = setup().await;
    product(&db, "P-1", Money::new(dec!(100))).await;
    product(&db, "P-2", Money::new(dec!(250))).await;
    product(&db, "P-3", Money::new(dec!(900))).await;

    let cheapest_over_200 = db
        .products()
        .find_first(
            FindMany::new()
                .filter(ProductColumn::Price.gte(dec!(200)))
                .order_by(ProductColumn::Price, Direction::Asc),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cheapest_over_200.sku, "P-2");

    let priciest = db
        .products()
        .find_first_or_throw(FindMany::new().order_by(ProductColumn::Price, Direction::Desc))
        .await
        .unwrap();
    assert_eq!(priciest.sku, "P-3");

    let err = db
        .products()
        .find_first_or_throw(FindMany::new().filter(ProductColumn::Sku.equals("NOPE")))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn low_stock_and_recent_sales_are_ordered() {
    let db = setup().await;
    let b = boutique(&db, "DKR-01").await;
    let u = cashier(&db, "caisse@vitrine.sn").await;
    let p1 = product(&db, "P-1", Money::new(dec!(100))).await;
    let p2 = product(&db, "P-2", Money::new(dec!(100))).await;
    let p3 = product(&db, "P-3", Money::new(dec!(100))).await;
    stock(&db, &b.id, &p1.id, 4).await;
    stock(&db, &b.id, &p2.id, 50).await;
    stock(&db, &b.id, &p3.id, 2).await;

    let low = db.stock_repo().low_stock(&b.id, 5).await.unwrap();
    let quantities: Vec<i64> = low.iter().map(|s| s.quantity).collect();
    assert_eq!(quantities, vec![2, 4]);

    let start = Utc::now() - Duration::hours(1);
    for minutes in 0..3 {
        db.sales()
            .create(NewSale {
                boutique_id: b.id.clone(),
                cashier_user_id: u.id.clone(),
                total: Money::new(dec!(100)),
                payment_method: "cash".to_string(),
                created_at: Some(start + Duration::minutes(minutes)),
                offline_id: Some(format!("REG1-{}", minutes)),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let recent = db.sale_repo().recent(&b.id, 2).await.unwrap();
    let ids: Vec<Option<String>> = recent.into_iter().map(|s| s.offline_id).collect();
    assert_eq!(
        ids,
        vec![Some("REG1-2".to_string()), Some("REG1-1".to_string())]
    );
}

// =============================================================================
// Workflows (continued)
// =============================================================================

#[tokio::test]
async fn receive_records_the_delivery_and_adds_stock() {
    let db = setup().await;
    let b = boutique(&db, "DKR-01").await;
    let u = cashier(&db, "magasin@vitrine.sn").await;
    let p1 = product(&db, "P-1", Money::new(dec!(500))).await;
    let p2 = product(&db, "P-2", Money::new(dec!(300))).await;
    stock(&db, &b.id, &p1.id, 2).await;
    let supplier = db
        .suppliers()
        .create(NewSupplier {
            name: "Sandaga Gros".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let received = db
        .stock_repo()
        .receive(NewStockReceipt {
            boutique_id: b.id.clone(),
            supplier_id: Some(supplier.id.clone()),
            reference: Some("BL-2024-001".to_string()),
            created_by_user_id: u.id.clone(),
            items: vec![
                NewReceiptLine {
                    product_id: p1.id.clone(),
                    quantity: 10,
                    unit_cost: Money::new(dec!(300)),
                },
                NewReceiptLine {
                    product_id: p2.id.clone(),
                    quantity: 4,
                    unit_cost: Money::new(dec!(150.50)),
                },
            ],
        })
        .await
        .unwrap();

    assert_eq!(received.items.len(), 2);
    assert_eq!(received.entry.supplier_id, Some(supplier.id));
    assert_eq!(received.items[1].unit_cost.amount(), dec!(150.50));
    assert_eq!(db.stock_repo().level(&b.id, &p1.id).await.unwrap(), 12);
    // No Stock row existed for P-2.
    assert_eq!(db.stock_repo().level(&b.id, &p2.id).await.unwrap(), 4);
    assert_eq!(
        db.stock_entry_items()
            .count(StockEntryItemColumn::StockEntryId.equals(&received.entry.id))
            .await
            .unwrap(),
        2
    );
}

#[tokio::test]
async fn split_payments_are_recorded_and_must_match() {
    let db = setup().await;
    let b = boutique(&db, "DKR-01").await;
    let u = cashier(&db, "caisse@vitrine.sn").await;
    let p = product(&db, "P-1", Money::new(dec!(500))).await;
    stock(&db, &b.id, &p.id, 10).await;

    let mut sale = order(&b.id, &u.id, &p.id, 3);
    sale.payments = vec![
        NewPaymentLine {
            method: "cash".to_string(),
            amount: Money::new(dec!(1000)),
            reference: None,
        },
        NewPaymentLine {
            method: "mobile_money".to_string(),
            amount: Money::new(dec!(500)),
            reference: Some("OM-778".to_string()),
        },
    ];
    let details = db.sale_repo().record_sale(sale).await.unwrap();
    assert_eq!(details.payments.len(), 2);

    let sales = db.sale_repo();
    assert_eq!(
        sales.total_paid(&details.sale.id).await.unwrap().amount(),
        dec!(1500)
    );
    assert!(sales.balance_due(&details.sale.id).await.unwrap().is_zero());

    db.payments()
        .delete_many(PaymentColumn::Method.equals("mobile_money"))
        .await
        .unwrap();
    assert_eq!(
        sales.balance_due(&details.sale.id).await.unwrap().amount(),
        dec!(500)
    );

    let mut short = order(&b.id, &u.id, &p.id, 1);
    short.payments = vec![NewPaymentLine {
        method: "cash".to_string(),
        amount: Money::new(dec!(400)),
        reference: None,
    }];
    let err = sales.record_sale(short).await.unwrap_err();
    assert!(
        matches!(err, DbError::Core(CoreError::PaymentMismatch { .. })),
        "got {:?}",
        err
    );
    assert_eq!(db.stock_repo().level(&b.id, &p.id).await.unwrap(), 7);
}

#[tokio::test]
async fn product_on_a_sale_cannot_be_deleted() {
    let db = setup().await;
    let b = boutique(&db, "DKR-01").await;
    let u = cashier(&db, "caisse@vitrine.sn").await;
    let p = product(&db, "P-1", Money::new(dec!(500))).await;
    stock(&db, &b.id, &p.id, 5).await;
    db.sale_repo()
        .record_sale(order(&b.id, &u.id, &p.id, 1))
        .await
        .unwrap();

    let err = db
        .products()
        .delete(ProductKey::Id(p.id.clone()))
        .await
        .unwrap_err();
    assert!(err.is_foreign_key_violation(), "got {:?}", err);
    // The failed delete did not cascade to stock either.
    assert_eq!(db.stock_repo().level(&b.id, &p.id).await.unwrap(), 4);
}

#[tokio::test]
async fn audit_trail_reads_by_resource_and_actor() {
    let db = setup().await;
    let u = cashier(&db, "caisse@vitrine.sn").await;
    let audit = db.audit_repo();

    let start = Utc::now() - Duration::minutes(10);
    for (i, action) in ["sale.create", "sale.void"].into_iter().enumerate() {
        audit
            .record(NewAuditLog {
                actor_id: Some(u.id.clone()),
                role: Some("employee".to_string()),
                action: action.to_string(),
                resource: "Sale".to_string(),
                resource_id: Some("s-1".to_string()),
                created_at: Some(start + Duration::minutes(i as i64)),
                ..Default::default()
            })
            .await
            .unwrap();
    }
    audit
        .record(NewAuditLog {
            actor_id: Some("someone-else".to_string()),
            action: "user.login".to_string(),
            resource: "User".to_string(),
            resource_id: Some(u.id.clone()),
            ..Default::default()
        })
        .await
        .unwrap();

    let trail = audit.for_resource("Sale", "s-1").await.unwrap();
    let actions: Vec<&str> = trail.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, vec!["sale.void", "sale.create"]);

    let latest = audit.by_actor(&u.id, 1).await.unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].action, "sale.void");
}

#[tokio::test]
async fn every_none_and_is_not_relation_filters() {
    let db = setup().await;
    let b = boutique(&db, "DKR-01").await;
    let u = cashier(&db, "caisse@vitrine.sn").await;
    let p = product(&db, "P-1", Money::new(dec!(500))).await;
    let retired = db
        .products()
        .create(NewProduct {
            sku: "P-OLD".to_string(),
            name: "Ancien".to_string(),
            price: Money::new(dec!(100)),
            is_active: Some(false),
            ..Default::default()
        })
        .await
        .unwrap();
    stock(&db, &b.id, &p.id, 10).await;
    stock(&db, &b.id, &retired.id, 3).await;

    let cash_only = db
        .sale_repo()
        .record_sale(order(&b.id, &u.id, &p.id, 1))
        .await
        .unwrap();
    let mut split = order(&b.id, &u.id, &p.id, 2);
    split.payments = vec![
        NewPaymentLine {
            method: "cash".to_string(),
            amount: Money::new(dec!(600)),
            reference: None,
        },
        NewPaymentLine {
            method: "mobile_money".to_string(),
            amount: Money::new(dec!(400)),
            reference: None,
        },
    ];
    db.sale_repo().record_sale(split).await.unwrap();

    let all_cash = db
        .sales()
        .find_many(
            FindMany::new().filter(SaleColumn::PAYMENTS.every(PaymentColumn::Method.equals("cash"))),
        )
        .await
        .unwrap();
    assert_eq!(all_cash.len(), 1);
    assert_eq!(all_cash[0].id, cash_only.sale.id);

    let no_mobile = db
        .sales()
        .find_many(
            FindMany::new()
                .filter(SaleColumn::PAYMENTS.none(PaymentColumn::Method.equals("mobile_money"))),
        )
        .await
        .unwrap();
    assert_eq!(no_mobile.len(), 1);
    assert_eq!(no_mobile[0].id, cash_only.sale.id);

    let inactive_stock = db
        .stocks()
        .find_many(
            FindMany::new()
                .filter(StockColumn::PRODUCT.is_not(ProductColumn::IsActive.equals(true))),
        )
        .await
        .unwrap();
    assert_eq!(inactive_stock.len(), 1);
    assert_eq!(inactive_stock[0].product_id, retired.id);
}
