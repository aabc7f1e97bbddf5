//! Introspection and constraint extraction against a real SQLite file.

use std::sync::Arc;

use shopdash_core::config::{DatabaseConfig, DatabaseEngine};
use shopdash_core::error::ErrorKind;
use shopdash_core::types::{CellValue, Credentials};
use shopdash_database::{
    ConstraintExtractor, Connector, Dialect, EngineIntrospector, SchemaIntrospector, Statement,
};

async fn seeded_connector(dir: &tempfile::TempDir) -> Arc<Connector> {
    let path = dir.path().join("shop.db");
    std::fs::File::create(&path).unwrap();

    let connector = Arc::new(Connector::new(DatabaseConfig {
        engine: DatabaseEngine::Sqlite,
        path: path.to_string_lossy().into_owned(),
        host: "localhost".into(),
        port: 3306,
        name: String::new(),
        default_username: String::new(),
        default_password: String::new(),
        connect_timeout_seconds: 5,
    }));

    let mut conn = connector.connect(&Credentials::new("", "")).await.unwrap();
    for ddl in [
        "CREATE TABLE customer (
            CustomerID INTEGER PRIMARY KEY AUTOINCREMENT,
            FirstName TEXT NOT NULL,
            Gender TEXT CHECK(Gender IN ('Male', 'Female')),
            DOB DATE,
            Country TEXT DEFAULT 'VN'
        )",
        "CREATE TABLE productDiscount (
            ProductID INTEGER NOT NULL,
            DiscountID INTEGER NOT NULL,
            PRIMARY KEY (ProductID, DiscountID)
        )",
        "CREATE TABLE audit_log (Entry TEXT, CreatedAt TEXT)",
        "CREATE VIEW customer_names AS SELECT FirstName FROM customer",
    ] {
        conn.execute(&Statement::raw(ddl)).await.unwrap();
    }
    conn.close().await;
    connector
}

#[tokio::test]
async fn test_lists_tables_and_views_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let introspector = EngineIntrospector::new(seeded_connector(&dir).await);

    let names = introspector
        .table_names(&Credentials::new("", ""))
        .await
        .unwrap();
    assert_eq!(
        names,
        vec!["audit_log", "customer", "customer_names", "productDiscount"]
    );
}

#[tokio::test]
async fn test_describes_columns_and_keys() {
    let dir = tempfile::tempdir().unwrap();
    let introspector = EngineIntrospector::new(seeded_connector(&dir).await);
    let creds = Credentials::new("", "");

    let customer = introspector.describe_table(&creds, "customer").await.unwrap();
    assert_eq!(customer.primary_key, vec!["CustomerID"]);
    assert_eq!(customer.auto_increment_key().unwrap().name, "CustomerID");
    assert!(customer.column("FirstName").unwrap().is_required());
    assert!(!customer.column("Country").unwrap().is_required());
    assert!(customer.column("DOB").unwrap().nullable);

    let link = introspector
        .describe_table(&creds, "productDiscount")
        .await
        .unwrap();
    assert_eq!(link.primary_key, vec!["ProductID", "DiscountID"]);
    assert!(link.auto_increment_key().is_none());

    let log = introspector.describe_table(&creds, "audit_log").await.unwrap();
    assert_eq!(log.primary_key, vec!["Entry"]);
}

#[tokio::test]
async fn test_unknown_table_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let introspector = EngineIntrospector::new(seeded_connector(&dir).await);

    let err = introspector
        .describe_table(&Credentials::new("", ""), "customer; DROP TABLE customer")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_enumerations_come_from_stored_definition() {
    let dir = tempfile::tempdir().unwrap();
    let introspector: Arc<dyn SchemaIntrospector> =
        Arc::new(EngineIntrospector::new(seeded_connector(&dir).await));
    let extractor = ConstraintExtractor::new(introspector);
    let creds = Credentials::new("", "");

    assert_eq!(
        extractor.enumerated_values(&creds, "customer", "Gender").await,
        Some(vec!["Male".to_string(), "Female".to_string()])
    );
    assert_eq!(
        extractor.enumerated_values(&creds, "customer", "FirstName").await,
        None
    );
    assert_eq!(
        extractor.enumerated_values(&creds, "no_such_table", "Gender").await,
        None
    );

    let all = extractor
        .enumerations_for(
            &creds,
            "customer",
            &["Gender".to_string(), "DOB".to_string()],
        )
        .await;
    assert_eq!(all.len(), 1);
    assert!(all.contains_key("Gender"));
}

#[tokio::test]
async fn test_insert_then_select_round_trips_values() {
    let dir = tempfile::tempdir().unwrap();
    let connector = seeded_connector(&dir).await;
    let mut conn = connector.connect(&Credentials::new("", "")).await.unwrap();

    let insert = Statement::insert(
        Dialect::Sqlite,
        "customer",
        &[
            ("FirstName".into(), CellValue::Text("Ana".into())),
            ("Gender".into(), CellValue::Text("Female".into())),
            ("DOB".into(), CellValue::Null),
        ],
    )
    .unwrap();
    assert_eq!(conn.execute(&insert).await.unwrap(), 1);

    let snapshot = conn
        .fetch(&Statement::select_all(Dialect::Sqlite, "customer"))
        .await
        .unwrap();
    conn.close().await;

    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.value(0, "CustomerID"), Some(&CellValue::Integer(1)));
    assert_eq!(snapshot.value(0, "FirstName"), Some(&CellValue::Text("Ana".into())));
    assert_eq!(snapshot.value(0, "DOB"), Some(&CellValue::Null));
    assert_eq!(snapshot.value(0, "Country"), Some(&CellValue::Text("VN".into())));
}
