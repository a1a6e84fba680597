// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Table store against a live MySQL server.
//!
//! Set `MYSQL_TEST_URL` (e.g. `mysql://root:pw@127.0.0.1:3306/test`) to run.

use portfolio_server::db::TableStore;
use portfolio_server::models::Record;
use serde_json::{json, Value};
use sqlx::mysql::MySqlPool;

const TABLE: &str = "table_store_roundtrip";

/// Skip the test with a message when no server is configured.
macro_rules! require_mysql {
    () => {
        match std::env::var("MYSQL_TEST_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("⚠️  Skipping: MYSQL_TEST_URL not set");
                return;
            }
        }
    };
}

fn record(value: Value) -> Record {
    value.as_object().unwrap().clone()
}

async fn create_table(pool: &MySqlPool) {
    sqlx::query(&format!("DROP TABLE IF EXISTS `{TABLE}`"))
        .execute(pool)
        .await
        .unwrap();
    sqlx::query(&format!(
        "CREATE TABLE `{TABLE}` (
            `Date` VARCHAR(32) NOT NULL,
            `Distance (miles)` DOUBLE NULL,
            `Calories` INT NULL,
            `PR` BOOLEAN NULL,
            `Weight` DECIMAL(8,2) NULL,
            `Begin` DATETIME NULL,
            `Day` DATE NULL
        )"
    ))
    .execute(pool)
    .await
    .unwrap();
}

#[tokio::test]
async fn test_replace_all_truncates_then_decodes_by_type() {
    let url = require_mysql!();
    let pool = MySqlPool::connect(&url).await.unwrap();
    create_table(&pool).await;
    sqlx::query(&format!(
        "INSERT INTO `{TABLE}` (`Date`) VALUES ('stale-1'), ('stale-2'), ('stale-3')"
    ))
    .execute(&pool)
    .await
    .unwrap();

    let columns: Vec<String> = ["Date", "Distance (miles)", "Calories", "PR", "Weight", "Begin", "Day"]
        .into_iter()
        .map(String::from)
        .collect();
    let rows = vec![
        record(json!({
            "Date": "2025-06-01 08:00:00",
            "Distance (miles)": 3.1,
            "Calories": 410,
            "PR": true,
            "Weight": 72.5,
            "Begin": "2025-06-01 08:00:00",
            "Day": "2025-06-01"
        })),
        // Missing fields are written as NULL.
        record(json!({"Date": "2025-06-02 08:00:00"})),
    ];

    let store = TableStore::new(&pool);
    assert_eq!(store.replace_all(TABLE, &columns, &rows).await.unwrap(), 2);

    let fetched = store.fetch_all(TABLE).await.unwrap();
    assert_eq!(fetched.len(), 2, "stale rows must be truncated");

    let first = fetched
        .iter()
        .find(|r| r["Date"] == "2025-06-01 08:00:00")
        .unwrap();
    assert_eq!(first["Distance (miles)"], json!(3.1));
    assert_eq!(first["Calories"], json!(410));
    assert_eq!(first["PR"], json!(1));
    assert_eq!(first["Weight"], json!(72.5));
    assert_eq!(first["Begin"], json!("2025-06-01 08:00:00"));
    assert_eq!(first["Day"], json!("2025-06-01"));

    let second = fetched
        .iter()
        .find(|r| r["Date"] == "2025-06-02 08:00:00")
        .unwrap();
    assert_eq!(second["Calories"], Value::Null);
    assert_eq!(second["PR"], Value::Null);

    // An empty replacement leaves the table empty.
    assert_eq!(store.replace_all(TABLE, &columns, &[]).await.unwrap(), 0);
    assert!(store.fetch_all(TABLE).await.unwrap().is_empty());
}
