//! Integration tests for the model against an in-memory driver.

mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde::Deserialize;

use common::{Executed, Journal, MemoryConnector, dsn, registry, user_row};
use quarry::prelude::*;

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    id: u64,
    name: String,
}

fn executed(sql: &str, args: Vec<QueryValue>) -> Executed {
    Executed {
        sql: sql.to_string(),
        args,
    }
}

#[tokio::test]
async fn test_select_renders_and_decodes() {
    let (registry, journal) = registry().await;
    journal.set_rows(vec![user_row(1, "ann"), user_row(2, "bob")]);

    let mut users = Model::new(registry, "t");
    let rows: Vec<User> = users
        .field(["id", "name"])
        .r#where("id > ?", values![0])
        .order([Order::desc("name")])
        .limit(Limit::new(1, 10))
        .select()
        .await
        .unwrap();

    assert_eq!(
        rows,
        vec![
            User { id: 1, name: "ann".into() },
            User { id: 2, name: "bob".into() },
        ]
    );
    assert_eq!(
        journal.statements(),
        vec![executed(
            "SELECT id,name FROM t WHERE id > ? ORDER BY name desc LIMIT 1, 10",
            values![0]
        )]
    );
    assert_eq!(users.last_sql(), journal.statements()[0].sql);
    assert!(!users.has_pending());
}

#[tokio::test]
async fn test_find_forces_single_row() {
    let (registry, journal) = registry().await;
    journal.set_rows(vec![user_row(7, "eve")]);

    let mut users = Model::new(registry, "users");
    let user: Option<User> = users
        .r#where("name = ?", values!["eve"])
        .limit(Limit::new(5, 50))
        .find()
        .await
        .unwrap();

    assert_eq!(user, Some(User { id: 7, name: "eve".into() }));
    assert_eq!(
        users.last_sql(),
        "SELECT * FROM users WHERE name = ? LIMIT 1"
    );
}

#[tokio::test]
async fn test_find_without_rows_returns_none() {
    let (registry, _journal) = registry().await;

    let mut users = Model::new(registry, "users");
    let user: Option<User> = users.find().await.unwrap();
    assert_eq!(user, None);
}

#[tokio::test]
async fn test_decode_failure_is_reported() {
    let (registry, journal) = registry().await;
    journal.set_rows(vec![serde_json::json!({ "id": "not a number", "name": "x" })]);

    let mut users = Model::new(registry, "users");
    let err = users.select::<User>().await.unwrap_err();
    assert_eq!(err.code, ErrorCode::DeserializationError);
    assert_eq!(users.errors().len(), 1);
}

#[tokio::test]
async fn test_join_and_page() {
    let (registry, _journal) = registry().await;

    let mut users = Model::new(registry, "users u");
    users
        .field(["u.id", "o.total"])
        .join(Join::with_type("orders o ON o.user_id = u.id", 2))
        .page(3, 20)
        .select::<serde_json::Value>()
        .await
        .unwrap();

    assert_eq!(
        users.last_sql(),
        "SELECT u.id,o.total FROM users u RIGHT JOIN orders o ON o.user_id = u.id LIMIT 40, 20"
    );
}

#[tokio::test]
async fn test_page_past_addressable_range() {
    let (registry, _journal) = registry().await;

    let mut users = Model::new(registry, "users");
    users
        .page(u64::MAX, 2)
        .select::<serde_json::Value>()
        .await
        .unwrap();

    assert_eq!(
        users.last_sql(),
        format!("SELECT * FROM users LIMIT {}, 2", u64::MAX)
    );
}

#[tokio::test]
async fn test_add_returns_generated_id() {
    let (registry, journal) = registry().await;

    let mut users = Model::new(registry, "users");
    let first = users.add(row! { "name" => "ann", "age" => 31 }).await.unwrap();
    let second = users.add(row! { "name" => "bob", "age" => 40 }).await.unwrap();

    assert_eq!((first, second), (1, 2));
    assert_eq!(
        journal.statements()[0],
        executed(
            "INSERT INTO users (name,age) VALUES (?,?)",
            values!["ann", 31]
        )
    );
}

#[tokio::test]
async fn test_add_all_commits_batch() {
    let (registry, journal) = registry().await;

    let mut users = Model::new(registry, "users");
    let inserted = users
        .add_all(vec![
            row! { "name" => "ann", "age" => 31 },
            row! { "age" => 40, "name" => "bob" },
        ])
        .await
        .unwrap();

    assert_eq!(inserted, 2);
    let state = journal.state();
    assert_eq!((state.commits, state.rollbacks), (1, 0));
    assert_eq!(
        state.statements,
        vec![
            executed("INSERT INTO users (name,age) VALUES (?,?)", values!["ann", 31]),
            executed("INSERT INTO users (name,age) VALUES (?,?)", values!["bob", 40]),
        ]
    );
}

#[tokio::test]
async fn test_add_all_rolls_back_on_failure() {
    let (registry, journal) = registry().await;
    journal.fail_on("dup");

    let mut users = Model::new(registry, "users");
    let err = users
        .add_all(vec![
            row! { "name" => "ann" },
            row! { "name" => "dup" },
            row! { "name" => "cat" },
        ])
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::DatabaseError);
    let state = journal.state();
    assert_eq!((state.commits, state.rollbacks), (0, 1));
    assert!(state.statements.is_empty());
}

#[tokio::test]
async fn test_add_all_rejects_inconsistent_rows() {
    let (registry, journal) = registry().await;

    let mut users = Model::new(registry, "users");
    let err = users
        .add_all(vec![row! { "name" => "ann" }, row! { "email" => "b@x" }])
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InconsistentFields);
    let state = journal.state();
    assert_eq!((state.commits, state.rollbacks), (0, 0));
}

#[tokio::test]
async fn test_update_flattens_args() {
    let (registry, journal) = registry().await;

    let mut users = Model::new(registry, "users");
    let affected = users
        .r#where("id = ?", values![9])
        .r#where("age > ?", values![18])
        .update(row! { "name" => "z", "age" => 20 })
        .await
        .unwrap();

    assert_eq!(affected, 1);
    assert_eq!(
        journal.statements(),
        vec![executed(
            "UPDATE users SET name = ?, age = ? WHERE id = ? AND age > ?",
            values!["z", 20, 9, 18]
        )]
    );
}

#[tokio::test]
async fn test_update_and_delete_require_condition() {
    let (registry, journal) = registry().await;

    let mut users = Model::new(registry, "users");
    let err = users.update(row! { "name" => "z" }).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::MissingCondition);

    let err = users.delete().await.unwrap_err();
    assert_eq!(err.code, ErrorCode::MissingCondition);

    assert!(journal.statements().is_empty());
    assert_eq!(users.errors().len(), 2);
}

#[tokio::test]
async fn test_delete_with_condition() {
    let (registry, journal) = registry().await;

    let mut users = Model::new(registry, "users");
    users.r#where("id = ?", values![3]).delete().await.unwrap();
    assert_eq!(
        journal.statements(),
        vec![executed("DELETE FROM users WHERE id = ?", values![3])]
    );
}

#[tokio::test]
async fn test_options_cleared_after_failure() {
    let (registry, _journal) = registry().await;

    let mut users = Model::new(registry, "users");
    users.field(["id"]).order([Order::asc("id")]);
    assert!(users.has_pending());

    users.update(Vec::new()).await.unwrap_err();
    assert!(!users.has_pending());

    users.select::<serde_json::Value>().await.unwrap();
    assert_eq!(users.last_sql(), "SELECT * FROM users");
}

#[tokio::test]
async fn test_rejected_where_fails_next_statement() {
    let (registry, journal) = registry().await;

    let mut users = Model::new(registry, "users");
    users.r#where("id = ?", values![1]).r#where("", values![2]);
    assert!(users.has_pending());
    assert_eq!(users.errors().len(), 1);

    let err = users.delete().await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ArgsWithoutCondition);
    assert!(journal.statements().is_empty());

    // The builder recovers once the discarded statement is gone.
    users.r#where("id = ?", values![1]).delete().await.unwrap();
    assert_eq!(journal.statements().len(), 1);
}

#[tokio::test]
async fn test_error_aggregation() {
    let (registry, _journal) = registry().await;

    let mut users = Model::new(registry, "users");
    assert!(users.error().is_none());

    users.delete().await.unwrap_err();
    users.update(Vec::new()).await.unwrap_err();

    let err = users.error().unwrap();
    assert_eq!(err.code, ErrorCode::MissingCondition);
    assert_eq!(err.context.related.len(), 2);

    users.clear_errors();
    assert!(users.errors().is_empty());
    assert!(users.error().is_none());
}

#[tokio::test]
async fn test_prefix_resolution() {
    let journal = Journal::default();
    let registry = Arc::new(Registry::new(MemoryConnector::new(journal.clone())));
    registry
        .connect([ConnectionConfig::new("default", dsn("db0").prefix("shop_"))])
        .await
        .unwrap();

    let mut orders = Model::new(registry.clone(), "orders");
    orders.select::<serde_json::Value>().await.unwrap();
    assert_eq!(orders.last_sql(), "SELECT * FROM shop_orders");

    orders.prefix("");
    orders.select::<serde_json::Value>().await.unwrap();
    assert_eq!(orders.last_sql(), "SELECT * FROM orders");

    let mut explicit = Model::new(registry, "ignored");
    explicit
        .table([Table::aliased("audit", "a")])
        .select::<serde_json::Value>()
        .await
        .unwrap();
    assert_eq!(explicit.last_sql(), "SELECT * FROM audit a");
}

#[tokio::test]
async fn test_unknown_alias_falls_back_to_default() {
    let (registry, journal) = registry().await;

    let mut users = Model::new(registry, "users");
    users.on("replica");
    assert_eq!(users.alias(), "replica");
    users.select::<serde_json::Value>().await.unwrap();
    assert_eq!(journal.statements().len(), 1);

    users.on("");
    assert_eq!(users.alias(), "default");
}

#[tokio::test]
async fn test_not_configured_without_default() {
    let journal = Journal::default();
    let registry = Arc::new(Registry::new(MemoryConnector::new(journal.clone())));
    registry
        .connect([ConnectionConfig::new("reports", dsn("db1"))])
        .await
        .unwrap();

    let mut users = Model::new(registry, "users");
    let err = users.select::<serde_json::Value>().await.unwrap_err();
    assert!(err.is_not_configured());
    assert!(journal.statements().is_empty());
}

#[tokio::test]
async fn test_closed_default_reopens_lazily() {
    let (registry, journal) = registry().await;
    registry.close(&["default"]).await.unwrap();
    assert!(!registry.is_open("default").await);

    let mut users = Model::new(registry.clone(), "users");
    users.select::<serde_json::Value>().await.unwrap();

    assert!(registry.is_open("default").await);
    assert_eq!(journal.statements().len(), 1);
}
