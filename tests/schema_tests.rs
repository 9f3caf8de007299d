// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use sql_template::{
    context::DbType,
    dialect::SqlDialect,
    schema::Schema,
    template::prepare
};

#[test]
fn test_parse_simple_table() {
    let sql = "CREATE TABLE users (id INT PRIMARY KEY, name VARCHAR(255))";
    let schema = Schema::parse(sql, SqlDialect::Sqlite).unwrap();
    assert_eq!(schema.tables.len(), 1);
    assert!(schema.tables.contains_key("users"));
    let users = &schema.tables["users"];
    assert_eq!(users.columns.len(), 2);
    assert_eq!(users.columns[0].name, "id");
    assert!(users.columns[0].is_primary);
    assert_eq!(users.primary_key(), vec!["id"]);
}

#[test]
fn test_parse_multiple_tables() {
    let sql = r#"
        CREATE TABLE users (id INT PRIMARY KEY);
        CREATE TABLE orders (id INT PRIMARY KEY, user_id INT);
    "#;
    let schema = Schema::parse(sql, SqlDialect::PostgreSql).unwrap();
    assert_eq!(schema.tables.len(), 2);
    assert!(schema.table("users").is_some());
    assert!(schema.table("ORDERS").is_some());
    assert!(schema.single_table().is_none());
}

#[test]
fn test_parse_not_null() {
    let sql = "CREATE TABLE users (id INT NOT NULL, name VARCHAR(255))";
    let schema = Schema::parse(sql, SqlDialect::Sqlite).unwrap();
    let users = &schema.tables["users"];
    assert!(!users.columns[0].is_nullable);
    assert!(users.columns[1].is_nullable);
}

#[test]
fn test_parse_ignores_other_statements() {
    let sql = r#"
        CREATE TABLE users (id INT PRIMARY KEY, email VARCHAR(255));
        CREATE INDEX idx_email ON users(email);
    "#;
    let schema = Schema::parse(sql, SqlDialect::Sqlite).unwrap();
    assert_eq!(schema.single_table().unwrap().name, "users");
}

#[test]
fn test_parse_invalid_sql() {
    assert!(Schema::parse("CREATE TABLE (", SqlDialect::Sqlite).is_err());
}

#[test]
fn test_parse_quoted_names() {
    let sql = "CREATE TABLE \"order items\" (\"Id\" INT)";
    let schema = Schema::parse(sql, SqlDialect::PostgreSql).unwrap();
    let table = schema.single_table().unwrap();
    assert_eq!(table.name, "order items");
    assert_eq!(table.columns[0].name, "Id");
}

#[test]
fn test_to_context_keeps_column_order() {
    let sql = "CREATE TABLE items (id BIGINT PRIMARY KEY, display_name TEXT NOT NULL, price DECIMAL(10, 2), created_at TIMESTAMP)";
    let schema = Schema::parse(sql, SqlDialect::Sqlite).unwrap();
    let ctx = schema.table("items").unwrap().to_context(SqlDialect::Sqlite.dialect());
    let names: Vec<_> = ctx.columns.iter().map(|c| c.sql_name.as_str()).collect();
    assert_eq!(names, vec!["id", "display_name", "price", "created_at"]);
    assert_eq!(ctx.columns[1].property_name, "DisplayName");
    assert_eq!(ctx.columns[0].db_type, DbType::Int64);
    assert_eq!(ctx.columns[2].db_type, DbType::Decimal);
    assert!(!ctx.columns[1].nullable);

    let prepared = prepare("SELECT {{columns --exclude DisplayName}} FROM {{table}}", &ctx).unwrap();
    assert_eq!(
        prepared.sql(),
        "SELECT [id], [price], [created_at] FROM [items]"
    );
}
