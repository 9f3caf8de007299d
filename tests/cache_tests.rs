// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use sql_template::{
    cache::{TemplateCache, cache_template, get_cached, prepare_cached},
    context::{ColumnMeta, DbType, PlaceholderContext},
    dialect::SqlDialect,
    template::prepare
};

fn ctx(dialect: SqlDialect) -> PlaceholderContext {
    PlaceholderContext::new(dialect.dialect(), "users")
        .with_column(ColumnMeta::from_property("Id", DbType::Int64, false))
}

#[test]
fn test_template_cache_new() {
    let cache = TemplateCache::new(100);
    assert!(cache.is_empty());
    assert!(cache.get("SELECT 1", &ctx(SqlDialect::Sqlite)).is_none());
}

#[test]
fn test_template_cache_insert_and_get() {
    let mut cache = TemplateCache::new(100);
    let ctx = ctx(SqlDialect::Sqlite);
    let prepared = Arc::new(prepare("SELECT {{columns}} FROM {{table}}", &ctx).unwrap());
    cache.insert("SELECT {{columns}} FROM {{table}}", &ctx, Arc::clone(&prepared));
    let cached = cache.get("SELECT {{columns}} FROM {{table}}", &ctx).unwrap();
    assert_eq!(cached.sql(), "SELECT [id] FROM [users]");
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_template_cache_keys_include_context() {
    let mut cache = TemplateCache::new(100);
    let sqlite = ctx(SqlDialect::Sqlite);
    let mysql = ctx(SqlDialect::MySql);
    let first = cache.get_or_prepare("SELECT * FROM {{table}}", &sqlite).unwrap();
    let second = cache.get_or_prepare("SELECT * FROM {{table}}", &mysql).unwrap();
    assert_eq!(first.sql(), "SELECT * FROM [users]");
    assert_eq!(second.sql(), "SELECT * FROM `users`");
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_template_cache_reuses_entry() {
    let mut cache = TemplateCache::new(100);
    let ctx = ctx(SqlDialect::Sqlite);
    let first = cache.get_or_prepare("SELECT * FROM {{table}}", &ctx).unwrap();
    let second = cache.get_or_prepare("SELECT * FROM {{table}}", &ctx).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_template_cache_does_not_store_errors() {
    let mut cache = TemplateCache::new(100);
    assert!(cache.get_or_prepare("SELECT {{bogus}}", &ctx(SqlDialect::Sqlite)).is_err());
    assert!(cache.is_empty());
}

#[test]
fn test_template_cache_eviction() {
    let mut cache = TemplateCache::new(3);
    let ctx = ctx(SqlDialect::Sqlite);
    for n in 1..=4 {
        cache
            .get_or_prepare(&format!("SELECT {} FROM {{{{table}}}}", n), &ctx)
            .unwrap();
    }
    assert!(cache.len() <= 3);
    assert!(cache.get("SELECT 4 FROM {{table}}", &ctx).is_some());
}

#[test]
fn test_global_cache_templates() {
    let ctx = ctx(SqlDialect::PostgreSql);
    let template = "SELECT global FROM {{table}}";
    let prepared = Arc::new(prepare(template, &ctx).unwrap());
    cache_template(template, &ctx, prepared);
    let cached = get_cached(template, &ctx).unwrap();
    assert_eq!(cached.sql(), "SELECT global FROM \"users\"");
}

#[test]
fn test_global_get_cached_miss() {
    let cached = get_cached("SELECT random_unique_template_xyz_123", &ctx(SqlDialect::Sqlite));
    assert!(cached.is_none());
}

#[test]
fn test_prepare_cached() {
    let ctx = ctx(SqlDialect::Db2);
    let first = prepare_cached("SELECT * FROM {{table}} -- cached", &ctx).unwrap();
    let second = prepare_cached("SELECT * FROM {{table}} -- cached", &ctx).unwrap();
    assert_eq!(first.sql(), second.sql());
    assert!(prepare_cached("{{nope}}", &ctx).is_err());
}
