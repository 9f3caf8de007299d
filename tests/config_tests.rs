use sql_template::{
    config::{CacheConfig, Config},
    dialect::SqlDialect
};

fn env<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
    move |key| {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert!(config.render.dialect.is_none());
    assert!(config.render.parameter_prefix.is_none());
    assert!(config.render.max_batch_size.is_none());
    assert!(!config.render.validate);
    assert_eq!(config.dialect().unwrap(), None);
}

#[test]
fn test_default_cache_config() {
    let config = CacheConfig::default();

    assert_eq!(config.max_entries, 1000);
}

#[test]
fn test_config_from_toml() {
    let config = Config::from_toml_str(
        r#"
[render]
dialect = "postgres"
parameter_prefix = "$"
max_batch_size = 500
validate = true

[cache]
max_entries = 64
"#
    )
    .unwrap();

    assert_eq!(config.dialect().unwrap(), Some(SqlDialect::PostgreSql));
    assert_eq!(config.render.parameter_prefix, Some('$'));
    assert_eq!(config.render.max_batch_size, Some(500));
    assert!(config.render.validate);
    assert_eq!(config.cache.max_entries, 64);
}

#[test]
fn test_config_sections_are_optional() {
    let config = Config::from_toml_str("[render]\nvalidate = true\n").unwrap();

    assert!(config.render.validate);
    assert_eq!(config.cache.max_entries, 1000);
}

#[test]
fn test_config_invalid_toml() {
    assert!(Config::from_toml_str("[render\ndialect = ").is_err());
}

#[test]
fn test_config_unknown_dialect() {
    let config = Config::from_toml_str("[render]\ndialect = \"access\"\n").unwrap();

    assert!(config.dialect().is_err());
}

#[test]
fn test_env_overrides_file() {
    let mut config = Config::from_toml_str("[render]\ndialect = \"mysql\"\n").unwrap();
    config
        .apply_env(env(&[
            ("SQL_TEMPLATE_DIALECT", "oracle"),
            ("SQL_TEMPLATE_PARAMETER_PREFIX", ":"),
            ("SQL_TEMPLATE_MAX_BATCH_SIZE", " 250 ")
        ]))
        .unwrap();

    assert_eq!(config.dialect().unwrap(), Some(SqlDialect::Oracle));
    assert_eq!(config.render.parameter_prefix, Some(':'));
    assert_eq!(config.render.max_batch_size, Some(250));
}

#[test]
fn test_env_rejects_bad_values() {
    let mut config = Config::default();
    assert!(
        config
            .apply_env(env(&[("SQL_TEMPLATE_PARAMETER_PREFIX", "@@")]))
            .is_err()
    );
    assert!(
        config
            .apply_env(env(&[("SQL_TEMPLATE_MAX_BATCH_SIZE", "many")]))
            .is_err()
    );
}

#[test]
fn test_env_without_variables_keeps_config() {
    let mut config = Config::default();
    config.apply_env(|_| None).unwrap();

    assert!(config.render.dialect.is_none());
}
