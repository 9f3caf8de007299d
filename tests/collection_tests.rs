use std::{collections::HashSet, fmt};

use sql_template::{
    collection::{BatchOptions, chunk_size, execute_batches, render_batches},
    context::{ColumnMeta, DbType, PlaceholderContext},
    dialect::SqlDialect,
    error::{ErrorCategory, TemplateError},
    template::{SlotKind, prepare, render, render_parameterized},
    value::{ParamValue, Parameters, params, parameters_from_json}
};

fn items_ctx(dialect: SqlDialect) -> PlaceholderContext {
    PlaceholderContext::new(dialect.dialect(), "items").with_columns([
        ColumnMeta::from_property("Id", DbType::Int64, false),
        ColumnMeta::from_property("Name", DbType::String, false),
        ColumnMeta::from_property("Status", DbType::String, true)
    ])
}

fn rows(count: usize) -> ParamValue {
    let json = (0..count)
        .map(|i| format!(r#"{{"name": "n{}", "status": "s{}"}}"#, i, i))
        .collect::<Vec<_>>()
        .join(",");
    parameters_from_json(&format!(r#"{{"rows": [{}]}}"#, json)).unwrap()["rows"].clone()
}

#[test]
fn test_in_list_expands_with_bindings() {
    let prepared = prepare(
        "SELECT * FROM {{table}} WHERE id IN (@ids)",
        &items_ctx(SqlDialect::Sqlite)
    )
    .unwrap();
    assert_eq!(prepared.slots()[0].kind, SlotKind::Param);
    let p = params([("ids", ParamValue::from(vec![1, 2, 3]))]);
    let rendered = render_parameterized(&prepared, Some(&p)).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT * FROM [items] WHERE id IN (@ids0, @ids1, @ids2)"
    );
    assert_eq!(rendered.parameters.len(), 3);
    assert_eq!(rendered.parameters["@ids2"], ParamValue::Int(3));
}

#[test]
fn test_empty_list_never_renders_empty_in() {
    let prepared = prepare(
        "SELECT * FROM t WHERE id IN (@ids) AND kind NOT IN (@kinds)",
        &items_ctx(SqlDialect::Sqlite)
    )
    .unwrap();
    let empty: Vec<i32> = Vec::new();
    let p = params([
        ("ids", ParamValue::from(empty.clone())),
        ("kinds", ParamValue::from(empty))
    ]);
    let sql = render(&prepared, Some(&p)).unwrap();
    assert_eq!(sql, "SELECT * FROM t WHERE 1=0 AND 1=1");
    assert!(!sql.contains("IN ()"));
}

#[test]
fn test_in_list_after_expression_operand() {
    let prepared = prepare(
        "SELECT * FROM {{table}} WHERE LOWER(name) IN (@names) AND COALESCE(status, 'new') NOT IN (@states)",
        &items_ctx(SqlDialect::Sqlite)
    )
    .unwrap();
    assert_eq!(prepared.slots().len(), 2);
    let p = params([
        ("names", ParamValue::from(vec!["a", "b"])),
        ("states", ParamValue::from(vec!["gone"]))
    ]);
    let rendered = render_parameterized(&prepared, Some(&p)).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT * FROM [items] WHERE LOWER(name) IN (@names0, @names1) AND COALESCE(status, 'new') NOT IN (@states0)"
    );
    assert_eq!(rendered.parameters.len(), 3);
    assert!(!rendered.parameters.contains_key("@names"));

    let empty: Vec<i32> = Vec::new();
    let p = params([
        ("names", ParamValue::from(empty.clone())),
        ("states", ParamValue::from(empty))
    ]);
    assert_eq!(
        render(&prepared, Some(&p)).unwrap(),
        "SELECT * FROM [items] WHERE LOWER(name) IN (SELECT 1 WHERE 1=0) AND COALESCE(status, 'new') NOT IN (SELECT 1 WHERE 1=0)"
    );
}

#[test]
fn test_in_list_after_placeholder_operand() {
    let prepared = prepare(
        "SELECT * FROM {{table}} WHERE {{var --name col}} IN (@ids)",
        &items_ctx(SqlDialect::MySql)
    )
    .unwrap();
    let kinds: Vec<_> = prepared.slots().iter().map(|slot| slot.kind).collect();
    assert_eq!(kinds, vec![SlotKind::Var, SlotKind::Param]);

    let p = params([
        ("col", ParamValue::from("id")),
        ("ids", ParamValue::from(vec![4, 5]))
    ]);
    let rendered = render_parameterized(&prepared, Some(&p)).unwrap();
    assert_eq!(rendered.sql, "SELECT * FROM `items` WHERE id IN (@ids0, @ids1)");
    assert_eq!(rendered.parameters["@ids1"], ParamValue::Int(5));

    let empty: Vec<i32> = Vec::new();
    let p = params([("col", ParamValue::from("id")), ("ids", ParamValue::from(empty))]);
    let sql = render(&prepared, Some(&p)).unwrap();
    assert_eq!(sql, "SELECT * FROM `items` WHERE id IN (SELECT 1 FROM DUAL WHERE 1=0)");
    assert!(!sql.contains("IN ()"));
}

#[test]
fn test_text_is_bound_whole() {
    let prepared = prepare("SELECT * FROM t WHERE code IN (@codes)", &items_ctx(SqlDialect::Sqlite)).unwrap();
    let p = params([("codes", ParamValue::from("abc"))]);
    let rendered = render_parameterized(&prepared, Some(&p)).unwrap();
    assert_eq!(rendered.sql, "SELECT * FROM t WHERE code IN (@codes)");
    assert_eq!(rendered.parameters["@codes"], ParamValue::from("abc"));
}

#[test]
fn test_missing_in_list_argument() {
    let prepared = prepare("SELECT * FROM t WHERE id IN (@ids)", &items_ctx(SqlDialect::Sqlite)).unwrap();
    let err = render(&prepared, Some(&Parameters::new())).unwrap_err();
    assert!(matches!(err, TemplateError::MissingParameter { kind: SlotKind::Param, .. }));
}

#[test]
fn test_in_list_uses_dialect_prefix() {
    let prepared = prepare(
        "SELECT * FROM {{table}} WHERE id IN (:ids)",
        &items_ctx(SqlDialect::Oracle)
    )
    .unwrap();
    let p = params([("ids", ParamValue::from(vec![5, 6]))]);
    assert_eq!(
        render(&prepared, Some(&p)).unwrap(),
        "SELECT * FROM \"items\" WHERE id IN (:ids0, :ids1)"
    );

    let other = prepare("SELECT * FROM t WHERE id IN (@ids)", &items_ctx(SqlDialect::Oracle)).unwrap();
    assert!(!other.has_dynamic_placeholders());
}

#[test]
fn test_batch_values_binds_every_row() {
    let prepared = prepare(
        "INSERT INTO {{table}} ({{columns --exclude Id}}) VALUES {{batch_values --param rows --exclude Id}}",
        &items_ctx(SqlDialect::Sqlite)
    )
    .unwrap();
    let p = params([("rows", rows(3))]);
    let rendered = render_parameterized(&prepared, Some(&p)).unwrap();
    assert_eq!(
        rendered.sql,
        "INSERT INTO [items] ([name], [status]) VALUES (@name_0, @status_0), (@name_1, @status_1), (@name_2, @status_2)"
    );
    assert_eq!(rendered.sql.matches('(').count(), 4);
    let names: HashSet<_> = rendered.parameters.keys().collect();
    assert_eq!(names.len(), 6);
    assert_eq!(rendered.parameters["@status_1"], ParamValue::from("s1"));
}

#[test]
fn test_batch_fields_fall_back_to_property_name_then_null() {
    let prepared = prepare(
        "INSERT INTO {{table}} VALUES {{batch_values --exclude Id}}",
        &items_ctx(SqlDialect::Sqlite)
    )
    .unwrap();
    let p = parameters_from_json(r#"{"items": [{"Name": "widget"}]}"#).unwrap();
    let rendered = render_parameterized(&prepared, Some(&p)).unwrap();
    assert_eq!(rendered.parameters["@name_0"], ParamValue::from("widget"));
    assert_eq!(rendered.parameters["@status_0"], ParamValue::Null);
}

#[test]
fn test_values_with_param_is_a_batch() {
    let prepared = prepare(
        "INSERT INTO {{table}} VALUES {{values @rows --only Name}}",
        &items_ctx(SqlDialect::Sqlite)
    )
    .unwrap();
    let slot = prepared.batch_slot().unwrap();
    assert_eq!(slot.parameter_name, "rows");
    assert_eq!(slot.columns_per_row(), 1);
    let p = params([("rows", rows(2))]);
    assert_eq!(
        render(&prepared, Some(&p)).unwrap(),
        "INSERT INTO [items] VALUES (@name_0), (@name_1)"
    );
}

#[test]
fn test_batch_rejects_bad_shapes() {
    let prepared = prepare("INSERT INTO t VALUES {{batch_values}}", &items_ctx(SqlDialect::Sqlite)).unwrap();
    let empty: Vec<i32> = Vec::new();
    for value in [ParamValue::from(empty), ParamValue::from(1), ParamValue::from(vec![1, 2])] {
        let p = params([("items", value)]);
        let err = render(&prepared, Some(&p)).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidParameter);
    }
}

#[test]
fn test_render_batches_restarts_indices_per_chunk() {
    let prepared = prepare(
        "INSERT INTO {{table}} VALUES {{batch_values --param rows --only Name}}",
        &items_ctx(SqlDialect::Sqlite)
    )
    .unwrap();
    let p = params([("rows", rows(5))]);
    let batches = render_batches(
        &prepared,
        &p,
        BatchOptions {
            max_batch_size: Some(2)
        }
    )
    .unwrap();
    assert_eq!(batches.len(), 3);
    assert_eq!(batches[0].sql, "INSERT INTO [items] VALUES (@name_0), (@name_1)");
    assert_eq!(batches[2].sql, "INSERT INTO [items] VALUES (@name_0)");
    assert_eq!(batches[1].parameters["@name_0"], ParamValue::from("n2"));
    assert_eq!(batches[2].parameters["@name_0"], ParamValue::from("n4"));
}

#[test]
fn test_render_batches_without_batch_slot() {
    let prepared = prepare("SELECT * FROM {{table}}", &items_ctx(SqlDialect::Sqlite)).unwrap();
    let batches = render_batches(&prepared, &Parameters::new(), BatchOptions::default()).unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].sql, "SELECT * FROM [items]");
}

#[test]
fn test_chunk_size_respects_parameter_ceiling() {
    let prepared = prepare(
        "INSERT INTO {{table}} VALUES {{batch_values --only Name,Status}}",
        &items_ctx(SqlDialect::SqlServer)
    )
    .unwrap();
    let p = Parameters::new();
    assert_eq!(chunk_size(&prepared, &p, BatchOptions::default()), 1000);
    assert_eq!(
        chunk_size(
            &prepared,
            &p,
            BatchOptions {
                max_batch_size: Some(5000)
            }
        ),
        1000
    );
    assert_eq!(
        chunk_size(
            &prepared,
            &p,
            BatchOptions {
                max_batch_size: Some(100)
            }
        ),
        100
    );

    let wide = prepare(
        "INSERT INTO {{table}} VALUES {{batch_values}}",
        &items_ctx(SqlDialect::SqlServer)
    )
    .unwrap();
    assert_eq!(chunk_size(&wide, &p, BatchOptions::default()), 700);
}

#[test]
fn test_chunk_size_leaves_room_for_other_parameters() {
    let ctx = items_ctx(SqlDialect::PostgreSql);
    let plain = prepare("INSERT INTO {{table}} VALUES {{batch_values}}", &ctx).unwrap();
    assert_eq!(chunk_size(&plain, &Parameters::new(), BatchOptions::default()), 21845);

    let referenced = prepare(
        "INSERT INTO {{table}} VALUES {{batch_values}} ON CONFLICT (id) DO UPDATE SET status = @override",
        &ctx
    )
    .unwrap();
    assert_eq!(
        chunk_size(&referenced, &Parameters::new(), BatchOptions::default()),
        21844
    );

    let filtered = prepare(
        "WITH gone AS (DELETE FROM archive WHERE id IN (@ids)) INSERT INTO {{table}} VALUES {{batch_values}}",
        &ctx
    )
    .unwrap();
    let p = params([("ids", ParamValue::from(vec![1, 2, 3, 4]))]);
    assert_eq!(chunk_size(&filtered, &p, BatchOptions::default()), 21843);
}

#[test]
fn test_render_batches_keeps_shared_parameters_per_chunk() {
    let prepared = prepare(
        "INSERT INTO {{table}} VALUES {{batch_values --param rows --only Name}} ON CONFLICT (name) DO UPDATE SET status = @status_override",
        &items_ctx(SqlDialect::PostgreSql)
    )
    .unwrap();
    let p = params([
        ("status_override", ParamValue::from("merged")),
        ("rows", rows(3))
    ]);
    let batches = render_batches(
        &prepared,
        &p,
        BatchOptions {
            max_batch_size: Some(2)
        }
    )
    .unwrap();
    assert_eq!(batches.len(), 2);
    for batch in &batches {
        assert_eq!(batch.parameters["@status_override"], ParamValue::from("merged"));
        assert!(!batch.parameters.contains_key("@rows"));
    }
    assert_eq!(batches[0].parameters.len(), 3);
    assert_eq!(batches[1].parameters.len(), 2);
    assert_eq!(batches[1].parameters["@name_0"], ParamValue::from("n2"));
}

#[derive(Debug)]
struct Rejected;

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rejected")
    }
}

impl std::error::Error for Rejected {}

#[test]
fn test_execute_batches_reports_partial_progress() {
    let prepared = prepare(
        "INSERT INTO t VALUES {{batch_values --param rows --only Name}}",
        &items_ctx(SqlDialect::Sqlite)
    )
    .unwrap();
    let p = params([("rows", rows(3))]);
    let batches = render_batches(
        &prepared,
        &p,
        BatchOptions {
            max_batch_size: Some(1)
        }
    )
    .unwrap();

    let report = execute_batches(&batches, |_, _| Ok::<u64, Rejected>(1)).unwrap();
    assert_eq!(report.batches, 3);
    assert_eq!(report.affected_rows, 3);

    let failure = execute_batches(&batches, |index, _| {
        if index == 2 { Err(Rejected) } else { Ok(1) }
    })
    .unwrap_err();
    assert_eq!(failure.batch_index, 2);
    assert_eq!(failure.applied_batches, 2);
    assert_eq!(failure.applied_rows, 2);
    assert_eq!(
        failure.to_string(),
        "batch 2 failed after 2 batch(es) applied 2 row(s): rejected"
    );
}
