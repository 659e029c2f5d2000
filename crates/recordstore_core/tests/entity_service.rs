use recordstore_core::db::open_db_in_memory;
use recordstore_core::{
    Context, Entity, EntityService, Fields, ParseError, QueryMap, RepoError, Scalar, ScalarType,
    SqliteRepository,
};
use rusqlite::Connection;

fn setup() -> Connection {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE people (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            age INTEGER,
            active INTEGER
        );",
    )
    .unwrap();
    conn
}

fn people() -> Entity {
    let mut fields = Fields::new();
    fields
        .set("id", ScalarType::String)
        .set("+name", ScalarType::String)
        .set("age", ScalarType::Int64)
        .set("active", ScalarType::Bool);
    Entity::new("people", fields)
}

fn query(pairs: &[(&str, &str)]) -> QueryMap {
    let mut map = QueryMap::new();
    for (key, value) in pairs {
        map.entry(key.to_string())
            .or_default()
            .push(value.to_string());
    }
    map
}

#[test]
fn json_create_then_filtered_list() {
    let conn = setup();
    let service = EntityService::new(SqliteRepository::new(&conn), people());
    let ctx = Context::background();

    for body in [
        r#"{"name":"Ada","age":36,"active":true}"#,
        r#"{"name":"Brian","age":17,"active":true}"#,
        r#"{"name":"Chen","age":52,"active":false,"nickname":"ignored"}"#,
    ] {
        service.create_from_json(&ctx, body).unwrap();
    }

    let adults = service
        .list_from_query(
            &ctx,
            &query(&[("age", "gte:18"), ("__sort", "-age"), ("__limit", "10")]),
        )
        .unwrap();
    let names: Vec<_> = adults
        .iter()
        .filter_map(|person| person.get("name").and_then(Scalar::as_str))
        .collect();
    assert_eq!(names, vec!["Chen", "Ada"]);

    let active = service
        .list_from_query(&ctx, &query(&[("active", "true")]))
        .unwrap();
    assert_eq!(active.len(), 2);
}

#[test]
fn partial_update_and_delete_by_query() {
    let conn = setup();
    let service = EntityService::new(SqliteRepository::new(&conn), people());
    let ctx = Context::background();

    let id = service
        .create_from_json(&ctx, r#"{"name":"Ada","age":36}"#)
        .unwrap();
    service
        .update_from_json(&ctx, &id, r#"{"age":37}"#)
        .unwrap();

    let loaded = service.get(&ctx, &id).unwrap();
    assert_eq!(loaded.get("name"), Some(&Scalar::from("Ada")));
    assert_eq!(loaded.get("age"), Some(&Scalar::Int64(37)));

    service
        .delete_where_from_query(&ctx, &query(&[("name", "li:A%")]))
        .unwrap();
    assert!(service.get(&ctx, &id).unwrap_err().is_not_found());
    assert!(service.delete(&ctx, &id).unwrap_err().is_not_found());
}

#[test]
fn parse_failures_surface_before_storage() {
    let conn = setup();
    let service = EntityService::new(SqliteRepository::new(&conn), people());
    let ctx = Context::background();

    let err = service.create_from_json(&ctx, r#"{"age":3}"#).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Parse(ParseError::MissingRequiredValue(ref name)) if name == "name"
    ));

    let err = service
        .list_from_query(&ctx, &query(&[("active", "gt:true")]))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Parse(ParseError::InvalidConditionOperator { .. })
    ));

    let err = service
        .list_from_query(&ctx, &query(&[("__sort", "height")]))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Parse(ParseError::UnknownSortAttribute(_))
    ));

    let err = service
        .update_from_json(&ctx, "any", "[1,2]")
        .unwrap_err();
    assert!(matches!(err, RepoError::Parse(ParseError::InvalidJson(_))));
}
