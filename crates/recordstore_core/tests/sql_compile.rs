use recordstore_core::compile::sql;
use recordstore_core::{
    CompileRequest, Condition, ConditionOperator, Fields, Operation, OrderBy, Pagination,
    QueryCompiler, Scalar, ScalarType, SqlCompiler, SqlQuery, Values,
};

fn product_fields() -> Fields {
    let mut fields = Fields::new();
    fields
        .set("id", ScalarType::String)
        .set("name", ScalarType::String)
        .set("price", ScalarType::Float64);
    fields
}

#[test]
fn create_binds_values_in_insertion_order() {
    let mut values = Values::new();
    values.set("name", "Apple").set("price", 3.5);

    let query = sql::create("products", &values);
    assert_eq!(
        query.sql,
        "INSERT INTO `products` (`name`,`price`) VALUES (?,?)"
    );
    assert_eq!(query.args, vec![Scalar::from("Apple"), Scalar::Float64(3.5)]);
}

#[test]
fn get_selects_fields_by_id() {
    let query = sql::get("products", &product_fields(), "p-1");
    assert_eq!(
        query.sql,
        "SELECT `id`,`name`,`price` FROM `products` WHERE `id` = ?"
    );
    assert_eq!(query.args, vec![Scalar::from("p-1")]);
}

#[test]
fn list_offset_only_appears_with_limit() {
    let fields = product_fields();

    let query = sql::list("products", &fields, &Pagination::new(5, 10), &[]);
    assert_eq!(
        query.sql,
        "SELECT `id`,`name`,`price` FROM `products` LIMIT 5,10"
    );

    let query = sql::list("products", &fields, &Pagination::new(0, 10), &[]);
    assert!(query.sql.ends_with(" LIMIT 10"));
    assert!(!query.sql.contains("0,"));
    assert!(query.args.is_empty());
}

#[test]
fn list_combines_where_order_and_limit() {
    let pagination = Pagination::new(0, 20).with_order(vec![OrderBy::desc("price")]);
    let conditions = [
        Condition::new("price", ConditionOperator::GreaterOrEqual, 2.0),
        Condition::new("name", ConditionOperator::Like, "App%"),
    ];

    let query = sql::list("products", &product_fields(), &pagination, &conditions);
    assert_eq!(
        query.sql,
        "SELECT `id`,`name`,`price` FROM `products` WHERE `price` >= ? AND `name` LIKE ? ORDER BY `price` DESC LIMIT 20"
    );
    assert_eq!(query.args, vec![Scalar::Float64(2.0), Scalar::from("App%")]);
}

#[test]
fn update_binds_id_last() {
    let mut values = Values::new();
    values.set("name", "Pear").set("price", 1.25);

    let query = sql::update("products", "p-1", &values);
    assert_eq!(
        query.sql,
        "UPDATE `products` SET `name` = ?, `price` = ? WHERE `id` = ?"
    );
    assert_eq!(
        query.args,
        vec![Scalar::from("Pear"), Scalar::Float64(1.25), Scalar::from("p-1")]
    );
}

#[test]
fn by_condition_writes_bind_set_before_where() {
    let mut values = Values::new();
    values.set("price", 0.0);
    let conditions = [Condition::new("price", ConditionOperator::LessThan, 1.0)];

    let query = sql::update_where("products", &values, &conditions);
    assert_eq!(query.sql, "UPDATE `products` SET `price` = ? WHERE `price` < ?");
    assert_eq!(query.args, vec![Scalar::Float64(0.0), Scalar::Float64(1.0)]);

    let query = sql::delete_where("products", &conditions);
    assert_eq!(query.sql, "DELETE FROM `products` WHERE `price` < ?");

    let query = sql::delete("products", "p-1");
    assert_eq!(query.sql, "DELETE FROM `products` WHERE `id` = ?");
}

#[test]
fn empty_inputs_yield_empty_query() {
    let mut values = Values::new();
    values.set("name", "Apple");

    for query in [
        sql::get("", &product_fields(), "id1"),
        sql::delete("entity", ""),
        sql::create("", &values),
        sql::create("products", &Values::new()),
        sql::update("products", "", &values),
        sql::list("products", &Fields::new(), &Pagination::default(), &[]),
    ] {
        assert!(query.is_empty());
        assert_eq!(query, SqlQuery::default());
        assert!(query.args.is_empty());
    }
}

#[test]
fn compiler_trait_matches_free_functions() {
    let fields = product_fields();
    let mut values = Values::new();
    values.set("name", "Apple");
    let pagination = Pagination::new(0, 1);

    let compiler = SqlCompiler;
    let request = CompileRequest::new("products")
        .id("p-1")
        .fields(&fields)
        .values(&values)
        .pagination(&pagination);

    assert_eq!(
        compiler.compile(Operation::Get, &request),
        sql::get("products", &fields, "p-1")
    );
    assert_eq!(
        compiler.compile(Operation::List, &request),
        sql::list("products", &fields, &pagination, &[])
    );
    assert_eq!(
        compiler.compile(Operation::Update, &request),
        sql::update("products", "p-1", &values)
    );

    let missing_values = CompileRequest::new("products");
    assert!(compiler.compile(Operation::Create, &missing_values).is_empty());
}
