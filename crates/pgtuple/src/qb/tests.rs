//! SQL-shape tests for the qb module.

use std::sync::Arc;

use crate::column::{Column, column, default, foreign, primary};
use crate::error::OrmError;
use crate::qb::{
    FetchQb, Joiner, Order, SqlQb, count, count_all, max, relation_alias, scalar_alias,
};
use crate::record::Record;
use crate::table::{Table, TableBuilder, TableSchema};
use crate::value::Value;

struct Users {
    schema: Arc<TableSchema>,
    id: Column<Users, i32>,
    name: Column<Users, String>,
    age: Column<Users, Option<i32>>,
}

impl Table for Users {
    fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }
}

struct Orders {
    schema: Arc<TableSchema>,
    id: Column<Orders, i32>,
    user_id: Column<Orders, i32>,
    total: Column<Orders, f64>,
    note: Column<Orders, Option<String>>,
}

impl Table for Orders {
    fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }
}

fn tables() -> (Users, Orders) {
    let mut t = TableBuilder::new("users");
    let id = t.column("id", primary()).unwrap();
    let name = t.column("name", column()).unwrap();
    let age = t.column("age", default(|| Some(0))).unwrap();
    let users = Users {
        schema: t.finish().unwrap(),
        id,
        name,
        age,
    };

    let mut t = TableBuilder::new("orders");
    let id = t.column("id", primary()).unwrap();
    let user_id = t.column("userId", foreign(&users.id)).unwrap();
    let total = t.column("total", column()).unwrap();
    let note = t.column("note", column()).unwrap();
    let orders = Orders {
        schema: t.finish().unwrap(),
        id,
        user_id,
        total,
        note,
    };

    (users, orders)
}

struct Meta {
    schema: Arc<TableSchema>,
    id: Column<Meta, i32>,
    note: Column<Meta, Option<String>>,
}

impl Table for Meta {
    fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }
}

/// `users_meta`: its name starts with `users_`.
fn meta_table() -> Meta {
    let mut t = TableBuilder::new("users_meta");
    let id = t.column("id", primary()).unwrap();
    let note = t.column("note", default(|| None)).unwrap();
    Meta {
        schema: t.finish().unwrap(),
        id,
        note,
    }
}

const USERS_COLS: &str =
    "users.id as table_users_id, users.name as table_users_name, users.age as table_users_age";
const ORDERS_COLS: &str = "orders.id as table_orders_id, orders.userId as table_orders_userId, \
     orders.total as table_orders_total, orders.note as table_orders_note";

/// Every `$n` index in `sql`, in order of appearance.
fn placeholders(sql: &str) -> Vec<usize> {
    let mut found = Vec::new();
    let mut rest = sql;
    while let Some(pos) = rest.find('$') {
        rest = &rest[pos + 1..];
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        if let Ok(n) = digits.parse() {
            found.push(n);
        }
    }
    found
}

// ==================== SELECT ====================

#[test]
fn test_select_by_id() {
    let (users, _) = tables();
    let q = users.filter(users.id.eq(5)).compile().unwrap();
    assert_eq!(q.sql, "select id, name, age from users where id = $1");
    assert_eq!(q.params, vec![Value::Int(5)]);
}

#[test]
fn test_select_without_predicates_has_no_where() {
    let (users, _) = tables();
    let sql = users.select().to_sql().unwrap();
    assert_eq!(sql, "select id, name, age from users");
    assert!(!sql.contains("where"));
}

#[test]
fn test_select_joiners() {
    let (users, _) = tables();
    let q = users
        .filter(users.age.lt(30))
        .and_where(users.name.ne("root".to_string()))
        .or_where(users.id.le(2))
        .where_with("AND".parse::<Joiner>().unwrap(), users.age.eq(None))
        .compile()
        .unwrap();
    assert_eq!(
        q.sql,
        "select id, name, age from users where age < $1 and name != $2 or id <= $3 and age = $4"
    );
    assert_eq!(
        q.params,
        vec![
            Value::Int(30),
            Value::from("root"),
            Value::Int(2),
            Value::Null
        ]
    );
}

#[test]
fn test_select_group_order_limit() {
    let (users, _) = tables();
    let sql = users
        .select()
        .group_by(&users.age)
        .group_by(&users.name)
        .group_by(&users.age)
        .order_by_asc(&users.name)
        .order_by(&users.age, Order::Desc)
        .limit(10)
        .to_sql()
        .unwrap();
    assert_eq!(
        sql,
        "select id, name, age from users group by age, name order by age desc limit 10"
    );
}

#[test]
fn test_select_where_sequence_errors() {
    let (users, _) = tables();

    let err = users
        .filter(users.id.eq(1))
        .filter(users.id.eq(2))
        .compile()
        .unwrap_err();
    assert!(err.is_validation());

    let err = users.select().and_where(users.id.eq(1)).compile().unwrap_err();
    assert!(err.is_validation());

    let err = users.select().or_where(users.id.eq(1)).compile().unwrap_err();
    assert!(err.to_string().contains("or_where(users.id)"));
}

#[test]
fn test_compile_is_idempotent() {
    let (users, orders) = tables();
    let select = users
        .filter(users.id.eq(5))
        .or_where(users.age.lt(3))
        .order_by_desc(&users.id);
    assert_eq!(select.compile().unwrap(), select.compile().unwrap());

    let joined = users
        .select()
        .join(orders.filter(orders.user_id.eq_col(&users.id)).and_where(orders.total.lt(9.5)))
        .project(count_all())
        .filter(users.age.le(40));
    assert_eq!(joined.compile().unwrap(), joined.compile().unwrap());
}

// ==================== JOIN / TUPLE ====================

#[test]
fn test_join_on_column_binds_nothing() {
    let (users, orders) = tables();
    let q = users
        .select()
        .join(orders.filter(orders.user_id.eq_col(&users.id)))
        .compile()
        .unwrap();
    assert_eq!(
        q.sql,
        format!(
            "select {USERS_COLS}, {ORDERS_COLS} from users inner join orders on orders.userId = users.id"
        )
    );
    assert!(q.params.is_empty());
}

#[test]
fn test_join_placeholders_run_across_on_and_where() {
    let (users, orders) = tables();
    let q = users
        .select()
        .join(
            orders
                .filter(orders.user_id.eq_col(&users.id))
                .and_where(orders.total.lt(10.0)),
        )
        .filter(users.age.le(30))
        .or_where(users.name.eq("x".to_string()))
        .compile()
        .unwrap();
    assert!(q.sql.ends_with(
        "from users inner join orders on orders.userId = users.id and orders.total < $1 \
         where users.age <= $2 or users.name = $3"
    ));
    assert_eq!(
        q.params,
        vec![Value::Double(10.0), Value::Int(30), Value::from("x")]
    );
}

#[test]
fn test_join_with_expression_and_tail() {
    let (users, orders) = tables();
    let q = users
        .select()
        .join(orders.filter(orders.user_id.eq_col(&users.id)))
        .project(max(&orders.total))
        .group_by(&users.id)
        .group_by(&orders.id)
        .order_by_desc(&users.name)
        .limit(5)
        .compile()
        .unwrap();
    assert_eq!(
        q.sql,
        format!(
            "select {USERS_COLS}, {ORDERS_COLS}, max(orders.total) as extra_2 from users \
             inner join orders on orders.userId = users.id \
             group by users.id, orders.id order by users.name desc limit 5"
        )
    );
}

#[test]
fn test_project_on_select() {
    let (users, orders) = tables();
    let q = orders
        .select()
        .project(count(&orders.note))
        .group_by(&orders.id)
        .compile()
        .unwrap();
    assert_eq!(
        q.sql,
        format!(
            "select {ORDERS_COLS}, count(orders.note) as extra_1 from orders group by orders.id"
        )
    );

    // The single-table builder stays usable after widening.
    let base = users.filter(users.id.eq(1));
    let _widened = base.join(orders.filter(orders.user_id.eq_col(&users.id)));
    assert_eq!(
        base.to_sql().unwrap(),
        "select id, name, age from users where id = $1"
    );
}

#[test]
fn test_join_validation() {
    let (users, orders) = tables();

    let err = users.select().join(orders.select()).compile().unwrap_err();
    assert!(err.to_string().contains("join with orders has no on condition"));

    let err = users
        .select()
        .join(orders.filter(orders.user_id.eq_col(&users.id)).limit(3))
        .compile()
        .unwrap_err();
    assert!(err.is_validation());

    let err = users
        .select()
        .join(orders.select().and_where(orders.user_id.eq_col(&users.id)))
        .compile()
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_join_rejects_self_and_ambiguous_aliases() {
    let (users, _) = tables();

    let err = users
        .select()
        .join(users.filter(users.id.eq_col(&users.id)))
        .compile()
        .unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("cannot be joined to itself"));

    // users.meta_id and users_meta.id both alias to table_users_meta_id
    struct Wide {
        schema: Arc<TableSchema>,
        meta_id: Column<Wide, i32>,
    }
    impl Table for Wide {
        fn schema(&self) -> &Arc<TableSchema> {
            &self.schema
        }
    }
    let mut t = TableBuilder::new("users");
    t.column::<Wide, i32>("id", primary()).unwrap();
    let meta_id = t.column("meta_id", column()).unwrap();
    let wide = Wide {
        schema: t.finish().unwrap(),
        meta_id,
    };
    let meta = meta_table();
    let err = wide
        .select()
        .join(meta.filter(meta.id.eq_col(&wide.meta_id)))
        .compile()
        .unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("table_users_meta_id ambiguous"));
}

#[test]
fn test_placeholder_count_matches_literals() {
    let (users, orders) = tables();

    // Each case: on-clause predicates (literal?) then where predicates (literal?).
    let cases: &[(&[bool], &[bool])] = &[
        (&[false], &[]),
        (&[false, true], &[true]),
        (&[true, false, true], &[false, true, true]),
        (&[false, false], &[false]),
        (&[true], &[true, false, false, true]),
    ];

    for (on, wh) in cases {
        let mut join = orders.select();
        for (i, literal) in on.iter().enumerate() {
            let pred = if *literal {
                orders.total.le(i as f64)
            } else {
                orders.user_id.eq_col(&users.id)
            };
            join = if i == 0 { join.filter(pred) } else { join.and_where(pred) };
        }

        let mut qb = users.select().join(join);
        for (i, literal) in wh.iter().enumerate() {
            let pred = if *literal {
                users.id.ne(i as i32)
            } else {
                users.id.eq_col(&orders.user_id)
            };
            qb = if i == 0 { qb.filter(pred) } else { qb.or_where(pred) };
        }

        let q = qb.compile().unwrap();
        let literals = on.iter().chain(wh.iter()).filter(|l| **l).count();
        let found = placeholders(&q.sql);
        assert_eq!(found.len(), literals, "{}", q.sql);
        assert_eq!(q.params.len(), literals);
        assert_eq!(found, (1..=literals).collect::<Vec<_>>());
        assert_eq!(found.iter().max().copied().unwrap_or(0), q.params.len());
    }
}

#[test]
fn test_join_hydrates_in_projection_order() {
    let (users, orders) = tables();
    let qb = users
        .select()
        .join(orders.filter(orders.user_id.eq_col(&users.id)))
        .project(max(&orders.total));

    let record = Record::new()
        .with(relation_alias("users", "id"), 1)
        .with(relation_alias("users", "name"), "A")
        .with(relation_alias("users", "age"), Value::Null)
        .with(relation_alias("orders", "id"), 7)
        .with(relation_alias("orders", "userId"), 1)
        .with(relation_alias("orders", "total"), 12.5)
        .with(relation_alias("orders", "note"), Value::Null)
        .with(scalar_alias(2), 12.5);

    let (user, order, top) = qb.hydrate(record).unwrap();
    assert_eq!(user.get(&users.name).unwrap(), "A");
    assert_eq!(user.get(&users.age).unwrap(), None);
    assert_eq!(order.get(&orders.id).unwrap(), 7);
    assert_eq!(order.get(&orders.user_id).unwrap(), 1);
    assert_eq!(order.get(&orders.note).unwrap(), None);
    assert_eq!(top, Some(12.5));
}

#[test]
fn test_join_hydrates_table_named_after_another() {
    let (users, _) = tables();
    let meta = meta_table();
    let qb = users
        .select()
        .join(meta.filter(meta.id.eq_col(&users.id)));
    let q = qb.compile().unwrap();
    assert!(q.sql.contains("users_meta.id as table_users_meta_id"));

    let record = Record::new()
        .with("table_users_id", 1)
        .with("table_users_name", "A")
        .with("table_users_age", 2)
        .with("table_users_meta_id", 1)
        .with("table_users_meta_note", "vip");
    let (user, m) = qb.hydrate(record).unwrap();
    assert_eq!(user.get(&users.age).unwrap(), Some(2));
    assert_eq!(user.schema().columns().len(), 3);
    assert_eq!(m.get(&meta.id).unwrap(), 1);
    assert_eq!(m.get(&meta.note).unwrap(), Some("vip".to_string()));
}

#[test]
fn test_join_hydrates_folded_aliases() {
    let (users, orders) = tables();
    let qb = users
        .select()
        .join(orders.filter(orders.user_id.eq_col(&users.id)));

    // The server answers with lower-cased, unquoted aliases.
    let record = Record::new()
        .with("table_users_id", 1)
        .with("table_users_name", "A")
        .with("table_users_age", Value::Null)
        .with("table_orders_id", 7)
        .with("table_orders_userid", 1)
        .with("table_orders_total", 3.5)
        .with("table_orders_note", Value::Null);
    let (_, order) = qb.hydrate(record).unwrap();
    assert_eq!(order.get(&orders.user_id).unwrap(), 1);
    assert_eq!(order.value("userId"), Some(&Value::Int(1)));
}

#[test]
fn test_join_hydrate_rejects_wrong_shape() {
    let (users, orders) = tables();
    let qb = users
        .select()
        .join(orders.filter(orders.user_id.eq_col(&users.id)));

    // orders columns missing entirely
    let record = Record::new()
        .with("table_users_id", 1)
        .with("table_users_name", "A")
        .with("table_users_age", 3);
    assert!(matches!(qb.hydrate(record), Err(OrmError::Decode { .. })));

    // users slot short one column
    let record = Record::new()
        .with("table_users_id", 1)
        .with("table_users_name", "A")
        .with("table_orders_id", 1)
        .with("table_orders_userId", 1)
        .with("table_orders_total", 1.0)
        .with("table_orders_note", "n");
    let err = qb.hydrate(record).unwrap_err();
    assert!(err.to_string().contains("column 'age'"));
}

#[test]
fn test_select_hydrates_entity() {
    let (users, _) = tables();
    let record = Record::new()
        .with("id", 3)
        .with("name", "C")
        .with("age", 40);
    let user = users.select().hydrate(record).unwrap();
    assert_eq!(user.get(&users.id).unwrap(), 3);
    assert_eq!(user.get(&users.age).unwrap(), Some(40));
}

// ==================== INSERT ====================

#[test]
fn test_insert_uses_default_provider() {
    let (users, _) = tables();
    let q = users
        .entity()
        .with(&users.id, 1)
        .with(&users.name, "A".to_string())
        .insert()
        .compile()
        .unwrap();
    assert_eq!(
        q.sql,
        "insert into users (id, name, age) values ($1, $2, $3) returning *"
    );
    assert_eq!(q.params, vec![Value::Int(1), Value::from("A"), Value::Int(0)]);
}

#[test]
fn test_insert_explicit_value_wins_over_default() {
    let (users, _) = tables();
    let q = users
        .entity()
        .with(&users.id, 1)
        .with(&users.name, "A".to_string())
        .with(&users.age, None)
        .insert()
        .compile()
        .unwrap();
    assert_eq!(q.params[2], Value::Null);
}

#[test]
fn test_insert_missing_required_column() {
    let (users, orders) = tables();
    let err = users.entity().with(&users.id, 1).insert().compile().unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("column 'name'"));

    // nullable is not enough to leave a column out
    let err = orders
        .entity()
        .with(&orders.id, 1)
        .with(&orders.user_id, 1)
        .with(&orders.total, 2.0)
        .insert()
        .compile()
        .unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("column 'note'"));
}

#[test]
fn test_insert_null_default_writes_null() {
    let meta = meta_table();
    let q = meta.entity().with(&meta.id, 4).insert().compile().unwrap();
    assert_eq!(
        q.sql,
        "insert into users_meta (id, note) values ($1, $2) returning *"
    );
    assert_eq!(q.params, vec![Value::Int(4), Value::Null]);
}

// ==================== UPDATE ====================

#[test]
fn test_update_set_then_where() {
    let (users, _) = tables();
    let q = users
        .update()
        .set(&users.name, "Bob".to_string())
        .filter(users.id.eq(5))
        .compile()
        .unwrap();
    assert_eq!(q.sql, "update users set name=$1 where id = $2 returning *");
    assert_eq!(q.params, vec![Value::from("Bob"), Value::Int(5)]);
}

#[test]
fn test_update_multiple_sets_and_column_predicate() {
    let (users, orders) = tables();
    let q = users
        .update()
        .set(&users.name, "Bob".to_string())
        .set(&users.age, Some(3))
        .set(&users.name, "Rob".to_string())
        .filter(users.id.eq_col(&orders.user_id))
        .or_where(users.age.lt(1))
        .compile()
        .unwrap();
    assert_eq!(
        q.sql,
        "update users set name=$1, age=$2 where id = orders.userId or age < $3 returning *"
    );
    assert_eq!(
        q.params,
        vec![Value::from("Rob"), Value::Int(3), Value::Int(1)]
    );
}

#[test]
fn test_update_requires_set() {
    let (users, _) = tables();
    let err = users.update().filter(users.id.eq(1)).compile().unwrap_err();
    assert!(err.is_validation());

    let err = users
        .update()
        .set(&users.age, None)
        .and_where(users.id.eq(1))
        .compile()
        .unwrap_err();
    assert!(err.is_validation());
}

// ==================== DELETE ====================

#[test]
fn test_delete_binds_where_params() {
    let (users, _) = tables();
    let q = users
        .delete()
        .filter(users.id.eq(1))
        .or_where(users.age.lt(18))
        .compile()
        .unwrap();
    assert_eq!(q.sql, "delete from users where id = $1 or age < $2");
    assert_eq!(q.params, vec![Value::Int(1), Value::Int(18)]);
}

#[test]
fn test_delete_all() {
    let (users, _) = tables();
    let q = users.delete().compile().unwrap();
    assert_eq!(q.sql, "delete from users");
    assert!(q.params.is_empty());
}

// ==================== CREATE ====================

#[test]
fn test_create_table() {
    let (users, orders) = tables();
    let q = users.create().compile().unwrap();
    assert_eq!(
        q.sql,
        "create table users (id integer not null primary key, name text not null, age integer)"
    );
    assert!(q.params.is_empty());

    assert_eq!(
        orders.create().if_not_exists().to_sql().unwrap(),
        "create table if not exists orders (id integer not null primary key, \
         userId integer not null references users(id), \
         total double precision not null, note text)"
    );
}
