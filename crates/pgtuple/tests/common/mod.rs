//! Shared tables and an in-memory connection for integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use pgtuple::prelude::*;
use pgtuple::Record;

pub struct Users {
    pub schema: Arc<TableSchema>,
    pub id: Column<Users, i32>,
    pub name: Column<Users, String>,
    pub age: Column<Users, Option<i32>>,
}

impl Table for Users {
    fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }
}

pub struct Orders {
    pub schema: Arc<TableSchema>,
    pub id: Column<Orders, i32>,
    pub user_id: Column<Orders, i32>,
    pub total: Column<Orders, f64>,
}

impl Table for Orders {
    fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }
}

pub fn users() -> OrmResult<Users> {
    users_named("users")
}

/// Same shape as `users`, under another table name.
pub fn users_named(table: &str) -> OrmResult<Users> {
    let mut t = TableBuilder::new(table);
    Ok(Users {
        id: t.column("id", primary())?,
        name: t.column("name", column())?,
        age: t.column("age", default(|| Some(0)))?,
        schema: t.finish()?,
    })
}

pub fn orders(users: &Users) -> OrmResult<Orders> {
    orders_named("orders", users)
}

pub fn orders_named(table: &str, users: &Users) -> OrmResult<Orders> {
    let mut t = TableBuilder::new(table);
    Ok(Orders {
        id: t.column("id", primary())?,
        user_id: t.column("user_id", foreign(&users.id))?,
        total: t.column("total", column())?,
        schema: t.finish()?,
    })
}

/// A connection that records every statement and replays canned results.
#[derive(Default)]
pub struct MockConnection {
    pub calls: Mutex<Vec<(String, Vec<Value>)>>,
    statuses: Mutex<VecDeque<String>>,
    rows: Mutex<VecDeque<Vec<Record>>>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(self, status: &str) -> Self {
        self.statuses.lock().unwrap().push_back(status.to_string());
        self
    }

    pub fn with_rows(self, rows: Vec<Record>) -> Self {
        self.rows.lock().unwrap().push_back(rows);
        self
    }

    pub fn last_call(&self) -> (String, Vec<Value>) {
        self.calls.lock().unwrap().last().cloned().expect("no statement ran")
    }

    fn record(&self, sql: &str, params: &[Value]) {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
    }
}

impl Connection for MockConnection {
    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<String> {
        self.record(sql, params);
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "SELECT 0".to_string()))
    }

    async fn fetch(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Record>> {
        self.record(sql, params);
        Ok(self.rows.lock().unwrap().pop_front().unwrap_or_default())
    }
}
