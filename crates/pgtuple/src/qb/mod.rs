//! Statement builders.
//!
//! Builders are obtained from a declared [`Table`](crate::Table) and compile
//! to SQL text with `$n` placeholders plus a parameter list. Placeholders are
//! numbered once per statement, across every clause that binds values.
//!
//! # Usage
//!
//! ```ignore
//! use pgtuple::prelude::*;
//!
//! // select id, name, age from users where id = $1
//! let user = users.filter(users.id.eq(5)).fetch_one(&client).await?;
//!
//! // update users set name=$1 where id = $2 returning *
//! users
//!     .update()
//!     .set(&users.name, "Bob".to_string())
//!     .filter(users.id.eq(5))
//!     .execute(&client)
//!     .await?;
//!
//! // insert into users (id, name, age) values ($1, $2, $3) returning *
//! let saved = users
//!     .entity()
//!     .with(&users.id, 1)
//!     .with(&users.name, "A".to_string())
//!     .insert()
//!     .fetch_one(&client)
//!     .await?;
//!
//! // select users.id as table_users_id, ..., orders.total as table_orders_total
//! // from users inner join orders on orders.user_id = users.id where users.age < $1
//! let pairs: Vec<(Entity<Users>, Entity<Orders>)> = users
//!     .select()
//!     .join(orders.filter(orders.user_id.eq_col(&users.id)))
//!     .filter(users.age.lt(30))
//!     .fetch(&client)
//!     .await?;
//! ```

pub mod column_expr;
mod create;
mod delete;
pub mod expr;
mod hydrate;
mod insert;
mod join;
mod param;
mod select;
mod traits;
mod update;

pub use column_expr::{ColumnExpr, CountColumn, MaxColumn, count, count_all, max};
pub use create::CreateQb;
pub use delete::DeleteQb;
pub use expr::{ColumnStyle, Joiner, Op, Operand, WhereClauses, WhereQuery};
pub use hydrate::{SlotValue, relation_alias, scalar_alias};
pub use insert::InsertQb;
pub use join::{JoinQb, Push, Rel, Scalar, Slot, TupleShape};
pub use param::ParamList;
pub use select::{Order, SelectQb};
pub use traits::{CompiledQuery, FetchQb, SqlQb};
pub use update::UpdateQb;

#[cfg(test)]
mod tests;
