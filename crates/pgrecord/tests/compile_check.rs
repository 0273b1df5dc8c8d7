//! Compile-only tests for core API patterns.
//!
//! These tests verify that key API surfaces compile correctly.
//! They do NOT execute against a database; they only check types and signatures.

#![allow(dead_code)]

use pgrecord::prelude::*;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct User {
    id: i64,
    email: String,
}

async fn _repository_fn_accepts_any_client(client: &impl GenericClient) -> DbResult<Vec<User>> {
    let users = client
        .table("users")
        .as_row::<User>()
        .filter("status", "active")
        .sort_by("id")
        .get()
        .await?;
    Ok(users.into_vec())
}

async fn _transaction_macro_compiles(conn: &Connection) -> DbResult<()> {
    pgrecord::transaction!(conn, tx, {
        tx.table("accounts")
            .filter("id", 1_i64)
            .update(values! { "balance" => 0_i64 })
            .await?;
        _repository_fn_accepts_any_client(&tx).await?;
        Ok::<(), DbError>(())
    })?;
    Ok(())
}

async fn _transaction_closure_compiles(conn: &Connection) -> DbResult<u64> {
    conn.transaction(|tx| {
        Box::pin(async move {
            let moved = tx
                .table("audit")
                .insert(values! { "action" => "reset" })
                .await?;
            Ok(moved)
        })
    })
    .await
}

async fn _facade_compiles() -> DbResult<Option<ResultSet>> {
    DB::execute("UPDATE users SET seen = true WHERE id = $1", &[&1_i64]).await?;
    let tx = DB::begin_transaction().await?;
    tx.rollback().await?;
    DB::table("users")?.filter("id", 1_i64).first().await
}

fn _builders_are_send<T: Send>(_: T) {}

fn _futures_are_send(conn: &Connection) {
    _builders_are_send(_repository_fn_accepts_any_client(conn));
    _builders_are_send(_transaction_closure_compiles(conn));
}

#[test]
fn compile_condition_builders() {
    let _ = Condition::eq("status", "active");
    let _ = Condition::new("age", Op::Gte, 18_i32);
    let _ = Condition::is_null("deleted_at");
    let _ = Condition::in_list("id", vec![1_i64, 2, 3]);
    let _: SortOrder = "desc".parse().unwrap();
}
