//! Lifecycle of the static facade.
//!
//! The facade is process-wide state, so the whole lifecycle runs in one test.
//! No database is required: the pool is built lazily.

use pgrecord::{DB, DbConfig, DbError, values};

#[test]
fn facade_lifecycle() {
    assert!(!DB::is_connected());
    assert!(matches!(DB::connection(), Err(DbError::NotConfigured)));
    assert!(matches!(DB::table("users"), Err(DbError::NotConfigured)));

    assert!(matches!(DB::config(DbConfig::new("")), Err(DbError::Config(_))));
    assert!(DB::current_config().is_none());

    DB::config(DbConfig::new("postgres://first@localhost/app")).unwrap();
    DB::config(
        DbConfig::new("postgres://app@localhost/app")
            .max_pool_size(2)
            .application_name("facade-test"),
    )
    .unwrap();
    assert_eq!(
        DB::current_config().map(|c| c.url),
        Some("postgres://app@localhost/app".to_string())
    );

    let first = DB::connection().unwrap();
    let second = DB::connection().unwrap();
    assert!(std::ptr::eq(first, second));
    assert!(DB::is_connected());
    assert_eq!(first.pool().status().max_size, 2);

    let err = DB::config(DbConfig::new("postgres://other@localhost/app")).unwrap_err();
    assert!(matches!(err, DbError::Config(_)));

    let qb = DB::table("users").unwrap().filter("status", "active").take(5);
    assert_eq!(
        qb.to_sql().unwrap(),
        "SELECT * FROM users WHERE status = $1 LIMIT 5"
    );
    let built = DB::table("users")
        .unwrap()
        .build_insert(&values! { "email" => "a@example.com" })
        .unwrap();
    assert_eq!(built.sql, "INSERT INTO users (email) VALUES ($1)");
}
