//! Bound parameter storage.

use std::fmt;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// A clone-friendly bound value.
///
/// Builders are `Clone`, so values are shared behind an `Arc` instead of copied.
#[derive(Clone)]
pub struct Param(Arc<dyn ToSql + Send + Sync>);

impl Param {
    /// Wrap any `ToSql` value.
    pub fn new<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Param(Arc::new(value))
    }

    /// Borrow the value in the shape the driver expects.
    pub fn as_sql(&self) -> &(dyn ToSql + Sync) {
        &*self.0 as &(dyn ToSql + Sync)
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `ToSql` already requires `Debug`.
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// Ordered parameters of one statement.
#[derive(Clone, Debug, Default)]
pub struct ParamList {
    params: Vec<Param>,
}

impl ParamList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter and return its 1-based placeholder index.
    pub fn push(&mut self, param: Param) -> usize {
        self.params.push(param);
        self.params.len()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameters as references for tokio-postgres.
    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(Param::as_sql).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.iter()
    }
}

/// Ordered `column => value` pairs for INSERT and UPDATE.
///
/// ```ignore
/// let data = Values::new().set("name", "alice").set("age", 31_i32);
/// // or
/// let data = pgrecord::values! { "name" => "alice", "age" => 31_i32 };
/// ```
#[derive(Clone, Debug, Default)]
pub struct Values {
    entries: Vec<(String, Param)>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value. Setting a column twice replaces the earlier value in place.
    pub fn set<T: ToSql + Send + Sync + 'static>(mut self, column: &str, value: T) -> Self {
        self.insert(column, value);
        self
    }

    /// Set a column only when `value` is `Some`.
    pub fn set_opt<T: ToSql + Send + Sync + 'static>(self, column: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// In-place variant of [`Values::set`].
    pub fn insert<T: ToSql + Send + Sync + 'static>(&mut self, column: &str, value: T) {
        let param = Param::new(value);
        match self.entries.iter_mut().find(|(c, _)| c == column) {
            Some(entry) => entry.1 = param,
            None => self.entries.push((column.to_string(), param)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Column names in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    pub(crate) fn entries(&self) -> &[(String, Param)] {
        &self.entries
    }
}

/// Build a [`Values`] list from `column => value` pairs.
#[macro_export]
macro_rules! values {
    () => { $crate::Values::new() };
    ($($column:expr => $value:expr),+ $(,)?) => {{
        let mut __values = $crate::Values::new();
        $( __values.insert($column, $value); )+
        __values
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_returns_one_based_index() {
        let mut params = ParamList::new();
        assert_eq!(params.push(Param::new(1_i32)), 1);
        assert_eq!(params.push(Param::new("x")), 2);
        assert_eq!(params.as_refs().len(), 2);
    }

    #[test]
    fn values_keep_order_and_replace_duplicates() {
        let values = Values::new()
            .set("name", "alice")
            .set("age", 30_i32)
            .set("name", "bob");
        assert_eq!(values.columns().collect::<Vec<_>>(), ["name", "age"]);
        assert_eq!(format!("{:?}", values.entries()[0].1), "\"bob\"");
    }

    #[test]
    fn set_opt_skips_none() {
        let values = Values::new()
            .set_opt("nickname", None::<String>)
            .set_opt("age", Some(7_i64));
        assert_eq!(values.columns().collect::<Vec<_>>(), ["age"]);
    }

    #[test]
    fn values_macro() {
        let values = crate::values! { "a" => 1_i32, "b" => "two" };
        assert_eq!(values.len(), 2);
        assert!(crate::values! {}.is_empty());
    }
}
