//! Dynamically shaped rows and the row-mapping trait.

use crate::error::{DbError, DbResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ops::{Index, IndexMut};

static NULL: Value = Value::Null;

/// One result row, keyed by column name.
///
/// Values are held as [`serde_json::Value`] and column order follows the
/// query's column order. Missing keys read as `null` through indexing:
///
/// ```ignore
/// let mut row = conn.table("users").filter("id", 1_i64).first().await?.unwrap();
/// println!("{}", row["email"]);
/// row["email"] = "new@example.com".into();
/// let json = row.to_json()?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet {
    columns: Map<String, Value>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `key`, if the column is present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.columns.get(key)
    }

    /// Deserialize the value of `key` into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> DbResult<T> {
        let value = self
            .columns
            .get(key)
            .ok_or_else(|| DbError::decode(key, "column not present in row"))?;
        T::deserialize(value).map_err(|e| DbError::decode(key, e.to_string()))
    }

    /// Insert or overwrite a column, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.columns.insert(key.into(), value.into())
    }

    /// Remove a column, keeping the order of the remaining ones.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.columns.shift_remove(key)
    }

    /// Whether `key` is present and not `null`.
    pub fn has(&self, key: &str) -> bool {
        self.columns.get(key).is_some_and(|v| !v.is_null())
    }

    /// Whether `key` is present, even if its value is `null`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.columns.contains_key(key)
    }

    /// Column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.columns.iter()
    }

    /// The row as a column map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.columns
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.columns
    }

    /// The row as a JSON object value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.columns.clone())
    }

    /// The row serialized as a JSON object string.
    pub fn to_json(&self) -> DbResult<String> {
        Ok(serde_json::to_string(&self.columns)?)
    }
}

impl Index<&str> for ResultSet {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.columns.get(key).unwrap_or(&NULL)
    }
}

impl IndexMut<&str> for ResultSet {
    fn index_mut(&mut self, key: &str) -> &mut Value {
        self.columns.entry(key).or_insert(Value::Null)
    }
}

impl From<Map<String, Value>> for ResultSet {
    fn from(columns: Map<String, Value>) -> Self {
        Self { columns }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for ResultSet {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl IntoIterator for ResultSet {
    type Item = (String, Value);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = (&'a String, &'a Value);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

/// Target shape for materializing one row.
///
/// Implemented for every `Deserialize` type, so both [`ResultSet`] and plain
/// structs work:
///
/// ```ignore
/// #[derive(serde::Deserialize)]
/// struct User {
///     id: i64,
///     email: String,
/// }
///
/// let users = conn.table("users").as_row::<User>().get().await?;
/// ```
pub trait FromRow: Sized {
    fn from_row(row: ResultSet) -> DbResult<Self>;
}

impl<T: DeserializeOwned> FromRow for T {
    fn from_row(row: ResultSet) -> DbResult<Self> {
        serde_json::from_value(Value::Object(row.columns))
            .map_err(|e| DbError::decode("<row>", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ResultSet {
        [
            ("id", json!(7)),
            ("email", json!("a@example.com")),
            ("deleted_at", Value::Null),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn keeps_column_order() {
        let row = sample();
        assert_eq!(row.columns().collect::<Vec<_>>(), ["id", "email", "deleted_at"]);
        assert_eq!(row.to_json().unwrap(), r#"{"id":7,"email":"a@example.com","deleted_at":null}"#);
    }

    #[test]
    fn has_treats_null_as_absent() {
        let row = sample();
        assert!(row.has("id"));
        assert!(!row.has("deleted_at"));
        assert!(row.contains_key("deleted_at"));
        assert!(!row.has("missing"));
    }

    #[test]
    fn index_reads_and_writes() {
        let mut row = sample();
        assert_eq!(row["email"], "a@example.com");
        assert!(row["missing"].is_null());

        row["email"] = json!("b@example.com");
        row["role"] = json!("admin");
        assert_eq!(row.get("email"), Some(&json!("b@example.com")));
        assert_eq!(row.columns().last(), Some("role"));
    }

    #[test]
    fn set_and_remove() {
        let mut row = sample();
        assert_eq!(row.set("id", 8), Some(json!(7)));
        assert_eq!(row.remove("id"), Some(json!(8)));
        assert_eq!(row.columns().collect::<Vec<_>>(), ["email", "deleted_at"]);
        assert_eq!(row.remove("id"), None);
    }

    #[test]
    fn get_as_typed() {
        let row = sample();
        assert_eq!(row.get_as::<i64>("id").unwrap(), 7);
        assert_eq!(row.get_as::<Option<String>>("deleted_at").unwrap(), None);
        assert!(matches!(
            row.get_as::<i64>("email").unwrap_err(),
            DbError::Decode { column, .. } if column == "email"
        ));
        assert!(row.get_as::<i64>("missing").is_err());
    }

    #[test]
    fn from_row_into_struct() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct User {
            id: i64,
            email: String,
        }

        let user = User::from_row(sample()).unwrap();
        assert_eq!(
            user,
            User {
                id: 7,
                email: "a@example.com".into()
            }
        );

        let same = ResultSet::from_row(sample()).unwrap();
        assert_eq!(same, sample());
    }

    #[test]
    fn from_row_reports_shape_mismatch() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct NeedsName {
            name: String,
        }
        assert!(NeedsName::from_row(sample()).is_err());
    }

    #[test]
    fn serializes_as_plain_object() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value, sample().to_value());
    }
}
