//! Ordered groups of rows.

use crate::error::{DbError, DbResult};
use crate::row::ResultSet;
use serde::Serialize;
use serde_json::Value;
use std::ops::{Index, IndexMut};

/// An ordered sequence of rows returned by a query.
///
/// Rows are [`ResultSet`]s unless a different row type was requested with
/// [`QueryBuilder::as_row`](crate::QueryBuilder::as_row).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Collection<T = ResultSet> {
    items: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Replace the item at `index`, or append when `index == len()`.
    ///
    /// Returns the replaced item. An index past the end would leave a gap and
    /// is a [`DbError::Validation`] error.
    pub fn set(&mut self, index: usize, item: T) -> DbResult<Option<T>> {
        let len = self.items.len();
        if index < len {
            return Ok(Some(std::mem::replace(&mut self.items[index], item)));
        }
        if index == len {
            self.items.push(item);
            return Ok(None);
        }
        Err(DbError::validation(format!(
            "index {index} is out of range for a collection of {len} items"
        )))
    }

    /// Remove the item at `index`; later items shift down by one.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }

    /// A new collection with the items matching `predicate`, in order.
    pub fn filter<F>(&self, mut predicate: F) -> Self
    where
        T: Clone,
        F: FnMut(&T) -> bool,
    {
        self.items
            .iter()
            .filter(|item| predicate(item))
            .cloned()
            .collect()
    }
}

impl<T: Serialize> Collection<T> {
    /// Every row as a JSON value.
    pub fn to_values(&self) -> DbResult<Vec<Value>> {
        self.items
            .iter()
            .map(|item| Ok(serde_json::to_value(item)?))
            .collect()
    }

    /// The collection serialized as a JSON array string.
    pub fn to_json(&self) -> DbResult<String> {
        Ok(serde_json::to_string(&self.items)?)
    }

    /// The values of one column across all rows.
    ///
    /// Rows that do not have the column (or do not serialize to an object) are skipped.
    pub fn pluck(&self, column: &str) -> DbResult<Collection<Value>> {
        let mut plucked = Collection::new();
        for value in self.to_values()? {
            if let Value::Object(mut map) = value {
                if let Some(v) = map.remove(column) {
                    plucked.push(v);
                }
            }
        }
        Ok(plucked)
    }
}

impl<T> Index<usize> for Collection<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<T> IndexMut<usize> for Collection<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.items[index]
    }
}

impl<T> From<Vec<T>> for Collection<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T> FromIterator<T> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> Extend<T> for Collection<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(id: i64, name: &str) -> ResultSet {
        [("id", json!(id)), ("name", json!(name))].into_iter().collect()
    }

    fn users() -> Collection {
        vec![row(1, "ann"), row(2, "bob"), row(3, "cid")].into()
    }

    #[test]
    fn array_style_access() {
        let mut users = users();
        assert_eq!(users.len(), 3);
        assert_eq!(users[1]["name"], "bob");
        assert!(users.get(3).is_none());

        users[0]["name"] = json!("anna");
        assert_eq!(users.first().unwrap()["name"], "anna");
    }

    #[test]
    fn set_replaces_or_appends() {
        let mut users = users();
        let old = users.set(0, row(10, "zed")).unwrap().unwrap();
        assert_eq!(old["id"], 1);
        assert_eq!(users.set(3, row(4, "dee")).unwrap(), None);
        assert_eq!(users.len(), 4);
    }

    #[test]
    fn set_past_the_end_is_rejected() {
        let mut values: Collection<Value> = vec![json!(1), json!(2)].into();
        let err = values.set(5, json!(9)).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(values.into_vec(), vec![json!(1), json!(2)]);
    }

    #[test]
    fn remove_shifts_items() {
        let mut users = users();
        assert_eq!(users.remove(0).unwrap()["id"], 1);
        assert_eq!(users[0]["id"], 2);
        assert_eq!(users.remove(5), None);
        assert_eq!(users.len(), 2);
    }

    #[test]
    fn pluck_skips_rows_without_column() {
        let mut users = users();
        users[1].remove("name");
        let names = users.pluck("name").unwrap();
        assert_eq!(names.into_vec(), vec![json!("ann"), json!("cid")]);
    }

    #[test]
    fn filter_returns_new_collection() {
        let users = users();
        let odd = users.filter(|u| u["id"].as_i64().is_some_and(|id| id % 2 == 1));
        assert_eq!(odd.len(), 2);
        assert_eq!(odd[1]["name"], "cid");
        assert_eq!(users.len(), 3);
    }

    #[test]
    fn json_conversion() {
        let users: Collection = vec![row(1, "ann")].into();
        assert_eq!(users.to_json().unwrap(), r#"[{"id":1,"name":"ann"}]"#);
        assert_eq!(users.to_values().unwrap(), vec![json!({"id": 1, "name": "ann"})]);
        assert_eq!(Collection::<ResultSet>::new().to_json().unwrap(), "[]");
    }

    #[test]
    fn typed_rows_pluck() {
        #[derive(Clone, Serialize)]
        struct Tag {
            label: &'static str,
        }
        let tags: Collection<Tag> = vec![Tag { label: "a" }, Tag { label: "b" }].into();
        let labels = tags.pluck("label").unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0], "a");
    }

    #[test]
    fn iterates_in_order() {
        let ids: Vec<i64> = users().iter().filter_map(|u| u["id"].as_i64()).collect();
        assert_eq!(ids, [1, 2, 3]);
    }
}
