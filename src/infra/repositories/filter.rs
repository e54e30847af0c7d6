//! Predicates over entity columns.
//!
//! A [`Filter`] is a small expression tree that every repository can consume:
//! the tracked repository hands the whole tree to the query builder, while the
//! raw-SQL repository only understands a single top-level equality and
//! evaluates everything else in memory with [`Filter::matches`].

use std::ops::Not;

use sea_orm::{ColumnTrait, Condition, EntityTrait, ModelTrait, Value};

/// Boolean predicate over the columns of `E`.
#[derive(Debug, Clone)]
pub enum Filter<E: EntityTrait> {
    Eq(E::Column, Value),
    Ne(E::Column, Value),
    IsNull(E::Column),
    And(Vec<Filter<E>>),
    Or(Vec<Filter<E>>),
    Not(Box<Filter<E>>),
}

impl<E: EntityTrait> Filter<E> {
    /// `column == value`
    pub fn eq(column: E::Column, value: impl Into<Value>) -> Self {
        Filter::Eq(column, value.into())
    }

    /// `column != value`
    pub fn ne(column: E::Column, value: impl Into<Value>) -> Self {
        Filter::Ne(column, value.into())
    }

    pub fn is_null(column: E::Column) -> Self {
        Filter::IsNull(column)
    }

    /// Conjunction, flattening nested `And`s.
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), right) => {
                left.push(right);
                Filter::And(left)
            }
            (left, right) => Filter::And(vec![left, right]),
        }
    }

    /// Disjunction, flattening nested `Or`s.
    pub fn or(self, other: Self) -> Self {
        match (self, other) {
            (Filter::Or(mut left), Filter::Or(right)) => {
                left.extend(right);
                Filter::Or(left)
            }
            (Filter::Or(mut left), right) => {
                left.push(right);
                Filter::Or(left)
            }
            (left, right) => Filter::Or(vec![left, right]),
        }
    }

    /// The `(column, constant)` pair when the filter is exactly one
    /// top-level equality. Any other shape returns `None`.
    pub fn as_equality(&self) -> Option<(E::Column, &Value)> {
        match self {
            Filter::Eq(column, value) if !is_null(value) => Some((*column, value)),
            _ => None,
        }
    }

    /// Translate into a store-side condition.
    pub fn into_condition(self) -> Condition {
        match self {
            Filter::Eq(column, value) => Condition::all().add(column.eq(value)),
            Filter::Ne(column, value) => Condition::all().add(column.ne(value)),
            Filter::IsNull(column) => Condition::all().add(column.is_null()),
            Filter::And(filters) => filters
                .into_iter()
                .fold(Condition::all(), |acc, f| acc.add(f.into_condition())),
            Filter::Or(filters) => filters
                .into_iter()
                .fold(Condition::any(), |acc, f| acc.add(f.into_condition())),
            Filter::Not(inner) => inner.into_condition().not(),
        }
    }

    /// Evaluate against an already loaded row.
    ///
    /// Comparisons involving NULL are unknown, as in SQL, and a row only
    /// matches when the whole predicate is definitely true.
    pub fn matches(&self, model: &E::Model) -> bool {
        self.evaluate(model) == Some(true)
    }

    fn evaluate(&self, model: &E::Model) -> Option<bool> {
        match self {
            Filter::Eq(column, value) => compare(&model.get(*column), value),
            Filter::Ne(column, value) => compare(&model.get(*column), value).map(|eq| !eq),
            Filter::IsNull(column) => Some(is_null(&model.get(*column))),
            Filter::And(filters) => {
                let mut result = Some(true);
                for filter in filters {
                    match filter.evaluate(model) {
                        Some(false) => return Some(false),
                        None => result = None,
                        Some(true) => {}
                    }
                }
                result
            }
            Filter::Or(filters) => {
                let mut result = Some(false);
                for filter in filters {
                    match filter.evaluate(model) {
                        Some(true) => return Some(true),
                        None => result = None,
                        Some(false) => {}
                    }
                }
                result
            }
            Filter::Not(inner) => inner.evaluate(model).map(|b| !b),
        }
    }
}

impl<E: EntityTrait> Not for Filter<E> {
    type Output = Self;

    fn not(self) -> Self {
        match self {
            Filter::Not(inner) => *inner,
            other => Filter::Not(Box::new(other)),
        }
    }
}

fn is_null(value: &Value) -> bool {
    *value == value.as_null()
}

fn compare(left: &Value, right: &Value) -> Option<bool> {
    if is_null(left) || is_null(right) {
        None
    } else {
        Some(left == right)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sea_orm::{DbBackend, QueryFilter, QueryTrait};
    use uuid::Uuid;

    use super::*;
    use crate::infra::repositories::entities::user::{self, Column};

    fn user(username: &str, active: bool, city: Option<&str>) -> user::Model {
        user::Model {
            user_id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash: "hash".to_string(),
            first_name: None,
            last_name: None,
            phone_number: None,
            address: None,
            city: city.map(str::to_string),
            postal_code: None,
            country: None,
            is_active: active,
            registered_at: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn test_single_equality_is_detected() {
        let filter = Filter::<user::Entity>::eq(Column::Username, "alice");
        let (column, value) = filter.as_equality().unwrap();
        assert!(matches!(column, Column::Username));
        assert_eq!(value, &Value::from("alice"));
    }

    #[test]
    fn test_compound_filters_are_not_equalities() {
        let filter = Filter::<user::Entity>::eq(Column::Username, "alice")
            .and(Filter::eq(Column::IsActive, true));
        assert!(filter.as_equality().is_none());
        assert!(Filter::<user::Entity>::ne(Column::Username, "alice")
            .as_equality()
            .is_none());
        assert!((!Filter::<user::Entity>::eq(Column::Username, "alice"))
            .as_equality()
            .is_none());
    }

    #[test]
    fn test_equality_against_null_is_not_translated() {
        let filter = Filter::<user::Entity>::eq(Column::City, Option::<String>::None);
        assert!(filter.as_equality().is_none());
    }

    #[test]
    fn test_matches_compound_filter() {
        let filter = Filter::<user::Entity>::eq(Column::Username, "alice")
            .and(Filter::eq(Column::IsActive, true));

        assert!(filter.matches(&user("alice", true, None)));
        assert!(!filter.matches(&user("alice", false, None)));
        assert!(!filter.matches(&user("bob", true, None)));
    }

    #[test]
    fn test_matches_or_and_not() {
        let filter = Filter::<user::Entity>::eq(Column::Username, "alice")
            .or(Filter::eq(Column::Username, "bob"));
        assert!(filter.matches(&user("bob", true, None)));
        assert!(!filter.matches(&user("carol", true, None)));

        let negated = !filter;
        assert!(negated.matches(&user("carol", true, None)));
        assert!(!negated.matches(&user("alice", true, None)));
    }

    #[test]
    fn test_null_comparisons_follow_sql() {
        let row = user("alice", true, None);

        assert!(!Filter::<user::Entity>::eq(Column::City, "Oxford").matches(&row));
        assert!(!Filter::<user::Entity>::ne(Column::City, "Oxford").matches(&row));
        assert!(!(!Filter::<user::Entity>::eq(Column::City, "Oxford")).matches(&row));
        assert!(Filter::<user::Entity>::is_null(Column::City).matches(&row));

        let row = user("alice", true, Some("Oxford"));
        assert!(Filter::<user::Entity>::ne(Column::City, "Cambridge").matches(&row));
        assert!(!Filter::<user::Entity>::is_null(Column::City).matches(&row));
    }

    #[test]
    fn test_and_flattens() {
        let filter = Filter::<user::Entity>::eq(Column::Username, "a")
            .and(Filter::eq(Column::Email, "b"))
            .and(Filter::eq(Column::IsActive, true));
        assert!(matches!(filter, Filter::And(ref parts) if parts.len() == 3));
    }

    #[test]
    fn test_condition_translation() {
        let filter = Filter::<user::Entity>::eq(Column::Username, "alice")
            .and(Filter::ne(Column::IsActive, false));
        let sql = user::Entity::find()
            .filter(filter.into_condition())
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.contains(r#""users"."username" = 'alice'"#));
        assert!(sql.contains(r#""users"."is_active" <>"#));
        assert!(sql.contains(" AND "));
    }
}
