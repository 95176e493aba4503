//! Constraint-sets: filters, ordering and limits.
//!
//! A [`Query`] describes which documents of a collection a binding matches
//! and in what order. Evaluation is type-strict:
//!
//! - numbers compare with numbers (`4 == 4.0`), strings lexicographically,
//!   booleans with booleans
//! - a filter never matches a document that lacks the field or holds a value
//!   of another type
//! - an ordered query excludes documents that lack the order field
//! - ties, and unordered queries, fall back to ascending document id
//!
//! # Example
//!
//! ```
//! use livedoc_core::{Direction, Filter, Query};
//!
//! let inbox = Query::new()
//!     .filter(Filter::eq("toId", "u1"))
//!     .order_by("createdAt", Direction::Descending);
//! assert!(inbox.validate().is_ok());
//! ```

use crate::document::Document;
use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FilterOp {
    /// Field equals the value.
    Eq,
    /// Field is present and differs from the value.
    NotEq,
    /// Field is less than the value.
    Lt,
    /// Field is less than or equal to the value.
    Le,
    /// Field is greater than the value.
    Gt,
    /// Field is greater than or equal to the value.
    Ge,
}

impl FilterOp {
    /// Returns the operator's textual form.
    pub fn symbol(self) -> &'static str {
        match self {
            FilterOp::Eq => "==",
            FilterOp::NotEq => "!=",
            FilterOp::Lt => "<",
            FilterOp::Le => "<=",
            FilterOp::Gt => ">",
            FilterOp::Ge => ">=",
        }
    }
}

/// A single predicate on one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Field the predicate reads.
    pub field: String,
    /// Comparison operator.
    pub op: FilterOp,
    /// Right-hand side of the comparison.
    pub value: Value,
}

impl Filter {
    /// Creates a filter.
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// `field == value`.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    /// `field != value`.
    pub fn not_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::NotEq, value)
    }

    /// `field < value`.
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Lt, value)
    }

    /// `field <= value`.
    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Le, value)
    }

    /// `field > value`.
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Gt, value)
    }

    /// `field >= value`.
    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Ge, value)
    }

    /// Evaluates the predicate against a document.
    pub fn matches(&self, doc: &Document) -> bool {
        let Some(actual) = doc.get(&self.field) else {
            return false;
        };
        match self.op {
            FilterOp::Eq => values_equal(actual, &self.value),
            FilterOp::NotEq => {
                type_rank(actual) == type_rank(&self.value) && !values_equal(actual, &self.value)
            }
            FilterOp::Lt => compare_same_type(actual, &self.value) == Some(Ordering::Less),
            FilterOp::Le => matches!(
                compare_same_type(actual, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOp::Gt => compare_same_type(actual, &self.value) == Some(Ordering::Greater),
            FilterOp::Ge => matches!(
                compare_same_type(actual, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.op.symbol(), self.value)
    }
}

/// Parses `field=value`, `field!=value`, `field<value`, `field<=value`,
/// `field>value` or `field>=value`.
///
/// The value is read as JSON when it parses (`read=false`, `term=2`) and
/// as a plain string otherwise (`studentId=u1`).
impl FromStr for Filter {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Earliest operator wins; at the same position the longer symbol does.
        const OPERATORS: [(&str, FilterOp); 7] = [
            ("!=", FilterOp::NotEq),
            ("<=", FilterOp::Le),
            (">=", FilterOp::Ge),
            ("==", FilterOp::Eq),
            ("=", FilterOp::Eq),
            ("<", FilterOp::Lt),
            (">", FilterOp::Gt),
        ];

        let (pos, symbol, op) = OPERATORS
            .iter()
            .filter_map(|(symbol, op)| s.find(symbol).map(|pos| (pos, *symbol, *op)))
            .min_by_key(|(pos, symbol, _)| (*pos, std::cmp::Reverse(symbol.len())))
            .ok_or_else(|| StoreError::validation(format!("no operator in filter `{s}`")))?;

        let field = s[..pos].trim();
        if field.is_empty() {
            return Err(StoreError::validation(format!(
                "missing field name in filter `{s}`"
            )));
        }
        let raw = s[pos + symbol.len()..].trim();
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        Ok(Filter::new(field, op, value))
    }
}

/// Sort direction of an [`OrderBy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

/// Ordering directive of a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderBy {
    /// Field to sort by.
    pub field: String,
    /// Sort direction.
    pub direction: Direction,
}

/// A constraint-set: conjunctive filters, at most one ordering, an optional
/// limit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Filters, all of which must match.
    pub filters: Vec<Filter>,
    /// Optional ordering.
    pub order: Option<OrderBy>,
    /// Optional maximum number of documents.
    pub limit: Option<usize>,
}

impl Query {
    /// Creates an empty query matching every document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Adds an equality filter.
    #[must_use]
    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::eq(field, value))
    }

    /// Sets the ordering, replacing any previous one.
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Sets the limit.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Checks that the query can be evaluated.
    pub fn validate(&self) -> StoreResult<()> {
        if let Some(filter) = self.filters.iter().find(|f| f.field.is_empty()) {
            return Err(StoreError::validation(format!(
                "filter `{filter}` has an empty field name"
            )));
        }
        if let Some(order) = &self.order {
            if order.field.is_empty() {
                return Err(StoreError::validation("order_by field must not be empty"));
            }
        }
        if self.limit == Some(0) {
            return Err(StoreError::validation("limit must be positive"));
        }
        Ok(())
    }

    /// Returns true if the document passes every filter.
    ///
    /// Ordering and limit are not considered.
    pub fn matches(&self, doc: &Document) -> bool {
        self.filters.iter().all(|f| f.matches(doc))
    }

    /// Evaluates the query over a collection's documents.
    pub fn apply<'a, I>(&self, docs: I) -> Vec<Document>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let mut matched: Vec<&Document> = docs
            .into_iter()
            .filter(|doc| self.matches(doc))
            .filter(|doc| match &self.order {
                Some(order) => doc.get(&order.field).is_some(),
                None => true,
            })
            .collect();

        matched.sort_by(|a, b| {
            let by_field = match &self.order {
                Some(order) => {
                    let ord = match (a.get(&order.field), b.get(&order.field)) {
                        (Some(x), Some(y)) => total_order(x, y),
                        _ => Ordering::Equal,
                    };
                    match order.direction {
                        Direction::Ascending => ord,
                        Direction::Descending => ord.reverse(),
                    }
                }
                None => Ordering::Equal,
            };
            by_field.then_with(|| a.id.cmp(&b.id))
        });

        let limit = self.limit.unwrap_or(usize::MAX);
        matched.into_iter().take(limit).cloned().collect()
    }

    /// Returns the semantic identity of the constraint-set.
    ///
    /// Two queries with the same fingerprint match the same documents in the
    /// same order; the order in which filters were added does not matter.
    pub fn fingerprint(&self) -> String {
        let mut filters: Vec<Value> = self
            .filters
            .iter()
            .map(|f| json!([f.field, f.op.symbol(), f.value]))
            .collect();
        filters.sort_by_cached_key(Value::to_string);
        filters.dedup();

        let order = self
            .order
            .as_ref()
            .map(|o| json!([o.field, o.direction]));
        json!({ "where": filters, "order": order, "limit": self.limit }).to_string()
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare_same_type(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order used for sorting: by type rank, then by value.
fn total_order(a: &Value, b: &Value) -> Ordering {
    type_rank(a)
        .cmp(&type_rank(b))
        .then_with(|| compare_same_type(a, b).unwrap_or(Ordering::Equal))
}
