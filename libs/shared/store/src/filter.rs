use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;

/// A conjunction of field conditions, evaluated by the in-memory backend
/// and translated to query parameters by the REST backend.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<Clause>,
}

#[derive(Debug, Clone)]
enum Clause {
    Eq(String, Value),
    Ne(String, Value),
    Gte(String, Value),
    Lte(String, Value),
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq<V: Serialize>(mut self, field: &str, value: V) -> Self {
        self.clauses.push(Clause::Eq(field.to_string(), to_value(value)));
        self
    }

    pub fn ne<V: Serialize>(mut self, field: &str, value: V) -> Self {
        self.clauses.push(Clause::Ne(field.to_string(), to_value(value)));
        self
    }

    pub fn gte<V: Serialize>(mut self, field: &str, value: V) -> Self {
        self.clauses.push(Clause::Gte(field.to_string(), to_value(value)));
        self
    }

    pub fn lte<V: Serialize>(mut self, field: &str, value: V) -> Self {
        self.clauses.push(Clause::Lte(field.to_string(), to_value(value)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Whether a document satisfies every clause.
    pub fn matches(&self, document: &Value) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::Eq(field, value) => document.get(field) == Some(value),
            Clause::Ne(field, value) => document.get(field) != Some(value),
            Clause::Gte(field, value) => document
                .get(field)
                .and_then(|actual| compare(actual, value))
                .is_some_and(|ordering| ordering != Ordering::Less),
            Clause::Lte(field, value) => document
                .get(field)
                .and_then(|actual| compare(actual, value))
                .is_some_and(|ordering| ordering != Ordering::Greater),
        })
    }

    /// PostgREST-style query pairs, e.g. `("doctor_id", "eq.<uuid>")`.
    pub fn to_query(&self) -> Vec<(String, String)> {
        self.clauses
            .iter()
            .map(|clause| match clause {
                Clause::Eq(field, value) => (field.clone(), format!("eq.{}", literal(value))),
                Clause::Ne(field, value) => (field.clone(), format!("neq.{}", literal(value))),
                Clause::Gte(field, value) => (field.clone(), format!("gte.{}", literal(value))),
                Clause::Lte(field, value) => (field.clone(), format!("lte.{}", literal(value))),
            })
            .collect()
    }
}

fn to_value<V: Serialize>(value: V) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Ordering between two JSON scalars; mixed or non-scalar types never
/// satisfy a range clause.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .zip(b.as_f64())
            .and_then(|(a, b)| a.partial_cmp(&b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
