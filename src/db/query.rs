use serde_json::Value;

use super::Document;

/// Dotted path into a document, e.g. `addedBy.email`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn new(dotted: &str) -> Self {
        Self(dotted.split('.').map(String::from).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn lookup<'a>(&self, doc: &'a Document) -> Option<&'a Value> {
        let (first, rest) = self.0.split_first()?;
        rest.iter()
            .try_fold(doc.get(first)?, |value, segment| value.get(segment))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    All,
    Eq { field: FieldPath, value: String },
    ContainsIgnoreCase { field: FieldPath, needle: String },
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<String>) -> Self {
        Filter::Eq {
            field: FieldPath::new(field),
            value: value.into(),
        }
    }

    pub fn contains_ignore_case(field: &str, needle: impl Into<String>) -> Self {
        Filter::ContainsIgnoreCase {
            field: FieldPath::new(field),
            needle: needle.into(),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq { field, value } => field
                .lookup(doc)
                .and_then(as_text)
                .is_some_and(|found| found == *value),
            Filter::ContainsIgnoreCase { field, needle } => field
                .lookup(doc)
                .and_then(as_text)
                .is_some_and(|found| found.to_lowercase().contains(&needle.to_lowercase())),
        }
    }
}

/// Text form of a value, matching what Postgres `#>>` yields.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Sort {
    /// Insertion order.
    #[default]
    Natural,
    /// Largest first, using jsonb ordering across types: objects, arrays,
    /// booleans, numbers, strings, then `null`. Missing values sort last and
    /// ties keep insertion order.
    Descending(FieldPath),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub filter: Filter,
    pub sort: Sort,
    /// `None` returns every match.
    pub limit: Option<i64>,
}

impl QuerySpec {
    pub fn all() -> Self {
        Self {
            filter: Filter::All,
            sort: Sort::Natural,
            limit: None,
        }
    }

    pub fn filtered(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::all()
        }
    }
}

/// Single-document update applied atomically by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// Overwrite the given top-level fields, keeping the rest.
    Set(Document),
    /// Add a delta to numeric top-level fields; a missing field starts at 0.
    Inc(Vec<(String, i64)>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_nested_lookup() {
        let food = doc(json!({ "addedBy": { "email": "chef@kitchen.io" } }));

        assert_eq!(
            FieldPath::new("addedBy.email").lookup(&food),
            Some(&json!("chef@kitchen.io"))
        );
        assert_eq!(FieldPath::new("addedBy.name").lookup(&food), None);
        assert_eq!(FieldPath::new("missing.email").lookup(&food), None);
    }

    #[test]
    fn test_contains_ignores_case() {
        let food = doc(json!({ "foodName": "Spicy ABC Noodles" }));

        assert!(Filter::contains_ignore_case("foodName", "abc").matches(&food));
        assert!(Filter::contains_ignore_case("foodName", "NOODLE").matches(&food));
        assert!(!Filter::contains_ignore_case("foodName", "rice").matches(&food));
    }

    #[test]
    fn test_eq_compares_text_form() {
        let order = doc(json!({ "buyerEmail": "a@b.com", "count": 3, "note": null }));

        assert!(Filter::eq("buyerEmail", "a@b.com").matches(&order));
        assert!(!Filter::eq("buyerEmail", "A@B.COM").matches(&order));
        assert!(Filter::eq("count", "3").matches(&order));
        assert!(!Filter::eq("note", "null").matches(&order));
        assert!(Filter::All.matches(&order));
    }
}
