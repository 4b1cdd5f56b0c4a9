use serde_json::Value;

/// A dotted path into a JSON record, e.g. `company.name`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn parse(path: &str) -> Self {
        FieldPath(
            path.split('.')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn lookup<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        self.0
            .iter()
            .try_fold(record, |value, segment| value.get(segment.as_str()))
    }
}

/// Matches parent records whose string field at `path` contains `needle`.
///
/// Records missing the field, or holding a non-string there, never match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldPredicate {
    path: FieldPath,
    needle: String,
}

impl FieldPredicate {
    pub fn new(path: FieldPath, needle: impl Into<String>) -> Self {
        Self {
            path,
            needle: needle.into(),
        }
    }

    pub fn matches(&self, record: &Value) -> bool {
        self.path
            .lookup(record)
            .and_then(Value::as_str)
            .is_some_and(|value| value.contains(&self.needle))
    }
}
