//! Request body validation.
//!
//! Every field of a payload is checked in one pass and all violations are
//! collected with their dotted path (`conversationHistory.3.content`).
//! Normalizing transforms (trim, lowercase) run before the checks, so the
//! returned data is exactly what was validated.

mod schemas;

pub use schemas::{ChatRequest, ContactStatusUpdate, LoginRequest};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").unwrap());

/// One violated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every violation found in a payload, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[serde(transparent)]
#[error("{} field(s) failed validation", .0.len())]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn fields(&self) -> Vec<String> {
        self.0.iter().map(|e| e.field.clone()).collect()
    }
}

pub type ValidationOutcome<T> = Result<T, ValidationErrors>;

/// Collects violations while a schema walks its payload.
#[derive(Debug, Default)]
pub struct Report {
    errors: Vec<FieldError>,
}

impl Report {
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A payload shape that can be parsed from a JSON object.
///
/// `parse` must visit every field before combining them so that all
/// violations land in `report`. It returns `None` when anything failed.
pub trait Schema: Sized {
    fn parse(object: &Object<'_>, report: &mut Report) -> Option<Self>;
}

/// Validate `input` against `T`. Never panics on malformed input.
pub fn validate<T: Schema>(input: &Value) -> ValidationOutcome<T> {
    let Some(map) = input.as_object() else {
        return Err(ValidationErrors(vec![FieldError {
            field: "(root)".into(),
            message: format!("Expected object, received {}", type_name(input)),
        }]));
    };

    let mut report = Report::default();
    let parsed = T::parse(&Object::root(map), &mut report);
    match parsed {
        Some(value) if report.is_empty() => Ok(value),
        _ => Err(ValidationErrors(report.errors)),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Rules for one string field.
#[derive(Debug, Clone)]
pub struct Text {
    label: &'static str,
    min: usize,
    max: usize,
    trim: bool,
    lowercase: bool,
    email: bool,
    url: bool,
    pattern: Option<(&'static Regex, &'static str)>,
}

impl Text {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            min: 0,
            max: usize::MAX,
            trim: false,
            lowercase: false,
            email: false,
            url: false,
            pattern: None,
        }
    }

    /// Allowed length in characters, inclusive.
    pub fn chars(mut self, min: usize, max: usize) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn trimmed(mut self) -> Self {
        self.trim = true;
        self
    }

    pub fn lowercase(mut self) -> Self {
        self.lowercase = true;
        self
    }

    pub fn email(mut self) -> Self {
        self.email = true;
        self
    }

    pub fn url(mut self) -> Self {
        self.url = true;
        self
    }

    pub fn pattern(mut self, regex: &'static Regex, message: &'static str) -> Self {
        self.pattern = Some((regex, message));
        self
    }

    fn normalize(&self, raw: &str) -> String {
        let value = if self.trim { raw.trim() } else { raw };
        if self.lowercase {
            value.to_lowercase()
        } else {
            value.to_string()
        }
    }

    /// Normalize `raw` and check it, recording each violated rule.
    fn apply(&self, raw: &str, path: &str, report: &mut Report) -> Option<String> {
        let value = self.normalize(raw);
        let before = report.errors.len();
        let chars = value.chars().count();

        if chars < self.min {
            if self.min == 1 {
                report.push(path, format!("{} is required", self.label));
            } else {
                report.push(path, format!("{} must be at least {} characters", self.label, self.min));
            }
        } else if chars > self.max {
            report.push(path, format!("{} must be at most {} characters", self.label, self.max));
        }

        if chars > 0 {
            if self.email && !EMAIL_RE.is_match(&value) {
                report.push(path, "Invalid email address");
            }
            if self.url && !URL_RE.is_match(&value) {
                report.push(path, format!("{} must be a valid http(s) URL", self.label));
            }
            if let Some((regex, message)) = self.pattern {
                if !regex.is_match(&value) {
                    report.push(path, message);
                }
            }
        }

        (report.errors.len() == before).then_some(value)
    }
}

/// A JSON object positioned at some path inside the payload.
pub struct Object<'a> {
    map: &'a Map<String, Value>,
    path: String,
}

impl<'a> Object<'a> {
    fn root(map: &'a Map<String, Value>) -> Self {
        Self {
            map,
            path: String::new(),
        }
    }

    fn path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        }
    }

    fn present(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    /// A required string.
    pub fn string(&self, key: &str, rule: &Text, report: &mut Report) -> Option<String> {
        let path = self.path(key);
        match self.present(key) {
            None => {
                report.push(path, "Required");
                None
            }
            Some(Value::String(raw)) => rule.apply(raw, &path, report),
            Some(other) => {
                report.push(path, format!("Expected string, received {}", type_name(other)));
                None
            }
        }
    }

    /// An optional string. Missing, null, and blank values are all absent.
    pub fn optional_string(
        &self,
        key: &str,
        rule: &Text,
        report: &mut Report,
    ) -> Option<Option<String>> {
        let path = self.path(key);
        match self.present(key) {
            None => Some(None),
            Some(Value::String(raw)) if raw.trim().is_empty() => Some(None),
            Some(Value::String(raw)) => rule.apply(raw, &path, report).map(Some),
            Some(other) => {
                report.push(path, format!("Expected string, received {}", type_name(other)));
                None
            }
        }
    }

    /// A string restricted to `allowed`.
    pub fn one_of(&self, key: &str, allowed: &[&str], report: &mut Report) -> Option<String> {
        let value = self.string(key, &Text::new(""), report)?;
        if allowed.contains(&value.as_str()) {
            return Some(value);
        }
        let expected = allowed
            .iter()
            .map(|a| format!("'{a}'"))
            .collect::<Vec<_>>()
            .join(" | ");
        report.push(
            self.path(key),
            format!("Invalid enum value. Expected {expected}, received '{value}'"),
        );
        None
    }

    pub fn boolean(&self, key: &str, report: &mut Report) -> Option<bool> {
        let path = self.path(key);
        match self.present(key) {
            None => {
                report.push(path, "Required");
                None
            }
            Some(Value::Bool(b)) => Some(*b),
            Some(other) => {
                report.push(path, format!("Expected boolean, received {}", type_name(other)));
                None
            }
        }
    }

    pub fn boolean_or(&self, key: &str, default: bool, report: &mut Report) -> Option<bool> {
        if self.present(key).is_none() {
            return Some(default);
        }
        self.boolean(key, report)
    }

    /// An integer in `min..=max`; `default` applies when the field is absent.
    pub fn integer(
        &self,
        key: &str,
        label: &str,
        min: i64,
        max: i64,
        default: Option<i64>,
        report: &mut Report,
    ) -> Option<i64> {
        let path = self.path(key);
        let value = match (self.present(key), default) {
            (None, Some(default)) => return Some(default),
            (None, None) => {
                report.push(path, "Required");
                return None;
            }
            (Some(Value::Number(n)), _) => match n.as_i64() {
                Some(v) => v,
                None => {
                    report.push(path, "Expected integer, received float");
                    return None;
                }
            },
            (Some(other), _) => {
                report.push(path, format!("Expected number, received {}", type_name(other)));
                return None;
            }
        };

        if value < min {
            report.push(path, format!("{label} must be at least {min}"));
            None
        } else if value > max {
            report.push(path, format!("{label} must be at most {max}"));
            None
        } else {
            Some(value)
        }
    }

    fn array(&self, key: &str, label: &str, max_items: usize, report: &mut Report) -> Option<&'a [Value]> {
        let path = self.path(key);
        match self.present(key) {
            None => Some(&[]),
            Some(Value::Array(items)) if items.len() > max_items => {
                report.push(path, format!("{label} can have at most {max_items} items"));
                None
            }
            Some(Value::Array(items)) => Some(items.as_slice()),
            Some(other) => {
                report.push(path, format!("Expected array, received {}", type_name(other)));
                None
            }
        }
    }

    /// An optional list of strings, each checked against `rule`. Absent means empty.
    pub fn string_list(
        &self,
        key: &str,
        label: &str,
        max_items: usize,
        rule: &Text,
        report: &mut Report,
    ) -> Option<Vec<String>> {
        let items = self.array(key, label, max_items, report)?;
        let base = self.path(key);
        let mut out = Vec::with_capacity(items.len());
        let mut ok = true;
        for (i, item) in items.iter().enumerate() {
            let path = format!("{base}.{i}");
            match item {
                Value::String(raw) => match rule.apply(raw, &path, report) {
                    Some(value) => out.push(value),
                    None => ok = false,
                },
                other => {
                    report.push(path, format!("Expected string, received {}", type_name(other)));
                    ok = false;
                }
            }
        }
        ok.then_some(out)
    }

    /// An optional list of objects, each parsed with `parse`. Absent means empty.
    pub fn object_list<T>(
        &self,
        key: &str,
        label: &str,
        max_items: usize,
        report: &mut Report,
        parse: impl Fn(&Object<'a>, &mut Report) -> Option<T>,
    ) -> Option<Vec<T>> {
        let items = self.array(key, label, max_items, report)?;
        let base = self.path(key);
        let mut out = Vec::with_capacity(items.len());
        let mut ok = true;
        for (i, item) in items.iter().enumerate() {
            let path = format!("{base}.{i}");
            match item {
                Value::Object(map) => match parse(&Object { map, path }, report) {
                    Some(value) => out.push(value),
                    None => ok = false,
                },
                other => {
                    report.push(path, format!("Expected object, received {}", type_name(other)));
                    ok = false;
                }
            }
        }
        ok.then_some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Sample {
        name: String,
        email: String,
        tags: Vec<String>,
        count: i64,
    }

    impl Schema for Sample {
        fn parse(object: &Object<'_>, report: &mut Report) -> Option<Self> {
            let name = object.string("name", &Text::new("Name").trimmed().chars(2, 5), report);
            let email = object.string("email", &Text::new("Email").trimmed().lowercase().email(), report);
            let tags = object.string_list("tags", "Tags", 2, &Text::new("Tag").chars(1, 3), report);
            let count = object.integer("count", "Count", 1, 10, Some(1), report);
            Some(Self {
                name: name?,
                email: email?,
                tags: tags?,
                count: count?,
            })
        }
    }

    #[test]
    fn normalizes_before_checking() {
        let sample: Sample = validate(&json!({"name": "  Bob  ", "email": " BOB@Example.com "})).unwrap();
        assert_eq!(sample.name, "Bob");
        assert_eq!(sample.email, "bob@example.com");
        assert!(sample.tags.is_empty());
        assert_eq!(sample.count, 1);
    }

    #[test]
    fn collects_every_violation() {
        let errors = validate::<Sample>(&json!({
            "email": "nope",
            "tags": ["ok", "toolong"],
            "count": 11
        }))
        .err()
        .unwrap();
        assert_eq!(errors.fields(), vec!["name", "email", "tags.1", "count"]);
        assert_eq!(errors.0[0].message, "Required");
        assert_eq!(errors.0[1].message, "Invalid email address");
        assert_eq!(errors.0[3].message, "Count must be at most 10");
    }

    #[test]
    fn reports_type_mismatches() {
        let errors = validate::<Sample>(&json!({"name": 42, "email": "a@b.co", "count": 2.5}))
            .err()
            .unwrap();
        assert_eq!(errors.0[0].message, "Expected string, received number");
        assert_eq!(errors.0[1].message, "Expected integer, received float");
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let errors = validate::<Sample>(&json!([1, 2])).err().unwrap();
        assert_eq!(errors.0.len(), 1);
        assert_eq!(errors.0[0].message, "Expected object, received array");
    }

    #[test]
    fn too_many_items_is_one_error() {
        let errors = validate::<Sample>(&json!({
            "name": "Bob", "email": "a@b.co", "tags": ["a", "b", "c"]
        }))
        .err()
        .unwrap();
        assert_eq!(errors.fields(), vec!["tags"]);
        assert_eq!(errors.0[0].message, "Tags can have at most 2 items");
    }

    #[test]
    fn errors_serialize_as_a_plain_list() {
        let errors = ValidationErrors(vec![FieldError {
            field: "email".into(),
            message: "Invalid email address".into(),
        }]);
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            json!([{"field": "email", "message": "Invalid email address"}])
        );
    }
}
