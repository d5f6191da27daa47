use std::collections::BTreeMap;

use log::warn;
use serde_json::Value;

/// One group returned by a backend aggregation query.
///
/// `stacks`, when non-empty, is a secondary grouping of the same shape.
/// Buckets are extracted defensively: metric fields that are not numeric
/// are dropped at this boundary, so downstream transforms never see
/// untyped values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bucket {
    pub key: String,
    pub additional_key: Option<String>,
    pub metrics: BTreeMap<String, f64>,
    pub stacks: Vec<Bucket>,
}

impl Bucket {
    pub fn new(key: impl Into<String>) -> Bucket {
        Bucket {
            key: key.into(),
            ..Bucket::default()
        }
    }

    #[must_use]
    pub fn metric(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).copied()
    }

    /// Missing numeric fields count as zero.
    #[must_use]
    pub fn metric_or_zero(&self, key: &str) -> f64 {
        self.metric(key).unwrap_or(0.0)
    }

    pub fn with_metric(mut self, key: impl Into<String>, value: f64) -> Bucket {
        self.metrics.insert(key.into(), value);
        self
    }

    pub fn with_additional_key(mut self, additional_key: impl Into<String>) -> Bucket {
        self.additional_key = Some(additional_key.into());
        self
    }

    pub fn with_stacks(mut self, stacks: Vec<Bucket>) -> Bucket {
        self.stacks = stacks;
        self
    }

    /// Extracts a bucket from one JSON aggregation object.
    ///
    /// Returns `None` for values that are not objects. Within an object,
    /// `key` may arrive as a string or a number; everything else numeric
    /// becomes a metric field and non-numeric extras are skipped.
    pub fn from_value(value: &Value) -> Option<Bucket> {
        let obj = match value.as_object() {
            Some(obj) => obj,
            None => {
                warn!("Aggregation entry is not an object, skipping record");
                return None;
            }
        };

        let key = match obj.get("key") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };

        let additional_key = obj
            .get("additional_key")
            .and_then(Value::as_str)
            .map(String::from);

        let stacks = obj
            .get("stacks")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().filter_map(Bucket::from_value).collect())
            .unwrap_or_default();

        let mut metrics = BTreeMap::new();
        for (name, field) in obj {
            if matches!(name.as_str(), "key" | "additional_key" | "stacks") {
                continue;
            }
            match field.as_f64() {
                Some(num) => {
                    metrics.insert(name.clone(), num);
                }
                None => {
                    log::debug!("Dropping non-numeric field '{}' on bucket '{}'", name, key);
                }
            }
        }

        Some(Bucket {
            key,
            additional_key,
            metrics,
            stacks,
        })
    }

    /// Extracts all buckets from a JSON aggregation payload.
    ///
    /// Anything other than an array yields an empty bucket set; malformed
    /// entries inside the array are skipped.
    pub fn from_payload(payload: &Value) -> Vec<Bucket> {
        match payload.as_array() {
            Some(entries) => entries.iter().filter_map(Bucket::from_value).collect(),
            None => {
                warn!("Aggregation payload is not an array, producing empty series");
                Vec::new()
            }
        }
    }
}

/// Value of one chart row field. Numeric fields carry data; text fields
/// carry sentinels such as "No Data".
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Num(f64),
    Text(String),
}

impl FieldValue {
    #[must_use]
    pub fn as_num(&self) -> Option<f64> {
        match self {
            FieldValue::Num(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }

    /// The "No Data" sentinel for time buckets without backing data.
    #[must_use]
    pub fn no_data() -> FieldValue {
        FieldValue::Text(crate::defaults::NO_DATA_LABEL.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Num(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

/// One output row per category (or per time bucket for trend reports).
///
/// Fields keep insertion order: stacked chart segments render in the order
/// the collapser produced them, so the container must not reorder keys.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub name: String,
    pub key: Option<String>,
    pub timestamp: Option<i64>,
    fields: Vec<(String, FieldValue)>,
}

impl Row {
    pub fn new(name: impl Into<String>) -> Row {
        Row {
            name: name.into(),
            ..Row::default()
        }
    }

    /// Sets a field, replacing an existing value in place so the original
    /// position is retained.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((field, value)),
        }
    }

    /// Adds to a numeric field, creating it when absent. A present
    /// non-numeric value is replaced.
    pub fn add_num(&mut self, field: impl Into<String>, value: f64) {
        let field = field.into();
        let current = self.num(&field).unwrap_or(0.0);
        self.set(field, current + value);
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn num(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_num)
    }

    #[must_use]
    pub fn num_or_zero(&self, field: &str) -> f64 {
        self.num(field).unwrap_or(0.0)
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        let index = self.fields.iter().position(|(name, _)| name == field)?;
        Some(self.fields.remove(index).1)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}
