use serde_json::Value;

#[derive(Clone, Debug, Default)]
pub struct RawRecord {
    pub timestamp: Option<String>,
    pub primary: Value,
    pub secondary: Value,
    pub tertiary: Value,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordFields {
    pub timestamp: String,
    pub primary: String,
    pub secondary: String,
    pub tertiary: String,
}

impl Default for RecordFields {
    fn default() -> Self {
        Self {
            timestamp: "timestamp".to_owned(),
            primary: "calories".to_owned(),
            secondary: "heart_rate".to_owned(),
            tertiary: "steps".to_owned(),
        }
    }
}

impl RecordFields {
    pub(super) fn extract(&self, row: &serde_json::Map<String, Value>) -> RawRecord {
        let cell = |name: &str| row.get(name).cloned().unwrap_or(Value::Null);
        RawRecord {
            timestamp: row
                .get(&self.timestamp)
                .and_then(|value| match value {
                    Value::String(text) => Some(text.clone()),
                    Value::Number(number) => Some(number.to_string()),
                    _ => None,
                }),
            primary: cell(&self.primary),
            secondary: cell(&self.secondary),
            tertiary: cell(&self.tertiary),
        }
    }
}

pub fn numeric_value(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|value| value.is_finite())
}
