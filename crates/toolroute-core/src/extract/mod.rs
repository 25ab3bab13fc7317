//! Parameter extraction from free text
//!
//! For each field in a target tool's input schema, an ordered list of
//! pattern strategies is tried in sequence; the first strategy that
//! matches wins for that field, and later strategies are never merged in.
//! Fields that no strategy can extract are left absent rather than
//! defaulted.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Number, Value};

use crate::logging::SharedLogger;

/// Natural-language synonyms for well-known field names
///
/// Covers both English and CJK phrasings so inputs like "32 heads" and
/// "32头" extract the same way.
static FIELD_SYNONYMS: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let mut map: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
    map.insert("heads", &["heads", "head", "头"]);
    map.insert("legs", &["legs", "leg", "腿", "脚"]);
    map.insert("count", &["count", "amount", "total"]);
    map
});

static NUMBER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"-?\d+(?:\.\d+)?").unwrap()
});

/// How a schema field is interpreted during extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Integer,
    Number,
    NumberArray,
    Text,
}

impl FieldKind {
    fn from_schema(property: &Value) -> Self {
        match property.get("type").and_then(|t| t.as_str()) {
            Some("integer") => FieldKind::Integer,
            Some("number") => FieldKind::Number,
            Some("array") => FieldKind::NumberArray,
            _ => FieldKind::Text,
        }
    }
}

#[derive(Debug)]
struct FieldSpec {
    name: String,
    synonyms: Vec<String>,
    kind: FieldKind,
}

impl FieldSpec {
    fn new(name: &str, property: &Value) -> Self {
        let lower = name.to_lowercase();
        let mut synonyms = vec![lower.clone()];
        if let Some(extra) = FIELD_SYNONYMS.get(lower.as_str()) {
            for synonym in *extra {
                if !synonyms.iter().any(|s| s == synonym) {
                    synonyms.push((*synonym).to_string());
                }
            }
        }
        Self {
            name: name.to_string(),
            synonyms,
            kind: FieldKind::from_schema(property),
        }
    }
}

/// Ordered extraction strategies; index order is evaluation order.
type Strategy = fn(&str, &FieldSpec) -> Option<Value>;

const STRATEGIES: &[Strategy] = &[explicit_key_value, adjacent_number, typed_capture];

/// Pulls structured arguments out of free text per a tool's input schema
pub struct ParameterExtractor {
    logger: SharedLogger,
}

impl ParameterExtractor {
    /// Create an extractor
    pub fn new(logger: SharedLogger) -> Self {
        Self { logger }
    }

    /// Extract every schema property the strategies can find
    ///
    /// Unextractable fields are simply absent from the result.
    pub fn extract(&self, text: &str, schema: &Value) -> Map<String, Value> {
        let mut parameters = Map::new();

        let properties = match schema.get("properties").and_then(|p| p.as_object()) {
            Some(properties) => properties,
            None => return parameters,
        };

        for (name, property) in properties {
            let spec = FieldSpec::new(name, property);
            for strategy in STRATEGIES {
                if let Some(value) = strategy(text, &spec) {
                    self.logger.debug(&format!(
                        "[ParameterExtractor] Extracted {}={} from input",
                        name, value
                    ));
                    parameters.insert(name.clone(), value);
                    break;
                }
            }
        }

        parameters
    }
}

/// Strategy 1: explicit `key: value` / `key = value`
fn explicit_key_value(text: &str, spec: &FieldSpec) -> Option<Value> {
    for synonym in &spec.synonyms {
        let escaped = regex::escape(synonym);
        let value = match spec.kind {
            FieldKind::Text => {
                let pattern = format!(r#"(?i)\b{escaped}\s*[:=]\s*(?:"([^"]+)"|(\S+))"#);
                let re = Regex::new(&pattern).ok()?;
                let captures = re.captures(text)?;
                let raw = captures.get(1).or_else(|| captures.get(2))?.as_str();
                Some(Value::String(raw.to_string()))
            }
            FieldKind::NumberArray => {
                let pattern = format!(r"(?i)\b{escaped}\s*[:=]\s*([^\n]+)");
                let re = Regex::new(&pattern).ok()?;
                let raw = re.captures(text)?.get(1)?.as_str();
                let numbers: Vec<Value> = NUMBER_PATTERN
                    .find_iter(raw)
                    .filter_map(|m| parse_number(m.as_str(), FieldKind::Number))
                    .collect();
                if numbers.is_empty() {
                    None
                } else {
                    Some(Value::Array(numbers))
                }
            }
            _ => {
                let pattern = format!(r"(?i)\b{escaped}\s*[:=]\s*(-?\d+(?:\.\d+)?)");
                let re = Regex::new(&pattern).ok()?;
                let raw = re.captures(text)?.get(1)?.as_str();
                parse_number(raw, spec.kind)
            }
        };
        if value.is_some() {
            return value;
        }
    }
    None
}

/// Strategy 2: a number adjoining a field word, in either order
fn adjacent_number(text: &str, spec: &FieldSpec) -> Option<Value> {
    if !matches!(spec.kind, FieldKind::Integer | FieldKind::Number) {
        return None;
    }

    let alternation = spec
        .synonyms
        .iter()
        .map(|s| regex::escape(s))
        .collect::<Vec<_>>()
        .join("|");

    // "32 heads", "32只头"
    let before = format!(r"(?i)(-?\d+(?:\.\d+)?)\s*(?:个|只)?\s*(?:{alternation})");
    if let Ok(re) = Regex::new(&before) {
        if let Some(captures) = re.captures(text) {
            if let Some(value) = parse_number(captures.get(1)?.as_str(), spec.kind) {
                return Some(value);
            }
        }
    }

    // "heads are 32", "number of heads 32"
    let after = format!(r"(?i)(?:{alternation})\s*(?:is|are|of)?\s*(-?\d+(?:\.\d+)?)");
    if let Ok(re) = Regex::new(&after) {
        if let Some(captures) = re.captures(text) {
            if let Some(value) = parse_number(captures.get(1)?.as_str(), spec.kind) {
                return Some(value);
            }
        }
    }

    None
}

/// Strategy 3: type-generic capture
///
/// Arrays take every number in the input; a scalar is taken only when the
/// input contains exactly one number, so nothing is guessed.
fn typed_capture(text: &str, spec: &FieldSpec) -> Option<Value> {
    match spec.kind {
        FieldKind::NumberArray => {
            let numbers: Vec<Value> = NUMBER_PATTERN
                .find_iter(text)
                .filter_map(|m| parse_number(m.as_str(), FieldKind::Number))
                .collect();
            if numbers.is_empty() {
                None
            } else {
                Some(Value::Array(numbers))
            }
        }
        FieldKind::Integer | FieldKind::Number => {
            let mut iter = NUMBER_PATTERN.find_iter(text);
            let first = iter.next()?;
            if iter.next().is_some() {
                return None;
            }
            parse_number(first.as_str(), spec.kind)
        }
        FieldKind::Text => None,
    }
}

fn parse_number(raw: &str, kind: FieldKind) -> Option<Value> {
    match kind {
        FieldKind::Integer => raw.parse::<i64>().ok().map(Value::from),
        _ => raw
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::logging::NoOpLogger;
    use serde_json::json;

    fn extractor() -> ParameterExtractor {
        ParameterExtractor::new(Arc::new(NoOpLogger::new()))
    }

    fn heads_legs_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "heads": { "type": "integer" },
                "legs": { "type": "integer" }
            },
            "required": ["heads", "legs"]
        })
    }

    #[test]
    fn test_heads_and_legs_adjacency() {
        let parameters = extractor().extract(
            "a cage holds chickens and rabbits with 32 heads and 94 legs",
            &heads_legs_schema(),
        );
        assert_eq!(parameters["heads"], 32);
        assert_eq!(parameters["legs"], 94);
    }

    #[test]
    fn test_cjk_adjacency() {
        let parameters = extractor().extract("共有32个头和94只脚", &heads_legs_schema());
        assert_eq!(parameters["heads"], 32);
        assert_eq!(parameters["legs"], 94);
    }

    #[test]
    fn test_explicit_key_value_wins_first() {
        // Strategy 1 matches, so strategy 2's "32 heads" is never consulted.
        let parameters = extractor().extract("heads: 10 even though 32 heads", &heads_legs_schema());
        assert_eq!(parameters["heads"], 10);
    }

    #[test]
    fn test_key_equals_form() {
        let parameters = extractor().extract("heads=32, legs=94", &heads_legs_schema());
        assert_eq!(parameters["heads"], 32);
        assert_eq!(parameters["legs"], 94);
    }

    #[test]
    fn test_missing_field_is_absent_not_zero() {
        let parameters = extractor().extract("there are some animals in a cage", &heads_legs_schema());
        assert!(!parameters.contains_key("heads"));
        assert!(!parameters.contains_key("legs"));
    }

    #[test]
    fn test_number_array_takes_all_numbers() {
        let schema = json!({
            "type": "object",
            "properties": { "numbers": { "type": "array" } }
        });
        let parameters = extractor().extract("find the average of 3, 7 and 12.5", &schema);
        assert_eq!(parameters["numbers"], json!([3.0, 7.0, 12.5]));
    }

    #[test]
    fn test_lone_number_fills_scalar() {
        let schema = json!({
            "type": "object",
            "properties": { "x": { "type": "integer" } }
        });
        let parameters = extractor().extract("try with 7 please", &schema);
        assert_eq!(parameters["x"], 7);
    }

    #[test]
    fn test_ambiguous_scalar_is_not_guessed() {
        let schema = json!({
            "type": "object",
            "properties": { "x": { "type": "integer" } }
        });
        // Two candidate numbers and no naming signal: leave the field out.
        let parameters = extractor().extract("somewhere between 3 and 9", &schema);
        assert!(!parameters.contains_key("x"));
    }

    #[test]
    fn test_text_field_key_value() {
        let schema = json!({
            "type": "object",
            "properties": { "equation": { "type": "string" } }
        });
        let parameters = extractor().extract(r#"equation: "2x+3=11" please"#, &schema);
        assert_eq!(parameters["equation"], "2x+3=11");
    }

    #[test]
    fn test_schema_without_properties() {
        let parameters = extractor().extract("anything", &json!({"type": "object"}));
        assert!(parameters.is_empty());
    }
}
