use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

lazy_static! {
    static ref LIST_ITEM: Regex = Regex::new(r#"'([^']*)'|"([^"]*)""#).expect("valid regex");
}

/// One faculty profile as stored in the index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacultyRecord {
    pub faculty_id: String,
    pub name: String,
    pub mail: String,
    pub phd_field: String,
    pub specialization: String,
    pub research: String,
    pub publications: String,
    pub bio: String,
}

/// A faculty profile as produced by the ingestion pipeline.
///
/// Every field is optional upstream; absent, null or non-text values decode
/// to the empty string so building never fails on a sparse record. Only
/// self-describing formats (JSON) can decode this type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFacultyRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub faculty_id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, alias = "email", deserialize_with = "lenient_text")]
    pub mail: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub phd_field: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub specialization: String,
    #[serde(default, alias = "Research", deserialize_with = "lenient_text")]
    pub research: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub publications: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub bio: String,
}

impl From<RawFacultyRecord> for FacultyRecord {
    fn from(raw: RawFacultyRecord) -> Self {
        Self {
            faculty_id: raw.faculty_id,
            name: raw.name,
            mail: raw.mail,
            phd_field: raw.phd_field,
            specialization: raw.specialization,
            research: raw.research,
            publications: raw.publications,
            bio: raw.bio,
        }
    }
}

/// Static integer repetition count per profile field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldWeights {
    pub research: usize,
    pub specialization: usize,
    pub publications: usize,
    pub bio: usize,
    pub phd_field: usize,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self { research: 3, specialization: 2, publications: 2, bio: 1, phd_field: 0 }
    }
}

impl FacultyRecord {
    /// Decode one upstream JSON record leniently.
    pub fn from_json(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value::<RawFacultyRecord>(value).map(Self::from)
    }

    /// Concatenate the weighted fields into one lower-cased document.
    ///
    /// Each repetition is separated by a space so the last word of one copy
    /// never fuses with the first word of the next.
    pub fn document(&self, weights: &FieldWeights) -> String {
        let fields = [
            (self.research.as_str(), weights.research),
            (self.specialization.as_str(), weights.specialization),
            (self.publications.as_str(), weights.publications),
            (self.bio.as_str(), weights.bio),
            (self.phd_field.as_str(), weights.phd_field),
        ];
        let mut parts: Vec<&str> = Vec::new();
        for (text, times) in fields {
            let text = text.trim();
            if text.is_empty() { continue; }
            parts.extend(std::iter::repeat(text).take(times));
        }
        parts.join(" ").to_lowercase()
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(|v| value_to_text(&v)).unwrap_or_default())
}

/// Coerce an arbitrary JSON value to field text.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => list_literal_items(s).map(|items| items.join(" ")).unwrap_or_else(|| s.clone()),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        Value::Null | Value::Object(_) => String::new(),
    }
}

/// Items of a stringified list such as `['nlp', 'computer vision']`.
fn list_literal_items(s: &str) -> Option<Vec<String>> {
    let inner = s.trim().strip_prefix('[')?.strip_suffix(']')?;
    if inner.trim().is_empty() {
        return Some(Vec::new());
    }
    let items: Vec<String> = LIST_ITEM
        .captures_iter(inner)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() { None } else { Some(items) }
}
