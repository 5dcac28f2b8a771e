//! Pulling the brand JSON object out of free-text model output.

use brandfind_core::{AdditionalInfo, SearchConfidence};
use serde_json::{Map, Value};

/// Characters of raw text kept as `description` when parsing fails.
pub const FALLBACK_DESCRIPTION_CHARS: usize = 200;

/// Structured fields decoded from the model's JSON answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandPayload {
    pub website_url: Option<String>,
    pub description: Option<String>,
    pub additional_info: AdditionalInfo,
    pub search_confidence: SearchConfidence,
    pub notes: Option<String>,
}

/// Return the first top-level `{...}` block in `text`.
///
/// Braces inside JSON strings (including escaped quotes) are ignored, so a
/// URL or description containing `}` does not cut the object short. Returns
/// `None` when there is no opening brace or the first object never closes.
#[must_use]
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Extract, parse, and validate the brand object in `text`.
///
/// # Errors
///
/// Returns a human-readable reason when no object is found, it is not valid
/// JSON, or a field has the wrong type.
pub fn parse_brand_payload(text: &str) -> Result<BrandPayload, String> {
    let raw = extract_json_object(text).ok_or_else(|| "no JSON object in response".to_owned())?;
    let value: Value = serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))?;
    let Value::Object(obj) = value else {
        return Err("response JSON is not an object".to_owned());
    };
    validate_payload(&obj)
}

fn validate_payload(obj: &Map<String, Value>) -> Result<BrandPayload, String> {
    if !obj.contains_key("website_url") {
        return Err("missing field website_url".to_owned());
    }

    if let Some(name) = obj.get("brand_name") {
        if !(name.is_string() || name.is_null()) {
            return Err("brand_name must be a string".to_owned());
        }
    }

    let website_url = match obj.get("website_url") {
        Some(Value::String(s)) => normalize_url(s),
        Some(Value::Null) | None => None,
        Some(_) => return Err("website_url must be a string or null".to_owned()),
    };

    let search_confidence = match obj.get("search_confidence") {
        None | Some(Value::Null) => SearchConfidence::Low,
        Some(Value::String(s)) => SearchConfidence::parse(s)
            .ok_or_else(|| format!("unknown search_confidence '{s}'"))?,
        Some(_) => return Err("search_confidence must be a string".to_owned()),
    };

    let additional_info = match obj.get("additional_info") {
        None | Some(Value::Null) => AdditionalInfo::default(),
        Some(Value::Object(info)) => AdditionalInfo {
            founded: text_field(info, "additional_info.founded", "founded")?,
            location: text_field(info, "additional_info.location", "location")?,
            specialties: text_field(info, "additional_info.specialties", "specialties")?,
        },
        Some(_) => return Err("additional_info must be an object".to_owned()),
    };

    Ok(BrandPayload {
        website_url,
        description: text_field(obj, "description", "description")?,
        additional_info,
        search_confidence,
        notes: text_field(obj, "notes", "notes")?,
    })
}

/// Optional free-text field. Numbers are accepted and stringified (models
/// often answer `"founded": 1998`); arrays of strings are joined.
fn text_field(obj: &Map<String, Value>, label: &str, key: &str) -> Result<Option<String>, String> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone()).filter(|s| !s.trim().is_empty())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Array(items)) => {
            let parts: Option<Vec<&str>> = items.iter().map(Value::as_str).collect();
            parts
                .map(|p| Some(p.join(", ")))
                .ok_or_else(|| format!("{label} must be text"))
        }
        Some(_) => Err(format!("{label} must be text")),
    }
}

fn normalize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

/// Leading slice of `text` used as the description of an unparseable answer.
#[must_use]
pub fn fallback_description(text: &str) -> String {
    text.chars().take(FALLBACK_DESCRIPTION_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_object_surrounded_by_prose() {
        let text = "Here you go:\n```json\n{\"a\": {\"b\": 1}}\n```\nThanks";
        assert_eq!(extract_json_object(text), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn ignores_braces_inside_strings() {
        let text = r#"{"notes": "uses } and { and \"quotes\"", "x": 1} trailing {"y": 2}"#;
        assert_eq!(
            extract_json_object(text),
            Some(r#"{"notes": "uses } and { and \"quotes\"", "x": 1}"#)
        );
    }

    #[test]
    fn returns_none_without_object() {
        assert_eq!(extract_json_object("I could not find it."), None);
        assert_eq!(extract_json_object("{\"unterminated\": 1"), None);
    }

    #[test]
    fn parses_full_payload() {
        let text = r#"{
            "brand_name": "Acme Blades",
            "website_url": " https://acmeblades.com ",
            "description": "Knife maker",
            "additional_info": {"founded": 1998, "location": "Oregon", "specialties": ["knives", "axes"]},
            "search_confidence": "High",
            "notes": null
        }"#;
        let payload = parse_brand_payload(text).unwrap();
        assert_eq!(payload.website_url.as_deref(), Some("https://acmeblades.com"));
        assert_eq!(payload.search_confidence, SearchConfidence::High);
        assert_eq!(payload.additional_info.founded.as_deref(), Some("1998"));
        assert_eq!(
            payload.additional_info.specialties.as_deref(),
            Some("knives, axes")
        );
        assert!(payload.notes.is_none());
    }

    #[test]
    fn null_website_is_valid() {
        let payload =
            parse_brand_payload(r#"{"website_url": null, "search_confidence": "low"}"#).unwrap();
        assert!(payload.website_url.is_none());
    }

    #[test]
    fn rejects_missing_website_field() {
        let err = parse_brand_payload(r#"{"brand_name": "Acme"}"#).unwrap_err();
        assert!(err.contains("website_url"));
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(parse_brand_payload(r#"{"website_url": 42}"#).is_err());
        assert!(parse_brand_payload(r#"{"website_url": null, "search_confidence": "sure"}"#).is_err());
        assert!(parse_brand_payload(r#"{"website_url": null, "additional_info": "none"}"#).is_err());
        assert!(parse_brand_payload(r#"{"website_url": null, "description": {"a": 1}}"#).is_err());
    }

    #[test]
    fn rejects_invalid_json() {
        let err = parse_brand_payload("{website_url: nope}").unwrap_err();
        assert!(err.starts_with("invalid JSON"));
    }

    #[test]
    fn fallback_description_truncates_by_chars() {
        let long = "é".repeat(300);
        let desc = fallback_description(&long);
        assert_eq!(desc.chars().count(), FALLBACK_DESCRIPTION_CHARS);
        assert_eq!(fallback_description("short"), "short");
    }
}
