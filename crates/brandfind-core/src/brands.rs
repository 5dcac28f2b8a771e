use std::collections::HashSet;
use std::path::Path;

use crate::ConfigError;

/// Load and validate the brand list: a JSON array of brand-name strings.
///
/// Names are returned exactly as written so results can be matched back to
/// their input.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, is not JSON, is not an
/// array of strings, or contains empty or duplicate names.
pub fn load_brand_list(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::BrandsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| ConfigError::BrandsFileParse {
            path: path.display().to_string(),
            source: e,
        })?;

    parse_brand_list(value)
}

fn parse_brand_list(value: serde_json::Value) -> Result<Vec<String>, ConfigError> {
    let serde_json::Value::Array(items) = value else {
        return Err(ConfigError::Validation(
            "brand list must be a JSON array of strings".to_string(),
        ));
    };

    let mut seen = HashSet::new();
    let mut brands = Vec::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        let serde_json::Value::String(name) = item else {
            return Err(ConfigError::Validation(format!(
                "brand list entry {index} is not a string"
            )));
        };

        if name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "brand list entry {index} is empty"
            )));
        }

        if !seen.insert(name.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand name: '{name}'"
            )));
        }

        brands.push(name);
    }

    Ok(brands)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_array_of_strings_in_order() {
        let brands = parse_brand_list(json!(["Acme Blades", "NoSuchBrand", " Spaced "])).unwrap();
        assert_eq!(brands, ["Acme Blades", "NoSuchBrand", " Spaced "]);
    }

    #[test]
    fn rejects_non_array() {
        let err = parse_brand_list(json!({"brands": ["Acme"]})).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("JSON array")));
    }

    #[test]
    fn rejects_non_string_entry() {
        let err = parse_brand_list(json!(["Acme", 42])).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("entry 1")));
    }

    #[test]
    fn rejects_blank_entry() {
        assert!(matches!(
            parse_brand_list(json!(["Acme", "   "])),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn rejects_duplicates() {
        let err = parse_brand_list(json!(["Acme", "Zeta", "Acme"])).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("duplicate")));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_brand_list(&dir.path().join("brands.json")).unwrap_err();
        assert!(matches!(err, ConfigError::BrandsFileIo { .. }));
    }

    #[test]
    fn load_reports_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brands.json");
        std::fs::write(&path, "[\"Acme\",").unwrap();
        assert!(matches!(
            load_brand_list(&path),
            Err(ConfigError::BrandsFileParse { .. })
        ));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brands.json");
        std::fs::write(&path, r#"["Acme Blades", "Zeta"]"#).unwrap();
        assert_eq!(load_brand_list(&path).unwrap(), ["Acme Blades", "Zeta"]);
    }
}
