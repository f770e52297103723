//! SWADL validation pass.
//!
//! Two layers, both producing 1-based markers in emission order:
//! 1. YAML syntax: a parse failure yields one marker at the reported location.
//! 2. Schema shape: the root must be a mapping declaring `id` and
//!    `activities`. Missing properties are reported at 1:1 in the order the
//!    schema lists them.

use core_state::Marker;
use serde_yaml::Value;

const REQUIRED_PROPERTIES: [&str; 2] = ["id", "activities"];

pub fn validate(text: &str) -> Vec<Marker> {
    let value: Value = match serde_yaml::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            let (line, column) = e
                .location()
                .map(|loc| (loc.line().max(1), loc.column().max(1)))
                .unwrap_or((1, 1));
            return vec![Marker::error(line, column, syntax_message(&e))];
        }
    };

    let Value::Mapping(root) = value else {
        return vec![Marker::error(1, 1, "Incorrect type. Expected \"object\".")];
    };

    REQUIRED_PROPERTIES
        .iter()
        .filter(|key| !root.contains_key(**key))
        .map(|key| Marker::error(1, 1, format!("Missing property \"{key}\".")))
        .collect()
}

/// serde_yaml appends " at line L column C" to located errors; the marker
/// already carries the position.
fn syntax_message(e: &serde_yaml::Error) -> String {
    let full = e.to_string();
    match full.find(" at line ") {
        Some(idx) => full[..idx].to_string(),
        None => full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn valid_document_has_no_markers() {
        let text = "id: ping\nactivities:\n  - send-message:\n      id: pong\n";
        assert!(validate(text).is_empty());
    }

    #[test]
    fn missing_properties_reported_in_schema_order() {
        let markers = validate("variables:\n  a: 1\n");
        let messages: Vec<&str> = markers.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["Missing property \"id\".", "Missing property \"activities\"."]
        );
        assert!(markers.iter().all(|m| m.line == 1 && m.column == 1));
    }

    #[test]
    fn scalar_root_is_type_error() {
        let markers = validate("just a string");
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].message, "Incorrect type. Expected \"object\".");
    }

    #[test]
    fn syntax_error_is_located_past_first_line() {
        let markers = validate("id: ping\nactivities:\n  - [unclosed\n");
        assert_eq!(markers.len(), 1);
        assert!(markers[0].line >= 2, "marker at {:?}", markers[0]);
        assert!(!markers[0].message.contains(" at line "));
    }
}
