// src/handlers.rs

pub mod activities;
pub mod certificates;
pub mod dashboard;
pub mod inventory;
pub mod people;

use serde::{Deserialize, Deserializer};
use validator::ValidationError;

// ---
// Validação Customizada
// ---

// Nome só com espaços conta como vazio
pub fn validate_not_blank(val: &str) -> Result<(), ValidationError> {
    if val.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Namnet får inte vara tomt.".into());
        return Err(err);
    }
    Ok(())
}

// Distingue campo ausente (None) de `null` explícito (Some(None)) nos PATCH
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::{double_option, validate_not_blank};
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        note: Option<Option<String>>,
    }

    #[test]
    fn absent_null_and_value_are_distinct() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        let null: Patch = serde_json::from_str(r#"{"note":null}"#).unwrap();
        let value: Patch = serde_json::from_str(r#"{"note":"x"}"#).unwrap();

        assert_eq!(absent.note, None);
        assert_eq!(null.note, Some(None));
        assert_eq!(value.note, Some(Some("x".to_string())));
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank(" Truckkort ").is_ok());
    }
}
