//! Attribute-Set Validation
//!
//! Rule matcher used by the downstream structural-configuration parser:
//! an element is valid when its present attributes fully cover at least
//! one admissible attribute set. Attributes outside every known set are
//! ignored; partial sets and unions across sets never match.

use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("element '{element}' must declare all attributes for one of the sets: {summary}")]
pub struct AttributeSetError {
    pub element: String,
    pub summary: String,
}

/// Validates one element's attributes against a family of admissible sets.
///
/// Holds no state across elements; each call is independent and
/// order-insensitive over the input attributes.
#[derive(Debug, Clone)]
pub struct AttributeSetValidator {
    // attribute name -> index of the set it belongs to
    known_attributes: HashMap<String, usize>,
    // set index -> number of attributes declared in that set
    set_sizes: HashMap<usize, usize>,
    // human-readable description of the admissible sets
    summary: String,
}

impl AttributeSetValidator {
    /// Sets declared with zero attributes are ignored entirely.
    pub fn new(attribute_sets: Vec<Vec<String>>) -> Self {
        let mut known_attributes = HashMap::new();
        let mut set_sizes = HashMap::new();
        let mut parts = Vec::new();

        for (index, attributes) in attribute_sets.iter().enumerate() {
            if attributes.is_empty() {
                continue;
            }
            set_sizes.insert(index, attributes.len());
            for attribute in attributes {
                known_attributes.insert(attribute.clone(), index);
            }
            // the message is in terms of the attributes the user writes
            parts.push(attributes.join(", "));
        }

        Self {
            known_attributes,
            set_sizes,
            summary: parts.join("; "),
        }
    }

    /// Attribute names must already be normalized to their aliased form.
    pub fn validate(&self, element: &str, present_attributes: &[&str]) -> Result<(), AttributeSetError> {
        // vacuously valid when there is nothing to check for
        if self.known_attributes.is_empty() {
            return Ok(());
        }

        let mut found_counts: HashMap<usize, usize> = HashMap::new();
        for attribute in present_attributes {
            if let Some(&index) = self.known_attributes.get(*attribute) {
                *found_counts.entry(index).or_insert(0) += 1;
            }
        }

        let satisfied = found_counts
            .iter()
            .any(|(index, count)| self.set_sizes.get(index) == Some(count));

        if satisfied {
            Ok(())
        } else {
            Err(AttributeSetError {
                element: element.to_string(),
                summary: self.summary.clone(),
            })
        }
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sets(families: &[&[&str]]) -> Vec<Vec<String>> {
        families
            .iter()
            .map(|set| set.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    fn connector_validator() -> AttributeSetValidator {
        AttributeSetValidator::new(sets(&[&["host", "port"], &["url"]]))
    }

    #[test]
    fn empty_family_is_vacuously_valid() {
        let validator = AttributeSetValidator::new(vec![]);
        assert!(validator.validate("endpoint", &["anything"]).is_ok());
        assert!(validator.validate("endpoint", &[]).is_ok());
    }

    #[test]
    fn empty_sets_are_ignored() {
        let validator = AttributeSetValidator::new(sets(&[&[], &[]]));
        assert!(validator.validate("endpoint", &["host"]).is_ok());
        assert_eq!(validator.summary(), "");
    }

    #[test]
    fn complete_set_passes() {
        let validator = connector_validator();
        assert!(validator.validate("endpoint", &["host", "port"]).is_ok());
        assert!(validator.validate("endpoint", &["url"]).is_ok());
    }

    #[test]
    fn partial_set_fails_with_summary() {
        let validator = connector_validator();
        let err = validator.validate("endpoint", &["host"]).unwrap_err();
        assert_eq!(err.element, "endpoint");
        assert_eq!(err.summary, "host, port; url");
    }

    #[test]
    fn extraneous_known_attribute_does_not_block_a_full_set() {
        // "host" counts toward set 0 which stays incomplete, but "url"
        // completes set 1 on its own
        let validator = connector_validator();
        assert!(validator.validate("endpoint", &["url", "host"]).is_ok());
    }

    #[test]
    fn unknown_attributes_are_ignored_but_satisfy_nothing() {
        let validator = connector_validator();
        assert!(validator.validate("endpoint", &["url", "timeout"]).is_ok());
        assert!(validator.validate("endpoint", &["timeout"]).is_err());
    }

    #[test]
    fn no_matching_attributes_fails() {
        let validator = connector_validator();
        let err = validator.validate("endpoint", &[]).unwrap_err();
        assert!(err.to_string().contains("host, port; url"));
    }

    #[test]
    fn order_insensitive() {
        let validator = connector_validator();
        assert!(validator.validate("endpoint", &["port", "host"]).is_ok());
    }
}
