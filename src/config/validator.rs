//! Pre-flight validation of a rule set

use serde::Serialize;

use super::Config;
use crate::error::TransformError;
use crate::selector::{CssMatcher, SelectorMatcher};

/// Outcome of [`validate`], in the shape hosts expect
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<String>) -> Self {
        if errors.is_empty() {
            Self {
                valid: true,
                errors: None,
            }
        } else {
            Self {
                valid: false,
                errors: Some(errors),
            }
        }
    }

    pub fn errors(&self) -> &[String] {
        self.errors.as_deref().unwrap_or(&[])
    }

    pub fn into_result(self) -> Result<(), TransformError> {
        match self.errors {
            Some(errors) if !self.valid => Err(TransformError::InvalidConfig(errors)),
            _ => Ok(()),
        }
    }
}

/// Validate with the default CSS selector backend
pub fn validate(config: &Config) -> ValidationResult {
    validate_with(config, &CssMatcher)
}

/// Validate, checking selector syntax with `matcher`
pub fn validate_with(config: &Config, matcher: &dyn SelectorMatcher) -> ValidationResult {
    let mut errors = Vec::new();

    if config.transforms.is_empty() {
        errors.push("Transforms array cannot be empty".to_string());
    }

    for (index, rule) in config.transforms.iter().enumerate() {
        let prefix = format!("Transform {}", index);

        if rule.selector.trim().is_empty() {
            errors.push(format!("{}: selector is required", prefix));
        } else if let Err(e) = matcher.check(&rule.selector) {
            errors.push(format!("{}: {}", prefix, e));
        }

        if rule.url_template.trim().is_empty() {
            errors.push(format!("{}: urlTemplate is required", prefix));
        }

        if rule.widths.is_empty() {
            errors.push(format!("{}: widths array cannot be empty", prefix));
        } else if rule.widths.contains(&0) {
            errors.push(format!("{}: widths must be positive integers", prefix));
        }

        if let Some(formats) = &rule.formats {
            if formats.is_empty() {
                errors.push(format!("{}: formats array cannot be empty if provided", prefix));
            } else if formats.iter().any(|f| f.trim().is_empty()) {
                errors.push(format!("{}: formats must be non-empty strings", prefix));
            }
        }
    }

    ValidationResult::from_errors(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputKind, Rule};
    use crate::error::ErrorCode;
    use crate::extractor::ExtractSpec;
    use crate::selector::SimpleMatcher;

    fn rule(selector: &str) -> Rule {
        Rule::new(
            selector,
            ExtractSpec::custom("noop", |_| None),
            "{name}-{width}.{format}",
            vec![400, 800],
            OutputKind::Srcset,
        )
    }

    #[test]
    fn test_valid_config() {
        let result = validate(&Config::new(vec![rule("img.hero"), rule("figure > img")]));
        assert!(result.valid);
        assert!(result.errors.is_none());
        assert!(result.into_result().is_ok());
    }

    #[test]
    fn test_empty_transforms() {
        let result = validate(&Config::default());
        assert!(!result.valid);
        assert_eq!(result.errors(), ["Transforms array cannot be empty"]);
    }

    #[test]
    fn test_collects_rule_errors() {
        let mut bad = rule("");
        bad.widths.clear();
        bad.url_template = String::new();
        let mut bad_formats = rule("> img");
        bad_formats.formats = Some(Vec::new());

        let result = validate(&Config::new(vec![bad, bad_formats]));
        let errors = result.errors();
        assert_eq!(errors.len(), 5);
        assert_eq!(errors[0], "Transform 0: selector is required");
        assert!(errors.contains(&"Transform 0: widths array cannot be empty".to_string()));
        assert!(errors[3].starts_with("Transform 1: Invalid CSS selector: > img"));
        assert!(errors.contains(&"Transform 1: formats array cannot be empty if provided".to_string()));

        let err = result.into_result().unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidConfig);
    }

    #[test]
    fn test_selector_syntax_depends_on_backend() {
        let config = Config::new(vec![rule("img[")]);
        assert!(!validate(&config).valid);
        // The reduced matcher only rejects always-invalid forms
        assert!(validate_with(&config, &SimpleMatcher).valid);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(validate(&Config::default())).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["errors"][0], "Transforms array cannot be empty");

        let json = serde_json::to_value(validate(&Config::new(vec![rule("img")]))).unwrap();
        assert!(json.get("errors").is_none());
    }
}
