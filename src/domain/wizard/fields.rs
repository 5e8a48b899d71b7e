//! Field configuration: validators, formatters and dependency rules.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").expect("digits pattern compiles"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern compiles"));

/// All field configurations of a wizard, keyed by field name.
pub type FieldMap = BTreeMap<String, FieldConfig>;

/// Configuration of one form field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub validate: Vec<Validator>,
    /// Fields unset whenever this field's value changes.
    pub invalidates: Vec<String>,
    /// Allowed values (radio/select). Implies an `equal` check.
    pub options: Vec<String>,
    /// Formatters for this field; the wizard-wide list applies when unset.
    pub formatter: Option<Vec<Formatter>>,
    pub default: Option<Value>,
}

impl FieldConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(mut self, validator: Validator) -> Self {
        self.validate.push(validator);
        self
    }

    pub fn invalidates<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.invalidates = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Runs the validators against `value`, returning the first failure.
    ///
    /// Empty values only fail `required`; every other check is skipped for
    /// them.
    pub fn check(&self, value: &str) -> Option<ValidationFailure> {
        for validator in &self.validate {
            if matches!(validator, Validator::Required) {
                if value.trim().is_empty() {
                    return Some(ValidationFailure::new(validator));
                }
            } else if !value.is_empty() && !validator.accepts(value) {
                return Some(ValidationFailure::new(validator));
            }
        }
        if !value.is_empty() && !self.options.is_empty() && !self.options.iter().any(|o| o == value) {
            return Some(ValidationFailure {
                kind: "equal".to_string(),
            });
        }
        None
    }
}

/// A failed validation, named by validator type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub kind: String,
}

impl ValidationFailure {
    fn new(validator: &Validator) -> Self {
        Self {
            kind: validator.name().to_string(),
        }
    }
}

/// Built-in field validators.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawValidator")]
pub enum Validator {
    Required,
    Email,
    Numeric,
    MaxLength(usize),
    MinLength(usize),
    Regex(Regex),
    /// Value must be one of the listed options.
    Equal(Vec<String>),
}

impl Validator {
    pub fn name(&self) -> &'static str {
        match self {
            Validator::Required => "required",
            Validator::Email => "email",
            Validator::Numeric => "numeric",
            Validator::MaxLength(_) => "maxlength",
            Validator::MinLength(_) => "minlength",
            Validator::Regex(_) => "regex",
            Validator::Equal(_) => "equal",
        }
    }

    fn accepts(&self, value: &str) -> bool {
        match self {
            Validator::Required => !value.trim().is_empty(),
            Validator::Email => EMAIL.is_match(value),
            Validator::Numeric => DIGITS.is_match(value),
            Validator::MaxLength(max) => value.chars().count() <= *max,
            Validator::MinLength(min) => value.chars().count() >= *min,
            Validator::Regex(pattern) => pattern.is_match(value),
            Validator::Equal(options) => options.iter().any(|o| o == value),
        }
    }
}

/// Validators are written either as a bare name (`required`) or as
/// `{ type: maxlength, arguments: 10 }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawValidator {
    Name(String),
    Configured {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        arguments: Value,
    },
}

impl TryFrom<RawValidator> for Validator {
    type Error = String;

    fn try_from(raw: RawValidator) -> Result<Self, Self::Error> {
        let (kind, arguments) = match raw {
            RawValidator::Name(kind) => (kind, Value::Null),
            RawValidator::Configured { kind, arguments } => (kind, arguments),
        };

        let length = |args: &Value| {
            args.as_u64()
                .map(|n| n as usize)
                .ok_or_else(|| format!("validator '{}' needs a numeric argument", kind))
        };

        match kind.as_str() {
            "required" => Ok(Validator::Required),
            "email" => Ok(Validator::Email),
            "numeric" => Ok(Validator::Numeric),
            "maxlength" => Ok(Validator::MaxLength(length(&arguments)?)),
            "minlength" => Ok(Validator::MinLength(length(&arguments)?)),
            "regex" => {
                let pattern = arguments
                    .as_str()
                    .ok_or_else(|| "validator 'regex' needs a pattern".to_string())?;
                Regex::new(pattern)
                    .map(Validator::Regex)
                    .map_err(|e| format!("invalid regex '{}': {}", pattern, e))
            }
            "equal" => {
                let options = arguments
                    .as_array()
                    .map(|values| {
                        values
                            .iter()
                            .filter_map(|v| v.as_str().map(str::to_string))
                            .collect()
                    })
                    .ok_or_else(|| "validator 'equal' needs a list of options".to_string())?;
                Ok(Validator::Equal(options))
            }
            other => Err(format!("unknown validator '{}'", other)),
        }
    }
}

/// Value formatters applied to submitted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Formatter {
    Trim,
    Singlespaces,
    Hyphens,
    Uppercase,
    Lowercase,
    Removespaces,
}

impl Formatter {
    /// The formatters applied when a wizard does not configure its own.
    pub fn defaults() -> Vec<Formatter> {
        vec![Formatter::Trim, Formatter::Singlespaces, Formatter::Hyphens]
    }

    pub fn apply(self, value: &str) -> String {
        match self {
            Formatter::Trim => value.trim().to_string(),
            Formatter::Singlespaces => WHITESPACE.replace_all(value, " ").into_owned(),
            Formatter::Hyphens => value
                .chars()
                .map(|c| match c {
                    '\u{2010}'..='\u{2015}' | '\u{2212}' => '-',
                    other => other,
                })
                .collect(),
            Formatter::Uppercase => value.to_uppercase(),
            Formatter::Lowercase => value.to_lowercase(),
            Formatter::Removespaces => value.chars().filter(|c| !c.is_whitespace()).collect(),
        }
    }

    /// Applies `formatters` in order.
    pub fn apply_all(formatters: &[Formatter], value: &str) -> String {
        formatters
            .iter()
            .fold(value.to_string(), |acc, f| f.apply(&acc))
    }
}

impl fmt::Display for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Formatter::Trim => "trim",
            Formatter::Singlespaces => "singlespaces",
            Formatter::Hyphens => "hyphens",
            Formatter::Uppercase => "uppercase",
            Formatter::Lowercase => "lowercase",
            Formatter::Removespaces => "removespaces",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Formatter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trim" => Ok(Formatter::Trim),
            "singlespaces" => Ok(Formatter::Singlespaces),
            "hyphens" => Ok(Formatter::Hyphens),
            "uppercase" => Ok(Formatter::Uppercase),
            "lowercase" => Ok(Formatter::Lowercase),
            "removespaces" => Ok(Formatter::Removespaces),
            other => Err(format!("unknown formatter '{}'", other)),
        }
    }
}
