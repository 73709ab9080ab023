//! Option schemas and parser configuration.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Sentinel used when stop parsing is enabled without an explicit token.
pub const DEFAULT_STOP_TOKEN: &str = "--";

/// Errors that can occur while building a parser configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse JSON config: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("invalid option type: {0}")]
    InvalidOptionType(String),
}

/// The kind of value an option carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptionType {
    /// Presence flag, optionally negated with `--no-<name>`
    #[default]
    Boolean,
    /// Raw text value
    String,
    /// Numeric value
    Number,
}

impl OptionType {
    /// Lowercase name of the type as accepted in descriptors.
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionType::Boolean => "boolean",
            OptionType::String => "string",
            OptionType::Number => "number",
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "boolean" => Ok(OptionType::Boolean),
            "string" => Ok(OptionType::String),
            "number" => Ok(OptionType::Number),
            _ => Err(ConfigError::InvalidOptionType(s.to_string())),
        }
    }
}

/// A typed option value produced by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    String(String),
    Number(f64),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::String(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{}", n),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::String(s) => serializer.serialize_str(s),
            // Whole numbers render as integers so `13` stays `13` in JSON output.
            Value::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                serializer.serialize_i64(*n as i64)
            }
            Value::Number(n) => serializer.serialize_f64(*n),
        }
    }
}

/// Structured option descriptor as written in configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OptionDescriptor {
    /// Help text for this option
    pub description: Option<String>,
    /// Type name: "boolean" (default), "string" or "number"
    #[serde(rename = "type")]
    pub option_type: Option<String>,
    /// Alternate short name (e.g., "t" for -t)
    pub alias: Option<String>,
}

/// Immutable descriptor of a single recognized option.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OptionSchema {
    pub description: Option<String>,
    pub option_type: OptionType,
    pub alias: Option<String>,
}

impl OptionSchema {
    /// A boolean option described only by its help text.
    pub fn from_description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            option_type: OptionType::Boolean,
            alias: None,
        }
    }

    /// Build a schema from a descriptor, validating its type name.
    pub fn from_descriptor(descriptor: OptionDescriptor) -> Result<Self, ConfigError> {
        let option_type = match descriptor.option_type {
            Some(ref name) => name.parse()?,
            None => OptionType::Boolean,
        };

        Ok(Self {
            description: descriptor.description,
            option_type,
            alias: descriptor.alias,
        })
    }

    pub fn new(option_type: OptionType) -> Self {
        Self {
            option_type,
            ..Self::default()
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether the option consumes a value (`--opt=value` or `--opt value`).
    pub fn requires_value(&self) -> bool {
        self.option_type != OptionType::Boolean
    }

    /// Coerce raw text into this option's value type.
    ///
    /// Returns `None` when a number option receives text that is not a number.
    /// String and boolean options get the raw text back unchanged.
    pub fn parsed_value(&self, raw: &str) -> Option<Value> {
        match self.option_type {
            OptionType::Number => parse_number(raw).map(Value::Number),
            OptionType::String | OptionType::Boolean => Some(Value::String(raw.to_string())),
        }
    }
}

/// Accepts finite numbers only: empty text, NaN and infinities yield `None`.
fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Any of the accepted ways to declare an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionSpec {
    /// Bare description, declares a boolean option
    Description(String),
    /// Structured descriptor, validated when the parser is built
    Descriptor(OptionDescriptor),
    /// Already-built schema
    Schema(OptionSchema),
}

impl<'de> Deserialize<'de> for OptionSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawSpec {
            Description(String),
            Descriptor(OptionDescriptor),
        }

        Ok(match RawSpec::deserialize(deserializer)? {
            RawSpec::Description(text) => OptionSpec::Description(text),
            RawSpec::Descriptor(descriptor) => OptionSpec::Descriptor(descriptor),
        })
    }
}

impl TryFrom<OptionSpec> for OptionSchema {
    type Error = ConfigError;

    fn try_from(spec: OptionSpec) -> Result<Self, Self::Error> {
        match spec {
            OptionSpec::Description(text) => Ok(OptionSchema::from_description(text)),
            OptionSpec::Descriptor(descriptor) => OptionSchema::from_descriptor(descriptor),
            OptionSpec::Schema(schema) => Ok(schema),
        }
    }
}

impl From<&str> for OptionSpec {
    fn from(description: &str) -> Self {
        OptionSpec::Description(description.to_string())
    }
}

impl From<OptionDescriptor> for OptionSpec {
    fn from(descriptor: OptionDescriptor) -> Self {
        OptionSpec::Descriptor(descriptor)
    }
}

impl From<OptionSchema> for OptionSpec {
    fn from(schema: OptionSchema) -> Self {
        OptionSpec::Schema(schema)
    }
}

/// Stop-parsing setting.
///
/// - `false` (default): every token is interpreted
/// - `true`: stop at `--`
/// - `"TOKEN"`: stop at a custom sentinel
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StopParsing {
    #[default]
    Disabled,
    Token(String),
}

impl StopParsing {
    /// The sentinel token, if stop parsing is enabled.
    pub fn token(&self) -> Option<&str> {
        match self {
            StopParsing::Disabled => None,
            StopParsing::Token(token) => Some(token),
        }
    }
}

impl From<bool> for StopParsing {
    fn from(enabled: bool) -> Self {
        if enabled {
            StopParsing::Token(DEFAULT_STOP_TOKEN.to_string())
        } else {
            StopParsing::Disabled
        }
    }
}

impl From<&str> for StopParsing {
    fn from(token: &str) -> Self {
        StopParsing::Token(token.to_string())
    }
}

impl<'de> Deserialize<'de> for StopParsing {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct StopParsingVisitor;

        impl<'de> Visitor<'de> for StopParsingVisitor {
            type Value = StopParsing;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a boolean or a sentinel string")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(StopParsing::from(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(StopParsing::Token(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(StopParsing::Token(value))
            }
        }

        deserializer.deserialize_any(StopParsingVisitor)
    }
}

/// Top-level parser configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParserConfig {
    /// Recognized options keyed by name
    #[serde(default)]
    pub options: BTreeMap<String, OptionSpec>,
    /// Stop-parsing sentinel setting (`false`, `true` or a token)
    #[serde(default, rename = "stopParsing", alias = "stop_parsing")]
    pub stop_parsing: StopParsing,
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON string into a ParserConfig.
    pub fn from_json(json: &str) -> Result<ParserConfig, ConfigError> {
        let config: ParserConfig = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Register an option under `name`.
    pub fn option(mut self, name: impl Into<String>, spec: impl Into<OptionSpec>) -> Self {
        self.options.insert(name.into(), spec.into());
        self
    }

    pub fn stop_parsing(mut self, setting: impl Into<StopParsing>) -> Self {
        self.stop_parsing = setting.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_from_description_is_boolean() {
        let schema = OptionSchema::from_description("Enable things");
        assert_eq!(schema.description, Some("Enable things".to_string()));
        assert_eq!(schema.option_type, OptionType::Boolean);
        assert!(schema.alias.is_none());
        assert!(!schema.requires_value());
    }

    #[test]
    fn test_schema_from_descriptor_defaults_to_boolean() {
        let schema = OptionSchema::from_descriptor(OptionDescriptor::default()).unwrap();
        assert_eq!(schema.option_type, OptionType::Boolean);
    }

    #[test]
    fn test_schema_from_descriptor_copies_fields() {
        let schema = OptionSchema::from_descriptor(OptionDescriptor {
            description: Some("Output file".to_string()),
            option_type: Some("string".to_string()),
            alias: Some("o".to_string()),
        })
        .unwrap();
        assert_eq!(schema.description, Some("Output file".to_string()));
        assert_eq!(schema.option_type, OptionType::String);
        assert_eq!(schema.alias, Some("o".to_string()));
    }

    #[test]
    fn test_schema_rejects_unknown_type() {
        let result = OptionSchema::from_descriptor(OptionDescriptor {
            option_type: Some("date".to_string()),
            ..OptionDescriptor::default()
        });
        match result {
            Err(ConfigError::InvalidOptionType(name)) => assert_eq!(name, "date"),
            other => panic!("Expected InvalidOptionType, got {:?}", other),
        }
    }

    #[test]
    fn test_type_names_are_case_insensitive() {
        assert_eq!("Number".parse::<OptionType>().unwrap(), OptionType::Number);
        assert_eq!("STRING".parse::<OptionType>().unwrap(), OptionType::String);
        assert_eq!("boolean".parse::<OptionType>().unwrap(), OptionType::Boolean);
    }

    #[test]
    fn test_requires_value() {
        assert!(!OptionSchema::new(OptionType::Boolean).requires_value());
        assert!(OptionSchema::new(OptionType::String).requires_value());
        assert!(OptionSchema::new(OptionType::Number).requires_value());
    }

    #[test]
    fn test_parsed_value_number() {
        let schema = OptionSchema::new(OptionType::Number);
        assert_eq!(schema.parsed_value("13"), Some(Value::Number(13.0)));
        assert_eq!(schema.parsed_value("-2.5"), Some(Value::Number(-2.5)));
        assert_eq!(schema.parsed_value("0"), Some(Value::Number(0.0)));
        assert_eq!(schema.parsed_value(" 7 "), Some(Value::Number(7.0)));
    }

    #[test]
    fn test_parsed_value_number_rejects_non_numeric() {
        let schema = OptionSchema::new(OptionType::Number);
        assert_eq!(schema.parsed_value("Test"), None);
        assert_eq!(schema.parsed_value("NaN"), None);
        assert_eq!(schema.parsed_value(""), None);
        assert_eq!(schema.parsed_value("12abc"), None);
    }

    #[test]
    fn test_parsed_value_number_rejects_infinity() {
        let schema = OptionSchema::new(OptionType::Number);
        for raw in ["inf", "-inf", "infinity", "Infinity", "1e400"] {
            assert_eq!(schema.parsed_value(raw), None, "{raw} should not coerce");
        }
        assert_eq!(schema.parsed_value("1e300"), Some(Value::Number(1e300)));
    }

    #[test]
    fn test_parsed_value_identity_for_other_types() {
        for option_type in [OptionType::String, OptionType::Boolean] {
            let schema = OptionSchema::new(option_type);
            for raw in ["", "hello", "13", "NaN", "--x"] {
                assert_eq!(schema.parsed_value(raw), Some(Value::String(raw.to_string())));
            }
        }
    }

    #[test]
    fn test_value_serializes_whole_numbers_as_integers() {
        assert_eq!(serde_json::to_string(&Value::Number(13.0)).unwrap(), "13");
        assert_eq!(serde_json::to_string(&Value::Number(1.5)).unwrap(), "1.5");
        assert_eq!(serde_json::to_string(&Value::Bool(false)).unwrap(), "false");
        assert_eq!(
            serde_json::to_string(&Value::String("x".to_string())).unwrap(),
            "\"x\""
        );
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "options": {
                "verbose": "Enable verbose output",
                "output": {"type": "string", "alias": "o", "description": "Output file"},
                "count": {"type": "number"}
            },
            "stopParsing": true
        }"#;

        let config = ParserConfig::from_json(json).unwrap();
        assert_eq!(config.options.len(), 3);
        assert_eq!(
            config.options["verbose"],
            OptionSpec::Description("Enable verbose output".to_string())
        );
        assert_eq!(
            config.options["output"],
            OptionSpec::Descriptor(OptionDescriptor {
                description: Some("Output file".to_string()),
                option_type: Some("string".to_string()),
                alias: Some("o".to_string()),
            })
        );
        assert_eq!(config.stop_parsing, StopParsing::Token("--".to_string()));
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = ParserConfig::from_json("{}").unwrap();
        assert!(config.options.is_empty());
        assert_eq!(config.stop_parsing, StopParsing::Disabled);
    }

    #[test]
    fn test_stop_parsing_variants() {
        let disabled = ParserConfig::from_json(r#"{"stopParsing": false}"#).unwrap();
        assert_eq!(disabled.stop_parsing.token(), None);

        let custom = ParserConfig::from_json(r#"{"stop_parsing": "::"}"#).unwrap();
        assert_eq!(custom.stop_parsing.token(), Some("::"));
    }

    #[test]
    fn test_stop_parsing_rejects_numbers() {
        assert!(ParserConfig::from_json(r#"{"stopParsing": 3}"#).is_err());
    }

    #[test]
    fn test_invalid_json() {
        let result = ParserConfig::from_json("{not json");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_builder() {
        let config = ParserConfig::new()
            .option("bool", "A flag")
            .option("test", OptionSchema::new(OptionType::String).with_alias("t"))
            .stop_parsing(true);
        assert_eq!(config.options.len(), 2);
        assert_eq!(config.stop_parsing.token(), Some(DEFAULT_STOP_TOKEN));
    }
}
