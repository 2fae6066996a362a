//! Option values and cross-step option references.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use crate::config::interpolation::has_placeholders;

/// Identifier of a step within one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for StepId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StepId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for StepId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for StepId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for StepId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// The value of a single step option.
///
/// In YAML, options are written as strings, booleans or sequences of
/// strings. Numbers are accepted and kept as their textual form, so
/// `version: 2.1` becomes the string `"2.1"` (quote versions such as
/// `"1.10"` to keep trailing zeros).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "serde_yaml::Value")]
pub enum OptionValue {
    Bool(bool),
    Text(String),
    List(Vec<String>),
}

impl OptionValue {
    pub fn text(s: impl Into<String>) -> Self {
        OptionValue::Text(s.into())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        OptionValue::List(items.into_iter().map(Into::into).collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            OptionValue::Text(s) => match s.as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
            OptionValue::List(_) => None,
        }
    }

    /// View as a list. A text value is a one-element list.
    pub fn as_list(&self) -> Vec<String> {
        match self {
            OptionValue::List(items) => items.clone(),
            OptionValue::Text(s) => vec![s.clone()],
            OptionValue::Bool(b) => vec![b.to_string()],
        }
    }

    /// Render for substitution into another option's template.
    pub fn render(&self) -> String {
        match self {
            OptionValue::Bool(b) => b.to_string(),
            OptionValue::Text(s) => s.clone(),
            OptionValue::List(items) => items.join(" "),
        }
    }

    /// Whether any part of this value still contains `{placeholders}`.
    pub fn has_placeholders(&self) -> bool {
        match self {
            OptionValue::Bool(_) => false,
            OptionValue::Text(s) => has_placeholders(s),
            OptionValue::List(items) => items.iter().any(|i| has_placeholders(i)),
        }
    }

    /// Parse a value given on the command line.
    ///
    /// `[a, b]` yields a list, `true`/`false` a bool, anything else text.
    pub fn from_cli(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            if let Ok(value) = serde_yaml::from_str::<serde_yaml::Value>(trimmed) {
                if let Ok(parsed) = OptionValue::try_from(value) {
                    return parsed;
                }
            }
        }
        match trimmed {
            "true" => OptionValue::Bool(true),
            "false" => OptionValue::Bool(false),
            _ => OptionValue::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::List(items) => write!(f, "[{}]", items.join(", ")),
            other => f.write_str(&other.render()),
        }
    }
}

impl Serialize for OptionValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OptionValue::Bool(b) => serializer.serialize_bool(*b),
            OptionValue::Text(s) => serializer.serialize_str(s),
            OptionValue::List(items) => items.serialize(serializer),
        }
    }
}

impl TryFrom<serde_yaml::Value> for OptionValue {
    type Error = String;

    fn try_from(value: serde_yaml::Value) -> Result<Self, Self::Error> {
        use serde_yaml::Value;
        match value {
            Value::Bool(b) => Ok(OptionValue::Bool(b)),
            Value::String(s) => Ok(OptionValue::Text(s)),
            Value::Number(n) => Ok(OptionValue::Text(n.to_string())),
            Value::Sequence(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    Value::Number(n) => Ok(n.to_string()),
                    Value::Bool(b) => Ok(b.to_string()),
                    other => Err(format!("list options hold scalars, found {:?}", other)),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(OptionValue::List),
            other => Err(format!(
                "option values must be strings, booleans or lists, found {:?}",
                other
            )),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Text(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Text(s)
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Bool(b)
    }
}

/// A declared link: "take this option's value from `step.option`".
///
/// Written in YAML as the string `"step.option"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OptionRef {
    pub step: StepId,
    pub option: String,
}

impl OptionRef {
    pub fn new(step: impl Into<StepId>, option: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            option: option.into(),
        }
    }
}

impl fmt::Display for OptionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.step, self.option)
    }
}

impl FromStr for OptionRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((step, option)) if !step.is_empty() && !option.is_empty() => {
                Ok(OptionRef::new(step.trim(), option.trim()))
            }
            _ => Err(format!("option reference must look like 'step.option', got '{}'", s)),
        }
    }
}

impl TryFrom<String> for OptionRef {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<OptionRef> for String {
    fn from(r: OptionRef) -> Self {
        r.to_string()
    }
}

/// A command-line override, written `STEP.OPTION=VALUE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionOverride {
    pub target: OptionRef,
    pub value: OptionValue,
}

impl FromStr for OptionOverride {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, raw) = s
            .split_once('=')
            .ok_or_else(|| format!("expected STEP.OPTION=VALUE, got '{}'", s))?;
        Ok(OptionOverride {
            target: key.parse()?,
            value: OptionValue::from_cli(raw),
        })
    }
}
