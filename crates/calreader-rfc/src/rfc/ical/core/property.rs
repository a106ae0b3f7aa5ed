//! Content lines and properties (RFC 5545 §3.1).

use super::{Parameter, Value};

fn find_param<'a>(params: &'a [Parameter], name: &str) -> Option<&'a Parameter> {
    params.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// One unfolded line split into name, parameters and the value text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine {
    /// Uppercased.
    pub name: String,
    pub params: Vec<Parameter>,
    /// Still escaped.
    pub raw_value: String,
}

impl ContentLine {
    #[must_use]
    pub fn get_param_value(&self, name: &str) -> Option<&str> {
        find_param(&self.params, name)?.value()
    }

    /// Explicit VALUE type, if any.
    #[must_use]
    pub fn value_type(&self) -> Option<&str> {
        self.get_param_value("VALUE")
    }

    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        self.get_param_value("TZID")
    }
}

/// A content line whose value has been typed.
///
/// `raw_value` keeps the text, so values that failed to type can still be
/// quoted in errors.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub params: Vec<Parameter>,
    pub value: Value,
    pub raw_value: String,
}

impl Property {
    #[must_use]
    pub fn from_content_line(cl: ContentLine, value: Value) -> Self {
        Self {
            name: cl.name,
            params: cl.params,
            value,
            raw_value: cl.raw_value,
        }
    }

    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&Parameter> {
        find_param(&self.params, name)
    }

    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        self.get_param("TZID")?.value()
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        self.value.as_text()
    }
}
