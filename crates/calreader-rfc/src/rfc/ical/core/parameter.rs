//! Property parameters (RFC 5545 §3.2).

/// `NAME=value[,value...]` between a property name and its colon.
///
/// Quotes are removed by the lexer, so a quoted TZID such as
/// `"(UTC+01:00) Amsterdam, Berlin"` is a single value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Uppercased.
    pub name: String,
    pub values: Vec<String>,
}

impl Parameter {
    #[must_use]
    pub fn with_values(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            values,
        }
    }

    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    /// Whether any value equals `value`, ignoring case.
    #[must_use]
    pub fn has_value(&self, value: &str) -> bool {
        self.values.iter().any(|v| v.eq_ignore_ascii_case(value))
    }
}

/// Which edge of the event a TRIGGER duration is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerRelated {
    #[default]
    Start,
    End,
}

impl TriggerRelated {
    /// Only `RELATED=END` selects the end.
    #[must_use]
    pub fn from_param(param: Option<&Parameter>) -> Self {
        match param {
            Some(p) if p.has_value("END") => Self::End,
            _ => Self::Start,
        }
    }
}
