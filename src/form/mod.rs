//! Declarative forms.
//!
//! A [`FormSchema`] is an ordered list of elements plus per-field cleaning
//! types and required rules. Forms are built once by their definition code,
//! serialised for whichever client renders them, and used again on submit to
//! clean and check the posted values.

mod list_form;

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use thiserror::Error;

pub use list_form::*;

use crate::strings::get_string;

/// How a submitted value is cleaned.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    /// Leading integer, 0 when there is none.
    Int,
    /// Free text with markup tags removed.
    Text,
}

impl ParamType {
    pub fn clean(&self, raw: &str) -> FormValue {
        match self {
            Self::Int => FormValue::Int(clean_int(raw)),
            Self::Text => FormValue::Text(strip_tags(raw)),
        }
    }
}

/// A cleaned field value.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FormValue {
    Int(i64),
    Text(String),
}

impl FormValue {
    pub fn as_int(&self) -> i64 {
        match self {
            Self::Int(v) => *v,
            Self::Text(s) => clean_int(s),
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            Self::Int(v) => v.to_string(),
            Self::Text(s) => s.clone(),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Int(v) => v.to_string(),
            Self::Text(s) => s,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// One visible or hidden piece of a form.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    Header {
        name: String,
        label: String,
    },
    Hidden {
        name: String,
    },
    Text {
        name: String,
        label: String,
        size: u32,
    },
    Textarea {
        name: String,
        label: String,
    },
    Select {
        name: String,
        label: String,
        options: Vec<SelectOption>,
    },
    ActionButtons {
        cancel_label: String,
        submit_label: String,
    },
}

impl Element {
    /// The field name, for elements that carry a value.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Hidden { name }
            | Self::Text { name, .. }
            | Self::Textarea { name, .. }
            | Self::Select { name, .. } => Some(name),
            Self::Header { .. } | Self::ActionButtons { .. } => None,
        }
    }
}

/// Field-level validation failures, keyed by field name.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq, Error)]
#[error("form validation failed for {} field(s)", .fields.len())]
pub struct ValidationErrors {
    pub fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FormSchema {
    elements: Vec<Element>,
    types: BTreeMap<String, ParamType>,
    required: Vec<String>,
    values: BTreeMap<String, String>,
}

impl FormSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_element(&mut self, element: Element) {
        self.elements.push(element);
    }

    pub fn set_type(&mut self, name: &str, param_type: ParamType) {
        self.types.insert(name.to_string(), param_type);
    }

    pub fn add_required_rule(&mut self, name: &str) {
        if !self.required.iter().any(|n| n == name) {
            self.required.push(name.to_string());
        }
    }

    pub fn set_value(&mut self, name: &str, value: impl ToString) {
        self.values.insert(name.to_string(), value.to_string());
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn element(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.name() == Some(name))
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|n| n == name)
    }

    pub fn param_type(&self, name: &str) -> ParamType {
        self.types.get(name).copied().unwrap_or(ParamType::Text)
    }

    /// Clean every named field in `submitted` and check required and select rules.
    ///
    /// Fields that are absent from the submission and not required come back
    /// as their type's empty value.
    pub fn validate(
        &self,
        submitted: &HashMap<String, String>,
    ) -> Result<BTreeMap<String, FormValue>, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let mut cleaned = BTreeMap::new();

        for element in &self.elements {
            let Some(name) = element.name() else {
                continue;
            };
            let raw = submitted.get(name).map(String::as_str).unwrap_or("");

            if self.is_required(name) && raw.trim().is_empty() {
                errors.add(name, get_string("required"));
                continue;
            }

            let value = self.param_type(name).clean(raw);

            if let Element::Select { options, .. } = element {
                let chosen = value.to_text();
                if !raw.trim().is_empty() && !options.iter().any(|o| o.value == chosen) {
                    errors.add(name, get_string("invalidoption"));
                    continue;
                }
            }

            cleaned.insert(name.to_string(), value);
        }

        if errors.is_empty() {
            Ok(cleaned)
        } else {
            Err(errors)
        }
    }
}

/// Integer cleaning: optional leading whitespace and sign, then digits.
/// Anything unparseable is 0; values out of range saturate.
pub fn clean_int(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let magnitude = digits[..end].bytes().try_fold(0i64, |acc, b| {
        acc.checked_mul(10)?.checked_add(i64::from(b - b'0'))
    });
    match (magnitude, negative) {
        (Some(value), true) => -value,
        (Some(value), false) => value,
        (None, true) => i64::MIN,
        (None, false) => i64::MAX,
    }
}

/// Remove markup tags. A `<` only opens a tag when a letter, `/`, `!` or `?`
/// follows it; any other `<` is kept as text.
pub fn strip_tags(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    let mut in_tag = false;
    while let Some(c) = chars.next() {
        if in_tag {
            if c == '>' {
                in_tag = false;
            }
            continue;
        }
        let opens_tag = c == '<'
            && chars
                .peek()
                .is_some_and(|&next| next.is_ascii_alphabetic() || matches!(next, '/' | '!' | '?'));
        if opens_tag {
            in_tag = true;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn clean_int_takes_leading_digits() {
        assert_eq!(clean_int("42"), 42);
        assert_eq!(clean_int("12abc"), 12);
        assert_eq!(clean_int("  -5"), -5);
        assert_eq!(clean_int("abc"), 0);
        assert_eq!(clean_int(""), 0);
    }

    #[test]
    fn clean_int_saturates_out_of_range_values() {
        assert_eq!(clean_int("99999999999999999999"), i64::MAX);
        assert_eq!(clean_int("-99999999999999999999"), i64::MIN);
        assert_eq!(clean_int("9223372036854775807"), i64::MAX);
        assert_eq!(clean_int("-9223372036854775808"), i64::MIN);
    }

    #[test]
    fn strip_tags_removes_markup() {
        assert_eq!(strip_tags("<b>bold</b> text"), "bold text");
        assert_eq!(strip_tags("<!-- note -->kept"), "kept");
        assert_eq!(strip_tags("plain"), "plain");
    }

    #[test]
    fn strip_tags_keeps_comparisons() {
        assert_eq!(strip_tags("a < b"), "a < b");
        assert_eq!(strip_tags("x < 100 and y > 5"), "x < 100 and y > 5");
        assert_eq!(strip_tags("a <3"), "a <3");
    }

    #[test]
    fn required_fields_must_not_be_blank() {
        let mut form = FormSchema::new();
        form.add_element(Element::Text {
            name: "name".to_string(),
            label: "Name".to_string(),
            size: 70,
        });
        form.set_type("name", ParamType::Text);
        form.add_required_rule("name");

        let errors = form.validate(&submission(&[("name", "   ")])).unwrap_err();
        assert_eq!(errors.fields.get("name").unwrap(), "Required");

        let cleaned = form.validate(&submission(&[("name", "Words")])).unwrap();
        assert_eq!(cleaned["name"], FormValue::Text("Words".to_string()));
    }

    #[test]
    fn select_rejects_values_outside_its_options() {
        let mut form = FormSchema::new();
        form.add_element(Element::Select {
            name: "colour".to_string(),
            label: "Colour".to_string(),
            options: vec![SelectOption {
                value: "1".to_string(),
                label: "red".to_string(),
            }],
        });
        form.set_type("colour", ParamType::Int);

        assert!(form.validate(&submission(&[("colour", "2")])).is_err());
        let cleaned = form.validate(&submission(&[("colour", "1")])).unwrap();
        assert_eq!(cleaned["colour"], FormValue::Int(1));
    }

    #[test]
    fn select_accepts_values_that_clean_to_an_option() {
        let mut form = FormSchema::new();
        form.add_element(Element::Select {
            name: "status".to_string(),
            label: "Status".to_string(),
            options: vec![SelectOption {
                value: "1".to_string(),
                label: "ready".to_string(),
            }],
        });
        form.set_type("status", ParamType::Int);

        let cleaned = form.validate(&submission(&[("status", " 1")])).unwrap();
        assert_eq!(cleaned["status"], FormValue::Int(1));
    }

    #[test]
    fn headers_and_buttons_carry_no_value() {
        let mut form = FormSchema::new();
        form.add_element(Element::Header {
            name: "heading".to_string(),
            label: "Heading".to_string(),
        });
        form.add_element(Element::ActionButtons {
            cancel_label: "Cancel".to_string(),
            submit_label: "Save".to_string(),
        });

        let cleaned = form.validate(&HashMap::new()).unwrap();
        assert!(cleaned.is_empty());
        assert!(form.element("heading").is_none());
    }
}
