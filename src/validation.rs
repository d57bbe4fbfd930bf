//! Field invariants checked before anything reaches a repository.
//!
//! Messages mirror the wording clients already depend on, e.g.
//! `Title can't be blank`. Each failure is kept per field so the HTML
//! forms can render errors inline while the JSON API flattens them.

use std::fmt;

use serde::Serialize;

pub const TITLE_MAX_CHARS: usize = 250;

pub const BLANK: &str = "can't be blank";
pub const MUST_EXIST: &str = "must exist";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    /// `todo_list` -> `Todo list can't be blank`
    pub fn full_message(&self) -> String {
        let humanized = self.field.replace('_', " ");
        let mut chars = humanized.chars();
        let label = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
            None => String::new(),
        };
        format!("{label} {}", self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn on(&self, field: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|error| error.field == field)
            .map(|error| error.message.as_str())
            .collect()
    }

    pub fn full_messages(&self) -> Vec<String> {
        self.errors.iter().map(FieldError::full_message).collect()
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_messages().join(", "))
    }
}

pub fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|value| value.trim().is_empty())
}

pub fn validate_todo_list(name: Option<&str>) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if is_blank(name) {
        errors.add("name", BLANK);
    }
    errors.into_result()
}

pub fn validate_item(title: Option<&str>) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if is_blank(title) {
        errors.add("title", BLANK);
    }
    if let Some(title) = title
        && title.chars().count() > TITLE_MAX_CHARS
    {
        errors.add(
            "title",
            format!("is too long (maximum is {TITLE_MAX_CHARS} characters)"),
        );
    }
    errors.into_result()
}

/// Raised by the storage layer when an item points at a list that is gone.
pub fn missing_todo_list() -> ValidationErrors {
    ValidationErrors::single("todo_list", MUST_EXIST)
}
