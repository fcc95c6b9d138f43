//! Patient validation.
//!
//! - [`fields`]: single-field validators (name, DNI, birth date) and display helpers
//! - [`schema`]: record schemas composing the validators for create, update,
//!   search and identifier checks
//!
//! Validators return the normalized value or a [`ValidationError`]; schemas
//! collect failures per field into [`FieldErrors`].

mod fields;
mod schema;

pub use fields::*;
pub use schema::*;

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Format used for birth dates, both on input and in storage.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Field names used as keys in [`FieldErrors`].
pub mod field {
    pub const ID: &str = "id";
    pub const FULL_NAME: &str = "full_name";
    pub const DNI: &str = "dni";
    pub const BIRTH_DATE: &str = "birth_date";
    pub const SEARCH_TERM: &str = "search_term";
}

/// Failure of a single field, with one message per violated rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", .messages.join("; "))]
pub struct ValidationError {
    messages: Vec<String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
        }
    }

    pub fn from_messages(messages: Vec<String>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }
}

/// Validation failures keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Errors for a single field.
    pub fn single(field: &str, error: ValidationError) -> Self {
        let mut errors = Self::new();
        errors.insert(field, error);
        errors
    }

    /// Record every message of `error` under `field`.
    pub fn insert(&mut self, field: &str, error: ValidationError) {
        self.0
            .entry(field.to_string())
            .or_default()
            .extend(error.into_messages());
    }

    /// Unwrap a validator result, recording the failure under `field`.
    pub fn check<T>(&mut self, field: &str, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.insert(field, error);
                None
            }
        }
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Names of the failing fields, in sorted order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn into_map(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{}: {}", field, messages.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Current local calendar date.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
