use std::borrow::Cow;

use tracing::instrument;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::AppError;

pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message(Cow::from("Title is required")));
    }
    Ok(())
}

/// Browsers submit untouched inputs as empty strings.
pub fn none_if_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub trait ValidateExt: Validate + Sized {
    fn validated(self) -> Result<Self, AppError>;
}

impl<T: Validate> ValidateExt for T {
    #[instrument(skip_all)]
    fn validated(self) -> Result<Self, AppError> {
        match self.validate() {
            Ok(()) => Ok(self),
            Err(errors) => Err(AppError::Validation(describe(&errors))),
        }
    }
}

fn describe(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |error| {
                error
                    .message
                    .clone()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect();

    messages.sort();
    messages.join(", ")
}
