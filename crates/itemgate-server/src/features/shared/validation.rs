//! Item field checks
//!
//! Mirrors the `ItemCreate` schema bounds so commands invoked without the
//! schema gate in front of them enforce the same limits as the table.

use thiserror::Error;

use crate::api::problem::Violation;
use crate::error::AppError;

pub const MAX_TITLE_CHARS: usize = 255;
pub const MAX_DESCRIPTION_CHARS: usize = 255;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ItemFieldError {
    #[error("Title is required and cannot be empty")]
    TitleRequired,

    #[error("Title must be at most {max_length} characters")]
    TitleTooLong { max_length: usize },

    #[error("Description must be at most {max_length} characters")]
    DescriptionTooLong { max_length: usize },
}

impl ItemFieldError {
    /// Body pointer of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            ItemFieldError::TitleRequired | ItemFieldError::TitleTooLong { .. } => "body/title",
            ItemFieldError::DescriptionTooLong { .. } => "body/description",
        }
    }
}

impl From<ItemFieldError> for AppError {
    fn from(err: ItemFieldError) -> Self {
        AppError::Validation(vec![Violation::new(err.field(), err.to_string())])
    }
}

/// Lengths are counted in characters, matching `char_length` in the table constraints
pub fn validate_item_fields(title: &str, description: Option<&str>) -> Result<(), ItemFieldError> {
    if title.is_empty() {
        return Err(ItemFieldError::TitleRequired);
    }

    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(ItemFieldError::TitleTooLong {
            max_length: MAX_TITLE_CHARS,
        });
    }

    if let Some(description) = description {
        if description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(ItemFieldError::DescriptionTooLong {
                max_length: MAX_DESCRIPTION_CHARS,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_fields() {
        assert!(validate_item_fields("milk", None).is_ok());
        assert!(validate_item_fields("milk", Some("")).is_ok());
        assert!(validate_item_fields(&"x".repeat(255), Some(&"y".repeat(255))).is_ok());
    }

    #[test]
    fn test_title_required() {
        assert_eq!(validate_item_fields("", None), Err(ItemFieldError::TitleRequired));
    }

    #[test]
    fn test_lengths_count_characters_not_bytes() {
        // 255 two-byte characters
        let title = "é".repeat(255);
        assert!(validate_item_fields(&title, None).is_ok());

        let title = "é".repeat(256);
        assert_eq!(
            validate_item_fields(&title, None),
            Err(ItemFieldError::TitleTooLong { max_length: 255 })
        );
    }

    #[test]
    fn test_description_too_long() {
        let err = validate_item_fields("milk", Some(&"y".repeat(256))).unwrap_err();
        assert_eq!(err.field(), "body/description");

        let app_error = AppError::from(err);
        assert_eq!(app_error.status_code().as_u16(), 422);
    }
}
