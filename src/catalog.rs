//! Input checks for catalog and student mutations. Nothing here talks to the
//! backend; handlers run these first and only send what passes.

use crate::api::{BoardInput, StandardInput, StudentInput, SubjectInput};
use crate::validate::{require_text, LocalFile, ValidationError, MAX_THUMBNAIL_BYTES};

/// Catalog images share the thumbnail size cap. Any image type is accepted.
pub fn validate_image(image: Option<LocalFile>) -> Result<Option<LocalFile>, ValidationError> {
    match image {
        Some(file) if file.size > MAX_THUMBNAIL_BYTES => Err(ValidationError::ThumbnailTooLarge),
        other => Ok(other),
    }
}

fn price(raw: Option<f64>, allow_zero: bool) -> Result<f64, ValidationError> {
    let value = raw.ok_or(ValidationError::MissingField("Price"))?;
    let in_range = if allow_zero { value >= 0.0 } else { value > 0.0 };
    if !value.is_finite() || !in_range {
        return Err(ValidationError::InvalidPrice);
    }
    Ok(value)
}

pub fn board_input(name: &str, image: Option<LocalFile>) -> Result<BoardInput, ValidationError> {
    Ok(BoardInput {
        name: require_text(name, "Board name")?,
        image: validate_image(image)?,
    })
}

/// Standards may be free.
pub fn standard_input(
    grade: &str,
    raw_price: Option<f64>,
    board_id: &str,
    image: Option<LocalFile>,
) -> Result<StandardInput, ValidationError> {
    Ok(StandardInput {
        grade: require_text(grade, "Grade")?,
        board_id: require_text(board_id, "Board")?,
        price: price(raw_price, true)?,
        image: validate_image(image)?,
    })
}

/// Subjects must have a positive price.
pub fn subject_input(
    name: &str,
    raw_price: Option<f64>,
    image: Option<LocalFile>,
) -> Result<SubjectInput, ValidationError> {
    Ok(SubjectInput {
        name: require_text(name, "Subject name")?,
        price: price(raw_price, false)?,
        image: validate_image(image)?,
    })
}

/// A password is mandatory on create. On update a blank one means "keep".
pub fn student_input(
    name: &str,
    email: &str,
    password: Option<&str>,
    creating: bool,
) -> Result<StudentInput, ValidationError> {
    let name = require_text(name, "Name")?;
    let email = require_text(email, "Email")?;
    let password = password
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from);
    if creating && password.is_none() {
        return Err(ValidationError::MissingField("Password"));
    }
    Ok(StudentInput {
        name,
        email,
        password,
    })
}
