//! Single-field validators and display helpers.
//!
//! Handles:
//! - Full names (allowed characters, length, per-word capitalization)
//! - DNI (separator stripping, 7–8 digits, dotted display form)
//! - Birth dates (ISO parsing, at least yesterday, at most 120 years ago)

use chrono::{Datelike, Months, NaiveDate};

use super::{today, ValidationError, DATE_FORMAT};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;
pub const DNI_MIN_DIGITS: usize = 7;
pub const DNI_MAX_DIGITS: usize = 8;
pub const MAX_AGE_YEARS: u32 = 120;

// ============================================================================
// Full name
// ============================================================================

/// Validate a full name and return it trimmed and capitalized per word.
pub fn validate_full_name(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("Full name is required"));
    }

    let mut messages = Vec::new();
    let length = trimmed.chars().count();

    if length > NAME_MAX_CHARS {
        messages.push(format!(
            "Full name cannot exceed {} characters",
            NAME_MAX_CHARS
        ));
    }
    if !trimmed.chars().all(is_name_char) {
        messages.push(
            "Full name can only contain letters, spaces, accents, apostrophes and hyphens".into(),
        );
    }
    if length < NAME_MIN_CHARS {
        messages.push(format!(
            "Full name must be at least {} characters",
            NAME_MIN_CHARS
        ));
    }

    if !messages.is_empty() {
        return Err(ValidationError::from_messages(messages));
    }
    Ok(normalize_name(trimmed))
}

/// Capitalize each whitespace-delimited word and join with single spaces.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(capitalize_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();
    let mut out = String::with_capacity(word.len());
    if let Some(first) = chars.next() {
        out.push(single_char(first.to_uppercase()).unwrap_or(first));
    }
    out.extend(chars.map(|c| single_char(c.to_lowercase()).unwrap_or(c)));
    out
}

// Case mappings that expand (ß -> SS, İ -> i̇) leave the character as is.
fn single_char(mut mapped: impl Iterator<Item = char>) -> Option<char> {
    let first = mapped.next()?;
    match mapped.next() {
        Some(_) => None,
        None => Some(first),
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphabetic() || is_latin_letter(c) || c.is_whitespace() || c == '\'' || c == '-'
}

/// Latin-1 Supplement and Latin Extended-A letters.
fn is_latin_letter(c: char) -> bool {
    matches!(c, '\u{C0}'..='\u{17F}') && c != '\u{D7}' && c != '\u{F7}'
}

// ============================================================================
// DNI
// ============================================================================

/// Validate a DNI and return it with separators removed.
pub fn validate_dni(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("DNI is required"));
    }

    let digits = strip_dni_separators(trimmed);
    let valid = !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
        && (DNI_MIN_DIGITS..=DNI_MAX_DIGITS).contains(&digits.len());

    if !valid {
        return Err(ValidationError::new(format!(
            "DNI must have between {} and {} numeric digits",
            DNI_MIN_DIGITS, DNI_MAX_DIGITS
        )));
    }
    Ok(digits)
}

/// Remove whitespace and dots.
pub fn strip_dni_separators(dni: &str) -> String {
    dni.chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .collect()
}

/// Format a DNI with dots ("12345678" -> "12.345.678", "1234567" -> "1.234.567").
///
/// Values that are not 7 or 8 digits are returned unchanged.
pub fn format_dni(dni: &str) -> String {
    let digits = strip_dni_separators(dni);
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return dni.to_string();
    }
    match digits.len() {
        8 => format!("{}.{}.{}", &digits[..2], &digits[2..5], &digits[5..]),
        7 => format!("{}.{}.{}", &digits[..1], &digits[1..4], &digits[4..]),
        _ => dni.to_string(),
    }
}

// ============================================================================
// Birth date
// ============================================================================

/// Validate a birth date against the current local date.
pub fn validate_birth_date(input: &str) -> Result<String, ValidationError> {
    validate_birth_date_on(input, today())
}

/// Validate a birth date against `today`.
///
/// Accepted iff `today - 120 years <= date <= today - 1 day`. Returns the
/// input unchanged.
pub fn validate_birth_date_on(input: &str, today: NaiveDate) -> Result<String, ValidationError> {
    if input.trim().is_empty() {
        return Err(ValidationError::new("Birth date is required"));
    }

    let date = parse_iso_date(input)
        .ok_or_else(|| ValidationError::new("Birth date must be a valid date"))?;

    let mut messages = Vec::new();

    if date > today {
        messages.push("Birth date cannot be in the future".to_string());
    }
    if let Some(earliest) = earliest_birth_date(today) {
        if date < earliest {
            messages.push(format!(
                "Birth date cannot be more than {} years ago",
                MAX_AGE_YEARS
            ));
        }
    }
    if let Some(latest) = latest_birth_date(today) {
        if date > latest {
            messages.push("Birth date must be at least yesterday".to_string());
        }
    }

    if !messages.is_empty() {
        return Err(ValidationError::from_messages(messages));
    }
    Ok(input.to_string())
}

/// Parse a zero-padded `YYYY-MM-DD` date.
///
/// chrono also accepts unpadded fields, a sign or leading whitespace, so the
/// parsed date must format back to the exact input.
fn parse_iso_date(input: &str) -> Option<NaiveDate> {
    let date = NaiveDate::parse_from_str(input, DATE_FORMAT).ok()?;
    (date.format(DATE_FORMAT).to_string() == input).then_some(date)
}

/// Oldest accepted birth date (inclusive).
pub fn earliest_birth_date(today: NaiveDate) -> Option<NaiveDate> {
    today.checked_sub_months(Months::new(MAX_AGE_YEARS * 12))
}

/// Most recent accepted birth date (inclusive).
pub fn latest_birth_date(today: NaiveDate) -> Option<NaiveDate> {
    today.pred_opt()
}

/// Whole years between `birth` and `today`.
pub fn calculate_age(birth: NaiveDate, today: NaiveDate) -> u32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    u32::try_from(age).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_name_capitalization() {
        assert_eq!(
            validate_full_name("juan carlos pérez").unwrap(),
            "Juan Carlos Pérez"
        );
        assert_eq!(validate_full_name("  MARÍA   josé  ").unwrap(), "María José");
        assert_eq!(validate_full_name("o'brien").unwrap(), "O'brien");
        assert_eq!(validate_full_name("ana-lía").unwrap(), "Ana-lía");
    }

    #[test]
    fn test_name_rejections() {
        assert_eq!(
            validate_full_name("   ").unwrap_err().messages(),
            ["Full name is required"]
        );
        assert!(validate_full_name("J").is_err());
        assert!(validate_full_name("R2D2").is_err());
        assert!(validate_full_name("juan@example").is_err());
        assert!(validate_full_name(&"a".repeat(101)).is_err());
        assert!(validate_full_name(&"a".repeat(100)).is_ok());
    }

    #[test]
    fn test_name_reports_every_violation() {
        let err = validate_full_name(&"1".repeat(101)).unwrap_err();
        assert_eq!(err.messages().len(), 2);
    }

    #[test]
    fn test_name_case_mapping_stays_single_char() {
        assert_eq!(normalize_name("ßtraße"), "ßtraße");
        assert_eq!(normalize_name("ÿves"), "Ÿves");
        assert_eq!(normalize_name(&normalize_name("ÿves")), "Ÿves");
    }

    #[test]
    fn test_dni_strips_separators() {
        assert_eq!(validate_dni("12.345.678").unwrap(), "12345678");
        assert_eq!(validate_dni(" 1 234 567 ").unwrap(), "1234567");
        assert_eq!(validate_dni("12345678").unwrap(), "12345678");
    }

    #[test]
    fn test_dni_rejections() {
        assert_eq!(validate_dni("").unwrap_err().messages(), ["DNI is required"]);
        assert!(validate_dni("123456").is_err());
        assert!(validate_dni("123456789").is_err());
        assert!(validate_dni("12-345-678").is_err());
        assert!(validate_dni("1234567a").is_err());
        assert!(validate_dni("...").is_err());
    }

    #[test]
    fn test_format_dni() {
        assert_eq!(format_dni("12345678"), "12.345.678");
        assert_eq!(format_dni("1234567"), "1.234.567");
        assert_eq!(format_dni("12.345.678"), "12.345.678");
        assert_eq!(format_dni("123"), "123");
        assert_eq!(format_dni("abcdefgh"), "abcdefgh");
    }

    #[test]
    fn test_birth_date_window() {
        let today = date(2024, 6, 15);

        assert!(validate_birth_date_on("2024-06-14", today).is_ok());
        assert!(validate_birth_date_on("1904-06-15", today).is_ok());
        assert_eq!(
            validate_birth_date_on("2000-01-01", today).unwrap(),
            "2000-01-01"
        );

        assert!(validate_birth_date_on("1904-06-14", today).is_err());
        assert!(validate_birth_date_on("2024-06-15", today).is_err());
        assert!(validate_birth_date_on("2024-06-16", today).is_err());
    }

    #[test]
    fn test_birth_date_today_message() {
        let today = date(2024, 6, 15);
        let err = validate_birth_date_on("2024-06-15", today).unwrap_err();
        assert_eq!(err.messages(), ["Birth date must be at least yesterday"]);
    }

    #[test]
    fn test_birth_date_future_messages() {
        let today = date(2024, 6, 15);
        let err = validate_birth_date_on("2030-01-01", today).unwrap_err();
        assert_eq!(
            err.messages(),
            [
                "Birth date cannot be in the future",
                "Birth date must be at least yesterday"
            ]
        );
    }

    #[test]
    fn test_birth_date_unparseable() {
        let today = date(2024, 6, 15);
        assert_eq!(
            validate_birth_date_on("", today).unwrap_err().messages(),
            ["Birth date is required"]
        );
        assert_eq!(
            validate_birth_date_on("2023-02-30", today).unwrap_err().messages(),
            ["Birth date must be a valid date"]
        );
        assert!(validate_birth_date_on("15/06/2000", today).is_err());
    }

    #[test]
    fn test_birth_date_requires_padded_iso() {
        let today = date(2024, 6, 15);
        for input in ["2000-1-1", "2000-01-1", " 2000-01-01", "2000-01-01 ", "+2000-01-01"] {
            assert_eq!(
                validate_birth_date_on(input, today).unwrap_err().messages(),
                ["Birth date must be a valid date"],
                "{:?}",
                input
            );
        }
    }

    #[test]
    fn test_earliest_birth_date_leap_day() {
        assert_eq!(earliest_birth_date(date(2024, 2, 29)), Some(date(1904, 2, 29)));
        assert_eq!(earliest_birth_date(date(2025, 3, 1)), Some(date(1905, 3, 1)));
    }

    #[test]
    fn test_calculate_age() {
        let birth = date(2000, 6, 15);
        assert_eq!(calculate_age(birth, date(2024, 6, 14)), 23);
        assert_eq!(calculate_age(birth, date(2024, 6, 15)), 24);
        assert_eq!(calculate_age(birth, date(1999, 1, 1)), 0);
    }
}
