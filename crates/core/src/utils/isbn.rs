//! ISBN (International Standard Book Number) validation.
//!
//! Supports both forms:
//! - ISBN-10: 9 digits + check character (0-9 or X), weighted mod-11 check
//! - ISBN-13: 13 digits, alternating 1/3 weights, mod-10 check
//!
//! Example: "9780306406157" (ISBN-13), "0306406152" (ISBN-10)

/// ISBN form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsbnKind {
    Isbn10,
    Isbn13,
}

/// Parsed and validated ISBN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedIsbn {
    pub kind: IsbnKind,
    /// Digits only, hyphens and spaces stripped, uppercase X preserved.
    pub normalized: String,
}

/// Errors that can occur when parsing ISBNs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IsbnError {
    /// ISBNs are 10 or 13 characters after stripping separators
    InvalidLength(usize),
    /// Only digits are allowed (plus a trailing X for ISBN-10)
    InvalidCharacter(char),
    /// Check digit validation failed
    CheckDigitMismatch,
}

impl std::fmt::Display for IsbnError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IsbnError::InvalidLength(len) => {
                write!(f, "ISBN must be 10 or 13 characters, got {}", len)
            }
            IsbnError::InvalidCharacter(c) => {
                write!(f, "Invalid character '{}' in ISBN", c)
            }
            IsbnError::CheckDigitMismatch => {
                write!(f, "ISBN check digit mismatch")
            }
        }
    }
}

impl std::error::Error for IsbnError {}

/// Parse and validate an ISBN string.
///
/// Hyphens and spaces are stripped before validation, so both "978-0-306-
/// 40615-7" and "9780306406157" are accepted.
pub fn parse_isbn(s: &str) -> Result<ParsedIsbn, IsbnError> {
    let normalized: String = s
        .trim()
        .chars()
        .filter(|c| *c != '-' && *c != ' ')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    match normalized.len() {
        10 => {
            validate_isbn10(&normalized)?;
            Ok(ParsedIsbn {
                kind: IsbnKind::Isbn10,
                normalized,
            })
        }
        13 => {
            validate_isbn13(&normalized)?;
            Ok(ParsedIsbn {
                kind: IsbnKind::Isbn13,
                normalized,
            })
        }
        len => Err(IsbnError::InvalidLength(len)),
    }
}

/// True when the string is a structurally valid ISBN-10 or ISBN-13 with a
/// correct check digit.
pub fn validate_isbn(s: &str) -> bool {
    parse_isbn(s).is_ok()
}

fn validate_isbn10(normalized: &str) -> Result<(), IsbnError> {
    let mut sum = 0u32;
    for (i, c) in normalized.chars().enumerate() {
        let value = if c.is_ascii_digit() {
            c.to_digit(10).unwrap()
        } else if c == 'X' && i == 9 {
            10
        } else {
            return Err(IsbnError::InvalidCharacter(c));
        };
        sum += value * (10 - i as u32);
    }
    if sum % 11 != 0 {
        return Err(IsbnError::CheckDigitMismatch);
    }
    Ok(())
}

fn validate_isbn13(normalized: &str) -> Result<(), IsbnError> {
    let mut digits = Vec::with_capacity(13);
    for c in normalized.chars() {
        match c.to_digit(10) {
            Some(d) => digits.push(d),
            None => return Err(IsbnError::InvalidCharacter(c)),
        }
    }

    let expected = compute_isbn13_check_digit(&digits[0..12]);
    if expected != digits[12] {
        return Err(IsbnError::CheckDigitMismatch);
    }
    Ok(())
}

/// Compute the ISBN-13 check digit for the first 12 digits.
///
/// Digits are weighted alternately 1 and 3; the check digit brings the total
/// to a multiple of 10.
pub fn compute_isbn13_check_digit(first_12: &[u32]) -> u32 {
    let sum: u32 = first_12
        .iter()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { *d } else { *d * 3 })
        .sum();
    (10 - (sum % 10)) % 10
}
