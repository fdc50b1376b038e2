use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};

/// An ISBN that passed the input gate: 13 characters starting with `97`,
/// or 10 characters (upper-cased so a trailing `x` becomes `X`).
///
/// The gate does not verify check digits; see [`IsbnCode::checksum_ok`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IsbnCode(String);

fn strip_isbn(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == 'X' || *c == 'x')
        .collect()
}

fn digit_values(code: &str) -> Option<Vec<u32>> {
    code.chars()
        .enumerate()
        .map(|(i, c)| match c {
            'X' if i == 9 && code.len() == 10 => Some(10),
            _ => c.to_digit(10),
        })
        .collect()
}

fn check_isbn10(digits: &[u32]) -> bool {
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, &d)| (10 - i as u32) * d)
        .sum();
    sum % 11 == 0
}

fn check_isbn13(digits: &[u32]) -> bool {
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, &d)| if i % 2 == 0 { d } else { d * 3 })
        .sum();
    sum % 10 == 0
}

impl IsbnCode {
    /// Strip everything but digits and `X`, then apply the length/prefix gate.
    pub fn parse(input: &str) -> Result<Self> {
        let stripped = strip_isbn(input);
        if stripped.len() == 13 && stripped.starts_with("97") {
            return Ok(Self(stripped));
        }
        if stripped.len() == 10 {
            return Ok(Self(stripped.to_uppercase()));
        }
        Err(SearchError::InvalidIsbn(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the check digit is consistent.
    pub fn checksum_ok(&self) -> bool {
        match digit_values(&self.0) {
            Some(d) if d.len() == 13 => check_isbn13(&d),
            Some(d) if d.len() == 10 => check_isbn10(&d),
            _ => false,
        }
    }
}

impl fmt::Display for IsbnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isbn13_with_hyphens() {
        let isbn = IsbnCode::parse("978-4-08-882011-1").unwrap();
        assert_eq!(isbn.as_str(), "9784088820111");
        assert_eq!(isbn.as_str().len(), 13);
    }

    #[test]
    fn isbn13_must_start_with_97() {
        assert!(IsbnCode::parse("4901234567894").is_err());
    }

    #[test]
    fn isbn10_is_uppercased() {
        let isbn = IsbnCode::parse("007462542x").unwrap();
        assert_eq!(isbn.as_str(), "007462542X");
        assert!(isbn.checksum_ok());
    }

    #[test]
    fn other_lengths_rejected() {
        assert!(matches!(
            IsbnCode::parse("One Piece 5巻"),
            Err(SearchError::InvalidIsbn(_))
        ));
        assert!(IsbnCode::parse("12345678").is_err());
    }

    #[test]
    fn gate_ignores_check_digit() {
        let isbn = IsbnCode::parse("9780306406158").unwrap();
        assert!(!isbn.checksum_ok());
        assert!(IsbnCode::parse("9780306406157").unwrap().checksum_ok());
        assert!(IsbnCode::parse("0306406152").unwrap().checksum_ok());
    }
}
