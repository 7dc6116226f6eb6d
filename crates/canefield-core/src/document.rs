//! Check-digit validation for Brazilian taxpayer documents.
//!
//! Both validators strip every non-digit character first and never fail:
//! any input string yields `true` or `false`.

use serde::{Deserialize, Serialize};

const CORPORATE_WEIGHTS_1: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CORPORATE_WEIGHTS_2: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Which document family a farm owner registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
  /// 11-digit individual taxpayer id (CPF).
  Personal,
  /// 14-digit company registration id (CNPJ).
  Corporate,
}

impl DocumentKind {
  /// The document family implied by the digit count, if any.
  pub fn from_digit_count(count: usize) -> Option<Self> {
    match count {
      11 => Some(Self::Personal),
      14 => Some(Self::Corporate),
      _ => None,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::Personal => "CPF",
      Self::Corporate => "CNPJ",
    }
  }
}

/// Digits of `input`, in order, with everything else dropped.
pub fn digits(input: &str) -> Vec<u32> {
  input.chars().filter_map(|c| c.to_digit(10)).collect()
}

/// `11 - (sum mod 11)`, with results above 9 clamped to 0.
fn check_digit(digits: &[u32], weights: impl IntoIterator<Item = u32>) -> u32 {
  let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
  let digit = 11 - sum % 11;
  if digit > 9 { 0 } else { digit }
}

fn all_same(digits: &[u32]) -> bool { digits.windows(2).all(|w| w[0] == w[1]) }

/// Validate an 11-digit personal id.
pub fn is_valid_personal_id(input: &str) -> bool {
  let d = digits(input);
  if d.len() != 11 || all_same(&d) {
    return false;
  }
  check_digit(&d[..9], (2..=10).rev()) == d[9]
    && check_digit(&d[..10], (2..=11).rev()) == d[10]
}

/// Validate a 14-digit corporate id.
pub fn is_valid_corporate_id(input: &str) -> bool {
  let d = digits(input);
  if d.len() != 14 || all_same(&d) {
    return false;
  }
  check_digit(&d[..12], CORPORATE_WEIGHTS_1) == d[12]
    && check_digit(&d[..13], CORPORATE_WEIGHTS_2) == d[13]
}

/// Classify and validate `input`. Returns `None` for anything that is not a
/// valid personal or corporate id.
pub fn validate_document(input: &str) -> Option<DocumentKind> {
  match DocumentKind::from_digit_count(digits(input).len())? {
    DocumentKind::Personal => is_valid_personal_id(input).then_some(DocumentKind::Personal),
    DocumentKind::Corporate => is_valid_corporate_id(input).then_some(DocumentKind::Corporate),
  }
}
