//! # Card Validation
//!
//! Stateless checks run on submit: Luhn checksum for the card number,
//! expiry against the current month, and the CPF (Brazilian tax id) check
//! digits.

use super::format::only_digits;
use crate::{
    consts,
    models::card::{CardField, CardInput, ValidationErrors},
};
use chrono::{Datelike, NaiveDate, Utc};

/// Luhn (mod 10) checksum over the digits of `value`.
///
/// Non-digit characters are ignored. Input without any digit is invalid.
pub fn luhn_check(value: &str) -> bool {
    let digits = only_digits(value);
    if digits.is_empty() {
        return false;
    }

    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(idx, byte)| {
            let digit = u32::from(byte - b'0');
            if idx % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum();

    sum % 10 == 0
}

/// Checks a two-digit month/year pair against today in the checkout time zone.
pub fn validate_expiry(month: &str, year: &str) -> bool {
    validate_expiry_in(month, year, consts::CHECKOUT_TIMEZONE)
}

pub fn validate_expiry_in(month: &str, year: &str, timezone: chrono_tz::Tz) -> bool {
    let today = Utc::now().with_timezone(&timezone).date_naive();
    validate_expiry_at(month, year, today)
}

/// Checks a two-digit month/year pair against `today`.
///
/// The year is compared against the last two digits of the current year only,
/// there's no century disambiguation.
pub fn validate_expiry_at(month: &str, year: &str, today: NaiveDate) -> bool {
    let (Some(exp_month), Some(exp_year)) = (parse_two_digits(month), parse_two_digits(year))
    else {
        return false;
    };

    if !(1..=12).contains(&exp_month) {
        return false;
    }

    let current_year = today.year().rem_euclid(100) as u32;
    let current_month = today.month();

    if exp_year < current_year {
        return false;
    }
    if exp_year == current_year && exp_month < current_month {
        return false;
    }

    true
}

fn parse_two_digits(value: &str) -> Option<u32> {
    let value = value.trim();
    if value.is_empty() || value.len() > 2 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Computes one CPF check digit over `digits` with weights starting at `first_weight`.
fn cpf_check_digit(digits: &[u32], first_weight: u32) -> u32 {
    let sum: u32 = digits
        .iter()
        .zip((2..=first_weight).rev())
        .map(|(digit, weight)| digit * weight)
        .sum();

    match 11 - (sum % 11) {
        10 | 11 => 0,
        digit => digit,
    }
}

/// Check digits for the first nine digits of a CPF.
pub fn cpf_check_digits(first_nine: &[u32; 9]) -> [u32; 2] {
    let first = cpf_check_digit(first_nine, 10);

    let mut first_ten = [0u32; 10];
    first_ten[..9].copy_from_slice(first_nine);
    first_ten[9] = first;

    [first, cpf_check_digit(&first_ten, 11)]
}

/// Validates a CPF, masked or not.
///
/// Sequences of eleven identical digits are rejected even though their check
/// digits work out.
pub fn validate_cpf(value: &str) -> bool {
    let digits: Vec<u32> = only_digits(value)
        .bytes()
        .map(|byte| u32::from(byte - b'0'))
        .collect();

    if digits.len() != consts::CPF_DIGITS || digits.iter().all(|digit| *digit == digits[0]) {
        return false;
    }

    let first = cpf_check_digit(&digits[..9], 10);
    if first != digits[9] {
        return false;
    }

    cpf_check_digit(&digits[..10], 11) == digits[10]
}

/// Runs every field check over a form's input.
///
/// The CVV must have exactly `expected_cvv` digits: the BIN hint when a
/// profile is known, 3 otherwise.
pub fn validate_card_input(
    input: &CardInput,
    expected_cvv: usize,
    timezone: chrono_tz::Tz,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    let digits = input.number_digits();
    if digits.len() < consts::MIN_CARD_NUMBER_DIGITS || !luhn_check(&digits) {
        errors.insert(CardField::Number, consts::MSG_INVALID_CARD_NUMBER.into());
    }

    if input.holder_name.trim().is_empty() {
        errors.insert(CardField::HolderName, consts::MSG_HOLDER_NAME_REQUIRED.into());
    }

    let (month, year) = input.expiry_parts();
    if !validate_expiry_in(month, year, timezone) {
        errors.insert(CardField::Expiry, consts::MSG_INVALID_EXPIRY.into());
    }

    let cvv_is_numeric = input.cvv.bytes().all(|b| b.is_ascii_digit());
    if input.cvv.len() != expected_cvv || !cvv_is_numeric {
        errors.insert(CardField::Cvv, format!("CVV deve ter {expected_cvv} dígitos"));
    }

    if !validate_cpf(&input.tax_id) {
        errors.insert(CardField::TaxId, consts::MSG_INVALID_CPF.into());
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn june_2024() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn test_luhn_check() {
        assert!(luhn_check("4532015112830366"));
        assert!(luhn_check("4532 0151 1283 0366"));
        assert!(!luhn_check("4532015112830367"));
        assert!(!luhn_check(""));
        assert!(!luhn_check("abcd"));
    }

    #[test]
    fn test_validate_expiry_at() {
        assert!(!validate_expiry_at("05", "24", june_2024()));
        assert!(validate_expiry_at("06", "24", june_2024()));
        assert!(validate_expiry_at("01", "25", june_2024()));
        assert!(!validate_expiry_at("13", "25", june_2024()));
        assert!(!validate_expiry_at("00", "25", june_2024()));
        assert!(!validate_expiry_at("12", "23", june_2024()));
    }

    #[test]
    fn test_validate_expiry_missing_parts() {
        assert!(!validate_expiry_at("", "25", june_2024()));
        assert!(!validate_expiry_at("06", "", june_2024()));
        assert!(!validate_expiry_at("0a", "25", june_2024()));
    }

    #[test]
    fn test_validate_cpf() {
        assert!(validate_cpf("111.444.777-35"));
        assert!(validate_cpf("11144477735"));
        assert!(!validate_cpf("111.111.111-11"));
        assert!(!validate_cpf("123.456.789-00"));
        assert!(!validate_cpf("111.444.777-3"));
        assert!(!validate_cpf(""));
    }

    #[test]
    fn test_cpf_check_digits() {
        assert_eq!(cpf_check_digits(&[1, 1, 1, 4, 4, 4, 7, 7, 7]), [3, 5]);
    }

    #[test]
    fn test_validate_card_input() {
        let mut input = CardInput {
            number: "6035 1234 5678 9011".into(),
            holder_name: "MARIA SILVA".into(),
            expiry: "12/99".into(),
            cvv: "1234".into(),
            tax_id: "111.444.777-35".into(),
        };

        assert!(validate_card_input(&input, 4, consts::CHECKOUT_TIMEZONE).is_empty());

        let errors = validate_card_input(&input, 3, consts::CHECKOUT_TIMEZONE);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[&CardField::Cvv], "CVV deve ter 3 dígitos");

        input.number = "6035 1234 5678".into();
        input.holder_name = "   ".into();
        let errors = validate_card_input(&input, 4, consts::CHECKOUT_TIMEZONE);
        assert!(errors.contains_key(&CardField::Number));
        assert!(errors.contains_key(&CardField::HolderName));
    }

    proptest! {
        #[test]
        fn prop_generated_cpf_is_valid(first_nine in proptest::array::uniform9(0u32..10)) {
            prop_assume!(first_nine.iter().any(|digit| *digit != first_nine[0]));

            let [first, second] = cpf_check_digits(&first_nine);
            let cpf: String = first_nine
                .iter()
                .chain([first, second].iter())
                .map(|digit| char::from_digit(*digit, 10).unwrap())
                .collect();

            prop_assert!(validate_cpf(&cpf));
        }

        #[test]
        fn prop_wrong_second_digit_is_invalid(first_nine in proptest::array::uniform9(0u32..10), delta in 1u32..10) {
            let [first, second] = cpf_check_digits(&first_nine);
            let wrong = (second + delta) % 10;
            let cpf: String = first_nine
                .iter()
                .chain([first, wrong].iter())
                .map(|digit| char::from_digit(*digit, 10).unwrap())
                .collect();

            prop_assert!(!validate_cpf(&cpf));
        }
    }
}
