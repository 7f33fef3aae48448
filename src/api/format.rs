//! Input masks applied while the user types.

use crate::consts;

pub fn only_digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// `MMYY` -> `MM/YY`, at most five display characters.
pub fn format_expiry(value: &str) -> String {
    let digits = only_digits(value);
    let mut masked = String::with_capacity(5);

    for (idx, digit) in digits.chars().take(4).enumerate() {
        if idx == 2 {
            masked.push('/');
        }
        masked.push(digit);
    }

    masked
}

/// Progressive `###.###.###-##` mask, extra digits are discarded.
pub fn format_cpf(value: &str) -> String {
    let digits = only_digits(value);
    let mut masked = String::with_capacity(14);

    for (idx, digit) in digits.chars().take(consts::CPF_DIGITS).enumerate() {
        match idx {
            3 | 6 => masked.push('.'),
            9 => masked.push('-'),
            _ => {}
        }
        masked.push(digit);
    }

    masked
}

/// Groups card digits at the given boundary offsets.
///
/// Digits past the last boundary are appended as a final group, so the output
/// always holds every input digit exactly once.
pub fn format_card_number(value: &str, gaps: &[usize]) -> String {
    let digits = only_digits(value);
    let mut groups: Vec<&str> = Vec::with_capacity(gaps.len() + 1);
    let mut start = 0;

    for &gap in gaps {
        if gap <= start || start >= digits.len() {
            continue;
        }
        let end = gap.min(digits.len());
        groups.push(&digits[start..end]);
        start = end;
    }
    if start < digits.len() {
        groups.push(&digits[start..]);
    }

    groups.join(" ")
}

/// Digits only, capped at `max_len`.
pub fn format_cvv(value: &str, max_len: usize) -> String {
    only_digits(value).chars().take(max_len).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_expiry() {
        assert_eq!(format_expiry("1"), "1");
        assert_eq!(format_expiry("12"), "12");
        assert_eq!(format_expiry("122"), "12/2");
        assert_eq!(format_expiry("12/29"), "12/29");
        assert_eq!(format_expiry("122934"), "12/29");
        assert_eq!(format_expiry("ab"), "");
    }

    #[test]
    fn test_format_cpf() {
        assert_eq!(format_cpf("111"), "111");
        assert_eq!(format_cpf("1114"), "111.4");
        assert_eq!(format_cpf("1114447"), "111.444.7");
        assert_eq!(format_cpf("1114447773"), "111.444.777-3");
        assert_eq!(format_cpf("11144477735"), "111.444.777-35");
        assert_eq!(format_cpf("111.444.777-3599"), "111.444.777-35");
    }

    #[test]
    fn test_format_card_number_with_bin_gaps() {
        assert_eq!(
            format_card_number("603512345678", &[4, 8, 12]),
            "6035 1234 5678"
        );
        assert_eq!(
            format_card_number("3782822463100", &[4, 10]),
            "3782 822463 100"
        );
    }

    #[test]
    fn test_format_card_number_keeps_every_digit() {
        let raw = "6035123456789012345";
        let formatted = format_card_number(raw, consts::DEFAULT_CARD_GAPS);

        assert_eq!(formatted, "6035 1234 5678 9012345");
        assert_eq!(only_digits(&formatted), raw);
    }

    #[test]
    fn test_format_card_number_partial_and_empty() {
        assert_eq!(format_card_number("60351", consts::DEFAULT_CARD_GAPS), "6035 1");
        assert_eq!(format_card_number("6035", consts::DEFAULT_CARD_GAPS), "6035");
        assert_eq!(format_card_number("", consts::DEFAULT_CARD_GAPS), "");
        assert_eq!(format_card_number("6035 12", &[]), "603512");
    }

    #[test]
    fn test_format_cvv() {
        assert_eq!(format_cvv("12a34", 4), "1234");
        assert_eq!(format_cvv("12345", 3), "123");
    }
}
