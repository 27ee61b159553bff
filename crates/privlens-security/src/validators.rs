//! Secondary validators that suppress regex false positives

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static EMAIL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

static COORDINATE_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([-+]?[0-9]{1,3}\.[0-9]+)\s*,\s*([-+]?[0-9]{1,3}\.[0-9]+)$").expect("valid coordinate regex")
});

const MAX_EMAIL_LEN: usize = 254;
const MIN_BASE64_LEN: usize = 48;

/// Strip everything but ASCII digits
pub fn normalize_digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// True when the string is non-empty and every char is the same
fn is_repeated_run(digits: &str) -> bool {
    let mut chars = digits.chars();
    match chars.next() {
        Some(first) => chars.all(|c| c == first),
        None => false,
    }
}

/// Luhn checksum over the digits of `value`; only 13-19 digit inputs can pass
pub fn luhn_check(value: &str) -> bool {
    let digits = normalize_digits(value);
    if !(13..=19).contains(&digits.len()) {
        return false;
    }

    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let mut digit = u32::from(b - b'0');
            if i % 2 == 1 {
                digit *= 2;
                if digit > 9 {
                    digit -= 9;
                }
            }
            digit
        })
        .sum();

    sum % 10 == 0
}

pub fn is_valid_email(value: &str) -> bool {
    let v = value.trim();
    !v.is_empty() && v.len() <= MAX_EMAIL_LEN && EMAIL_SHAPE.is_match(v)
}

pub fn is_valid_ipv4(value: &str) -> bool {
    let parts: Vec<&str> = value.trim().split('.').collect();
    parts.len() == 4
        && parts.iter().all(|part| {
            (1..=3).contains(&part.len())
                && part.bytes().all(|b| b.is_ascii_digit())
                && part.parse::<u16>().is_ok_and(|n| n <= 255)
        })
}

pub fn is_valid_url(value: &str) -> bool {
    Url::parse(value.trim()).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

pub fn is_valid_imei(value: &str) -> bool {
    let digits = normalize_digits(value);
    digits.len() == 15 && luhn_check(&digits)
}

/// IMSIs carry no check digit, so a Luhn pass means the value is an IMEI instead
pub fn is_likely_imsi(value: &str) -> bool {
    let digits = normalize_digits(value);
    if digits.len() != 15 || is_repeated_run(&digits) {
        return false;
    }
    if digits.bytes().all(|b| b == b'0') {
        return false;
    }
    !luhn_check(&digits)
}

pub fn is_likely_phone(value: &str) -> bool {
    let raw = value.trim();
    if raw.is_empty() {
        return false;
    }
    // "-12345" is a negative number, not a phone
    if raw.starts_with('-') && raw[1..].bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if !raw
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '+' | '(' | ')' | '.' | '-'))
    {
        return false;
    }

    let digits = normalize_digits(raw);
    (10..=15).contains(&digits.len()) && !is_repeated_run(&digits) && !luhn_check(&digits)
}

pub fn is_valid_credit_card(value: &str) -> bool {
    let digits = normalize_digits(value);
    (13..=19).contains(&digits.len()) && !is_repeated_run(&digits) && luhn_check(&digits)
}

pub fn is_valid_coordinates(value: &str) -> bool {
    let Some(caps) = COORDINATE_PAIR.captures(value.trim()) else {
        return false;
    };
    let (Ok(lat), Ok(lon)) = (caps[1].parse::<f64>(), caps[2].parse::<f64>()) else {
        return false;
    };
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

pub fn is_likely_sensitive_base64(value: &str) -> bool {
    let raw = value.trim();
    raw.len() >= MIN_BASE64_LEN
        && raw.len() % 4 == 0
        && raw.contains(['+', '/', '='])
        && !raw.chars().all(|c| c.is_ascii_alphabetic())
}
