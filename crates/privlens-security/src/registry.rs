use regex::Regex;
use std::sync::LazyLock;

use crate::validators;

pub const EMAIL: &str = "Email";
pub const IPV4: &str = "IPv4";
pub const URL: &str = "URL";
pub const MAC_ADDRESS: &str = "MAC Address";
pub const IMEI: &str = "IMEI";
pub const IMSI: &str = "IMSI";
pub const CREDIT_CARD: &str = "CreditCard";
pub const PHONE: &str = "Phone";
pub const PASSPORT: &str = "Passport";
pub const SSN: &str = "SSN";
pub const COORDINATES: &str = "Coordinates";
pub const BITCOIN_ADDRESS: &str = "Bitcoin Address";
pub const ETHEREUM_ADDRESS: &str = "Ethereum Address";
pub const BASE64: &str = "Base64";

/// Labels whose identity is their digits alone
pub const NUMERIC_IDENTITY_LABELS: [&str; 5] = [PHONE, IMEI, IMSI, CREDIT_CARD, SSN];

/// Labels that suppress a later Phone finding with the same digits
pub const NUMERIC_PRIORITY_LABELS: [&str; 3] = [IMEI, IMSI, CREDIT_CARD];

pub type Validator = fn(&str) -> bool;

/// A named detection rule: coarse regex plus optional precise validator
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub name: &'static str,
    pub matcher: Regex,
    pub validator: Option<Validator>,
    pub severity_weight: f64,
    /// Take capture group 1 instead of the whole match
    pub uses_capture_group: bool,
}

impl PatternRule {
    /// Rule from a pattern known to compile; custom rules should use [`PatternRule::try_new`]
    pub fn new(name: &'static str, pattern: &str, severity_weight: f64) -> Self {
        Self::try_new(name, pattern, severity_weight).expect("built-in pattern must compile")
    }

    pub fn try_new(name: &'static str, pattern: &str, severity_weight: f64) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            matcher: Regex::new(pattern)?,
            validator: None,
            severity_weight: severity_weight.max(0.0),
            uses_capture_group: false,
        })
    }

    pub fn validated_by(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn capture_group(mut self) -> Self {
        self.uses_capture_group = true;
        self
    }

    /// Run the validator, accepting on regex alone when there is none
    pub fn accepts(&self, candidate: &str) -> bool {
        match self.validator {
            Some(validate) => validate(candidate),
            None => true,
        }
    }
}

static BUILTIN: LazyLock<PatternRegistry> = LazyLock::new(PatternRegistry::new);

/// Immutable catalog of detection rules, evaluated in registration order
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    rules: Vec<PatternRule>,
}

impl PatternRegistry {
    pub fn new() -> Self {
        // Order matters: IMEI/IMSI/CreditCard run before Phone so their digits win.
        // Boundaries and digits are ASCII-only so values touching non-Latin text still match.
        let rules = vec![
            PatternRule::new(EMAIL, r"(?-u:\b)[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}(?-u:\b)", 1.0)
                .validated_by(validators::is_valid_email),
            PatternRule::new(IPV4, r"(?-u:\b)(?:[0-9]{1,3}\.){3}[0-9]{1,3}(?-u:\b)", 0.5)
                .validated_by(validators::is_valid_ipv4),
            PatternRule::new(URL, r#"https?://[^\s"'<>]+"#, 0.2)
                .validated_by(validators::is_valid_url),
            PatternRule::new(MAC_ADDRESS, r"(?-u:\b)(?:[0-9A-Fa-f]{2}[:-]){5}[0-9A-Fa-f]{2}(?-u:\b)", 1.0),
            PatternRule::new(IMEI, r"(?-u:\b)[0-9]{15}(?-u:\b)", 2.0).validated_by(validators::is_valid_imei),
            PatternRule::new(IMSI, r"(?-u:\b)[0-9]{15}(?-u:\b)", 2.0).validated_by(validators::is_likely_imsi),
            PatternRule::new(CREDIT_CARD, r"(?-u:\b)(?:[0-9][ -]*?){13,19}(?-u:\b)", 3.0)
                .validated_by(validators::is_valid_credit_card),
            PatternRule::new(
                PHONE,
                r"(?:^|[^0-9])((?:\+[0-9]{1,3}[\s.-]?)?(?:\(?[0-9]{2,4}\)?[\s.-])[0-9]{2,4}[\s.-][0-9]{3,5})",
                1.5,
            )
            .validated_by(validators::is_likely_phone)
            .capture_group(),
            PatternRule::new(PASSPORT, r"(?-u:\b)[A-Z]{1,2}[0-9]{6,9}(?-u:\b)", 3.0),
            PatternRule::new(SSN, r"(?-u:\b)[0-9]{3}-[0-9]{2}-[0-9]{4}(?-u:\b)", 3.0),
            PatternRule::new(
                COORDINATES,
                r"[-+]?[0-9]{1,3}\.[0-9]+\s*,\s*[-+]?[0-9]{1,3}\.[0-9]+",
                2.0,
            )
            .validated_by(validators::is_valid_coordinates),
            PatternRule::new(BITCOIN_ADDRESS, r"(?-u:\b)(?:bc1|[13])[a-zA-HJ-NP-Z0-9]{25,62}(?-u:\b)", 1.0),
            PatternRule::new(ETHEREUM_ADDRESS, r"(?-u:\b)0x[a-fA-F0-9]{40}(?-u:\b)", 1.0),
            PatternRule::new(
                BASE64,
                r"(?-u:\b)(?:[A-Za-z0-9+/]{4}){12,}(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?(?-u:\b)",
                0.05,
            )
            .validated_by(validators::is_likely_sensitive_base64),
        ];

        Self { rules }
    }

    /// Shared instance of the built-in catalog
    pub fn builtin() -> &'static PatternRegistry {
        &BUILTIN
    }

    pub fn with_rules(rules: Vec<PatternRule>) -> Self {
        Self { rules }
    }

    /// Keep only the named rules, preserving registration order
    pub fn only(&self, names: &[&str]) -> Self {
        Self {
            rules: self
                .rules
                .iter()
                .filter(|rule| names.contains(&rule.name))
                .cloned()
                .collect(),
        }
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    pub fn get(&self, name: &str) -> Option<&PatternRule> {
        self.rules.iter().find(|rule| rule.name == name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self::new()
    }
}
