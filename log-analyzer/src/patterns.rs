//! Named validation rules for common text fields.
//!
//! Validation is anchored: a value conforms only when the rule matches it
//! from the first character to the last. [`PatternLibrary::extract`] uses the
//! same rules unanchored to pull occurrences out of free text.

use std::sync::LazyLock;

use derive_more::Display;
use regex::Regex;

const IPV4_OCTET: &str = r"(?:25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])";

static CATALOG: LazyLock<Vec<(&'static str, String)>> = LazyLock::new(|| {
    vec![
        ("email", r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}".into()),
        (
            "phone",
            r"(?:\+?1[-. ]?)?(?:\([0-9]{3}\)|[0-9]{3})[-. ]?[0-9]{3}[-. ]?[0-9]{4}".into(),
        ),
        ("ip_address", format!(r"(?:{IPV4_OCTET}\.){{3}}{IPV4_OCTET}")),
        (
            "url",
            r"https?://[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*(?::[0-9]{1,5})?(?:/[^\s]*)?".into(),
        ),
        (
            "date",
            r"[0-9]{4}-(?:0[1-9]|1[0-2])-(?:0[1-9]|[12][0-9]|3[01])".into(),
        ),
        ("time", r"(?:[01][0-9]|2[0-3]):[0-5][0-9](?::[0-5][0-9])?".into()),
        ("zip_code", r"[0-9]{5}(?:-[0-9]{4})?".into()),
        ("credit_card", r"[0-9]{4}(?:[- ]?[0-9]{4}){3}".into()),
        ("hex_color", r"#(?:[0-9A-Fa-f]{6}|[0-9A-Fa-f]{3})".into()),
        ("username", r"[A-Za-z][A-Za-z0-9_]{2,15}".into()),
    ]
});

static STANDARD: LazyLock<PatternLibrary> = LazyLock::new(|| {
    PatternLibrary::new(CATALOG.iter().map(|(name, pattern)| (*name, pattern.as_str())))
        .expect("built-in catalog compiles")
});

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum Validation {
    #[display("Valid")]
    Valid,
    #[display("Invalid {field} format")]
    Invalid { field: &'static str },
    #[display("unknown field type")]
    UnknownField,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn into_pair(self) -> (bool, String) {
        (self.is_valid(), self.message())
    }
}

struct Rule {
    name: &'static str,
    anchored: Regex,
    search: Regex,
}

pub struct PatternLibrary {
    rules: Vec<Rule>,
}

impl PatternLibrary {
    /// The built-in catalog, compiled on first use.
    pub fn standard() -> &'static PatternLibrary {
        &STANDARD
    }

    pub fn new<'p>(
        rules: impl IntoIterator<Item = (&'static str, &'p str)>,
    ) -> Result<Self, regex::Error> {
        let rules = rules
            .into_iter()
            .map(|(name, pattern)| -> Result<Rule, regex::Error> {
                Ok(Rule {
                    name,
                    anchored: Regex::new(&format!("^(?:{pattern})$"))?,
                    search: Regex::new(pattern)?,
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { rules })
    }

    fn rule(&self, field: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.name == field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|rule| rule.name)
    }

    pub fn is_known(&self, field: &str) -> bool {
        self.rule(field).is_some()
    }

    pub fn validate(&self, field: &str, value: &str) -> Validation {
        match self.rule(field) {
            None => Validation::UnknownField,
            Some(rule) if rule.anchored.is_match(value) => Validation::Valid,
            Some(rule) => Validation::Invalid { field: rule.name },
        }
    }

    /// Every non-overlapping occurrence of `field` in `text`, left to right.
    /// `None` when the field is not in the catalog.
    pub fn extract<'t>(&self, field: &str, text: &'t str) -> Option<Vec<&'t str>> {
        let rule = self.rule(field)?;
        Some(rule.search.find_iter(text).map(|m| m.as_str()).collect())
    }
}

/// [`PatternLibrary::validate`] against the built-in catalog.
pub fn validate(field: &str, value: &str) -> Validation {
    PatternLibrary::standard().validate(field, value)
}
