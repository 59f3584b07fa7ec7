//! Best-effort split of a free-text salutation into salutation and title.
//!
//! CRM users type things like `"Herr Dr."`, `"Frau Prof. Dr. med."`, `"Mr"` or
//! `"Dr."` into one field while the ERP address table has separate columns.
//! Anything unrecognized yields `None` fields; this never fails.

use once_cell::sync::Lazy;
use regex::Regex;

/// Salutation words recognized at the start of the field.
static SALUTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(herr|herrn|frau|mr|mrs|ms|miss|mx|divers|firma)\.?(?:\s+|$)")
        .expect("SALUTATION regex should compile - this is a bug")
});

/// Academic titles recognized after (or without) a salutation.
static TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^((?:(?:prof|dr|dipl\.-[a-z]+|mag|ing|med|rer\.\s?nat|phil|jur|h\.\s?c)\.?\s*)+)$",
    )
    .expect("TITLE regex should compile - this is a bug")
});

/// Result of [`split_salutation`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalutationParts {
    pub salutation: Option<String>,
    pub title: Option<String>,
}

/// Splits `"Herr Dr."` into `salutation = "Herr"`, `title = "Dr."`.
///
/// Without a recognizable salutation word the whole input is tried as a
/// title; without a recognizable title the remainder is dropped.
#[must_use]
pub fn split_salutation(raw: &str) -> SalutationParts {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return SalutationParts::default();
    }

    let (salutation, rest) = match SALUTATION.captures(trimmed) {
        Some(caps) => {
            let word = caps.get(1).map_or("", |m| m.as_str());
            let consumed = caps.get(0).map_or(0, |m| m.end());
            (Some(canonical_salutation(word)), trimmed.get(consumed..).unwrap_or("").trim())
        }
        None => (None, trimmed),
    };

    let title = if rest.is_empty() {
        None
    } else if TITLE.is_match(rest) {
        Some(rest.split_whitespace().collect::<Vec<_>>().join(" "))
    } else {
        None
    };

    SalutationParts { salutation, title }
}

fn canonical_salutation(word: &str) -> String {
    match word.to_lowercase().as_str() {
        "herr" | "herrn" => "Herr".to_string(),
        "frau" => "Frau".to_string(),
        "mr" => "Mr".to_string(),
        "mrs" => "Mrs".to_string(),
        "ms" => "Ms".to_string(),
        "miss" => "Miss".to_string(),
        "mx" => "Mx".to_string(),
        "divers" => "Divers".to_string(),
        "firma" => "Firma".to_string(),
        _ => word.to_string(),
    }
}
