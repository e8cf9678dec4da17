// Turns test class and method names into readable sentences

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static TRAILING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+$").expect("invalid trailing number regex"));

const AFFIX: &str = "Test";

/// Name prettifier. Remembers method stems it has seen so numbered
/// variants of one test (`testFoo`, `testFoo2`) share a title.
#[derive(Debug, Default)]
pub struct NamePrettifier {
    seen: HashSet<String>,
}

impl NamePrettifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// `BankAccountTest` becomes `BankAccount`
    pub fn prettify_test_class(&self, name: &str) -> String {
        let mut title = name.strip_suffix(AFFIX).unwrap_or(name);

        if name.starts_with(AFFIX) {
            title = title.get(AFFIX.len()..).unwrap_or("");
        }

        title.strip_prefix('\\').unwrap_or(title).to_string()
    }

    /// `testBalanceIsInitiallyZero` becomes `Balance is initially zero`
    pub fn prettify_test_method(&mut self, name: &str) -> String {
        if name.is_empty() {
            return String::new();
        }

        let stem = TRAILING_NUMBER.replace(name, "").into_owned();
        let had_number = stem.len() != name.len();

        let name = if self.seen.contains(&stem) {
            stem.as_str()
        } else {
            if !had_number {
                self.seen.insert(stem.clone());
            }
            name
        };

        let name = name.strip_prefix("test").unwrap_or(name);
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return String::new();
        };
        let name: String = first.to_uppercase().chain(chars).collect();

        if name.contains('_') {
            return name.replace('_', " ").trim().to_string();
        }

        let mut buffer = String::with_capacity(name.len() + 8);
        let mut was_numeric = false;

        for (i, c) in name.chars().enumerate() {
            if i > 0 && c.is_ascii_uppercase() {
                buffer.push(' ');
                buffer.push(c.to_ascii_lowercase());
                continue;
            }

            let is_numeric = c.is_ascii_digit();
            if !was_numeric && is_numeric {
                buffer.push(' ');
                was_numeric = true;
            }
            if was_numeric && !is_numeric {
                was_numeric = false;
            }
            buffer.push(c);
        }

        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_affixes_are_removed() {
        let p = NamePrettifier::new();
        assert_eq!(p.prettify_test_class("BankAccountTest"), "BankAccount");
        assert_eq!(p.prettify_test_class("TestBankAccount"), "BankAccount");
        assert_eq!(p.prettify_test_class("\\Bank\\AccountTest"), "Bank\\Account");
    }

    #[test]
    fn test_camel_case_method() {
        let mut p = NamePrettifier::new();
        assert_eq!(
            p.prettify_test_method("testBalanceIsInitiallyZero"),
            "Balance is initially zero"
        );
    }

    #[test]
    fn test_underscored_method() {
        let mut p = NamePrettifier::new();
        assert_eq!(
            p.prettify_test_method("test_balance_is_zero"),
            "balance is zero"
        );
        assert_eq!(p.prettify_test_method("testBalance_Zero"), "Balance Zero");
    }

    #[test]
    fn test_numbered_variants_share_a_title() {
        let mut p = NamePrettifier::new();
        assert_eq!(p.prettify_test_method("testFoo"), "Foo");
        assert_eq!(p.prettify_test_method("testFoo2"), "Foo");
    }

    #[test]
    fn test_unseen_number_is_spaced() {
        let mut p = NamePrettifier::new();
        assert_eq!(p.prettify_test_method("testBar2"), "Bar 2");
    }
}
