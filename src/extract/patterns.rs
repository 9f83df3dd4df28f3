//! The ordered extraction rules
//!
//! Each rule is a compiled pattern plus a small matcher function, unit
//! tested on its own. Extraction callers layer them: category+identifier,
//! then address shape, then phone, with the street-line predicate as the
//! tie-breaker for card text.

use crate::store::Category;
use regex::Regex;
use std::sync::LazyLock;

/// "<Category> #<digits>", with an optional "Walmart " brand prefix.
/// Bare "Walmart #N" is the generic category.
static CATEGORY_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:Walmart\s+)?(Supercenter|Neighborhood Market|Sam's Club|Walmart)\s*#(\d+)")
        .unwrap()
});

/// "<number-led street>, <city>, <ST> <zip>" anywhere in free text.
static ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+[^,\n]+),\s*([^,\n]+),\s*([A-Z]{2})\s+(\d{5})").unwrap()
});

/// A whole line of the form "<city>, <ST> <zip>".
static CITY_STATE_ZIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^,]+),\s*([A-Z]{2})\s+(\d{5})$").unwrap());

/// Bare telephone number, with optional dot or dash separators.
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{3})[-.]?(\d{3})[-.]?(\d{4})\b").unwrap());

/// Road-suffix tokens that mark a street line even without a leading digit.
static STREET_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(St|Ave|Rd|Blvd|Dr|Hwy|Way|Ln|Ct|Pl)\b").unwrap());

/// A matched postal address, split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressParts {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl AddressParts {
    /// The canonical full form: "<street>, <city>, <ST> <zip>".
    pub fn full(&self) -> String {
        format!("{}, {}, {} {}", self.street, self.city, self.state, self.zip)
    }
}

/// Rule 1: category keyword anchored to a numeric identifier.
pub fn match_category_id(text: &str) -> Option<(Category, String)> {
    let captures = CATEGORY_ID.captures(text)?;
    let category = Category::from_text(&captures[1])?;
    Some((category, captures[2].to_string()))
}

/// Rule 2: address shape in free text, first match in document order.
pub fn match_address(text: &str) -> Option<AddressParts> {
    let captures = ADDRESS.captures(text)?;
    Some(AddressParts {
        street: captures[1].trim().to_string(),
        city: captures[2].trim().to_string(),
        state: captures[3].to_string(),
        zip: captures[4].to_string(),
    })
}

/// Rule 2b: a card line holding exactly "<city>, <ST> <zip>".
pub fn match_city_state_zip(line: &str) -> Option<(String, String, String)> {
    let captures = CITY_STATE_ZIP.captures(line.trim())?;
    Some((
        captures[1].trim().to_string(),
        captures[2].to_string(),
        captures[3].to_string(),
    ))
}

/// Rule 3: bare phone-number text, normalized.
pub fn match_phone(text: &str) -> Option<String> {
    let captures = PHONE.captures(text)?;
    Some(format!("{}-{}-{}", &captures[1], &captures[2], &captures[3]))
}

/// Normalizes a raw phone string (e.g. from a tel: link) to NNN-NNN-NNNN.
///
/// Accepts 10 digits, or 11 with a leading country 1. Anything else is not
/// a phone we trust.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let digits = match digits.len() {
        10 => digits,
        11 if digits.starts_with('1') => digits[1..].to_string(),
        _ => return None,
    };
    Some(format!("{}-{}-{}", &digits[0..3], &digits[3..6], &digits[6..10]))
}

/// The street-line predicate for card text.
///
/// Card boilerplate ("Walmart ...", "Check ...", "Call ...") is never a
/// street line; otherwise a leading digit or a road-suffix token qualifies.
pub fn looks_like_street_line(line: &str) -> bool {
    let line = line.trim();
    if line.is_empty()
        || line.contains("Walmart")
        || line.contains("Check")
        || line.contains("Call")
    {
        return false;
    }
    line.starts_with(|c: char| c.is_ascii_digit()) || STREET_SUFFIX.is_match(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_id_supercenter() {
        let (category, id) = match_category_id("Walmart Supercenter #1234").unwrap();
        assert_eq!(category, Category::Supercenter);
        assert_eq!(id, "1234");
    }

    #[test]
    fn category_id_neighborhood_market() {
        let (category, id) = match_category_id("Neighborhood Market #88").unwrap();
        assert_eq!(category, Category::NeighborhoodMarket);
        assert_eq!(id, "88");
    }

    #[test]
    fn category_id_club_store() {
        let (category, id) = match_category_id("Sam's Club #6543").unwrap();
        assert_eq!(category, Category::ClubStore);
        assert_eq!(id, "6543");
    }

    #[test]
    fn category_id_bare_brand_is_generic() {
        let (category, id) = match_category_id("Walmart #9001").unwrap();
        assert_eq!(category, Category::Generic);
        assert_eq!(id, "9001");
    }

    #[test]
    fn category_id_requires_identifier() {
        assert!(match_category_id("Walmart Supercenter").is_none());
        assert!(match_category_id("just some text").is_none());
    }

    #[test]
    fn address_shape() {
        let parts =
            match_address("Visit us at 100 Main St, Springfield, IL 62701 today").unwrap();
        assert_eq!(parts.street, "100 Main St");
        assert_eq!(parts.city, "Springfield");
        assert_eq!(parts.state, "IL");
        assert_eq!(parts.zip, "62701");
        assert_eq!(parts.full(), "100 Main St, Springfield, IL 62701");
    }

    #[test]
    fn address_prefers_first_match_in_document_order() {
        let text = "200 Oak Ave, Peoria, IL 61601 ... 100 Main St, Springfield, IL 62701";
        assert_eq!(match_address(text).unwrap().street, "200 Oak Ave");
    }

    #[test]
    fn address_requires_full_shape() {
        assert!(match_address("100 Main St, Springfield").is_none());
        assert!(match_address("Main St, Springfield, IL 62701").is_none());
    }

    #[test]
    fn city_state_zip_line() {
        let (city, state, zip) = match_city_state_zip("Springfield, IL 62701").unwrap();
        assert_eq!(city, "Springfield");
        assert_eq!(state, "IL");
        assert_eq!(zip, "62701");
    }

    #[test]
    fn city_state_zip_must_span_whole_line() {
        assert!(match_city_state_zip("at Springfield, IL 62701 corner").is_none());
    }

    #[test]
    fn phone_variants() {
        assert_eq!(match_phone("call 217-555-0100 now").as_deref(), Some("217-555-0100"));
        assert_eq!(match_phone("217.555.0100").as_deref(), Some("217-555-0100"));
        assert_eq!(match_phone("2175550100").as_deref(), Some("217-555-0100"));
        assert!(match_phone("no digits here").is_none());
    }

    #[test]
    fn phone_ignores_short_numbers() {
        assert!(match_phone("zip 62701 suite 410").is_none());
    }

    #[test]
    fn normalize_phone_forms() {
        assert_eq!(normalize_phone("2175550100").as_deref(), Some("217-555-0100"));
        assert_eq!(normalize_phone("+1 (217) 555-0100").as_deref(), Some("217-555-0100"));
        assert_eq!(normalize_phone("217-555-0100").as_deref(), Some("217-555-0100"));
        assert!(normalize_phone("555-0100").is_none());
    }

    #[test]
    fn street_line_predicate() {
        assert!(looks_like_street_line("100 Main St"));
        assert!(looks_like_street_line("Old Post Rd"));
        assert!(!looks_like_street_line("Walmart Supercenter #1234"));
        assert!(!looks_like_street_line("Check store hours"));
        assert!(!looks_like_street_line("Call for availability"));
        assert!(!looks_like_street_line("Open until 11pm"));
        assert!(!looks_like_street_line(""));
    }
}
