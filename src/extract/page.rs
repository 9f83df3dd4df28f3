//! Single-facility page extraction
//!
//! A facility's own page carries its heading, a full address somewhere in
//! the body text, and usually a tel: link. The completeness threshold here
//! is address + phone; a page missing either yields no record.

use crate::extract::patterns;
use crate::store::FacilityRecord;
use scraper::{Html, Selector};

/// Extracts a facility record from a single-facility page, or nothing when
/// the page does not meet the address + phone threshold.
pub fn extract_single(html: &str) -> Option<FacilityRecord> {
    let document = Html::parse_document(html);
    let body_text = collect_text(&document);

    let (category, id) = patterns::match_category_id(&body_text)?;
    let address = patterns::match_address(&body_text)?;
    let phone = extract_phone(&document, &body_text)?;

    let name = heading_text(&document)
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| format!("{} {}", address.city, category.label()));

    Some(FacilityRecord {
        id,
        name,
        category,
        address: address.full(),
        city: address.city,
        state: address.state,
        phone: Some(phone),
    })
}

/// Phone rule: a tel: link affordance first, bare text pattern second.
fn extract_phone(document: &Html, body_text: &str) -> Option<String> {
    if let Ok(selector) = Selector::parse(r#"a[href^="tel:"]"#) {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                let raw = href.trim_start_matches("tel:");
                if let Some(phone) = patterns::normalize_phone(raw) {
                    return Some(phone);
                }
            }
        }
    }
    patterns::match_phone(body_text)
}

fn heading_text(document: &Html) -> Option<String> {
    let selector = Selector::parse("h1, h2").ok()?;
    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
}

fn collect_text(document: &Html) -> String {
    document
        .root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
