//! Listing-page extraction
//!
//! A locality page carries one card per facility, each anchored by a link
//! to the facility's own page. The card's text lines are classified with
//! the rules in [`patterns`](crate::extract::patterns); a candidate is
//! accepted only when identifier, phone and city are all present.

use crate::extract::patterns;
use crate::store::{Category, FacilityRecord};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

static STORE_HREF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/store/(\d+)").unwrap());

/// Extracts all facility candidates from a locality listing page.
///
/// Re-invocation recomputes from scratch; the result is deterministic for
/// a given input. Within one page the first card for an identifier wins.
pub fn extract_listings(html: &str) -> Vec<FacilityRecord> {
    let document = Html::parse_document(html);

    let anchor_selector = match Selector::parse(r#"a[href^="/store/"]"#) {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    // Scope to <main> when present; directory chrome outside it also links
    // to facility pages.
    let main_selector = Selector::parse("main").ok();
    let root = main_selector
        .as_ref()
        .and_then(|s| document.select(s).next());

    let anchors: Vec<ElementRef> = match root {
        Some(main) => main.select(&anchor_selector).collect(),
        None => document.select(&anchor_selector).collect(),
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut records = Vec::new();

    for anchor in anchors {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(id) = STORE_HREF
            .captures(href)
            .map(|captures| captures[1].to_string())
        else {
            continue;
        };
        if seen.contains(&id) {
            continue;
        }

        let Some(card) = anchor.parent().and_then(ElementRef::wrap) else {
            continue;
        };

        if let Some(record) = extract_card(&anchor, &card, &id) {
            seen.insert(id);
            records.push(record);
        }
    }

    records
}

/// All facility identifiers linked from a listing page, deduplicated in
/// document order, whether or not their card meets the listing threshold.
/// The engine visits the facility's own page for identifiers that
/// [`extract_listings`] could not produce a record for.
pub fn facility_ids(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(anchor_selector) = Selector::parse(r#"a[href^="/store/"]"#) else {
        return Vec::new();
    };

    let main_selector = Selector::parse("main").ok();
    let root = main_selector
        .as_ref()
        .and_then(|s| document.select(s).next());
    let anchors: Vec<ElementRef> = match root {
        Some(main) => main.select(&anchor_selector).collect(),
        None => document.select(&anchor_selector).collect(),
    };

    let mut ids = Vec::new();
    for anchor in anchors {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(captures) = STORE_HREF.captures(href) else {
            continue;
        };
        let id = captures[1].to_string();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

/// Classifies one card's text lines into street / city-state-zip / phone.
fn extract_card(anchor: &ElementRef, card: &ElementRef, id: &str) -> Option<FacilityRecord> {
    let link_text: String = anchor.text().collect();
    let card_text: String = card.text().collect::<Vec<_>>().join("\n");

    let category = Category::from_text(&link_text)
        .or_else(|| Category::from_text(&card_text))
        .unwrap_or(Category::Generic);

    let mut street = String::new();
    let mut city = String::new();
    let mut state = String::new();
    let mut zip = String::new();
    let mut phone: Option<String> = None;

    for line in card_text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(p) = patterns::match_phone(line) {
            phone = Some(p);
            continue;
        }
        if let Some((c, s, z)) = patterns::match_city_state_zip(line) {
            city = c;
            state = s;
            zip = z;
            continue;
        }
        // Last matching street line wins: cards place phone and
        // city/state/zip after the street line in source order.
        if patterns::looks_like_street_line(line) {
            street = line.to_string();
        }
    }

    // Listing-page completeness threshold: identifier + phone + city.
    let phone = phone?;
    if city.is_empty() {
        return None;
    }

    let address = if street.is_empty() {
        format!("{}, {} {}", city, state, zip)
    } else {
        format!("{}, {}, {} {}", street, city, state, zip)
    };

    Some(FacilityRecord {
        id: id.to_string(),
        name: format!("{} {}", city, category.label()),
        category,
        address,
        city,
        state,
        phone: Some(phone),
    })
}
