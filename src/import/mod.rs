//! CSV bootstrap import
//!
//! Seeds the record store from an out-of-band CSV export of the facility
//! network. Columns are resolved from the header row by substring match,
//! and only rows whose operation status is "Open" become records. The
//! export carries no phone numbers; those arrive later through the crawl
//! or the enrichment feed.

use crate::store::{Category, FacilityRecord};
use crate::{Result, StoremapError};
use csv::ReaderBuilder;
use std::path::Path;

/// Counts from one import pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
    /// Data rows read from the file
    pub rows: u64,

    /// Rows converted into facility records
    pub imported: u64,

    /// Rows dropped: not "Open", or missing an identifier
    pub skipped: u64,
}

struct Columns {
    number: usize,
    description: usize,
    address: usize,
    city: usize,
    state: usize,
    zip: usize,
    status: usize,
}

impl Columns {
    fn resolve(header: &csv::StringRecord, path: &Path) -> Result<Self> {
        let find = |needle: &str| {
            header
                .iter()
                .position(|h| h.contains(needle))
                .ok_or_else(|| StoremapError::InputFormat {
                    path: path.to_path_buf(),
                    message: format!("missing column matching '{}'", needle),
                })
        };
        Ok(Self {
            number: find("businessUnit_number")?,
            description: find("Description")?,
            address: find("Address")?,
            city: find("City")?,
            state: find("State")?,
            zip: find("Postal Code")?,
            status: find("Operation Status")?,
        })
    }
}

/// Reads the CSV export into facility records.
///
/// A parse failure or an unrecognizable header aborts before the caller
/// writes anything. Rows are tolerated individually: a row without an
/// identifier or without "Open" status is skipped and counted, never
/// imported with invented fields.
pub fn read_records(path: &Path) -> Result<(Vec<FacilityRecord>, ImportStats)> {
    let file = std::fs::File::open(path).map_err(|e| StoremapError::InputFormat {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let header = reader
        .headers()
        .map_err(|e| StoremapError::InputFormat {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .clone();
    let columns = Columns::resolve(&header, path)?;

    let mut stats = ImportStats::default();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row.map_err(|e| StoremapError::InputFormat {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        stats.rows += 1;

        let field = |i: usize| row.get(i).unwrap_or("").trim();
        let id = field(columns.number);
        if id.is_empty() || field(columns.status) != "Open" {
            stats.skipped += 1;
            continue;
        }

        let category = category_from_description(field(columns.description));
        let city = title_case(field(columns.city));
        let state = field(columns.state).to_string();

        records.push(FacilityRecord {
            id: id.to_string(),
            name: format!("{} {}", city, category.label()),
            category,
            address: format!(
                "{}, {}, {} {}",
                field(columns.address),
                city,
                state,
                field(columns.zip)
            ),
            city,
            state,
            phone: None,
        });
        stats.imported += 1;
    }

    Ok((records, stats))
}

/// The export describes facilities in prose ("Walmart Neighborhood Market",
/// "Sams Club Fuel Center"); an undescribed row defaults to Supercenter,
/// the network's dominant format.
fn category_from_description(description: &str) -> Category {
    if description.contains("Neighborhood") {
        Category::NeighborhoodMarket
    } else if description.contains("Sam") {
        Category::ClubStore
    } else {
        Category::Supercenter
    }
}

/// Export cities arrive upper-cased; records carry title case.
fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
