//! The declared universe of regions
//!
//! The directory is organized by US state (plus DC). This table is the
//! authoritative, ordered universe the checkpoint ledger partitions into
//! completed / in-progress / pending sets. Codes are the lowercase path
//! segments the directory uses; records carry the uppercase form.

/// Region codes and human names, in declared (stable) order.
pub const REGIONS: &[(&str, &str)] = &[
    ("ak", "Alaska"),
    ("al", "Alabama"),
    ("ar", "Arkansas"),
    ("az", "Arizona"),
    ("ca", "California"),
    ("co", "Colorado"),
    ("ct", "Connecticut"),
    ("dc", "District of Columbia"),
    ("de", "Delaware"),
    ("fl", "Florida"),
    ("ga", "Georgia"),
    ("hi", "Hawaii"),
    ("ia", "Iowa"),
    ("id", "Idaho"),
    ("il", "Illinois"),
    ("in", "Indiana"),
    ("ks", "Kansas"),
    ("ky", "Kentucky"),
    ("la", "Louisiana"),
    ("ma", "Massachusetts"),
    ("md", "Maryland"),
    ("me", "Maine"),
    ("mi", "Michigan"),
    ("mn", "Minnesota"),
    ("mo", "Missouri"),
    ("ms", "Mississippi"),
    ("mt", "Montana"),
    ("nc", "North Carolina"),
    ("nd", "North Dakota"),
    ("ne", "Nebraska"),
    ("nh", "New Hampshire"),
    ("nj", "New Jersey"),
    ("nm", "New Mexico"),
    ("nv", "Nevada"),
    ("ny", "New York"),
    ("oh", "Ohio"),
    ("ok", "Oklahoma"),
    ("or", "Oregon"),
    ("pa", "Pennsylvania"),
    ("ri", "Rhode Island"),
    ("sc", "South Carolina"),
    ("sd", "South Dakota"),
    ("tn", "Tennessee"),
    ("tx", "Texas"),
    ("ut", "Utah"),
    ("va", "Virginia"),
    ("vt", "Vermont"),
    ("wa", "Washington"),
    ("wi", "Wisconsin"),
    ("wv", "West Virginia"),
    ("wy", "Wyoming"),
];

/// Returns the declared universe of region codes in stable order.
pub fn declared_universe() -> Vec<String> {
    REGIONS.iter().map(|(code, _)| (*code).to_string()).collect()
}

/// Looks up the human name for a region code (case-insensitive).
pub fn region_name(code: &str) -> Option<&'static str> {
    let code = code.to_ascii_lowercase();
    REGIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}
