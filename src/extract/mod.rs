//! Best-effort extraction of facility records from fetched page content
//!
//! Extraction is layered pattern matching over real-world markup variance:
//! an explicit, ordered set of rules (see [`patterns`]) applied per card or
//! per page. Anything short of the calling context's completeness threshold
//! yields no record; partial data is never stored with invented defaults.

mod listing;
mod page;
pub mod patterns;

pub use listing::{extract_listings, facility_ids};
pub use page::extract_single;
