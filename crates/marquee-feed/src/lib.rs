pub mod delimited;
pub mod errors;
pub mod model;
pub mod normalize;

pub use delimited::parse_document;
pub use errors::FeedParseError;
pub use model::{NormalizedRow, NormalizedSheet, SlotEntry, TimeRange};
pub use normalize::{find_header_row, normalize_document, parse_feed_date, parse_slot_cell};

#[cfg(test)]
mod tests;
