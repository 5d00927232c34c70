//! Text extraction pipeline stages

pub mod classifier;
pub mod coordinates;
pub mod manual;
pub mod normalizer;
pub mod sentinel;

pub use classifier::{Classification, RecordClassifier};
pub use coordinates::{format_dmm, parse_coordinates, Axis, CoordinateParser, Coordinates};
pub use manual::{is_manual_command, parse_manual_command, ManualEntry};
pub use normalizer::TextNormalizer;
pub use sentinel::{truncate_at_sentinel, SentinelTruncator};
