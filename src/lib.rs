pub mod catalog;
pub mod db;
pub mod history;
pub mod maintenance;
pub mod selection;
pub mod variety;

pub use catalog::{GenreWord, Role, SUPPORTED_MAX_AGE, SUPPORTED_MIN_AGE};
pub use history::{DEFAULT_KEEP, HistoryEntry, RECENT_WINDOW};
pub use maintenance::PruneSummary;
pub use selection::Selection;
pub use variety::{CombinationCount, VarietyStats};
