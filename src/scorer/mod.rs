pub mod overlap;
pub mod quality;
pub mod types;

pub use self::overlap::OverlapScorer;
pub use self::quality::{build_report, KeyQuality, LabelCounts, QualityReport};
pub use self::types::{KeyCoverage, LedCoverage, QualityLabel};
