pub mod comparator;
pub mod engine;
pub mod fetcher;
pub mod refresher;
pub mod republisher;

pub use comparator::{classify, SnapshotDiff};
pub use engine::{CycleReport, ReconcileEngine, RepublishReport};
pub use fetcher::{video_url, FetchOutcome, FetchPlanner};
pub use refresher::{MetricsRefresher, RefreshOutcome};
pub use republisher::{RepublishOutcome, RepublishPlanner};
