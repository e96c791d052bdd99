pub mod matching;
pub mod reconcile;

pub use matching::{coverage_percent, exact_title_matches, find_scheduled, in_library};
pub use reconcile::{reconcile, ReconcileError, ReconcileOptions, Reconciler};
