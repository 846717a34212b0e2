//! Bidirectional reconciliation between the vault and the calendar.

mod diff_kind;
mod plan;
mod reconciler;
mod report;
mod todo_diff;

pub use diff_kind::DiffKind;
pub use plan::{ReconcilePlan, StatusAuthority};
pub use reconciler::{ReconcileOptions, Reconciler};
pub use report::ReconcileReport;
pub use todo_diff::TodoDiff;
