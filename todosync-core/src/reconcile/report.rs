use std::fmt;

/// Outcome of applying a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub inserted: usize,
    pub patched: usize,
    pub pulled: usize,
    /// Pulls whose local line had disappeared.
    pub not_found: usize,
    /// Failed patches captured for replay.
    pub queued: usize,
    pub errors: Vec<String>,
}

impl ReconcileReport {
    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inserted, {} patched, {} pulled",
            self.inserted, self.patched, self.pulled
        )?;
        if self.not_found > 0 {
            write!(f, ", {} missing locally", self.not_found)?;
        }
        if self.failed() > 0 {
            write!(f, ", {} failed", self.failed())?;
        }
        if self.queued > 0 {
            write!(f, " ({} queued for retry)", self.queued)?;
        }
        Ok(())
    }
}
