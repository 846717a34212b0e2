use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    /// Create the remote event.
    Insert,
    /// Send the local status to the remote event.
    Patch,
    /// Rewrite the local line from the remote event.
    Pull,
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffKind::Insert => write!(f, "+"),
            DiffKind::Patch => write!(f, "~"),
            DiffKind::Pull => write!(f, "<"),
        }
    }
}
