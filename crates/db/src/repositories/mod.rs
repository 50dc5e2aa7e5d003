//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod machine_repo;
pub mod password_reset_repo;
pub mod run_repo;
pub mod session_repo;
pub mod stoppage_repo;
pub mod user_repo;

pub use machine_repo::MachineRepo;
pub use password_reset_repo::PasswordResetRepo;
pub use run_repo::RunRepo;
pub use session_repo::SessionRepo;
pub use stoppage_repo::StoppageRepo;
pub use user_repo::UserRepo;

/// Result of a delete that is refused while history rows reference the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    /// Nothing was deleted; this many runs and stoppages still point at the row.
    Referenced(i64),
}
