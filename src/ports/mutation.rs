//! Atomic read-validate-write contract shared by the ledger repositories.
//!
//! A repository's `modify` call:
//!
//! 1. opens a transaction and sets the tenant context for row-level security
//! 2. loads the entity scoped to the tenant with a row lock
//!    (`SELECT ... FOR UPDATE`), failing `NotFound` when absent
//! 3. runs the caller's closure against the locked entity
//! 4. if the closure returned an audited [`Mutation`], writes the entity, the
//!    child row and the audit entry, then commits
//!
//! A closure error rolls everything back and leaves the entity untouched.
//! No await point separates the check from the write while the lock is held
//! by another caller.

use crate::domain::audit::AuditEntry;

/// What a mutation closure asks the repository to persist.
#[derive(Debug, Clone)]
pub struct Mutation<C> {
    /// Entity-specific output, e.g. the ledger row to append.
    pub child: C,
    /// `None` means the entity did not change and nothing is written.
    pub audit: Option<AuditEntry>,
}

impl<C> Mutation<C> {
    pub fn audited(child: C, audit: AuditEntry) -> Self {
        Self {
            child,
            audit: Some(audit),
        }
    }

    /// No-op result: the transaction commits without writing.
    pub fn unchanged(child: C) -> Self {
        Self { child, audit: None }
    }
}

/// Entity state after a committed `modify`, plus the closure's output.
#[derive(Debug, Clone)]
pub struct Mutated<T, C> {
    pub entity: T,
    pub child: C,
    /// True when the repository wrote the entity.
    pub written: bool,
}

/// Borrowed mutation closure.
pub type MutateFn<'a, T, C, E> = dyn Fn(&mut T) -> Result<Mutation<C>, E> + Send + Sync + 'a;
