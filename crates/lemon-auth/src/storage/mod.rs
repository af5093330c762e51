//! Storage traits consumed by the auth core.
//!
//! The core never queries a database directly. It reads subjects, roles and
//! permissions through [`SubjectStore`], looks up login accounts through
//! [`AccountStore`], and writes audit records through [`OperationLogSink`].
//!
//! # Implementations
//!
//! - [`InMemoryStore`] - in-process store for tests and single-node demos
//! - `lemon-auth-postgres` - PostgreSQL storage backend

mod account;
mod memory;
mod operation_log;
mod subject;

pub use account::{Account, AccountStore};
pub use memory::InMemoryStore;
pub use operation_log::{OperationLog, OperationLogSink};
pub use subject::SubjectStore;
