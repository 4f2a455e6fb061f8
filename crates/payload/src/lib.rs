//! `routerecon-payload`: update payloads from JSON templates.
//!
//! Expands `{row.<Column>}` and `{func.next_id}` placeholders against
//! selected rows, drawing IDs from a session-scoped allocator split into a
//! VQ partition and an "other" partition. No IO.

pub mod allocator;
pub mod error;
pub mod resolve;
pub mod row;
pub mod session;
pub mod template;

pub use allocator::{IdAllocator, IdSeed, Partition, ID_FLOOR};
pub use error::{PlaceholderIssue, ResolutionErrorKind, TemplateError, TemplateResolutionError};
pub use resolve::{resolve, resolve_batch, select_rows, PayloadBatch, Resolved};
pub use row::{RowData, STATUS_COLUMN};
pub use session::Session;
pub use template::{Placeholder, Template};
