//! Domain logic of the timeline tracker: the filter, sort and pagination
//! engines behind the timeline table, the device-local identity used to gate
//! edit affordances, and the rules for claiming timelines and posting comments.
//!
//! Everything here is synchronous and free of network I/O. Storage and
//! transport live in `tracker-db`, `tracker-api` and `tracker-client`.

pub mod comments;
pub mod computed;
pub mod error;
pub mod filter;
pub mod format;
pub mod identity;
pub mod ownership;
pub mod redact;
pub mod sort;
pub mod storage;
pub mod view;

pub use error::TrackerError;
pub use filter::Filters;
pub use identity::{IdentityStore, LocalIdentity};
pub use sort::{Page, SortField, ROWS_PER_PAGE};
pub use storage::{DeviceStorage, FileStorage, MemoryStorage, StorageError, UnavailableStorage};
pub use view::ViewState;
