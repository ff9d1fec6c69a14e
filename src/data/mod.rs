pub mod commit;
pub mod store;

pub use commit::{commit_reschedule, merge_refresh};
pub use store::{EntryStore, JsonStore, StoreError};
