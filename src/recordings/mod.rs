//! Recording metadata sync and trash handling.

pub mod media;
pub mod reaper;
pub mod sync;

pub use media::{LocalMediaStore, MediaStore};
pub use reaper::{remove_deleted_recordings, remove_deleted_recordings_at};
pub use sync::{RecordingSynchronizer, SyncReport};
