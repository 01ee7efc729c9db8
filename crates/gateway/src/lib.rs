//! Filesystem gateway
//!
//! The only component allowed to touch the filesystem. Every operation
//! validates its input through `tidybox-guard` before acting.

pub mod bulk;
pub mod drives;
pub mod gateway;
pub mod recycler;

pub use bulk::{BulkFailure, BulkReport, BulkSuccess};
pub use drives::{DriveInfo, DriveSource, SystemDrives};
pub use gateway::{sort_entries, DirEntry, Gateway};
pub use recycler::{RecycleError, Recycler, SystemRecycler};
