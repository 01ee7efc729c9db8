//! OS trash integration

use std::path::Path;

use tracing::debug;

pub type RecycleError = Box<dyn std::error::Error + Send + Sync>;

/// Moves a path to the platform's trash or recycle bin.
///
/// There is deliberately no permanent-delete counterpart.
pub trait Recycler: Send + Sync {
    fn recycle(&self, path: &Path) -> Result<(), RecycleError>;
}

/// Recycler backed by the desktop trash (freedesktop Trash, macOS Trash,
/// Windows Recycle Bin).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRecycler;

impl Recycler for SystemRecycler {
    fn recycle(&self, path: &Path) -> Result<(), RecycleError> {
        debug!("trash <- {:?}", path);
        trash::delete(path)?;
        Ok(())
    }
}
