use crate::context::STATE_DIR;
use crate::document::{CellSource, Document, Element, FormatVersion};
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};
use tempfile::TempDir;

static CWD_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub(crate) struct DirGuard {
    original: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl DirGuard {
    pub(crate) fn new(new_dir: &Path) -> Self {
        // The process working directory is global; hold the lock even if a #[serial] is missed.
        let lock = CWD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(new_dir).unwrap();
        Self {
            original,
            _lock: lock,
        }
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}

/// Temp workspace with `.cellsync/locks/` in place.
pub(crate) fn create_test_workspace() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    std::fs::create_dir_all(temp_dir.path().join(STATE_DIR).join("locks")).unwrap();
    temp_dir
}

/// Write a 4.4 notebook with no cell identifiers at `path`.
pub(crate) fn write_legacy_notebook(path: &Path) {
    let doc = Document::with_cells(
        FormatVersion::new(4, 4),
        vec![
            Element::markdown("# Revenue"),
            Element::code(CellSource::Fragments(vec![
                "total = sum(rows)\n".to_string(),
                "total".to_string(),
            ])),
        ],
    );
    doc.save(path).unwrap();
}
