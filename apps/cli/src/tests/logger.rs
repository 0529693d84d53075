use crate::logger::{LOG_FILE_NAME, initialize};

use tempfile::TempDir;

/// **VALUE**: Verifies calling initialize() twice is harmless.
///
/// **BUG THIS CATCHES**: Would catch the Once or AtomicBool guards being removed,
/// causing fern to fail when setting a global logger twice.
#[test]
fn given_logger_initialized_when_called_again_then_returns_ok() {
    // GIVEN
    let dir = TempDir::new().unwrap();

    // WHEN
    let first = initialize(dir.path(), false);
    let second = initialize(dir.path(), true);

    // THEN
    assert!(first.is_ok(), "First initialization should succeed");
    assert!(second.is_ok(), "Second initialization should be a no-op");
    assert!(dir.path().join(LOG_FILE_NAME).exists());
}
