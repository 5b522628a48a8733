//! Engine fixtures over temporary directories.

use common::EngineConfig;
use engine::Engine;
use tempfile::TempDir;

/// Open a fresh engine on a temporary directory with default settings.
/// Keep the returned `TempDir` alive for the duration of the test.
pub fn temp_engine() -> (Engine, TempDir) {
    temp_engine_with(EngineConfig::default())
}

/// Open a fresh engine with explicit settings.
pub fn temp_engine_with(config: EngineConfig) -> (Engine, TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let engine = Engine::open(dir.path().join("kite.db"), config).expect("open engine");
    (engine, dir)
}
