//! Workspace-level test package. The tests live in `tests/`.
