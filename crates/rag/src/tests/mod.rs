//! Cross-module pipeline tests.
