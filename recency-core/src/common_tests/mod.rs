//! Test bodies shared by every guard implementation.
//!
//! Integration tests in `tests/` (and in downstream guard crates) call these
//! with a concrete guard type.
