//! Controller scenario tests
