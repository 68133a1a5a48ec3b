//! Unit tests for settings loading and validation.
