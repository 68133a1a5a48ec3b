//! Unit tests for the machinery context.
