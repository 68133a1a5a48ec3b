//! Unit tests for the work-order context.

mod repository_tests;
mod support;
