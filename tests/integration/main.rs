//! Integration tests for the landing crawler
//!
//! These tests drive the full pipeline with wiremock page servers and an
//! in-memory queue channel.

mod pipeline_tests;
