//! bdstream - Blu-ray navigation and streaming front-end
//!
//! This library crate exposes the pieces of the CLI worth testing directly.

pub mod report;
