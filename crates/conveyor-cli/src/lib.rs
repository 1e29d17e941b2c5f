//! # `conveyor-cli`
//!
//! Command-line programs built on [`conveyor`]:
//!
//! - `conveyor-digest` walks one or more directory trees and prints the
//!   SHA-256 digest of every regular file, hashing files concurrently.
//! - `conveyor-chatter` streams tagged messages from producers to slow
//!   consumers so the fan-out/fan-in and shutdown behavior can be watched
//!   live.
//!
//! Both read their runner sizing from CLI flags or the environment (a `.env`
//! file is honored) and stop gracefully on Ctrl+C or SIGTERM.
//!
//! ## Module Overview
//!
//! - [`config`] - Shared runner flags and their validation.
//! - [`telemetry`] - `tracing-subscriber` setup.
//! - [`digest`] - Directory walking and hashing routines.
//! - [`chatter`] - Message demo routines.

pub mod chatter;
pub mod config;
pub mod digest;
pub mod telemetry;
