#![doc = include_str!("../README.md")]

mod buffer;
mod cancel;
mod config;
mod consumer;
mod context;
mod error;
mod logger;
mod producer;
mod runner;
pub mod signal;
mod task;


pub use crate::cancel::*;
pub use crate::config::*;
pub use crate::context::*;
pub use crate::error::*;
pub use crate::logger::*;
pub use crate::runner::*;
pub use crate::signal::Stoppable;
pub use crate::task::*;
