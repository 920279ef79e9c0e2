#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::doc_markdown,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::uninlined_format_args
)]

pub mod assistant;
pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod export;
pub mod providers;
pub mod security;
pub mod session;
pub mod updates;

pub use config::Config;
