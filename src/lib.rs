//! # photo-exif
//!
//! Safe photo metadata extraction. Turns caller-supplied image locators
//! (`app://` resource URLs, `file://` URLs, plain paths) into canonical local
//! paths, refuses anything that could escape the photo library before a single
//! byte is read, and decodes capture time, camera, exposure, GPS and dimensions
//! from what remains.
//!
//! ## Quick Start
//!
//! The simplest way to use the library is through [`pipeline::ExifService`],
//! which runs the full resolve → validate → probe → decode flow:
//!
//! ```rust,no_run
//! use photo_exif::config::Config;
//! use photo_exif::pipeline::{ExifService, collect_locators};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Load config from file (validation limits, path style, etc.)
//!     let config = Config::load(Some("config.json".as_ref()))?;
//!     let service = ExifService::from_config(&config);
//!
//!     // Directories are expanded; locators pass through as-is
//!     let locators = collect_locators(&[
//!         "./photos".to_string(),
//!         "app://8cf4920c/Users/a/Vault/0.jpeg?1759560592036".to_string(),
//!     ]);
//!
//!     for (locator, result) in locators.iter().zip(service.read_many(&locators).await) {
//!         match result {
//!             Ok(record) => println!("{locator}: {:?} {:?}", record.make, record.f_number),
//!             Err(e) => eprintln!("{locator}: no data ({})", e.code()),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Diagnostics
//!
//! When a read yields nothing, [`diagnose::DiagnosticEngine`] runs every stage
//! without stopping early and explains what went wrong:
//!
//! ```rust,no_run
//! use photo_exif::config::Config;
//! use photo_exif::diagnose::DiagnosticEngine;
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = DiagnosticEngine::from_config(&Config::default());
//!     let report = engine.diagnose("../../../etc/passwd").await;
//!     assert!(!report.is_in_sandbox);
//!     for line in &report.recommendations {
//!         println!("- {line}");
//!     }
//! }
//! ```
//!
//! ## Supported Formats
//!
//! | Format | Extensions |
//! |--------|------------|
//! | JPEG | `.jpg`, `.jpeg` |
//! | PNG | `.png` |
//! | WebP | `.webp` |
//! | TIFF | `.tif`, `.tiff` |
//!
//! ## Modules
//!
//! - [`path`]: Locator parsing, normalization, validation and format checks
//! - [`decoder`]: Metadata decoder trait, field allowlist, and the nom-exif backend
//! - [`probe`]: Existence probe through the decoder
//! - [`exif`]: Normalized metadata records
//! - [`pipeline`]: Resolver, read service, and locator collection
//! - [`diagnose`]: Diagnosis and path-debug reports
//! - [`config`]: Configuration types and loading/saving
//! - [`error`]: Typed read errors

pub mod config;
pub mod decoder;
pub mod diagnose;
pub mod error;
pub mod exif;
pub mod path;
pub mod pipeline;
pub mod probe;
