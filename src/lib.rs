//! Download a whole playlist at one consistent quality.
//!
//! Videos in a playlist rarely expose the same encodings. This library
//! analyzes every video's formats, reconciles them into per-quality tables
//! of available containers, and turns one user choice into a fallback
//! selector that the external media tool can satisfy for each video.
//!
//! # Architecture
//!
//! The application is structured into several key components:
//! - `catalog`: Splits one video's formats into video and audio-only lists
//! - `reconcile`: Merges catalogs across a playlist into availability tables
//! - `selector`: Builds the fallback selector expression for a choice
//! - `Downloader`: Bounded, order-preserving parallel downloads
//! - `tool`: The `MediaTool` boundary and its `yt-dlp` implementation
//! - `prompt`: Bounded interactive selection
//! - `session`: The playlist and single-video flows
//!
//! # Example
//! ```no_run
//! use playlist_dl::{Config, Reconciler, YtDlp};
//! use std::sync::Arc;
//!
//! async fn example(urls: Vec<String>) {
//!     let config = Config::default();
//!     let tool = Arc::new(YtDlp::from_config(&config).await.unwrap());
//!     let reconciliation = Reconciler::new(tool, &config).reconcile(&urls).await;
//!     println!("{:?}", reconciliation.tables.video.offered_tiers());
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod downloader;
pub mod error;
pub mod model;
pub mod progress;
pub mod prompt;
pub mod reconcile;
pub mod selector;
pub mod session;
pub mod tool;
pub mod validation;

// Re-export commonly used items
pub use catalog::{build_catalog, Catalog};
pub use config::Config;
pub use downloader::{summarize, BatchSummary, DownloadOutcome, Downloader};
pub use error::AppError;
pub use model::{MediaKind, QualityTier, RawFormat, VideoMetadata};
pub use progress::DownloadProgress;
pub use prompt::Prompter;
pub use reconcile::{AvailabilityTable, AvailabilityTables, Reconciler, Reconciliation};
pub use selector::{build_selector, concrete_selector, FormatChoice, SelectorRequest};
pub use session::{process_playlist, process_video, SessionEnd};
pub use tool::{DownloadPlan, MediaTool, YtDlp};
