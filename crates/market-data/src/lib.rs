//! # Quantagrify Market Data
//!
//! Loading and saving of daily futures bars in CSV form, with a simple
//! data-quality score for each file that is read.

pub mod error;
pub mod loader;
pub mod quality;

pub use error::DataError;
pub use loader::{load_bars, read_bars, write_bars, write_bars_to, LoadedSeries};
pub use quality::DataQuality;
