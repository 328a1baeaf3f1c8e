//! Two small image utilities behind one CLI:
//!
//! - [`Fetcher`] downloads placeholder images from an HTTP endpoint into numbered files.
//! - [`Stitcher`] pastes a folder of images top to bottom into one canvas, saving it at every
//!   batch boundary. [`calculate_batch_size`] picks the batch from available memory.
#![forbid(unsafe_code)]

mod foundation;

pub mod batch;
pub mod config;
pub mod fetch;
pub mod memory;
pub mod prompt;
pub mod source;
pub mod stitch;

pub use batch::{SizeEstimate, calculate_batch_size, estimate_batch_size, estimate_output_size};
pub use config::{Config, FetchConfig, StitchConfig};
pub use fetch::{FetchReport, FetchedBody, Fetcher, HttpSource, ImageSource, image_file_name};
pub use foundation::error::{StitchkitError, StitchkitResult};
pub use memory::{FixedMemory, MemoryProbe, SystemMemory};
pub use prompt::{BatchChoice, Prompter};
pub use source::{list_images, require_images};
pub use stitch::{CanvasSink, FileSink, StitchReport, Stitcher, stitch_images};
