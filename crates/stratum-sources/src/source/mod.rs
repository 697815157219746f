//! The source contract shared by every origin.

mod decoder;
mod traits;

pub use decoder::{DecodeOutcome, Decoder};
pub use traits::Loader;
