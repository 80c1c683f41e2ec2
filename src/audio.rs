pub mod media;
pub mod mix;

pub use media::{AudioPcm, MIX_CHANNELS, MIX_SAMPLE_RATE};
