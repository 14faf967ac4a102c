pub mod encoder;
pub mod messages;

pub use encoder::{EncoderHandle, EncoderService, FrameAccumulator};
pub use messages::{EncoderCommand, Finished};
