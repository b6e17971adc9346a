//! Audio output trait and error types.

/// Error type for audio operations.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("no audio output device available")]
    NoDevice,
    #[error("device init error: {0}")]
    DeviceInit(String),
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),
    #[error("stream create error: {0}")]
    StreamCreate(String),
    #[error("playback error: {0}")]
    Playback(String),
}

/// A device that pulls audio from the engine on its own thread.
pub trait AudioOutput {
    fn sample_rate(&self) -> u32;

    /// Start (or resume) the device stream.
    fn start(&mut self) -> Result<(), AudioError>;

    /// Pause the device stream. The engine keeps its state.
    fn stop(&mut self) -> Result<(), AudioError>;
}
