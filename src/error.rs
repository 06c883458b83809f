use thiserror::Error;

use crate::memory::TypeAddr;

/// Faults raised by the interpreter core. Every one of them except
/// `ImageTooLarge` halts the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Chip8Error {
    #[error("program image of {size} bytes does not fit in {capacity} bytes of program memory")]
    ImageTooLarge { size: usize, capacity: usize },
    #[error("unknown instruction {opcode:#06x}")]
    DecodeError { opcode: u16 },
    #[error("return with an empty call stack")]
    StackUnderflow,
    #[error("call to {target:#05x} overflows the call stack")]
    StackOverflow { target: TypeAddr },
}

/// Failures of the shell around the core: files, window and audio.
#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("unable to read program image: {0}")]
    Io(#[from] std::io::Error),
    #[error("window error: {0}")]
    Window(#[from] minifb::Error),
    #[error("no audio output device available")]
    NoAudioDevice,
    #[error("unable to query audio config: {0}")]
    AudioConfig(#[from] cpal::DefaultStreamConfigError),
    #[error("unable to build audio stream: {0}")]
    AudioStream(#[from] cpal::BuildStreamError),
    #[error("unable to start audio stream: {0}")]
    AudioPlay(#[from] cpal::PlayStreamError),
    #[error("unable to pause audio stream: {0}")]
    AudioPause(#[from] cpal::PauseStreamError),
    #[error("unsupported sample format '{0}'")]
    UnsupportedSampleFormat(cpal::SampleFormat),
    #[error("unable to initialise logging: {0}")]
    Logger(#[from] log::SetLoggerError),
    #[error(transparent)]
    Core(#[from] Chip8Error),
}
