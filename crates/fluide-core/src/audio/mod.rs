mod context;
mod tone;

pub use context::{AudioContext, ContextState};
pub use tone::{Cue, CueSamples, SAMPLE_RATE};

use crate::error::AudioError;

/// Something that can sound a [`Cue`].
pub trait ToneSink {
    /// Get output ready so the first cue has no startup delay.
    fn warm_up(&self) -> Result<(), AudioError>;

    fn play(&self, cue: &Cue) -> Result<(), AudioError>;
}

impl ToneSink for AudioContext {
    fn warm_up(&self) -> Result<(), AudioError> {
        self.resume_if_suspended()
    }

    fn play(&self, cue: &Cue) -> Result<(), AudioError> {
        AudioContext::play(self, cue)
    }
}

impl<T: ToneSink + ?Sized> ToneSink for &T {
    fn warm_up(&self) -> Result<(), AudioError> {
        (**self).warm_up()
    }

    fn play(&self, cue: &Cue) -> Result<(), AudioError> {
        (**self).play(cue)
    }
}

impl<T: ToneSink + ?Sized> ToneSink for std::rc::Rc<T> {
    fn warm_up(&self) -> Result<(), AudioError> {
        (**self).warm_up()
    }

    fn play(&self, cue: &Cue) -> Result<(), AudioError> {
        (**self).play(cue)
    }
}
