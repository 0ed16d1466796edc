//! The process-wide sound context.
//!
//! Created lazily on first use and kept for the rest of the process; it is
//! never torn down. Output may be suspended (device lost, nothing played for
//! a while) and is resumed before every playback.

use std::sync::{Mutex, OnceLock};

use super::tone::Cue;
use crate::error::AudioError;

static SHARED: OnceLock<AudioContext> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Suspended,
    Running,
}

pub struct AudioContext {
    state: Mutex<ContextState>,
    backend: backend::Backend,
}

impl AudioContext {
    /// The one context of this process.
    pub fn shared() -> &'static AudioContext {
        SHARED.get_or_init(|| {
            tracing::debug!("creating audio context");
            AudioContext {
                state: Mutex::new(ContextState::Suspended),
                backend: backend::Backend::new(),
            }
        })
    }

    pub fn state(&self) -> ContextState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(ContextState::Suspended)
    }

    /// Bring output up if it is not running yet.
    pub fn resume_if_suspended(&self) -> Result<(), AudioError> {
        let mut state = self.state.lock().map_err(|_| AudioError::Disconnected)?;
        if *state == ContextState::Suspended {
            self.backend.resume()?;
            *state = ContextState::Running;
            tracing::debug!("audio context resumed");
        }
        Ok(())
    }

    /// Mark output as suspended; the next playback resumes it.
    pub fn suspend(&self) {
        if let Ok(mut state) = self.state.lock() {
            if *state == ContextState::Running {
                self.backend.suspend();
                *state = ContextState::Suspended;
            }
        }
    }

    pub fn play(&self, cue: &Cue) -> Result<(), AudioError> {
        self.resume_if_suspended()?;
        self.backend.play(cue)
    }
}

#[cfg(feature = "sound")]
mod backend {
    use std::sync::mpsc::{self, Sender};
    use std::sync::Mutex;
    use std::thread;

    use rodio::{OutputStream, Sink};

    use super::Cue;
    use crate::error::AudioError;

    enum AudioCommand {
        Resume(Sender<Result<(), String>>),
        Suspend,
        Play(Cue),
    }

    /// rodio output on a dedicated thread, since the stream is not `Send`.
    pub struct Backend {
        tx: Mutex<Option<Sender<AudioCommand>>>,
    }

    impl Backend {
        pub fn new() -> Self {
            Self {
                tx: Mutex::new(None),
            }
        }

        fn ensure_thread(&self) -> Result<Sender<AudioCommand>, AudioError> {
            let mut guard = self.tx.lock().map_err(|_| AudioError::Disconnected)?;
            if let Some(tx) = guard.as_ref() {
                return Ok(tx.clone());
            }

            let (tx, rx) = mpsc::channel::<AudioCommand>();
            thread::Builder::new()
                .name("audio-context".to_string())
                .spawn(move || {
                    let mut _stream: Option<OutputStream> = None;
                    let mut sink: Option<Sink> = None;

                    fn ensure_sink(
                        stream: &mut Option<OutputStream>,
                        sink: &mut Option<Sink>,
                    ) -> Result<(), String> {
                        if sink.is_none() {
                            let (s, handle) = OutputStream::try_default()
                                .map_err(|e| format!("Failed to create audio output stream: {e}"))?;
                            let new_sink = Sink::try_new(&handle)
                                .map_err(|e| format!("Failed to create audio sink: {e}"))?;
                            *stream = Some(s);
                            *sink = Some(new_sink);
                        }
                        Ok(())
                    }

                    while let Ok(cmd) = rx.recv() {
                        match cmd {
                            AudioCommand::Resume(reply) => {
                                let result = ensure_sink(&mut _stream, &mut sink);
                                if let Some(ref s) = sink {
                                    s.play();
                                }
                                let _ = reply.send(result);
                            }
                            AudioCommand::Suspend => {
                                if let Some(ref s) = sink {
                                    s.pause();
                                }
                            }
                            AudioCommand::Play(cue) => {
                                if let Some(ref s) = sink {
                                    s.append(cue.samples());
                                }
                            }
                        }
                    }
                })
                .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?;

            *guard = Some(tx.clone());
            Ok(tx)
        }

        pub fn resume(&self) -> Result<(), AudioError> {
            let tx = self.ensure_thread()?;
            let (reply_tx, reply_rx) = mpsc::channel();
            tx.send(AudioCommand::Resume(reply_tx))
                .map_err(|_| AudioError::Disconnected)?;
            reply_rx
                .recv()
                .map_err(|_| AudioError::Disconnected)?
                .map_err(AudioError::DeviceUnavailable)
        }

        pub fn suspend(&self) {
            if let Ok(Some(tx)) = self.tx.lock().map(|g| g.clone()) {
                let _ = tx.send(AudioCommand::Suspend);
            }
        }

        pub fn play(&self, cue: &Cue) -> Result<(), AudioError> {
            let tx = self.ensure_thread()?;
            tx.send(AudioCommand::Play(*cue))
                .map_err(|_| AudioError::Disconnected)
        }
    }
}

#[cfg(not(feature = "sound"))]
mod backend {
    use std::io::Write;

    use super::Cue;
    use crate::error::AudioError;

    /// Terminal bell fallback when built without audio output.
    pub struct Backend;

    impl Backend {
        pub fn new() -> Self {
            Backend
        }

        pub fn resume(&self) -> Result<(), AudioError> {
            Ok(())
        }

        pub fn suspend(&self) {}

        pub fn play(&self, _cue: &Cue) -> Result<(), AudioError> {
            let mut err = std::io::stderr();
            err.write_all(b"\x07")
                .and_then(|_| err.flush())
                .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))
        }
    }
}
