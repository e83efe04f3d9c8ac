//! Sidetone render loop.

use std::io;
use std::sync::Arc;
use std::thread;
use tracing::{error, info};

use crate::audio::envelope::EnvelopeState;
use crate::audio::sink::{AudioSink, SinkError};
use crate::audio::waveform::WaveformSet;
use crate::key::state::KeyState;

/// Renders the sidetone by feeding the audio sink one waveform buffer
/// at a time, tracking the shared key state through the envelope state
/// machine.
pub struct ToneEngine {
    waveforms: WaveformSet,
    state: EnvelopeState,
    key: Arc<KeyState>,
}

impl ToneEngine {
    pub fn new(waveforms: WaveformSet, key: Arc<KeyState>) -> Self {
        Self {
            waveforms,
            state: EnvelopeState::Silence,
            key,
        }
    }

    /// The buffer emitted last (the current envelope state).
    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    /// Render one buffer: sample the key state, advance the envelope,
    /// write the selected buffer in full. The blocking write is the
    /// loop's pacing.
    pub fn render_next(&mut self, sink: &mut dyn AudioSink) -> Result<(), SinkError> {
        self.state = self.state.advance(self.key.get());
        sink.write(self.waveforms.buffer(self.state))
    }

    /// Run until the sink fails. Never returns otherwise.
    pub fn run(mut self, mut sink: impl AudioSink) -> SinkError {
        loop {
            if let Err(err) = self.render_next(&mut sink) {
                return err;
            }
        }
    }

    /// Spawn the render loop on its own thread for the process lifetime.
    ///
    /// A sink failure is fatal: the sidetone cannot continue without its
    /// device, so the process exits non-zero.
    pub fn spawn(self, sink: impl AudioSink + 'static) -> io::Result<thread::JoinHandle<()>> {
        info!(
            "sidetone render loop starting: {} samples/buffer, {:.1} Hz",
            self.waveforms.len(),
            self.waveforms.rendered_hz()
        );
        thread::Builder::new()
            .name("sidetone-render".into())
            .spawn(move || {
                let err = self.run(sink);
                error!("sidetone render loop failed: {err}");
                std::process::exit(1);
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SAMPLE_RATE;

    /// Sink that records which buffer each write matched.
    struct RecordingSink {
        waveforms: WaveformSet,
        emitted: Vec<EnvelopeState>,
    }

    impl RecordingSink {
        fn new(waveforms: WaveformSet) -> Self {
            Self {
                waveforms,
                emitted: Vec::new(),
            }
        }

        fn classify(&self, samples: &[i16]) -> EnvelopeState {
            for state in [
                EnvelopeState::Silence,
                EnvelopeState::Attack,
                EnvelopeState::Sustain,
                EnvelopeState::Decay,
            ] {
                if self.waveforms.buffer(state) == samples {
                    return state;
                }
            }
            panic!("write did not match any precomputed buffer");
        }
    }

    impl AudioSink for RecordingSink {
        fn write(&mut self, samples: &[i16]) -> Result<(), SinkError> {
            let state = self.classify(samples);
            self.emitted.push(state);
            Ok(())
        }
    }

    /// Sink that fails on the nth write.
    struct FailingSink {
        writes_before_failure: usize,
    }

    impl AudioSink for FailingSink {
        fn write(&mut self, _samples: &[i16]) -> Result<(), SinkError> {
            if self.writes_before_failure == 0 {
                return Err(SinkError::Closed);
            }
            self.writes_before_failure -= 1;
            Ok(())
        }
    }

    fn engine() -> (ToneEngine, Arc<KeyState>, RecordingSink) {
        let key = Arc::new(KeyState::new());
        let waveforms = WaveformSet::new(800, SAMPLE_RATE);
        let sink = RecordingSink::new(waveforms.clone());
        (ToneEngine::new(waveforms, Arc::clone(&key)), key, sink)
    }

    #[test]
    fn idle_engine_emits_silence() {
        let (mut engine, _key, mut sink) = engine();
        for _ in 0..3 {
            engine.render_next(&mut sink).unwrap();
        }
        assert_eq!(
            sink.emitted,
            vec![
                EnvelopeState::Silence,
                EnvelopeState::Silence,
                EnvelopeState::Silence
            ]
        );
    }

    #[test]
    fn key_press_and_release_ramp() {
        let (mut engine, key, mut sink) = engine();
        engine.render_next(&mut sink).unwrap(); // silence
        key.set(true);
        engine.render_next(&mut sink).unwrap(); // attack
        engine.render_next(&mut sink).unwrap(); // sustain
        key.set(false);
        engine.render_next(&mut sink).unwrap(); // decay
        engine.render_next(&mut sink).unwrap(); // silence
        assert_eq!(
            sink.emitted,
            vec![
                EnvelopeState::Silence,
                EnvelopeState::Attack,
                EnvelopeState::Sustain,
                EnvelopeState::Decay,
                EnvelopeState::Silence,
            ]
        );
    }

    #[test]
    fn tap_shorter_than_one_buffer_still_ramps() {
        let (mut engine, key, mut sink) = engine();
        key.set(true);
        engine.render_next(&mut sink).unwrap(); // attack
        key.set(false);
        engine.render_next(&mut sink).unwrap(); // decay, not silence
        assert_eq!(
            sink.emitted,
            vec![EnvelopeState::Attack, EnvelopeState::Decay]
        );
        assert_eq!(engine.state(), EnvelopeState::Decay);
    }

    #[test]
    fn run_returns_the_sink_error() {
        let key = Arc::new(KeyState::new());
        let waveforms = WaveformSet::new(800, SAMPLE_RATE);
        let engine = ToneEngine::new(waveforms, key);
        let err = engine.run(FailingSink {
            writes_before_failure: 5,
        });
        assert!(matches!(err, SinkError::Closed));
    }
}
