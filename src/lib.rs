//! # Pitch Tracking
//! *pitch_tracking* turns short windows of microphone samples into a stable
//! musical note estimate for ear-training exercises. It handles noise
//! rejection, octave and harmonic ambiguity, sub-sample refinement and
//! temporal debouncing, cheaply enough to run many times per second.
//!
//! # Pipeline
//! A [LagDetector][detector::lag::LagDetector] estimates the pitch of a single
//! buffer:
//!
//!   * [Voicing gate][detector::voicing]: quiet buffers are skipped.
//!   * [Lag correlator][detector::correlator]: squared-difference curve and its minima.
//!   * [Harmonic disambiguator][detector::harmonic]: picks the fundamental among the minima.
//!   * [Sub-sample refiner][detector::refine]: parabolic interpolation of the chosen lag.
//!
//! Raw estimates flicker. A [StabilityFilter][stability::StabilityFilter]
//! holds them in a short time window and only reports a
//! [note][note::Note] once they agree. [PitchTracker][tracker::PitchTracker]
//! wires the two together.
//!
//! # Examples
//! ```
//! use pitch_tracking::detector::lag::LagDetector;
//! use pitch_tracking::detector::{PitchDetector, SampleBuffer};
//! use pitch_tracking::note::Note;
//!
//! fn main() {
//!     const SAMPLE_RATE: u32 = 48000;
//!     const SIZE: usize = 4096;
//!
//!     // Signal coming from some source (microphone, generated, etc...)
//!     let dt = 1.0 / SAMPLE_RATE as f64;
//!     let freq = 440.0;
//!     let signal: Vec<f64> = (0..SIZE)
//!         .map(|x| 0.5 * (2.0 * std::f64::consts::PI * x as f64 * dt * freq).sin())
//!         .collect();
//!
//!     let mut detector = LagDetector::new(SAMPLE_RATE, SIZE).unwrap();
//!     let buffer = SampleBuffer::new(&signal, SAMPLE_RATE).unwrap();
//!
//!     let estimate = detector.detect(&buffer);
//!     let frequency = estimate.frequency_hz().unwrap();
//!     let note = Note::from_frequency(frequency).unwrap();
//!
//!     println!("Frequency: {}, Note: {}, Cents: {}", frequency, note, note.cents_offset());
//!     assert_eq!(note.to_string(), "A4");
//! }
//! ```

pub use config::{DetectorConfig, Sensitivity, StabilityConfig};
pub use error::PitchError;
pub use tracker::{PitchTracker, SampleSource, TrackerUpdate};

pub mod config;
pub mod detector;
pub mod error;
pub mod float;
pub mod note;
pub mod stability;
pub mod tracker;
pub mod utils;
