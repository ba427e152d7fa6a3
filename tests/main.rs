use std::path::PathBuf;

use pitch_tracking::config::{CorrelationMethod, DetectorConfig, StabilityConfig};
use pitch_tracking::detector::lag::LagDetector;
use pitch_tracking::detector::{
    Detection, FrequencyRange, NoPitch, PitchDetector, PitchEstimate, SampleBuffer,
};
use pitch_tracking::float::Float;
use pitch_tracking::note::{Note, NoteName};
use pitch_tracking::stability::FilterState;
use pitch_tracking::tracker::{PitchTracker, SampleSource};
use pitch_tracking::utils::buffer::new_real_buffer;

const SAMPLE_RATE: u32 = 48000;
const SIZE: usize = 4096;

#[derive(Debug)]
struct Signal<T> {
    sample_rate: u32,
    data: Vec<T>,
}

impl<T: Float> Signal<T> {
    /// The `SIZE` samples starting at `start`, zero padded past the end.
    fn chunk(&self, start: usize) -> Vec<T> {
        let mut output = new_real_buffer(SIZE);
        let start = start.min(self.data.len());
        let stop = (start + SIZE).min(self.data.len());
        output[..stop - start].copy_from_slice(&self.data[start..stop]);
        output
    }
}

/// Replays a recorded signal one tick at a time.
struct Playback<'a, T> {
    signal: &'a Signal<T>,
    chunk: Vec<T>,
}

impl<'a, T: Float> Playback<'a, T> {
    fn new(signal: &'a Signal<T>) -> Self {
        Playback {
            signal,
            chunk: new_real_buffer(SIZE),
        }
    }

    fn seek(&mut self, start: usize) {
        self.chunk = self.signal.chunk(start);
    }
}

impl<'a, T: Float> SampleSource<T> for Playback<'a, T> {
    fn sample_rate_hz(&self) -> u32 {
        self.signal.sample_rate
    }

    fn buffer(&self) -> &[T] {
        &self.chunk
    }
}

#[test]
fn sine_sweep_over_vocal_range() {
    let mut detector = LagDetector::<f64>::new(SAMPLE_RATE, SIZE).unwrap();
    for freq in sweep(80.0, 1200.0, 3.7) {
        let signal = sin_wave::<f64>(freq, 0.5, SIZE, SAMPLE_RATE);
        assert_within(detect(&mut detector, &signal), freq, 0.01);
    }
}

#[test]
fn sine_sweep_over_full_range() {
    let mut detector = LagDetector::<f64>::new(SAMPLE_RATE, SIZE).unwrap();
    for freq in sweep(50.0, 2000.0, 13.1).chain(vec![2000.0]) {
        let signal = sin_wave::<f64>(freq, 0.5, SIZE, SAMPLE_RATE);
        assert_within(detect(&mut detector, &signal), freq, 0.01);
    }
}

#[test]
fn sine_sweep_f32() {
    let mut detector = LagDetector::<f32>::new(SAMPLE_RATE, SIZE).unwrap();
    for &freq in [110.0, 247.0, 392.0, 784.0].iter() {
        let signal = sin_wave::<f32>(freq, 0.3, SIZE, SAMPLE_RATE);
        let estimate = detect(&mut detector, &signal);
        let frequency = estimate.frequency_hz().unwrap() as f64;
        assert!((frequency - freq).abs() < freq * 0.01, "{} vs {}", frequency, freq);
    }
}

#[test]
fn fft_sine_sweep() {
    let config = DetectorConfig {
        method: CorrelationMethod::Fft,
        ..DetectorConfig::default()
    };
    let mut detector = LagDetector::<f64>::with_config(&config, SAMPLE_RATE, SIZE).unwrap();
    for freq in sweep(80.0, 1200.0, 11.3) {
        let signal = sin_wave::<f64>(freq, 0.5, SIZE, SAMPLE_RATE);
        assert_within(detect(&mut detector, &signal), freq, 0.01);
    }
}

#[test]
fn square_signal() {
    let mut detector = LagDetector::<f64>::new(SAMPLE_RATE, SIZE).unwrap();
    let signal = square_wave::<f64>(220.0, 0.4, SIZE, SAMPLE_RATE);
    assert_within(detect(&mut detector, &signal), 220.0, 0.01);
}

#[test]
fn triangle_signal() {
    let mut detector = LagDetector::<f64>::new(SAMPLE_RATE, SIZE).unwrap();
    let signal = triangle_wave::<f64>(330.0, 0.4, SIZE, SAMPLE_RATE);
    assert_within(detect(&mut detector, &signal), 330.0, 0.01);
}

#[test]
fn dominant_octave_keeps_the_fundamental() {
    let mut detector = LagDetector::<f64>::new(SAMPLE_RATE, SIZE).unwrap();
    for &freq in [82.4, 110.0, 147.0, 200.0, 261.6, 349.2, 440.0, 523.3, 600.0].iter() {
        let fundamental = sin_wave::<f64>(freq, 0.1, SIZE, SAMPLE_RATE);
        let octave = sin_wave::<f64>(2.0 * freq, 0.2, SIZE, SAMPLE_RATE);
        let signal: Vec<f64> = fundamental
            .iter()
            .zip(octave.iter())
            .map(|(a, b)| a + b)
            .collect();

        assert_within(detect(&mut detector, &signal), freq, 0.01);
    }
}

#[test]
fn noisy_voice_keeps_its_octave() {
    let mut detector = LagDetector::<f64>::new(SAMPLE_RATE, SIZE).unwrap();
    let frequencies = [
        98.0, 146.8, 196.0, 233.3, 293.7, 350.1, 393.9, 423.1, 430.4, 459.6, 587.3, 784.0,
    ];
    for (seed, &freq) in frequencies.iter().enumerate() {
        let tone = sin_wave::<f64>(freq, 0.3, SIZE, SAMPLE_RATE);
        let hiss = noise::<f64>(0.15, SIZE, seed as u64 + 1);
        let signal: Vec<f64> = tone.iter().zip(hiss.iter()).map(|(a, b)| a + b).collect();

        assert_within(detect(&mut detector, &signal), freq, 0.03);
    }
}

#[test]
fn silence_is_not_detected() {
    let mut detector = LagDetector::<f64>::new(SAMPLE_RATE, SIZE).unwrap();
    let estimate = detect(&mut detector, &vec![0.0; SIZE]);
    assert_eq!(estimate.detection, Detection::NotDetected(NoPitch::NoSignal));
    assert_eq!(estimate.rms, 0.0);
    assert!(estimate.candidates.is_empty());
}

#[test]
fn low_noise_is_not_detected() {
    let mut detector = LagDetector::<f64>::new(SAMPLE_RATE, SIZE).unwrap();
    let estimate = detect(&mut detector, &noise::<f64>(0.001, SIZE, 7));
    assert_eq!(estimate.frequency_hz(), None);
    assert!(estimate.rms > 0.0 && estimate.rms < 0.003);
}

#[test]
fn range_edges_are_detected() {
    let mut detector = LagDetector::<f64>::new(SAMPLE_RATE, SIZE).unwrap();
    for &freq in [50.0, 52.5, 1950.0, 1990.0, 2000.0].iter() {
        let signal = sin_wave::<f64>(freq, 0.5, SIZE, SAMPLE_RATE);
        let estimate = detect(&mut detector, &signal);
        assert!(detector.frequency_range().contains(estimate.frequency_hz().unwrap()));
        assert_within(estimate, freq, 0.01);
    }
}

#[test]
fn supported_range_is_inclusive() {
    let config = DetectorConfig::default();
    let detector = LagDetector::<f64>::with_config(&config, SAMPLE_RATE, SIZE).unwrap();
    let range: FrequencyRange<f64> = detector.frequency_range();
    assert!(range.contains(50.0));
    assert!(range.contains(2000.0));
    assert!(!range.contains(49.9));
    assert!(!range.contains(2000.1));
}

#[test]
fn note_mapping() {
    let a4 = Note::from_frequency(440.0f64).unwrap();
    assert_eq!((a4.name(), a4.octave(), a4.cents_offset()), (NoteName::A, 4, 0));

    let a_sharp = Note::from_frequency(466.16f64).unwrap();
    assert_eq!(a_sharp.to_string(), "A#4");
    assert!(a_sharp.cents_offset().abs() <= 2);
}

#[test]
fn held_note_locks_exactly_once() {
    let signal = Signal {
        sample_rate: SAMPLE_RATE,
        data: sin_wave::<f64>(293.66, 0.4, SAMPLE_RATE as usize * 2, SAMPLE_RATE),
    };
    let mut tracker = PitchTracker::with_config(
        &DetectorConfig::default(),
        &StabilityConfig::default(),
        SAMPLE_RATE,
        SIZE,
    )
    .unwrap();
    let mut playback = Playback::new(&signal);

    let mut locks = 0;
    let mut previous = FilterState::Empty;
    let hop = SAMPLE_RATE as usize / 20;
    for tick in 0..30 {
        playback.seek(tick * hop);
        let update = tracker.poll(&playback, tick as u64 * 50).unwrap();
        if update.state == FilterState::Locked && previous != FilterState::Locked {
            locks += 1;
        }
        previous = update.state;
        if let Some(stable) = update.stable {
            assert_eq!(stable.note.to_string(), "D4");
        }
    }
    assert_eq!(locks, 1);
}

#[test]
fn octave_glitch_keeps_the_lock() {
    let low = sin_wave::<f64>(220.0, 0.4, SIZE, SAMPLE_RATE);
    let high = sin_wave::<f64>(440.0, 0.4, SIZE, SAMPLE_RATE);
    let mut tracker = PitchTracker::with_config(
        &DetectorConfig::default(),
        &StabilityConfig::default(),
        SAMPLE_RATE,
        SIZE,
    )
    .unwrap();

    for (tick, signal) in [&low, &low, &low, &high].iter().enumerate() {
        let buffer = SampleBuffer::new(signal.as_slice(), SAMPLE_RATE).unwrap();
        let update = tracker.tick(&buffer, tick as u64 * 100);
        if tick == 3 {
            let stable = update.stable.unwrap();
            assert_eq!(update.state, FilterState::Locked);
            assert!((stable.frequency_hz - 220.0).abs() < 220.0 * 0.01);
        }
    }
}

#[test]
fn wav_round_trip_locks() {
    const WAV_RATE: u32 = 44100;
    const WAV_SIZE: usize = 2048;

    let path = temp_wav_path("pitch-tracking-c4.wav");
    let tone = sin_wave::<f64>(261.63, 0.5, WAV_RATE as usize, WAV_RATE);
    write_wav(&path, &tone, WAV_RATE);
    let signal: Signal<f32> = wav_file_to_signal(&path);
    std::fs::remove_file(&path).unwrap();

    assert_eq!(signal.sample_rate, WAV_RATE);
    assert_eq!(signal.data.len(), WAV_RATE as usize);

    let mut tracker = PitchTracker::with_config(
        &DetectorConfig::default(),
        &StabilityConfig::default(),
        WAV_RATE,
        WAV_SIZE,
    )
    .unwrap();

    let hop = WAV_RATE as usize / 10;
    let mut last = None;
    for tick in 0..6 {
        let start = tick * hop;
        let frame = &signal.data[start..start + WAV_SIZE];
        let buffer = SampleBuffer::new(frame, WAV_RATE).unwrap();
        last = tracker.tick(&buffer, tick as u64 * 100).stable.or(last);
    }

    let stable = last.expect("tone never locked");
    assert_eq!(stable.note.to_string(), "C4");
    assert!(stable.cents_offset().abs() <= 5);
}

fn detect<T: Float>(detector: &mut LagDetector<T>, signal: &[T]) -> PitchEstimate<T> {
    let buffer = SampleBuffer::new(signal, detector.sample_rate_hz()).unwrap();
    detector.detect(&buffer)
}

fn assert_within(estimate: PitchEstimate<f64>, freq_in: f64, tolerance: f64) {
    match estimate.frequency_hz() {
        Some(frequency) => {
            println!(
                "freq: {}, expected {}, candidates {}",
                frequency,
                freq_in,
                estimate.candidates.len()
            );
            assert!(
                (frequency - freq_in).abs() < freq_in * tolerance,
                "detected {} Hz for {} Hz",
                frequency,
                freq_in
            );
        }
        None => panic!("nothing detected for {} Hz: {:?}", freq_in, estimate.detection),
    }
}

/// `start`, `start + step`, ... up to and including `stop`.
fn sweep(start: f64, stop: f64, step: f64) -> impl Iterator<Item = f64> {
    (0..)
        .map(move |i| start + i as f64 * step)
        .take_while(move |&f| f <= stop)
}

fn temp_wav_path(file_name: &str) -> PathBuf {
    let mut d = std::env::temp_dir();
    d.push(format!("{}-{}", std::process::id(), file_name));
    d
}

fn write_wav(path: &PathBuf, signal: &[f64], sample_rate: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in signal {
        writer
            .write_sample((s * i16::MAX as f64).round() as i16)
            .unwrap();
    }
    writer.finalize().unwrap();
}

fn wav_file_to_signal<T: Float>(path: &PathBuf) -> Signal<T> {
    println!("Opening \"{}\"", path.display());
    let mut reader = hound::WavReader::open(path).unwrap();
    let sample_rate = reader.spec().sample_rate;
    let data: Vec<T> = reader
        .samples::<i16>()
        .map(|s| T::cast(s.unwrap() as f64 / 32768.0))
        .collect();

    Signal { sample_rate, data }
}

fn sin_wave<T: Float>(freq: f64, amplitude: f64, size: usize, sample_rate: u32) -> Vec<T> {
    let mut signal = new_real_buffer(size);
    let two_pi = 2.0 * std::f64::consts::PI;
    let dx = two_pi * freq / sample_rate as f64;
    for i in 0..size {
        let x = i as f64 * dx;
        signal[i] = T::cast(amplitude * x.sin());
    }
    signal
}

fn square_wave<T: Float>(freq: f64, amplitude: f64, size: usize, sample_rate: u32) -> Vec<T> {
    let mut signal = new_real_buffer(size);
    let period = sample_rate as f64 / freq;

    for i in 0..size {
        let x = i as f64 / period;
        let frac = x - x.floor();
        let y = match frac >= 0.5 {
            true => -amplitude,
            false => amplitude,
        };
        signal[i] = T::cast(y);
    }
    signal
}

fn triangle_wave<T: Float>(freq: f64, amplitude: f64, size: usize, sample_rate: u32) -> Vec<T> {
    let mut signal = new_real_buffer(size);
    let period = sample_rate as f64 / freq;

    for i in 0..size {
        let x = i as f64 / period;
        let frac = x - x.floor();
        let y = match frac {
            f if f < 0.25 => 4. * f,
            f if f < 0.75 => 1. - 4. * (f - 0.25),
            f => -1. + 4. * (f - 0.75),
        };
        signal[i] = T::cast(amplitude * y);
    }
    signal
}

/// Uniform noise in `[-amplitude, amplitude]` from a fixed-seed LCG.
fn noise<T: Float>(amplitude: f64, size: usize, seed: u64) -> Vec<T> {
    let mut state = seed;
    (0..size)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let unit = (state >> 11) as f64 / (1u64 << 53) as f64;
            T::cast(amplitude * (2.0 * unit - 1.0))
        })
        .collect()
}
