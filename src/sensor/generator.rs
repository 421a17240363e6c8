use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use super::{Sample, Timestamp};

/// An unbounded, non-restartable stream of samples.
pub trait SignalSource: Send {
    fn next_sample(&mut self) -> Sample;
}

impl<S: SignalSource + ?Sized> SignalSource for Box<S> {
    fn next_sample(&mut self) -> Sample {
        (**self).next_sample()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampMode {
    #[default]
    WallClock,
    Logical,
}

/// Spindle vibration simulator: quiet baseline with periodic spikes.
pub struct VibrationSimulator {
    rng: StdRng,
    sequence_counter: u64,
    ticks_since_spike: u32,
    spike_interval: u32,
    timestamps: TimestampMode,
    pub base: [f64; 3],
    pub noise_amplitude: f64,
    pub spike_range: (f64, f64),
    pub spike_interval_range: (u32, u32),
}

impl VibrationSimulator {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        // 10-20 s between spikes at a 500 ms cadence
        let spike_interval_range = (20, 40);
        let spike_interval = rng.gen_range(spike_interval_range.0..=spike_interval_range.1);
        Self {
            rng,
            sequence_counter: 0,
            ticks_since_spike: 0,
            spike_interval,
            timestamps: TimestampMode::WallClock,
            base: [0.1, -0.2, 0.3],
            noise_amplitude: 0.05,
            spike_range: (3.5, 4.5),
            spike_interval_range,
        }
    }

    pub fn with_timestamps(mut self, mode: TimestampMode) -> Self {
        self.timestamps = mode;
        self
    }

    fn stamp(&self) -> Timestamp {
        match self.timestamps {
            TimestampMode::WallClock => Timestamp::now(),
            TimestampMode::Logical => Timestamp::logical(self.sequence_counter),
        }
    }

    fn is_spike_due(&mut self) -> bool {
        if self.ticks_since_spike >= self.spike_interval {
            self.ticks_since_spike = 0;
            let (lo, hi) = self.spike_interval_range;
            self.spike_interval = self.rng.gen_range(lo..=hi.max(lo));
            true
        } else {
            false
        }
    }
}

impl SignalSource for VibrationSimulator {
    fn next_sample(&mut self) -> Sample {
        self.sequence_counter += 1;

        let [x, y, z] = if self.is_spike_due() {
            let (a, b) = self.spike_range;
            let (lo, hi) = (a.min(b), a.max(b));
            [
                self.rng.gen_range(lo..=hi),
                self.rng.gen_range(lo..=hi),
                self.rng.gen_range(lo..=hi),
            ]
        } else {
            let amp = self.noise_amplitude.abs();
            let mut axes = self.base;
            for v in axes.iter_mut() {
                *v += self.rng.gen_range(-amp..=amp);
            }
            axes
        };
        self.ticks_since_spike += 1;

        Sample::new(self.stamp(), x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = VibrationSimulator::new(7).with_timestamps(TimestampMode::Logical);
        let mut b = VibrationSimulator::new(7).with_timestamps(TimestampMode::Logical);
        for _ in 0..100 {
            assert_eq!(a.next_sample(), b.next_sample());
        }
    }

    #[test]
    fn spikes_arrive_within_interval() {
        let mut sim = VibrationSimulator::new(3).with_timestamps(TimestampMode::Logical);
        let spikes: Vec<u64> = (0..200)
            .map(|_| sim.next_sample())
            .filter(|s| s.x >= 3.5)
            .map(|s| s.timestamp.as_str().parse().unwrap())
            .collect();

        assert!(spikes.len() >= 4, "expected periodic spikes, got {:?}", spikes);
        for pair in spikes.windows(2) {
            let gap = pair[1] - pair[0];
            assert!((20..=40).contains(&gap), "gap {} out of range", gap);
        }
    }

    #[test]
    fn baseline_stays_near_centre() {
        let mut sim = VibrationSimulator::new(11).with_timestamps(TimestampMode::Logical);
        let s = sim.next_sample();
        assert!((s.x - 0.1).abs() <= 0.05 + 1e-9);
        assert!((s.y + 0.2).abs() <= 0.05 + 1e-9);
        assert!((s.z - 0.3).abs() <= 0.05 + 1e-9);
        assert_eq!(s.timestamp.as_str(), "1");
    }

    #[test]
    fn degenerate_ranges_are_accepted() {
        let mut sim = VibrationSimulator::new(5).with_timestamps(TimestampMode::Logical);
        sim.noise_amplitude = 0.0;
        sim.spike_range = (4.0, 4.0);
        sim.spike_interval_range = (2, 2);

        // the first interval was drawn at construction, so allow up to 40 quiet ticks
        let samples: Vec<Sample> = (0..60).map(|_| sim.next_sample()).collect();
        assert!(samples.iter().all(|s| s.values() == [0.1, -0.2, 0.3] || s.values() == [4.0; 3]));
        assert!(samples.iter().any(|s| s.x == 4.0));
    }
}
