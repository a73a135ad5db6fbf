//! Success probability and transmission speed over repeated trials.

use core::time::Duration;

use anontx::protocol::{Byte, BITS_PER_BYTE};

/// The fraction of the bits of `sent` that arrived correctly in `received`.
pub fn success_probability(sent: &Byte, received: &Byte) -> f64 {
    1.0 - f64::from(sent.hamming_distance(received)) / f64::from(BITS_PER_BYTE)
}

/// The speed of a byte transmission, in bits per second of simulated time.
///
/// `None` if no time passed.
pub fn transmission_speed(elapsed: Duration) -> Option<f64> {
    let seconds = elapsed.as_secs_f64();
    (seconds > 0.0).then(|| f64::from(BITS_PER_BYTE) / seconds)
}

/// Averages over all receivers of all trials.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    success_probabilities: Vec<f64>,
    speeds: Vec<f64>,
}

fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

impl Statistics {
    /// Records what one receiver got in one trial.
    pub fn record(&mut self, sent: &Byte, received: &Byte, elapsed: Duration) {
        self.success_probabilities.push(success_probability(sent, received));
        if let Some(speed) = transmission_speed(elapsed) {
            self.speeds.push(speed);
        }
    }

    /// The number of recorded receptions.
    pub fn samples(&self) -> usize {
        self.success_probabilities.len()
    }

    /// The average success probability, if anything was recorded.
    pub fn average_success_probability(&self) -> Option<f64> {
        average(&self.success_probabilities)
    }

    /// The average transmission speed in bits per second, if anything was recorded.
    pub fn average_transmission_speed(&self) -> Option<f64> {
        average(&self.speeds)
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use anontx::protocol::Byte;

    use super::{success_probability, transmission_speed, Statistics};

    #[test]
    fn success_from_hamming_distance() {
        let sent = Byte::from(0b1111_1111);
        assert_eq!(success_probability(&sent, &sent), 1.0);
        assert_eq!(success_probability(&sent, &Byte::from(0b1111_1100)), 0.75);
        assert_eq!(success_probability(&sent, &Byte::from(0)), 0.0);
    }

    #[test]
    fn averages() {
        let sent = Byte::from(0b1010_1010);
        let mut statistics = Statistics::default();
        assert_eq!(statistics.average_success_probability(), None);

        statistics.record(&sent, &sent, Duration::from_millis(8));
        statistics.record(&sent, &Byte::from(0b1010_1011), Duration::ZERO);
        assert_eq!(statistics.samples(), 2);
        assert_eq!(statistics.average_success_probability(), Some(0.9375));
        assert_eq!(statistics.average_transmission_speed(), Some(1000.0));
        assert_eq!(transmission_speed(Duration::ZERO), None);
    }
}
