use alloc::{format, vec::Vec};

use super::{errors::LocalError, plan::Repetitions};

/// Returns the value held by the majority of `outcomes`.
///
/// The number of outcomes must be odd; there is no tie rule because a tie cannot happen.
pub fn majority_vote(outcomes: &[bool]) -> Result<bool, LocalError> {
    if outcomes.len() % 2 == 0 {
        return Err(LocalError::new(format!(
            "A majority vote needs an odd number of outcomes, got {}",
            outcomes.len()
        )));
    }
    let ones = outcomes.iter().filter(|outcome| **outcome).count();
    Ok(ones * 2 > outcomes.len())
}

/// The repetition-code corrector: collects the outcomes of the repetitions of one bit
/// and decides the bit once all of them are in.
#[derive(Debug, Clone)]
pub struct MajorityVote {
    repetitions: Repetitions,
    outcomes: Vec<bool>,
}

impl MajorityVote {
    /// Creates a vote over `repetitions` outcomes.
    pub fn new(repetitions: Repetitions) -> Self {
        Self {
            repetitions,
            outcomes: Vec::with_capacity(usize::from(repetitions.get())),
        }
    }

    /// Records the outcome of one repetition.
    ///
    /// Returns the decided bit when this was the last repetition, and starts over for the next bit.
    pub fn record(&mut self, outcome: bool) -> Result<Option<bool>, LocalError> {
        self.outcomes.push(outcome);
        if self.outcomes.len() < usize::from(self.repetitions.get()) {
            return Ok(None);
        }
        let decided = majority_vote(&self.outcomes)?;
        self.outcomes.clear();
        Ok(Some(decided))
    }
}

#[cfg(test)]
mod tests {
    use super::{majority_vote, MajorityVote};
    use crate::protocol::Repetitions;

    #[test]
    fn single_error_is_masked() {
        for intended in [false, true] {
            for wrong in 0..3 {
                let mut outcomes = [intended; 3];
                if let Some(outcome) = outcomes.get_mut(wrong) {
                    *outcome = !intended;
                }
                assert_eq!(majority_vote(&outcomes), Ok(intended));
            }
        }
    }

    #[test]
    fn even_counts_are_rejected() {
        assert!(majority_vote(&[]).is_err());
        assert!(majority_vote(&[true, false]).is_err());
    }

    #[test]
    fn vote_decides_after_every_group() {
        let mut vote = MajorityVote::new(Repetitions::TRIPLE);
        assert_eq!(vote.record(true), Ok(None));
        assert_eq!(vote.record(false), Ok(None));
        assert_eq!(vote.record(true), Ok(Some(true)));
        assert_eq!(vote.record(false), Ok(None));
        assert_eq!(vote.record(false), Ok(None));
        assert_eq!(vote.record(true), Ok(Some(false)));

        let mut single = MajorityVote::new(Repetitions::SINGLE);
        assert_eq!(single.record(true), Ok(Some(true)));
    }
}
