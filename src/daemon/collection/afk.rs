use std::time::Duration;

/// Decides whether the user stepped away from the computer.
pub struct AfkEvaluator {
    threshold: Option<Duration>,
}

impl AfkEvaluator {
    pub fn new(threshold: Option<Duration>) -> Self {
        Self { threshold }
    }

    pub fn is_afk(&self, idle_ms: u32) -> bool {
        self.threshold
            .is_some_and(|threshold| threshold < Duration::from_millis(idle_ms as u64))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::AfkEvaluator;

    #[test]
    fn test_is_afk() {
        let evaluator = AfkEvaluator::new(Some(Duration::from_secs(120)));
        assert!(!evaluator.is_afk(0));
        assert!(!evaluator.is_afk(120_000));
        assert!(evaluator.is_afk(120_001));
    }

    #[test]
    fn test_disabled() {
        assert!(!AfkEvaluator::new(None).is_afk(u32::MAX));
    }
}
