use rand::Rng;
use tokio::time::{sleep, Duration};

use crate::{CallAttempt, PlaceOutcome, Placer, PlacerError};

/// Returns success with p=0.9 after a fixed 2-second delay, per spec.md
/// §6's mock implementation of the external placer contract.
#[derive(Debug, Clone)]
pub struct MockPlacer {
    pub delay: Duration,
    pub success_probability: f64,
}

impl MockPlacer {
    pub fn new() -> Self {
        Self {
            delay: Duration::from_secs(2),
            success_probability: 0.9,
        }
    }
}

impl Default for MockPlacer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Placer for MockPlacer {
    async fn place(&self, _attempt: &CallAttempt) -> Result<PlaceOutcome, PlacerError> {
        sleep(self.delay).await;

        let roll: f64 = rand::thread_rng().gen_range(0.0..1.0);
        if roll < self.success_probability {
            Ok(PlaceOutcome::Succeeded)
        } else {
            Ok(PlaceOutcome::Failed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_terminates_with_an_outcome() {
        let placer = MockPlacer {
            delay: Duration::from_millis(1),
            success_probability: 0.9,
        };
        let attempt = CallAttempt {
            external_call_id: "call-1".into(),
            dialed_number: "+15555550100".into(),
        };
        let result = placer.place(&attempt).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn zero_probability_always_fails() {
        let placer = MockPlacer {
            delay: Duration::from_millis(1),
            success_probability: 0.0,
        };
        let attempt = CallAttempt {
            external_call_id: "call-2".into(),
            dialed_number: "+15555550100".into(),
        };
        assert_eq!(placer.place(&attempt).await.unwrap(), PlaceOutcome::Failed);
    }

    #[tokio::test]
    async fn full_probability_always_succeeds() {
        let placer = MockPlacer {
            delay: Duration::from_millis(1),
            success_probability: 1.0,
        };
        let attempt = CallAttempt {
            external_call_id: "call-3".into(),
            dialed_number: "+15555550100".into(),
        };
        assert_eq!(
            placer.place(&attempt).await.unwrap(),
            PlaceOutcome::Succeeded
        );
    }
}
