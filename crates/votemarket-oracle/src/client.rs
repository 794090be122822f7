//! Accessor wrapping the external epoch oracle.

use votemarket_types::Timestamp;

use crate::{EpochOracle, OracleError, Result};

/// Outcome of a checkpoint: the boundary before and after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub previous: Timestamp,
    pub current: Timestamp,
}

impl Checkpoint {
    /// Whether the checkpoint moved the boundary.
    pub fn advanced(&self) -> bool {
        self.current != self.previous
    }
}

/// Thin accessor over a boxed [`EpochOracle`].
pub struct EpochOracleClient {
    oracle: Box<dyn EpochOracle>,
}

impl EpochOracleClient {
    /// Wrap an oracle.
    pub fn new(oracle: impl EpochOracle + 'static) -> Self {
        Self {
            oracle: Box::new(oracle),
        }
    }

    /// The oracle's stored epoch boundary.
    ///
    /// # Errors
    ///
    /// - [`OracleError::Unset`] if the oracle reports zero
    pub fn current_epoch_start(&self) -> Result<Timestamp> {
        match self.oracle.current_epoch_start() {
            0 => Err(OracleError::Unset),
            ts => Ok(ts),
        }
    }

    /// Force the oracle up to the present epoch.
    ///
    /// # Errors
    ///
    /// - [`OracleError::Unset`] if the oracle ends on a zero boundary
    /// - Any error the oracle raises while advancing
    pub fn checkpoint(&mut self) -> Result<Checkpoint> {
        let previous = self.oracle.current_epoch_start();
        let current = self.oracle.checkpoint()?;
        if current == 0 {
            return Err(OracleError::Unset);
        }
        if current != previous {
            tracing::info!(previous, current, "epoch oracle checkpointed");
        } else {
            tracing::debug!(current, "epoch oracle already current");
        }
        Ok(Checkpoint { previous, current })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GaugeController, ManualClock};
    use votemarket_types::WEEK;

    const EPOCH: Timestamp = 1_677_110_400;

    struct ZeroOracle;

    impl EpochOracle for ZeroOracle {
        fn current_epoch_start(&self) -> Timestamp {
            0
        }

        fn checkpoint(&mut self) -> Result<Timestamp> {
            Ok(0)
        }
    }

    #[test]
    fn test_checkpoint_reports_advance() {
        let clock = ManualClock::new(EPOCH + 1);
        let mut client = EpochOracleClient::new(GaugeController::new(EPOCH, clock));

        let checkpoint = client.checkpoint().expect("checkpoint");
        assert!(checkpoint.advanced());
        assert_eq!(checkpoint.previous, EPOCH);
        assert_eq!(checkpoint.current, EPOCH + WEEK);
        assert_eq!(client.current_epoch_start().expect("epoch"), EPOCH + WEEK);

        let again = client.checkpoint().expect("checkpoint");
        assert!(!again.advanced());
    }

    #[test]
    fn test_zero_oracle_rejected() {
        let mut client = EpochOracleClient::new(ZeroOracle);
        assert!(matches!(client.current_epoch_start(), Err(OracleError::Unset)));
        assert!(matches!(client.checkpoint(), Err(OracleError::Unset)));
    }
}
