//! Re-extraction until consecutive results agree.
//!
//! Dashboard panels render asynchronously after load. Instead of a fixed
//! delay, extraction is repeated on an interval until the same value has been
//! observed `stable_rounds` times in a row. If that never happens within
//! `max_attempts` observations, the last observed value is returned anyway:
//! partial data beats no data.
//!
//! [`Stabilizer`] is the pure state machine; [`poll_until_stable`] drives it
//! with `tokio::time::sleep`, so tests can run it on a paused clock.

use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
    /// Consecutive identical observations required; 1 accepts the first.
    pub stable_rounds: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            max_attempts: 15,
            stable_rounds: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Polling,
    Stable,
    TimedOut,
}

/// Final value of a polling run.
#[derive(Debug, Clone, PartialEq)]
pub struct PollOutcome<T> {
    pub value: T,
    pub state: PollState,
    pub attempts: u32,
}

#[derive(Debug)]
pub struct Stabilizer<T> {
    max_attempts: u32,
    stable_rounds: u32,
    last: Option<T>,
    stable_count: u32,
    attempts: u32,
    state: PollState,
}

impl<T: PartialEq> Stabilizer<T> {
    #[must_use]
    pub fn new(config: &PollConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            stable_rounds: config.stable_rounds.max(1),
            last: None,
            stable_count: 0,
            attempts: 0,
            state: PollState::Polling,
        }
    }

    /// Records one observation and returns the new state.
    ///
    /// Observations after a terminal state are ignored.
    pub fn observe(&mut self, value: T) -> PollState {
        if self.state != PollState::Polling {
            return self.state;
        }

        self.attempts += 1;
        if self.last.as_ref() == Some(&value) {
            self.stable_count += 1;
        } else {
            self.stable_count = 1;
            self.last = Some(value);
        }

        self.state = if self.stable_count >= self.stable_rounds {
            PollState::Stable
        } else if self.attempts >= self.max_attempts {
            PollState::TimedOut
        } else {
            PollState::Polling
        };
        self.state
    }

    #[must_use]
    pub fn state(&self) -> PollState {
        self.state
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn stable_count(&self) -> u32 {
        self.stable_count
    }

    /// Takes the final value once a terminal state is reached.
    pub fn take_outcome(&mut self) -> Option<PollOutcome<T>> {
        if self.state == PollState::Polling {
            return None;
        }
        self.last.take().map(|value| PollOutcome {
            value,
            state: self.state,
            attempts: self.attempts,
        })
    }
}

/// Calls `extract` every `config.interval` until its result is stable or
/// `config.max_attempts` calls have been made.
///
/// No sleep follows the final attempt, so the total wait is bounded by
/// `max_attempts * interval` plus the extraction time.
///
/// # Errors
///
/// The first error returned by `extract` ends polling and is returned.
pub async fn poll_until_stable<T, E, F, Fut>(
    config: &PollConfig,
    mut extract: F,
) -> Result<PollOutcome<T>, E>
where
    T: PartialEq,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut stabilizer = Stabilizer::new(config);

    loop {
        let value = extract().await?;
        let state = stabilizer.observe(value);
        tracing::debug!(
            attempt = stabilizer.attempts(),
            max_attempts = config.max_attempts,
            stable_count = stabilizer.stable_count(),
            ?state,
            "stabilization round"
        );

        if let Some(outcome) = stabilizer.take_outcome() {
            if outcome.state == PollState::TimedOut {
                tracing::info!(
                    attempts = outcome.attempts,
                    "result never stabilized; using last observation"
                );
            }
            return Ok(outcome);
        }

        tokio::time::sleep(config.interval).await;
    }
}
