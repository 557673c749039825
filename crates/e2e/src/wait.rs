//! Bounded polling waits on top of a [`BrowserSession`]

use std::fmt;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

use crate::driver::{BrowserSession, Locator};
use crate::error::{DriverError, DriverResult};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Something a wait can block on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// At least one element matches
    Present(Locator),
    /// First match is displayed and enabled
    Clickable(Locator),
    /// Nothing matches, or the first match is not displayed
    Invisible(Locator),
    /// A JavaScript dialog is open; it gets accepted
    DialogAccepted,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Present(l) => write!(f, "presence of {}", l),
            Condition::Clickable(l) => write!(f, "{} to be clickable", l),
            Condition::Invisible(l) => write!(f, "invisibility of {}", l),
            Condition::DialogAccepted => write!(f, "a dialog to accept"),
        }
    }
}

enum Probe<E> {
    Met(Option<E>),
    Pending,
}

/// Polls a condition until it holds or the timeout elapses
#[derive(Debug, Clone, Copy)]
pub struct Wait {
    timeout: Duration,
    poll_interval: Duration,
}

impl Wait {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Block until `condition` holds. Returns the matched element for the
    /// element conditions that have one.
    ///
    /// The condition is checked at least once. Errors while probing are
    /// treated as "not yet" (the page may be mid-navigation); the last one is
    /// attached to the timeout error.
    pub async fn until<S: BrowserSession>(
        &self,
        session: &S,
        condition: &Condition,
    ) -> DriverResult<Option<S::Element>> {
        let deadline = Instant::now() + self.timeout;
        let mut last_error: Option<DriverError> = None;
        let mut polls = 0usize;

        loop {
            polls += 1;
            match probe(session, condition).await {
                Ok(Probe::Met(element)) => {
                    debug!("Condition met after {} poll(s): {}", polls, condition);
                    return Ok(element);
                }
                Ok(Probe::Pending) => {}
                Err(DriverError::NoDialog) => {}
                Err(e) => {
                    trace!("Probe error while waiting for {}: {}", condition, e);
                    last_error = Some(e);
                }
            }

            if Instant::now() >= deadline {
                break;
            }
            sleep(
                self.poll_interval
                    .min(deadline.saturating_duration_since(Instant::now())),
            )
            .await;
        }

        let condition = match last_error {
            Some(e) => format!("{} (last error: {})", condition, e),
            None => condition.to_string(),
        };
        Err(DriverError::Timeout {
            condition,
            timeout_secs: self.timeout.as_secs_f64(),
        })
    }

    pub async fn until_present<S: BrowserSession>(
        &self,
        session: &S,
        locator: &Locator,
    ) -> DriverResult<S::Element> {
        let condition = Condition::Present(locator.clone());
        self.until(session, &condition)
            .await?
            .ok_or_else(|| DriverError::NoSuchElement(locator.to_string()))
    }

    pub async fn until_clickable<S: BrowserSession>(
        &self,
        session: &S,
        locator: &Locator,
    ) -> DriverResult<S::Element> {
        let condition = Condition::Clickable(locator.clone());
        self.until(session, &condition)
            .await?
            .ok_or_else(|| DriverError::NoSuchElement(locator.to_string()))
    }

    pub async fn until_invisible<S: BrowserSession>(
        &self,
        session: &S,
        locator: &Locator,
    ) -> DriverResult<()> {
        self.until(session, &Condition::Invisible(locator.clone()))
            .await
            .map(|_| ())
    }

    pub async fn until_dialog_accepted<S: BrowserSession>(&self, session: &S) -> DriverResult<()> {
        self.until(session, &Condition::DialogAccepted)
            .await
            .map(|_| ())
    }
}

async fn probe<S: BrowserSession>(
    session: &S,
    condition: &Condition,
) -> DriverResult<Probe<S::Element>> {
    match condition {
        Condition::Present(locator) => {
            let first = session.locate_all(locator).await?.into_iter().next();
            Ok(match first {
                Some(element) => Probe::Met(Some(element)),
                None => Probe::Pending,
            })
        }
        Condition::Clickable(locator) => {
            let Some(element) = session.locate_all(locator).await?.into_iter().next() else {
                return Ok(Probe::Pending);
            };
            if session.is_displayed(&element).await? && session.is_enabled(&element).await? {
                Ok(Probe::Met(Some(element)))
            } else {
                Ok(Probe::Pending)
            }
        }
        Condition::Invisible(locator) => {
            let Some(element) = session.locate_all(locator).await?.into_iter().next() else {
                return Ok(Probe::Met(None));
            };
            // An element that vanished between lookup and check counts as gone
            match session.is_displayed(&element).await {
                Ok(true) => Ok(Probe::Pending),
                Ok(false) | Err(_) => Ok(Probe::Met(None)),
            }
        }
        Condition::DialogAccepted => {
            session.accept_dialog().await?;
            Ok(Probe::Met(None))
        }
    }
}
