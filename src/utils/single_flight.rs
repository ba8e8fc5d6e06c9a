// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Single-flight execution of an async load.
//!
//! Concurrent callers of a not-yet-available resource share one in-progress
//! construction instead of racing to construct it independently: the first
//! caller becomes the leader and runs the load, everyone who arrives before
//! it completes becomes a follower and observes the leader's outcome —
//! success and failure alike. Callers arriving after completion start a
//! fresh flight; whether the resolved value is retained across flights is
//! the caller's policy, not this primitive's.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

type Outcome<T, E> = Result<T, Arc<E>>;

enum FlightState<T, E> {
    Idle,
    Pending(watch::Receiver<Option<Outcome<T, E>>>),
}

enum Role<T, E> {
    Leader(watch::Sender<Option<Outcome<T, E>>>),
    Follower(watch::Receiver<Option<Outcome<T, E>>>),
}

pub struct SingleFlight<T, E> {
    state: Mutex<FlightState<T, E>>,
}

impl<T: Clone, E> SingleFlight<T, E> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FlightState::Idle),
        }
    }

    /// Runs `load`, or joins a load already in flight.
    ///
    /// Errors are shared between the leader and its followers, so they are
    /// returned behind an `Arc`. The lock is never held across an await.
    pub async fn run<F, Fut>(&self, load: F) -> Outcome<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        let mut load = Some(load);
        loop {
            let role = {
                let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
                match &*state {
                    FlightState::Pending(rx) => Role::Follower(rx.clone()),
                    FlightState::Idle => {
                        let (tx, rx) = watch::channel(None);
                        *state = FlightState::Pending(rx);
                        Role::Leader(tx)
                    }
                }
            };

            match role {
                Role::Leader(tx) => {
                    let load = load.take().expect("single-flight leader elected twice");
                    let outcome = load().await.map_err(Arc::new);
                    {
                        let mut state =
                            self.state.lock().unwrap_or_else(PoisonError::into_inner);
                        *state = FlightState::Idle;
                    }
                    let _ = tx.send(Some(outcome.clone()));
                    return outcome;
                }
                Role::Follower(mut rx) => {
                    loop {
                        if let Some(outcome) = rx.borrow_and_update().as_ref() {
                            return outcome.clone();
                        }
                        if rx.changed().await.is_err() {
                            // Leader vanished without publishing (cancelled
                            // mid-load). Go around and contend again; our
                            // own closure is still unconsumed.
                            break;
                        }
                    }
                }
            }
        }
    }
}

impl<T: Clone, E> Default for SingleFlight<T, E> {
    fn default() -> Self {
        Self::new()
    }
}
