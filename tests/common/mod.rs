//! Shared connectors and helpers for integration tests.

#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

use peer_failover::{ConnectError, ConnectionSelector, Connector, PeerId, PeerRegistry};

pub const CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Two-peer registry named "pool" with the default check interval.
pub fn two_peer_registry() -> Arc<PeerRegistry> {
    Arc::new(PeerRegistry::with_peers("pool", ["a", "b"], CHECK_INTERVAL).unwrap())
}

/// Replays a fixed sequence of outcomes regardless of which peer is asked.
/// Panics if more attempts are made than scripted.
#[derive(Debug, Default)]
pub struct ScriptedConnector {
    script: Mutex<VecDeque<bool>>,
    attempts: Mutex<Vec<PeerId>>,
}

impl ScriptedConnector {
    /// `true` entries succeed, `false` entries are refused.
    pub fn new(outcomes: &[bool]) -> Self {
        Self {
            script: Mutex::new(outcomes.iter().copied().collect()),
            attempts: Mutex::new(Vec::new()),
        }
    }

    pub fn attempts(&self) -> Vec<PeerId> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

impl Connector for ScriptedConnector {
    type Connection = PeerId;

    async fn connect(&self, peer: &PeerId) -> Result<PeerId, ConnectError> {
        self.attempts.lock().unwrap().push(peer.clone());
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("connector called more times than scripted");
        if outcome {
            Ok(peer.clone())
        } else {
            Err(ConnectError::Refused(peer.to_string()))
        }
    }
}

/// Refuses the peers currently marked unreachable; accepts the rest.
#[derive(Debug, Default)]
pub struct ToggleConnector {
    unreachable: Mutex<HashSet<PeerId>>,
    attempts: Mutex<Vec<PeerId>>,
}

impl ToggleConnector {
    pub fn set_unreachable(&self, peer: &str, unreachable: bool) {
        let mut set = self.unreachable.lock().unwrap();
        if unreachable {
            set.insert(PeerId::from(peer));
        } else {
            set.remove(&PeerId::from(peer));
        }
    }

    pub fn attempts(&self) -> Vec<PeerId> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn clear_attempts(&self) {
        self.attempts.lock().unwrap().clear();
    }
}

impl Connector for ToggleConnector {
    type Connection = PeerId;

    async fn connect(&self, peer: &PeerId) -> Result<PeerId, ConnectError> {
        self.attempts.lock().unwrap().push(peer.clone());
        if self.unreachable.lock().unwrap().contains(peer) {
            Err(ConnectError::Timeout(Duration::from_secs(5)))
        } else {
            Ok(peer.clone())
        }
    }
}

/// Accepts every peer, but holds attempts on `gated` until released.
#[derive(Debug)]
pub struct GatedConnector {
    gated: PeerId,
    started: Notify,
    gate: Semaphore,
    attempts: Mutex<Vec<PeerId>>,
}

impl GatedConnector {
    pub fn new(gated: &str) -> Self {
        Self {
            gated: PeerId::from(gated),
            started: Notify::new(),
            gate: Semaphore::new(0),
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// Resolves once an attempt on the gated peer is in flight.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    pub fn attempts_on(&self, peer: &str) -> usize {
        let peer = PeerId::from(peer);
        self.attempts.lock().unwrap().iter().filter(|p| **p == peer).count()
    }
}

impl Connector for GatedConnector {
    type Connection = PeerId;

    async fn connect(&self, peer: &PeerId) -> Result<PeerId, ConnectError> {
        self.attempts.lock().unwrap().push(peer.clone());
        if *peer == self.gated {
            self.started.notify_one();
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| ConnectError::Unreachable(e.to_string()))?;
        }
        Ok(peer.clone())
    }
}

/// Sorted up and down peer names from a registry snapshot.
pub fn partition<C: Connector>(selector: &ConnectionSelector<C>) -> (Vec<String>, Vec<String>) {
    let snapshot = selector.registry().snapshot();
    let up = snapshot.up.iter().map(|p| p.to_string()).collect();
    let down = snapshot.down.iter().map(|d| d.peer.to_string()).collect();
    (up, down)
}
