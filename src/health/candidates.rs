//! Candidate ordering for a single connection attempt.
//!
//! # Phases
//! ```text
//! retry:  down peers whose retry time has elapsed, earliest first
//!         (only for the caller holding the retry token)
//! normal: up peers in uniformly random order
//! ```
//!
//! The retry token is taken with a compare-and-swap and never waited on.
//! A caller that loses the race skips straight to the normal phase, so at
//! most one caller at a time retries down peers.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::vec;
use tokio::time::Instant;

use crate::health::peer::PeerId;
use crate::health::state::PeerRegistry;

/// Exclusive right to run the retry phase. Released on drop.
#[derive(Debug)]
pub(crate) struct RetryGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RetryGuard<'a> {
    pub(crate) fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for RetryGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Lazy, single-pass attempt sequence produced by
/// [`PeerRegistry::candidate_order`].
///
/// The normal phase is sampled only once the retry phase is exhausted, so it
/// reflects any peers the retry phase marked down. Dropping the iterator
/// early releases the retry token.
#[derive(Debug)]
pub struct CandidateOrder<'a> {
    registry: &'a PeerRegistry,
    retry: Option<RetryPass<'a>>,
    normal: Option<vec::IntoIter<PeerId>>,
    retried: HashSet<PeerId>,
}

#[derive(Debug)]
struct RetryPass<'a> {
    _guard: RetryGuard<'a>,
    pending: vec::IntoIter<PeerId>,
}

impl<'a> CandidateOrder<'a> {
    pub(crate) fn new(registry: &'a PeerRegistry) -> Self {
        let retry = match registry.try_retry_pass() {
            Some(guard) => {
                let eligible = registry.retry_eligible(Instant::now());
                if eligible.is_empty() {
                    None
                } else {
                    tracing::debug!(
                        pool = %registry.pool(),
                        eligible = eligible.len(),
                        "Retrying downed peers"
                    );
                    Some(RetryPass {
                        _guard: guard,
                        pending: eligible.into_iter(),
                    })
                }
            }
            None => {
                tracing::debug!(pool = %registry.pool(), "Retry lock contended, skipping downed peers");
                None
            }
        };

        Self {
            registry,
            retry,
            normal: None,
            retried: HashSet::new(),
        }
    }

    /// True while this sequence still holds the retry token.
    pub fn is_retrying(&self) -> bool {
        self.retry.is_some()
    }
}

impl Iterator for CandidateOrder<'_> {
    type Item = PeerId;

    fn next(&mut self) -> Option<PeerId> {
        if let Some(pass) = self.retry.as_mut() {
            if let Some(peer) = pass.pending.next() {
                self.retried.insert(peer.clone());
                return Some(peer);
            }
            self.retry = None;
        }

        let registry = self.registry;
        let retried = &self.retried;
        let normal = self.normal.get_or_insert_with(|| registry.shuffled_up().into_iter());
        normal.find(|peer| !retried.contains(peer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn registry() -> PeerRegistry {
        PeerRegistry::with_peers("test", ["a", "b", "c"], Duration::from_secs(30)).unwrap()
    }

    #[test]
    fn test_retry_guard_is_exclusive() {
        let flag = AtomicBool::new(false);
        let first = RetryGuard::try_acquire(&flag);
        assert!(first.is_some());
        assert!(RetryGuard::try_acquire(&flag).is_none());

        drop(first);
        assert!(RetryGuard::try_acquire(&flag).is_some());
    }

    #[test]
    fn test_all_up_peers_yielded_once() {
        let registry = registry();
        let mut order: Vec<PeerId> = registry.candidate_order().collect();
        order.sort();
        assert_eq!(order, registry.peers());
    }

    #[tokio::test(start_paused = true)]
    async fn test_down_peers_not_yielded_before_retry_time() {
        let registry = registry();
        registry.mark_down(&PeerId::from("b"));

        let order: Vec<PeerId> = registry.candidate_order().collect();
        assert_eq!(order.len(), 2);
        assert!(!order.contains(&PeerId::from("b")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_eligible_peers_come_first() {
        let registry = registry();
        registry.mark_down(&PeerId::from("b"));
        tokio::time::advance(Duration::from_secs(30)).await;

        let order: Vec<PeerId> = registry.candidate_order().collect();
        assert_eq!(order[0], PeerId::from("b"));
        assert_eq!(order.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_contended_retry_skips_to_normal_phase() {
        let registry = registry();
        registry.mark_down(&PeerId::from("b"));
        tokio::time::advance(Duration::from_secs(30)).await;

        let mut retrying = registry.candidate_order();
        assert!(retrying.is_retrying());

        let other: Vec<PeerId> = registry.candidate_order().collect();
        assert_eq!(other.len(), 2);
        assert!(!other.contains(&PeerId::from("b")));

        assert_eq!(retrying.next(), Some(PeerId::from("b")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_sequence_releases_retry_token() {
        let registry = registry();
        registry.mark_down(&PeerId::from("a"));
        tokio::time::advance(Duration::from_secs(30)).await;

        {
            let mut order = registry.candidate_order();
            assert_eq!(order.next(), Some(PeerId::from("a")));
        }

        let mut order = registry.candidate_order();
        assert!(order.is_retrying());
        assert_eq!(order.next(), Some(PeerId::from("a")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_released_after_retry_phase() {
        let registry = registry();
        registry.mark_down(&PeerId::from("a"));
        tokio::time::advance(Duration::from_secs(30)).await;

        let mut order = registry.candidate_order();
        assert_eq!(order.next(), Some(PeerId::from("a")));
        assert!(order.next().is_some());
        assert!(!order.is_retrying());

        assert!(registry.candidate_order().is_retrying());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_retry_excluded_from_normal_phase() {
        let registry = registry();
        let a = PeerId::from("a");
        registry.mark_down(&a);
        tokio::time::advance(Duration::from_secs(30)).await;

        let mut order = registry.candidate_order();
        assert_eq!(order.next(), Some(a.clone()));
        registry.mark_down(&a);

        let rest: Vec<PeerId> = order.collect();
        assert_eq!(rest.len(), 2);
        assert!(!rest.contains(&a));
    }

    #[test]
    fn test_empty_when_nothing_up() {
        let registry = registry();
        for peer in registry.peers() {
            registry.mark_down(&peer);
        }
        assert_eq!(registry.candidate_order().count(), 0);
    }
}
