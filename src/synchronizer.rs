//! Reusable rendezvous point whose participant set changes while it runs.
//!
//! A round closes when every registered participant has called `sync` (or
//! left). Closing runs the round-complete hook, refills `pending` from
//! `participants` and wakes every waiter. All of that happens under one lock,
//! and `leave` re-checks the closing condition under the same lock as `sync`,
//! so a departing peer is never waited on.

use crate::error::SortError;
use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, trace};

type RoundHook = Box<dyn Fn() + Send + Sync>;

struct RoundState<P> {
    participants: FxHashSet<P>,
    pending: FxHashSet<P>,
    /// Bumped on every close; waiters block until it moves.
    round: u64,
    waiting: usize,
}

impl<P: Eq + Hash> RoundState<P> {
    fn in_progress(&self) -> bool {
        self.pending.len() != self.participants.len()
    }
}

pub struct Synchronizer<P> {
    state: Mutex<RoundState<P>>,
    round_closed: Condvar,
    on_round_complete: Option<RoundHook>,
}

impl<P> Synchronizer<P>
where
    P: Eq + Hash + Clone + Debug,
{
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RoundState {
                participants: FxHashSet::default(),
                pending: FxHashSet::default(),
                round: 0,
                waiting: 0,
            }),
            round_closed: Condvar::new(),
            on_round_complete: None,
        }
    }

    /// Installs the hook fired once per closed round.
    ///
    /// The hook runs on whichever thread closes the round while the
    /// synchronizer lock is held: it must be quick and must not call back into
    /// this synchronizer.
    pub fn with_round_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_round_complete = Some(Box::new(hook));
        self
    }

    /// Registers `participant`.
    ///
    /// If a round is already under way (somebody synced in it), the newcomer
    /// is only counted from the next round on.
    pub fn join(&self, participant: P) -> Result<(), SortError> {
        let mut state = self.state.lock();
        if state.participants.contains(&participant) {
            return Err(SortError::misuse(participant, "join"));
        }
        let in_progress = state.in_progress();
        if !in_progress {
            state.pending.insert(participant.clone());
        }
        debug!(?participant, in_progress, "participant joined");
        state.participants.insert(participant);
        Ok(())
    }

    pub fn leave(&self, participant: &P) -> Result<(), SortError> {
        let mut state = self.state.lock();
        if !state.participants.remove(participant) {
            return Err(SortError::misuse(participant, "leave"));
        }
        let was_pending = state.pending.remove(participant);
        debug!(?participant, was_pending, "participant left");

        let someone_to_release = !state.participants.is_empty() || state.waiting > 0;
        if was_pending && state.pending.is_empty() && someone_to_release {
            self.close_round(&mut state);
        }
        Ok(())
    }

    /// Marks `participant` as arrived and blocks until the round closes.
    ///
    /// The caller whose arrival empties `pending` closes the round and returns
    /// straight away.
    pub fn sync(&self, participant: &P) -> Result<(), SortError> {
        let mut state = self.state.lock();
        if !state.participants.contains(participant) {
            return Err(SortError::misuse(participant, "sync"));
        }
        state.pending.remove(participant);
        if state.pending.is_empty() {
            self.close_round(&mut state);
            return Ok(());
        }

        let round = state.round;
        state.waiting += 1;
        while state.round == round {
            self.round_closed.wait(&mut state);
        }
        state.waiting -= 1;
        Ok(())
    }

    fn close_round(&self, state: &mut RoundState<P>) {
        state.round += 1;
        trace!(round = state.round, participants = state.participants.len(), "round closed");
        if let Some(hook) = &self.on_round_complete {
            hook();
        }
        state.pending = state.participants.clone();
        self.round_closed.notify_all();
    }

    /// Joins and returns a guard that leaves when dropped.
    pub fn enroll(self: &Arc<Self>, participant: P) -> Result<Membership<P>, SortError> {
        self.join(participant.clone())?;
        Ok(Membership {
            synchronizer: Arc::clone(self),
            participant,
            active: true,
        })
    }

    pub fn participant_count(&self) -> usize {
        self.state.lock().participants.len()
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn rounds_closed(&self) -> u64 {
        self.state.lock().round
    }
}

impl<P> Default for Synchronizer<P>
where
    P: Eq + Hash + Clone + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Membership guard
// =============================================================================

/// A joined participant. Leaves the synchronizer on drop, including while
/// unwinding, so a failed run never blocks its peers.
pub struct Membership<P>
where
    P: Eq + Hash + Clone + Debug,
{
    synchronizer: Arc<Synchronizer<P>>,
    participant: P,
    active: bool,
}

impl<P> Membership<P>
where
    P: Eq + Hash + Clone + Debug,
{
    pub fn participant(&self) -> &P {
        &self.participant
    }

    pub fn sync(&self) -> Result<(), SortError> {
        self.synchronizer.sync(&self.participant)
    }

    pub fn leave(mut self) -> Result<(), SortError> {
        self.active = false;
        self.synchronizer.leave(&self.participant)
    }
}

impl<P> Drop for Membership<P>
where
    P: Eq + Hash + Clone + Debug,
{
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        if let Err(err) = self.synchronizer.leave(&self.participant) {
            tracing::error!(participant = ?self.participant, %err, "failed to leave synchronizer");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    const QUIET: Duration = Duration::from_millis(100);

    fn shared() -> Arc<Synchronizer<&'static str>> {
        Arc::new(Synchronizer::new())
    }

    /// Spawns a thread that syncs once and reports back on `done`.
    fn sync_in_thread(
        sync: &Arc<Synchronizer<&'static str>>,
        name: &'static str,
        done: &channel::Sender<&'static str>,
    ) -> thread::JoinHandle<()> {
        let sync = Arc::clone(sync);
        let done = done.clone();
        thread::spawn(move || {
            sync.sync(&name).unwrap();
            done.send(name).unwrap();
        })
    }

    /// Waits until `count` callers are parked inside `sync`.
    fn wait_for_waiters(sync: &Synchronizer<&'static str>, count: usize) {
        for _ in 0..500 {
            if sync.state.lock().waiting == count {
                return;
            }
            thread::sleep(Duration::from_millis(2));
        }
        panic!("waiters never reached {count}");
    }

    #[test]
    fn test_single_participant_round_closes_immediately() {
        let sync = shared();
        sync.join("a").unwrap();
        sync.sync(&"a").unwrap();
        sync.sync(&"a").unwrap();
        assert_eq!(sync.rounds_closed(), 2);
        assert_eq!(sync.pending_count(), 1);
    }

    #[test]
    fn test_two_participants_release_together() {
        let sync = shared();
        sync.join("a").unwrap();
        sync.join("b").unwrap();
        let (tx, rx) = channel::unbounded();

        let a = sync_in_thread(&sync, "a", &tx);
        wait_for_waiters(&sync, 1);
        assert!(rx.recv_timeout(QUIET).is_err(), "a returned before b synced");
        assert_eq!(sync.rounds_closed(), 0);

        sync.sync(&"b").unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "a");
        a.join().unwrap();

        assert_eq!(sync.rounds_closed(), 1);
        assert_eq!(sync.pending_count(), 2);
    }

    #[test]
    fn test_leave_of_pending_peer_closes_round() {
        let sync = shared();
        for name in ["a", "b", "c"] {
            sync.join(name).unwrap();
        }
        let (tx, rx) = channel::unbounded();
        let a = sync_in_thread(&sync, "a", &tx);
        let b = sync_in_thread(&sync, "b", &tx);
        wait_for_waiters(&sync, 2);
        assert!(rx.recv_timeout(QUIET).is_err());

        sync.leave(&"c").unwrap();
        let mut released = vec![
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        ];
        released.sort();
        assert_eq!(released, vec!["a", "b"]);
        a.join().unwrap();
        b.join().unwrap();

        assert_eq!(sync.rounds_closed(), 1);
        assert_eq!(sync.participant_count(), 2);
        assert_eq!(sync.pending_count(), 2);
    }

    #[test]
    fn test_leave_of_non_pending_peer_does_not_close() {
        let sync = shared();
        for name in ["a", "b", "c"] {
            sync.join(name).unwrap();
        }
        let (tx, rx) = channel::unbounded();
        let a = sync_in_thread(&sync, "a", &tx);
        wait_for_waiters(&sync, 1);

        // "a" is blocked and no longer pending; removing it from the outside
        // must not close the round while "b" and "c" still owe a sync.
        sync.leave(&"a").unwrap();
        assert!(rx.recv_timeout(QUIET).is_err());
        assert_eq!(sync.rounds_closed(), 0);

        sync.leave(&"b").unwrap();
        sync.leave(&"c").unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "a");
        a.join().unwrap();
        assert_eq!(sync.rounds_closed(), 1);
    }

    #[test]
    fn test_late_joiner_waits_for_next_round() {
        let sync = shared();
        sync.join("a").unwrap();
        sync.join("b").unwrap();
        let (tx, rx) = channel::unbounded();
        let a = sync_in_thread(&sync, "a", &tx);
        wait_for_waiters(&sync, 1);

        sync.join("c").unwrap();
        assert_eq!(sync.pending_count(), 1);

        sync.sync(&"b").unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "a");
        a.join().unwrap();
        assert_eq!(sync.pending_count(), 3);
    }

    #[test]
    fn test_join_between_rounds_counts_immediately() {
        let sync = shared();
        sync.join("a").unwrap();
        sync.join("b").unwrap();
        assert_eq!(sync.pending_count(), 2);
    }

    #[test]
    fn test_rejoin_after_everyone_left() {
        let sync = shared();
        sync.join("a").unwrap();
        sync.leave(&"a").unwrap();
        assert_eq!(sync.participant_count(), 0);
        assert_eq!(sync.rounds_closed(), 0);

        sync.join("z").unwrap();
        sync.sync(&"z").unwrap();
        assert_eq!(sync.rounds_closed(), 1);
    }

    #[test]
    fn test_misuse_is_reported() {
        let sync = shared();
        assert!(matches!(
            sync.sync(&"ghost"),
            Err(SortError::SynchronizerMisuse { operation: "sync", .. })
        ));
        assert!(matches!(
            sync.leave(&"ghost"),
            Err(SortError::SynchronizerMisuse { operation: "leave", .. })
        ));
        sync.join("a").unwrap();
        assert!(matches!(
            sync.join("a"),
            Err(SortError::SynchronizerMisuse { operation: "join", .. })
        ));
    }

    #[test]
    fn test_hook_fires_once_per_round() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let sync = Arc::new(
            Synchronizer::new().with_round_hook(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        sync.join(1u32).unwrap();
        sync.join(2u32).unwrap();

        let peer = {
            let sync = Arc::clone(&sync);
            thread::spawn(move || {
                for _ in 0..5 {
                    sync.sync(&2).unwrap();
                }
            })
        };
        for _ in 0..5 {
            sync.sync(&1).unwrap();
        }
        peer.join().unwrap();

        assert_eq!(fired.load(Ordering::SeqCst), 5);
        assert_eq!(sync.rounds_closed(), 5);
    }

    #[test]
    fn test_membership_leaves_on_drop() {
        let sync: Arc<Synchronizer<u8>> = Arc::new(Synchronizer::new());
        let first = sync.enroll(1).unwrap();
        let second = sync.enroll(2).unwrap();
        assert_eq!(sync.participant_count(), 2);

        assert_eq!(*first.participant(), 1);
        drop(first);
        assert_eq!(sync.participant_count(), 1);
        second.sync().unwrap();
        assert_eq!(sync.rounds_closed(), 1);
        second.leave().unwrap();
        assert_eq!(sync.participant_count(), 0);
    }

    #[test]
    fn test_membership_leaves_while_unwinding() {
        let sync = shared();
        sync.join("survivor").unwrap();
        let doomed = sync.enroll("doomed").unwrap();
        let (tx, rx) = channel::unbounded();

        let survivor = sync_in_thread(&sync, "survivor", &tx);
        wait_for_waiters(&sync, 1);

        let crashed = thread::spawn(move || {
            let _held = doomed;
            panic!("run aborted mid-round");
        });
        assert!(crashed.join().is_err());

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "survivor");
        survivor.join().unwrap();
        assert_eq!(sync.participant_count(), 1);
        assert_eq!(sync.rounds_closed(), 1);
    }

    #[test]
    fn test_lockstep_with_staggered_departures() {
        const RUNS: usize = 6;
        let progress = Arc::new(Mutex::new(vec![0usize; RUNS]));
        let log = Arc::new(Mutex::new(Vec::new()));

        let sync = {
            let progress = Arc::clone(&progress);
            let log = Arc::clone(&log);
            Arc::new(Synchronizer::new().with_round_hook(move || {
                log.lock().push(progress.lock().clone());
            }))
        };

        let memberships: Vec<_> = (0..RUNS).map(|i| sync.enroll(i).unwrap()).collect();
        let handles: Vec<_> = memberships
            .into_iter()
            .enumerate()
            .map(|(i, membership)| {
                let progress = Arc::clone(&progress);
                thread::spawn(move || {
                    for _ in 0..3 + i {
                        progress.lock()[i] += 1;
                        membership.sync().unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let log = log.lock();
        assert_eq!(log.len(), 3 + RUNS - 1);
        for (round, seen) in log.iter().enumerate() {
            for (i, &steps) in seen.iter().enumerate() {
                assert_eq!(steps, (round + 1).min(3 + i), "round {round}, run {i}");
            }
        }
        assert_eq!(sync.participant_count(), 0);
    }
}
