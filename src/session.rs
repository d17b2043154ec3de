//! Live game sessions, keyed by the Discord message or channel they are
//! played in.

use crate::games::Actor;
use std::collections::hash_map::{Entry, HashMap};
use std::fmt;
use std::marker::PhantomData;
use std::time::{Duration, Instant};
use tokio::task::AbortHandle;

/// Opaque external identifier of a session (a message id or a channel id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey(pub u64);

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Setup,
    Inactivity,
    BotMove,
}

/// Pending timer tasks of one session. Dropping the set aborts them all, so
/// a session removed from its registry can never be touched by a stale timer.
#[derive(Debug, Default)]
pub struct Timers {
    handles: HashMap<TimerKind, AbortHandle>,
}

impl Timers {
    /// Registers a timer, aborting any previous timer of the same kind.
    pub fn arm(&mut self, kind: TimerKind, handle: AbortHandle) {
        if let Some(previous) = self.handles.insert(kind, handle) {
            previous.abort();
        }
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        if let Some(handle) = self.handles.remove(&kind) {
            handle.abort();
        }
    }

    /// Forgets a timer without aborting it. A timer task calls this on
    /// itself before tearing down its session.
    pub fn disarm(&mut self, kind: TimerKind) {
        self.handles.remove(&kind);
    }

}

impl Drop for Timers {
    fn drop(&mut self) {
        for (_, handle) in self.handles.drain() {
            handle.abort();
        }
    }
}

/// One game plus what the chat layer needs to find and render it.
#[derive(Debug)]
pub struct Session<G> {
    pub game: G,
    pub channel: u64,
    /// Message showing the board, once it has been sent.
    pub message: Option<u64>,
    /// Whoever started the game; allowed to stop it.
    pub owner: Actor,
    /// Set by the first accepted move of actual play.
    pub started_at: Option<Instant>,
    pub timers: Timers,
}

impl<G> Session<G> {
    pub fn new(game: G, channel: u64, owner: Actor) -> Self {
        Session {
            game,
            channel,
            message: None,
            owner,
            started_at: None,
            timers: Timers::default(),
        }
    }

    pub(crate) fn mark_started(&mut self) {
        self.started_at.get_or_insert_with(Instant::now);
    }

    /// Time since play began, if it has.
    pub fn played_for(&self) -> Option<Duration> {
        self.started_at.map(|at| at.elapsed())
    }
}

/// Storage backend of a [`SessionRegistry`].
pub trait SessionStore<G> {
    fn insert(&mut self, key: SessionKey, session: Session<G>) -> Result<(), Session<G>>;
    fn get(&self, key: SessionKey) -> Option<&Session<G>>;
    fn get_mut(&mut self, key: SessionKey) -> Option<&mut Session<G>>;
    fn remove(&mut self, key: SessionKey) -> Option<Session<G>>;
    fn len(&self) -> usize;
}

impl<G> SessionStore<G> for HashMap<SessionKey, Session<G>> {
    /// Refuses to replace a live session; the rejected session is handed back.
    fn insert(&mut self, key: SessionKey, session: Session<G>) -> Result<(), Session<G>> {
        match self.entry(key) {
            Entry::Occupied(_) => Err(session),
            Entry::Vacant(e) => {
                e.insert(session);
                Ok(())
            }
        }
    }

    fn get(&self, key: SessionKey) -> Option<&Session<G>> {
        HashMap::get(self, &key)
    }

    fn get_mut(&mut self, key: SessionKey) -> Option<&mut Session<G>> {
        HashMap::get_mut(self, &key)
    }

    fn remove(&mut self, key: SessionKey) -> Option<Session<G>> {
        HashMap::remove(self, &key)
    }

    fn len(&self) -> usize {
        HashMap::len(self)
    }
}

/// Maps external keys to exactly one live session each. In memory only: a
/// restart loses every game.
pub struct SessionRegistry<G, S = HashMap<SessionKey, Session<G>>> {
    store: S,
    _game: PhantomData<fn() -> G>,
}

impl<G> SessionRegistry<G> {
    pub fn new() -> Self {
        Self::with_store(HashMap::new())
    }
}

impl<G> Default for SessionRegistry<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G, S: SessionStore<G>> SessionRegistry<G, S> {
    pub fn with_store(store: S) -> Self {
        SessionRegistry {
            store,
            _game: PhantomData,
        }
    }

    /// Registers a new session. Fails, returning the session, when `key` is
    /// already in use.
    pub fn open(&mut self, key: SessionKey, session: Session<G>) -> Result<(), Session<G>> {
        self.store.insert(key, session)
    }

    pub fn get(&self, key: SessionKey) -> Option<&Session<G>> {
        self.store.get(key)
    }

    pub fn get_mut(&mut self, key: SessionKey) -> Option<&mut Session<G>> {
        self.store.get_mut(key)
    }

    pub fn contains(&self, key: SessionKey) -> bool {
        self.store.get(key).is_some()
    }

    /// Removes a session. Closing an absent key is a no-op.
    pub fn close(&mut self, key: SessionKey) -> Option<Session<G>> {
        self.store.remove(key)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(game: &'static str) -> Session<&'static str> {
        Session::new(game, 1, Actor::User(1))
    }

    #[test]
    fn one_session_per_key() {
        let mut registry = SessionRegistry::new();
        assert!(registry.open(SessionKey(1), session("a")).is_ok());
        let rejected = registry.open(SessionKey(1), session("b")).unwrap_err();
        assert_eq!(rejected.game, "b");
        assert_eq!(registry.get(SessionKey(1)).map(|s| s.game), Some("a"));
        assert!(registry.open(SessionKey(2), session("b")).is_ok());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn closing_twice_is_a_no_op() {
        let mut registry = SessionRegistry::new();
        registry.open(SessionKey(7), session("a")).unwrap();
        assert!(registry.close(SessionKey(7)).is_some());
        assert!(registry.close(SessionKey(7)).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn start_is_stamped_once() {
        let mut s = session("a");
        assert!(s.played_for().is_none());
        s.mark_started();
        let started = s.started_at;
        s.mark_started();
        assert_eq!(s.started_at, started);
        assert!(s.played_for().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_a_session_aborts_its_timers() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<()>();
        let mut s = session("a");
        let task = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(180)).await;
            let _ = tx.send(());
        });
        s.timers.arm(TimerKind::Setup, task.abort_handle());
        drop(s);
        assert!(task.await.unwrap_err().is_cancelled());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_replaces_the_previous_timer() {
        let mut timers = Timers::default();
        let first = tokio::spawn(tokio::time::sleep(Duration::from_secs(5)));
        let second = tokio::spawn(tokio::time::sleep(Duration::from_secs(5)));
        timers.arm(TimerKind::Inactivity, first.abort_handle());
        timers.arm(TimerKind::Inactivity, second.abort_handle());
        assert!(first.await.unwrap_err().is_cancelled());

        timers.disarm(TimerKind::Inactivity);
        drop(timers);
        assert!(second.await.is_ok());
    }
}
