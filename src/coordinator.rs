//! Turn coordination: feeds `(session, actor, action)` tuples into engines,
//! drives the built-in opponent and tears down finished sessions.

use crate::games::{Actor, MoveError, Outcome, Phase, Progress, TurnBased};
use crate::session::{Session, SessionKey, SessionRegistry, SessionStore};
use rand::Rng;

/// What became of a submitted action.
#[derive(Debug)]
pub enum Submission<G> {
    /// No live session under that key. Late clicks on finished games end
    /// up here.
    Ignored,
    Rejected(MoveError),
    /// Accepted; the game goes on. `bot_next` is set when the built-in
    /// opponent must act next.
    Continued { bot_next: bool },
    /// Accepted and terminal. The session has left the registry.
    Finished(Box<Session<G>>, Outcome),
}

impl<G> Submission<G> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Submission::Continued { .. } | Submission::Finished(..))
    }
}

/// Applies `action` on behalf of `actor` to the session under `key`.
pub fn submit<G, S>(
    registry: &mut SessionRegistry<G, S>,
    key: SessionKey,
    actor: Actor,
    action: &G::Action,
) -> Submission<G>
where
    G: TurnBased,
    S: SessionStore<G>,
{
    let session = match registry.get_mut(key) {
        Some(session) => session,
        None => return Submission::Ignored,
    };

    // setup steps (placing ships, joining a lobby) do not start the clock
    let in_play = session.game.phase() == Phase::Playing;
    match session.game.apply(actor, action) {
        Err(e) => {
            log::debug!("{} rejected {:?} from {:?}: {}", key, action, actor, e);
            Submission::Rejected(e)
        }
        Ok(Progress::Continue) => {
            log::debug!("{} accepted {:?} from {:?}", key, action, actor);
            if in_play {
                session.mark_started();
            }
            Submission::Continued {
                bot_next: session.game.to_move() == Some(Actor::Bot),
            }
        }
        Ok(Progress::Over(outcome)) => {
            log::debug!("{} finished with {:?} after {:?}", key, outcome, action);
            if in_play {
                session.mark_started();
            }
            match registry.close(key) {
                Some(session) => Submission::Finished(Box::new(session), outcome),
                None => Submission::Ignored,
            }
        }
    }
}

/// Lets the built-in opponent act once, through the same path as a human.
pub fn play_bot<G, S, R>(registry: &mut SessionRegistry<G, S>, key: SessionKey, rng: &mut R) -> Submission<G>
where
    G: TurnBased,
    S: SessionStore<G>,
    R: Rng,
{
    let action = match registry.get(key).and_then(|s| s.game.bot_action(rng)) {
        Some(action) => action,
        None => return Submission::Ignored,
    };
    log::debug!("{} bot plays {:?}", key, action);
    submit(registry, key, Actor::Bot, &action)
}

/// Ends a session from outside (timeout, `stop`). Returns the removed
/// session, or `None` if it was already gone.
pub fn expire<G, S>(registry: &mut SessionRegistry<G, S>, key: SessionKey) -> Option<Session<G>>
where
    G: TurnBased,
    S: SessionStore<G>,
{
    let mut session = registry.close(key)?;
    session.game.expire();
    log::info!("{} expired", key);
    Some(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::tictactoe::TicTacToe;
    use crate::games::battleship::{self, Battleship};
    use crate::games::Difficulty;
    use rand::{rngs::StdRng, SeedableRng};

    const ALICE: Actor = Actor::User(1);
    const BOB: Actor = Actor::User(2);

    fn registry_with(games: &[(u64, TicTacToe)]) -> SessionRegistry<TicTacToe> {
        let mut registry = SessionRegistry::new();
        for (key, game) in games {
            registry
                .open(SessionKey(*key), Session::new(game.clone(), 1, ALICE))
                .unwrap();
        }
        registry
    }

    #[test]
    fn unknown_sessions_are_ignored() {
        let mut registry: SessionRegistry<TicTacToe> = SessionRegistry::new();
        assert!(matches!(submit(&mut registry, SessionKey(1), ALICE, &0), Submission::Ignored));
        assert!(matches!(
            play_bot(&mut registry, SessionKey(1), &mut StdRng::seed_from_u64(0)),
            Submission::Ignored
        ));
        assert!(expire(&mut registry, SessionKey(1)).is_none());
    }

    #[test]
    fn sessions_do_not_leak_into_each_other() {
        let mut registry = registry_with(&[
            (1, TicTacToe::new(ALICE, BOB, Difficulty::Easy)),
            (2, TicTacToe::new(BOB, ALICE, Difficulty::Easy)),
        ]);
        assert!(submit(&mut registry, SessionKey(1), ALICE, &4).is_accepted());
        assert!(matches!(
            submit(&mut registry, SessionKey(2), ALICE, &4),
            Submission::Rejected(MoveError::OutOfTurn)
        ));
        assert!(submit(&mut registry, SessionKey(2), BOB, &4).is_accepted());
        let first = &registry.get(SessionKey(1)).unwrap().game;
        let second = &registry.get(SessionKey(2)).unwrap().game;
        assert_eq!(first.to_move(), Some(BOB));
        assert_eq!(second.to_move(), Some(ALICE));
    }

    #[test]
    fn first_accepted_move_starts_the_clock() {
        let mut registry = registry_with(&[(1, TicTacToe::new(ALICE, BOB, Difficulty::Easy))]);
        submit(&mut registry, SessionKey(1), BOB, &0);
        assert!(registry.get(SessionKey(1)).unwrap().started_at.is_none());
        submit(&mut registry, SessionKey(1), ALICE, &0);
        assert!(registry.get(SessionKey(1)).unwrap().started_at.is_some());
    }

    #[test]
    fn setup_steps_do_not_start_the_clock() {
        let mut rng = StdRng::seed_from_u64(3);
        let game = Battleship::new(ALICE, BOB, Difficulty::Easy, &mut rng);
        let mut registry = SessionRegistry::new();
        registry.open(SessionKey(1), Session::new(game, 1, ALICE)).unwrap();

        for actor in [ALICE, BOB] {
            let game = &registry.get(SessionKey(1)).unwrap().game;
            let slot = game.players().slot_of(actor).unwrap();
            let layout = game.side(slot).fleet.random_layout(&mut rng);
            assert!(submit(&mut registry, SessionKey(1), actor, &battleship::Action::PlaceAll(layout)).is_accepted());
            assert!(submit(&mut registry, SessionKey(1), actor, &battleship::Action::Ready).is_accepted());
        }
        let session = registry.get(SessionKey(1)).unwrap();
        assert_eq!(session.game.phase(), Phase::Playing);
        assert!(session.started_at.is_none());

        let shooter = session.game.to_move().unwrap();
        let shot = battleship::Action::Fire("A1".parse().unwrap());
        assert!(submit(&mut registry, SessionKey(1), shooter, &shot).is_accepted());
        assert!(registry.get(SessionKey(1)).unwrap().started_at.is_some());
    }

    #[test]
    fn terminal_move_removes_the_session() {
        let mut registry = registry_with(&[(1, TicTacToe::new(ALICE, BOB, Difficulty::Easy))]);
        for (actor, cell) in [(ALICE, 0), (BOB, 3), (ALICE, 1), (BOB, 4)] {
            assert!(matches!(
                submit(&mut registry, SessionKey(1), actor, &cell),
                Submission::Continued { bot_next: false }
            ));
        }
        match submit(&mut registry, SessionKey(1), ALICE, &2) {
            Submission::Finished(session, outcome) => {
                assert_eq!(outcome, Outcome::Won(ALICE));
                assert_eq!(session.game.winning_line(), Some([0, 1, 2]));
            }
            other => panic!("expected a finished game, got {other:?}"),
        }
        assert!(!registry.contains(SessionKey(1)));
        assert!(matches!(submit(&mut registry, SessionKey(1), BOB, &5), Submission::Ignored));
    }

    #[test]
    fn human_cannot_move_while_bot_is_pending() {
        let mut registry = registry_with(&[(1, TicTacToe::new(ALICE, Actor::Bot, Difficulty::Hard))]);
        assert!(matches!(
            submit(&mut registry, SessionKey(1), ALICE, &0),
            Submission::Continued { bot_next: true }
        ));
        assert!(matches!(
            submit(&mut registry, SessionKey(1), ALICE, &1),
            Submission::Rejected(MoveError::OutOfTurn)
        ));
        let mut rng = StdRng::seed_from_u64(5);
        assert!(matches!(
            play_bot(&mut registry, SessionKey(1), &mut rng),
            Submission::Continued { bot_next: false }
        ));
        assert!(matches!(play_bot(&mut registry, SessionKey(1), &mut rng), Submission::Ignored));
    }

    #[test]
    fn turns_alternate_until_the_end() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut registry = registry_with(&[(1, TicTacToe::new(ALICE, Actor::Bot, Difficulty::Medium))]);
        let mut previous = None;
        loop {
            let session = registry.get(SessionKey(1)).unwrap();
            let actor = session.game.to_move().unwrap();
            assert_ne!(Some(actor), previous);
            previous = Some(actor);
            let result = if actor == Actor::Bot {
                play_bot(&mut registry, SessionKey(1), &mut rng)
            } else {
                let cell = session.game.legal_cells()[0];
                submit(&mut registry, SessionKey(1), actor, &cell)
            };
            match result {
                Submission::Continued { .. } => continue,
                Submission::Finished(..) => break,
                other => panic!("unexpected {other:?}"),
            }
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn expiry_marks_and_removes() {
        let mut registry = registry_with(&[(1, TicTacToe::new(ALICE, BOB, Difficulty::Easy))]);
        let session = expire(&mut registry, SessionKey(1)).unwrap();
        assert_eq!(session.game.phase(), Phase::Terminal(Outcome::TimedOut));
        assert!(expire(&mut registry, SessionKey(1)).is_none());
    }
}
