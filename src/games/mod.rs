//! Pure game engines. Nothing in here knows about Discord: every engine takes
//! actors and actions, validates them, mutates its own state and reports what
//! happened.

pub mod battleship;
pub mod connect4;
pub mod hangman;
pub mod tictactoe;
pub mod yams;

use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// Someone taking part in a game. `Bot` is the sentinel for the built-in
/// opponent: no external input will ever arrive for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Actor {
    User(u64),
    Bot,
}

impl Actor {
    pub fn is_bot(self) -> bool {
        self == Actor::Bot
    }
}

/// Index into a two-player game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerSlot {
    First,
    Second,
}

impl PlayerSlot {
    pub fn other(self) -> Self {
        match self {
            PlayerSlot::First => PlayerSlot::Second,
            PlayerSlot::Second => PlayerSlot::First,
        }
    }

    pub fn index(self) -> usize {
        match self {
            PlayerSlot::First => 0,
            PlayerSlot::Second => 1,
        }
    }
}

/// The two participants of a head-to-head game, addressed by slot instead of
/// by comparing ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pair<T>(pub [T; 2]);

impl<T> Pair<T> {
    pub fn new(first: T, second: T) -> Self {
        Pair([first, second])
    }

    pub fn get(&self, slot: PlayerSlot) -> &T {
        &self.0[slot.index()]
    }

    pub fn get_mut(&mut self, slot: PlayerSlot) -> &mut T {
        &mut self.0[slot.index()]
    }
}

impl Pair<Actor> {
    /// The slot `actor` plays in, if any.
    pub fn slot_of(&self, actor: Actor) -> Option<PlayerSlot> {
        if self.0[0] == actor {
            Some(PlayerSlot::First)
        } else if self.0[1] == actor {
            Some(PlayerSlot::Second)
        } else {
            None
        }
    }

    pub fn has_bot(&self) -> bool {
        self.0.iter().any(|a| a.is_bot())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// The tier a strategy falls back to when it finds nothing to do.
    pub fn lower(self) -> Option<Difficulty> {
        match self {
            Difficulty::Hard => Some(Difficulty::Medium),
            Difficulty::Medium => Some(Difficulty::Easy),
            Difficulty::Easy => None,
        }
    }
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" | "facile" => Ok(Difficulty::Easy),
            "medium" | "normal" | "moyen" => Ok(Difficulty::Medium),
            "hard" | "difficile" => Ok(Difficulty::Hard),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        })
    }
}

/// How a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won(Actor),
    Draw,
    /// A single player lost against the game itself (hangman solo).
    Lost,
    /// Multi-round games that end on a score table.
    Finished,
    TimedOut,
}

/// Top level lifecycle shared by every engine. Sub-phases of setup (ship
/// placement, word choice) live in the engines themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Setup,
    Playing,
    Terminal(Outcome),
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Terminal(_))
    }
}

/// Why a move was refused. Every message is meant to be shown to the player.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("it is not your turn")]
    OutOfTurn,
    #[error("you are not playing in this game")]
    NotAParticipant,
    #[error("the game is not accepting moves right now")]
    NotPlaying,
    #[error("that cell is already taken")]
    Occupied,
    #[error("that position is off the board")]
    OutOfBounds,
    #[error("that column is full")]
    ColumnFull,
    #[error("that letter was already guessed")]
    AlreadyGuessed,
    #[error("you already fired at that cell")]
    AlreadyFired,
    #[error("that ship would overlap another ship")]
    Overlap,
    #[error("that ship is already placed")]
    ShipAlreadyPlaced,
    #[error("place your whole fleet first")]
    FleetIncomplete,
    #[error("no rolls left this turn")]
    NoRollsLeft,
    #[error("roll the dice first")]
    MustRollFirst,
    #[error("that category is already filled")]
    CategoryFilled,
    #[error("the word master cannot guess")]
    WordMasterCannotGuess,
    #[error("the word must be 3 to 20 letters A-Z")]
    InvalidWord,
    #[error("you already joined this game")]
    AlreadyJoined,
    #[error("this game is full")]
    LobbyFull,
    #[error("not enough players to start")]
    NotEnoughPlayers,
    #[error("only the player who opened the game can do that")]
    NotHost,
    #[error("could not understand `{0}`")]
    InvalidInput(String),
}

/// What an accepted move did to the game, as far as the coordinator cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Still going, possibly with a different player to act.
    Continue,
    /// The move ended the game.
    Over(Outcome),
}

/// The seam between an engine and the turn coordinator.
pub trait TurnBased {
    type Action: Clone + fmt::Debug + Send + Sync;

    fn phase(&self) -> Phase;

    /// The actor expected to act next, `None` while waiting on several
    /// actors at once (setup) or once the game is over.
    fn to_move(&self) -> Option<Actor>;

    /// Validates and applies `action` for `actor`. On error nothing changed.
    fn apply(&mut self, actor: Actor, action: &Self::Action) -> Result<Progress, MoveError>;

    /// The built-in opponent's next action, or `None` when it is not the
    /// bot's turn. Returned actions are always legal.
    fn bot_action<R: Rng>(&self, rng: &mut R) -> Option<Self::Action>;

    /// Ends the game from outside, e.g. when a timer expires.
    fn expire(&mut self);
}

/// Shared turn check for engines that keep a current slot.
pub(crate) fn ensure_turn(
    players: &Pair<Actor>,
    current: PlayerSlot,
    phase: Phase,
    actor: Actor,
) -> Result<PlayerSlot, MoveError> {
    if phase != Phase::Playing {
        return Err(MoveError::NotPlaying);
    }
    let slot = players.slot_of(actor).ok_or(MoveError::NotAParticipant)?;
    if slot != current {
        return Err(MoveError::OutOfTurn);
    }
    Ok(slot)
}
