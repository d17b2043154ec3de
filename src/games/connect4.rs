use super::{ensure_turn, Actor, Difficulty, MoveError, Outcome, Pair, Phase, PlayerSlot, Progress, TurnBased};
use itertools::Itertools;
use rand::{seq::SliceRandom, Rng, RngCore};
use smallvec::SmallVec;

pub const COLUMNS: usize = 7;
pub const ROWS: usize = 6;

pub const RED_PIECE: char = '🔴';
pub const YELLOW_PIECE: char = '🟡';
pub const BLANK_CELL: char = '⚫';

/// Axis directions scanned from the last piece: horizontal, vertical and
/// both diagonals. Each is walked both ways.
const AXES: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameCell {
    Empty,
    Red,
    Yellow,
}

impl GameCell {
    fn of(slot: PlayerSlot) -> GameCell {
        match slot {
            PlayerSlot::First => GameCell::Red,
            PlayerSlot::Second => GameCell::Yellow,
        }
    }
}

impl std::fmt::Display for GameCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                GameCell::Empty => BLANK_CELL,
                GameCell::Red => RED_PIECE,
                GameCell::Yellow => YELLOW_PIECE,
            }
        )
    }
}

/// Columns of cells, row 0 at the top.
pub type Board = [[GameCell; ROWS]; COLUMNS];

type Columns = SmallVec<[usize; COLUMNS]>;

/// Represents a game in progress. Red (the first slot) moves first.
#[derive(Debug, Clone)]
pub struct Connect4 {
    board: Board,
    players: Pair<Actor>,
    current: PlayerSlot,
    difficulty: Difficulty,
    phase: Phase,
    last_drop: Option<(usize, usize)>,
}

impl Connect4 {
    pub fn new(red: Actor, yellow: Actor, difficulty: Difficulty) -> Self {
        Connect4 {
            board: [[GameCell::Empty; ROWS]; COLUMNS],
            players: Pair::new(red, yellow),
            current: PlayerSlot::First,
            difficulty,
            phase: Phase::Playing,
            last_drop: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn players(&self) -> &Pair<Actor> {
        &self.players
    }

    pub fn current(&self) -> PlayerSlot {
        self.current
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Column and row of the most recent piece.
    pub fn last_drop(&self) -> Option<(usize, usize)> {
        self.last_drop
    }

    pub fn is_column_open(&self, column: usize) -> bool {
        column < COLUMNS && landing_row(&self.board, column).is_some()
    }

    pub fn open_columns(&self) -> Columns {
        open_columns(&self.board)
    }
}

/// Lowest empty row of `column`.
pub fn landing_row(board: &Board, column: usize) -> Option<usize> {
    board[column].iter().rposition(|&c| c == GameCell::Empty)
}

fn open_columns(board: &Board) -> Columns {
    (0..COLUMNS).filter(|&c| landing_row(board, c).is_some()).collect()
}

/// Whether the piece at (`column`, `row`) is part of four or more in a row.
pub fn wins_from(board: &Board, column: usize, row: usize) -> bool {
    let piece = board[column][row];
    if piece == GameCell::Empty {
        return false;
    }
    let run = |dc: isize, dr: isize| {
        (1..)
            .map(|step| (column as isize + dc * step, row as isize + dr * step))
            .take_while(|&(c, r)| {
                (0..COLUMNS as isize).contains(&c)
                    && (0..ROWS as isize).contains(&r)
                    && board[c as usize][r as usize] == piece
            })
            .count()
    };
    AXES.iter().any(|&(dc, dr)| 1 + run(dc, dr) + run(-dc, -dr) >= 4)
}

/// Would dropping `piece` into `column` connect four?
fn drop_wins(board: &Board, column: usize, piece: GameCell) -> bool {
    match landing_row(board, column) {
        Some(row) => {
            let mut next = *board;
            next[column][row] = piece;
            wins_from(&next, column, row)
        }
        None => false,
    }
}

fn winning_column(board: &Board, piece: GameCell) -> Option<usize> {
    open_columns(board).into_iter().find(|&c| drop_wins(board, c, piece))
}

fn opponent(piece: GameCell) -> GameCell {
    match piece {
        GameCell::Red => GameCell::Yellow,
        _ => GameCell::Red,
    }
}

type Strategy = fn(&Board, GameCell, &mut dyn RngCore) -> Option<usize>;

fn strategy(difficulty: Difficulty) -> Strategy {
    match difficulty {
        Difficulty::Easy => random_column,
        Difficulty::Medium => medium_column,
        Difficulty::Hard => hard_column,
    }
}

fn random_column(board: &Board, _me: GameCell, rng: &mut dyn RngCore) -> Option<usize> {
    open_columns(board).choose(rng).copied()
}

fn medium_column(board: &Board, me: GameCell, _rng: &mut dyn RngCore) -> Option<usize> {
    winning_column(board, me)
}

fn hard_column(board: &Board, me: GameCell, rng: &mut dyn RngCore) -> Option<usize> {
    if let Some(column) = winning_column(board, me).or_else(|| winning_column(board, opponent(me))) {
        return Some(column);
    }

    // Do not hand the opponent the cell right above our piece.
    let safe: Columns = open_columns(board)
        .into_iter()
        .filter(|&c| {
            let mut next = *board;
            match landing_row(board, c) {
                Some(row) => next[c][row] = me,
                None => return false,
            }
            !drop_wins(&next, c, opponent(me))
        })
        .collect();

    let center = COLUMNS / 2;
    let nearest: Columns = safe
        .into_iter()
        .min_set_by_key(|&c| c.abs_diff(center))
        .into_iter()
        .collect();
    nearest.choose(rng).copied()
}

impl TurnBased for Connect4 {
    type Action = usize;

    fn phase(&self) -> Phase {
        self.phase
    }

    fn to_move(&self) -> Option<Actor> {
        (self.phase == Phase::Playing).then(|| *self.players.get(self.current))
    }

    /// The current player places a piece in `column`.
    fn apply(&mut self, actor: Actor, &column: &usize) -> Result<Progress, MoveError> {
        let slot = ensure_turn(&self.players, self.current, self.phase, actor)?;
        if column >= COLUMNS {
            return Err(MoveError::OutOfBounds);
        }
        let row = landing_row(&self.board, column).ok_or(MoveError::ColumnFull)?;
        self.board[column][row] = GameCell::of(slot);
        self.last_drop = Some((column, row));

        if wins_from(&self.board, column, row) {
            let outcome = Outcome::Won(actor);
            self.phase = Phase::Terminal(outcome);
            return Ok(Progress::Over(outcome));
        }
        if open_columns(&self.board).is_empty() {
            self.phase = Phase::Terminal(Outcome::Draw);
            return Ok(Progress::Over(Outcome::Draw));
        }
        self.current = slot.other();
        Ok(Progress::Continue)
    }

    fn bot_action<R: Rng>(&self, rng: &mut R) -> Option<usize> {
        if self.to_move() != Some(Actor::Bot) {
            return None;
        }
        let me = GameCell::of(self.current);
        let rng: &mut dyn RngCore = rng;
        let mut tier = Some(self.difficulty);
        while let Some(d) = tier {
            if let Some(column) = strategy(d)(&self.board, me, rng) {
                return Some(column);
            }
            tier = d.lower();
        }
        None
    }

    fn expire(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = Phase::Terminal(Outcome::TimedOut);
        }
    }
}
