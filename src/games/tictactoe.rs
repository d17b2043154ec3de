use super::{ensure_turn, Actor, Difficulty, MoveError, Outcome, Pair, Phase, PlayerSlot, Progress, TurnBased};
use rand::{seq::SliceRandom, Rng, RngCore};
use smallvec::SmallVec;

pub const CELLS: usize = 9;

/// The eight triples that win: rows, columns, diagonals.
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

const CENTER: usize = 4;
const CORNERS: [usize; 4] = [0, 2, 6, 8];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn of(slot: PlayerSlot) -> Mark {
        match slot {
            PlayerSlot::First => Mark::X,
            PlayerSlot::Second => Mark::O,
        }
    }

    pub fn other(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

pub type Board = [Option<Mark>; CELLS];

type Cells = SmallVec<[usize; CELLS]>;

#[derive(Debug, Clone)]
pub struct TicTacToe {
    board: Board,
    players: Pair<Actor>,
    current: PlayerSlot,
    difficulty: Difficulty,
    phase: Phase,
    winning_line: Option<[usize; 3]>,
}

impl TicTacToe {
    /// `first` plays X and moves first.
    pub fn new(first: Actor, second: Actor, difficulty: Difficulty) -> Self {
        TicTacToe {
            board: [None; CELLS],
            players: Pair::new(first, second),
            current: PlayerSlot::First,
            difficulty,
            phase: Phase::Playing,
            winning_line: None,
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

    pub fn winning_line(&self) -> Option<[usize; 3]> {
        self.winning_line
    }

    pub fn legal_cells(&self) -> Cells {
        legal_cells(&self.board)
    }

    fn choose_cell(&self, me: Mark, difficulty: Difficulty, rng: &mut dyn RngCore) -> Option<usize> {
        let mut tier = Some(difficulty);
        while let Some(d) = tier {
            if let Some(cell) = strategy(d)(&self.board, me, rng) {
                return Some(cell);
            }
            tier = d.lower();
        }
        None
    }
}

fn legal_cells(board: &Board) -> Cells {
    (0..CELLS).filter(|&i| board[i].is_none()).collect()
}

/// The first line held entirely by one mark.
pub fn winner(board: &Board) -> Option<(Mark, [usize; 3])> {
    LINES.iter().find_map(|&line| {
        let [a, b, c] = line;
        match board[a] {
            Some(m) if board[b] == Some(m) && board[c] == Some(m) => Some((m, line)),
            _ => None,
        }
    })
}

pub fn is_full(board: &Board) -> bool {
    board.iter().all(Option::is_some)
}

type Strategy = fn(&Board, Mark, &mut dyn RngCore) -> Option<usize>;

fn strategy(difficulty: Difficulty) -> Strategy {
    match difficulty {
        Difficulty::Easy => random_cell,
        Difficulty::Medium => winning_cell,
        Difficulty::Hard => hard_cell,
    }
}

fn random_cell(board: &Board, _me: Mark, rng: &mut dyn RngCore) -> Option<usize> {
    legal_cells(board).choose(rng).copied()
}

fn winning_cell(board: &Board, me: Mark, _rng: &mut dyn RngCore) -> Option<usize> {
    completing_cell(board, me)
}

/// A free cell that would give `mark` a full line.
fn completing_cell(board: &Board, mark: Mark) -> Option<usize> {
    legal_cells(board).into_iter().find(|&cell| {
        let mut next = *board;
        next[cell] = Some(mark);
        winner(&next).is_some()
    })
}

fn hard_cell(board: &Board, me: Mark, rng: &mut dyn RngCore) -> Option<usize> {
    completing_cell(board, me)
        .or_else(|| completing_cell(board, me.other()))
        .or_else(|| board[CENTER].is_none().then_some(CENTER))
        .or_else(|| {
            let free: Cells = CORNERS.iter().copied().filter(|&c| board[c].is_none()).collect();
            free.choose(rng).copied()
        })
}

impl TurnBased for TicTacToe {
    type Action = usize;

    fn phase(&self) -> Phase {
        self.phase
    }

    fn to_move(&self) -> Option<Actor> {
        (self.phase == Phase::Playing).then(|| *self.players.get(self.current))
    }

    fn apply(&mut self, actor: Actor, &cell: &usize) -> Result<Progress, MoveError> {
        let slot = ensure_turn(&self.players, self.current, self.phase, actor)?;
        if cell >= CELLS {
            return Err(MoveError::OutOfBounds);
        }
        if self.board[cell].is_some() {
            return Err(MoveError::Occupied);
        }
        self.board[cell] = Some(Mark::of(slot));

        if let Some((_, line)) = winner(&self.board) {
            self.winning_line = Some(line);
            let outcome = Outcome::Won(actor);
            self.phase = Phase::Terminal(outcome);
            return Ok(Progress::Over(outcome));
        }
        if is_full(&self.board) {
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
        self.choose_cell(Mark::of(self.current), self.difficulty, rng)
    }

    fn expire(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = Phase::Terminal(Outcome::TimedOut);
        }
    }
}
