//! Battleship on a 10x10 grid.
//!
//! A game starts in [`Phase::Setup`] where both sides place their fleet (in any
//! order, without turns) and declare themselves ready. The bot's fleet is laid
//! out randomly when the game is created. Once both sides are ready the game
//! moves to [`Phase::Playing`] and players fire in turn at the opponent's
//! grid until one fleet is entirely sunk.

use super::{ensure_turn, Actor, Difficulty, MoveError, Outcome, Pair, Phase, PlayerSlot, Progress, TurnBased};
use itertools::iproduct;
use rand::{seq::SliceRandom, Rng, RngCore};
use std::fmt;
use std::str::FromStr;

pub const SIZE: usize = 10;

/// Heat added to a cell for every confirmed hit around it.
pub const HEAT_PER_HIT: u32 = 3;

/// A cell of the grid. Rows are lettered `A`..`J`, columns numbered `1`..`10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Result<Coord, MoveError> {
        if row >= SIZE || col >= SIZE {
            return Err(MoveError::OutOfBounds);
        }
        Ok(Coord { row, col })
    }

    fn offset(self, dr: isize, dc: isize) -> Option<Coord> {
        let row = self.row.checked_add_signed(dr)?;
        let col = self.col.checked_add_signed(dc)?;
        Coord::new(row, col).ok()
    }

    /// Up, down, left, right.
    pub fn orthogonal(self) -> impl Iterator<Item = Coord> {
        [(-1, 0), (1, 0), (0, -1), (0, 1)]
            .into_iter()
            .filter_map(move |(dr, dc)| self.offset(dr, dc))
    }

    /// All eight surrounding cells, diagonals included.
    pub fn surrounding(self) -> impl Iterator<Item = Coord> {
        iproduct!(-1isize..=1, -1isize..=1)
            .filter(|&d| d != (0, 0))
            .filter_map(move |(dr, dc)| self.offset(dr, dc))
    }

    pub fn all() -> impl Iterator<Item = Coord> {
        iproduct!(0..SIZE, 0..SIZE).map(|(row, col)| Coord { row, col })
    }
}

/// Whether a chat message is shaped like a cell reference (a letter then
/// digits), even one that is off the board.
pub fn looks_like_coord(text: &str) -> bool {
    let mut chars = text.trim().chars();
    match chars.next() {
        Some(letter) if letter.is_ascii_alphabetic() => {
            let rest = chars.as_str();
            !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit())
        }
        _ => false,
    }
}

impl FromStr for Coord {
    type Err = MoveError;

    /// Parses `B7`, `j10`, ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MoveError::InvalidInput(s.to_string());
        let s = s.trim();
        let mut chars = s.chars();
        let letter = chars.next().ok_or_else(invalid)?.to_ascii_uppercase();
        if !letter.is_ascii_uppercase() {
            return Err(invalid());
        }
        let digits = chars.as_str();
        let well_formed = matches!(digits.len(), 1 | 2)
            && digits.bytes().all(|b| b.is_ascii_digit())
            && !(digits.len() == 2 && digits.starts_with('0'));
        if !well_formed {
            return Err(invalid());
        }
        let number: usize = digits.parse().map_err(|_| invalid())?;
        let row = (letter as u8 - b'A') as usize;
        if number == 0 {
            return Err(MoveError::OutOfBounds);
        }
        Coord::new(row, number - 1)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'A' + self.row as u8) as char, self.col + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl FromStr for Orientation {
    type Err = MoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "h" | "horizontal" => Ok(Orientation::Horizontal),
            "v" | "vertical" => Ok(Orientation::Vertical),
            _ => Err(MoveError::InvalidInput(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShipKind {
    Carrier,
    Battleship,
    Cruiser,
    Submarine,
    Destroyer,
}

impl ShipKind {
    pub const FLEET: [ShipKind; 5] = [
        ShipKind::Carrier,
        ShipKind::Battleship,
        ShipKind::Cruiser,
        ShipKind::Submarine,
        ShipKind::Destroyer,
    ];

    pub fn len(self) -> usize {
        match self {
            ShipKind::Carrier => 5,
            ShipKind::Battleship => 4,
            ShipKind::Cruiser | ShipKind::Submarine => 3,
            ShipKind::Destroyer => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShipKind::Carrier => "Carrier",
            ShipKind::Battleship => "Battleship",
            ShipKind::Cruiser => "Cruiser",
            ShipKind::Submarine => "Submarine",
            ShipKind::Destroyer => "Destroyer",
        }
    }
}

impl FromStr for ShipKind {
    type Err = MoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ShipKind::FLEET
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| MoveError::InvalidInput(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub kind: ShipKind,
    pub at: Coord,
    pub orientation: Orientation,
}

impl Placement {
    /// Cells the ship would cover, or `OutOfBounds` if it sticks out.
    pub fn cells(&self) -> Result<Vec<Coord>, MoveError> {
        let (dr, dc) = match self.orientation {
            Orientation::Horizontal => (0, 1),
            Orientation::Vertical => (1, 0),
        };
        (0..self.kind.len())
            .map(|i| Coord::new(self.at.row + dr * i, self.at.col + dc * i))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ship {
    pub kind: ShipKind,
    pub cells: Vec<Coord>,
    pub hits: usize,
}

impl Ship {
    pub fn remaining(&self) -> usize {
        self.cells.len() - self.hits
    }

    pub fn is_sunk(&self) -> bool {
        self.remaining() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotResult {
    Miss,
    Hit,
    Sunk(ShipKind),
}

/// One side's own ships and the shots it has received.
#[derive(Debug, Clone)]
pub struct Fleet {
    ships: Vec<Ship>,
    occupied: [[Option<usize>; SIZE]; SIZE],
    received: [[bool; SIZE]; SIZE],
}

impl Default for Fleet {
    fn default() -> Self {
        Fleet {
            ships: Vec::new(),
            occupied: [[None; SIZE]; SIZE],
            received: [[false; SIZE]; SIZE],
        }
    }
}

impl Fleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    pub fn ship_at(&self, at: Coord) -> Option<&Ship> {
        self.occupied[at.row][at.col].map(|i| &self.ships[i])
    }

    pub fn was_shot(&self, at: Coord) -> bool {
        self.received[at.row][at.col]
    }

    pub fn is_placed(&self, kind: ShipKind) -> bool {
        self.ships.iter().any(|s| s.kind == kind)
    }

    pub fn unplaced(&self) -> impl Iterator<Item = ShipKind> + '_ {
        ShipKind::FLEET.into_iter().filter(|&k| !self.is_placed(k))
    }

    pub fn is_complete(&self) -> bool {
        self.unplaced().next().is_none()
    }

    /// Checks `placement` without placing it.
    pub fn check(&self, placement: &Placement) -> Result<Vec<Coord>, MoveError> {
        if self.is_placed(placement.kind) {
            return Err(MoveError::ShipAlreadyPlaced);
        }
        let cells = placement.cells()?;
        if cells.iter().any(|c| self.occupied[c.row][c.col].is_some()) {
            return Err(MoveError::Overlap);
        }
        Ok(cells)
    }

    pub fn place(&mut self, placement: &Placement) -> Result<(), MoveError> {
        let cells = self.check(placement)?;
        let index = self.ships.len();
        for c in &cells {
            self.occupied[c.row][c.col] = Some(index);
        }
        self.ships.push(Ship {
            kind: placement.kind,
            cells,
            hits: 0,
        });
        Ok(())
    }

    /// Random legal positions for every ship not placed yet.
    pub fn random_layout<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Placement> {
        let mut scratch = self.clone();
        let mut layout = Vec::new();
        for kind in self.unplaced().collect::<Vec<_>>() {
            let candidates: Vec<Placement> = Coord::all()
                .flat_map(|at| {
                    [Orientation::Horizontal, Orientation::Vertical]
                        .map(|orientation| Placement { kind, at, orientation })
                })
                .filter(|p| scratch.check(p).is_ok())
                .collect();
            // An empty 10x10 grid always has room for the standard fleet,
            // but a hand-made partial layout may not.
            let Some(&placement) = candidates.choose(rng) else {
                break;
            };
            if scratch.place(&placement).is_ok() {
                layout.push(placement);
            }
        }
        layout
    }

    /// Registers an incoming shot. The caller guarantees `at` was not shot
    /// before.
    pub fn receive_shot(&mut self, at: Coord) -> ShotResult {
        self.received[at.row][at.col] = true;
        match self.occupied[at.row][at.col] {
            Some(index) => {
                let ship = &mut self.ships[index];
                ship.hits += 1;
                if ship.is_sunk() {
                    ShotResult::Sunk(ship.kind)
                } else {
                    ShotResult::Hit
                }
            }
            None => ShotResult::Miss,
        }
    }

    /// True once no placed ship has an unhit cell left.
    pub fn all_sunk(&self) -> bool {
        !self.ships.is_empty() && self.ships.iter().all(Ship::is_sunk)
    }
}

/// What a side knows about the opponent's grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Unknown,
    Hit,
    Miss,
}

pub type Tracking = [[Mark; SIZE]; SIZE];

#[derive(Debug, Clone)]
pub struct Side {
    pub fleet: Fleet,
    pub tracking: Tracking,
    pub ready: bool,
}

impl Default for Side {
    fn default() -> Self {
        Side {
            fleet: Fleet::new(),
            tracking: [[Mark::Unknown; SIZE]; SIZE],
            ready: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Place(Placement),
    /// Several placements applied all-or-nothing, e.g. a random layout.
    PlaceAll(Vec<Placement>),
    Ready,
    Fire(Coord),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotReport {
    pub shooter: Actor,
    pub at: Coord,
    pub result: ShotResult,
}

#[derive(Debug, Clone)]
pub struct Battleship {
    players: Pair<Actor>,
    sides: Pair<Side>,
    current: PlayerSlot,
    difficulty: Difficulty,
    phase: Phase,
    last_shot: Option<ShotReport>,
}

impl Battleship {
    /// Creates a game in setup. A bot participant gets a random fleet and is
    /// ready immediately.
    pub fn new<R: Rng>(first: Actor, second: Actor, difficulty: Difficulty, rng: &mut R) -> Self {
        let players = Pair::new(first, second);
        let mut sides = Pair::new(Side::default(), Side::default());
        for slot in [PlayerSlot::First, PlayerSlot::Second] {
            if players.get(slot).is_bot() {
                let side = sides.get_mut(slot);
                for placement in side.fleet.random_layout(rng) {
                    // Generated against the same fleet, cannot fail.
                    let _ = side.fleet.place(&placement);
                }
                side.ready = side.fleet.is_complete();
            }
        }
        Battleship {
            players,
            sides,
            current: PlayerSlot::First,
            difficulty,
            phase: Phase::Setup,
            last_shot: None,
        }
    }

    pub fn players(&self) -> &Pair<Actor> {
        &self.players
    }

    pub fn side(&self, slot: PlayerSlot) -> &Side {
        self.sides.get(slot)
    }

    pub fn current(&self) -> PlayerSlot {
        self.current
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn last_shot(&self) -> Option<ShotReport> {
        self.last_shot
    }

    /// Whether `slot` has sunk the whole opposing fleet.
    pub fn check_victory(&self, slot: PlayerSlot) -> bool {
        self.sides.get(slot.other()).fleet.all_sunk()
    }

    fn setup_action(&mut self, actor: Actor, action: &Action) -> Result<Progress, MoveError> {
        let slot = self.players.slot_of(actor).ok_or(MoveError::NotAParticipant)?;
        let side = self.sides.get_mut(slot);
        if side.ready {
            return Err(MoveError::NotPlaying);
        }
        match action {
            Action::Place(placement) => side.fleet.place(placement)?,
            Action::PlaceAll(placements) => {
                let mut fleet = side.fleet.clone();
                for placement in placements {
                    fleet.place(placement)?;
                }
                side.fleet = fleet;
            }
            Action::Ready => {
                if !side.fleet.is_complete() {
                    return Err(MoveError::FleetIncomplete);
                }
                side.ready = true;
                if self.sides.0.iter().all(|s| s.ready) {
                    self.phase = Phase::Playing;
                    self.current = PlayerSlot::First;
                }
            }
            Action::Fire(_) => return Err(MoveError::NotPlaying),
        }
        Ok(Progress::Continue)
    }

    fn fire(&mut self, actor: Actor, at: Coord) -> Result<Progress, MoveError> {
        let slot = ensure_turn(&self.players, self.current, self.phase, actor)?;
        if self.sides.get(slot).tracking[at.row][at.col] != Mark::Unknown {
            return Err(MoveError::AlreadyFired);
        }
        let result = self.sides.get_mut(slot.other()).fleet.receive_shot(at);
        self.sides.get_mut(slot).tracking[at.row][at.col] = match result {
            ShotResult::Miss => Mark::Miss,
            ShotResult::Hit | ShotResult::Sunk(_) => Mark::Hit,
        };
        self.last_shot = Some(ShotReport { shooter: actor, at, result });

        if self.check_victory(slot) {
            let outcome = Outcome::Won(actor);
            self.phase = Phase::Terminal(outcome);
            return Ok(Progress::Over(outcome));
        }
        self.current = slot.other();
        Ok(Progress::Continue)
    }
}

impl TurnBased for Battleship {
    type Action = Action;

    fn phase(&self) -> Phase {
        self.phase
    }

    fn to_move(&self) -> Option<Actor> {
        (self.phase == Phase::Playing).then(|| *self.players.get(self.current))
    }

    fn apply(&mut self, actor: Actor, action: &Action) -> Result<Progress, MoveError> {
        match (self.phase, action) {
            (Phase::Setup, _) => self.setup_action(actor, action),
            (Phase::Playing, Action::Fire(at)) => self.fire(actor, *at),
            (Phase::Playing, _) | (Phase::Terminal(_), _) => Err(MoveError::NotPlaying),
        }
    }

    fn bot_action<R: Rng>(&self, rng: &mut R) -> Option<Action> {
        if self.to_move() != Some(Actor::Bot) {
            return None;
        }
        let tracking = &self.sides.get(self.current).tracking;
        let rng: &mut dyn RngCore = rng;
        let mut tier = Some(self.difficulty);
        while let Some(d) = tier {
            if let Some(at) = strategy(d)(tracking, rng) {
                return Some(Action::Fire(at));
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

fn unknown_cells(tracking: &Tracking) -> impl Iterator<Item = Coord> + '_ {
    Coord::all().filter(move |c| tracking[c.row][c.col] == Mark::Unknown)
}

fn is_hit(tracking: &Tracking, at: Coord) -> bool {
    tracking[at.row][at.col] == Mark::Hit
}

/// Per-cell target weight: every unknown cell gets [`HEAT_PER_HIT`] for each
/// confirmed hit among its eight neighbours. Resolved cells stay at 0.
pub fn heat_map(tracking: &Tracking) -> [[u32; SIZE]; SIZE] {
    let mut heat = [[0; SIZE]; SIZE];
    for at in unknown_cells(tracking) {
        let hits = at.surrounding().filter(|&n| is_hit(tracking, n)).count() as u32;
        heat[at.row][at.col] = hits * HEAT_PER_HIT;
    }
    heat
}

type Strategy = fn(&Tracking, &mut dyn RngCore) -> Option<Coord>;

fn strategy(difficulty: Difficulty) -> Strategy {
    match difficulty {
        Difficulty::Easy => random_target,
        Difficulty::Medium => adjacent_target,
        Difficulty::Hard => hottest_target,
    }
}

fn random_target(tracking: &Tracking, rng: &mut dyn RngCore) -> Option<Coord> {
    unknown_cells(tracking).collect::<Vec<_>>().choose(rng).copied()
}

/// An unknown cell directly above, below, left or right of a hit.
fn adjacent_target(tracking: &Tracking, rng: &mut dyn RngCore) -> Option<Coord> {
    let targets: Vec<Coord> = unknown_cells(tracking)
        .filter(|c| c.orthogonal().any(|n| is_hit(tracking, n)))
        .collect();
    targets.choose(rng).copied()
}

/// Uniform pick among the cells of maximal heat, if any cell is warm.
fn hottest_target(tracking: &Tracking, rng: &mut dyn RngCore) -> Option<Coord> {
    let heat = heat_map(tracking);
    let max = unknown_cells(tracking).map(|c| heat[c.row][c.col]).max()?;
    if max == 0 {
        return None;
    }
    let hottest: Vec<Coord> = unknown_cells(tracking)
        .filter(|c| heat[c.row][c.col] == max)
        .collect();
    hottest.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    const ALICE: Actor = Actor::User(1);
    const BOB: Actor = Actor::User(2);

    fn coord(s: &str) -> Coord {
        s.parse().unwrap()
    }

    fn ready_game(rng: &mut StdRng) -> Battleship {
        let mut game = Battleship::new(ALICE, BOB, Difficulty::Medium, rng);
        for actor in [ALICE, BOB] {
            let slot = game.players().slot_of(actor).unwrap();
            let layout = game.side(slot).fleet.random_layout(rng);
            game.apply(actor, &Action::PlaceAll(layout)).unwrap();
            game.apply(actor, &Action::Ready).unwrap();
        }
        game
    }

    #[test]
    fn coordinates_parse_and_print() {
        assert_eq!(coord("A1"), Coord { row: 0, col: 0 });
        assert_eq!(coord(" j10 "), Coord { row: 9, col: 9 });
        assert_eq!(coord("B7").to_string(), "B7");
        assert_eq!("K1".parse::<Coord>(), Err(MoveError::OutOfBounds));
        assert_eq!("A11".parse::<Coord>(), Err(MoveError::OutOfBounds));
        assert_eq!("A0".parse::<Coord>(), Err(MoveError::OutOfBounds));
        assert!(matches!("7B".parse::<Coord>(), Err(MoveError::InvalidInput(_))));
        assert!(matches!("".parse::<Coord>(), Err(MoveError::InvalidInput(_))));
        assert!(matches!("A+5".parse::<Coord>(), Err(MoveError::InvalidInput(_))));
        assert!(matches!("A05".parse::<Coord>(), Err(MoveError::InvalidInput(_))));
        assert!(matches!("A100".parse::<Coord>(), Err(MoveError::InvalidInput(_))));
    }

    #[test]
    fn cell_shaped_messages() {
        for text in ["B7", "k5", "A11", "A0", " c3 "] {
            assert!(looks_like_coord(text), "{}", text);
        }
        for text in ["ok", "A", "7B", "A+5", "gg wp", ""] {
            assert!(!looks_like_coord(text), "{}", text);
        }
    }

    #[test]
    fn placement_rules() {
        let mut fleet = Fleet::new();
        let carrier = Placement {
            kind: ShipKind::Carrier,
            at: coord("A1"),
            orientation: Orientation::Horizontal,
        };
        fleet.place(&carrier).unwrap();
        assert_eq!(fleet.place(&carrier), Err(MoveError::ShipAlreadyPlaced));

        let crossing = Placement {
            kind: ShipKind::Cruiser,
            at: coord("A3"),
            orientation: Orientation::Vertical,
        };
        assert_eq!(fleet.place(&crossing), Err(MoveError::Overlap));

        let sticking_out = Placement {
            kind: ShipKind::Battleship,
            at: coord("H1"),
            orientation: Orientation::Vertical,
        };
        assert_eq!(fleet.place(&sticking_out), Err(MoveError::OutOfBounds));
        assert_eq!(fleet.ships().len(), 1);
        assert!(!fleet.is_complete());
    }

    #[test]
    fn victory_needs_every_ship_cell() {
        let mut fleet = Fleet::new();
        fleet
            .place(&Placement {
                kind: ShipKind::Destroyer,
                at: Coord::new(0, 0).unwrap(),
                orientation: Orientation::Horizontal,
            })
            .unwrap();
        assert_eq!(fleet.receive_shot(Coord::new(0, 0).unwrap()), ShotResult::Hit);
        assert!(!fleet.all_sunk());
        assert_eq!(fleet.receive_shot(Coord::new(0, 1).unwrap()), ShotResult::Sunk(ShipKind::Destroyer));
        assert!(fleet.all_sunk());
    }

    #[test]
    fn random_layout_fills_the_fleet_without_overlap() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut fleet = Fleet::new();
        for placement in fleet.random_layout(&mut rng) {
            fleet.place(&placement).unwrap();
        }
        assert!(fleet.is_complete());
        let occupied = Coord::all().filter(|&c| fleet.ship_at(c).is_some()).count();
        assert_eq!(occupied, ShipKind::FLEET.iter().map(|k| k.len()).sum::<usize>());
    }

    #[test]
    fn setup_waits_for_both_sides() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut game = Battleship::new(ALICE, BOB, Difficulty::Easy, &mut rng);
        assert_eq!(game.apply(ALICE, &Action::Ready), Err(MoveError::FleetIncomplete));
        assert_eq!(game.apply(ALICE, &Action::Fire(coord("A1"))), Err(MoveError::NotPlaying));

        let layout = game.side(PlayerSlot::First).fleet.random_layout(&mut rng);
        game.apply(ALICE, &Action::PlaceAll(layout)).unwrap();
        game.apply(ALICE, &Action::Ready).unwrap();
        assert_eq!(game.phase(), Phase::Setup);
        assert_eq!(
            game.apply(ALICE, &Action::PlaceAll(Vec::new())),
            Err(MoveError::NotPlaying)
        );

        let layout = game.side(PlayerSlot::Second).fleet.random_layout(&mut rng);
        game.apply(BOB, &Action::PlaceAll(layout)).unwrap();
        game.apply(BOB, &Action::Ready).unwrap();
        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(game.to_move(), Some(ALICE));
    }

    #[test]
    fn bad_batch_placement_changes_nothing() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut game = Battleship::new(ALICE, BOB, Difficulty::Easy, &mut rng);
        let at = coord("C3");
        let batch = vec![
            Placement { kind: ShipKind::Destroyer, at, orientation: Orientation::Horizontal },
            Placement { kind: ShipKind::Cruiser, at, orientation: Orientation::Vertical },
        ];
        assert_eq!(game.apply(ALICE, &Action::PlaceAll(batch)), Err(MoveError::Overlap));
        assert!(game.side(PlayerSlot::First).fleet.ships().is_empty());
    }

    #[test]
    fn bot_side_is_ready_from_the_start() {
        let mut rng = StdRng::seed_from_u64(8);
        let game = Battleship::new(ALICE, Actor::Bot, Difficulty::Hard, &mut rng);
        assert!(game.side(PlayerSlot::Second).ready);
        assert!(game.side(PlayerSlot::Second).fleet.is_complete());
        assert!(!game.side(PlayerSlot::First).ready);
    }

    #[test]
    fn shots_flip_exactly_one_cell_and_alternate() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut game = ready_game(&mut rng);
        let target = coord("E5");
        let before = game.side(PlayerSlot::First).tracking;
        game.apply(ALICE, &Action::Fire(target)).unwrap();
        let after = game.side(PlayerSlot::First).tracking;
        let changed = Coord::all().filter(|c| before[c.row][c.col] != after[c.row][c.col]).count();
        assert_eq!(changed, 1);
        assert_eq!(game.to_move(), Some(BOB));
        assert_eq!(game.apply(ALICE, &Action::Fire(coord("E6"))), Err(MoveError::OutOfTurn));
        game.apply(BOB, &Action::Fire(target)).unwrap();
        assert_eq!(game.apply(ALICE, &Action::Fire(target)), Err(MoveError::AlreadyFired));
    }

    #[test]
    fn sinking_the_whole_fleet_wins() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut game = ready_game(&mut rng);
        let bob_ships: Vec<Coord> = game
            .side(PlayerSlot::Second)
            .fleet
            .ships()
            .iter()
            .flat_map(|s| s.cells.clone())
            .collect();
        let mut bob_targets = Coord::all();
        let last = bob_ships.len() - 1;
        for (i, &at) in bob_ships.iter().enumerate() {
            let progress = game.apply(ALICE, &Action::Fire(at)).unwrap();
            if i == last {
                assert_eq!(progress, Progress::Over(Outcome::Won(ALICE)));
            } else {
                assert_eq!(progress, Progress::Continue);
                assert!(!game.check_victory(PlayerSlot::First));
                let shot = bob_targets.next().unwrap();
                game.apply(BOB, &Action::Fire(shot)).unwrap();
            }
        }
        assert!(game.check_victory(PlayerSlot::First));
    }

    #[test]
    fn single_hit_heats_its_eight_neighbours() {
        let mut tracking = [[Mark::Unknown; SIZE]; SIZE];
        let hit = coord("D4");
        tracking[hit.row][hit.col] = Mark::Hit;
        let heat = heat_map(&tracking);
        let neighbours: Vec<Coord> = hit.surrounding().collect();
        assert_eq!(neighbours.len(), 8);
        for c in Coord::all() {
            let expected = if neighbours.contains(&c) { HEAT_PER_HIT } else { 0 };
            assert_eq!(heat[c.row][c.col], expected, "at {c}");
        }
    }

    #[test]
    fn heat_adds_up_between_hits() {
        let mut tracking = [[Mark::Unknown; SIZE]; SIZE];
        tracking[4][4] = Mark::Hit;
        tracking[4][6] = Mark::Hit;
        let heat = heat_map(&tracking);
        assert_eq!(heat[4][5], 2 * HEAT_PER_HIT);
        assert_eq!(heat[3][5], 2 * HEAT_PER_HIT);
        assert_eq!(heat[4][3], HEAT_PER_HIT);

        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..20 {
            let pick = hottest_target(&tracking, &mut rng).unwrap();
            assert_eq!(pick.col, 5);
            assert!((3..=5).contains(&pick.row));
        }
    }

    #[test]
    fn medium_targets_only_orthogonal_neighbours() {
        let mut tracking = [[Mark::Unknown; SIZE]; SIZE];
        let hit = coord("E5");
        tracking[hit.row][hit.col] = Mark::Hit;
        let orthogonal: Vec<Coord> = hit.orthogonal().collect();
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..30 {
            let pick = adjacent_target(&tracking, &mut rng).unwrap();
            assert!(orthogonal.contains(&pick));
        }
    }

    #[test]
    fn bot_falls_back_to_random_without_hits() {
        let tracking = [[Mark::Unknown; SIZE]; SIZE];
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(hottest_target(&tracking, &mut rng), None);
        assert_eq!(adjacent_target(&tracking, &mut rng), None);
        assert!(random_target(&tracking, &mut rng).is_some());
    }

    #[test]
    fn bot_shots_are_always_legal() {
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            let mut rng = StdRng::seed_from_u64(difficulty as u64 + 100);
            let mut game = Battleship::new(Actor::Bot, ALICE, difficulty, &mut rng);
            let layout = game.side(PlayerSlot::Second).fleet.random_layout(&mut rng);
            game.apply(ALICE, &Action::PlaceAll(layout)).unwrap();
            game.apply(ALICE, &Action::Ready).unwrap();

            let mut alice_targets = Coord::all();
            while !game.phase().is_terminal() {
                let action = match game.to_move() {
                    Some(Actor::Bot) => game.bot_action(&mut rng).expect("bot has a target"),
                    _ => Action::Fire(alice_targets.next().unwrap()),
                };
                let actor = game.to_move().unwrap();
                assert!(game.apply(actor, &action).is_ok(), "{action:?} rejected");
            }
        }
    }
}
