//! Yams (Yahtzee) for two players.
//!
//! Each turn the active player rolls up to three times, holding dice between
//! rolls, then fills exactly one of the thirteen categories of their sheet.
//! The game ends when both sheets are full.

use super::{ensure_turn, Actor, Difficulty, MoveError, Outcome, Pair, Phase, PlayerSlot, Progress, TurnBased};
use itertools::Itertools;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::fmt;
use std::str::FromStr;

pub const DICE: usize = 5;
pub const ROLLS_PER_TURN: u8 = 3;
pub const UPPER_BONUS: u32 = 35;
pub const UPPER_BONUS_THRESHOLD: u32 = 63;

pub type Dice = [u8; DICE];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Ones,
    Twos,
    Threes,
    Fours,
    Fives,
    Sixes,
    ThreeOfAKind,
    FourOfAKind,
    Full,
    SmallStraight,
    LargeStraight,
    Yams,
    Chance,
}

impl Category {
    pub const ALL: [Category; 13] = [
        Category::Ones,
        Category::Twos,
        Category::Threes,
        Category::Fours,
        Category::Fives,
        Category::Sixes,
        Category::ThreeOfAKind,
        Category::FourOfAKind,
        Category::Full,
        Category::SmallStraight,
        Category::LargeStraight,
        Category::Yams,
        Category::Chance,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Stable identifier, used in button ids and for bot tie-breaks.
    pub fn key(self) -> &'static str {
        match self {
            Category::Ones => "ones",
            Category::Twos => "twos",
            Category::Threes => "threes",
            Category::Fours => "fours",
            Category::Fives => "fives",
            Category::Sixes => "sixes",
            Category::ThreeOfAKind => "three_of_a_kind",
            Category::FourOfAKind => "four_of_a_kind",
            Category::Full => "full",
            Category::SmallStraight => "small_straight",
            Category::LargeStraight => "large_straight",
            Category::Yams => "yams",
            Category::Chance => "chance",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Ones => "1s",
            Category::Twos => "2s",
            Category::Threes => "3s",
            Category::Fours => "4s",
            Category::Fives => "5s",
            Category::Sixes => "6s",
            Category::ThreeOfAKind => "Three of a kind",
            Category::FourOfAKind => "Four of a kind",
            Category::Full => "Full house",
            Category::SmallStraight => "Small straight",
            Category::LargeStraight => "Large straight",
            Category::Yams => "Yams",
            Category::Chance => "Chance",
        }
    }

    pub fn is_upper(self) -> bool {
        self.index() < 6
    }
}

impl FromStr for Category {
    type Err = MoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.key() == s)
            .ok_or_else(|| MoveError::InvalidInput(s.to_string()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How many dice show each face, indexed by face value.
fn face_counts(dice: &Dice) -> [usize; 7] {
    let mut counts = [0; 7];
    for &d in dice {
        counts[d as usize] += 1;
    }
    counts
}

fn longest_run(dice: &Dice) -> usize {
    let faces: Vec<u8> = dice.iter().copied().sorted().dedup().collect();
    let mut best = 1;
    let mut run = 1;
    for pair in faces.windows(2) {
        run = if pair[1] == pair[0] + 1 { run + 1 } else { 1 };
        best = best.max(run);
    }
    best
}

/// Points `dice` are worth in `category`, independent of dice order.
pub fn score(category: Category, dice: &Dice) -> u32 {
    let counts = face_counts(dice);
    let sum: u32 = dice.iter().map(|&d| d as u32).sum();
    let max_count = counts.iter().copied().max().unwrap_or(0);
    match category {
        Category::Ones
        | Category::Twos
        | Category::Threes
        | Category::Fours
        | Category::Fives
        | Category::Sixes => {
            let face = category.index() + 1;
            (counts[face] * face) as u32
        }
        Category::ThreeOfAKind if max_count >= 3 => sum,
        Category::FourOfAKind if max_count >= 4 => sum,
        Category::Full if counts.contains(&3) && counts.contains(&2) => 25,
        Category::SmallStraight if longest_run(dice) >= 4 => 30,
        Category::LargeStraight if longest_run(dice) == 5 => 40,
        Category::Yams if max_count == 5 => 50,
        Category::Chance => sum,
        _ => 0,
    }
}

/// One player's scores. A filled category never changes again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreSheet([Option<u32>; 13]);

impl ScoreSheet {
    pub fn get(&self, category: Category) -> Option<u32> {
        self.0[category.index()]
    }

    pub fn is_filled(&self, category: Category) -> bool {
        self.get(category).is_some()
    }

    fn fill(&mut self, category: Category, points: u32) -> Result<(), MoveError> {
        let slot = &mut self.0[category.index()];
        if slot.is_some() {
            return Err(MoveError::CategoryFilled);
        }
        *slot = Some(points);
        Ok(())
    }

    pub fn open_categories(&self) -> impl Iterator<Item = Category> + '_ {
        Category::ALL.into_iter().filter(|&c| !self.is_filled(c))
    }

    pub fn is_complete(&self) -> bool {
        self.0.iter().all(Option::is_some)
    }

    pub fn upper_total(&self) -> u32 {
        Category::ALL
            .iter()
            .filter(|c| c.is_upper())
            .filter_map(|&c| self.get(c))
            .sum()
    }

    pub fn bonus(&self) -> u32 {
        if self.upper_total() >= UPPER_BONUS_THRESHOLD {
            UPPER_BONUS
        } else {
            0
        }
    }

    pub fn total(&self) -> u32 {
        self.0.iter().flatten().sum::<u32>() + self.bonus()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Roll,
    ToggleHold(usize),
    /// Replaces the whole hold mask at once.
    Hold([bool; DICE]),
    Score(Category),
}

#[derive(Debug, Clone)]
pub struct Yams {
    players: Pair<Actor>,
    sheets: Pair<ScoreSheet>,
    dice: Dice,
    held: [bool; DICE],
    rolls_left: u8,
    current: PlayerSlot,
    difficulty: Difficulty,
    phase: Phase,
    last_score: Option<(Actor, Category, u32)>,
    rng: StdRng,
}

impl Yams {
    pub fn new(first: Actor, second: Actor, difficulty: Difficulty, seed: u64) -> Self {
        Yams {
            players: Pair::new(first, second),
            sheets: Pair::new(ScoreSheet::default(), ScoreSheet::default()),
            dice: [1; DICE],
            held: [false; DICE],
            rolls_left: ROLLS_PER_TURN,
            current: PlayerSlot::First,
            difficulty,
            phase: Phase::Playing,
            last_score: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn players(&self) -> &Pair<Actor> {
        &self.players
    }

    pub fn sheet(&self, slot: PlayerSlot) -> &ScoreSheet {
        self.sheets.get(slot)
    }

    pub fn dice(&self) -> &Dice {
        &self.dice
    }

    pub fn held(&self) -> &[bool; DICE] {
        &self.held
    }

    pub fn rolls_left(&self) -> u8 {
        self.rolls_left
    }

    pub fn has_rolled(&self) -> bool {
        self.rolls_left < ROLLS_PER_TURN
    }

    pub fn current(&self) -> PlayerSlot {
        self.current
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn last_score(&self) -> Option<(Actor, Category, u32)> {
        self.last_score
    }

    fn roll(&mut self) -> Result<(), MoveError> {
        if self.rolls_left == 0 {
            return Err(MoveError::NoRollsLeft);
        }
        for (die, &held) in self.dice.iter_mut().zip(&self.held) {
            if !held {
                *die = self.rng.gen_range(1..=6);
            }
        }
        self.rolls_left -= 1;
        Ok(())
    }

    fn check_can_hold(&self) -> Result<(), MoveError> {
        if !self.has_rolled() {
            return Err(MoveError::MustRollFirst);
        }
        if self.rolls_left == 0 {
            return Err(MoveError::NoRollsLeft);
        }
        Ok(())
    }

    fn finish_turn(&mut self, slot: PlayerSlot) -> Progress {
        if self.sheets.0.iter().all(ScoreSheet::is_complete) {
            let [a, b] = [PlayerSlot::First, PlayerSlot::Second].map(|s| self.sheets.get(s).total());
            let outcome = match a.cmp(&b) {
                std::cmp::Ordering::Greater => Outcome::Won(*self.players.get(PlayerSlot::First)),
                std::cmp::Ordering::Less => Outcome::Won(*self.players.get(PlayerSlot::Second)),
                std::cmp::Ordering::Equal => Outcome::Draw,
            };
            self.phase = Phase::Terminal(outcome);
            return Progress::Over(outcome);
        }
        self.current = slot.other();
        self.held = [false; DICE];
        self.rolls_left = ROLLS_PER_TURN;
        Progress::Continue
    }
}

/// Highest scoring open category; ties go to the alphabetically first key so
/// the choice never depends on iteration order.
pub fn best_category(sheet: &ScoreSheet, dice: &Dice) -> Option<(Category, u32)> {
    sheet
        .open_categories()
        .map(|c| (c, score(c, dice)))
        .min_by(|(a, sa), (b, sb)| sb.cmp(sa).then_with(|| a.key().cmp(b.key())))
}

/// Dice worth keeping for another roll.
fn holds_for(dice: &Dice, sheet: &ScoreSheet, difficulty: Difficulty) -> [bool; DICE] {
    let counts = face_counts(dice);
    let wants_straight = difficulty == Difficulty::Hard
        && (!sheet.is_filled(Category::SmallStraight) || !sheet.is_filled(Category::LargeStraight))
        && counts.iter().all(|&n| n < 3)
        && longest_run(dice) >= 3;

    let mut held = [false; DICE];
    if wants_straight {
        let mut seen = [false; 7];
        for (i, &d) in dice.iter().enumerate() {
            if !seen[d as usize] && in_longest_run(dice, d) {
                seen[d as usize] = true;
                held[i] = true;
            }
        }
        return held;
    }

    // Most common face, higher face on ties.
    let face = (1..=6).max_by_key(|&f| (counts[f], f)).unwrap_or(6) as u8;
    for (i, &d) in dice.iter().enumerate() {
        held[i] = d == face;
    }
    held
}

fn in_longest_run(dice: &Dice, face: u8) -> bool {
    let faces: Vec<u8> = dice.iter().copied().sorted().dedup().collect();
    let target = longest_run(dice);
    let mut start = 0;
    for i in 1..=faces.len() {
        if i == faces.len() || faces[i] != faces[i - 1] + 1 {
            if i - start == target && faces[start..i].contains(&face) {
                return true;
            }
            start = i;
        }
    }
    false
}

/// Good enough to stop rolling.
fn worth_keeping(category: Category, points: u32) -> bool {
    matches!(
        category,
        Category::Full | Category::SmallStraight | Category::LargeStraight | Category::Yams
    ) && points > 0
}

impl TurnBased for Yams {
    type Action = Action;

    fn phase(&self) -> Phase {
        self.phase
    }

    fn to_move(&self) -> Option<Actor> {
        (self.phase == Phase::Playing).then(|| *self.players.get(self.current))
    }

    fn apply(&mut self, actor: Actor, action: &Action) -> Result<Progress, MoveError> {
        let slot = ensure_turn(&self.players, self.current, self.phase, actor)?;
        match *action {
            Action::Roll => {
                self.roll()?;
                Ok(Progress::Continue)
            }
            Action::ToggleHold(index) => {
                self.check_can_hold()?;
                let die = self.held.get_mut(index).ok_or(MoveError::OutOfBounds)?;
                *die = !*die;
                Ok(Progress::Continue)
            }
            Action::Hold(mask) => {
                self.check_can_hold()?;
                self.held = mask;
                Ok(Progress::Continue)
            }
            Action::Score(category) => {
                if !self.has_rolled() {
                    return Err(MoveError::MustRollFirst);
                }
                let points = score(category, &self.dice);
                self.sheets.get_mut(slot).fill(category, points)?;
                self.last_score = Some((actor, category, points));
                Ok(self.finish_turn(slot))
            }
        }
    }

    fn bot_action<R: Rng>(&self, _rng: &mut R) -> Option<Action> {
        if self.to_move() != Some(Actor::Bot) {
            return None;
        }
        if !self.has_rolled() {
            return Some(Action::Roll);
        }
        let sheet = self.sheets.get(self.current);
        let (best, points) = best_category(sheet, &self.dice)?;
        if self.difficulty == Difficulty::Easy || self.rolls_left == 0 || worth_keeping(best, points) {
            return Some(Action::Score(best));
        }
        let wanted = holds_for(&self.dice, sheet, self.difficulty);
        if wanted != self.held {
            Some(Action::Hold(wanted))
        } else {
            Some(Action::Roll)
        }
    }

    fn expire(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = Phase::Terminal(Outcome::TimedOut);
        }
    }
}
