//! Hangman, either solo against a word picked by the bot or as a multiplayer
//! game where every player takes one round as word master.

use super::{Actor, Difficulty, MoveError, Outcome, Phase, Progress, TurnBased};
use rand::{seq::SliceRandom, Rng};
use std::collections::BTreeSet;

pub const MAX_WRONG: u8 = 6;
pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 8;

/// Points for each revealed occurrence of a letter.
pub const POINTS_PER_LETTER: u32 = 1;
/// Bonus for the guesser who completes the word.
pub const POINTS_FOR_SOLVING: u32 = 2;
/// Points for the word master when the guessers run out of attempts.
pub const POINTS_FOR_STUMPING: u32 = 3;

const EASY_WORDS: &[&str] = &[
    "CHAT", "PONT", "LUNE", "ARBRE", "PLAGE", "FLEUR", "TIGRE", "PAIN", "ROBOT", "PIANO", "NUAGE",
    "VELO",
];
const MEDIUM_WORDS: &[&str] = &[
    "GIRAFE", "CHATEAU", "DRAGON", "MONTAGNE", "BATEAU", "JARDIN", "PIRATE", "FROMAGE", "VOLCAN",
    "CACTUS", "CERISE", "ECUREUIL",
];
const HARD_WORDS: &[&str] = &[
    "XYLOPHONE",
    "LABYRINTHE",
    "KALEIDOSCOPE",
    "HIPPOPOTAME",
    "ORNITHORYNQUE",
    "ACCORDEON",
    "PHOTOSYNTHESE",
    "QUADRILATERE",
    "ZYGOMATIQUE",
    "RHINOCEROS",
];

pub fn word_list(difficulty: Difficulty) -> &'static [&'static str] {
    match difficulty {
        Difficulty::Easy => EASY_WORDS,
        Difficulty::Medium => MEDIUM_WORDS,
        Difficulty::Hard => HARD_WORDS,
    }
}

pub fn random_word<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> &'static str {
    word_list(difficulty).choose(rng).copied().unwrap_or("HANGMAN")
}

/// Uppercases and checks a secret word.
pub fn normalize_word(word: &str) -> Result<String, MoveError> {
    let word = word.trim().to_ascii_uppercase();
    if !(3..=20).contains(&word.len()) || !word.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(MoveError::InvalidWord);
    }
    Ok(word)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Join,
    Start,
    SetWord(String),
    Guess(char),
    GuessWord(String),
}

impl Action {
    /// Reads a chat message as a guess: one letter, or a whole word of the
    /// same length as the secret. Other chat is not a guess.
    pub fn parse_guess(text: &str, word_len: usize) -> Option<Action> {
        let text = text.trim();
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => Some(Action::Guess(c.to_ascii_uppercase())),
            (Some(_), Some(_)) if text.len() == word_len && text.chars().all(|c| c.is_ascii_alphabetic()) => {
                Some(Action::GuessWord(text.to_ascii_uppercase()))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Solo,
    Multiplayer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    word: String,
    guessed: BTreeSet<char>,
    remaining: u8,
    master: Actor,
    /// Everybody but the master, starting with the player after them.
    guessers: Vec<Actor>,
    turn: usize,
}

impl Round {
    fn new(word: String, master: Actor, guessers: Vec<Actor>) -> Self {
        Round {
            word,
            guessed: BTreeSet::new(),
            remaining: MAX_WRONG,
            master,
            guessers,
            turn: 0,
        }
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn master(&self) -> Actor {
        self.master
    }

    pub fn remaining(&self) -> u8 {
        self.remaining
    }

    pub fn guessers(&self) -> &[Actor] {
        &self.guessers
    }

    pub fn current_guesser(&self) -> Actor {
        self.guessers[self.turn % self.guessers.len()]
    }

    pub fn wrong_letters(&self) -> impl Iterator<Item = char> + '_ {
        self.guessed.iter().copied().filter(|c| !self.word.contains(*c))
    }

    pub fn is_solved(&self) -> bool {
        self.word.chars().all(|c| self.guessed.contains(&c))
    }

    pub fn is_lost(&self) -> bool {
        self.remaining == 0
    }

    /// `C _ A _` style view of the word.
    pub fn masked(&self) -> String {
        self.word
            .chars()
            .map(|c| if self.guessed.contains(&c) { c } else { '_' })
            .map(String::from)
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn unrevealed_count(&self) -> u32 {
        self.word.chars().filter(|c| !self.guessed.contains(c)).count() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundResult {
    pub word: String,
    pub master: Actor,
    pub solved_by: Option<Actor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Lobby,
    AwaitingWord,
    Guessing,
}

#[derive(Debug, Clone)]
pub struct Hangman {
    mode: Mode,
    difficulty: Difficulty,
    /// Join order, which is also the word master order.
    players: Vec<Actor>,
    scores: Vec<u32>,
    round_index: usize,
    round: Option<Round>,
    stage: Stage,
    phase: Phase,
    last_round: Option<RoundResult>,
}

impl Hangman {
    /// Solo game: the bot is word master and `player` guesses `word`.
    pub fn solo(player: Actor, difficulty: Difficulty, word: &str) -> Result<Self, MoveError> {
        let word = normalize_word(word)?;
        Ok(Hangman {
            mode: Mode::Solo,
            difficulty,
            players: vec![player],
            scores: vec![0],
            round_index: 0,
            round: Some(Round::new(word, Actor::Bot, vec![player])),
            stage: Stage::Guessing,
            phase: Phase::Playing,
            last_round: None,
        })
    }

    /// Multiplayer lobby opened by `host`.
    pub fn lobby(host: Actor) -> Self {
        Hangman {
            mode: Mode::Multiplayer,
            difficulty: Difficulty::default(),
            players: vec![host],
            scores: vec![0],
            round_index: 0,
            round: None,
            stage: Stage::Lobby,
            phase: Phase::Setup,
            last_round: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn host(&self) -> Actor {
        self.players[0]
    }

    pub fn players(&self) -> &[Actor] {
        &self.players
    }

    pub fn is_participant(&self, actor: Actor) -> bool {
        self.players.contains(&actor)
    }

    /// Scores in join order.
    pub fn scores(&self) -> impl Iterator<Item = (Actor, u32)> + '_ {
        self.players.iter().copied().zip(self.scores.iter().copied())
    }

    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    pub fn round_number(&self) -> usize {
        self.round_index + 1
    }

    pub fn total_rounds(&self) -> usize {
        match self.mode {
            Mode::Solo => 1,
            Mode::Multiplayer => self.players.len(),
        }
    }

    pub fn in_lobby(&self) -> bool {
        self.stage == Stage::Lobby
    }

    pub fn awaiting_word(&self) -> bool {
        self.stage == Stage::AwaitingWord
    }

    pub fn last_round(&self) -> Option<&RoundResult> {
        self.last_round.as_ref()
    }

    fn master_of(&self, round_index: usize) -> Actor {
        self.players[round_index]
    }

    fn add_points(&mut self, actor: Actor, points: u32) {
        if let Some(i) = self.players.iter().position(|&p| p == actor) {
            self.scores[i] += points;
        }
    }

    fn join(&mut self, actor: Actor) -> Result<Progress, MoveError> {
        if self.stage != Stage::Lobby {
            return Err(MoveError::NotPlaying);
        }
        if self.is_participant(actor) {
            return Err(MoveError::AlreadyJoined);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(MoveError::LobbyFull);
        }
        self.players.push(actor);
        self.scores.push(0);
        Ok(Progress::Continue)
    }

    fn start(&mut self, actor: Actor) -> Result<Progress, MoveError> {
        if self.stage != Stage::Lobby {
            return Err(MoveError::NotPlaying);
        }
        if actor != self.host() {
            return Err(MoveError::NotHost);
        }
        if self.players.len() < MIN_PLAYERS {
            return Err(MoveError::NotEnoughPlayers);
        }
        self.stage = Stage::AwaitingWord;
        Ok(Progress::Continue)
    }

    fn set_word(&mut self, actor: Actor, word: &str) -> Result<Progress, MoveError> {
        if self.stage != Stage::AwaitingWord {
            return Err(MoveError::NotPlaying);
        }
        if !self.is_participant(actor) && actor != Actor::Bot {
            return Err(MoveError::NotAParticipant);
        }
        let master = self.master_of(self.round_index);
        if actor != master {
            return Err(MoveError::OutOfTurn);
        }
        let word = normalize_word(word)?;
        let n = self.players.len();
        let guessers = (1..n).map(|i| self.players[(self.round_index + i) % n]).collect();
        self.round = Some(Round::new(word, master, guessers));
        self.stage = Stage::Guessing;
        self.phase = Phase::Playing;
        Ok(Progress::Continue)
    }

    fn guess(&mut self, actor: Actor, action: &Action) -> Result<Progress, MoveError> {
        if self.stage != Stage::Guessing {
            return Err(MoveError::NotPlaying);
        }
        let round = self.round.as_mut().ok_or(MoveError::NotPlaying)?;
        if actor == round.master {
            return Err(MoveError::WordMasterCannotGuess);
        }
        if !round.guessers.contains(&actor) {
            return Err(MoveError::NotAParticipant);
        }
        if actor != round.current_guesser() {
            return Err(MoveError::OutOfTurn);
        }

        let points = match action {
            Action::Guess(letter) => {
                let letter = letter.to_ascii_uppercase();
                if !letter.is_ascii_uppercase() {
                    return Err(MoveError::InvalidInput(letter.to_string()));
                }
                if !round.guessed.insert(letter) {
                    return Err(MoveError::AlreadyGuessed);
                }
                let hits = round.word.chars().filter(|&c| c == letter).count() as u32;
                if hits == 0 {
                    round.remaining -= 1;
                }
                hits * POINTS_PER_LETTER
            }
            Action::GuessWord(word) => {
                if !word.chars().all(|c| c.is_ascii_alphabetic()) {
                    return Err(MoveError::InvalidInput(word.clone()));
                }
                if word.to_ascii_uppercase() == round.word {
                    let revealed = round.unrevealed_count();
                    round.guessed.extend(round.word.chars().collect::<Vec<_>>());
                    revealed * POINTS_PER_LETTER
                } else {
                    round.remaining -= 1;
                    0
                }
            }
            _ => return Err(MoveError::NotPlaying),
        };

        let solved = round.is_solved();
        let lost = round.is_lost();
        if !solved && !lost {
            round.turn += 1;
        }
        self.add_points(actor, points);

        if solved {
            self.add_points(actor, POINTS_FOR_SOLVING);
            Ok(self.finish_round(Some(actor)))
        } else if lost {
            let master = self.round.as_ref().map(|r| r.master).unwrap_or(Actor::Bot);
            self.add_points(master, POINTS_FOR_STUMPING);
            Ok(self.finish_round(None))
        } else {
            Ok(Progress::Continue)
        }
    }

    fn finish_round(&mut self, solved_by: Option<Actor>) -> Progress {
        if let Some(round) = &self.round {
            self.last_round = Some(RoundResult {
                word: round.word.clone(),
                master: round.master,
                solved_by,
            });
        }

        let outcome = match self.mode {
            Mode::Solo => Some(match solved_by {
                Some(actor) => Outcome::Won(actor),
                None => Outcome::Lost,
            }),
            Mode::Multiplayer if self.round_index + 1 >= self.total_rounds() => Some(Outcome::Finished),
            Mode::Multiplayer => None,
        };

        match outcome {
            Some(outcome) => {
                self.phase = Phase::Terminal(outcome);
                Progress::Over(outcome)
            }
            None => {
                self.round_index += 1;
                self.round = None;
                self.stage = Stage::AwaitingWord;
                Progress::Continue
            }
        }
    }

    /// Highest score, shared by everyone tied for it.
    pub fn leaders(&self) -> Vec<Actor> {
        let best = self.scores.iter().copied().max().unwrap_or(0);
        self.scores()
            .filter(|&(_, score)| score == best)
            .map(|(actor, _)| actor)
            .collect()
    }
}

impl TurnBased for Hangman {
    type Action = Action;

    fn phase(&self) -> Phase {
        self.phase
    }

    fn to_move(&self) -> Option<Actor> {
        if self.phase.is_terminal() {
            return None;
        }
        match self.stage {
            Stage::Lobby => None,
            Stage::AwaitingWord => Some(self.master_of(self.round_index)),
            Stage::Guessing => self.round.as_ref().map(Round::current_guesser),
        }
    }

    fn apply(&mut self, actor: Actor, action: &Action) -> Result<Progress, MoveError> {
        if self.phase.is_terminal() {
            return Err(MoveError::NotPlaying);
        }
        match action {
            Action::Join => self.join(actor),
            Action::Start => self.start(actor),
            Action::SetWord(word) => self.set_word(actor, word),
            Action::Guess(_) | Action::GuessWord(_) => self.guess(actor, action),
        }
    }

    /// The bot only ever acts as word master.
    fn bot_action<R: Rng>(&self, rng: &mut R) -> Option<Action> {
        if self.to_move() != Some(Actor::Bot) || self.stage != Stage::AwaitingWord {
            return None;
        }
        Some(Action::SetWord(random_word(self.difficulty, rng).to_string()))
    }

    fn expire(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = Phase::Terminal(Outcome::TimedOut);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    const ALICE: Actor = Actor::User(1);
    const BOB: Actor = Actor::User(2);
    const CAROL: Actor = Actor::User(3);

    fn guess(game: &mut Hangman, actor: Actor, letter: char) -> Result<Progress, MoveError> {
        game.apply(actor, &Action::Guess(letter))
    }

    fn started(players: &[Actor]) -> Hangman {
        let mut game = Hangman::lobby(players[0]);
        for &p in &players[1..] {
            game.apply(p, &Action::Join).unwrap();
        }
        game.apply(players[0], &Action::Start).unwrap();
        game
    }

    #[test]
    fn solo_win_keeps_all_attempts() {
        let mut game = Hangman::solo(ALICE, Difficulty::Easy, "chat").unwrap();
        for letter in ['T', 'a', 'C'] {
            assert_eq!(guess(&mut game, ALICE, letter), Ok(Progress::Continue));
        }
        assert_eq!(guess(&mut game, ALICE, 'H'), Ok(Progress::Over(Outcome::Won(ALICE))));
        assert_eq!(game.round().unwrap().remaining(), MAX_WRONG);
        assert!(game.round().unwrap().is_solved());
    }

    #[test]
    fn solo_loss_after_six_misses() {
        let mut game = Hangman::solo(ALICE, Difficulty::Easy, "CHAT").unwrap();
        for letter in ['B', 'D', 'E', 'F', 'G'] {
            assert_eq!(guess(&mut game, ALICE, letter), Ok(Progress::Continue));
        }
        assert_eq!(game.round().unwrap().remaining(), 1);
        assert_eq!(game.round().unwrap().masked(), "_ _ _ _");
        assert_eq!(guess(&mut game, ALICE, 'I'), Ok(Progress::Over(Outcome::Lost)));
        assert_eq!(guess(&mut game, ALICE, 'C'), Err(MoveError::NotPlaying));
    }

    #[test]
    fn repeated_letters_are_rejected_case_insensitively() {
        let mut game = Hangman::solo(ALICE, Difficulty::Easy, "CHAT").unwrap();
        guess(&mut game, ALICE, 'c').unwrap();
        assert_eq!(guess(&mut game, ALICE, 'C'), Err(MoveError::AlreadyGuessed));
        guess(&mut game, ALICE, 'z').unwrap();
        let remaining = game.round().unwrap().remaining();
        assert_eq!(guess(&mut game, ALICE, 'Z'), Err(MoveError::AlreadyGuessed));
        assert_eq!(game.round().unwrap().remaining(), remaining);
        assert_eq!(game.round().unwrap().masked(), "C _ _ _");
        assert_eq!(game.round().unwrap().wrong_letters().collect::<String>(), "Z");
    }

    #[test]
    fn whole_word_guess() {
        let mut game = Hangman::solo(ALICE, Difficulty::Easy, "PONT").unwrap();
        assert_eq!(game.apply(ALICE, &Action::GuessWord("PORT".into())), Ok(Progress::Continue));
        assert_eq!(game.round().unwrap().remaining(), MAX_WRONG - 1);
        assert_eq!(
            game.apply(ALICE, &Action::GuessWord("pont".into())),
            Ok(Progress::Over(Outcome::Won(ALICE)))
        );
    }

    #[test]
    fn guesses_parse_from_chat() {
        assert_eq!(Action::parse_guess(" e ", 4), Some(Action::Guess('E')));
        assert_eq!(Action::parse_guess("chat", 4), Some(Action::GuessWord("CHAT".into())));
        assert_eq!(Action::parse_guess("hello there", 4), None);
        assert_eq!(Action::parse_guess("4", 4), None);
        assert_eq!(Action::parse_guess("", 4), None);
    }

    #[test]
    fn short_chat_is_not_a_word_guess() {
        assert_eq!(Action::parse_guess("ok", 4), None);
        assert_eq!(Action::parse_guess("lol", 4), None);
        assert_eq!(Action::parse_guess("bonjour", 4), None);
        assert_eq!(Action::parse_guess("lol", 3), Some(Action::GuessWord("LOL".into())));
    }

    #[test]
    fn lobby_rules() {
        let mut game = Hangman::lobby(ALICE);
        assert_eq!(game.apply(ALICE, &Action::Start), Err(MoveError::NotEnoughPlayers));
        assert_eq!(game.apply(ALICE, &Action::Join), Err(MoveError::AlreadyJoined));
        game.apply(BOB, &Action::Join).unwrap();
        assert_eq!(game.apply(BOB, &Action::Start), Err(MoveError::NotHost));
        for id in 3..=(MAX_PLAYERS as u64) {
            game.apply(Actor::User(id), &Action::Join).unwrap();
        }
        assert_eq!(game.apply(Actor::User(99), &Action::Join), Err(MoveError::LobbyFull));
        game.apply(ALICE, &Action::Start).unwrap();
        assert_eq!(game.phase(), Phase::Setup);
        assert_eq!(game.to_move(), Some(ALICE));
        assert_eq!(game.apply(CAROL, &Action::Join), Err(MoveError::NotPlaying));
    }

    #[test]
    fn word_master_sets_word_and_cannot_guess() {
        let mut game = started(&[ALICE, BOB, CAROL]);
        assert_eq!(game.apply(BOB, &Action::SetWord("PONT".into())), Err(MoveError::OutOfTurn));
        assert_eq!(game.apply(ALICE, &Action::SetWord("a1".into())), Err(MoveError::InvalidWord));
        game.apply(ALICE, &Action::SetWord("pont".into())).unwrap();
        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(guess(&mut game, ALICE, 'P'), Err(MoveError::WordMasterCannotGuess));
        assert_eq!(guess(&mut game, CAROL, 'P'), Err(MoveError::OutOfTurn));
        assert_eq!(guess(&mut game, Actor::User(9), 'P'), Err(MoveError::NotAParticipant));
    }

    #[test]
    fn guessers_rotate_and_masters_change_every_round() {
        let mut game = started(&[ALICE, BOB, CAROL]);
        let mut masters = Vec::new();

        for round in 0..3 {
            let master = game.to_move().unwrap();
            masters.push(master);
            game.apply(master, &Action::SetWord("AB".repeat(2))).unwrap();
            let r = game.round().unwrap();
            assert_eq!(r.guessers().len(), 2);
            assert!(!r.guessers().contains(&master));

            let first = game.to_move().unwrap();
            guess(&mut game, first, 'A').unwrap();
            let second = game.to_move().unwrap();
            assert_ne!(first, second);
            let progress = guess(&mut game, second, 'B').unwrap();
            if round < 2 {
                assert_eq!(progress, Progress::Continue);
                assert!(game.awaiting_word());
            } else {
                assert_eq!(progress, Progress::Over(Outcome::Finished));
            }
        }

        assert_eq!(masters, vec![ALICE, BOB, CAROL]);
        for pair in masters.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn scoring() {
        let mut game = started(&[ALICE, BOB]);
        game.apply(ALICE, &Action::SetWord("ABBA".into())).unwrap();
        guess(&mut game, BOB, 'B').unwrap();
        guess(&mut game, BOB, 'A').unwrap();
        // 2 + 2 letters, plus the solving bonus.
        assert_eq!(game.scores().collect::<Vec<_>>(), vec![(ALICE, 0), (BOB, 4 + POINTS_FOR_SOLVING)]);
        assert_eq!(game.last_round().unwrap().solved_by, Some(BOB));

        game.apply(BOB, &Action::SetWord("XYZ".into())).unwrap();
        for letter in ['A', 'B', 'C', 'D', 'E', 'F'] {
            guess(&mut game, ALICE, letter).unwrap();
        }
        assert_eq!(game.phase(), Phase::Terminal(Outcome::Finished));
        assert_eq!(
            game.scores().collect::<Vec<_>>(),
            vec![(ALICE, 0), (BOB, 4 + POINTS_FOR_SOLVING + POINTS_FOR_STUMPING)]
        );
        assert_eq!(game.leaders(), vec![BOB]);
    }

    #[test]
    fn bot_master_picks_a_word_from_its_list() {
        let mut rng = StdRng::seed_from_u64(6);
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            let word = random_word(difficulty, &mut rng);
            assert!(word_list(difficulty).contains(&word));
            assert!(normalize_word(word).is_ok());
        }
        assert!(EASY_WORDS.iter().all(|w| w.len() <= 5));
        assert!(MEDIUM_WORDS.iter().all(|w| (6..=8).contains(&w.len())));
        assert!(HARD_WORDS.iter().all(|w| w.len() >= 9));
    }

    #[test]
    fn bot_only_acts_when_it_is_word_master() {
        let game = Hangman::solo(ALICE, Difficulty::Easy, "CHAT").unwrap();
        assert_eq!(game.bot_action(&mut StdRng::seed_from_u64(0)), None);
    }
}
