//! Turns game state into chat text and button layouts. Nothing in here talks
//! to Discord; `play` converts a [`View`] into message builders.

use crate::component::ComponentId;
use crate::games::battleship::{self, Battleship, Mark as Shot, ShotResult, Tracking};
use crate::games::connect4::{self, Connect4, GameCell};
use crate::games::hangman::{self, Hangman, Mode};
use crate::games::tictactoe::{Mark, TicTacToe};
use crate::games::yams::{self, Category, Yams};
use crate::games::{Actor, Outcome, Pair, Phase, PlayerSlot, TurnBased};

pub const NUMBER_EMOTES: &[&str] = &[
    "\u{31}\u{fe0f}\u{20e3}", // 1
    "\u{32}\u{fe0f}\u{20e3}", // 2
    "\u{33}\u{fe0f}\u{20e3}", // 3
    "\u{34}\u{fe0f}\u{20e3}", // 4
    "\u{35}\u{fe0f}\u{20e3}", // 5
    "\u{36}\u{fe0f}\u{20e3}", // 6
    "\u{37}\u{fe0f}\u{20e3}", // 7
    "\u{38}\u{fe0f}\u{20e3}", // 8
    "\u{39}\u{fe0f}\u{20e3}", // 9
];

const DIE_FACES: [char; 6] = ['⚀', '⚁', '⚂', '⚃', '⚄', '⚅'];

const GALLOWS: [&str; 7] = [
    "  +---+\n  |   |\n      |\n      |\n      |\n=======",
    "  +---+\n  |   |\n  O   |\n      |\n      |\n=======",
    "  +---+\n  |   |\n  O   |\n  |   |\n      |\n=======",
    "  +---+\n  |   |\n  O   |\n /|   |\n      |\n=======",
    "  +---+\n  |   |\n  O   |\n /|\\  |\n      |\n=======",
    "  +---+\n  |   |\n  O   |\n /|\\  |\n /    |\n=======",
    "  +---+\n  |   |\n  O   |\n /|\\  |\n / \\  |\n=======",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Primary,
    Secondary,
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub id: ComponentId,
    pub label: String,
    pub style: Style,
    pub disabled: bool,
}

impl Button {
    fn new(id: ComponentId, label: impl Into<String>, style: Style) -> Self {
        Button {
            id,
            label: label.into(),
            style,
            disabled: false,
        }
    }

    fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// A rendered message: text plus rows of buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct View {
    pub content: String,
    pub rows: Vec<Vec<Button>>,
}

pub trait Render {
    fn view(&self) -> View;
}

pub fn mention(actor: Actor) -> String {
    match actor {
        Actor::User(id) => format!("<@{}>", id),
        Actor::Bot => "🤖 Bot".to_string(),
    }
}

/// Closing line for a finished game, or whose turn it is.
pub fn status(phase: Phase, to_move: Option<Actor>) -> String {
    match phase {
        Phase::Terminal(Outcome::Won(actor)) => format!("🏆 {} wins!", mention(actor)),
        Phase::Terminal(Outcome::Draw) => "🤝 It's a draw.".to_string(),
        Phase::Terminal(Outcome::Lost) => "💀 Hanged! Better luck next time.".to_string(),
        Phase::Terminal(Outcome::Finished) => "🏁 Game over.".to_string(),
        Phase::Terminal(Outcome::TimedOut) => "⌛ The game timed out.".to_string(),
        Phase::Setup | Phase::Playing => match to_move {
            Some(actor) => format!("{} to play.", mention(actor)),
            None => "Waiting for players...".to_string(),
        },
    }
}

fn versus(players: &Pair<Actor>, difficulty: impl std::fmt::Display, marks: [&str; 2]) -> String {
    let mut line = format!(
        "{} {} vs {} {}",
        marks[0],
        mention(*players.get(PlayerSlot::First)),
        marks[1],
        mention(*players.get(PlayerSlot::Second))
    );
    if players.has_bot() {
        line.push_str(&format!(" *({})*", difficulty));
    }
    line
}

impl Render for TicTacToe {
    fn view(&self) -> View {
        let over = self.phase().is_terminal();
        let winning = self.winning_line();
        let rows = self
            .board()
            .chunks(3)
            .enumerate()
            .map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .map(|(c, cell)| {
                        let index = r * 3 + c;
                        let (label, style) = match cell {
                            Some(Mark::X) => ("❌", Style::Secondary),
                            Some(Mark::O) => ("⭕", Style::Secondary),
                            None => ("➖", Style::Primary),
                        };
                        let style = match winning {
                            Some(line) if line.contains(&index) => Style::Success,
                            _ => style,
                        };
                        Button::new(ComponentId::TicTacToe(index), label, style).disabled(over || cell.is_some())
                    })
                    .collect()
            })
            .collect();

        View {
            content: format!(
                "{}\n{}",
                versus(self.players(), self.difficulty(), ["❌", "⭕"]),
                status(self.phase(), self.to_move())
            ),
            rows,
        }
    }
}

pub fn connect4_board(board: &connect4::Board) -> String {
    let mut out = String::new();
    for row in 0..connect4::ROWS {
        for column in board.iter() {
            out.push_str(&column[row].to_string());
        }
        out.push('\n');
    }
    out.push_str(&NUMBER_EMOTES[..connect4::COLUMNS].concat());
    out
}

impl Render for Connect4 {
    fn view(&self) -> View {
        let over = self.phase().is_terminal();
        let buttons: Vec<Button> = (0..connect4::COLUMNS)
            .map(|column| {
                Button::new(ComponentId::Connect4(column), NUMBER_EMOTES[column], Style::Secondary)
                    .disabled(over || !self.is_column_open(column))
            })
            .collect();
        let mut last = String::new();
        if let Some((column, _)) = self.last_drop() {
            last = format!("Last move: column {}\n", column + 1);
        }

        View {
            content: format!(
                "{}\n\n{}\n{}{}",
                versus(
                    self.players(),
                    self.difficulty(),
                    [&GameCell::Red.to_string(), &GameCell::Yellow.to_string()]
                ),
                connect4_board(self.board()),
                last,
                status(self.phase(), self.to_move())
            ),
            rows: buttons.chunks(4).map(<[Button]>::to_vec).collect(),
        }
    }
}

fn die(face: u8) -> char {
    DIE_FACES[usize::from(face.clamp(1, 6)) - 1]
}

pub fn yams_sheet(game: &Yams) -> String {
    let players = game.players();
    let mut out = String::from("```\n");
    out.push_str(&format!("{:<16}{:>6}{:>6}\n", "", "P1", "P2"));
    let cell = |slot: PlayerSlot, category: Category| match game.sheet(slot).get(category) {
        Some(points) => points.to_string(),
        None => "-".to_string(),
    };
    for category in Category::ALL {
        out.push_str(&format!(
            "{:<16}{:>6}{:>6}\n",
            category.label(),
            cell(PlayerSlot::First, category),
            cell(PlayerSlot::Second, category)
        ));
        if category == Category::Sixes {
            out.push_str(&format!(
                "{:<16}{:>6}{:>6}\n",
                "Bonus",
                game.sheet(PlayerSlot::First).bonus(),
                game.sheet(PlayerSlot::Second).bonus()
            ));
        }
    }
    out.push_str(&format!(
        "{:<16}{:>6}{:>6}\n```",
        "Total",
        game.sheet(PlayerSlot::First).total(),
        game.sheet(PlayerSlot::Second).total()
    ));
    out.push_str(&format!(
        "\nP1 = {}, P2 = {}",
        mention(*players.get(PlayerSlot::First)),
        mention(*players.get(PlayerSlot::Second))
    ));
    out
}

impl Render for Yams {
    fn view(&self) -> View {
        let over = self.phase().is_terminal();
        let rolled = self.has_rolled();
        let sheet = self.sheet(self.current());

        let dice = self
            .dice()
            .iter()
            .zip(self.held())
            .enumerate()
            .map(|(i, (&face, &held))| {
                let (label, style) = match held {
                    true => (format!("🔒 {}", face), Style::Success),
                    false => (format!("🎲 {}", face), Style::Secondary),
                };
                Button::new(ComponentId::YamsHold(i), label, style)
                    .disabled(over || !rolled || self.rolls_left() == 0)
            })
            .collect();
        let roll = vec![Button::new(
            ComponentId::YamsRoll,
            format!("Roll ({} left)", self.rolls_left()),
            Style::Primary,
        )
        .disabled(over || self.rolls_left() == 0)];
        let categories: Vec<Button> = Category::ALL
            .iter()
            .map(|&category| {
                let label = match (rolled, sheet.get(category)) {
                    (_, Some(points)) => format!("{} ✓{}", category.label(), points),
                    (true, None) => format!("{} ({})", category.label(), yams::score(category, self.dice())),
                    (false, None) => category.label().to_string(),
                };
                Button::new(ComponentId::YamsScore(category), label, Style::Secondary)
                    .disabled(over || !rolled || sheet.is_filled(category))
            })
            .collect();

        let mut rows = vec![dice, roll];
        rows.extend(categories.chunks(5).map(<[Button]>::to_vec));

        let mut content = versus(self.players(), self.difficulty(), ["🎲", "🎲"]);
        content.push('\n');
        if rolled {
            let faces: String = self.dice().iter().map(|&face| die(face)).collect();
            content.push_str(&format!("Dice: {}\n", faces));
        }
        if let Some((actor, category, points)) = self.last_score() {
            content.push_str(&format!("{} scored {} in {}\n", mention(actor), points, category.label()));
        }
        content.push_str(&yams_sheet(self));
        content.push('\n');
        content.push_str(&status(self.phase(), self.to_move()));

        View { content, rows }
    }
}

fn grid(cell: impl Fn(usize, usize) -> char) -> String {
    let mut out = String::from("```\n  ");
    for col in 1..=battleship::SIZE {
        out.push_str(&format!("{:>3}", col));
    }
    out.push('\n');
    for row in 0..battleship::SIZE {
        out.push_str(&format!("{} ", char::from(b'A' + row as u8)));
        for col in 0..battleship::SIZE {
            out.push_str(&format!("{:>3}", cell(row, col)));
        }
        out.push('\n');
    }
    out.push_str("```");
    out
}

pub fn tracking_grid(tracking: &Tracking) -> String {
    grid(|row, col| match tracking[row][col] {
        Shot::Unknown => '·',
        Shot::Hit => 'X',
        Shot::Miss => 'o',
    })
}

/// A player's own waters: ships, hits taken and misses received.
pub fn fleet_grid(game: &Battleship, slot: PlayerSlot) -> String {
    let fleet = &game.side(slot).fleet;
    grid(|row, col| {
        let at = battleship::Coord { row, col };
        match (fleet.ship_at(at), fleet.was_shot(at)) {
            (Some(_), true) => 'X',
            (Some(_), false) => '#',
            (None, true) => 'o',
            (None, false) => '·',
        }
    })
}

/// What one player is allowed to see, sent as an ephemeral reply.
pub fn battleship_private(game: &Battleship, slot: PlayerSlot) -> String {
    let side = game.side(slot);
    let mut out = String::from("**Your fleet**\n");
    out.push_str(&fleet_grid(game, slot));
    out.push('\n');
    if game.phase() == Phase::Setup {
        let missing: Vec<String> = side
            .fleet
            .unplaced()
            .map(|kind| format!("{} ({})", kind.name(), kind.len()))
            .collect();
        match missing.is_empty() {
            true if side.ready => out.push_str("Ready. Waiting for your opponent."),
            true => out.push_str("Fleet complete. Press Ready when you are done."),
            false => out.push_str(&format!("Still to place: {}", missing.join(", "))),
        }
    } else {
        out.push_str("**Your shots**\n");
        out.push_str(&tracking_grid(&side.tracking));
        let afloat = side.fleet.ships().iter().filter(|ship| !ship.is_sunk()).count();
        out.push_str(&format!("\nShips afloat: {}", afloat));
    }
    out
}

impl Render for Battleship {
    fn view(&self) -> View {
        let players = self.players();
        let mut content = versus(players, self.difficulty(), ["🚢", "🚢"]);
        content.push('\n');

        let rows = match self.phase() {
            Phase::Setup => {
                for slot in [PlayerSlot::First, PlayerSlot::Second] {
                    let mark = if self.side(slot).ready { "✅" } else { "⏳" };
                    content.push_str(&format!("{} {}\n", mark, mention(*players.get(slot))));
                }
                content.push_str("Place your fleet, then press Ready.");
                vec![vec![
                    Button::new(ComponentId::BattleshipRandom, "Random fleet", Style::Primary),
                    Button::new(ComponentId::BattleshipPlace, "Place a ship", Style::Secondary),
                    Button::new(ComponentId::BattleshipReady, "Ready", Style::Success),
                    Button::new(ComponentId::BattleshipBoard, "My board", Style::Secondary),
                ]]
            }
            phase => {
                for slot in [PlayerSlot::First, PlayerSlot::Second] {
                    content.push_str(&format!("Shots by {}\n", mention(*players.get(slot))));
                    content.push_str(&tracking_grid(&self.side(slot).tracking));
                    content.push('\n');
                }
                if let Some(shot) = self.last_shot() {
                    let result = match shot.result {
                        ShotResult::Miss => "miss".to_string(),
                        ShotResult::Hit => "hit!".to_string(),
                        ShotResult::Sunk(kind) => format!("sunk the {}!", kind.name()),
                    };
                    content.push_str(&format!("{} fired at {}: {}\n", mention(shot.shooter), shot.at, result));
                }
                if !phase.is_terminal() {
                    content.push_str("Type a cell like `B7` to fire.\n");
                }
                vec![vec![Button::new(ComponentId::BattleshipBoard, "My board", Style::Secondary)
                    .disabled(phase.is_terminal())]]
            }
        };
        content.push_str(&status(self.phase(), self.to_move()));

        View { content, rows }
    }
}

pub fn gallows(wrong: u8) -> &'static str {
    GALLOWS[usize::from(wrong).min(GALLOWS.len() - 1)]
}

fn hangman_scores(game: &Hangman) -> String {
    game.scores()
        .map(|(actor, score)| format!("{}: {}", mention(actor), score))
        .collect::<Vec<_>>()
        .join("\n")
}

impl Render for Hangman {
    fn view(&self) -> View {
        let mut content = String::new();
        let mut rows = Vec::new();

        if self.in_lobby() {
            content.push_str(&format!(
                "🪢 Hangman lobby opened by {} ({}/{} players)\n",
                mention(self.host()),
                self.players().len(),
                hangman::MAX_PLAYERS
            ));
            for &player in self.players() {
                content.push_str(&format!("• {}\n", mention(player)));
            }
            if self.phase().is_terminal() {
                content.push_str(&status(self.phase(), None));
                return View { content, rows };
            }
            content.push_str("Each player is word master for one round.");
            rows.push(vec![
                Button::new(ComponentId::HangmanJoin, "Join", Style::Primary)
                    .disabled(self.players().len() >= hangman::MAX_PLAYERS),
                Button::new(ComponentId::HangmanStart, "Start", Style::Success)
                    .disabled(self.players().len() < hangman::MIN_PLAYERS),
            ]);
            return View { content, rows };
        }

        if self.mode() == Mode::Multiplayer {
            content.push_str(&format!("🪢 Round {}/{}\n", self.round_number(), self.total_rounds()));
        }
        if let Some(result) = self.last_round().filter(|_| self.round().is_none()) {
            let how = match result.solved_by {
                Some(actor) => format!("found by {}", mention(actor)),
                None => format!("nobody found it, point for {}", mention(result.master)),
            };
            content.push_str(&format!("Last word: **{}**, {}\n", result.word, how));
        }

        if self.awaiting_word() && !self.phase().is_terminal() {
            if let Some(master) = self.to_move() {
                content.push_str(&format!("{} is choosing a word.", mention(master)));
            }
            rows.push(vec![Button::new(ComponentId::HangmanWord, "Set word", Style::Primary)]);
        } else if let Some(round) = self.round() {
            let wrong = hangman::MAX_WRONG - round.remaining();
            let misses: Vec<String> = round.wrong_letters().map(String::from).collect();
            content.push_str(&format!("```\n{}\n```\n", gallows(wrong)));
            content.push_str(&format!("`{}`\n", round.masked()));
            if !misses.is_empty() {
                content.push_str(&format!("Misses: {}\n", misses.join(" ")));
            }
            content.push_str(&format!("Attempts left: {}\n", round.remaining()));
            if self.phase().is_terminal() && !round.is_solved() {
                content.push_str(&format!("The word was **{}**\n", round.word()));
            } else if !self.phase().is_terminal() {
                content.push_str("Type a letter or the whole word.\n");
            }
        }

        if self.mode() == Mode::Multiplayer {
            content.push('\n');
            content.push_str(&hangman_scores(self));
            if self.phase() == Phase::Terminal(Outcome::Finished) {
                let leaders: Vec<String> = self.leaders().into_iter().map(mention).collect();
                content.push_str(&format!("\n🏆 {}", leaders.join(", ")));
            }
        }
        content.push('\n');
        content.push_str(&status(self.phase(), self.to_move()));

        View { content, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::Difficulty;
    use crate::games::{battleship, hangman};
    use rand::{rngs::StdRng, SeedableRng};

    const ALICE: Actor = Actor::User(1);
    const BOB: Actor = Actor::User(2);

    fn buttons(view: &View) -> impl Iterator<Item = &Button> {
        view.rows.iter().flatten()
    }

    #[test]
    fn mentions() {
        assert_eq!(mention(Actor::User(42)), "<@42>");
        assert_eq!(mention(Actor::Bot), "🤖 Bot");
    }

    #[test]
    fn tictactoe_buttons_follow_the_board() {
        let mut game = TicTacToe::new(ALICE, BOB, Difficulty::Easy);
        game.apply(ALICE, &4).unwrap();
        let view = game.view();
        assert_eq!(view.rows.len(), 3);
        let center = &view.rows[1][1];
        assert_eq!(center.id, ComponentId::TicTacToe(4));
        assert_eq!(center.label, "❌");
        assert!(center.disabled);
        assert_eq!(buttons(&view).filter(|b| !b.disabled).count(), 8);
        assert!(view.content.contains("<@2> to play."));
    }

    #[test]
    fn finished_tictactoe_is_frozen() {
        let mut game = TicTacToe::new(ALICE, BOB, Difficulty::Easy);
        for (actor, cell) in [(ALICE, 0), (BOB, 3), (ALICE, 1), (BOB, 4), (ALICE, 2)] {
            game.apply(actor, &cell).unwrap();
        }
        let view = game.view();
        assert!(buttons(&view).all(|b| b.disabled));
        assert_eq!(buttons(&view).filter(|b| b.style == Style::Success).count(), 3);
        assert!(view.content.contains("🏆 <@1> wins!"));
    }

    #[test]
    fn connect4_board_and_full_columns() {
        let mut game = Connect4::new(ALICE, Actor::Bot, Difficulty::Hard);
        let mut player = [ALICE, Actor::Bot].into_iter().cycle();
        for _ in 0..connect4::ROWS {
            game.apply(player.next().unwrap(), &0).unwrap();
        }
        let view = game.view();
        assert!(view.content.contains("*(hard)*"));
        assert_eq!(buttons(&view).count(), connect4::COLUMNS);
        assert!(view.rows.iter().all(|row| row.len() <= 5));
        assert!(buttons(&view).find(|b| b.id == ComponentId::Connect4(0)).unwrap().disabled);
        let board = connect4_board(game.board());
        assert_eq!(board.lines().count(), connect4::ROWS + 1);
        assert!(board.starts_with(&GameCell::Yellow.to_string()));
    }

    #[test]
    fn yams_layout_fits_discord_limits() {
        let mut game = Yams::new(ALICE, BOB, Difficulty::Easy, 3);
        let before = game.view();
        assert!(buttons(&before)
            .filter(|b| matches!(b.id, ComponentId::YamsScore(_) | ComponentId::YamsHold(_)))
            .all(|b| b.disabled));

        game.apply(ALICE, &yams::Action::Roll).unwrap();
        let view = game.view();
        assert!(view.rows.len() <= 5);
        assert!(view.rows.iter().all(|row| row.len() <= 5));
        assert_eq!(buttons(&view).count(), yams::DICE + 1 + Category::ALL.len());
        assert!(buttons(&view).all(|b| !b.disabled));
        assert!(view.content.contains("Dice: "));
    }

    #[test]
    fn gallows_has_a_stage_per_miss() {
        assert!(!gallows(0).contains('O'));
        assert!(gallows(6).contains("/ \\"));
        assert_eq!(gallows(9), gallows(6));
    }

    #[test]
    fn hangman_hides_the_word_until_lost() {
        let mut game = Hangman::solo(ALICE, Difficulty::Easy, "CHAT").unwrap();
        game.apply(ALICE, &hangman::Action::Guess('A')).unwrap();
        let view = game.view();
        assert!(view.content.contains("`_ _ A _`"));
        assert!(!view.content.contains("CHAT"));

        for letter in ['B', 'D', 'E', 'F', 'G', 'I'] {
            game.apply(ALICE, &hangman::Action::Guess(letter)).unwrap();
        }
        let view = game.view();
        assert!(view.content.contains("**CHAT**"));
        assert!(view.content.contains("Hanged"));
    }

    #[test]
    fn hangman_lobby_buttons() {
        let mut game = Hangman::lobby(ALICE);
        let start = |g: &Hangman| buttons(&g.view()).find(|b| b.id == ComponentId::HangmanStart).cloned();
        assert!(start(&game).unwrap().disabled);
        game.apply(BOB, &hangman::Action::Join).unwrap();
        assert!(!start(&game).unwrap().disabled);
        game.apply(ALICE, &hangman::Action::Start).unwrap();
        let view = game.view();
        assert!(view.content.contains("<@1> is choosing a word."));
        assert_eq!(buttons(&view).next().unwrap().id, ComponentId::HangmanWord);
    }

    #[test]
    fn battleship_public_view_never_shows_ships() {
        let mut rng = StdRng::seed_from_u64(8);
        let game = Battleship::new(ALICE, Actor::Bot, Difficulty::Medium, &mut rng);
        let public = game.view();
        assert!(public.content.contains("✅ 🤖 Bot"));
        assert!(!public.content.contains('#'));

        let bot_side = battleship_private(&game, PlayerSlot::Second);
        let ship_cells: usize = battleship::ShipKind::FLEET.iter().map(|k| k.len()).sum();
        assert_eq!(bot_side.matches('#').count(), ship_cells);
        assert!(battleship_private(&game, PlayerSlot::First).contains("Still to place"));
    }
}
