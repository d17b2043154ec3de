//! Custom ids carried by buttons and modals, `<game>:<verb>[:<arg>]`.

use crate::games::yams::{Category, DICE};
use crate::games::{connect4, tictactoe};

pub const PLACE_MODAL: &str = "bs:place_modal";
pub const WORD_MODAL: &str = "hm:word_modal";

pub const SHIP_INPUT: &str = "ship";
pub const CELL_INPUT: &str = "cell";
pub const ORIENTATION_INPUT: &str = "orientation";
pub const WORD_INPUT: &str = "word";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentId {
    ChallengeAccept,
    ChallengeDecline,
    TicTacToe(usize),
    Connect4(usize),
    YamsRoll,
    YamsHold(usize),
    YamsScore(Category),
    BattleshipRandom,
    BattleshipPlace,
    BattleshipReady,
    BattleshipBoard,
    HangmanJoin,
    HangmanStart,
    HangmanWord,
}

impl ComponentId {
    pub fn parse(custom_id: &str) -> Option<ComponentId> {
        let mut parts = custom_id.split(':');
        let id = match (parts.next()?, parts.next()?, parts.next()) {
            ("challenge", "accept", None) => ComponentId::ChallengeAccept,
            ("challenge", "decline", None) => ComponentId::ChallengeDecline,
            ("ttt", "play", Some(cell)) => {
                ComponentId::TicTacToe(cell.parse().ok().filter(|&c| c < tictactoe::CELLS)?)
            }
            ("c4", "drop", Some(column)) => {
                ComponentId::Connect4(column.parse().ok().filter(|&c| c < connect4::COLUMNS)?)
            }
            ("yams", "roll", None) => ComponentId::YamsRoll,
            ("yams", "hold", Some(die)) => ComponentId::YamsHold(die.parse().ok().filter(|&d| d < DICE)?),
            ("yams", "score", Some(key)) => ComponentId::YamsScore(key.parse().ok()?),
            ("bs", "random", None) => ComponentId::BattleshipRandom,
            ("bs", "place", None) => ComponentId::BattleshipPlace,
            ("bs", "ready", None) => ComponentId::BattleshipReady,
            ("bs", "board", None) => ComponentId::BattleshipBoard,
            ("hm", "join", None) => ComponentId::HangmanJoin,
            ("hm", "start", None) => ComponentId::HangmanStart,
            ("hm", "word", None) => ComponentId::HangmanWord,
            _ => return None,
        };
        match parts.next() {
            Some(_) => None,
            None => Some(id),
        }
    }

    pub fn custom_id(&self) -> String {
        match self {
            ComponentId::ChallengeAccept => "challenge:accept".to_string(),
            ComponentId::ChallengeDecline => "challenge:decline".to_string(),
            ComponentId::TicTacToe(cell) => format!("ttt:play:{}", cell),
            ComponentId::Connect4(column) => format!("c4:drop:{}", column),
            ComponentId::YamsRoll => "yams:roll".to_string(),
            ComponentId::YamsHold(die) => format!("yams:hold:{}", die),
            ComponentId::YamsScore(category) => format!("yams:score:{}", category.key()),
            ComponentId::BattleshipRandom => "bs:random".to_string(),
            ComponentId::BattleshipPlace => "bs:place".to_string(),
            ComponentId::BattleshipReady => "bs:ready".to_string(),
            ComponentId::BattleshipBoard => "bs:board".to_string(),
            ComponentId::HangmanJoin => "hm:join".to_string(),
            ComponentId::HangmanStart => "hm:start".to_string(),
            ComponentId::HangmanWord => "hm:word".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_parse_back() {
        let ids = [
            ComponentId::ChallengeAccept,
            ComponentId::TicTacToe(8),
            ComponentId::Connect4(0),
            ComponentId::YamsHold(4),
            ComponentId::YamsScore(Category::SmallStraight),
            ComponentId::BattleshipReady,
            ComponentId::HangmanWord,
        ];
        for id in ids {
            assert_eq!(ComponentId::parse(&id.custom_id()), Some(id));
        }
    }

    #[test]
    fn malformed_ids_are_dropped() {
        for raw in [
            "",
            "ttt",
            "ttt:play",
            "ttt:play:9",
            "ttt:play:x",
            "c4:drop:7",
            "yams:hold:5",
            "yams:score:brelan",
            "yams:roll:now",
            "bs:fire",
            PLACE_MODAL,
        ] {
            assert_eq!(ComponentId::parse(raw), None, "{raw}");
        }
    }
}
