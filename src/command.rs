use crate::games::Difficulty;
use serenity::model::prelude::*;

/// Represents ways a message may fail to be parsed as a valid command
#[derive(Debug, PartialEq, Clone)]
pub enum ParseCommandError {
    /// This message does not have the bot's prefix
    NoPrefix,
    /// The author of this message is a bot
    BotAuthor,
    /// The target of this command is missing or cannot be challenged
    InvalidTargetUser,
    /// This command doesn't exist or is malformed
    InvalidCommand(String),
    /// The difficulty word is not one we know
    InvalidDifficulty(String),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum GameKind {
    TicTacToe,
    Connect4,
    Battleship,
    Yams,
}

/// Who a challenge is addressed to.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Opponent {
    User(UserId),
    Bot,
}

/// Represents a command sent by a user
#[derive(Debug, PartialEq, Clone)]
pub enum Command {
    Challenge {
        game: GameKind,
        channel: ChannelId,
        challenger: UserId,
        opponent: Opponent,
        difficulty: Difficulty,
    },
    Hangman {
        channel: ChannelId,
        host: UserId,
        /// Single player against a bot word master instead of a lobby.
        solo: bool,
        difficulty: Difficulty,
    },
    Stop {
        channel: ChannelId,
        author: UserId,
    },
    Fivem {
        channel: ChannelId,
    },
    Help {
        channel: ChannelId,
    },
}

pub fn parse_command(msg: &Message, prefix: &str) -> Result<Command, ParseCommandError> {
    let rest = msg.content.strip_prefix(prefix).ok_or(ParseCommandError::NoPrefix)?;
    if msg.author.bot {
        return Err(ParseCommandError::BotAuthor);
    }

    parse_words(rest, msg.channel_id, msg.author.id, |id| {
        msg.mentions.iter().find(|user| user.id == id).map(|user| user.bot)
    })
}

/// Parses what follows the prefix. `is_bot` tells whether a mentioned user
/// is a bot account, if the message carried that mention.
fn parse_words(
    rest: &str,
    channel: ChannelId,
    author: UserId,
    is_bot: impl Fn(UserId) -> Option<bool>,
) -> Result<Command, ParseCommandError> {
    let mut words = rest.split_ascii_whitespace();
    let command_name = words.next();

    let game = match command_name {
        Some("tictactoe") | Some("ttt") => GameKind::TicTacToe,
        Some("connect4") | Some("c4") => GameKind::Connect4,
        Some("battleship") | Some("bs") => GameKind::Battleship,
        Some("yams") | Some("yahtzee") => GameKind::Yams,
        Some("hangman") | Some("pendu") => {
            let mut solo = false;
            let mut difficulty = None;
            for word in words {
                match word {
                    "bot" | "solo" if !solo => solo = true,
                    _ if difficulty.is_none() => difficulty = Some(parse_difficulty(word)?),
                    _ => return Err(ParseCommandError::InvalidCommand(String::from(word))),
                }
            }
            return Ok(Command::Hangman {
                channel,
                host: author,
                solo,
                difficulty: difficulty.unwrap_or_default(),
            });
        }
        Some("stop") => return Ok(Command::Stop { channel, author }),
        Some("fivem") => return Ok(Command::Fivem { channel }),
        Some("help") => return Ok(Command::Help { channel }),
        s => return Err(ParseCommandError::InvalidCommand(String::from(s.unwrap_or("")))),
    };

    let mut opponent = None;
    let mut difficulty = None;
    for word in words {
        if opponent.is_none() {
            if word == "bot" {
                opponent = Some(Opponent::Bot);
                continue;
            }
            if let Some(id) = parse_mention(word) {
                if id == author || is_bot(id) == Some(true) {
                    return Err(ParseCommandError::InvalidTargetUser);
                }
                opponent = Some(Opponent::User(id));
                continue;
            }
        }
        if difficulty.is_some() {
            return Err(ParseCommandError::InvalidCommand(String::from(word)));
        }
        difficulty = Some(parse_difficulty(word)?);
    }

    let opponent = match (opponent, game) {
        (Some(opponent), _) => opponent,
        (None, GameKind::Yams) => Opponent::Bot,
        (None, _) => return Err(ParseCommandError::InvalidTargetUser),
    };

    Ok(Command::Challenge {
        game,
        channel,
        challenger: author,
        opponent,
        difficulty: difficulty.unwrap_or_default(),
    })
}

fn parse_difficulty(word: &str) -> Result<Difficulty, ParseCommandError> {
    word.parse()
        .map_err(|()| ParseCommandError::InvalidDifficulty(String::from(word)))
}

/// Reads `<@123>` or `<@!123>`.
fn parse_mention(word: &str) -> Option<UserId> {
    let id: u64 = word
        .strip_prefix("<@")?
        .strip_suffix('>')?
        .trim_start_matches('!')
        .parse()
        .ok()?;
    (id != 0).then(|| UserId::new(id))
}
