//! Discord side of the games: starting them, routing clicks, modals and chat
//! messages to the coordinator, running the bot and the timers, and keeping
//! the board messages up to date.

use crate::command::{Command, GameKind, Opponent};
use crate::component::{self, ComponentId};
use crate::config::Config;
use crate::coordinator::{self, Submission};
use crate::fivem::{self, FivemClient};
use crate::games::battleship::{self, Battleship, Coord, Placement};
use crate::games::connect4::Connect4;
use crate::games::hangman::{self, Hangman};
use crate::games::tictactoe::TicTacToe;
use crate::games::yams::{self, Yams};
use crate::games::{Actor, Difficulty, MoveError, Phase, TurnBased};
use crate::render::{self, Render, Style, View};
use crate::session::{Session, SessionKey, SessionRegistry, TimerKind};
use futures::StreamExt;
use rand::{rngs::StdRng, SeedableRng};
use serenity::builder::{
    CreateActionRow, CreateButton, CreateInputText, CreateInteractionResponse, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage, CreateMessage, CreateModal, EditMessage,
};
use serenity::model::prelude::*;
use serenity::prelude::*;
use std::time::Duration;
use tokio::task::AbortHandle;

const CHALLENGE_TIMEOUT: Duration = Duration::from_secs(60);
const CHANNEL_BUSY: &str = "A game is already running in this channel.";

const HELP: &str = "\
**Games**
`{p}tictactoe <@user|bot> [easy|medium|hard]`
`{p}connect4 <@user|bot> [difficulty]`
`{p}battleship <@user|bot> [difficulty]`: fire by typing a cell like `B7`
`{p}yams [<@user|bot>] [difficulty]`
`{p}hangman`: open a lobby, `{p}hangman bot [difficulty]` to play alone
**Other**
`{p}stop`: abandon the battleship or hangman game you started here
`{p}fivem`: game server status";

#[derive(Debug, Clone, Copy)]
struct Timing {
    bot_move_delay: Duration,
    setup_timeout: Duration,
    move_timeout: Duration,
}

/// Every live game, one registry per game type.
pub struct GameModel {
    timing: Timing,
    tictactoe: SessionRegistry<TicTacToe>,
    connect4: SessionRegistry<Connect4>,
    yams: SessionRegistry<Yams>,
    battleship: SessionRegistry<Battleship>,
    hangman: SessionRegistry<Hangman>,
}

impl TypeMapKey for GameModel {
    type Value = GameModel;
}

impl GameModel {
    pub fn new(config: &Config) -> Self {
        GameModel {
            timing: Timing {
                bot_move_delay: config.bot_move_delay,
                setup_timeout: config.setup_timeout,
                move_timeout: config.move_timeout,
            },
            tictactoe: SessionRegistry::new(),
            connect4: SessionRegistry::new(),
            yams: SessionRegistry::new(),
            battleship: SessionRegistry::new(),
            hangman: SessionRegistry::new(),
        }
    }

    /// Whether a text-driven game already owns `channel`.
    fn channel_busy(&self, channel: ChannelId) -> bool {
        self.channel_taken(SessionKey(channel.get()))
    }

    fn channel_taken(&self, key: SessionKey) -> bool {
        self.battleship.contains(key) || self.hangman.contains(key)
    }

    /// Registers a session. A channel-keyed game is refused while the channel
    /// hosts any channel-keyed game, whatever its type.
    fn open<G: Game>(&mut self, key: SessionKey, session: Session<G>) -> Result<(), Session<G>> {
        if G::BY_CHANNEL && self.channel_taken(key) {
            return Err(session);
        }
        G::registry(self).open(key, session)
    }
}

/// What the chat layer needs to know about each game type.
pub trait Game: TurnBased + Render + Send + Sync + Sized + 'static {
    const NAME: &'static str;
    /// Sessions are keyed by channel instead of by board message.
    const BY_CHANNEL: bool = false;

    fn registry(model: &mut GameModel) -> &mut SessionRegistry<Self>;

    /// Moves arrive as chat messages, so every update is posted as a new
    /// board below them instead of editing the old one.
    fn text_driven(&self) -> bool {
        false
    }

    fn key(channel: ChannelId, message: MessageId) -> SessionKey {
        match Self::BY_CHANNEL {
            true => SessionKey(channel.get()),
            false => SessionKey(message.get()),
        }
    }
}

impl Game for TicTacToe {
    const NAME: &'static str = "tic-tac-toe";

    fn registry(model: &mut GameModel) -> &mut SessionRegistry<Self> {
        &mut model.tictactoe
    }
}

impl Game for Connect4 {
    const NAME: &'static str = "connect 4";

    fn registry(model: &mut GameModel) -> &mut SessionRegistry<Self> {
        &mut model.connect4
    }
}

impl Game for Yams {
    const NAME: &'static str = "yams";

    fn registry(model: &mut GameModel) -> &mut SessionRegistry<Self> {
        &mut model.yams
    }
}

impl Game for Battleship {
    const NAME: &'static str = "battleship";
    const BY_CHANNEL: bool = true;

    fn registry(model: &mut GameModel) -> &mut SessionRegistry<Self> {
        &mut model.battleship
    }

    fn text_driven(&self) -> bool {
        self.phase() != Phase::Setup
    }
}

impl Game for Hangman {
    const NAME: &'static str = "hangman";
    const BY_CHANNEL: bool = true;

    fn registry(model: &mut GameModel) -> &mut SessionRegistry<Self> {
        &mut model.hangman
    }

    fn text_driven(&self) -> bool {
        !self.in_lobby()
    }
}

/// Snapshot of a session taken under the lock, published after it is released.
struct Board {
    view: View,
    channel: ChannelId,
    message: Option<MessageId>,
    repost: bool,
    phase: Phase,
}

impl Board {
    fn of<G: Game>(session: &Session<G>) -> Board {
        Board {
            view: session.game.view(),
            channel: ChannelId::new(session.channel),
            message: session.message.map(MessageId::new),
            repost: session.game.text_driven(),
            phase: session.game.phase(),
        }
    }
}

enum Step {
    Ignored,
    Rejected(MoveError),
    Update { board: Board, bot_next: bool, timing: Timing },
    Finished(Board),
}

/// The way a player acted, which is also where the answer goes.
#[derive(Clone, Copy)]
enum Reply<'a> {
    Component(&'a ComponentInteraction),
    Modal(&'a ModalInteraction),
    Text(&'a Message),
}

impl Reply<'_> {
    async fn respond(self, ctx: &Context, response: CreateInteractionResponse) {
        let result = match self {
            Reply::Component(interaction) => interaction.create_response(ctx, response).await,
            Reply::Modal(interaction) => interaction.create_response(ctx, response).await,
            Reply::Text(_) => Ok(()),
        };
        if let Err(e) = result {
            log::warn!("Could not answer interaction: {}", e);
        }
    }

    async fn acknowledge(self, ctx: &Context) {
        self.respond(ctx, CreateInteractionResponse::Acknowledge).await
    }

    /// Private answer for interactions, a plain reply for chat messages.
    async fn tell(self, ctx: &Context, text: impl Into<String>) {
        match self {
            Reply::Text(msg) => {
                if let Err(e) = msg.reply(ctx, text).await {
                    log::warn!("Could not reply in {}: {}", msg.channel_id, e);
                }
            }
            _ => {
                let message = CreateInteractionResponseMessage::new().content(text).ephemeral(true);
                self.respond(ctx, CreateInteractionResponse::Message(message)).await
            }
        }
    }

    async fn reject(self, ctx: &Context, error: &MoveError) {
        if let Reply::Text(msg) = self {
            if let Err(e) = msg.react(ctx, '❌').await {
                log::warn!("Could not react in {}: {}", msg.channel_id, e);
            }
        }
        self.tell(ctx, rejection(error)).await
    }

    async fn follow_up(self, ctx: &Context, text: String) {
        let followup = CreateInteractionResponseFollowup::new().content(text).ephemeral(true);
        let result = match self {
            Reply::Component(interaction) => interaction.create_followup(ctx, followup).await.map(drop),
            Reply::Modal(interaction) => interaction.create_followup(ctx, followup).await.map(drop),
            Reply::Text(_) => Ok(()),
        };
        if let Err(e) = result {
            log::warn!("Could not send follow-up: {}", e);
        }
    }
}

fn rejection(error: &MoveError) -> String {
    format!("❌ {}", error)
}

fn button_style(style: Style) -> ButtonStyle {
    match style {
        Style::Primary => ButtonStyle::Primary,
        Style::Secondary => ButtonStyle::Secondary,
        Style::Success => ButtonStyle::Success,
        Style::Danger => ButtonStyle::Danger,
    }
}

fn components(view: &View) -> Vec<CreateActionRow> {
    view.rows
        .iter()
        .map(|row| {
            CreateActionRow::Buttons(
                row.iter()
                    .map(|button| {
                        CreateButton::new(button.id.custom_id())
                            .label(&button.label)
                            .style(button_style(button.style))
                            .disabled(button.disabled)
                    })
                    .collect(),
            )
        })
        .collect()
}

async fn say(ctx: &Context, channel: ChannelId, text: impl Into<String>) {
    if let Err(e) = channel.say(ctx, text).await {
        log::warn!("Could not send message to {}: {}", channel, e);
    }
}

/// Handles an incoming command.
pub async fn run_command(ctx: &Context, msg: &Message, prefix: &str, command: Command) {
    match command {
        Command::Challenge {
            game,
            channel,
            challenger,
            opponent,
            difficulty,
        } => {
            if game == GameKind::Battleship && channel_busy(ctx, channel).await {
                say(ctx, channel, CHANNEL_BUSY).await;
                return;
            }
            match opponent {
                Opponent::Bot => start_versus(ctx, game, channel, challenger, Actor::Bot, difficulty, None).await,
                Opponent::User(opponent) => handle_challenge(ctx, game, channel, challenger, opponent, difficulty).await,
            }
        }
        Command::Hangman {
            channel,
            host,
            solo,
            difficulty,
        } => {
            if channel_busy(ctx, channel).await {
                say(ctx, channel, CHANNEL_BUSY).await;
                return;
            }
            let host = Actor::User(host.get());
            if solo {
                let word = hangman::random_word(difficulty, &mut StdRng::from_entropy());
                match Hangman::solo(host, difficulty, word) {
                    Ok(game) => start_game(ctx, channel, game, host, None).await,
                    Err(e) => log::error!("Word list entry `{}` is not playable: {}", word, e),
                }
            } else {
                start_game(ctx, channel, Hangman::lobby(host), host, None).await
            }
        }
        Command::Stop { channel, author } => stop(ctx, msg, channel, Actor::User(author.get())).await,
        Command::Fivem { channel } => fivem_status(ctx, channel).await,
        Command::Help { channel } => say(ctx, channel, HELP.replace("{p}", prefix)).await,
    }
}

async fn channel_busy(ctx: &Context, channel: ChannelId) -> bool {
    let data = ctx.data.read().await;
    data.get::<GameModel>().map_or(false, |model| model.channel_busy(channel))
}

/// Sends a message indicating that a challenge has been made, and starts the
/// game once the opponent accepts it.
async fn handle_challenge(
    ctx: &Context,
    game: GameKind,
    channel: ChannelId,
    challenger: UserId,
    opponent: UserId,
    difficulty: Difficulty,
) {
    let buttons = CreateActionRow::Buttons(vec![
        CreateButton::new(ComponentId::ChallengeAccept.custom_id())
            .label("Accept")
            .style(ButtonStyle::Success),
        CreateButton::new(ComponentId::ChallengeDecline.custom_id())
            .label("Decline")
            .style(ButtonStyle::Danger),
    ]);
    let name = match game {
        GameKind::TicTacToe => TicTacToe::NAME,
        GameKind::Connect4 => Connect4::NAME,
        GameKind::Battleship => Battleship::NAME,
        GameKind::Yams => Yams::NAME,
    };
    let challenge = CreateMessage::new()
        .content(format!(
            "{} has challenged {} to a game of {}!",
            challenger.mention(),
            opponent.mention(),
            name
        ))
        .components(vec![buttons]);
    let message = match channel.send_message(ctx, challenge).await {
        Ok(message) => message,
        Err(e) => {
            log::warn!("Could not send challenge to {}: {}", channel, e);
            return;
        }
    };

    let mut answers = message
        .await_component_interactions(&ctx.shard)
        .timeout(CHALLENGE_TIMEOUT)
        .stream();
    let answer = loop {
        match answers.next().await {
            None => break None,
            Some(interaction) if interaction.user.id != opponent => {
                Reply::Component(&interaction)
                    .tell(ctx, format!("This challenge is for {}.", opponent.mention()))
                    .await
            }
            Some(interaction) => break Some(interaction),
        }
    };

    match answer {
        None => {
            let expired = EditMessage::new()
                .content(format!("{}'s challenge was not answered in time.", challenger.mention()))
                .components(vec![]);
            if let Err(e) = channel.edit_message(ctx, message.id, expired).await {
                log::warn!("Could not edit challenge in {}: {}", channel, e);
            }
        }
        Some(interaction) if interaction.data.custom_id == ComponentId::ChallengeAccept.custom_id() => {
            log::info!("{} accepted a {} challenge in {}", opponent, name, channel);
            let opponent = Actor::User(opponent.get());
            start_versus(ctx, game, channel, challenger, opponent, difficulty, Some(&interaction)).await
        }
        Some(interaction) => {
            let declined = CreateInteractionResponseMessage::new()
                .content(format!("{} declined the challenge.", opponent.mention()))
                .components(vec![]);
            Reply::Component(&interaction)
                .respond(ctx, CreateInteractionResponse::UpdateMessage(declined))
                .await
        }
    }
}

async fn start_versus(
    ctx: &Context,
    game: GameKind,
    channel: ChannelId,
    challenger: UserId,
    opponent: Actor,
    difficulty: Difficulty,
    via: Option<&ComponentInteraction>,
) {
    let challenger = Actor::User(challenger.get());
    match game {
        GameKind::TicTacToe => {
            let game = TicTacToe::new(challenger, opponent, difficulty);
            start_game(ctx, channel, game, challenger, via).await
        }
        GameKind::Connect4 => {
            let (red, yellow) = if rand::random::<bool>() {
                (challenger, opponent)
            } else {
                (opponent, challenger)
            };
            start_game(ctx, channel, Connect4::new(red, yellow, difficulty), challenger, via).await
        }
        GameKind::Battleship => {
            let game = Battleship::new(challenger, opponent, difficulty, &mut StdRng::from_entropy());
            start_game(ctx, channel, game, challenger, via).await
        }
        GameKind::Yams => {
            let game = Yams::new(challenger, opponent, difficulty, rand::random());
            start_game(ctx, channel, game, challenger, via).await
        }
    }
}

/// Registers the session, then shows the first board: in the challenge
/// message when there is one, otherwise as a new message.
async fn start_game<G: Game>(
    ctx: &Context,
    channel: ChannelId,
    game: G,
    owner: Actor,
    via: Option<&ComponentInteraction>,
) {
    let phase = game.phase();
    let bot_first = game.to_move() == Some(Actor::Bot);
    let mut session = Session::new(game, channel.get(), owner);

    // a message-keyed board needs its message before it has a key
    let key = match via {
        Some(interaction) => {
            session.message = Some(interaction.message.id.get());
            G::key(channel, interaction.message.id)
        }
        None if G::BY_CHANNEL => SessionKey(channel.get()),
        None => {
            let view = session.game.view();
            let board = CreateMessage::new().content(&view.content).components(components(&view));
            match channel.send_message(ctx, board).await {
                Ok(message) => {
                    session.message = Some(message.id.get());
                    SessionKey(message.id.get())
                }
                Err(e) => {
                    log::warn!("Could not send {} board to {}: {}", G::NAME, channel, e);
                    return;
                }
            }
        }
    };
    let board = Board::of(&session);

    let timing = {
        let mut data = ctx.data.write().await;
        let Some(model) = data.get_mut::<GameModel>() else {
            return;
        };
        let timing = model.timing;
        model.open(key, session).ok().map(|()| timing)
    };
    let Some(timing) = timing else {
        match via {
            Some(interaction) => {
                let busy = CreateInteractionResponseMessage::new()
                    .content(CHANNEL_BUSY)
                    .components(vec![]);
                Reply::Component(interaction)
                    .respond(ctx, CreateInteractionResponse::UpdateMessage(busy))
                    .await
            }
            None => say(ctx, channel, CHANNEL_BUSY).await,
        }
        return;
    };
    log::info!("Started {} {} in {}", G::NAME, key, channel);

    match via {
        Some(interaction) => {
            let first = CreateInteractionResponseMessage::new()
                .content(&board.view.content)
                .components(components(&board.view));
            Reply::Component(interaction)
                .respond(ctx, CreateInteractionResponse::UpdateMessage(first))
                .await
        }
        None if G::BY_CHANNEL => publish::<G>(ctx, key, board).await,
        None => {}
    }

    match phase {
        Phase::Setup => arm_timer::<G>(ctx, key, TimerKind::Setup, timing.setup_timeout).await,
        _ => arm_timer::<G>(ctx, key, TimerKind::Inactivity, timing.move_timeout).await,
    }
    if bot_first {
        schedule_bot::<G>(ctx, key, timing.bot_move_delay).await;
    }
}

/// Runs one player action through the coordinator and shows the result.
/// Returns whether the action was accepted.
async fn apply_action<G: Game>(ctx: &Context, reply: Reply<'_>, key: SessionKey, actor: Actor, action: G::Action) -> bool {
    let step = {
        let mut data = ctx.data.write().await;
        let Some(model) = data.get_mut::<GameModel>() else {
            return false;
        };
        let timing = model.timing;
        let registry = G::registry(model);
        match coordinator::submit(registry, key, actor, &action) {
            Submission::Ignored => Step::Ignored,
            Submission::Rejected(e) => Step::Rejected(e),
            Submission::Continued { bot_next } => match registry.get_mut(key) {
                Some(session) => {
                    if session.game.phase() == Phase::Playing {
                        session.timers.cancel(TimerKind::Setup);
                    }
                    Step::Update {
                        board: Board::of(session),
                        bot_next,
                        timing,
                    }
                }
                None => Step::Ignored,
            },
            Submission::Finished(session, outcome) => {
                log::info!("{} {} ended: {:?} after {:?}", G::NAME, key, outcome, session.played_for());
                Step::Finished(Board::of(&session))
            }
        }
    };

    match step {
        Step::Ignored => {
            if !matches!(reply, Reply::Text(_)) {
                reply.tell(ctx, "This game is over.").await;
            }
            false
        }
        Step::Rejected(e) => {
            reply.reject(ctx, &e).await;
            false
        }
        Step::Update { board, bot_next, timing } => {
            let playing = board.phase == Phase::Playing;
            show::<G>(ctx, reply, key, board).await;
            if playing {
                arm_timer::<G>(ctx, key, TimerKind::Inactivity, timing.move_timeout).await;
            }
            if bot_next {
                schedule_bot::<G>(ctx, key, timing.bot_move_delay).await;
            }
            true
        }
        Step::Finished(board) => {
            show::<G>(ctx, reply, key, board).await;
            true
        }
    }
}

/// Updates the clicked board in place when possible, otherwise edits or
/// reposts the board message.
async fn show<G: Game>(ctx: &Context, reply: Reply<'_>, key: SessionKey, board: Board) {
    if let Reply::Component(interaction) = reply {
        if !board.repost && board.message == Some(interaction.message.id) {
            let update = CreateInteractionResponseMessage::new()
                .content(&board.view.content)
                .components(components(&board.view));
            reply.respond(ctx, CreateInteractionResponse::UpdateMessage(update)).await;
            return;
        }
    }
    reply.acknowledge(ctx).await;
    publish::<G>(ctx, key, board).await;
}

async fn publish<G: Game>(ctx: &Context, key: SessionKey, board: Board) {
    let Board {
        view,
        channel,
        message,
        repost,
        ..
    } = board;

    match message.filter(|_| !repost) {
        Some(message) => {
            let edit = EditMessage::new().content(&view.content).components(components(&view));
            if let Err(e) = channel.edit_message(ctx, message, edit).await {
                log::warn!("Could not edit {} board in {}: {}", G::NAME, channel, e);
            }
        }
        None => {
            let create = CreateMessage::new().content(&view.content).components(components(&view));
            match channel.send_message(ctx, create).await {
                Ok(sent) => {
                    let mut data = ctx.data.write().await;
                    if let Some(session) = data.get_mut::<GameModel>().and_then(|m| G::registry(m).get_mut(key)) {
                        session.message = Some(sent.id.get());
                    }
                }
                Err(e) => log::warn!("Could not send {} board to {}: {}", G::NAME, channel, e),
            }
        }
    }
}

async fn store_timer<G: Game>(ctx: &Context, key: SessionKey, kind: TimerKind, handle: AbortHandle) {
    let mut data = ctx.data.write().await;
    match data.get_mut::<GameModel>().and_then(|m| G::registry(m).get_mut(key)) {
        Some(session) => session.timers.arm(kind, handle),
        None => handle.abort(),
    }
}

async fn arm_timer<G: Game>(ctx: &Context, key: SessionKey, kind: TimerKind, after: Duration) {
    let task_ctx = ctx.clone();
    let task = tokio::spawn(async move {
        tokio::time::sleep(after).await;
        expire_session::<G>(&task_ctx, key, Some(kind)).await;
    });
    store_timer::<G>(ctx, key, kind, task.abort_handle()).await;
}

/// Ends a session from outside and shows its final board. A timer passes its
/// own kind: it must not be aborted by the teardown it is performing.
async fn expire_session<G: Game>(ctx: &Context, key: SessionKey, timer: Option<TimerKind>) {
    let board = {
        let mut data = ctx.data.write().await;
        let Some(model) = data.get_mut::<GameModel>() else {
            return;
        };
        let registry = G::registry(model);
        let Some(session) = registry.get_mut(key) else {
            return;
        };
        if let Some(kind) = timer {
            session.timers.disarm(kind);
            if kind == TimerKind::Setup && session.game.phase() != Phase::Setup {
                return;
            }
        }
        match coordinator::expire(registry, key) {
            Some(session) => Board::of(&session),
            None => return,
        }
    };
    publish::<G>(ctx, key, board).await;
}

/// Lets the bot play after a short pause, for as long as it keeps the turn.
async fn schedule_bot<G: Game>(ctx: &Context, key: SessionKey, delay: Duration) {
    let task_ctx = ctx.clone();
    let task = tokio::spawn(async move {
        loop {
            tokio::time::sleep(delay).await;
            let (board, bot_next, timing) = {
                let mut data = task_ctx.data.write().await;
                let Some(model) = data.get_mut::<GameModel>() else {
                    return;
                };
                let timing = model.timing;
                let registry = G::registry(model);
                match coordinator::play_bot(registry, key, &mut StdRng::from_entropy()) {
                    Submission::Continued { bot_next } => match registry.get(key) {
                        Some(session) => (Board::of(session), bot_next, Some(timing)),
                        None => return,
                    },
                    Submission::Finished(mut session, outcome) => {
                        session.timers.disarm(TimerKind::BotMove);
                        log::info!("{} {} ended: {:?} after {:?}", G::NAME, key, outcome, session.played_for());
                        (Board::of(&session), false, None)
                    }
                    Submission::Rejected(e) => {
                        log::warn!("Bot move rejected in {} {}: {}", G::NAME, key, e);
                        return;
                    }
                    Submission::Ignored => return,
                }
            };
            publish::<G>(&task_ctx, key, board).await;
            if !bot_next {
                if let Some(timing) = timing {
                    arm_timer::<G>(&task_ctx, key, TimerKind::Inactivity, timing.move_timeout).await;
                }
                break;
            }
        }
    });
    store_timer::<G>(ctx, key, TimerKind::BotMove, task.abort_handle()).await;
}

async fn stop(ctx: &Context, msg: &Message, channel: ChannelId, actor: Actor) {
    enum Running {
        Battleship,
        Hangman,
    }

    let key = SessionKey(channel.get());
    let running = {
        let mut data = ctx.data.write().await;
        let Some(model) = data.get_mut::<GameModel>() else {
            return;
        };
        match (model.battleship.get(key), model.hangman.get(key)) {
            (Some(session), _) => Some((Running::Battleship, session.owner)),
            (None, Some(session)) => Some((Running::Hangman, session.owner)),
            (None, None) => None,
        }
    };

    let reply = Reply::Text(msg);
    match running {
        None => reply.tell(ctx, "There is no game to stop in this channel.").await,
        Some((_, owner)) if owner != actor => {
            reply
                .tell(ctx, format!("Only {} can stop this game.", render::mention(owner)))
                .await
        }
        Some((Running::Battleship, _)) => expire_session::<Battleship>(ctx, key, None).await,
        Some((Running::Hangman, _)) => expire_session::<Hangman>(ctx, key, None).await,
    }
}

async fn fivem_status(ctx: &Context, channel: ChannelId) {
    let client = {
        let data = ctx.data.read().await;
        data.get::<FivemClient>().cloned()
    };
    let text = match client {
        None => format!("❌ {}", fivem::FivemError::NotConfigured),
        Some(client) => match client.status().await {
            Ok(status) => fivem::render(&status),
            Err(e) => format!("❌ {}", e),
        },
    };
    say(ctx, channel, text).await;
}

fn placement_modal() -> CreateModal {
    let ship = CreateInputText::new(InputTextStyle::Short, "Ship", component::SHIP_INPUT)
        .placeholder("carrier, battleship, cruiser, submarine or destroyer");
    let cell = CreateInputText::new(InputTextStyle::Short, "First cell (A1 to J10)", component::CELL_INPUT)
        .placeholder("B2")
        .max_length(3);
    let orientation = CreateInputText::new(InputTextStyle::Short, "Orientation (h or v)", component::ORIENTATION_INPUT)
        .placeholder("h")
        .max_length(10);
    CreateModal::new(component::PLACE_MODAL, "Place a ship").components(vec![
        CreateActionRow::InputText(ship),
        CreateActionRow::InputText(cell),
        CreateActionRow::InputText(orientation),
    ])
}

fn word_modal() -> CreateModal {
    let word = CreateInputText::new(InputTextStyle::Short, "Secret word", component::WORD_INPUT)
        .min_length(3)
        .max_length(20);
    CreateModal::new(component::WORD_MODAL, "Choose the word").components(vec![CreateActionRow::InputText(word)])
}

/// The player's private view of their battleship game, if they play in it.
async fn battleship_board(ctx: &Context, key: SessionKey, actor: Actor) -> Result<String, MoveError> {
    let mut data = ctx.data.write().await;
    let session = data
        .get_mut::<GameModel>()
        .and_then(|model| model.battleship.get(key))
        .ok_or(MoveError::NotPlaying)?;
    let slot = session.game.players().slot_of(actor).ok_or(MoveError::NotAParticipant)?;
    Ok(render::battleship_private(&session.game, slot))
}

pub async fn handle_component(ctx: &Context, interaction: &ComponentInteraction) {
    let Some(id) = ComponentId::parse(&interaction.data.custom_id) else {
        log::debug!("Unknown component `{}`", interaction.data.custom_id);
        return;
    };
    let reply = Reply::Component(interaction);
    let actor = Actor::User(interaction.user.id.get());
    let by_message = SessionKey(interaction.message.id.get());
    let by_channel = SessionKey(interaction.channel_id.get());

    match id {
        // answered by the challenge collector
        ComponentId::ChallengeAccept | ComponentId::ChallengeDecline => {}
        ComponentId::TicTacToe(cell) => {
            apply_action::<TicTacToe>(ctx, reply, by_message, actor, cell).await;
        }
        ComponentId::Connect4(column) => {
            apply_action::<Connect4>(ctx, reply, by_message, actor, column).await;
        }
        ComponentId::YamsRoll => {
            apply_action::<Yams>(ctx, reply, by_message, actor, yams::Action::Roll).await;
        }
        ComponentId::YamsHold(die) => {
            apply_action::<Yams>(ctx, reply, by_message, actor, yams::Action::ToggleHold(die)).await;
        }
        ComponentId::YamsScore(category) => {
            apply_action::<Yams>(ctx, reply, by_message, actor, yams::Action::Score(category)).await;
        }
        ComponentId::BattleshipRandom => {
            let layout = {
                let mut data = ctx.data.write().await;
                let Some(model) = data.get_mut::<GameModel>() else {
                    return;
                };
                model.battleship.get(by_channel).and_then(|session| {
                    let slot = session.game.players().slot_of(actor)?;
                    Some(session.game.side(slot).fleet.random_layout(&mut StdRng::from_entropy()))
                })
            };
            match layout {
                Some(layout) => {
                    let action = battleship::Action::PlaceAll(layout);
                    if apply_action::<Battleship>(ctx, reply, by_channel, actor, action).await {
                        private_board(ctx, reply, by_channel, actor).await;
                    }
                }
                None => reply.reject(ctx, &MoveError::NotAParticipant).await,
            }
        }
        ComponentId::BattleshipPlace => {
            reply
                .respond(ctx, CreateInteractionResponse::Modal(placement_modal()))
                .await
        }
        ComponentId::BattleshipReady => {
            apply_action::<Battleship>(ctx, reply, by_channel, actor, battleship::Action::Ready).await;
        }
        ComponentId::BattleshipBoard => match battleship_board(ctx, by_channel, actor).await {
            Ok(text) => reply.tell(ctx, text).await,
            Err(e) => reply.reject(ctx, &e).await,
        },
        ComponentId::HangmanJoin => {
            apply_action::<Hangman>(ctx, reply, by_channel, actor, hangman::Action::Join).await;
        }
        ComponentId::HangmanStart => {
            apply_action::<Hangman>(ctx, reply, by_channel, actor, hangman::Action::Start).await;
        }
        ComponentId::HangmanWord => {
            let to_move = {
                let mut data = ctx.data.write().await;
                data.get_mut::<GameModel>()
                    .and_then(|model| model.hangman.get(by_channel))
                    .filter(|session| session.game.awaiting_word())
                    .map(|session| session.game.to_move())
            };
            match to_move {
                Some(Some(master)) if master == actor => {
                    reply.respond(ctx, CreateInteractionResponse::Modal(word_modal())).await
                }
                Some(_) => reply.reject(ctx, &MoveError::OutOfTurn).await,
                None => reply.reject(ctx, &MoveError::NotPlaying).await,
            }
        }
    }
}

async fn private_board(ctx: &Context, reply: Reply<'_>, key: SessionKey, actor: Actor) {
    if let Ok(text) = battleship_board(ctx, key, actor).await {
        reply.follow_up(ctx, text).await;
    }
}

fn modal_value(interaction: &ModalInteraction, id: &str) -> Option<String> {
    interaction
        .data
        .components
        .iter()
        .flat_map(|row| row.components.iter())
        .find_map(|component| match component {
            ActionRowComponent::InputText(input) if input.custom_id == id => input.value.clone(),
            _ => None,
        })
}

fn read_placement(interaction: &ModalInteraction) -> Result<Placement, MoveError> {
    let field = |id: &str| modal_value(interaction, id).ok_or_else(|| MoveError::InvalidInput(id.to_string()));
    Ok(Placement {
        kind: field(component::SHIP_INPUT)?.parse()?,
        at: field(component::CELL_INPUT)?.parse::<Coord>()?,
        orientation: field(component::ORIENTATION_INPUT)?.parse()?,
    })
}

pub async fn handle_modal(ctx: &Context, interaction: &ModalInteraction) {
    let reply = Reply::Modal(interaction);
    let actor = Actor::User(interaction.user.id.get());
    let key = SessionKey(interaction.channel_id.get());

    match interaction.data.custom_id.as_str() {
        component::PLACE_MODAL => match read_placement(interaction) {
            Ok(placement) => {
                let action = battleship::Action::Place(placement);
                if apply_action::<Battleship>(ctx, reply, key, actor, action).await {
                    private_board(ctx, reply, key, actor).await;
                }
            }
            Err(e) => reply.reject(ctx, &e).await,
        },
        component::WORD_MODAL => match modal_value(interaction, component::WORD_INPUT) {
            Some(word) => {
                apply_action::<Hangman>(ctx, reply, key, actor, hangman::Action::SetWord(word)).await;
            }
            None => reply.reject(ctx, &MoveError::InvalidWord).await,
        },
        other => log::debug!("Unknown modal `{}`", other),
    }
}

/// Plain chat messages: shots in a battleship channel, guesses in a hangman
/// channel. A player's malformed cell reference is rejected like an illegal
/// shot. Other chat, or anyone not playing, is left alone.
pub async fn handle_text(ctx: &Context, msg: &Message) {
    enum TextMove {
        Fire(Coord),
        Guess(hangman::Action),
        Invalid(MoveError),
    }

    let key = SessionKey(msg.channel_id.get());
    let actor = Actor::User(msg.author.id.get());
    let text = msg.content.trim();

    let text_move = {
        let mut data = ctx.data.write().await;
        let Some(model) = data.get_mut::<GameModel>() else {
            return;
        };
        if let Some(session) = model.battleship.get(key) {
            let game = &session.game;
            let playing = game.phase() == Phase::Playing && game.players().slot_of(actor).is_some();
            match text.parse::<Coord>() {
                _ if !playing || !battleship::looks_like_coord(text) => None,
                Ok(at) => Some(TextMove::Fire(at)),
                Err(e) => Some(TextMove::Invalid(e)),
            }
        } else if let Some(session) = model.hangman.get(key) {
            let game = &session.game;
            let guessing = game.phase() == Phase::Playing && !game.awaiting_word() && game.is_participant(actor);
            let word_len = game.round().map_or(0, |round| round.word().len());
            match hangman::Action::parse_guess(text, word_len) {
                Some(action) if guessing => Some(TextMove::Guess(action)),
                _ => None,
            }
        } else {
            None
        }
    };

    match text_move {
        Some(TextMove::Fire(at)) => {
            apply_action::<Battleship>(ctx, Reply::Text(msg), key, actor, battleship::Action::Fire(at)).await;
        }
        Some(TextMove::Guess(action)) => {
            apply_action::<Hangman>(ctx, Reply::Text(msg), key, actor, action).await;
        }
        Some(TextMove::Invalid(e)) => Reply::Text(msg).reject(ctx, &e).await,
        None => {}
    }
}
