//! Status of a FiveM game server, read from its public `dynamic.json` and
//! `players.json` endpoints.

use serde::{Deserialize, Deserializer};
use serenity::prelude::TypeMapKey;
use serenity::utils::MessageBuilder;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_LISTED_PLAYERS: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum FivemError {
    #[error("no FiveM server is configured")]
    NotConfigured,
    #[error("could not reach the server: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Dynamic {
    pub hostname: String,
    pub clients: u32,
    #[serde(rename = "sv_maxclients", deserialize_with = "lenient_u32")]
    pub max_clients: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Player {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub ping: u32,
}

#[derive(Debug, Clone)]
pub struct Status {
    pub server: Dynamic,
    pub players: Vec<Player>,
    /// False when this is an old snapshot served because the server could
    /// not be reached.
    pub online: bool,
    pub fetched_at: Instant,
}

/// The server reports `sv_maxclients` as a string.
fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Int(u32),
        Text(String),
    }

    match Number::deserialize(deserializer)? {
        Number::Int(n) => Ok(n),
        Number::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

pub struct FivemClient {
    http: reqwest::Client,
    addr: String,
    ttl: Duration,
    cache: Mutex<Option<Status>>,
}

impl TypeMapKey for FivemClient {
    type Value = Arc<FivemClient>;
}

impl FivemClient {
    pub fn new(addr: impl Into<String>, ttl: Duration) -> Result<FivemClient, FivemError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(FivemClient {
            http,
            addr: addr.into(),
            ttl,
            cache: Mutex::new(None),
        })
    }

    /// Current status, from the cache while it is fresh.
    pub async fn status(&self) -> Result<Status, FivemError> {
        let mut cache = self.cache.lock().await;
        if let Some(status) = cache.as_ref().filter(|s| s.online && s.fetched_at.elapsed() < self.ttl) {
            return Ok(status.clone());
        }

        let fetched = self.fetch().await;
        if let Err(e) = &fetched {
            log::warn!("FiveM server {} unreachable: {}", self.addr, e);
        }
        let status = resolve(cache.as_ref(), fetched)?;
        if status.online {
            *cache = Some(status.clone());
        }
        Ok(status)
    }

    async fn fetch(&self) -> Result<Status, FivemError> {
        let server: Dynamic = self
            .http
            .get(format!("http://{}/dynamic.json", self.addr))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let players: Vec<Player> = self
            .http
            .get(format!("http://{}/players.json", self.addr))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        log::debug!("FiveM server {} has {} players", self.addr, players.len());

        Ok(Status {
            server,
            players,
            online: true,
            fetched_at: Instant::now(),
        })
    }
}

/// A failed fetch falls back to the last snapshot, marked offline.
fn resolve(cached: Option<&Status>, fetched: Result<Status, FivemError>) -> Result<Status, FivemError> {
    match (fetched, cached) {
        (Ok(status), _) => Ok(status),
        (Err(_), Some(stale)) => Ok(Status {
            online: false,
            ..stale.clone()
        }),
        (Err(e), None) => Err(e),
    }
}

/// Drops the `^0`..`^9` colour codes servers put in their names.
pub fn strip_colors(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '^' && chars.peek().map_or(false, char::is_ascii_digit) {
            chars.next();
            continue;
        }
        out.push(c);
    }
    out
}

/// A server-chosen name made safe to show: no colour codes, no markdown.
fn display_name(name: &str) -> String {
    MessageBuilder::new().push_safe(strip_colors(name)).build()
}

pub fn render(status: &Status) -> String {
    let state = if status.online {
        "🟢 Online"
    } else {
        "🔴 Offline (last known state)"
    };
    let mut out = format!(
        "**{}**\n{}\nPlayers: {}/{}\n",
        display_name(&status.server.hostname),
        state,
        status.server.clients,
        status.server.max_clients
    );

    let mut players: Vec<&Player> = status.players.iter().collect();
    players.sort_by_key(|p| p.id);
    for player in players.iter().take(MAX_LISTED_PLAYERS) {
        out.push_str(&format!("`#{}` {} ({} ms)\n", player.id, display_name(&player.name), player.ping));
    }
    if players.len() > MAX_LISTED_PLAYERS {
        out.push_str(&format!("...and {} more\n", players.len() - MAX_LISTED_PLAYERS));
    }
    out
}
