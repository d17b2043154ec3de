use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("expected discord API token in `DISCORD_TOKEN`")]
    MissingToken,
    #[error("`{name}` must be a whole number, got `{value}`")]
    NotANumber { name: &'static str, value: String },
}

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub prefix: String,
    /// Pause before the built-in opponent acts, so its moves can be followed.
    pub bot_move_delay: Duration,
    pub setup_timeout: Duration,
    pub move_timeout: Duration,
    pub fivem_addr: Option<String>,
    pub fivem_cache: Duration,
}

impl Config {
    /// Reads the process environment, after loading `.env` if there is one.
    pub fn from_env() -> Result<Config, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            log::debug!("no .env file loaded: {}", e);
        }
        Config::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
        let number = |name: &'static str, default: u64| -> Result<u64, ConfigError> {
            match lookup(name) {
                Some(value) => value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::NotANumber { name, value }),
                None => Ok(default),
            }
        };

        let token = lookup("DISCORD_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;

        Ok(Config {
            token,
            prefix: lookup("COMMAND_PREFIX")
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| String::from("g!")),
            bot_move_delay: Duration::from_millis(number("BOT_MOVE_DELAY_MS", 1000)?),
            setup_timeout: Duration::from_secs(number("SETUP_TIMEOUT_SECS", 180)?),
            move_timeout: Duration::from_secs(number("MOVE_TIMEOUT_SECS", 300)?),
            fivem_addr: lookup("FIVEM_ADDR").filter(|a| !a.trim().is_empty()),
            fivem_cache: Duration::from_secs(number("FIVEM_CACHE_SECS", 30)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[("DISCORD_TOKEN", "abc")]).unwrap();
        assert_eq!(config.token, "abc");
        assert_eq!(config.prefix, "g!");
        assert_eq!(config.bot_move_delay, Duration::from_secs(1));
        assert_eq!(config.setup_timeout, Duration::from_secs(180));
        assert_eq!(config.move_timeout, Duration::from_secs(300));
        assert_eq!(config.fivem_addr, None);
        assert_eq!(config.fivem_cache, Duration::from_secs(30));
    }

    #[test]
    fn overrides() {
        let config = config(&[
            ("DISCORD_TOKEN", "abc"),
            ("COMMAND_PREFIX", "!"),
            ("BOT_MOVE_DELAY_MS", "250"),
            ("MOVE_TIMEOUT_SECS", " 60 "),
            ("FIVEM_ADDR", "127.0.0.1:30120"),
        ])
        .unwrap();
        assert_eq!(config.prefix, "!");
        assert_eq!(config.bot_move_delay, Duration::from_millis(250));
        assert_eq!(config.move_timeout, Duration::from_secs(60));
        assert_eq!(config.fivem_addr.as_deref(), Some("127.0.0.1:30120"));
    }

    #[test]
    fn errors() {
        assert!(matches!(config(&[]), Err(ConfigError::MissingToken)));
        assert!(matches!(config(&[("DISCORD_TOKEN", "  ")]), Err(ConfigError::MissingToken)));
        match config(&[("DISCORD_TOKEN", "abc"), ("SETUP_TIMEOUT_SECS", "soon")]) {
            Err(ConfigError::NotANumber { name, value }) => {
                assert_eq!(name, "SETUP_TIMEOUT_SECS");
                assert_eq!(value, "soon");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
