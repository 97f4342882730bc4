//! Remote commands carried in the collector's telemetry response.
//!
//! A response body of the form `{"command": "...", "payload": "..."}`
//! yields at most one [`RemoteCommand`].  The [`CommandProcessor`] applies
//! in-place effects itself and hands anything that needs a restart back to
//! the lifecycle loop as [`CommandOutcome::RestartRequired`].

use core::fmt;

use log::{info, warn};
use serde_json::Value;

use super::config_manager::ConfigManager;
use super::ports::{ConfigError, RestartReason, StatusSurface, StoragePort};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandName {
    DisableScreen,
    EnableScreen,
    Reboot,
    ChangeReadingTime,
    FactoryReset,
    Unrecognized(String),
}

impl CommandName {
    pub fn parse(name: &str) -> Self {
        match name {
            "disable_screen" => Self::DisableScreen,
            "enable_screen" => Self::EnableScreen,
            "reboot" => Self::Reboot,
            "change_reading_time" => Self::ChangeReadingTime,
            "factory_reset" => Self::FactoryReset,
            other => Self::Unrecognized(other.into()),
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DisableScreen => f.write_str("disable_screen"),
            Self::EnableScreen => f.write_str("enable_screen"),
            Self::Reboot => f.write_str("reboot"),
            Self::ChangeReadingTime => f.write_str("change_reading_time"),
            Self::FactoryReset => f.write_str("factory_reset"),
            Self::Unrecognized(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    pub name: CommandName,
    pub argument: Option<String>,
}

impl RemoteCommand {
    /// Extract the command from a telemetry response body.
    ///
    /// Bodies of two bytes or fewer (`""`, `{}`), bodies that are not JSON
    /// objects, and objects whose `command` is missing or not a string all
    /// mean "no command".  A non-string `payload` is treated as absent.
    pub fn from_response(body: &str) -> Option<Self> {
        if body.len() <= 2 {
            return None;
        }
        let doc: Value = match serde_json::from_str(body) {
            Ok(v) => v,
            Err(e) => {
                warn!("command: response is not JSON ({e})");
                return None;
            }
        };
        let name = doc.get("command")?.as_str()?;
        let argument = doc
            .get("payload")
            .and_then(Value::as_str)
            .map(str::to_owned);
        Some(Self {
            name: CommandName::parse(name),
            argument,
        })
    }
}

/// What applying a command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Effect applied in place; keep running.
    Applied,
    /// Unknown command; nothing changed.
    Ignored,
    /// Argument invalid; nothing changed.
    Rejected(ConfigError),
    /// The lifecycle loop must restart the device.
    RestartRequired(RestartReason),
}

/// Applies [`RemoteCommand`]s and tracks the in-memory screen flag.
pub struct CommandProcessor {
    screen_enabled: bool,
}

impl Default for CommandProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandProcessor {
    pub fn new() -> Self {
        Self { screen_enabled: true }
    }

    pub fn screen_enabled(&self) -> bool {
        self.screen_enabled
    }

    pub fn apply<S: StoragePort>(
        &mut self,
        command: &RemoteCommand,
        config: &mut ConfigManager<S>,
        surface: &mut dyn StatusSurface,
    ) -> CommandOutcome {
        info!("command: {} (payload={:?})", command.name, command.argument);

        match &command.name {
            CommandName::DisableScreen => {
                self.screen_enabled = false;
                surface.set_powered(false);
                CommandOutcome::Applied
            }
            CommandName::EnableScreen => {
                self.screen_enabled = true;
                surface.set_powered(true);
                CommandOutcome::Applied
            }
            CommandName::Reboot => CommandOutcome::RestartRequired(RestartReason::Reboot),
            CommandName::ChangeReadingTime => {
                let minutes = command
                    .argument
                    .as_deref()
                    .and_then(|raw| raw.trim().parse::<u32>().ok());
                let result = match minutes {
                    Some(m) => config.set_reporting_interval(m).map(|()| m as u16),
                    None => Err(ConfigError::InvalidArgument("reading time must be whole minutes")),
                };
                match result {
                    Ok(m) => CommandOutcome::RestartRequired(RestartReason::ReadingTimeChanged(m)),
                    Err(e) => {
                        warn!("command: change_reading_time rejected: {e}");
                        CommandOutcome::Rejected(e)
                    }
                }
            }
            CommandName::FactoryReset => {
                if let Err(e) = config.factory_reset() {
                    warn!("command: factory reset incomplete: {e}");
                }
                CommandOutcome::RestartRequired(RestartReason::FactoryReset)
            }
            CommandName::Unrecognized(name) => {
                warn!("command: unknown command '{name}' ignored");
                CommandOutcome::Ignored
            }
        }
    }
}
