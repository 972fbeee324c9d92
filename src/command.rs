//! Normalized commands and the inbound signal vocabulary
//!
//! Every external trigger, whether an IPC call or a broadcast-style signal, is
//! turned into exactly one [`Command`] before anything touches the window
//! stack. Signals are a closed set of variants; anything that does not parse
//! into one of them is dropped.

use log::debug;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// `package/class` pair naming an activity.
///
/// Parses the flattened form, including the `package/.Class` shorthand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ComponentName {
    pub package: String,
    pub class: String,
}

#[derive(Debug, Error)]
#[error("invalid component name: {0:?}")]
pub struct InvalidComponentName(String);

impl ComponentName {
    pub fn new(package: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            class: class.into(),
        }
    }
}

impl FromStr for ComponentName {
    type Err = InvalidComponentName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (package, class) = s
            .split_once('/')
            .ok_or_else(|| InvalidComponentName(s.to_string()))?;
        if package.is_empty() || class.is_empty() {
            return Err(InvalidComponentName(s.to_string()));
        }
        let class = if class.starts_with('.') {
            format!("{}{}", package, class)
        } else {
            class.to_string()
        };
        Ok(Self::new(package, class))
    }
}

impl TryFrom<String> for ComponentName {
    type Error = InvalidComponentName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ComponentName> for String {
    fn from(value: ComponentName) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.package, self.class)
    }
}

/// Which launcher surface asked for the window.
///
/// Written as a lowercase name. Reading also accepts the legacy integer tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[default]
    Unspecified,
    Recents,
    Taskbar,
    Popup,
}

impl From<i32> for Source {
    /// Legacy integer tags; unknown values map to `Unspecified`
    fn from(value: i32) -> Self {
        match value {
            1 => Source::Recents,
            2 => Source::Taskbar,
            3 => Source::Popup,
            _ => Source::Unspecified,
        }
    }
}

impl<'de> Deserialize<'de> for Source {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Tag(i32),
            Name(String),
        }

        const NAMES: &[&str] = &["unspecified", "recents", "taskbar", "popup"];
        match Repr::deserialize(deserializer)? {
            Repr::Tag(tag) => Ok(Source::from(tag)),
            Repr::Name(name) => match name.as_str() {
                "unspecified" => Ok(Source::Unspecified),
                "recents" => Ok(Source::Recents),
                "taskbar" => Ok(Source::Taskbar),
                "popup" => Ok(Source::Popup),
                other => Err(de::Error::unknown_variant(other, NAMES)),
            },
        }
    }
}

/// What to launch inside a new window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartTarget {
    /// Start an activity for a user
    Component { component: ComponentName, user_id: i32 },
    /// Move an existing task into the window
    Task { task_id: i32 },
}

/// Normalized description of what to open, plus where the request came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartCommand {
    pub target: StartTarget,
    #[serde(default)]
    pub source: Source,
}

impl StartCommand {
    pub fn component(component: ComponentName, user_id: i32) -> Self {
        Self {
            target: StartTarget::Component { component, user_id },
            source: Source::Unspecified,
        }
    }

    pub fn task(task_id: i32) -> Self {
        Self {
            target: StartTarget::Task { task_id },
            source: Source::Unspecified,
        }
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = source;
        self
    }

    /// Build from raw request fields. A non-zero task id wins over the
    /// component; with neither there is nothing to start.
    pub fn resolve(
        component: Option<ComponentName>,
        user_id: i32,
        task_id: i32,
        source: Source,
    ) -> Option<Self> {
        let target = if task_id != 0 {
            StartTarget::Task { task_id }
        } else {
            StartTarget::Component {
                component: component?,
                user_id,
            }
        };
        Some(Self { target, source })
    }
}

/// Unit of work executed on the UI context
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Open a new window, optionally launching something into it
    CreateWindow(Option<StartCommand>),
    OpenAppList,
    /// Move the foreground task of the primary display into a window
    CurrentTaskToWindow,
    ResetAllWindows,
    LaunchSideBar,
    /// Send the launcher hook flags to the requesting package
    ReplyLauncherConfig { target: Option<String> },
}

/// Inbound broadcast-style signals, tagged by `action`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Signal {
    OpenInWindow {
        /// A malformed component reads as absent so a task id can still apply
        #[serde(default, deserialize_with = "lenient_component")]
        component_name: Option<ComponentName>,
        #[serde(default)]
        user_id: i32,
        #[serde(default)]
        task_id: i32,
        #[serde(default)]
        source: Source,
    },
    CurrentToWindow,
    OpenAppList,
    OpenApp {
        component_name: ComponentName,
        #[serde(default)]
        user_id: i32,
    },
    GetLauncherConfig {
        #[serde(default)]
        sender: Option<String>,
    },
    LaunchSideBar,
}

fn lenient_component<'de, D>(deserializer: D) -> Result<Option<ComponentName>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match value.as_str().map(str::parse::<ComponentName>) {
        Some(Ok(component)) => Some(component),
        _ => {
            debug!("🙈 Dropping malformed component {}", value);
            None
        }
    }))
}

impl Signal {
    /// Parse a JSON signal. Unknown actions and malformed payloads yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match serde_json::from_str(raw) {
            Ok(signal) => Some(signal),
            Err(e) => {
                debug!("🙈 Ignoring unrecognized signal {}: {}", raw, e);
                None
            }
        }
    }

    /// Same as [`Signal::parse`] for an already decoded JSON value
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        match serde_json::from_value(value) {
            Ok(signal) => Some(signal),
            Err(e) => {
                debug!("🙈 Ignoring unrecognized signal: {}", e);
                None
            }
        }
    }

    /// Map the signal onto the command it triggers
    pub fn into_command(self) -> Option<Command> {
        match self {
            Signal::OpenInWindow {
                component_name,
                user_id,
                task_id,
                source,
            } => match StartCommand::resolve(component_name, user_id, task_id, source) {
                Some(start) => Some(Command::CreateWindow(Some(start))),
                None => {
                    debug!("🙈 open-in-window without component or task, ignoring");
                    None
                }
            },
            Signal::CurrentToWindow => Some(Command::CurrentTaskToWindow),
            Signal::OpenAppList => Some(Command::OpenAppList),
            Signal::OpenApp {
                component_name,
                user_id,
            } => Some(Command::CreateWindow(Some(StartCommand::component(
                component_name,
                user_id,
            )))),
            Signal::GetLauncherConfig { sender } => {
                Some(Command::ReplyLauncherConfig { target: sender })
            }
            Signal::LaunchSideBar => Some(Command::LaunchSideBar),
        }
    }
}
