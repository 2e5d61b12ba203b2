//! Inbound wire commands.
//!
//! One command per newline-terminated ASCII line from the network node.
//! Parsing never fails — unparseable input maps to [`Command::Unknown`]
//! and a malformed value for a known config key maps to
//! [`Command::SetInvalid`], so the engine can produce the exact reply the
//! protocol requires for each case.

/// A decoded command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start an opening move (async dispatch, immediate `ack`/`busy`).
    Open,
    /// Start a closing move (async dispatch, immediate `ack`/`busy`).
    Close,
    /// Stop the motor and mark the door position unknown.
    Stop,
    /// Report the current door state.
    Status,
    /// Report the latest current reading in mA.
    Current,
    /// Report the full motion config as JSON.
    Config,
    /// Log-marker ping from the partner.
    Log,
    /// `<key>:<int>` — update one config field and persist.
    Set(ConfigKey, u32),
    /// `<key>:<garbage>` — known key, unparseable value.
    SetInvalid(ConfigKey),
    /// Anything else.
    Unknown,
}

/// Config fields addressable over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    Threshold,
    TimeoutOpen,
    TimeoutClose,
}

impl ConfigKey {
    /// The token used on the wire and echoed in replies.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Threshold => "threshold",
            Self::TimeoutOpen => "timeout_open",
            Self::TimeoutClose => "timeout_close",
        }
    }

    fn from_wire(token: &str) -> Option<Self> {
        match token {
            "threshold" => Some(Self::Threshold),
            "timeout_open" => Some(Self::TimeoutOpen),
            "timeout_close" => Some(Self::TimeoutClose),
            _ => None,
        }
    }
}

impl Command {
    /// Decode one trimmed command line.
    pub fn parse(line: &str) -> Self {
        match line {
            "open" => return Self::Open,
            "close" => return Self::Close,
            "stop" => return Self::Stop,
            "status" => return Self::Status,
            "current" => return Self::Current,
            "config" => return Self::Config,
            "log" => return Self::Log,
            _ => {}
        }

        if let Some((key_token, value)) = line.split_once(':') {
            if let Some(key) = ConfigKey::from_wire(key_token) {
                return match value.trim().parse::<u32>() {
                    Ok(v) => Self::Set(key, v),
                    Err(_) => Self::SetInvalid(key),
                };
            }
        }

        Self::Unknown
    }
}
