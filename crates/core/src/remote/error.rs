use std::fmt;

/// Why a call to the simulation service failed.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteFailure {
    /// The request never produced a response (connect error, timeout, unreadable body).
    Transport(String),
    /// Non-2xx status without a usable `error` message.
    Http { status: u16, body: String },
    /// The service answered with an `error` field.
    Service(String),
    /// The body did not match the expected shape.
    Decode(String),
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(detail) => write!(f, "request failed: {detail}"),
            Self::Http { status, body } => write!(f, "HTTP {status}: {body}"),
            Self::Service(message) => f.write_str(message),
            Self::Decode(detail) => write!(f, "unexpected response: {detail}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LookupError {
    pub symbol: String,
    pub failure: RemoteFailure,
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ticker lookup failed (symbol={}): {}", self.symbol, self.failure)
    }
}

impl std::error::Error for LookupError {}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationError {
    pub failure: RemoteFailure,
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "simulation failed: {}", self.failure)
    }
}

impl std::error::Error for SimulationError {}
