/*
[INPUT]:  Requested lifecycle transitions
[OUTPUT]: Validated state plus the connected adapter name
[POS]:    Hub layer - connection state machine
[UPDATE]: When adding states or transitions
*/

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WalletError};

/// Lifecycle status shared by the hub and adapters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    NotReady,
    Ready,
    Connecting,
    Connected,
    Disconnected,
    Errored,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::NotReady => "not_ready",
            ConnectionState::Ready => "ready",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Errored => "errored",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hub status; the adapter name is set exactly while CONNECTED
#[derive(Debug, Clone)]
pub(crate) struct StateMachine {
    status: ConnectionState,
    connected_adapter: Option<String>,
    connecting_adapter: Option<String>,
}

impl StateMachine {
    pub(crate) fn new() -> Self {
        Self {
            status: ConnectionState::NotReady,
            connected_adapter: None,
            connecting_adapter: None,
        }
    }

    /// Adapter that claimed the current CONNECTING state, if known
    pub(crate) fn connecting_adapter(&self) -> Option<&str> {
        self.connecting_adapter.as_deref()
    }

    pub(crate) fn status(&self) -> ConnectionState {
        self.status
    }

    pub(crate) fn connected_adapter(&self) -> Option<&str> {
        self.connected_adapter.as_deref()
    }

    pub(crate) fn can_transition(from: ConnectionState, to: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (from, to),
            (NotReady, Ready)
                | (Ready, Connecting)
                | (Errored, Connecting)
                | (Connecting, Connected)
                | (Connected, Ready)
                | (NotReady | Ready | Connecting | Connected, Errored)
        )
    }

    /// Move to `to`. `adapter` names the adapter entering CONNECTING or CONNECTED;
    /// only the adapter that claimed CONNECTING may complete it.
    ///
    /// Returns the previous status.
    pub(crate) fn transition(
        &mut self,
        to: ConnectionState,
        adapter: Option<&str>,
    ) -> Result<ConnectionState> {
        let from = self.status;
        if !Self::can_transition(from, to) {
            return Err(WalletError::InvalidState(format!(
                "cannot move from {from} to {to}"
            )));
        }

        match to {
            ConnectionState::Connecting => {
                self.connecting_adapter = adapter.map(str::to_string);
                self.connected_adapter = None;
            }
            ConnectionState::Connected => {
                let name = adapter.ok_or_else(|| {
                    WalletError::InvalidState("connected state requires an adapter name".to_string())
                })?;
                if let Some(claimed) = self.connecting_adapter.as_deref() {
                    if claimed != name {
                        return Err(WalletError::InvalidState(format!(
                            "{claimed} is connecting, not {name}"
                        )));
                    }
                }
                self.connecting_adapter = None;
                self.connected_adapter = Some(name.to_string());
            }
            _ => {
                self.connecting_adapter = None;
                self.connected_adapter = None;
            }
        }
        self.status = to;
        Ok(from)
    }
}
