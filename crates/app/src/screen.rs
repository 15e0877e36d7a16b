//! Presentation seam for the interactive loop

use std::net::SocketAddr;

use quizduel_core::PresentationSink;

/// Status lines that are not part of the match itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    WaitingForOpponent { addr: SocketAddr },
    Connecting { target: String },
    Connected { peer_addr: SocketAddr },
    OpponentIs { name: String },
    PeerLost,
    ResultUnavailable,
    SetupFailed(String),
    InvalidChoice,
    Error(String),
}

/// Everything the player sees goes through a screen
pub trait Screen: PresentationSink {
    fn notice(&mut self, notice: Notice);
}
