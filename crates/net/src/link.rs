//! Networking task for one two-player match
//!
//! A [`PeerLink`] owns the connection from a spawned task and talks to the
//! interactive side only through two queues: [`LinkEvent`]s out, commands in.
//! The interactive side never touches the socket, and the match state never
//! leaves the interactive side.

use std::net::SocketAddr;

use quizduel_core::QuestionSet;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::address::PeerAddress;
use crate::channel::{Channel, Received};
use crate::error::{Error, Result};
use crate::host::{connect, HostListener};
use crate::sync::{
    handshake, parse_result, receive_questions, receive_result, send_questions, send_result,
    TransferPolicy,
};

/// Which side of the match this process plays
#[derive(Debug, Clone)]
pub enum LinkRole {
    /// Owns the questions and sends them
    Host { questions: QuestionSet },
    /// Receives the questions
    Guest { policy: TransferPolicy },
}

/// Event posted to the interactive side
#[derive(Debug, Clone)]
pub enum LinkEvent {
    /// Stream established
    Connected { peer_addr: SocketAddr },
    /// Names exchanged
    HandshakeComplete { remote_name: String },
    /// The set both peers will play (sent by the host, received by the guest)
    QuestionsReady(QuestionSet),
    /// The opponent's final score
    OpponentScore(u32),
    /// The opponent's final score could not be obtained
    ResultUnavailable(String),
    /// The connection failed during play; the local match can still finish
    PeerLost(String),
    /// Setup failed before play could start
    Failed(String),
}

enum LinkCommand {
    ReportScore(u32),
    Close,
}

/// Handle to a running networking task
pub struct PeerLink {
    event_rx: mpsc::Receiver<LinkEvent>,
    cmd_tx: mpsc::Sender<LinkCommand>,
}

impl PeerLink {
    /// Accept one guest on `listener` and run the host side
    pub fn host(listener: HostListener, local_name: String, questions: QuestionSet) -> Self {
        Self::spawn_with(move |event_tx, mut cmd_rx| async move {
            let accepted = tokio::select! {
                result = listener.accept() => result,
                _ = cmd_rx.recv() => {
                    debug!("Hosting cancelled before a guest arrived");
                    return;
                }
            };
            match accepted {
                Ok((channel, peer_addr)) => {
                    let _ = event_tx.send(LinkEvent::Connected { peer_addr }).await;
                    let role = LinkRole::Host { questions };
                    link_task(channel, local_name, role, event_tx, cmd_rx).await;
                }
                Err(e) => {
                    warn!(error = %e, "Accept failed");
                    let _ = event_tx.send(LinkEvent::Failed(e.to_string())).await;
                }
            }
        })
    }

    /// Connect to `addr` and run the guest side
    pub fn join(addr: PeerAddress, local_name: String, policy: TransferPolicy) -> Self {
        Self::spawn_with(move |event_tx, mut cmd_rx| async move {
            let connected = tokio::select! {
                result = connect(&addr) => result,
                _ = cmd_rx.recv() => {
                    debug!("Join cancelled while connecting");
                    return;
                }
            };
            match connected {
                Ok((channel, peer_addr)) => {
                    let _ = event_tx.send(LinkEvent::Connected { peer_addr }).await;
                    let role = LinkRole::Guest { policy };
                    link_task(channel, local_name, role, event_tx, cmd_rx).await;
                }
                Err(e) => {
                    warn!(addr = %addr, error = %e, "Connect failed");
                    let _ = event_tx.send(LinkEvent::Failed(e.to_string())).await;
                }
            }
        })
    }

    /// Run either side over an already-established stream
    pub fn over<S>(stream: S, local_name: String, role: LinkRole) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        Self::spawn_with(move |event_tx, cmd_rx| {
            link_task(Channel::new(stream), local_name, role, event_tx, cmd_rx)
        })
    }

    fn spawn_with<F, Fut>(task: F) -> Self
    where
        F: FnOnce(mpsc::Sender<LinkEvent>, mpsc::Receiver<LinkCommand>) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let (event_tx, event_rx) = mpsc::channel(64);
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        tokio::spawn(task(event_tx, cmd_rx));
        Self { event_rx, cmd_tx }
    }

    /// Get the next link event; `None` once the task has finished
    pub async fn next_event(&mut self) -> Option<LinkEvent> {
        self.event_rx.recv().await
    }

    /// Hand over the local final score and start the result exchange
    pub async fn report_score(&self, score: u32) -> Result<()> {
        self.cmd_tx
            .send(LinkCommand::ReportScore(score))
            .await
            .map_err(|_| Error::NotConnected)
    }

    /// Tear the connection down; harmless if it is already gone
    pub async fn close(&self) {
        let _ = self.cmd_tx.send(LinkCommand::Close).await;
    }
}

/// Main connection task
async fn link_task<S>(
    mut channel: Channel<S>,
    local_name: String,
    role: LinkRole,
    event_tx: mpsc::Sender<LinkEvent>,
    mut cmd_rx: mpsc::Receiver<LinkCommand>,
) where
    S: AsyncRead + AsyncWrite,
{
    let setup_result = tokio::select! {
        result = setup(&mut channel, &local_name, role, &event_tx) => result,
        _ = cmd_rx.recv() => {
            debug!("Close requested during setup");
            let _ = channel.close().await;
            return;
        }
    };

    if let Err(e) = setup_result {
        warn!(error = %e, "Match setup failed");
        let _ = event_tx.send(LinkEvent::Failed(e.to_string())).await;
        let _ = channel.close().await;
        return;
    }

    if let Some(score) = play_phase(&mut channel, &event_tx, &mut cmd_rx).await {
        let event = match score {
            Ok(opponent) => LinkEvent::OpponentScore(opponent),
            Err(e) => {
                warn!(error = %e, "Result exchange failed");
                LinkEvent::ResultUnavailable(e.to_string())
            }
        };
        let _ = event_tx.send(event).await;
    }

    let _ = channel.close().await;
    debug!("Link closed");
}

/// Handshake, then question transfer
async fn setup<S>(
    channel: &mut Channel<S>,
    local_name: &str,
    role: LinkRole,
    event_tx: &mpsc::Sender<LinkEvent>,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite,
{
    let identity = handshake(channel, local_name).await?;
    let _ = event_tx
        .send(LinkEvent::HandshakeComplete {
            remote_name: identity.remote_name,
        })
        .await;

    let questions = match role {
        LinkRole::Host { questions } => {
            send_questions(channel, &questions).await?;
            questions
        }
        LinkRole::Guest { policy } => receive_questions(channel, policy).await?,
    };

    let _ = event_tx.send(LinkEvent::QuestionsReady(questions)).await;
    Ok(())
}

/// Wait for the local score while watching the connection, then exchange results.
///
/// Returns `None` if the interactive side closed the link first.
async fn play_phase<S>(
    channel: &mut Channel<S>,
    event_tx: &mpsc::Sender<LinkEvent>,
    cmd_rx: &mut mpsc::Receiver<LinkCommand>,
) -> Option<Result<u32>>
where
    S: AsyncRead + AsyncWrite,
{
    // A peer that finishes first sends its result while we are still playing
    let mut early_result: Option<String> = None;
    let mut peer_gone: Option<String> = None;

    let score = loop {
        let (reader, _) = channel.halves();
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(LinkCommand::ReportScore(score)) => break score,
                Some(LinkCommand::Close) | None => {
                    debug!("Close requested during play");
                    return None;
                }
            },

            received = reader.receive_line(), if peer_gone.is_none() => {
                let reason = match received {
                    Ok(Received::Line(line)) => {
                        if early_result.is_none() {
                            debug!("Opponent finished first");
                            early_result = Some(line);
                        } else {
                            debug!(line = %line, "Ignoring extra line during play");
                        }
                        continue;
                    }
                    Ok(Received::EndOfStream) => "opponent disconnected".to_string(),
                    Err(e) => e.to_string(),
                };
                warn!(reason = %reason, "Peer lost during play");
                let _ = event_tx.send(LinkEvent::PeerLost(reason.clone())).await;
                peer_gone = Some(reason);
            }
        }
    };

    info!(score, "Local match finished");

    if let Err(e) = send_result(channel, score).await {
        if early_result.is_none() {
            return Some(Err(Error::ResultUnavailable(e.to_string())));
        }
    }

    if let Some(line) = early_result {
        return Some(parse_result(&line));
    }
    if let Some(reason) = peer_gone {
        return Some(Err(Error::ResultUnavailable(reason)));
    }

    tokio::select! {
        result = receive_result(channel) => Some(result),
        cmd = cmd_rx.recv() => match cmd {
            Some(LinkCommand::ReportScore(_)) => {
                debug!("Score already reported");
                Some(receive_result(channel).await)
            }
            Some(LinkCommand::Close) | None => None,
        },
    }
}
