//! Sync protocol phases
//!
//! Networked play needs three exchanges, always in this order:
//!
//! 1. handshake: both sides send their name, then read the peer's
//! 2. question transfer: host sends the set between two sentinels
//! 3. result exchange: both sides send their final score, then read the peer's
//!
//! There are no acknowledgements. Each side writes before it reads within a
//! phase, so neither can deadlock waiting on the other.

use quizduel_core::{Question, QuestionSet};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::channel::{Channel, Received};
use crate::error::{Error, Result};
use crate::protocol::WireMessage;

/// Names exchanged during the handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerIdentity {
    pub local_name: String,
    pub remote_name: String,
}

/// What the guest does with a transfer line it cannot parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferPolicy {
    /// Drop the line and keep going
    #[default]
    Lenient,
    /// Fail the whole transfer
    Strict,
}

/// Exchange display names
pub async fn handshake<S>(channel: &mut Channel<S>, local_name: &str) -> Result<PeerIdentity>
where
    S: AsyncRead + AsyncWrite,
{
    let line = WireMessage::Name(local_name.to_string()).encode()?;
    channel.send(&line).await?;

    match channel.receive_line().await? {
        Received::Line(remote_name) => {
            info!(remote = %remote_name, "Handshake complete");
            Ok(PeerIdentity {
                local_name: local_name.to_string(),
                remote_name,
            })
        }
        Received::EndOfStream => Err(Error::HandshakeFailed),
    }
}

/// Host side of the question transfer.
///
/// Every question is encoded before the first line goes out, so a set the
/// grammar cannot carry fails without sending a partial transfer.
pub async fn send_questions<S>(channel: &mut Channel<S>, questions: &QuestionSet) -> Result<()>
where
    S: AsyncRead + AsyncWrite,
{
    let body = questions
        .iter()
        .map(|q| WireMessage::Question(q.clone()).encode())
        .collect::<Result<Vec<_>>>()?;

    channel.send(&WireMessage::QuestionsStart.encode()?).await?;
    for line in &body {
        channel.send(line).await?;
    }
    channel.send(&WireMessage::QuestionsEnd.encode()?).await?;

    info!(count = body.len(), "Questions sent");
    Ok(())
}

/// Guest side of the question transfer.
///
/// Reads until `QUESTIONS_END` or end of stream. Lines before the first
/// `QUESTIONS_START` are ignored, and a repeated `QUESTIONS_START` discards
/// what was collected so far. If the stream ends early, whatever arrived is
/// kept.
pub async fn receive_questions<S>(
    channel: &mut Channel<S>,
    policy: TransferPolicy,
) -> Result<QuestionSet>
where
    S: AsyncRead + AsyncWrite,
{
    let mut started = false;
    let mut collected: Vec<Question> = Vec::new();
    let mut dropped = 0usize;

    loop {
        let line = match channel.receive_line().await? {
            Received::Line(line) => line,
            Received::EndOfStream => {
                warn!(received = collected.len(), "Stream ended before QUESTIONS_END");
                break;
            }
        };

        match WireMessage::decode_transfer(&line) {
            Ok(WireMessage::QuestionsStart) => {
                if started {
                    debug!(discarded = collected.len(), "Transfer restarted");
                }
                started = true;
                collected.clear();
            }
            Ok(WireMessage::QuestionsEnd) => break,
            _ if !started => {
                debug!("Ignoring line before QUESTIONS_START");
            }
            Ok(WireMessage::Question(q)) => collected.push(q),
            Ok(other) => {
                debug!(message = ?other, "Ignoring unexpected message during transfer");
            }
            Err(e) => match policy {
                TransferPolicy::Lenient => {
                    warn!(error = %e, "Dropping malformed question line");
                    dropped += 1;
                }
                TransferPolicy::Strict => return Err(e),
            },
        }
    }

    info!(count = collected.len(), dropped, "Questions received");
    QuestionSet::new(collected).map_err(|_| Error::EmptyQuestionSet)
}

/// Send this side's final score
pub async fn send_result<S>(channel: &mut Channel<S>, score: u32) -> Result<()>
where
    S: AsyncRead + AsyncWrite,
{
    channel.send(&WireMessage::GameOver(score).encode()?).await
}

/// Read the opponent's final score
pub async fn receive_result<S>(channel: &mut Channel<S>) -> Result<u32>
where
    S: AsyncRead + AsyncWrite,
{
    match channel.receive_line().await {
        Ok(Received::Line(line)) => parse_result(&line),
        Ok(Received::EndOfStream) => Err(Error::ResultUnavailable("peer closed the connection".into())),
        Err(e) => Err(Error::ResultUnavailable(e.to_string())),
    }
}

/// Decode a result line already read from the channel
pub fn parse_result(line: &str) -> Result<u32> {
    match WireMessage::decode_result(line) {
        Ok(WireMessage::GameOver(score)) => Ok(score),
        Ok(_) => Err(Error::ResultUnavailable(format!("unexpected line '{}'", line))),
        Err(e) => Err(Error::ResultUnavailable(e.to_string())),
    }
}

/// Send our score, then read the opponent's
pub async fn exchange_results<S>(channel: &mut Channel<S>, score: u32) -> Result<u32>
where
    S: AsyncRead + AsyncWrite,
{
    send_result(channel, score).await?;
    let opponent = receive_result(channel).await?;
    info!(local = score, opponent, "Results exchanged");
    Ok(opponent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::DuplexStream;

    fn pair() -> (Channel<DuplexStream>, Channel<DuplexStream>) {
        let (a, b) = tokio::io::duplex(4096);
        (Channel::new(a), Channel::new(b))
    }

    fn questions(n: usize) -> QuestionSet {
        let list = (0..n)
            .map(|i| Question::new(format!("q{}", i), ["w", "x", "y", "z"], "y").unwrap())
            .collect();
        QuestionSet::new(list).unwrap()
    }

    #[tokio::test]
    async fn test_handshake_both_sides() {
        let (mut host, mut guest) = pair();

        let (h, g) = tokio::join!(handshake(&mut host, "ann"), handshake(&mut guest, "bob"));
        let (h, g) = (h.unwrap(), g.unwrap());

        assert_eq!(h.remote_name, "bob");
        assert_eq!(g.remote_name, "ann");
        assert_eq!(g.local_name, "bob");
    }

    #[tokio::test]
    async fn test_handshake_fails_on_close() {
        let (mut host, mut guest) = pair();
        guest.close().await.unwrap();

        let result = handshake(&mut host, "ann").await;
        assert!(matches!(result, Err(Error::HandshakeFailed)));
    }

    #[tokio::test]
    async fn test_transfer_roundtrip() {
        let (mut host, mut guest) = pair();
        let set = questions(3);

        send_questions(&mut host, &set).await.unwrap();
        let received = receive_questions(&mut guest, TransferPolicy::Lenient)
            .await
            .unwrap();

        assert_eq!(received.len(), 3);
        for (sent, got) in set.iter().zip(received.iter()) {
            assert_eq!(sent.prompt(), got.prompt());
            assert_eq!(sent.correct_answer(), got.correct_answer());
            assert!(sent.same_options(got));
        }
    }

    #[tokio::test]
    async fn test_malformed_line_dropped_when_lenient() {
        let (mut host, mut guest) = pair();
        host.send("QUESTIONS_START").await.unwrap();
        host.send("2 + 2?|2,3,4,5|4").await.unwrap();
        host.send("broken|line").await.unwrap();
        host.send("QUESTIONS_END").await.unwrap();

        let received = receive_questions(&mut guest, TransferPolicy::Lenient)
            .await
            .unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].correct_answer(), "4");
    }

    #[tokio::test]
    async fn test_malformed_line_fails_when_strict() {
        let (mut host, mut guest) = pair();
        host.send("QUESTIONS_START").await.unwrap();
        host.send("broken|line").await.unwrap();
        host.send("QUESTIONS_END").await.unwrap();

        let result = receive_questions(&mut guest, TransferPolicy::Strict).await;
        assert!(matches!(result, Err(Error::MalformedLine(_))));
    }

    #[tokio::test]
    async fn test_early_close_keeps_received_questions() {
        let (mut host, mut guest) = pair();
        host.send("QUESTIONS_START").await.unwrap();
        host.send("q|a,b,c,d|a").await.unwrap();
        host.send("r|a,b,c,d|b").await.unwrap();
        host.close().await.unwrap();

        let received = receive_questions(&mut guest, TransferPolicy::Lenient)
            .await
            .unwrap();
        assert_eq!(received.len(), 2);
    }

    #[tokio::test]
    async fn test_early_close_without_questions_is_empty() {
        let (mut host, mut guest) = pair();
        host.send("QUESTIONS_START").await.unwrap();
        host.close().await.unwrap();

        let result = receive_questions(&mut guest, TransferPolicy::Lenient).await;
        assert!(matches!(result, Err(Error::EmptyQuestionSet)));
    }

    #[tokio::test]
    async fn test_no_start_sentinel_is_empty() {
        let (mut host, mut guest) = pair();
        host.send("q|a,b,c,d|a").await.unwrap();
        host.close().await.unwrap();

        let result = receive_questions(&mut guest, TransferPolicy::Lenient).await;
        assert!(matches!(result, Err(Error::EmptyQuestionSet)));
    }

    #[tokio::test]
    async fn test_repeated_start_discards_earlier_lines() {
        let (mut host, mut guest) = pair();
        host.send("QUESTIONS_START").await.unwrap();
        host.send("old|a,b,c,d|a").await.unwrap();
        host.send("QUESTIONS_START").await.unwrap();
        host.send("new|a,b,c,d|a").await.unwrap();
        host.send("QUESTIONS_END").await.unwrap();

        let received = receive_questions(&mut guest, TransferPolicy::Lenient)
            .await
            .unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].prompt(), "new");
    }

    #[tokio::test]
    async fn test_unsafe_set_sends_nothing() {
        let (mut host, mut guest) = pair();
        let bad = Question::new("a,b?", ["1", "2", "3", "4"], "1").unwrap();
        let set = QuestionSet::new(vec![bad]).unwrap();

        let result = send_questions(&mut host, &set).await;
        assert!(matches!(result, Err(Error::MalformedLine(_))));

        host.close().await.unwrap();
        assert_eq!(guest.receive_line().await.unwrap(), Received::EndOfStream);
    }

    #[tokio::test]
    async fn test_result_exchange_is_symmetric() {
        let (mut host, mut guest) = pair();

        let (h, g) = tokio::join!(exchange_results(&mut host, 3), exchange_results(&mut guest, 5));
        assert_eq!(h.unwrap(), 5);
        assert_eq!(g.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_result_unavailable_on_close() {
        let (mut host, mut guest) = pair();
        guest.close().await.unwrap();

        let result = exchange_results(&mut host, 4).await;
        assert!(matches!(result, Err(Error::ResultUnavailable(_))));
    }

    #[tokio::test]
    async fn test_result_unavailable_on_garbage() {
        let (mut host, mut guest) = pair();
        guest.send("GAME_OVER|many").await.unwrap();

        let result = exchange_results(&mut host, 4).await;
        assert!(matches!(result, Err(Error::ResultUnavailable(_))));
    }
}
