//! Quizduel Network Library
//!
//! Two-player networking over a single TCP stream.
//!
//! # Architecture
//!
//! - **Channel**: newline-delimited UTF-8 messages over any duplex stream
//! - **Protocol**: the line grammar (names, question lines, sentinels, results)
//! - **Sync**: handshake, question transfer and result exchange
//! - **Host / Guest**: accept one opponent, or connect to a host
//! - **Link**: a spawned task that runs the phases and reports events
//!
//! # Usage
//!
//! ```ignore
//! // Host binds and hands over its questions
//! let listener = HostListener::bind(DEFAULT_PORT).await?;
//! let mut link = PeerLink::host(listener, "ann".into(), questions);
//!
//! // Guest connects
//! let mut link = PeerLink::join(PeerAddress::parse("192.168.1.5")?, "bob".into(), TransferPolicy::Lenient);
//!
//! while let Some(event) = link.next_event().await {
//!     match event {
//!         LinkEvent::QuestionsReady(set) => { /* start the local match */ }
//!         LinkEvent::OpponentScore(score) => { /* show the result */ }
//!         _ => {}
//!     }
//! }
//! ```

pub mod address;
pub mod channel;
pub mod error;
pub mod host;
pub mod link;
pub mod protocol;
pub mod sync;

pub use address::PeerAddress;
pub use channel::{Channel, LineReader, LineWriter, Received};
pub use error::{Error, Result};
pub use host::{connect, HostListener};
pub use link::{LinkEvent, LinkRole, PeerLink};
pub use protocol::WireMessage;
pub use sync::{PeerIdentity, TransferPolicy};

/// Default port for hosted matches
pub const DEFAULT_PORT: u16 = 5555;
