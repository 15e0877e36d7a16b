//! Terminal front end
//!
//! Output is plain `println!`. Input is read line by line on a background
//! thread and queued, so the match loop can wait on input and the countdown
//! at the same time. The reader thread is detached; a read blocked on the
//! terminal never holds up runtime shutdown.

use std::io::{BufRead, Write};

use quizduel_core::{MatchEvent, PresentationSink};
use tokio::sync::mpsc;
use tracing::debug;

use crate::screen::{Notice, Screen};

/// Screen that prints to stdout
#[derive(Debug, Default)]
pub struct TerminalScreen {
    /// A countdown line is on screen and needs a newline before other output
    ticking: bool,
}

impl TerminalScreen {
    pub fn new() -> Self {
        Self::default()
    }

    fn end_tick_line(&mut self) {
        if self.ticking {
            println!();
            self.ticking = false;
        }
    }
}

impl PresentationSink for TerminalScreen {
    fn present(&mut self, event: MatchEvent) {
        match event {
            MatchEvent::QuestionChanged {
                index,
                total,
                prompt,
                options,
            } => {
                self.end_tick_line();
                println!();
                println!("Question {}/{}: {}", index + 1, total, prompt);
                for (i, option) in options.iter().enumerate() {
                    println!("  {}) {}", i + 1, option);
                }
                println!("Answer 1-4, or q to quit");
            }
            MatchEvent::Tick { remaining } => {
                print!("\rTime left: {:>2}s ", remaining);
                let _ = std::io::stdout().flush();
                self.ticking = true;
            }
            MatchEvent::AnswerResult {
                correct,
                correct_answer,
                timed_out,
            } => {
                self.end_tick_line();
                if correct {
                    println!("Correct!");
                } else if timed_out {
                    println!("Time's up! The answer was {}", correct_answer);
                } else {
                    println!("Wrong. The answer was {}", correct_answer);
                }
            }
            MatchEvent::AwaitingOpponent { local_score } => {
                self.end_tick_line();
                println!();
                println!("You scored {}. Waiting for your opponent...", local_score);
            }
            MatchEvent::MatchComplete {
                local_score,
                opponent_score,
                total,
            } => {
                self.end_tick_line();
                println!();
                println!("Final score: {}/{}", local_score, total);
                if let Some(opponent) = opponent_score {
                    println!("Opponent: {}/{}", opponent, total);
                    match local_score.cmp(&opponent) {
                        std::cmp::Ordering::Greater => println!("You win!"),
                        std::cmp::Ordering::Less => println!("You lose."),
                        std::cmp::Ordering::Equal => println!("It's a tie."),
                    }
                }
            }
        }
    }
}

impl Screen for TerminalScreen {
    fn notice(&mut self, notice: Notice) {
        self.end_tick_line();
        match notice {
            Notice::WaitingForOpponent { addr } => {
                println!("Hosting on port {}. Waiting for opponent...", addr.port())
            }
            Notice::Connecting { target } => println!("Connecting to {}...", target),
            Notice::Connected { peer_addr } => println!("Connected to {}", peer_addr),
            Notice::OpponentIs { name } => println!("Playing against {}", name),
            Notice::PeerLost => println!("Connection to opponent lost. Finish your match."),
            Notice::ResultUnavailable => println!("Opponent's score is unavailable."),
            Notice::SetupFailed(reason) => println!("Could not start match: {}", reason),
            Notice::InvalidChoice => println!("Enter 1, 2, 3, 4 or q"),
            Notice::Error(message) => println!("Error: {}", message),
        }
    }
}

/// Queued lines of player input
pub struct Input {
    rx: mpsc::UnboundedReceiver<String>,
}

impl Input {
    /// Start reading stdin on a background thread
    pub fn stdin() -> Self {
        Self::from_reader(std::io::BufReader::new(std::io::stdin()))
    }

    /// Pump lines from any blocking reader on a detached thread
    pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || {
            for line in reader.lines() {
                let Ok(line) = line else {
                    break;
                };
                if tx.send(line).is_err() {
                    break;
                }
            }
            debug!("Input closed");
        });
        Self { rx }
    }

    #[cfg(test)]
    pub fn from_receiver(rx: mpsc::UnboundedReceiver<String>) -> Self {
        Self { rx }
    }

    /// Next trimmed line; `None` once input is closed
    pub async fn next_line(&mut self) -> Option<String> {
        self.rx.recv().await.map(|line| line.trim().to_string())
    }

    /// Print `label` and wait for a line
    pub async fn prompt(&mut self, label: &str) -> Option<String> {
        print!("{} ", label);
        let _ = std::io::stdout().flush();
        self.next_line().await
    }
}
