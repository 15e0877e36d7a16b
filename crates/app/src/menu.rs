//! Main menu
//!
//! Picks a question source and a mode, then hands over to a
//! [`MatchSession`]. Failures are shown and the menu comes back.

use std::path::PathBuf;

use quizduel_core::{MatchMode, QuestionBank, QuestionSet, QuestionSource, TriviaDocument};
use quizduel_net::{HostListener, PeerAddress, PeerLink};
use tracing::{error, info};

use crate::config::AppConfig;
use crate::screen::{Notice, Screen};
use crate::session::{MatchSession, SessionEnd};
use crate::terminal::{Input, TerminalScreen};

const DEFAULT_JOIN_HOST: &str = "localhost";

#[derive(Debug, thiserror::Error)]
pub enum MenuError {
    #[error(transparent)]
    Questions(#[from] quizduel_core::Error),

    #[error(transparent)]
    Network(#[from] quizduel_net::Error),

    #[error("Input closed")]
    InputClosed,

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Question '{0}' contains '|' or ',' and cannot be sent to a guest")]
    UnsendableQuestion(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    Solo,
    TriviaFile,
    Host,
    Join,
    Quit,
}

impl MenuChoice {
    fn parse(line: &str) -> Option<Self> {
        match line {
            "1" => Some(Self::Solo),
            "2" => Some(Self::TriviaFile),
            "3" => Some(Self::Host),
            "4" => Some(Self::Join),
            "5" | "q" | "Q" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Run the menu until the player quits or input closes
pub async fn run(config: AppConfig) {
    let mut screen = TerminalScreen::new();
    let mut input = Input::stdin();

    let Some(name) = player_name(&config, &mut input).await else {
        return;
    };
    info!(name = %name, "Player ready");

    loop {
        println!();
        println!("1) Solo  2) Trivia file  3) Host  4) Join  5) Quit");
        let Some(line) = input.prompt(">").await else {
            break;
        };

        let result = match MenuChoice::parse(&line) {
            Some(MenuChoice::Solo) => play_solo(&config, &mut screen, &mut input).await,
            Some(MenuChoice::TriviaFile) => play_trivia(&config, &mut screen, &mut input).await,
            Some(MenuChoice::Host) => host(&config, &name, &mut screen, &mut input).await,
            Some(MenuChoice::Join) => join(&config, &name, &mut screen, &mut input).await,
            Some(MenuChoice::Quit) => break,
            None => {
                screen.notice(Notice::InvalidChoice);
                continue;
            }
        };

        match result {
            Ok(end) => info!(end = ?end, "Session ended"),
            Err(MenuError::InputClosed) => break,
            Err(e) => {
                error!(error = %e, "Could not start match");
                screen.notice(Notice::Error(e.to_string()));
            }
        }
    }
}

async fn player_name(config: &AppConfig, input: &mut Input) -> Option<String> {
    if let Some(name) = &config.player_name {
        return Some(name.clone());
    }
    loop {
        let line = input.prompt("Your name:").await?;
        if !line.is_empty() {
            return Some(line);
        }
    }
}

/// Let the player pick a category from the configured bank
async fn pick_from_bank(
    config: &AppConfig,
    input: &mut Input,
) -> Result<QuestionSet, MenuError> {
    let bank = QuestionBank::load(&config.question_file)?;
    let categories = bank.categories();

    for (i, category) in categories.iter().enumerate() {
        println!("  {}) {}", i + 1, category);
    }
    let line = input.prompt("Category:").await.ok_or(MenuError::InputClosed)?;

    let name = match line.parse::<usize>() {
        Ok(n) if (1..=categories.len()).contains(&n) => categories[n - 1],
        _ => categories
            .iter()
            .copied()
            .find(|c| c.eq_ignore_ascii_case(&line))
            .ok_or_else(|| MenuError::UnknownCategory(line.clone()))?,
    };

    Ok(bank.category(name).load()?)
}

async fn play_solo<S: Screen>(
    config: &AppConfig,
    screen: &mut S,
    input: &mut Input,
) -> Result<SessionEnd, MenuError> {
    let questions = pick_from_bank(config, input).await?;
    Ok(MatchSession::solo(questions, config.question_seconds, screen, input)
        .run()
        .await)
}

async fn play_trivia<S: Screen>(
    config: &AppConfig,
    screen: &mut S,
    input: &mut Input,
) -> Result<SessionEnd, MenuError> {
    let path = input
        .prompt("Trivia file:")
        .await
        .ok_or(MenuError::InputClosed)?;
    let questions = TriviaDocument::from_file(PathBuf::from(path))?.load()?;
    Ok(MatchSession::solo(questions, config.question_seconds, screen, input)
        .run()
        .await)
}

async fn host<S: Screen>(
    config: &AppConfig,
    name: &str,
    screen: &mut S,
    input: &mut Input,
) -> Result<SessionEnd, MenuError> {
    // The set is fixed before anyone can connect
    let questions = pick_from_bank(config, input).await?;
    check_sendable(&questions)?;
    let listener = HostListener::bind(config.port).await?;
    screen.notice(Notice::WaitingForOpponent {
        addr: listener.addr(),
    });

    let link = PeerLink::host(listener, name.to_string(), questions);
    Ok(
        MatchSession::networked(link, MatchMode::Host, config.question_seconds, screen, input)
            .run()
            .await,
    )
}

/// Refuse a set the transfer lines cannot carry, before any guest is involved
fn check_sendable(questions: &QuestionSet) -> Result<(), MenuError> {
    match questions.iter().find(|q| !q.is_wire_safe()) {
        Some(question) => Err(MenuError::UnsendableQuestion(question.prompt().to_string())),
        None => Ok(()),
    }
}

async fn join<S: Screen>(
    config: &AppConfig,
    name: &str,
    screen: &mut S,
    input: &mut Input,
) -> Result<SessionEnd, MenuError> {
    let line = input
        .prompt(&format!("Host address [{}]:", DEFAULT_JOIN_HOST))
        .await
        .ok_or(MenuError::InputClosed)?;
    let target = if line.is_empty() {
        PeerAddress::new(DEFAULT_JOIN_HOST, config.port)
    } else {
        PeerAddress::parse(&line)?
    };

    screen.notice(Notice::Connecting {
        target: target.to_string(),
    });
    let link = PeerLink::join(target, name.to_string(), config.transfer_policy.into());
    Ok(
        MatchSession::networked(link, MatchMode::Guest, config.question_seconds, screen, input)
            .run()
            .await,
    )
}
