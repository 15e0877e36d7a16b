//! Interactive match loop
//!
//! One task waits on three sources at once: the answer countdown, player
//! input and, in networked play, the [`PeerLink`]. All match state lives
//! here; the link only ever sees the final score.

use quizduel_core::{MatchEvent, MatchMachine, MatchMode, MatchPhase, QuestionSet, OPTION_COUNT};
use quizduel_net::{LinkEvent, PeerLink};
use tracing::{debug, info, warn};

use crate::screen::{Notice, Screen};
use crate::terminal::Input;

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    Finished {
        local_score: u32,
        opponent_score: Option<u32>,
        total: usize,
    },
    /// The player quit or input closed
    Abandoned,
    /// The networked match never started
    SetupFailed(String),
}

pub struct MatchSession<'a, S: Screen> {
    machine: MatchMachine,
    mode: MatchMode,
    link: Option<PeerLink>,
    reported: bool,
    screen: &'a mut S,
    input: &'a mut Input,
}

impl<'a, S: Screen> MatchSession<'a, S> {
    /// Solo match; the first question is shown as soon as `run` starts
    pub fn solo(
        questions: QuestionSet,
        question_seconds: u32,
        screen: &'a mut S,
        input: &'a mut Input,
    ) -> Self {
        let mut machine = MatchMachine::with_session_clock().with_question_seconds(question_seconds);
        machine.begin(questions, MatchMode::Solo);
        Self {
            machine,
            mode: MatchMode::Solo,
            link: None,
            reported: false,
            screen,
            input,
        }
    }

    /// Networked match; play starts when the link delivers the questions
    pub fn networked(
        link: PeerLink,
        mode: MatchMode,
        question_seconds: u32,
        screen: &'a mut S,
        input: &'a mut Input,
    ) -> Self {
        Self {
            machine: MatchMachine::with_session_clock().with_question_seconds(question_seconds),
            mode,
            link: Some(link),
            reported: false,
            screen,
            input,
        }
    }

    pub async fn run(mut self) -> SessionEnd {
        loop {
            self.machine.flush_to(&mut *self.screen);

            if let Some(end) = self.check_finished().await {
                return end;
            }

            let step = tokio::select! {
                event = self.machine.clock_mut().next_event() => {
                    self.machine.on_clock_event(event);
                    None
                }
                line = self.input.next_line() => self.on_input(line).await,
                event = next_link_event(&mut self.link) => self.on_link_event(event).await,
            };

            if let Some(end) = step {
                self.machine.flush_to(&mut *self.screen);
                return end;
            }
        }
    }

    async fn on_input(&mut self, line: Option<String>) -> Option<SessionEnd> {
        let Some(line) = line else {
            debug!("Input closed");
            return Some(self.quit().await);
        };

        if line.eq_ignore_ascii_case("q") {
            return Some(self.quit().await);
        }

        if self.machine.phase() != MatchPhase::InQuestion {
            debug!(line = %line, "Ignoring input outside of a question");
            return None;
        }

        match line.parse::<usize>() {
            Ok(choice @ 1..=OPTION_COUNT) => {
                self.machine.submit_choice(choice - 1);
            }
            _ => self.screen.notice(Notice::InvalidChoice),
        }
        None
    }

    async fn on_link_event(&mut self, event: Option<LinkEvent>) -> Option<SessionEnd> {
        let Some(event) = event else {
            self.link = None;
            if self.machine.phase() == MatchPhase::AwaitingStart {
                let reason = "connection closed".to_string();
                self.screen.notice(Notice::SetupFailed(reason.clone()));
                return Some(SessionEnd::SetupFailed(reason));
            }
            if self.reported {
                self.screen.notice(Notice::ResultUnavailable);
                return Some(self.finish(None).await);
            }
            // The local match carries on; check_finished settles the result
            return None;
        };

        match event {
            LinkEvent::Connected { peer_addr } => {
                self.screen.notice(Notice::Connected { peer_addr });
            }
            LinkEvent::HandshakeComplete { remote_name } => {
                self.screen.notice(Notice::OpponentIs { name: remote_name });
            }
            LinkEvent::QuestionsReady(questions) => {
                info!(count = questions.len(), mode = ?self.mode, "Networked match starting");
                self.machine.begin(questions, self.mode);
            }
            LinkEvent::PeerLost(reason) => {
                warn!(reason = %reason, "Opponent lost");
                self.screen.notice(Notice::PeerLost);
            }
            LinkEvent::OpponentScore(score) => {
                return Some(self.finish(Some(score)).await);
            }
            LinkEvent::ResultUnavailable(reason) => {
                warn!(reason = %reason, "Opponent score unavailable");
                self.screen.notice(Notice::ResultUnavailable);
                return Some(self.finish(None).await);
            }
            LinkEvent::Failed(reason) => {
                self.screen.notice(Notice::SetupFailed(reason.clone()));
                self.machine.abandon();
                return Some(SessionEnd::SetupFailed(reason));
            }
        }
        None
    }

    /// End the session once local play is over
    async fn check_finished(&mut self) -> Option<SessionEnd> {
        if !self.machine.is_complete() {
            return None;
        }

        if !self.mode.is_networked() {
            return Some(self.finished(None));
        }

        if self.reported {
            return None;
        }
        self.reported = true;

        let Some(link) = &self.link else {
            self.screen.notice(Notice::ResultUnavailable);
            return Some(self.finish(None).await);
        };

        if let Err(e) = link.report_score(self.machine.score()).await {
            warn!(error = %e, "Could not report score");
            self.screen.notice(Notice::ResultUnavailable);
            return Some(self.finish(None).await);
        }
        None
    }

    /// Show the networked result and drop the connection
    async fn finish(&mut self, opponent_score: Option<u32>) -> SessionEnd {
        let local_score = self.machine.score();
        let total = self.total();
        self.screen.present(MatchEvent::MatchComplete {
            local_score,
            opponent_score,
            total,
        });
        if let Some(link) = self.link.take() {
            link.close().await;
        }
        SessionEnd::Finished {
            local_score,
            opponent_score,
            total,
        }
    }

    fn finished(&self, opponent_score: Option<u32>) -> SessionEnd {
        SessionEnd::Finished {
            local_score: self.machine.score(),
            opponent_score,
            total: self.total(),
        }
    }

    fn total(&self) -> usize {
        self.machine.state().map_or(0, |s| s.questions().len())
    }

    async fn quit(&mut self) -> SessionEnd {
        info!("Match abandoned");
        self.machine.abandon();
        if let Some(link) = self.link.take() {
            link.close().await;
        }
        SessionEnd::Abandoned
    }
}

async fn next_link_event(link: &mut Option<PeerLink>) -> Option<LinkEvent> {
    match link {
        Some(link) => link.next_event().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizduel_core::{PresentationSink, Question};
    use quizduel_net::{LinkRole, TransferPolicy};
    use tokio::sync::mpsc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Shown {
        Event(MatchEvent),
        Notice(Notice),
    }

    struct ChannelScreen(mpsc::UnboundedSender<Shown>);

    impl PresentationSink for ChannelScreen {
        fn present(&mut self, event: MatchEvent) {
            let _ = self.0.send(Shown::Event(event));
        }
    }

    impl Screen for ChannelScreen {
        fn notice(&mut self, notice: Notice) {
            let _ = self.0.send(Shown::Notice(notice));
        }
    }

    fn screen() -> (ChannelScreen, mpsc::UnboundedReceiver<Shown>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelScreen(tx), rx)
    }

    fn input() -> (Input, mpsc::UnboundedSender<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Input::from_receiver(rx), tx)
    }

    /// Every question's answer is "a"
    fn questions(n: usize) -> QuestionSet {
        let list = (0..n)
            .map(|i| Question::new(format!("q{}", i), ["a", "b", "c", "d"], "a").unwrap())
            .collect();
        QuestionSet::new(list).unwrap()
    }

    /// Answer every question correctly until the match result is shown
    async fn answer_all(
        mut shown: mpsc::UnboundedReceiver<Shown>,
        keys: mpsc::UnboundedSender<String>,
    ) {
        while let Some(item) = shown.recv().await {
            match item {
                Shown::Event(MatchEvent::QuestionChanged { options, .. }) => {
                    let position = options.iter().position(|o| o == "a").unwrap();
                    keys.send((position + 1).to_string()).unwrap();
                }
                Shown::Event(MatchEvent::MatchComplete { .. }) => break,
                _ => {}
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_solo_unanswered_questions_expire() {
        let (mut screen, mut shown) = screen();
        let (mut input, _keys) = input();

        let end = MatchSession::solo(questions(2), 3, &mut screen, &mut input)
            .run()
            .await;

        assert_eq!(
            end,
            SessionEnd::Finished {
                local_score: 0,
                opponent_score: None,
                total: 2,
            }
        );

        let mut timeouts = 0;
        while let Ok(item) = shown.try_recv() {
            if let Shown::Event(MatchEvent::AnswerResult { timed_out: true, .. }) = item {
                timeouts += 1;
            }
        }
        assert_eq!(timeouts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_solo_all_correct() {
        let (mut screen, shown) = screen();
        let (mut input, keys) = input();

        let session = MatchSession::solo(questions(3), 10, &mut screen, &mut input);
        let (end, _) = tokio::join!(session.run(), answer_all(shown, keys));

        assert_eq!(
            end,
            SessionEnd::Finished {
                local_score: 3,
                opponent_score: None,
                total: 3,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_choice_then_quit() {
        let (mut screen, mut shown) = screen();
        let (mut input, keys) = input();
        keys.send("7".into()).unwrap();
        keys.send("Q".into()).unwrap();

        let end = MatchSession::solo(questions(2), 10, &mut screen, &mut input)
            .run()
            .await;
        assert_eq!(end, SessionEnd::Abandoned);

        let mut notices = Vec::new();
        while let Ok(item) = shown.try_recv() {
            if let Shown::Notice(n) = item {
                notices.push(n);
            }
        }
        assert_eq!(notices, vec![Notice::InvalidChoice]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_input_abandons() {
        let (mut screen, _shown) = screen();
        let (mut input, keys) = input();
        drop(keys);

        let end = MatchSession::solo(questions(1), 10, &mut screen, &mut input)
            .run()
            .await;
        assert_eq!(end, SessionEnd::Abandoned);
    }

    #[tokio::test(start_paused = true)]
    async fn test_networked_host_and_guest() {
        let (a, b) = tokio::io::duplex(4096);
        let host_link = PeerLink::over(
            a,
            "ann".into(),
            LinkRole::Host {
                questions: questions(2),
            },
        );
        let guest_link = PeerLink::over(
            b,
            "bob".into(),
            LinkRole::Guest {
                policy: TransferPolicy::Lenient,
            },
        );

        let (mut host_screen, host_shown) = screen();
        let (mut host_input, host_keys) = input();
        let (mut guest_screen, _guest_shown) = screen();
        let (mut guest_input, _guest_keys) = input();

        let host = MatchSession::networked(
            host_link,
            MatchMode::Host,
            10,
            &mut host_screen,
            &mut host_input,
        );
        // The guest never answers, so both of its questions time out
        let guest = MatchSession::networked(
            guest_link,
            MatchMode::Guest,
            10,
            &mut guest_screen,
            &mut guest_input,
        );

        let (host_end, guest_end, _) =
            tokio::join!(host.run(), guest.run(), answer_all(host_shown, host_keys));

        assert_eq!(
            host_end,
            SessionEnd::Finished {
                local_score: 2,
                opponent_score: Some(0),
                total: 2,
            }
        );
        assert_eq!(
            guest_end,
            SessionEnd::Finished {
                local_score: 0,
                opponent_score: Some(2),
                total: 2,
            }
        );
    }

    #[tokio::test]
    async fn test_networked_setup_failure() {
        let (a, b) = tokio::io::duplex(4096);
        drop(b);
        let link = PeerLink::over(
            a,
            "bob".into(),
            LinkRole::Guest {
                policy: TransferPolicy::Lenient,
            },
        );

        let (mut screen, _shown) = screen();
        let (mut input, _keys) = input();
        let end = MatchSession::networked(link, MatchMode::Guest, 10, &mut screen, &mut input)
            .run()
            .await;

        assert!(matches!(end, SessionEnd::SetupFailed(_)));
    }
}
