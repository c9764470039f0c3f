use crate::application::countdown::{COUNTDOWN_SECONDS, CountdownTimer, Tick};
use crate::application::use_cases::fetch_commits::{
    FetchCommitsError, FetchCommitsUseCase, FetchCommitsUseCaseInput, FetchCommitsUseCaseOutput,
};
use crate::application::view::{ServerMessage, render};
use crate::domain::models::credentials::Credentials;
use crate::domain::models::dashboard::{DashboardState, FetchState};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc::{self, Receiver, Sender, UnboundedReceiver, UnboundedSender};
use tokio::task::{JoinError, JoinSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormField {
    Token,
    Owner,
    Repo,
}

/// User actions sent by the page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Command {
    Edit { field: FormField, value: String },
    /// Fetch with the values currently in the form.
    Submit,
    /// Fetch again with the persisted credentials.
    Refresh,
}

type FetchResult = Result<FetchCommitsUseCaseOutput, FetchCommitsError>;

enum TickOutcome {
    /// Sent by a countdown that has since been disarmed or replaced.
    Stale,
    Counted,
    Expired,
}

/// Owns the state of one dashboard session and applies every transition to it.
///
/// The session is driven by [`DashboardController::run`]: commands from the page, countdown ticks
/// and finished fetches are handled one at a time, and the rendered view is pushed to `outbox`
/// after each of them.
pub struct DashboardController<U: FetchCommitsUseCase + Send + Sync + 'static> {
    use_case: Arc<U>,
    outbox: Sender<ServerMessage>,
    state: DashboardState,
    countdown: Option<CountdownTimer>,
    generation: u64,
    ticks_tx: UnboundedSender<Tick>,
    ticks_rx: UnboundedReceiver<Tick>,
    fetches: JoinSet<FetchResult>,
    alerts: Vec<String>,
}

impl<U: FetchCommitsUseCase + Send + Sync + 'static> DashboardController<U> {
    pub fn new(use_case: Arc<U>, outbox: Sender<ServerMessage>) -> Self {
        let (ticks_tx, ticks_rx) = mpsc::unbounded_channel();

        Self {
            use_case,
            outbox,
            state: DashboardState::default(),
            countdown: None,
            generation: 0,
            ticks_tx,
            ticks_rx,
            fetches: JoinSet::new(),
            alerts: Vec::new(),
        }
    }

    /// Runs until `commands` is closed or the page stops listening.
    ///
    /// The form starts from the persisted credentials, like a freshly opened page. Dropping the
    /// controller on return aborts the countdown task and any fetch still in flight.
    #[tracing::instrument(name = "DashboardController::run", skip_all)]
    pub async fn run(mut self, mut commands: Receiver<Command>) {
        tracing::info!("Dashboard session started");
        self.state = DashboardState::new(self.use_case.saved_credentials().await);
        if self.publish().await.is_err() {
            return;
        }

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                Some(tick) = self.ticks_rx.recv() => match self.handle_tick(tick) {
                    TickOutcome::Stale => continue,
                    TickOutcome::Counted => {}
                    TickOutcome::Expired => {
                        // let the page show the 0s banner before the refetch replaces it
                        if self.publish().await.is_err() {
                            break;
                        }
                        self.disarm();
                        self.refresh().await;
                    }
                },
                Some(joined) = self.fetches.join_next(), if !self.fetches.is_empty() => {
                    self.handle_fetch_result(joined);
                },
            }

            if self.publish().await.is_err() {
                break;
            }
        }
        tracing::info!("Dashboard session ended");
    }

    async fn publish(&mut self) -> Result<(), mpsc::error::SendError<ServerMessage>> {
        self.outbox.send(ServerMessage::View(render(&self.state))).await?;
        for message in std::mem::take(&mut self.alerts) {
            self.outbox.send(ServerMessage::Alert { message }).await?;
        }
        Ok(())
    }

    async fn handle_command(&mut self, command: Command) {
        tracing::debug!(?command, "Handling command");
        match command {
            Command::Edit { field, value } => match field {
                FormField::Token => self.state.form.token = value,
                FormField::Owner => self.state.form.owner = value,
                FormField::Repo => self.state.form.repo = value,
            },
            Command::Submit => self.start_fetch(self.state.form.clone()),
            Command::Refresh => {
                if self.state.commits().is_empty() {
                    tracing::debug!("Ignoring refresh while no commit list is displayed");
                } else {
                    self.refresh().await;
                }
            }
        }
    }

    fn handle_tick(&mut self, tick: Tick) -> TickOutcome {
        let current = self.countdown.as_ref().map(CountdownTimer::generation);
        if current != Some(tick.generation) {
            tracing::debug!(?tick, "Ignoring tick from a disarmed countdown");
            return TickOutcome::Stale;
        }

        self.state.countdown = Some(tick.remaining);
        if tick.remaining == 0 {
            TickOutcome::Expired
        } else {
            TickOutcome::Counted
        }
    }

    fn handle_fetch_result(&mut self, joined: Result<FetchResult, JoinError>) {
        let result = joined.unwrap_or_else(|e| Err(FetchCommitsError::FetchFailed(e.into())));

        match result {
            Ok(output) => {
                tracing::info!(
                    owner = %output.credentials.owner,
                    repo = %output.credentials.repo,
                    "Showing {} commits",
                    output.commits.len()
                );
                self.state.fetch = FetchState::Loaded(output.commits);
                self.arm();
            }
            Err(e) => {
                self.state.fetch = FetchState::Failed;
                self.disarm();
                self.alerts.push(e.to_string());
            }
        }
    }

    async fn refresh(&mut self) {
        let saved = self.use_case.saved_credentials().await;
        self.start_fetch(saved);
    }

    fn start_fetch(&mut self, credentials: Credentials) {
        if !credentials.is_complete() {
            self.alerts.push(FetchCommitsError::MissingInput.to_string());
            return;
        }

        self.disarm();
        self.state.fetch = FetchState::Loading;

        let use_case = self.use_case.clone();
        self.fetches.spawn(async move {
            use_case
                .execute(FetchCommitsUseCaseInput { credentials })
                .await
        });
    }

    fn arm(&mut self) {
        self.generation += 1;
        // replacing the handle aborts the previous ticker
        self.countdown = Some(CountdownTimer::arm(
            self.generation,
            COUNTDOWN_SECONDS,
            self.ticks_tx.clone(),
        ));
        self.state.countdown = Some(COUNTDOWN_SECONDS);
    }

    fn disarm(&mut self) {
        self.countdown = None;
        self.state.countdown = None;
    }
}
