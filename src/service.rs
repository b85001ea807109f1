//! Single-actor wrapper around [`Lottery`]
//!
//! One tokio task owns the engine and applies commands one at a time, so
//! callers on many tasks get the same serialized, all-or-nothing semantics as
//! a ledger-replicated contract. Replies travel back over oneshot channels and
//! every event the engine emits is re-published on a broadcast channel.

use crate::errors::{LotteryError, LotteryResult};
use crate::events::LotteryEvent;
use crate::lottery::{DrawOutcome, Lottery, LotterySnapshot};
use crate::types::{Address, RandomWord, RequestId, Wei};
use crate::upkeep::UpkeepCheck;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

const EVENT_CHANNEL_CAPACITY: usize = 1_024;

type Job = Box<dyn FnOnce(&mut Lottery) + Send>;

enum Command {
    Enter {
        caller: Address,
        amount: Wei,
        reply: oneshot::Sender<LotteryResult<()>>,
    },
    CheckUpkeep {
        check_data: Vec<u8>,
        reply: oneshot::Sender<UpkeepCheck>,
    },
    PerformUpkeep {
        perform_data: Vec<u8>,
        reply: oneshot::Sender<LotteryResult<RequestId>>,
    },
    FulfillRandomWords {
        request_id: RequestId,
        random_words: Vec<RandomWord>,
        reply: oneshot::Sender<LotteryResult<DrawOutcome>>,
    },
    PlayerAt {
        index: usize,
        reply: oneshot::Sender<LotteryResult<Address>>,
    },
    Snapshot {
        reply: oneshot::Sender<LotterySnapshot>,
    },
    Execute(Job),
    Shutdown,
}

/// Owns the engine task
pub struct LotteryService;

impl LotteryService {
    /// Move `lottery` into its own task. The task ends when every handle is
    /// dropped or [`LotteryHandle::shutdown`] is called, and yields the engine.
    pub fn spawn(lottery: Lottery, buffer: usize) -> (LotteryHandle, JoinHandle<Lottery>) {
        let (commands, receiver) = mpsc::channel(buffer.max(1));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let task = tokio::spawn(Self::run(lottery, receiver, events.clone()));
        (LotteryHandle { commands, events }, task)
    }

    async fn run(
        mut lottery: Lottery,
        mut receiver: mpsc::Receiver<Command>,
        events: broadcast::Sender<LotteryEvent>,
    ) -> Lottery {
        let mut published = lottery.events().len();
        tracing::debug!("Lottery service started");

        while let Some(command) = receiver.recv().await {
            match command {
                Command::Enter { caller, amount, reply } => {
                    let _ = reply.send(lottery.enter(caller, amount));
                }
                Command::CheckUpkeep { check_data, reply } => {
                    let _ = reply.send(lottery.check_upkeep(&check_data));
                }
                Command::PerformUpkeep { perform_data, reply } => {
                    let _ = reply.send(lottery.perform_upkeep(&perform_data));
                }
                Command::FulfillRandomWords {
                    request_id,
                    random_words,
                    reply,
                } => {
                    let _ = reply.send(lottery.fulfill_random_words(request_id, &random_words));
                }
                Command::PlayerAt { index, reply } => {
                    let _ = reply.send(lottery.player_at(index));
                }
                Command::Snapshot { reply } => {
                    let _ = reply.send(lottery.snapshot());
                }
                Command::Execute(job) => job(&mut lottery),
                Command::Shutdown => break,
            }

            for event in lottery.events().since(published) {
                // No subscribers is fine
                let _ = events.send(event.clone());
            }
            published = lottery.events().len();
        }

        tracing::debug!("Lottery service stopped");
        lottery
    }
}

/// Cloneable client for the engine task
#[derive(Clone)]
pub struct LotteryHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<LotteryEvent>,
}

impl LotteryHandle {
    /// Receive every event emitted after this call
    pub fn subscribe(&self) -> broadcast::Receiver<LotteryEvent> {
        self.events.subscribe()
    }

    pub async fn enter(&self, caller: Address, amount: Wei) -> LotteryResult<()> {
        self.request(|reply| Command::Enter { caller, amount, reply }).await?
    }

    pub async fn check_upkeep(&self, check_data: &[u8]) -> LotteryResult<UpkeepCheck> {
        let check_data = check_data.to_vec();
        self.request(|reply| Command::CheckUpkeep { check_data, reply }).await
    }

    pub async fn perform_upkeep(&self, perform_data: &[u8]) -> LotteryResult<RequestId> {
        let perform_data = perform_data.to_vec();
        self.request(|reply| Command::PerformUpkeep { perform_data, reply })
            .await?
    }

    pub async fn fulfill_random_words(
        &self,
        request_id: RequestId,
        random_words: Vec<RandomWord>,
    ) -> LotteryResult<DrawOutcome> {
        self.request(|reply| Command::FulfillRandomWords {
            request_id,
            random_words,
            reply,
        })
        .await?
    }

    pub async fn player_at(&self, index: usize) -> LotteryResult<Address> {
        self.request(|reply| Command::PlayerAt { index, reply }).await?
    }

    pub async fn snapshot(&self) -> LotteryResult<LotterySnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Run `f` against the engine inside the actor, serialized with every
    /// other command. Used to let an oracle deliver words through
    /// [`crate::oracle::RandomWordsConsumer`].
    pub async fn execute<F, R>(&self, f: F) -> LotteryResult<R>
    where
        F: FnOnce(&mut Lottery) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply, response) = oneshot::channel();
        let job: Job = Box::new(move |lottery| {
            let _ = reply.send(f(lottery));
        });
        self.commands
            .send(Command::Execute(job))
            .await
            .map_err(|_| LotteryError::ServiceStopped)?;
        response.await.map_err(|_| LotteryError::ServiceStopped)
    }

    /// Stop the engine task after the commands already queued
    pub async fn shutdown(&self) -> LotteryResult<()> {
        self.commands
            .send(Command::Shutdown)
            .await
            .map_err(|_| LotteryError::ServiceStopped)
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> LotteryResult<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| LotteryError::ServiceStopped)?;
        response.await.map_err(|_| LotteryError::ServiceStopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::LotteryConfig;
    use crate::lottery::Collaborators;
    use crate::oracle::MockVrfCoordinator;
    use crate::transfer::InMemoryBank;
    use crate::types::LotteryState;
    use std::sync::Arc;

    fn spawn_service() -> (LotteryHandle, JoinHandle<Lottery>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let coordinator = Arc::new(MockVrfCoordinator::default());
        let mut config = LotteryConfig::with_fee_and_interval(1, 30);
        config.randomness.subscription_id = coordinator.create_subscription();

        let lottery = Lottery::new(
            &config,
            Collaborators {
                oracle: coordinator,
                funds: Arc::new(InMemoryBank::new()),
                clock: clock.clone(),
            },
        )
        .unwrap();

        let (handle, task) = LotteryService::spawn(lottery, 16);
        (handle, task, clock)
    }

    #[tokio::test]
    async fn test_commands_are_applied_in_order() {
        let (handle, task, clock) = spawn_service();
        let player = Address::repeat_byte(3);

        handle.enter(player, 1).await.unwrap();
        assert_eq!(handle.player_at(0).await.unwrap(), player);

        clock.advance(31);
        let request_id = handle.perform_upkeep(&[]).await.unwrap();
        assert!(matches!(
            handle.enter(player, 1).await,
            Err(LotteryError::RoundNotOpen)
        ));

        let outcome = handle.fulfill_random_words(request_id, vec![1]).await.unwrap();
        assert_eq!(outcome.winner, player);

        handle.shutdown().await.unwrap();
        let lottery = task.await.unwrap();
        assert_eq!(lottery.state(), LotteryState::Open);
        assert_eq!(lottery.recent_winner(), Some(player));
    }

    #[tokio::test]
    async fn test_events_are_broadcast() {
        let (handle, _task, _clock) = spawn_service();
        let mut events = handle.subscribe();

        handle.enter(Address::repeat_byte(4), 2).await.unwrap();
        let event = events.recv().await.unwrap();
        assert_eq!(
            event,
            LotteryEvent::EntryRecorded {
                entrant: Address::repeat_byte(4)
            }
        );
    }

    #[tokio::test]
    async fn test_stopped_service_reports_error() {
        let (handle, task, _clock) = spawn_service();
        handle.shutdown().await.unwrap();
        task.await.unwrap();

        assert!(matches!(
            handle.snapshot().await,
            Err(LotteryError::ServiceStopped)
        ));
    }
}
