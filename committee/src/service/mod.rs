// Committee service
//
// Runs one `Committee` on a tokio task. Callers send closures over an mpsc
// channel; the task applies them one at a time, so transitions never
// interleave. Events drained after each job are fanned out on a broadcast
// channel.

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::aggregation::{AggregateResult, KeySubmission};
use crate::coordinator::Committee;
use crate::error::CommitteeError;
use crate::events::Event;
use crate::ledger::{Clock, ProofVerifier, ValueTransfer};
use crate::types::{Amount, Identity, RoundIndex};

/// Events buffered per subscriber before it starts lagging
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Committee service stopped")]
    Stopped,

    #[error(transparent)]
    Committee(#[from] CommitteeError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

type Job<C, T, V> = Box<dyn FnOnce(&mut Committee<C, T, V>) + Send>;

/// Cloneable handle to a running committee
pub struct CommitteeHandle<C, T, V> {
    jobs: mpsc::UnboundedSender<Job<C, T, V>>,
    events: broadcast::Sender<Event>,
}

impl<C, T, V> Clone for CommitteeHandle<C, T, V> {
    fn clone(&self) -> Self {
        Self {
            jobs: self.jobs.clone(),
            events: self.events.clone(),
        }
    }
}

/// Move `committee` onto its own task.
///
/// The task ends once every handle is dropped and hands the committee back
/// through the join handle.
pub fn spawn<C, T, V>(
    mut committee: Committee<C, T, V>,
) -> (CommitteeHandle<C, T, V>, JoinHandle<Committee<C, T, V>>)
where
    C: Clock + Send + 'static,
    T: ValueTransfer + Send + 'static,
    V: ProofVerifier + Send + 'static,
{
    let (jobs_tx, mut jobs_rx) = mpsc::unbounded_channel::<Job<C, T, V>>();
    let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    let publisher = events_tx.clone();

    let task = tokio::spawn(async move {
        info!("committee service started");
        while let Some(job) = jobs_rx.recv().await {
            job(&mut committee);
            for event in committee.drain_events() {
                // No subscribers is fine
                let _ = publisher.send(event);
            }
        }
        debug!("committee service stopped");
        committee
    });

    let handle = CommitteeHandle {
        jobs: jobs_tx,
        events: events_tx,
    };
    (handle, task)
}

impl<C, T, V> CommitteeHandle<C, T, V>
where
    C: Clock + Send + 'static,
    T: ValueTransfer + Send + 'static,
    V: ProofVerifier + Send + 'static,
{
    /// Run `f` against the committee once every earlier job has finished
    pub async fn execute<R, F>(&self, f: F) -> ServiceResult<R>
    where
        F: FnOnce(&mut Committee<C, T, V>) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job<C, T, V> = Box::new(move |committee| {
            let _ = reply_tx.send(f(committee));
        });
        self.jobs.send(job).map_err(|_| ServiceError::Stopped)?;
        reply_rx.await.map_err(|_| ServiceError::Stopped)
    }

    /// Like `execute` for fallible transitions
    pub async fn call<R, F>(&self, f: F) -> ServiceResult<R>
    where
        F: FnOnce(&mut Committee<C, T, V>) -> Result<R, CommitteeError> + Send + 'static,
        R: Send + 'static,
    {
        Ok(self.execute(f).await??)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub async fn propose_join(&self, identity: Identity, deposit: Amount) -> ServiceResult<()> {
        self.call(move |c| c.propose_join(identity, deposit)).await
    }

    pub async fn approve_join(&self, voter: Identity, candidate: Identity) -> ServiceResult<bool> {
        self.call(move |c| c.approve_join(voter, candidate)).await
    }

    pub async fn propose_leave(&self, identity: Identity) -> ServiceResult<()> {
        self.call(move |c| c.propose_leave(identity)).await
    }

    pub async fn approve_leave(&self, voter: Identity, target: Identity) -> ServiceResult<bool> {
        self.call(move |c| c.approve_leave(voter, target)).await
    }

    pub async fn submit(&self, submission: KeySubmission) -> ServiceResult<Option<AggregateResult>> {
        self.call(move |c| c.submit(&submission)).await
    }

    pub async fn current_round_index(&self) -> ServiceResult<RoundIndex> {
        self.execute(|c| c.current_round_index()).await
    }

    pub async fn active_members(&self) -> ServiceResult<Vec<Identity>> {
        self.execute(|c| c.active_members().to_vec()).await
    }
}
