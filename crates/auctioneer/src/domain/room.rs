//! A single auction room: a FIFO queue of listings, at most one running
//! auction, and the set of connected participants it broadcasts to.
//!
//! All mutable room state sits behind one async mutex. Every operation locks,
//! mutates and broadcasts before releasing, so participants observe bid and
//! timer changes in the order the room applied them. The lock is never held
//! across ledger calls or sleeps; settlement and the countdown run as
//! separate tasks against the same handle.

use {
    crate::domain::{
        auction::{ActiveAuction, ClosedAuction},
        settlement::{self, Outcome},
    },
    ledger::Ledger,
    model::{RoomId, UserId, auction::AuctionItem, message::ServerMessage, room::RoomStatus},
    std::{
        collections::{HashMap, VecDeque},
        sync::Arc,
        time::{Duration, Instant},
    },
    tokio::{
        sync::{Mutex, mpsc},
        task::JoinHandle,
    },
};

/// The sending half of a participant's connection.
pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

const TICK: Duration = Duration::from_secs(1);

/// Timing rules shared by all rooms.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// How long an outcome stays on screen before the next queued item goes
    /// up.
    pub grace_period: Duration,
    /// A bid landing with less than this left on the clock resets the
    /// countdown to exactly this window.
    pub snipe_window: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_secs(5),
            snipe_window: Duration::from_secs(10),
        }
    }
}

/// Handle to one auction room. Cheap to clone; all clones operate on the same
/// room.
#[derive(Clone)]
pub struct Room(Arc<Inner>);

struct Inner {
    id: RoomId,
    name: String,
    config: Config,
    ledger: Arc<dyn Ledger>,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    phase: Phase,
    queue: VecDeque<AuctionItem>,
    participants: HashMap<UserId, Outbox>,
    countdown: Option<Countdown>,
    /// Total auctions ever started in this room. Countdown tasks remember the
    /// value they were started with to detect that they have been superseded.
    starts: u64,
}

#[derive(Default)]
enum Phase {
    #[default]
    Idle,
    Active(ActiveAuction),
    /// The previous auction is being settled; the next item waits for the
    /// settlement task to resume the queue.
    Settling,
}

impl Phase {
    /// Takes the running auction out, leaving the room `Settling`. Returns
    /// `None` and changes nothing when no auction is running.
    fn begin_settling(&mut self) -> Option<ActiveAuction> {
        match std::mem::replace(self, Self::Settling) {
            Self::Active(auction) => Some(auction),
            other => {
                *self = other;
                None
            }
        }
    }
}

struct Countdown {
    seq: u64,
    task: JoinHandle<()>,
}

/// Why a bid was not accepted. Reported to the bidder only; the room state
/// does not change.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum BidError {
    #[error("no auction is currently running")]
    NoActiveAuction,
    #[error("you cannot bid on your own item")]
    OwnItem,
    #[error("bid of {amount} is too low, the current bid is {current_bid}")]
    TooLow { amount: u64, current_bid: u64 },
}

impl Room {
    pub fn new(id: RoomId, config: Config, ledger: Arc<dyn Ledger>) -> Self {
        Self(Arc::new(Inner {
            name: format!("Auction Room {id}"),
            id,
            config,
            ledger,
            state: Mutex::new(State::default()),
        }))
    }

    pub fn id(&self) -> RoomId {
        self.0.id
    }

    /// Adds a listing to the queue and returns how many sales have to clear
    /// before it goes up. An idle room starts the auction right away, at
    /// position 0.
    pub async fn enqueue(&self, item: AuctionItem) -> usize {
        let mut state = self.0.state.lock().await;
        let state = &mut *state;
        let idle = matches!(state.phase, Phase::Idle);
        let position = state.queue.len() + usize::from(!idle);
        tracing::debug!(room = %self.0.id, card = %item.card, position, "listing queued");
        state.queue.push_back(item);
        if idle {
            self.start_next(state);
        }
        position
    }

    /// Registers a participant. Returns the outbox that identifies this
    /// registration and the stream of events addressed to it. The new
    /// participant receives a state snapshot first; everyone then learns of
    /// the join. Connecting again under the same name replaces the earlier
    /// registration.
    pub async fn connect(&self, user: UserId) -> (Outbox, mpsc::UnboundedReceiver<ServerMessage>) {
        let (outbox, inbox) = mpsc::unbounded_channel();
        let mut state = self.0.state.lock().await;
        let state = &mut *state;
        let _ = outbox.send(state.snapshot());
        if state
            .participants
            .insert(user.clone(), outbox.clone())
            .is_none()
        {
            Metrics::get().connected_participants.inc();
        }
        tracing::debug!(room = %self.0.id, %user, "participant joined");
        let message = ServerMessage::UserJoined {
            user,
            participants: state.participants.len(),
        };
        broadcast(&mut state.participants, message);
        (outbox, inbox)
    }

    /// Removes a participant from the broadcast set, but only while `outbox`
    /// is still their registered connection. A stale session whose user
    /// already reconnected leaves the fresh registration untouched. Bids they
    /// already placed stand; a disconnected winner still wins.
    pub async fn disconnect(&self, user: &UserId, outbox: &Outbox) {
        let mut state = self.0.state.lock().await;
        let registered = state
            .participants
            .get(user)
            .is_some_and(|current| current.same_channel(outbox));
        if registered {
            remove_participant(&mut state.participants, user);
        }
    }

    /// Sends an event to a single participant, such as a reply to one of
    /// their requests.
    pub async fn send_to(&self, user: &UserId, message: ServerMessage) {
        let mut state = self.0.state.lock().await;
        let state = &mut *state;
        let failed = state
            .participants
            .get(user)
            .is_some_and(|outbox| outbox.send(message).is_err());
        if failed {
            remove_participant(&mut state.participants, user);
        }
    }

    /// Validates and applies a bid. Everything an accepted bid changes is
    /// broadcast before this returns.
    pub async fn place_bid(&self, bidder: &UserId, amount: u64) -> Result<(), BidError> {
        let mut state = self.0.state.lock().await;
        let state = &mut *state;
        let Phase::Active(auction) = &mut state.phase else {
            Metrics::bid("no_auction");
            return Err(BidError::NoActiveAuction);
        };
        if *bidder == auction.item.seller {
            Metrics::bid("own_item");
            return Err(BidError::OwnItem);
        }
        if amount <= auction.current_bid {
            Metrics::bid("too_low");
            return Err(BidError::TooLow {
                amount,
                current_bid: auction.current_bid,
            });
        }
        if amount >= auction.item.buyout {
            auction.buy_out(bidder.clone());
            let message = ServerMessage::Buyout {
                bidder: bidder.clone(),
                amount: auction.current_bid,
            };
            Metrics::bid("buyout");
            tracing::info!(room = %self.0.id, %bidder, price = auction.item.buyout, "buyout");
            broadcast(&mut state.participants, message);
            self.finish(state);
            return Ok(());
        }
        auction.record_bid(bidder.clone(), amount);
        let mut messages = Vec::with_capacity(2);
        let snipe_window = self.0.config.snipe_window.as_secs();
        if auction.time_remaining < snipe_window {
            auction.time_remaining = snipe_window;
            Metrics::get().timer_extensions.inc();
            messages.push(ServerMessage::TimerExtended {
                new_time: snipe_window,
            });
        }
        messages.push(ServerMessage::NewBid {
            bidder: bidder.clone(),
            amount,
            time_remaining: auction.time_remaining,
        });
        Metrics::bid("accepted");
        tracing::debug!(room = %self.0.id, %bidder, amount, "bid accepted");
        for message in messages {
            broadcast(&mut state.participants, message);
        }
        Ok(())
    }

    /// A status line for room listings.
    pub async fn status(&self) -> RoomStatus {
        let state = self.0.state.lock().await;
        let auction = match &state.phase {
            Phase::Active(auction) => Some(auction),
            Phase::Idle | Phase::Settling => None,
        };
        RoomStatus {
            id: self.0.id,
            name: self.0.name.clone(),
            active: auction.is_some(),
            current_bid: auction.map(|auction| auction.current_bid),
            time_remaining: auction.map(|auction| auction.time_remaining),
            participants: state.participants.len(),
            queue_length: state.queue.len(),
        }
    }

    /// The full snapshot sent in reply to a `status` request.
    pub async fn auction_state(&self) -> ServerMessage {
        self.0.state.lock().await.snapshot()
    }

    pub async fn queue_length(&self) -> usize {
        self.0.state.lock().await.queue.len()
    }

    /// Pops the queue head and opens an auction for it. No-op on an empty
    /// queue.
    fn start_next(&self, state: &mut State) {
        let Some(item) = state.queue.pop_front() else {
            return;
        };
        // A previous countdown may still be pending if it was superseded
        // rather than expired. Cancelling a finished task is a no-op.
        if let Some(countdown) = state.countdown.take() {
            countdown.task.abort();
        }
        let auction = ActiveAuction::new(item);
        let message = ServerMessage::AuctionStarted {
            item: auction.item.clone(),
            time_remaining: auction.time_remaining,
        };
        tracing::info!(
            room = %self.0.id,
            card = %auction.item.card,
            seller = %auction.item.seller,
            starting_bid = auction.item.starting_bid,
            "auction started",
        );
        state.phase = Phase::Active(auction);
        state.starts += 1;
        let seq = state.starts;
        let room = self.clone();
        state.countdown = Some(Countdown {
            seq,
            task: tokio::task::spawn(async move { room.countdown(seq).await }),
        });
        Metrics::get().auctions_started.inc();
        broadcast(&mut state.participants, message);
    }

    /// Ticks the running auction down once per second until it expires or
    /// this task is superseded.
    async fn countdown(self, seq: u64) {
        loop {
            tokio::time::sleep(TICK).await;
            let mut state = self.0.state.lock().await;
            let state = &mut *state;
            if state.countdown.as_ref().map(|countdown| countdown.seq) != Some(seq) {
                return;
            }
            let Phase::Active(auction) = &mut state.phase else {
                return;
            };
            auction.time_remaining = auction.time_remaining.saturating_sub(1);
            let remaining = auction.time_remaining;
            if remaining == 0 {
                self.finish(state);
                return;
            }
            // Every 5 seconds, every second once the end is close.
            if remaining % 5 == 0 || remaining <= self.0.config.snipe_window.as_secs() {
                broadcast(
                    &mut state.participants,
                    ServerMessage::TimerUpdate {
                        time_remaining: remaining,
                    },
                );
            }
        }
    }

    /// Closes the running auction and hands it to a settlement task. The room
    /// stays `Settling` until that task resumes the queue.
    fn finish(&self, state: &mut State) {
        if let Some(countdown) = state.countdown.take() {
            countdown.task.abort();
        }
        let Some(auction) = state.phase.begin_settling() else {
            return;
        };
        let closed = auction.close();
        let room = self.clone();
        tokio::task::spawn(async move { room.settle_and_resume(closed).await });
    }

    async fn settle_and_resume(self, auction: ClosedAuction) {
        let timer = Instant::now();
        let outcome = settlement::settle(self.0.ledger.as_ref(), &auction).await;
        Metrics::settled(&outcome, timer.elapsed());
        let message = outcome.to_message(&auction);
        {
            let mut state = self.0.state.lock().await;
            broadcast(&mut state.participants, message);
        }
        // Let everyone see the outcome before the next item goes up.
        tokio::time::sleep(self.0.config.grace_period).await;
        let mut state = self.0.state.lock().await;
        let state = &mut *state;
        state.phase = Phase::Idle;
        if state.queue.is_empty() {
            broadcast(&mut state.participants, ServerMessage::RoomIdle);
        } else {
            self.start_next(state);
        }
    }
}

impl State {
    fn snapshot(&self) -> ServerMessage {
        let auction = match &self.phase {
            Phase::Active(auction) => Some(auction),
            Phase::Idle | Phase::Settling => None,
        };
        ServerMessage::AuctionState {
            item: auction.map(|auction| auction.item.clone()),
            current_bid: auction.map(|auction| auction.current_bid).unwrap_or_default(),
            current_winner: auction.and_then(|auction| auction.winner.clone()),
            time_remaining: auction
                .map(|auction| auction.time_remaining)
                .unwrap_or_default(),
            active: auction.is_some(),
            queue_length: self.queue.len(),
        }
    }
}

/// Sends an event to every connected participant. Sending is fire and forget;
/// participants whose connection is gone get removed, which in turn announces
/// their departure.
fn broadcast(participants: &mut HashMap<UserId, Outbox>, message: ServerMessage) {
    let dead: Vec<_> = participants
        .iter()
        .filter(|(_, outbox)| outbox.send(message.clone()).is_err())
        .map(|(user, _)| user.clone())
        .collect();
    for user in dead {
        remove_participant(participants, &user);
    }
}

fn remove_participant(participants: &mut HashMap<UserId, Outbox>, user: &UserId) {
    if participants.remove(user).is_none() {
        return;
    }
    Metrics::get().connected_participants.dec();
    tracing::debug!(%user, "participant left");
    let message = ServerMessage::UserLeft {
        user: user.clone(),
        participants: participants.len(),
    };
    broadcast(participants, message);
}

#[derive(prometheus_metric_storage::MetricStorage)]
#[metric(subsystem = "auction")]
struct Metrics {
    /// Auctions opened.
    auctions_started: prometheus::IntCounter,

    /// Auctions that reached an outcome, by settlement outcome.
    #[metric(labels("outcome"))]
    auctions_completed: prometheus::IntCounterVec,

    /// Bids received, by validation result.
    #[metric(labels("result"))]
    bids: prometheus::IntCounterVec,

    /// Times the anti-snipe rule pushed a countdown back up.
    timer_extensions: prometheus::IntCounter,

    /// Participants currently connected, across all rooms.
    connected_participants: prometheus::IntGauge,

    /// Time spent settling an auction against the ledger.
    #[metric(buckets(0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1, 5))]
    settlement_time: prometheus::Histogram,
}

impl Metrics {
    fn get() -> &'static Self {
        Metrics::instance(observe::metrics::get_storage_registry()).unwrap()
    }

    fn bid(result: &str) {
        Self::get().bids.with_label_values(&[result]).inc();
    }

    fn settled(outcome: &Outcome, elapsed: Duration) {
        let metrics = Self::get();
        metrics
            .auctions_completed
            .with_label_values(&[outcome.label()])
            .inc();
        metrics.settlement_time.observe(elapsed.as_secs_f64());
    }
}
