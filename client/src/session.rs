//! Game-screen session.
//!
//! [`SessionState`] owns everything one betting screen needs: the active round, the
//! user's placement book, the wallet, the result gate and the resolution cache. Feed
//! updates go through [`SessionState::apply`]; [`SessionState::tick`] recomputes the
//! clock from wall-clock time and returns a [`View`] for the rendering layer.
//!
//! The session also records when each entity was last received; [`View::refetch`] lists
//! the ones the transport layer should fetch again.
//!
//! [`Session`] runs a `SessionState` on a tokio task that ticks at the configured rate,
//! reads updates from an mpsc channel and publishes views on a watch channel. Dropping
//! the `Session` aborts the task.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use roundtable_execution::{
    aggregate_round, resolve, CacheKey, Chip, ClockReading, EntityKind, GateState, Phase,
    PlacementBook, QueryCache, Resolution, ResolutionStatus, ResultGate, RoundClock,
    RoundGuard, RuleBook,
};
use roundtable_types::{
    BetShape, Declaration, GameType, Placement, PlacementRecord, RoundRecord, TempId,
    WalletSnapshot,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::{Config, Error, Result, ValidatedConfig};

const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// One input to a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Update {
    /// Latest record of the active (or a newer) round.
    Round(RoundRecord),
    /// Server list of the user's placements.
    Placements {
        round_id: u64,
        records: Vec<PlacementRecord>,
    },
    /// Winner declaration pushed after settlement.
    Outcome {
        round_id: u64,
        #[serde(default)]
        winning_id: Option<u64>,
        #[serde(default)]
        winning_ids: Option<Vec<u64>>,
    },
    Wallet(WalletSnapshot),
    /// The user placed a bet on the board.
    Submit {
        shape: BetShape,
        targets: Vec<u64>,
        amount: u64,
    },
    /// The backend acknowledged a submitted bet.
    Confirmed { temp_id: TempId, record: PlacementRecord },
    /// The backend refused a submitted bet.
    Rejected {
        temp_id: TempId,
        #[serde(default)]
        reason: Option<String>,
    },
    /// The user closed the result dialog.
    Dismiss,
}

/// Snapshot handed to the rendering layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct View {
    pub game_type: GameType,
    pub round_id: Option<u64>,
    pub clock: Option<ClockReading>,
    /// `mm:ss` until bets close.
    pub place_time_left: Option<String>,
    /// `mm:ss` until the round ends.
    pub game_time_left: Option<String>,
    pub chips: Vec<Chip>,
    pub placements: Vec<Placement>,
    pub resolution: Option<Resolution>,
    pub gate: GateState,
    pub wallet: Option<WalletSnapshot>,
    /// Stop tolerance for wheel games.
    pub wheel_tolerance_degrees: Option<f64>,
    /// Last user-facing error, cleared by the next accepted bet.
    pub last_error: Option<String>,
    /// Entities never received, or received longer ago than the cache ttl.
    pub refetch: Vec<EntityKind>,
}

impl View {
    /// View before any round is known.
    pub fn idle(game_type: GameType) -> Self {
        Self {
            game_type,
            round_id: None,
            clock: None,
            place_time_left: None,
            game_time_left: None,
            chips: Vec::new(),
            placements: Vec::new(),
            resolution: None,
            gate: GateState::Idle,
            wallet: None,
            wheel_tolerance_degrees: None,
            last_error: None,
            refetch: vec![EntityKind::Round, EntityKind::Wallet],
        }
    }
}

/// State of one game screen.
#[derive(Clone, Debug)]
pub struct SessionState {
    game_type: GameType,
    rules: RuleBook,
    guard: RoundGuard,
    round: Option<RoundRecord>,
    book: PlacementBook,
    wallet: Option<WalletSnapshot>,
    gate: ResultGate,
    resolutions: QueryCache<Resolution>,
    /// Receive time per entity.
    received: QueryCache<()>,
    last_error: Option<String>,
}

impl SessionState {
    pub fn new(game_type: GameType, rules: RuleBook, cache_ttl_ms: Option<u64>) -> Self {
        Self {
            game_type,
            rules,
            guard: RoundGuard::new(),
            round: None,
            book: PlacementBook::default(),
            wallet: None,
            gate: ResultGate::new(),
            resolutions: QueryCache::new(cache_ttl_ms),
            received: QueryCache::new(cache_ttl_ms),
            last_error: None,
        }
    }

    pub fn from_config(config: &ValidatedConfig) -> Self {
        Self::new(config.game_type, config.rules.clone(), config.cache_ttl_ms)
    }

    pub fn round(&self) -> Option<&RoundRecord> {
        self.round.as_ref()
    }

    pub fn book(&self) -> &PlacementBook {
        &self.book
    }

    pub fn gate(&self) -> &ResultGate {
        &self.gate
    }

    /// Apply one update. Stale responses for superseded rounds are dropped silently.
    pub fn apply(&mut self, update: Update, now_ms: u64) -> Result<()> {
        match update {
            Update::Round(round) => self.apply_round(round, now_ms),
            Update::Placements { round_id, records } => {
                if self.guard.admit(round_id) {
                    self.book.replace_confirmed(records);
                    self.resolutions.remove(&CacheKey::outcome(round_id));
                    self.received.insert(CacheKey::placements(round_id), (), now_ms);
                }
                Ok(())
            }
            Update::Outcome {
                round_id,
                winning_id,
                winning_ids,
            } => {
                if !self.guard.admit(round_id) {
                    return Ok(());
                }
                let Some(declaration) =
                    Declaration::from_fields(winning_id, winning_ids.as_deref())
                else {
                    debug!(round_id, "ignoring outcome without a winner");
                    return Ok(());
                };
                if let Some(round) = self.round.take() {
                    self.round = Some(round.with_winner(declaration));
                    self.resolutions.remove(&CacheKey::outcome(round_id));
                }
                Ok(())
            }
            Update::Wallet(wallet) => {
                self.wallet = Some(wallet);
                self.received.insert(CacheKey::wallet(), (), now_ms);
                Ok(())
            }
            Update::Submit {
                shape,
                targets,
                amount,
            } => self.submit(shape, targets, amount, now_ms).map(|_| ()),
            Update::Confirmed { temp_id, record } => {
                if !self.guard.admit(record.round_id) {
                    return Ok(());
                }
                let round_id = record.round_id;
                self.book.confirm(temp_id, record)?;
                self.resolutions.remove(&CacheKey::outcome(round_id));
                Ok(())
            }
            Update::Rejected { temp_id, reason } => {
                // Unknown ids belong to a round that was already reset.
                if let Ok(local) = self.book.reject(temp_id) {
                    debug!(%temp_id, round_id = local.round_id, ?reason, "placement rejected");
                    self.last_error = Some(reason.unwrap_or_else(|| "bet was rejected".to_string()));
                }
                Ok(())
            }
            Update::Dismiss => {
                self.gate.dismiss();
                Ok(())
            }
        }
    }

    fn apply_round(&mut self, round: RoundRecord, now_ms: u64) -> Result<()> {
        if round.game_type != self.game_type {
            warn!(
                round_id = round.id,
                expected = %self.game_type,
                got = %round.game_type,
                "ignoring round for another game"
            );
            return Err(Error::WrongGame {
                round_id: round.id,
                expected: self.game_type,
                got: round.game_type,
            });
        }
        if !round.is_well_ordered() {
            warn!(
                round_id = round.id,
                start = round.start_time,
                close = round.placement_end_time,
                end = round.end_time,
                "round timestamps out of order"
            );
        }

        if self.guard.current() == Some(round.id) {
            // A refetch without winner fields keeps a declaration already pushed.
            let known = self.round.as_ref().and_then(RoundRecord::winning_declaration);
            let round = match (round.winning_declaration(), known) {
                (None, Some(declaration)) => round.with_winner(declaration),
                _ => round,
            };
            self.resolutions.remove(&CacheKey::outcome(round.id));
            self.received.insert(CacheKey::round(round.id), (), now_ms);
            self.round = Some(round);
            return Ok(());
        }
        let previous = self.guard.current();
        if !self.guard.advance(round.id) {
            return Ok(());
        }

        info!(round_id = round.id, game = %round.game_type, "round started");
        if let Some(previous) = previous {
            self.resolutions.invalidate_round(previous);
            self.received.invalidate_round(previous);
        }
        self.received.insert(CacheKey::round(round.id), (), now_ms);
        self.gate.round_superseded(round.id);
        self.book.reset(round.id);
        self.round = Some(round);
        Ok(())
    }

    /// Validate and record a bet on the active round.
    pub fn submit(
        &mut self,
        shape: BetShape,
        targets: Vec<u64>,
        amount: u64,
        now_ms: u64,
    ) -> Result<TempId> {
        let Some(round) = self.round.as_ref() else {
            self.last_error = Some(Error::NoActiveRound.to_string());
            return Err(Error::NoActiveRound);
        };
        let rules = self.rules.get(round.game_type);
        match self
            .book
            .submit(round, rules, self.wallet.as_ref(), shape, targets, amount, now_ms)
        {
            Ok(temp_id) => {
                self.last_error = None;
                Ok(temp_id)
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                Err(err.into())
            }
        }
    }

    fn resolution(&mut self, round: &RoundRecord, now_ms: u64) -> Resolution {
        let key = CacheKey::outcome(round.id);
        if let Some(cached) = self.resolutions.get(&key, now_ms) {
            return cached.clone();
        }
        let resolution = resolve(round, &self.book.own_placements(), self.rules.get(round.game_type));
        self.resolutions.insert(key, resolution.clone(), now_ms);
        resolution
    }

    fn stale(&self, keys: &[CacheKey], now_ms: u64) -> Vec<EntityKind> {
        keys.iter()
            .filter(|key| self.received.get(key, now_ms).is_none())
            .map(|key| key.kind)
            .collect()
    }

    /// Entities to fetch again. The outcome is polled while a finished round has no
    /// declaration.
    fn refetch(
        &self,
        round_id: u64,
        phase: Phase,
        status: ResolutionStatus,
        now_ms: u64,
    ) -> Vec<EntityKind> {
        let keys = [
            CacheKey::round(round_id),
            CacheKey::placements(round_id),
            CacheKey::wallet(),
        ];
        let mut stale = self.stale(&keys, now_ms);
        if phase == Phase::Finished && status == ResolutionStatus::Pending {
            stale.push(EntityKind::Outcome);
        }
        stale
    }

    /// Recompute the screen at `now_ms`.
    pub fn tick(&mut self, now_ms: u64) -> View {
        let Some(round) = self.round.clone() else {
            let mut view = View::idle(self.game_type);
            view.wallet = self.wallet;
            view.last_error = self.last_error.clone();
            view.refetch = vec![EntityKind::Round];
            view.refetch.extend(self.stale(&[CacheKey::wallet()], now_ms));
            return view;
        };

        let reading = RoundClock::at(&round, now_ms);
        let resolution = self.resolution(&round, now_ms);

        self.gate
            .observe(round.id, reading.phase, resolution.placements.len());
        if self.gate.outcome_available(&resolution) {
            info!(
                round_id = round.id,
                net = resolution.net_result,
                "showing round result"
            );
        } else {
            self.gate.refresh(&resolution);
        }
        let refetch = self.refetch(round.id, reading.phase, resolution.status, now_ms);

        let rules = self.rules.get(round.game_type);
        View {
            game_type: self.game_type,
            round_id: Some(round.id),
            clock: Some(reading),
            place_time_left: Some(reading.place_time_left()),
            game_time_left: Some(reading.game_time_left()),
            chips: aggregate_round(&round, self.book.iter()),
            placements: self.book.entries().to_vec(),
            resolution: (resolution.status != ResolutionStatus::Pending).then_some(resolution),
            gate: self.gate.state().clone(),
            wallet: self.wallet,
            wheel_tolerance_degrees: round
                .game_type
                .has_wheel()
                .then_some(rules.wheel_tolerance_degrees),
            last_error: self.last_error.clone(),
            refetch,
        }
    }
}

/// Source of wall-clock time in epoch milliseconds.
pub trait Clock: Send + Sync + 'static {
    fn now_ms(&self) -> u64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// A [`SessionState`] running on its own task.
pub struct Session {
    updates: mpsc::Sender<Update>,
    views: watch::Receiver<View>,
    _handle: tokio::task::JoinHandle<()>,
}

impl Drop for Session {
    fn drop(&mut self) {
        self._handle.abort();
    }
}

impl Session {
    /// Validate `config` and spawn using the system clock.
    pub fn start(config: Config) -> Result<Self> {
        let config = config.validate()?;
        info!(game = %config.game_type, tick = ?config.tick, "starting session");
        Ok(Self::spawn(config))
    }

    /// Spawn on the current tokio runtime using the system clock.
    pub fn spawn(config: ValidatedConfig) -> Self {
        Self::spawn_with_clock(config, Arc::new(SystemClock))
    }

    pub fn spawn_with_clock(config: ValidatedConfig, clock: Arc<dyn Clock>) -> Self {
        let (updates, mut rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);
        let (tx, views) = watch::channel(View::idle(config.game_type));
        let period = config.tick;
        let mut state = SessionState::from_config(&config);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    update = rx.recv() => {
                        let Some(update) = update else {
                            debug!("session input closed");
                            break;
                        };
                        if let Err(err) = state.apply(update, clock.now_ms()) {
                            debug!(error = %err, "update not applied");
                        }
                    }
                }
                if tx.send(state.tick(clock.now_ms())).is_err() {
                    break; // All views dropped
                }
            }
        });

        Self {
            updates,
            views,
            _handle: handle,
        }
    }

    pub async fn send(&self, update: Update) -> Result<()> {
        self.updates
            .send(update)
            .await
            .map_err(|_| Error::SessionClosed)
    }

    /// Latest published view.
    pub fn view(&self) -> View {
        self.views.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<View> {
        self.views.clone()
    }
}
