// ── Engine ──
//
// Owns the store, the activity log, and the offline queue, and runs the
// two kinds of deferred work: the settle timer that flushes the queue
// after a reconnect, and the consumption simulator interval.
//
// Every write goes through one critical section (`EngineState`), so the
// order of tree changes, queue captures, and log entries always agrees.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::activity::{ActivityLog, SYSTEM_FACILITY};
use crate::analysis::{self, Analyst, NetworkBrief};
use crate::command::{Command, CommandResult};
use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::model::{EntityId, LogEntry, Network, PendingMutation, Severity};
use crate::seed;
use crate::simulator::ConsumptionSimulator;
use crate::store::{CensusChange, DataStore};
use crate::stream::NetworkStream;
use crate::sync::{Connectivity, OfflineQueue, OperatingContext, captures_offline};

/// The main entry point for front ends.
///
/// Cheaply cloneable via `Arc<EngineInner>`. Construction never spawns;
/// call [`start()`](Self::start) from inside a Tokio runtime to arm the
/// background tasks that the current modes call for.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: EngineConfig,
    store: DataStore,
    log: ActivityLog,
    state: Mutex<EngineState>,
    cancel: CancellationToken,
}

struct EngineState {
    connectivity: Connectivity,
    context: OperatingContext,
    queue: OfflineQueue,
    simulator: ConsumptionSimulator,
    settle: Option<TaskSlot>,
    ticker: Option<TaskSlot>,
    next_generation: u64,
    started: bool,
    shut_down: bool,
}

/// A spawned deferred task. A task may only act while its slot is still
/// installed with the same generation and its token is not cancelled.
struct TaskSlot {
    generation: u64,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl TaskSlot {
    fn is_current(slot: Option<&Self>, generation: u64) -> bool {
        slot.is_some_and(|s| s.generation == generation && !s.token.is_cancelled())
    }
}

impl Engine {
    /// Build an engine over `network`. Writes the initial log entry.
    ///
    /// Rejects networks with duplicate ids, duplicate census dates, or
    /// usage rates that are not positive.
    pub fn new(network: Network, config: EngineConfig) -> Result<Self, CoreError> {
        config.validate()?;
        seed::validate(&network)?;

        let simulator = ConsumptionSimulator::from_seed(
            config.rng_seed,
            config.depletion_probability,
            config.thresholds.critical_days,
        );
        let state = EngineState {
            connectivity: config.initial_connectivity,
            context: config.initial_context,
            queue: OfflineQueue::new(),
            simulator,
            settle: None,
            ticker: None,
            next_generation: 0,
            started: false,
            shut_down: false,
        };

        let log = ActivityLog::new();
        log.add("Initial network sync complete.", Severity::Info, SYSTEM_FACILITY);

        Ok(Self {
            inner: Arc::new(EngineInner {
                config,
                store: DataStore::new(network),
                log,
                state: Mutex::new(state),
                cancel: CancellationToken::new(),
            }),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &DataStore {
        &self.inner.store
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Arm the background tasks for the current modes.
    ///
    /// Must be called from within a Tokio runtime. Calling it again is a
    /// no-op; after [`shutdown()`](Self::shutdown) it is an error.
    pub fn start(&self) -> Result<(), CoreError> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(CoreError::Internal(
                "engine must be started inside a Tokio runtime".into(),
            ));
        }
        let mut state = self.inner.lock();
        if state.shut_down {
            return Err(CoreError::Internal("engine has been shut down".into()));
        }
        if state.started {
            return Ok(());
        }
        state.started = true;
        if state.context == OperatingContext::Oversight {
            self.arm_ticker(&mut state);
        }
        if state.connectivity.is_online() && !state.queue.is_empty() {
            self.arm_settle(&mut state);
        }
        info!(
            connectivity = %state.connectivity,
            context = %state.context,
            "engine started"
        );
        Ok(())
    }

    /// Cancel both background tasks and wait for them to finish. Writes
    /// still apply afterwards, but nothing is re-armed.
    pub async fn shutdown(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut state = self.inner.lock();
            state.shut_down = true;
            [state.settle.take(), state.ticker.take()]
                .into_iter()
                .flatten()
                .map(|slot| {
                    slot.token.cancel();
                    slot.handle
                })
                .collect()
        };
        self.inner.cancel.cancel();

        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "background task failed");
            }
        }
        debug!("engine shut down");
    }

    // ── Mode switches ────────────────────────────────────────────────

    /// Set connectivity. Going offline cancels a pending settle; coming
    /// back online with queued mutations arms a new one.
    pub fn set_connectivity(&self, online: bool) {
        let next = Connectivity::from_online(online);
        let mut state = self.inner.lock();
        if state.connectivity == next {
            return;
        }
        state.connectivity = next;
        info!(connectivity = %next, pending = state.queue.len(), "connectivity changed");

        match next {
            Connectivity::Offline => cancel_slot(&mut state.settle),
            Connectivity::Online => {
                if state.started && !state.queue.is_empty() {
                    self.arm_settle(&mut state);
                }
            }
        }
    }

    /// Set the operating context. Field pauses the simulator; Oversight
    /// resumes it.
    pub fn set_context(&self, context: OperatingContext) {
        let mut state = self.inner.lock();
        if state.context == context {
            return;
        }
        state.context = context;
        info!(%context, "operating context changed");

        match context {
            OperatingContext::Field => cancel_slot(&mut state.ticker),
            OperatingContext::Oversight => {
                if state.started {
                    self.arm_ticker(&mut state);
                }
            }
        }
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Apply a stock delta through the offline-aware path.
    ///
    /// Returns the new quantity, or `None` (and changes nothing) when any
    /// id does not resolve.
    pub fn record_stock(
        &self,
        facility_id: &EntityId,
        department_id: &EntityId,
        item_id: &EntityId,
        delta: i64,
    ) -> Option<u32> {
        let mut state = self.inner.lock();
        let before = self.inner.store.snapshot();
        let location = before.item(facility_id, department_id, item_id)?;

        let quantity = self
            .inner
            .store
            .apply_delta(facility_id, department_id, item_id, delta)?;

        if captures_offline(state.connectivity, state.context) {
            let pending = state.queue.capture(facility_id, department_id, item_id, delta);
            debug!(%facility_id, %item_id, delta, pending, "queued offline mutation");
        } else {
            let (verb, severity) = if delta > 0 {
                ("Restocked", Severity::Success)
            } else if delta < 0 {
                ("Dispensed", Severity::Warning)
            } else {
                ("Dispensed", Severity::Success)
            };
            self.inner.log.add(
                format!(
                    "{verb} {} in {}",
                    location.item.category, location.department.name
                ),
                severity,
                location.facility.name.clone(),
            );
        }
        Some(quantity)
    }

    pub fn update_specialist_count(
        &self,
        facility_id: &EntityId,
        department_id: &EntityId,
        delta: i64,
    ) -> Option<u32> {
        let _state = self.inner.lock();
        let count = self
            .inner
            .store
            .update_specialist_count(facility_id, department_id, delta)?;
        debug!(%facility_id, %department_id, count, "specialist count updated");
        Some(count)
    }

    /// Replace or insert the census record for `date`. Idempotent.
    pub fn upsert_census(
        &self,
        facility_id: &EntityId,
        date: NaiveDate,
        count: u32,
    ) -> Option<CensusChange> {
        let _state = self.inner.lock();
        self.inner.store.upsert_census(facility_id, date, count)
    }

    /// Record today's (UTC) census for a facility and log it.
    pub fn record_census(&self, facility_id: &EntityId, count: u32) -> Option<CensusChange> {
        let _state = self.inner.lock();
        let facility = self.inner.store.facility(facility_id)?;
        let today = Utc::now().date_naive();
        let change = self.inner.store.upsert_census(facility_id, today, count)?;
        self.inner.log.add(
            format!("Patient census updated: {count}"),
            Severity::Info,
            facility.name.clone(),
        );
        Some(change)
    }

    /// Run a [`Command`].
    pub fn execute(&self, command: Command) -> CommandResult {
        let result = match command {
            Command::RecordStock {
                facility_id,
                department_id,
                item_id,
                delta,
            } => self
                .record_stock(&facility_id, &department_id, &item_id, delta)
                .map(|quantity| CommandResult::Quantity { quantity }),
            Command::UpdateSpecialists {
                facility_id,
                department_id,
                delta,
            } => self
                .update_specialist_count(&facility_id, &department_id, delta)
                .map(|count| CommandResult::SpecialistCount { count }),
            Command::RecordCensus { facility_id, count } => self
                .record_census(&facility_id, count)
                .map(CommandResult::Census),
            Command::UpsertCensus {
                facility_id,
                date,
                count,
            } => self
                .upsert_census(&facility_id, date, count)
                .map(CommandResult::Census),
            Command::SetConnectivity { online } => {
                self.set_connectivity(online);
                Some(CommandResult::Ok)
            }
            Command::SetContext { context } => {
                self.set_context(context);
                Some(CommandResult::Ok)
            }
        };
        result.unwrap_or(CommandResult::Unresolved)
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Arc<Network> {
        self.inner.store.snapshot()
    }

    pub fn subscribe(&self) -> NetworkStream {
        self.inner.store.subscribe()
    }

    /// All log entries, most recent first.
    pub fn log_entries(&self) -> Vec<Arc<LogEntry>> {
        self.inner.log.entries()
    }

    pub fn subscribe_log(&self) -> broadcast::Receiver<Arc<LogEntry>> {
        self.inner.log.subscribe()
    }

    pub fn pending_count(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub fn pending_mutations(&self) -> Vec<PendingMutation> {
        self.inner.lock().queue.iter().cloned().collect()
    }

    pub fn connectivity(&self) -> Connectivity {
        self.inner.lock().connectivity
    }

    pub fn context(&self) -> OperatingContext {
        self.inner.lock().context
    }

    /// Whether a settle is armed and not yet fired.
    pub fn settle_pending(&self) -> bool {
        self.inner.lock().settle.is_some()
    }

    /// Whether the simulator interval is armed.
    pub fn simulator_running(&self) -> bool {
        self.inner.lock().ticker.is_some()
    }

    // ── Analysis ─────────────────────────────────────────────────────

    pub fn brief(&self) -> NetworkBrief {
        NetworkBrief::from_network(&self.snapshot())
    }

    /// Ask `analyst` about the current network. Never fails: any error or
    /// a timeout yields [`ANALYSIS_FALLBACK`](crate::ANALYSIS_FALLBACK).
    pub async fn analyze<A: Analyst>(&self, analyst: &A) -> String {
        let brief = self.brief();
        analysis::assess_or_fallback(analyst, &brief, self.inner.config.analysis_timeout).await
    }

    // ── Task arming ──────────────────────────────────────────────────

    fn arm_settle(&self, state: &mut EngineState) {
        if state.shut_down {
            return;
        }
        cancel_slot(&mut state.settle);
        let delay = self.inner.config.settle_delay;
        state.settle = Some(self.spawn_slot(state, |inner, generation, token| {
            settle_task(inner, generation, token, delay)
        }));
        debug!(?delay, pending = state.queue.len(), "settle armed");
    }

    fn arm_ticker(&self, state: &mut EngineState) {
        if state.shut_down {
            return;
        }
        cancel_slot(&mut state.ticker);
        let period = self
            .inner
            .config
            .simulator_period
            .max(EngineConfig::MIN_SIMULATOR_PERIOD);
        state.ticker = Some(self.spawn_slot(state, |inner, generation, token| {
            simulator_task(inner, generation, token, period)
        }));
        debug!(?period, "simulator armed");
    }

    fn spawn_slot<F, Fut>(&self, state: &mut EngineState, task: F) -> TaskSlot
    where
        F: FnOnce(Weak<EngineInner>, u64, CancellationToken) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        state.next_generation += 1;
        let generation = state.next_generation;
        let token = self.inner.cancel.child_token();
        let handle = tokio::spawn(task(
            Arc::downgrade(&self.inner),
            generation,
            token.clone(),
        ));
        TaskSlot {
            generation,
            token,
            handle,
        }
    }
}

impl EngineInner {
    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Flush the offline queue if this settle is still the armed one.
    fn settle(&self, generation: u64) {
        let mut state = self.lock();
        if !TaskSlot::is_current(state.settle.as_ref(), generation) {
            debug!(generation, "stale settle ignored");
            return;
        }
        state.settle = None;
        let flushed = state.queue.drain();
        if flushed.is_empty() {
            return;
        }
        self.log.add(
            format!("Synced {} offline records.", flushed.len()),
            Severity::Info,
            SYSTEM_FACILITY,
        );
        info!(records = flushed.len(), "offline queue settled");
    }

    /// Run one simulator tick. Returns `false` once this ticker has been
    /// superseded or cancelled.
    fn simulate(&self, generation: u64) -> bool {
        let mut state = self.lock();
        if !TaskSlot::is_current(state.ticker.as_ref(), generation) {
            return false;
        }
        let depletion = state.simulator.tick(&self.store, &self.log);
        if let Some(alert) = depletion.filter(|d| d.critical) {
            warn!(
                facility = %alert.facility_id,
                item = %alert.item_id,
                runway = alert.runway_days,
                "critical stock level"
            );
        }
        true
    }
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn cancel_slot(slot: &mut Option<TaskSlot>) {
    if let Some(slot) = slot.take() {
        slot.token.cancel();
        debug!(generation = slot.generation, "task cancelled");
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Wait out the settle delay, then flush the queue.
async fn settle_task(
    inner: Weak<EngineInner>,
    generation: u64,
    token: CancellationToken,
    delay: Duration,
) {
    tokio::select! {
        biased;
        () = token.cancelled() => return,
        () = tokio::time::sleep(delay) => {}
    }
    if let Some(inner) = inner.upgrade() {
        inner.settle(generation);
    }
}

/// Tick the simulator every `period` until cancelled.
async fn simulator_task(
    inner: Weak<EngineInner>,
    generation: u64,
    token: CancellationToken,
    period: Duration,
) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = token.cancelled() => break,
            _ = interval.tick() => {
                let Some(inner) = inner.upgrade() else { break };
                if !inner.simulate(generation) {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Department, Facility, History, Item, ItemCategory};

    fn network() -> Network {
        Network::new(vec![Facility {
            id: EntityId::from("h1"),
            name: "Indonesian Hospital".into(),
            max_capacity: 600,
            coordinates: Default::default(),
            census: Vec::new(),
            departments: vec![Arc::new(Department {
                id: EntityId::from("d1"),
                name: "Trauma & Emergency".into(),
                specialist_title: "Trauma Surgeons".into(),
                specialist_count: 15,
                inventory: vec![Arc::new(Item {
                    id: EntityId::from("i2"),
                    category: ItemCategory::Oxygen,
                    quantity: 60,
                    daily_usage_rate: 8.0,
                    history: History::new(),
                })],
            })],
        }])
    }

    fn ids() -> (EntityId, EntityId, EntityId) {
        (EntityId::from("h1"), EntityId::from("d1"), EntityId::from("i2"))
    }

    #[test]
    fn rejects_zero_usage_rate() {
        let mut network = network();
        let facility = Arc::make_mut(&mut network.facilities[0]);
        let department = Arc::make_mut(&mut facility.departments[0]);
        Arc::make_mut(&mut department.inventory[0]).daily_usage_rate = 0.0;

        let err = Engine::new(network, EngineConfig::default()).err().unwrap();
        assert!(matches!(err, CoreError::InvalidSeed { .. }));
        assert!(err.to_string().contains("h1/d1/i2"));
    }

    #[test]
    fn fresh_engine_logs_initial_sync() {
        let engine = Engine::new(network(), EngineConfig::default()).unwrap();
        let entries = engine.log_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "Initial network sync complete.");
        assert_eq!(entries[0].facility_name, SYSTEM_FACILITY);
    }

    #[test]
    fn online_writes_are_logged_not_queued() {
        let engine = Engine::new(network(), EngineConfig::default()).unwrap();
        let (f, d, i) = ids();

        assert_eq!(engine.record_stock(&f, &d, &i, 10), Some(70));
        assert_eq!(engine.record_stock(&f, &d, &i, -4), Some(66));

        let entries = engine.log_entries();
        assert_eq!(entries[0].message, "Dispensed Oxygen (O2) in Trauma & Emergency");
        assert_eq!(entries[0].severity, Severity::Warning);
        assert_eq!(entries[1].message, "Restocked Oxygen (O2) in Trauma & Emergency");
        assert_eq!(entries[1].severity, Severity::Success);
        assert_eq!(engine.pending_count(), 0);
    }

    #[test]
    fn zero_delta_is_logged_as_dispensed_success() {
        let engine = Engine::new(network(), EngineConfig::default()).unwrap();
        let (f, d, i) = ids();
        assert_eq!(engine.record_stock(&f, &d, &i, 0), Some(60));
        let latest = &engine.log_entries()[0];
        assert!(latest.message.starts_with("Dispensed"));
        assert_eq!(latest.severity, Severity::Success);
    }

    #[test]
    fn unresolved_write_changes_nothing() {
        let engine = Engine::new(network(), EngineConfig::default()).unwrap();
        engine.set_context(OperatingContext::Field);
        engine.set_connectivity(false);
        let before = engine.snapshot();
        let (f, d, _) = ids();

        assert_eq!(engine.record_stock(&f, &d, &EntityId::from("i9"), -1), None);

        assert!(Arc::ptr_eq(&before, &engine.snapshot()));
        assert_eq!(engine.pending_count(), 0);
        assert_eq!(engine.log_entries().len(), 1);
        assert_eq!(
            engine.execute(Command::RecordCensus {
                facility_id: EntityId::from("h9"),
                count: 3
            }),
            CommandResult::Unresolved
        );
    }

    #[test]
    fn record_census_logs_count() {
        let engine = Engine::new(network(), EngineConfig::default()).unwrap();
        let change = engine.record_census(&EntityId::from("h1"), 412).unwrap();
        assert_eq!(change, CensusChange::Inserted);
        let latest = &engine.log_entries()[0];
        assert_eq!(latest.message, "Patient census updated: 412");
        assert_eq!(latest.facility_name, "Indonesian Hospital");
    }

    #[test]
    fn start_outside_runtime_is_an_error() {
        let engine = Engine::new(network(), EngineConfig::default()).unwrap();
        assert!(engine.start().is_err());
        assert!(!engine.simulator_running());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = EngineConfig {
            depletion_probability: -0.1,
            ..EngineConfig::default()
        };
        assert!(matches!(
            Engine::new(network(), config),
            Err(CoreError::Config { .. })
        ));
    }
}
