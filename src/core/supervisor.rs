//! # Supervisor: bring-up, hosting, shutdown and restart of one application.
//!
//! The [`Supervisor`] owns the event bus, the lifecycle state machine and the
//! process-wide tokens. [`Supervisor::run`] drives one application from cold
//! start to `Terminated` and then waits for external termination.
//!
//! ## High-level architecture
//! ```text
//! run(args):
//!   detect(probe) ─► load settings (--root or cfg.root) ─► listener: Bus ─► SubscriberSet
//!   registry.resolve(platform) ─► BringUp::run
//!        │ err                          │ ok
//!        ▼                              ▼
//!   boot-from-crash hook           Uninitialized → Initializing
//!   Uninitialized → Faulted        boot-from-crash hook (reliability service)
//!   crash record
//!        │                         app.initialize() ──fault──► Faulted ─┐
//!        │                              │ ok                            │
//!        │                         Running, app.run() ──fault──► Faulted┤
//!        │                              │ ok                            │
//!        │                         wait: app_abort | shutdown request | OS signal
//!        │                              │                               │
//!        └────────────► ShuttingDown ◄──┴───────────────────────────────┘
//!                         on_shutdown() raced against grace (= restart delay)
//!                         app_abort.cancel(); dispose()
//!                       Terminated
//!                         stop connectivity, decide restart (spawned), drop app/device
//!                         wait: terminate | OS signal
//! ```
//!
//! ## Tokens
//! - `app_abort`: handed to the app. Cancelled at once on a fault, and at the
//!   end of a graceful shutdown (hook done or grace elapsed).
//! - `shutdown_request`: asks for a graceful shutdown.
//! - `terminate`: releases the final wait.
//! - runtime token: parents the subsystems; survives app shutdown.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use boardvisor::{
//!     App, AppEntry, AppError, AppRegistry, Board, DeviceTarget, DeviceVariant, LaunchArgs,
//!     Supervisor, SupervisorConfig,
//! };
//!
//! struct Blinky;
//!
//! #[async_trait::async_trait]
//! impl App for Blinky {
//!     async fn run(&self) -> Result<(), AppError> {
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let variant = DeviceVariant::F7FeatherV2;
//!     let registry = AppRegistry::new().with(AppEntry::new(
//!         "blinky",
//!         DeviceTarget::Board(variant),
//!         move || Ok(Box::new(Board::new(variant)) as _),
//!         |_ctx| Ok(Arc::new(Blinky) as _),
//!     ));
//!
//!     let sup = Supervisor::builder(SupervisorConfig::default())
//!         .with_registry(registry)
//!         .build();
//!     let outcome = sup.run(LaunchArgs::from_env()).await;
//!     println!("{:?}", outcome.history);
//! }
//! ```

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::args::LaunchArgs;
use crate::core::bringup::{BringUp, RunningDevice};
use crate::core::builder::SupervisorBuilder;
use crate::core::config::SupervisorConfig;
use crate::core::crash::{self, CrashRecord};
use crate::core::shutdown::signal_or_pending;
use crate::core::state::{Lifecycle, LifecycleState, LifecycleView};
use crate::core::storage::StoragePaths;
use crate::core::subsystems::{SubsystemKind, SubsystemSet};
use crate::device::{App, PlatformOs, ReliabilityService};
use crate::error::{AppError, BringUpError, SettingsError};
use crate::events::{Bus, Event, EventKind};
use crate::platform::{PlatformKind, PlatformProbe, Resolver, detect};
use crate::policies::{self, RestartDecision};
use crate::registry::AppRegistry;
use crate::settings::{LoggingSettings, Settings};
use crate::subscribers::{Subscribe, SubscriberSet};

#[derive(Clone, Default)]
pub(crate) struct Tokens {
    pub(crate) app_abort: CancellationToken,
    pub(crate) shutdown_request: CancellationToken,
    pub(crate) terminate: CancellationToken,
    pub(crate) runtime: CancellationToken,
}

/// What happened during [`Supervisor::run`].
#[derive(Debug)]
pub struct Outcome {
    pub platform: PlatformKind,
    /// Name of the resolved application.
    pub app: Option<String>,
    /// Every lifecycle state entered, oldest first.
    pub history: Vec<LifecycleState>,
    /// Fatal bring-up error, if bring-up did not complete.
    pub bring_up_error: Option<BringUpError>,
    pub crash: Option<CrashRecord>,
    pub restart: RestartDecision,
    pub grace_exceeded: bool,
}

impl Outcome {
    fn new(platform: PlatformKind) -> Self {
        Self {
            platform,
            app: None,
            history: Vec::new(),
            bring_up_error: None,
            crash: None,
            restart: RestartDecision::NO_RESTART,
            grace_exceeded: false,
        }
    }

    pub fn visited(&self, state: LifecycleState) -> bool {
        self.history.contains(&state)
    }
}

/// Cloneable control surface of a running [`Supervisor`].
#[derive(Clone)]
pub struct SupervisorHandle {
    tokens: Tokens,
    state: watch::Receiver<LifecycleView>,
}

impl SupervisorHandle {
    /// Graceful shutdown: the app's shutdown hook runs before its token is cancelled.
    pub fn request_shutdown(&self) {
        self.tokens.shutdown_request.cancel();
    }

    /// Cancels the app's token immediately.
    pub fn abort(&self) {
        self.tokens.app_abort.cancel();
    }

    /// Aborts the app and releases the supervisor's final wait.
    pub fn terminate(&self) {
        self.tokens.app_abort.cancel();
        self.tokens.terminate.cancel();
    }

    pub fn state(&self) -> LifecycleState {
        self.state.borrow().current()
    }

    /// Whether the supervisor has entered `state` so far.
    pub fn visited(&self, state: LifecycleState) -> bool {
        self.state.borrow().visited(state)
    }

    /// Waits until the supervisor has entered `state`, returning at once if
    /// it already did. `false` once `state` can no longer be entered (it was
    /// skipped, or the supervisor is gone).
    pub async fn wait_for(&self, state: LifecycleState) -> bool {
        let mut rx = self.state.clone();
        let reached = rx
            .wait_for(|view| view.settled(state))
            .await
            .map(|view| view.visited(state));
        reached.unwrap_or_else(|_| rx.borrow().visited(state))
    }

    /// The token handed to the application.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.tokens.app_abort.clone()
    }
}

pub struct Supervisor {
    cfg: SupervisorConfig,
    registry: AppRegistry,
    probe: Arc<dyn PlatformProbe>,
    settings: Option<Settings>,
    app: Option<Arc<dyn App>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    #[cfg_attr(not(feature = "logging"), allow(dead_code))]
    console_log: bool,
    bus: Bus,
    lifecycle: Lifecycle,
    tokens: Tokens,
    listener_stop: CancellationToken,
}

impl Supervisor {
    pub fn builder(cfg: SupervisorConfig) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new_internal(
        cfg: SupervisorConfig,
        registry: AppRegistry,
        probe: Arc<dyn PlatformProbe>,
        settings: Option<Settings>,
        app: Option<Arc<dyn App>>,
        subscribers: Vec<Arc<dyn Subscribe>>,
        console_log: bool,
    ) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Self {
            lifecycle: Lifecycle::new(bus.clone()),
            cfg,
            registry,
            probe,
            settings,
            app,
            subscribers,
            console_log,
            bus,
            tokens: Tokens::default(),
            listener_stop: CancellationToken::new(),
        }
    }

    pub fn handle(&self) -> SupervisorHandle {
        SupervisorHandle {
            tokens: self.tokens.clone(),
            state: self.lifecycle.watch(),
        }
    }

    /// The event bus; subscribe before [`Supervisor::run`] to see every event.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Runs the whole lifecycle. Returns only after external termination.
    pub async fn run(mut self, args: LaunchArgs) -> Outcome {
        crash::install_panic_capture();
        let platform = detect(self.probe.as_ref());
        let root = args.root_or(self.cfg.root.clone());
        let (settings, settings_error) = self.load_settings(&root);

        let listener = self.spawn_listener(&settings.logging);
        self.bus
            .publish(Event::new(EventKind::PlatformDetected).with_reason(platform.as_label()));
        if let Some(e) = settings_error {
            self.bus
                .publish(Event::new(EventKind::SettingsWarning).with_reason(e.to_string()));
        }

        let storage = StoragePaths::new(root);
        let mut outcome = Outcome::new(platform);
        let mut sequencer = BringUp::new(
            self.bus.clone(),
            self.tokens.runtime.clone(),
            self.tokens.app_abort.clone(),
        );

        let running =
            match self.bring_up(platform, &args, &settings, &storage, &mut sequencer, &mut outcome) {
                Ok(running) => {
                    self.host(&running, &settings, &storage, &mut outcome).await;
                    Some(running)
                }
                Err(error) => {
                    if let Some(service) = sequencer.reliability_service() {
                        self.boot_from_crash(service.as_ref());
                    }
                    self.abandon(error, &storage, &mut outcome);
                    None
                }
            };

        self.finish(running, sequencer.platform_os(), &settings, &mut outcome)
            .await;

        outcome.history = self.lifecycle.history().to_vec();
        self.listener_stop.cancel();
        let _ = listener.await;
        outcome
    }

    fn load_settings(&mut self, root: &Path) -> (Settings, Option<SettingsError>) {
        if let Some(s) = self.settings.take() {
            return (s.normalized(), None);
        }
        match crate::settings::load(root) {
            Ok(s) => (s, None),
            Err(e) => (Settings::default().normalized(), Some(e)),
        }
    }

    /// Forwards bus events to the subscribers until `listener_stop`, then
    /// drains what is left and waits for the subscriber queues to empty.
    #[cfg_attr(not(feature = "logging"), allow(unused_variables))]
    fn spawn_listener(&mut self, logging: &LoggingSettings) -> JoinHandle<()> {
        #[allow(unused_mut)]
        let mut subs = std::mem::take(&mut self.subscribers);
        #[cfg(feature = "logging")]
        if self.console_log {
            subs.push(Arc::new(crate::subscribers::LogWriter::new(*logging)));
        }
        let set = SubscriberSet::new(subs, self.bus.clone());
        let mut rx = self.bus.subscribe();
        let stop = self.listener_stop.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit(&ev),
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = stop.cancelled() => {
                        loop {
                            match rx.try_recv() {
                                Ok(ev) => set.emit(&ev),
                                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                                Err(_) => break,
                            }
                        }
                        break;
                    }
                }
            }
            set.shutdown().await;
        })
    }

    fn bring_up(
        &mut self,
        platform: PlatformKind,
        args: &LaunchArgs,
        settings: &Settings,
        storage: &StoragePaths,
        sequencer: &mut BringUp,
        outcome: &mut Outcome,
    ) -> Result<RunningDevice, BringUpError> {
        let resolver = Resolver::new(self.cfg.strict_target_resolution);
        let (entry, warning) = self.registry.resolve(platform, resolver)?;
        let entry = entry.clone();

        outcome.app = Some(entry.name().to_string());
        self.bus.publish(
            Event::new(EventKind::AppResolved)
                .with_task(entry.name().to_string())
                .with_reason(entry.target().as_str()),
        );
        if let Some(w) = warning {
            self.bus
                .publish(Event::new(EventKind::ResolveWarning).with_reason(w.to_string()));
        }

        sequencer.run(platform, &entry, args, settings, storage, self.app.take())
    }

    /// Bring-up failed: no app hooks run.
    fn abandon(&mut self, error: BringUpError, storage: &StoragePaths, outcome: &mut Outcome) {
        self.bus.publish(
            Event::new(EventKind::BringUpFailed)
                .with_task(error.as_label())
                .with_reason(error.to_string()),
        );
        self.enter(LifecycleState::Faulted);
        self.tokens.app_abort.cancel();
        self.record_crash(CrashRecord::capture_error("bring-up", &error), storage, outcome);
        self.enter(LifecycleState::ShuttingDown);
        outcome.bring_up_error = Some(error);
    }

    async fn host(
        &mut self,
        running: &RunningDevice,
        settings: &Settings,
        storage: &StoragePaths,
        outcome: &mut Outcome,
    ) {
        let app = &running.app;
        self.enter(LifecycleState::Initializing);
        if let Some(service) = &running.reliability {
            self.boot_from_crash(service.as_ref());
        }

        let faulted = match guarded(app.initialize()).await {
            Err(e) => {
                self.fault("initialize", e, app, storage, outcome).await;
                true
            }
            Ok(()) => {
                self.enter(LifecycleState::Running);
                match guarded(app.run()).await {
                    Err(e) => {
                        self.fault("run", e, app, storage, outcome).await;
                        true
                    }
                    Ok(()) => false,
                }
            }
        };
        if !faulted {
            self.wait_for_stop().await;
        }
        self.shut_down(app, settings, outcome).await;
    }

    fn boot_from_crash(&self, service: &dyn ReliabilityService) {
        if !service.is_crash_data_available() {
            return;
        }
        self.bus.publish(Event::new(EventKind::BootFromCrash));
        if let Err(e) = service.on_boot_from_crash() {
            self.bus
                .publish(Event::new(EventKind::BootFromCrashFailed).with_reason(e.to_string()));
        }
    }

    async fn fault(
        &mut self,
        phase: &'static str,
        error: AppError,
        app: &Arc<dyn App>,
        storage: &StoragePaths,
        outcome: &mut Outcome,
    ) {
        self.enter(LifecycleState::Faulted);
        self.tokens.app_abort.cancel();
        self.bus.publish(
            Event::new(EventKind::AppFault)
                .with_task(phase)
                .with_reason(error.to_string()),
        );
        self.record_crash(CrashRecord::capture(phase, &error), storage, outcome);

        if let Err(e) = guarded(app.on_error(&error)).await {
            self.bus
                .publish(Event::new(EventKind::ErrorHandlerFailed).with_reason(e.to_string()));
        }
    }

    /// Publishes the record and writes it to the crash file (best-effort).
    fn record_crash(&self, record: CrashRecord, storage: &StoragePaths, outcome: &mut Outcome) {
        record.publish(&self.bus);
        let path = storage.crash_file();
        match record.write(&path) {
            Ok(()) => self.bus.publish(
                Event::new(EventKind::CrashRecorded).with_reason(path.display().to_string()),
            ),
            Err(e) => self
                .bus
                .publish(Event::new(EventKind::CrashWriteFailed).with_reason(e.to_string())),
        }
        outcome.crash = Some(record);
    }

    async fn wait_for_stop(&self) {
        let t = &self.tokens;
        tokio::select! {
            _ = t.app_abort.cancelled() => {}
            _ = t.shutdown_request.cancelled() => {
                self.bus.publish(Event::new(EventKind::ShutdownRequested));
            }
            _ = signal_or_pending(self.cfg.listen_os_signals) => {
                t.shutdown_request.cancel();
                self.bus.publish(Event::new(EventKind::ShutdownRequested));
            }
        }
    }

    async fn shut_down(&mut self, app: &Arc<dyn App>, settings: &Settings, outcome: &mut Outcome) {
        self.enter(LifecycleState::ShuttingDown);
        let grace = settings.lifecycle.restart_delay();

        tokio::select! {
            biased;
            res = guarded(app.on_shutdown()) => {
                self.bus.publish(Event::new(EventKind::ShutdownWithinGrace));
                if let Err(e) = res {
                    self.shutdown_fault("on_shutdown", &e);
                }
            }
            _ = time::sleep(grace) => {
                self.bus.publish(Event::new(EventKind::GraceExceeded).with_timeout(grace));
                outcome.grace_exceeded = true;
            }
        }
        self.tokens.app_abort.cancel();

        if let Err(e) = guarded(app.dispose()).await {
            self.shutdown_fault("dispose", &e);
        }
    }

    fn shutdown_fault(&self, hook: &'static str, error: &AppError) {
        self.bus.publish(
            Event::new(EventKind::ShutdownFault)
                .with_task(hook)
                .with_reason(error.to_string()),
        );
    }

    async fn finish(
        &mut self,
        running: Option<RunningDevice>,
        os: Option<Arc<dyn PlatformOs>>,
        settings: &Settings,
        outcome: &mut Outcome,
    ) {
        self.enter(LifecycleState::Terminated);

        let mut subsystems: Option<SubsystemSet> = None;
        let mut reclaim = None;
        if let Some(running) = running {
            let RunningDevice {
                device,
                app,
                reliability,
                subsystems: mut set,
                ..
            } = running;
            set.stop(SubsystemKind::Connectivity).await;
            subsystems = Some(set);
            reclaim = Some((app, device, reliability));
        }

        let device_available = os.is_some();
        let decision = policies::decide(&settings.lifecycle, device_available);
        outcome.restart = decision;
        let restart = match os {
            Some(os) if decision.restart => Some(tokio::spawn(policies::execute(
                decision,
                os,
                self.tokens.app_abort.clone(),
                self.bus.clone(),
            ))),
            _ => {
                if let Some(reason) = policies::explain(&settings.lifecycle, device_available) {
                    self.bus.publish(
                        Event::new(EventKind::RestartSkipped).with_reason(reason.as_message()),
                    );
                }
                None
            }
        };
        drop(reclaim);

        tokio::select! {
            _ = self.tokens.terminate.cancelled() => {}
            _ = signal_or_pending(self.cfg.listen_os_signals) => {}
        }
        self.bus.publish(Event::new(EventKind::TerminateRequested));

        if let Some(handle) = restart {
            handle.abort();
        }
        self.tokens.runtime.cancel();
        if let Some(mut set) = subsystems {
            set.stop_all().await;
        }
    }

    fn enter(&mut self, state: LifecycleState) {
        let res = self.lifecycle.transition(state);
        debug_assert!(res.is_ok(), "{res:?}");
    }

    #[cfg(test)]
    pub(crate) fn root(&self) -> &Path {
        &self.cfg.root
    }
}

/// Awaits an application hook; a panic becomes [`AppError::Panicked`].
async fn guarded<F>(hook: F) -> Result<(), AppError>
where
    F: Future<Output = Result<(), AppError>>,
{
    match AssertUnwindSafe(hook).catch_unwind().await {
        Ok(res) => res,
        Err(payload) => {
            Err(AppError::panicked(payload).with_panic_stack(crash::take_panic_stack()))
        }
    }
}
