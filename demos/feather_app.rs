//! # Example: Feather application with background subsystems
//!
//! Registers the same application for a desktop host and for the F7 Feather
//! board, lets the supervisor pick the one matching this machine, and asks for
//! a graceful shutdown after a few seconds (or on Ctrl-C).
//!
//! ```bash
//! cargo run --example feather_app -- --root /tmp/feather
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use boardvisor::{
    App, AppContext, AppEntry, AppError, AppRegistry, Board, Desktop, Device, DeviceTarget,
    DeviceVariant, LaunchArgs, LifecycleState, PortRequest, SubsystemKind, Supervisor,
    SupervisorConfig, TaskError, TaskFn, TaskRef, wait_for_termination_signal,
};

struct Blinker {
    ctx: AppContext,
}

#[async_trait]
impl App for Blinker {
    async fn initialize(&self) -> Result<(), AppError> {
        let Some(arbiter) = self.ctx.device().arbiter() else {
            println!("[blinker] no pin table on this device, running headless");
            return Ok(());
        };
        let led = arbiter
            .pin("OnboardLedGreen")
            .map_err(AppError::wrap)?;
        let port = arbiter
            .create_port(led, PortRequest::pwm())
            .map_err(AppError::wrap)?;
        println!("[blinker] led ready: {port:?}");
        Ok(())
    }

    async fn run(&self) -> Result<(), AppError> {
        let token = self.ctx.cancellation_token().clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_millis(500));
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tick.tick() => println!("[blinker] blink"),
                }
            }
        });
        Ok(())
    }

    async fn on_shutdown(&self) -> Result<(), AppError> {
        println!("[blinker] turning the led off");
        Ok(())
    }
}

fn heartbeat() -> TaskRef {
    TaskFn::arc("heartbeat", |_ctx: CancellationToken| async move {
        println!("[health] heartbeat");
        Ok::<(), TaskError>(())
    })
}

fn registry() -> AppRegistry {
    let app = |ctx: AppContext| Ok(Arc::new(Blinker { ctx }) as Arc<dyn App>);

    AppRegistry::new()
        .with(AppEntry::new(
            "blinker-desktop",
            DeviceTarget::Desktop,
            || Ok(Box::new(Desktop::new()) as Box<dyn Device>),
            app,
        ))
        .with(AppEntry::new(
            "blinker-feather",
            DeviceTarget::Board(DeviceVariant::F7FeatherV2),
            || {
                let board = Board::new(DeviceVariant::F7FeatherV2)
                    .with_subsystem(SubsystemKind::HealthMetrics, heartbeat());
                Ok(Box::new(board) as Box<dyn Device>)
            },
            app,
        ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let sup = Supervisor::builder(SupervisorConfig::default())
        .with_registry(registry())
        .build();
    let handle = sup.handle();

    tokio::spawn(async move {
        // `false` when bring-up or initialization failed.
        if handle.wait_for(LifecycleState::Running).await {
            tokio::select! {
                _ = wait_for_termination_signal() => {}
                _ = tokio::time::sleep(Duration::from_secs(3)) => {}
            }
            handle.request_shutdown();
        }
        if handle.wait_for(LifecycleState::Terminated).await {
            handle.terminate();
        }
    });

    let outcome = sup.run(LaunchArgs::from_env()).await;
    println!(
        "[main] platform={} states={:?} restart={:?}",
        outcome.platform,
        outcome.history,
        outcome.restart
    );
    if let Some(err) = outcome.bring_up_error {
        anyhow::bail!("bring-up failed: {err}");
    }
    Ok(())
}
