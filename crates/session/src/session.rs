//! Drive session - the render loop state machine.
//!
//! RUNNING → EXITING → STOPPED. Every exit path (exit button, quit key,
//! interrupt, iteration limit, loop error) passes through one teardown.

use std::any::Any;
use std::fmt;
use std::future::{poll_fn, Future};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::pin;
use std::task::Poll;
use std::time::{Duration, Instant};

use actor_factory::{ActorFactory, SimClient};
use compositor::DisplaySurface;
use contracts::{ControlCommand, DisplayConfig, DriveConfig, InputConfig, SessionActors};
use controls::{map_controls, InputDevice};
use ingestion::IngestionPipeline;
use observability::{
    record_composite_shown, record_composite_skipped, record_control, record_exit,
    record_queue_depths, LoopMetricsAggregator,
};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::error::{Result, SessionError};
use crate::report::SessionReport;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, loop not started
    Ready,
    Running,
    /// Teardown in progress
    Exiting,
    Stopped,
}

/// What ended the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Joystick exit button
    ExitButton,
    /// Display quit key or window closed
    QuitKey,
    /// Ctrl+C / SIGTERM
    Interrupt,
    /// Configured iteration limit reached
    IterationLimit,
    /// Error inside the loop
    Error,
}

impl ExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExitReason::ExitButton => "exit_button",
            ExitReason::QuitKey => "quit_key",
            ExitReason::Interrupt => "interrupt",
            ExitReason::IterationLimit => "iteration_limit",
            ExitReason::Error => "error",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExitReason::ExitButton => "exit button",
            ExitReason::QuitKey => "quit key",
            ExitReason::Interrupt => "interrupt",
            ExitReason::IterationLimit => "iteration limit",
            ExitReason::Error => "error",
        })
    }
}

/// Loop settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Joystick mapping
    pub input: InputConfig,

    /// Overlay and quit key settings
    pub display: DisplayConfig,

    /// Pause between iterations
    pub poll_interval: Duration,

    /// Stop after this many iterations (None = unlimited)
    pub max_iterations: Option<u64>,
}

impl SessionConfig {
    /// Loop settings from a drive configuration
    pub fn from_drive_config(config: &DriveConfig, max_iterations: Option<u64>) -> Self {
        Self {
            input: config.input.clone(),
            display: config.display.clone(),
            poll_interval: config.display.poll_interval(),
            max_iterations,
        }
    }
}

/// One drive session
///
/// Owns every resource acquired at startup and releases all of them exactly
/// once, whichever exit path fires.
pub struct DriveSession<C, I, D>
where
    C: SimClient,
    I: InputDevice,
    D: DisplaySurface,
{
    factory: ActorFactory<C>,
    actors: SessionActors,
    ingestion: IngestionPipeline,
    input: I,
    display: D,
    config: SessionConfig,
    state: SessionState,
    torn_down: bool,
    last_command: ControlCommand,
    loop_metrics: LoopMetricsAggregator,
}

impl<C, I, D> DriveSession<C, I, D>
where
    C: SimClient,
    I: InputDevice,
    D: DisplaySurface,
{
    /// Create a session over already spawned actors and registered cameras
    pub fn new(
        factory: ActorFactory<C>,
        actors: SessionActors,
        ingestion: IngestionPipeline,
        input: I,
        display: D,
        config: SessionConfig,
    ) -> Self {
        Self {
            factory,
            actors,
            ingestion,
            input,
            display,
            config,
            state: SessionState::Ready,
            torn_down: false,
            last_command: ControlCommand::default(),
            loop_metrics: LoopMetricsAggregator::new(),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Actors owned by this session
    pub fn actors(&self) -> &SessionActors {
        &self.actors
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// Run until an exit trigger fires, then tear down
    ///
    /// `shutdown` resolving counts as an interrupt. A loop error, or a panic
    /// inside the loop, is returned after teardown has run.
    #[instrument(
        name = "drive_session_run",
        skip(self, shutdown),
        fields(vehicle_id = self.actors.vehicle_id())
    )]
    pub async fn run<S>(mut self, shutdown: S) -> Result<SessionReport>
    where
        S: Future<Output = ()>,
    {
        let started = Instant::now();
        self.ingestion.start_all();
        self.state = SessionState::Running;
        info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            max_iterations = ?self.config.max_iterations,
            "drive loop running"
        );

        let outcome = catch_panic(self.drive(shutdown))
            .await
            .unwrap_or_else(|message| Err(SessionError::Panicked { message }));
        let exit_reason = match &outcome {
            Ok(reason) => *reason,
            Err(e) => {
                error!(error = %e, "drive loop failed");
                ExitReason::Error
            }
        };
        record_exit(exit_reason.as_str());

        self.teardown().await;

        let report = SessionReport {
            exit_reason,
            duration: started.elapsed(),
            loop_summary: self.loop_metrics.summary(),
            cameras: self.ingestion.metrics(),
            last_command: self.last_command,
        };
        info!(
            reason = %exit_reason,
            iterations = report.iterations(),
            shown = report.composites_shown(),
            fps = format!("{:.2}", report.fps()),
            "session stopped"
        );

        outcome.map(|_| report)
    }

    async fn drive<S>(&mut self, shutdown: S) -> Result<ExitReason>
    where
        S: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("interrupt received");
                    return Ok(ExitReason::Interrupt);
                }
                _ = ticker.tick() => {
                    if let Some(reason) = self.step().await? {
                        return Ok(reason);
                    }
                }
            }
        }
    }

    /// One loop iteration
    ///
    /// Returns the exit reason when this iteration ends the session.
    pub async fn step(&mut self) -> Result<Option<ExitReason>> {
        let started = Instant::now();

        let snapshot = self.input.poll()?;
        let mapped = map_controls(&snapshot, &self.config.input)?;
        if mapped.exit_requested {
            info!("exit button pressed");
            return Ok(Some(ExitReason::ExitButton));
        }

        let command = mapped.command;
        trace!(%command, "applying control");
        self.factory
            .apply_control(self.actors.vehicle_id(), &command)
            .await?;
        record_control(&command);
        self.last_command = command;

        record_queue_depths(&self.ingestion.depths());
        let shown = match self.ingestion.try_take_all() {
            Some(frames) => {
                let composite = compositor::render(&frames, &command, &self.config.display)?;
                self.display.show(&composite)?;
                record_composite_shown();
                debug!(
                    frame_ids = ?frames.each_ref().map(|f| f.frame_id),
                    "composite shown"
                );
                true
            }
            None => {
                record_composite_skipped();
                false
            }
        };
        self.loop_metrics
            .record_iteration(started.elapsed().as_secs_f64() * 1000.0, shown);

        if self.display.poll_quit()? {
            info!(key = %self.config.display.quit_key, "quit requested from display");
            return Ok(Some(ExitReason::QuitKey));
        }

        if let Some(max) = self.config.max_iterations {
            if self.loop_metrics.iterations >= max {
                info!(max, "iteration limit reached");
                return Ok(Some(ExitReason::IterationLimit));
            }
        }
        Ok(None)
    }

    /// Stop cameras, destroy actors, release display and input
    ///
    /// Only the first call has any effect. Failures are logged.
    async fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.state = SessionState::Exiting;
        info!("tearing down session");

        self.ingestion.stop_all();
        if let Err(e) = self.factory.teardown(&self.actors).await {
            warn!(error = %e, "error during actor teardown");
        }
        self.display.close();
        self.input.release();

        self.state = SessionState::Stopped;
        info!("session teardown complete");
    }
}

/// Poll `future` to completion, turning a panic into its message
async fn catch_panic<F: Future>(future: F) -> std::result::Result<F::Output, String> {
    let mut future = pin!(future);
    poll_fn(|cx| match catch_unwind(AssertUnwindSafe(|| future.as_mut().poll(cx))) {
        Ok(Poll::Ready(output)) => Poll::Ready(Ok(output)),
        Ok(Poll::Pending) => Poll::Pending,
        Err(payload) => Poll::Ready(Err(panic_message(payload.as_ref()))),
    })
    .await
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl<C, I, D> Drop for DriveSession<C, I, D>
where
    C: SimClient,
    I: InputDevice,
    D: DisplaySurface,
{
    fn drop(&mut self) {
        if self.torn_down {
            return;
        }
        warn!(
            actors = ?self.actors.all_actor_ids(),
            "session dropped before teardown, simulator actors left in place"
        );
        self.torn_down = true;
        self.ingestion.stop_all();
        self.display.close();
        self.input.release();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use actor_factory::{MockCarlaClient, MockConfig};
    use compositor::{HeadlessConfig, HeadlessDisplay};
    use controls::{InputSnapshot, ScriptedInput};

    use super::*;

    async fn session(
        mock: MockConfig,
        script: Vec<InputSnapshot>,
        max_iterations: Option<u64>,
    ) -> (
        DriveSession<MockCarlaClient, ScriptedInput, HeadlessDisplay>,
        MockCarlaClient,
    ) {
        session_with(mock, ScriptedInput::new(script), max_iterations).await
    }

    async fn session_with<I: InputDevice>(
        mock: MockConfig,
        input: I,
        max_iterations: Option<u64>,
    ) -> (DriveSession<MockCarlaClient, I, HeadlessDisplay>, MockCarlaClient) {
        let mut config = DriveConfig::default();
        config.cameras.image_width = 16;
        config.cameras.image_height = 12;

        let client = MockCarlaClient::with_config(mock);
        let mut factory = ActorFactory::new(client.clone());
        factory.connect(&config.simulator).await.unwrap();
        let actors = factory
            .bootstrap(&config.simulator, &config.cameras)
            .await
            .unwrap();

        let mut ingestion = IngestionPipeline::new(config.cameras.queue_capacity);
        ingestion
            .register_all(factory.camera_sources(&actors).unwrap())
            .unwrap();

        let display = HeadlessDisplay::new(HeadlessConfig::default()).unwrap();
        let session = DriveSession::new(
            factory,
            actors,
            ingestion,
            input,
            display,
            SessionConfig::from_drive_config(&config, max_iterations),
        );
        (session, client)
    }

    fn idle() -> InputSnapshot {
        InputSnapshot::neutral(&InputConfig::default())
    }

    fn exit_pressed() -> InputSnapshot {
        let mut snapshot = idle();
        snapshot.buttons[0] = true;
        snapshot
    }

    #[tokio::test]
    async fn test_exit_button_skips_control() {
        let (mut session, client) = session(MockConfig::default(), vec![exit_pressed()], None).await;

        let reason = session.step().await.unwrap();

        assert_eq!(reason, Some(ExitReason::ExitButton));
        assert!(client.applied_controls().is_empty());
    }

    #[tokio::test]
    async fn test_step_applies_mapped_control() {
        let mut snapshot = idle();
        snapshot.axes[0] = 0.37;
        snapshot.axes[5] = 0.0;
        let (mut session, client) = session(MockConfig::default(), vec![snapshot], None).await;

        assert_eq!(session.step().await.unwrap(), None);

        let applied = client.applied_controls();
        assert_eq!(applied.len(), 1);
        assert!((applied[0].steer - 0.37).abs() < 1e-6);
        assert!((applied[0].throttle - 0.5).abs() < 1e-6);
        assert_eq!(applied[0].brake, 0.0);
    }

    #[tokio::test]
    async fn test_run_tears_down_once_on_limit() {
        let (session, client) = session(MockConfig::default(), vec![idle()], Some(3)).await;
        let vehicle_id = session.actors().vehicle_id();

        let report = session.run(std::future::pending()).await.unwrap();

        assert_eq!(report.exit_reason, ExitReason::IterationLimit);
        assert_eq!(report.iterations(), 3);
        let destroyed = client.destroyed_actors();
        assert_eq!(destroyed.len(), 5);
        assert_eq!(destroyed.iter().filter(|&&id| id == vehicle_id).count(), 1);
        assert_eq!(client.actor_count(), 0);
    }

    #[tokio::test]
    async fn test_interrupt_wins() {
        let (session, client) = session(MockConfig::default(), vec![idle()], None).await;

        let report = session.run(async {}).await.unwrap();

        assert_eq!(report.exit_reason, ExitReason::Interrupt);
        assert_eq!(report.iterations(), 0);
        assert_eq!(client.actor_count(), 0);
    }

    #[tokio::test]
    async fn test_control_failure_returned_after_teardown() {
        let (session, client) = session(
            MockConfig {
                fail_control_after: Some(2),
                ..Default::default()
            },
            vec![idle()],
            None,
        )
        .await;

        let result = session.run(std::future::pending()).await;

        assert!(matches!(result, Err(crate::SessionError::Simulator(_))));
        assert_eq!(client.applied_controls().len(), 2);
        assert_eq!(client.actor_count(), 0);
    }

    /// Joystick whose driver panics on the given poll
    struct PanickingInput {
        polls: usize,
        panic_on: usize,
        released: Arc<AtomicUsize>,
    }

    impl InputDevice for PanickingInput {
        fn name(&self) -> &str {
            "panicking"
        }

        fn poll(&mut self) -> controls::Result<InputSnapshot> {
            self.polls += 1;
            if self.polls == self.panic_on {
                panic!("joystick driver fault");
            }
            Ok(idle())
        }

        fn release(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_panic_mid_loop_still_tears_down() {
        let released = Arc::new(AtomicUsize::new(0));
        let input = PanickingInput {
            polls: 0,
            panic_on: 3,
            released: released.clone(),
        };
        let (session, client) = session_with(MockConfig::default(), input, None).await;
        let closes = session.display().close_counter();

        let result = session.run(std::future::pending()).await;

        match result {
            Err(SessionError::Panicked { message }) => {
                assert!(message.contains("joystick driver fault"), "{message}")
            }
            other => panic!("expected a panic error, got {other:?}"),
        }
        assert_eq!(client.applied_controls().len(), 2);
        assert_eq!(client.destroyed_actors().len(), 5);
        assert_eq!(client.actor_count(), 0);
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_drop_without_run_releases_input() {
        let (session, client) = session(MockConfig::default(), vec![idle()], None).await;
        let released = session.input().release_counter();
        let closes = session.display().close_counter();

        drop(session);

        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        // actors are only destroyed by the async teardown
        assert_eq!(client.vehicle_count(), 1);
    }

    #[tokio::test]
    async fn test_composite_shown_when_frames_arrive() {
        let (session, _client) = session(MockConfig::default(), vec![idle()], Some(200)).await;

        let report = tokio::time::timeout(Duration::from_secs(10), session.run(std::future::pending()))
            .await
            .unwrap()
            .unwrap();

        assert!(report.composites_shown() > 0, "{report}");
        assert_eq!(
            report.composites_shown() + report.composites_skipped(),
            report.iterations()
        );
    }
}
