//! Frame scheduling
//!
//! Runs the engine's frame quantum on a dedicated thread, at a fixed pause
//! between frames. The host talks to the running loop only through atomics
//! (state, frame delay) and a command channel; the engine itself is owned
//! by exactly one thread at a time and handed back on `stop`.

use crate::engine::{panic_message, Engine, EngineError};
use crate::foundation::time::{Clock, SystemClock, Timer};
use crate::input::SharedInput;
use crate::render::{DrawItem, FrameInfo, RenderSink};
use crossbeam::channel::{unbounded, Receiver, Sender};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Lifecycle of the frame loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SchedulerState {
    /// No loop thread; the engine is accessible from the host
    Stopped = 0,
    /// Loop thread running quanta
    Running = 1,
    /// Stop requested; finishing the current quantum
    Stopping = 2,
}

impl SchedulerState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::Stopping,
            _ => Self::Stopped,
        }
    }
}

/// Deferred engine operation posted by the host
pub type Command = Box<dyn FnOnce(&mut Engine) + Send>;

/// State shared between the host handle and the loop thread
#[derive(Debug)]
struct SharedControl {
    state: AtomicU8,
    frame_delay_micros: AtomicU64,
    frames_run: AtomicU64,
}

impl SharedControl {
    fn new(frame_delay: Duration) -> Self {
        Self {
            state: AtomicU8::new(SchedulerState::Stopped as u8),
            frame_delay_micros: AtomicU64::new(duration_to_micros(frame_delay)),
            frames_run: AtomicU64::new(0),
        }
    }

    fn state(&self) -> SchedulerState {
        SchedulerState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: SchedulerState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn frame_delay(&self) -> Duration {
        Duration::from_micros(self.frame_delay_micros.load(Ordering::Relaxed))
    }
}

fn duration_to_micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

/// Run a host command; a panic inside it is logged and swallowed
fn run_command(engine: &mut Engine, command: Command) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| command(engine))) {
        log::error!("Posted command panicked: {}", panic_message(payload.as_ref()));
    }
}

/// Everything one quantum needs; moved onto the loop thread while running
struct FrameRunner {
    engine: Engine,
    sink: Box<dyn RenderSink>,
    clock: Box<dyn Clock>,
    input: SharedInput,
    commands: Receiver<Command>,
    timer: Timer,
    draw_buffer: Vec<DrawItem>,
}

impl FrameRunner {
    /// One quantum: time, host commands, staged requests, collisions,
    /// updates, then hand-off to the render sink
    fn run_quantum(&mut self) {
        let delta_time = self.timer.tick(self.clock.now());

        while let Ok(command) = self.commands.try_recv() {
            run_command(&mut self.engine, command);
        }

        let input = self.input.snapshot_frame();
        if let Err(e) = self.engine.run_frame(delta_time, input) {
            log::error!("Frame {} skipped: {}", self.engine.frame_index(), e);
            return;
        }

        self.draw_buffer.clear();
        self.engine.collect_drawables(&mut self.draw_buffer);
        let frame = FrameInfo {
            index: self.engine.frame_index(),
            delta_time,
            stats: self.timer.stats(),
        };
        let sink = &mut self.sink;
        let items = &self.draw_buffer;
        match panic::catch_unwind(AssertUnwindSafe(|| sink.present_frame(&frame, items))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::warn!("Render sink failed on frame {}: {}", frame.index, e),
            Err(payload) => log::error!(
                "Render sink panicked on frame {}: {}",
                frame.index,
                panic_message(payload.as_ref())
            ),
        }
    }

    fn run_loop(mut self, control: &SharedControl) -> Self {
        log::info!("Frame loop started");
        self.timer.reset(self.clock.now());

        while control.state() == SchedulerState::Running {
            self.run_quantum();
            control.frames_run.fetch_add(1, Ordering::Relaxed);

            let delay = control.frame_delay();
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }

        log::info!("Frame loop stopped after {} frames", self.engine.frame_index());
        self
    }
}

/// Starts, stops, and steps the frame loop
///
/// While stopped, the scheduler holds the engine and exposes it directly.
/// While running, the engine lives on the loop thread; use [`post`](Self::post)
/// to reach it.
pub struct FrameScheduler {
    control: Arc<SharedControl>,
    commands: Sender<Command>,
    runner: Option<FrameRunner>,
    thread: Option<JoinHandle<FrameRunner>>,
    input: SharedInput,
}

impl FrameScheduler {
    /// Create a stopped scheduler using the wall clock
    pub fn new(engine: Engine, sink: impl RenderSink + 'static) -> Self {
        Self::with_clock(engine, sink, SystemClock::new())
    }

    /// Create a stopped scheduler with a custom time source
    pub fn with_clock(engine: Engine, sink: impl RenderSink + 'static, clock: impl Clock + 'static) -> Self {
        let (sender, receiver) = unbounded();
        let input = SharedInput::new();
        let control = Arc::new(SharedControl::new(engine.config().frame_delay()));
        let timer = Timer::new(clock.now());

        Self {
            control,
            commands: sender,
            runner: Some(FrameRunner {
                engine,
                sink: Box::new(sink),
                clock: Box::new(clock),
                input: input.clone(),
                commands: receiver,
                timer,
                draw_buffer: Vec::new(),
            }),
            thread: None,
            input,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SchedulerState {
        self.control.state()
    }

    /// Whether the loop thread is running
    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Handle for feeding host input events
    pub fn input(&self) -> SharedInput {
        self.input.clone()
    }

    /// Pause between quanta; takes effect after the current quantum
    pub fn set_frame_delay(&self, delay: Duration) {
        self.control
            .frame_delay_micros
            .store(duration_to_micros(delay), Ordering::Relaxed);
    }

    /// Pause between quanta
    pub fn frame_delay(&self) -> Duration {
        self.control.frame_delay()
    }

    /// Quanta completed by the loop thread since creation
    pub fn frames_run(&self) -> u64 {
        self.control.frames_run.load(Ordering::Relaxed)
    }

    /// Spawn the loop thread
    ///
    /// Fails fast with [`EngineError::MissingSpace`] when no game space has
    /// been configured.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.thread.is_some() {
            return Err(EngineError::AlreadyRunning);
        }
        let Some(runner) = self.runner.take() else {
            return Err(EngineError::LoopPanicked);
        };
        if !runner.engine.has_space() {
            log::error!("Refusing to start frame loop without a game space");
            self.runner = Some(runner);
            return Err(EngineError::MissingSpace);
        }

        self.control.set_state(SchedulerState::Running);
        let control = Arc::clone(&self.control);
        let spawned = thread::Builder::new()
            .name("quadframe-loop".to_string())
            .spawn(move || runner.run_loop(&control));

        match spawned {
            Ok(handle) => {
                self.thread = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.control.set_state(SchedulerState::Stopped);
                Err(EngineError::ThreadSpawn(e))
            }
        }
    }

    /// Ask the loop to stop and wait for the current quantum to finish
    ///
    /// A no-op when already stopped.
    pub fn stop(&mut self) -> Result<(), EngineError> {
        let Some(handle) = self.thread.take() else {
            return Ok(());
        };

        self.control.set_state(SchedulerState::Stopping);
        let joined = handle.join();
        self.control.set_state(SchedulerState::Stopped);

        match joined {
            Ok(runner) => {
                self.runner = Some(runner);
                Ok(())
            }
            Err(_) => {
                log::error!("Frame loop thread panicked; engine state is lost");
                Err(EngineError::LoopPanicked)
            }
        }
    }

    /// Run exactly one quantum on the calling thread
    pub fn step(&mut self) -> Result<(), EngineError> {
        if self.thread.is_some() {
            return Err(EngineError::NotStopped);
        }
        let runner = self.runner.as_mut().ok_or(EngineError::LoopPanicked)?;
        if !runner.engine.has_space() {
            return Err(EngineError::MissingSpace);
        }
        runner.run_quantum();
        Ok(())
    }

    /// Run an operation against the engine
    ///
    /// Runs immediately while stopped; otherwise the loop runs it at the
    /// start of its next quantum, before staged requests are committed.
    pub fn post(&mut self, command: impl FnOnce(&mut Engine) + Send + 'static) {
        if let Some(runner) = self.runner.as_mut() {
            // Commands left over from the last run go first
            while let Ok(queued) = runner.commands.try_recv() {
                run_command(&mut runner.engine, queued);
            }
            run_command(&mut runner.engine, Box::new(command));
            return;
        }
        if self.commands.send(Box::new(command)).is_err() {
            log::warn!("Command dropped: frame loop is gone");
        }
    }

    /// Engine, while stopped
    pub fn engine(&self) -> Option<&Engine> {
        self.runner.as_ref().map(|runner| &runner.engine)
    }

    /// Engine, mutably, while stopped
    pub fn engine_mut(&mut self) -> Option<&mut Engine> {
        self.runner.as_mut().map(|runner| &mut runner.engine)
    }

    /// Stop the loop and take the engine back
    pub fn into_engine(mut self) -> Result<Engine, EngineError> {
        self.stop()?;
        self.runner
            .take()
            .map(|runner| runner.engine)
            .ok_or(EngineError::LoopPanicked)
    }
}

impl Drop for FrameScheduler {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("Frame loop did not shut down cleanly: {}", e);
        }
    }
}

impl std::fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("state", &self.state())
            .field("frame_delay", &self.frame_delay())
            .field("frames_run", &self.frames_run())
            .finish_non_exhaustive()
    }
}
