use std::{cell::Cell, cell::RefCell, fmt, rc::Rc, time::Instant};

/// Monotonic time source in milliseconds since an arbitrary origin.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Wall clock anchored at construction time.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::start()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Hand-driven clock. Clones share the same reading, so a test can keep one
/// handle while the controller owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(now_ms: f64) -> Self {
        Self {
            now_ms: Rc::new(Cell::new(now_ms)),
        }
    }

    pub fn set(&self, now_ms: f64) {
        self.now_ms.set(now_ms);
    }

    /// Moves the clock forward. Negative deltas are ignored.
    pub fn advance(&self, delta_ms: f64) {
        self.now_ms.set(self.now_ms.get() + delta_ms.max(0.0));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now_ms.get()
    }
}

/// Work performed once per display refresh.
pub trait FrameTask {
    fn name(&self) -> &'static str;

    fn on_frame(&mut self, now_ms: f64);
}

impl<T: FrameTask> FrameTask for Rc<RefCell<T>> {
    fn name(&self) -> &'static str {
        self.borrow().name()
    }

    fn on_frame(&mut self, now_ms: f64) {
        self.borrow_mut().on_frame(now_ms);
    }
}

/// Owns the per-frame tasks and the clock that times them.
///
/// The host (a paced loop, a test, a window event loop) calls [`step`] once
/// per display refresh. Nothing re-arms itself: a stopped controller ignores
/// steps until it is started again.
///
/// [`step`]: AnimationController::step
pub struct AnimationController<C: Clock> {
    clock: C,
    tasks: Vec<Box<dyn FrameTask>>,
    running: bool,
    frames: u64,
}

impl<C: Clock> AnimationController<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            tasks: Vec::new(),
            running: false,
            frames: 0,
        }
    }

    pub fn register(&mut self, task: impl FrameTask + 'static) {
        tracing::debug!(task = task.name(), "registered frame task");
        self.tasks.push(Box::new(task));
    }

    pub fn start(&mut self) {
        if !self.running {
            tracing::debug!(tasks = self.tasks.len(), "animation loop started");
        }
        self.running = true;
    }

    pub fn stop(&mut self) {
        if self.running {
            tracing::debug!(frames = self.frames, "animation loop stopped");
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of frames stepped since construction.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Runs one frame of every task at the current clock reading. Returns
    /// `false` without doing any work when the loop is stopped.
    pub fn step(&mut self) -> bool {
        if !self.running {
            return false;
        }

        let now_ms = self.clock.now_ms();
        for task in &mut self.tasks {
            task.on_frame(now_ms);
        }
        self.frames += 1;
        true
    }

    /// Drops every task and stops the loop.
    pub fn teardown(&mut self) {
        self.stop();
        self.tasks.clear();
    }
}

impl<C: Clock> fmt::Debug for AnimationController<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationController")
            .field("tasks", &self.tasks.len())
            .field("running", &self.running)
            .field("frames", &self.frames)
            .finish()
    }
}
