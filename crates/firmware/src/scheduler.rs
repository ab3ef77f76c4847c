//! Cooperative scheduler and task lifecycle.
//!
//! Tasks are registered once, initialised in registration order, self-tested
//! in reverse registration order, then polled round-robin forever. Nothing is
//! preempted: a task's [`Task::poll`] must return promptly because no other
//! task runs until it does.
//!
//! # Example
//!
//! ```
//! use firmware::scheduler::{App, Precondition, Task};
//!
//! struct Blink(u32);
//!
//! impl Task for Blink {
//!     fn label(&self) -> &'static str { "blink" }
//!     fn poll(&mut self) { self.0 += 1; }
//! }
//!
//! let mut blink = Blink(0);
//! let mut app: App<'_, 4> = App::new();
//! app.register(&mut blink).unwrap();
//! app.init();
//! assert!(app.self_test(&[Precondition::new("storage mounted", true)]).passed());
//! app.run_pass();
//! ```

use core::convert::Infallible;

use embassy_time::Instant;
use heapless::Vec;

/// Maximum failures a [`SelfTestReport`] lists by name.
pub const MAX_REPORTED_FAILURES: usize = 16;

/// A cooperatively scheduled unit of work.
pub trait Task {
    /// Unique name used for lookup and in logs.
    fn label(&self) -> &'static str;

    /// One-time setup, called before the self test.
    fn init(&mut self) {}

    /// Power-on self check. Return `false` to keep the system out of the run
    /// loop.
    fn self_test(&mut self) -> bool {
        true
    }

    /// Do a bounded amount of work and return.
    fn poll(&mut self);
}

/// External condition checked alongside the task self tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precondition {
    /// Name reported if it fails.
    pub label: &'static str,
    /// Whether it holds.
    pub ok: bool,
}

impl Precondition {
    /// Create a precondition.
    pub const fn new(label: &'static str, ok: bool) -> Self {
        Self { label, ok }
    }
}

/// Registration failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedulerError {
    /// The registry already holds `MAX` tasks.
    #[error("task registry full")]
    RegistryFull,
    /// Another task already uses this label.
    #[error("duplicate task label")]
    DuplicateLabel,
}

/// Outcome of the aggregate self test.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelfTestReport {
    /// Checks run, preconditions included.
    pub checked: usize,
    /// Total failures, even beyond what `failed` can list.
    pub failure_count: usize,
    /// Labels of failed checks, in the order they ran.
    pub failed: Vec<&'static str, MAX_REPORTED_FAILURES>,
    /// Wall time of the pass in milliseconds.
    pub elapsed_ms: u64,
}

impl SelfTestReport {
    /// `true` if nothing failed.
    pub fn passed(&self) -> bool {
        self.failure_count == 0
    }

    fn record(&mut self, label: &'static str, ok: bool) {
        self.checked = self.checked.saturating_add(1);
        if !ok {
            error!("self test failed: {}", label);
            self.failure_count = self.failure_count.saturating_add(1);
            // Past capacity the failure is still counted and logged.
            let _ = self.failed.push(label);
        }
    }
}

/// Ordered task registry and run loop.
///
/// Constructed explicitly and owned by the entry point; tasks that need to
/// find each other go through [`App::find`].
pub struct App<'a, const MAX: usize> {
    tasks: Vec<&'a mut dyn Task, MAX>,
}

impl<'a, const MAX: usize> App<'a, MAX> {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Append `task` to the poll order.
    pub fn register(&mut self, task: &'a mut dyn Task) -> Result<(), SchedulerError> {
        if self.find(task.label()).is_some() {
            return Err(SchedulerError::DuplicateLabel);
        }
        self.tasks
            .push(task)
            .map_err(|_| SchedulerError::RegistryFull)
    }

    /// Look up a task by label.
    pub fn find(&self, label: &str) -> Option<&dyn Task> {
        self.tasks
            .iter()
            .find(|task| task.label() == label)
            .map(|task| &**task as &dyn Task)
    }

    /// Look up a task by label, mutably.
    pub fn find_mut(&mut self, label: &str) -> Option<&mut (dyn Task + 'a)> {
        self.tasks
            .iter_mut()
            .find(|task| task.label() == label)
            .map(|task| &mut **task)
    }

    /// Registered task count.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Labels in registration order.
    pub fn labels(&self) -> Vec<&'static str, MAX> {
        let mut labels = Vec::new();
        for task in &self.tasks {
            // Same capacity as the registry.
            let _ = labels.push(task.label());
        }
        labels
    }

    /// Initialise every task in registration order.
    pub fn init(&mut self) {
        for task in &mut self.tasks {
            debug!("init {}", task.label());
            task.init();
        }
        info!("{} tasks initialised", self.tasks.len());
    }

    /// Run every check without stopping at the first failure.
    ///
    /// Preconditions are evaluated first, then each task's self test in
    /// reverse registration order.
    pub fn self_test(&mut self, preconditions: &[Precondition]) -> SelfTestReport {
        info!("self test started");
        let started = Instant::now();
        let mut report = SelfTestReport::default();

        for precondition in preconditions {
            report.record(precondition.label, precondition.ok);
        }
        for task in self.tasks.iter_mut().rev() {
            let ok = task.self_test();
            report.record(task.label(), ok);
        }

        report.elapsed_ms = started.elapsed().as_millis();
        if report.passed() {
            info!("self test ok: {} checks in {} ms", report.checked, report.elapsed_ms);
        } else {
            error!(
                "self test failed: {} of {} checks in {} ms",
                report.failure_count,
                report.checked,
                report.elapsed_ms
            );
        }
        report
    }

    /// Poll every task once, in registration order.
    pub fn run_pass(&mut self) {
        for task in &mut self.tasks {
            task.poll();
        }
    }

    /// Poll forever.
    pub fn run(&mut self) -> ! {
        loop {
            self.run_pass();
        }
    }

    /// Initialise, self-test and, only if that passed, enter [`run`](Self::run).
    ///
    /// A failed self test is returned to the caller; the run loop is never
    /// entered in that case.
    pub fn start(&mut self, preconditions: &[Precondition]) -> Result<Infallible, SelfTestReport> {
        self.init();
        let report = self.self_test(preconditions);
        if !report.passed() {
            return Err(report);
        }
        self.run()
    }
}

impl<const MAX: usize> Default for App<'_, MAX> {
    fn default() -> Self {
        Self::new()
    }
}
