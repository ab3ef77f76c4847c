//! Integration test: task lifecycle through the scheduler.
//!
//! Tests that:
//!   1. init runs in registration order
//!   2. self tests run in reverse registration order, after preconditions
//!   3. a failing check never short-circuits the rest
//!   4. start() refuses to enter the run loop when anything failed
//!   5. run_pass polls in registration order
//!
//! Run with: cargo test -p firmware --test lifecycle

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]

use std::cell::RefCell;
use std::rc::Rc;

use firmware::{App, Precondition, Task};

type Journal = Rc<RefCell<Vec<String>>>;

struct Recorder {
    label: &'static str,
    healthy: bool,
    journal: Journal,
}

impl Recorder {
    fn new(label: &'static str, healthy: bool, journal: &Journal) -> Self {
        Self {
            label,
            healthy,
            journal: Rc::clone(journal),
        }
    }

    fn note(&self, what: &str) {
        self.journal.borrow_mut().push(format!("{what}:{}", self.label));
    }
}

impl Task for Recorder {
    fn label(&self) -> &'static str {
        self.label
    }

    fn init(&mut self) {
        self.note("init");
    }

    fn self_test(&mut self) -> bool {
        self.note("test");
        self.healthy
    }

    fn poll(&mut self) {
        self.note("poll");
    }
}

fn entries(journal: &Journal, prefix: &str) -> Vec<String> {
    journal
        .borrow()
        .iter()
        .filter(|e| e.starts_with(prefix))
        .cloned()
        .collect()
}

#[test]
fn init_forward_self_test_reverse() {
    let journal = Journal::default();
    let mut audio = Recorder::new("audio", true, &journal);
    let mut menu = Recorder::new("menu", true, &journal);
    let mut led = Recorder::new("heartbeat", true, &journal);

    let mut app: App<'_, 8> = App::new();
    app.register(&mut audio).unwrap();
    app.register(&mut menu).unwrap();
    app.register(&mut led).unwrap();

    app.init();
    let report = app.self_test(&[Precondition::new("storage mounted", true)]);

    assert!(report.passed());
    assert_eq!(report.checked, 4);
    assert_eq!(
        entries(&journal, "init"),
        ["init:audio", "init:menu", "init:heartbeat"]
    );
    assert_eq!(
        entries(&journal, "test"),
        ["test:heartbeat", "test:menu", "test:audio"]
    );
}

#[test]
fn failures_are_aggregated() {
    let journal = Journal::default();
    let mut audio = Recorder::new("audio", false, &journal);
    let mut menu = Recorder::new("menu", true, &journal);
    let mut led = Recorder::new("heartbeat", false, &journal);

    let mut app: App<'_, 8> = App::new();
    app.register(&mut audio).unwrap();
    app.register(&mut menu).unwrap();
    app.register(&mut led).unwrap();

    let report = app.self_test(&[
        Precondition::new("storage mounted", false),
        Precondition::new("codec present", true),
    ]);

    assert!(!report.passed());
    assert_eq!(report.checked, 5);
    assert_eq!(report.failure_count, 3);
    assert_eq!(
        report.failed.as_slice(),
        ["storage mounted", "heartbeat", "audio"]
    );
    // Every task was still asked.
    assert_eq!(entries(&journal, "test").len(), 3);
}

#[test]
fn start_fails_stop_without_polling() {
    let journal = Journal::default();
    let mut audio = Recorder::new("audio", true, &journal);

    let mut app: App<'_, 8> = App::new();
    app.register(&mut audio).unwrap();

    let report = match app.start(&[Precondition::new("storage mounted", false)]) {
        Ok(never) => match never {},
        Err(report) => report,
    };

    assert_eq!(report.failed.as_slice(), ["storage mounted"]);
    assert_eq!(entries(&journal, "init"), ["init:audio"]);
    assert!(entries(&journal, "poll").is_empty());
}

#[test]
fn run_pass_polls_in_registration_order() {
    let journal = Journal::default();
    let mut first = Recorder::new("first", true, &journal);
    let mut second = Recorder::new("second", true, &journal);

    let mut app: App<'_, 2> = App::new();
    app.register(&mut first).unwrap();
    app.register(&mut second).unwrap();
    assert_eq!(app.labels().as_slice(), ["first", "second"]);

    app.run_pass();
    app.run_pass();

    assert_eq!(
        entries(&journal, "poll"),
        ["poll:first", "poll:second", "poll:first", "poll:second"]
    );
}

#[test]
fn empty_app_passes_self_test_on_preconditions_alone() {
    let mut app: App<'_, 1> = App::default();
    assert!(app.is_empty());
    assert!(app.self_test(&[]).passed());
    assert!(!app.self_test(&[Precondition::new("storage mounted", false)]).passed());
}
