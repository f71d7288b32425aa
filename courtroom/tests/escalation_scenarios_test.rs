//! Scenario tests for the court room simulation
//!
//! Drives the full scheduler → active set → escalation → callback flow on a
//! virtual clock, one pump per simulated second.

use std::sync::{Arc, Mutex};

use courtroom::{
    ActiveMessage, Clock, CourtEvent, CourtObserver, EscalationConfig, EscalationEngine,
    IntervalRange, ManualClock, MessageKind, MessagePool, MessageTemplate, OccurrenceId,
    SchedulePolicy, Severity, Simulation, SimulationConfig,
};

/// Records every callback the simulation makes
#[derive(Default)]
struct Recorder {
    fines: Mutex<Vec<String>>,
    acknowledgements: Mutex<u32>,
    events: Mutex<Vec<CourtEvent>>,
    last_snapshot: Mutex<Vec<ActiveMessage>>,
}

impl CourtObserver for Recorder {
    fn on_escalated(&self, law_label: &str) {
        self.fines.lock().unwrap().push(law_label.to_string());
    }

    fn on_acknowledged(&self) {
        *self.acknowledgements.lock().unwrap() += 1;
    }

    fn on_snapshot(&self, messages: &[ActiveMessage]) {
        *self.last_snapshot.lock().unwrap() = messages.to_vec();
    }

    fn on_event(&self, event: &CourtEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

impl Recorder {
    fn fines(&self) -> Vec<String> {
        self.fines.lock().unwrap().clone()
    }
}

fn img_alt_only() -> MessagePool {
    MessagePool::new(vec![MessageTemplate::legal(
        "imgAlt",
        "Fix alt in img1",
        120_000,
        "Disability Act",
    )])
    .unwrap()
}

/// Advance one second at a time up to `until`, pumping at each step.
fn run_until(clock: &ManualClock, sim: &mut Simulation<ManualClock>, until: u64) {
    while clock.now_ms() < until {
        clock.advance(1_000);
        sim.pump();
    }
}

/// Test: the reference end-to-end scenario from first firing to fine
#[test]
fn test_end_to_end_img_alt_fine() {
    let clock = ManualClock::new(0);
    let mut sim = Simulation::new(
        clock.clone(),
        img_alt_only(),
        SimulationConfig {
            interval: IntervalRange::new(20_000, 20_000),
            seed: Some(1),
            ..Default::default()
        },
    );
    let recorder = Arc::new(Recorder::default());
    sim.add_observer(recorder.clone());
    sim.start();

    run_until(&clock, &mut sim, 19_000);
    assert!(sim.active().is_empty());

    run_until(&clock, &mut sim, 20_000);
    let m1 = sim.snapshot()[0].clone();
    assert_eq!(m1.id(), "imgAlt");
    assert_eq!(m1.first_seen_at, 20_000);

    run_until(&clock, &mut sim, 139_000);
    assert_eq!(sim.active().get(m1.occurrence).unwrap().severity, Severity::Normal);

    run_until(&clock, &mut sim, 140_000);
    let urgent = sim.active().get(m1.occurrence).unwrap();
    assert_eq!(urgent.severity, Severity::Urgent);
    assert_eq!(urgent.urgent_since, Some(140_000));
    assert!(urgent.text.starts_with("URGENT: "));
    assert!(recorder.fines().is_empty());

    run_until(&clock, &mut sim, 259_000);
    assert_eq!(sim.active().get(m1.occurrence).unwrap().severity, Severity::Urgent);

    run_until(&clock, &mut sim, 260_000);
    assert_eq!(sim.active().get(m1.occurrence).unwrap().severity, Severity::Escalated);
    assert_eq!(recorder.fines(), vec!["Disability Act".to_string()]);

    // Further ticks never fire the fine again
    sim.stop();
    for _ in 0..300 {
        clock.advance(1_000);
        sim.tick_now();
    }
    let m1_fines = recorder
        .events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| matches!(e, CourtEvent::FineIncurred { occurrence, .. } if *occurrence == m1.occurrence))
        .count();
    assert_eq!(m1_fines, 1);
}

/// Test: severity only ever moves forward and each fine fires once
#[test]
fn test_severity_is_monotonic_under_reference_catalog() {
    let clock = ManualClock::new(0);
    let mut sim = Simulation::new(
        clock.clone(),
        MessagePool::reference(),
        SimulationConfig {
            seed: Some(2024),
            escalation: EscalationConfig {
                second_escalation_delay_ms: 10_000,
                ..Default::default()
            },
            ..Default::default()
        },
    );
    let recorder = Arc::new(Recorder::default());
    sim.add_observer(recorder.clone());
    sim.start();

    let mut seen: std::collections::HashMap<OccurrenceId, Severity> = Default::default();
    for _ in 0..900 {
        clock.advance(1_000);
        sim.pump();
        for msg in sim.active().messages() {
            let prev = seen.insert(msg.occurrence, msg.severity).unwrap_or(Severity::Normal);
            assert!(msg.severity >= prev, "severity went backwards for {}", msg.occurrence);
            if msg.kind() == MessageKind::Distraction {
                assert_eq!(msg.severity, Severity::Normal);
            }
        }
    }

    let escalated = sim.active().count_severity(Severity::Escalated);
    assert!(escalated > 0, "900s with 20-30s firings should produce fines");
    assert_eq!(recorder.fines().len(), escalated);
}

/// Test: only legal messages ever appear in transitions
#[test]
fn test_transitions_are_legal_only() {
    let clock = ManualClock::new(0);
    let mut sim = Simulation::new(
        clock.clone(),
        MessagePool::reference(),
        SimulationConfig {
            seed: Some(5),
            interval: IntervalRange::new(1_000, 3_000),
            ..Default::default()
        },
    );
    sim.start();

    for _ in 0..600 {
        clock.advance(1_000);
        let report = sim.pump();
        for t in &report.transitions {
            let template = sim.pool().get(&t.template_id).unwrap();
            assert_eq!(template.kind, MessageKind::Legal);
        }
    }
}

/// Test: a dismissed message never comes back in later ticks
#[test]
fn test_dismissed_message_is_never_resurrected() {
    let clock = ManualClock::new(0);
    let mut sim = Simulation::new(clock.clone(), img_alt_only(), SimulationConfig::default());
    let recorder = Arc::new(Recorder::default());
    sim.add_observer(recorder.clone());

    let first = sim.enqueue("imgAlt").unwrap();
    let second = sim.enqueue("imgAlt").unwrap();
    assert_eq!(
        sim.active().get(first).unwrap().first_seen_at,
        sim.active().get(second).unwrap().first_seen_at
    );

    sim.dismiss(first).unwrap();
    for _ in 0..300 {
        clock.advance(1_000);
        for t in sim.tick_now() {
            assert_ne!(t.occurrence, first);
        }
        assert!(sim.active().get(first).is_none());
    }

    let snapshot = recorder.last_snapshot.lock().unwrap().clone();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].occurrence, second);
    assert_eq!(snapshot[0].severity, Severity::Escalated);
}

/// Test: shorter delays escalate first, independently of the others
#[test]
fn test_independent_escalation_order() {
    let pool = MessagePool::new(vec![
        MessageTemplate::legal("slow", "Fix slow", 60_000, "Laws of Tort"),
        MessageTemplate::legal("fast", "Fix fast", 10_000, "Disability Act"),
    ])
    .unwrap();
    let clock = ManualClock::new(0);
    let mut sim = Simulation::new(clock.clone(), pool, SimulationConfig::default());
    let recorder = Arc::new(Recorder::default());
    sim.add_observer(recorder.clone());

    sim.enqueue("slow").unwrap();
    sim.enqueue("fast").unwrap();

    for _ in 0..200 {
        clock.advance(1_000);
        sim.tick_now();
    }

    assert_eq!(
        recorder.fines(),
        vec!["Disability Act".to_string(), "Laws of Tort".to_string()]
    );

    let fine_times: Vec<u64> = recorder
        .events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|e| match e {
            CourtEvent::FineIncurred { at_ms, .. } => Some(*at_ms),
            _ => None,
        })
        .collect();
    assert_eq!(fine_times, vec![130_000, 180_000]);
}

/// Test: same-tick fines are reported in insertion order
#[test]
fn test_same_tick_fines_follow_insertion_order() {
    let pool = MessagePool::new(vec![
        MessageTemplate::legal("a", "Fix a", 1_000, "Law A"),
        MessageTemplate::legal("b", "Fix b", 1_000, "Law B"),
    ])
    .unwrap();
    let clock = ManualClock::new(0);
    let mut sim = Simulation::new(clock.clone(), pool, SimulationConfig::default());
    let recorder = Arc::new(Recorder::default());
    sim.add_observer(recorder.clone());

    sim.enqueue("b").unwrap();
    sim.enqueue("a").unwrap();
    clock.set(1_000);
    sim.tick_now();
    clock.set(121_000);
    sim.tick_now();

    assert_eq!(recorder.fines(), vec!["Law B".to_string(), "Law A".to_string()]);
}

/// Test: stop then start begins a fresh randomized schedule
#[test]
fn test_restart_uses_fresh_schedule() {
    let clock = ManualClock::new(0);
    let mut sim = Simulation::new(
        clock.clone(),
        MessagePool::reference(),
        SimulationConfig {
            seed: Some(3),
            ..Default::default()
        },
    );

    sim.start();
    let first_generation = sim.scheduler().generation();
    sim.stop();
    sim.stop();
    assert!(!sim.is_running());
    assert_eq!(sim.next_deadline(), None);

    clock.set(1_000_000);
    assert!(sim.pump().enqueued.is_empty());

    sim.start();
    assert!(sim.scheduler().generation() > first_generation);
    let fire_at = sim.scheduler().next_fire_at().unwrap();
    assert!((1_020_000..=1_030_000).contains(&fire_at));
}

/// Test: the legal-only policy never enqueues distractions
#[test]
fn test_only_kind_policy_end_to_end() {
    let clock = ManualClock::new(0);
    let mut sim = Simulation::new(
        clock.clone(),
        MessagePool::reference(),
        SimulationConfig {
            seed: Some(8),
            interval: IntervalRange::new(0, 500),
            policy: SchedulePolicy::OnlyKind(MessageKind::Legal),
            ..Default::default()
        },
    );
    sim.start();
    for _ in 0..50 {
        clock.advance(1_000);
        sim.pump();
    }
    assert!(!sim.active().is_empty());
    assert!(sim.active().messages().iter().all(|m| m.is_legal()));
}

/// Test: the pure engine flips exactly on the urgent and fine boundaries
#[test]
fn test_engine_boundaries() {
    let engine = EscalationEngine::new();
    let msg = ActiveMessage::new(
        OccurrenceId::new(1),
        MessageTemplate::legal("x", "Fix x", 10_000, "Law X"),
        0,
    );

    assert_eq!(engine.tick(9_999, &[msg.clone()]).messages[0].severity, Severity::Normal);
    let urgent = engine.tick(10_000, &[msg]).messages;
    assert_eq!(urgent[0].severity, Severity::Urgent);
    assert_eq!(engine.tick(129_999, &urgent).messages[0].severity, Severity::Urgent);
    assert_eq!(engine.tick(130_000, &urgent).messages[0].severity, Severity::Escalated);
}
