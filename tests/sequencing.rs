//! Step timing and trigger behaviour through the public engine API.

use bg_engine::{
    Engine, EngineConfig, StepPosition, StepScheduler, TransportClock, TransportInfo, TriggerEvent, TriggerKind,
};
use bg_ir::{AudioBuffer, Command, Modifier, Pattern, Ratchet, Step, TrackId};

const SR: u32 = 48_000;
/// One step at 120 BPM, 48 kHz, 4 steps per beat.
const STEP: usize = 6_000;

/// Drive a bare scheduler and return triggers with absolute sample positions.
fn triggers(pattern: &Pattern, bpm: f64, total: usize, block: usize, seed: u64) -> Vec<(usize, TriggerEvent)> {
    let mut clock = TransportClock::new(SR as f64, 4);
    let mut sched = StepScheduler::new(StepPosition::new());
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut out = Vec::new();
    let mut pos = 0;
    while pos < total {
        let len = block.min(total - pos);
        let frame = clock.update(TransportInfo::playing(bpm, pos as i64));
        let mut events: Vec<TriggerEvent> = Vec::new();
        sched.run(&frame, len, pattern, &mut rng, &mut events);
        out.extend(events.into_iter().map(|e| (pos + e.offset, e)));
        pos += len;
    }
    out
}

fn times_for(events: &[(usize, TriggerEvent)], track: TrackId) -> Vec<usize> {
    events.iter().filter(|(_, e)| e.track == track).map(|(t, _)| *t).collect()
}

fn only(track: TrackId, steps: &[(usize, Step)]) -> Pattern {
    let mut p = Pattern::empty();
    for &(i, step) in steps {
        p.track_mut(track).steps[i] = step;
    }
    p
}

#[test]
fn four_on_the_floor_lands_on_exact_samples() {
    let events = triggers(&Pattern::default(), 120.0, 16 * STEP, 333, 1);
    assert_eq!(times_for(&events, TrackId::Kick), vec![0, 4 * STEP, 8 * STEP, 12 * STEP]);
    assert_eq!(times_for(&events, TrackId::Clap), vec![4 * STEP, 12 * STEP]);
}

#[test]
fn block_size_does_not_move_triggers() {
    let a = triggers(&Pattern::default(), 97.0, 200_000, 64, 3);
    let b = triggers(&Pattern::default(), 97.0, 200_000, 4096, 3);
    let key = |v: &[(usize, TriggerEvent)]| v.iter().map(|(t, e)| (*t, e.track)).collect::<Vec<_>>();
    assert_eq!(key(&a), key(&b));
}

#[test]
fn ratchet_four_splits_the_step() {
    let p = only(TrackId::Hat, &[(0, Step::on().with_modifier(Modifier::Ratchet(Ratchet::Four)))]);
    let events = triggers(&p, 120.0, STEP, 512, 1);
    assert_eq!(times_for(&events, TrackId::Hat), vec![0, 1500, 3000, 4500]);
    let kinds: Vec<TriggerKind> = events.iter().map(|(_, e)| e.kind).collect();
    assert_eq!(kinds[0], TriggerKind::Step);
    assert_eq!(kinds[3], TriggerKind::Ratchet { subdivision: 3 });
}

#[test]
fn skip_cycle_fires_on_even_loops_only() {
    let p = only(TrackId::Clap, &[(0, Step::on().with_modifier(Modifier::SkipCycle))]);
    let events = triggers(&p, 120.0, 4 * 16 * STEP, 1024, 1);
    assert_eq!(times_for(&events, TrackId::Clap), vec![0, 2 * 16 * STEP]);
}

#[test]
fn only_first_cycle_fires_once() {
    let p = only(TrackId::Kick, &[(3, Step::on().with_modifier(Modifier::OnlyFirstCycle))]);
    let events = triggers(&p, 120.0, 3 * 16 * STEP, 1024, 1);
    assert_eq!(times_for(&events, TrackId::Kick), vec![3 * STEP]);
}

#[test]
fn probability_extremes() {
    let never = only(TrackId::Hat, &[(0, Step::on().with_probability(0.0))]);
    assert!(triggers(&never, 120.0, 8 * 16 * STEP, 512, 9).is_empty());

    let always = only(TrackId::Hat, &[(0, Step::on().with_probability(1.0))]);
    assert_eq!(triggers(&always, 120.0, 8 * 16 * STEP, 512, 9).len(), 8);
}

#[test]
fn engine_reports_current_step_while_playing() {
    let (mut engine, handle) = Engine::new(EngineConfig::default());
    let mut buf = AudioBuffer::new(2, 500);
    for b in 0..(17 * STEP / 500) {
        engine.process_block(TransportInfo::playing(120.0, (b * 500) as i64), &mut buf);
        let last_sample = b * 500 + 499;
        assert_eq!(handle.current_step(), Some((last_sample / STEP) % 16));
    }
    assert_eq!(engine.loop_count(), 1);
}

#[test]
fn stop_resets_and_restart_begins_at_step_zero() {
    let (mut engine, handle) = Engine::new(EngineConfig::default());
    let mut buf = AudioBuffer::new(2, 1000);
    for b in 0..20 {
        engine.process_block(TransportInfo::playing(120.0, b * 1000), &mut buf);
    }
    assert_eq!(handle.current_step(), Some(3));

    engine.process_block(TransportInfo::stopped(), &mut buf);
    assert_eq!(handle.current_step_raw(), -1);

    engine.process_block(TransportInfo::playing(120.0, 0), &mut buf);
    assert_eq!(handle.current_step(), Some(0));
    assert_eq!(engine.loop_count(), 0);
}

#[test]
fn queued_edits_apply_before_the_block_renders() {
    let (mut engine, mut handle) = Engine::new(EngineConfig::default());
    assert!(handle.enqueue(Command::ToggleStep { track: 0, step: 0, active: false }));
    for track in 1..4 {
        for step in 0..16 {
            handle.enqueue(Command::ToggleStep { track, step, active: false });
        }
    }
    let mut buf = AudioBuffer::new(1, STEP);
    engine.process_block(TransportInfo::playing(120.0, 0), &mut buf);
    assert_eq!(buf.peak(), 0.0);
}

#[test]
fn same_seed_same_audio() {
    let render = |seed: u64| {
        let cfg = EngineConfig { seed, ..EngineConfig::default() };
        let (mut engine, mut handle) = Engine::new(cfg);
        for step in 0..16 {
            handle.enqueue(Command::ToggleStep { track: 2, step, active: true });
            handle.enqueue(Command::SetProbability { track: 2, step, probability: 0.5 });
        }
        let mut out = Vec::new();
        let mut buf = AudioBuffer::new(1, 1024);
        for b in 0..200 {
            engine.process_block(TransportInfo::playing(150.0, b * 1024), &mut buf);
            out.extend_from_slice(buf.channel(0));
        }
        out
    };
    assert_eq!(render(11), render(11));
    assert_ne!(render(11), render(12));
}
