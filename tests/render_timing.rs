//! Timing harness: a block must render faster than it plays back, even with
//! the command channel refilled to capacity before every block.

use std::time::{Duration, Instant};

use bg_engine::{Engine, EngineConfig, TransportInfo};
use bg_ir::{AudioBuffer, Command};

const SAMPLE_RATE: u32 = 48_000;
const BLOCK: usize = 512;
const BLOCKS: usize = 2_000;

fn block_duration() -> Duration {
    Duration::from_secs_f64(BLOCK as f64 / SAMPLE_RATE as f64)
}

fn percentile(times: &mut [Duration], pct: f64) -> Duration {
    times.sort_unstable();
    let idx = ((times.len() as f64 - 1.0) * pct).round() as usize;
    times[idx]
}

#[test]
fn p99_block_time_under_realtime_with_saturated_channel() {
    let (mut engine, mut handle) = Engine::new(EngineConfig::default());
    let mut buf = AudioBuffer::new(2, BLOCK);
    let mut times = Vec::with_capacity(BLOCKS);
    let mut n = 0usize;

    for b in 0..BLOCKS {
        while handle.enqueue(Command::SetVelocity {
            track: n % 4,
            step: n % 16,
            velocity: (n % 10) as f32 / 10.0,
        }) {
            n += 1;
        }
        let info = TransportInfo::playing(140.0, (b * BLOCK) as i64);
        let start = Instant::now();
        engine.process_block(info, &mut buf);
        times.push(start.elapsed());
    }

    let p99 = percentile(&mut times, 0.99);
    println!("p99 block time {:?} (budget {:?})", p99, block_duration());
    assert!(p99 < block_duration(), "p99 {:?} exceeds block duration {:?}", p99, block_duration());
}

#[test]
fn drain_is_bounded_by_capacity() {
    let (mut engine, mut handle) = Engine::new(EngineConfig::default());
    let mut accepted = 0;
    while handle.enqueue(Command::ToggleStep { track: 0, step: accepted % 16, active: true }) {
        accepted += 1;
    }
    assert_eq!(accepted, 1024);

    let mut buf = AudioBuffer::new(2, BLOCK);
    engine.process_block(TransportInfo::stopped(), &mut buf);
    assert_eq!(handle.free_slots(), 1024);
}
