use bg_engine::{Engine, EngineConfig, TransportInfo};
use bg_ir::{AudioBuffer, Command};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const BLOCK: usize = 512;

fn idle_channel(c: &mut Criterion) {
    let (mut engine, _handle) = Engine::new(EngineConfig::default());
    let mut buf = AudioBuffer::new(2, BLOCK);
    let mut pos = 0i64;
    c.bench_function("process_block idle channel", |b| {
        b.iter(|| {
            engine.process_block(TransportInfo::playing(128.0, pos), &mut buf);
            pos += BLOCK as i64;
            black_box(buf.peak());
        })
    });
}

fn saturated_channel(c: &mut Criterion) {
    let (mut engine, mut handle) = Engine::new(EngineConfig::default());
    let mut buf = AudioBuffer::new(2, BLOCK);
    let mut pos = 0i64;
    let mut n = 0usize;
    c.bench_function("process_block saturated channel", |b| {
        b.iter(|| {
            loop {
                let cmd = Command::SetVelocity { track: n % 4, step: n % 16, velocity: (n % 100) as f32 / 100.0 };
                n += 1;
                if !handle.enqueue(cmd) {
                    break;
                }
            }
            engine.process_block(TransportInfo::playing(128.0, pos), &mut buf);
            pos += BLOCK as i64;
            black_box(buf.peak());
        })
    });
}

criterion_group!(benches, idle_channel, saturated_channel);
criterion_main!(benches);
