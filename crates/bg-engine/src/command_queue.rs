//! Bounded single-producer/single-consumer command channel.
//!
//! The control side pushes [`Command`]s without blocking; the audio thread
//! drains and applies them at the start of every block. A full channel drops
//! the new command and reports `false` to the producer.

use bg_ir::{Command, Pattern};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

/// Default number of slots.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Producer half, owned by the control thread.
pub struct CommandSender {
    producer: HeapProd<Command>,
}

/// Consumer half, owned by the audio thread.
pub struct CommandReceiver {
    consumer: HeapCons<Command>,
}

/// Outcome of one drain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainStats {
    pub applied: usize,
    pub rejected: usize,
}

impl DrainStats {
    pub fn changed(&self) -> bool {
        self.applied > 0
    }
}

/// Create a channel with room for `capacity` pending commands.
pub fn command_channel(capacity: usize) -> (CommandSender, CommandReceiver) {
    let rb = HeapRb::<Command>::new(capacity.max(1));
    let (producer, consumer) = rb.split();
    (CommandSender { producer }, CommandReceiver { consumer })
}

impl CommandSender {
    /// Queue a command. Returns `false` and drops it if the channel is full.
    pub fn enqueue(&mut self, command: Command) -> bool {
        self.producer.try_push(command).is_ok()
    }

    /// Slots currently free.
    pub fn free_slots(&self) -> usize {
        self.producer.vacant_len()
    }

    pub fn capacity(&self) -> usize {
        self.producer.capacity().get()
    }
}

impl CommandReceiver {
    /// Apply every queued command to `pattern` in FIFO order.
    ///
    /// Work is bounded by the channel capacity. Invalid commands are counted
    /// and discarded.
    pub fn drain_into(&mut self, pattern: &mut Pattern) -> DrainStats {
        let mut stats = DrainStats::default();
        while let Some(command) = self.consumer.try_pop() {
            match pattern.apply(&command) {
                Ok(()) => stats.applied += 1,
                Err(_) => stats.rejected += 1,
            }
        }
        stats
    }

    pub fn pending(&self) -> usize {
        self.consumer.occupied_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bg_ir::TrackId;

    #[test]
    fn commands_apply_in_fifo_order() {
        let (mut tx, mut rx) = command_channel(8);
        assert!(tx.enqueue(Command::SetVelocity { track: 0, step: 0, velocity: 0.2 }));
        assert!(tx.enqueue(Command::SetVelocity { track: 0, step: 0, velocity: 0.7 }));
        let mut p = Pattern::default();
        let stats = rx.drain_into(&mut p);
        assert_eq!(stats, DrainStats { applied: 2, rejected: 0 });
        assert_eq!(p.step(TrackId::Kick, 0).unwrap().velocity(), 0.7);
    }

    #[test]
    fn full_channel_drops_newest() {
        let (mut tx, mut rx) = command_channel(4);
        for step in 0..4 {
            assert!(tx.enqueue(Command::ToggleStep { track: 1, step, active: true }));
        }
        assert_eq!(tx.free_slots(), 0);
        assert!(!tx.enqueue(Command::ToggleStep { track: 1, step: 9, active: true }));

        let mut p = Pattern::empty();
        rx.drain_into(&mut p);
        let active: Vec<bool> = p.tracks[1].steps.iter().map(|s| s.active).collect();
        assert!(active[..4].iter().all(|&a| a));
        assert!(!active[9]);
        assert_eq!(tx.free_slots(), 4);
    }

    #[test]
    fn invalid_commands_are_counted_and_skipped() {
        let (mut tx, mut rx) = command_channel(4);
        tx.enqueue(Command::ToggleStep { track: 7, step: 0, active: true });
        tx.enqueue(Command::ToggleStep { track: 0, step: 1, active: true });
        let mut p = Pattern::empty();
        let stats = rx.drain_into(&mut p);
        assert_eq!(stats, DrainStats { applied: 1, rejected: 1 });
        assert!(p.tracks[0].steps[1].active);
        assert_eq!(rx.pending(), 0);
    }

    #[test]
    fn producer_and_consumer_on_separate_threads() {
        let (mut tx, mut rx) = command_channel(DEFAULT_CAPACITY);
        let writer = std::thread::spawn(move || {
            let mut sent = 0;
            for i in 0..10_000 {
                let cmd = Command::SetVelocity { track: 2, step: i % 16, velocity: 0.5 };
                while !tx.enqueue(cmd) {
                    std::thread::yield_now();
                }
                sent += 1;
            }
            sent
        });
        let mut p = Pattern::empty();
        let mut applied = 0;
        while applied < 10_000 {
            applied += rx.drain_into(&mut p).applied;
            std::thread::yield_now();
        }
        assert_eq!(writer.join().unwrap(), 10_000);
        assert!(p.tracks[2].steps.iter().all(|s| s.velocity() == 0.5));
    }
}
