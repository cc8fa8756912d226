//! Single-slot handoff of the latest measurement.
//!
//! One [`Publisher`] (the measurement task) and one [`Reader`] (the render
//! task) share a [`MeasurementSlot`]. The slot holds two copies of the record;
//! the publisher always fills the copy readers are not pointed at and then
//! bumps a sequence counter to flip them over. A reader copies the current
//! record and retries if the counter moved underneath it, so it never returns
//! a mix of two writes. No locks and no allocation.

use core::sync::atomic::{fence, AtomicU32, AtomicU8, Ordering};

use fugit::MicrosDurationU32;

use crate::status::Status;
use crate::Instant;

const MEASURED: u8 = 1 << 0;
const ATTEMPTED: u8 = 1 << 1;

/// Complete contents of the slot at one point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    /// Last published distance. Meaningless while `measured_at` is `None`.
    pub distance_cm: f32,
    pub measured_at: Option<Instant>,
    /// Last cycle, valid or not.
    pub attempted_at: Option<Instant>,
    pub status: Status,
}

impl Snapshot {
    /// Contents before anything was published.
    pub const EMPTY: Snapshot = Snapshot {
        distance_cm: 0.0,
        measured_at: None,
        attempted_at: None,
        status: Status::Ok,
    };

    pub fn is_valid(&self) -> bool {
        self.measured_at.is_some()
    }
}

/// What the display gets to see.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// `None` until the first valid measurement.
    pub distance_cm: Option<f32>,
    /// Time since `distance_cm` was measured.
    pub age: Option<MicrosDurationU32>,
    pub status: Status,
}

struct Cell {
    distance: AtomicU32,
    measured_at: AtomicU32,
    attempted_at: AtomicU32,
    flags: AtomicU8,
    status: AtomicU8,
}

impl Cell {
    const fn new() -> Self {
        Self {
            distance: AtomicU32::new(0),
            measured_at: AtomicU32::new(0),
            attempted_at: AtomicU32::new(0),
            flags: AtomicU8::new(0),
            status: AtomicU8::new(0),
        }
    }

    fn load(&self) -> Snapshot {
        let flags = self.flags.load(Ordering::Relaxed);
        let stamp = |cell: &AtomicU32, flag: u8| {
            (flags & flag != 0).then(|| Instant::from_ticks(cell.load(Ordering::Relaxed)))
        };
        Snapshot {
            distance_cm: f32::from_bits(self.distance.load(Ordering::Relaxed)),
            measured_at: stamp(&self.measured_at, MEASURED),
            attempted_at: stamp(&self.attempted_at, ATTEMPTED),
            status: Status::from_bits(self.status.load(Ordering::Relaxed)),
        }
    }

    fn store(&self, snapshot: &Snapshot) {
        let mut flags = 0;
        if let Some(at) = snapshot.measured_at {
            self.measured_at.store(at.ticks(), Ordering::Relaxed);
            flags |= MEASURED;
        }
        if let Some(at) = snapshot.attempted_at {
            self.attempted_at.store(at.ticks(), Ordering::Relaxed);
            flags |= ATTEMPTED;
        }
        self.distance.store(snapshot.distance_cm.to_bits(), Ordering::Relaxed);
        self.status.store(snapshot.status.to_bits(), Ordering::Relaxed);
        self.flags.store(flags, Ordering::Relaxed);
    }
}

pub struct MeasurementSlot {
    cells: [Cell; 2],
    /// Number of completed writes; its low bit selects the current cell.
    seq: AtomicU32,
}

impl MeasurementSlot {
    pub const fn new() -> Self {
        Self {
            cells: [Cell::new(), Cell::new()],
            seq: AtomicU32::new(0),
        }
    }

    /// Hand out the producer and consumer ends.
    pub fn split(&mut self) -> (Publisher<'_>, Reader<'_>) {
        let slot = &*self;
        (Publisher { slot }, Reader { slot })
    }

    fn current(&self, seq: u32) -> &Cell {
        &self.cells[(seq & 1) as usize]
    }
}

impl Default for MeasurementSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer end, owned by the measurement task.
pub struct Publisher<'a> {
    slot: &'a MeasurementSlot,
}

impl Publisher<'_> {
    /// Replace the latest valid measurement.
    pub fn publish(&mut self, distance_cm: f32, at: Instant) {
        self.write(|s| {
            s.distance_cm = distance_cm;
            s.measured_at = Some(at);
            s.attempted_at = Some(at);
            s.status = Status::Ok;
        });
    }

    /// Note a failed cycle. The last valid distance stays in place.
    pub fn record_failure(&mut self, status: Status, at: Instant) {
        self.write(|s| {
            s.attempted_at = Some(at);
            s.status = status;
        });
    }

    fn write(&mut self, update: impl FnOnce(&mut Snapshot)) {
        // Only this handle ever stores to `seq`
        let seq = self.slot.seq.load(Ordering::Relaxed);
        let mut next = self.slot.current(seq).load();
        update(&mut next);

        // Keeps the previous flip ordered before the stores below, so a
        // reader that sees any of them also sees the counter move
        fence(Ordering::Release);
        let next_seq = seq.wrapping_add(1);
        self.slot.current(next_seq).store(&next);
        self.slot.seq.store(next_seq, Ordering::Release);
    }
}

/// Consumer end, owned by the render task.
pub struct Reader<'a> {
    slot: &'a MeasurementSlot,
}

impl Reader<'_> {
    pub fn read(&self) -> Snapshot {
        loop {
            let seq = self.slot.seq.load(Ordering::Acquire);
            let snapshot = self.slot.current(seq).load();
            fence(Ordering::Acquire);
            if self.slot.seq.load(Ordering::Relaxed) == seq {
                return snapshot;
            }
        }
    }

    pub fn read_latest_measurement(&self, now: Instant) -> Reading {
        let snapshot = self.read();
        let age = |at| {
            now.checked_duration_since(at)
                .unwrap_or(MicrosDurationU32::from_ticks(0))
        };
        Reading {
            distance_cm: snapshot.is_valid().then(|| snapshot.distance_cm),
            age: snapshot.measured_at.map(age),
            status: snapshot.status,
        }
    }
}
