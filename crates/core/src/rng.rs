//! RNG module - seedable randomness and 7-bag piece generation
//!
//! Every random decision that affects gameplay (bag order, garbage holes,
//! powerup rolls, gimmick placement) goes through a [`RandomSource`], so a
//! session replays identically from the same seed.
//!
//! The piece queue implements the "7-bag" algorithm: each bag holds one of
//! each piece in the pool, shuffled, and the queue is topped up with a fresh
//! bag whenever it drops below [`BAG_REFILL_THRESHOLD`] pieces.

use std::collections::VecDeque;

use crate::types::{PieceKind, BAG_REFILL_THRESHOLD};

/// Injected source of gameplay randomness
pub trait RandomSource {
    /// Generate next random u32
    fn next_u32(&mut self) -> u32;

    /// Generate random value in range [0, max)
    fn next_range(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        self.next_u32() % max
    }

    /// Uniform float in [0, 1)
    fn next_f64(&mut self) -> f64 {
        (self.next_u32() >> 8) as f64 / (1u32 << 24) as f64
    }

    /// Bernoulli roll with probability `p`
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Shuffle a slice using Fisher-Yates
    fn shuffle<T>(&mut self, slice: &mut [T])
    where
        Self: Sized,
    {
        for i in (1..slice.len()).rev() {
            let j = self.next_range((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }
}

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Resume from a state captured with [`SimpleRng::state`].
    ///
    /// Returns `None` for 0, which `new` never produces.
    pub fn from_state(state: u32) -> Option<Self> {
        (state != 0).then_some(Self { state })
    }

    /// Current internal state (for snapshots and replays)
    pub fn state(&self) -> u32 {
        self.state
    }
}

impl RandomSource for SimpleRng {
    fn next_u32(&mut self) -> u32 {
        // LCG formula: (a * state + c) mod m
        // Using Numerical Recipes constants: a=1664525, c=1013904223, m=2^32
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        // The full-period LCG can land on 0; keep 0 reserved as "invalid".
        if self.state == 0 {
            self.state = 1;
        }
        self.state
    }
}

impl Default for SimpleRng {
    fn default() -> Self {
        Self::new(1)
    }
}

/// 7-bag piece queue
#[derive(Debug, Clone, PartialEq)]
pub struct PieceQueue {
    /// Kinds making up one bag
    pool: Vec<PieceKind>,
    /// Upcoming pieces, front is next
    queue: VecDeque<PieceKind>,
}

impl PieceQueue {
    /// Create a queue over `pool` and fill it with fresh bags
    pub fn new<R: RandomSource>(pool: Vec<PieceKind>, rng: &mut R) -> Self {
        let mut queue = Self {
            pool,
            queue: VecDeque::with_capacity(BAG_REFILL_THRESHOLD * 2),
        };
        queue.refill(rng);
        queue
    }

    /// Rebuild a queue from snapshot contents without touching any RNG
    pub fn from_parts(pool: Vec<PieceKind>, queued: Vec<PieceKind>) -> Self {
        Self {
            pool,
            queue: queued.into(),
        }
    }

    /// Append shuffled bags until the queue holds at least the refill threshold
    fn refill<R: RandomSource>(&mut self, rng: &mut R) {
        if self.pool.is_empty() {
            return;
        }
        while self.queue.len() < BAG_REFILL_THRESHOLD {
            let mut bag = self.pool.clone();
            rng.shuffle(&mut bag);
            self.queue.extend(bag);
        }
    }

    /// Peek at the next piece without removing it
    pub fn peek(&self) -> Option<PieceKind> {
        self.queue.front().copied()
    }

    /// Peek at up to `count` upcoming pieces
    pub fn peek_queue(&self, count: usize) -> Vec<PieceKind> {
        self.queue.iter().take(count).copied().collect()
    }

    /// Draw the next piece from the queue
    pub fn draw<R: RandomSource>(&mut self, rng: &mut R) -> Option<PieceKind> {
        self.refill(rng);
        let piece = self.queue.pop_front();
        self.refill(rng);
        piece
    }

    /// Put `kind` at the front of the queue (wildcard choice)
    pub fn push_front(&mut self, kind: PieceKind) {
        self.queue.push_front(kind);
    }

    pub fn pool(&self) -> &[PieceKind] {
        &self.pool
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Entire queued sequence, front first
    pub fn queued(&self) -> Vec<PieceKind> {
        self.queue.iter().copied().collect()
    }
}
