// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Offline Payments Lab ("PayLab") - Deterministic PRNG and hashing

//! Seeded generator that drives every stochastic decision in a run.
//!
//! The generator is Mulberry32: a 32-bit state advanced by a Weyl constant,
//! then mixed with two multiplies and an xorshift avalanche. Browsers and the
//! native bench produce bit-identical sequences for the same seed, which is
//! what makes a scenario's samples reproducible.

use rand_core::{impls, Error, RngCore, SeedableRng};

const WEYL_INCREMENT: u32 = 0x6D2B_79F5;
const TWO_POW_32: f64 = 4_294_967_296.0;

const FNV_OFFSET_BASIS: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;

// ---------------------------------------------------------------------------
// Mulberry32
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Next value in `[0, 1)`.
    pub fn draw(&mut self) -> f64 {
        f64::from(self.next_u32()) / TWO_POW_32
    }

    /// Infinite lazy stream of draws. Cloning the generator first restarts
    /// the stream from the same point.
    pub fn draws(self) -> Draws {
        Draws { rng: self }
    }
}

impl RngCore for Mulberry32 {
    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(WEYL_INCREMENT);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Mulberry32 {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }

    /// Truncates to the low 32 bits instead of expanding the seed, so
    /// `seed_from_u64(42)` and `new(42)` are the same stream.
    fn seed_from_u64(state: u64) -> Self {
        Self::new(state as u32)
    }
}

/// Iterator over an owned generator's draws.
#[derive(Debug, Clone)]
pub struct Draws {
    rng: Mulberry32,
}

impl Iterator for Draws {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        Some(self.rng.draw())
    }
}

// ---------------------------------------------------------------------------
// FNV-1a
// ---------------------------------------------------------------------------

/// 32-bit FNV-1a over the bytes of `input`.
pub fn fnv1a_32(input: &str) -> u32 {
    input.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    })
}
