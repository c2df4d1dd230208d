//! Fresh identifiers for compiler-generated labels and temporaries.
//!
//! Lowering takes its ident source as a capability, so tests can swap in
//! [`SequentialIdents`] and get stable output.

use std::time::{SystemTime, UNIX_EPOCH};

use gdlang_core::Ident;
use rustc_hash::FxHashSet;
use xxhash_rust::xxh64::xxh64;

const ALPHABET: &[u8; 52] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const FRESH_LEN: usize = 4;

/// Something that hands out idents unique within one compilation.
pub trait IdentSource {
    fn fresh(&mut self) -> Ident;
}

impl<T: IdentSource + ?Sized> IdentSource for &mut T {
    fn fresh(&mut self) -> Ident {
        (**self).fresh()
    }
}

impl<T: IdentSource + ?Sized> IdentSource for Box<T> {
    fn fresh(&mut self) -> Ident {
        (**self).fresh()
    }
}

/// `L0`, `L1`, ... in order.
#[derive(Debug, Clone, Default)]
pub struct SequentialIdents {
    next: u32,
}

impl SequentialIdents {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentSource for SequentialIdents {
    fn fresh(&mut self) -> Ident {
        let ident = Ident::Str(format!("L{}", self.next));
        self.next += 1;
        ident
    }
}

/// Four-letter idents derived from a seeded hash of a counter.
///
/// The same seed always yields the same sequence. Collisions within one
/// generator are skipped.
#[derive(Debug, Clone)]
pub struct HashedIdents {
    seed: u64,
    counter: u64,
    issued: FxHashSet<String>,
}

impl HashedIdents {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            counter: 0,
            issued: FxHashSet::default(),
        }
    }

    /// Seeded from the wall clock in nanoseconds.
    pub fn from_time() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        Self::new(nanos)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn candidate(&mut self) -> String {
        let hash = xxh64(&self.counter.to_le_bytes(), self.seed);
        self.counter += 1;
        (0..FRESH_LEN)
            .map(|i| {
                let byte = (hash >> (i * 16)) as u16;
                ALPHABET[byte as usize % ALPHABET.len()] as char
            })
            .collect()
    }
}

impl IdentSource for HashedIdents {
    fn fresh(&mut self) -> Ident {
        loop {
            let name = self.candidate();
            if self.issued.insert(name.clone()) {
                return Ident::Str(name);
            }
        }
    }
}
