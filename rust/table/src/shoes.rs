use std::sync::atomic::{AtomicU64, Ordering};

use baccarat_engine::shoe::Shoe;

/// Supplies a fresh shoe for every round.
pub trait ShoeSource: Send + Sync {
    fn next_shoe(&self) -> Shoe;
}

/// Randomly seeded shoes. The seed is kept on the shoe and recorded with the
/// round.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomShoes;

impl ShoeSource for RandomShoes {
    fn next_shoe(&self) -> Shoe {
        Shoe::shuffled(None)
    }
}

/// Shoes seeded from a counter, one seed per round.
#[derive(Debug)]
pub struct SeededShoes {
    next: AtomicU64,
}

impl SeededShoes {
    pub fn starting_at(seed: u64) -> Self {
        Self {
            next: AtomicU64::new(seed),
        }
    }
}

impl ShoeSource for SeededShoes {
    fn next_shoe(&self) -> Shoe {
        Shoe::shuffled(Some(self.next.fetch_add(1, Ordering::Relaxed)))
    }
}

impl<F> ShoeSource for F
where
    F: Fn() -> Shoe + Send + Sync,
{
    fn next_shoe(&self) -> Shoe {
        self()
    }
}
