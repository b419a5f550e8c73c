//! Hash puzzles: find `x` such that `H(puzzle_id || be64(x))` has at least
//! `difficulty` leading zero bits.
//!
//! Difficulty `d` admits a target set of about `2^(256 - d)` hashes, so an
//! unstructured search needs about `2^d` evaluations on average.
use crate::core::{concat, leading_zero_bits, HashPrimitive, Sha256Primitive};
use crate::digest::HashEngine;
use crate::error::{Error, Result};
use crate::search::{run_search, SearchBudget, SearchResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const MAX_DIFFICULTY: u32 = 256;

/// Required number of leading zero bits, `0..=256`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Difficulty(u32);

impl Difficulty {
    pub fn new(bits: u32) -> Result<Self> {
        if bits > MAX_DIFFICULTY {
            return Err(Error::InvalidDifficulty(bits));
        }
        Ok(Self(bits))
    }

    /// Like [`Difficulty::new`], clamping anything above 256.
    pub const fn saturating(bits: u32) -> Self {
        if bits > MAX_DIFFICULTY {
            Self(MAX_DIFFICULTY)
        } else {
            Self(bits)
        }
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    /// Expected number of hash evaluations, `2^d`.
    pub fn expected_attempts(self) -> f64 {
        2f64.powi(self.0 as i32)
    }

    /// `log2` of the target set size, `256 - d`.
    pub fn target_set_log2(self) -> u32 {
        MAX_DIFFICULTY - self.0
    }
}

impl TryFrom<u32> for Difficulty {
    type Error = Error;

    fn try_from(bits: u32) -> Result<Self> {
        Difficulty::new(bits)
    }
}

impl From<Difficulty> for u32 {
    fn from(d: Difficulty) -> Self {
        d.0
    }
}

/// A puzzle id (any high min-entropy bytes) and its difficulty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleInstance {
    pub puzzle_id: Vec<u8>,
    pub difficulty: Difficulty,
}

impl PuzzleInstance {
    pub fn new(puzzle_id: impl Into<Vec<u8>>, difficulty_bits: u32) -> Result<Self> {
        Ok(Self {
            puzzle_id: puzzle_id.into(),
            difficulty: Difficulty::new(difficulty_bits)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PuzzleSolution {
    pub nonce: u64,
    pub hash: [u8; 32],
}

impl PuzzleSolution {
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Hashes evaluated by a sequential search that started at zero.
    pub fn attempts(&self) -> u64 {
        self.nonce.saturating_add(1)
    }
}

/// Mean cost of solving one difficulty over several puzzle ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRow {
    pub difficulty: Difficulty,
    pub trials: usize,
    pub solved: usize,
    pub mean_attempts: f64,
    pub expected_attempts: f64,
    pub mean_elapsed: Duration,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PuzzleSolver<H = Sha256Primitive> {
    engine: HashEngine<H>,
}

impl<H: HashPrimitive> PuzzleSolver<H> {
    pub fn new(engine: HashEngine<H>) -> Self {
        Self { engine }
    }

    /// `H(puzzle_id || be64(nonce))`, always full width.
    pub fn puzzle_hash(&self, puzzle_id: &[u8], nonce: u64) -> [u8; 32] {
        self.engine.full(&concat(&[puzzle_id, &nonce.to_be_bytes()[..]]))
    }

    /// Smallest nonce meeting `difficulty`.
    ///
    /// Nonces `0..u64::MAX` are tried; reaching `u64::MAX` ends the search with
    /// [`Error::SearchExhausted`].
    pub fn solve(&self, puzzle_id: &[u8], difficulty: Difficulty) -> Result<PuzzleSolution> {
        self.solve_within(puzzle_id, difficulty, &SearchBudget::unbounded())
            .into_result()
    }

    /// [`PuzzleSolver::solve`] under an explicit budget.
    pub fn solve_within(
        &self,
        puzzle_id: &[u8],
        difficulty: Difficulty,
        budget: &SearchBudget,
    ) -> SearchResult<PuzzleSolution> {
        debug!(
            bits = difficulty.bits(),
            max_attempts = budget.max_attempts,
            "solving puzzle"
        );
        run_search(budget, |nonce| {
            let hash = self.puzzle_hash(puzzle_id, nonce);
            (leading_zero_bits(&hash) >= difficulty.bits())
                .then_some(PuzzleSolution { nonce, hash })
        })
    }

    pub fn solve_instance(&self, instance: &PuzzleInstance) -> Result<PuzzleSolution> {
        self.solve(&instance.puzzle_id, instance.difficulty)
    }

    /// Recompute the hash for `nonce` and check it against `difficulty`.
    pub fn verify(&self, puzzle_id: &[u8], nonce: u64, difficulty: Difficulty) -> bool {
        leading_zero_bits(&self.puzzle_hash(puzzle_id, nonce)) >= difficulty.bits()
    }

    /// Solve every difficulty for every puzzle id and average the cost.
    pub fn difficulty_sweep(
        &self,
        puzzle_ids: &[Vec<u8>],
        difficulties: &[Difficulty],
        budget: &SearchBudget,
    ) -> Vec<SweepRow> {
        difficulties
            .iter()
            .map(|&difficulty| {
                let mut solved = 0usize;
                let mut attempts = 0u64;
                let mut elapsed = Duration::ZERO;
                for puzzle_id in puzzle_ids {
                    let result = self.solve_within(puzzle_id, difficulty, budget);
                    if result.is_found() {
                        solved += 1;
                        attempts = attempts.saturating_add(result.attempts);
                        elapsed += result.elapsed;
                    }
                }
                let (mean_attempts, mean_elapsed) = if solved == 0 {
                    (0.0, Duration::ZERO)
                } else {
                    (attempts as f64 / solved as f64, elapsed / solved as u32)
                };
                debug!(bits = difficulty.bits(), solved, mean_attempts, "difficulty swept");
                SweepRow {
                    difficulty,
                    trials: puzzle_ids.len(),
                    solved,
                    mean_attempts,
                    expected_attempts: difficulty.expected_attempts(),
                    mean_elapsed,
                }
            })
            .collect()
    }
}
