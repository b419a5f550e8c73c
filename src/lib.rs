//! Measure how collision resistance, commitment hiding and puzzle
//! friendliness of a 256-bit hash degrade when its digest is truncated to
//! 8 or 16 bits.
//!
//! The core ([`digest`], [`commitment`], [`puzzle`], [`search`]) is pure and
//! parameterised by a [`HashPrimitive`] and an [`EntropySource`]. Everything
//! observable goes through a [`ReportSink`].
pub mod commitment;
pub mod core;
pub mod digest;
pub mod error;
pub mod experiment;
pub mod puzzle;
pub mod report;
pub mod search;

pub use crate::commitment::{Commitment, CommitmentScheme, SALT_LEN};
pub use crate::core::{
    concat, leading_zero_bits, Blake3Primitive, EntropySource, HashPrimitive, OsEntropy,
    Sha256Primitive,
};
pub use crate::digest::{Digest, HashEngine, HashVariant};
pub use crate::error::{Error, Result};
pub use crate::experiment::{
    report_digests, run_all, run_collision_experiment, run_commitment_experiment,
    run_puzzle_experiment, ExperimentConfig, ExperimentConfigBuilder,
};
pub use crate::puzzle::{
    Difficulty, PuzzleInstance, PuzzleSolution, PuzzleSolver, SweepRow, MAX_DIFFICULTY,
};
pub use crate::report::{JsonLinesSink, MemorySink, Report, ReportSink, TracingSink};
pub use crate::search::{
    expected_collision_attempts, expected_inversion_attempts, find_collision,
    find_collision_with_prefix, hash_throughput, invert_commitment, run_search, Collision,
    Outcome, SearchBudget, SearchBudgetBuilder, SearchResult,
};
