//! Sequential brute-force search and the two attacks built on it.
//!
//! Every search tries counters `0, 1, 2, ...` in order, stops at the first
//! success or when its [`SearchBudget`] runs out, and reports the number of
//! attempts and the wall-clock time spent.
use crate::commitment::{Commitment, CommitmentScheme};
use crate::core::{concat, EntropySource, HashPrimitive};
use crate::digest::{Digest, HashEngine, HashVariant};
use crate::error::{Error, Result};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::time::{Duration, Instant};
use tracing::debug;

/// Number of distinct 32-bit counter messages.
pub const COUNTER_SPACE: u64 = 1 << 32;

/// How often the wall clock is consulted when a time limit is set.
const CLOCK_CHECK_INTERVAL: u64 = 256;

/// Cap on a bounded search: an attempt count and an optional time limit.
#[derive(Builder, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[builder(pattern = "owned")]
pub struct SearchBudget {
    pub max_attempts: u64,
    #[builder(default)]
    #[serde(default)]
    pub time_limit_ms: Option<u64>,
}

impl SearchBudget {
    pub const fn attempts(max_attempts: u64) -> Self {
        Self {
            max_attempts,
            time_limit_ms: None,
        }
    }

    pub const fn unbounded() -> Self {
        Self::attempts(u64::MAX)
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }

    /// Reject budgets that cannot run: zero attempts, or a zero time limit
    /// that would end every search at its first clock check.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::InvalidConfig("max_attempts must be >= 1".into()));
        }
        if self.time_limit_ms == Some(0) {
            return Err(Error::InvalidConfig("time_limit_ms must be > 0".into()));
        }
        Ok(())
    }

    /// The same budget with `max_attempts` clamped to `limit`.
    pub fn capped(self, limit: u64) -> Self {
        Self {
            max_attempts: self.max_attempts.min(limit),
            ..self
        }
    }
}

impl SearchBudgetBuilder {
    pub fn build_validated(self) -> Result<SearchBudget> {
        let budget = self
            .build()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        budget.validate()?;
        Ok(budget)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome<T> {
    Found(T),
    NotFound,
}

/// Attempts, elapsed time and outcome of one search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult<T> {
    pub attempts: u64,
    pub elapsed: Duration,
    pub outcome: Outcome<T>,
}

impl<T> SearchResult<T> {
    pub fn found(&self) -> Option<&T> {
        match &self.outcome {
            Outcome::Found(value) => Some(value),
            Outcome::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self.outcome, Outcome::Found(_))
    }

    /// Turn a `NotFound` outcome into [`Error::SearchExhausted`].
    pub fn into_result(self) -> Result<T> {
        match self.outcome {
            Outcome::Found(value) => Ok(value),
            Outcome::NotFound => Err(Error::SearchExhausted {
                attempts: self.attempts,
            }),
        }
    }

    /// Observed attempts per second, if any time elapsed.
    pub fn rate_per_sec(&self) -> Option<f64> {
        let secs = self.elapsed.as_secs_f64();
        (secs > 0.0).then(|| self.attempts as f64 / secs)
    }

    /// Seconds needed for `expected_attempts` at the observed rate.
    pub fn projected_secs(&self, expected_attempts: f64) -> Option<f64> {
        self.rate_per_sec().map(|rate| expected_attempts / rate)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SearchResult<U> {
        SearchResult {
            attempts: self.attempts,
            elapsed: self.elapsed,
            outcome: match self.outcome {
                Outcome::Found(value) => Outcome::Found(f(value)),
                Outcome::NotFound => Outcome::NotFound,
            },
        }
    }
}

/// Try `test(0)`, `test(1)`, ... until it yields a value or the budget runs out.
pub fn run_search<T>(
    budget: &SearchBudget,
    mut test: impl FnMut(u64) -> Option<T>,
) -> SearchResult<T> {
    let start = Instant::now();
    let time_limit = budget.time_limit();
    let mut attempts = 0u64;

    while attempts < budget.max_attempts {
        let counter = attempts;
        attempts += 1;
        if let Some(value) = test(counter) {
            return SearchResult {
                attempts,
                elapsed: start.elapsed(),
                outcome: Outcome::Found(value),
            };
        }
        if let Some(limit) = time_limit {
            if attempts % CLOCK_CHECK_INTERVAL == 0 && start.elapsed() >= limit {
                debug!(attempts, ?limit, "search hit its time limit");
                break;
            }
        }
    }

    debug!(attempts, "search exhausted");
    SearchResult {
        attempts,
        elapsed: start.elapsed(),
        outcome: Outcome::NotFound,
    }
}

/// Two distinct counters whose digests are equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collision {
    pub first: u32,
    pub second: u32,
    pub digest: Digest,
}

/// First counter seen per digest value.
enum PresenceTable {
    /// One slot per possible output of a truncated variant.
    Dense(Vec<Option<u32>>),
    /// Full-width digests, one entry per attempt. Each entry costs roughly
    /// 40 bytes plus map overhead, so a budget near the 2^32 counter cap
    /// needs hundreds of GiB; size full-width budgets to available memory.
    Sparse(HashMap<[u8; 32], u32>),
}

impl PresenceTable {
    fn for_variant(variant: HashVariant) -> Self {
        match variant.output_space() {
            Some(size) => PresenceTable::Dense(vec![None; size]),
            None => PresenceTable::Sparse(HashMap::new()),
        }
    }

    /// Record `counter` under `digest`, returning the earlier counter on a repeat.
    fn insert(&mut self, digest: &Digest, counter: u32) -> Option<u32> {
        match self {
            PresenceTable::Dense(slots) => {
                let index = digest
                    .as_bytes()
                    .iter()
                    .fold(0usize, |acc, byte| (acc << 8) | usize::from(*byte));
                // in range: the table has one slot per value of this width
                let slot = &mut slots[index];
                match *slot {
                    Some(earlier) => Some(earlier),
                    None => {
                        *slot = Some(counter);
                        None
                    }
                }
            }
            PresenceTable::Sparse(seen) => {
                let bytes = digest.as_bytes();
                let mut key = [0u8; 32];
                key[..bytes.len()].copy_from_slice(bytes);
                match seen.entry(key) {
                    Entry::Occupied(earlier) => Some(*earlier.get()),
                    Entry::Vacant(slot) => {
                        slot.insert(counter);
                        None
                    }
                }
            }
        }
    }
}

/// Birthday search for two 32-bit big-endian counters with equal digests.
pub fn find_collision<H: HashPrimitive>(
    engine: &HashEngine<H>,
    variant: HashVariant,
    budget: &SearchBudget,
) -> SearchResult<Collision> {
    find_collision_with_prefix(engine, variant, &[], budget)
}

/// As [`find_collision`], hashing `prefix || be32(counter)` so repeated trials
/// can sample independent message sets.
pub fn find_collision_with_prefix<H: HashPrimitive>(
    engine: &HashEngine<H>,
    variant: HashVariant,
    prefix: &[u8],
    budget: &SearchBudget,
) -> SearchResult<Collision> {
    debug!(%variant, max_attempts = budget.max_attempts, "collision search");
    let mut table = PresenceTable::for_variant(variant);
    run_search(&budget.capped(COUNTER_SPACE), |counter| {
        // exact: the budget is capped to the 32-bit counter space
        let counter = counter as u32;
        let digest = engine.digest(&concat(&[prefix, &counter.to_be_bytes()[..]]), variant);
        table.insert(&digest, counter).map(|first| Collision {
            first,
            second: counter,
            digest,
        })
    })
}

/// Search for any 4-byte message that opens `commitment` without knowing the
/// committed one.
pub fn invert_commitment<H: HashPrimitive, E: EntropySource>(
    scheme: &CommitmentScheme<H, E>,
    commitment: &Commitment,
    variant: HashVariant,
    budget: &SearchBudget,
) -> SearchResult<Vec<u8>> {
    debug!(%variant, max_attempts = budget.max_attempts, "hiding inversion");
    run_search(&budget.capped(COUNTER_SPACE), |counter| {
        let guess = (counter as u32).to_be_bytes();
        scheme
            .verify(commitment, &guess, variant)
            .then(|| guess.to_vec())
    })
}

/// Hash `budget.max_attempts` counter messages with no success condition, to
/// time how far a full-width attack gets within a cap.
pub fn hash_throughput<H: HashPrimitive>(
    engine: &HashEngine<H>,
    variant: HashVariant,
    budget: &SearchBudget,
) -> SearchResult<()> {
    run_search(&budget.capped(COUNTER_SPACE), |counter| {
        let _ = engine.digest(&(counter as u32).to_be_bytes(), variant);
        None
    })
}

/// Expected hashes before the first collision in an `bits`-bit space.
pub fn expected_collision_attempts(bits: u32) -> f64 {
    (PI * 2f64.powi(bits as i32 + 1) / 2.0).sqrt()
}

/// Expected hashes to hit one fixed `bits`-bit digest.
pub fn expected_inversion_attempts(bits: u32) -> f64 {
    2f64.powi(bits as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{OsEntropy, Sha256Primitive};

    const CAP: u64 = 100_000;

    fn engine() -> HashEngine<Sha256Primitive> {
        HashEngine::default()
    }

    #[test]
    fn run_search_tries_counters_in_order() {
        let mut tried = Vec::new();
        let result = run_search(&SearchBudget::attempts(100), |counter| {
            tried.push(counter);
            (counter == 5).then_some(counter * 10)
        });
        assert_eq!(tried, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(result.attempts, 6);
        assert_eq!(result.found(), Some(&50));
    }

    #[test]
    fn run_search_stops_at_budget() {
        let result = run_search(&SearchBudget::attempts(42), |_| None::<()>);
        assert_eq!(result.attempts, 42);
        assert!(!result.is_found());
        assert!(matches!(
            result.into_result(),
            Err(Error::SearchExhausted { attempts: 42 })
        ));
    }

    #[test]
    fn run_search_honours_time_limit() {
        let budget = SearchBudgetBuilder::default()
            .max_attempts(u64::MAX)
            .time_limit_ms(Some(1))
            .build_validated()
            .unwrap();
        let result = run_search(&budget, |_| {
            std::thread::sleep(Duration::from_micros(10));
            None::<()>
        });
        assert!(!result.is_found());
        assert!(result.attempts < u64::MAX);
        assert_eq!(result.attempts % CLOCK_CHECK_INTERVAL, 0);
    }

    #[test]
    fn budget_builder_rejects_zero() {
        let err = SearchBudgetBuilder::default()
            .max_attempts(0)
            .build_validated()
            .expect_err("zero attempts should be rejected");
        assert!(matches!(err, Error::InvalidConfig(_)));
        let err = SearchBudgetBuilder::default()
            .build_validated()
            .expect_err("missing attempts should be rejected");
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn budget_validate_rejects_zero_time_limit() {
        let budget = SearchBudget {
            max_attempts: 100_000,
            time_limit_ms: Some(0),
        };
        assert!(matches!(budget.validate(), Err(Error::InvalidConfig(_))));
        assert!(SearchBudget::attempts(0).validate().is_err());
        assert!(SearchBudget::attempts(1).validate().is_ok());
        assert!(SearchBudgetBuilder::default()
            .max_attempts(100_000)
            .time_limit_ms(Some(0))
            .build_validated()
            .is_err());
    }

    #[test]
    fn dense_table_accepts_highest_digest_value() {
        for (variant, hex) in [
            (HashVariant::Truncated8, "ff"),
            (HashVariant::Truncated16, "ffff"),
        ] {
            let top = Digest::try_from(hex.to_string()).unwrap();
            let mut table = PresenceTable::for_variant(variant);
            assert!(matches!(table, PresenceTable::Dense(_)));
            assert_eq!(table.insert(&top, 3), None);
            assert_eq!(table.insert(&top, 9), Some(3));
        }
    }

    #[test]
    fn sparse_table_keys_full_digests() {
        let mut table = PresenceTable::for_variant(HashVariant::Full256);
        assert!(matches!(table, PresenceTable::Sparse(_)));
        let a = engine().digest(b"a", HashVariant::Full256);
        let b = engine().digest(b"b", HashVariant::Full256);
        assert_eq!(table.insert(&a, 0), None);
        assert_eq!(table.insert(&b, 1), None);
        assert_eq!(table.insert(&a, 2), Some(0));
        assert_eq!(table.insert(&b, 3), Some(1));
    }

    #[test]
    fn eight_bit_collision_within_pigeonhole_bound() {
        let result =
            find_collision(&engine(), HashVariant::Truncated8, &SearchBudget::attempts(CAP));
        assert!(result.attempts <= 257);
        let collision = result.found().expect("8-bit collision");
        assert!(collision.first < collision.second);
        assert_eq!(u64::from(collision.second) + 1, result.attempts);
        let a = engine().digest(&collision.first.to_be_bytes(), HashVariant::Truncated8);
        let b = engine().digest(&collision.second.to_be_bytes(), HashVariant::Truncated8);
        assert_eq!(a, b);
        assert_eq!(a, collision.digest);
    }

    #[test]
    fn sixteen_bit_collision_within_cap() {
        let result =
            find_collision(&engine(), HashVariant::Truncated16, &SearchBudget::attempts(CAP));
        assert!(result.attempts <= 65_537);
        let collision = result.found().expect("16-bit collision");
        assert_ne!(collision.first, collision.second);
        assert!(engine().verify(
            &collision.second.to_be_bytes(),
            &engine().digest(&collision.first.to_be_bytes(), HashVariant::Truncated16),
            HashVariant::Truncated16,
        ));
    }

    #[test]
    fn full_width_collision_does_not_complete_within_cap() {
        let result =
            find_collision(&engine(), HashVariant::Full256, &SearchBudget::attempts(CAP));
        assert!(!result.is_found());
        assert_eq!(result.attempts, CAP);
    }

    #[test]
    fn collision_search_is_reproducible() {
        let budget = SearchBudget::attempts(CAP);
        let a = find_collision(&engine(), HashVariant::Truncated16, &budget);
        let b = find_collision(&engine(), HashVariant::Truncated16, &budget);
        assert_eq!(a.attempts, b.attempts);
        assert_eq!(a.outcome, b.outcome);
    }

    #[test]
    fn mean_eight_bit_collision_tracks_birthday_bound() {
        let budget = SearchBudget::attempts(CAP);
        let trials = 64u32;
        let total: u64 = (0..trials)
            .map(|trial| {
                find_collision_with_prefix(
                    &engine(),
                    HashVariant::Truncated8,
                    &trial.to_be_bytes(),
                    &budget,
                )
                .attempts
            })
            .sum();
        let mean = total as f64 / f64::from(trials);
        assert!((12.0..36.0).contains(&mean), "mean attempts {mean}");
    }

    #[test]
    fn truncated_commitments_are_invertible() {
        let scheme = CommitmentScheme::<Sha256Primitive, OsEntropy>::default();
        for (variant, cap) in [
            (HashVariant::Truncated8, CAP),
            (HashVariant::Truncated16, 2_000_000),
        ] {
            let commitment = scheme.commit(b"secret", variant).unwrap();
            let budget = SearchBudget::attempts(cap);
            let result = invert_commitment(&scheme, &commitment, variant, &budget);
            let guess = result.found().expect("truncated commitment should invert");
            assert_eq!(guess.len(), 4);
            assert_ne!(guess.as_slice(), b"secret");
            assert!(scheme.verify(&commitment, guess, variant));
        }
    }

    #[test]
    fn full_width_commitment_resists_inversion() {
        let scheme = CommitmentScheme::<Sha256Primitive, OsEntropy>::default();
        let commitment = scheme.commit(b"secret", HashVariant::Full256).unwrap();
        let result = invert_commitment(
            &scheme,
            &commitment,
            HashVariant::Full256,
            &SearchBudget::attempts(10_000),
        );
        assert!(!result.is_found());
        assert_eq!(result.attempts, 10_000);
    }

    #[test]
    fn throughput_runs_whole_budget() {
        let result =
            hash_throughput(&engine(), HashVariant::Full256, &SearchBudget::attempts(1_000));
        assert_eq!(result.attempts, 1_000);
        assert!(!result.is_found());
    }

    #[test]
    fn expected_attempt_formulas() {
        assert!((expected_collision_attempts(8) - (PI * 256.0).sqrt()).abs() < 1e-9);
        assert!((expected_collision_attempts(16) - (PI * 65_536.0).sqrt()).abs() < 1e-9);
        assert_eq!(expected_inversion_attempts(8), 256.0);
        assert_eq!(expected_inversion_attempts(16), 65_536.0);
        assert!(expected_inversion_attempts(256) > 1e76);
    }

    #[test]
    fn projected_secs_scales_with_rate() {
        let result = SearchResult::<()> {
            attempts: 1_000,
            elapsed: Duration::from_secs(2),
            outcome: Outcome::NotFound,
        };
        assert_eq!(result.rate_per_sec(), Some(500.0));
        assert_eq!(result.projected_secs(5_000.0), Some(10.0));
    }
}
