//! The three experiments, run end to end against a [`ReportSink`].
//!
//! Each one first shows the primitive working (digest and verify, commit and
//! open, solve and check) and then attacks it at every configured width.
use crate::commitment::CommitmentScheme;
use crate::core::{EntropySource, HashPrimitive};
use crate::digest::{HashEngine, HashVariant};
use crate::error::{Error, Result};
use crate::puzzle::{Difficulty, PuzzleSolver};
use crate::report::{Report, ReportSink};
use crate::search::{
    expected_collision_attempts, expected_inversion_attempts, find_collision, invert_commitment,
    SearchBudget,
};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Inputs and caps for every experiment.
#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[builder(pattern = "owned", default)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Widths to attack.
    pub variants: Vec<HashVariant>,
    /// Message digested and verified in the digest demo.
    pub message: String,
    /// Message committed and opened in the commitment demo.
    pub commit_message: String,
    /// Secret the hiding attack tries to open without knowing it.
    pub secret: String,
    pub puzzle_id: String,
    pub puzzle_difficulty: Difficulty,
    pub sweep_difficulties: Vec<Difficulty>,
    /// Puzzle ids per swept difficulty.
    pub sweep_trials: usize,
    /// Cap for collision and inversion searches on truncated widths.
    pub truncated_budget: SearchBudget,
    /// Cap for the full-width searches, which are not expected to finish.
    pub full_width_budget: SearchBudget,
    pub puzzle_budget: SearchBudget,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            variants: HashVariant::ALL.to_vec(),
            message: "string part 1".into(),
            commit_message: "hello".into(),
            secret: "secret".into(),
            puzzle_id: "test".into(),
            puzzle_difficulty: Difficulty::saturating(16),
            sweep_difficulties: [12, 16, 20, 24].map(Difficulty::saturating).to_vec(),
            sweep_trials: 1,
            truncated_budget: SearchBudget::attempts(10_000_000),
            full_width_budget: SearchBudget::attempts(1_000_000),
            puzzle_budget: SearchBudget::unbounded(),
        }
    }
}

impl ExperimentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.variants.is_empty() {
            return Err(Error::InvalidConfig("variants must not be empty".into()));
        }
        if self.sweep_trials == 0 {
            return Err(Error::InvalidConfig("sweep_trials must be >= 1".into()));
        }
        for budget in [
            &self.truncated_budget,
            &self.full_width_budget,
            &self.puzzle_budget,
        ] {
            budget.validate()?;
        }
        Ok(())
    }

    /// Load from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: ExperimentConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    fn budget_for(&self, variant: HashVariant) -> &SearchBudget {
        match variant {
            HashVariant::Full256 => &self.full_width_budget,
            HashVariant::Truncated8 | HashVariant::Truncated16 => &self.truncated_budget,
        }
    }

    /// Puzzle ids for the sweep: the configured id, then suffixed variants.
    pub fn sweep_ids(&self) -> Vec<Vec<u8>> {
        (0..self.sweep_trials)
            .map(|trial| {
                let mut id = self.puzzle_id.as_bytes().to_vec();
                if trial > 0 {
                    id.extend_from_slice(&(trial as u64).to_be_bytes());
                }
                id
            })
            .collect()
    }
}

impl ExperimentConfigBuilder {
    pub fn build_validated(self) -> Result<ExperimentConfig> {
        let config = self
            .build()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Digest `message` at every width and check each digest against itself.
pub fn report_digests<H: HashPrimitive>(
    engine: &HashEngine<H>,
    message: &str,
    variants: &[HashVariant],
    sink: &mut dyn ReportSink,
) -> Result<()> {
    for &variant in variants {
        let digest = engine.digest(message.as_bytes(), variant);
        sink.record(Report::digest(message, variant, &digest))?;
        sink.record(Report::verification(
            message,
            Some(variant),
            engine.verify(message.as_bytes(), &digest, variant),
        ))?;
    }
    Ok(())
}

/// Digest demo and birthday attack.
pub fn run_collision_experiment<H: HashPrimitive>(
    engine: &HashEngine<H>,
    config: &ExperimentConfig,
    sink: &mut dyn ReportSink,
) -> Result<()> {
    report_digests(engine, &config.message, &config.variants, sink)?;

    for &variant in &config.variants {
        info!(%variant, "birthday attack");
        let result = find_collision(engine, variant, config.budget_for(variant));
        sink.record(Report::search(
            "collision",
            Some(variant),
            &result,
            Some(expected_collision_attempts(variant.bits())),
            |c| format!("{} and {} both hash to {}", c.first, c.second, c.digest),
        ))?;
    }
    Ok(())
}

/// Commitment demo and hiding attack.
pub fn run_commitment_experiment<H: HashPrimitive, E: EntropySource>(
    scheme: &CommitmentScheme<H, E>,
    config: &ExperimentConfig,
    sink: &mut dyn ReportSink,
) -> Result<()> {
    let message = config.commit_message.as_bytes();
    for &variant in &config.variants {
        let commitment = scheme.commit(message, variant)?;
        sink.record(Report::digest(&config.commit_message, variant, &commitment.c))?;
        sink.record(Report::verification(
            &config.commit_message,
            Some(variant),
            scheme.verify(&commitment, message, variant),
        ))?;
    }

    let secret = config.secret.as_bytes();
    for &variant in &config.variants {
        info!(%variant, "hiding attack");
        let commitment = scheme.commit(secret, variant)?;
        let result = invert_commitment(scheme, &commitment, variant, config.budget_for(variant));
        sink.record(Report::search(
            "hiding",
            Some(variant),
            &result,
            Some(expected_inversion_attempts(variant.bits())),
            |guess| format!("guess {} opens the commitment", hex::encode(guess)),
        ))?;
    }
    Ok(())
}

/// Puzzle demo and difficulty sweep.
pub fn run_puzzle_experiment<H: HashPrimitive>(
    solver: &PuzzleSolver<H>,
    config: &ExperimentConfig,
    sink: &mut dyn ReportSink,
) -> Result<()> {
    let puzzle_id = config.puzzle_id.as_bytes();
    let difficulty = config.puzzle_difficulty;
    let result = solver.solve_within(puzzle_id, difficulty, &config.puzzle_budget);
    sink.record(Report::search(
        "puzzle",
        None,
        &result,
        Some(difficulty.expected_attempts()),
        |s| format!("nonce {} hash {}", s.nonce, s.hash_hex()),
    ))?;
    let solution = result.into_result()?;
    sink.record(Report::verification(
        "puzzle",
        None,
        solver.verify(puzzle_id, solution.nonce, difficulty),
    ))?;

    info!(difficulties = config.sweep_difficulties.len(), "difficulty sweep");
    let rows = solver.difficulty_sweep(
        &config.sweep_ids(),
        &config.sweep_difficulties,
        &config.puzzle_budget,
    );
    for row in &rows {
        sink.record(Report::sweep("puzzle_friendliness", row))?;
    }
    Ok(())
}

pub fn run_all<H: HashPrimitive + Copy, E: EntropySource>(
    scheme: &CommitmentScheme<H, E>,
    config: &ExperimentConfig,
    sink: &mut dyn ReportSink,
) -> Result<()> {
    run_collision_experiment(scheme.engine(), config, sink)?;
    run_commitment_experiment(scheme, config, sink)?;
    run_puzzle_experiment(&PuzzleSolver::new(*scheme.engine()), config, sink)
}
