use clap::{Args, Parser, Subcommand, ValueEnum};
use hashprops::{
    report_digests, run_all, run_collision_experiment, run_commitment_experiment,
    run_puzzle_experiment, Blake3Primitive, CommitmentScheme, Difficulty, ExperimentConfig,
    HashEngine, HashPrimitive, HashVariant, JsonLinesSink, OsEntropy, PuzzleSolver, ReportSink,
    Result, Sha256Primitive, TracingSink,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON experiment config; flags below override its fields
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write reports as JSON lines on stdout instead of log events
    #[arg(long, global = true)]
    json: bool,

    /// Underlying 256-bit hash
    #[arg(long, value_enum, default_value_t = Primitive::Sha256, global = true)]
    primitive: Primitive,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Primitive {
    Sha256,
    Blake3,
}

impl Primitive {
    fn hash_primitive(self) -> &'static dyn HashPrimitive {
        match self {
            Primitive::Sha256 => &Sha256Primitive,
            Primitive::Blake3 => &Blake3Primitive,
        }
    }
}

#[derive(Args, Debug)]
struct Overrides {
    /// Widths to use: full256, trunc8, trunc16 (or 1, 2, 3)
    #[arg(long = "variant", value_delimiter = ',', global = true)]
    variants: Vec<HashVariant>,

    /// Attempt cap for searches over truncated digests
    #[arg(long, global = true)]
    max_attempts: Option<u64>,

    /// Attempt cap for searches over full digests
    #[arg(long, global = true)]
    full_width_attempts: Option<u64>,

    /// Wall-clock cap for every search, in milliseconds
    #[arg(long, global = true)]
    time_limit_ms: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Digest a message at every width and verify it
    Digest {
        #[arg(long)]
        message: Option<String>,
    },

    /// Birthday attack on each width
    Collide {
        #[arg(long)]
        message: Option<String>,
    },

    /// Commit, open, then brute-force the hiding property
    Hide {
        /// Message committed and opened
        #[arg(long)]
        message: Option<String>,

        /// Message the attack tries to recover
        #[arg(long)]
        secret: Option<String>,
    },

    /// Solve one puzzle and sweep difficulties
    Puzzle {
        #[arg(long)]
        puzzle_id: Option<String>,

        /// Leading zero bits required of the single puzzle
        #[arg(long)]
        difficulty: Option<u32>,

        /// Difficulties to sweep, comma separated
        #[arg(long, value_delimiter = ',')]
        sweep: Vec<u32>,

        /// Puzzle ids per swept difficulty
        #[arg(long)]
        trials: Option<usize>,
    },

    /// Run all three experiments
    All,
}

impl Cli {
    fn experiment_config(&self) -> Result<ExperimentConfig> {
        let mut config = match &self.config {
            Some(path) => ExperimentConfig::from_json_file(path)?,
            None => ExperimentConfig::default(),
        };
        self.overrides.apply(&mut config);

        match &self.command {
            Command::Digest { message } | Command::Collide { message } => {
                if let Some(message) = message {
                    config.message = message.clone();
                }
            }
            Command::Hide { message, secret } => {
                if let Some(message) = message {
                    config.commit_message = message.clone();
                }
                if let Some(secret) = secret {
                    config.secret = secret.clone();
                }
            }
            Command::Puzzle {
                puzzle_id,
                difficulty,
                sweep,
                trials,
            } => {
                if let Some(puzzle_id) = puzzle_id {
                    config.puzzle_id = puzzle_id.clone();
                }
                if let Some(bits) = difficulty {
                    config.puzzle_difficulty = Difficulty::new(*bits)?;
                }
                if !sweep.is_empty() {
                    config.sweep_difficulties = sweep
                        .iter()
                        .map(|&bits| Difficulty::new(bits))
                        .collect::<Result<_>>()?;
                }
                if let Some(trials) = trials {
                    config.sweep_trials = *trials;
                }
            }
            Command::All => {}
        }

        config.validate()?;
        Ok(config)
    }
}

impl Overrides {
    fn apply(&self, config: &mut ExperimentConfig) {
        if !self.variants.is_empty() {
            config.variants = self.variants.clone();
        }
        if let Some(n) = self.max_attempts {
            config.truncated_budget.max_attempts = n;
        }
        if let Some(n) = self.full_width_attempts {
            config.full_width_budget.max_attempts = n;
        }
        if let Some(ms) = self.time_limit_ms {
            for budget in [
                &mut config.truncated_budget,
                &mut config.full_width_budget,
                &mut config.puzzle_budget,
            ] {
                budget.time_limit_ms = Some(ms);
            }
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "hashprops=info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = cli.experiment_config()?;
    let engine = HashEngine::new(cli.primitive.hash_primitive());
    let scheme = CommitmentScheme::new(engine, OsEntropy);
    let mut sink: Box<dyn ReportSink> = if cli.json {
        Box::new(JsonLinesSink::new(std::io::stdout().lock()))
    } else {
        Box::new(TracingSink)
    };
    info!(primitive = ?cli.primitive, variants = ?config.variants, "starting");

    match cli.command {
        Command::Digest { .. } => {
            report_digests(&engine, &config.message, &config.variants, sink.as_mut())
        }
        Command::Collide { .. } => run_collision_experiment(&engine, &config, sink.as_mut()),
        Command::Hide { .. } => run_commitment_experiment(&scheme, &config, sink.as_mut()),
        Command::Puzzle { .. } => {
            run_puzzle_experiment(&PuzzleSolver::new(engine), &config, sink.as_mut())
        }
        Command::All => run_all(&scheme, &config, sink.as_mut()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashprops::{Error, SearchBudget};

    fn config_for(args: &[&str]) -> Result<ExperimentConfig> {
        let cli = Cli::try_parse_from(std::iter::once("hashprops").chain(args.iter().copied()))
            .unwrap();
        cli.experiment_config()
    }

    #[test]
    fn variant_flag_replaces_configured_widths() {
        let config = config_for(&["collide", "--variant", "2,trunc16"]).unwrap();
        assert_eq!(
            config.variants,
            vec![HashVariant::Truncated8, HashVariant::Truncated16]
        );
        let config = config_for(&["collide"]).unwrap();
        assert_eq!(config.variants, HashVariant::ALL.to_vec());
    }

    #[test]
    fn attempt_flags_target_their_budget() {
        let config =
            config_for(&["--max-attempts", "500", "--full-width-attempts", "7", "all"]).unwrap();
        assert_eq!(config.truncated_budget.max_attempts, 500);
        assert_eq!(config.full_width_budget.max_attempts, 7);
        assert_eq!(config.puzzle_budget, SearchBudget::unbounded());
    }

    #[test]
    fn time_limit_applies_to_every_budget() {
        let config = config_for(&["hide", "--time-limit-ms", "50"]).unwrap();
        for budget in [
            config.truncated_budget,
            config.full_width_budget,
            config.puzzle_budget,
        ] {
            assert_eq!(budget.time_limit_ms, Some(50));
        }
        assert!(matches!(
            config_for(&["collide", "--time-limit-ms", "0"]),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn subcommand_flags_override_messages_and_puzzle() {
        let config = config_for(&["hide", "--message", "m", "--secret", "s"]).unwrap();
        assert_eq!(config.commit_message, "m");
        assert_eq!(config.secret, "s");

        let config = config_for(&[
            "puzzle",
            "--puzzle-id",
            "abc",
            "--difficulty",
            "10",
            "--sweep",
            "4,8",
            "--trials",
            "3",
        ])
        .unwrap();
        assert_eq!(config.puzzle_id, "abc");
        assert_eq!(config.puzzle_difficulty.bits(), 10);
        assert_eq!(
            config.sweep_difficulties,
            vec![Difficulty::saturating(4), Difficulty::saturating(8)]
        );
        assert_eq!(config.sweep_trials, 3);
    }

    #[test]
    fn out_of_range_difficulty_is_reported() {
        assert!(matches!(
            config_for(&["puzzle", "--sweep", "300"]),
            Err(Error::InvalidDifficulty(300))
        ));
        assert!(matches!(
            config_for(&["puzzle", "--difficulty", "257"]),
            Err(Error::InvalidDifficulty(257))
        ));
        assert!(matches!(
            config_for(&["puzzle", "--trials", "0"]),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn flags_override_config_file() {
        let path = std::env::temp_dir()
            .join(format!("hashprops-cli-config-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"message": "from file", "variants": ["full256"],
                "truncated_budget": {"max_attempts": 9000}}"#,
        )
        .unwrap();
        let path_arg = path.to_string_lossy().into_owned();
        let loaded = config_for(&["--config", &path_arg, "digest", "--variant", "trunc8"]);
        std::fs::remove_file(&path).unwrap();

        let config = loaded.unwrap();
        assert_eq!(config.message, "from file");
        assert_eq!(config.variants, vec![HashVariant::Truncated8]);
        assert_eq!(config.truncated_budget.max_attempts, 9000);
    }
}
