// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the four subcommands: `train`, `classify`,
// `evaluate` and `inspect`, and all their flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::train_use_case::TrainConfig;
use crate::ml::rbm::HiddenBiasInit;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train an RBM on a labelled dataset file
    Train(TrainArgs),

    /// Classify one input vector with a trained model
    Classify(ClassifyArgs),

    /// Count misclassifications of a trained model on a dataset file
    Evaluate(EvaluateArgs),

    /// Print dimensions and parameter statistics of a trained model
    Inspect(InspectArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Dataset file: header "classes width height", then one [0, 1, ...] vector per line
    #[arg(long)]
    pub dataset: PathBuf,

    /// Directory for the model snapshot, config and metrics CSV
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    #[arg(long, default_value_t = 400)]
    pub hidden_units: usize,

    #[arg(long, default_value_t = 0.001)]
    pub learning_rate: f64,

    /// Upper bound on full passes through the training set
    #[arg(long, default_value_t = 1000)]
    pub epochs: usize,

    /// Epochs between free-energy checkpoints
    #[arg(long, default_value_t = 50)]
    pub error_check_interval: usize,

    /// Stop once |F_validation − F_train| exceeds this
    #[arg(long, default_value_t = 50.0)]
    pub termination_threshold: f64,

    #[arg(long, default_value_t = 0.6)]
    pub train_fraction: f64,

    #[arg(long, default_value_t = 0.2)]
    pub test_fraction: f64,

    #[arg(long, default_value_t = 0.2)]
    pub validation_fraction: f64,

    /// Start hidden biases at 0 instead of −1
    #[arg(long)]
    pub zero_hidden_bias: bool,

    /// Standard deviation of the initial Gaussian weights
    #[arg(long, default_value_t = 0.01)]
    pub weight_std_dev: f64,

    /// Seed for splitting, initialisation and sampling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Continue from the model saved in --checkpoint-dir
    #[arg(long)]
    pub resume: bool,

    /// Read pause / resume / status commands from stdin while training
    #[arg(long)]
    pub interactive: bool,
}

/// The boundary between Layer 1 and Layer 2:
/// the application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            dataset:               a.dataset,
            checkpoint_dir:        a.checkpoint_dir,
            hidden_units:          a.hidden_units,
            learning_rate:         a.learning_rate,
            epochs:                a.epochs,
            error_check_interval:  a.error_check_interval,
            termination_threshold: a.termination_threshold,
            train_fraction:        a.train_fraction,
            test_fraction:         a.test_fraction,
            validation_fraction:   a.validation_fraction,
            hidden_bias_init:      if a.zero_hidden_bias { HiddenBiasInit::Zero } else { HiddenBiasInit::Negative },
            weight_std_dev:        a.weight_std_dev,
            seed:                  a.seed,
            resume:                a.resume,
            interactive:           a.interactive,
            num_classes:           0,
        }
    }
}

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// File holding one vector: the image alone, or image plus label suffix
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Print the full reconstructed vector as well
    #[arg(long)]
    pub show_reconstruction: bool,

    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Labelled dataset file in the training format
    #[arg(long)]
    pub dataset: PathBuf,

    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_defaults_match_config() {
        let cli = Cli::try_parse_from(["binary-rbm", "train", "--dataset", "d.txt"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg = TrainConfig::from(args);
        let defaults = TrainConfig::default();
        assert_eq!(cfg.dataset, PathBuf::from("d.txt"));
        assert_eq!(cfg.hidden_units, defaults.hidden_units);
        assert_eq!(cfg.learning_rate, defaults.learning_rate);
        assert_eq!(cfg.epochs, defaults.epochs);
        assert_eq!(cfg.error_check_interval, defaults.error_check_interval);
        assert_eq!(cfg.termination_threshold, defaults.termination_threshold);
        assert_eq!(cfg.hidden_bias_init, HiddenBiasInit::Negative);
    }

    #[test]
    fn test_zero_hidden_bias_flag() {
        let cli = Cli::try_parse_from([
            "binary-rbm", "train", "--dataset", "d.txt", "--zero-hidden-bias", "--seed", "3",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg = TrainConfig::from(args);
        assert_eq!(cfg.hidden_bias_init, HiddenBiasInit::Zero);
        assert_eq!(cfg.seed, Some(3));
    }

    #[test]
    fn test_classify_requires_input() {
        assert!(Cli::try_parse_from(["binary-rbm", "classify"]).is_err());
    }
}
