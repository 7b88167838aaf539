// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with clap.
// All business logic is delegated to Layer 2 (application).
//
//   1. `train`    — trains an RBM on a dataset file
//   2. `classify` — reconstructs one input and names its class
//   3. `evaluate` — misclassification count on a dataset file
//   4. `inspect`  — parameter statistics of a saved model
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;
pub mod console;

use anyhow::Result;
use clap::Parser;
use commands::{ClassifyArgs, Commands, EvaluateArgs, InspectArgs, TrainArgs};

use crate::domain::neuron_layer::UnitState;
use crate::ml::control::TrainingControl;

#[derive(Parser, Debug)]
#[command(
    name = "binary-rbm",
    version = "0.1.0",
    about = "Train a binary restricted Boltzmann machine with CD-1, then classify with it."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route to the matching use case. Only this layer prints.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Classify(args) => run_classify(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Inspect(args)  => run_inspect(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on '{}'", args.dataset.display());
    let interactive = args.interactive;
    let control = TrainingControl::new();
    if interactive {
        console::spawn_listener(control.clone())?;
    }

    let report = TrainUseCase::new(args.into()).with_control(control).execute()?;

    println!("Training complete after {} epochs ({:?}).", report.epochs_run, report.stop_reason);
    if let Some(last) = report.checkpoints.last() {
        println!(
            "Last checkpoint: F_train {:.4}, F_val {:.4}, misclassified {} train / {} validation",
            last.train_free_energy,
            last.validation_free_energy,
            last.train_misclassified,
            last.validation_misclassified,
        );
    }
    if let Some(wrong) = report.test_misclassified {
        println!("Test set: {wrong} misclassified.");
    }
    Ok(())
}

fn run_classify(args: ClassifyArgs) -> Result<()> {
    use crate::application::classify_use_case::ClassifyUseCase;

    let mut use_case = ClassifyUseCase::new(&args.checkpoint_dir, args.seed)?;
    let c = use_case.classify_file(&args.input)?;
    if c.is_decided() {
        println!("Class: {}", c.names);
    } else {
        println!("Unable to classify");
    }
    if args.show_reconstruction {
        println!("Reconstruction: {}", format_vector(&c.reconstruction));
    }
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let e = EvaluateUseCase::new(&args.checkpoint_dir, args.seed).execute(&args.dataset)?;
    println!(
        "{} examples, {} misclassified (accuracy {:.2}%), average free energy {:.4}",
        e.examples,
        e.misclassified,
        e.accuracy() * 100.0,
        e.average_free_energy
    );
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    use crate::application::evaluate_use_case::ModelSummary;

    let s = ModelSummary::load(&args.checkpoint_dir)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&s)?);
        return Ok(());
    }
    println!("Visible units: {}", s.visible_units);
    println!("Hidden units:  {}", s.hidden_units);
    for (name, range) in [
        ("Weights", s.weights),
        ("Visible biases", s.visible_biases),
        ("Hidden biases", s.hidden_biases),
    ] {
        if let Some(r) = range {
            println!("{name:<15} min {:>9.4}  mean {:>9.4}  max {:>9.4}", r.min, r.mean, r.max);
        }
    }
    println!("Weight std dev: {:.6}", s.weight_std_dev);
    Ok(())
}

/// `[0, 1, 1]`, the same form the dataset files use.
fn format_vector(v: &[UnitState]) -> String {
    let items: Vec<String> = v.iter().map(u8::to_string).collect();
    format!("[{}]", items.join(", "))
}
