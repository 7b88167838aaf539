// ============================================================
// Layer 5 — Training Engine
// ============================================================
// Contrastive divergence (CD-1) over a class-partitioned
// training set, with checkpoints and early stopping.
//
//   for epoch in 1..=epochs
//     for x in train.round_robin()       (0,0) (0,1) … (1,0) …
//       control.wait_while_paused()      ← only suspension point
//       CD-1 step on x
//     if (epoch − 1) % interval == 0
//       free energy (train, validation)
//       misclassified (train, validation)
//       notify observers + event channel
//       stop if |F_val − F_train| > threshold
//   misclassified (test)
//
// All model mutation happens on the thread that calls `run`.
// `spawn` moves the model onto a dedicated worker thread and
// hands it back on `join`.
//
// Reference: Hinton (2002) Training Products of Experts by
//            Minimizing Contrastive Divergence

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use crate::data::dataset::TrainingData;
use crate::domain::error::{RbmError, RbmResult};
use crate::domain::label::LabelCodec;
use crate::domain::neuron_layer::UnitState;
use crate::domain::progress::CheckpointMetrics;
use crate::domain::traits::TrainingObserver;
use crate::ml::control::{RunState, TrainingControl};
use crate::ml::inferencer;
use crate::ml::rbm::RbmModel;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Engine-level run parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub learning_rate:         f64,
    pub epochs:                usize,
    /// Checkpoint every this many epochs (the first epoch always is one)
    pub error_check_interval:  usize,
    /// Early-stop when |F_val − F_train| exceeds this
    pub termination_threshold: f64,
    /// Seed for the sampling RNG; fresh entropy when None
    pub seed:                  Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate:         0.001,
            epochs:                1000,
            error_check_interval:  50,
            termination_threshold: 50.0,
            seed:                  None,
        }
    }
}

impl TrainingConfig {
    fn validate(&self) -> RbmResult<()> {
        if !self.learning_rate.is_finite() || self.learning_rate < 0.0 {
            return Err(RbmError::InvalidArgument(format!(
                "learning rate must be a non-negative number, got {}",
                self.learning_rate
            )));
        }
        if self.epochs == 0 {
            return Err(RbmError::InvalidArgument("epochs must be at least 1".into()));
        }
        if self.error_check_interval == 0 {
            return Err(RbmError::InvalidArgument(
                "error check interval must be at least 1".into(),
            ));
        }
        if self.termination_threshold.is_nan() || self.termination_threshold < 0.0 {
            return Err(RbmError::InvalidArgument(format!(
                "termination threshold must be non-negative, got {}",
                self.termination_threshold
            )));
        }
        Ok(())
    }
}

// ─── Run outcome ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StopReason {
    /// Every configured epoch ran
    EpochsExhausted,
    /// Validation free energy drifted too far from the training one
    EarlyStopped { epoch: usize, divergence: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub epochs_run:                 usize,
    /// CD-1 updates applied; equals epochs_run × train size
    pub updates_applied:            u64,
    pub stop_reason:                StopReason,
    pub checkpoints:                Vec<CheckpointMetrics>,
    /// Average squared reconstruction error of the last epoch
    pub final_reconstruction_error: f64,
    /// None when the test set is empty
    pub test_misclassified:         Option<usize>,
}

/// Messages pushed on the engine's event channel.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingEvent {
    Started { epochs: usize, examples_per_epoch: usize },
    Checkpoint(CheckpointMetrics),
    Finished(TrainingReport),
}

// ─── Engine ───────────────────────────────────────────────────────────────────

pub struct TrainingEngine {
    config:    TrainingConfig,
    control:   TrainingControl,
    observers: Vec<Box<dyn TrainingObserver>>,
    events:    Vec<mpsc::Sender<TrainingEvent>>,
    rng:       StdRng,
}

impl TrainingEngine {
    pub fn new(config: TrainingConfig) -> RbmResult<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };
        Ok(Self {
            config,
            control:   TrainingControl::new(),
            observers: Vec::new(),
            events:    Vec::new(),
            rng,
        })
    }

    /// Drive the run from an existing control handle instead of a
    /// fresh one.
    pub fn with_control(mut self, control: TrainingControl) -> Self {
        self.control = control;
        self
    }

    /// Handle for pausing and resuming the run from another thread.
    pub fn control(&self) -> TrainingControl {
        self.control.clone()
    }

    /// Register a synchronous checkpoint observer.
    pub fn subscribe(&mut self, observer: impl TrainingObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Open a new event channel. Events are dropped silently for
    /// receivers that have gone away.
    pub fn events(&mut self) -> mpsc::Receiver<TrainingEvent> {
        let (tx, rx) = mpsc::channel();
        self.events.push(tx);
        rx
    }

    /// Train `model` on `data` on the calling thread.
    pub fn run(mut self, model: &mut RbmModel, data: &TrainingData) -> RbmResult<TrainingReport> {
        self.control.begin()?;
        let result = self.train(model, data);
        match &result {
            Ok(report) => {
                self.control.finish(RunState::Completed);
                self.emit(TrainingEvent::Finished(report.clone()));
            }
            Err(e) => {
                tracing::error!("Training aborted: {}", e);
                self.control.finish(RunState::Aborted);
            }
        }
        model.clear_record();
        result
    }

    /// Move the model and data onto a dedicated worker thread.
    pub fn spawn(self, model: RbmModel, data: TrainingData) -> RbmResult<TrainingHandle> {
        let control = self.control.clone();
        let worker = thread::Builder::new()
            .name("rbm-trainer".into())
            .spawn(move || {
                let mut model = model;
                let report = self.run(&mut model, &data);
                (model, report)
            })?;
        Ok(TrainingHandle { control, worker })
    }

    // ── Run body ──────────────────────────────────────────────────────────────

    fn train(&mut self, model: &mut RbmModel, data: &TrainingData) -> RbmResult<TrainingReport> {
        check_dimensions(model, data)?;

        let codec    = LabelCodec::new(data.num_classes);
        let per_epoch = data.train.len();
        tracing::info!(
            "Training {} → {} RBM on {} examples ({} classes) for up to {} epochs",
            model.visible_size(),
            model.hidden_size(),
            per_epoch,
            data.num_classes,
            self.config.epochs,
        );
        if data.validation.is_empty() {
            tracing::warn!("Validation set is empty; early stopping is disabled");
        }
        self.emit(TrainingEvent::Started { epochs: self.config.epochs, examples_per_epoch: per_epoch });

        let mut checkpoints          = Vec::new();
        let mut updates_applied      = 0u64;
        let mut reconstruction_error = f64::NAN;
        let mut epochs_run           = 0;
        let mut stop_reason          = StopReason::EpochsExhausted;

        for epoch_index in 0..self.config.epochs {
            let epoch = epoch_index + 1;

            // ── Step 1: one CD-1 update per example ───────────────────────────
            let mut squared_error = 0.0;
            for example in data.train.round_robin() {
                self.control.wait_while_paused();
                contrastive_divergence_step(model, example, self.config.learning_rate, &mut self.rng)?;
                squared_error += model.reconstruction_error(example);
                updates_applied += 1;
                self.control.example_done();
            }
            reconstruction_error = squared_error / per_epoch as f64;
            epochs_run = epoch;
            tracing::debug!("Epoch {}: reconstruction error {:.4}", epoch, reconstruction_error);

            // ── Step 2: checkpoint ────────────────────────────────────────────
            if epoch_index % self.config.error_check_interval != 0 {
                continue;
            }
            let metrics = self.checkpoint(model, data, &codec, epoch, reconstruction_error)?;
            self.publish(&metrics);
            let divergence = metrics.divergence();
            checkpoints.push(metrics);

            // ── Step 3: early stopping ────────────────────────────────────────
            // NaN (empty validation set) never compares greater
            if divergence > self.config.termination_threshold {
                tracing::info!(
                    "Early stop at epoch {}: divergence {:.4} > {}",
                    epoch,
                    divergence,
                    self.config.termination_threshold,
                );
                stop_reason = StopReason::EarlyStopped { epoch, divergence };
                break;
            }
        }

        let test_misclassified = if data.test.is_empty() {
            None
        } else {
            let wrong = inferencer::count_misclassified(model, &codec, &data.test, &mut self.rng)?;
            tracing::info!("Test set: {}/{} misclassified", wrong, data.test.len());
            Some(wrong)
        };

        Ok(TrainingReport {
            epochs_run,
            updates_applied,
            stop_reason,
            checkpoints,
            final_reconstruction_error: reconstruction_error,
            test_misclassified,
        })
    }

    fn checkpoint(
        &mut self,
        model: &mut RbmModel,
        data:  &TrainingData,
        codec: &LabelCodec,
        epoch: usize,
        reconstruction_error: f64,
    ) -> RbmResult<CheckpointMetrics> {
        let rng = &mut self.rng;
        Ok(CheckpointMetrics {
            epoch,
            train_free_energy:        inferencer::average_free_energy(model, &data.train, rng)?,
            validation_free_energy:   inferencer::average_free_energy(model, &data.validation, rng)?,
            train_misclassified:      inferencer::count_misclassified(model, codec, &data.train, rng)?,
            validation_misclassified: inferencer::count_misclassified(model, codec, &data.validation, rng)?,
            reconstruction_error,
        })
    }

    fn publish(&mut self, metrics: &CheckpointMetrics) {
        for observer in &mut self.observers {
            observer.on_checkpoint(metrics);
        }
        self.emit(TrainingEvent::Checkpoint(metrics.clone()));
    }

    fn emit(&mut self, event: TrainingEvent) {
        self.events.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// One CD-1 update of `model` towards `example`.
pub fn contrastive_divergence_step<R: Rng + ?Sized>(
    model:         &mut RbmModel,
    example:       &[UnitState],
    learning_rate: f64,
    rng:           &mut R,
) -> RbmResult<()> {
    model.record_original_input(example)?;
    model.set_visible(example)?;
    let h0 = model.sample_hidden_given_visible(rng);
    model.record_initial_hidden_probabilities(h0)?;
    let vn = model.settle_visible_given_hidden();
    model.record_final_visible_probabilities(vn)?;
    let hn = model.sample_hidden_given_visible(rng);
    model.record_final_hidden_probabilities(hn)?;
    model.apply_weight_update(learning_rate)?;
    model.apply_bias_update(learning_rate)
}

/// Every example of every subset must match the visible layer, and
/// the label suffix must fit inside it.
fn check_dimensions(model: &RbmModel, data: &TrainingData) -> RbmResult<()> {
    if data.train.is_empty() {
        return Err(RbmError::InvalidArgument("training set is empty".into()));
    }
    if data.num_classes > model.visible_size() {
        return Err(RbmError::InvalidArgument(format!(
            "{} label bits do not fit a visible layer of {}",
            data.num_classes,
            model.visible_size()
        )));
    }
    data.all_examples()
        .try_for_each(|example| model.check_visible_len(example.len()))
}

// ─── Worker handle ────────────────────────────────────────────────────────────

/// A run executing on its own thread.
pub struct TrainingHandle {
    control: TrainingControl,
    worker:  JoinHandle<(RbmModel, RbmResult<TrainingReport>)>,
}

impl TrainingHandle {
    pub fn control(&self) -> TrainingControl {
        self.control.clone()
    }

    /// Wait for the run and take the model back. The model is
    /// returned even when the run aborted.
    pub fn join(self) -> RbmResult<(RbmModel, RbmResult<TrainingReport>)> {
        self.worker.join().map_err(|_| RbmError::WorkerPanicked)
    }
}
