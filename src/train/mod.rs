//! Training orchestration
//!
//! Owns the training loop: batch assembly from a sample source, the
//! early-stopping policy, cooperative cancellation, and progress reporting.
//! Work runs on one dedicated background thread per run; consumers observe
//! it through a channel of typed events and may marshal those onto whatever
//! execution context they need.

use crossbeam_channel::{unbounded, Receiver, Sender};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{error, info};

use crate::charset::Charset;
use crate::classifier::{Ffnn, TrainableClassifier};
use crate::config::TrainingParameters;
use crate::model::Model;
use crate::synth::{Sample, SampleSource};
use crate::vision::FEATURE_LEN;

/// Progress and completion notifications for one training run. Every run
/// ends with exactly one `Finished` (cancellation and stagnation included);
/// partial training still yields a usable model.
#[derive(Debug, Clone)]
pub enum TrainingEvent {
    /// Current test error, once per epoch (plus a final repeat on normal
    /// completion).
    Progress(f32),
    /// Terminal event carrying the trained model.
    Finished(Model),
}

/// Drives training runs against a sample source. One run may be active at
/// a time; re-entrant `start` calls are no-ops.
pub struct TrainingWorker {
    source: Arc<dyn SampleSource>,
    charset: Charset,
    params: TrainingParameters,
    running: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    events: Sender<TrainingEvent>,
}

impl TrainingWorker {
    /// Create a worker and the receiving end of its event stream.
    pub fn new(
        source: Arc<dyn SampleSource>,
        charset: Charset,
        params: TrainingParameters,
    ) -> (Self, Receiver<TrainingEvent>) {
        let (events, receiver) = unbounded();
        let worker = Self {
            source,
            charset,
            params,
            running: Arc::new(AtomicBool::new(false)),
            stop: Arc::new(AtomicBool::new(false)),
            events,
        };
        (worker, receiver)
    }

    /// Begin a training run on a dedicated background thread. Does nothing
    /// if a run is already active; the caller is never blocked.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            info!("training already running, start ignored");
            return;
        }
        self.stop.store(false, Ordering::SeqCst);

        let source = Arc::clone(&self.source);
        let charset = self.charset.clone();
        let params = self.params.clone();
        let running = Arc::clone(&self.running);
        let stop = Arc::clone(&self.stop);
        let events = self.events.clone();

        thread::spawn(move || {
            run_training(source, charset, params, &stop, &running, &events);
        });
    }

    /// Request cancellation. Non-blocking; the run observes the flag at
    /// the next epoch boundary. Calling this before `start` has no effect
    /// on a later run.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Whether a run is currently active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Flattened batch in the layout the classifier consumes.
fn collect_batch(
    source: &dyn SampleSource,
    count: usize,
    rng: &mut StdRng,
) -> Result<(Vec<Vec<f32>>, Vec<Vec<f32>>), crate::error::OcrError> {
    let mut inputs = Vec::new();
    let mut targets = Vec::new();
    for _ in 0..count {
        let samples: Vec<Sample> = source.build(rng)?;
        for sample in samples {
            inputs.push(sample.features);
            targets.push(sample.label);
        }
    }
    Ok((inputs, targets))
}

fn run_training(
    source: Arc<dyn SampleSource>,
    charset: Charset,
    params: TrainingParameters,
    stop: &AtomicBool,
    running: &AtomicBool,
    events: &Sender<TrainingEvent>,
) {
    let mut rng = StdRng::from_entropy();
    let mut network = Ffnn::new(
        FEATURE_LEN,
        params.hidden_nodes,
        charset.len(),
        params.learning_rate,
        params.momentum,
        &mut rng,
    );

    info!(
        "assembling training batches: {} input images, {} test images",
        params.input_count, params.test_count
    );

    let batches = collect_batch(source.as_ref(), params.input_count, &mut rng).and_then(
        |(inputs, targets)| {
            let (test_inputs, test_targets) =
                collect_batch(source.as_ref(), params.test_count, &mut rng)?;
            Ok((inputs, targets, test_inputs, test_targets))
        },
    );

    match batches {
        Ok((inputs, targets, test_inputs, test_targets)) => {
            info!("training on {} samples", inputs.len());

            let mut callback_count = 0usize;
            let mut minimum_error = f32::MAX;
            let mut last_error = f32::NAN;

            let result = network.train(
                &inputs,
                &targets,
                &test_inputs,
                &test_targets,
                params.error_threshold,
                &mut |err| {
                    let _ = events.send(TrainingEvent::Progress(err));
                    last_error = err;
                    callback_count += 1;
                    minimum_error = minimum_error.min(err);

                    // Stagnation early-stop: over budget and the error has
                    // drifted above the best seen by more than the
                    // threshold.
                    if callback_count > params.max_callbacks
                        && minimum_error + params.error_threshold < err
                    {
                        info!(
                            "stagnation stop after {} epochs (best {:.4}, current {:.4})",
                            callback_count, minimum_error, err
                        );
                        return false;
                    }

                    !stop.load(Ordering::SeqCst)
                },
            );

            if let Err(e) = result {
                error!("training terminated by classifier error: {e}");
            }

            // A cancelled run skips the final progress push.
            if !stop.load(Ordering::SeqCst) && last_error.is_finite() {
                let _ = events.send(TrainingEvent::Progress(last_error));
            }
        }
        Err(e) => {
            error!("batch assembly failed, finishing with untrained weights: {e}");
        }
    }

    // Clear the run flag first so a consumer reacting to `Finished` can
    // immediately start another run.
    running.store(false, Ordering::SeqCst);
    let _ = events.send(TrainingEvent::Finished(Model::new(charset, network)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrError;
    use rand::{Rng, RngCore};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Source of trivially learnable two-class samples.
    struct ScriptedSource;

    impl SampleSource for ScriptedSource {
        fn build(&self, rng: &mut dyn RngCore) -> Result<Vec<Sample>, OcrError> {
            let class = rng.gen_range(0..2usize);
            let mut features = vec![0.0; FEATURE_LEN];
            features[class] = 1.0;
            let mut label = vec![0.0; 2];
            label[class] = 1.0;
            Ok(vec![Sample { features, label }])
        }
    }

    /// Source that always fails, to exercise the error path.
    struct FailingSource;

    impl SampleSource for FailingSource {
        fn build(&self, _rng: &mut dyn RngCore) -> Result<Vec<Sample>, OcrError> {
            Err(OcrError::Generation { attempts: 1 })
        }
    }

    /// Source that blocks until told to proceed, to hold a run open.
    struct GatedSource {
        calls: AtomicUsize,
    }

    impl SampleSource for GatedSource {
        fn build(&self, _rng: &mut dyn RngCore) -> Result<Vec<Sample>, OcrError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            let mut label = vec![0.0; 2];
            label[0] = 1.0;
            Ok(vec![Sample {
                features: vec![0.0; FEATURE_LEN],
                label,
            }])
        }
    }

    fn params(input: usize, test: usize) -> TrainingParameters {
        TrainingParameters {
            hidden_nodes: 8,
            input_count: input,
            test_count: test,
            max_callbacks: 50,
            ..TrainingParameters::default()
        }
    }

    fn drain_to_finish(receiver: &Receiver<TrainingEvent>) -> (usize, Model) {
        let mut progress = 0;
        loop {
            match receiver
                .recv_timeout(Duration::from_secs(30))
                .expect("training did not finish in time")
            {
                TrainingEvent::Progress(_) => progress += 1,
                TrainingEvent::Finished(model) => return (progress, model),
            }
        }
    }

    #[test]
    fn run_finishes_with_model_and_progress() {
        let charset = Charset::new("AB").unwrap();
        let (worker, receiver) =
            TrainingWorker::new(Arc::new(ScriptedSource), charset, params(8, 4));

        worker.start();
        let (progress, model) = drain_to_finish(&receiver);

        assert!(progress >= 1);
        assert_eq!(model.charset().len(), 2);
        assert!(!worker.is_running());
    }

    #[test]
    fn stop_before_start_has_no_effect() {
        let charset = Charset::new("AB").unwrap();
        let (worker, receiver) =
            TrainingWorker::new(Arc::new(ScriptedSource), charset, params(4, 2));

        worker.stop();
        worker.start();

        let (_, model) = drain_to_finish(&receiver);
        assert_eq!(model.charset().len(), 2);
    }

    #[test]
    fn double_start_is_a_no_op() {
        let charset = Charset::new("AB").unwrap();
        let source = Arc::new(GatedSource {
            calls: AtomicUsize::new(0),
        });
        let (worker, receiver) =
            TrainingWorker::new(source.clone(), charset, params(4, 2));

        worker.start();
        thread::sleep(Duration::from_millis(5));
        worker.start();
        worker.stop();

        let (_, _model) = drain_to_finish(&receiver);

        // A second active run would have doubled the batch assembly calls.
        assert!(source.calls.load(Ordering::SeqCst) <= 6);
    }

    #[test]
    fn failed_batch_assembly_still_finishes() {
        let charset = Charset::new("AB").unwrap();
        let (worker, receiver) =
            TrainingWorker::new(Arc::new(FailingSource), charset, params(4, 2));

        worker.start();
        let (progress, model) = drain_to_finish(&receiver);

        assert_eq!(progress, 0);
        assert_eq!(model.charset().len(), 2);
        // The run flag clears before the terminal event on this path too.
        assert!(!worker.is_running());
    }
}
