//! Feed-forward network backend
//!
//! One sigmoid hidden layer, sigmoid outputs, summed cross-entropy error,
//! online backpropagation with momentum. Weights serialize with the model;
//! momentum buffers are transient and rebuilt on first use.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::classifier::{Classifier, TrainableClassifier};
use crate::error::OcrError;

/// Clamp for log arguments in the cross-entropy sum.
const EPSILON: f32 = 1e-7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ffnn {
    inputs: usize,
    hidden: usize,
    outputs: usize,
    learning_rate: f32,
    momentum: f32,
    /// `hidden x (inputs + 1)`; the trailing column is the bias weight.
    hidden_weights: Vec<Vec<f32>>,
    /// `outputs x (hidden + 1)`; the trailing column is the bias weight.
    output_weights: Vec<Vec<f32>>,
    #[serde(skip)]
    hidden_velocity: Vec<Vec<f32>>,
    #[serde(skip)]
    output_velocity: Vec<Vec<f32>>,
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

fn init_layer(rows: usize, cols: usize, rng: &mut impl Rng) -> Vec<Vec<f32>> {
    let range = 1.0 / (cols as f32).sqrt();
    (0..rows)
        .map(|_| (0..cols).map(|_| rng.gen_range(-range..range)).collect())
        .collect()
}

impl Ffnn {
    pub fn new(
        inputs: usize,
        hidden: usize,
        outputs: usize,
        learning_rate: f32,
        momentum: f32,
        rng: &mut impl Rng,
    ) -> Self {
        Self {
            inputs,
            hidden,
            outputs,
            learning_rate,
            momentum,
            hidden_weights: init_layer(hidden, inputs + 1, rng),
            output_weights: init_layer(outputs, hidden + 1, rng),
            hidden_velocity: vec![vec![0.0; inputs + 1]; hidden],
            output_velocity: vec![vec![0.0; hidden + 1]; outputs],
        }
    }

    /// Momentum buffers are skipped by serde; rebuild them after a load.
    fn ensure_velocity(&mut self) {
        if self.hidden_velocity.len() != self.hidden {
            self.hidden_velocity = vec![vec![0.0; self.inputs + 1]; self.hidden];
        }
        if self.output_velocity.len() != self.outputs {
            self.output_velocity = vec![vec![0.0; self.hidden + 1]; self.outputs];
        }
    }

    fn activations(&self, input: &[f32]) -> (Vec<f32>, Vec<f32>) {
        let hidden_out: Vec<f32> = self
            .hidden_weights
            .iter()
            .map(|weights| {
                let sum: f32 = weights[..self.inputs]
                    .iter()
                    .zip(input)
                    .map(|(w, x)| w * x)
                    .sum();
                sigmoid(sum + weights[self.inputs])
            })
            .collect();

        let output: Vec<f32> = self
            .output_weights
            .iter()
            .map(|weights| {
                let sum: f32 = weights[..self.hidden]
                    .iter()
                    .zip(&hidden_out)
                    .map(|(w, h)| w * h)
                    .sum();
                sigmoid(sum + weights[self.hidden])
            })
            .collect();

        (hidden_out, output)
    }

    fn backpropagate(&mut self, input: &[f32], target: &[f32]) {
        let (hidden_out, output) = self.activations(input);

        // Sigmoid + cross-entropy: the output delta reduces to (o - t).
        let output_delta: Vec<f32> = output
            .iter()
            .zip(target)
            .map(|(o, t)| o - t)
            .collect();

        let hidden_delta: Vec<f32> = (0..self.hidden)
            .map(|j| {
                let downstream: f32 = self
                    .output_weights
                    .iter()
                    .zip(&output_delta)
                    .map(|(weights, delta)| weights[j] * delta)
                    .sum();
                hidden_out[j] * (1.0 - hidden_out[j]) * downstream
            })
            .collect();

        for (k, delta) in output_delta.iter().enumerate() {
            for j in 0..self.hidden {
                let grad = delta * hidden_out[j];
                let v = self.learning_rate * grad
                    + self.momentum * self.output_velocity[k][j];
                self.output_velocity[k][j] = v;
                self.output_weights[k][j] -= v;
            }
            let v = self.learning_rate * delta
                + self.momentum * self.output_velocity[k][self.hidden];
            self.output_velocity[k][self.hidden] = v;
            self.output_weights[k][self.hidden] -= v;
        }

        for (j, delta) in hidden_delta.iter().enumerate() {
            for i in 0..self.inputs {
                let grad = delta * input[i];
                let v = self.learning_rate * grad
                    + self.momentum * self.hidden_velocity[j][i];
                self.hidden_velocity[j][i] = v;
                self.hidden_weights[j][i] -= v;
            }
            let v = self.learning_rate * delta
                + self.momentum * self.hidden_velocity[j][self.inputs];
            self.hidden_velocity[j][self.inputs] = v;
            self.hidden_weights[j][self.inputs] -= v;
        }
    }

    /// Summed cross-entropy over a held-out set.
    fn test_error(&self, test_inputs: &[Vec<f32>], test_targets: &[Vec<f32>]) -> f32 {
        let mut error = 0.0;
        for (input, target) in test_inputs.iter().zip(test_targets) {
            let output = self.forward(input);
            for (o, t) in output.iter().zip(target) {
                let o = o.clamp(EPSILON, 1.0 - EPSILON);
                error -= t * o.ln() + (1.0 - t) * (1.0 - o).ln();
            }
        }
        error
    }

    fn validate(
        &self,
        inputs: &[Vec<f32>],
        targets: &[Vec<f32>],
    ) -> Result<(), OcrError> {
        if inputs.len() != targets.len() {
            return Err(OcrError::Classifier(format!(
                "{} inputs but {} targets",
                inputs.len(),
                targets.len()
            )));
        }
        for input in inputs {
            if input.len() != self.inputs {
                return Err(OcrError::Classifier(format!(
                    "input length {} does not match network input width {}",
                    input.len(),
                    self.inputs
                )));
            }
        }
        for target in targets {
            if target.len() != self.outputs {
                return Err(OcrError::Classifier(format!(
                    "target length {} does not match network output width {}",
                    target.len(),
                    self.outputs
                )));
            }
        }
        Ok(())
    }
}

impl Classifier for Ffnn {
    fn input_len(&self) -> usize {
        self.inputs
    }

    fn output_len(&self) -> usize {
        self.outputs
    }

    fn forward(&self, input: &[f32]) -> Vec<f32> {
        self.activations(input).1
    }
}

impl TrainableClassifier for Ffnn {
    fn train(
        &mut self,
        inputs: &[Vec<f32>],
        targets: &[Vec<f32>],
        test_inputs: &[Vec<f32>],
        test_targets: &[Vec<f32>],
        error_threshold: f32,
        on_epoch: &mut dyn FnMut(f32) -> bool,
    ) -> Result<(), OcrError> {
        self.validate(inputs, targets)?;
        self.validate(test_inputs, test_targets)?;
        self.ensure_velocity();

        loop {
            for (input, target) in inputs.iter().zip(targets) {
                self.backpropagate(input, target);
            }

            let error = self.test_error(test_inputs, test_targets);
            if !on_epoch(error) {
                break;
            }
            if error < error_threshold {
                break;
            }
        }

        Ok(())
    }
}
