//! End-to-end pipeline tests
//!
//! Uses programmatic glyphs (a solid block for 'A', a ring for 'B') instead
//! of font rendering so the whole train-save-load-recognize path runs
//! hermetically: the shapes differ in both grid pattern and aspect ratio,
//! which is exactly what the feature vector encodes.

use std::sync::Arc;
use std::time::Duration;

use image::{DynamicImage, Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use charlens::charset::Charset;
use charlens::classifier::{Classifier, TrainableClassifier};
use charlens::detect::ComponentDetector;
use charlens::model::Model;
use charlens::recognize::Recognizer;
use charlens::synth::{random_string, SampleBuilder, SampleSource, TextImageSource};
use charlens::train::{TrainingEvent, TrainingWorker};
use charlens::vision::FEATURE_LEN;
use charlens::TrainingParameters;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

fn draw_rect(image: &mut RgbaImage, x0: u32, y0: u32, w: u32, h: u32, color: Rgba<u8>) {
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            image.put_pixel(x, y, color);
        }
    }
}

/// 'A' is a tall solid block, 'B' is a square ring with a hollow center.
fn draw_glyph(image: &mut RgbaImage, c: char, slot_x: u32) {
    match c {
        'A' => draw_rect(image, slot_x + 5, 17, 14, 26, WHITE),
        'B' => {
            draw_rect(image, slot_x, 18, 24, 24, WHITE);
            draw_rect(image, slot_x + 8, 26, 8, 8, BLACK);
        }
        _ => unreachable!("charset is AB"),
    }
}

fn render(text: &str) -> RgbaImage {
    let mut image =
        RgbaImage::from_pixel(20 + 40 * text.chars().count() as u32, 60, BLACK);
    for (i, c) in text.chars().enumerate() {
        draw_glyph(&mut image, c, 10 + 40 * i as u32);
    }
    image
}

struct ShapeSource;

impl TextImageSource for ShapeSource {
    fn generate(
        &self,
        charset: &Charset,
        length: usize,
        rng: &mut dyn RngCore,
    ) -> (RgbaImage, String) {
        let text = random_string(charset, length, rng);
        (render(&text), text)
    }
}

fn shape_builder(max_attempts: u32) -> SampleBuilder<ShapeSource, ComponentDetector> {
    SampleBuilder::new(
        ShapeSource,
        ComponentDetector::default(),
        Charset::new("AB").unwrap(),
        8,
        max_attempts,
    )
}

#[test]
fn builder_emits_aligned_batches() {
    let builder = shape_builder(10);
    let mut rng = StdRng::seed_from_u64(11);

    for _ in 0..20 {
        let samples = builder.build(&mut rng).unwrap();
        assert!((3..8).contains(&samples.len()));
        for sample in &samples {
            assert_eq!(sample.features.len(), FEATURE_LEN);
            assert_eq!(sample.label.iter().filter(|&&v| v == 1.0).count(), 1);
        }
    }
}

#[test]
fn trained_model_recognizes_shapes_after_reload() {
    let charset = Charset::new("AB").unwrap();
    let builder = shape_builder(10);
    let mut rng = StdRng::seed_from_u64(23);

    let mut inputs = Vec::new();
    let mut targets = Vec::new();
    for _ in 0..15 {
        for sample in builder.build(&mut rng).unwrap() {
            inputs.push(sample.features);
            targets.push(sample.label);
        }
    }
    let split = inputs.len() - inputs.len() / 5;
    let test_inputs = inputs.split_off(split);
    let test_targets = targets.split_off(split);

    let mut network = charlens::classifier::Ffnn::new(
        FEATURE_LEN,
        16,
        charset.len(),
        0.35,
        0.7,
        &mut rng,
    );
    let mut epochs = 0;
    network
        .train(
            &inputs,
            &targets,
            &test_inputs,
            &test_targets,
            0.5,
            &mut |_err| {
                epochs += 1;
                epochs < 400
            },
        )
        .unwrap();

    // Persist and reload before recognizing.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shapes.json");
    Model::new(charset, network).save(&path).unwrap();
    let model = Model::load(&path).unwrap();

    let recognizer = Recognizer::from_model(model, ComponentDetector::default());
    let image = DynamicImage::ImageRgba8(render("AB"));
    assert_eq!(recognizer.recognize(&image), Some("AB".to_string()));

    let image = DynamicImage::ImageRgba8(render("BABA"));
    assert_eq!(recognizer.recognize(&image), Some("BABA".to_string()));
}

#[test]
fn worker_drives_builder_to_a_finished_model() {
    let charset = Charset::new("AB").unwrap();
    let params = TrainingParameters {
        hidden_nodes: 12,
        input_count: 10,
        test_count: 3,
        max_callbacks: 100,
        ..TrainingParameters::default()
    };

    let (worker, events) =
        TrainingWorker::new(Arc::new(shape_builder(10)), charset, params);
    worker.start();

    let mut progress_events = 0;
    let model = loop {
        match events
            .recv_timeout(Duration::from_secs(60))
            .expect("training did not finish")
        {
            TrainingEvent::Progress(error) => {
                assert!(error.is_finite());
                progress_events += 1;
                // Hermetic cap: cancel if convergence is slow.
                if progress_events == 500 {
                    worker.stop();
                }
            }
            TrainingEvent::Finished(model) => break model,
        }
    };

    assert_eq!(model.charset().len(), 2);
    let output = model.network().forward(&vec![0.0; FEATURE_LEN]);
    assert_eq!(output.len(), 2);
}
