use ::rand::prelude::*;
use std::ops::Range;
use crate::common::Timestamp;
use crate::prompb::{Label, Sample, TimeSeries, UnknownFields};

pub fn create_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Parameters for generating random series.
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Timestamp of the first sample. May be negative.
    pub start: Timestamp,
    /// Interval between samples in milliseconds.
    pub interval: i64,
    /// Samples per series.
    pub samples: usize,
    pub series: usize,
    pub range: Range<f64>,
    /// Probability of a NaN or infinite value in place of a sample.
    pub special_values: f64,
    /// Shuffle the samples of every series.
    pub shuffle: bool,
    /// Attach random unknown fields to generated messages.
    pub unknown_fields: bool,
    pub seed: Option<u64>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            start: 1_700_000_000_000,
            interval: 15_000,
            samples: 20,
            series: 5,
            range: 0.0..100.0,
            special_values: 0.0,
            shuffle: false,
            unknown_fields: false,
            seed: Some(42),
        }
    }
}

const JOBS: [&str; 4] = ["api", "web", "db", "cache"];

pub fn generate_series(options: &GeneratorOptions) -> Vec<TimeSeries> {
    let mut rng = create_rng(options.seed);
    (0..options.series)
        .map(|i| {
            let mut labels = vec![
                Label::new("__name__", "http_requests_total"),
                Label::new("job", JOBS[i % JOBS.len()]),
                Label::new("instance", format!("host-{i}:9090")),
            ];
            labels.shuffle(&mut rng);

            let mut samples: Vec<Sample> = (0..options.samples)
                .map(|j| {
                    let t = options.start + j as i64 * options.interval;
                    Sample::new(t, next_value(&mut rng, options))
                })
                .collect();
            if options.shuffle {
                samples.shuffle(&mut rng);
            }

            let mut series = TimeSeries::new(labels, samples);
            if options.unknown_fields {
                add_unknown_fields(&mut rng, &mut series.unknown_fields);
                for label in series.labels.iter_mut() {
                    add_unknown_fields(&mut rng, &mut label.unknown_fields);
                }
            }
            series
        })
        .collect()
}

fn next_value(rng: &mut StdRng, options: &GeneratorOptions) -> f64 {
    if options.special_values > 0.0 && rng.gen_bool(options.special_values) {
        return *[f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -0.0]
            .choose(rng)
            .unwrap_or(&f64::NAN);
    }
    rng.gen_range(options.range.clone())
}

/// Adds up to two unknown fields numbered above every known field.
pub fn add_unknown_fields(rng: &mut StdRng, fields: &mut UnknownFields) {
    for _ in 0..rng.gen_range(0..3) {
        let number = rng.gen_range(20..2000);
        if rng.gen_bool(0.5) {
            fields.push_varint(number, rng.gen());
        } else {
            let len = rng.gen_range(0..16);
            let payload: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
            fields.push_bytes(number, &payload);
        }
    }
}
