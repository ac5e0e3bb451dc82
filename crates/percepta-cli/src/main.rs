//! `percepta` – demo driver for the recognition pipeline.
//!
//! Wires the goal executor to the in-process stub collaborators, feeds it a
//! synthetic tabletop scene and runs one detection goal end to end, printing
//! the fused object list as JSON.
//!
//! Usage: `percepta [config.toml]`.  Without an argument every tunable runs
//! at its default.

mod config;

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use percepta_adapters::sim::{SimRecognizer, SimSegmenter};
use percepta_adapters::{RecordingSink, Segmentation, StaticTransforms};
use percepta_fusion::ObjectCatalog;
use percepta_runtime::{Collaborators, GoalExecutor, RecognitionConfig};
use percepta_types::{
    CameraImage, Detection2D, DetectionGoal, OrganizedCloud, Roi, SensorFrame, Vec3,
};

/// Catalog used when the configuration names no catalog file.
const DEMO_CATALOG: &str = r#"
[[object_info.object]]
name = "S40_40_B"
shape = "sphere"
color = "blue"

[[object_info.object]]
name = "F20_20_G"
shape = "box"
color = "grey"

[[object_info.object]]
name = "M20_100"
shape = "bolt"
color = "grey"
"#;

fn main() {
    // ── Structured logging ────────────────────────────────────────────────
    // Initialise tracing-subscriber using RUST_LOG (defaults to "info").
    // Set PERCEPTA_LOG_FORMAT=json to emit newline-delimited JSON logs
    // suitable for log aggregators.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("PERCEPTA_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .init();
    }

    let config = match std::env::args().nth(1) {
        Some(path) => match config::load(Path::new(&path)) {
            Ok(config) => {
                info!(path = %path, "configuration loaded");
                config
            }
            Err(e) => {
                error!(error = %e, "failed to load configuration");
                std::process::exit(1);
            }
        },
        None => RecognitionConfig::default(),
    };

    let catalog = match &config.catalog_path {
        Some(path) => match ObjectCatalog::load(path) {
            Ok(catalog) => catalog,
            Err(e) => {
                error!(error = %e, path = %path.display(), "failed to load object catalog");
                std::process::exit(1);
            }
        },
        None => match ObjectCatalog::from_toml_str(DEMO_CATALOG) {
            Ok(catalog) => catalog,
            Err(e) => {
                error!(error = %e, "built-in demo catalog is invalid");
                std::process::exit(1);
            }
        },
    };

    run(config, Arc::new(catalog));
}

#[tokio::main]
async fn run(config: RecognitionConfig, catalog: Arc<ObjectCatalog>) {
    let sink = Arc::new(RecordingSink::new());
    let executor = GoalExecutor::new(
        config,
        catalog,
        Collaborators {
            segmenter: Box::new(SimSegmenter::with_result(Segmentation {
                workspace_height: Some(0.05),
                ..Segmentation::default()
            })),
            recognizer: Box::new(SimRecognizer::new(demo_detections())),
            transforms: Box::new(StaticTransforms::new()),
            sink: Box::new(sink.clone()),
            cloud_sink: None,
            debug_sink: None,
        },
    );

    executor.offer_frame(demo_frame());

    let outcome = match executor.submit(DetectionGoal::new("WS01")).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "detection run never reported an outcome");
            std::process::exit(1);
        }
    };
    if !outcome.success {
        error!(reason = ?outcome.reason, "detection goal failed");
        std::process::exit(1);
    }

    for list in sink.published() {
        match serde_json::to_string_pretty(&list) {
            Ok(json) => println!("{json}"),
            Err(e) => error!(error = %e, "could not serialize the fused list"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Synthetic scene
// ─────────────────────────────────────────────────────────────────────────────

/// A frame whose scan carries a flat object patch 5 cm above the ground,
/// already expressed in the default target frame.
fn demo_frame() -> SensorFrame {
    let width = 160u32;
    let height = 120u32;
    let mut points = vec![None; (width * height) as usize];
    for y in 40..80u32 {
        for x in 30..110u32 {
            points[(y * width + x) as usize] =
                Some(Vec3::new(0.3 + x as f32 * 0.002, y as f32 * 0.002, 0.05));
        }
    }
    SensorFrame {
        image: CameraImage {
            width,
            height,
            data: vec![0u8; (width * height * 3) as usize],
            stamp: Utc::now(),
        },
        cloud: OrganizedCloud {
            width,
            height,
            points,
            frame_id: "base_link".to_string(),
            stamp: Utc::now(),
        },
    }
}

/// Two detections over the patch plus one implausibly large box that the
/// fusion stage will relabel.
fn demo_detections() -> Vec<Detection2D> {
    vec![
        Detection2D {
            class_name: "F20_20_G".to_string(),
            confidence: 0.94,
            roi: Roi {
                x: 40,
                y: 45,
                width: 24,
                height: 18,
            },
        },
        Detection2D {
            class_name: "S40_40_B".to_string(),
            confidence: 0.88,
            roi: Roi {
                x: 80,
                y: 50,
                width: 20,
                height: 20,
            },
        },
        Detection2D {
            class_name: "M20_100".to_string(),
            confidence: 0.61,
            roi: Roi {
                x: 0,
                y: 0,
                width: 500,
                height: 400,
            },
        },
    ]
}
