//! End-to-end scenarios from spec §8 (S1-S6), run against a
//! [`support::FakeHdf5Source`] rather than real HDF5 bytes.

mod support;

use serde_json::json;
use slp_format::config::LoaderConfig;
use slp_format::json::attr::decode_json_bytes;
use slp_format::lite::{is_hdf5_buffer, validate_slp_buffer};
use slp_format::loader::{load_slp, load_slp_lite};
use slp_core::{AttrValue, ScalarType};
use support::{FakeHdf5Source, RowBuilder};
use std::collections::HashMap;

fn frames_layout() -> RowBuilder {
    RowBuilder::new(&[
        ("frame_id", ScalarType::I64),
        ("video", ScalarType::I64),
        ("frame_idx", ScalarType::I64),
        ("instance_id_start", ScalarType::I64),
        ("instance_id_end", ScalarType::I64),
    ])
}

fn instances_layout() -> RowBuilder {
    RowBuilder::new(&[
        ("instance_id", ScalarType::I64),
        ("instance_type", ScalarType::I64),
        ("frame_id", ScalarType::I64),
        ("skeleton", ScalarType::I64),
        ("track", ScalarType::I64),
        ("from_predicted", ScalarType::I64),
        ("instance_score", ScalarType::F64),
        ("point_id_start", ScalarType::I64),
        ("point_id_end", ScalarType::I64),
        ("tracking_score", ScalarType::F64),
    ])
}

fn points_layout() -> RowBuilder {
    RowBuilder::new(&[
        ("x", ScalarType::F64),
        ("y", ScalarType::F64),
        ("visible", ScalarType::I64),
        ("complete", ScalarType::I64),
    ])
}

fn pred_points_layout() -> RowBuilder {
    RowBuilder::new(&[
        ("x", ScalarType::F64),
        ("y", ScalarType::F64),
        ("visible", ScalarType::I64),
        ("complete", ScalarType::I64),
        ("score", ScalarType::F64),
    ])
}

fn metadata_attrs(metadata_json: &serde_json::Value) -> HashMap<String, AttrValue> {
    let mut attrs = HashMap::new();
    attrs.insert("format_id".into(), AttrValue::Float(1.2));
    attrs.insert("json".into(), AttrValue::Str(metadata_json.to_string()));
    attrs
}

fn minimal_skeleton_metadata(version: &str) -> serde_json::Value {
    json!({
        "version": version,
        "provenance": {"sleap_version": version},
        "nodes": [{"name": "A"}, {"name": "B"}],
        "skeletons": [{
            "graph": {"name": "animal"},
            "nodes": [0, 1],
            "links": [{"source": 0, "target": 1, "type": {"py/tuple": [1]}}],
        }],
    })
}

fn one_video_row() -> serde_json::Value {
    json!({"backend": {"filename": "clip.mp4", "format": "mp4"}})
}

/// S1 - minimal skeleton: one labeled frame, one user instance.
#[tokio::test]
async fn s1_minimal_skeleton() {
    let metadata = minimal_skeleton_metadata("1.2.7");
    let frames = frames_layout();
    let instances = instances_layout();
    let points = points_layout();

    let source = FakeHdf5Source::new()
        .with_metadata_group(metadata_attrs(&metadata))
        .with_json_rows("videos_json", vec![one_video_row()])
        .with_compound("frames", frames.layout(), frames.row(&[0.0, 0.0, 0.0, 0.0, 1.0]))
        .with_compound(
            "instances",
            instances.layout(),
            instances.row(&[0.0, 0.0, 0.0, 0.0, -1.0, -1.0, f64::NAN, 0.0, 2.0, 0.0]),
        )
        .with_compound(
            "points",
            points.layout(),
            [points.row(&[1.0, 2.0, 1.0, 1.0]), points.row(&[3.0, 4.0, 1.0, 1.0])].concat(),
        );

    let labels = load_slp(&source, &LoaderConfig::default()).await.unwrap();
    assert_eq!(labels.skeletons.len(), 1);
    assert_eq!(labels.skeletons[0].node_names(), vec!["A", "B"]);
    assert_eq!(labels.skeletons[0].edges().len(), 1);
    assert!(labels.labeled_frames.len() >= 1);
    labels.check_invariants().unwrap();
}

/// S2 - provenance: `provenance.sleap_version == "1.2.7"`.
#[tokio::test]
async fn s2_provenance_version_surfaces() {
    let metadata = minimal_skeleton_metadata("1.2.7");
    let frames = frames_layout();

    let source = FakeHdf5Source::new()
        .with_metadata_group(metadata_attrs(&metadata))
        .with_json_rows("videos_json", vec![one_video_row()])
        .with_compound("frames", frames.layout(), vec![])
        .with_compound("instances", instances_layout().layout(), vec![])
        .with_compound("points", points_layout().layout(), vec![]);

    let labels = load_slp(&source, &LoaderConfig::default()).await.unwrap();
    assert_eq!(labels.provenance.sleap_version(), Some("1.2.7"));
}

/// S3 - legacy grid instance: point matrix `[[-1,-1],[-0.5,-0.5],[-1,0]]`
/// with the middle point invisible (reported as NaN via `Point::coords`).
#[tokio::test]
async fn s3_legacy_grid_instance_points() {
    let metadata = json!({
        "version": "1.0.0",
        "provenance": {},
        "nodes": [{"name": "a"}, {"name": "b"}, {"name": "c"}],
        "skeletons": [{"name": "s", "nodes": [0, 1, 2], "links": []}],
    });
    let frames = frames_layout();
    let instances = instances_layout();
    let points = points_layout();

    let source = FakeHdf5Source::new()
        .with_metadata_group(metadata_attrs(&metadata))
        .with_json_rows("videos_json", vec![one_video_row()])
        .with_compound("frames", frames.layout(), frames.row(&[0.0, 0.0, 0.0, 0.0, 1.0]))
        .with_compound(
            "instances",
            instances.layout(),
            instances.row(&[0.0, 0.0, 0.0, 0.0, -1.0, -1.0, f64::NAN, 0.0, 3.0, 0.0]),
        )
        .with_compound(
            "points",
            points.layout(),
            [
                points.row(&[-1.0, -1.0, 1.0, 1.0]),
                points.row(&[-0.5, -0.5, 0.0, 0.0]),
                points.row(&[-1.0, 0.0, 1.0, 1.0]),
            ]
            .concat(),
        );

    let labels = load_slp(&source, &LoaderConfig::default()).await.unwrap();
    let frame = &labels.labeled_frames[0];
    let instance = frame.instances[0].as_user().expect("expected a user instance");
    assert_eq!(instance.points[0].coords(), (-1.0, -1.0));
    let (x, y) = instance.points[1].coords();
    assert!(x.is_nan() && y.is_nan(), "invisible point must report NaN");
    assert_eq!(instance.points[2].coords(), (-1.0, 0.0));
}

/// S4 - from_predicted stitching, 3-instance frame `[P0, P1, U2]`:
/// `U2.from_predicted == P1` and `unused_predictions == [P0]`.
#[tokio::test]
async fn s4_three_instance_frame() {
    let metadata = minimal_skeleton_metadata("1.2.7");
    let frames = frames_layout();
    let instances = instances_layout();
    let points = points_layout();
    let pred_points = pred_points_layout();

    let source = FakeHdf5Source::new()
        .with_metadata_group(metadata_attrs(&metadata))
        .with_json_rows("videos_json", vec![one_video_row()])
        .with_compound("frames", frames.layout(), frames.row(&[0.0, 0.0, 0.0, 0.0, 3.0]))
        .with_compound(
            "instances",
            instances.layout(),
            [
                instances.row(&[0.0, 1.0, 0.0, 0.0, -1.0, -1.0, 0.9, 0.0, 1.0, 0.0]),
                instances.row(&[1.0, 1.0, 0.0, 0.0, -1.0, -1.0, 0.9, 1.0, 2.0, 0.0]),
                instances.row(&[2.0, 0.0, 0.0, 0.0, -1.0, 1.0, f64::NAN, 0.0, 1.0, 0.0]),
            ]
            .concat(),
        )
        .with_compound("points", points.layout(), points.row(&[0.0, 0.0, 1.0, 1.0]))
        .with_compound(
            "pred_points",
            pred_points.layout(),
            [pred_points.row(&[0.0, 0.0, 1.0, 1.0, 0.9]), pred_points.row(&[1.0, 1.0, 1.0, 1.0, 0.8])].concat(),
        );

    let labels = load_slp(&source, &LoaderConfig::default()).await.unwrap();
    let frame = &labels.labeled_frames[0];
    assert!(frame.predicted_precede_user());
    assert_eq!(frame.unused_predictions().len(), 1);

    let user = frame.instances[2].as_user().unwrap();
    let from_predicted_idx = user.from_predicted.expect("U2 must resolve from_predicted");
    assert!(frame.instances[from_predicted_idx].is_predicted());
}

/// S5 - lite counts match full: row/entity counts agree between the lite
/// and full loaders on the same source.
#[tokio::test]
async fn s5_lite_counts_match_full() {
    let metadata = minimal_skeleton_metadata("1.2.7");
    let frames = frames_layout();
    let instances = instances_layout();
    let points = points_layout();

    let source = FakeHdf5Source::new()
        .with_metadata_group(metadata_attrs(&metadata))
        .with_json_rows("videos_json", vec![one_video_row()])
        .with_compound("frames", frames.layout(), frames.row(&[0.0, 0.0, 0.0, 0.0, 1.0]))
        .with_compound(
            "instances",
            instances.layout(),
            instances.row(&[0.0, 0.0, 0.0, 0.0, -1.0, -1.0, f64::NAN, 0.0, 1.0, 0.0]),
        )
        .with_compound("points", points.layout(), points.row(&[1.0, 2.0, 1.0, 1.0]));

    let config = LoaderConfig::default();
    let full = load_slp(&source, &config).await.unwrap();
    let lite = load_slp_lite(&source, &config).await.unwrap();

    assert_eq!(lite.counts.frames, full.labeled_frames.len() as u64);
    assert_eq!(lite.videos.len(), full.videos.len());
    assert_eq!(lite.skeletons[0].node_names(), full.skeletons[0].node_names());
}

/// S6 - HDF5 magic detection.
#[test]
fn s6_hdf5_magic_detection() {
    let good = [0x89u8, 0x48, 0x44, 0x46, 0x0D, 0x0A, 0x1A, 0x0A, 0x01, 0x02];
    assert!(is_hdf5_buffer(&good));

    let zeros = [0u8; 16];
    assert!(!is_hdf5_buffer(&zeros));

    let short = [0x89u8, 0x48, 0x44];
    assert!(!is_hdf5_buffer(&short));
}

/// Property #7: `validateSlpBuffer == true` implies `load_slp_lite`
/// doesn't raise `InvalidSlp`.
#[tokio::test]
async fn validate_true_implies_lite_load_succeeds() {
    let metadata = minimal_skeleton_metadata("1.2.7");
    let frames = frames_layout();

    let source = FakeHdf5Source::new()
        .with_metadata_group(metadata_attrs(&metadata))
        .with_json_rows("videos_json", vec![one_video_row()])
        .with_compound("frames", frames.layout(), vec![])
        .with_compound("instances", instances_layout().layout(), vec![])
        .with_compound("points", points_layout().layout(), vec![]);

    assert!(validate_slp_buffer(&source).await.unwrap());
    assert!(load_slp_lite(&source, &LoaderConfig::default()).await.is_ok());
}

/// Property #8: loading the same source twice yields deeply-equal
/// documents (determinism) — spot-checked via a handful of structural
/// fields `Labels` doesn't implement `PartialEq` for as a whole.
#[tokio::test]
async fn loading_twice_is_deterministic() {
    let metadata = minimal_skeleton_metadata("1.2.7");
    let frames = frames_layout();
    let instances = instances_layout();
    let points = points_layout();

    let build_source = || {
        FakeHdf5Source::new()
            .with_metadata_group(metadata_attrs(&metadata))
            .with_json_rows("videos_json", vec![one_video_row()])
            .with_compound("frames", frames.layout(), frames.row(&[0.0, 0.0, 0.0, 0.0, 1.0]))
            .with_compound(
                "instances",
                instances.layout(),
                instances.row(&[0.0, 0.0, 0.0, 0.0, -1.0, -1.0, f64::NAN, 0.0, 1.0, 0.0]),
            )
            .with_compound("points", points.layout(), points.row(&[1.0, 2.0, 1.0, 1.0]))
    };

    let a = load_slp(&build_source(), &LoaderConfig::default()).await.unwrap();
    let b = load_slp(&build_source(), &LoaderConfig::default()).await.unwrap();

    assert_eq!(a.labeled_frames.len(), b.labeled_frames.len());
    assert_eq!(a.skeletons[0].node_names(), b.skeletons[0].node_names());
    let ua = a.labeled_frames[0].instances[0].as_user().unwrap();
    let ub = b.labeled_frames[0].instances[0].as_user().unwrap();
    assert_eq!(ua.points[0].coords(), ub.points[0].coords());
}

#[test]
fn json_bytes_decoder_trims_nul_padding() {
    let parsed = decode_json_bytes(b"{\"a\":1}\0\0").unwrap();
    assert_eq!(parsed["a"], 1);
}
