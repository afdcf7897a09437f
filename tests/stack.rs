//! Stack engine integration tests against the deterministic stub service.
mod common;

use std::sync::Arc;

use scenestack::error::Error;
use scenestack::{DataType, StackOptions};

use common::{StubRaster, collection, ctx, scene_with};

const U16: DataType = DataType::UInt16;

fn three_scene_setup() -> (Arc<StubRaster>, scenestack::SceneCollection) {
    let stub = Arc::new(
        StubRaster::new((3, 4))
            .add_scene("l8:a", (0, 4), &[("red", 10.0), ("alpha", 255.0)])
            .add_scene("l8:b", (0, 4), &[("red", 20.0), ("alpha", 255.0)])
            .add_scene("l8:c", (0, 2), &[("red", 30.0), ("alpha", 255.0)]),
    );
    let scenes = vec![
        scene_with("l8:a", "2013-04-18T16:42:03Z", U16, &[("red", None), ("alpha", None)]),
        scene_with("l8:b", "2013-05-04T16:42:11Z", U16, &[("red", None), ("alpha", None)]),
        scene_with("l8:c", "2013-05-20T16:41:58Z", U16, &[("red", None), ("alpha", None)]),
    ];
    let sc = collection(&stub, scenes);
    (stub, sc)
}

#[test]
fn layers_follow_collection_order() {
    let (stub, sc) = three_scene_setup();
    let stack = sc.stack("red", &ctx(), &StackOptions::default()).unwrap();

    // (scene, band, y, x); alpha was fetched for masking but dropped
    assert_eq!(stack.data.dim(), (3, 1, 3, 4));
    assert_eq!(stack.infos.len(), 3);
    assert_eq!(stack.data[[0, 0, 0, 0]], 10.0);
    assert_eq!(stack.data[[1, 0, 0, 0]], 20.0);
    assert_eq!(stack.data[[2, 0, 0, 0]], 30.0);

    // scene c covers only the first two columns; the rest is alpha-masked
    let mask = stack.mask.as_ref().unwrap();
    assert!(!mask[[2, 0, 0, 1]]);
    assert!(mask[[2, 0, 0, 2]]);
    assert!(mask[[2, 0, 0, 3]]);
    assert!(!mask[[0, 0, 0, 3]]);

    // one /featurearray call per layer
    assert_eq!(stub.call_count(), 3);
}

#[test]
fn dtype_mismatch_fails_before_any_network_call() {
    let stub = Arc::new(
        StubRaster::new((3, 4))
            .add_scene("l8:a", (0, 4), &[("red", 10.0), ("alpha", 255.0)])
            .add_scene("s2:b", (0, 4), &[("red", 20.0), ("alpha", 255.0)]),
    );
    let sc = collection(
        &stub,
        vec![
            scene_with("l8:a", "2013-04-18T16:42:03Z", U16, &[("red", None), ("alpha", None)]),
            scene_with(
                "s2:b",
                "2013-05-04T16:42:11Z",
                DataType::Float32,
                &[("red", None), ("alpha", None)],
            ),
        ],
    );

    let err = sc.stack("red", &ctx(), &StackOptions::default()).unwrap_err();
    match err {
        Error::InconsistentDataType { index, found, expected } => {
            assert_eq!(index, 1);
            assert_eq!(found, DataType::Float32);
            assert_eq!(expected, DataType::UInt16);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(stub.call_count(), 0);
}

#[test]
fn unknown_band_fails_before_any_network_call() {
    let (stub, sc) = three_scene_setup();
    let err = sc.stack("swir1", &ctx(), &StackOptions::default()).unwrap_err();
    assert!(matches!(err, Error::UnknownBand { .. }));
    assert_eq!(stub.call_count(), 0);
}

#[test]
fn bands_axis_zero_is_unsupported() {
    let (stub, sc) = three_scene_setup();
    for axis in [0, -4] {
        let err = sc
            .stack(
                "red",
                &ctx(),
                &StackOptions {
                    bands_axis: axis,
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedAxis { .. }));
    }
    assert_eq!(stub.call_count(), 0);
}

#[test]
fn bands_axis_innermost_relocates_values() {
    let (_, sc) = three_scene_setup();
    let canonical = sc.stack("red alpha", &ctx(), &StackOptions::default()).unwrap();
    let innermost = sc
        .stack(
            "red alpha",
            &ctx(),
            &StackOptions {
                bands_axis: -1,
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(canonical.data.dim(), (3, 2, 3, 4));
    assert_eq!(innermost.data.dim(), (3, 3, 4, 2));
    for scene in 0..3 {
        for band in 0..2 {
            for y in 0..3 {
                for x in 0..4 {
                    assert_eq!(
                        canonical.data[[scene, band, y, x]],
                        innermost.data[[scene, y, x, band]]
                    );
                }
            }
        }
    }
}

#[test]
fn explicit_alpha_must_be_last() {
    let (stub, sc) = three_scene_setup();
    let err = sc
        .stack("alpha red", &ctx(), &StackOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::AlphaNotLast));
    assert_eq!(stub.call_count(), 0);
}

#[test]
fn flatten_mosaics_same_day_scenes_into_one_layer() {
    let stub = Arc::new(
        StubRaster::new((3, 4))
            .add_scene("l8:d1a", (0, 3), &[("red", 10.0), ("alpha", 255.0)])
            .add_scene("l8:d1b", (2, 4), &[("red", 20.0), ("alpha", 255.0)])
            .add_scene("l8:d2", (0, 4), &[("red", 30.0), ("alpha", 255.0)]),
    );
    let sc = collection(
        &stub,
        vec![
            // second day listed first: group order comes from the key, not
            // the collection
            scene_with("l8:d2", "2013-06-02T16:40:00Z", U16, &[("red", None), ("alpha", None)]),
            scene_with("l8:d1a", "2013-05-20T16:41:58Z", U16, &[("red", None), ("alpha", None)]),
            scene_with("l8:d1b", "2013-05-20T16:43:10Z", U16, &[("red", None), ("alpha", None)]),
        ],
    );

    let stack = sc
        .stack(
            "red",
            &ctx(),
            &StackOptions {
                flatten: Some(Box::new(|s| s.acquired_day_key())),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(stack.data.dim(), (2, 1, 3, 4));

    // layer 0 is the May 20 mosaic: d1b overlays d1a in the shared column
    assert_eq!(stack.data[[0, 0, 0, 0]], 10.0);
    assert_eq!(stack.data[[0, 0, 0, 2]], 20.0);
    assert_eq!(stack.data[[0, 0, 0, 3]], 20.0);
    // layer 1 is the June 2 singleton
    assert_eq!(stack.data[[1, 0, 0, 0]], 30.0);

    // two fetches: one mosaic sub-job, one direct scene fetch
    assert_eq!(stub.call_count(), 2);
}

#[test]
fn worker_count_does_not_change_the_result() {
    let (_, sc) = three_scene_setup();
    let parallel = sc.stack("red", &ctx(), &StackOptions::default()).unwrap();
    let serial = sc
        .stack(
            "red",
            &ctx(),
            &StackOptions {
                max_workers: Some(1),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(parallel.data, serial.data);
    assert_eq!(parallel.mask, serial.mask);
}

#[test]
fn unmasked_stack_matches_masked_data() {
    let (_, sc) = three_scene_setup();
    let masked = sc.stack("red", &ctx(), &StackOptions::default()).unwrap();
    let plain = sc
        .stack(
            "red",
            &ctx(),
            &StackOptions {
                mask_nodata: false,
                mask_alpha: false,
                ..Default::default()
            },
        )
        .unwrap();

    assert!(plain.mask.is_none());
    assert_eq!(plain.data, masked.data);
}

#[test]
fn empty_band_string_is_rejected() {
    let (stub, sc) = three_scene_setup();
    let err = sc.stack("  ", &ctx(), &StackOptions::default()).unwrap_err();
    assert!(matches!(err, Error::EmptyBands));
    assert_eq!(stub.call_count(), 0);
}

#[test]
fn failing_layer_aborts_the_stack() {
    let stub = Arc::new(
        StubRaster::new((3, 4)).add_scene("l8:a", (0, 4), &[("red", 10.0), ("alpha", 255.0)]),
    );
    // the second scene is known to the catalog metadata but not the service
    let sc = collection(
        &stub,
        vec![
            scene_with("l8:a", "2013-04-18T16:42:03Z", U16, &[("red", None), ("alpha", None)]),
            scene_with("l8:gone", "2013-05-04T16:42:11Z", U16, &[("red", None), ("alpha", None)]),
        ],
    );

    let err = sc.stack("red", &ctx(), &StackOptions::default()).unwrap_err();
    match err {
        Error::NotFound { ids } => assert_eq!(ids, vec!["l8:gone".to_string()]),
        other => panic!("unexpected error: {other}"),
    }
}
