use approx::assert_abs_diff_eq;
use flame_interp::{
    align, export_frames_json, parse_keyframes_json, AttributeKey, CurveConfig, CurveKind,
    GlobalAttr, InterpConfig, InterpState, Interpolator, Variation, Xform, XformAttr,
};
use flame_test_fixtures::keyframes;

fn load(name: &str) -> Interpolator {
    let json = keyframes::json(name).expect("fixture available");
    parse_keyframes_json(&json)
        .expect("fixture parses")
        .into_interpolator(InterpConfig::default())
        .expect("valid config")
}

#[test]
fn every_fixture_builds_frames() {
    for name in keyframes::keys() {
        let mut interp = load(&name);
        let expected = interp.length().expect("two or more keyframes");
        let frames = interp.build_frames().unwrap();
        assert_eq!(frames.len(), expected, "{name}");
    }
}

#[test]
fn two_vs_four_alignment_fades_in_new_transforms() {
    let mut interp = load("two-vs-four");
    let alignment = interp.align().unwrap().clone();
    assert_eq!(alignment.xform_count(), 4);
    assert_eq!(alignment.pads, 2);

    let first = &alignment.genomes[0];
    assert_eq!(first.xforms[2].weight, 0.0);
    assert_eq!(first.xforms[3].weight, 0.0);
    // Spherical counterpart: pad uses inverse linear.
    assert_eq!(first.xforms[2].variation(Variation::Linear).unwrap().weight, -1.0);
    // Blob counterpart: blob replaces linear.
    assert!(first.xforms[3].variation(Variation::Blob).is_some());

    let frames = interp.build_frames().unwrap();
    assert_eq!(frames.len(), 20);
    assert_eq!(frames[0].xforms.len(), 2);
    assert_eq!(frames[10].xforms.len(), 4);
    assert_abs_diff_eq!(frames[10].brightness, 4.0, epsilon = 1e-9);
}

#[test]
fn alignment_is_idempotent() {
    let set = parse_keyframes_json(&keyframes::json("looping-trio").unwrap()).unwrap();
    let genomes: Vec<_> = set.keyframes.into_iter().map(|k| k.genome).collect();
    let once = align(&genomes, true).unwrap();
    let twice = align(&once.genomes, true).unwrap();
    assert_eq!(twice.pads, 0);
    assert_eq!(twice.genomes, once.genomes);
    assert_eq!(twice.variations, once.variations);
}

#[test]
fn looping_fixture_returns_to_the_first_keyframe() {
    let mut interp = load("looping-trio");
    assert!(interp.is_looping());
    assert_eq!(interp.length(), Some(36));
    interp.build_timelines().unwrap();

    let rotate = interp
        .timeline(&AttributeKey::from(GlobalAttr::Rotate))
        .unwrap();
    assert_eq!(rotate.sample(36).unwrap(), rotate.sample(0).unwrap());

    let frames = interp.build_frames().unwrap();
    assert_abs_diff_eq!(frames[12].rotate, 90.0, epsilon = 1e-9);
    assert_abs_diff_eq!(frames[24].rotate, 45.0, epsilon = 1e-9);
}

#[test]
fn explicit_times_set_segment_lengths() {
    let mut interp = load("explicit-times");
    assert_eq!(interp.keyframe_times(), vec![0, 30, 40]);
    let frames = interp.build_frames().unwrap();
    assert_eq!(frames.len(), 40);
    assert_abs_diff_eq!(frames[30].gamma, 5.0, epsilon = 1e-9);
    assert_abs_diff_eq!(frames[15].gamma, 3.5, epsilon = 1e-9);
}

#[test]
fn per_attribute_edits_only_touch_their_timeline() {
    let mut interp = load("explicit-times");
    let baseline = interp.build_frames().unwrap().to_vec();

    let key = AttributeKey::from(GlobalAttr::Gamma);
    interp
        .set_curve(&key, 1, CurveConfig::new(CurveKind::Par))
        .unwrap();
    assert_eq!(interp.state(), InterpState::TimelinesBuilt);
    let edited = interp.build_frames().unwrap();

    assert!(edited[15].gamma < baseline[15].gamma);
    assert_eq!(edited[15].xforms, baseline[15].xforms);
    assert_eq!(edited[35].gamma, baseline[35].gamma);

    let weight = AttributeKey::xform(0, XformAttr::Weight);
    assert!(interp.timeline(&weight).is_ok());
    assert!(interp
        .timeline(&AttributeKey::xform(3, XformAttr::Weight))
        .is_err());
}

#[test]
fn frames_export_in_keyframe_schema() {
    let mut interp = load("two-vs-four");
    let frames = interp.build_frames().unwrap();
    let json = export_frames_json(frames);
    let exported = json["frames"].as_array().unwrap();
    assert_eq!(exported.len(), 20);

    let reparsed = parse_keyframes_json(
        &serde_json::json!({
            "keyframes": exported
                .iter()
                .map(|g| serde_json::json!({ "genome": g }))
                .collect::<Vec<_>>()
        })
        .to_string(),
    )
    .unwrap();
    assert_eq!(reparsed.keyframes[5].genome, frames[5]);
}

#[test]
fn keyframe_edits_discard_timeline_edits() {
    let mut interp = load("explicit-times");
    let key = AttributeKey::from(GlobalAttr::Gamma);
    interp
        .set_curve(&key, 1, CurveConfig::new(CurveKind::Npar))
        .unwrap();
    interp
        .update_keyframe(2, flame_interp::Genome::with_xforms(vec![Xform::linear(1.0)]))
        .unwrap();
    assert_eq!(interp.state(), InterpState::Uninitialized);
    interp.build_timelines().unwrap();
    assert_eq!(
        interp.timeline(&key).unwrap().segment(1).unwrap().curve,
        CurveConfig::default()
    );
}

#[test]
fn rebuilding_untouched_timelines_reproduces_frames() {
    for name in ["looping-trio", "explicit-times"] {
        let mut interp = load(name);
        let key = AttributeKey::from(GlobalAttr::Gamma);
        interp
            .set_curve(&key, 1, CurveConfig::new(CurveKind::Hcos))
            .unwrap();
        let before = interp.build_frames().unwrap().to_vec();

        interp.timeline_mut(&key).unwrap();
        assert_eq!(interp.state(), InterpState::TimelinesBuilt);
        assert!(interp.frames().is_empty());

        let after = interp.build_frames().unwrap();
        assert_eq!(after, before.as_slice(), "{name}");
    }
}
