// Unit tests for the gradient pipeline.
//
// Exercises the full thresholds → control points → color scale → score
// color path as the widget uses it, across threshold configurations the
// function-level tests don't cover.

use litmus::gradient::{
    adjusted_control_points, build_color_scale, interpolate_color, Rgb, GRADIENT_POINT_COUNT,
};

fn anchors() -> [Rgb; 3] {
    [
        Rgb { r: 0x25, g: 0xc1, b: 0xf9 },
        Rgb { r: 0x7c, g: 0x4d, b: 0xff },
        Rgb { r: 0xd4, g: 0x00, b: 0xf9 },
    ]
}

fn scale_for(thresholds: [f64; 3]) -> Vec<Rgb> {
    let points = adjusted_control_points(GRADIENT_POINT_COUNT, thresholds);
    build_color_scale(anchors(), points, GRADIENT_POINT_COUNT)
}

// ============================================================
// Control point adjustment across threshold grids
// ============================================================

#[test]
fn control_points_are_strictly_increasing_for_any_ordered_thresholds() {
    let grids = [
        [0.0, 0.4, 0.7],
        [0.1, 0.5, 0.8],
        [0.0, 0.001, 0.002],
        [0.998, 0.999, 1.0],
        [0.499, 0.5, 0.501],
        [0.33, 0.66, 0.99],
    ];
    for thresholds in grids {
        let points = adjusted_control_points(GRADIENT_POINT_COUNT, thresholds);
        assert!(
            points[0] < points[1] && points[1] < points[2],
            "thresholds {thresholds:?} gave {points:?}"
        );
    }
}

#[test]
fn control_points_near_one_are_pulled_below_the_cap() {
    // All three floor to 100 after clipping; the backward pass spreads them
    let points = adjusted_control_points(GRADIENT_POINT_COUNT, [1.0, 1.0, 1.0]);
    assert_eq!(points, [98, 99, 100]);
}

// ============================================================
// Scale shape under unusual thresholds
// ============================================================

#[test]
fn scale_is_entirely_the_last_anchor_when_all_points_are_negative_or_zero() {
    let scale = scale_for([0.0, 0.001, 0.002]);
    // Control points [-2, -1, 0]: every index from 0 up clamps to the
    // last anchor.
    assert!(scale.iter().all(|c| *c == anchors()[2]));
}

#[test]
fn scale_start_is_flat_until_the_first_control_point() {
    let scale = scale_for([0.1, 0.5, 0.8]);
    for (i, color) in scale.iter().take(11).enumerate() {
        assert_eq!(*color, anchors()[0], "index {i}");
    }
    assert_ne!(scale[11], anchors()[0]);
}

#[test]
fn scale_midpoint_between_anchors_is_their_blend() {
    let scale = scale_for([0.0, 0.4, 0.8]);
    // Index 20 is halfway between control points 0 and 40
    assert_eq!(scale[20], Rgb::lerp(anchors()[0], anchors()[1], 0.5));
    // Index 60 is halfway between control points 40 and 80
    assert_eq!(scale[60], Rgb::lerp(anchors()[1], anchors()[2], 0.5));
}

// ============================================================
// Score → color as the widget computes it
// ============================================================

#[test]
fn threshold_scores_land_on_their_anchor_colors() {
    let scale = scale_for([0.1, 0.5, 0.8]);
    assert_eq!(interpolate_color(0.1, &scale), anchors()[0]);
    assert_eq!(interpolate_color(0.5, &scale), anchors()[1]);
    assert_eq!(interpolate_color(0.8, &scale), anchors()[2]);
}

#[test]
fn colors_vary_monotonically_in_the_red_channel_for_default_anchors() {
    // The default anchors increase in red from first to last, so the ramp
    // should never decrease in red as the score rises.
    let scale = scale_for([0.0, 0.4, 0.7]);
    let mut previous = interpolate_color(0.0, &scale).r;
    for step in 1..=100 {
        let color = interpolate_color(step as f64 / 100.0, &scale);
        assert!(color.r >= previous, "red dipped at step {step}");
        previous = color.r;
    }
}

#[test]
fn empty_scale_yields_black() {
    assert_eq!(interpolate_color(0.5, &[]), Rgb::default());
}
