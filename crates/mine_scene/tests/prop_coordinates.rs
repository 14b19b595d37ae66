use mine_scene::foundation::math::Vec3;
use mine_scene::scene::{AxisRange, Bounds3, CoordinateTransformer, SpacePosition};
use proptest::prelude::*;

fn approx(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

fn domain_point() -> impl Strategy<Value = Vec3> {
    (800.0f32..=1400.0, 1600.0f32..=2200.0, -50.0f32..=0.0).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

fn arb_range() -> impl Strategy<Value = AxisRange> {
    (-500.0f32..500.0, 50.0f32..500.0).prop_map(|(min, span)| AxisRange::new(min, min + span))
}

fn arb_bounds() -> impl Strategy<Value = Bounds3> {
    (arb_range(), arb_range(), arb_range()).prop_map(|(x, y, z)| Bounds3::new(x, y, z))
}

proptest! {
    // to_domain(to_scene(p)) == p for every in-bounds domain point
    #[test]
    fn round_trip_default_bounds(p in domain_point()) {
        let transformer = CoordinateTransformer::default();
        let back = transformer.to_domain(&transformer.to_scene(&p));
        prop_assert!(approx(back.x, p.x, 1e-2) && approx(back.y, p.y, 1e-2) && approx(back.z, p.z, 1e-2),
            "{:?} -> {:?}", p, back);
    }

    // Same property for arbitrary valid boxes, sampling inside the domain box
    #[test]
    fn round_trip_arbitrary_bounds(domain in arb_bounds(), scene in arb_bounds(), t in (0.0f32..=1.0, 0.0f32..=1.0, 0.0f32..=1.0)) {
        let transformer = CoordinateTransformer::new(domain, scene).unwrap();
        let p = Vec3::new(
            domain.x.min + t.0 * domain.x.span(),
            domain.y.min + t.1 * domain.y.span(),
            domain.z.min + t.2 * domain.z.span(),
        );
        let back = transformer.to_domain(&transformer.to_scene(&p));
        let eps = 2e-2;
        prop_assert!(approx(back.x, p.x, eps) && approx(back.y, p.y, eps) && approx(back.z, p.z, eps));
    }

    // In-bounds domain points land inside the scene box
    #[test]
    fn domain_box_maps_into_scene_box(p in domain_point()) {
        let transformer = CoordinateTransformer::default();
        let s = transformer.to_scene(&p);
        let scene = transformer.scene_bounds();
        let eps = 1e-3;
        prop_assert!(s.x >= scene.x.min - eps && s.x <= scene.x.max + eps);
        prop_assert!(s.y >= scene.y.min - eps && s.y <= scene.y.max + eps);
        prop_assert!(s.z >= scene.z.min - eps && s.z <= scene.z.max + eps);
    }

    // Inference only ever tags in-box points as domain space
    #[test]
    fn inferred_domain_points_are_in_box(x in -500.0f32..2500.0, y in -500.0f32..2500.0, z in -100.0f32..100.0) {
        let transformer = CoordinateTransformer::default();
        let raw = Vec3::new(x, y, z);
        match SpacePosition::infer(raw, &transformer) {
            SpacePosition::Domain(p) => prop_assert!(transformer.is_valid_domain_coordinates(&p)),
            SpacePosition::Scene(p) => prop_assert!(!transformer.is_valid_domain_coordinates(&p)),
        }
    }
}

#[test]
fn midpoint_example() {
    let transformer = CoordinateTransformer::default();
    let scene = transformer.to_scene(&Vec3::new(1100.0, 1900.0, -25.0));
    assert!(approx(scene.x, 0.0, 1e-4));
    assert!(approx(scene.y, -12.5, 1e-4));
    assert!(approx(scene.z, 0.0, 1e-4));
}
