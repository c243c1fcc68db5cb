use super::*;
use nalgebra::vector;

fn unit_box(lo: f64, hi: f64) -> Polytope {
    Polytope::from_box(&Aabb::new(vector![lo, lo, lo], vector![hi, hi, hi]))
}

#[test]
fn box_rows_follow_face_order() {
    let b = Aabb::new(vector![-1.0, -2.0, -3.0], vector![1.0, 2.0, 3.0]);
    let rows = b.halfplanes();
    assert_eq!(rows[0].coeffs(), [1.0, 0.0, 0.0, -1.0]);
    assert_eq!(rows[1].coeffs(), [-1.0, 0.0, 0.0, -1.0]);
    assert_eq!(rows[3].coeffs(), [0.0, -1.0, 0.0, -2.0]);
    assert_eq!(rows[5].coeffs(), [0.0, 0.0, -1.0, -3.0]);
    assert!(b.contains_strict(&vector![0.0, 0.0, 0.0]));
    assert!(!b.contains_strict(&vector![1.0, 0.0, 0.0]));
}

#[test]
fn window_is_padded_and_clipped() {
    let low = vector![0.0, 0.0, -0.1];
    let high = vector![10.0, 10.0, 0.1];
    let b = Aabb::around_segment(&vector![1.0, 5.0, 0.0], &vector![4.0, 6.0, 0.0], 2.0, &low, &high);
    assert_eq!(b.lo, vector![0.0, 3.0, -0.1]);
    assert_eq!(b.hi, vector![6.0, 8.0, 0.1]);
    assert!(!b.is_empty());

    // Start outside the map: clipped window has no interior.
    let out = Aabb::around_segment(&vector![20.0, 5.0, 0.0], &vector![20.0, 5.0, 0.0], 2.0, &low, &high);
    assert!(out.is_empty());
}

#[test]
fn membership_and_near_active_counts() {
    let p = unit_box(0.0, 1.0);
    assert!(p.contains_eps(&vector![0.5, 0.5, 0.5], 0.0));
    assert!(p.contains_eps(&vector![1.0, 0.5, 0.5], 0.0));
    assert!(!p.contains_eps(&vector![1.0, 0.5, 0.5], -1e-6));
    // Corner touches three faces.
    assert_eq!(p.count_near_active(&vector![1.0, 1.0, 1.0], 1e-6), 3);
    assert_eq!(p.count_near_active(&vector![0.5, 0.5, 0.5], 1e-6), 0);
    assert!((p.max_violation(&vector![1.5, 0.5, 0.5]) - 0.5).abs() < 1e-12);
}

#[test]
fn vertices_of_cube() {
    let p = unit_box(-1.0, 1.0);
    let v = p.vertices(&GeomCfg::default());
    assert_eq!(v.len(), 8);
    for x in v {
        assert!((x.abs() - vector![1.0, 1.0, 1.0]).norm() < 1e-9);
    }
}

#[test]
fn overlap_respects_depth() {
    let cfg = GeomCfg::default();
    let a = Polytope::from_box(&Aabb::new(vector![0.0, -1.0, -1.0], vector![2.0, 1.0, 1.0]));
    let b = Polytope::from_box(&Aabb::new(vector![1.5, -1.0, -1.0], vector![4.0, 1.0, 1.0]));
    let c = Polytope::from_box(&Aabb::new(vector![2.5, -1.0, -1.0], vector![4.0, 1.0, 1.0]));
    // Shared slab x ∈ [1.5, 2] has half-width 0.25.
    assert!(a.overlaps(&b, 0.01, &cfg));
    assert!(a.overlaps(&b, 0.2, &cfg));
    assert!(!a.overlaps(&b, 0.3, &cfg));
    assert!(b.overlaps(&a, 0.01, &cfg));
    assert!(!a.overlaps(&c, 0.0, &cfg));
}

#[test]
fn interior_point_has_depth() {
    let cfg = GeomCfg::default();
    let a = Polytope::from_box(&Aabb::new(vector![0.0, 0.0, 0.0], vector![4.0, 2.0, 2.0]));
    let b = Polytope::from_box(&Aabb::new(vector![3.0, 0.0, 0.0], vector![6.0, 2.0, 2.0]));
    let x = a.intersect(&b).interior_point(0.1, &cfg).unwrap();
    assert!((x - vector![3.5, 1.0, 1.0]).norm() < 1e-9);
    assert!(a.contains_eps(&x, -0.1 + 1e-9));
    assert!(b.contains_eps(&x, -0.1 + 1e-9));
}

#[test]
fn closest_point_clamps_to_segment() {
    let a = vector![0.0, 0.0, 0.0];
    let b = vector![2.0, 0.0, 0.0];
    assert_eq!(closest_on_segment(&a, &b, &vector![1.0, 3.0, 0.0]), vector![1.0, 0.0, 0.0]);
    assert_eq!(closest_on_segment(&a, &b, &vector![5.0, 1.0, 0.0]), b);
    assert_eq!(closest_on_segment(&a, &a, &vector![5.0, 1.0, 0.0]), a);
}

#[test]
fn normalized_shift_moves_plane_inward() {
    let h = Halfplane::from_coeffs(2.0, 0.0, 0.0, -2.0); // x <= 1
    let n = h.normalized().unwrap();
    assert!((n.d + 1.0).abs() < 1e-12);
    let s = n.shifted(0.25); // x <= 0.75
    assert!(s.satisfies_eps(&vector![0.75, 0.0, 0.0], 1e-12));
    assert!(!s.satisfies_eps(&vector![0.8, 0.0, 0.0], 0.0));
    assert!(Halfplane::from_coeffs(0.0, 0.0, 0.0, 1.0).normalized().is_none());
}
