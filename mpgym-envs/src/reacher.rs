//! Planar kinematics of an n-link arm with unit links.
use ndarray::Array1;

/// Base, joints and end effector of the arm, `n_links + 1` points.
pub(crate) fn link_points(angles: &Array1<f64>) -> Vec<[f64; 2]> {
    let mut points = Vec::with_capacity(angles.len() + 1);
    let (mut x, mut y, mut cumulative) = (0.0, 0.0, 0.0);
    points.push([x, y]);
    for a in angles.iter() {
        cumulative += a;
        x += cumulative.cos();
        y += cumulative.sin();
        points.push([x, y]);
    }
    points
}

pub(crate) fn end_effector(angles: &Array1<f64>) -> [f64; 2] {
    let points = link_points(angles);
    points[points.len() - 1]
}

pub(crate) fn distance(p: [f64; 2], q: [f64; 2]) -> f64 {
    ((p[0] - q[0]).powi(2) + (p[1] - q[1]).powi(2)).sqrt()
}

/// Whether two non-adjacent links cross each other.
pub(crate) fn self_collision(points: &[[f64; 2]]) -> bool {
    let n = points.len().saturating_sub(1);
    for i in 0..n {
        for j in i + 2..n {
            if segments_intersect(points[i], points[i + 1], points[j], points[j + 1]) {
                return true;
            }
        }
    }
    false
}

fn orientation(p: [f64; 2], q: [f64; 2], r: [f64; 2]) -> f64 {
    (q[0] - p[0]) * (r[1] - p[1]) - (q[1] - p[1]) * (r[0] - p[0])
}

fn segments_intersect(p1: [f64; 2], p2: [f64; 2], q1: [f64; 2], q2: [f64; 2]) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

/// `per_link` points evenly spaced along every link, the base excluded and
/// each joint included.
pub(crate) fn points_along_links(points: &[[f64; 2]], per_link: usize) -> Vec<[f64; 2]> {
    points
        .windows(2)
        .flat_map(|w| {
            let (p, q) = (w[0], w[1]);
            (1..=per_link).map(move |k| {
                let f = k as f64 / per_link as f64;
                [p[0] + f * (q[0] - p[0]), p[1] + f * (q[1] - p[1])]
            })
        })
        .collect()
}

/// Rejection sampling inside the disc of radius `radius` around the base.
pub(crate) fn sample_in_disc(rng: &mut fastrand::Rng, radius: f64) -> [f64; 2] {
    loop {
        let p = [
            radius * (2.0 * rng.f64() - 1.0),
            radius * (2.0 * rng.f64() - 1.0),
        ];
        if distance(p, [0.0, 0.0]) <= radius {
            return p;
        }
    }
}
