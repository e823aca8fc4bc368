use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, find_contours};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::geometry::convex_hull;

use crate::config::MergeStrategy;
use crate::error::MeasureError;
use crate::models::{FOREGROUND, Hull, Mask, Point2D};

/// Convex hulls of the outermost contours of `mask`. Holes and anything nested
/// inside them are ignored.
pub fn extract_hulls(mask: &Mask) -> Vec<Hull> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .filter(|c| !c.points.is_empty())
        .map(|c| Hull::new(convex_hull(c.points.as_slice())))
        .collect()
}

fn hulls_close(a: &Hull, b: &Hull, max_distance: f64) -> bool {
    a.min_vertex_distance(b) < max_distance
}

/// Convex hull of the union of several hulls. A lone hull is returned as is.
fn union_hull(mut group: Vec<Hull>) -> Hull {
    if group.len() == 1 {
        return group.remove(0);
    }
    let points: Vec<Point2D> = group.into_iter().flat_map(|h| h.points).collect();
    Hull::new(convex_hull(points.as_slice()))
}

/// Single greedy pass: each seed absorbs the remaining hulls close to the seed
/// itself, and the merged shape is not compared again.
pub fn merge_greedy(hulls: Vec<Hull>, max_distance: f64) -> Vec<Hull> {
    let mut remaining = hulls;
    let mut merged = Vec::new();

    while !remaining.is_empty() {
        let seed = remaining.remove(0);
        let mut group = vec![seed];
        let mut i = 0;
        while i < remaining.len() {
            if hulls_close(&group[0], &remaining[i], max_distance) {
                group.push(remaining.remove(i));
            } else {
                i += 1;
            }
        }
        merged.push(union_hull(group));
    }
    merged
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Lower index becomes the root so cluster order follows input order
            let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[child] = root;
        }
    }
}

/// Clusters hulls connected by any chain of close pairs and builds one hull per cluster.
/// The result does not depend on input order beyond the order of the returned clusters.
pub fn merge_transitive(hulls: Vec<Hull>, max_distance: f64) -> Vec<Hull> {
    let n = hulls.len();
    let mut sets = DisjointSet::new(n);
    for i in 0..n {
        for j in (i + 1)..n {
            if hulls_close(&hulls[i], &hulls[j], max_distance) {
                sets.union(i, j);
            }
        }
    }

    let mut clusters: Vec<(usize, Vec<Hull>)> = Vec::new();
    for (i, hull) in hulls.into_iter().enumerate() {
        let root = sets.find(i);
        match clusters.iter_mut().find(|(r, _)| *r == root) {
            Some((_, group)) => group.push(hull),
            None => clusters.push((root, vec![hull])),
        }
    }
    clusters.into_iter().map(|(_, group)| union_hull(group)).collect()
}

pub fn merge_hulls(hulls: Vec<Hull>, max_distance: f64, strategy: MergeStrategy) -> Vec<Hull> {
    match strategy {
        MergeStrategy::Greedy => merge_greedy(hulls, max_distance),
        MergeStrategy::Transitive => merge_transitive(hulls, max_distance),
    }
}

/// Largest hull by polygon area; the first one wins a tie
pub fn dominant_hull(hulls: Vec<Hull>) -> Result<Hull, MeasureError> {
    let mut best: Option<Hull> = None;
    for hull in hulls {
        let larger = best
            .as_ref()
            .is_none_or(|current| hull.area() > current.area());
        if larger {
            best = Some(hull);
        }
    }
    best.ok_or(MeasureError::EmptyHullSet)
}

/// Mask with the hull interior and boundary set to 255
pub fn fill_hull(hull: &Hull, width: u32, height: u32) -> Mask {
    let mut mask = GrayImage::new(width, height);
    let white = Luma([FOREGROUND]);

    let mut points = hull.points.clone();
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }

    match points.len() {
        0 => {}
        1 => {
            let p = points[0];
            if p.x >= 0 && p.y >= 0 && (p.x as u32) < width && (p.y as u32) < height {
                mask.put_pixel(p.x as u32, p.y as u32, white);
            }
        }
        2 => draw_line_segment_mut(
            &mut mask,
            (points[0].x as f32, points[0].y as f32),
            (points[1].x as f32, points[1].y as f32),
            white,
        ),
        _ => draw_polygon_mut(&mut mask, &points, white),
    }
    mask
}
