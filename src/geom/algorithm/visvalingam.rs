use std::{cmp::Ordering, collections::BinaryHeap};

use geo::{Coord, LineString};

#[inline]
fn triangle_area(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>) -> f64 {
    ((b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)).abs() * 0.5
}

/// Reduce a closed ring to at most `max_points` of its most significant vertices.
/// Corners are dropped flattest first (Visvalingam-Whyatt), re-measuring the
/// neighbors of each dropped corner, so the sampled vertices outline the footprint.
/// Returned vertices are in ring order, without the closing duplicate.
pub fn significant_vertices(ring: &LineString<f64>, max_points: usize) -> Vec<Coord<f64>> {
    let mut points = ring.0.clone();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    let max_points = max_points.max(1);
    if points.len() <= max_points || points.len() < 3 { return points }

    let count = points.len();
    let mut before: Vec<usize> = (0..count).map(|i| (i + count - 1) % count).collect();
    let mut after: Vec<usize> = (0..count).map(|i| (i + 1) % count).collect();
    let mut kept = vec![true; count];
    // Bumped whenever a vertex's neighbors change; older queue entries for it are stale.
    let mut generation: Vec<u32> = vec![0; count];

    #[derive(Copy, Clone, Eq, PartialEq)]
    struct Ear {
        area_bits: u64, // non-negative f64 bits sort like the value
        vertex: usize,
        generation: u32,
    }

    impl Ord for Ear {
        fn cmp(&self, other: &Self) -> Ordering {
            other.area_bits.cmp(&self.area_bits)
                .then_with(|| other.generation.cmp(&self.generation))
                .then_with(|| other.vertex.cmp(&self.vertex))
        }
    }

    impl PartialOrd for Ear {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
    }

    let ear = |vertex: usize, before: &[usize], after: &[usize], generation: u32| Ear {
        area_bits: triangle_area(points[before[vertex]], points[vertex], points[after[vertex]]).to_bits(),
        vertex,
        generation,
    };

    let mut queue: BinaryHeap<Ear> = (0..count).map(|i| ear(i, &before, &after, 0)).collect();

    // Drop the flattest corner until only `max_points` remain.
    let mut remaining = count;
    while remaining > max_points {
        let Some(Ear { vertex, generation: seen, .. }) = queue.pop() else { break };
        if !kept[vertex] || generation[vertex] != seen { continue }

        kept[vertex] = false;
        remaining -= 1;

        let (left, right) = (before[vertex], after[vertex]);
        after[left] = right;
        before[right] = left;

        for neighbor in [left, right] {
            if kept[neighbor] {
                generation[neighbor] = generation[neighbor].wrapping_add(1);
                queue.push(ear(neighbor, &before, &after, generation[neighbor]));
            }
        }
    }

    points.iter().zip(kept).filter_map(|(p, keep)| keep.then_some(*p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    #[test]
    fn keeps_corners_of_densified_square() {
        // Square with extra collinear points along every edge.
        let ring = line_string![
            (x: 0.0, y: 0.0), (x: 5.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 5.0),
            (x: 10.0, y: 10.0), (x: 5.0, y: 10.0), (x: 0.0, y: 10.0), (x: 0.0, y: 5.0), (x: 0.0, y: 0.0),
        ];
        let kept = significant_vertices(&ring, 4);
        assert_eq!(kept, vec![
            Coord { x: 0.0, y: 0.0 }, Coord { x: 10.0, y: 0.0 },
            Coord { x: 10.0, y: 10.0 }, Coord { x: 0.0, y: 10.0 },
        ]);
    }

    #[test]
    fn short_rings_are_returned_whole() {
        let ring = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 0.0, y: 1.0), (x: 0.0, y: 0.0)];
        assert_eq!(significant_vertices(&ring, 8).len(), 3);
    }
}
