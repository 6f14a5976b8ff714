//! Obstacle-aware detour pathing.
//!
//! Not a pathfinding graph: a local search that inserts intermediate
//! waypoints around blocking rectangles so a polyline avoids them.
//! Invoked when routes are planned, not per tick. The recursive
//! formulation is implemented with an explicit work stack and an
//! explicit depth limit so worst-case stack usage is bounded and the
//! limit is testable.

use crate::battlefield::{Battlefield, Obstacle};
use crate::math::Vec2;

/// Default bound on nested detours per segment.
pub const DEFAULT_MAX_DEPTH: u32 = 8;

/// Corner candidates sit this far beyond the padded rectangle.
const CORNER_EPS: f32 = 0.5;

/// Work items for the explicit detour stack.
enum Work {
    /// A segment still to be checked for blockers.
    Segment { a: Vec2, b: Vec2, depth: u32 },
    /// A chosen detour point, emitted between its two half-segments.
    Emit(Vec2),
}

/// Compute intermediate detour points so that walking
/// `from → points… → to` avoids all obstacles expanded by `padding`.
///
/// Past `max_depth`, or when no valid corner or edge candidate exists,
/// no further detour is inserted: the caller accepts an imperfect path
/// and per-tick obstacle sliding absorbs the rest.
#[must_use]
pub fn detour(
    from: Vec2,
    to: Vec2,
    field: &Battlefield,
    padding: f32,
    max_depth: u32,
) -> Vec<Vec2> {
    let mut points = Vec::new();
    let mut stack = vec![Work::Segment {
        a: from,
        b: to,
        depth: 0,
    }];

    while let Some(item) = stack.pop() {
        match item {
            Work::Emit(p) => points.push(p),
            Work::Segment { a, b, depth } => {
                if depth >= max_depth {
                    continue;
                }
                let Some(blocker) = first_blocking_obstacle(a, b, &field.obstacles, padding) else {
                    continue;
                };
                let Some(candidate) = pick_candidate(a, b, blocker, field, padding) else {
                    continue;
                };
                // Zero-progress guard: a candidate coinciding with the
                // segment start would recurse forever.
                if candidate.distance_squared(a) < 1e-4 {
                    continue;
                }
                stack.push(Work::Segment {
                    a: candidate,
                    b,
                    depth: depth + 1,
                });
                stack.push(Work::Emit(candidate));
                stack.push(Work::Segment {
                    a,
                    b: candidate,
                    depth: depth + 1,
                });
            }
        }
    }

    points
}

/// Expand a raw waypoint list into a detoured polyline.
#[must_use]
pub fn plan_route(from: Vec2, raw: &[Vec2], field: &Battlefield, padding: f32) -> Vec<Vec2> {
    let mut route = Vec::new();
    let mut cursor = from;
    for &point in raw {
        let clamped = field.clamp_to_bounds(point, padding.max(1.0));
        route.extend(detour(cursor, clamped, field, padding, DEFAULT_MAX_DEPTH));
        route.push(clamped);
        cursor = clamped;
    }
    route
}

/// Among obstacles whose padded rect intersects segment `a`-`b`, pick
/// the one whose center projects earliest along the segment.
fn first_blocking_obstacle<'a>(
    a: Vec2,
    b: Vec2,
    obstacles: &'a [Obstacle],
    padding: f32,
) -> Option<&'a Obstacle> {
    let seg = b - a;
    let len_sq = seg.length_squared();
    let mut best: Option<(&Obstacle, f32)> = None;

    for o in obstacles {
        if !o.rect.expanded(padding).intersects_segment(a, b) {
            continue;
        }
        let t = if len_sq < 1e-9 {
            0.0
        } else {
            ((o.rect.center() - a).dot(seg) / len_sq).clamp(0.0, 1.0)
        };
        match best {
            Some((_, best_t)) if t >= best_t => {}
            _ => best = Some((o, t)),
        }
    }

    best.map(|(o, _)| o)
}

/// Choose the detour candidate minimizing total path length:
/// the four padded corners first, edge midpoints as a fallback.
fn pick_candidate(
    a: Vec2,
    b: Vec2,
    blocker: &Obstacle,
    field: &Battlefield,
    padding: f32,
) -> Option<Vec2> {
    let r = blocker.rect.expanded(padding + CORNER_EPS);
    let corners = [
        Vec2::new(r.x, r.y),
        Vec2::new(r.x + r.w, r.y),
        Vec2::new(r.x, r.y + r.h),
        Vec2::new(r.x + r.w, r.y + r.h),
    ];
    let midpoints = [
        Vec2::new(r.x + r.w * 0.5, r.y),
        Vec2::new(r.x + r.w * 0.5, r.y + r.h),
        Vec2::new(r.x, r.y + r.h * 0.5),
        Vec2::new(r.x + r.w, r.y + r.h * 0.5),
    ];

    best_valid(&corners, a, b, field, padding)
        .or_else(|| best_valid(&midpoints, a, b, field, padding))
}

fn best_valid(
    candidates: &[Vec2],
    a: Vec2,
    b: Vec2,
    field: &Battlefield,
    padding: f32,
) -> Option<Vec2> {
    candidates
        .iter()
        .filter(|&&c| field.in_bounds(c) && !inside_any_padded(c, field, padding))
        .min_by(|&&x, &&y| {
            let lx = a.distance(x) + x.distance(b);
            let ly = a.distance(y) + y.distance(b);
            lx.partial_cmp(&ly).unwrap_or(std::cmp::Ordering::Equal)
        })
        .copied()
}

fn inside_any_padded(p: Vec2, field: &Battlefield, padding: f32) -> bool {
    field
        .obstacles
        .iter()
        .any(|o| o.rect.expanded(padding).contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battlefield::MapConfig;
    use crate::math::Rect;

    fn field_with(obstacles: Vec<Rect>) -> Battlefield {
        let mut field = Battlefield::generate(&MapConfig::default().with_seed(1));
        field.obstacles = obstacles.into_iter().map(|rect| Obstacle { rect }).collect();
        field.elevation_zones.clear();
        field
    }

    /// Walk the full polyline and confirm no leg crosses a padded rect.
    fn polyline_clear(from: Vec2, points: &[Vec2], to: Vec2, field: &Battlefield, pad: f32) -> bool {
        let mut legs = vec![from];
        legs.extend_from_slice(points);
        legs.push(to);
        legs.windows(2).all(|w| {
            field
                .obstacles
                .iter()
                .all(|o| !o.rect.expanded(pad - 0.01).intersects_segment(w[0], w[1]))
        })
    }

    #[test]
    fn test_clear_segment_needs_no_detour() {
        let field = field_with(vec![Rect::new(200.0, 200.0, 40.0, 40.0)]);
        let points = detour(
            Vec2::new(20.0, 20.0),
            Vec2::new(400.0, 20.0),
            &field,
            5.0,
            DEFAULT_MAX_DEPTH,
        );
        assert!(points.is_empty());
    }

    #[test]
    fn test_single_obstacle_produces_clear_route() {
        let field = field_with(vec![Rect::new(200.0, 150.0, 50.0, 60.0)]);
        let from = Vec2::new(100.0, 180.0);
        let to = Vec2::new(380.0, 180.0);
        let points = detour(from, to, &field, 5.0, DEFAULT_MAX_DEPTH);
        assert!(!points.is_empty());
        assert!(polyline_clear(from, &points, to, &field, 5.0));
    }

    #[test]
    fn test_chained_obstacles_route_around_both() {
        let field = field_with(vec![
            Rect::new(160.0, 140.0, 40.0, 80.0),
            Rect::new(260.0, 140.0, 40.0, 80.0),
        ]);
        let from = Vec2::new(100.0, 180.0);
        let to = Vec2::new(380.0, 180.0);
        let points = detour(from, to, &field, 5.0, DEFAULT_MAX_DEPTH);
        assert!(polyline_clear(from, &points, to, &field, 5.0));
    }

    #[test]
    fn test_waypoints_never_inside_padded_rects() {
        let field = field_with(vec![
            Rect::new(150.0, 100.0, 60.0, 60.0),
            Rect::new(250.0, 180.0, 60.0, 60.0),
        ]);
        let points = detour(
            Vec2::new(100.0, 140.0),
            Vec2::new(380.0, 220.0),
            &field,
            6.0,
            DEFAULT_MAX_DEPTH,
        );
        for p in &points {
            for o in &field.obstacles {
                assert!(
                    !o.rect.expanded(6.0).contains(*p),
                    "waypoint {p:?} inside padded {:?}",
                    o.rect
                );
            }
        }
    }

    #[test]
    fn test_depth_limit_zero_returns_truncated_path() {
        let field = field_with(vec![Rect::new(200.0, 150.0, 50.0, 60.0)]);
        let points = detour(
            Vec2::new(100.0, 180.0),
            Vec2::new(380.0, 180.0),
            &field,
            5.0,
            0,
        );
        assert!(points.is_empty());
    }

    #[test]
    fn test_plan_route_keeps_raw_targets() {
        let field = field_with(vec![Rect::new(200.0, 150.0, 50.0, 60.0)]);
        let raw = [Vec2::new(380.0, 180.0), Vec2::new(380.0, 300.0)];
        let route = plan_route(Vec2::new(100.0, 180.0), &raw, &field, 5.0);
        assert!(route.contains(&raw[0]));
        assert!(route.contains(&raw[1]));
    }

    #[test]
    fn test_out_of_bounds_waypoint_clamped() {
        let field = field_with(Vec::new());
        let route = plan_route(
            Vec2::new(100.0, 100.0),
            &[Vec2::new(-500.0, 100.0)],
            &field,
            5.0,
        );
        assert!(route.iter().all(|p| field.in_bounds(*p)));
    }
}
