//! Battlefield generation: obstacles, elevation zones, spawn zones.
//!
//! Generated once per battle (or per wave) from a seeded config and
//! treated as read-only by the simulation. Mirrored mode reflects
//! every feature across the vertical map midline for fair layouts.

use serde::{Deserialize, Serialize};

use crate::math::{Rect, Vec2};
use crate::rng::BattleRng;
use crate::units::Team;

/// A static impassable rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Footprint in map coordinates.
    pub rect: Rect,
}

/// A terrain region granting a stacking ranged-attack bonus to occupants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationZone {
    /// Footprint in map coordinates.
    pub rect: Rect,
}

/// Symmetry mode for battlefield generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SymmetryMode {
    /// Unmirrored layout (PvE or scripted scenarios).
    None,
    /// Left-right mirror across the vertical midline (fair 1v1).
    #[default]
    Mirrored,
}

/// Battlefield generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Map width in world units.
    pub width: f32,
    /// Map height in world units.
    pub height: f32,
    /// Symmetry mode for fair layouts.
    pub symmetry: SymmetryMode,
    /// Number of obstacle features (doubled when mirrored).
    pub obstacle_count: u32,
    /// Number of elevation zones (doubled when mirrored).
    pub elevation_count: u32,
    /// Width of each side's spawn strip.
    pub spawn_depth: f32,
    /// Random seed for deterministic generation.
    pub seed: u64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 480.0,
            height: 360.0,
            symmetry: SymmetryMode::Mirrored,
            obstacle_count: 5,
            elevation_count: 2,
            spawn_depth: 90.0,
            seed: 12345,
        }
    }
}

impl MapConfig {
    /// Set the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the symmetry mode.
    #[must_use]
    pub const fn with_symmetry(mut self, symmetry: SymmetryMode) -> Self {
        self.symmetry = symmetry;
        self
    }

    /// Set the obstacle feature count.
    #[must_use]
    pub const fn with_obstacle_count(mut self, count: u32) -> Self {
        self.obstacle_count = count;
        self
    }
}

/// Generated battlefield, immutable for the battle's duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Battlefield {
    /// Configuration the field was generated from.
    pub config: MapConfig,
    /// Impassable rectangles.
    pub obstacles: Vec<Obstacle>,
    /// Range-bonus zones (stack additively by overlap count).
    pub elevation_zones: Vec<ElevationZone>,
}

impl Battlefield {
    /// Generate a battlefield from config.
    #[must_use]
    pub fn generate(config: &MapConfig) -> Self {
        let mut rng = BattleRng::new(config.seed);
        let mut field = Self {
            config: config.clone(),
            obstacles: Vec::new(),
            elevation_zones: Vec::new(),
        };

        let obstacles = field.generate_rects(
            &mut rng,
            config.obstacle_count,
            (18.0, 55.0),
            (18.0, 55.0),
        );
        field.obstacles = obstacles.into_iter().map(|rect| Obstacle { rect }).collect();

        let zones = field.generate_rects(
            &mut rng,
            config.elevation_count,
            (40.0, 90.0),
            (40.0, 90.0),
        );
        field.elevation_zones = zones
            .into_iter()
            .map(|rect| ElevationZone { rect })
            .collect();

        field
    }

    /// Generate `count` feature rectangles outside the spawn strips,
    /// mirroring each across the vertical midline when configured.
    fn generate_rects(
        &self,
        rng: &mut BattleRng,
        count: u32,
        w_range: (f32, f32),
        h_range: (f32, f32),
    ) -> Vec<Rect> {
        let mut rects = Vec::new();
        let margin = 8.0;
        let keep_out = [
            self.spawn_zone(Team::Blue).expanded(margin),
            self.spawn_zone(Team::Red).expanded(margin),
        ];

        // Bounded attempts per feature so a dense config cannot spin forever.
        for _ in 0..count {
            for _attempt in 0..20 {
                let w = rng.range(w_range.0, w_range.1);
                let h = rng.range(h_range.0, h_range.1);
                let (x_lo, x_hi) = match self.config.symmetry {
                    // Generate on the left half, mirror to the right.
                    SymmetryMode::Mirrored => (margin, self.config.width * 0.5 - w),
                    SymmetryMode::None => (margin, self.config.width - w - margin),
                };
                if x_hi <= x_lo {
                    continue;
                }
                let rect = Rect::new(
                    rng.range(x_lo, x_hi),
                    rng.range(margin, self.config.height - h - margin),
                    w,
                    h,
                );
                if keep_out.iter().any(|z| z.intersects_rect(&rect)) {
                    continue;
                }
                match self.config.symmetry {
                    SymmetryMode::Mirrored => {
                        let mirrored =
                            Rect::new(self.config.width - rect.x - rect.w, rect.y, rect.w, rect.h);
                        if keep_out.iter().any(|z| z.intersects_rect(&mirrored)) {
                            continue;
                        }
                        rects.push(rect);
                        rects.push(mirrored);
                    }
                    SymmetryMode::None => rects.push(rect),
                }
                break;
            }
        }

        rects
    }

    /// Spawn strip for a team: blue on the left edge, red on the right.
    #[must_use]
    pub fn spawn_zone(&self, team: Team) -> Rect {
        let depth = self.config.spawn_depth;
        match team {
            Team::Blue => Rect::new(0.0, 0.0, depth, self.config.height),
            Team::Red => Rect::new(self.config.width - depth, 0.0, depth, self.config.height),
        }
    }

    /// Number of elevation zones containing a point (stacking bonus count).
    #[must_use]
    pub fn elevation_overlap_count(&self, pos: Vec2) -> usize {
        self.elevation_zones
            .iter()
            .filter(|z| z.rect.contains(pos))
            .count()
    }

    /// Clamp a position so a circle of `radius` stays inside map bounds.
    #[must_use]
    pub fn clamp_to_bounds(&self, pos: Vec2, radius: f32) -> Vec2 {
        Vec2::new(
            pos.x.clamp(radius, self.config.width - radius),
            pos.y.clamp(radius, self.config.height - radius),
        )
    }

    /// Whether a point is inside map bounds.
    #[must_use]
    pub fn in_bounds(&self, pos: Vec2) -> bool {
        pos.x >= 0.0 && pos.x <= self.config.width && pos.y >= 0.0 && pos.y <= self.config.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirrored_features_reflect_across_midline() {
        let config = MapConfig::default().with_seed(77);
        let field = Battlefield::generate(&config);
        let mid = config.width;

        for zones in [
            field.obstacles.iter().map(|o| o.rect).collect::<Vec<_>>(),
            field
                .elevation_zones
                .iter()
                .map(|z| z.rect)
                .collect::<Vec<_>>(),
        ] {
            for rect in &zones {
                let mirrored = Rect::new(mid - rect.x - rect.w, rect.y, rect.w, rect.h);
                let found = zones.iter().any(|other| {
                    (other.x - mirrored.x).abs() < 0.01
                        && (other.y - mirrored.y).abs() < 0.01
                        && (other.w - mirrored.w).abs() < 0.01
                        && (other.h - mirrored.h).abs() < 0.01
                });
                assert!(found, "no mirror partner for {rect:?}");
            }
        }
    }

    #[test]
    fn test_features_avoid_spawn_zones() {
        let field = Battlefield::generate(&MapConfig::default().with_seed(3));
        let blue = field.spawn_zone(Team::Blue);
        let red = field.spawn_zone(Team::Red);
        for o in &field.obstacles {
            assert!(!o.rect.intersects_rect(&blue));
            assert!(!o.rect.intersects_rect(&red));
        }
    }

    #[test]
    fn test_same_seed_same_field() {
        let a = Battlefield::generate(&MapConfig::default().with_seed(5));
        let b = Battlefield::generate(&MapConfig::default().with_seed(5));
        assert_eq!(a.obstacles.len(), b.obstacles.len());
        for (x, y) in a.obstacles.iter().zip(&b.obstacles) {
            assert_eq!(x.rect, y.rect);
        }
    }

    #[test]
    fn test_elevation_overlap_counts_stack() {
        let mut field = Battlefield::generate(&MapConfig::default().with_seed(1));
        field.elevation_zones = vec![
            ElevationZone {
                rect: Rect::new(100.0, 100.0, 60.0, 60.0),
            },
            ElevationZone {
                rect: Rect::new(120.0, 120.0, 60.0, 60.0),
            },
        ];
        assert_eq!(field.elevation_overlap_count(Vec2::new(130.0, 130.0)), 2);
        assert_eq!(field.elevation_overlap_count(Vec2::new(105.0, 105.0)), 1);
        assert_eq!(field.elevation_overlap_count(Vec2::new(10.0, 10.0)), 0);
    }

    #[test]
    fn test_clamp_to_bounds() {
        let field = Battlefield::generate(&MapConfig::default());
        let p = field.clamp_to_bounds(Vec2::new(-20.0, 1000.0), 7.0);
        assert_eq!(p, Vec2::new(7.0, field.config.height - 7.0));
    }
}
