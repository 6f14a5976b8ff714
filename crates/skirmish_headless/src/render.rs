//! ASCII battlefield rendering for terminal inspection.
//!
//! Downsamples the battlefield onto a character grid: obstacles `#`,
//! elevation `^`, blue units `B`, red units `R`, projectiles `*`.
//! Units draw over terrain, projectiles over everything.

use std::fmt::Write;

use skirmish_core::battle::Battle;
use skirmish_core::math::Vec2;
use skirmish_core::units::Team;

/// Rendering options.
#[derive(Debug, Clone, Copy)]
pub struct RenderConfig {
    /// Grid width in characters.
    pub width: usize,
    /// Grid height in characters.
    pub height: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 80,
            height: 24,
        }
    }
}

/// Render the current battle state as a bordered ASCII grid with a
/// one-line status footer.
#[must_use]
pub fn render_ascii(battle: &Battle, config: &RenderConfig) -> String {
    let field = battle.map_data();
    let map_w = field.config.width;
    let map_h = field.config.height;
    let mut grid = vec![vec![' '; config.width]; config.height];

    let to_cell = |pos: Vec2| -> Option<(usize, usize)> {
        if pos.x < 0.0 || pos.y < 0.0 || pos.x >= map_w || pos.y >= map_h {
            return None;
        }
        let cx = ((pos.x / map_w) * config.width as f32) as usize;
        let cy = ((pos.y / map_h) * config.height as f32) as usize;
        Some((cx.min(config.width - 1), cy.min(config.height - 1)))
    };

    // Terrain: sample each cell's center against the rectangles.
    for (cy, row) in grid.iter_mut().enumerate() {
        for (cx, cell) in row.iter_mut().enumerate() {
            let center = Vec2::new(
                (cx as f32 + 0.5) / config.width as f32 * map_w,
                (cy as f32 + 0.5) / config.height as f32 * map_h,
            );
            if field.obstacles.iter().any(|o| o.rect.contains(center)) {
                *cell = '#';
            } else if field
                .elevation_zones
                .iter()
                .any(|z| z.rect.contains(center))
            {
                *cell = '^';
            }
        }
    }

    for id in battle.units().sorted_ids() {
        let Some(unit) = battle.units().get(id) else { continue };
        let Some((cx, cy)) = to_cell(unit.pos) else { continue };
        grid[cy][cx] = match (unit.team, unit.alive) {
            (Team::Blue, true) => 'B',
            (Team::Blue, false) => 'b',
            (Team::Red, true) => 'R',
            (Team::Red, false) => 'r',
        };
    }

    for projectile in battle.projectiles() {
        if let Some((cx, cy)) = to_cell(projectile.pos) {
            grid[cy][cx] = '*';
        }
    }

    let mut out = String::new();
    let border: String = "-".repeat(config.width);
    let _ = writeln!(out, "+{border}+");
    for row in &grid {
        let line: String = row.iter().collect();
        let _ = writeln!(out, "|{line}|");
    }
    let _ = writeln!(out, "+{border}+");
    let _ = writeln!(
        out,
        "phase={:?} round={} blue={} red={} shots={}",
        battle.phase(),
        battle.round(),
        battle.alive_count(Team::Blue),
        battle.alive_count(Team::Red),
        battle.projectiles().len()
    );
    out
}
