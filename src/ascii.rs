//! ASCII rendering for zones
//!
//! Renders a zone as plain or ANSI-colored text and writes text snapshots.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::tilemap::Coord;
use crate::zone::{Tile, TileKind, Zone};

/// Glyph for unexplored tiles when fog is on.
pub const FOG_CHAR: char = ' ';

/// Character for a bare tile, ignoring markers and content.
pub fn tile_char(tile: &Tile) -> char {
    tile.kind().symbol()
}

/// Character for one cell of a zone.
///
/// Precedence: player, exploration target, fog, content, terrain. Spent
/// content (harvested nodes, defeated entities, opened chests) is drawn as
/// plain floor.
pub fn cell_char(zone: &Zone, c: Coord, fog: bool) -> char {
    let Some(tile) = zone.tile(c) else {
        return FOG_CHAR;
    };
    if tile.has_player() {
        return '@';
    }
    if tile.is_active_explore() {
        return '?';
    }
    if fog && !tile.is_explored() && tile.kind() != TileKind::Locked {
        return FOG_CHAR;
    }
    if let Some(instance) = zone.content_at(c) {
        if !instance.state.is_spent(instance.kind) {
            return instance.kind.glyph();
        }
    }
    tile_char(tile)
}

/// Render the zone, one line per row.
///
/// With `fog` set, tiles the player has not explored are blank. Gates stay
/// visible so the locked region is always discoverable.
pub fn render_zone(zone: &Zone, fog: bool) -> String {
    let mut result = String::with_capacity((zone.width() + 1) * zone.height());
    for y in 0..zone.height() {
        for x in 0..zone.width() {
            result.push(cell_char(zone, Coord::new(x, y), fog));
        }
        result.push('\n');
    }
    result
}

/// Foreground color for a rendered glyph.
pub fn glyph_color(ch: char) -> (u8, u8, u8) {
    match ch {
        '@' => (255, 255, 255),
        '?' => (255, 220, 80),
        '#' => (110, 100, 90),
        '.' => (170, 160, 140),
        'L' => (220, 60, 60),
        '*' => (90, 200, 90),
        'e' => (230, 120, 60),
        '!' => (230, 200, 60),
        '>' => (100, 170, 255),
        _ => (60, 60, 60),
    }
}

/// Format a single character with ANSI true color (24-bit), foreground only
pub fn ansi_fg_char(ch: char, fg: (u8, u8, u8)) -> String {
    format!("\x1b[38;2;{};{};{}m{}\x1b[0m", fg.0, fg.1, fg.2, ch)
}

/// Colored rendering for terminals.
pub fn render_zone_colored(zone: &Zone, fog: bool) -> String {
    let mut result = String::new();
    for y in 0..zone.height() {
        for x in 0..zone.width() {
            let ch = cell_char(zone, Coord::new(x, y), fog);
            result.push_str(&ansi_fg_char(ch, glyph_color(ch)));
        }
        result.push('\n');
    }
    result
}

/// Legend for the glyphs used by [`render_zone`].
pub fn legend() -> String {
    [
        "@ player",
        "? exploration target",
        "# blocked",
        ". walkable",
        "L locked gate",
        "* resource node",
        "e entity",
        "! point of interest",
        "> location",
    ]
    .join("\n")
}

/// Count tiles per kind.
pub fn tile_counts(zone: &Zone) -> HashMap<TileKind, usize> {
    let mut stats = HashMap::new();
    for (_, _, tile) in zone.tiles().iter() {
        *stats.entry(tile.kind()).or_insert(0) += 1;
    }
    stats
}

/// Write a text snapshot: header, summary and the unfogged map.
pub fn export_zone_file(zone: &Zone, path: &Path) -> io::Result<()> {
    let mut file = File::create(path)?;
    let counts = tile_counts(zone);

    writeln!(file, "Zone: {} ({})", zone.name, zone.id)?;
    writeln!(file, "World seed: {}", zone.world_seed)?;
    writeln!(file, "Size: {}x{}", zone.width(), zone.height())?;
    writeln!(file, "Entry spawn: {}", zone.entry_spawn)?;
    writeln!(
        file,
        "Tiles: {} walkable, {} blocked, {} locked",
        counts.get(&TileKind::Walkable).unwrap_or(&0),
        counts.get(&TileKind::Blocked).unwrap_or(&0),
        counts.get(&TileKind::Locked).unwrap_or(&0),
    )?;
    writeln!(file, "Explored: {}/{}", zone.explored_count(), zone.explorable_count())?;
    writeln!(file, "Content: {} instances", zone.content.len())?;
    writeln!(file)?;
    write!(file, "{}", render_zone(zone, false))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentInstance, ContentKind, ContentState};
    use crate::zone::{build_zone, ZoneDefinition};

    fn zone() -> Zone {
        let def = ZoneDefinition::from_layout("r", &["######", "#....#", "#.L..#", "######"]);
        build_zone(&def, "w").unwrap()
    }

    #[test]
    fn test_render_without_fog_matches_layout() {
        let zone = zone();
        let text = render_zone(&zone, false);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "######");
        assert_eq!(lines[2].chars().nth(2), Some('L'));
    }

    #[test]
    fn test_fog_hides_unexplored() {
        let mut zone = zone();
        zone.enter();
        let text = render_zone(&zone, true);
        assert_eq!(text.matches('@').count(), 1);
        assert_eq!(text.matches('.').count(), 0);
        assert!(text.contains('L'));
    }

    #[test]
    fn test_content_glyph_until_spent() {
        let mut zone = zone();
        let at = Coord::new(4, 1);
        zone.content.entities.push(ContentInstance::new(
            ContentKind::Entity,
            "rat",
            at,
            &ContentState::default(),
        ));
        assert_eq!(cell_char(&zone, at, false), 'e');
        zone.content.entities[0].state.defeated = true;
        assert_eq!(cell_char(&zone, at, false), '.');
    }

    #[test]
    fn test_legend_lists_every_glyph() {
        let text = legend();
        for kind in ContentKind::ALL {
            assert!(text.lines().any(|l| l.starts_with(kind.glyph())), "{kind} missing");
        }
        for glyph in ['@', '?', '#', '.', 'L'] {
            assert!(text.lines().any(|l| l.starts_with(glyph)));
        }
    }

    #[test]
    fn test_export_zone_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zone.txt");
        export_zone_file(&zone(), &path).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.starts_with("Zone: r (r)"));
        assert!(text.contains("######"));
    }
}
