//! SVG export of a rendered grid

use std::fmt::Write;

use super::renderer::{CellAction, CellKind, RenderedGrid};
use crate::common::Direction;

/// Colors and sizes for SVG output
#[derive(Debug, Clone)]
pub struct SvgStyle {
    /// Side of one cell in pixels
    pub cell_size: u32,
    /// Room left for axis labels
    pub margin: u32,
    pub grid_color: String,
    pub empty_color: String,
    pub body_color: String,
    pub sensor_color: String,
    pub obstacle_color: String,
    pub face_color: String,
}

impl Default for SvgStyle {
    fn default() -> Self {
        Self {
            cell_size: 32,
            margin: 24,
            grid_color: "#7c2d12".to_string(),
            empty_color: "#ffffff".to_string(),
            body_color: "#86efac".to_string(),
            sensor_color: "#60a5fa".to_string(),
            obstacle_color: "#fbbf24".to_string(),
            face_color: "#b91c1c".to_string(),
        }
    }
}

impl SvgStyle {
    /// Style with a custom cell size
    #[must_use]
    pub fn with_cell_size(mut self, cell_size: u32) -> Self {
        self.cell_size = cell_size;
        self
    }
}

/// Render the grid as an SVG document
///
/// Editable cells carry `data-action` attributes so a page script can post
/// the click back to the server.
#[must_use]
pub fn render_svg(grid: &RenderedGrid, style: &SvgStyle) -> String {
    let cell = style.cell_size;
    let margin = style.margin;
    let width = margin + cell * grid.width as u32;
    let height = cell * grid.height as u32 + margin;

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">
  <g stroke="{}" stroke-width="1">
"#,
        style.grid_color
    );

    for (row, cells) in grid.rows.iter().enumerate() {
        for c in cells {
            let left = margin + cell * c.x as u32;
            let top = cell * row as u32;
            let fill = match c.kind {
                CellKind::RobotBody => &style.body_color,
                CellKind::RobotSensor => &style.sensor_color,
                CellKind::Obstacle { .. } => &style.obstacle_color,
                CellKind::Empty => &style.empty_color,
            };
            let action = match c.action {
                Some(CellAction::AddObstacle { x, y }) => {
                    format!(r#" data-action="add" data-x="{x}" data-y="{y}""#)
                }
                Some(CellAction::CycleFace { id }) => {
                    format!(r#" data-action="cycle" data-id="{id}" data-x="{}" data-y="{}""#, c.x, c.y)
                }
                None => String::new(),
            };
            let _ = writeln!(
                svg,
                r#"    <rect x="{left}" y="{top}" width="{cell}" height="{cell}" fill="{fill}"{action}/>"#
            );
            if let CellKind::Obstacle { face, .. } = c.kind {
                if let Some((x1, y1, x2, y2)) = face_edge(face, left, top, cell) {
                    let _ = writeln!(
                        svg,
                        r#"    <line x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}" stroke="{}" stroke-width="4"/>"#,
                        style.face_color
                    );
                }
            }
        }
    }
    svg.push_str("  </g>\n");

    // Axis labels
    let _ = writeln!(
        svg,
        r##"  <g font-family="monospace" font-size="{}" font-weight="bold" fill="#111">"##,
        cell / 3
    );
    for (row, cells) in grid.rows.iter().enumerate() {
        let y = cells.first().map_or(0, |c| c.y);
        let _ = writeln!(
            svg,
            r#"    <text x="{}" y="{}" text-anchor="end">{y}</text>"#,
            margin - 4,
            cell * row as u32 + cell * 2 / 3
        );
    }
    for x in 0..grid.width as u32 {
        let _ = writeln!(
            svg,
            r#"    <text x="{}" y="{}" text-anchor="middle">{x}</text>"#,
            margin + cell * x + cell / 2,
            cell * grid.height as u32 + margin * 3 / 4
        );
    }
    svg.push_str("  </g>\n</svg>");
    svg
}

// Edge of the cell that carries the obstacle image, in screen space.
fn face_edge(face: Direction, left: u32, top: u32, size: u32) -> Option<(u32, u32, u32, u32)> {
    let (right, bottom) = (left + size, top + size);
    match face {
        Direction::North => Some((left, top, right, top)),
        Direction::South => Some((left, bottom, right, bottom)),
        Direction::East => Some((right, top, right, bottom)),
        Direction::West => Some((left, top, left, bottom)),
        Direction::Skip => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Obstacle, Position};
    use crate::grid::{render_grid, GridLayout, ObstacleSet};

    #[test]
    fn svg_contains_every_cell_and_face_edges() {
        let layout = GridLayout::default();
        let obstacles = ObstacleSet::from_obstacles(
            &layout,
            [
                Obstacle::new(1, 15, 10, Direction::West),
                Obstacle::new(2, 1, 18, Direction::Skip),
            ],
        )
        .unwrap();
        let grid = render_grid(&layout, &Position::new(1, 1, Direction::North), &obstacles, true);
        let svg = render_svg(&grid, &SvgStyle::default());

        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<rect").count(), 400);
        // Only the west-facing obstacle has a highlighted face.
        assert_eq!(svg.matches("<line").count(), 1);
        assert!(svg.contains(r#"data-action="cycle" data-id="1""#));
        assert!(svg.contains(r#"data-action="add" data-x="5" data-y="5""#));
    }

    #[test]
    fn west_face_is_left_edge() {
        assert_eq!(face_edge(Direction::West, 10, 20, 8), Some((10, 20, 10, 28)));
        assert_eq!(face_edge(Direction::North, 10, 20, 8), Some((10, 20, 18, 20)));
    }
}
