/// Character-cell rasterizer for terminal output
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use std::io::Write;

use cell3d_core::{Appearance, CellColor, Rasterizer};

/// One character cell of the output surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub glyph: char,
    pub foreground: CellColor,
    pub background: CellColor,
}

impl Cell {
    pub const BLANK: Cell = Cell {
        glyph: ' ',
        foreground: CellColor::White,
        background: CellColor::Black,
    };
}

impl From<&Appearance> for Cell {
    fn from(appearance: &Appearance) -> Self {
        Self {
            glyph: appearance.glyph().as_char(),
            foreground: appearance.foreground(),
            background: appearance.background(),
        }
    }
}

/// Cell buffer filled in painter's order
///
/// There is no depth buffer: each fill overwrites whatever an earlier
/// triangle left in the cell.
pub struct CellRenderer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl CellRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::BLANK; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Reallocate for a new surface size, blanking every cell
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.cells = vec![Cell::BLANK; width * height];
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(y * self.width + x)
    }

    /// Glyph rows without color, mostly for headless output
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.cells
            .chunks(self.width.max(1))
            .map(|row| row.iter().map(|cell| cell.glyph).collect())
    }

    /// Queue the whole surface to `writer`, emitting colors only on change
    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut current: Option<(CellColor, CellColor)> = None;

        for (y, row) in self.cells.chunks(self.width.max(1)).enumerate() {
            writer.queue(cursor::MoveTo(0, y as u16))?;
            for cell in row {
                let colors = (cell.foreground, cell.background);
                if current != Some(colors) {
                    writer.queue(SetForegroundColor(to_color(cell.foreground)))?;
                    writer.queue(SetBackgroundColor(to_color(cell.background)))?;
                    current = Some(colors);
                }
                writer.queue(Print(cell.glyph))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl Rasterizer for CellRenderer {
    fn fill_triangle(
        &mut self,
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        appearance: &Appearance,
    ) {
        if self.width == 0 || self.height == 0 {
            return;
        }

        let cell = Cell::from(appearance);
        let v0 = (x0 as f32, y0 as f32);
        let v1 = (x1 as f32, y1 as f32);
        let v2 = (x2 as f32, y2 as f32);

        // Bounding box, clipped to the surface
        let min_x = x0.min(x1).min(x2).max(0);
        let max_x = x0.max(x1).max(x2).min(self.width as i32 - 1);
        let min_y = y0.min(y1).min(y2).max(0);
        let max_y = y0.max(y1).max(y2).min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                // Cell corners are sampled so shared edges and vertices fill
                let Some((w0, w1, w2)) = barycentric(v0, v1, v2, (x as f32, y as f32)) else {
                    continue;
                };
                if w0 >= -EDGE_EPSILON && w1 >= -EDGE_EPSILON && w2 >= -EDGE_EPSILON {
                    self.cells[y as usize * self.width + x as usize] = cell;
                }
            }
        }
    }
}

const EDGE_EPSILON: f32 = 1e-4;

/// Map the surface palette onto terminal colors
pub fn to_color(color: CellColor) -> Color {
    match color {
        CellColor::Black => Color::Black,
        CellColor::DarkGrey => Color::DarkGrey,
        CellColor::Grey => Color::Grey,
        CellColor::White => Color::White,
        CellColor::Red => Color::Red,
        CellColor::Green => Color::Green,
        CellColor::Blue => Color::Blue,
        CellColor::Yellow => Color::Yellow,
        CellColor::Cyan => Color::Cyan,
        CellColor::Magenta => Color::Magenta,
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cell3d_core::Shade;

    fn bright() -> Appearance {
        Appearance::new(Shade::from_level(12))
    }

    #[test]
    fn test_fill_covers_interior_and_edges() {
        let mut renderer = CellRenderer::new(10, 10);
        renderer.fill_triangle(0, 0, 9, 0, 0, 9, &bright());

        let filled = Cell::from(&bright());
        assert_eq!(renderer.cell(0, 0), Some(&filled));
        assert_eq!(renderer.cell(9, 0), Some(&filled));
        assert_eq!(renderer.cell(0, 9), Some(&filled));
        assert_eq!(renderer.cell(3, 3), Some(&filled));
        assert_eq!(renderer.cell(9, 9), Some(&Cell::BLANK));
        assert_eq!(renderer.cell(6, 6), Some(&Cell::BLANK));
    }

    #[test]
    fn test_winding_does_not_matter() {
        let mut clockwise = CellRenderer::new(8, 8);
        let mut counter = CellRenderer::new(8, 8);
        clockwise.fill_triangle(0, 0, 7, 0, 0, 7, &bright());
        counter.fill_triangle(0, 0, 0, 7, 7, 0, &bright());
        assert_eq!(clockwise.cells, counter.cells);
    }

    #[test]
    fn test_later_fill_paints_over() {
        let mut renderer = CellRenderer::new(6, 6);
        let dim = Appearance::new(Shade::from_level(2));
        renderer.fill_triangle(0, 0, 5, 0, 0, 5, &dim);
        renderer.fill_triangle(0, 0, 5, 0, 0, 5, &bright());
        assert_eq!(renderer.cell(1, 1), Some(&Cell::from(&bright())));
    }

    #[test]
    fn test_out_of_bounds_is_clamped() {
        let mut renderer = CellRenderer::new(4, 3);
        renderer.fill_triangle(-10, -10, 30, -10, -10, 30, &bright());
        assert!(renderer.cells.iter().all(|cell| *cell == Cell::from(&bright())));
    }

    #[test]
    fn test_tint_overrides_foreground() {
        let mut renderer = CellRenderer::new(4, 4);
        let tinted = bright().with_tint(CellColor::Red);
        renderer.fill_triangle(0, 0, 3, 0, 0, 3, &tinted);
        assert_eq!(renderer.cell(0, 0).map(|c| c.foreground), Some(CellColor::Red));
    }

    #[test]
    fn test_degenerate_triangle_draws_nothing() {
        let mut renderer = CellRenderer::new(5, 5);
        renderer.fill_triangle(0, 0, 2, 2, 4, 4, &bright());
        assert!(renderer.cells.iter().all(|cell| *cell == Cell::BLANK));
    }

    #[test]
    fn test_clear_and_resize() {
        let mut renderer = CellRenderer::new(4, 4);
        renderer.fill_triangle(0, 0, 3, 0, 0, 3, &bright());
        renderer.clear();
        assert!(renderer.cells.iter().all(|cell| *cell == Cell::BLANK));

        renderer.resize(7, 2);
        assert_eq!((renderer.width(), renderer.height()), (7, 2));
        assert_eq!(renderer.cell(6, 1), Some(&Cell::BLANK));
        assert_eq!(renderer.cell(7, 1), None);
    }

    #[test]
    fn test_lines_and_draw() {
        let mut renderer = CellRenderer::new(3, 2);
        renderer.fill_triangle(0, 0, 2, 0, 0, 1, &bright());
        let glyph = bright().glyph().as_char();

        let lines: Vec<String> = renderer.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(glyph));

        let mut out = Vec::new();
        renderer.draw(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(glyph));
    }
}
