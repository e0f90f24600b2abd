use crate::types::{ColorId, Edge, Particle, Vec2};

pub const DOT_GLYPH: char = '●';

/// Where a frame gets drawn. Coordinates are logical pixels.
pub trait Surface {
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: ColorId);
    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: ColorId, alpha: f32);
}

/// Dots first, then the connecting lines on top.
pub fn render<S: Surface + ?Sized>(
    particles: &[Particle],
    edges: &[Edge],
    dot_radius: f32,
    surface: &mut S,
) {
    for particle in particles {
        surface.fill_circle(particle.pos, dot_radius, ColorId::Dot);
    }
    for edge in edges {
        let (Some(a), Some(b)) = (particles.get(edge.a), particles.get(edge.b)) else {
            continue;
        };
        surface.stroke_line(a.pos, b.pos, ColorId::Line, edge.alpha);
    }
}

/// Terminal pane size plus how many logical pixels one cell spans.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub cols: u16,
    pub rows: u16,
    pub px_per_col: f32,
    pub px_per_row: f32,
}

impl Viewport {
    pub fn logical_width(&self) -> f32 {
        self.cols as f32 * self.px_per_col
    }

    pub fn logical_height(&self) -> f32 {
        self.rows as f32 * self.px_per_row
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderCell {
    pub ch: char,
    /// Accumulated line opacity, composited source-over.
    pub coverage: f32,
    pub color: ColorId,
}

impl RenderCell {
    const EMPTY: RenderCell = RenderCell {
        ch: ' ',
        coverage: 0.0,
        color: ColorId::Background,
    };
}

#[derive(Debug)]
pub struct FrameBuffer {
    viewport: Viewport,
    cells: Vec<RenderCell>,
}

impl FrameBuffer {
    pub fn new(viewport: Viewport) -> Self {
        let mut buffer = Self {
            viewport,
            cells: Vec::new(),
        };
        buffer.resize(viewport);
        buffer
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        let len = (viewport.cols as usize).saturating_mul(viewport.rows as usize);
        self.cells.resize(len, RenderCell::EMPTY);
        self.clear();
    }

    pub fn clear(&mut self) {
        self.cells.fill(RenderCell::EMPTY);
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn width(&self) -> u16 {
        self.viewport.cols
    }

    pub fn height(&self) -> u16 {
        self.viewport.rows
    }

    pub fn get(&self, x: u16, y: u16) -> RenderCell {
        debug_assert!(x < self.width() && y < self.height(), "get() out of bounds");
        self.cells[self.index(x as i32, y as i32)]
    }

    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.viewport.cols as usize + x as usize
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.viewport.cols as i32 && y < self.viewport.rows as i32
    }

    /// Cell holding a logical point; the far viewport edge folds into the last cell.
    fn cell_of(&self, pos: Vec2) -> (i32, i32) {
        let cx = (pos.x / self.viewport.px_per_col).floor() as i32;
        let cy = (pos.y / self.viewport.px_per_row).floor() as i32;
        let max_x = self.viewport.cols as i32 - 1;
        let max_y = self.viewport.rows as i32 - 1;
        (
            if cx == max_x + 1 { max_x } else { cx },
            if cy == max_y + 1 { max_y } else { cy },
        )
    }

    fn plot_dot(&mut self, x: i32, y: i32, color: ColorId) {
        if !self.in_bounds(x, y) {
            return;
        }
        let idx = self.index(x, y);
        self.cells[idx] = RenderCell {
            ch: DOT_GLYPH,
            coverage: 1.0,
            color,
        };
    }

    fn blend_line(&mut self, x: i32, y: i32, color: ColorId, alpha: f32) {
        if !self.in_bounds(x, y) {
            return;
        }
        let idx = self.index(x, y);
        let cell = &mut self.cells[idx];
        if cell.color == ColorId::Dot {
            return;
        }
        cell.coverage += alpha * (1.0 - cell.coverage);
        cell.ch = line_glyph(cell.coverage);
        cell.color = color;
    }
}

impl Surface for FrameBuffer {
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: ColorId) {
        let (cx, cy) = self.cell_of(center);
        self.plot_dot(cx, cy, color);

        let Viewport {
            px_per_col,
            px_per_row,
            ..
        } = self.viewport;
        if self.cells.is_empty() {
            return;
        }
        let max_x = self.viewport.cols as i32 - 1;
        let max_y = self.viewport.rows as i32 - 1;
        let x0 = (((center.x - radius) / px_per_col).floor() as i32).max(0);
        let x1 = (((center.x + radius) / px_per_col).floor() as i32).min(max_x);
        let y0 = (((center.y - radius) / px_per_row).floor() as i32).max(0);
        let y1 = (((center.y + radius) / px_per_row).floor() as i32).min(max_y);
        let radius_sq = radius * radius;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let mid = Vec2::new((x as f32 + 0.5) * px_per_col, (y as f32 + 0.5) * px_per_row);
                if (mid - center).length_sq() <= radius_sq {
                    self.plot_dot(x, y, color);
                }
            }
        }
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: ColorId, alpha: f32) {
        let (mut x, mut y) = self.cell_of(from);
        let (x1, y1) = self.cell_of(to);
        let dx = (x1 - x).abs();
        let dy = -(y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.blend_line(x, y, color, alpha);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }
}

fn line_glyph(coverage: f32) -> char {
    if coverage < 0.12 {
        '·'
    } else if coverage < 0.3 {
        '∙'
    } else {
        '•'
    }
}
