use crate::simulation::{DrawCommand, ParticleSystem};
use ratatui::style::Color;

/// Braille character rendering for high-resolution terminal graphics.
/// Each Braille character represents a 2x4 grid of dots (8 dots total).
///
/// Dot positions and their bit values:
/// ```text
/// (0,0)=0x01  (1,0)=0x08
/// (0,1)=0x02  (1,1)=0x10
/// (0,2)=0x04  (1,2)=0x20
/// (0,3)=0x40  (1,3)=0x80
/// ```
///
/// Unicode Braille patterns: U+2800 to U+28FF (256 patterns)
const BRAILLE_BASE: u32 = 0x2800;

/// Dot position to bit mapping for Braille characters
const BRAILLE_DOTS: [[u8; 4]; 2] = [
    [0x01, 0x02, 0x04, 0x40], // Left column (x=0): rows 0,1,2,3
    [0x08, 0x10, 0x20, 0x80], // Right column (x=1): rows 0,1,2,3
];

/// A single rendered Braille cell with position and color
#[derive(Clone, Copy)]
pub struct BrailleCell {
    pub x: u16,
    pub y: u16,
    pub char: char,
    pub color: Color,
}

/// Dot pattern plus the summed color of everything drawn into one character
#[derive(Clone, Copy, Default)]
struct CellAccum {
    pattern: u8,
    r: u32,
    g: u32,
    b: u32,
    hits: u32,
}

/// Mapping between canvas pixels and braille dots
#[derive(Clone, Copy, Debug)]
pub struct DotScale {
    pub dots_x: usize,
    pub dots_y: usize,
    /// Dots per canvas pixel
    pub sx: f32,
    pub sy: f32,
}

impl DotScale {
    pub fn new(canvas_width: u16, canvas_height: u16, sim_width: f32, sim_height: f32) -> Self {
        let dots_x = canvas_width as usize * 2;
        let dots_y = canvas_height as usize * 4;
        Self {
            dots_x,
            dots_y,
            sx: dots_x as f32 / sim_width,
            sy: dots_y as f32 / sim_height,
        }
    }

    /// Terminal cell (relative to the canvas) to canvas pixel at the cell center
    pub fn cell_to_canvas(&self, col: u16, row: u16) -> (f32, f32) {
        (
            (col as f32 * 2.0 + 1.0) / self.sx,
            (row as f32 * 4.0 + 2.0) / self.sy,
        )
    }
}

/// Splat every particle as a disc of dots, then emit one colored braille
/// character per touched terminal cell
pub fn render_to_braille(
    system: &ParticleSystem,
    canvas_width: u16,
    canvas_height: u16,
    pointer_marker: bool,
) -> Vec<BrailleCell> {
    if canvas_width == 0 || canvas_height == 0 {
        return Vec::new();
    }

    let scale = DotScale::new(canvas_width, canvas_height, system.width, system.height);
    let mut accum = vec![CellAccum::default(); canvas_width as usize * canvas_height as usize];

    for cmd in system.draw_commands() {
        splat(&mut accum, canvas_width as usize, &scale, &cmd);
    }

    let mut cells = Vec::with_capacity(accum.len() / 2);
    for (idx, cell) in accum.iter().enumerate() {
        if cell.pattern == 0 {
            continue;
        }
        let braille_char = char::from_u32(BRAILLE_BASE + cell.pattern as u32).unwrap_or(' ');
        let hits = cell.hits.max(1);
        cells.push(BrailleCell {
            x: (idx % canvas_width as usize) as u16,
            y: (idx / canvas_width as usize) as u16,
            char: braille_char,
            color: Color::Rgb((cell.r / hits) as u8, (cell.g / hits) as u8, (cell.b / hits) as u8),
        });
    }

    if pointer_marker {
        let pointer = system.pointer();
        let px = (pointer.x * scale.sx) as i64;
        let py = (pointer.y * scale.sy) as i64;
        if px >= 0 && py >= 0 && (px as usize) < scale.dots_x && (py as usize) < scale.dots_y {
            cells.push(BrailleCell {
                x: (px / 2) as u16,
                y: (py / 4) as u16,
                char: '+',
                color: Color::White,
            });
        }
    }

    cells
}

/// Set the dots covered by one particle
fn splat(accum: &mut [CellAccum], canvas_width: usize, scale: &DotScale, cmd: &DrawCommand) {
    let cx = cmd.x * scale.sx;
    let cy = cmd.y * scale.sy;
    let rx = cmd.radius * scale.sx;
    let ry = cmd.radius * scale.sy;

    // Particles smaller than a dot light only the dot they sit on
    if rx < 1.0 && ry < 1.0 {
        set_dot(accum, canvas_width, scale, cx.floor() as i64, cy.floor() as i64, cmd);
        return;
    }

    let x0 = (cx - rx).floor() as i64;
    let x1 = (cx + rx).floor() as i64;
    let y0 = (cy - ry).floor() as i64;
    let y1 = (cy + ry).floor() as i64;

    for dy in y0..=y1 {
        for dx in x0..=x1 {
            let nx = (dx as f32 + 0.5 - cx) / rx.max(0.5);
            let ny = (dy as f32 + 0.5 - cy) / ry.max(0.5);
            if nx * nx + ny * ny <= 1.0 {
                set_dot(accum, canvas_width, scale, dx, dy, cmd);
            }
        }
    }
}

fn set_dot(
    accum: &mut [CellAccum],
    canvas_width: usize,
    scale: &DotScale,
    dx: i64,
    dy: i64,
    cmd: &DrawCommand,
) {
    if dx < 0 || dy < 0 || dx as usize >= scale.dots_x || dy as usize >= scale.dots_y {
        return;
    }
    let (dx, dy) = (dx as usize, dy as usize);
    let cell = &mut accum[(dy / 4) * canvas_width + dx / 2];
    cell.pattern |= BRAILLE_DOTS[dx % 2][dy % 4];
    cell.r += cmd.color.r as u32;
    cell.g += cmd.color.g as u32;
    cell.b += cmd.color.b as u32;
    cell.hits += 1;
}

/// Smallest simulation canvas that still gives one canvas pixel per dot
pub fn calculate_canvas_size(canvas_width: u16, canvas_height: u16) -> (f32, f32) {
    let width = (canvas_width as usize * 2).max(64);
    let height = (canvas_height as usize * 4).max(64);
    (width as f32, height as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::Particle;
    use crate::sampler::PixelData;
    use crate::settings::{ImageOffset, ParticleSettings};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn system_with_pixels(width: f32, height: f32, pixels: PixelData, size: f32) -> ParticleSystem {
        let mut system = ParticleSystem::new(&ParticleSettings {
            width,
            height,
            particle_size: size,
            image_offset: ImageOffset { x: 0.0, y: 0.0 },
            ..Default::default()
        })
        .unwrap();
        system.populate(&pixels, &mut StdRng::seed_from_u64(0)).unwrap();
        system
    }

    #[test]
    fn test_braille_pattern() {
        // Test that single dot patterns work correctly
        assert_eq!(BRAILLE_DOTS[0][0], 0x01); // Top-left
        assert_eq!(BRAILLE_DOTS[1][0], 0x08); // Top-right
        assert_eq!(BRAILLE_DOTS[0][3], 0x40); // Bottom-left
        assert_eq!(BRAILLE_DOTS[1][3], 0x80); // Bottom-right

        // All dots should give 0xFF
        let all_dots: u8 = BRAILLE_DOTS[0].iter().sum::<u8>() + BRAILLE_DOTS[1].iter().sum::<u8>();
        assert_eq!(all_dots, 0xFF);
    }

    #[test]
    fn test_single_small_particle_lights_one_dot() {
        // 1x1 opaque pixel lands at (0, 0); 1 canvas pixel == 1 dot
        let pixels = PixelData::new(1, 1, vec![90, 60, 30, 255]).unwrap();
        let system = system_with_pixels(20.0, 40.0, pixels, 0.4);

        let cells = render_to_braille(&system, 10, 10, false);
        assert_eq!(cells.len(), 1);
        assert_eq!((cells[0].x, cells[0].y), (0, 0));
        assert_eq!(cells[0].char, '\u{2801}');
        assert_eq!(cells[0].color, Color::Rgb(90, 60, 30));
    }

    #[test]
    fn test_colors_average_within_a_cell() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&[200, 0, 0, 255]);
        buf.extend_from_slice(&[0, 0, 100, 255]);
        // Two pixels across a 2-dot-wide canvas: one dot each, same character
        let pixels = PixelData::new(2, 1, buf).unwrap();
        let system = system_with_pixels(2.0, 4.0, pixels, 0.4);

        let cells = render_to_braille(&system, 1, 1, false);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].char, '\u{2809}');
        assert_eq!(cells[0].color, Color::Rgb(100, 0, 50));
    }

    #[test]
    fn test_large_particle_fills_a_disc() {
        let pixels = PixelData::new(1, 1, vec![255, 255, 255, 255]).unwrap();
        let mut system = ParticleSystem::new(&ParticleSettings {
            width: 20.0,
            height: 40.0,
            particle_size: 3.0,
            image_offset: ImageOffset { x: 0.5, y: 0.5 },
            ..Default::default()
        })
        .unwrap();
        system.populate(&pixels, &mut StdRng::seed_from_u64(0)).unwrap();
        let p: &Particle = &system.particles()[0];
        assert_eq!(p.position(), (5.0, 10.0));

        let cells = render_to_braille(&system, 10, 10, false);
        let dots: u32 = cells.iter().map(|c| (c.char as u32 - BRAILLE_BASE).count_ones()).sum();
        // Roughly pi * 3^2 dots
        assert!((20..=36).contains(&dots), "dots = {}", dots);
        assert!(cells.iter().all(|c| c.color == Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_pointer_marker_is_drawn_on_canvas_only() {
        let pixels = PixelData::new(1, 1, vec![0, 0, 0, 0]).unwrap();
        let mut system = system_with_pixels(20.0, 40.0, pixels, 1.0);
        system.set_pointer(7.0, 9.0);
        let cells = render_to_braille(&system, 10, 10, true);
        assert_eq!(cells.len(), 1);
        assert_eq!((cells[0].x, cells[0].y, cells[0].char), (3, 2, '+'));

        system.set_pointer(-3.0, 9.0);
        assert!(render_to_braille(&system, 10, 10, true).is_empty());
    }

    #[test]
    fn test_cell_to_canvas_round_trip() {
        let scale = DotScale::new(10, 10, 40.0, 80.0);
        let (x, y) = scale.cell_to_canvas(3, 2);
        assert_eq!((x, y), (14.0, 20.0));
    }

    #[test]
    fn test_calculate_canvas_size_has_a_floor() {
        assert_eq!(calculate_canvas_size(100, 40), (200.0, 160.0));
        assert_eq!(calculate_canvas_size(10, 5), (64.0, 64.0));
    }
}
