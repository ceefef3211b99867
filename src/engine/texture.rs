/// Square RGBA8 image generated in code, tiled across a surface with REPEAT wrapping.
#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    pub size: u32,
    pub pixels: Vec<u8>,
}

impl Pattern {
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.size + x) * 4) as usize;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]]
    }
}

// Integer hash, stable across runs
fn noise(seed: u32, x: u32, y: u32) -> f32 {
    let n = seed
        .wrapping_add(x.wrapping_mul(374761393))
        .wrapping_add(y.wrapping_mul(668265263));
    let n = n ^ (n >> 13);
    let n = n.wrapping_mul(1274126177);
    let n = n ^ (n >> 16);
    (n % 10000) as f32 / 10000.0
}

fn build(size: u32, shade: impl Fn(u32, u32) -> (f32, f32, f32)) -> Pattern {
    debug_assert!(size.is_power_of_two(), "tiling needs a power-of-two size");
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let (r, g, b) = shade(x, y);
            pixels.extend_from_slice(&[to_byte(r), to_byte(g), to_byte(b), 255]);
        }
    }
    Pattern { size, pixels }
}

fn to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Mottled green with darker tufts.
pub fn grass(size: u32) -> Pattern {
    build(size, |x, y| {
        let fine = noise(11, x, y);
        let coarse = noise(17, x / 4, y / 4);
        let tuft = if noise(23, x, y) > 0.93 { 0.7 } else { 1.0 };
        let light = (0.75 + 0.15 * coarse + 0.1 * fine) * tuft;
        (0.25 * light, 0.55 * light, 0.18 * light)
    })
}

/// Grainy asphalt. Columns at the tile seam carry a dashed white stripe so the
/// road shows its centre and edge lines where u crosses a whole number.
pub fn asphalt(size: u32) -> Pattern {
    let stripe = (size / 32).max(1);
    build(size, |x, y| {
        let on_seam = x < stripe || x >= size - stripe;
        let dash = (y * 4 / size) % 2 == 0;
        if on_seam && dash {
            (0.92, 0.92, 0.88)
        } else {
            let grain = 0.3 + 0.1 * noise(31, x, y);
            (grain, grain, grain * 1.02)
        }
    })
}
