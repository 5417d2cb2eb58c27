use serde::{Deserialize, Serialize};

/// 8-bit RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    /// Linear blend from `self` (t = 0) to `other` (t = 1). Channels are
    /// truncated toward zero; `t` is clamped.
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 * (1.0 - t) + b as f64 * t) as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

/// Branch colours, picked by [`branch_colour`].
pub const PALETTE: [Rgb; 8] = [
    Rgb(0, 0, 0),
    Rgb(0, 0, 255),
    Rgb(0, 255, 0),
    Rgb(255, 0, 0),
    Rgb(150, 150, 0),
    Rgb(0, 150, 150),
    Rgb(255, 0, 255),
    Rgb(0, 0, 255),
];

/// Stable colour for a branch: the same `(id, name)` always maps to the same
/// entry, across runs and platforms. Only the first seven entries are reachable.
pub fn branch_colour(id: u64, name: &str) -> Rgb {
    let name_sum: u64 = name.bytes().map(u64::from).sum();
    PALETTE[(id.wrapping_add(name_sum) % 7) as usize]
}
