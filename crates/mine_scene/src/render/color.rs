//! Color scales
//!
//! Grade colors follow a fixed six-band step scale (no interpolation, so the
//! legend stays legible); status colors tint instanced equipment.

use serde::Serialize;

use crate::domain::equipment::EquipmentStatus;

/// Saturation shared by every grade band
pub const GRADE_SATURATION: f32 = 0.8;
/// Lightness shared by every grade band
pub const GRADE_LIGHTNESS: f32 = 0.5;

/// Linear RGB color with components in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgb {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
}

impl Rgb {
    /// Create a color
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Color from a packed `0xRRGGBB` value
    pub fn from_hex_u32(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self::new(channel(16), channel(8), channel(0))
    }

    /// Color from hue (degrees), saturation and lightness
    pub fn from_hsl(hue_degrees: f32, saturation: f32, lightness: f32) -> Self {
        let h = hue_degrees.rem_euclid(360.0) / 60.0;
        let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let m = lightness - c * 0.5;
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        Self::new(r + m, g + m, b + m)
    }

    /// Hue in degrees `[0, 360)`; 0 for greys
    pub fn hue(&self) -> f32 {
        let max = self.r.max(self.g).max(self.b);
        let min = self.r.min(self.g).min(self.b);
        let delta = max - min;
        if delta <= f32::EPSILON {
            return 0.0;
        }
        let hue = if (max - self.r).abs() <= f32::EPSILON {
            60.0 * ((self.g - self.b) / delta)
        } else if (max - self.g).abs() <= f32::EPSILON {
            60.0 * ((self.b - self.r) / delta + 2.0)
        } else {
            60.0 * ((self.r - self.g) / delta + 4.0)
        };
        hue.rem_euclid(360.0)
    }

    /// CSS hex string `#rrggbb`
    pub fn to_hex(&self) -> String {
        let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", byte(self.r), byte(self.g), byte(self.b))
    }

    /// RGBA array for GPU buffers
    pub fn to_rgba(&self, alpha: f32) -> [f32; 4] {
        [self.r, self.g, self.b, alpha]
    }

    /// RGB array for vertex colors
    pub fn to_array(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// The six discrete grade bands, low to high
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum GradeBand {
    /// Below 0.5
    Waste,
    /// 0.5 to 1.0
    Low,
    /// 1.0 to 1.5
    Moderate,
    /// 1.5 to 2.0
    Good,
    /// 2.0 to 2.5
    High,
    /// 2.5 and above
    VeryHigh,
}

impl GradeBand {
    /// Band containing `grade`; NaN falls into the lowest band
    pub fn for_grade(grade: f32) -> Self {
        if grade.is_nan() || grade < 0.5 {
            Self::Waste
        } else if grade < 1.0 {
            Self::Low
        } else if grade < 1.5 {
            Self::Moderate
        } else if grade < 2.0 {
            Self::Good
        } else if grade < 2.5 {
            Self::High
        } else {
            Self::VeryHigh
        }
    }

    /// Fixed hue: blue → cyan → green → yellow → orange → red
    pub fn hue(&self) -> f32 {
        match self {
            Self::Waste => 240.0,
            Self::Low => 180.0,
            Self::Moderate => 120.0,
            Self::Good => 60.0,
            Self::High => 30.0,
            Self::VeryHigh => 0.0,
        }
    }

    /// Display color of the band
    pub fn color(&self) -> Rgb {
        Rgb::from_hsl(self.hue(), GRADE_SATURATION, GRADE_LIGHTNESS)
    }

    /// Legend entry for the band
    pub fn range(&self) -> &'static GradeRange {
        &GRADE_RANGES[*self as usize]
    }
}

/// Legend row for one grade band
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GradeRange {
    /// Band this row describes
    pub band: GradeBand,
    /// Inclusive lower bound
    pub min: f32,
    /// Exclusive upper bound
    pub max: f32,
    /// Short legend label
    pub label: &'static str,
    /// Economic meaning of the band
    pub description: &'static str,
}

/// Legend table, one row per band in ascending order
///
/// Used for legend rendering only; [`color_for`] does not read it.
pub const GRADE_RANGES: [GradeRange; 6] = [
    GradeRange { band: GradeBand::Waste, min: 0.0, max: 0.5, label: "< 0.5%", description: "Waste - below cut-off grade" },
    GradeRange { band: GradeBand::Low, min: 0.5, max: 1.0, label: "0.5 - 1.0%", description: "Low grade - stockpile candidate" },
    GradeRange { band: GradeBand::Moderate, min: 1.0, max: 1.5, label: "1.0 - 1.5%", description: "Marginal ore - economic at current prices" },
    GradeRange { band: GradeBand::Good, min: 1.5, max: 2.0, label: "1.5 - 2.0%", description: "Good ore - direct to mill" },
    GradeRange { band: GradeBand::High, min: 2.0, max: 2.5, label: "2.0 - 2.5%", description: "High grade - priority extraction" },
    GradeRange { band: GradeBand::VeryHigh, min: 2.5, max: f32::INFINITY, label: "> 2.5%", description: "Very high grade - premium ore" },
];

/// Display color for a grade value
pub fn color_for(grade: f32) -> Rgb {
    GradeBand::for_grade(grade).color()
}

/// CSS hex color for a grade value
pub fn hex_for(grade: f32) -> String {
    color_for(grade).to_hex()
}

/// Tint used for equipment in a given operating state
pub fn status_color(status: EquipmentStatus) -> Rgb {
    match status {
        EquipmentStatus::Operating => Rgb::from_hex_u32(0x4caf50),
        EquipmentStatus::Idle => Rgb::from_hex_u32(0xffc107),
        EquipmentStatus::Maintenance => Rgb::from_hex_u32(0x2196f3),
        EquipmentStatus::Error => Rgb::from_hex_u32(0xf44336),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries() {
        assert_eq!(GradeBand::for_grade(0.49), GradeBand::Waste);
        assert_eq!(GradeBand::for_grade(0.5), GradeBand::Low);
        assert_eq!(GradeBand::for_grade(1.0), GradeBand::Moderate);
        assert_eq!(GradeBand::for_grade(1.99), GradeBand::Good);
        assert_eq!(GradeBand::for_grade(2.0), GradeBand::High);
        assert_eq!(GradeBand::for_grade(2.5), GradeBand::VeryHigh);
        assert_eq!(GradeBand::for_grade(f32::NAN), GradeBand::Waste);
    }

    #[test]
    fn test_low_grade_is_blue_and_high_grade_is_red() {
        assert!((color_for(0.3).hue() - 240.0).abs() < 0.5);
        let red = color_for(3.0);
        assert!(red.hue() < 0.5 || red.hue() > 359.5);
        assert!(red.r > red.g && red.r > red.b);
    }

    #[test]
    fn test_grade_2_7_is_red_with_legend_label() {
        let band = GradeBand::for_grade(2.7);
        assert_eq!(band, GradeBand::VeryHigh);
        assert_eq!(band.range().label, "> 2.5%");
        assert_eq!(hex_for(2.7), color_for(3.5).to_hex());
        assert!(hex_for(2.7).starts_with('#'));
        assert_eq!(hex_for(2.7).len(), 7);
    }

    #[test]
    fn test_same_band_same_color() {
        assert_eq!(color_for(1.51), color_for(1.99));
        assert_ne!(color_for(1.49), color_for(1.51));
    }

    #[test]
    fn test_grade_ranges_are_contiguous() {
        for pair in GRADE_RANGES.windows(2) {
            assert_eq!(pair[0].max, pair[1].min);
            assert!(pair[0].band < pair[1].band);
        }
        for range in &GRADE_RANGES {
            assert_eq!(GradeBand::for_grade(range.min), range.band);
        }
    }

    #[test]
    fn test_hsl_primary_hues() {
        let green = Rgb::from_hsl(120.0, 1.0, 0.5);
        assert!((green.g - 1.0).abs() < 1e-6 && green.r.abs() < 1e-6);
        assert_eq!(Rgb::from_hex_u32(0xff0000).to_hex(), "#ff0000");
    }

    #[test]
    fn test_status_colors_are_distinct() {
        let colors = [
            status_color(EquipmentStatus::Operating),
            status_color(EquipmentStatus::Idle),
            status_color(EquipmentStatus::Maintenance),
            status_color(EquipmentStatus::Error),
        ];
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
