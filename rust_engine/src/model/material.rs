//! 角色颜色

use glam::Vec3;

/// 颜色预设
#[derive(Clone, Copy, Debug)]
pub struct ColorPreset {
    pub name: &'static str,
    pub color: [f32; 3],
}

/// 该索引表示使用自定义颜色
pub const CUSTOM_COLOR_INDEX: usize = 31;

pub const COLOR_PRESETS: &[ColorPreset] = &[
    ColorPreset { name: "Skin", color: [0.90, 0.72, 0.60] },
    ColorPreset { name: "White", color: [1.0, 1.0, 1.0] },
    ColorPreset { name: "Grey", color: [0.5, 0.5, 0.5] },
    ColorPreset { name: "Red", color: [0.85, 0.20, 0.20] },
    ColorPreset { name: "Green", color: [0.25, 0.75, 0.30] },
    ColorPreset { name: "Blue", color: [0.20, 0.40, 0.85] },
    ColorPreset { name: "Yellow", color: [0.95, 0.85, 0.25] },
    ColorPreset { name: "Cyan", color: [0.20, 0.80, 0.85] },
    ColorPreset { name: "Magenta", color: [0.80, 0.25, 0.75] },
    ColorPreset { name: "Orange", color: [0.95, 0.55, 0.15] },
];

/// 角色材质颜色
#[derive(Clone, Copy, Debug)]
pub struct MaterialColor {
    pub preset_index: usize,
    pub custom: [f32; 3],
}

impl MaterialColor {
    pub fn preset(index: usize) -> Self {
        Self {
            preset_index: index,
            ..Self::default()
        }
    }

    pub fn custom(color: [f32; 3]) -> Self {
        Self {
            preset_index: CUSTOM_COLOR_INDEX,
            custom: color,
        }
    }

    /// 解析最终颜色，未知预设回退到第一个预设
    pub fn resolve(&self) -> Vec3 {
        if self.preset_index == CUSTOM_COLOR_INDEX {
            return Vec3::from(self.custom);
        }
        let preset = COLOR_PRESETS
            .get(self.preset_index)
            .unwrap_or(&COLOR_PRESETS[0]);
        Vec3::from(preset.color)
    }
}

impl Default for MaterialColor {
    fn default() -> Self {
        Self {
            preset_index: 0,
            custom: [1.0, 1.0, 1.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        assert_eq!(MaterialColor::preset(3).resolve(), Vec3::new(0.85, 0.20, 0.20));
        assert_eq!(MaterialColor::custom([0.1, 0.2, 0.3]).resolve(), Vec3::new(0.1, 0.2, 0.3));
        assert_eq!(MaterialColor::preset(20).resolve(), Vec3::from(COLOR_PRESETS[0].color));
    }
}
