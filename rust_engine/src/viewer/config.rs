//! 查看器配置
//!
//! 所有参数扁平化，由调用方构造后交给 [`ViewerContext`](super::ViewerContext)。

use crate::model::MaterialColor;
use crate::skinning::SkinningContext;

/// 查看器配置（扁平化，不嵌套）
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    // ========== 文件 ==========
    /// 骨架文件名，默认 "skeleton.txt"
    pub skeleton_file: String,
    /// 网格文件名，默认 "mesh.obj"
    pub mesh_file: String,
    /// 权重文件名，默认 "attachments.txt"
    pub attachments_file: String,

    // ========== 骨架显示 ==========
    /// 关节点大小（像素），默认 8.0
    pub joint_point_size: f32,
    /// 骨骼线宽（像素），默认 2.0
    pub bone_line_width: f32,

    // ========== 网格显示 ==========
    /// 新角色的颜色预设索引，默认 0
    pub color_preset: usize,

    // ========== 蒙皮 ==========
    /// 是否并行蒙皮，默认 false
    pub parallel_skinning: bool,
    /// 权重和偏离 1 的诊断阈值，默认 1e-3
    pub weight_sum_tolerance: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            // ====== 文件 ======
            // load_character(dir) 在目录下按这三个名字查找
            skeleton_file: "skeleton.txt".to_string(),
            mesh_file: "mesh.obj".to_string(),
            attachments_file: "attachments.txt".to_string(),

            // ====== 骨架显示 ======
            joint_point_size: 8.0,
            bone_line_width: 2.0,

            // ====== 网格显示 ======
            // 见 COLOR_PRESETS，31 表示自定义颜色
            color_preset: 0,

            // ====== 蒙皮 ======
            // 顶点很少时并行反而更慢
            parallel_skinning: false,
            // 只用于加载时的警告，权重不会被归一化
            weight_sum_tolerance: 1e-3,
        }
    }
}

impl ViewerConfig {
    pub fn skinning_context(&self) -> SkinningContext {
        SkinningContext {
            parallel: self.parallel_skinning,
        }
    }

    pub fn default_color(&self) -> MaterialColor {
        MaterialColor::preset(self.color_preset)
    }
}
