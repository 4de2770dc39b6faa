//! 顶点蒙皮计算

mod skinning;

pub use skinning::{compute_skinning, compute_skinning_with, SkinningContext};

use glam::{Mat4, Vec3};
use crate::model::VertexWeight;

/// 蒙皮输入数据
pub struct SkinningInput<'a> {
    /// 绑定姿态顶点位置
    pub positions: &'a [Vec3],
    /// 顶点权重
    pub weights: &'a [VertexWeight],
    /// 关节蒙皮矩阵（当前关节到世界 * 绑定世界到关节）
    pub joint_matrices: &'a [Mat4],
}

/// 蒙皮输出数据
pub struct SkinningOutput {
    /// 变换后的顶点位置
    pub positions: Vec<Vec3>,
}
