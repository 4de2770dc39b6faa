//! 顶点蒙皮计算
//!
//! 线性混合蒙皮：deformed = Σ w_j · (M_j · p)，只对非零权重求和，
//! 不做权重归一化，也不做旋转插值。

use glam::{Mat4, Vec3};
use rayon::prelude::*;

use crate::model::VertexWeight;
use crate::{Result, SkinError};
use super::{SkinningInput, SkinningOutput};

/// 蒙皮上下文
#[derive(Clone, Copy, Debug, Default)]
pub struct SkinningContext {
    /// 使用 rayon 并行计算顶点（调用仍在所有顶点写完后才返回）
    pub parallel: bool,
}

/// 计算蒙皮（顺序执行）
pub fn compute_skinning(input: &SkinningInput) -> Result<SkinningOutput> {
    compute_skinning_with(input, &SkinningContext::default())
}

/// 按上下文计算蒙皮
///
/// 顶点数与权重数必须一致，否则不做任何计算直接返回错误。
pub fn compute_skinning_with(input: &SkinningInput, context: &SkinningContext) -> Result<SkinningOutput> {
    if input.positions.len() != input.weights.len() {
        return Err(SkinError::VertexCountMismatch {
            expected: input.positions.len(),
            actual: input.weights.len(),
        });
    }
    let positions = input.positions;
    let weights = input.weights;

    let positions = if context.parallel {
        positions
            .par_iter()
            .zip(weights.par_iter())
            .map(|(position, weight)| compute_single_vertex(*position, weight, input.joint_matrices))
            .collect()
    } else {
        positions
            .iter()
            .zip(weights)
            .map(|(position, weight)| compute_single_vertex(*position, weight, input.joint_matrices))
            .collect()
    };

    Ok(SkinningOutput { positions })
}

/// 计算单个顶点的蒙皮
fn compute_single_vertex(position: Vec3, weight: &VertexWeight, matrices: &[Mat4]) -> Vec3 {
    let mut pos = Vec3::ZERO;
    for &(joint, w) in weight.influences() {
        // 缺失的关节矩阵视为零贡献
        if let Some(m) = matrices.get(joint) {
            pos += m.transform_point3(position) * w;
        }
    }
    pos
}
