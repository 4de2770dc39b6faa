//! 蒙皮角色模型

mod loader;
mod material;
mod runtime;
mod snapshot;

pub use loader::{
    load_character, load_character_files, parse_attachments, parse_obj, parse_skeleton,
    ObjMesh,
};
pub use material::{ColorPreset, MaterialColor, COLOR_PRESETS, CUSTOM_COLOR_INDEX};
pub use runtime::{CharacterModel, Placement};
pub use snapshot::{compute_face_normals, MeshSnapshot, VERTEX_STRIDE};

use crate::{Result, SkinError};

/// 显示模式（对同一角色互斥）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// 三角形网格，带光照
    #[default]
    Mesh,
    /// 关节画点，骨骼画线
    Skeletal,
}

/// 顶点关节权重
///
/// 导入时是长度等于关节数的稠密向量，这里只保留非零项。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexWeight {
    influences: Vec<(usize, f32)>,
}

impl VertexWeight {
    /// 从稠密权重行创建（丢弃零权重）
    pub fn from_dense(row: &[f32]) -> Self {
        let influences = row
            .iter()
            .enumerate()
            .filter(|(_, w)| **w != 0.0)
            .map(|(j, w)| (j, *w))
            .collect();
        Self { influences }
    }

    /// 从稠密权重行创建，并校验长度等于关节数
    pub fn from_dense_checked(vertex: usize, row: &[f32], joint_count: usize) -> Result<Self> {
        if row.len() != joint_count {
            return Err(SkinError::WeightCountMismatch {
                vertex,
                expected: joint_count,
                actual: row.len(),
            });
        }
        Ok(Self::from_dense(row))
    }

    /// 单关节完全绑定
    pub fn single(joint: usize) -> Self {
        Self {
            influences: vec![(joint, 1.0)],
        }
    }

    /// 非零权重项 (关节索引, 权重)
    pub fn influences(&self) -> &[(usize, f32)] {
        &self.influences
    }

    pub fn weight_for(&self, joint: usize) -> f32 {
        self.influences
            .iter()
            .find(|(j, _)| *j == joint)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }

    /// 权重和（不强制为 1）
    pub fn sum(&self) -> f32 {
        self.influences.iter().map(|(_, w)| w).sum()
    }

    /// 展开为长度为 `joint_count` 的稠密向量
    pub fn to_dense(&self, joint_count: usize) -> Vec<f32> {
        let mut row = vec![0.0; joint_count];
        for &(j, w) in &self.influences {
            if j < joint_count {
                row[j] = w;
            }
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dense_drops_zeros() {
        let weight = VertexWeight::from_dense(&[0.0, 0.25, 0.0, 0.75]);
        assert_eq!(weight.influences(), &[(1, 0.25), (3, 0.75)]);
        assert_eq!(weight.weight_for(2), 0.0);
        assert_eq!(weight.to_dense(4), vec![0.0, 0.25, 0.0, 0.75]);
    }

    #[test]
    fn test_checked_length() {
        let err = VertexWeight::from_dense_checked(7, &[1.0, 0.0], 3).unwrap_err();
        assert!(matches!(
            err,
            SkinError::WeightCountMismatch { vertex: 7, expected: 3, actual: 2 }
        ));
    }
}
