//! 关节 / 骨骼调试几何

use glam::Vec3;

use super::SkeletalModel;

/// 骨架调试几何（当前姿态的投影，不持有独立状态）
#[derive(Clone, Debug, Default)]
pub struct SkeletonGeometry {
    /// 每个关节一个点，按扁平索引顺序
    pub joint_points: Vec<Vec3>,
    /// 每条父子边两个点：父关节位置、子关节位置
    pub bone_segments: Vec<Vec3>,
}

impl SkeletonGeometry {
    /// 从骨架当前姿态生成
    ///
    /// 父子配对与父关节访问在同一次循环中完成。
    pub fn from_skeleton(skeleton: &SkeletalModel) -> Self {
        let joints = skeleton.joints();
        let mut joint_points = Vec::with_capacity(joints.len());
        let mut bone_segments = Vec::with_capacity(joints.len().saturating_sub(1) * 2);

        for joint in joints {
            let parent_pos = joint.world_position();
            joint_points.push(parent_pos);
            for &child in &joint.children {
                bone_segments.push(parent_pos);
                bone_segments.push(joints[child].world_position());
            }
        }

        Self {
            joint_points,
            bone_segments,
        }
    }

    pub fn joint_count(&self) -> usize {
        self.joint_points.len()
    }

    /// 线段顶点数（= 2 × 边数）
    pub fn segment_vertex_count(&self) -> usize {
        self.bone_segments.len()
    }

    /// 平铺的关节点缓冲区（xyz）
    pub fn joint_points_raw(&self) -> Vec<f32> {
        flatten(&self.joint_points)
    }

    /// 平铺的骨骼线段缓冲区（xyz）
    pub fn bone_segments_raw(&self) -> Vec<f32> {
        flatten(&self.bone_segments)
    }
}

fn flatten(points: &[Vec3]) -> Vec<f32> {
    let mut raw = Vec::with_capacity(points.len() * 3);
    for p in points {
        raw.extend_from_slice(&[p.x, p.y, p.z]);
    }
    raw
}
