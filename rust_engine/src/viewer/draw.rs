//! 绘制描述与渲染后端接口

use glam::{Mat4, Vec3};
use std::sync::Arc;

use crate::model::MeshSnapshot;
use crate::skeleton::SkeletonGeometry;

use super::ViewerConfig;

/// 骨架绘制样式
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawStyle {
    pub point_size: f32,
    pub line_width: f32,
}

impl DrawStyle {
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            point_size: config.joint_point_size,
            line_width: config.bone_line_width,
        }
    }
}

impl Default for DrawStyle {
    fn default() -> Self {
        Self {
            point_size: 8.0,
            line_width: 2.0,
        }
    }
}

/// 一个角色一帧的绘制内容
///
/// 数据都是不可变快照，后端可以跨线程持有。
#[derive(Clone, Debug)]
pub enum DrawPacket {
    /// 带光照的三角形网格
    Mesh {
        snapshot: Arc<MeshSnapshot>,
        model_matrix: Mat4,
        color: Vec3,
        lighting: bool,
    },
    /// 关节点 + 骨骼线段，不带光照
    Skeletal {
        geometry: Arc<SkeletonGeometry>,
        model_matrix: Mat4,
        color: Vec3,
        point_size: f32,
        line_width: f32,
    },
}

impl DrawPacket {
    pub fn model_matrix(&self) -> Mat4 {
        match self {
            DrawPacket::Mesh { model_matrix, .. } | DrawPacket::Skeletal { model_matrix, .. } => {
                *model_matrix
            }
        }
    }
}

/// 渲染后端
pub trait RenderBackend {
    fn submit(&mut self, handle: i64, packet: &DrawPacket);
}
