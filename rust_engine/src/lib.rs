//! SSD Engine - 骨骼蒙皮角色查看器核心
//!
//! 提供以下功能：
//! - 骨骼层级（关节树）与绑定姿态 / 当前姿态变换计算
//! - 线性混合蒙皮（LBS / SSD）顶点计算
//! - 骨架 / 网格 / 权重文本文件导入
//! - 姿态文件读写
//! - 面向渲染层的缓冲区快照与绘制描述

pub mod animation;
pub mod model;
pub mod skeleton;
pub mod skinning;
pub mod viewer;

pub use animation::PoseFile;
pub use model::{CharacterModel, DisplayMode, MeshSnapshot, VertexWeight};
pub use skeleton::{Joint, MatrixStack, SkeletalModel, SkeletonGeometry};
pub use skinning::{compute_skinning, SkinningContext};
pub use viewer::{DrawPacket, DrawStyle, RenderBackend, ViewerConfig, ViewerContext};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkinError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Skeleton parse error: {0}")]
    SkeletonParse(String),

    #[error("Mesh parse error: {0}")]
    MeshParse(String),

    #[error("Attachment parse error: {0}")]
    AttachmentParse(String),

    #[error("Pose parse error: {0}")]
    PoseParse(String),

    #[error("Invalid joint index {index} (joint count {count})")]
    InvalidJointIndex { index: usize, count: usize },

    #[error("Root joint already set")]
    RootAlreadySet,

    #[error("Skeleton has no root joint")]
    MissingRoot,

    #[error("Joint hierarchy is frozen after bind pose computation")]
    HierarchyFrozen,

    #[error("Vertex {vertex} has {actual} weights, expected {expected}")]
    WeightCountMismatch { vertex: usize, expected: usize, actual: usize },

    #[error("Vertex count mismatch: expected {expected}, got {actual}")]
    VertexCountMismatch { expected: usize, actual: usize },

    #[error("Face {face} references vertex {index} (vertex count {vertex_count})")]
    FaceIndexOutOfRange { face: usize, index: u32, vertex_count: usize },

    #[error("Bind pose has not been computed")]
    BindPoseNotComputed,

    #[error("Bind pose already computed")]
    BindPoseAlreadyComputed,

    #[error("Unknown character handle: {0}")]
    UnknownCharacter(i64),
}

pub type Result<T> = std::result::Result<T, SkinError>;
