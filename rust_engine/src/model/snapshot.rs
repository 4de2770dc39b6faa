//! 渲染缓冲区快照

use glam::Vec3;
use std::sync::Arc;

/// 每个顶点的 f32 数量：位置(3) + 法线(3) + 颜色(3)
pub const VERTEX_STRIDE: usize = 9;

/// 网格缓冲区快照
///
/// 每次姿态更新生成一个新的不可变快照，渲染层根据 `revision`
/// 决定复用还是重建设备缓冲区。
#[derive(Clone, Debug)]
pub struct MeshSnapshot {
    /// 交错顶点数据（位置 / 法线 / 颜色）
    pub vertices: Arc<[f32]>,
    pub indices: Arc<[u32]>,
    pub revision: u64,
}

impl MeshSnapshot {
    /// 按面展开构建（平面着色：每个面三个独立顶点，共用面法线）
    pub fn build(
        positions: &[Vec3],
        faces: &[[u32; 3]],
        face_normals: &[Vec3],
        color: Vec3,
        revision: u64,
    ) -> Self {
        let mut vertices = Vec::with_capacity(faces.len() * 3 * VERTEX_STRIDE);
        let mut indices = Vec::with_capacity(faces.len() * 3);

        for (i, face) in faces.iter().enumerate() {
            let normal = face_normals.get(i).copied().unwrap_or(Vec3::ZERO);
            for &vertex_index in face {
                let p = positions
                    .get(vertex_index as usize)
                    .copied()
                    .unwrap_or(Vec3::ZERO);
                vertices.extend_from_slice(&[p.x, p.y, p.z]);
                vertices.extend_from_slice(&[normal.x, normal.y, normal.z]);
                vertices.extend_from_slice(&[color.x, color.y, color.z]);
            }
            let base = (i * 3) as u32;
            indices.extend_from_slice(&[base, base + 1, base + 2]);
        }

        Self {
            vertices: vertices.into(),
            indices: indices.into(),
            revision,
        }
    }

    pub fn empty() -> Self {
        Self {
            vertices: Vec::<f32>::new().into(),
            indices: Vec::<u32>::new().into(),
            revision: 0,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// 读取第 `i` 个展开顶点的位置
    pub fn position(&self, i: usize) -> Option<Vec3> {
        let start = i * VERTEX_STRIDE;
        self.vertices
            .get(start..start + 3)
            .map(|v| Vec3::new(v[0], v[1], v[2]))
    }
}

/// 根据顶点位置计算每个面的法线
pub fn compute_face_normals(positions: &[Vec3], faces: &[[u32; 3]]) -> Vec<Vec3> {
    faces
        .iter()
        .map(|&[a, b, c]| {
            let fetch = |i: u32| positions.get(i as usize).copied().unwrap_or(Vec3::ZERO);
            let (a, b, c) = (fetch(a), fetch(b), fetch(c));
            (b - a).cross(c - a).normalize_or_zero()
        })
        .collect()
}
