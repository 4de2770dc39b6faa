//! 角色文件导入
//!
//! 三个文本文件组成一个角色：
//! - 骨架：每行 `x y z parent`，`x y z` 为相对父关节的偏移，根关节 parent 为 -1
//! - 网格：OBJ 子集，只读取 `v` 与 `f`
//! - 权重：每行对应一个顶点，给出除根关节外每个关节的权重（也接受包含根关节的完整行）

use std::fs;
use std::path::Path;

use glam::Vec3;

use crate::skeleton::SkeletalModel;
use crate::viewer::ViewerConfig;
use crate::{Result, SkinError};

use super::{CharacterModel, VertexWeight};

/// OBJ 网格数据
#[derive(Clone, Debug, Default)]
pub struct ObjMesh {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<[u32; 3]>,
}

/// 从目录加载角色，文件名取自配置
pub fn load_character<P: AsRef<Path>>(dir: P, config: &ViewerConfig) -> Result<CharacterModel> {
    let dir = dir.as_ref();
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("character"));

    load_character_files(
        name,
        dir.join(&config.skeleton_file),
        dir.join(&config.mesh_file),
        dir.join(&config.attachments_file),
    )
}

/// 从三个文件加载角色
pub fn load_character_files<S, M, A>(
    name: impl Into<String>,
    skeleton_path: S,
    mesh_path: M,
    attachments_path: A,
) -> Result<CharacterModel>
where
    S: AsRef<Path>,
    M: AsRef<Path>,
    A: AsRef<Path>,
{
    let skeleton_text = fs::read_to_string(skeleton_path.as_ref())?;
    let mesh_text = fs::read_to_string(mesh_path.as_ref())?;
    let attachments_text = fs::read_to_string(attachments_path.as_ref())?;

    let skeleton = parse_skeleton(&skeleton_text)?;
    let mesh = parse_obj(&mesh_text)?;
    let weights = parse_attachments(&attachments_text, mesh.vertices.len(), skeleton.joint_count())?;

    CharacterModel::new(name, skeleton, mesh.vertices, mesh.faces, weights)
}

/// 解析骨架文本
pub fn parse_skeleton(text: &str) -> Result<SkeletalModel> {
    let mut offsets = Vec::new();
    let mut parents = Vec::new();

    for (line_no, line) in data_lines(text) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(SkinError::SkeletonParse(format!(
                "line {}: expected `x y z parent`, got `{}`",
                line_no, line
            )));
        }
        let x = parse_f32(fields[0], line_no, SkinError::SkeletonParse)?;
        let y = parse_f32(fields[1], line_no, SkinError::SkeletonParse)?;
        let z = parse_f32(fields[2], line_no, SkinError::SkeletonParse)?;
        let parent = fields[3].parse::<i32>().map_err(|_| {
            SkinError::SkeletonParse(format!("line {}: invalid parent index `{}`", line_no, fields[3]))
        })?;

        offsets.push(Vec3::new(x, y, z));
        parents.push(parent);
    }

    if offsets.is_empty() {
        return Err(SkinError::MissingRoot);
    }
    SkeletalModel::from_parents(&offsets, &parents)
}

/// 解析 OBJ 文本（`v` 与 `f`，多边形按扇形三角化）
pub fn parse_obj(text: &str) -> Result<ObjMesh> {
    let mut mesh = ObjMesh::default();

    for (line_no, line) in data_lines(text) {
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("v") => {
                let coords: Vec<&str> = fields.collect();
                if coords.len() < 3 {
                    return Err(SkinError::MeshParse(format!(
                        "line {}: vertex needs 3 coordinates",
                        line_no
                    )));
                }
                let x = parse_f32(coords[0], line_no, SkinError::MeshParse)?;
                let y = parse_f32(coords[1], line_no, SkinError::MeshParse)?;
                let z = parse_f32(coords[2], line_no, SkinError::MeshParse)?;
                mesh.vertices.push(Vec3::new(x, y, z));
            }
            Some("f") => {
                let indices = fields
                    .map(|token| resolve_obj_index(token, mesh.vertices.len(), line_no))
                    .collect::<Result<Vec<u32>>>()?;
                if indices.len() < 3 {
                    return Err(SkinError::MeshParse(format!(
                        "line {}: face needs at least 3 vertices",
                        line_no
                    )));
                }
                for i in 1..indices.len() - 1 {
                    mesh.faces.push([indices[0], indices[i], indices[i + 1]]);
                }
            }
            // vn / vt / g / o / s / usemtl 等不影响蒙皮
            _ => {}
        }
    }

    Ok(mesh)
}

/// OBJ 面索引：从 1 开始，负数表示相对当前已读顶点的末尾；`a/b/c` 只取位置索引
fn resolve_obj_index(token: &str, vertex_count: usize, line_no: usize) -> Result<u32> {
    let position = token.split('/').next().unwrap_or(token);
    let raw = position.parse::<i64>().map_err(|_| {
        SkinError::MeshParse(format!("line {}: invalid face index `{}`", line_no, token))
    })?;

    let resolved = if raw > 0 {
        raw - 1
    } else if raw < 0 {
        vertex_count as i64 + raw
    } else {
        -1
    };

    if resolved < 0 || resolved >= vertex_count as i64 {
        return Err(SkinError::MeshParse(format!(
            "line {}: face index `{}` out of range (vertex count {})",
            line_no, token, vertex_count
        )));
    }
    Ok(resolved as u32)
}

/// 解析权重文本
///
/// 每行的权重数必须为 `joint_count - 1`（根关节权重为 0）或 `joint_count`，
/// 行数必须等于顶点数，否则整个角色加载失败。
pub fn parse_attachments(text: &str, vertex_count: usize, joint_count: usize) -> Result<Vec<VertexWeight>> {
    let mut weights = Vec::with_capacity(vertex_count);

    for (line_no, line) in data_lines(text) {
        let mut row = line
            .split_whitespace()
            .map(|token| parse_f32(token, line_no, SkinError::AttachmentParse))
            .collect::<Result<Vec<f32>>>()?;

        let vertex = weights.len();
        if row.len() + 1 == joint_count {
            row.insert(0, 0.0);
        }
        weights.push(VertexWeight::from_dense_checked(vertex, &row, joint_count)?);
    }

    if weights.len() != vertex_count {
        return Err(SkinError::VertexCountMismatch {
            expected: vertex_count,
            actual: weights.len(),
        });
    }
    Ok(weights)
}

/// 非空、非注释行，附带从 1 开始的行号
fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

fn parse_f32(token: &str, line_no: usize, make_err: fn(String) -> SkinError) -> Result<f32> {
    token
        .parse::<f32>()
        .map_err(|_| make_err(format!("line {}: invalid number `{}`", line_no, token)))
}
