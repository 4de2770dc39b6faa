//! 姿态文件读写
//!
//! 文本格式，保存每个关节的欧拉角（度）：
//!
//! ```text
//! Skeletal Pose Data file
//!
//! arm;                // 角色名
//! 3;                  // 关节数
//!
//! Joint0{
//!   0.000000,0.000000,0.000000;   // rotation x,y,z (deg)
//! }
//! ```

use std::fmt;
use std::fs;
use std::path::Path;

use glam::Vec3;

use crate::model::CharacterModel;
use crate::{Result, SkinError};

const HEADER: &str = "Skeletal Pose Data file";

/// 单个关节的旋转
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseJoint {
    pub index: usize,
    /// 欧拉角（度）
    pub rotation: Vec3,
}

/// 姿态文件数据
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoseFile {
    pub model_name: String,
    pub joints: Vec<PoseJoint>,
}

impl PoseFile {
    /// 从文件加载姿态
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// 写入文件
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_string())?;
        Ok(())
    }

    /// 解析姿态文本
    pub fn parse(content: &str) -> Result<Self> {
        if !content.trim_start().starts_with(HEADER) {
            return Err(SkinError::PoseParse("Invalid pose file header".to_string()));
        }

        let lines: Vec<&str> = content.lines().collect();
        let mut model_name = String::new();
        let mut declared_count: Option<usize> = None;
        let mut header_fields = 0;
        let mut joints = Vec::new();
        // 跳过文件头
        let mut i = lines
            .iter()
            .position(|line| line.trim().starts_with(HEADER))
            .map_or(0, |p| p + 1);

        while i < lines.len() {
            let line = strip_comment(lines[i]);

            if line.is_empty() {
                i += 1;
                continue;
            }

            if line.starts_with("Joint") && line.contains('{') {
                joints.push(Self::parse_joint_block(&lines, &mut i)?);
                continue;
            }

            // 头部：先是角色名，然后是关节数
            if let Some(value) = line.strip_suffix(';') {
                let value = value.trim();
                match header_fields {
                    0 => model_name = value.to_string(),
                    1 => {
                        declared_count = Some(value.parse::<usize>().map_err(|_| {
                            SkinError::PoseParse(format!("line {}: invalid joint count `{}`", i + 1, value))
                        })?)
                    }
                    _ => {}
                }
                header_fields += 1;
                i += 1;
                continue;
            }

            return Err(SkinError::PoseParse(format!(
                "line {}: unexpected `{}`",
                i + 1,
                line
            )));
        }

        if let Some(count) = declared_count {
            if count != joints.len() {
                log::warn!(
                    "Pose file declares {} joints but contains {}",
                    count,
                    joints.len()
                );
            }
        }

        log::info!("Pose parsed: '{}', {} joints", model_name, joints.len());
        Ok(Self { model_name, joints })
    }

    /// 解析 `Joint<i>{ ... }` 块
    fn parse_joint_block(lines: &[&str], index: &mut usize) -> Result<PoseJoint> {
        let start = *index;
        let header = strip_comment(lines[start]);
        *index += 1;

        let joint_index = header
            .trim_start_matches("Joint")
            .split('{')
            .next()
            .and_then(|n| n.trim().parse::<usize>().ok())
            .ok_or_else(|| {
                SkinError::PoseParse(format!("line {}: invalid joint header `{}`", start + 1, header))
            })?;

        let mut rotation = None;
        while *index < lines.len() {
            let line_no = *index + 1;
            let line = strip_comment(lines[*index]);
            *index += 1;

            if line.starts_with('}') {
                return rotation
                    .map(|rotation| PoseJoint { index: joint_index, rotation })
                    .ok_or_else(|| {
                        SkinError::PoseParse(format!("line {}: joint {} has no rotation", line_no, joint_index))
                    });
            }
            if line.is_empty() {
                continue;
            }
            rotation = Some(parse_vec3(line).ok_or_else(|| {
                SkinError::PoseParse(format!("line {}: invalid rotation `{}`", line_no, line))
            })?);
        }

        Err(SkinError::PoseParse(format!(
            "line {}: unterminated block for joint {}",
            start + 1,
            joint_index
        )))
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }
}

impl fmt::Display for PoseFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", HEADER)?;
        writeln!(f)?;
        writeln!(f, "{};\t\t// model name", self.model_name)?;
        writeln!(f, "{};\t\t// joint count", self.joints.len())?;
        for joint in &self.joints {
            let r = joint.rotation;
            writeln!(f)?;
            writeln!(f, "Joint{}{{", joint.index)?;
            writeln!(f, "  {:.6},{:.6},{:.6};\t// rotation x,y,z (deg)", r.x, r.y, r.z)?;
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}

impl CharacterModel {
    /// 应用姿态，任何关节索引无效时整体不修改
    pub fn apply_pose(&mut self, pose: &PoseFile) -> Result<()> {
        let rotations: Vec<(usize, Vec3)> = pose
            .joints
            .iter()
            .map(|joint| (joint.index, joint.rotation))
            .collect();
        self.set_joint_rotations(&rotations)
    }

    /// 导出当前所有关节的旋转
    pub fn capture_pose(&self) -> PoseFile {
        PoseFile {
            model_name: self.name.clone(),
            joints: self
                .skeleton()
                .joints()
                .iter()
                .enumerate()
                .map(|(index, joint)| PoseJoint {
                    index,
                    rotation: joint.rotation(),
                })
                .collect(),
        }
    }
}

fn strip_comment(line: &str) -> &str {
    line.split("//").next().unwrap_or("").trim()
}

/// 格式: 0.000000,90.000000,0.000000;
fn parse_vec3(line: &str) -> Option<Vec3> {
    let clean = line.trim_end_matches(';');
    let parts: Vec<&str> = clean.split(',').collect();
    if parts.len() != 3 {
        return None;
    }
    let x = parts[0].trim().parse::<f32>().ok()?;
    let y = parts[1].trim().parse::<f32>().ok()?;
    let z = parts[2].trim().parse::<f32>().ok()?;
    Some(Vec3::new(x, y, z))
}
