//! 蒙皮角色运行时

use glam::{Mat4, Vec3};
use std::sync::Arc;

use crate::skeleton::{SkeletalModel, SkeletonGeometry};
use crate::skinning::{compute_skinning_with, SkinningContext, SkinningInput};
use crate::viewer::{DrawPacket, DrawStyle};
use crate::{Result, SkinError};

use super::{compute_face_normals, DisplayMode, MaterialColor, MeshSnapshot, VertexWeight};

/// 角色在场景中的位置与缩放
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    pub scale: f32,
}

impl Placement {
    pub fn new(position: Vec3, scale: f32) -> Self {
        Self { position, scale }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position) * Mat4::from_scale(Vec3::splat(self.scale))
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

/// 蒙皮角色
///
/// 绑定顶点是唯一的绑定空间数据源，蒙皮结果写入独立的 `deformed_positions`。
/// 顶点数和关节数在创建后不再改变。
pub struct CharacterModel {
    pub name: String,

    // 静态数据
    bind_vertices: Vec<Vec3>,
    faces: Vec<[u32; 3]>,
    weights: Vec<VertexWeight>,

    // 子系统
    skeleton: SkeletalModel,
    skinning_context: SkinningContext,

    // 运行时数据
    deformed_positions: Vec<Vec3>,
    face_normals: Vec<Vec3>,
    mesh_snapshot: Arc<MeshSnapshot>,
    skeleton_geometry: Arc<SkeletonGeometry>,
    revision: u64,

    // 显示
    display_mode: DisplayMode,
    color: MaterialColor,
    placement: Placement,
}

impl CharacterModel {
    /// 创建角色并完成首次蒙皮
    ///
    /// 权重数必须等于顶点数，每个权重引用的关节必须存在，面索引必须在顶点范围内。
    /// 骨架的绑定姿态若尚未计算，会在这里计算一次。
    pub fn new(
        name: impl Into<String>,
        mut skeleton: SkeletalModel,
        bind_vertices: Vec<Vec3>,
        faces: Vec<[u32; 3]>,
        weights: Vec<VertexWeight>,
    ) -> Result<Self> {
        if weights.len() != bind_vertices.len() {
            return Err(SkinError::VertexCountMismatch {
                expected: bind_vertices.len(),
                actual: weights.len(),
            });
        }

        let joint_count = skeleton.joint_count();
        for weight in &weights {
            if let Some(&(joint, _)) = weight.influences().iter().find(|(j, _)| *j >= joint_count) {
                return Err(SkinError::InvalidJointIndex {
                    index: joint,
                    count: joint_count,
                });
            }
        }

        for (face_index, face) in faces.iter().enumerate() {
            if let Some(&index) = face.iter().find(|&&i| i as usize >= bind_vertices.len()) {
                return Err(SkinError::FaceIndexOutOfRange {
                    face: face_index,
                    index,
                    vertex_count: bind_vertices.len(),
                });
            }
        }

        if !skeleton.is_bind_pose_computed() {
            skeleton.compute_bind_world_to_joint_transforms()?;
        }

        let deformed_positions = bind_vertices.clone();
        let mut model = Self {
            name: name.into(),
            bind_vertices,
            faces,
            weights,
            skeleton,
            skinning_context: SkinningContext::default(),
            deformed_positions,
            face_normals: Vec::new(),
            mesh_snapshot: Arc::new(MeshSnapshot::empty()),
            skeleton_geometry: Arc::new(SkeletonGeometry::default()),
            revision: 0,
            display_mode: DisplayMode::default(),
            color: MaterialColor::default(),
            placement: Placement::default(),
        };
        model.update_mesh_vertices()?;

        log::info!(
            "Character '{}' ready: {} joints, {} vertices, {} faces",
            model.name,
            model.skeleton.joint_count(),
            model.bind_vertices.len(),
            model.faces.len()
        );
        Ok(model)
    }

    /// 获取顶点数量
    pub fn vertex_count(&self) -> usize {
        self.bind_vertices.len()
    }

    /// 获取面数量
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn joint_count(&self) -> usize {
        self.skeleton.joint_count()
    }

    pub fn skeleton(&self) -> &SkeletalModel {
        &self.skeleton
    }

    pub fn bind_vertices(&self) -> &[Vec3] {
        &self.bind_vertices
    }

    /// 替换绑定顶点（数量必须不变），随后重新蒙皮
    pub fn set_bind_vertices(&mut self, vertices: Vec<Vec3>) -> Result<()> {
        if vertices.len() != self.bind_vertices.len() {
            return Err(SkinError::VertexCountMismatch {
                expected: self.bind_vertices.len(),
                actual: vertices.len(),
            });
        }
        self.bind_vertices = vertices;
        self.update_mesh_vertices()
    }

    pub fn deformed_positions(&self) -> &[Vec3] {
        &self.deformed_positions
    }

    pub fn face_normals(&self) -> &[Vec3] {
        &self.face_normals
    }

    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    pub fn attachments(&self) -> &[VertexWeight] {
        &self.weights
    }

    /// 权重和偏离 1 超过 `tolerance` 的顶点索引（只用于诊断，不做修正）
    pub fn weight_sum_outliers(&self, tolerance: f32) -> Vec<usize> {
        self.weights
            .iter()
            .enumerate()
            .filter(|(_, w)| (w.sum() - 1.0).abs() > tolerance)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn set_skinning_context(&mut self, context: SkinningContext) {
        self.skinning_context = context;
    }

    // ========== 姿态 ==========

    /// 设置关节旋转（度）并重新蒙皮
    ///
    /// 索引无效时返回错误，所有变换保持不变。
    pub fn set_joint_transform(&mut self, index: usize, rx: f32, ry: f32, rz: f32) -> Result<()> {
        self.skeleton.set_joint_transform(index, rx, ry, rz)?;
        self.update_mesh_vertices()
    }

    /// 批量设置关节旋转，全部校验通过后才修改，最后只蒙皮一次
    pub fn set_joint_rotations(&mut self, rotations: &[(usize, Vec3)]) -> Result<()> {
        let count = self.skeleton.joint_count();
        if let Some(&(index, _)) = rotations.iter().find(|(i, _)| *i >= count) {
            log::warn!("set_joint_rotations: invalid joint index {} (joint count {})", index, count);
            return Err(SkinError::InvalidJointIndex { index, count });
        }
        for &(index, r) in rotations {
            self.skeleton.set_joint_transform(index, r.x, r.y, r.z)?;
        }
        self.update_mesh_vertices()
    }

    /// 所有关节旋转归零并重新蒙皮
    pub fn reset_pose(&mut self) -> Result<()> {
        self.skeleton.reset_pose();
        self.update_mesh_vertices()
    }

    /// 更新顶点：当前姿态变换 -> 蒙皮 -> 面法线 -> 快照
    pub fn update_mesh_vertices(&mut self) -> Result<()> {
        self.skeleton.update_current_joint_to_world_transforms()?;

        let output = compute_skinning_with(
            &SkinningInput {
                positions: &self.bind_vertices,
                weights: &self.weights,
                joint_matrices: self.skeleton.skinning_matrices(),
            },
            &self.skinning_context,
        )?;
        self.deformed_positions = output.positions;
        self.face_normals = compute_face_normals(&self.deformed_positions, &self.faces);

        self.revision += 1;
        self.rebuild_mesh_snapshot();
        self.skeleton_geometry = Arc::new(SkeletonGeometry::from_skeleton(&self.skeleton));

        log::debug!("Character '{}' reskinned (revision {})", self.name, self.revision);
        Ok(())
    }

    fn rebuild_mesh_snapshot(&mut self) {
        self.mesh_snapshot = Arc::new(MeshSnapshot::build(
            &self.deformed_positions,
            &self.faces,
            &self.face_normals,
            self.color.resolve(),
            self.revision,
        ));
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn mesh_snapshot(&self) -> Arc<MeshSnapshot> {
        Arc::clone(&self.mesh_snapshot)
    }

    pub fn skeleton_geometry(&self) -> Arc<SkeletonGeometry> {
        Arc::clone(&self.skeleton_geometry)
    }

    // ========== 显示 ==========

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        self.display_mode = mode;
    }

    pub fn color(&self) -> MaterialColor {
        self.color
    }

    /// 修改颜色只重建快照，不重新蒙皮
    pub fn set_color(&mut self, color: MaterialColor) {
        self.color = color;
        self.revision += 1;
        self.rebuild_mesh_snapshot();
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn set_placement(&mut self, placement: Placement) {
        self.placement = placement;
    }

    /// 按当前显示模式生成绘制描述
    pub fn draw_packet(&self, style: &DrawStyle) -> DrawPacket {
        let model_matrix = self.placement.matrix();
        let color = self.color.resolve();
        match self.display_mode {
            DisplayMode::Mesh => DrawPacket::Mesh {
                snapshot: self.mesh_snapshot(),
                model_matrix,
                color,
                lighting: true,
            },
            DisplayMode::Skeletal => DrawPacket::Skeletal {
                geometry: self.skeleton_geometry(),
                model_matrix,
                color,
                point_size: style.point_size,
                line_width: style.line_width,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 两节骨骼的竖直“手臂”：根在原点，肘在 (0,1,0)，腕在 (0,2,0)
    fn arm() -> CharacterModel {
        let skeleton = SkeletalModel::from_parents(
            &[Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            &[-1, 0, 1],
        )
        .unwrap();
        let vertices = vec![
            Vec3::new(0.1, 0.5, 0.0),
            Vec3::new(-0.1, 0.5, 0.0),
            Vec3::new(0.1, 1.5, 0.0),
            Vec3::new(-0.1, 1.5, 0.0),
        ];
        let faces = vec![[0, 2, 1], [1, 2, 3]];
        let weights = vec![
            VertexWeight::single(0),
            VertexWeight::single(0),
            VertexWeight::from_dense(&[0.0, 0.5, 0.5]),
            VertexWeight::single(1),
        ];
        CharacterModel::new("arm", skeleton, vertices, faces, weights).unwrap()
    }

    #[test]
    fn test_root_only_identity_skinning() {
        let skeleton = SkeletalModel::from_parents(&[Vec3::new(1.0, 0.0, 0.0)], &[-1]).unwrap();
        let vertices = vec![Vec3::new(0.0, 1.0, 2.0), Vec3::new(3.0, -1.0, 0.5), Vec3::ZERO];
        let weights = vec![VertexWeight::single(0); 3];
        let model = CharacterModel::new("root", skeleton, vertices.clone(), vec![[0, 1, 2]], weights).unwrap();

        for (a, b) in model.deformed_positions().iter().zip(&vertices) {
            assert!(a.abs_diff_eq(*b, 1e-6));
        }
    }

    #[test]
    fn test_bind_pose_equals_bind_vertices() {
        let model = arm();
        for (a, b) in model.deformed_positions().iter().zip(model.bind_vertices()) {
            assert!(a.abs_diff_eq(*b, 1e-6));
        }
    }

    #[test]
    fn test_rotate_then_reset_restores_vertices() {
        let mut model = arm();
        let bind: Vec<Vec3> = model.deformed_positions().to_vec();

        model.set_joint_transform(1, 0.0, 0.0, 90.0).unwrap();
        assert!(!model.deformed_positions()[3].abs_diff_eq(bind[3], 1e-3));
        // 只受根关节影响的顶点不动
        assert!(model.deformed_positions()[0].abs_diff_eq(bind[0], 1e-6));

        model.set_joint_transform(1, 0.0, 0.0, 0.0).unwrap();
        for (a, b) in model.deformed_positions().iter().zip(&bind) {
            assert!(a.abs_diff_eq(*b, 1e-5));
        }
    }

    #[test]
    fn test_elbow_rotation_moves_vertex() {
        let mut model = arm();
        model.set_joint_transform(1, 0.0, 0.0, 90.0).unwrap();
        // 顶点 3 在肘部局部坐标为 (-0.1, 0.5, 0)，绕 Z 转 90 度后为 (-0.5, -0.1, 0)
        let expected = Vec3::new(0.0, 1.0, 0.0) + Vec3::new(-0.5, -0.1, 0.0);
        assert!(model.deformed_positions()[3].abs_diff_eq(expected, 1e-5));
    }

    /// 根下挂两个兄弟关节 A(1) 与 B(2)，顶点 0 的权重由参数给出
    fn posed_pair(weight: VertexWeight) -> Vec3 {
        let skeleton = SkeletalModel::from_parents(
            &[Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            &[-1, 0, 0],
        )
        .unwrap();
        let vertices = vec![Vec3::new(1.0, 1.0, 0.0), Vec3::ZERO, Vec3::X];
        let weights = vec![weight, VertexWeight::single(0), VertexWeight::single(0)];
        let mut model = CharacterModel::new("pair", skeleton, vertices, vec![[0, 1, 2]], weights).unwrap();
        model
            .set_joint_rotations(&[(1, Vec3::new(0.0, 0.0, 40.0)), (2, Vec3::new(25.0, 0.0, 0.0))])
            .unwrap();
        model.deformed_positions()[0]
    }

    #[test]
    fn test_half_weights_average_single_joint_results() {
        let only_a = posed_pair(VertexWeight::single(1));
        let only_b = posed_pair(VertexWeight::single(2));
        let blended = posed_pair(VertexWeight::from_dense(&[0.0, 0.5, 0.5]));
        assert!(blended.abs_diff_eq((only_a + only_b) * 0.5, 1e-5));
    }

    #[test]
    fn test_invalid_joint_index_leaves_state_unchanged() {
        let mut model = arm();
        model.set_joint_transform(1, 0.0, 0.0, 30.0).unwrap();
        let positions = model.deformed_positions().to_vec();
        let transforms = model.skeleton().current_joint_to_world_transforms();
        let revision = model.revision();

        let count = model.joint_count();
        assert!(matches!(
            model.set_joint_transform(count, 10.0, 10.0, 10.0),
            Err(SkinError::InvalidJointIndex { .. })
        ));
        assert!(model
            .set_joint_rotations(&[(0, Vec3::X), (count + 3, Vec3::Y)])
            .is_err());

        assert_eq!(model.deformed_positions(), &positions[..]);
        assert_eq!(model.skeleton().current_joint_to_world_transforms(), transforms);
        assert_eq!(model.revision(), revision);
        assert_eq!(model.skeleton().joint(0).unwrap().rotation(), Vec3::ZERO);
    }

    #[test]
    fn test_pose_before_bind_does_not_leak_into_bind_frame() {
        let mut skeleton = SkeletalModel::from_parents(
            &[Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0)],
            &[-1, 0],
        )
        .unwrap();
        assert!(matches!(
            skeleton.set_joint_transform(1, 0.0, 0.0, 90.0),
            Err(SkinError::BindPoseNotComputed)
        ));

        let vertices = vec![Vec3::ZERO, Vec3::X, Vec3::new(0.0, 1.5, 0.0)];
        let weights = vec![VertexWeight::single(0), VertexWeight::single(0), VertexWeight::single(1)];
        let mut model = CharacterModel::new("early", skeleton, vertices.clone(), vec![[0, 1, 2]], weights).unwrap();

        model.set_joint_transform(1, 0.0, 0.0, 90.0).unwrap();
        model.reset_pose().unwrap();
        for (a, b) in model.deformed_positions().iter().zip(&vertices) {
            assert!(a.abs_diff_eq(*b, 1e-6));
        }
    }

    #[test]
    fn test_weight_count_mismatch_rejected() {
        let skeleton = SkeletalModel::from_parents(&[Vec3::ZERO], &[-1]).unwrap();
        let result = CharacterModel::new(
            "bad",
            skeleton,
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![[0, 1, 2]],
            vec![VertexWeight::single(0)],
        );
        assert!(matches!(result, Err(SkinError::VertexCountMismatch { expected: 3, actual: 1 })));
    }

    #[test]
    fn test_weight_referencing_missing_joint_rejected() {
        let skeleton = SkeletalModel::from_parents(&[Vec3::ZERO], &[-1]).unwrap();
        let result = CharacterModel::new(
            "bad",
            skeleton,
            vec![Vec3::ZERO],
            vec![],
            vec![VertexWeight::single(2)],
        );
        assert!(matches!(result, Err(SkinError::InvalidJointIndex { index: 2, count: 1 })));
    }

    #[test]
    fn test_face_index_out_of_range_rejected() {
        let skeleton = SkeletalModel::from_parents(&[Vec3::ZERO], &[-1]).unwrap();
        let result = CharacterModel::new(
            "bad",
            skeleton,
            vec![Vec3::ZERO, Vec3::X],
            vec![[0, 1, 5]],
            vec![VertexWeight::single(0); 2],
        );
        assert!(matches!(result, Err(SkinError::FaceIndexOutOfRange { face: 0, index: 5, .. })));
    }

    #[test]
    fn test_snapshot_follows_pose() {
        let mut model = arm();
        let first = model.mesh_snapshot();
        model.set_joint_transform(1, 0.0, 0.0, 45.0).unwrap();
        let second = model.mesh_snapshot();

        assert!(second.revision > first.revision);
        assert_eq!(second.vertex_count(), model.face_count() * 3);
        // 快照使用蒙皮后的位置：面 1 的第三个顶点是顶点 3
        let p = second.position(5).unwrap();
        assert!(p.abs_diff_eq(model.deformed_positions()[3], 1e-6));
        // 旧快照不受影响
        assert!(first.position(5).unwrap().abs_diff_eq(Vec3::new(-0.1, 1.5, 0.0), 1e-6));
    }

    #[test]
    fn test_set_bind_vertices_requires_same_count() {
        let mut model = arm();
        assert!(model.set_bind_vertices(vec![Vec3::ZERO]).is_err());

        let shifted: Vec<Vec3> = model.bind_vertices().iter().map(|v| *v + Vec3::Z).collect();
        model.set_bind_vertices(shifted.clone()).unwrap();
        for (a, b) in model.deformed_positions().iter().zip(&shifted) {
            assert!(a.abs_diff_eq(*b, 1e-6));
        }
    }

    #[test]
    fn test_draw_packet_follows_display_mode() {
        let mut model = arm();
        let style = DrawStyle::default();
        assert!(matches!(model.draw_packet(&style), DrawPacket::Mesh { lighting: true, .. }));

        model.set_display_mode(DisplayMode::Skeletal);
        match model.draw_packet(&style) {
            DrawPacket::Skeletal { geometry, .. } => {
                assert_eq!(geometry.joint_count(), 3);
                assert_eq!(geometry.segment_vertex_count(), 4);
            }
            other => panic!("unexpected packet {:?}", other),
        }
    }

    #[test]
    fn test_weight_sum_outliers() {
        let skeleton = SkeletalModel::from_parents(&[Vec3::ZERO, Vec3::X], &[-1, 0]).unwrap();
        let model = CharacterModel::new(
            "sums",
            skeleton,
            vec![Vec3::ZERO, Vec3::X],
            vec![],
            vec![VertexWeight::from_dense(&[0.5, 0.5]), VertexWeight::from_dense(&[0.3, 0.3])],
        )
        .unwrap();
        assert_eq!(model.weight_sum_outliers(1e-3), vec![1]);
    }
}
