//! 骨架模型

use glam::{Mat4, Vec3};

use super::{Joint, MatrixStack};
use crate::{Result, SkinError};

/// 骨架模型
///
/// 所有关节保存在扁平列表中，索引在模型生命周期内保持稳定，
/// 外部控制器（如姿态滑块）可以直接用整数索引定位关节。
pub struct SkeletalModel {
    joints: Vec<Joint>,
    root: Option<usize>,
    matrix_stack: MatrixStack,
    skinning_matrices: Vec<Mat4>,
    bind_pose_computed: bool,
}

impl SkeletalModel {
    pub fn new() -> Self {
        Self {
            joints: Vec::new(),
            root: None,
            matrix_stack: MatrixStack::new(),
            skinning_matrices: Vec::new(),
            bind_pose_computed: false,
        }
    }

    /// 从父索引列表构建骨架
    ///
    /// `parents[0]` 必须为 -1（根关节），其余关节的父索引必须指向更早出现的关节。
    pub fn from_parents(offsets: &[Vec3], parents: &[i32]) -> Result<Self> {
        if offsets.len() != parents.len() {
            return Err(SkinError::SkeletonParse(format!(
                "{} offsets but {} parent indices",
                offsets.len(),
                parents.len()
            )));
        }

        let mut model = Self::new();
        for (i, (&offset, &parent)) in offsets.iter().zip(parents).enumerate() {
            let joint = Joint::new(offset);
            if parent < 0 {
                model.set_root(joint)?;
            } else if (parent as usize) < i {
                model.add_joint_child(parent as usize, joint)?;
            } else {
                return Err(SkinError::SkeletonParse(format!(
                    "joint {} references parent {} which is not defined before it",
                    i, parent
                )));
            }
        }

        if model.root.is_none() && !model.joints.is_empty() {
            return Err(SkinError::MissingRoot);
        }
        Ok(model)
    }

    /// 设置根关节，根关节总是位于索引 0
    pub fn set_root(&mut self, mut joint: Joint) -> Result<usize> {
        if self.root.is_some() {
            return Err(SkinError::RootAlreadySet);
        }
        joint.parent = None;
        joint.children.clear();
        Ok(self.push_joint(joint, None))
    }

    /// 在 `parent_index` 下添加子关节，返回新关节的索引
    ///
    /// 索引越界或绑定姿态已计算时返回错误，状态不变。
    pub fn add_joint_child(&mut self, parent_index: usize, mut child: Joint) -> Result<usize> {
        if parent_index >= self.joints.len() {
            log::error!(
                "Invalid parent index {} (joint count {})",
                parent_index,
                self.joints.len()
            );
            return Err(SkinError::InvalidJointIndex {
                index: parent_index,
                count: self.joints.len(),
            });
        }
        if self.bind_pose_computed {
            return Err(SkinError::HierarchyFrozen);
        }

        child.parent = Some(parent_index);
        child.children.clear();
        let index = self.push_joint(child, Some(parent_index));
        self.joints[parent_index].children.push(index);
        Ok(index)
    }

    fn push_joint(&mut self, joint: Joint, parent: Option<usize>) -> usize {
        let index = self.joints.len();
        self.joints.push(joint);
        if parent.is_none() {
            self.root = Some(index);
        }
        index
    }

    /// 获取关节数量
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn root_index(&self) -> Option<usize> {
        self.root
    }

    pub fn joint(&self, index: usize) -> Option<&Joint> {
        self.joints.get(index)
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn is_bind_pose_computed(&self) -> bool {
        self.bind_pose_computed
    }

    pub fn matrix_stack(&self) -> &MatrixStack {
        &self.matrix_stack
    }

    /// 设置关节旋转（度）
    ///
    /// 只修改本地变换，调用方需要随后调用
    /// [`update_current_joint_to_world_transforms`](Self::update_current_joint_to_world_transforms)。
    /// 绑定姿态计算之前拒绝任何旋转。
    pub fn set_joint_transform(&mut self, index: usize, rx: f32, ry: f32, rz: f32) -> Result<()> {
        if !self.bind_pose_computed {
            log::warn!("set_joint_transform: joint {} posed before bind pose was computed", index);
            return Err(SkinError::BindPoseNotComputed);
        }
        let count = self.joints.len();
        match self.joints.get_mut(index) {
            Some(joint) => {
                joint.set_rotation(Vec3::new(rx, ry, rz));
                Ok(())
            }
            None => {
                log::warn!("set_joint_transform: invalid joint index {} (joint count {})", index, count);
                Err(SkinError::InvalidJointIndex { index, count })
            }
        }
    }

    /// 所有关节旋转归零
    pub fn reset_pose(&mut self) {
        for joint in &mut self.joints {
            joint.set_rotation(Vec3::ZERO);
        }
    }

    /// 计算绑定姿态下每个关节的 世界 -> 关节 变换
    ///
    /// 只能在所有关节仍处于绑定姿态时调用一次；再次调用会返回错误且不修改结果。
    pub fn compute_bind_world_to_joint_transforms(&mut self) -> Result<()> {
        if self.bind_pose_computed {
            log::warn!("Bind pose already computed, ignoring recomputation");
            return Err(SkinError::BindPoseAlreadyComputed);
        }

        self.traverse(|joint, world| {
            joint.bind_world_to_joint = world.inverse();
            joint.current_joint_to_world = world;
        })?;

        self.bind_pose_computed = true;
        self.refresh_skinning_matrices();
        log::debug!("Bind pose computed for {} joints", self.joints.len());
        Ok(())
    }

    /// 根据当前旋转重新计算每个关节的 关节 -> 世界 变换
    ///
    /// 每次都完整遍历整棵树。
    pub fn update_current_joint_to_world_transforms(&mut self) -> Result<()> {
        if !self.bind_pose_computed {
            return Err(SkinError::BindPoseNotComputed);
        }

        self.traverse(|joint, world| {
            joint.current_joint_to_world = world;
        })?;

        self.refresh_skinning_matrices();
        Ok(())
    }

    /// 前序深度优先遍历，`visit` 收到关节及其累积世界变换
    ///
    /// 工作表中的每一项记录进入该关节时的栈深度，访问前先回退到该深度，
    /// 因此无论树的形状如何，遍历结束后栈都回到初始深度。
    fn traverse<F>(&mut self, mut visit: F) -> Result<usize>
    where
        F: FnMut(&mut Joint, Mat4),
    {
        let root = self.root.ok_or(SkinError::MissingRoot)?;
        let base_depth = self.matrix_stack.depth();
        let mut worklist: Vec<(usize, usize)> = vec![(root, base_depth)];
        let mut visited = 0;

        while let Some((index, depth)) = worklist.pop() {
            self.matrix_stack.unwind_to(depth);
            self.matrix_stack.push(self.joints[index].local_transform());
            let world = self.matrix_stack.top();

            let joint = &mut self.joints[index];
            visit(&mut *joint, world);
            visited += 1;

            // 逆序压入，保证子关节按原顺序出栈
            for &child in joint.children.iter().rev() {
                worklist.push((child, depth + 1));
            }
        }

        self.matrix_stack.unwind_to(base_depth);
        Ok(visited)
    }

    fn refresh_skinning_matrices(&mut self) {
        self.skinning_matrices.clear();
        self.skinning_matrices
            .extend(self.joints.iter().map(Joint::skinning_matrix));
    }

    /// 蒙皮矩阵数组（按扁平索引）
    pub fn skinning_matrices(&self) -> &[Mat4] {
        &self.skinning_matrices
    }

    pub fn bind_world_to_joint_transforms(&self) -> Vec<Mat4> {
        self.joints.iter().map(|j| j.bind_world_to_joint).collect()
    }

    pub fn current_joint_to_world_transforms(&self) -> Vec<Mat4> {
        self.joints.iter().map(|j| j.current_joint_to_world).collect()
    }

    /// 当前姿态下所有关节的世界坐标（扁平索引顺序）
    pub fn joint_centers(&self) -> Vec<Vec3> {
        self.joints.iter().map(Joint::world_position).collect()
    }

    /// 父子关节世界坐标对，每条父子边一对
    pub fn bone_pairs(&self) -> Vec<(Vec3, Vec3)> {
        let mut pairs = Vec::with_capacity(self.joints.len().saturating_sub(1));
        for joint in &self.joints {
            let parent_pos = joint.world_position();
            for &child in &joint.children {
                pairs.push((parent_pos, self.joints[child].world_position()));
            }
        }
        pairs
    }
}

impl Default for SkeletalModel {
    fn default() -> Self {
        Self::new()
    }
}
