//! 关节节点

use glam::{Mat4, Vec3};

/// 关节节点
///
/// 父子关系以骨架内的扁平索引保存，关节本身不持有其它关节。
#[derive(Clone, Debug)]
pub struct Joint {
    pub parent: Option<usize>,
    pub children: Vec<usize>,

    // 相对于父关节的固定偏移（导入时确定）
    offset: Vec3,
    // 当前旋转角度（度），按 X·Y·Z 顺序绕局部轴应用
    rotation: Vec3,
    // 本地变换 = T(offset) · Rx · Ry · Rz
    local_transform: Mat4,

    // 绑定姿态：世界 -> 关节（只计算一次）
    pub(crate) bind_world_to_joint: Mat4,
    // 当前姿态：关节 -> 世界
    pub(crate) current_joint_to_world: Mat4,
}

impl Joint {
    pub fn new(offset: Vec3) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            offset,
            rotation: Vec3::ZERO,
            local_transform: Mat4::from_translation(offset),
            bind_world_to_joint: Mat4::IDENTITY,
            current_joint_to_world: Mat4::IDENTITY,
        }
    }

    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    /// 当前旋转角度（度）
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    /// 设置旋转角度（度）
    ///
    /// 只替换本地变换的旋转部分，平移偏移保持不变。
    pub fn set_rotation(&mut self, angles: Vec3) {
        self.rotation = angles;
        self.local_transform = Mat4::from_translation(self.offset) * rotation_matrix(angles);
    }

    pub fn local_transform(&self) -> Mat4 {
        self.local_transform
    }

    pub fn bind_world_to_joint_transform(&self) -> Mat4 {
        self.bind_world_to_joint
    }

    pub fn current_joint_to_world_transform(&self) -> Mat4 {
        self.current_joint_to_world
    }

    /// 蒙皮矩阵 = 当前关节到世界 * 绑定世界到关节
    pub fn skinning_matrix(&self) -> Mat4 {
        self.current_joint_to_world * self.bind_world_to_joint
    }

    /// 当前姿态下关节原点的世界坐标
    pub fn world_position(&self) -> Vec3 {
        self.current_joint_to_world.transform_point3(Vec3::ZERO)
    }
}

impl Default for Joint {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

/// 欧拉角（度）转旋转矩阵：Rx · Ry · Rz
pub fn rotation_matrix(angles: Vec3) -> Mat4 {
    Mat4::from_rotation_x(angles.x.to_radians())
        * Mat4::from_rotation_y(angles.y.to_radians())
        * Mat4::from_rotation_z(angles.z.to_radians())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_rotation_keeps_offset() {
        let mut joint = Joint::new(Vec3::new(1.0, 2.0, 3.0));
        joint.set_rotation(Vec3::new(30.0, -45.0, 90.0));

        let translation = joint.local_transform().w_axis.truncate();
        assert!(translation.abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-6));
        assert_eq!(joint.rotation(), Vec3::new(30.0, -45.0, 90.0));
    }

    #[test]
    fn test_rotation_order_xyz() {
        let mut joint = Joint::new(Vec3::ZERO);
        joint.set_rotation(Vec3::new(90.0, 90.0, 0.0));

        // Rx(90) · Ry(90) 作用于 +X：Ry 先把 X 转到 -Z，Rx 再把 -Z 转到 +Y
        let p = joint.local_transform().transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::Y, 1e-5), "{p:?}");
    }

    #[test]
    fn test_zero_rotation_restores_translation_only() {
        let mut joint = Joint::new(Vec3::new(0.0, 1.0, 0.0));
        joint.set_rotation(Vec3::new(10.0, 20.0, 30.0));
        joint.set_rotation(Vec3::ZERO);
        assert!(joint
            .local_transform()
            .abs_diff_eq(Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)), 1e-6));
    }
}
