//! 矩阵栈

use glam::Mat4;

/// 层级遍历用的累积变换栈
///
/// 栈顶始终是从根到当前遍历位置所有本地变换的乘积，空栈时栈顶为单位矩阵。
#[derive(Clone, Debug, Default)]
pub struct MatrixStack {
    stack: Vec<Mat4>,
}

impl MatrixStack {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    /// 压入：新栈顶 = 旧栈顶 * local
    pub fn push(&mut self, local: Mat4) {
        let top = self.top() * local;
        self.stack.push(top);
    }

    /// 弹出栈顶，恢复之前的累积变换
    pub fn pop(&mut self) -> Option<Mat4> {
        self.stack.pop()
    }

    pub fn top(&self) -> Mat4 {
        self.stack.last().copied().unwrap_or(Mat4::IDENTITY)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// 弹出直到深度为 `depth`（深度已不大于目标时不做任何事）
    pub fn unwind_to(&mut self, depth: usize) {
        self.stack.truncate(depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_push_accumulates() {
        let mut stack = MatrixStack::new();
        let a = Mat4::from_translation(Vec3::X);
        let b = Mat4::from_rotation_z(std::f32::consts::FRAC_PI_2);
        stack.push(a);
        stack.push(b);
        assert!(stack.top().abs_diff_eq(a * b, 1e-6));
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn test_pop_restores_previous_top() {
        let mut stack = MatrixStack::new();
        let a = Mat4::from_translation(Vec3::Y);
        stack.push(a);
        stack.push(Mat4::from_scale(Vec3::splat(2.0)));
        stack.pop();
        assert!(stack.top().abs_diff_eq(a, 1e-6));
        stack.pop();
        assert_eq!(stack.top(), Mat4::IDENTITY);
        assert!(stack.is_empty());
        assert!(stack.pop().is_none());
    }

    #[test]
    fn test_unwind_to() {
        let mut stack = MatrixStack::new();
        for _ in 0..4 {
            stack.push(Mat4::from_translation(Vec3::Z));
        }
        stack.unwind_to(1);
        assert_eq!(stack.depth(), 1);
        assert!(stack.top().abs_diff_eq(Mat4::from_translation(Vec3::Z), 1e-6));
        stack.unwind_to(3);
        assert_eq!(stack.depth(), 1);
    }
}
