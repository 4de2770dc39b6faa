//! 姿态数据
//!
//! 关节欧拉角的文本存档，用于保存 / 恢复角色姿态。

mod pose_file;

pub use pose_file::{PoseFile, PoseJoint};
