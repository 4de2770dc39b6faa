//! 骨骼层级与姿态变换

mod geometry;
mod joint;
mod matrix_stack;
mod skeletal_model;

pub use geometry::SkeletonGeometry;
pub use joint::{rotation_matrix, Joint};
pub use matrix_stack::MatrixStack;
pub use skeletal_model::SkeletalModel;
