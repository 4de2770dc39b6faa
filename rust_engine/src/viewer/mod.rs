//! 查看器层：配置、角色注册表与绘制描述

mod config;
mod context;
mod draw;

pub use config::ViewerConfig;
pub use context::ViewerContext;
pub use draw::{DrawPacket, DrawStyle, RenderBackend};
