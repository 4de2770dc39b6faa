//! 查看器上下文
//!
//! 持有所有已加载角色，按句柄访问。由调用方创建并显式传递，不存在全局实例。

use std::collections::HashMap;
use std::path::Path;

use crate::animation::PoseFile;
use crate::model::{self, CharacterModel, DisplayMode};
use crate::{Result, SkinError};

use super::{DrawStyle, RenderBackend, ViewerConfig};

pub struct ViewerContext {
    config: ViewerConfig,
    characters: HashMap<i64, CharacterModel>,
    next_id: i64,
}

impl ViewerContext {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            characters: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// 生成唯一句柄 ID
    fn next_handle_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// 从目录加载角色并返回句柄
    pub fn load_character<P: AsRef<Path>>(&mut self, dir: P) -> Result<i64> {
        let dir = dir.as_ref();
        match model::load_character(dir, &self.config) {
            Ok(character) => {
                let outliers = character.weight_sum_outliers(self.config.weight_sum_tolerance);
                if !outliers.is_empty() {
                    log::warn!(
                        "Character '{}': {} vertices have weight sums away from 1 (first: {})",
                        character.name,
                        outliers.len(),
                        outliers[0]
                    );
                }
                self.insert_character(character)
            }
            Err(e) => {
                log::error!("Failed to load character from {}: {}", dir.display(), e);
                Err(e)
            }
        }
    }

    /// 注册角色并返回句柄，角色采用上下文配置的蒙皮方式与颜色
    pub fn insert_character(&mut self, mut character: CharacterModel) -> Result<i64> {
        character.set_skinning_context(self.config.skinning_context());
        character.set_color(self.config.default_color());
        character.update_mesh_vertices()?;

        let id = self.next_handle_id();
        log::info!("Registered character '{}' as handle {}", character.name, id);
        self.characters.insert(id, character);
        Ok(id)
    }

    pub fn remove_character(&mut self, handle: i64) -> Option<CharacterModel> {
        self.characters.remove(&handle)
    }

    pub fn character(&self, handle: i64) -> Option<&CharacterModel> {
        self.characters.get(&handle)
    }

    pub fn character_mut(&mut self, handle: i64) -> Option<&mut CharacterModel> {
        self.characters.get_mut(&handle)
    }

    fn require_mut(&mut self, handle: i64) -> Result<&mut CharacterModel> {
        self.characters
            .get_mut(&handle)
            .ok_or(SkinError::UnknownCharacter(handle))
    }

    fn require(&self, handle: i64) -> Result<&CharacterModel> {
        self.characters
            .get(&handle)
            .ok_or(SkinError::UnknownCharacter(handle))
    }

    /// 已注册句柄（升序）
    pub fn handles(&self) -> Vec<i64> {
        let mut handles: Vec<i64> = self.characters.keys().copied().collect();
        handles.sort_unstable();
        handles
    }

    pub fn character_count(&self) -> usize {
        self.characters.len()
    }

    // ========== 姿态控制 ==========

    /// 设置关节旋转（度）并重新蒙皮
    pub fn set_joint_transform(&mut self, handle: i64, joint: usize, rx: f32, ry: f32, rz: f32) -> Result<()> {
        self.require_mut(handle)?.set_joint_transform(joint, rx, ry, rz)
    }

    pub fn reset_pose(&mut self, handle: i64) -> Result<()> {
        self.require_mut(handle)?.reset_pose()
    }

    pub fn set_display_mode(&mut self, handle: i64, mode: DisplayMode) -> Result<()> {
        self.require_mut(handle)?.set_display_mode(mode);
        Ok(())
    }

    pub fn save_pose<P: AsRef<Path>>(&self, handle: i64, path: P) -> Result<()> {
        self.require(handle)?.capture_pose().save(path)
    }

    pub fn load_pose<P: AsRef<Path>>(&mut self, handle: i64, path: P) -> Result<()> {
        let pose = PoseFile::load(path)?;
        let character = self.require_mut(handle)?;
        if !pose.model_name.is_empty() && pose.model_name != character.name {
            log::warn!(
                "Pose for '{}' applied to character '{}'",
                pose.model_name,
                character.name
            );
        }
        character.apply_pose(&pose)
    }

    // ========== 绘制 ==========

    /// 为每个角色提交一个绘制描述（按句柄升序），返回提交数量
    pub fn frame(&self, backend: &mut dyn RenderBackend) -> usize {
        let style = DrawStyle::from_config(&self.config);
        let handles = self.handles();
        for &handle in &handles {
            if let Some(character) = self.characters.get(&handle) {
                backend.submit(handle, &character.draw_packet(&style));
            }
        }
        handles.len()
    }
}

impl Default for ViewerContext {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}
