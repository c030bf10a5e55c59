// 该文件是 Haijing （海镜） 项目的一部分。
// src/output/font.rs - 标签字体
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use tracing::{debug, warn};

const DEFAULT_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf"); // default font

pub struct LabelFont {
  font: FontArc,
  scale: PxScale,
  builtin: bool,
}

impl Default for LabelFont {
  fn default() -> Self {
    Self::builtin(20.0)
  }
}

impl LabelFont {
  /// 编译进程序的默认字体
  pub fn builtin(size: f32) -> Self {
    let font = FontArc::try_from_slice(DEFAULT_FONT).expect("无法加载内置字体");
    Self {
      font,
      scale: PxScale::from(size),
      builtin: true,
    }
  }

  /// 加载 TrueType 字体，失败时退回内置字体
  pub fn load(path: Option<&Path>, size: f32) -> Self {
    let Some(path) = path else {
      debug!("未指定字体文件，使用内置字体");
      return Self::builtin(size);
    };

    let font = std::fs::read(path)
      .map_err(|e| e.to_string())
      .and_then(|data| FontArc::try_from_vec(data).map_err(|e| e.to_string()));

    match font {
      Ok(font) => {
        debug!("已加载字体: {}", path.display());
        Self {
          font,
          scale: PxScale::from(size),
          builtin: false,
        }
      }
      Err(e) => {
        warn!("无法加载字体 {}: {}，使用内置字体", path.display(), e);
        Self::builtin(size)
      }
    }
  }

  pub fn is_builtin(&self) -> bool {
    self.builtin
  }

  pub fn text_size(&self, text: &str) -> (u32, u32) {
    text_size(self.scale, &self.font, text)
  }

  pub fn draw_text(&self, image: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, text: &str) {
    draw_text_mut(image, color, x, y, self.scale, &self.font, text);
  }
}
