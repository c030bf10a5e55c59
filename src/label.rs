// 该文件是 Haijing （海镜） 项目的一部分。
// src/label.rs - 类别表
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

use thiserror::Error;

/// 油污类别（顺序即检测器输出的类别索引）
pub const OIL_SPILL_CLASSES: [(&str, [u8; 3]); 3] = [
  ("rainbow", [255, 0, 0]),
  ("sheen", [0, 255, 0]),
  ("truecolor", [0, 0, 255]),
];

/// 未登记类别时的绘制颜色（黄色）
pub const FALLBACK_COLOR: [u8; 3] = [255, 255, 0];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaxonomyError {
  #[error("类别索引 {index} 超出类别表范围（共 {classes} 个类别）")]
  UnknownClass { index: u32, classes: usize },
  #[error("类别表为空")]
  Empty,
  #[error("类别名称重复: {0}")]
  DuplicateName(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassEntry {
  pub index: u32,
  pub name: String,
  pub color: [u8; 3],
}

/// 类别索引到名称、颜色的固定映射。
///
/// 索引从 0 开始连续编号，必须与检测器输出的类别空间完全一致；
/// 构建完成后不可修改。
#[derive(Debug, Clone)]
pub struct Taxonomy {
  entries: Box<[ClassEntry]>,
  fallback_color: [u8; 3],
}

impl Default for Taxonomy {
  fn default() -> Self {
    Self::oil_spill()
  }
}

impl Taxonomy {
  pub fn new<I, S>(classes: I) -> Result<Self, TaxonomyError>
  where
    I: IntoIterator<Item = (S, [u8; 3])>,
    S: Into<String>,
  {
    let mut entries: Vec<ClassEntry> = Vec::new();
    for (index, (name, color)) in classes.into_iter().enumerate() {
      let name = name.into();
      if entries.iter().any(|e| e.name == name) {
        return Err(TaxonomyError::DuplicateName(name));
      }
      entries.push(ClassEntry {
        index: index as u32,
        name,
        color,
      });
    }

    if entries.is_empty() {
      return Err(TaxonomyError::Empty);
    }

    Ok(Self {
      entries: entries.into_boxed_slice(),
      fallback_color: FALLBACK_COLOR,
    })
  }

  pub fn oil_spill() -> Self {
    let entries = OIL_SPILL_CLASSES
      .iter()
      .enumerate()
      .map(|(index, (name, color))| ClassEntry {
        index: index as u32,
        name: name.to_string(),
        color: *color,
      })
      .collect();

    Self {
      entries,
      fallback_color: FALLBACK_COLOR,
    }
  }

  pub fn with_fallback_color(mut self, color: [u8; 3]) -> Self {
    self.fallback_color = color;
    self
  }

  pub fn resolve(&self, index: u32) -> Result<&ClassEntry, TaxonomyError> {
    self
      .entries
      .get(index as usize)
      .ok_or(TaxonomyError::UnknownClass {
        index,
        classes: self.entries.len(),
      })
  }

  /// 按名称查找颜色，找不到时返回兜底颜色（仅作绘制保护）
  pub fn color_for(&self, name: &str) -> [u8; 3] {
    self
      .entries
      .iter()
      .find(|e| e.name == name)
      .map(|e| e.color)
      .unwrap_or(self.fallback_color)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &ClassEntry> {
    self.entries.iter()
  }
}
