// 该文件是 Haijing （海镜） 项目的一部分。
// src/config.rs - 流水线配置
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

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::{
  label::{FALLBACK_COLOR, Taxonomy, TaxonomyError},
  output::{
    Annotator, DEFAULT_FONT_SIZE, DEFAULT_JPEG_QUALITY, DEFAULT_LABEL_OFFSET,
    DEFAULT_STROKE_WIDTH, DEFAULT_TEXT_COLOR, LabelFont,
  },
};

pub const DEFAULT_CONFIDENCE: f32 = 0.15;

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("无法读取配置文件 {path}: {source}")]
  Io {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("配置文件格式错误: {0}")]
  Parse(#[from] toml::de::Error),
  #[error("配置项无效: {0}")]
  Invalid(String),
  #[error("类别表配置错误: {0}")]
  Taxonomy(#[from] TaxonomyError),
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PipelineConfigFile {
  confidence: Option<f32>,
  classes: Option<Vec<ClassConfigFile>>,
  annotation: Option<AnnotationConfigFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClassConfigFile {
  name: String,
  color: [u8; 3],
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct AnnotationConfigFile {
  stroke_width: Option<u32>,
  jpeg_quality: Option<u8>,
  font_path: Option<PathBuf>,
  font_size: Option<f32>,
  label_offset: Option<i32>,
  text_color: Option<[u8; 3]>,
  fallback_color: Option<[u8; 3]>,
}

#[derive(Debug, Clone)]
pub struct AnnotationConfig {
  pub stroke_width: u32,
  pub jpeg_quality: u8,
  pub font_path: Option<PathBuf>,
  pub font_size: f32,
  pub label_offset: i32,
  pub text_color: [u8; 3],
}

impl Default for AnnotationConfig {
  fn default() -> Self {
    Self {
      stroke_width: DEFAULT_STROKE_WIDTH,
      jpeg_quality: DEFAULT_JPEG_QUALITY,
      font_path: None,
      font_size: DEFAULT_FONT_SIZE,
      label_offset: DEFAULT_LABEL_OFFSET,
      text_color: DEFAULT_TEXT_COLOR,
    }
  }
}

impl AnnotationConfig {
  pub fn build_annotator(&self) -> Annotator {
    Annotator::default()
      .with_font(LabelFont::load(self.font_path.as_deref(), self.font_size))
      .with_stroke_width(self.stroke_width)
      .with_jpeg_quality(self.jpeg_quality)
      .with_label_offset(self.label_offset)
      .with_text_color(self.text_color)
  }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
  pub confidence: f32,
  pub taxonomy: Taxonomy,
  pub annotation: AnnotationConfig,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      confidence: DEFAULT_CONFIDENCE,
      taxonomy: Taxonomy::oil_spill(),
      annotation: AnnotationConfig::default(),
    }
  }
}

impl PipelineConfig {
  pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    info!("加载配置文件: {}", path.display());
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_toml_str(&text)
  }

  pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
    let file: PipelineConfigFile = toml::from_str(text)?;
    let annotation_file = file.annotation.unwrap_or_default();

    let confidence = file.confidence.unwrap_or(DEFAULT_CONFIDENCE);
    if !(0.0..=1.0).contains(&confidence) {
      return Err(ConfigError::Invalid(format!(
        "confidence 必须在 [0, 1] 内, 实际为 {}",
        confidence
      )));
    }

    let taxonomy = match file.classes {
      Some(classes) => Taxonomy::new(classes.into_iter().map(|c| (c.name, c.color)))?,
      None => Taxonomy::oil_spill(),
    }
    .with_fallback_color(annotation_file.fallback_color.unwrap_or(FALLBACK_COLOR));

    let defaults = AnnotationConfig::default();
    let annotation = AnnotationConfig {
      stroke_width: annotation_file.stroke_width.unwrap_or(defaults.stroke_width),
      jpeg_quality: annotation_file.jpeg_quality.unwrap_or(defaults.jpeg_quality),
      font_path: annotation_file.font_path,
      font_size: annotation_file.font_size.unwrap_or(defaults.font_size),
      label_offset: annotation_file.label_offset.unwrap_or(defaults.label_offset),
      text_color: annotation_file.text_color.unwrap_or(defaults.text_color),
    };

    if annotation.stroke_width == 0 {
      return Err(ConfigError::Invalid("stroke_width 必须大于 0".to_string()));
    }
    if !(1..=100).contains(&annotation.jpeg_quality) {
      return Err(ConfigError::Invalid(format!(
        "jpeg_quality 必须在 1..=100 内, 实际为 {}",
        annotation.jpeg_quality
      )));
    }
    if annotation.font_size <= 0.0 {
      return Err(ConfigError::Invalid(format!(
        "font_size 必须为正数, 实际为 {}",
        annotation.font_size
      )));
    }

    Ok(Self {
      confidence,
      taxonomy,
      annotation,
    })
  }
}
