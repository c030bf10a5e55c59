// 该文件是 Haijing （海镜） 项目的一部分。
// src/model/record.rs - 检测记录回放
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

use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::SourceImage,
  model::{Detector, RawDetection},
};

#[derive(Error, Debug)]
pub enum RecordDetectorError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("第 {line} 行格式错误: {message}")]
  ParseError { line: usize, message: String },
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// 从文本记录回放检测结果的检测器。
///
/// 每行一条记录：`class_index, confidence, x1, y1, x2, y2`，
/// 空行与 `#` 开头的注释行会被忽略。
#[derive(Debug, Clone, Default)]
pub struct RecordDetector {
  records: Vec<RawDetection>,
}

impl FromUrlWithScheme for RecordDetector {
  const SCHEME: &'static str = "record";
}

impl FromUrl for RecordDetector {
  type Error = RecordDetectorError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(RecordDetectorError::SchemeMismatch(format!(
        "期望方案 '{}', 实际方案 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    Self::open(crate::url_file_path(url))
  }
}

impl RecordDetector {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RecordDetectorError> {
    let path = path.as_ref();
    info!("加载检测记录: {}", path.display());
    let text = std::fs::read_to_string(path)?;
    let detector = Self::parse(&text)?;
    debug!("检测记录条数: {}", detector.records.len());
    Ok(detector)
  }

  pub fn parse(text: &str) -> Result<Self, RecordDetectorError> {
    let mut records = Vec::new();
    for (index, line) in text.lines().enumerate() {
      let line = line.trim();
      if line.is_empty() || line.starts_with('#') {
        continue;
      }
      records.push(parse_line(line).map_err(|message| RecordDetectorError::ParseError {
        line: index + 1,
        message,
      })?);
    }
    Ok(Self { records })
  }

  pub fn from_records(records: Vec<RawDetection>) -> Self {
    Self { records }
  }

  pub fn records(&self) -> &[RawDetection] {
    &self.records
  }
}

fn parse_line(line: &str) -> Result<RawDetection, String> {
  let fields: Vec<&str> = line.split(',').map(str::trim).collect();
  if fields.len() != 6 {
    return Err(format!("期望 6 个字段, 实际 {} 个", fields.len()));
  }

  let class_index = fields[0]
    .parse::<u32>()
    .map_err(|e| format!("类别索引 '{}' 无效: {}", fields[0], e))?;

  let mut values = [0.0f32; 5];
  for (value, field) in values.iter_mut().zip(&fields[1..]) {
    *value = field
      .parse::<f32>()
      .map_err(|e| format!("数值 '{}' 无效: {}", field, e))?;
  }

  let [confidence, x1, y1, x2, y2] = values;
  if !(0.0..=1.0).contains(&confidence) {
    return Err(format!("置信度 {} 超出 [0, 1]", confidence));
  }
  if x1 >= x2 || y1 >= y2 {
    return Err(format!(
      "边界框 ({}, {}, {}, {}) 无效",
      x1, y1, x2, y2
    ));
  }

  Ok(RawDetection::new(class_index, confidence, [x1, y1, x2, y2]))
}

impl Detector for RecordDetector {
  type Error = RecordDetectorError;

  fn is_loaded(&self) -> bool {
    true
  }

  fn detect<F: SourceImage + ?Sized>(
    &self,
    _image: &F,
    confidence: f32,
  ) -> Result<Vec<RawDetection>, Self::Error> {
    Ok(
      self
        .records
        .iter()
        .filter(|r| r.confidence >= confidence)
        .copied()
        .collect(),
    )
  }
}
