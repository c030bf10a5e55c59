// 该文件是 Haijing （海镜） 项目的一部分。
// src/detection.rs - 检测结果规范化
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

use serde::Serialize;
use thiserror::Error;

use crate::{
  label::{Taxonomy, TaxonomyError},
  model::RawDetection,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
  #[error("图像尺寸无效: {width}x{height}")]
  InvalidImageSize { width: u32, height: u32 },
  #[error(transparent)]
  Taxonomy(#[from] TaxonomyError),
}

/// 原图像素坐标下的整数边界框
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
  pub x1: i32,
  pub y1: i32,
  pub x2: i32,
  pub y2: i32,
}

impl BoundingBox {
  /// 截断（而非四舍五入）浮点坐标
  pub fn truncate(bbox: &[f32; 4]) -> Self {
    Self {
      x1: bbox[0] as i32,
      y1: bbox[1] as i32,
      x2: bbox[2] as i32,
      y2: bbox[3] as i32,
    }
  }
}

/// 规范化后的单个检测记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
  #[serde(rename = "class")]
  pub class_name: String,
  pub confidence: f64,
  pub bbox: BoundingBox,
  pub area_percentage: f64,
}

/// 一次预测的完整结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
  pub detections: Vec<Detection>,
  pub total_detections: usize,
  pub processing_time: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub annotated_image: Option<String>,
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
  let factor = 10f64.powi(decimals);
  (value * factor).round() / factor
}

/// 将检测器原始输出转换为规范记录。
///
/// 面积占比由截断前的浮点边界框计算，不做 [0, 100] 截取：
/// 超出图像范围的框可能得到大于 100 的结果。
pub fn normalize(
  taxonomy: &Taxonomy,
  raw: &RawDetection,
  image_width: u32,
  image_height: u32,
) -> Result<Detection, NormalizeError> {
  if image_width == 0 || image_height == 0 {
    return Err(NormalizeError::InvalidImageSize {
      width: image_width,
      height: image_height,
    });
  }

  let class = taxonomy.resolve(raw.class_index)?;

  let [x1, y1, x2, y2] = raw.bbox.map(f64::from);
  let box_area = (x2 - x1) * (y2 - y1);
  let image_area = f64::from(image_width) * f64::from(image_height);
  let area_percentage = box_area / image_area * 100.0;

  Ok(Detection {
    class_name: class.name.clone(),
    confidence: round_to(f64::from(raw.confidence), 3),
    bbox: BoundingBox::truncate(&raw.bbox),
    area_percentage: round_to(area_percentage, 2),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalize_single_detection() {
    let taxonomy = Taxonomy::oil_spill();
    let raw = RawDetection::new(0, 0.8234, [100.0, 100.0, 300.0, 300.0]);
    let detection = normalize(&taxonomy, &raw, 1000, 500).unwrap();

    assert_eq!(
      detection,
      Detection {
        class_name: "rainbow".to_string(),
        confidence: 0.823,
        bbox: BoundingBox {
          x1: 100,
          y1: 100,
          x2: 300,
          y2: 300
        },
        area_percentage: 8.0,
      }
    );
  }

  #[test]
  fn coordinates_are_truncated_and_area_uses_floats() {
    let taxonomy = Taxonomy::oil_spill();
    let raw = RawDetection::new(1, 0.5, [10.9, 20.7, 30.2, 40.99]);
    let detection = normalize(&taxonomy, &raw, 100, 100).unwrap();

    assert_eq!(
      detection.bbox,
      BoundingBox {
        x1: 10,
        y1: 20,
        x2: 30,
        y2: 40
      }
    );
    // (30.2 - 10.9) * (40.99 - 20.7) / 10000 * 100 = 3.91597
    assert_eq!(detection.area_percentage, 3.92);
  }

  #[test]
  fn area_percentage_matches_formula() {
    let taxonomy = Taxonomy::oil_spill();
    let cases = [
      ([0.0, 0.0, 640.0, 480.0], 640, 480),
      ([5.5, 7.25, 99.0, 41.0], 123, 77),
      ([1.0, 1.0, 2.0, 2.0], 4000, 3000),
      ([12.0, 30.0, 13.0, 31.0], 13, 31),
    ];

    for (bbox, w, h) in cases {
      let raw = RawDetection::new(2, 0.42, bbox);
      let detection = normalize(&taxonomy, &raw, w, h).unwrap();
      let [x1, y1, x2, y2] = bbox.map(f64::from);
      let expected = round_to((x2 - x1) * (y2 - y1) / (w as f64 * h as f64) * 100.0, 2);
      assert_eq!(detection.area_percentage, expected);
      assert!((0.0..=100.0).contains(&detection.area_percentage));
    }
  }

  #[test]
  fn area_percentage_is_not_clamped() {
    let taxonomy = Taxonomy::oil_spill();
    let raw = RawDetection::new(0, 0.9, [-10.0, -10.0, 110.0, 110.0]);
    let detection = normalize(&taxonomy, &raw, 100, 100).unwrap();
    assert_eq!(detection.area_percentage, 144.0);
    assert_eq!(detection.bbox.x1, -10);
  }

  #[test]
  fn normalize_is_deterministic() {
    let taxonomy = Taxonomy::oil_spill();
    let raw = RawDetection::new(2, 0.123_456, [0.3, 0.6, 17.7, 91.1]);
    let a = normalize(&taxonomy, &raw, 333, 222).unwrap();
    let b = normalize(&taxonomy, &raw, 333, 222).unwrap();
    assert_eq!(a.confidence.to_bits(), b.confidence.to_bits());
    assert_eq!(a.area_percentage.to_bits(), b.area_percentage.to_bits());
    assert_eq!(a, b);
  }

  #[test]
  fn zero_sized_image_is_rejected() {
    let taxonomy = Taxonomy::oil_spill();
    let raw = RawDetection::new(0, 0.5, [0.0, 0.0, 1.0, 1.0]);
    assert_eq!(
      normalize(&taxonomy, &raw, 0, 10),
      Err(NormalizeError::InvalidImageSize {
        width: 0,
        height: 10
      })
    );
    assert!(normalize(&taxonomy, &raw, 10, 0).is_err());
  }

  #[test]
  fn unknown_class_is_a_configuration_error() {
    let taxonomy = Taxonomy::oil_spill();
    let raw = RawDetection::new(7, 0.5, [0.0, 0.0, 1.0, 1.0]);
    assert_eq!(
      normalize(&taxonomy, &raw, 10, 10),
      Err(NormalizeError::Taxonomy(TaxonomyError::UnknownClass {
        index: 7,
        classes: 3
      }))
    );
  }

  #[test]
  fn serializes_with_wire_field_names() {
    let result = PredictionResult {
      detections: vec![Detection {
        class_name: "sheen".to_string(),
        confidence: 0.5,
        bbox: BoundingBox {
          x1: 1,
          y1: 2,
          x2: 3,
          y2: 4,
        },
        area_percentage: 1.25,
      }],
      total_detections: 1,
      processing_time: 0.012,
      annotated_image: None,
    };

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(
      value,
      serde_json::json!({
        "detections": [{
          "class": "sheen",
          "confidence": 0.5,
          "bbox": {"x1": 1, "y1": 2, "x2": 3, "y2": 4},
          "area_percentage": 1.25,
        }],
        "total_detections": 1,
        "processing_time": 0.012,
      })
    );
  }
}
