// 该文件是 Haijing （海镜） 项目的一部分。
// src/model.rs - 检测器接口
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

use crate::frame::SourceImage;

/// 检测器输出的单个原始目标
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
  pub class_index: u32,
  pub confidence: f32,
  pub bbox: [f32; 4], // [x_min, y_min, x_max, y_max]，原图像素坐标
}

impl RawDetection {
  pub fn new(class_index: u32, confidence: f32, bbox: [f32; 4]) -> Self {
    Self {
      class_index,
      confidence,
      bbox,
    }
  }
}

/// 外部检测器。
///
/// 置信度阈值由检测器自身作为硬截断使用，调用方不会再次过滤。
/// 同一个检测器会被多个请求共享，实现只需保证只读推理可并发。
pub trait Detector {
  type Error: std::error::Error + Send + Sync + 'static;

  fn is_loaded(&self) -> bool;

  fn detect<F: SourceImage + ?Sized>(
    &self,
    image: &F,
    confidence: f32,
  ) -> Result<Vec<RawDetection>, Self::Error>;
}

impl<D: Detector + ?Sized> Detector for &D {
  type Error = D::Error;

  fn is_loaded(&self) -> bool {
    (**self).is_loaded()
  }

  fn detect<F: SourceImage + ?Sized>(
    &self,
    image: &F,
    confidence: f32,
  ) -> Result<Vec<RawDetection>, Self::Error> {
    (**self).detect(image, confidence)
  }
}

impl<D: Detector + ?Sized> Detector for Box<D> {
  type Error = D::Error;

  fn is_loaded(&self) -> bool {
    (**self).is_loaded()
  }

  fn detect<F: SourceImage + ?Sized>(
    &self,
    image: &F,
    confidence: f32,
  ) -> Result<Vec<RawDetection>, Self::Error> {
    (**self).detect(image, confidence)
  }
}

mod record;
pub use self::record::{RecordDetector, RecordDetectorError};
