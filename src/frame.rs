// 该文件是 Haijing （海镜） 项目的一部分。
// src/frame.rs - 输入图像表示
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

use image::{DynamicImage, GenericImageView, ImageBuffer, Rgb, RgbImage};
use thiserror::Error;

const BGR_CHANNELS: usize = 3;

/// 流水线可接受的源图像。
///
/// 无论底层通道顺序如何，`to_rgb_image` 都返回 R,G,B 顺序的独立副本，
/// 后续绘制只在副本上进行。
pub trait SourceImage {
  fn width(&self) -> u32;
  fn height(&self) -> u32;
  fn to_rgb_image(&self) -> RgbImage;
}

impl SourceImage for DynamicImage {
  fn width(&self) -> u32 {
    GenericImageView::dimensions(self).0
  }

  fn height(&self) -> u32 {
    GenericImageView::dimensions(self).1
  }

  fn to_rgb_image(&self) -> RgbImage {
    self.to_rgb8()
  }
}

impl SourceImage for RgbImage {
  fn width(&self) -> u32 {
    self.dimensions().0
  }

  fn height(&self) -> u32 {
    self.dimensions().1
  }

  fn to_rgb_image(&self) -> RgbImage {
    self.clone()
  }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
  #[error("数据长度不匹配: 期望长度 {expected}, 实际长度 {actual}")]
  LengthMismatch { expected: usize, actual: usize },
}

/// 行优先、B,G,R 通道顺序的原始像素数组
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BgrFrame {
  width: u32,
  height: u32,
  data: Box<[u8]>,
}

impl BgrFrame {
  pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FrameError> {
    let expected = BGR_CHANNELS * width as usize * height as usize;
    if data.len() != expected {
      return Err(FrameError::LengthMismatch {
        expected,
        actual: data.len(),
      });
    }

    Ok(Self {
      width,
      height,
      data: data.into_boxed_slice(),
    })
  }

  pub fn from_rgb_image(image: &RgbImage) -> Self {
    let (width, height) = image.dimensions();
    let mut data = Vec::with_capacity(BGR_CHANNELS * width as usize * height as usize);
    for pixel in image.pixels() {
      let [r, g, b] = pixel.0;
      data.extend_from_slice(&[b, g, r]);
    }

    Self {
      width,
      height,
      data: data.into_boxed_slice(),
    }
  }

  pub fn as_bgr(&self) -> &[u8] {
    &self.data
  }
}

impl SourceImage for BgrFrame {
  fn width(&self) -> u32 {
    self.width
  }

  fn height(&self) -> u32 {
    self.height
  }

  fn to_rgb_image(&self) -> RgbImage {
    let width = self.width as usize;
    let data = &self.data;

    // 将 BGR 转为 RGB 图像
    ImageBuffer::from_fn(self.width, self.height, |x, y| {
      let idx = (y as usize * width + x as usize) * BGR_CHANNELS;
      Rgb([data[idx + 2], data[idx + 1], data[idx]])
    })
  }
}
