// 该文件是 Haijing （海镜） 项目的一部分。
// src/output.rs - 标注图像渲染
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

use base64::{Engine, engine::general_purpose::STANDARD};
use image::{Rgb, RgbImage, codecs::jpeg::JpegEncoder};
use thiserror::Error;
use tracing::debug;

use crate::{detection::Detection, frame::SourceImage, label::Taxonomy};

mod draw;
mod font;

pub use self::font::LabelFont;
use self::draw::{DrawStyle, draw_detection};

pub const DEFAULT_STROKE_WIDTH: u32 = 3;
pub const DEFAULT_JPEG_QUALITY: u8 = 95;
pub const DEFAULT_FONT_SIZE: f32 = 20.0;
pub const DEFAULT_LABEL_OFFSET: i32 = 25;
pub const DEFAULT_TEXT_COLOR: [u8; 3] = [255, 255, 255];

#[derive(Error, Debug)]
pub enum RenderError {
  #[error("图像编码错误: {0}")]
  Encode(#[from] image::ImageError),
}

/// 待绘制的一条检测：规范记录与检测器给出的原始置信度
#[derive(Debug, Clone, Copy)]
pub struct Annotation<'a> {
  pub detection: &'a Detection,
  pub score: f32,
}

impl<'a> Annotation<'a> {
  pub fn new(detection: &'a Detection, score: f32) -> Self {
    Self { detection, score }
  }
}

/// 标注渲染器：在源图像副本上绘制检测框与标签，并编码为 base64 JPEG。
pub struct Annotator {
  font: LabelFont,
  stroke_width: u32,
  jpeg_quality: u8,
  label_offset: i32,
  text_color: [u8; 3],
}

impl Default for Annotator {
  fn default() -> Self {
    Self {
      font: LabelFont::builtin(DEFAULT_FONT_SIZE),
      stroke_width: DEFAULT_STROKE_WIDTH,
      jpeg_quality: DEFAULT_JPEG_QUALITY,
      label_offset: DEFAULT_LABEL_OFFSET,
      text_color: DEFAULT_TEXT_COLOR,
    }
  }
}

impl Annotator {
  pub fn with_font(mut self, font: LabelFont) -> Self {
    self.font = font;
    self
  }

  pub fn with_stroke_width(mut self, stroke_width: u32) -> Self {
    self.stroke_width = stroke_width;
    self
  }

  pub fn with_jpeg_quality(mut self, jpeg_quality: u8) -> Self {
    self.jpeg_quality = jpeg_quality.clamp(1, 100);
    self
  }

  pub fn with_label_offset(mut self, label_offset: i32) -> Self {
    self.label_offset = label_offset;
    self
  }

  pub fn with_text_color(mut self, text_color: [u8; 3]) -> Self {
    self.text_color = text_color;
    self
  }

  pub fn font(&self) -> &LabelFont {
    &self.font
  }

  /// 按列表顺序绘制所有检测结果，返回新的 RGB 图像，源图像保持不变
  pub fn draw<F: SourceImage + ?Sized>(
    &self,
    image: &F,
    annotations: &[Annotation],
    taxonomy: &Taxonomy,
  ) -> RgbImage {
    let mut canvas = image.to_rgb_image();
    let style = DrawStyle {
      font: &self.font,
      stroke_width: self.stroke_width,
      label_offset: self.label_offset,
      text_color: Rgb(self.text_color),
    };

    for annotation in annotations {
      let color = Rgb(taxonomy.color_for(&annotation.detection.class_name));
      draw_detection(&mut canvas, annotation, color, &style);
    }

    canvas
  }

  pub fn encode_jpeg(&self, image: &RgbImage) -> Result<Vec<u8>, RenderError> {
    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, self.jpeg_quality);
    encoder.encode_image(image)?;
    debug!(
      "JPEG 编码完成: {}x{}, {} 字节",
      image.width(),
      image.height(),
      buffer.len()
    );
    Ok(buffer)
  }

  /// 绘制并编码，整个请求只编码一次
  pub fn render<F: SourceImage + ?Sized>(
    &self,
    image: &F,
    annotations: &[Annotation],
    taxonomy: &Taxonomy,
  ) -> Result<String, RenderError> {
    let canvas = self.draw(image, annotations, taxonomy);
    let jpeg = self.encode_jpeg(&canvas)?;
    Ok(STANDARD.encode(jpeg))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{detection::BoundingBox, frame::BgrFrame};
  use image::{DynamicImage, ImageFormat};

  fn annotate(detections: &[Detection]) -> Vec<Annotation<'_>> {
    detections.iter().map(|d| Annotation::new(d, 0.875)).collect()
  }

  fn detection(class_name: &str, bbox: [i32; 4]) -> Detection {
    Detection {
      class_name: class_name.to_string(),
      confidence: 0.875,
      bbox: BoundingBox {
        x1: bbox[0],
        y1: bbox[1],
        x2: bbox[2],
        y2: bbox[3],
      },
      area_percentage: 0.0,
    }
  }

  #[test]
  fn render_decodes_to_same_size() {
    let image = DynamicImage::new_rgb8(120, 80);
    let detections = [detection("rainbow", [10, 30, 60, 70])];
    let encoded = Annotator::default()
      .render(&image, &annotate(&detections), &Taxonomy::oil_spill())
      .unwrap();

    let bytes = STANDARD.decode(encoded).unwrap();
    let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (120, 80));
  }

  #[test]
  fn draw_does_not_touch_source() {
    let source = RgbImage::from_pixel(40, 40, Rgb([9, 9, 9]));
    let before = source.clone();
    let detections = [detection("sheen", [5, 5, 30, 30])];
    let canvas = Annotator::default().draw(&source, &annotate(&detections), &Taxonomy::oil_spill());

    assert_eq!(source, before);
    assert_eq!(canvas.get_pixel(5, 20), &Rgb([0, 255, 0]));
  }

  #[test]
  fn bgr_source_is_drawn_in_rgb_order() {
    // 源图像在 RGB 中是纯红
    let rgb = RgbImage::from_pixel(30, 30, Rgb([200, 0, 0]));
    let frame = BgrFrame::from_rgb_image(&rgb);
    let detections = [detection("truecolor", [2, 2, 10, 10])];
    let canvas = Annotator::default().draw(&frame, &annotate(&detections), &Taxonomy::oil_spill());

    assert_eq!(canvas.get_pixel(20, 20), &Rgb([200, 0, 0]));
    assert_eq!(canvas.get_pixel(2, 5), &Rgb([0, 0, 255]));
  }

  #[test]
  fn unregistered_class_uses_fallback_color() {
    let source = RgbImage::new(30, 30);
    let detections = [detection("tar ball", [2, 2, 20, 20])];
    let canvas = Annotator::default().draw(&source, &annotate(&detections), &Taxonomy::oil_spill());
    assert_eq!(canvas.get_pixel(2, 10), &Rgb([255, 255, 0]));
  }

  #[test]
  fn later_detections_draw_over_earlier_ones() {
    let source = RgbImage::new(40, 40);
    let detections = [
      detection("rainbow", [5, 5, 30, 30]),
      detection("sheen", [5, 5, 30, 30]),
    ];
    let canvas = Annotator::default()
      .with_stroke_width(1)
      .draw(&source, &annotate(&detections), &Taxonomy::oil_spill());
    assert_eq!(canvas.get_pixel(5, 20), &Rgb([0, 255, 0]));
  }

  #[test]
  fn label_is_drawn_from_raw_score() {
    let source = RgbImage::new(160, 80);
    let record = detection("rainbow", [10, 40, 100, 70]);
    let draw = |score: f32| {
      Annotator::default().draw(&source, &[Annotation::new(&record, score)], &Taxonomy::oil_spill())
    };

    // 0.8251 规范化后为 0.825，但标签按原始分数显示 0.83
    assert_eq!(draw(0.8251), draw(0.83));
    assert_ne!(draw(0.8251), draw(0.82));
  }
}
