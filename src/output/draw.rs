// 该文件是 Haijing （海镜） 项目的一部分。
// src/output/draw.rs - 检测结果可视化
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

use image::{Rgb, RgbImage};
use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};

use crate::{
  detection::BoundingBox,
  output::{Annotation, font::LabelFont},
};

pub(crate) struct DrawStyle<'a> {
  pub font: &'a LabelFont,
  pub stroke_width: u32,
  pub label_offset: i32,
  pub text_color: Rgb<u8>,
}

/// 标签文字，置信度取检测器原始分数
pub(crate) fn label_text(class_name: &str, score: f32) -> String {
  format!("{}: {:.2}", class_name, score)
}

/// 填充闭区间 [x0, x1] x [y0, y1]，先与画布求交，画布外的部分直接丢弃
fn fill_clipped(image: &mut RgbImage, (x0, y0): (i64, i64), (x1, y1): (i64, i64), color: Rgb<u8>) {
  // Clamp to image bounds
  let x0 = x0.max(0);
  let y0 = y0.max(0);
  let x1 = x1.min(i64::from(image.width()) - 1);
  let y1 = y1.min(i64::from(image.height()) - 1);
  if x0 > x1 || y0 > y1 {
    return;
  }

  let rect = Rect::at(x0 as i32, y0 as i32).of_size((x1 - x0 + 1) as u32, (y1 - y0 + 1) as u32);
  draw_filled_rect_mut(image, rect, color);
}

/// 绘制边框，线宽向框内延伸；坐标超出画布的部分被裁剪
pub(crate) fn draw_bbox(image: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>, width: u32) {
  if width == 0 {
    return;
  }
  let stroke = i64::from(width);
  let (x_min, x_max) = (i64::from(bbox.x1.min(bbox.x2)), i64::from(bbox.x1.max(bbox.x2)));
  let (y_min, y_max) = (i64::from(bbox.y1.min(bbox.y2)), i64::from(bbox.y1.max(bbox.y2)));

  // 上、下、左、右四条边带，线宽超过半个框时填满整个框
  let top = (y_min + stroke - 1).min(y_max);
  let bottom = (y_max - stroke + 1).max(y_min);
  let left = (x_min + stroke - 1).min(x_max);
  let right = (x_max - stroke + 1).max(x_min);

  fill_clipped(image, (x_min, y_min), (x_max, top), color);
  fill_clipped(image, (x_min, bottom), (x_max, y_max), color);
  fill_clipped(image, (x_min, y_min), (left, y_max), color);
  fill_clipped(image, (right, y_min), (x_max, y_max), color);
}

/// 在框左上角上方绘制带底色的标签，底色恰好覆盖文字范围。
///
/// 靠近图像顶部的框，其标签可能部分或全部落在画布之外。
pub(crate) fn draw_label(image: &mut RgbImage, annotation: &Annotation, color: Rgb<u8>, style: &DrawStyle) {
  let label = label_text(&annotation.detection.class_name, annotation.score);
  let (text_w, text_h) = style.font.text_size(&label);
  if text_w == 0 || text_h == 0 {
    return;
  }

  let bbox = &annotation.detection.bbox;
  let x = i64::from(bbox.x1);
  let y = i64::from(bbox.y1) - i64::from(style.label_offset);
  let (w, h) = (i64::from(text_w), i64::from(text_h));

  // 标签完全落在画布外时不再绘制文字
  if x + w <= 0 || y + h <= 0 || x >= i64::from(image.width()) || y >= i64::from(image.height()) {
    return;
  }

  fill_clipped(image, (x, y), (x + w - 1, y + h - 1), color);
  style.font.draw_text(image, style.text_color, x as i32, y as i32, &label);
}

pub(crate) fn draw_detection(image: &mut RgbImage, annotation: &Annotation, color: Rgb<u8>, style: &DrawStyle) {
  draw_bbox(image, &annotation.detection.bbox, color, style.stroke_width);
  draw_label(image, annotation, color, style);
}
