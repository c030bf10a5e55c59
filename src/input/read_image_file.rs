// 该文件是 Haijing （海镜） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use image::{DynamicImage, ImageReader};
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::BgrFrame};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Image loading error: {0}")]
  ImageLoadError(#[from] image::ImageError),
}

pub struct ImageFileInput {
  image: DynamicImage,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemaMismatch);
    }

    let path = crate::url_file_path(url);
    let image = ImageReader::open(&path)?.with_guessed_format()?.decode()?;
    debug!("读取图像 {}: {}x{}", path, image.width(), image.height());

    Ok(ImageFileInput { image })
  }
}

impl ImageFileInput {
  pub fn image(&self) -> &DynamicImage {
    &self.image
  }

  /// 转为 B,G,R 顺序的原始像素数组
  pub fn into_bgr(self) -> BgrFrame {
    BgrFrame::from_rgb_image(&self.image.to_rgb8())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::frame::SourceImage;
  use image::{Rgb, RgbImage};

  fn image_url(path: &std::path::Path) -> Url {
    Url::parse(&format!("image://{}", path.display())).unwrap()
  }

  #[test]
  fn reads_png_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.png");
    RgbImage::from_pixel(6, 4, Rgb([1, 2, 3])).save(&path).unwrap();

    let input = ImageFileInput::from_url(&image_url(&path)).unwrap();
    assert_eq!(SourceImage::width(input.image()), 6);

    let frame = input.into_bgr();
    assert_eq!(&frame.as_bgr()[..3], &[3, 2, 1]);
  }

  #[test]
  fn percent_encoded_path_is_decoded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("oil spill.png");
    RgbImage::new(2, 2).save(&path).unwrap();

    let url = Url::parse(&format!("image://{}", dir.path().join("oil%20spill.png").display())).unwrap();
    assert!(ImageFileInput::from_url(&url).is_ok());
  }

  #[test]
  fn wrong_scheme_is_rejected() {
    let url = Url::parse("record:///tmp/a.png").unwrap();
    assert!(matches!(
      ImageFileInput::from_url(&url),
      Err(ImageFileInputError::SchemaMismatch)
    ));
  }
}
