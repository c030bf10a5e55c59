// 该文件是 Haijing （海镜） 项目的一部分。
// src/task.rs - 预测流程编排
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

use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::{
  config::{DEFAULT_CONFIDENCE, PipelineConfig},
  detection::{NormalizeError, PredictionResult, normalize, round_to},
  frame::SourceImage,
  label::{Taxonomy, TaxonomyError},
  model::Detector,
  output::{Annotation, Annotator, RenderError},
};

#[derive(Error, Debug)]
pub enum PredictError {
  #[error("模型未加载")]
  ModelNotReady,
  #[error("检测结果无效: 图像尺寸 {width}x{height}")]
  InvalidDetection { width: u32, height: u32 },
  #[error("配置错误: {0}")]
  Configuration(#[from] TaxonomyError),
  #[error("检测器错误: {0}")]
  Detector(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error("渲染错误: {0}")]
  Render(#[from] RenderError),
}

/// 错误类别，供边界层映射为服务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  ServiceUnavailable,
  BadRequest,
  Internal,
}

impl PredictError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      PredictError::ModelNotReady => ErrorKind::ServiceUnavailable,
      PredictError::InvalidDetection { .. } => ErrorKind::BadRequest,
      PredictError::Configuration(_) | PredictError::Detector(_) | PredictError::Render(_) => {
        ErrorKind::Internal
      }
    }
  }
}

impl From<NormalizeError> for PredictError {
  fn from(err: NormalizeError) -> Self {
    match err {
      NormalizeError::InvalidImageSize { width, height } => {
        PredictError::InvalidDetection { width, height }
      }
      NormalizeError::Taxonomy(e) => PredictError::Configuration(e),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictOptions {
  pub confidence: f32,
  pub annotate: bool,
}

impl Default for PredictOptions {
  fn default() -> Self {
    Self {
      confidence: DEFAULT_CONFIDENCE,
      annotate: false,
    }
  }
}

impl PredictOptions {
  pub fn with_confidence(mut self, confidence: f32) -> Self {
    self.confidence = confidence;
    self
  }

  pub fn with_annotate(mut self, annotate: bool) -> Self {
    self.annotate = annotate;
    self
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
  pub status: &'static str,
  pub model_loaded: bool,
}

/// 预测入口。
///
/// 检测器在构造时注入，之后被所有请求只读共享；每次预测互不影响。
pub struct Predictor<D> {
  detector: D,
  taxonomy: Taxonomy,
  annotator: Annotator,
}

impl<D: Detector> Predictor<D> {
  pub fn new(detector: D) -> Self {
    Self {
      detector,
      taxonomy: Taxonomy::oil_spill(),
      annotator: Annotator::default(),
    }
  }

  pub fn from_config(detector: D, config: &PipelineConfig) -> Self {
    Self {
      detector,
      taxonomy: config.taxonomy.clone(),
      annotator: config.annotation.build_annotator(),
    }
  }

  pub fn with_taxonomy(mut self, taxonomy: Taxonomy) -> Self {
    self.taxonomy = taxonomy;
    self
  }

  pub fn with_annotator(mut self, annotator: Annotator) -> Self {
    self.annotator = annotator;
    self
  }

  pub fn taxonomy(&self) -> &Taxonomy {
    &self.taxonomy
  }

  pub fn health(&self) -> HealthStatus {
    HealthStatus {
      status: "healthy",
      model_loaded: self.detector.is_loaded(),
    }
  }

  /// 运行一次完整预测：检测、规范化，按需渲染标注图像。
  ///
  /// 检测结果为空是正常结果；此时即使请求了标注图像也不会渲染。
  pub fn predict<F: SourceImage + ?Sized>(
    &self,
    image: &F,
    options: PredictOptions,
  ) -> Result<PredictionResult, PredictError> {
    if !self.detector.is_loaded() {
      error!("模型未加载，拒绝预测请求");
      return Err(PredictError::ModelNotReady);
    }

    let (width, height) = (image.width(), image.height());
    info!(
      "开始预测: {}x{}, 置信度阈值 {}, 标注图像 {}",
      width, height, options.confidence, options.annotate
    );

    let now = Instant::now();
    let raw = self
      .detector
      .detect(image, options.confidence)
      .map_err(|e| PredictError::Detector(Box::new(e)))?;
    debug!("检测器返回 {} 个目标，耗时: {:.2?}", raw.len(), now.elapsed());

    let detections = raw
      .iter()
      .map(|r| normalize(&self.taxonomy, r, width, height))
      .collect::<Result<Vec<_>, _>>()?;

    let annotated_image = if options.annotate && !detections.is_empty() {
      // 标签显示检测器的原始分数，而非规范化后的置信度
      let annotations = detections
        .iter()
        .zip(&raw)
        .map(|(detection, r)| Annotation::new(detection, r.confidence))
        .collect::<Vec<_>>();
      Some(self.annotator.render(image, &annotations, &self.taxonomy)?)
    } else {
      None
    };

    let elapsed = now.elapsed();
    info!("预测完成: {} 个目标，耗时: {:.2?}", detections.len(), elapsed);

    Ok(PredictionResult {
      total_detections: detections.len(),
      detections,
      processing_time: round_to(elapsed.as_secs_f64(), 3),
      annotated_image,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::RawDetection;
  use image::RgbImage;
  use std::cell::Cell;

  #[derive(Debug, Error)]
  #[error("fake detector failure")]
  struct FakeError;

  struct FakeDetector {
    loaded: bool,
    fail: bool,
    output: Vec<RawDetection>,
    calls: Cell<usize>,
    threshold: Cell<Option<f32>>,
  }

  impl FakeDetector {
    fn with_output(output: Vec<RawDetection>) -> Self {
      Self {
        loaded: true,
        fail: false,
        output,
        calls: Cell::new(0),
        threshold: Cell::new(None),
      }
    }
  }

  impl Detector for FakeDetector {
    type Error = FakeError;

    fn is_loaded(&self) -> bool {
      self.loaded
    }

    fn detect<F: SourceImage + ?Sized>(
      &self,
      _image: &F,
      confidence: f32,
    ) -> Result<Vec<RawDetection>, Self::Error> {
      self.calls.set(self.calls.get() + 1);
      self.threshold.set(Some(confidence));
      if self.fail {
        return Err(FakeError);
      }
      Ok(self.output.clone())
    }
  }

  #[test]
  fn default_options() {
    let options = PredictOptions::default();
    assert_eq!(options.confidence, 0.15);
    assert!(!options.annotate);
  }

  #[test]
  fn threshold_is_passed_through_without_refiltering() {
    let detector = FakeDetector::with_output(vec![RawDetection::new(1, 0.05, [0.0, 0.0, 5.0, 5.0])]);
    let predictor = Predictor::new(&detector);
    let result = predictor
      .predict(&RgbImage::new(10, 10), PredictOptions::default().with_confidence(0.6))
      .unwrap();

    assert_eq!(detector.threshold.get(), Some(0.6));
    assert_eq!(result.total_detections, 1);
  }

  #[test]
  fn model_not_ready_fails_before_detection() {
    let mut detector = FakeDetector::with_output(vec![]);
    detector.loaded = false;
    let predictor = Predictor::new(&detector);
    let err = predictor
      .predict(&RgbImage::new(10, 10), PredictOptions::default())
      .unwrap_err();

    assert!(matches!(err, PredictError::ModelNotReady));
    assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
    assert_eq!(detector.calls.get(), 0);
    assert!(!predictor.health().model_loaded);
  }

  #[test]
  fn detector_failure_is_propagated() {
    let mut detector = FakeDetector::with_output(vec![]);
    detector.fail = true;
    let err = Predictor::new(&detector)
      .predict(&RgbImage::new(10, 10), PredictOptions::default())
      .unwrap_err();
    assert!(matches!(err, PredictError::Detector(_)));
    assert_eq!(err.kind(), ErrorKind::Internal);
  }

  #[test]
  fn unknown_class_is_configuration_error() {
    let detector = FakeDetector::with_output(vec![RawDetection::new(9, 0.5, [0.0, 0.0, 5.0, 5.0])]);
    let err = Predictor::new(detector)
      .predict(&RgbImage::new(10, 10), PredictOptions::default())
      .unwrap_err();
    assert!(matches!(
      err,
      PredictError::Configuration(TaxonomyError::UnknownClass { index: 9, .. })
    ));
  }

  #[test]
  fn zero_sized_image_is_bad_request() {
    let detector = FakeDetector::with_output(vec![RawDetection::new(0, 0.5, [0.0, 0.0, 5.0, 5.0])]);
    let err = Predictor::new(detector)
      .predict(&RgbImage::new(0, 0), PredictOptions::default())
      .unwrap_err();
    assert!(matches!(
      err,
      PredictError::InvalidDetection {
        width: 0,
        height: 0
      }
    ));
    assert_eq!(err.kind(), ErrorKind::BadRequest);
  }

  #[test]
  fn health_reports_loaded_detector() {
    let predictor = Predictor::new(FakeDetector::with_output(vec![]));
    assert_eq!(
      serde_json::to_value(predictor.health()).unwrap(),
      serde_json::json!({"status": "healthy", "model_loaded": true})
    );
  }
}
