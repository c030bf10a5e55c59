// 该文件是 Haijing （海镜） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::{Context, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use clap::Parser;
use tracing::info;

use haijing::{
  FromUrl, Predictor,
  config::PipelineConfig,
  input::ImageFileInput,
  model::RecordDetector,
  task::PredictOptions,
};

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .init();

  let args = args::Args::parse();

  info!("检测器: {}", args.detector);
  info!("输入来源: {}", args.input);

  let config = match &args.config {
    Some(path) => PipelineConfig::load(path)
      .with_context(|| format!("无法加载配置文件: {}", path.display()))?,
    None => PipelineConfig::default(),
  };

  let detector = RecordDetector::from_url(&args.detector)
    .with_context(|| format!("无法加载检测器: {}", args.detector))?;
  let predictor = Predictor::from_config(detector, &config);

  let input = ImageFileInput::from_url(&args.input)
    .with_context(|| format!("无法读取输入图像: {}", args.input))?;

  let options = PredictOptions::default()
    .with_confidence(args.confidence.unwrap_or(config.confidence))
    .with_annotate(args.annotate || args.annotated_output.is_some());

  let result = if args.bgr {
    predictor.predict(&input.into_bgr(), options)?
  } else {
    predictor.predict(input.image(), options)?
  };

  if let Some(path) = &args.annotated_output {
    match &result.annotated_image {
      Some(encoded) => {
        let jpeg = STANDARD.decode(encoded).context("标注图像解码失败")?;
        std::fs::write(path, jpeg)
          .with_context(|| format!("无法保存标注图像: {}", path.display()))?;
        info!("标注图像已保存: {}", path.display());
      }
      None => info!("未检测到目标，不生成标注图像"),
    }
  }

  println!("{}", serde_json::to_string_pretty(&result)?);

  Ok(())
}
