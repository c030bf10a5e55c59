// 该文件是 Haijing （海镜） 项目的一部分。
// src/args.rs - 命令行参数
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

use std::path::PathBuf;

use clap::Parser;
use url::Url;

/// Haijing 油污检测参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 检测器（例如 record:///path/to/detections.txt）
  #[arg(long, value_name = "DETECTOR")]
  pub detector: Url,

  /// 输入图像（例如 image:///path/to/scene.jpg）
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 配置文件路径（TOML）
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// 置信度阈值 (0.0 - 1.0)，默认取配置文件中的值
  #[arg(long, value_name = "THRESHOLD", value_parser = parse_confidence)]
  pub confidence: Option<f32>,

  /// 返回标注图像
  #[arg(long)]
  pub annotate: bool,

  /// 将标注图像另存为 JPEG 文件（隐含 --annotate）
  #[arg(long, value_name = "OUTPUT")]
  pub annotated_output: Option<PathBuf>,

  /// 以 B,G,R 原始像素数组形式送入流水线
  #[arg(long)]
  pub bgr: bool,
}

fn parse_confidence(s: &str) -> Result<f32, String> {
  let value: f32 = s.parse().map_err(|e| format!("{}", e))?;
  if (0.0..=1.0).contains(&value) {
    Ok(value)
  } else {
    Err(format!("置信度 {} 超出 [0, 1]", value))
  }
}
