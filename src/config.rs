use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use hex_color::HexColor;
use serde::Deserialize;

use crate::crop::{CropPolicy, Size};
use crate::loader::AlphaPolicy;
use crate::rgb565::ByteOrder;

pub const USAGE: &str = "用法: png2rgb565 [-v] [config.json | <输入图片> <输出文件> [宽x高]]";

/// 转换参数, json 中缺省的字段使用默认值
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    /// 居中裁剪的目标尺寸, None 表示整幅图片
    pub crop: Option<Size>,
    pub crop_policy: CropPolicy,
    pub alpha: AlphaPolicy,
    /// AlphaPolicy::Flatten 使用的背景色, 如 "#000000"
    pub background: String,
    pub byte_order: ByteOrder,
    /// 编码线程数, 0 表示CPU核心数
    pub threads: usize,
    /// 打印每个像素
    pub verbose: bool,
    /// 把转换结果还原成PNG以便预览
    pub preview: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from("background.png"),
            output: PathBuf::from("background.raw"),
            crop: None,
            crop_policy: CropPolicy::Fail,
            alpha: AlphaPolicy::Drop,
            background: String::from("#000000"),
            byte_order: ByteOrder::Little,
            threads: 1,
            verbose: false,
            preview: None,
        }
    }
}

impl Config {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        Self::from_json(&data).with_context(|| format!("解析配置文件失败: {}", path.display()))
    }

    pub fn from_json(data: &[u8]) -> Result<Self> {
        let config: Config = serde_json::from_slice(data)?;
        config.background_color()?;
        Ok(config)
    }

    /// 命令行参数(不含程序名)
    ///
    /// - 无参数: background.png -> background.raw
    /// - `config.json`
    /// - `<输入图片> <输出文件> [宽x高]`
    ///
    /// `-v`/`--verbose` 可以出现在任意位置
    pub fn from_args(args: &[String]) -> Result<Self> {
        let verbose = args.iter().any(|a| a == "-v" || a == "--verbose");
        let args: Vec<&str> = args
            .iter()
            .map(|a| a.as_str())
            .filter(|a| *a != "-v" && *a != "--verbose")
            .collect();

        let mut config = match args.as_slice() {
            [] => Config::default(),
            [file] if file.to_lowercase().ends_with(".json") => Config::from_json_file(Path::new(file))?,
            [input, output] => Config {
                input: PathBuf::from(input),
                output: PathBuf::from(output),
                ..Default::default()
            },
            [input, output, size] => Config {
                input: PathBuf::from(input),
                output: PathBuf::from(output),
                crop: Some(size.parse()?),
                ..Default::default()
            },
            _ => return Err(anyhow!("参数错误: {:?}\n{USAGE}", args)),
        };
        config.verbose |= verbose;
        Ok(config)
    }

    pub fn background_color(&self) -> Result<HexColor> {
        HexColor::parse(&self.background).map_err(|err| anyhow!("背景色格式错误 {}: {:?}", self.background, err))
    }

    pub fn log_level(&self) -> log::LevelFilter {
        if self.verbose {
            log::LevelFilter::Trace
        } else {
            log::LevelFilter::Info
        }
    }
}
