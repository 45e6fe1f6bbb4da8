use std::path::PathBuf;

use thiserror::Error;

use crate::crop::Size;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// 图片无法打开或解码
    #[error("无法加载图片 {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("图片 {path} 包含透明通道 ({color:?})")]
    AlphaRejected {
        path: PathBuf,
        color: image::ColorType,
    },

    #[error("裁剪尺寸 {target} 超出图片尺寸 {source_size}")]
    CropOutOfBounds { source_size: Size, target: Size },

    #[error("写入 {path} 失败: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConvertError>;
