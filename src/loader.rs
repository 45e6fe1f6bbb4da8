use std::path::Path;

use hex_color::HexColor;
use image::{DynamicImage, Rgb, RgbImage, RgbaImage};
use log::{debug, info};
use serde::Deserialize;

use crate::error::{ConvertError, Result};

/// 透明通道的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlphaPolicy {
    /// 直接丢弃透明度
    #[default]
    Drop,
    /// 与背景色混合
    Flatten,
    /// 带透明通道的图片报错
    Reject,
}

/// 加载图片并转换为RGB
pub fn load_rgb(path: &Path, policy: AlphaPolicy, background: HexColor) -> Result<RgbImage> {
    let img = image::open(path).map_err(|source| ConvertError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    info!("打开图片:{} {}x{} {:?}", path.display(), img.width(), img.height(), img.color());
    to_rgb(path, img, policy, background)
}

pub fn to_rgb(
    path: &Path,
    img: DynamicImage,
    policy: AlphaPolicy,
    background: HexColor,
) -> Result<RgbImage> {
    if !img.color().has_alpha() {
        return Ok(img.into_rgb8());
    }
    match policy {
        AlphaPolicy::Drop => Ok(img.into_rgb8()),
        AlphaPolicy::Reject => Err(ConvertError::AlphaRejected {
            path: path.to_path_buf(),
            color: img.color(),
        }),
        AlphaPolicy::Flatten => {
            debug!("透明通道与背景色混合: {background:?}");
            Ok(flatten(&img.into_rgba8(), background))
        }
    }
}

/// 按透明度把每个像素与背景色混合(整数四舍五入)
pub fn flatten(img: &RgbaImage, background: HexColor) -> RgbImage {
    let bg = [background.r, background.g, background.b];
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        let p = img.get_pixel(x, y);
        let a = p[3] as u32;
        Rgb(std::array::from_fn(|i| {
            ((p[i] as u32 * a + bg[i] as u32 * (255 - a) + 127) / 255) as u8
        }))
    })
}
