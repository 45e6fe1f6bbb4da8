use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::Deserialize;

use crate::error::{ConvertError, Result};

/// 宽x高
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    /// 240x320 竖屏
    pub const SCREEN_240X320: Size = Size::new(240, 320);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Size {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let s = s.trim().replace('X', "x");
        let (width, height) = s
            .split_once('x')
            .ok_or_else(|| anyhow!("尺寸格式错误: {s}, 应为 宽x高"))?;
        let width = width.trim().parse::<u32>()?;
        let height = height.trim().parse::<u32>()?;
        if width == 0 || height == 0 {
            return Err(anyhow!("尺寸不能为0: {s}"));
        }
        Ok(Size::new(width, height))
    }
}

impl TryFrom<String> for Size {
    type Error = anyhow::Error;

    fn try_from(value: String) -> anyhow::Result<Self> {
        value.parse()
    }
}

/// 裁剪尺寸大于原图时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropPolicy {
    /// 直接报错
    #[default]
    Fail,
    /// 按轴收缩到原图尺寸
    Clamp,
    /// 保持目标尺寸, 超出原图的部分填黑
    Pad,
}

/// 裁剪区域, 左闭右开 [left, right) x [top, bottom)
///
/// 填充模式下坐标可以为负或超出原图
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CropRegion {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl CropRegion {
    pub fn width(&self) -> u32 {
        (self.right - self.left) as u32
    }

    pub fn height(&self) -> u32 {
        (self.bottom - self.top) as u32
    }

    /// 区域是否完全落在原图内
    pub fn within(&self, source: Size) -> bool {
        self.left >= 0
            && self.top >= 0
            && self.right <= source.width as i64
            && self.bottom <= source.height as i64
    }
}

/// 计算居中裁剪区域
pub fn centered(source: Size, target: Size, policy: CropPolicy) -> Result<CropRegion> {
    let fits = target.width <= source.width && target.height <= source.height;
    let target = match (fits, policy) {
        (true, _) | (false, CropPolicy::Pad) => target,
        (false, CropPolicy::Fail) => {
            return Err(ConvertError::CropOutOfBounds {
                source_size: source,
                target,
            })
        }
        (false, CropPolicy::Clamp) => Size::new(
            target.width.min(source.width),
            target.height.min(source.height),
        ),
    };

    // 向下取整, 负数时 -139 -> -70
    let left = (source.width as i64 - target.width as i64).div_euclid(2);
    let top = (source.height as i64 - target.height as i64).div_euclid(2);
    Ok(CropRegion {
        left,
        top,
        right: left + target.width as i64,
        bottom: top + target.height as i64,
    })
}
