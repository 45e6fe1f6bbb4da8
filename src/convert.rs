use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{anyhow, Result};
use image::{imageops, RgbImage};
use log::info;

use crate::config::Config;
use crate::crop::{self, CropPolicy, Size};
use crate::error::ConvertError;
use crate::frame::{FrameEncoder, TracePixels};
use crate::loader;
use crate::rgb565::{rgb565_bytes_to_rgb888, ByteOrder};

/// 转换结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub size: Size,
    pub bytes: usize,
}

/// 加载 -> 裁剪 -> 编码 -> 写文件
///
/// 输出文件在整帧编码完成后才创建, 失败时不会改动它
pub fn run(config: &Config) -> Result<Summary> {
    let background = config.background_color()?;
    let img = loader::load_rgb(&config.input, config.alpha, background)?;

    let img = match config.crop {
        Some(target) => {
            let img = crop_centered(img, target, config.crop_policy)?;
            info!("Image dimensions after cropping: {} x {}", img.width(), img.height());
            img
        }
        None => img,
    };

    let encoder = FrameEncoder::new(config.byte_order).threads(config.threads);
    let rgb565 = if config.verbose {
        encoder.encode_observed(&img, &mut TracePixels)
    } else {
        encoder.encode(&img)
    };

    let size = Size::new(img.width(), img.height());
    // 预览图先写, 失败时不改动输出文件
    if let Some(preview) = config.preview.as_ref() {
        write_preview(preview, &rgb565, size, config.byte_order)?;
        info!("预览图: {}", preview.display());
    }

    write_raw(&config.output, &rgb565)?;
    info!("写入 {}: {} 字节 ({size} RGB565 {:?})", config.output.display(), rgb565.len(), config.byte_order);

    Ok(Summary {
        size,
        bytes: rgb565.len(),
    })
}

/// 居中裁剪, CropPolicy::Pad 时超出原图的部分为黑色
pub fn crop_centered(img: RgbImage, target: Size, policy: CropPolicy) -> crate::error::Result<RgbImage> {
    let source = Size::new(img.width(), img.height());
    let region = crop::centered(source, target, policy)?;
    info!("裁剪 {source} -> {}x{} left={} top={} right={} bottom={}",
        region.width(), region.height(), region.left, region.top, region.right, region.bottom);
    if region.width() == source.width && region.height() == source.height && region.within(source) {
        return Ok(img);
    }
    if region.within(source) {
        let (left, top) = (region.left as u32, region.top as u32);
        return Ok(imageops::crop_imm(&img, left, top, region.width(), region.height()).to_image());
    }
    let mut canvas = RgbImage::new(region.width(), region.height());
    imageops::replace(&mut canvas, &img, -region.left, -region.top);
    Ok(canvas)
}

pub fn write_raw(path: &Path, data: &[u8]) -> crate::error::Result<()> {
    let write = || -> std::io::Result<()> {
        let mut file = BufWriter::new(File::create(path)?);
        file.write_all(data)?;
        file.flush()
    };
    write().map_err(|source| ConvertError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// 把RGB565数据还原为PNG
pub fn write_preview(path: &Path, rgb565: &[u8], size: Size, order: ByteOrder) -> Result<()> {
    let rgb888 = rgb565_bytes_to_rgb888(rgb565, order);
    let img = RgbImage::from_raw(size.width, size.height, rgb888)
        .ok_or(anyhow!("RGB565数据长度与尺寸 {size} 不符"))?;
    img.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::path::PathBuf;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("png2rgb565-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn config(dir: &Path) -> Config {
        Config {
            input: dir.join("in.png"),
            output: dir.join("out.raw"),
            ..Default::default()
        }
    }

    #[test]
    fn red_green_end_to_end() {
        let dir = temp_dir("red-green");
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 255, 0]));
        img.save(dir.join("in.png")).unwrap();

        let summary = run(&config(&dir)).unwrap();
        assert_eq!(summary, Summary { size: Size::new(2, 1), bytes: 4 });
        assert_eq!(std::fs::read(dir.join("out.raw")).unwrap(), vec![0x00, 0xF8, 0xE0, 0x07]);
    }

    #[test]
    fn crop_300x400_to_240x320() {
        let dir = temp_dir("crop");
        let img = RgbImage::from_fn(300, 400, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 0]));
        img.save(dir.join("in.png")).unwrap();

        let summary = run(&Config {
            crop: Some(Size::SCREEN_240X320),
            threads: 0,
            ..config(&dir)
        })
        .unwrap();
        assert_eq!(summary.size, Size::SCREEN_240X320);

        let raw = std::fs::read(dir.join("out.raw")).unwrap();
        assert_eq!(raw.len(), 240 * 320 * 2);
        let first = u16::from_le_bytes([raw[0], raw[1]]);
        assert_eq!(first, crate::rgb565::rgb_to_rgb565(30, 40, 0));
    }

    #[test]
    fn oversized_crop_fails_without_output() {
        let dir = temp_dir("oversized");
        RgbImage::new(100, 100).save(dir.join("in.png")).unwrap();
        let err = run(&Config {
            crop: Some(Size::SCREEN_240X320),
            ..config(&dir)
        })
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConvertError>(),
            Some(ConvertError::CropOutOfBounds { .. })
        ));
        assert!(!dir.join("out.raw").exists());
    }

    #[test]
    fn missing_input_leaves_output_untouched() {
        let dir = temp_dir("missing");
        std::fs::write(dir.join("out.raw"), b"keep").unwrap();
        let err = run(&Config {
            input: dir.join("nope.png"),
            ..config(&dir)
        })
        .unwrap_err();
        assert!(matches!(err.downcast_ref::<ConvertError>(), Some(ConvertError::Load { .. })));
        assert_eq!(std::fs::read(dir.join("out.raw")).unwrap(), b"keep");
    }

    #[test]
    fn pad_keeps_target_size_with_black_border() {
        let dir = temp_dir("pad");
        let img = RgbImage::from_fn(100, 100, |x, y| Rgb([255, (x + 1) as u8, (y + 1) as u8]));
        img.save(dir.join("in.png")).unwrap();

        let summary = run(&Config {
            crop: Some(Size::SCREEN_240X320),
            crop_policy: CropPolicy::Pad,
            ..config(&dir)
        })
        .unwrap();
        assert_eq!(summary, Summary { size: Size::SCREEN_240X320, bytes: 240 * 320 * 2 });

        let raw = std::fs::read(dir.join("out.raw")).unwrap();
        let word = |x: usize, y: usize| {
            let i = 2 * (y * 240 + x);
            u16::from_le_bytes([raw[i], raw[i + 1]])
        };
        // 原图 (0,0) 落在 (70,110)
        assert_eq!(word(70, 110), crate::rgb565::rgb_to_rgb565(255, 1, 1));
        assert_eq!(word(169, 209), crate::rgb565::rgb_to_rgb565(255, 100, 100));
        assert_eq!(word(69, 110), 0);
        assert_eq!(word(70, 109), 0);
        assert_eq!(word(170, 209), 0);
        assert_eq!(word(0, 0), 0);
    }

    #[test]
    fn pad_odd_source_floors_left_margin() {
        let img = RgbImage::from_fn(101, 100, |x, _| Rgb([x as u8, 0, 0]));
        let padded = crop_centered(img, Size::SCREEN_240X320, CropPolicy::Pad).unwrap();
        assert_eq!(padded.dimensions(), (240, 320));
        // left = -70
        assert_eq!(padded.get_pixel(70, 110), &Rgb([0, 0, 0]));
        assert_eq!(padded.get_pixel(71, 110), &Rgb([1, 0, 0]));
        assert_eq!(padded.get_pixel(170, 110), &Rgb([100, 0, 0]));
        assert_eq!(padded.get_pixel(171, 110), &Rgb([0, 0, 0]));
    }

    #[test]
    fn failed_preview_leaves_output_untouched() {
        let dir = temp_dir("bad-preview");
        RgbImage::from_pixel(2, 2, Rgb([10, 20, 30])).save(dir.join("in.png")).unwrap();
        std::fs::write(dir.join("out.raw"), b"keep").unwrap();
        let result = run(&Config {
            preview: Some(dir.join("missing").join("p.png")),
            ..config(&dir)
        });
        assert!(result.is_err());
        assert_eq!(std::fs::read(dir.join("out.raw")).unwrap(), b"keep");

        let _ = std::fs::remove_file(dir.join("out.raw"));
        let result = run(&Config {
            preview: Some(dir.join("missing").join("p.png")),
            ..config(&dir)
        });
        assert!(result.is_err());
        assert!(!dir.join("out.raw").exists());
    }

    #[test]
    fn preview_restores_image() {
        let dir = temp_dir("preview");
        RgbImage::from_pixel(4, 3, Rgb([255, 255, 255])).save(dir.join("in.png")).unwrap();
        run(&Config {
            preview: Some(dir.join("preview.png")),
            byte_order: ByteOrder::Big,
            ..config(&dir)
        })
        .unwrap();
        let preview = image::open(dir.join("preview.png")).unwrap().to_rgb8();
        assert_eq!(preview.dimensions(), (4, 3));
        assert_eq!(preview.get_pixel(3, 2), &Rgb([255, 255, 255]));
    }
}
