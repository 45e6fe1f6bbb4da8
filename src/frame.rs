use image::{GenericImageView, Rgb};
use log::{debug, trace};

use crate::rgb565::{rgb_to_rgb565, ByteOrder, BYTES_PER_PIXEL};

/// 逐像素回调, 只在单线程编码时调用
pub trait PixelObserver {
    fn on_pixel(&mut self, x: u32, y: u32, rgb565: u16);
}

impl<F: FnMut(u32, u32, u16)> PixelObserver for F {
    fn on_pixel(&mut self, x: u32, y: u32, rgb565: u16) {
        self(x, y, rgb565)
    }
}

/// 以 trace 级别打印每个像素
pub struct TracePixels;

impl PixelObserver for TracePixels {
    fn on_pixel(&mut self, x: u32, y: u32, rgb565: u16) {
        trace!("Processing pixel at ({x}, {y}) => 0x{rgb565:04X}");
    }
}

/// RGB888图像 -> 无文件头的RGB565字节流(行优先)
#[derive(Debug, Clone, Copy)]
pub struct FrameEncoder {
    order: ByteOrder,
    threads: usize,
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self::new(ByteOrder::Little)
    }
}

impl FrameEncoder {
    pub fn new(order: ByteOrder) -> Self {
        Self { order, threads: 1 }
    }

    /// 设置编码线程数, 0 表示使用全部CPU
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = if threads == 0 { num_cpus::get() } else { threads };
        self
    }

    pub fn encode<I>(&self, img: &I) -> Vec<u8>
    where
        I: GenericImageView<Pixel = Rgb<u8>> + Sync,
    {
        let (width, height) = img.dimensions();
        let workers = self.threads.min(height as usize).max(1);
        let mut out = vec![0u8; width as usize * height as usize * BYTES_PER_PIXEL];
        if workers == 1 || out.is_empty() {
            encode_rows(img, 0, &mut out, self.order);
            return out;
        }

        // 按行分块, 每个线程写自己的区间, 输出顺序不变
        let row_bytes = width as usize * BYTES_PER_PIXEL;
        let rows_per_worker = (height as usize).div_ceil(workers);
        debug!("{workers}个线程编码 {width}x{height}, 每线程{rows_per_worker}行");
        let order = self.order;
        std::thread::scope(|s| {
            for (i, chunk) in out.chunks_mut(rows_per_worker * row_bytes).enumerate() {
                let y0 = (i * rows_per_worker) as u32;
                s.spawn(move || encode_rows(img, y0, chunk, order));
            }
        });
        out
    }

    /// 单线程编码, 每个像素回调一次 observer
    pub fn encode_observed<I>(&self, img: &I, observer: &mut dyn PixelObserver) -> Vec<u8>
    where
        I: GenericImageView<Pixel = Rgb<u8>>,
    {
        let (width, height) = img.dimensions();
        let mut out = Vec::with_capacity(width as usize * height as usize * BYTES_PER_PIXEL);
        for y in 0..height {
            for x in 0..width {
                let Rgb([r, g, b]) = img.get_pixel(x, y);
                let word = rgb_to_rgb565(r, g, b);
                observer.on_pixel(x, y, word);
                out.extend_from_slice(&self.order.to_bytes(word));
            }
        }
        out
    }
}

/// 从第 y0 行开始编码, 行数由 out 的长度决定
fn encode_rows<I>(img: &I, y0: u32, out: &mut [u8], order: ByteOrder)
where
    I: GenericImageView<Pixel = Rgb<u8>>,
{
    let width = img.width();
    let row_bytes = width as usize * BYTES_PER_PIXEL;
    if row_bytes == 0 {
        return;
    }
    for (dy, row) in out.chunks_exact_mut(row_bytes).enumerate() {
        let y = y0 + dy as u32;
        for (x, dst) in row.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
            let Rgb([r, g, b]) = img.get_pixel(x as u32, y);
            dst.copy_from_slice(&order.to_bytes(rgb_to_rgb565(r, g, b)));
        }
    }
}
