/// RGB565 各通道位宽
pub const RED_BITS: u32 = 5;
pub const GREEN_BITS: u32 = 6;
pub const BLUE_BITS: u32 = 5;

/// 单个RGB565像素占用的字节数
pub const BYTES_PER_PIXEL: usize = 2;

/// 字节序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    /// 低字节在前
    #[default]
    Little,
    /// 高字节在前(USB屏幕固件使用的格式)
    Big,
}

impl ByteOrder {
    #[inline]
    pub fn to_bytes(self, word: u16) -> [u8; 2] {
        match self {
            ByteOrder::Little => word.to_le_bytes(),
            ByteOrder::Big => word.to_be_bytes(),
        }
    }

    #[inline]
    pub fn from_bytes(self, bytes: [u8; 2]) -> u16 {
        match self {
            ByteOrder::Little => u16::from_le_bytes(bytes),
            ByteOrder::Big => u16::from_be_bytes(bytes),
        }
    }
}

/// 把8位通道值线性缩放到 bits 位
///
/// 使用截断除法而不是四舍五入: 255 -> 31, 128 -> 15
#[inline]
pub fn quantize(c: u8, bits: u32) -> u16 {
    let max = (1u16 << bits) - 1;
    ((c as u16 * max) / 255) & max
}

/// 打包已量化的通道 (r: 0..=31, g: 0..=63, b: 0..=31)
#[inline]
pub fn pack(r: u16, g: u16, b: u16) -> u16 {
    ((r & 0x1F) << 11) | ((g & 0x3F) << 5) | (b & 0x1F)
}

/// 拆分RGB565, 返回量化后的 (r, g, b)
#[inline]
pub fn unpack(word: u16) -> (u16, u16, u16) {
    ((word >> 11) & 0x1F, (word >> 5) & 0x3F, word & 0x1F)
}

/// RGB888转RGB565
#[inline]
pub fn rgb_to_rgb565(r: u8, g: u8, b: u8) -> u16 {
    pack(
        quantize(r, RED_BITS),
        quantize(g, GREEN_BITS),
        quantize(b, BLUE_BITS),
    )
}

/// RGB565还原为RGB888, 低位用高位填充
pub fn rgb565_to_rgb888(word: u16) -> [u8; 3] {
    let (r5, g6, b5) = unpack(word);
    let (r5, g6, b5) = (r5 as u8, g6 as u8, b5 as u8);
    [
        (r5 << 3) | (r5 >> 2),
        (g6 << 2) | (g6 >> 4),
        (b5 << 3) | (b5 >> 2),
    ]
}

/// 把RGB565字节流还原成RGB888字节流(每像素3字节)
pub fn rgb565_bytes_to_rgb888(rgb565: &[u8], order: ByteOrder) -> Vec<u8> {
    let mut rgb888 = Vec::with_capacity(rgb565.len() / BYTES_PER_PIXEL * 3);
    for chunk in rgb565.chunks_exact(BYTES_PER_PIXEL) {
        let word = order.from_bytes([chunk[0], chunk[1]]);
        rgb888.extend_from_slice(&rgb565_to_rgb888(word));
    }
    rgb888
}
