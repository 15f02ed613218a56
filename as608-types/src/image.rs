//! Fingerprint image buffer

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

/// 8-bit grayscale image, one byte per pixel, row-major
#[derive(Clone, PartialEq, Eq)]
pub struct FingerprintImage {
    width: usize,
    height: usize,
    pixels: Bytes,
}

impl FingerprintImage {
    /// BMP file header + BITMAPINFOHEADER + 256 entry palette
    const BMP_PIXEL_OFFSET: usize = 14 + 40 + 256 * 4;

    /// 72 DPI
    const BMP_PIXELS_PER_METRE: u32 = 2835;

    /// Largest accepted image, 16 Mpx
    pub const MAX_PIXELS: usize = 1 << 24;

    /// Byte length of a `width` x `height` image
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if either dimension is zero or the image
    /// has more than [`Self::MAX_PIXELS`] pixels.
    pub fn byte_len(width: usize, height: usize) -> Result<usize> {
        if width == 0 || height == 0 {
            return Err(Error::Validation(format!("image {}x{} is empty", width, height)));
        }

        match width.checked_mul(height) {
            Some(len) if len <= Self::MAX_PIXELS => Ok(len),
            _ => Err(Error::Validation(format!(
                "image {}x{} exceeds {} pixels",
                width,
                height,
                Self::MAX_PIXELS
            ))),
        }
    }

    /// Wrap raw pixels
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the dimensions are rejected by
    /// [`Self::byte_len`] or `pixels` does not hold exactly `width * height`
    /// bytes.
    pub fn new(width: usize, height: usize, pixels: impl Into<Bytes>) -> Result<Self> {
        let pixels = pixels.into();
        let expected = Self::byte_len(width, height)?;

        if pixels.len() != expected {
            return Err(Error::Validation(format!(
                "image {}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &Bytes {
        &self.pixels
    }

    /// Pixel value at (`x`, `y`), `None` outside the image
    pub fn pixel(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    /// Encode as an uncompressed 8-bit palettised BMP
    ///
    /// Rows are stored bottom-up and padded to a multiple of 4 bytes, with a
    /// linear grayscale palette.
    pub fn to_bmp(&self) -> Bytes {
        // At most MAX_PIXELS pixels, so every header field fits in 32 bits
        let stride = (self.width + 3) & !3;
        let image_size = stride * self.height;
        let file_size = Self::BMP_PIXEL_OFFSET + image_size;

        let mut buf = BytesMut::with_capacity(file_size);

        // BITMAPFILEHEADER
        buf.put_slice(b"BM");
        buf.put_u32_le(file_size as u32);
        buf.put_u32_le(0);
        buf.put_u32_le(Self::BMP_PIXEL_OFFSET as u32);

        // BITMAPINFOHEADER
        buf.put_u32_le(40);
        buf.put_i32_le(self.width as i32);
        buf.put_i32_le(self.height as i32);
        buf.put_u16_le(1);
        buf.put_u16_le(8);
        buf.put_u32_le(0);
        buf.put_u32_le(image_size as u32);
        buf.put_u32_le(Self::BMP_PIXELS_PER_METRE);
        buf.put_u32_le(Self::BMP_PIXELS_PER_METRE);
        buf.put_u32_le(256);
        buf.put_u32_le(256);

        // Palette: B, G, R, reserved
        for level in 0..=u8::MAX {
            buf.put_slice(&[level, level, level, 0]);
        }

        let padding = [0u8; 3];
        for row in self.pixels.chunks(self.width).rev() {
            buf.put_slice(row);
            buf.put_slice(&padding[..stride - self.width]);
        }

        buf.freeze()
    }

    /// Encode as an 8-bit grayscale PNG
    pub fn to_png(&self) -> Result<Bytes> {
        let mut out = Vec::with_capacity(self.pixels.len() / 2);

        let mut encoder = png::Encoder::new(&mut out, self.width as u32, self.height as u32);
        encoder.set_color(png::ColorType::Grayscale);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.pixels)?;
        writer.finish()?;

        Ok(Bytes::from(out))
    }
}

impl fmt::Debug for FingerprintImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FingerprintImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixels_len", &self.pixels.len())
            .finish()
    }
}

impl fmt::Display for FingerprintImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Image[{}x{}, 8-bit grayscale]", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{ByteOrder, LittleEndian};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_image_size_validated() {
        assert!(FingerprintImage::new(4, 2, vec![0u8; 8]).is_ok());
        assert!(matches!(
            FingerprintImage::new(4, 2, vec![0u8; 7]),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_byte_len_bounds() {
        assert_eq!(FingerprintImage::byte_len(256, 288).unwrap(), 73728);
        assert_eq!(
            FingerprintImage::byte_len(1, FingerprintImage::MAX_PIXELS).unwrap(),
            FingerprintImage::MAX_PIXELS
        );

        for (width, height) in [(0, 288), (256, 0), (usize::MAX, 2), (4097, 4096)] {
            assert!(matches!(
                FingerprintImage::byte_len(width, height),
                Err(Error::Validation(_))
            ));
        }
    }

    #[test]
    fn test_png_decodes_to_same_pixels() {
        let pixels: Vec<u8> = (0..12 * 5).map(|i| (i * 4) as u8).collect();
        let image = FingerprintImage::new(12, 5, pixels.clone()).unwrap();

        let encoded = image.to_png().unwrap();
        assert_eq!(&encoded[..8], b"\x89PNG\r\n\x1a\n");

        let mut reader = png::Decoder::new(&encoded[..]).read_info().unwrap();
        let mut decoded = vec![0u8; reader.output_buffer_size()];
        let info = reader.next_frame(&mut decoded).unwrap();

        assert_eq!((info.width, info.height), (12, 5));
        assert_eq!(info.color_type, png::ColorType::Grayscale);
        assert_eq!(&decoded[..info.buffer_size()], pixels.as_slice());
    }

    #[test]
    fn test_pixel_lookup() {
        let image = FingerprintImage::new(3, 2, vec![0, 1, 2, 3, 4, 5]).unwrap();

        assert_eq!(image.pixel(0, 1), Some(3));
        assert_eq!(image.pixel(2, 0), Some(2));
        assert_eq!(image.pixel(3, 0), None);
    }

    #[test]
    fn test_bmp_header() {
        let image = FingerprintImage::new(256, 288, vec![0x80u8; 256 * 288]).unwrap();
        let bmp = image.to_bmp();

        assert_eq!(&bmp[..2], b"BM");
        assert_eq!(LittleEndian::read_u32(&bmp[2..6]) as usize, bmp.len());
        assert_eq!(LittleEndian::read_u32(&bmp[10..14]), 1078);
        assert_eq!(LittleEndian::read_i32(&bmp[18..22]), 256);
        assert_eq!(LittleEndian::read_i32(&bmp[22..26]), 288);
        assert_eq!(LittleEndian::read_u16(&bmp[28..30]), 8);
        assert_eq!(bmp.len(), 1078 + 256 * 288);
    }

    #[test]
    fn test_bmp_rows_bottom_up_and_padded() {
        // 3 pixels wide pads each row to 4 bytes
        let image = FingerprintImage::new(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let bmp = image.to_bmp();

        assert_eq!(&bmp[1078..], &[4, 5, 6, 0, 1, 2, 3, 0]);
    }

    #[test]
    fn test_bmp_palette_is_grayscale() {
        let image = FingerprintImage::new(1, 1, vec![0]).unwrap();
        let bmp = image.to_bmp();

        let palette = &bmp[54..1078];
        assert_eq!(&palette[..4], &[0, 0, 0, 0]);
        assert_eq!(&palette[0x80 * 4..0x80 * 4 + 4], &[0x80, 0x80, 0x80, 0]);
        assert_eq!(&palette[1020..], &[0xFF, 0xFF, 0xFF, 0]);
    }
}
