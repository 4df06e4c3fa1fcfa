//! Signature image codec.
//!
//! Signatures travel as PNG data URLs (`data:image/png;base64,...`). This
//! module encodes RGBA rasters into that form and decodes them back into the
//! separate color and alpha planes a PDF image needs.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use png::{BitDepth, ColorType, Decoder, Encoder, Transformations};

use crate::error::{Error, Result};

/// Media type of encoded signatures.
pub const PNG_MIME: &str = "image/png";

/// Largest pixel count a signature may declare before it is decoded.
pub const MAX_SIGNATURE_PIXELS: u64 = 4096 * 4096;

/// A decoded signature raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureImage {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

impl SignatureImage {
    /// Decode a PNG data URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SignatureDecode`] if the URL is not a base64 PNG data
    /// URL, the payload is not a valid PNG, or the image has no pixels.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let png = decode_data_url(url)?;
        Self::from_png(&png)
    }

    /// Decode PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SignatureDecode`] if the bytes are not a valid PNG,
    /// the image has no pixels, or its header declares more than
    /// [`MAX_SIGNATURE_PIXELS`].
    pub fn from_png(bytes: &[u8]) -> Result<Self> {
        let mut decoder = Decoder::new(Cursor::new(bytes));
        decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
        let mut reader = decoder.read_info()?;

        let (width, height) = (reader.info().width, reader.info().height);
        if u64::from(width) * u64::from(height) > MAX_SIGNATURE_PIXELS {
            return Err(Error::signature_decode(format!(
                "image of {width}x{height} exceeds {MAX_SIGNATURE_PIXELS} pixels"
            )));
        }

        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf)?;
        buf.truncate(info.buffer_size());

        if info.width == 0 || info.height == 0 {
            return Err(Error::signature_decode("image has no pixels"));
        }
        if info.bit_depth != BitDepth::Eight {
            return Err(Error::signature_decode(format!(
                "unsupported bit depth {:?}",
                info.bit_depth
            )));
        }

        let (rgb, alpha) = split_planes(&buf, info.color_type)?;
        let alpha = alpha.filter(|plane| plane.iter().any(|&a| a != u8::MAX));

        Ok(Self {
            width: info.width,
            height: info.height,
            rgb,
            alpha,
        })
    }

    /// Natural width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Natural height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Packed 8-bit RGB samples, row-major.
    #[must_use]
    pub fn rgb(&self) -> &[u8] {
        &self.rgb
    }

    /// 8-bit alpha samples, absent when the image is fully opaque.
    #[must_use]
    pub fn alpha(&self) -> Option<&[u8]> {
        self.alpha.as_deref()
    }
}

fn split_planes(buf: &[u8], color_type: ColorType) -> Result<(Vec<u8>, Option<Vec<u8>>)> {
    let planes = match color_type {
        ColorType::Rgb => (buf.to_vec(), None),
        ColorType::Rgba => {
            let mut rgb = Vec::with_capacity(buf.len() / 4 * 3);
            let mut alpha = Vec::with_capacity(buf.len() / 4);
            for px in buf.chunks_exact(4) {
                rgb.extend_from_slice(&px[..3]);
                alpha.push(px[3]);
            }
            (rgb, Some(alpha))
        }
        ColorType::Grayscale => (buf.iter().flat_map(|&g| [g, g, g]).collect(), None),
        ColorType::GrayscaleAlpha => {
            let mut rgb = Vec::with_capacity(buf.len() / 2 * 3);
            let mut alpha = Vec::with_capacity(buf.len() / 2);
            for px in buf.chunks_exact(2) {
                rgb.extend_from_slice(&[px[0], px[0], px[0]]);
                alpha.push(px[1]);
            }
            (rgb, Some(alpha))
        }
        ColorType::Indexed => {
            return Err(Error::signature_decode("palette was not expanded"));
        }
    };
    Ok(planes)
}

/// Encode an RGBA raster as PNG bytes.
///
/// # Errors
///
/// Returns [`Error::SignatureEncode`] if `rgba` does not hold exactly
/// `width * height` pixels or the encoder fails.
pub fn encode_png(width: u32, height: u32, rgba: &[u8]) -> Result<Vec<u8>> {
    let expected = width as usize * height as usize * 4;
    if rgba.len() != expected {
        return Err(Error::SignatureEncode(format!(
            "expected {expected} bytes for {width}x{height} RGBA, got {}",
            rgba.len()
        )));
    }

    let mut out = Vec::new();
    {
        let mut encoder = Encoder::new(&mut out, width, height);
        encoder.set_color(ColorType::Rgba);
        encoder.set_depth(BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(rgba)?;
        writer.finish()?;
    }
    Ok(out)
}

/// Wrap PNG bytes in a data URL.
#[must_use]
pub fn to_data_url(png: &[u8]) -> String {
    format!("data:{PNG_MIME};base64,{}", STANDARD.encode(png))
}

/// Extract the PNG bytes from a data URL.
///
/// # Errors
///
/// Returns [`Error::SignatureDecode`] if the URL is not a base64 data URL of
/// type `image/png`.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>> {
    let rest = url
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| Error::signature_decode("not a data URL"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::signature_decode("data URL has no payload"))?;

    let mut params = meta.split(';');
    let mime = params.next().unwrap_or_default();
    if !mime.eq_ignore_ascii_case(PNG_MIME) {
        return Err(Error::signature_decode(format!(
            "unsupported media type '{mime}'"
        )));
    }
    if !params.any(|p| p.eq_ignore_ascii_case("base64")) {
        return Err(Error::signature_decode("data URL is not base64-encoded"));
    }

    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    STANDARD
        .decode(compact)
        .map_err(|e| Error::signature_decode(format!("invalid base64: {e}")))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn crc32(bytes: &[u8]) -> u32 {
        let mut crc = 0xffff_ffff_u32;
        for &b in bytes {
            crc ^= u32::from(b);
            for _ in 0..8 {
                crc = if crc & 1 == 1 {
                    (crc >> 1) ^ 0xedb8_8320
                } else {
                    crc >> 1
                };
            }
        }
        !crc
    }

    fn push_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
        out.extend_from_slice(&u32::try_from(data.len()).unwrap().to_be_bytes());
        let start = out.len();
        out.extend_from_slice(kind);
        out.extend_from_slice(data);
        let crc = crc32(&out[start..]);
        out.extend_from_slice(&crc.to_be_bytes());
    }

    /// A well-formed RGBA PNG whose header claims `width` x `height` but
    /// whose image data is a single empty deflate block.
    pub(crate) fn png_claiming(width: u32, height: u32) -> Vec<u8> {
        let mut out = b"\x89PNG\r\n\x1a\n".to_vec();
        let mut ihdr = Vec::with_capacity(13);
        ihdr.extend_from_slice(&width.to_be_bytes());
        ihdr.extend_from_slice(&height.to_be_bytes());
        ihdr.extend_from_slice(&[8, 6, 0, 0, 0]);
        push_chunk(&mut out, b"IHDR", &ihdr);
        push_chunk(&mut out, b"IDAT", &[0x78, 0x9c, 0x03, 0x00, 0x00, 0x00, 0x00, 0x01]);
        push_chunk(&mut out, b"IEND", &[]);
        out
    }

    fn solid_rgba(width: u32, height: u32, px: [u8; 4]) -> Vec<u8> {
        (0..width * height).flat_map(|_| px).collect()
    }

    #[test]
    fn test_decode_data_url_reports_dimensions() {
        let png = encode_png(4, 2, &solid_rgba(4, 2, [10, 20, 30, 255])).unwrap();
        let image = SignatureImage::from_data_url(&to_data_url(&png)).unwrap();

        assert_eq!(image.width(), 4);
        assert_eq!(image.height(), 2);
        assert_eq!(image.rgb().len(), 4 * 2 * 3);
        assert_eq!(&image.rgb()[..3], &[10, 20, 30]);
    }

    #[test]
    fn test_opaque_image_drops_alpha() {
        let png = encode_png(2, 2, &solid_rgba(2, 2, [0, 0, 0, 255])).unwrap();
        let image = SignatureImage::from_png(&png).unwrap();
        assert!(image.alpha().is_none());
    }

    #[test]
    fn test_transparent_image_keeps_alpha() {
        let mut rgba = solid_rgba(2, 1, [0, 0, 0, 0]);
        rgba[7] = 200;
        let png = encode_png(2, 1, &rgba).unwrap();
        let image = SignatureImage::from_png(&png).unwrap();

        assert_eq!(image.alpha(), Some(&[0, 200][..]));
    }

    #[test]
    fn test_data_url_prefix() {
        let url = to_data_url(&[1, 2, 3]);
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(decode_data_url(&url).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_decode_data_url_ignores_line_breaks() {
        let url = "data:image/png;base64,AQ\nID";
        assert_eq!(decode_data_url(url).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_rejects_non_data_url() {
        let err = decode_data_url("https://example.com/sig.png").unwrap_err();
        assert!(err.to_string().contains("not a data URL"));
    }

    #[test]
    fn test_rejects_other_media_types() {
        let err = decode_data_url("data:image/jpeg;base64,AAAA").unwrap_err();
        assert!(err.to_string().contains("image/jpeg"));
    }

    #[test]
    fn test_rejects_plain_payload() {
        assert!(decode_data_url("data:image/png,raw").is_err());
    }

    #[test]
    fn test_rejects_garbage_png() {
        let url = to_data_url(b"definitely not a png");
        assert!(matches!(
            SignatureImage::from_data_url(&url),
            Err(Error::SignatureDecode(_))
        ));
    }

    #[test]
    fn test_rejects_oversized_header_before_decoding() {
        let err = SignatureImage::from_png(&png_claiming(60_000, 60_000)).unwrap_err();
        assert!(matches!(err, Error::SignatureDecode(_)));
        assert!(err.to_string().contains("60000x60000"));

        let url = to_data_url(&png_claiming(u32::MAX >> 1, 2));
        assert!(SignatureImage::from_data_url(&url).is_err());
    }

    #[test]
    fn test_encode_rejects_wrong_buffer_size() {
        assert!(matches!(
            encode_png(3, 3, &[0; 8]),
            Err(Error::SignatureEncode(_))
        ));
    }
}
