//! Image XObjects from editor data URLs
//!
//! PNGs are decoded and re-encoded as Flate streams with a soft mask for
//! alpha. JPEGs pass through untouched as DCT streams; only the header is
//! read for dimensions and color space.

use std::io::{Cursor, Write};

use base64::{engine::general_purpose::STANDARD, Engine};
use flate2::{write::ZlibEncoder, Compression};
use image::ImageDecoder;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::error::ImageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Substring sniffing on the data URL, as the editor produces it.
    pub fn detect(data_url: &str) -> Self {
        if data_url.contains("image/png") {
            ImageFormat::Png
        } else {
            ImageFormat::Jpeg
        }
    }
}

/// Raw bytes carried by a `data:` URL
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>, ImageError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| ImageError::DataUrl("missing data: scheme".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ImageError::DataUrl("missing ',' separator".to_string()))?;
    if !header.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
        return Err(ImageError::DataUrl(
            "only base64 data URLs are supported".to_string(),
        ));
    }
    Ok(STANDARD.decode(payload.trim())?)
}

/// Decode the data URL and add it to the document as an image XObject.
pub fn embed_data_url(doc: &mut Document, data_url: &str) -> Result<ObjectId, ImageError> {
    let bytes = decode_data_url(data_url)?;
    match ImageFormat::detect(data_url) {
        ImageFormat::Png => embed_png(doc, &bytes),
        ImageFormat::Jpeg => embed_jpeg(doc, bytes),
    }
}

fn zlib(data: &[u8]) -> Result<Vec<u8>, ImageError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .map_err(|e| ImageError::Unsupported(format!("compression failed: {}", e)))
}

pub fn embed_png(doc: &mut Document, bytes: &[u8]) -> Result<ObjectId, ImageError> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;
    let mut buffer = vec![0; reader.output_buffer_size()];
    let frame = reader.next_frame(&mut buffer)?;
    buffer.truncate(frame.buffer_size());

    let (color_space, channels, has_alpha) = match frame.color_type {
        png::ColorType::Grayscale => ("DeviceGray", 1, false),
        png::ColorType::GrayscaleAlpha => ("DeviceGray", 2, true),
        png::ColorType::Rgb => ("DeviceRGB", 3, false),
        png::ColorType::Rgba => ("DeviceRGB", 4, true),
        png::ColorType::Indexed => {
            return Err(ImageError::Unsupported(
                "indexed PNG was not expanded".to_string(),
            ))
        }
    };

    let (color, alpha) = if has_alpha {
        let color_channels = channels - 1;
        let pixels = buffer.len() / channels;
        let mut color = Vec::with_capacity(pixels * color_channels);
        let mut alpha = Vec::with_capacity(pixels);
        for pixel in buffer.chunks_exact(channels) {
            color.extend_from_slice(&pixel[..color_channels]);
            alpha.push(pixel[color_channels]);
        }
        (color, Some(alpha))
    } else {
        (buffer, None)
    };

    let width = i64::from(frame.width);
    let height = i64::from(frame.height);

    let mut image_dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width,
        "Height" => height,
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
    };

    if let Some(alpha) = alpha {
        let mut smask = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            zlib(&alpha)?,
        );
        smask.allows_compression = false;
        let smask_id = doc.add_object(smask);
        image_dict.set("SMask", Object::Reference(smask_id));
    }

    let mut stream = Stream::new(image_dict, zlib(&color)?);
    stream.allows_compression = false;
    Ok(doc.add_object(stream))
}

pub fn embed_jpeg(doc: &mut Document, bytes: Vec<u8>) -> Result<ObjectId, ImageError> {
    let decoder = image::codecs::jpeg::JpegDecoder::new(Cursor::new(bytes.as_slice()))?;
    let (width, height) = decoder.dimensions();
    let color_space = match decoder.color_type() {
        image::ColorType::L8 => "DeviceGray",
        image::ColorType::Rgb8 => "DeviceRGB",
        other => {
            return Err(ImageError::Unsupported(format!(
                "JPEG color type {:?}",
                other
            )))
        }
    };

    let mut stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        bytes,
    );
    // Already DCT-encoded
    stream.allows_compression = false;
    Ok(doc.add_object(stream))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Read;

    /// A `width` x `height` RGBA PNG, every pixel the same color.
    pub(crate) fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, width, height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            let data: Vec<u8> = (0..width * height).flat_map(|_| rgba).collect();
            writer.write_image_data(&data).unwrap();
        }
        out
    }

    /// A `width` x `height` baseline RGB JPEG
    pub(crate) fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let data: Vec<u8> = (0..width * height).flat_map(|_| [200u8, 40, 40]).collect();
        let mut out = Vec::new();
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, 90)
            .encode(&data, width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
        out
    }

    fn inflate(bytes: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        flate2::read::ZlibDecoder::new(bytes).read_to_end(&mut out).unwrap();
        out
    }

    pub(crate) fn png_data_url(width: u32, height: u32) -> String {
        format!(
            "data:image/png;base64,{}",
            STANDARD.encode(png_bytes(width, height, [255, 0, 0, 128]))
        )
    }

    #[test]
    fn test_detect_format_by_substring() {
        assert_eq!(ImageFormat::detect("data:image/png;base64,AA=="), ImageFormat::Png);
        assert_eq!(ImageFormat::detect("data:image/jpeg;base64,AA=="), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::detect("data:image/webp;base64,AA=="), ImageFormat::Jpeg);
    }

    #[test]
    fn test_decode_data_url() {
        let bytes = decode_data_url("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(bytes, b"hello".to_vec());
    }

    #[test]
    fn test_decode_data_url_rejects_malformed() {
        assert!(matches!(decode_data_url("image/png;base64,AA=="), Err(ImageError::DataUrl(_))));
        assert!(matches!(decode_data_url("data:image/png;base64"), Err(ImageError::DataUrl(_))));
        assert!(matches!(decode_data_url("data:text/plain,hello"), Err(ImageError::DataUrl(_))));
        assert!(matches!(decode_data_url("data:image/png;base64,@@@"), Err(ImageError::Base64(_))));
    }

    #[test]
    fn test_embed_png_with_alpha_adds_soft_mask() {
        let mut doc = Document::with_version("1.7");
        let id = embed_data_url(&mut doc, &png_data_url(3, 2)).unwrap();
        let stream = doc.get_object(id).unwrap().as_stream().unwrap();
        assert_eq!(stream.dict.get(b"Width").unwrap().as_i64().unwrap(), 3);
        assert_eq!(stream.dict.get(b"Height").unwrap().as_i64().unwrap(), 2);
        assert_eq!(stream.dict.get(b"ColorSpace").unwrap().as_name().unwrap(), b"DeviceRGB");

        let smask_id = stream.dict.get(b"SMask").unwrap().as_reference().unwrap();
        let smask = doc.get_object(smask_id).unwrap().as_stream().unwrap();
        assert_eq!(smask.dict.get(b"Filter").unwrap().as_name().unwrap(), b"FlateDecode");
        assert_eq!(inflate(&smask.content), vec![128; 6]);
        assert_eq!(inflate(&stream.content), [255, 0, 0].repeat(6));
    }

    #[test]
    fn test_embed_jpeg_passes_dct_stream_through() {
        let jpeg = jpeg_bytes(4, 3);
        let url = format!("data:image/jpeg;base64,{}", STANDARD.encode(&jpeg));
        let mut doc = Document::with_version("1.7");
        let id = embed_data_url(&mut doc, &url).unwrap();

        let stream = doc.get_object(id).unwrap().as_stream().unwrap();
        assert_eq!(stream.dict.get(b"Filter").unwrap().as_name().unwrap(), b"DCTDecode");
        assert_eq!(stream.dict.get(b"Width").unwrap().as_i64().unwrap(), 4);
        assert_eq!(stream.dict.get(b"Height").unwrap().as_i64().unwrap(), 3);
        assert_eq!(stream.dict.get(b"ColorSpace").unwrap().as_name().unwrap(), b"DeviceRGB");
        assert!(stream.dict.get(b"SMask").is_err());
        assert_eq!(stream.content, jpeg);
    }

    #[test]
    fn test_embed_png_rejects_garbage() {
        let mut doc = Document::with_version("1.7");
        let url = format!("data:image/png;base64,{}", STANDARD.encode(b"not a png"));
        assert!(matches!(embed_data_url(&mut doc, &url), Err(ImageError::Png(_))));
    }

    #[test]
    fn test_embed_jpeg_rejects_garbage() {
        let mut doc = Document::with_version("1.7");
        let url = format!("data:image/jpeg;base64,{}", STANDARD.encode(b"not a jpeg"));
        assert!(embed_data_url(&mut doc, &url).is_err());
    }
}
