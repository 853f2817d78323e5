//! Tile codec capability and the deflate reference codec.
//!
//! ## Payload layout
//!
//! A tile is split into two halves so that reduced scales can be served
//! without touching most of the data:
//!
//! - **odd**: header, then a zlib stream holding the pixels at even row and
//!   even column indices (the 1/2 scale image) followed by their mask bytes
//! - **even**: short header, then a zlib stream holding every other pixel in
//!   row-major order followed by their mask bytes
//!
//! Scale 1/1 interleaves both halves back together. Scales 1/4 and 1/8
//! subsample the odd half further.
//!
//! All multi-byte values are little-endian.

use std::io::{Read, Write};

use bytes::Bytes;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use tracing::trace;

use raster_common::{
    check_pixel_format, DecodedTile, Palette, Pixel, PixelType, RasterBuffer, RasterError,
    RasterResult, Sample, SampleBuffer, SampleType, SampleValue, Scale,
};

const ODD_MAGIC: &[u8; 4] = b"RVTO";
const EVEN_MAGIC: &[u8; 4] = b"RVTE";
const ODD_HEADER_LEN: usize = 16;
const EVEN_HEADER_LEN: usize = 12;

const FLAG_MASK: u8 = 0x01;
const FLAG_NO_DATA: u8 = 0x02;

/// Both compressed halves of an encoded tile.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedTile {
    pub odd: Bytes,
    pub even: Bytes,
}

/// Turns stored payloads into pixels and back.
pub trait TileCodec: Send + Sync {
    /// Decode a tile at `scale`. Scale 1/1 requires the even half.
    ///
    /// PALETTE indices are checked against `palette` when one is given.
    fn decode(
        &self,
        odd: &[u8],
        even: Option<&[u8]>,
        scale: Scale,
        palette: Option<&Palette>,
    ) -> RasterResult<DecodedTile>;

    /// Encode a full-resolution tile.
    fn encode(&self, tile: &DecodedTile) -> RasterResult<EncodedTile>;
}

/// zlib-compressed odd/even codec.
#[derive(Debug, Clone, Copy)]
pub struct DeflateTileCodec {
    compression: Compression,
}

impl Default for DeflateTileCodec {
    fn default() -> Self {
        Self {
            compression: Compression::fast(),
        }
    }
}

impl DeflateTileCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Header {
    sample_type: SampleType,
    pixel_type: PixelType,
    num_bands: u8,
    width: u32,
    height: u32,
    has_mask: bool,
    no_data: Option<Pixel>,
}

impl Header {
    fn pixel_stride(&self) -> usize {
        self.num_bands as usize * self.sample_type.bytes_per_sample()
    }

    /// Dimensions of the odd (1/2 scale) grid.
    fn odd_dimensions(&self) -> (u32, u32) {
        (Scale::Half.reduce(self.width), Scale::Half.reduce(self.height))
    }

    fn write(&self, out: &mut Vec<u8>) {
        let mut flags = 0;
        if self.has_mask {
            flags |= FLAG_MASK;
        }
        if self.no_data.is_some() {
            flags |= FLAG_NO_DATA;
        }
        out.extend_from_slice(ODD_MAGIC);
        out.push(self.sample_type.code());
        out.push(self.pixel_type.code());
        out.push(self.num_bands);
        out.push(flags);
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        if let Some(pixel) = &self.no_data {
            out.extend_from_slice(&pack_values(self.sample_type, pixel.samples()));
        }
    }

    /// Parse the odd header; returns the header and the compressed body.
    fn read(payload: &[u8]) -> RasterResult<(Header, &[u8])> {
        if payload.len() < ODD_HEADER_LEN || &payload[..4] != ODD_MAGIC {
            return Err(RasterError::corrupt_tile("odd payload has no valid header"));
        }
        let sample_type = SampleType::from_code(payload[4]).ok_or_else(|| {
            RasterError::corrupt_tile(format!("unknown sample type code {}", payload[4]))
        })?;
        let pixel_type = PixelType::from_code(payload[5]).ok_or_else(|| {
            RasterError::corrupt_tile(format!("unknown pixel type code {}", payload[5]))
        })?;
        let num_bands = payload[6];
        let flags = payload[7];
        let width = read_u32(&payload[8..12]);
        let height = read_u32(&payload[12..16]);

        check_pixel_format(sample_type, pixel_type, num_bands)
            .map_err(|e| RasterError::corrupt_tile(format!("bad tile format: {}", e)))?;
        if width == 0 || height == 0 {
            return Err(RasterError::corrupt_tile("tile header has zero dimensions"));
        }

        let mut header = Header {
            sample_type,
            pixel_type,
            num_bands,
            width,
            height,
            has_mask: flags & FLAG_MASK != 0,
            no_data: None,
        };

        let mut body = &payload[ODD_HEADER_LEN..];
        if flags & FLAG_NO_DATA != 0 {
            let stride = header.pixel_stride();
            if body.len() < stride {
                return Err(RasterError::corrupt_tile("truncated NODATA pixel"));
            }
            let samples = unpack(sample_type, &body[..stride]);
            let values = (0..num_bands as usize)
                .filter_map(|b| samples.get_value(b))
                .collect();
            let pixel = Pixel::new(sample_type, pixel_type, values)
                .map_err(|e| RasterError::corrupt_tile(format!("bad NODATA pixel: {}", e)))?;
            header.no_data = Some(pixel);
            body = &body[stride..];
        }

        Ok((header, body))
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(raw)
}

fn is_odd_position(col: u32, row: u32) -> bool {
    col % 2 == 0 && row % 2 == 0
}

fn pack<T: Sample>(samples: &[T]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * T::SIZE);
    for &s in samples {
        s.put_le(&mut out);
    }
    out
}

fn pack_buffer(samples: &SampleBuffer) -> Vec<u8> {
    match samples {
        SampleBuffer::Int8(v) => pack(v),
        SampleBuffer::UInt8(v) => pack(v),
        SampleBuffer::Int16(v) => pack(v),
        SampleBuffer::UInt16(v) => pack(v),
        SampleBuffer::Int32(v) => pack(v),
        SampleBuffer::UInt32(v) => pack(v),
        SampleBuffer::Float32(v) => pack(v),
        SampleBuffer::Float64(v) => pack(v),
    }
}

fn pack_values(sample_type: SampleType, values: &[SampleValue]) -> Vec<u8> {
    let mut buffer = SampleBuffer::zeroed(sample_type, values.len());
    for (i, &value) in values.iter().enumerate() {
        buffer.set_value(i, value);
    }
    pack_buffer(&buffer)
}

fn unpack_as<T: Sample>(bytes: &[u8]) -> SampleBuffer {
    T::into_buffer(bytes.chunks_exact(T::SIZE).map(T::get_le).collect())
}

fn unpack(sample_type: SampleType, bytes: &[u8]) -> SampleBuffer {
    match sample_type.container() {
        SampleType::Int8 => unpack_as::<i8>(bytes),
        SampleType::Int16 => unpack_as::<i16>(bytes),
        SampleType::UInt16 => unpack_as::<u16>(bytes),
        SampleType::Int32 => unpack_as::<i32>(bytes),
        SampleType::UInt32 => unpack_as::<u32>(bytes),
        SampleType::Float32 => unpack_as::<f32>(bytes),
        SampleType::Float64 => unpack_as::<f64>(bytes),
        _ => unpack_as::<u8>(bytes),
    }
}

impl DeflateTileCodec {
    fn deflate(&self, data: &[u8]) -> RasterResult<Bytes> {
        let mut encoder = ZlibEncoder::new(Vec::new(), self.compression);
        encoder.write_all(data)?;
        Ok(Bytes::from(encoder.finish()?))
    }
}

fn inflate(data: &[u8], what: &str) -> RasterResult<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| RasterError::corrupt_tile(format!("{} payload: {}", what, e)))?;
    Ok(out)
}

/// Split an inflated body into pixel bytes and optional mask bytes.
fn split_body(
    body: Vec<u8>,
    pixels: usize,
    stride: usize,
    has_mask: bool,
    what: &str,
) -> RasterResult<(Vec<u8>, Option<Vec<u8>>)> {
    let sample_len = pixels * stride;
    let expected = sample_len + if has_mask { pixels } else { 0 };
    if body.len() != expected {
        return Err(RasterError::corrupt_tile(format!(
            "{} payload holds {} bytes, expected {}",
            what,
            body.len(),
            expected
        )));
    }
    let mut samples = body;
    let mask = if has_mask {
        Some(samples.split_off(sample_len))
    } else {
        None
    };
    Ok((samples, mask))
}

impl TileCodec for DeflateTileCodec {
    fn decode(
        &self,
        odd: &[u8],
        even: Option<&[u8]>,
        scale: Scale,
        palette: Option<&Palette>,
    ) -> RasterResult<DecodedTile> {
        let (header, compressed) = Header::read(odd)?;
        let stride = header.pixel_stride();
        let (odd_w, odd_h) = header.odd_dimensions();
        let odd_pixels = odd_w as usize * odd_h as usize;

        let (odd_samples, odd_mask) = split_body(
            inflate(compressed, "odd")?,
            odd_pixels,
            stride,
            header.has_mask,
            "odd",
        )?;

        let (width, height, bytes, mask) = match scale {
            Scale::Full => {
                let even = even.ok_or_else(|| {
                    RasterError::corrupt_tile("scale 1/1 decode needs the even payload")
                })?;
                let (even_samples, even_mask) = read_even(&header, even, odd_pixels)?;
                let (bytes, mask) = interleave(
                    &header,
                    &odd_samples,
                    odd_mask.as_deref(),
                    &even_samples,
                    even_mask.as_deref(),
                );
                (header.width, header.height, bytes, mask)
            }
            _ => {
                let step = scale.factor() / 2;
                let out_w = scale.reduce(header.width);
                let out_h = scale.reduce(header.height);
                let mut bytes = Vec::with_capacity(out_w as usize * out_h as usize * stride);
                let mut mask = odd_mask
                    .as_ref()
                    .map(|_| Vec::with_capacity(out_w as usize * out_h as usize));
                for row in 0..out_h {
                    for col in 0..out_w {
                        let src = ((row * step) * odd_w + col * step) as usize;
                        bytes.extend_from_slice(&odd_samples[src * stride..(src + 1) * stride]);
                        if let (Some(out), Some(m)) = (mask.as_mut(), odd_mask.as_ref()) {
                            out.push(m[src]);
                        }
                    }
                }
                (out_w, out_h, bytes, mask)
            }
        };

        let samples = unpack(header.sample_type, &bytes);
        check_sample_range(&header, &samples, palette)?;

        let raster = RasterBuffer::new(
            width,
            height,
            header.sample_type,
            header.pixel_type,
            header.num_bands,
            samples,
        )
        .map_err(|e| RasterError::corrupt_tile(e.to_string()))?;

        trace!(width, height, scale = %scale, "Decoded tile");

        Ok(DecodedTile {
            raster,
            mask,
            no_data: header.no_data,
        })
    }

    fn encode(&self, tile: &DecodedTile) -> RasterResult<EncodedTile> {
        let raster = &tile.raster;
        if let Some(mask) = &tile.mask {
            if mask.len() != raster.pixel_count() {
                return Err(RasterError::invalid_argument(format!(
                    "mask holds {} bytes for {} pixels",
                    mask.len(),
                    raster.pixel_count()
                )));
            }
        }
        if let Some(no_data) = &tile.no_data {
            if !no_data.matches_format(raster.sample_type(), raster.pixel_type(), raster.num_bands())
            {
                return Err(RasterError::invalid_argument(
                    "NODATA pixel does not match the tile format",
                ));
            }
        }

        let header = Header {
            sample_type: raster.sample_type(),
            pixel_type: raster.pixel_type(),
            num_bands: raster.num_bands(),
            width: raster.width(),
            height: raster.height(),
            has_mask: tile.mask.is_some(),
            no_data: tile.no_data.clone(),
        };
        let stride = header.pixel_stride();
        let bytes = pack_buffer(raster.samples());

        let mut odd_body = Vec::new();
        let mut even_body = Vec::new();
        let mut odd_mask = Vec::new();
        let mut even_mask = Vec::new();
        for row in 0..raster.height() {
            for col in 0..raster.width() {
                let idx = row as usize * raster.width() as usize + col as usize;
                let pixel = &bytes[idx * stride..(idx + 1) * stride];
                let m = tile.mask.as_ref().map(|m| m[idx]);
                if is_odd_position(col, row) {
                    odd_body.extend_from_slice(pixel);
                    odd_mask.extend(m);
                } else {
                    even_body.extend_from_slice(pixel);
                    even_mask.extend(m);
                }
            }
        }
        odd_body.extend_from_slice(&odd_mask);
        even_body.extend_from_slice(&even_mask);

        let mut odd = Vec::new();
        header.write(&mut odd);
        odd.extend_from_slice(&self.deflate(&odd_body)?);

        let mut even = Vec::with_capacity(EVEN_HEADER_LEN);
        even.extend_from_slice(EVEN_MAGIC);
        even.extend_from_slice(&header.width.to_le_bytes());
        even.extend_from_slice(&header.height.to_le_bytes());
        even.extend_from_slice(&self.deflate(&even_body)?);

        Ok(EncodedTile {
            odd: Bytes::from(odd),
            even: Bytes::from(even),
        })
    }
}

fn read_even(
    header: &Header,
    even: &[u8],
    odd_pixels: usize,
) -> RasterResult<(Vec<u8>, Option<Vec<u8>>)> {
    if even.len() < EVEN_HEADER_LEN || &even[..4] != EVEN_MAGIC {
        return Err(RasterError::corrupt_tile("even payload has no valid header"));
    }
    let width = read_u32(&even[4..8]);
    let height = read_u32(&even[8..12]);
    if width != header.width || height != header.height {
        return Err(RasterError::corrupt_tile(format!(
            "even payload is {}x{}, odd payload is {}x{}",
            width, height, header.width, header.height
        )));
    }
    let even_pixels = header.width as usize * header.height as usize - odd_pixels;
    split_body(
        inflate(&even[EVEN_HEADER_LEN..], "even")?,
        even_pixels,
        header.pixel_stride(),
        header.has_mask,
        "even",
    )
}

/// Rebuild the full-resolution pixel order from both halves.
fn interleave(
    header: &Header,
    odd: &[u8],
    odd_mask: Option<&[u8]>,
    even: &[u8],
    even_mask: Option<&[u8]>,
) -> (Vec<u8>, Option<Vec<u8>>) {
    let stride = header.pixel_stride();
    let (odd_w, _) = header.odd_dimensions();
    let pixels = header.width as usize * header.height as usize;
    let mut bytes = Vec::with_capacity(pixels * stride);
    let mut mask = odd_mask.map(|_| Vec::with_capacity(pixels));

    let mut even_idx = 0usize;
    for row in 0..header.height {
        for col in 0..header.width {
            if is_odd_position(col, row) {
                let src = ((row / 2) * odd_w + col / 2) as usize;
                bytes.extend_from_slice(&odd[src * stride..(src + 1) * stride]);
                if let (Some(out), Some(m)) = (mask.as_mut(), odd_mask) {
                    out.push(m[src]);
                }
            } else {
                bytes.extend_from_slice(&even[even_idx * stride..(even_idx + 1) * stride]);
                if let (Some(out), Some(m)) = (mask.as_mut(), even_mask) {
                    out.push(m[even_idx]);
                }
                even_idx += 1;
            }
        }
    }
    (bytes, mask)
}

fn check_sample_range(
    header: &Header,
    samples: &SampleBuffer,
    palette: Option<&Palette>,
) -> RasterResult<()> {
    let Some(values) = <u8 as Sample>::slice(samples) else {
        return Ok(());
    };
    if let Some(max) = header.sample_type.sub_byte_max() {
        if let Some(&bad) = values.iter().find(|&&v| v > max) {
            return Err(RasterError::corrupt_tile(format!(
                "sample {} out of range for {}",
                bad, header.sample_type
            )));
        }
    }
    if header.pixel_type == PixelType::Palette {
        if let Some(palette) = palette {
            if let Some(&bad) = values.iter().find(|&&v| v as usize >= palette.len()) {
                return Err(RasterError::corrupt_tile(format!(
                    "palette index {} beyond {} entries",
                    bad,
                    palette.len()
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_common::Rgb;

    fn u8_tile(width: u32, height: u32) -> DecodedTile {
        let data: Vec<u8> = (0..width * height).map(|i| i as u8).collect();
        DecodedTile {
            raster: RasterBuffer::new(
                width,
                height,
                SampleType::UInt8,
                PixelType::Grayscale,
                1,
                SampleBuffer::UInt8(data),
            )
            .unwrap(),
            mask: None,
            no_data: None,
        }
    }

    #[test]
    fn test_full_scale_restores_all_pixels() {
        let codec = DeflateTileCodec::new();
        let tile = u8_tile(5, 3);
        let encoded = codec.encode(&tile).unwrap();
        let decoded = codec
            .decode(&encoded.odd, Some(&encoded.even), Scale::Full, None)
            .unwrap();
        assert_eq!(decoded.raster, tile.raster);
    }

    #[test]
    fn test_half_scale_uses_odd_only() {
        let codec = DeflateTileCodec::new();
        let encoded = codec.encode(&u8_tile(4, 4)).unwrap();
        let decoded = codec.decode(&encoded.odd, None, Scale::Half, None).unwrap();
        assert_eq!(decoded.raster.width(), 2);
        assert_eq!(decoded.raster.typed::<u8>().unwrap(), &[0, 2, 8, 10]);
    }

    #[test]
    fn test_eighth_scale_of_odd_size() {
        let codec = DeflateTileCodec::new();
        let encoded = codec.encode(&u8_tile(9, 9)).unwrap();
        let decoded = codec.decode(&encoded.odd, None, Scale::Eighth, None).unwrap();
        assert_eq!((decoded.raster.width(), decoded.raster.height()), (2, 2));
        assert_eq!(decoded.raster.typed::<u8>().unwrap(), &[0, 8, 72, 80]);
    }

    #[test]
    fn test_full_scale_without_even_is_corrupt() {
        let codec = DeflateTileCodec::new();
        let encoded = codec.encode(&u8_tile(4, 4)).unwrap();
        let result = codec.decode(&encoded.odd, None, Scale::Full, None);
        assert!(matches!(result, Err(RasterError::CorruptTile(_))));
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let codec = DeflateTileCodec::new();
        assert!(matches!(
            codec.decode(b"nonsense payload", None, Scale::Half, None),
            Err(RasterError::CorruptTile(_))
        ));

        let mut encoded = codec.encode(&u8_tile(4, 4)).unwrap().odd.to_vec();
        encoded.truncate(ODD_HEADER_LEN + 2);
        assert!(codec.decode(&encoded, None, Scale::Half, None).is_err());
    }

    #[test]
    fn test_mask_and_no_data_survive() {
        let codec = DeflateTileCodec::new();
        let mut tile = u8_tile(3, 3);
        tile.mask = Some(vec![1, 0, 1, 0, 1, 0, 1, 0, 1]);
        tile.no_data = Some(Pixel::from_u8(SampleType::UInt8, PixelType::Grayscale, &[7]).unwrap());

        let encoded = codec.encode(&tile).unwrap();
        let full = codec
            .decode(&encoded.odd, Some(&encoded.even), Scale::Full, None)
            .unwrap();
        assert_eq!(full.mask, tile.mask);
        assert_eq!(full.no_data, tile.no_data);

        let half = codec.decode(&encoded.odd, None, Scale::Half, None).unwrap();
        assert_eq!(half.mask, Some(vec![1, 1, 1, 1]));
    }

    #[test]
    fn test_float_samples() {
        let codec = DeflateTileCodec::new();
        let tile = DecodedTile {
            raster: RasterBuffer::new(
                2,
                2,
                SampleType::Float32,
                PixelType::DataGrid,
                1,
                SampleBuffer::Float32(vec![1.5, -2.25, 1e6, f32::NAN]),
            )
            .unwrap(),
            mask: None,
            no_data: Some(Pixel::datagrid(SampleValue::Float32(-9999.0)).unwrap()),
        };
        let encoded = codec.encode(&tile).unwrap();
        let decoded = codec
            .decode(&encoded.odd, Some(&encoded.even), Scale::Full, None)
            .unwrap();
        let values = decoded.raster.typed::<f32>().unwrap();
        assert_eq!(&values[..3], &[1.5, -2.25, 1e6]);
        assert!(values[3].is_nan());
        assert_eq!(decoded.no_data, tile.no_data);
    }

    #[test]
    fn test_palette_index_checked() {
        let codec = DeflateTileCodec::new();
        let tile = DecodedTile {
            raster: RasterBuffer::new(
                2,
                1,
                SampleType::UInt8,
                PixelType::Palette,
                1,
                SampleBuffer::UInt8(vec![0, 2]),
            )
            .unwrap(),
            mask: None,
            no_data: None,
        };
        let encoded = codec.encode(&tile).unwrap();
        let small = Palette::new(vec![Rgb::BLACK, Rgb::WHITE]).unwrap();
        assert!(codec
            .decode(&encoded.odd, Some(&encoded.even), Scale::Full, Some(&small))
            .is_err());
        assert!(codec
            .decode(&encoded.odd, Some(&encoded.even), Scale::Full, None)
            .is_ok());
    }

    #[test]
    fn test_bad_mask_length_rejected() {
        let codec = DeflateTileCodec::new();
        let mut tile = u8_tile(2, 2);
        tile.mask = Some(vec![1]);
        assert!(matches!(
            codec.encode(&tile),
            Err(RasterError::InvalidArgument(_))
        ));
    }
}
