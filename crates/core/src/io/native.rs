//! Native GeoTIFF reading/writing
//!
//! Uses the `tiff` crate for single-band TIFF I/O. Georeferencing is read
//! from and written to the ModelPixelScale / ModelTiepoint tags; written
//! files declare a geographic (lon/lat, EPSG:4326) model.

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement, ValidityMask};
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{ColorType, Gray32Float, Gray8};
use tiff::encoder::{TiffEncoder, TiffValue};
use tiff::tags::Tag;

// The decoder maps the GeoTIFF tag ids to named variants, so lookups must
// use those rather than `Tag::Unknown(id)`.
const MODEL_PIXEL_SCALE: Tag = Tag::ModelPixelScaleTag;
const MODEL_TIEPOINT: Tag = Tag::ModelTiepointTag;
const GEO_KEY_DIRECTORY: Tag = Tag::GeoKeyDirectoryTag;

/// Read a single-band GeoTIFF file into a Raster
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    decode_geotiff(file)
}

/// Read a GeoTIFF from an in-memory buffer into a Raster
pub fn read_geotiff_from_buffer<T>(data: &[u8]) -> Result<Raster<T>>
where
    T: RasterElement,
{
    decode_geotiff(Cursor::new(data))
}

/// Internal: decode a GeoTIFF from any `Read + Seek` source
fn decode_geotiff<T, R>(reader: R) -> Result<Raster<T>>
where
    T: RasterElement,
    R: std::io::Read + std::io::Seek,
{
    let mut decoder = Decoder::new(reader)
        .map_err(|e| Error::Other(format!("TIFF decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("Cannot read dimensions: {}", e)))?;

    let rows = height as usize;
    let cols = width as usize;

    let result = decoder
        .read_image()
        .map_err(|e| Error::Other(format!("Cannot read image data: {}", e)))?;

    let data: Vec<T> = match result {
        DecodingResult::F32(buf) => cast_all(&buf),
        DecodingResult::F64(buf) => cast_all(&buf),
        DecodingResult::U8(buf) => cast_all(&buf),
        DecodingResult::U16(buf) => cast_all(&buf),
        DecodingResult::U32(buf) => cast_all(&buf),
        DecodingResult::I16(buf) => cast_all(&buf),
        DecodingResult::I32(buf) => cast_all(&buf),
        _ => return Err(Error::UnsupportedDataType("Unsupported TIFF pixel format".to_string())),
    };

    if data.len() != rows * cols {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }

    let mut raster = Raster::from_vec(data, rows, cols)?;

    if let Some(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }

    Ok(raster)
}

fn cast_all<S, T>(buf: &[S]) -> Vec<T>
where
    S: num_traits::NumCast + Copy,
    T: RasterElement,
{
    buf.iter()
        .map(|&v| num_traits::cast(v).unwrap_or(T::default_nodata()))
        .collect()
}

/// GeoTransform from ModelPixelScaleTag + ModelTiepointTag, if both are present
fn read_geotransform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(MODEL_PIXEL_SCALE).ok()?;
    let tiepoint = decoder.get_tag_f64_vec(MODEL_TIEPOINT).ok()?;

    if scale.len() >= 2 && tiepoint.len() >= 6 {
        // tiepoint: [I, J, K, X, Y, Z]
        let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
        let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
        return Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]));
    }
    None
}

/// Write a Raster to a GeoTIFF file as 32-bit float
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    encode_geotiff::<Gray32Float, _, _>(raster.transform(), raster.shape(), &as_f32(raster), file)
}

/// Write a Raster to an in-memory GeoTIFF buffer as 32-bit float
pub fn write_geotiff_to_buffer<T>(raster: &Raster<T>) -> Result<Vec<u8>>
where
    T: RasterElement,
{
    let mut buf = Vec::new();
    encode_geotiff::<Gray32Float, _, _>(
        raster.transform(),
        raster.shape(),
        &as_f32(raster),
        Cursor::new(&mut buf),
    )?;
    Ok(buf)
}

/// Write a mask as an 8-bit GeoTIFF (255 = set, 0 = unset)
pub fn write_mask_geotiff<P: AsRef<Path>>(
    mask: &ValidityMask,
    transform: GeoTransform,
    path: P,
) -> Result<()> {
    let raster = mask.to_raster(transform);
    let data: Vec<u8> = raster.data().iter().copied().collect();
    let file = File::create(path.as_ref())?;
    encode_geotiff::<Gray8, _, _>(&transform, raster.shape(), &data, file)
}

fn as_f32<T: RasterElement>(raster: &Raster<T>) -> Vec<f32> {
    raster
        .data()
        .iter()
        .map(|&v| num_traits::cast(v).unwrap_or(f32::NAN))
        .collect()
}

/// Internal: encode one band plus georeferencing tags into any `Write + Seek` sink
fn encode_geotiff<C, W, S>(
    gt: &GeoTransform,
    (rows, cols): (usize, usize),
    data: &[S],
    writer: W,
) -> Result<()>
where
    C: ColorType<Inner = S>,
    [S]: TiffValue,
    W: std::io::Write + std::io::Seek,
{
    let mut encoder =
        TiffEncoder::new(writer).map_err(|e| Error::Other(format!("TIFF encoder error: {}", e)))?;

    let mut image = encoder
        .new_image::<C>(cols as u32, rows as u32)
        .map_err(|e| Error::Other(format!("Cannot create TIFF image: {}", e)))?;

    let scale = vec![gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(MODEL_PIXEL_SCALE, scale.as_slice())
        .map_err(|e| Error::Other(format!("Cannot write scale tag: {}", e)))?;

    let tiepoint = vec![0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(MODEL_TIEPOINT, tiepoint.as_slice())
        .map_err(|e| Error::Other(format!("Cannot write tiepoint tag: {}", e)))?;

    // GTModelTypeGeoKey=2 (Geographic), GTRasterTypeGeoKey=1 (PixelIsArea),
    // GeographicTypeGeoKey=4326 (WGS 84).
    let geokeys: Vec<u16> = vec![
        1, 1, 0, 3,
        1024, 0, 1, 2,
        1025, 0, 1, 1,
        2048, 0, 1, 4326,
    ];
    image
        .encoder()
        .write_tag(GEO_KEY_DIRECTORY, geokeys.as_slice())
        .map_err(|e| Error::Other(format!("Cannot write geokey tag: {}", e)))?;

    image
        .write_data(data)
        .map_err(|e| Error::Other(format!("Cannot write image data: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_buffer_roundtrip_keeps_georeferencing() {
        let mut raster: Raster<f64> = Raster::new(4, 6);
        for row in 0..4 {
            for col in 0..6 {
                raster.set(row, col, (row * 6 + col) as f64 * 0.25).unwrap();
            }
        }
        raster.set_transform(GeoTransform::new(10.0, 45.0, 0.001, -0.001));

        let buf = write_geotiff_to_buffer(&raster).unwrap();
        let back: Raster<f64> = read_geotiff_from_buffer(&buf).unwrap();

        assert_eq!(back.shape(), (4, 6));
        assert_relative_eq!(back.get(3, 5).unwrap(), 5.75, epsilon = 1e-6);
        assert_relative_eq!(back.transform().origin_x, 10.0, epsilon = 1e-9);
        assert_relative_eq!(back.transform().pixel_height, -0.001, epsilon = 1e-12);
    }

    #[test]
    fn test_mask_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mask.tif");
        let mask = ValidityMask::from_raster(&Raster::filled(3, 3, 1.0_f64), |v| v > 0.0);

        write_mask_geotiff(&mask, GeoTransform::new(0.0, 0.01, 0.001, -0.001), &path).unwrap();
        let back: Raster<u8> = read_geotiff(&path).unwrap();
        assert_eq!(back.get(2, 2).unwrap(), 255);
        assert_relative_eq!(back.transform().origin_y, 0.01, epsilon = 1e-12);
        assert_relative_eq!(back.transform().pixel_width, 0.001, epsilon = 1e-12);
    }

    #[test]
    fn test_file_roundtrip_keeps_region_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("B08.tif");
        let region = crate::BoundingBox::new(-62.0, -10.0, -61.9, -9.9).unwrap();
        let mut raster = Raster::filled(6, 5, 0.3_f64);
        raster.set_transform(region.geotransform(6, 5));

        write_geotiff(&raster, &path).unwrap();
        let back: Raster<f64> = read_geotiff(&path).unwrap();

        let (min_x, min_y, max_x, max_y) = back.bounds();
        assert_relative_eq!(min_x, -62.0, epsilon = 1e-9);
        assert_relative_eq!(min_y, -10.0, epsilon = 1e-9);
        assert_relative_eq!(max_x, -61.9, epsilon = 1e-9);
        assert_relative_eq!(max_y, -9.9, epsilon = 1e-9);
    }
}
