//! GeoTIFF loading via the `tiff` crate.
//!
//! Only the first image of the file is read, and it must be a single
//! band. Georeferencing comes from `ModelPixelScaleTag` +
//! `ModelTiepointTag`; nodata comes from the GDAL `GDAL_NODATA` tag when
//! present, rounded to the sample type so it matches widened cells.

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

use crate::{DensityError, DensityRaster, GeoTransform};

/// Reads a GeoTIFF file into a [`DensityRaster`].
///
/// # Errors
///
/// Returns [`DensityError`] if the file cannot be opened, is not a TIFF,
/// has no georeferencing, or uses an unsupported pixel format.
pub fn read_geotiff(path: &Path) -> Result<DensityRaster, DensityError> {
    let file = File::open(path).map_err(|e| DensityError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let raster = decode(BufReader::new(file))?;

    let (rows, cols) = raster.shape();
    log::info!("Loaded {rows}x{cols} density raster from {}", path.display());

    Ok(raster)
}

/// Reads a GeoTIFF from an in-memory buffer.
///
/// # Errors
///
/// Same as [`read_geotiff`], minus the file I/O.
pub fn read_geotiff_from_buffer(data: &[u8]) -> Result<DensityRaster, DensityError> {
    decode(Cursor::new(data))
}

fn decode<R: Read + Seek>(reader: R) -> Result<DensityRaster, DensityError> {
    let mut decoder = Decoder::new(reader)?;
    let (width, height) = decoder.dimensions()?;
    let transform = read_geotransform(&mut decoder)?;
    let nodata = read_nodata(&mut decoder);

    let image = decoder.read_image()?;
    let nodata = nodata.map(|value| in_sample_type(value, &image));
    let data = to_f64(image)?;

    DensityRaster::new(height as usize, width as usize, transform, nodata, data)
}

macro_rules! widen {
    ($buf:expr) => {
        $buf.into_iter().map(|v| v as f64).collect()
    };
}

/// Rounds `value` to what a cell of `image`'s sample type holds once
/// widened, so nodata compares equal to the masked cells.
#[allow(clippy::cast_possible_truncation)]
fn in_sample_type(value: f64, image: &DecodingResult) -> f64 {
    match image {
        DecodingResult::F32(_) => f64::from(value as f32),
        _ => value,
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_lossless)]
fn to_f64(result: DecodingResult) -> Result<Vec<f64>, DensityError> {
    Ok(match result {
        DecodingResult::F64(buf) => buf,
        DecodingResult::F32(buf) => widen!(buf),
        DecodingResult::U8(buf) => widen!(buf),
        DecodingResult::U16(buf) => widen!(buf),
        DecodingResult::U32(buf) => widen!(buf),
        DecodingResult::U64(buf) => widen!(buf),
        DecodingResult::I8(buf) => widen!(buf),
        DecodingResult::I16(buf) => widen!(buf),
        DecodingResult::I32(buf) => widen!(buf),
        DecodingResult::I64(buf) => widen!(buf),
        #[allow(unreachable_patterns)]
        _ => {
            return Err(DensityError::UnsupportedPixelFormat(
                "unknown TIFF sample type".to_string(),
            ));
        }
    })
}

fn read_geotransform<R: Read + Seek>(
    decoder: &mut Decoder<R>,
) -> Result<GeoTransform, DensityError> {
    let scale = decoder
        .get_tag_f64_vec(Tag::ModelPixelScaleTag)
        .map_err(|_| DensityError::MissingGeoTransform {
            message: "no ModelPixelScaleTag".to_string(),
        })?;
    let tiepoint = decoder
        .get_tag_f64_vec(Tag::ModelTiepointTag)
        .map_err(|_| DensityError::MissingGeoTransform {
            message: "no ModelTiepointTag".to_string(),
        })?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return Err(DensityError::MissingGeoTransform {
            message: format!(
                "expected 2+ scale and 6+ tiepoint values, got {} and {}",
                scale.len(),
                tiepoint.len()
            ),
        });
    }

    // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
    let origin_x = tiepoint[0].mul_add(-scale[0], tiepoint[3]);
    let origin_y = tiepoint[1].mul_add(scale[1], tiepoint[4]);

    Ok(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    let raw = decoder
        .get_tag_ascii_string(Tag::GdalNodata)
        .ok()?;
    let parsed = raw.trim_matches(char::from(0)).trim().parse::<f64>();
    match parsed {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Ignoring unparseable GDAL_NODATA value {raw:?}: {e}");
            None
        }
    }
}
