//! Image Introspection - Width And Resolution Metadata
//!
//! The resolver only ever needs two facts about a facsimile file: its pixel
//! width and, for the calibration master, its embedded dpi. Both reads go
//! through the `ImageInspector` trait so the scan logic stays testable
//! without real image files.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use exif::{In, Tag, Value};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("Failed to read image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Failed to open image: {0}")]
    Io(#[from] std::io::Error),
}

/// Read-only access to the two image attributes the resolver cares about.
pub trait ImageInspector {
    /// Pixel width of the image at `path`.
    fn width(&self, path: &Path) -> Result<u32, InspectError>;

    /// Embedded resolution in pixels per inch, if the image carries any.
    ///
    /// Metadata problems are not I/O failures: an unreadable or absent
    /// resolution tag yields `None` and the caller falls back to the
    /// default dpi.
    fn dpi(&self, path: &Path) -> Option<u32>;
}

/// Inspector backed by the real filesystem.
///
/// Width comes from the image header only (no full decode); dpi from the
/// EXIF `XResolution` tag, converted from per-centimeter values where the
/// resolution unit says so.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsInspector;

impl ImageInspector for FsInspector {
    fn width(&self, path: &Path) -> Result<u32, InspectError> {
        let (width, _height) = image::image_dimensions(path)?;
        Ok(width)
    }

    fn dpi(&self, path: &Path) -> Option<u32> {
        match read_exif_dpi(path) {
            Ok(dpi) => dpi,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "No usable resolution metadata");
                None
            }
        }
    }
}

fn read_exif_dpi(path: &Path) -> Result<Option<u32>, InspectError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(&file);
    let exif = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        // No EXIF segment at all is the common case for scaled JPEGs.
        Err(_) => return Ok(None),
    };

    let Some(field) = exif.get_field(Tag::XResolution, In::PRIMARY) else {
        return Ok(None);
    };
    let Value::Rational(ref rationals) = field.value else {
        return Ok(None);
    };
    let Some(rational) = rationals.first() else {
        return Ok(None);
    };

    let mut per_inch = rational.to_f64();
    // Unit 3 means pixels per centimeter.
    if let Some(unit) = exif.get_field(Tag::ResolutionUnit, In::PRIMARY) {
        if unit.value.get_uint(0) == Some(3) {
            per_inch *= 2.54;
        }
    }

    if per_inch > 0.0 {
        Ok(Some(per_inch.round() as u32))
    } else {
        Ok(None)
    }
}
