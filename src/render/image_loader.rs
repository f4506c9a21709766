use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, DynamicImage, ImageFormat, ImageReader};

use crate::error::{DeckError, ImageLoadError};

/// Reads and decodes a raster file. Animated GIFs yield their first frame.
///
/// The file is read fully and released before decoding.
pub fn open_image(path: &Path) -> Result<DynamicImage, ImageLoadError> {
    let bytes = std::fs::read(path)?;
    let format = image::guess_format(&bytes).ok();

    if format == Some(ImageFormat::Gif) {
        let decoder = GifDecoder::new(Cursor::new(bytes))?;
        let mut frames = decoder.into_frames();
        return match frames.next() {
            Some(frame) => Ok(DynamicImage::ImageRgba8(frame?.into_buffer())),
            None => Err(ImageLoadError::NoFrames),
        };
    }

    let img = match format {
        Some(fmt) => image::load_from_memory_with_format(&bytes, fmt)?,
        None => image::load_from_memory(&bytes)?,
    };
    Ok(img)
}

/// Reads (width, height) from the image header without a full decode.
pub fn read_dimensions(path: &Path) -> Result<(u32, u32), ImageLoadError> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    Ok(reader.into_dimensions()?)
}

/// Output format implied by a path's extension.
pub fn output_format(path: &Path) -> Result<ImageFormat, DeckError> {
    ImageFormat::from_path(path).map_err(|_| DeckError::UnsupportedOutput {
        path: path.to_path_buf(),
    })
}

/// Writes an image to `path`, creating parent directories and replacing any
/// existing file. The format follows the extension; alpha is dropped for
/// formats that cannot store it.
///
/// The image is encoded into a temp file beside `path` and renamed into
/// place, so a failed write leaves any previous file untouched.
pub fn save_image(img: DynamicImage, path: &Path) -> Result<(), DeckError> {
    let format = output_format(path)?;
    let io_error = |source: std::io::Error| DeckError::Io {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            std::fs::create_dir_all(parent).map_err(|source| DeckError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
            parent
        }
        None => Path::new("."),
    };

    let img = if supports_alpha(format) {
        img
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    };

    let mut temp = tempfile::Builder::new()
        .prefix(".geomet-")
        .suffix(".part")
        .tempfile_in(parent)
        .map_err(io_error)?;
    encode_to(&img, temp.as_file_mut(), format, path)?;
    temp.persist(path).map_err(|e| io_error(e.error))?;

    Ok(())
}

/// Encodes through a buffered writer and flushes it, so late write errors
/// surface as `DeckError::Io`.
fn encode_to<W: Write + Seek>(
    img: &DynamicImage,
    sink: W,
    format: ImageFormat,
    path: &Path,
) -> Result<(), DeckError> {
    let mut writer = BufWriter::new(sink);
    img.write_to(&mut writer, format)
        .map_err(|source| DeckError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
    writer.flush().map_err(|source| DeckError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn supports_alpha(format: ImageFormat) -> bool {
    !matches!(format, ImageFormat::Jpeg | ImageFormat::Bmp)
}

/// Whether a path looks like a raster file this crate can read.
pub fn is_image_path(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    matches!(
        ext.to_lowercase().as_str(),
        "jpg" | "jpeg" | "png" | "webp" | "gif" | "bmp" | "tiff" | "tif"
    )
}
