//! Deck mosaic composition.
//!
//! Places each panel's image on a single canvas according to the deck
//! layout. Panels are resized to their own declared size, not to their
//! cell, so panels smaller than their row or column maximum leave
//! background showing in the rest of the cell.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use tracing::{debug, info, trace};

use crate::config::RenderOptions;
use crate::error::DeckError;
use crate::layout::MosaicLayout;
use crate::models::{DeckSpec, PanelMap, PanelSpec};
use crate::render::image_loader;

/// Composes deck mosaics from per-panel images.
///
/// Stateless apart from its options; every call is a full recomputation.
#[derive(Debug, Clone, Default)]
pub struct DeckRenderer {
    options: RenderOptions,
}

impl DeckRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Renders a deck with default options and writes it to `output_path`.
    pub fn create_mosaic(
        deck: &DeckSpec,
        panels: &PanelMap,
        output_path: &Path,
    ) -> Result<PathBuf, DeckError> {
        Self::default().compose(deck, panels, output_path)
    }

    /// Renders a deck and writes the mosaic to `output_path`.
    ///
    /// Parent directories are created and an existing file is replaced.
    /// Nothing is written if a panel reference or image is missing, and a
    /// failed write leaves any previous file at `output_path` untouched.
    ///
    /// # Errors
    /// * `PanelNotFound` - a layout id has no entry in `panels`
    /// * `ImageMissing` - a referenced panel has no existing image file
    /// * `PanelImage` - a panel image could not be read or decoded
    /// * `CanvasTooLarge` - the summed row heights or column widths overflow
    /// * `UnsupportedOutput`, `Io`, `Encode` - writing the output failed
    pub fn compose(
        &self,
        deck: &DeckSpec,
        panels: &PanelMap,
        output_path: &Path,
    ) -> Result<PathBuf, DeckError> {
        // Fail on a bad output extension before decoding any panel.
        image_loader::output_format(output_path)?;

        let mosaic = self.render(deck, panels)?;
        image_loader::save_image(DynamicImage::ImageRgba8(mosaic), output_path)?;

        info!(?output_path, "Saved deck mosaic");
        Ok(output_path.to_path_buf())
    }

    /// Renders a deck to an in-memory RGBA canvas.
    pub fn render(&self, deck: &DeckSpec, panels: &PanelMap) -> Result<RgbaImage, DeckError> {
        Self::validate(deck, panels)?;

        let layout = MosaicLayout::compute(deck, panels)?;
        let (width, height) = layout.canvas_size();
        debug!(
            rows = deck.rows(),
            cols = deck.cols(),
            width,
            height,
            "Computed mosaic layout"
        );

        let mut canvas = RgbaImage::from_pixel(width, height, self.options.background);

        for placement in &layout.placements {
            let panel = &panels[&placement.panel_id];
            let tile = self.load_panel(panel)?;
            imageops::replace(
                &mut canvas,
                &tile,
                i64::from(placement.x),
                i64::from(placement.y),
            );
            trace!(
                panel_id = %placement.panel_id,
                x = placement.x,
                y = placement.y,
                "Pasted panel"
            );
        }

        Ok(canvas)
    }

    /// Checks every panel reference, then every panel image, in layout order.
    pub fn validate(deck: &DeckSpec, panels: &PanelMap) -> Result<(), DeckError> {
        for (_, _, id) in deck.positions() {
            if !panels.contains_key(id) {
                return Err(DeckError::PanelNotFound {
                    panel_id: id.to_string(),
                });
            }
        }

        for (_, _, id) in deck.positions() {
            let panel = &panels[id];
            if panel.width() == 0 || panel.height() == 0 {
                return Err(DeckError::InvalidPanel {
                    panel_id: id.to_string(),
                    width: panel.width(),
                    height: panel.height(),
                });
            }
            if panel.resolved_image().is_none() {
                return Err(DeckError::ImageMissing {
                    panel_id: id.to_string(),
                    path: panel.image_path().map(Path::to_path_buf),
                });
            }
        }

        Ok(())
    }

    /// Loads one panel image and resizes it to the panel's declared size.
    ///
    /// The decoded source is dropped before returning, so only one panel
    /// image is held at a time.
    fn load_panel(&self, panel: &PanelSpec) -> Result<RgbaImage, DeckError> {
        let path = panel.image_path().ok_or_else(|| DeckError::ImageMissing {
            panel_id: panel.id().to_string(),
            path: None,
        })?;

        let img = image_loader::open_image(path).map_err(|source| DeckError::PanelImage {
            panel_id: panel.id().to_string(),
            path: path.to_path_buf(),
            source,
        })?;

        Ok(resize_to(&img, panel.width(), panel.height(), self.options.filter))
    }
}

/// Resizes to exactly (width, height), ignoring the source aspect ratio.
fn resize_to(img: &DynamicImage, width: u32, height: u32, filter: FilterType) -> RgbaImage {
    if img.width() == width && img.height() == height {
        return img.to_rgba8();
    }
    img.resize_exact(width, height, filter).into_rgba8()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::panel_map;
    use image::Rgba;
    use tempfile::{tempdir, TempDir};

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    fn write_solid(dir: &TempDir, name: &str, w: u32, h: u32, color: Rgba<u8>) -> PathBuf {
        let path = dir.path().join(name);
        RgbaImage::from_pixel(w, h, color).save(&path).unwrap();
        path
    }

    fn panel(id: &str, w: u32, h: u32, path: PathBuf) -> PanelSpec {
        PanelSpec::new(id, w, h, Some(path)).unwrap()
    }

    /// Four solid panels with (w, h) 10x10, 10x20, 20x10, 20x20.
    fn four_panel_deck(dir: &TempDir) -> (DeckSpec, PanelMap) {
        let deck = DeckSpec::from_rows([["P00", "P01"], ["P10", "P11"]]).unwrap();
        let panels = panel_map(vec![
            panel("P00", 10, 10, write_solid(dir, "p00.png", 3, 3, RED)),
            panel("P01", 10, 20, write_solid(dir, "p01.png", 5, 5, GREEN)),
            panel("P10", 20, 10, write_solid(dir, "p10.png", 7, 2, BLUE)),
            panel("P11", 20, 20, write_solid(dir, "p11.png", 20, 20, BLACK)),
        ]);
        (deck, panels)
    }

    #[test]
    fn test_canvas_size_is_sum_of_maxima() {
        let dir = tempdir().unwrap();
        let (deck, panels) = four_panel_deck(&dir);
        let out = dir.path().join("mosaic.png");

        let written = DeckRenderer::create_mosaic(&deck, &panels, &out).unwrap();
        assert_eq!(written, out);

        let img = image::open(&out).unwrap();
        assert_eq!((img.width(), img.height()), (40, 40));
    }

    #[test]
    fn test_panel_resized_to_declared_size_not_cell() {
        let dir = tempdir().unwrap();
        let (deck, panels) = four_panel_deck(&dir);
        let canvas = DeckRenderer::default().render(&deck, &panels).unwrap();

        // P00 is 10x10 inside a 20x20 cell: background to the right and below.
        assert_eq!(*canvas.get_pixel(0, 0), RED);
        assert_eq!(*canvas.get_pixel(9, 9), RED);
        assert_eq!(*canvas.get_pixel(10, 0), WHITE);
        assert_eq!(*canvas.get_pixel(0, 10), WHITE);
        assert_eq!(*canvas.get_pixel(19, 19), WHITE);

        // P01 (10x20) starts at x=20, so x=30..40 of row 0 is background.
        assert_eq!(*canvas.get_pixel(20, 0), GREEN);
        assert_eq!(*canvas.get_pixel(29, 19), GREEN);
        assert_eq!(*canvas.get_pixel(30, 0), WHITE);

        // P10 (20x10) in row 1: stretched from a 7x2 source, no aspect kept.
        assert_eq!(*canvas.get_pixel(0, 20), BLUE);
        assert_eq!(*canvas.get_pixel(19, 29), BLUE);
        assert_eq!(*canvas.get_pixel(0, 30), WHITE);

        // P11 fills its cell exactly.
        assert_eq!(*canvas.get_pixel(20, 20), BLACK);
        assert_eq!(*canvas.get_pixel(39, 39), BLACK);
    }

    #[test]
    fn test_background_is_opaque() {
        let dir = tempdir().unwrap();
        let (deck, panels) = four_panel_deck(&dir);
        let canvas = DeckRenderer::default().render(&deck, &panels).unwrap();
        assert!(canvas.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn test_custom_background() {
        let dir = tempdir().unwrap();
        let (deck, panels) = four_panel_deck(&dir);
        let grey = Rgba([128, 128, 128, 255]);
        let renderer = DeckRenderer::new(RenderOptions {
            background: grey,
            ..RenderOptions::default()
        });
        let canvas = renderer.render(&deck, &panels).unwrap();
        assert_eq!(*canvas.get_pixel(15, 15), grey);
    }

    #[test]
    fn test_missing_panel_id_writes_nothing() {
        let dir = tempdir().unwrap();
        let deck = DeckSpec::from_rows([["A", "X"]]).unwrap();
        let panels = panel_map(vec![panel(
            "A",
            4,
            4,
            write_solid(&dir, "a.png", 4, 4, RED),
        )]);
        let out = dir.path().join("sub").join("mosaic.png");

        let err = DeckRenderer::create_mosaic(&deck, &panels, &out).unwrap_err();
        assert!(matches!(err, DeckError::PanelNotFound { ref panel_id } if panel_id == "X"));
        assert!(err.to_string().contains("'X'"));
        assert!(!out.exists());
        assert!(!out.parent().unwrap().exists());
    }

    #[test]
    fn test_missing_image_file() {
        let dir = tempdir().unwrap();
        let deck = DeckSpec::from_rows([["A"]]).unwrap();
        let gone = dir.path().join("gone.png");
        let panels = panel_map(vec![panel("A", 4, 4, gone.clone())]);
        let out = dir.path().join("mosaic.png");

        let err = DeckRenderer::create_mosaic(&deck, &panels, &out).unwrap_err();
        match err {
            DeckError::ImageMissing { panel_id, path } => {
                assert_eq!(panel_id, "A");
                assert_eq!(path, Some(gone));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!out.exists());
    }

    #[test]
    fn test_panel_without_image_reference() {
        let deck = DeckSpec::from_rows([["A"]]).unwrap();
        let panels = panel_map(vec![PanelSpec::new("A", 4, 4, None).unwrap()]);
        let err = DeckRenderer::default().render(&deck, &panels).unwrap_err();
        assert!(matches!(err, DeckError::ImageMissing { path: None, .. }));
    }

    #[test]
    fn test_references_checked_before_images() {
        let dir = tempdir().unwrap();
        let deck = DeckSpec::from_rows([["A", "X"]]).unwrap();
        let panels = panel_map(vec![panel("A", 4, 4, dir.path().join("gone.png"))]);
        let err = DeckRenderer::validate(&deck, &panels).unwrap_err();
        assert!(matches!(err, DeckError::PanelNotFound { .. }));
    }

    #[test]
    fn test_overwrites_existing_output() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("mosaic.png");
        RgbaImage::from_pixel(1, 1, GREEN).save(&out).unwrap();

        let deck = DeckSpec::from_rows([["A"]]).unwrap();
        let panels = panel_map(vec![panel(
            "A",
            6,
            3,
            write_solid(&dir, "a.png", 2, 2, RED),
        )]);
        DeckRenderer::create_mosaic(&deck, &panels, &out).unwrap();

        let img = image::open(&out).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (6, 3));
        assert_eq!(*img.get_pixel(5, 2), RED);
    }

    #[test]
    fn test_oversized_canvas_writes_nothing() {
        let dir = tempdir().unwrap();
        let deck = DeckSpec::from_rows([["A", "B"]]).unwrap();
        let panels = panel_map(vec![
            panel("A", u32::MAX, 1, write_solid(&dir, "a.png", 1, 1, RED)),
            panel("B", 1, 1, write_solid(&dir, "b.png", 1, 1, BLUE)),
        ]);
        let out = dir.path().join("nested").join("mosaic.png");

        let err = DeckRenderer::create_mosaic(&deck, &panels, &out).unwrap_err();
        assert!(matches!(err, DeckError::CanvasTooLarge { height: 1, .. }));
        assert!(!out.parent().unwrap().exists());
    }

    #[test]
    fn test_undecodable_panel_image() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"nope").unwrap();
        let deck = DeckSpec::from_rows([["A"]]).unwrap();
        let panels = panel_map(vec![panel("A", 2, 2, path)]);

        let err = DeckRenderer::default().render(&deck, &panels).unwrap_err();
        assert!(matches!(err, DeckError::PanelImage { ref panel_id, .. } if panel_id == "A"));
    }

    #[test]
    fn test_jpeg_output() {
        let dir = tempdir().unwrap();
        let (deck, panels) = four_panel_deck(&dir);
        let out = dir.path().join("mosaic.jpg");
        DeckRenderer::create_mosaic(&deck, &panels, &out).unwrap();
        assert_eq!(image_loader::read_dimensions(&out).unwrap(), (40, 40));
    }
}
