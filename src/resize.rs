use crate::{error::SnapshotError, structs::ResizeFilter};
use image::{RgbaImage, imageops};

/// Rescales the canvas uniformly. `fixed_edge` sets the longer side and wins over `scale`.
pub fn resize(
    canvas: RgbaImage,
    scale: Option<f64>,
    fixed_edge: Option<u32>,
    filter: ResizeFilter,
) -> Result<RgbaImage, SnapshotError> {
    let Some((width, height)) = target_size(canvas.dimensions(), scale, fixed_edge)? else {
        return Ok(canvas);
    };

    if (width, height) == canvas.dimensions() {
        return Ok(canvas);
    }

    log::debug!(
        "resizing {}x{} to {width}x{height} using {filter:?}",
        canvas.width(),
        canvas.height()
    );

    Ok(imageops::resize(&canvas, width, height, filter.into()))
}

/// Output size for the given parameters, `None` when no resizing was requested.
pub fn target_size(
    (width, height): (u32, u32),
    scale: Option<f64>,
    fixed_edge: Option<u32>,
) -> Result<Option<(u32, u32)>, SnapshotError> {
    match (fixed_edge, scale) {
        (Some(0), _) => Err(SnapshotError::InvalidTileSize(0)),
        (Some(edge), _) => {
            let longer = width.max(height);

            // the longer side is set exactly instead of going through a float factor
            let fit = |side: u32| {
                if side == longer {
                    edge
                } else {
                    scaled(side, f64::from(edge) / f64::from(longer))
                }
            };

            Ok(Some((fit(width), fit(height))))
        }
        (None, Some(scale)) if !scale.is_finite() || scale <= 0.0 => {
            Err(SnapshotError::InvalidScale(scale))
        }
        (None, Some(scale)) => Ok(Some((scaled(width, scale), scaled(height, scale)))),
        (None, None) => Ok(None),
    }
}

fn scaled(side: u32, factor: f64) -> u32 {
    (f64::from(side) * factor).round().clamp(1.0, f64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn no_parameters_is_identity() {
        let canvas = RgbaImage::from_pixel(3, 5, Rgba([1, 2, 3, 4]));

        let out = resize(canvas.clone(), None, None, ResizeFilter::default()).unwrap();

        assert_eq!(out, canvas);
    }

    #[test]
    fn fixed_edge_sets_longer_side() {
        assert_eq!(target_size((256, 128), None, Some(64)).unwrap(), Some((64, 32)));
        assert_eq!(target_size((128, 256), None, Some(64)).unwrap(), Some((32, 64)));
        assert_eq!(target_size((100, 100), None, Some(300)).unwrap(), Some((300, 300)));
    }

    #[test]
    fn fixed_edge_wins_over_scale() {
        assert_eq!(target_size((256, 128), Some(3.0), Some(64)).unwrap(), Some((64, 32)));
    }

    #[test]
    fn scale_rounds_and_keeps_at_least_one_pixel() {
        assert_eq!(target_size((256, 256), Some(0.5), None).unwrap(), Some((128, 128)));
        assert_eq!(target_size((3, 5), Some(0.5), None).unwrap(), Some((2, 3)));
        assert_eq!(target_size((1000, 1), Some(0.01), None).unwrap(), Some((10, 1)));
        assert_eq!(target_size((4, 2), Some(2.5), None).unwrap(), Some((10, 5)));
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(matches!(
            target_size((8, 8), Some(0.0), None),
            Err(SnapshotError::InvalidScale(_))
        ));
        assert!(matches!(
            target_size((8, 8), Some(-1.0), None),
            Err(SnapshotError::InvalidScale(_))
        ));
        assert!(matches!(
            target_size((8, 8), None, Some(0)),
            Err(SnapshotError::InvalidTileSize(0))
        ));
    }

    #[test]
    fn resized_canvas_has_target_size() {
        let canvas = RgbaImage::from_pixel(256, 128, Rgba([9, 9, 9, 255]));

        let out = resize(canvas, None, Some(64), ResizeFilter::Triangle).unwrap();

        assert_eq!(out.dimensions(), (64, 32));
        assert!(out.pixels().all(|px| *px == Rgba([9, 9, 9, 255])));
    }

    #[test]
    fn resizing_is_deterministic() {
        let canvas = RgbaImage::from_fn(40, 30, |x, y| Rgba([(x * 6) as u8, (y * 8) as u8, 77, 255]));

        let a = resize(canvas.clone(), Some(0.37), None, ResizeFilter::Lanczos3).unwrap();
        let b = resize(canvas, Some(0.37), None, ResizeFilter::Lanczos3).unwrap();

        assert_eq!(a, b);
    }
}
