//! Pyramid level and scale selection for a requested resolution.

use tracing::debug;

use raster_common::{PyramidLevel, RasterError, RasterResult, Scale};

/// Relative tolerance between a requested and a stored resolution.
pub const RESOLUTION_TOLERANCE: f64 = 0.01;

/// The pyramid slot a request is served from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolutionMatch {
    pub level: u32,
    pub scale: Scale,
    pub x_res: f64,
    pub y_res: f64,
}

fn within_tolerance(requested: f64, stored: f64) -> bool {
    requested >= stored * (1.0 - RESOLUTION_TOLERANCE)
        && requested <= stored * (1.0 + RESOLUTION_TOLERANCE)
}

/// Find the slot whose stored resolution matches the request within ±1%.
///
/// Levels are scanned in ascending level id, and within a level the slots
/// in 1/1, 1/2, 1/4, 1/8 order. When several slots match, the **last** one
/// in that scan order is returned, not the closest.
pub fn match_resolution(
    levels: &[PyramidLevel],
    x_res: f64,
    y_res: f64,
) -> RasterResult<ResolutionMatch> {
    let mut ordered: Vec<&PyramidLevel> = levels.iter().collect();
    ordered.sort_by_key(|l| l.level);

    let mut found = None;
    for level in ordered {
        for scale in Scale::ALL {
            let Some((slot_x, slot_y)) = level.resolution(scale) else {
                continue;
            };
            if within_tolerance(x_res, slot_x) && within_tolerance(y_res, slot_y) {
                found = Some(ResolutionMatch {
                    level: level.level,
                    scale,
                    x_res: slot_x,
                    y_res: slot_y,
                });
            }
        }
    }

    match found {
        Some(m) => {
            debug!(level = m.level, scale = %m.scale, x_res = m.x_res, y_res = m.y_res, "Matched resolution");
            Ok(m)
        }
        None => Err(RasterError::not_found(format!(
            "no pyramid level matches resolution {}x{}",
            x_res, y_res
        ))),
    }
}
