//! Heatmap rasterisation of point events for a single map view.

use crate::config::{HeatmapConfig, ViewConfig};
use crate::projection::lon_lat_to_world_pixel;
use crate::types::PointEvent;
use anyhow::{anyhow, Context, Result};
use image::{ImageBuffer, Rgba, RgbaImage};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Largest accepted view edge, in pixels.
pub const MAX_VIEW_EDGE: u32 = 16_384;

/// Accumulated kernel weights, one cell per output pixel.
#[derive(Debug, Clone)]
pub struct IntensityGrid {
    width: u32,
    height: u32,
    cells: Vec<f32>,
}

impl IntensityGrid {
    /// Intensity at `(x, y)`, `None` outside the grid.
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn max(&self) -> f32 {
        self.cells.iter().copied().fold(0.0, f32::max)
    }
}

/// Splats every event into the view as a disc of `radius` pixels with a
/// Gaussian falloff over `blur` pixels.
pub fn accumulate(
    view: &ViewConfig,
    heat: &HeatmapConfig,
    events: &[PointEvent],
) -> IntensityGrid {
    let (width, height) = (view.width, view.height);
    let mut cells = vec![0.0_f32; width as usize * height as usize];

    let (cx, cy) = lon_lat_to_world_pixel(view.center_lon, view.center_lat, view.zoom_level);
    let left = cx - width as f64 / 2.0;
    let top = cy - height as f64 / 2.0;

    let radius = heat.radius as f32;
    let sigma = (heat.blur as f32 / 2.0).max(1.0);
    let extent = (heat.radius + heat.blur) as i64;

    let mut drawn = 0usize;
    let mut non_finite = 0usize;
    for event in events {
        if !event.longitude.is_finite() || !event.latitude.is_finite() {
            non_finite += 1;
            continue;
        }
        let (wx, wy) = lon_lat_to_world_pixel(event.longitude, event.latitude, view.zoom_level);
        let px = (wx - left).floor() as i64;
        let py = (wy - top).floor() as i64;

        if px < -extent
            || py < -extent
            || px >= width as i64 + extent
            || py >= height as i64 + extent
        {
            continue;
        }
        drawn += 1;

        for y in (py - extent).max(0)..(py + extent + 1).min(height as i64) {
            for x in (px - extent).max(0)..(px + extent + 1).min(width as i64) {
                let d = (((x - px).pow(2) + (y - py).pow(2)) as f32).sqrt();
                if d > extent as f32 {
                    continue;
                }
                let weight = if d <= radius {
                    1.0
                } else {
                    (-(d - radius).powi(2) / (2.0 * sigma * sigma)).exp()
                };
                cells[y as usize * width as usize + x as usize] += weight;
            }
        }
    }

    if non_finite > 0 {
        warn!(non_finite, "skipped events with non-finite coordinates");
    }
    debug!(events = events.len(), drawn, "accumulated heatmap intensity");
    IntensityGrid {
        width,
        height,
        cells,
    }
}

/// Renders the view to RGBA. Untouched pixels are fully transparent.
pub fn render_heatmap(
    view: &ViewConfig,
    heat: &HeatmapConfig,
    events: &[PointEvent],
) -> Result<RgbaImage> {
    if view.width == 0
        || view.height == 0
        || view.width > MAX_VIEW_EDGE
        || view.height > MAX_VIEW_EDGE
    {
        return Err(anyhow!(
            "Heatmap view {}x{} must be between 1 and {} pixels per edge",
            view.width,
            view.height,
            MAX_VIEW_EDGE
        ));
    }
    let gradient = heat
        .gradient
        .iter()
        .map(|hex| hex_to_rgba(hex))
        .collect::<Result<Vec<_>>>()?;
    if gradient.is_empty() {
        return Err(anyhow!("Heatmap gradient needs at least one colour"));
    }

    let grid = accumulate(view, heat, events);
    let max = grid.max();
    let opacity = heat.opacity.clamp(0.0, 1.0);

    let img: RgbaImage = ImageBuffer::from_fn(view.width, view.height, |x, y| {
        let value = grid.get(x, y).unwrap_or(0.0);
        if value <= 0.0 || max <= 0.0 {
            return Rgba([0, 0, 0, 0]);
        }
        let t = value / max;
        let Rgba([r, g, b, _]) = sample_gradient(&gradient, t);
        Rgba([r, g, b, (t * opacity * 255.0).round() as u8])
    });

    Ok(img)
}

pub fn save_heatmap(path: &Path, img: &RgbaImage) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("Failed to create output directory")?;
        }
    }
    img.save(path)
        .with_context(|| format!("Failed to save heatmap {:?}", path))?;
    info!(path = ?path, width = img.width(), height = img.height(), "wrote heatmap");
    Ok(())
}

fn sample_gradient(stops: &[Rgba<u8>], t: f32) -> Rgba<u8> {
    if stops.len() == 1 {
        return stops[0];
    }
    let scaled = t.clamp(0.0, 1.0) * (stops.len() - 1) as f32;
    let lower = (scaled.floor() as usize).min(stops.len() - 2);
    let frac = scaled - lower as f32;
    let (a, b) = (stops[lower].0, stops[lower + 1].0);
    let mix = |i: usize| (a[i] as f32 + (b[i] as f32 - a[i] as f32) * frac).round() as u8;
    Rgba([mix(0), mix(1), mix(2), 255])
}

/// Parses `#rgb` or `#rrggbb`.
fn hex_to_rgba(hex: &str) -> Result<Rgba<u8>> {
    let digits = hex.trim_start_matches('#');
    if !digits.is_ascii() {
        return Err(anyhow!("Invalid colour '{}'", hex));
    }
    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return Err(anyhow!("Invalid colour '{}'", hex)),
    };
    let channel = |i: usize| {
        u8::from_str_radix(&expanded[i..i + 2], 16)
            .with_context(|| format!("Invalid colour '{}'", hex))
    };
    Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, 255]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_view() -> ViewConfig {
        ViewConfig {
            center_lat: 48.262725,
            center_lon: 11.66725,
            zoom_level: 18,
            width: 64,
            height: 48,
        }
    }

    #[test]
    fn empty_events_give_transparent_image() {
        let img = render_heatmap(&small_view(), &HeatmapConfig::default(), &[]).unwrap();
        assert_eq!(img.dimensions(), (64, 48));
        assert!(img.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn centre_point_is_hottest() {
        let view = small_view();
        let heat = HeatmapConfig::default();
        let events = vec![PointEvent::new(view.center_lon, view.center_lat, "a")];

        let img = render_heatmap(&view, &heat, &events).unwrap();
        let centre = img.get_pixel(32, 24);
        assert_eq!(&centre.0[..3], &[255, 0, 0]);
        assert!(centre.0[3] > 200);
        assert_eq!(img.get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn points_outside_view_are_skipped() {
        let view = small_view();
        let events = vec![PointEvent::new(0.0, 0.0, "far")];
        let grid = accumulate(&view, &HeatmapConfig::default(), &events);
        assert_eq!(grid.dimensions(), (64, 48));
        assert_eq!(grid.max(), 0.0);
    }

    #[test]
    fn non_finite_events_are_not_drawn() {
        let view = small_view();
        let csv = "hash_id,latitude,longitude\ndev-a,NaN,NaN\ndev-b,inf,11.66725\n";
        let events =
            crate::data::read_events_csv(csv.as_bytes(), &crate::config::InputConfig::default())
                .unwrap();
        assert_eq!(events.len(), 2);

        let grid = accumulate(&view, &HeatmapConfig::default(), &events);
        assert_eq!(grid.get(0, 0), Some(0.0));
        assert_eq!(grid.max(), 0.0);
    }

    #[test]
    fn grid_lookup_outside_is_none() {
        let grid = accumulate(&small_view(), &HeatmapConfig::default(), &[]);
        assert_eq!(grid.get(63, 47), Some(0.0));
        assert_eq!(grid.get(64, 0), None);
        assert_eq!(grid.get(0, 48), None);
    }

    #[test]
    fn oversized_views_are_rejected() {
        let view = ViewConfig {
            width: 70_000,
            height: 70_000,
            ..small_view()
        };
        assert!(render_heatmap(&view, &HeatmapConfig::default(), &[]).is_err());

        let empty = ViewConfig {
            width: 0,
            ..small_view()
        };
        assert!(render_heatmap(&empty, &HeatmapConfig::default(), &[]).is_err());
    }

    #[test]
    fn parses_short_and_long_hex() {
        assert_eq!(hex_to_rgba("#0f0").unwrap(), Rgba([0, 255, 0, 255]));
        assert_eq!(hex_to_rgba("49A8DE").unwrap(), Rgba([0x49, 0xA8, 0xDE, 255]));
        assert!(hex_to_rgba("#12345").is_err());
    }

    #[test]
    fn gradient_endpoints() {
        let stops = [Rgba([0, 0, 255, 255]), Rgba([255, 0, 0, 255])];
        assert_eq!(sample_gradient(&stops, 0.0), Rgba([0, 0, 255, 255]));
        assert_eq!(sample_gradient(&stops, 1.0), Rgba([255, 0, 0, 255]));
    }
}
