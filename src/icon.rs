//! Tray icons, generated in code.
//!
//! 32x32 RGBA on a black field: a white square while idle, a red disc while
//! recording, and a white pointer swept through twelve 30-degree steps for
//! the busy animation.

use std::sync::LazyLock;

use image::{Rgba, RgbaImage};
use murmur_core::IndicatorState;

use crate::spinner::FRAME_COUNT;

const SIZE: u32 = 32;
const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);
const FOREGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
// macOS system red
const RECORD_RED: Rgba<u8> = Rgba([255, 59, 48, 255]);

static IDLE: LazyLock<tray_icon::Icon> = LazyLock::new(|| to_icon(draw_idle()));
static RECORDING: LazyLock<tray_icon::Icon> = LazyLock::new(|| to_icon(draw_recording()));
static BUSY: LazyLock<Vec<tray_icon::Icon>> =
    LazyLock::new(|| (0..FRAME_COUNT).map(|frame| to_icon(draw_busy(frame))).collect());

/// Maps an indicator state to its tray icon.
pub fn icon_for(state: IndicatorState) -> tray_icon::Icon {
    match state {
        IndicatorState::Idle => IDLE.clone(),
        IndicatorState::Recording => RECORDING.clone(),
        IndicatorState::Busy(frame) => BUSY[usize::from(frame % FRAME_COUNT)].clone(),
    }
}

fn blank() -> RgbaImage {
    RgbaImage::from_pixel(SIZE, SIZE, BACKGROUND)
}

fn draw_idle() -> RgbaImage {
    let mut image = blank();
    for y in 8..24 {
        for x in 8..24 {
            image.put_pixel(x, y, FOREGROUND);
        }
    }
    image
}

fn draw_recording() -> RgbaImage {
    let mut image = blank();
    let center = 15.5f32;
    let radius = 8.0f32;
    for y in 0..SIZE {
        for x in 0..SIZE {
            let dx = x as f32 - center;
            let dy = y as f32 - center;
            if dx * dx + dy * dy <= radius * radius {
                image.put_pixel(x, y, RECORD_RED);
            }
        }
    }
    image
}

fn draw_busy(frame: u8) -> RgbaImage {
    let mut image = blank();
    let angle = f32::from(frame) * (360.0 / f32::from(FRAME_COUNT));
    let rad = angle.to_radians();
    let length = 10.0f32;
    // Sample along the pointer and stamp a 3px dot at each step.
    let steps = 24;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let px = 16.0 + t * length * rad.cos();
        let py = 16.0 + t * length * rad.sin();
        stamp(&mut image, px, py);
    }
    image
}

fn stamp(image: &mut RgbaImage, px: f32, py: f32) {
    let x0 = px.round() as i32;
    let y0 = py.round() as i32;
    for dy in -1..=1i32 {
        for dx in -1..=1i32 {
            let (x, y) = (x0 + dx, y0 + dy);
            if (0..SIZE as i32).contains(&x) && (0..SIZE as i32).contains(&y) {
                image.put_pixel(x as u32, y as u32, FOREGROUND);
            }
        }
    }
}

fn to_icon(image: RgbaImage) -> tray_icon::Icon {
    let (width, height) = image.dimensions();
    tray_icon::Icon::from_rgba(image.into_raw(), width, height)
        .expect("generated icon has valid dimensions")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_frames_are_distinct() {
        assert_ne!(draw_busy(0).into_raw(), draw_busy(3).into_raw());
        assert_ne!(draw_busy(1).into_raw(), draw_busy(7).into_raw());
    }

    #[test]
    fn recording_icon_is_a_red_disc() {
        let image = draw_recording();
        assert_eq!(*image.get_pixel(16, 16), RECORD_RED);
        assert_eq!(*image.get_pixel(0, 0), BACKGROUND);
    }

    #[test]
    fn idle_icon_is_a_white_square() {
        let image = draw_idle();
        assert_eq!(*image.get_pixel(16, 16), FOREGROUND);
        assert_eq!(*image.get_pixel(2, 2), BACKGROUND);
    }
}
