/*
    RGBScaler

    Copyright 2022-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    ---------------------------------------------------------------------------

    rgbscaler_common::geometry.rs

    Calculation of the output surface size for a source frame. The output is
    fit (not filled) to a bounding box given in display units, optionally
    snapped to an integer scale factor, and reported both in device pixels
    (the backing resolution of the surface) and in display units.
*/

use serde_derive::Deserialize;
use thiserror::Error;

/// Integer scale factors are floored after adding this tolerance, so that an exact fit that lands
/// a hair under a whole number due to floating point error is not knocked down a full step.
const INTEGER_SCALE_EPSILON: f64 = 1e-9;

/// Intrinsic pixel dimensions of a source frame.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct FrameSize {
    pub w: u32,
    pub h: u32,
}

impl FrameSize {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    /// A frame with either dimension zero has not been loaded yet.
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// The frame size and its reciprocal, as consumed by the area sampling shader.
    pub fn base_dimensions(&self) -> ([f32; 2], [f32; 2]) {
        let w = self.w as f32;
        let h = self.h as f32;
        ([w, h], [1.0 / w, 1.0 / h])
    }
}

impl From<(u32, u32)> for FrameSize {
    fn from(t: (u32, u32)) -> Self {
        FrameSize { w: t.0, h: t.1 }
    }
}

/// Aspect ratio inputs. A declared aspect ratio (DAR), when present, always takes precedence over
/// the pixel aspect ratio (PAR).
#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize)]
pub struct AspectConfig {
    #[serde(default, alias = "dar")]
    pub declared_aspect_ratio: Option<f64>,
    #[serde(default, alias = "par")]
    pub pixel_aspect_ratio: Option<f64>,
}

impl AspectConfig {
    pub fn declared(dar: f64) -> Self {
        Self {
            declared_aspect_ratio: Some(dar),
            pixel_aspect_ratio: None,
        }
    }

    pub fn pixel(par: f64) -> Self {
        Self {
            declared_aspect_ratio: None,
            pixel_aspect_ratio: Some(par),
        }
    }

    /// Resolve the width:height ratio of the rendered output for the given frame.
    pub fn effective_aspect(&self, frame: FrameSize) -> Result<f64, GeometryError> {
        if frame.is_empty() {
            return Err(GeometryError::EmptyFrame { w: frame.w, h: frame.h });
        }
        let aspect = match self.declared_aspect_ratio {
            Some(dar) => dar,
            None => self.pixel_aspect_ratio.unwrap_or(1.0) * frame.w as f64 / frame.h as f64,
        };
        if !aspect.is_finite() || aspect <= 0.0 {
            return Err(GeometryError::InvalidAspect(aspect));
        }
        Ok(aspect)
    }
}

/// The maximum area, in display units, that the output may occupy.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
pub struct BoundingBox {
    pub max_width:  f64,
    pub max_height: f64,
}

impl BoundingBox {
    pub fn new(max_width: f64, max_height: f64) -> Self {
        Self { max_width, max_height }
    }

    fn validate(&self) -> Result<(), GeometryError> {
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        if valid(self.max_width) && valid(self.max_height) {
            Ok(())
        }
        else {
            Err(GeometryError::InvalidBounds {
                w: self.max_width,
                h: self.max_height,
            })
        }
    }
}

impl From<(f64, f64)> for BoundingBox {
    fn from(t: (f64, f64)) -> Self {
        BoundingBox {
            max_width:  t.0,
            max_height: t.1,
        }
    }
}

/// Output of the geometry calculation.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ScaleGeometry {
    /// Backing resolution of the surface, in device pixels.
    pub device_w: u32,
    pub device_h: u32,
    /// User-visible size of the surface, in display units.
    pub display_w: u32,
    pub display_h: u32,
    /// The effective aspect ratio that was used.
    pub aspect: f64,
    /// The final (possibly floored) scale factor applied to the frame height.
    pub scale_factor: f64,
}

#[derive(Error, Debug, PartialEq)]
pub enum GeometryError {
    #[error("Frame has no area: {w}x{h}")]
    EmptyFrame { w: u32, h: u32 },
    #[error("Invalid aspect ratio: {0}")]
    InvalidAspect(f64),
    #[error("Invalid bounding box: {w}x{h}")]
    InvalidBounds { w: f64, h: f64 },
    #[error("Invalid pixel density: {0}")]
    InvalidPixelDensity(f64),
}

/// Compute the output geometry for `frame` fit inside `bounds`.
///
/// The scale factor is the smaller of the height-constrained and width-constrained ratios, so
/// neither axis overflows the box. With `integer_scaling` the factor is floored; a floored factor
/// of zero (source larger than the box) is not an error and produces an empty surface.
///
/// Rounding is applied to the unrounded products, so the width is derived from the exact scaled
/// height rather than from the already-rounded device height.
pub fn compute_geometry(
    frame: FrameSize,
    aspect: &AspectConfig,
    bounds: &BoundingBox,
    pixel_density: f64,
    integer_scaling: bool,
) -> Result<ScaleGeometry, GeometryError> {
    if !pixel_density.is_finite() || pixel_density <= 0.0 {
        return Err(GeometryError::InvalidPixelDensity(pixel_density));
    }
    bounds.validate()?;
    let aspect = aspect.effective_aspect(frame)?;

    let frame_h = frame.h as f64;
    let mut scale_factor = f64::min(
        (bounds.max_height * pixel_density) / frame_h,
        (bounds.max_width * pixel_density) / (frame_h * aspect),
    );

    if integer_scaling {
        scale_factor = (scale_factor + INTEGER_SCALE_EPSILON).floor();
    }
    let scale_factor = scale_factor.max(0.0);

    let device_h = frame_h * scale_factor;
    let device_w = device_h * aspect;

    Ok(ScaleGeometry {
        device_w: round_dim(device_w),
        device_h: round_dim(device_h),
        display_w: round_dim(device_w / pixel_density),
        display_h: round_dim(device_h / pixel_density),
        aspect,
        scale_factor,
    })
}

fn round_dim(v: f64) -> u32 {
    // Float to int casts saturate, so oversized values clamp to u32::MAX.
    v.round().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn par1() -> AspectConfig {
        AspectConfig::pixel(1.0)
    }

    #[test]
    fn fit_exact_multiple() {
        let geom = compute_geometry(FrameSize::new(320, 240), &par1(), &BoundingBox::new(960.0, 720.0), 1.0, false)
            .unwrap();
        assert_eq!((geom.device_w, geom.device_h), (960, 720));
        assert_eq!((geom.display_w, geom.display_h), (960, 720));
        assert!((geom.aspect - 4.0 / 3.0).abs() < 1e-9);
        assert!((geom.scale_factor - 3.0).abs() < 1e-9);
    }

    #[test]
    fn integer_scaling_already_integral() {
        let geom = compute_geometry(FrameSize::new(320, 240), &par1(), &BoundingBox::new(1000.0, 720.0), 1.0, true)
            .unwrap();
        assert_eq!(geom.scale_factor, 3.0);
        assert_eq!((geom.device_w, geom.device_h), (960, 720));
    }

    #[test]
    fn integer_scaling_floors() {
        let geom = compute_geometry(FrameSize::new(320, 240), &par1(), &BoundingBox::new(500.0, 400.0), 1.0, true)
            .unwrap();
        assert_eq!(geom.scale_factor, 1.0);
        assert_eq!((geom.device_w, geom.device_h), (320, 240));
    }

    #[test]
    fn non_integer_scaling_keeps_fraction() {
        let geom = compute_geometry(FrameSize::new(320, 240), &par1(), &BoundingBox::new(500.0, 400.0), 1.0, false)
            .unwrap();
        assert!((geom.scale_factor - 1.5625).abs() < 1e-9);
        assert_eq!((geom.device_w, geom.device_h), (500, 375));
    }

    #[test]
    fn integer_scaling_to_zero_is_degraded_not_error() {
        let geom = compute_geometry(FrameSize::new(640, 480), &par1(), &BoundingBox::new(320.0, 240.0), 1.0, true)
            .unwrap();
        assert_eq!(geom.scale_factor, 0.0);
        assert_eq!((geom.device_w, geom.device_h), (0, 0));
        assert_eq!((geom.display_w, geom.display_h), (0, 0));
    }

    #[test]
    fn declared_aspect_wins() {
        let aspect = AspectConfig {
            declared_aspect_ratio: Some(1.5),
            pixel_aspect_ratio: Some(2.0),
        };
        assert_eq!(aspect.effective_aspect(FrameSize::new(320, 240)).unwrap(), 1.5);

        let geom =
            compute_geometry(FrameSize::new(320, 240), &aspect, &BoundingBox::new(2000.0, 480.0), 1.0, false).unwrap();
        assert_eq!(geom.aspect, 1.5);
        assert_eq!((geom.device_w, geom.device_h), (720, 480));
    }

    #[test]
    fn pixel_aspect_stretches_width() {
        // 8:7 pixel aspect, common for 256x224 console output.
        let aspect = AspectConfig::pixel(8.0 / 7.0);
        let geom =
            compute_geometry(FrameSize::new(256, 224), &aspect, &BoundingBox::new(4000.0, 896.0), 1.0, true).unwrap();
        assert_eq!(geom.scale_factor, 4.0);
        assert_eq!(geom.device_h, 896);
        assert_eq!(geom.device_w, 1170);
    }

    #[test]
    fn pixel_density_scales_device_not_display() {
        let geom = compute_geometry(FrameSize::new(320, 240), &par1(), &BoundingBox::new(480.0, 360.0), 2.0, true)
            .unwrap();
        assert_eq!(geom.scale_factor, 3.0);
        assert_eq!((geom.device_w, geom.device_h), (960, 720));
        assert_eq!((geom.display_w, geom.display_h), (480, 360));
    }

    #[test]
    fn width_constrained_fit() {
        let geom = compute_geometry(FrameSize::new(320, 240), &par1(), &BoundingBox::new(640.0, 1080.0), 1.0, false)
            .unwrap();
        assert_eq!((geom.device_w, geom.device_h), (640, 480));
    }

    #[test]
    fn compute_is_idempotent() {
        let aspect = AspectConfig::pixel(1.2);
        let bounds = BoundingBox::new(1234.0, 777.0);
        let a = compute_geometry(FrameSize::new(352, 288), &aspect, &bounds, 1.25, false).unwrap();
        let b = compute_geometry(FrameSize::new(352, 288), &aspect, &bounds, 1.25, false).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fits_box_and_snaps_across_inputs() {
        let frames = [(160, 144), (256, 224), (320, 200), (320, 240), (640, 480), (720, 480), (1920, 1080)];
        let boxes = [(100.0, 100.0), (640.0, 480.0), (1000.0, 720.0), (1920.0, 1080.0), (3840.0, 2160.0)];
        let densities = [1.0, 1.25, 1.5, 2.0, 3.0];
        let pars = [None, Some(1.0), Some(8.0 / 7.0), Some(0.9)];

        for &(fw, fh) in &frames {
            for &(bw, bh) in &boxes {
                for &density in &densities {
                    for &par in &pars {
                        let aspect = AspectConfig {
                            declared_aspect_ratio: None,
                            pixel_aspect_ratio: par,
                        };
                        for integer in [false, true] {
                            let frame = FrameSize::new(fw, fh);
                            let bounds = BoundingBox::new(bw, bh);
                            let geom = compute_geometry(frame, &aspect, &bounds, density, integer).unwrap();

                            assert!(geom.scale_factor.is_finite() && geom.scale_factor >= 0.0);
                            assert!(geom.device_w as f64 <= bw * density + 1.0, "{:?}", geom);
                            assert!(geom.device_h as f64 <= bh * density + 1.0, "{:?}", geom);
                            if integer {
                                assert_eq!(geom.scale_factor.fract(), 0.0);
                                assert_eq!(geom.device_h, fh * geom.scale_factor as u32);
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn rejects_invalid_inputs() {
        let bounds = BoundingBox::new(960.0, 720.0);
        assert_eq!(
            compute_geometry(FrameSize::new(320, 0), &par1(), &bounds, 1.0, false),
            Err(GeometryError::EmptyFrame { w: 320, h: 0 })
        );
        assert!(matches!(
            compute_geometry(FrameSize::new(320, 240), &par1(), &bounds, 0.0, false),
            Err(GeometryError::InvalidPixelDensity(_))
        ));
        assert!(matches!(
            compute_geometry(FrameSize::new(320, 240), &par1(), &BoundingBox::new(-1.0, 720.0), 1.0, false),
            Err(GeometryError::InvalidBounds { .. })
        ));
        assert!(matches!(
            compute_geometry(FrameSize::new(320, 240), &AspectConfig::declared(0.0), &bounds, 1.0, false),
            Err(GeometryError::InvalidAspect(_))
        ));
    }

    #[test]
    fn base_dimensions_are_reciprocal() {
        let (dim, dim_i) = FrameSize::new(320, 200).base_dimensions();
        assert_eq!(dim, [320.0, 200.0]);
        assert_eq!(dim_i, [1.0 / 320.0, 1.0 / 200.0]);
    }
}
