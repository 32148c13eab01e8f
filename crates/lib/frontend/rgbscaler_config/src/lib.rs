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
*/

//! The `rgbscaler_config` crate parses RGBScaler's configuration file, and overlays either command
//! line arguments (for native builds) or URL query parameters (for web builds) on top of the
//! configuration file settings.
//! Command line arguments or query parameters always take priority over the configuration file,
//! including over any preset the file selects.
//!
//! Features:
//! - `use_bpaf`: Enable BPAF support for command line argument parsing.

#[cfg(all(feature = "use_bpaf", not(target_arch = "wasm32")))]
mod bpaf_config;
#[cfg(any(target_arch = "wasm32", not(feature = "use_bpaf")))]
mod web_config;

use std::path::Path;

use anyhow::anyhow;
use cfg_if::cfg_if;
use rgbscaler_common::{
    display_scaler::{DEFAULT_MASK_INTENSITY, DEFAULT_SCANLINE_INTENSITY},
    AspectConfig,
    BoundingBox,
    CrtParams,
    RenderMode,
    ScalerParams,
    ScalerPreset,
};
use serde_derive::Deserialize;

#[cfg(all(feature = "use_bpaf", not(target_arch = "wasm32")))]
pub use bpaf_config::{cli_args, CmdLineArgs};
#[cfg(target_arch = "wasm32")]
use web_config::parse_query_params;
#[cfg(any(target_arch = "wasm32", not(feature = "use_bpaf")))]
pub use web_config::CmdLineArgs;

/// The configuration used when no configuration file can be found.
pub const DEFAULT_CONFIG: &str = include_str!("../default_config.toml");

const fn _default_false() -> bool {
    false
}
const fn _default_mask_intensity() -> f32 {
    DEFAULT_MASK_INTENSITY
}
const fn _default_scanline_intensity() -> f32 {
    DEFAULT_SCANLINE_INTENSITY
}
const fn _default_frames() -> u32 {
    120
}
const fn _default_frame_width() -> u32 {
    320
}
const fn _default_frame_height() -> u32 {
    240
}
const fn _default_pixel_density() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
pub struct Scaler {
    pub max_width: f64,
    pub max_height: f64,
    #[serde(default)]
    pub declared_aspect_ratio: Option<f64>,
    #[serde(default)]
    pub pixel_aspect_ratio: Option<f64>,
    #[serde(default = "_default_false")]
    pub integer_scaling: bool,
    #[serde(default = "_default_false")]
    pub crt_mode: bool,
    #[serde(default = "_default_mask_intensity")]
    pub mask_intensity: f32,
    #[serde(default = "_default_scanline_intensity")]
    pub scanline_intensity: f32,
    #[serde(default)]
    pub preset: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Headless {
    #[serde(default = "_default_frames")]
    pub frames: u32,
    #[serde(default = "_default_frame_width")]
    pub frame_width: u32,
    #[serde(default = "_default_frame_height")]
    pub frame_height: u32,
    #[serde(default = "_default_pixel_density")]
    pub pixel_density: f64,
}

impl Default for Headless {
    fn default() -> Self {
        Self {
            frames: _default_frames(),
            frame_width: _default_frame_width(),
            frame_height: _default_frame_height(),
            pixel_density: _default_pixel_density(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConfigFileParams {
    pub scaler: Scaler,
    #[serde(default)]
    pub headless: Headless,
    #[serde(default, rename = "preset")]
    pub presets: Vec<ScalerPreset>,

    /// Scaler settings given on the command line, applied after any preset.
    #[serde(skip)]
    pub cmdline_overrides: ScalerPreset,
}

impl ConfigFileParams {
    pub fn overlay(&mut self, shell_args: CmdLineArgs) {
        if let Some(max_width) = shell_args.max_width {
            self.scaler.max_width = max_width;
        }
        if let Some(max_height) = shell_args.max_height {
            self.scaler.max_height = max_height;
        }
        if let Some(preset) = shell_args.preset {
            self.scaler.preset = Some(preset);
        }

        self.cmdline_overrides = ScalerPreset {
            name: String::from("command line"),
            declared_aspect_ratio: shell_args.declared_aspect_ratio,
            pixel_aspect_ratio: shell_args.pixel_aspect_ratio,
            integer_scaling: shell_args.integer_scaling.then_some(true),
            crt_mode: shell_args.crt.then_some(true),
            mask_intensity: shell_args.mask_intensity,
            scanline_intensity: shell_args.scanline_intensity,
        };

        if let Some(frames) = shell_args.frames {
            self.headless.frames = frames;
        }
        if let Some(frame_width) = shell_args.frame_width {
            self.headless.frame_width = frame_width;
        }
        if let Some(frame_height) = shell_args.frame_height {
            self.headless.frame_height = frame_height;
        }
        if let Some(pixel_density) = shell_args.pixel_density {
            self.headless.pixel_density = pixel_density;
        }
    }

    pub fn preset(&self, name: &str) -> Option<&ScalerPreset> {
        self.presets.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Resolve the final scaler parameters: the [scaler] table, then the selected preset, then
    /// command line overrides.
    pub fn scaler_params(&self) -> Result<ScalerParams, anyhow::Error> {
        let mut params = ScalerParams {
            bounds: BoundingBox::new(self.scaler.max_width, self.scaler.max_height),
            aspect: AspectConfig {
                declared_aspect_ratio: self.scaler.declared_aspect_ratio,
                pixel_aspect_ratio: self.scaler.pixel_aspect_ratio,
            },
            integer_scaling: self.scaler.integer_scaling,
            render_mode: RenderMode::from_crt_flag(self.scaler.crt_mode),
            crt: CrtParams::new(self.scaler.mask_intensity, self.scaler.scanline_intensity),
        };

        if let Some(name) = self.scaler.preset.as_deref() {
            let preset = self
                .preset(name)
                .ok_or_else(|| anyhow!("Scaler preset '{}' not found in configuration", name))?;
            log::debug!("Applying scaler preset: {}", preset.name);
            preset.apply(&mut params);
        }

        self.cmdline_overrides.apply(&mut params);
        Ok(params)
    }
}

pub fn read_config(toml_string: impl AsRef<str>, shell_args: CmdLineArgs) -> Result<ConfigFileParams, anyhow::Error> {
    let mut toml_args: ConfigFileParams = toml::from_str(toml_string.as_ref())?;

    // Command line arguments override config file arguments
    toml_args.overlay(shell_args);

    Ok(toml_args)
}

fn read_shell_args() -> CmdLineArgs {
    let shell_args: CmdLineArgs;

    cfg_if! {
        if #[cfg(all(feature = "use_bpaf", not(target_arch = "wasm32")))] {
            log::debug!("Reading command line arguments...");
            shell_args = cli_args().run();
        } else if #[cfg(target_arch = "wasm32")] {
            log::debug!("Parsing query parameters...");
            shell_args = parse_query_params();
        } else {
            log::debug!("Argument reading disabled...");
            shell_args = CmdLineArgs::default();
        }
    }

    shell_args
}

/// Read the TOML configuration from a file path, parse and overlay command line or query parameter
/// arguments. If no configuration file was named on the command line and `default_path` does not
/// exist, the built-in default configuration is used.
pub fn read_config_file<P>(default_path: P) -> Result<ConfigFileParams, anyhow::Error>
where
    P: AsRef<Path>,
{
    let shell_args = read_shell_args();

    // Allow configuration file path to be overridden by command line argument 'config_file'
    let toml_string = if let Some(configfile_path) = shell_args.config_file.as_ref() {
        std::fs::read_to_string(configfile_path)?
    }
    else {
        match std::fs::read_to_string(default_path.as_ref()) {
            Ok(s) => s,
            Err(e) => {
                log::warn!(
                    "Couldn't read config file {}: {}. Using defaults.",
                    default_path.as_ref().display(),
                    e
                );
                DEFAULT_CONFIG.to_string()
            }
        }
    };

    read_config(toml_string, shell_args)
}

/// Read the TOML configuration from a string, parse and overlay command line or query parameter
/// arguments.
pub fn read_config_string(toml_string: impl AsRef<str>) -> Result<ConfigFileParams, anyhow::Error> {
    read_config(toml_string, read_shell_args())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses() {
        let config = read_config(DEFAULT_CONFIG, CmdLineArgs::default()).unwrap();
        assert_eq!(config.scaler.max_width, 960.0);
        assert_eq!(config.headless.frames, 120);
        assert_eq!(config.presets.len(), 3);

        let params = config.scaler_params().unwrap();
        assert_eq!(params.bounds, BoundingBox::new(960.0, 720.0));
        assert_eq!(params.render_mode, RenderMode::Area);
        assert_eq!(params.crt, CrtParams::default());
        assert!(!params.integer_scaling);
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = read_config("[scaler]\nmax_width = 640.0\nmax_height = 480.0\n", CmdLineArgs::default()).unwrap();
        assert_eq!(config.headless.frame_width, 320);
        assert!(config.presets.is_empty());

        let params = config.scaler_params().unwrap();
        assert_eq!(params.aspect, AspectConfig::default());
        assert_eq!(params.crt.mask_intensity(), DEFAULT_MASK_INTENSITY);
    }

    #[test]
    fn missing_bounds_are_an_error() {
        assert!(read_config("[scaler]\nmax_width = 640.0\n", CmdLineArgs::default()).is_err());
    }

    #[test]
    fn selected_preset_is_applied() {
        let toml = format!("{}\n", DEFAULT_CONFIG.replace("#preset = \"arcade\"", "preset = \"NES\""));
        let params = read_config(toml, CmdLineArgs::default())
            .unwrap()
            .scaler_params()
            .unwrap();
        assert!(params.integer_scaling);
        assert_eq!(params.aspect.pixel_aspect_ratio, Some(1.142857));
        assert_eq!(params.render_mode, RenderMode::Area);
    }

    #[test]
    fn unknown_preset_is_an_error() {
        let args = CmdLineArgs {
            preset: Some("vectrex".to_string()),
            ..Default::default()
        };
        let config = read_config(DEFAULT_CONFIG, args).unwrap();
        assert!(config.scaler_params().is_err());
    }

    #[test]
    fn command_line_overrides_file_and_preset() {
        let args = CmdLineArgs {
            max_width: Some(1920.0),
            preset: Some("arcade".to_string()),
            mask_intensity: Some(0.6),
            declared_aspect_ratio: Some(1.5),
            frames: Some(10),
            ..Default::default()
        };
        let config = read_config(DEFAULT_CONFIG, args).unwrap();
        assert_eq!(config.headless.frames, 10);

        let params = config.scaler_params().unwrap();
        assert_eq!(params.bounds.max_width, 1920.0);
        assert_eq!(params.bounds.max_height, 720.0);
        // From the preset
        assert_eq!(params.render_mode, RenderMode::Crt);
        assert!(params.integer_scaling);
        // From the command line, over the preset's 0.3
        assert_eq!(params.crt.mask_intensity(), 0.6);
        assert_eq!(params.aspect.declared_aspect_ratio, Some(1.5));
    }

    #[test]
    fn negative_intensity_in_file_clamps() {
        let toml = "[scaler]\nmax_width = 640.0\nmax_height = 480.0\nmask_intensity = -1.0\n";
        let params = read_config(toml, CmdLineArgs::default())
            .unwrap()
            .scaler_params()
            .unwrap();
        assert_eq!(params.crt.mask_intensity(), 0.0);
    }
}
