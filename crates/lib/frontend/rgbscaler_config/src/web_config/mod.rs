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

//! On the web, we treat the URL query parameters as command line arguments.
//! Native builds without the `use_bpaf` feature use the same (always empty) argument struct.

use std::path::PathBuf;

#[cfg(target_arch = "wasm32")]
use url::Url;
#[cfg(target_arch = "wasm32")]
use web_sys::window;

#[derive(Debug, Default)]
pub struct CmdLineArgs {
    pub config_file: Option<PathBuf>,
    pub max_width: Option<f64>,
    pub max_height: Option<f64>,
    pub declared_aspect_ratio: Option<f64>,
    pub pixel_aspect_ratio: Option<f64>,
    pub integer_scaling: bool,
    pub crt: bool,
    pub mask_intensity: Option<f32>,
    pub scanline_intensity: Option<f32>,
    pub preset: Option<String>,

    // Everything below ignored on wasm
    // --------------------------------
    pub frames: Option<u32>,
    pub frame_width: Option<u32>,
    pub frame_height: Option<u32>,
    pub pixel_density: Option<f64>,
}

/// Parse the URL query parameters into a [CmdLineArgs] struct.
#[cfg(target_arch = "wasm32")]
pub fn parse_query_params() -> CmdLineArgs {
    match window().and_then(|w| w.location().href().ok()) {
        Some(href) => parse_query_string(&href),
        None => CmdLineArgs::default(),
    }
}

#[cfg(target_arch = "wasm32")]
fn parse_query_string(href: &str) -> CmdLineArgs {
    let mut args = CmdLineArgs::default();

    let Ok(url) = Url::parse(href)
    else {
        return args;
    };

    for (key, value) in url.query_pairs() {
        log::debug!("Read query parameter: {}={}", key, value);
        match key.as_ref() {
            "configfile" | "config_file" => args.config_file = Some(PathBuf::from(value.into_owned())),
            "max_width" => args.max_width = value.parse().ok(),
            "max_height" => args.max_height = value.parse().ok(),
            "dar" | "declared_aspect_ratio" => args.declared_aspect_ratio = value.parse().ok(),
            "par" | "pixel_aspect_ratio" => args.pixel_aspect_ratio = value.parse().ok(),
            "integer" | "integer_scaling" => args.integer_scaling = true,
            "crt" => args.crt = true,
            "mask_intensity" => args.mask_intensity = value.parse().ok(),
            "scanline_intensity" => args.scanline_intensity = value.parse().ok(),
            "preset" => args.preset = Some(value.into_owned()),
            _ => {} // Ignore unknown parameters
        }
    }

    args
}
