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

//! Command line arguments for native builds, parsed with bpaf.

use std::path::PathBuf;

use bpaf::Bpaf;

#[derive(Bpaf)]
#[bpaf(options, version, generate(cli_args))]
#[derive(Debug, Default)]
pub struct CmdLineArgs {
    #[bpaf(long("config_file"), long("configfile"))]
    pub config_file: Option<PathBuf>,

    #[bpaf(long("max_width"), long("maxwidth"))]
    pub max_width: Option<f64>,
    #[bpaf(long("max_height"), long("maxheight"))]
    pub max_height: Option<f64>,

    #[bpaf(long("declared_aspect_ratio"), long("dar"))]
    pub declared_aspect_ratio: Option<f64>,
    #[bpaf(long("pixel_aspect_ratio"), long("par"))]
    pub pixel_aspect_ratio: Option<f64>,

    #[bpaf(long("integer_scaling"), long("integer"), switch)]
    pub integer_scaling: bool,

    #[bpaf(long, switch)]
    pub crt: bool,
    #[bpaf(long("mask_intensity"))]
    pub mask_intensity: Option<f32>,
    #[bpaf(long("scanline_intensity"))]
    pub scanline_intensity: Option<f32>,

    #[bpaf(long)]
    pub preset: Option<String>,

    // Headless options
    #[bpaf(long)]
    pub frames: Option<u32>,
    #[bpaf(long("frame_width"))]
    pub frame_width: Option<u32>,
    #[bpaf(long("frame_height"))]
    pub frame_height: Option<u32>,
    #[bpaf(long("pixel_density"))]
    pub pixel_density: Option<f64>,
}
