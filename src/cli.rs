use crate::config::load_config;
use crate::label_dump::{write_label_dump, LabelDump};
use crate::render::{render_svg, write_output};
use crate::{scene_from_geojson, MapView, RenderOptions};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "mlbl", version, about = "Map label placement and rendering for GeoJSON")]
pub struct Args {
    /// Input GeoJSON file or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for SVG and JSON if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Viewport width in pixels
    #[arg(short = 'w', long = "width")]
    pub width: Option<f64>,

    /// Viewport height in pixels
    #[arg(short = 'H', long = "height")]
    pub height: Option<f64>,

    /// Map zoom level
    #[arg(long = "zoom", default_value_t = 17.0)]
    pub zoom: f64,

    /// Map center as lon,lat (defaults to the center of the input)
    #[arg(long = "center", value_parser = parse_center, allow_hyphen_values = true)]
    pub center: Option<[f64; 2]>,

    /// Coordinates are already pixels; skip projection
    #[arg(long = "projected")]
    pub projected: bool,

    /// Measure label text with system fonts instead of estimating widths
    #[arg(long = "measure-text")]
    pub measure_text: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
    if args.measure_text {
        config.render.measure_text = true;
    }

    let view = MapView {
        width: config.render.width,
        height: config.render.height,
        zoom: args.zoom,
        center: args.center,
        projected: args.projected,
    };
    let options = RenderOptions { config, view };

    let input = read_input(args.input.as_deref())?;
    let scene = scene_from_geojson(&input, &options)?;

    match args.output_format {
        OutputFormat::Svg => {
            let svg = render_svg(&scene, &options.config.theme, &options.config.render);
            write_output(&svg, args.output.as_deref())?;
        }
        OutputFormat::Json => match args.output.as_deref() {
            Some(path) => write_label_dump(path, &scene)?,
            None => write_output(&LabelDump::from_scene(&scene).to_json()?, None)?,
        },
        OutputFormat::Png => write_png(&scene, &options, &args.output)?,
    }
    Ok(())
}

#[cfg(feature = "png")]
fn write_png(scene: &crate::render::MapScene, options: &RenderOptions, output: &Option<PathBuf>) -> Result<()> {
    let output = ensure_output(output, "png")?;
    let svg = render_svg(scene, &options.config.theme, &options.config.render);
    crate::render::write_output_png(&svg, &output, &options.config.render, &options.config.theme)
}

#[cfg(not(feature = "png"))]
fn write_png(_scene: &crate::render::MapScene, _options: &RenderOptions, _output: &Option<PathBuf>) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    let mut buf = String::new();
    match path {
        Some(path) if path != Path::new("-") => return Ok(std::fs::read_to_string(path)?),
        _ => io::stdin().read_to_string(&mut buf)?,
    };
    Ok(buf)
}

#[cfg_attr(not(feature = "png"), allow(dead_code))]
fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

fn parse_center(value: &str) -> Result<[f64; 2], String> {
    let (lon, lat) = value
        .split_once(',')
        .ok_or_else(|| format!("expected lon,lat, got {value:?}"))?;
    let lon: f64 = lon.trim().parse().map_err(|_| format!("invalid longitude {lon:?}"))?;
    let lat: f64 = lat.trim().parse().map_err(|_| format!("invalid latitude {lat:?}"))?;
    if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
        return Err(format!("center {value:?} is out of range"));
    }
    Ok([lon, lat])
}
