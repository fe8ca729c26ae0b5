//! Adobe/Resolve `.cube` 1D export and import.
//!
//! Published tables can be written for offline inspection in any grading
//! tool that understands 1D cube files.
//!
//! # Format
//!
//! ```text
//! # Comment
//! TITLE "projector-1"
//! LUT_1D_SIZE 256
//! 0.000000 0.000000 0.000000
//! ...
//! ```

use crate::{ColorLut, LUT_SIZE, LutError, LutResult};
use projcal_core::Channel;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Writes a table as a 1D `.cube` file.
///
/// # Example
///
/// ```rust,ignore
/// cube::write_1d("projector-1.cube", &lut, Some("projector-1"))?;
/// ```
pub fn write_1d<P: AsRef<Path>>(path: P, lut: &ColorLut, title: Option<&str>) -> LutResult<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_1d_to(&mut writer, lut, title)?;
    writer.flush()?;
    Ok(())
}

/// Writes a table in 1D `.cube` format to any writer.
pub fn write_1d_to<W: Write>(writer: &mut W, lut: &ColorLut, title: Option<&str>) -> LutResult<()> {
    writeln!(writer, "# Generated by projcal")?;
    if let Some(title) = title {
        writeln!(writer, "TITLE \"{}\"", title)?;
    }
    writeln!(writer, "LUT_1D_SIZE {}", LUT_SIZE)?;
    writeln!(writer)?;

    let r = lut.channel(Channel::Red);
    let g = lut.channel(Channel::Green);
    let b = lut.channel(Channel::Blue);
    for i in 0..LUT_SIZE {
        writeln!(writer, "{:.6} {:.6} {:.6}", r[i], g[i], b[i])?;
    }
    Ok(())
}

/// Reads a 1D `.cube` file of [`LUT_SIZE`] entries.
pub fn read_1d<P: AsRef<Path>>(path: P) -> LutResult<ColorLut> {
    let file = File::open(path.as_ref())?;
    parse_1d(BufReader::new(file))
}

/// Parses a 1D `.cube` table of [`LUT_SIZE`] entries.
pub fn parse_1d<R: BufRead>(reader: R) -> LutResult<ColorLut> {
    let mut size: Option<usize> = None;
    let mut data: Vec<[f32; 3]> = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("TITLE") {
            continue;
        }
        if line.starts_with("LUT_1D_SIZE") {
            size = Some(parse_size(line)?);
        } else if line.starts_with("LUT_3D_SIZE") {
            return Err(LutError::ParseError("expected 1D LUT, found 3D".into()));
        } else if line.starts_with("DOMAIN_") {
            // Tables always cover [0, 1]
            continue;
        } else {
            data.push(parse_rgb(line)?);
        }
    }

    let size = size.ok_or_else(|| LutError::ParseError("missing LUT_1D_SIZE".into()))?;
    if size != LUT_SIZE || data.len() != size {
        return Err(LutError::InvalidSize(format!(
            "expected {} entries, header says {} and file has {}",
            LUT_SIZE,
            size,
            data.len()
        )));
    }

    ColorLut::from_channels(
        data.iter().map(|rgb| rgb[0]).collect(),
        data.iter().map(|rgb| rgb[1]).collect(),
        data.iter().map(|rgb| rgb[2]).collect(),
    )
}

fn parse_size(line: &str) -> LutResult<usize> {
    line.split_whitespace()
        .nth(1)
        .ok_or_else(|| LutError::ParseError("invalid size line".into()))?
        .parse()
        .map_err(|_| LutError::ParseError("invalid size value".into()))
}

fn parse_rgb(line: &str) -> LutResult<[f32; 3]> {
    let mut rgb = [0.0f32; 3];
    let mut parts = line.split_whitespace();
    for v in &mut rgb {
        *v = parts
            .next()
            .ok_or_else(|| LutError::ParseError(format!("expected 3 values: {}", line)))?
            .parse()
            .map_err(|_| LutError::ParseError(format!("invalid number: {}", line)))?;
    }
    Ok(rgb)
}
