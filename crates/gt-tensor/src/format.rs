//! numpy-style `Display` for tensors.
//!
//! Float cells pad the integer part on the left and the fraction on the
//! right, so decimal points line up. If every finite value is integral the
//! cells print as `3.`; otherwise up to four decimals are kept with trailing
//! zeros trimmed. Rows wrap at [`LINE_WIDTH`] columns with a hanging indent.

use std::fmt;

use crate::storage::CpuStorage;
use crate::tensor::Tensor;

/// numpy's default `linewidth`.
pub const LINE_WIDTH: usize = 75;

fn non_finite(v: f32) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v > 0.0 {
        "inf".to_string()
    } else {
        "-inf".to_string()
    }
}

fn format_floats(values: &[f32]) -> Vec<String> {
    let integral = values
        .iter()
        .filter(|v| v.is_finite())
        .all(|v| v.fract() == 0.0);

    // (integer part, fraction digits) for finite values.
    let parts: Vec<Option<(String, String)>> = values
        .iter()
        .map(|v| {
            if !v.is_finite() {
                None
            } else if integral {
                Some((format!("{:.0}", v), String::new()))
            } else {
                let s = format!("{:.4}", v);
                let s = s.trim_end_matches('0');
                let (int, frac) = s.split_once('.').unwrap_or((s, ""));
                Some((int.to_string(), frac.to_string()))
            }
        })
        .collect();

    let pad_left = parts
        .iter()
        .flatten()
        .map(|(i, _)| i.len())
        .max()
        .unwrap_or(0);
    let pad_right = parts
        .iter()
        .flatten()
        .map(|(_, f)| f.len())
        .max()
        .unwrap_or(0);
    let width = pad_left + 1 + pad_right;

    values
        .iter()
        .zip(parts)
        .map(|(v, part)| match part {
            Some((int, frac)) => {
                format!("{:>pl$}.{:<pr$}", int, frac, pl = pad_left, pr = pad_right)
            }
            None => format!("{:>width$}", non_finite(*v), width = width),
        })
        .collect()
}

/// Renders one bracketed block. `depth` is the nesting level of the block and
/// `ndim` the tensor's rank; all cells share one width.
fn render_block(out: &mut String, cells: &[String], dims: &[usize], depth: usize, ndim: usize) {
    let indent = " ".repeat(depth + 1);
    out.push('[');
    if dims.len() == 1 {
        // Every enclosing level reserves one column for its closing bracket.
        let limit = LINE_WIDTH.saturating_sub(ndim);
        let mut text = String::new();
        let mut line = indent.clone();
        for (i, cell) in cells.iter().enumerate() {
            if i > 0 {
                line.push(' ');
            }
            if line.len() + cell.len() > limit && line.len() > indent.len() {
                text.push_str(line.trim_end());
                text.push('\n');
                line = indent.clone();
            }
            line.push_str(cell);
        }
        text.push_str(&line);
        out.push_str(&text[indent.len()..]);
    } else {
        let chunk = cells.len() / dims[0].max(1);
        let separator = format!("{}{}", "\n".repeat(dims.len() - 1), indent);
        for i in 0..dims[0] {
            if i > 0 {
                out.push_str(&separator);
            }
            let sub = &cells[i * chunk..(i + 1) * chunk];
            render_block(out, sub, &dims[1..], depth + 1, ndim);
        }
    }
    out.push(']');
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut cells: Vec<String> = match self.storage() {
            CpuStorage::F32(v) => format_floats(v),
            CpuStorage::I32(v) => v.iter().map(|x| x.to_string()).collect(),
        };
        let dims = self.shape().dims();
        if dims.is_empty() {
            return write!(f, "{}", cells.first().map(|c| c.trim()).unwrap_or(""));
        }
        let width = cells.iter().map(String::len).max().unwrap_or(0);
        for cell in cells.iter_mut() {
            *cell = format!("{:>width$}", cell, width = width);
        }
        let mut out = String::new();
        render_block(&mut out, &cells, dims, 0, dims.len());
        f.write_str(&out)
    }
}
