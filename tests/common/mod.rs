#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// A float64 array to be written as one `.npy` member.
pub struct NpyArray {
    pub name: &'static str,
    pub shape: Vec<usize>,
    pub values: Vec<f64>,
}

impl NpyArray {
    pub fn new(name: &'static str, shape: &[usize], values: &[f64]) -> NpyArray {
        NpyArray {
            name,
            shape: shape.to_vec(),
            values: values.to_vec(),
        }
    }
}

/// Encode a little-endian float64 `.npy` file the way `numpy.save` lays it out.
pub fn encode_npy(shape: &[usize], values: &[f64]) -> Vec<u8> {
    let shape_str = match shape {
        [] => "()".to_string(),
        [d] => format!("({},)", d),
        dims => format!(
            "({})",
            dims.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(", ")
        ),
    };
    let mut header = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': {}, }}",
        shape_str
    );
    while (10 + header.len() + 1) % 64 != 0 {
        header.push(' ');
    }
    header.push('\n');

    let mut out = b"\x93NUMPY\x01\x00".to_vec();
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

pub fn write_npz(path: &Path, arrays: &[NpyArray], method: CompressionMethod) {
    let file = fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(method);
    for array in arrays {
        zip.start_file(format!("{}.npy", array.name), options).unwrap();
        zip.write_all(&encode_npy(&array.shape, &array.values)).unwrap();
    }
    zip.finish().unwrap();
}

/// Lay out `<root>/<folder>/<name>.mlir` and its `.npz` archive.
pub fn write_benchmark(
    root: &Path,
    folder: &str,
    name: &str,
    source: &str,
    arrays: &[NpyArray],
) -> PathBuf {
    let dir = root.join(folder);
    fs::create_dir_all(&dir).unwrap();
    let program = dir.join(format!("{}.mlir", name));
    fs::write(&program, source).unwrap();
    write_npz(
        &dir.join(format!("{}.mlir.npz", name)),
        arrays,
        CompressionMethod::Stored,
    );
    program
}
