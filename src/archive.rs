use std::io::Read;
use std::path::Path;

use log::debug;

use crate::errors::BenchError;
use crate::types::{ArraySet, ElementType, MemoryOrder, NamedArray};

const NPY_MAGIC: &[u8] = b"\x93NUMPY";

/// Load every `.npy` member of an `.npz` archive.
///
/// Member names lose their `.npy` suffix, the same way `numpy.load` exposes
/// them. Arrays keep archive order.
pub fn load_archive(path: &Path) -> Result<ArraySet, BenchError> {
    let file = std::fs::File::open(path).map_err(|e| BenchError::ArchiveRead {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let mut container = zip::ZipArchive::new(file).map_err(|e| BenchError::ArchiveRead {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let mut arrays = Vec::with_capacity(container.len());
    for i in 0..container.len() {
        let mut member = container.by_index(i).map_err(|e| BenchError::ArchiveRead {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        if member.is_dir() {
            continue;
        }

        let member_name = member.name().to_string();
        let name = member_name
            .strip_suffix(".npy")
            .unwrap_or(&member_name)
            .to_string();

        let mut bytes = Vec::with_capacity(member.size() as usize);
        member
            .read_to_end(&mut bytes)
            .map_err(|e| BenchError::ArchiveRead {
                path: path.to_path_buf(),
                detail: format!("{}: {}", member_name, e),
            })?;

        let array = parse_npy(name, &bytes).map_err(|detail| BenchError::ArchiveFormat {
            path: path.to_path_buf(),
            member: member_name.clone(),
            detail,
        })?;
        debug!(
            "loaded '{}': {:?} {:?} ({} bytes)",
            array.name,
            array.element_type,
            array.shape,
            array.byte_len()
        );
        arrays.push(array);
    }

    Ok(ArraySet::new(arrays))
}

/// Header fields of one `.npy` member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpyHeader {
    pub element_type: ElementType,
    pub order: MemoryOrder,
    pub shape: Vec<usize>,
}

/// Decode a complete `.npy` file into a `NamedArray`.
pub fn parse_npy(name: String, bytes: &[u8]) -> Result<NamedArray, String> {
    if bytes.len() < 10 || !bytes.starts_with(NPY_MAGIC) {
        return Err("not an .npy file (bad magic)".to_string());
    }

    let major = bytes[6];
    let (header_len, header_start) = match major {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 => {
            if bytes.len() < 12 {
                return Err("truncated header length".to_string());
            }
            let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
            (len as usize, 12)
        }
        v => return Err(format!("unsupported .npy format version {}", v)),
    };

    let header_end = header_start + header_len;
    if bytes.len() < header_end {
        return Err("truncated header".to_string());
    }
    let header = std::str::from_utf8(&bytes[header_start..header_end])
        .map_err(|_| "header is not valid UTF-8".to_string())?;
    let header = parse_header(header)?;

    let payload = &bytes[header_end..];
    let expected = header
        .shape
        .iter()
        .try_fold(header.element_type.size_in_bytes(), |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| "shape overflows".to_string())?;
    if payload.len() != expected {
        return Err(format!(
            "payload is {} bytes, shape {:?} needs {}",
            payload.len(),
            header.shape,
            expected
        ));
    }

    Ok(NamedArray::from_bytes(
        name,
        header.element_type,
        header.shape,
        header.order,
        payload,
    ))
}

/// Parse the Python dict literal that follows the preamble, e.g.
/// `{'descr': '<f8', 'fortran_order': False, 'shape': (2, 3), }`.
pub fn parse_header(header: &str) -> Result<NpyHeader, String> {
    let descr = dict_value(header, "descr").ok_or("header has no 'descr'")?;
    let descr = quoted(descr).ok_or("'descr' is not a plain type string (structured dtype?)")?;
    let element_type = parse_descr(descr)?;

    let fortran = dict_value(header, "fortran_order").ok_or("header has no 'fortran_order'")?;
    let order = if fortran.starts_with("True") {
        MemoryOrder::Fortran
    } else if fortran.starts_with("False") {
        MemoryOrder::C
    } else {
        return Err("'fortran_order' is neither True nor False".to_string());
    };

    let shape = dict_value(header, "shape").ok_or("header has no 'shape'")?;
    let shape = parse_shape(shape)?;

    Ok(NpyHeader {
        element_type,
        order,
        shape,
    })
}

fn parse_descr(descr: &str) -> Result<ElementType, String> {
    let (byte_order, code) = match descr.chars().next() {
        Some(c @ ('<' | '>' | '|' | '=')) => (c, &descr[1..]),
        _ => ('=', descr),
    };
    let ty = ElementType::from_type_code(code)
        .ok_or_else(|| format!("unsupported dtype '{}'", descr))?;
    if byte_order == '>' && ty.size_in_bytes() > 1 && cfg!(target_endian = "little") {
        return Err(format!("big-endian dtype '{}' cannot be passed natively", descr));
    }
    Ok(ty)
}

/// Text following `'key':` inside the dict literal, leading whitespace removed.
fn dict_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    ["'", "\""].iter().find_map(|q| {
        let needle = format!("{q}{key}{q}");
        let at = header.find(&needle)?;
        let rest = header[at + needle.len()..].trim_start();
        Some(rest.strip_prefix(':')?.trim_start())
    })
}

fn quoted(value: &str) -> Option<&str> {
    let quote = value.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let rest = &value[1..];
    let end = rest.find(quote)?;
    Some(&rest[..end])
}

fn parse_shape(value: &str) -> Result<Vec<usize>, String> {
    let inner = value
        .strip_prefix('(')
        .and_then(|v| v.find(')').map(|end| &v[..end]))
        .ok_or("'shape' is not a tuple")?;
    inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.trim_end_matches('L')
                .parse::<usize>()
                .map_err(|_| format!("bad dimension '{}' in shape", s))
        })
        .collect()
}
