use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;

/// Element types an `.npy` member may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F16,
    F32,
    F64,
    C64,
    C128,
}

impl ElementType {
    /// Map a NumPy type code (`f8`, `i4`, `c16`, ...) to an element type.
    pub fn from_type_code(code: &str) -> Option<ElementType> {
        let ty = match code {
            "b1" => ElementType::Bool,
            "i1" => ElementType::I8,
            "i2" => ElementType::I16,
            "i4" => ElementType::I32,
            "i8" => ElementType::I64,
            "u1" => ElementType::U8,
            "u2" => ElementType::U16,
            "u4" => ElementType::U32,
            "u8" => ElementType::U64,
            "f2" => ElementType::F16,
            "f4" => ElementType::F32,
            "f8" => ElementType::F64,
            "c8" => ElementType::C64,
            "c16" => ElementType::C128,
            _ => return None,
        };
        Some(ty)
    }

    pub fn size_in_bytes(self) -> usize {
        match self {
            ElementType::Bool | ElementType::I8 | ElementType::U8 => 1,
            ElementType::I16 | ElementType::U16 | ElementType::F16 => 2,
            ElementType::I32 | ElementType::U32 | ElementType::F32 => 4,
            ElementType::I64 | ElementType::U64 | ElementType::F64 | ElementType::C64 => 8,
            ElementType::C128 => 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryOrder {
    /// Row-major (NumPy default).
    C,
    /// Column-major (`fortran_order: True`).
    Fortran,
}

/// One n-dimensional array recovered from the archive.
///
/// The payload lives in a `u64`-backed buffer so the data pointer handed to
/// compiled code is 8-byte aligned regardless of the element type.
#[derive(Debug, Clone)]
pub struct NamedArray {
    pub name: String,
    pub element_type: ElementType,
    pub shape: Vec<usize>,
    pub order: MemoryOrder,
    words: Vec<u64>,
    byte_len: usize,
}

impl NamedArray {
    pub fn from_bytes(
        name: String,
        element_type: ElementType,
        shape: Vec<usize>,
        order: MemoryOrder,
        bytes: &[u8],
    ) -> NamedArray {
        let mut words = vec![0u64; bytes.len().div_ceil(8)];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks(8)) {
            let mut buf = [0u8; 8];
            buf[..chunk.len()].copy_from_slice(chunk);
            *word = u64::from_ne_bytes(buf);
        }
        NamedArray {
            name,
            element_type,
            shape,
            order,
            words,
            byte_len: bytes.len(),
        }
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// Strides in elements, laid out the way NumPy computes them: a zero
    /// extent contributes a factor of one.
    pub fn strides(&self) -> Vec<usize> {
        let mut strides = vec![0usize; self.shape.len()];
        let mut acc = 1usize;
        match self.order {
            MemoryOrder::C => {
                for (stride, &dim) in strides.iter_mut().zip(&self.shape).rev() {
                    *stride = acc;
                    acc *= dim.max(1);
                }
            }
            MemoryOrder::Fortran => {
                for (stride, &dim) in strides.iter_mut().zip(&self.shape) {
                    *stride = acc;
                    acc *= dim.max(1);
                }
            }
        }
        strides
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len);
        for word in &self.words {
            out.extend_from_slice(&word.to_ne_bytes());
        }
        out.truncate(self.byte_len);
        out
    }

    pub fn data_ptr(&mut self) -> *mut u8 {
        self.words.as_mut_ptr().cast()
    }
}

/// Arrays of one archive, in archive order.
#[derive(Debug, Clone, Default)]
pub struct ArraySet {
    arrays: Vec<NamedArray>,
}

impl ArraySet {
    pub fn new(arrays: Vec<NamedArray>) -> ArraySet {
        ArraySet { arrays }
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.arrays.iter().map(|a| a.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&NamedArray> {
        self.arrays.iter().find(|a| a.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut NamedArray> {
        self.arrays.iter_mut().find(|a| a.name == name)
    }
}

/// One timed invocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measurement {
    /// Value the compiled code wrote into the timing slot, in seconds.
    pub seconds: f64,
    /// Host-side elapsed time of the whole invocation.
    pub wall_seconds: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    pub function_name: String,
    pub entry_point: String,
    pub started_at: DateTime<Utc>,
    pub arguments: Vec<String>,
    pub warmup: usize,
    pub runs: Vec<Measurement>,
    /// Single measurement, or the median when more than one run was taken.
    pub seconds: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Plain,
    Summary,
}
