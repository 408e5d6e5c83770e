//! Ranked memref descriptors.
//!
//! Compiled MLIR functions take a memref argument as a pointer to
//!
//! ```text
//! struct { T *allocated; T *aligned; i64 offset; i64 sizes[rank]; i64 strides[rank]; }
//! ```
//!
//! The rank is only known at runtime here, so the descriptor is stored as a
//! flat word buffer with exactly that layout.

use crate::types::NamedArray;

const _: () = assert!(
    std::mem::size_of::<usize>() == std::mem::size_of::<i64>(),
    "memref descriptors are built for 64-bit targets"
);

const ALLOCATED: usize = 0;
const ALIGNED: usize = 1;
const OFFSET: usize = 2;
const SIZES: usize = 3;

#[derive(Debug)]
pub struct MemRefDescriptor {
    words: Box<[i64]>,
    rank: usize,
}

impl MemRefDescriptor {
    /// Describe `array` in place. The descriptor points into the array's
    /// buffer; the caller keeps the array alive and unmoved while it is used.
    pub fn for_array(array: &mut NamedArray) -> MemRefDescriptor {
        let rank = array.rank();
        let strides = array.strides();
        let data = array.data_ptr() as usize as i64;

        let mut words = vec![0i64; SIZES + 2 * rank].into_boxed_slice();
        words[ALLOCATED] = data;
        words[ALIGNED] = data;
        words[OFFSET] = 0;
        for (i, (&size, &stride)) in array.shape.iter().zip(&strides).enumerate() {
            words[SIZES + i] = size as i64;
            words[SIZES + rank + i] = stride as i64;
        }

        MemRefDescriptor { words, rank }
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn aligned_ptr(&self) -> *mut u8 {
        self.words[ALIGNED] as usize as *mut u8
    }

    pub fn offset(&self) -> i64 {
        self.words[OFFSET]
    }

    pub fn sizes(&self) -> &[i64] {
        &self.words[SIZES..SIZES + self.rank]
    }

    pub fn strides(&self) -> &[i64] {
        &self.words[SIZES + self.rank..]
    }

    /// Address of the descriptor struct itself.
    pub fn as_mut_ptr(&mut self) -> *mut i64 {
        self.words.as_mut_ptr()
    }

    /// Reinterpret a raw descriptor address of known rank.
    ///
    /// # Safety
    /// `ptr` must point at a live descriptor of exactly `rank` dimensions.
    pub unsafe fn words_at<'a>(ptr: *const i64, rank: usize) -> &'a [i64] {
        unsafe { std::slice::from_raw_parts(ptr, SIZES + 2 * rank) }
    }
}
