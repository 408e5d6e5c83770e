use std::cell::Cell;
use std::ffi::c_void;
use std::marker::PhantomData;

use crate::errors::BenchError;
use crate::memref::MemRefDescriptor;
use crate::types::ArraySet;

/// Packed argument list for one compiled entry point.
///
/// Slot `i < n` points at a cell that holds the address of the i-th memref
/// descriptor (pointer to pointer to descriptor). The final slot points at
/// the timing cell: the packed wrapper stores the entry point's `i64` result,
/// the elapsed nanoseconds, there.
///
/// Every cell is boxed so the addresses stay put for the life of the value,
/// and the arrays stay mutably borrowed since compiled code may write them.
pub struct CallArguments<'a> {
    descriptors: Vec<MemRefDescriptor>,
    // First level of indirection; read only by compiled code.
    _cells: Vec<Box<*mut i64>>,
    timing: Box<Cell<i64>>,
    packed: Vec<*mut c_void>,
    _arrays: PhantomData<&'a mut ArraySet>,
}

impl<'a> CallArguments<'a> {
    /// Bind `arrays` in `order`, then append a fresh timing slot set to 0.
    pub fn bind(arrays: &'a mut ArraySet, order: &[String]) -> Result<CallArguments<'a>, BenchError> {
        let mut descriptors = Vec::with_capacity(order.len());
        for name in order {
            let array = arrays
                .get_mut(name)
                .ok_or_else(|| BenchError::UnresolvedArgument { name: name.clone() })?;
            descriptors.push(MemRefDescriptor::for_array(array));
        }

        let mut cells: Vec<Box<*mut i64>> = descriptors
            .iter_mut()
            .map(|d| Box::new(d.as_mut_ptr()))
            .collect();
        let timing = Box::new(Cell::new(0i64));

        let mut packed: Vec<*mut c_void> = cells
            .iter_mut()
            .map(|cell| (&mut **cell) as *mut *mut i64 as *mut c_void)
            .collect();
        packed.push(timing.as_ptr() as *mut c_void);

        Ok(CallArguments {
            descriptors,
            _cells: cells,
            timing,
            packed,
            _arrays: PhantomData,
        })
    }

    /// Number of packed slots, timing slot included.
    pub fn len(&self) -> usize {
        self.packed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packed.is_empty()
    }

    pub fn descriptors(&self) -> &[MemRefDescriptor] {
        &self.descriptors
    }

    /// Packed slots in call order, ready for an `invoke_packed` call.
    pub fn packed(&mut self) -> &mut [*mut c_void] {
        &mut self.packed
    }

    /// Current value of the timing cell, in nanoseconds.
    pub fn timing_ns(&self) -> i64 {
        self.timing.get()
    }

    pub fn timing_seconds(&self) -> f64 {
        self.timing_ns() as f64 / 1e9
    }

    #[cfg(test)]
    fn cell_targets(&self) -> Vec<*mut i64> {
        self._cells.iter().map(|c| **c).collect()
    }
}
