//! Block interleaver
//!
//! Bits are written row-major into a grid with a fixed column count and read
//! back column-major, so a burst of consecutive channel errors lands in
//! different bytes of the codeword. Lengths that do not fill the last row are
//! handled by skipping the empty cells, which keeps the mapping a permutation
//! for every input length.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitInterleaver {
    columns: usize,
}

impl BitInterleaver {
    /// A column count of zero is treated as one (identity).
    pub fn new(columns: usize) -> Self {
        Self {
            columns: columns.max(1),
        }
    }

    /// Source index for each output slot.
    fn order(&self, len: usize) -> Vec<usize> {
        let rows = len.div_ceil(self.columns);
        let mut order = Vec::with_capacity(len);
        for col in 0..self.columns {
            for row in 0..rows {
                let index = row * self.columns + col;
                if index < len {
                    order.push(index);
                }
            }
        }
        order
    }

    pub fn interleave<T: Copy>(&self, data: &[T]) -> Vec<T> {
        self.order(data.len()).into_iter().map(|i| data[i]).collect()
    }

    pub fn deinterleave<T: Copy + Default>(&self, data: &[T]) -> Vec<T> {
        let mut out = vec![T::default(); data.len()];
        for (slot, source) in self.order(data.len()).into_iter().enumerate() {
            out[source] = data[slot];
        }
        out
    }
}
