/// A hashed, strided array of scalars.
///
/// Each logical weight owns `1 << stride_shift` consecutive floats: offset 0
/// is the weight itself, the rest hold per-coordinate optimizer state.
/// Indices wrap through a power-of-two mask, so every `u64` addresses some
/// coordinate and untouched coordinates read as 0.
#[derive(Debug, Clone)]
pub struct WeightStore {
    weights: Vec<f32>,
    stride_shift: u32,
    mask: u64,
}

impl WeightStore {
    /// A store with `2^bits` weights of `2^stride_shift` floats each.
    pub fn new(bits: u32, stride_shift: u32) -> WeightStore {
        let len = 1usize << (bits + stride_shift);
        WeightStore {
            weights: vec![0.0; len],
            stride_shift,
            mask: len as u64 - 1,
        }
    }

    pub fn stride_shift(&self) -> u32 {
        self.stride_shift
    }

    pub fn stride(&self) -> u64 {
        1 << self.stride_shift
    }

    /// First float of the weight that `index` falls into.
    fn base(&self, index: u64) -> usize {
        ((index & self.mask) & !(self.stride() - 1)) as usize
    }

    pub fn get(&self, index: u64, slot: usize) -> f32 {
        self.weights[self.base(index) + slot]
    }

    pub fn get_mut(&mut self, index: u64, slot: usize) -> &mut f32 {
        let base = self.base(index);
        &mut self.weights[base + slot]
    }

    pub fn len(&self) -> usize {
        self.weights.len() >> self.stride_shift
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}
