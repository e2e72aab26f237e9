use crate::dtype::DType;
use crate::error::{Result, TensorError};

/// CPU-side tensor storage.
///
/// F32 is the computation type. I32 holds raw integer samples until they are
/// explicitly widened with [`CpuStorage::to_f32`].
#[derive(Debug, Clone, PartialEq)]
pub enum CpuStorage {
    /// 32-bit floating point storage.
    F32(Vec<f32>),
    /// 32-bit signed integer storage.
    I32(Vec<i32>),
}

impl CpuStorage {
    /// Number of elements in this storage.
    pub fn len(&self) -> usize {
        match self {
            CpuStorage::F32(v) => v.len(),
            CpuStorage::I32(v) => v.len(),
        }
    }

    /// Returns true if the storage contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the data as an f32 slice.
    ///
    /// # Errors
    /// Returns an error if the storage is not F32.
    pub fn as_f32_slice(&self) -> Result<&[f32]> {
        match self {
            CpuStorage::F32(v) => Ok(v.as_slice()),
            other => Err(TensorError::DTypeMismatch {
                expected: DType::F32.to_string(),
                got: other.dtype().to_string(),
            }),
        }
    }

    /// Returns the data as an i32 slice.
    ///
    /// # Errors
    /// Returns an error if the storage is not I32.
    pub fn as_i32_slice(&self) -> Result<&[i32]> {
        match self {
            CpuStorage::I32(v) => Ok(v.as_slice()),
            other => Err(TensorError::DTypeMismatch {
                expected: DType::I32.to_string(),
                got: other.dtype().to_string(),
            }),
        }
    }

    /// Create zero-filled storage for the given dtype and element count.
    pub fn zeros(dtype: DType, n: usize) -> Self {
        match dtype {
            DType::F32 => CpuStorage::F32(vec![0.0; n]),
            DType::I32 => CpuStorage::I32(vec![0; n]),
        }
    }

    /// Create storage from an f32 vector.
    pub fn from_f32_vec(data: Vec<f32>) -> Self {
        CpuStorage::F32(data)
    }

    /// Create storage from an i32 vector.
    pub fn from_i32_vec(data: Vec<i32>) -> Self {
        CpuStorage::I32(data)
    }

    /// Widen to F32 storage. Every i32 in [-2^24, 2^24] converts exactly.
    pub fn to_f32(&self) -> CpuStorage {
        match self {
            CpuStorage::F32(v) => CpuStorage::F32(v.clone()),
            CpuStorage::I32(v) => CpuStorage::F32(v.iter().map(|&x| x as f32).collect()),
        }
    }

    /// Returns the dtype of this storage.
    pub fn dtype(&self) -> DType {
        match self {
            CpuStorage::F32(_) => DType::F32,
            CpuStorage::I32(_) => DType::I32,
        }
    }
}
