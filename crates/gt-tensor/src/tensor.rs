use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use crate::backend::ComputeBackend;
use crate::dtype::DType;
use crate::error::{Result, TensorError};
use crate::shape::Shape;
use crate::storage::CpuStorage;

/// A tensor backed by CPU storage.
///
/// Holds contiguous, row-major data with an associated shape. Operations that
/// require computation are dispatched to a `ComputeBackend` and only accept
/// F32 tensors; I32 tensors must be widened with [`Tensor::cast`] first.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    storage: CpuStorage,
    shape: Shape,
}

impl Tensor {
    /// Create a new tensor from f32 data and a shape.
    ///
    /// # Panics
    /// Panics if `data.len() != shape.numel()`. Use [`Tensor::from_vec`] for
    /// data whose length is not known to match.
    pub fn new(data: Vec<f32>, shape: Shape) -> Self {
        assert_eq!(
            data.len(),
            shape.numel(),
            "data length {} does not match shape {} (numel={})",
            data.len(),
            shape,
            shape.numel()
        );
        Tensor {
            storage: CpuStorage::from_f32_vec(data),
            shape,
        }
    }

    /// Fallible counterpart of [`Tensor::new`].
    pub fn from_vec(data: Vec<f32>, shape: Shape) -> Result<Self> {
        check_len(data.len(), &shape)?;
        Ok(Tensor {
            storage: CpuStorage::from_f32_vec(data),
            shape,
        })
    }

    /// Create an I32 tensor from integer data and a shape.
    pub fn from_i32(data: Vec<i32>, shape: Shape) -> Result<Self> {
        check_len(data.len(), &shape)?;
        Ok(Tensor {
            storage: CpuStorage::from_i32_vec(data),
            shape,
        })
    }

    /// A rank-0 F32 tensor.
    pub fn scalar(value: f32) -> Self {
        Tensor {
            storage: CpuStorage::from_f32_vec(vec![value]),
            shape: Shape::scalar(),
        }
    }

    /// Create a zero-filled F32 tensor with the given shape.
    pub fn zeros(shape: Shape) -> Self {
        Tensor {
            storage: CpuStorage::zeros(DType::F32, shape.numel()),
            shape,
        }
    }

    /// Create an F32 tensor filled with ones with the given shape.
    pub fn ones(shape: Shape) -> Self {
        let n = shape.numel();
        Tensor {
            storage: CpuStorage::from_f32_vec(vec![1.0; n]),
            shape,
        }
    }

    /// Sample an I32 tensor whose entries are drawn independently and
    /// uniformly from the half-open range `[low, high)`.
    pub fn randint<R: Rng + ?Sized>(
        low: i32,
        high: i32,
        shape: Shape,
        rng: &mut R,
    ) -> Result<Self> {
        if low >= high {
            return Err(TensorError::InvalidRange { low, high });
        }
        let dist = Uniform::new(low, high);
        let data: Vec<i32> = (0..shape.numel()).map(|_| dist.sample(rng)).collect();
        Ok(Tensor {
            storage: CpuStorage::from_i32_vec(data),
            shape,
        })
    }

    /// Returns a reference to the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the tensor's data type.
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    /// Returns the underlying data as an f32 slice.
    ///
    /// # Errors
    /// Returns `DTypeMismatch` for non-F32 tensors.
    pub fn data_f32(&self) -> Result<&[f32]> {
        self.storage.as_f32_slice()
    }

    /// Returns the underlying data as an i32 slice.
    pub fn data_i32(&self) -> Result<&[i32]> {
        self.storage.as_i32_slice()
    }

    /// Convert to `dtype`. Only widening to F32 is supported; casting to the
    /// current dtype is a copy.
    pub fn cast(&self, dtype: DType) -> Result<Tensor> {
        let storage = match (self.dtype(), dtype) {
            (from, to) if from == to => self.storage.clone(),
            (_, DType::F32) => self.storage.to_f32(),
            (from, to) => {
                return Err(TensorError::UnsupportedDType(format!(
                    "cast from {} to {}",
                    from, to
                )))
            }
        };
        Ok(Tensor {
            storage,
            shape: self.shape.clone(),
        })
    }

    /// Reshape the tensor, returning a new tensor with the same data but
    /// a different shape.
    ///
    /// The total number of elements must remain the same.
    pub fn reshape(&self, new_shape: Shape) -> Result<Tensor> {
        if self.shape.numel() != new_shape.numel() {
            return Err(TensorError::ShapeMismatch {
                expected: self.shape.dims().to_vec(),
                got: new_shape.dims().to_vec(),
            });
        }
        Ok(Tensor {
            storage: self.storage.clone(),
            shape: new_shape,
        })
    }

    /// Materialize this tensor expanded to `target` under numpy broadcasting.
    pub fn broadcast_to(&self, target: &Shape) -> Result<Tensor> {
        if self.shape == *target {
            return Ok(self.clone());
        }
        let src_strides = self.shape.broadcast_strides(target)?;
        let storage = match &self.storage {
            CpuStorage::F32(v) => CpuStorage::F32(gather(v, target, &src_strides)),
            CpuStorage::I32(v) => CpuStorage::I32(gather(v, target, &src_strides)),
        };
        Ok(Tensor {
            storage,
            shape: target.clone(),
        })
    }

    /// Matrix multiplication of two 2D tensors using the given backend.
    ///
    /// self is [m, k], other is [k, n], result is [m, n].
    pub fn matmul(&self, other: &Tensor, backend: &dyn ComputeBackend) -> Result<Tensor> {
        if self.shape.ndim() != 2 || other.shape.ndim() != 2 {
            return Err(TensorError::Other(format!(
                "matmul requires 2D tensors, got {} and {}",
                self.shape, other.shape
            )));
        }

        let m = self.shape.dim(0);
        let k = self.shape.dim(1);
        let k2 = other.shape.dim(0);
        let n = other.shape.dim(1);

        if k != k2 {
            return Err(TensorError::MatmulMismatch { m, k, k2, n });
        }

        let result_data = backend.matmul(self.data_f32()?, other.data_f32()?, m, k, n)?;
        Tensor::from_vec(result_data, Shape::matrix(m, n))
    }

    /// Elementwise product with broadcasting.
    ///
    /// A one-element operand that does not change the output shape is applied
    /// with the backend's `scale`.
    pub fn mul(&self, other: &Tensor, backend: &dyn ComputeBackend) -> Result<Tensor> {
        let out = Shape::broadcast_shape(&self.shape, &other.shape)?;
        if other.numel() == 1 && self.shape == out {
            let data = backend.scale(self.data_f32()?, other.data_f32()?[0])?;
            return Tensor::from_vec(data, out);
        }
        if self.numel() == 1 && other.shape == out {
            let data = backend.scale(other.data_f32()?, self.data_f32()?[0])?;
            return Tensor::from_vec(data, out);
        }
        let lhs = self.broadcast_to(&out)?;
        let rhs = other.broadcast_to(&out)?;
        let data = backend.mul(lhs.data_f32()?, rhs.data_f32()?)?;
        Tensor::from_vec(data, out)
    }

    /// Elementwise sum with broadcasting.
    pub fn add(&self, other: &Tensor, backend: &dyn ComputeBackend) -> Result<Tensor> {
        let out = Shape::broadcast_shape(&self.shape, &other.shape)?;
        let lhs = self.broadcast_to(&out)?;
        let rhs = other.broadcast_to(&out)?;
        let data = backend.add(lhs.data_f32()?, rhs.data_f32()?)?;
        Tensor::from_vec(data, out)
    }

    /// Returns the underlying storage reference.
    pub fn storage(&self) -> &CpuStorage {
        &self.storage
    }
}

fn check_len(len: usize, shape: &Shape) -> Result<()> {
    if len != shape.numel() {
        return Err(TensorError::ShapeMismatch {
            expected: shape.dims().to_vec(),
            got: vec![len],
        });
    }
    Ok(())
}

/// Walks `target` in row-major order, reading `src` through `src_strides`.
fn gather<T: Copy>(src: &[T], target: &Shape, src_strides: &[usize]) -> Vec<T> {
    let dims = target.dims();
    let mut index = vec![0usize; dims.len()];
    let mut out = Vec::with_capacity(target.numel());
    for _ in 0..target.numel() {
        let offset: usize = index.iter().zip(src_strides).map(|(i, s)| i * s).sum();
        out.push(src[offset]);
        for axis in (0..dims.len()).rev() {
            index[axis] += 1;
            if index[axis] < dims[axis] {
                break;
            }
            index[axis] = 0;
        }
    }
    out
}
