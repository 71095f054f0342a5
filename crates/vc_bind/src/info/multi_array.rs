use alloc::vec;
use alloc::vec::Vec;

use crate::error::AccessError;
use crate::info::{ArrayRank, Bindable, DescriptorBuilder, TypeDescriptor};

/// A dense N-dimensional array stored in row-major order.
///
/// Paths address its elements with a single raw array hop that carries one
/// index per dimension, e.g. `volume[#1, 2, 3]`.
///
/// # Examples
///
/// ```
/// use vc_bind::info::MultiArray;
///
/// let mut grid = MultiArray::new(&[2, 3], 0_u8);
/// *grid.get_mut(&[1, 2]).unwrap() = 7;
///
/// assert_eq!(grid.rank(), 2);
/// assert_eq!(grid.as_slice()[5], 7);
/// assert!(grid.get(&[2, 0]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MultiArray<T> {
    shape: Vec<usize>,
    data: Vec<T>,
}

/// An empty array of rank one.
impl<T> Default for MultiArray<T> {
    #[inline]
    fn default() -> Self {
        Self {
            shape: vec![0],
            data: Vec::new(),
        }
    }
}

impl<T: Clone> MultiArray<T> {
    /// Creates an array of the given shape filled with `value`.
    pub fn new(shape: &[usize], value: T) -> Self {
        let len = shape.iter().product();
        Self {
            shape: shape.to_vec(),
            data: vec![value; len],
        }
    }
}

impl<T> MultiArray<T> {
    /// Wraps `data` with the given shape, or gives it back if the lengths
    /// disagree.
    pub fn from_vec(shape: &[usize], data: Vec<T>) -> Result<Self, Vec<T>> {
        if shape.iter().product::<usize>() != data.len() {
            return Err(data);
        }
        Ok(Self {
            shape: shape.to_vec(),
            data,
        })
    }

    /// Returns the number of dimensions.
    #[inline]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Returns the length of every dimension.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns the elements in row-major order.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    fn offset(&self, indices: &[usize]) -> Result<usize, AccessError> {
        if indices.len() != self.shape.len() {
            return Err(AccessError::RankMismatch {
                expected: self.shape.len(),
                actual: indices.len(),
            });
        }
        let mut offset = 0;
        for (&index, &len) in indices.iter().zip(&self.shape) {
            if index >= len {
                return Err(AccessError::OutOfRange { index: index as i64, len });
            }
            offset = offset * len + index;
        }
        Ok(offset)
    }

    /// Returns the element at `indices`.
    pub fn get(&self, indices: &[usize]) -> Result<&T, AccessError> {
        let offset = self.offset(indices)?;
        Ok(&self.data[offset])
    }

    /// Returns the element at `indices` mutably.
    pub fn get_mut(&mut self, indices: &[usize]) -> Result<&mut T, AccessError> {
        let offset = self.offset(indices)?;
        Ok(&mut self.data[offset])
    }
}

impl<T: Bindable> Bindable for MultiArray<T> {
    fn descriptor() -> TypeDescriptor {
        DescriptorBuilder::<Self>::new()
            .array::<T>(ArrayRank::Dynamic, Self::get, Self::get_mut)
            .readonly_property("rank", |a| a.rank())
            .readonly_property("len", |a| a.len())
            .default()
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::MultiArray;
    use crate::error::AccessError;

    #[test]
    fn row_major_offsets() {
        let data = (0..24).collect::<alloc::vec::Vec<u32>>();
        let cube = MultiArray::from_vec(&[2, 3, 4], data).unwrap();
        assert_eq!(*cube.get(&[1, 2, 3]).unwrap(), 23);
        assert_eq!(*cube.get(&[0, 1, 0]).unwrap(), 4);
        assert_eq!(
            cube.get(&[0, 1]),
            Err(AccessError::RankMismatch {
                expected: 3,
                actual: 2
            })
        );
        assert_eq!(
            cube.get(&[0, 3, 0]),
            Err(AccessError::OutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn default_is_empty() {
        let mut empty = MultiArray::<u8>::default();
        assert_eq!(empty.rank(), 1);
        assert_eq!(empty.len(), 0);
        assert_eq!(
            empty.get(&[]),
            Err(AccessError::RankMismatch {
                expected: 1,
                actual: 0
            })
        );
        assert_eq!(
            empty.get_mut(&[0]),
            Err(AccessError::OutOfRange { index: 0, len: 0 })
        );
    }
}
