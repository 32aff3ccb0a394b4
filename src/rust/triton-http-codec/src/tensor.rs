// Copyright 2024-2026, NVIDIA CORPORATION & AFFILIATES. All rights reserved.
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions
// are met:
//  * Redistributions of source code must retain the above copyright
//    notice, this list of conditions and the following disclaimer.
//  * Redistributions in binary form must reproduce the above copyright
//    notice, this list of conditions and the following disclaimer in the
//    documentation and/or other materials provided with the distribution.
//  * Neither the name of NVIDIA CORPORATION nor the names of its
//    contributors may be used to endorse or promote products derived
//    from this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS ``AS IS'' AND ANY
// EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
// IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR
// PURPOSE ARE DISCLAIMED.  IN NO EVENT SHALL THE COPYRIGHT OWNER OR
// CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL,
// EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO,
// PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE, DATA, OR
// PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY
// OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT
// (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
// OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! Typed tensor buffers and the wire data type table.
//!
//! A [`TensorBuffer`] is an immutable, named, shaped block of little-endian
//! element bytes tagged with a [`DataType`]. Every data type is described by a
//! single row of a static table holding its wire string, its element size and
//! the functions that move one element between raw bytes and JSON, so adding a
//! data type is one new variant plus one new row.
//!
//! # Example
//!
//! ```rust
//! use triton_http_codec::tensor::{DataType, TensorBuffer};
//!
//! let ids = TensorBuffer::from_slice("input_ids", vec![1, 4], &[12u32, 7, 99, 1]).unwrap();
//! assert_eq!(ids.datatype(), DataType::Uint32);
//! assert_eq!(ids.data().len(), 16);
//! assert_eq!(ids.to_vec::<u32>().unwrap(), vec![12, 7, 99, 1]);
//! ```

use bytes::Bytes;
use serde_json::Value;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// DataType
// ---------------------------------------------------------------------------

/// Tensor element types understood by the wire protocol.
///
/// The discriminant order matches the rows of the data type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Boolean values, one byte each.
    Bool,
    /// Unsigned 8-bit integers.
    Uint8,
    /// Unsigned 16-bit integers.
    Uint16,
    /// Unsigned 32-bit integers.
    Uint32,
    /// Unsigned 64-bit integers.
    Uint64,
    /// Signed 8-bit integers.
    Int8,
    /// Signed 16-bit integers.
    Int16,
    /// Signed 32-bit integers.
    Int32,
    /// Signed 64-bit integers.
    Int64,
    /// IEEE 754 single-precision floating point.
    Fp32,
    /// IEEE 754 double-precision floating point.
    Fp64,
    /// Variable-length byte sequences (strings), each prefixed by its
    /// little-endian `u32` length.
    Bytes,
}

/// One row of the data type table.
struct DataTypeInfo {
    datatype: DataType,
    wire: &'static str,
    byte_size: Option<usize>,
    to_json: fn(&[u8]) -> Option<Value>,
    from_json: fn(&Value, &mut Vec<u8>) -> bool,
}

static DATA_TYPES: [DataTypeInfo; 12] = [
    DataTypeInfo {
        datatype: DataType::Bool,
        wire: "BOOL",
        byte_size: Some(1),
        to_json: bool_to_json,
        from_json: bool_from_json,
    },
    DataTypeInfo {
        datatype: DataType::Uint8,
        wire: "UINT8",
        byte_size: Some(1),
        to_json: u8_to_json,
        from_json: u8_from_json,
    },
    DataTypeInfo {
        datatype: DataType::Uint16,
        wire: "UINT16",
        byte_size: Some(2),
        to_json: u16_to_json,
        from_json: u16_from_json,
    },
    DataTypeInfo {
        datatype: DataType::Uint32,
        wire: "UINT32",
        byte_size: Some(4),
        to_json: u32_to_json,
        from_json: u32_from_json,
    },
    DataTypeInfo {
        datatype: DataType::Uint64,
        wire: "UINT64",
        byte_size: Some(8),
        to_json: u64_to_json,
        from_json: u64_from_json,
    },
    DataTypeInfo {
        datatype: DataType::Int8,
        wire: "INT8",
        byte_size: Some(1),
        to_json: i8_to_json,
        from_json: i8_from_json,
    },
    DataTypeInfo {
        datatype: DataType::Int16,
        wire: "INT16",
        byte_size: Some(2),
        to_json: i16_to_json,
        from_json: i16_from_json,
    },
    DataTypeInfo {
        datatype: DataType::Int32,
        wire: "INT32",
        byte_size: Some(4),
        to_json: i32_to_json,
        from_json: i32_from_json,
    },
    DataTypeInfo {
        datatype: DataType::Int64,
        wire: "INT64",
        byte_size: Some(8),
        to_json: i64_to_json,
        from_json: i64_from_json,
    },
    DataTypeInfo {
        datatype: DataType::Fp32,
        wire: "FP32",
        byte_size: Some(4),
        to_json: f32_to_json,
        from_json: f32_from_json,
    },
    DataTypeInfo {
        datatype: DataType::Fp64,
        wire: "FP64",
        byte_size: Some(8),
        to_json: f64_to_json,
        from_json: f64_from_json,
    },
    DataTypeInfo {
        datatype: DataType::Bytes,
        wire: "BYTES",
        byte_size: None,
        to_json: bytes_to_json,
        from_json: bytes_from_json,
    },
];

impl DataType {
    fn info(self) -> &'static DataTypeInfo {
        &DATA_TYPES[self as usize]
    }

    /// Returns the wire string representation of this data type.
    ///
    /// # Example
    ///
    /// ```rust
    /// use triton_http_codec::tensor::DataType;
    /// assert_eq!(DataType::Fp32.as_str(), "FP32");
    /// assert_eq!(DataType::Uint32.as_str(), "UINT32");
    /// ```
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.info().wire
    }

    /// Returns the size of one element in bytes, or `None` for the
    /// variable-length `BYTES` type.
    #[must_use]
    pub fn byte_size(self) -> Option<usize> {
        self.info().byte_size
    }

    /// Parses a wire data type string into a [`DataType`].
    ///
    /// Returns `None` if the string is not in the table.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        DATA_TYPES
            .iter()
            .find(|info| info.wire == s)
            .map(|info| info.datatype)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DataType::parse(s).ok_or_else(|| Error::UnsupportedDType(s.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Element codecs
// ---------------------------------------------------------------------------

macro_rules! integer_codec {
    ($to_json:ident, $from_json:ident, $ty:ty, $as:ident) => {
        fn $to_json(chunk: &[u8]) -> Option<Value> {
            let raw: [u8; std::mem::size_of::<$ty>()] = chunk.try_into().ok()?;
            Some(Value::from(<$ty>::from_le_bytes(raw)))
        }

        fn $from_json(value: &Value, out: &mut Vec<u8>) -> bool {
            match value.$as().and_then(|v| <$ty>::try_from(v).ok()) {
                Some(v) => {
                    out.extend_from_slice(&v.to_le_bytes());
                    true
                }
                None => false,
            }
        }
    };
}

macro_rules! float_codec {
    ($to_json:ident, $from_json:ident, $ty:ty) => {
        // JSON has no NaN or infinity, so non-finite values are unrepresentable.
        #[allow(clippy::unnecessary_cast)]
        fn $to_json(chunk: &[u8]) -> Option<Value> {
            let raw: [u8; std::mem::size_of::<$ty>()] = chunk.try_into().ok()?;
            serde_json::Number::from_f64(<$ty>::from_le_bytes(raw) as f64).map(Value::Number)
        }

        #[allow(clippy::cast_possible_truncation, clippy::unnecessary_cast)]
        fn $from_json(value: &Value, out: &mut Vec<u8>) -> bool {
            match value.as_f64().map(|v| v as $ty) {
                Some(v) if v.is_finite() => {
                    out.extend_from_slice(&v.to_le_bytes());
                    true
                }
                _ => false,
            }
        }
    };
}

integer_codec!(u8_to_json, u8_from_json, u8, as_u64);
integer_codec!(u16_to_json, u16_from_json, u16, as_u64);
integer_codec!(u32_to_json, u32_from_json, u32, as_u64);
integer_codec!(u64_to_json, u64_from_json, u64, as_u64);
integer_codec!(i8_to_json, i8_from_json, i8, as_i64);
integer_codec!(i16_to_json, i16_from_json, i16, as_i64);
integer_codec!(i32_to_json, i32_from_json, i32, as_i64);
integer_codec!(i64_to_json, i64_from_json, i64, as_i64);
float_codec!(f32_to_json, f32_from_json, f32);
float_codec!(f64_to_json, f64_from_json, f64);

fn bool_to_json(chunk: &[u8]) -> Option<Value> {
    match chunk {
        [b] => Some(Value::Bool(*b != 0)),
        _ => None,
    }
}

fn bool_from_json(value: &Value, out: &mut Vec<u8>) -> bool {
    match value.as_bool() {
        Some(b) => {
            out.push(u8::from(b));
            true
        }
        None => false,
    }
}

fn bytes_to_json(element: &[u8]) -> Option<Value> {
    std::str::from_utf8(element)
        .ok()
        .map(|s| Value::String(s.to_owned()))
}

fn bytes_from_json(value: &Value, out: &mut Vec<u8>) -> bool {
    let Some(s) = value.as_str() else {
        return false;
    };
    let Ok(len) = u32::try_from(s.len()) else {
        return false;
    };
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(s.as_bytes());
    true
}

/// Splits a serialized `BYTES` buffer into its elements.
fn split_bytes_elements(data: &[u8]) -> Option<Vec<&[u8]>> {
    let mut elements = Vec::new();
    let mut rest = data;
    while !rest.is_empty() {
        let (prefix, tail) = rest.split_at_checked(4)?;
        let len = u32::from_le_bytes(prefix.try_into().ok()?) as usize;
        let (element, tail) = tail.split_at_checked(len)?;
        elements.push(element);
        rest = tail;
    }
    Some(elements)
}

// ---------------------------------------------------------------------------
// Element
// ---------------------------------------------------------------------------

mod sealed {
    pub trait Sealed {}
}

/// Native Rust types that map onto a fixed-size wire [`DataType`].
///
/// This trait is sealed; the implemented set mirrors the data type table.
pub trait Element: Copy + sealed::Sealed {
    /// The wire data type for this element type.
    const DATA_TYPE: DataType;

    /// Appends the little-endian encoding of `self` to `out`.
    fn write_le(self, out: &mut Vec<u8>);

    /// Reads one element from exactly `size_of::<Self>()` bytes.
    fn read_le(chunk: &[u8]) -> Self;
}

macro_rules! numeric_element {
    ($ty:ty, $dt:expr) => {
        impl sealed::Sealed for $ty {}

        impl Element for $ty {
            const DATA_TYPE: DataType = $dt;

            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn read_le(chunk: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(chunk);
                <$ty>::from_le_bytes(raw)
            }
        }
    };
}

numeric_element!(u8, DataType::Uint8);
numeric_element!(u16, DataType::Uint16);
numeric_element!(u32, DataType::Uint32);
numeric_element!(u64, DataType::Uint64);
numeric_element!(i8, DataType::Int8);
numeric_element!(i16, DataType::Int16);
numeric_element!(i32, DataType::Int32);
numeric_element!(i64, DataType::Int64);
numeric_element!(f32, DataType::Fp32);
numeric_element!(f64, DataType::Fp64);

impl sealed::Sealed for bool {}

impl Element for bool {
    const DATA_TYPE: DataType = DataType::Bool;

    fn write_le(self, out: &mut Vec<u8>) {
        out.push(u8::from(self));
    }

    fn read_le(chunk: &[u8]) -> Self {
        chunk.first().is_some_and(|b| *b != 0)
    }
}

// ---------------------------------------------------------------------------
// TensorBuffer
// ---------------------------------------------------------------------------

/// An immutable, named tensor with raw little-endian element data.
///
/// By default the tensor's bytes travel as a binary segment after the JSON
/// header; [`with_binary_data(false)`](Self::with_binary_data) inlines them as
/// JSON values instead.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorBuffer {
    name: String,
    shape: Vec<usize>,
    datatype: DataType,
    data: Bytes,
    binary_data: bool,
}

impl TensorBuffer {
    /// Creates a tensor from raw element bytes.
    ///
    /// For `BYTES` tensors `data` must be the length-prefixed serialization
    /// produced by [`from_strings`](Self::from_strings).
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if `shape` is empty, has a zero
    /// dimension, or does not describe exactly the elements in `data`.
    pub fn new(
        name: impl Into<String>,
        shape: Vec<usize>,
        datatype: DataType,
        data: impl Into<Bytes>,
    ) -> Result<Self> {
        let tensor = Self {
            name: name.into(),
            shape,
            datatype,
            data: data.into(),
            binary_data: true,
        };
        tensor.validate()?;
        Ok(tensor)
    }

    /// Creates a tensor from a slice of native elements.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the element count does not match
    /// the product of `shape`.
    pub fn from_slice<T: Element>(
        name: impl Into<String>,
        shape: Vec<usize>,
        values: &[T],
    ) -> Result<Self> {
        let mut raw = Vec::with_capacity(values.len() * std::mem::size_of::<T>());
        for v in values {
            v.write_le(&mut raw);
        }
        Self::new(name, shape, T::DATA_TYPE, raw)
    }

    /// Creates a `BYTES` tensor from variable-length items.
    ///
    /// Each item is prepended with its 4-byte little-endian length.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the item count does not match the
    /// product of `shape`, or an item is longer than `u32::MAX` bytes.
    pub fn from_strings<S: AsRef<[u8]>>(
        name: impl Into<String>,
        shape: Vec<usize>,
        items: &[S],
    ) -> Result<Self> {
        let name = name.into();
        let mut raw = Vec::new();
        for item in items {
            let item = item.as_ref();
            let len = u32::try_from(item.len()).map_err(|_| {
                Error::ShapeMismatch(format!(
                    "tensor '{name}' has an element of {} bytes",
                    item.len()
                ))
            })?;
            raw.extend_from_slice(&len.to_le_bytes());
            raw.extend_from_slice(item);
        }
        Self::new(name, shape, DataType::Bytes, raw)
    }

    /// Builds a tensor from inline JSON values received on the wire.
    pub(crate) fn from_json_values(
        name: String,
        shape: Vec<usize>,
        datatype: DataType,
        values: &[Value],
    ) -> Result<Self> {
        let info = datatype.info();
        let mut raw = Vec::with_capacity(values.len() * info.byte_size.unwrap_or(8));
        for (i, value) in values.iter().enumerate() {
            if !(info.from_json)(value, &mut raw) {
                return Err(Error::Decoding(format!(
                    "element {i} of tensor '{name}' is not a valid {datatype} value: {value}"
                )));
            }
        }
        Self::new(name, shape, datatype, raw).map_err(|e| match e {
            Error::ShapeMismatch(msg) => Error::Decoding(msg),
            other => other,
        })
    }

    /// Returns a copy of this tensor with the given binary-data flag.
    #[must_use]
    pub fn with_binary_data(self, binary_data: bool) -> Self {
        Self {
            binary_data,
            ..self
        }
    }

    /// Returns the tensor name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the tensor shape.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the tensor data type.
    #[must_use]
    pub fn datatype(&self) -> DataType {
        self.datatype
    }

    /// Returns the raw element bytes.
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Whether the tensor's bytes travel as a binary segment.
    #[must_use]
    pub fn is_binary(&self) -> bool {
        self.binary_data
    }

    /// Returns the first dimension of the shape.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.shape[0]
    }

    /// Returns the number of elements described by the shape.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// Interprets the tensor data as a vector of native elements.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedDType`] if `T` does not match the tensor's
    /// data type.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        if T::DATA_TYPE != self.datatype {
            return Err(Error::UnsupportedDType(format!(
                "tensor '{}' holds {} elements, not {}",
                self.name,
                self.datatype,
                T::DATA_TYPE
            )));
        }
        Ok(self
            .data
            .chunks_exact(std::mem::size_of::<T>())
            .map(T::read_le)
            .collect())
    }

    /// Returns the elements of a `BYTES` tensor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedDType`] if the tensor is not `BYTES`.
    pub fn to_strings(&self) -> Result<Vec<Vec<u8>>> {
        if self.datatype != DataType::Bytes {
            return Err(Error::UnsupportedDType(format!(
                "tensor '{}' holds {} elements, not BYTES",
                self.name, self.datatype
            )));
        }
        let elements = split_bytes_elements(&self.data).ok_or_else(|| {
            Error::Decoding(format!("BYTES tensor '{}' has a truncated element", self.name))
        })?;
        Ok(elements.into_iter().map(<[u8]>::to_vec).collect())
    }

    /// Converts the tensor data into a flat list of JSON values.
    pub(crate) fn json_values(&self) -> Result<Vec<Value>> {
        let info = self.datatype.info();
        let elements: Vec<&[u8]> = match info.byte_size {
            Some(size) => self.data.chunks_exact(size).collect(),
            None => split_bytes_elements(&self.data).ok_or_else(|| {
                Error::Encoding(format!("BYTES tensor '{}' has a truncated element", self.name))
            })?,
        };
        elements
            .into_iter()
            .enumerate()
            .map(|(i, element)| {
                (info.to_json)(element).ok_or_else(|| {
                    Error::Encoding(format!(
                        "element {i} of tensor '{}' cannot be represented as JSON",
                        self.name
                    ))
                })
            })
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if self.shape.is_empty() {
            return Err(Error::ShapeMismatch(format!(
                "tensor '{}' must have at least one dimension",
                self.name
            )));
        }
        if self.shape.contains(&0) {
            return Err(Error::ShapeMismatch(format!(
                "tensor '{}' has a zero dimension in shape {:?}",
                self.name, self.shape
            )));
        }
        let count = self
            .shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| {
                Error::ShapeMismatch(format!(
                    "shape {:?} of tensor '{}' overflows",
                    self.shape, self.name
                ))
            })?;

        match self.datatype.byte_size() {
            Some(size) => {
                let expected = count.checked_mul(size).ok_or_else(|| {
                    Error::ShapeMismatch(format!(
                        "shape {:?} of tensor '{}' overflows",
                        self.shape, self.name
                    ))
                })?;
                if self.data.len() != expected {
                    return Err(Error::ShapeMismatch(format!(
                        "tensor '{}' of shape {:?} and type {} needs {expected} bytes, got {}",
                        self.name,
                        self.shape,
                        self.datatype,
                        self.data.len()
                    )));
                }
            }
            None => {
                let elements = split_bytes_elements(&self.data).ok_or_else(|| {
                    Error::ShapeMismatch(format!(
                        "BYTES tensor '{}' has a truncated element",
                        self.name
                    ))
                })?;
                if elements.len() != count {
                    return Err(Error::ShapeMismatch(format!(
                        "BYTES tensor '{}' of shape {:?} needs {count} elements, got {}",
                        self.name,
                        self.shape,
                        elements.len()
                    )));
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TYPES: [DataType; 12] = [
        DataType::Bool,
        DataType::Uint8,
        DataType::Uint16,
        DataType::Uint32,
        DataType::Uint64,
        DataType::Int8,
        DataType::Int16,
        DataType::Int32,
        DataType::Int64,
        DataType::Fp32,
        DataType::Fp64,
        DataType::Bytes,
    ];

    #[test]
    fn table_rows_follow_variant_order() {
        for (i, info) in DATA_TYPES.iter().enumerate() {
            assert_eq!(info.datatype as usize, i, "row {i} is out of order");
        }
    }

    #[test]
    fn data_type_round_trip() {
        for dt in ALL_TYPES {
            let s = dt.as_str();
            assert_eq!(DataType::parse(s), Some(dt), "round-trip failed for {s}");
        }
    }

    #[test]
    fn data_type_unknown_is_unsupported() {
        assert!(DataType::parse("FP16").is_none());
        let err = "BF16".parse::<DataType>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedDType(_)));
    }

    #[test]
    fn data_type_sizes() {
        assert_eq!(DataType::Uint32.byte_size(), Some(4));
        assert_eq!(DataType::Fp32.byte_size(), Some(4));
        assert_eq!(DataType::Bool.byte_size(), Some(1));
        assert_eq!(DataType::Int64.byte_size(), Some(8));
        assert_eq!(DataType::Bytes.byte_size(), None);
    }

    #[test]
    fn from_slice_encodes_little_endian() {
        let t = TensorBuffer::from_slice("x", vec![1, 2], &[1u32, 256]).unwrap();
        assert_eq!(t.data().as_ref(), &[1, 0, 0, 0, 0, 1, 0, 0]);
        assert!(t.is_binary());
        assert_eq!(t.batch_size(), 1);
        assert_eq!(t.element_count(), 2);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let err = TensorBuffer::from_slice("x", vec![2, 3], &[1u32, 2, 3, 4, 5]).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
    }

    #[test]
    fn empty_shape_is_rejected() {
        let err = TensorBuffer::new("x", vec![], DataType::Uint8, vec![1u8]).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
    }

    #[test]
    fn zero_dimension_is_rejected() {
        let err = TensorBuffer::new("x", vec![1, 0], DataType::Uint8, Vec::<u8>::new()).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
    }

    #[test]
    fn bytes_tensor_round_trip() {
        let t = TensorBuffer::from_strings("text", vec![2], &["hello", "wörld"]).unwrap();
        assert_eq!(&t.data()[..4], &5u32.to_le_bytes());
        let items = t.to_strings().unwrap();
        assert_eq!(items, vec![b"hello".to_vec(), "wörld".as_bytes().to_vec()]);
    }

    #[test]
    fn bytes_tensor_count_mismatch() {
        let err = TensorBuffer::from_strings("text", vec![3], &["a", "b"]).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
    }

    #[test]
    fn bytes_tensor_truncated_prefix() {
        let raw = vec![5u8, 0, 0, 0, b'a', b'b'];
        let err = TensorBuffer::new("text", vec![1], DataType::Bytes, raw).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
    }

    #[test]
    fn to_vec_checks_element_type() {
        let t = TensorBuffer::from_slice("x", vec![2], &[1.5f32, -2.0]).unwrap();
        assert_eq!(t.to_vec::<f32>().unwrap(), vec![1.5, -2.0]);
        assert!(matches!(t.to_vec::<u32>(), Err(Error::UnsupportedDType(_))));
        assert!(matches!(t.to_strings(), Err(Error::UnsupportedDType(_))));
    }

    #[test]
    fn bool_tensor() {
        let t = TensorBuffer::from_slice("mask", vec![3], &[true, false, true]).unwrap();
        assert_eq!(t.data().as_ref(), &[1, 0, 1]);
        assert_eq!(t.to_vec::<bool>().unwrap(), vec![true, false, true]);
    }

    #[test]
    fn json_values_per_type() {
        let ids = TensorBuffer::from_slice("ids", vec![2], &[7u32, 9]).unwrap();
        assert_eq!(ids.json_values().unwrap(), vec![Value::from(7u32), Value::from(9u32)]);

        let mask = TensorBuffer::from_slice("mask", vec![2], &[true, false]).unwrap();
        assert_eq!(mask.json_values().unwrap(), vec![Value::Bool(true), Value::Bool(false)]);

        let text = TensorBuffer::from_strings("text", vec![1], &["hi"]).unwrap();
        assert_eq!(text.json_values().unwrap(), vec![Value::from("hi")]);
    }

    #[test]
    fn json_values_reject_non_utf8_bytes() {
        let t = TensorBuffer::from_strings("text", vec![1], &[[0xffu8, 0xfe]]).unwrap();
        assert!(matches!(t.json_values(), Err(Error::Encoding(_))));
    }

    #[test]
    fn from_json_values_round_trip() {
        let values = vec![Value::from(-1), Value::from(4)];
        let t = TensorBuffer::from_json_values("x".into(), vec![2], DataType::Int32, &values)
            .unwrap();
        assert_eq!(t.to_vec::<i32>().unwrap(), vec![-1, 4]);

        let floats = vec![Value::from(0.25), Value::from(1)];
        let t = TensorBuffer::from_json_values("f".into(), vec![2], DataType::Fp32, &floats)
            .unwrap();
        assert_eq!(t.to_vec::<f32>().unwrap(), vec![0.25, 1.0]);
    }

    #[test]
    fn from_json_values_rejects_out_of_range() {
        let values = vec![Value::from(-1)];
        let err = TensorBuffer::from_json_values("x".into(), vec![1], DataType::Uint32, &values)
            .unwrap_err();
        assert!(matches!(err, Error::Decoding(_)));
    }

    #[test]
    fn truncated_bytes_buffer_is_an_error() {
        // Bypasses validation to model a corrupt buffer.
        let t = TensorBuffer {
            name: "text".into(),
            shape: vec![1],
            datatype: DataType::Bytes,
            data: Bytes::from_static(&[5, 0, 0, 0, b'a']),
            binary_data: false,
        };
        assert!(matches!(t.to_strings(), Err(Error::Decoding(_))));
        assert!(matches!(t.json_values(), Err(Error::Encoding(_))));
    }
}
