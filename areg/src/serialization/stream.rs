//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Framed payload streams.
//!
//! Request arguments, responses and attribute values travel as a payload
//! holding a sequence of values. Each value is encoded by a [`Serializer`]
//! and prefixed with its length:
//!
//! ```text
//! +------------------+-------------------+------------------+-----
//! | Length (4 bytes) | Value (N bytes)   | Length (4 bytes) | ...
//! +------------------+-------------------+------------------+-----
//! ```
//!
//! The length is a big-endian `u32`. Values are read back in the order
//! they were written.

use crate::serialization::{
    DeserializationError, PostcardSerializer, SerializationError, Serializer,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

const LENGTH_PREFIX: usize = 4;

/// Writes values into a payload.
///
/// # Examples
///
/// ```rust
/// use areg::serialization::{InStream, OutStream};
///
/// let mut out = OutStream::new();
/// out.write(&40i32).unwrap().write(&2i32).unwrap();
/// let payload = out.into_bytes();
///
/// let mut input = InStream::new(&payload);
/// let sum = input.read::<i32>().unwrap() + input.read::<i32>().unwrap();
/// assert_eq!(sum, 42);
/// assert!(input.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct OutStream<S: Serializer = PostcardSerializer> {
    serializer: S,
    buffer: Vec<u8>,
}

impl OutStream<PostcardSerializer> {
    /// Creates an empty postcard stream.
    pub fn new() -> Self {
        Self::with_serializer(PostcardSerializer::default())
    }

    /// Encodes a single value into a payload.
    pub fn single<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, SerializationError> {
        let mut stream = Self::new();
        stream.write(value)?;
        Ok(stream.into_bytes())
    }
}

impl<S: Serializer> OutStream<S> {
    /// Creates an empty stream using `serializer`.
    pub fn with_serializer(serializer: S) -> Self {
        Self {
            serializer,
            buffer: Vec::new(),
        }
    }

    /// Appends a value.
    ///
    /// # Errors
    ///
    /// Fails if the serializer rejects the value or it does not fit in a
    /// 32-bit length.
    pub fn write<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> Result<&mut Self, SerializationError> {
        let bytes = self.serializer.serialize(value)?;
        let len = u32::try_from(bytes.len()).map_err(|_| {
            SerializationError::new(format!("value of {} bytes is too large", bytes.len()))
        })?;
        self.buffer.reserve(LENGTH_PREFIX + bytes.len());
        self.buffer.extend_from_slice(&len.to_be_bytes());
        self.buffer.extend_from_slice(&bytes);
        Ok(self)
    }

    /// Returns the payload written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Returns the number of payload bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns `true` if nothing was written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Consumes the stream and returns the payload.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

/// Reads values from a payload written by an [`OutStream`].
#[derive(Debug, Clone)]
pub struct InStream<'a, S: Serializer = PostcardSerializer> {
    serializer: S,
    data: &'a [u8],
    position: usize,
}

impl<'a> InStream<'a, PostcardSerializer> {
    /// Opens a postcard payload.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_serializer(data, PostcardSerializer::default())
    }
}

impl<'a, S: Serializer> InStream<'a, S> {
    /// Opens a payload using `serializer`.
    pub fn with_serializer(data: &'a [u8], serializer: S) -> Self {
        Self {
            serializer,
            data,
            position: 0,
        }
    }

    /// Reads the next value.
    ///
    /// # Errors
    ///
    /// Fails if the payload ends early or the value does not decode as `T`.
    /// The read position is left unchanged on failure.
    pub fn read<T: DeserializeOwned>(&mut self) -> Result<T, DeserializationError> {
        let rest = &self.data[self.position..];
        if rest.len() < LENGTH_PREFIX {
            return Err(DeserializationError::truncated(LENGTH_PREFIX, rest.len()));
        }
        let (prefix, rest) = rest.split_at(LENGTH_PREFIX);
        let mut length = [0u8; LENGTH_PREFIX];
        length.copy_from_slice(prefix);
        let length = u32::from_be_bytes(length) as usize;
        if rest.len() < length {
            return Err(DeserializationError::truncated(length, rest.len()));
        }
        let value = self.serializer.deserialize(&rest[..length])?;
        self.position += LENGTH_PREFIX + length;
        Ok(value)
    }

    /// Returns the unread part of the payload.
    pub fn unread(&self) -> &'a [u8] {
        &self.data[self.position..]
    }

    /// Returns the number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Returns `true` once every value was read.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::JsonSerializer;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn test_values_read_in_write_order() {
        let mut out = OutStream::new();
        out.write(&7u8)
            .unwrap()
            .write("label")
            .unwrap()
            .write(&Point { x: 1, y: -1 })
            .unwrap();
        let payload = out.into_bytes();

        let mut input = InStream::new(&payload);
        assert_eq!(input.read::<u8>().unwrap(), 7);
        assert_eq!(input.read::<String>().unwrap(), "label");
        assert_eq!(input.read::<Point>().unwrap(), Point { x: 1, y: -1 });
        assert!(input.is_empty());
    }

    #[test]
    fn test_frame_layout() {
        let payload = OutStream::single(&5u8).unwrap();
        assert_eq!(payload, vec![0, 0, 0, 1, 5]);
    }

    #[test]
    fn test_truncated_payload() {
        let payload = OutStream::single(&"hello").unwrap();
        let mut input = InStream::new(&payload[..payload.len() - 1]);
        let error = input.read::<String>().unwrap_err();
        assert!(error.to_string().contains("truncated"));
        assert_eq!(input.remaining(), payload.len() - 1);

        let mut empty = InStream::new(&[]);
        assert!(empty.read::<u8>().is_err());
    }

    #[test]
    fn test_failed_read_keeps_position() {
        let payload = OutStream::single(&"text").unwrap();
        let mut input = InStream::new(&payload);
        assert!(input.read::<Vec<String>>().is_err());
        assert_eq!(input.read::<String>().unwrap(), "text");
    }

    #[test]
    fn test_json_stream() {
        let mut out = OutStream::with_serializer(JsonSerializer::new());
        out.write(&Point { x: 3, y: 4 }).unwrap();
        assert!(!out.is_empty());
        let payload = out.into_bytes();
        assert_eq!(&payload[4..], br#"{"x":3,"y":4}"#);

        let mut input = InStream::with_serializer(&payload, JsonSerializer::new());
        assert_eq!(input.read::<Point>().unwrap(), Point { x: 3, y: 4 });
    }
}
