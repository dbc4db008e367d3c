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

//! The pluggable serializer seam.

use crate::serialization::{DeserializationError, SerializationError};

/// Encodes and decodes single values.
///
/// [`OutStream`](crate::serialization::OutStream) and
/// [`InStream`](crate::serialization::InStream) call a serializer once per
/// value and take care of framing, so implementations only deal with one
/// value at a time.
///
/// ```rust
/// use areg::serialization::{PostcardSerializer, Serializer};
///
/// let serializer = PostcardSerializer::default();
/// let bytes = serializer.serialize(&(1u8, "two")).unwrap();
/// let (one, two): (u8, String) = serializer.deserialize(&bytes).unwrap();
/// assert_eq!((one, two.as_str()), (1, "two"));
/// ```
pub trait Serializer: Send + Sync + 'static {
    /// Encodes a value.
    ///
    /// # Errors
    ///
    /// Returns [`SerializationError`] if the value cannot be represented.
    fn serialize<T>(&self, value: &T) -> Result<Vec<u8>, SerializationError>
    where
        T: serde::Serialize + ?Sized;

    /// Decodes a value.
    ///
    /// # Errors
    ///
    /// Returns [`DeserializationError`] if the bytes do not hold a `T`.
    fn deserialize<T>(&self, bytes: &[u8]) -> Result<T, DeserializationError>
    where
        T: serde::de::DeserializeOwned;

    /// Returns a stable name for the format, used in logs.
    fn name(&self) -> &'static str;
}
