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

//! Postcard serializer, the default payload format.

use crate::serialization::{DeserializationError, SerializationError, Serializer};

/// Compact binary serializer based on `postcard`.
///
/// An optional size limit rejects oversized values on both sides.
#[derive(Clone, Debug, Default)]
pub struct PostcardSerializer {
    max_size: Option<usize>,
}

impl PostcardSerializer {
    /// Creates a serializer without a size limit.
    pub fn new() -> Self {
        Self { max_size: None }
    }

    /// Rejects values larger than `max_size` bytes.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    fn check_size(&self, len: usize) -> Result<(), String> {
        match self.max_size {
            Some(max) if len > max => Err(format!(
                "value of {len} bytes exceeds the limit of {max} bytes"
            )),
            _ => Ok(()),
        }
    }
}

impl Serializer for PostcardSerializer {
    fn serialize<T>(&self, value: &T) -> Result<Vec<u8>, SerializationError>
    where
        T: serde::Serialize + ?Sized,
    {
        let bytes = postcard::to_allocvec(value)?;
        self.check_size(bytes.len()).map_err(SerializationError::new)?;
        Ok(bytes)
    }

    fn deserialize<T>(&self, bytes: &[u8]) -> Result<T, DeserializationError>
    where
        T: serde::de::DeserializeOwned,
    {
        self.check_size(bytes.len())
            .map_err(DeserializationError::new)?;
        Ok(postcard::from_bytes(bytes)?)
    }

    fn name(&self) -> &'static str {
        "postcard"
    }
}
