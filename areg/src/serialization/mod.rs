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

//! Payload serialization.
//!
//! Everything that crosses a dispatcher thread boundary between a proxy
//! and a stub travels as a byte payload. Payloads are written with an
//! [`OutStream`] and read back with an [`InStream`], which frame each value
//! and delegate the encoding of the value to a [`Serializer`]:
//!
//! - [`PostcardSerializer`]: compact binary, the default
//! - [`JsonSerializer`]: readable, for debugging
//!
//! Payloads stay inside the process, so the format is not a wire contract.

mod error;
mod json;
mod postcard;
mod stream;
mod traits;

pub use self::error::{DeserializationError, SerializationError};
pub use self::json::JsonSerializer;
pub use self::postcard::PostcardSerializer;
pub use self::stream::{InStream, OutStream};
pub use self::traits::Serializer;
