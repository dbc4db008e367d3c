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

//! Cached service data held by a proxy.

use crate::proxy::ProxyError;
use crate::serialization::{DeserializationError, InStream};
use crate::service::{MessageId, MessageKind, ServiceInterface};
use serde::de::DeserializeOwned;
use std::any::Any;
use std::collections::{HashMap, HashSet};

/// Deserializes responses, attributes and broadcasts into the proxy's
/// cache.
///
/// Implementations usually match on the message id and read each
/// parameter from the stream in the order the stub wrote it. An id the
/// implementation does not know is a protocol error.
pub trait ProxyData: Send + 'static {
    /// Stores the payload of `msg_id`.
    ///
    /// # Errors
    ///
    /// Fails if the id is unknown or the payload does not decode.
    fn update_data(&mut self, msg_id: MessageId, stream: &mut InStream<'_>) -> Result<(), ProxyError>;

    /// Returns `self` for downcasting in
    /// [`ProxyBase::read_data`](crate::proxy::ProxyBase::read_data).
    fn as_any(&self) -> &dyn Any;
}

/// Keeps the raw payload of every notifiable message of an interface.
///
/// Useful when the application prefers to decode values on demand
/// instead of writing a typed [`ProxyData`].
#[derive(Debug, Clone, Default)]
pub struct PayloadCache {
    service: String,
    declared: HashSet<MessageId>,
    payloads: HashMap<MessageId, Vec<u8>>,
}

impl PayloadCache {
    /// Creates a cache for the responses, attributes and broadcasts of
    /// `interface`.
    pub fn new(interface: &ServiceInterface) -> Self {
        let declared = [MessageKind::Response, MessageKind::Attribute, MessageKind::Broadcast]
            .into_iter()
            .flat_map(|kind| interface.ids_of(kind))
            .collect();
        Self {
            service: interface.name().to_string(),
            declared,
            payloads: HashMap::new(),
        }
    }

    /// Returns the last payload received for `msg_id`.
    pub fn payload(&self, msg_id: MessageId) -> Option<&[u8]> {
        self.payloads.get(&msg_id).map(Vec::as_slice)
    }

    /// Decodes the first value of the last payload received for `msg_id`.
    pub fn get<T: DeserializeOwned>(&self, msg_id: MessageId) -> Option<Result<T, DeserializationError>> {
        self.payload(msg_id)
            .map(|payload| InStream::new(payload).read::<T>())
    }
}

impl ProxyData for PayloadCache {
    fn update_data(&mut self, msg_id: MessageId, stream: &mut InStream<'_>) -> Result<(), ProxyError> {
        if !self.declared.contains(&msg_id) {
            return Err(ProxyError::UnknownMessage {
                service: self.service.clone(),
                msg_id,
            });
        }
        self.payloads.insert(msg_id, stream.unread().to_vec());
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::OutStream;
    use crate::service::Version;

    #[test]
    fn test_payload_cache() {
        let interface = ServiceInterface::builder("Calc", Version::default())
            .request(10, Some(11))
            .response(11)
            .attribute(20)
            .build()
            .unwrap();
        let mut cache = PayloadCache::new(&interface);

        let payload = OutStream::single(&42i64).unwrap();
        cache
            .update_data(MessageId::new(11), &mut InStream::new(&payload))
            .unwrap();
        assert_eq!(cache.get::<i64>(MessageId::new(11)).unwrap().unwrap(), 42);
        assert!(cache.payload(MessageId::new(20)).is_none());

        let error = cache.update_data(MessageId::new(10), &mut InStream::new(&payload));
        assert!(matches!(error, Err(ProxyError::UnknownMessage { .. })));
    }
}
