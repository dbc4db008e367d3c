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

//! Application side of a stub.

use crate::serialization::{InStream, OutStream};
use crate::service::{MessageId, ProxyAddress, ResultType, SequenceNr};
use crate::stub::StubBase;
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

/// What a handler did with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Answer now with this payload.
    Respond(Vec<u8>),
    /// The answer comes later through [`StubBase::respond`].
    Deferred,
    /// Handled, and nothing further is sent. Meant for requests without a
    /// response; a request that declares one is answered with
    /// `RequestError` so the caller is not left waiting.
    Done,
    /// Refuse the request with a failure result.
    Failed(ResultType),
}

impl RequestOutcome {
    /// Answers with a single serialized value. A value that cannot be
    /// serialized fails the request with `RequestError`.
    pub fn respond_with<T: Serialize + ?Sized>(value: &T) -> Self {
        match OutStream::single(value) {
            Ok(payload) => Self::Respond(payload),
            Err(e) => {
                error!(error = %e, "failed to serialize response");
                Self::Failed(ResultType::RequestError)
            }
        }
    }
}

/// The request being processed.
#[derive(Debug)]
pub struct StubContext<'a> {
    stub: &'a Arc<StubBase>,
    source: &'a ProxyAddress,
    sequence: SequenceNr,
}

impl<'a> StubContext<'a> {
    pub(crate) fn new(stub: &'a Arc<StubBase>, source: &'a ProxyAddress, sequence: SequenceNr) -> Self {
        Self {
            stub,
            source,
            sequence,
        }
    }

    /// Returns the stub processing the request.
    pub fn stub(&self) -> &'a Arc<StubBase> {
        self.stub
    }

    /// Returns the requesting proxy.
    pub fn source(&self) -> &'a ProxyAddress {
        self.source
    }

    /// Returns the sequence number of the request.
    pub fn sequence(&self) -> SequenceNr {
        self.sequence
    }
}

/// Implements a service.
///
/// Every method runs on the dispatcher thread of the component providing
/// the service.
pub trait StubHandler: Send + Sync {
    /// Processes one request. Arguments are read from `stream` in the order
    /// the proxy wrote them.
    fn process_request(
        &self,
        ctx: &StubContext<'_>,
        request_id: MessageId,
        stream: &mut InStream<'_>,
    ) -> RequestOutcome;

    /// Called once the stub is started.
    fn startup(&self, stub: &Arc<StubBase>) {
        let _ = stub;
    }

    /// Called when the stub shuts down, before clients are disconnected.
    fn shutdown(&self, stub: &Arc<StubBase>) {
        let _ = stub;
    }

    /// Called when a proxy connects or disconnects.
    fn client_connected(&self, stub: &Arc<StubBase>, proxy: &ProxyAddress, connected: bool) {
        let _ = (stub, proxy, connected);
    }
}
