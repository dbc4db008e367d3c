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

//! Service providers.
//!
//! A [`StubBase`] provides one [`ServiceInterface`](crate::service::ServiceInterface)
//! on behalf of a component. Requests reach the application through a
//! [`StubHandler`]; attribute updates and broadcasts go out through the
//! stub's methods and reach every subscribed proxy on its own thread.

mod base;
mod error;
mod handler;

pub use self::base::StubBase;
pub use self::error::StubError;
pub use self::handler::{RequestOutcome, StubContext, StubHandler};
