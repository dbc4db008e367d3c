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

//! Components, their directory and the model loader.
//!
//! A [`Component`] binds the services it provides to one dispatcher
//! thread under a unique role name. Components are described by
//! [`ComponentEntry`] values and created by [`load_component`] (or a
//! [`ModelLoader`] for a whole list), which registers them in the
//! runtime's [`ComponentDirectory`] so they can be found by role name,
//! address or magic number from any thread.

mod component;
mod directory;
mod entry;
mod error;
mod loader;

pub use self::component::{Component, ComponentInfo};
pub use self::directory::ComponentDirectory;
pub use self::entry::{
    ComponentContext, ComponentDestroy, ComponentEntry, ComponentFactory, DependencyEntry,
    ServiceEntry, WorkerThreadEntry,
};
pub use self::error::ComponentError;
pub use self::loader::{LoadedModel, ModelLoader, load_component, unload_component};
