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

//! Runtime type identity.
//!
//! Every event and service object carries a [`RuntimeClassId`]: a readable
//! class name plus a 64-bit magic number derived from that name. Objects
//! expose their identity through the [`RuntimeObject`] trait, and
//! [`runtime_cast`] walks an object and its embedded bases to find a
//! concrete type without panicking when the types are unrelated.
//!
//! # Examples
//!
//! ```rust
//! use areg::runtime::{RuntimeObject, RuntimeType, runtime_cast};
//!
//! #[derive(Debug)]
//! struct Base {
//!     value: u32,
//! }
//! areg::runtime_object!(Base, "demo::Base");
//!
//! #[derive(Debug)]
//! struct Derived {
//!     base: Base,
//! }
//! areg::runtime_object!(Derived, "demo::Derived", base = base);
//!
//! let derived = Derived { base: Base { value: 7 } };
//! assert!(derived.is_instance_of(Base::runtime_class()));
//! assert_eq!(runtime_cast::<Base>(&derived).map(|b| b.value), Some(7));
//! ```

mod class_id;
mod object;

pub use self::class_id::RuntimeClassId;
pub use self::object::{RuntimeObject, RuntimeType, runtime_cast, runtime_cast_by_name};

/// Implements [`RuntimeObject`] and [`RuntimeType`] for a concrete type.
///
/// The class id is a `static` built at compile time from the given name.
/// The optional `base = field` form names an embedded field whose type is
/// itself a runtime object; type checks and casts then walk into it.
#[macro_export]
macro_rules! runtime_object {
    ($ty:ty, $name:expr) => {
        $crate::runtime_object!(@impl $ty, $name, |_this| ::core::option::Option::None);
    };
    ($ty:ty, $name:expr, base = $field:ident) => {
        $crate::runtime_object!(@impl $ty, $name, |this| ::core::option::Option::Some(
            &this.$field as &dyn $crate::runtime::RuntimeObject
        ));
    };
    (@impl $ty:ty, $name:expr, |$this:ident| $base:expr) => {
        impl $crate::runtime::RuntimeType for $ty {
            fn runtime_class() -> &'static $crate::runtime::RuntimeClassId {
                static CLASS_ID: $crate::runtime::RuntimeClassId =
                    $crate::runtime::RuntimeClassId::new($name);
                &CLASS_ID
            }
        }

        impl $crate::runtime::RuntimeObject for $ty {
            fn class_id(&self) -> &'static $crate::runtime::RuntimeClassId {
                <Self as $crate::runtime::RuntimeType>::runtime_class()
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn as_runtime(&self) -> &dyn $crate::runtime::RuntimeObject {
                self
            }

            fn runtime_base(&self) -> ::core::option::Option<&dyn $crate::runtime::RuntimeObject> {
                let $this = self;
                $base
            }
        }
    };
}
