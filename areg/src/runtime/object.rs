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

//! Runtime objects and casts.

use crate::runtime::RuntimeClassId;
use std::any::Any;

/// An object that can report its runtime class.
///
/// Implement it with [`runtime_object!`](crate::runtime_object) rather than
/// by hand. A type that embeds another runtime object (its base) reports
/// that field from [`runtime_base`](Self::runtime_base), which makes the
/// base class visible to [`is_instance_of`](Self::is_instance_of) and
/// [`runtime_cast`].
pub trait RuntimeObject: Any {
    /// Returns the class id of the concrete type.
    fn class_id(&self) -> &'static RuntimeClassId;

    /// Returns `self` as [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns `self` as a plain runtime object.
    fn as_runtime(&self) -> &dyn RuntimeObject;

    /// Returns the embedded base object, if any.
    fn runtime_base(&self) -> Option<&dyn RuntimeObject> {
        None
    }

    /// Returns the class name of the concrete type.
    fn class_name(&self) -> &'static str {
        self.class_id().name()
    }

    /// Checks whether this object is, or embeds, an instance of `class`.
    fn is_instance_of(&self, class: &RuntimeClassId) -> bool {
        if self.class_id() == class {
            return true;
        }
        match self.runtime_base() {
            Some(base) => base.is_instance_of(class),
            None => false,
        }
    }

    /// Checks whether this object is, or embeds, an instance of the class
    /// called `name`.
    fn is_instance_of_name(&self, name: &str) -> bool {
        if self.class_id().matches_name(name) {
            return true;
        }
        match self.runtime_base() {
            Some(base) => base.is_instance_of_name(name),
            None => false,
        }
    }
}

/// Static access to the class id of a runtime type.
pub trait RuntimeType: RuntimeObject + Sized {
    /// Returns the class id shared by every instance of the type.
    fn runtime_class() -> &'static RuntimeClassId;
}

/// Casts a runtime object to `T`.
///
/// Walks from the object through its chain of embedded bases and returns
/// the first one whose concrete type is `T`. Returns `None` when `T` is not
/// part of the chain.
pub fn runtime_cast<T: RuntimeType>(object: &dyn RuntimeObject) -> Option<&T> {
    if !object.is_instance_of(T::runtime_class()) {
        return None;
    }
    let mut current = Some(object);
    while let Some(candidate) = current {
        if let Some(found) = candidate.as_any().downcast_ref::<T>() {
            return Some(found);
        }
        current = candidate.runtime_base();
    }
    None
}

/// Finds the object in the chain whose class is called `name`.
pub fn runtime_cast_by_name<'a>(
    object: &'a dyn RuntimeObject,
    name: &str,
) -> Option<&'a dyn RuntimeObject> {
    let mut current = Some(object);
    while let Some(candidate) = current {
        if candidate.class_id().matches_name(name) {
            return Some(candidate);
        }
        current = candidate.runtime_base();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Shape {
        sides: u32,
    }
    crate::runtime_object!(Shape, "test::Shape");

    #[derive(Debug)]
    struct Square {
        shape: Shape,
        length: u32,
    }
    crate::runtime_object!(Square, "test::Square", base = shape);

    #[derive(Debug)]
    struct Tile {
        square: Square,
    }
    crate::runtime_object!(Tile, "test::Tile", base = square);

    #[derive(Debug)]
    struct Unrelated;
    crate::runtime_object!(Unrelated, "test::Unrelated");

    fn tile() -> Tile {
        Tile {
            square: Square {
                shape: Shape { sides: 4 },
                length: 3,
            },
        }
    }

    #[test]
    fn test_instance_checks_walk_bases() {
        let tile = tile();
        assert!(tile.is_instance_of(Tile::runtime_class()));
        assert!(tile.is_instance_of(Square::runtime_class()));
        assert!(tile.is_instance_of(Shape::runtime_class()));
        assert!(!tile.is_instance_of(Unrelated::runtime_class()));
        assert!(tile.is_instance_of_name("test::Shape"));
        assert!(!tile.is_instance_of_name("test::Circle"));
    }

    #[test]
    fn test_cast_to_base() {
        let tile = tile();
        let square = runtime_cast::<Square>(&tile).expect("square base");
        assert_eq!(square.length, 3);
        let shape = runtime_cast::<Shape>(&tile).expect("shape base");
        assert_eq!(shape.sides, 4);
    }

    #[test]
    fn test_cast_to_unrelated_returns_none() {
        let tile = tile();
        assert!(runtime_cast::<Unrelated>(&tile).is_none());
        assert!(runtime_cast::<Tile>(&Unrelated).is_none());
    }

    #[test]
    fn test_cast_by_name() {
        let tile = tile();
        let found = runtime_cast_by_name(&tile, "test::Square").expect("square");
        assert_eq!(found.class_name(), "test::Square");
        assert!(runtime_cast_by_name(&tile, "test::Circle").is_none());
    }
}
