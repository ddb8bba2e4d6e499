// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Decorators
//!
//! A decorator bundles the keys of one domain concept. Its factory resolves
//! the keys once per file; views then read and write them on one node (or
//! node set) at one frame.
//!
//! Every decorator comes in two flavours:
//! - `XFactory` creates missing categories and keys and hands out
//!   read-write `X` views.
//! - `XConstFactory` only looks keys up. If any is missing, `get_is` is
//!   false everywhere. It hands out read-only `XConst` views.
//!
//! ```text
//! let particles = ParticleFactory::new(&file)?;
//! let p = particles.get(&node, Some(frame))?;
//! p.set_radius(1.5)?;
//! ```

/// Generate the factories and views of one decorator
macro_rules! decorator {
    (@tag $file:ident, $category:ident) => {
        None
    };
    (@tag $file:ident, $category:ident, $name:literal, $value:literal) => {
        Some(($file.get_key_always::<u32>($category, $name, false)?, $value))
    };
    (@find_tag $file:ident, $category:ident) => {
        None
    };
    (@find_tag $file:ident, $category:ident, $name:literal, $value:literal) => {
        match $file.get_key::<u32>($category, $name, false)? {
            Some(key) => Some((key, $value)),
            None => return Ok(None),
        }
    };
    (
        $(#[$doc:meta])*
        $view:ident / $const_view:ident on $object:ty {
            factory: $factory:ident / $const_factory:ident,
            arity: $arity:ident,
            category: $category:literal,
            $(tag: $tag_name:literal = $tag_value:literal,)?
            keys: {
                $($field:ident / $setter:ident : $ty:ty = $name:literal, $per_frame:literal;)*
            }
        }
    ) => {
        $(#[$doc])*
        #[derive(Clone, Debug)]
        pub struct $view {
            object: $object,
            frame: Option<u32>,
            keys: $factory,
        }

        impl $view {
            pub fn object(&self) -> &$object {
                &self.object
            }

            pub fn frame(&self) -> Option<u32> {
                self.frame
            }

            $(
                pub fn $field(&self) -> $crate::error::RmfResult<$ty> {
                    self.object.get_value(self.keys.$field, self.frame)
                }

                pub fn $setter(&self, value: $ty) -> $crate::error::RmfResult<()> {
                    self.object.set_value(self.keys.$field, self.frame, value)
                }
            )*
        }

        $(#[$doc])*
        #[derive(Clone, Debug)]
        pub struct $const_view {
            object: $object,
            frame: Option<u32>,
            keys: $factory,
        }

        impl $const_view {
            pub fn object(&self) -> &$object {
                &self.object
            }

            pub fn frame(&self) -> Option<u32> {
                self.frame
            }

            $(
                pub fn $field(&self) -> $crate::error::RmfResult<$ty> {
                    self.object.get_value(self.keys.$field, self.frame)
                }
            )*
        }

        #[derive(Clone, Debug)]
        pub struct $factory {
            $($field: $crate::keys::Key<$ty>,)*
            tag: Option<($crate::keys::Key<u32>, u32)>,
        }

        impl $factory {
            pub fn new(file: &$crate::file::FileHandle) -> $crate::error::RmfResult<Self> {
                let category =
                    file.get_category_always($crate::keys::Arity::$arity, $category)?;
                let tag = decorator!(@tag file, category $(, $tag_name, $tag_value)?);
                Ok(Self {
                    $($field: file.get_key_always::<$ty>(category, $name, $per_frame)?,)*
                    tag,
                })
            }

            /// View of `object`, marking it with the type tag if there is one
            pub fn get(
                &self,
                object: &$object,
                frame: Option<u32>,
            ) -> $crate::error::RmfResult<$view> {
                if let Some((key, value)) = self.tag {
                    if object.get_value_always(key, None)? != value {
                        object.set_value(key, None, value)?;
                    }
                }
                Ok($view {
                    object: object.clone(),
                    frame,
                    keys: self.clone(),
                })
            }

            /// True if every key of the bundle has a value for `object`
            pub fn get_is(
                &self,
                object: &$object,
                frame: Option<u32>,
            ) -> $crate::error::RmfResult<bool> {
                if let Some((key, value)) = self.tag {
                    if object.get_value_always(key, None)? != value {
                        return Ok(false);
                    }
                }
                $(
                    if !object.get_has_value(self.$field, frame)? {
                        return Ok(false);
                    }
                )*
                Ok(true)
            }
        }

        #[derive(Clone, Debug)]
        pub struct $const_factory {
            keys: Option<$factory>,
        }

        impl $const_factory {
            pub fn new(file: &$crate::file::FileHandle) -> $crate::error::RmfResult<Self> {
                Ok(Self {
                    keys: Self::lookup(file)?,
                })
            }

            fn lookup(
                file: &$crate::file::FileHandle,
            ) -> $crate::error::RmfResult<Option<$factory>> {
                let Some(category) = file.get_category($crate::keys::Arity::$arity, $category)?
                else {
                    return Ok(None);
                };
                let tag = decorator!(@find_tag file, category $(, $tag_name, $tag_value)?);
                $(
                    let Some($field) = file.get_key::<$ty>(category, $name, $per_frame)? else {
                        return Ok(None);
                    };
                )*
                Ok(Some($factory { $($field,)* tag }))
            }

            pub fn get_is(
                &self,
                object: &$object,
                frame: Option<u32>,
            ) -> $crate::error::RmfResult<bool> {
                match &self.keys {
                    Some(keys) => keys.get_is(object, frame),
                    None => Ok(false),
                }
            }

            /// Read-only view; checked builds reject objects that are not decorated
            pub fn get(
                &self,
                object: &$object,
                frame: Option<u32>,
            ) -> $crate::error::RmfResult<$const_view> {
                let Some(keys) = &self.keys else {
                    return Err($crate::error::RmfError::Usage(format!(
                        "File has no {} keys",
                        stringify!($view)
                    )));
                };
                #[cfg(debug_assertions)]
                if !keys.get_is(object, frame)? {
                    return Err($crate::error::RmfError::Usage(format!(
                        "{:?} is not a {}",
                        object,
                        stringify!($view)
                    )));
                }
                Ok($const_view {
                    object: object.clone(),
                    frame,
                    keys: keys.clone(),
                })
            }
        }
    };
}

mod feature;
mod physics;
mod publication;
mod sequence;
mod shape;

pub use feature::{Score, ScoreConst, ScoreConstFactory, ScoreFactory};
pub use physics::{
    Bond, BondConst, BondConstFactory, BondFactory, Particle, ParticleConst,
    ParticleConstFactory, ParticleFactory, RigidParticle, RigidParticleConst,
    RigidParticleConstFactory, RigidParticleFactory,
};
pub use publication::{
    JournalArticle, JournalArticleConst, JournalArticleConstFactory, JournalArticleFactory,
};
pub use sequence::{Residue, ResidueConst, ResidueConstFactory, ResidueFactory};
pub use shape::{
    Ball, BallConst, BallConstFactory, BallFactory, Colored, ColoredConst, ColoredConstFactory,
    ColoredFactory, Cylinder, CylinderConst, CylinderConstFactory, CylinderFactory, Segment,
    SegmentConst, SegmentConstFactory, SegmentFactory,
};
