//! Typed handles for mesh elements.
//!
//! Vertices, half-edges and faces are addressed through distinct newtypes so
//! that a face index can never be used where a vertex is expected. The
//! handles wrap an integer chosen through [`MeshIndex`]; `u32` is the default.

use std::fmt::{self, Debug};
use std::hash::Hash;

/// Integer types usable as the storage of a mesh handle.
///
/// The largest value of each type is reserved as the "null" handle, which is
/// how boundary half-edges mark their missing face and isolated vertices mark
/// their missing outgoing half-edge.
pub trait MeshIndex:
    Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static
{
    /// Reserved null value.
    const INVALID: Self;

    /// Narrow a `usize` slot number into this type.
    fn from_usize(v: usize) -> Self;

    /// Widen back into a slot number.
    fn to_usize(self) -> usize;

    /// `false` for the reserved null value.
    #[inline]
    fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

macro_rules! impl_mesh_index {
    ($($ty:ty),*) => {
        $(
            impl MeshIndex for $ty {
                const INVALID: Self = <$ty>::MAX;

                #[inline]
                fn from_usize(v: usize) -> Self {
                    debug_assert!(
                        (v as u128) < (<$ty>::MAX as u128),
                        "slot {} does not fit in {}",
                        v,
                        stringify!($ty)
                    );
                    v as $ty
                }

                #[inline]
                fn to_usize(self) -> usize {
                    self as usize
                }
            }
        )*
    };
}

impl_mesh_index!(u16, u32, u64);

/// Handle to a vertex.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId<I: MeshIndex = u32>(I);

/// Handle to a half-edge.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct HalfEdgeId<I: MeshIndex = u32>(I);

/// Handle to a triangular face.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FaceId<I: MeshIndex = u32>(I);

macro_rules! impl_handle {
    ($name:ident, $tag:literal) => {
        impl<I: MeshIndex> $name<I> {
            /// Handle for storage slot `index`.
            #[inline]
            pub fn new(index: usize) -> Self {
                Self(I::from_usize(index))
            }

            /// The null handle.
            #[inline]
            pub fn invalid() -> Self {
                Self(I::INVALID)
            }

            /// Storage slot of this handle.
            #[inline]
            pub fn index(self) -> usize {
                self.0.to_usize()
            }

            /// `false` for the null handle.
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0.is_valid()
            }
        }

        impl<I: MeshIndex> Debug for $name<I> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", $tag, self.index())
                } else {
                    write!(f, "{}(null)", $tag)
                }
            }
        }

        impl<I: MeshIndex> Default for $name<I> {
            fn default() -> Self {
                Self::invalid()
            }
        }
    };
}

impl_handle!(VertexId, "V");
impl_handle!(HalfEdgeId, "HE");
impl_handle!(FaceId, "F");
