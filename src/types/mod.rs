//! Type model: the type lattice and annotation resolution

mod type_system;
pub mod annotation;

pub use type_system::{ClassType, PrimitiveType, Type, UnionType};
pub use annotation::{parse_annotation, Resolution, TypeExpr, TypeResolver, VARARGS_MARKER};
