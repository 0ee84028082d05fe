//! Type System for annotated Squirrel
//!
//! A closed set of type variants and the assignability judgment between
//! them. Types are immutable values; class types are shared through `Arc`
//! so base chains can be reused by any number of analyses.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    Int,
    Float,
    String,
    Bool,
    Char,
}

impl PrimitiveType {
    /// Name as written in annotations
    pub fn name(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Bool => "bool",
            Self::Char => "char",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "string" => Some(Self::String),
            "bool" => Some(Self::Bool),
            "char" => Some(Self::Char),
            _ => None,
        }
    }
}

/// A nominal class type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassType {
    pub name: String,
    pub members: BTreeMap<String, Type>,
    pub base: Option<Arc<ClassType>>,
}

impl ClassType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: BTreeMap::new(),
            base: None,
        }
    }

    pub fn with_base(mut self, base: Arc<ClassType>) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_member(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.members.insert(name.into(), ty);
        self
    }

    /// Iterate over this class followed by its ancestors
    pub fn ancestry(&self) -> impl Iterator<Item = &ClassType> {
        std::iter::successors(Some(self), |c| c.base.as_deref())
    }

    /// Check whether `name` appears in this class's base chain (self included)
    pub fn inherits_from(&self, name: &str) -> bool {
        self.ancestry().any(|c| c.name == name)
    }

    /// Look up a member on this class or the nearest ancestor declaring it
    pub fn member(&self, name: &str) -> Option<&Type> {
        self.ancestry().find_map(|c| c.members.get(name))
    }
}

/// A set of member types. Structurally equal members collapse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnionType {
    members: BTreeSet<Type>,
}

impl UnionType {
    pub fn iter(&self) -> impl Iterator<Item = &Type> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, ty: &Type) -> bool {
        self.members.contains(ty)
    }

    /// The union with `ty` removed, in canonical form
    pub fn without(&self, ty: &Type) -> Type {
        Type::union(self.members.iter().filter(|m| *m != ty).cloned())
    }
}

/// A type in the lattice
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Type {
    Primitive(PrimitiveType),
    Null,
    /// Assignable to and from everything
    Any,
    Function { params: Vec<Type>, ret: Box<Type> },
    Array(Box<Type>),
    /// Fixed key/value pair, not a record
    Table { key: Box<Type>, value: Box<Type> },
    Class(Arc<ClassType>),
    Union(UnionType),
    /// `T | null`
    Optional(Box<Type>),
}

impl Type {
    // Constants for common types
    pub const INT: Self = Self::Primitive(PrimitiveType::Int);
    pub const FLOAT: Self = Self::Primitive(PrimitiveType::Float);
    pub const STRING: Self = Self::Primitive(PrimitiveType::String);
    pub const BOOL: Self = Self::Primitive(PrimitiveType::Bool);
    pub const CHAR: Self = Self::Primitive(PrimitiveType::Char);
    pub const NULL: Self = Self::Null;
    pub const ANY: Self = Self::Any;

    pub fn function(params: Vec<Type>, ret: Type) -> Self {
        Self::Function { params, ret: Box::new(ret) }
    }

    pub fn array(elem: Type) -> Self {
        Self::Array(Box::new(elem))
    }

    pub fn table(key: Type, value: Type) -> Self {
        Self::Table { key: Box::new(key), value: Box::new(value) }
    }

    pub fn class(class: ClassType) -> Self {
        Self::Class(Arc::new(class))
    }

    pub fn optional(inner: Type) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Build a union. Duplicates collapse; a single remaining member is
    /// returned as itself.
    pub fn union(members: impl IntoIterator<Item = Type>) -> Self {
        let mut members: BTreeSet<Type> = members.into_iter().collect();
        if members.len() == 1 {
            if let Some(only) = members.pop_first() {
                return only;
            }
        }
        Self::Union(UnionType { members })
    }

    /// Check if a value of this type can be used where `other` is expected
    pub fn is_assignable_to(&self, other: &Type) -> bool {
        if self == other || matches!(other, Type::Any) {
            return true;
        }

        match (self, other) {
            (Type::Any, _) => true,

            (Type::Null, target) => matches!(target, Type::Null | Type::Optional(_)),

            (
                Type::Function { params, ret },
                Type::Function { params: other_params, ret: other_ret },
            ) => {
                params.len() == other_params.len()
                    // Parameters are contravariant
                    && params
                        .iter()
                        .zip(other_params)
                        .all(|(mine, theirs)| theirs.is_assignable_to(mine))
                    // Return type is covariant
                    && ret.is_assignable_to(other_ret)
            }

            (Type::Array(elem), Type::Array(other_elem)) => elem.is_assignable_to(other_elem),

            (
                Type::Table { key, value },
                Type::Table { key: other_key, value: other_value },
            ) => {
                let mine = [key.as_ref(), value.as_ref()];
                let theirs = [other_key.as_ref(), other_value.as_ref()];
                theirs
                    .iter()
                    .enumerate()
                    .all(|(i, slot)| mine.contains(slot) && mine[i].is_assignable_to(slot))
            }

            (Type::Class(class), Type::Class(target)) => class.inherits_from(&target.name),

            (Type::Union(members), Type::Union(targets)) => members
                .iter()
                .all(|t| targets.iter().any(|target| t.is_assignable_to(target))),

            (Type::Union(members), _) => members.iter().all(|t| t.is_assignable_to(other)),

            (Type::Optional(inner), Type::Optional(other_inner)) => {
                inner.is_assignable_to(other_inner)
            }

            (Type::Optional(inner), Type::Union(targets)) if targets.contains(&Type::Null) => {
                inner.is_assignable_to(&targets.without(&Type::Null))
            }

            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(p) => write!(f, "{}", p.name()),
            Type::Null => write!(f, "null"),
            Type::Any => write!(f, "any"),
            Type::Function { params, ret } => {
                let params: Vec<String> = params.iter().map(|p| p.to_string()).collect();
                write!(f, "({}) -> {}", params.join(", "), ret)
            }
            Type::Array(elem) => write!(f, "array<{}>", elem),
            Type::Table { key, value } => write!(f, "table<{}, {}>", key, value),
            Type::Class(class) => write!(f, "{}", class.name),
            Type::Union(members) => {
                // Display order only; equality is over the member set
                let mut names: Vec<String> = members.iter().map(|m| m.to_string()).collect();
                names.sort();
                write!(f, "{}", names.join(" | "))
            }
            Type::Optional(inner) => write!(f, "{}?", inner),
        }
    }
}
