use crate::error::Error;
use crate::reflect::{MemberRef, MemberSetter, TypeRef};
use crate::types::Value;
use dashmap::DashMap;
use std::sync::Arc;

/// Read/write access to one member of one concrete receiver type.
pub struct PropertyAccessor {
    member: MemberRef,
    value_receiver: bool,
}

impl PropertyAccessor {
    pub fn member(&self) -> &MemberRef {
        &self.member
    }

    pub fn can_read(&self) -> bool {
        self.member.getter().is_some()
    }

    pub fn can_write(&self) -> bool {
        match self.member.setter() {
            Some(MemberSetter::Value(_)) => self.value_receiver,
            Some(MemberSetter::Reference(_)) => true,
            None => false,
        }
    }

    pub fn get(&self, receiver: &Value) -> Result<Value, Error> {
        if self.member.is_static() {
            return self.member.read(&Value::Null);
        }
        self.member.read(receiver)
    }

    pub fn set(&self, receiver: &mut Value, value: Value) -> Result<(), Error> {
        if !self.can_write() {
            return Err(Error::NotWritable(self.member.qualified_name()));
        }
        if self.member.is_static() {
            return self.member.write(&mut Value::Null, value);
        }
        self.member.write(receiver, value)
    }
}

pub struct AccessorCache {
    accessors: DashMap<(u64, u64), Arc<PropertyAccessor>>,
}

impl Default for AccessorCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessorCache {
    pub fn new() -> Self {
        Self { accessors: DashMap::new() }
    }

    /// Accessor for `member` on `receiver_type`. A member reached through a
    /// base type is re-resolved by name on the concrete type first.
    pub fn find(&self, member: &MemberRef, receiver_type: &TypeRef) -> Arc<PropertyAccessor> {
        self.accessors
            .entry((member.id(), receiver_type.id()))
            .or_insert_with(|| {
                let declared_here = member
                    .declaring_type()
                    .map(|t| t.id() == receiver_type.id())
                    .unwrap_or(false);
                let resolved = if declared_here || member.is_static() {
                    member.clone()
                } else {
                    receiver_type
                        .member(member.name())
                        .filter(|m| m.kind() == member.kind() && !m.is_static())
                        .unwrap_or_else(|| member.clone())
                };
                Arc::new(PropertyAccessor {
                    member: resolved,
                    value_receiver: receiver_type.is_value_type(),
                })
            })
            .clone()
    }

    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }
}

lazy_static::lazy_static! {
    static ref GLOBAL_ACCESSOR_CACHE: AccessorCache = AccessorCache::new();
}

pub fn find(member: &MemberRef, receiver_type: &TypeRef) -> Arc<PropertyAccessor> {
    GLOBAL_ACCESSOR_CACHE.find(member, receiver_type)
}
