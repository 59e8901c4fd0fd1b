//! Partial-match resolution over a structure's declared members.
//!
//! Each criterion of a key matches independently: absent criteria match every
//! member, present criteria require exact equality. The first member in
//! declaration order that satisfies every present criterion wins.

use std::sync::Arc;

use tracing::debug;

use probe_core::{
    ConstructorInfo, ConstructorKey, FieldInfo, FieldKey, Member, MemberKind, MethodInfo,
    MethodKey, Modifiers, ProbeError, Result, Structure, StructureLoader, TypeRef,
};

/// Loads a structure by name, mapping a load failure to `StructureNotFound`.
pub fn load_type(loader: &dyn StructureLoader, name: &str, initialize: bool) -> Result<TypeRef> {
    loader
        .load(name, initialize)
        .map_err(|source| ProbeError::StructureNotFound {
            name: name.to_owned(),
            source,
        })
}

/// Returns the first declared field matching `key`.
pub fn find_field(structure: &dyn Structure, key: &FieldKey) -> Result<Arc<dyn FieldInfo>> {
    let found = structure.declared_fields().into_iter().find(|field| {
        key.name().map_or(true, |name| field.name() == name)
            && key.field_type().map_or(true, |ty| field.field_type() == ty)
            && modifiers_match(key.modifiers(), field.modifiers())
    });
    match found {
        Some(field) => {
            debug!(structure = structure.name(), field = field.name(), "Selected field");
            Ok(field)
        }
        None => Err(not_found(structure, MemberKind::Field, key.criteria())),
    }
}

/// Returns the first declared method matching `key`.
pub fn find_method(structure: &dyn Structure, key: &MethodKey) -> Result<Arc<dyn MethodInfo>> {
    let found = structure.declared_methods().into_iter().find(|method| {
        key.name().map_or(true, |name| method.name() == name)
            && key
                .parameter_types()
                .map_or(true, |params| method.parameter_types() == params)
            && key.return_type().map_or(true, |ty| method.return_type() == ty)
            && modifiers_match(key.modifiers(), method.modifiers())
    });
    match found {
        Some(method) => {
            debug!(structure = structure.name(), method = method.name(), "Selected method");
            Ok(method)
        }
        None => Err(not_found(structure, MemberKind::Method, key.criteria())),
    }
}

/// Returns the first declared constructor matching `key`.
///
/// A structure with exactly one constructor answers an unconstrained key
/// with that constructor directly.
pub fn find_constructor(
    structure: &dyn Structure,
    key: &ConstructorKey,
) -> Result<Arc<dyn ConstructorInfo>> {
    let mut constructors = structure.declared_constructors();
    if key.is_unconstrained() && constructors.len() == 1 {
        debug!(structure = structure.name(), "Selected sole constructor");
        return Ok(constructors.remove(0));
    }

    let found = constructors.into_iter().find(|ctor| {
        key.parameter_types()
            .map_or(true, |params| ctor.parameter_types() == params)
            && modifiers_match(key.modifiers(), ctor.modifiers())
    });
    match found {
        Some(ctor) => {
            debug!(
                structure = structure.name(),
                parameters = ctor.parameter_types().len(),
                "Selected constructor"
            );
            Ok(ctor)
        }
        None => Err(not_found(structure, MemberKind::Constructor, key.criteria())),
    }
}

/// Empty means "any"; otherwise the bitmasks must be identical.
fn modifiers_match(required: Modifiers, declared: Modifiers) -> bool {
    required.is_empty() || required == declared
}

fn not_found(structure: &dyn Structure, kind: MemberKind, criteria: String) -> ProbeError {
    ProbeError::MemberNotFound {
        structure: structure.name().to_owned(),
        kind,
        criteria,
    }
}
