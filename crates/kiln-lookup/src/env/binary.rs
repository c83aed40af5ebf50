//! Binary types and their lazy completion
//!
//! A binary type is created from its descriptor with nothing but its name,
//! modifiers and type variables resolved. Supertypes, member types and
//! fields/methods are built on first access; each step is guarded by an
//! `UNRESOLVED_*` state bit that is cleared exactly once.

use super::LookupEnvironment;
use crate::binding::{
    ClassBinding, ClassKind, ClassOrigin, FieldBinding, MethodBinding, MethodId, MethodOrigin, Modifiers,
    TypeBinding, TypeId, TypeState, TypeVariableBinding, TypeVariableOwner, WildcardKind,
};
use crate::error::{LookupResult, ProblemReason, SignatureError};
use crate::names::CompoundName;
use crate::provider::BinaryTypeDescriptor;
use crate::reporter::ProblemId;
use crate::signature::{
    parse_class_signature, parse_field_signature, parse_method_signature, ClassSignature, ClassTypeSig,
    TypeArgSig, TypeParameterSig, TypeSig,
};
use tracing::trace;

/// Type variables visible while decoding a signature, innermost last
#[derive(Debug, Clone, Default)]
pub(crate) struct SignatureContext {
    type_variables: Vec<(String, TypeId)>,
}

impl SignatureContext {
    fn lookup(&self, name: &str) -> Option<TypeId> {
        self.type_variables
            .iter()
            .rev()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, id)| *id)
    }

    fn extend(&mut self, names: &[TypeParameterSig], ids: &[TypeId]) {
        self.type_variables
            .extend(names.iter().map(|p| p.name.clone()).zip(ids.iter().copied()));
    }
}

impl LookupEnvironment {
    /// Build the binding of a compiled type (or return the existing one)
    pub fn create_binary_type(&mut self, descriptor: BinaryTypeDescriptor) -> LookupResult<TypeId> {
        let compound_name = descriptor.compound_name();
        let package = self.create_package(&compound_name.parent());
        let simple = compound_name.last().unwrap_or_default().to_string();
        if let Some(existing) = self.packages[package.index()].known_type(&simple) {
            if self.class(existing).is_some() {
                return Ok(existing);
            }
        }

        let source_name = match &descriptor.enclosing_type_name {
            Some(_) => simple.rsplit('$').next().unwrap_or(&simple).to_string(),
            None => simple.clone(),
        };
        let enclosing = descriptor
            .enclosing_type_name
            .as_ref()
            .map(|name| self.type_or_placeholder(&CompoundName::from_internal(name)));

        let mut state = TypeState::UNRESOLVED_SUPERCLASS
            | TypeState::UNRESOLVED_SUPERINTERFACES
            | TypeState::UNRESOLVED_MEMBERS
            | TypeState::BEGIN_HIERARCHY_CHECK
            | TypeState::END_HIERARCHY_CHECK
            | TypeState::FIELDS_AND_METHODS_BUILT
            | TypeState::TYPE_VARIABLES_CONNECTED;
        if !descriptor.member_type_names.is_empty() {
            state |= TypeState::UNRESOLVED_MEMBER_TYPES;
        }

        let id = self.alloc_type(TypeBinding::Class(ClassBinding {
            compound_name: compound_name.clone(),
            source_name,
            package,
            modifiers: descriptor.modifiers,
            kind: ClassKind::from_modifiers(descriptor.modifiers),
            origin: ClassOrigin::Binary,
            enclosing,
            type_variables: Vec::new(),
            state,
            superclass: None,
            super_interfaces: Vec::new(),
            member_types: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            scope: None,
            binary: None,
        }));
        if let Some(enclosing) = enclosing {
            self.note_referrers(id, &[enclosing]);
        }
        self.register_type(package, &simple, id);
        trace!(ty = %id, name = %compound_name, "created binary type");

        let mut descriptor = descriptor;
        if self.options().generics_enabled() {
            if let Some(signature) = descriptor.generic_signature.clone() {
                match parse_class_signature(&signature) {
                    Ok(parsed) => self.connect_binary_type_variables(id, &parsed)?,
                    Err(error) => {
                        self.report_corrupted(&compound_name, &error);
                        descriptor.generic_signature = None;
                    }
                }
            }
        } else {
            descriptor.generic_signature = None;
        }
        if let Some(class) = self.class_mut(id) {
            class.binary = Some(Box::new(descriptor));
        }
        Ok(id)
    }

    fn report_corrupted(&mut self, name: &CompoundName, error: &SignatureError) {
        self.report(ProblemId::CorruptedSignature, vec![name.dotted(), error.to_string()]);
    }

    fn connect_binary_type_variables(&mut self, ty: TypeId, signature: &ClassSignature) -> LookupResult<()> {
        let names: Vec<String> = signature.type_parameters.iter().map(|p| p.name.clone()).collect();
        let variables = self.create_type_variables(&names, TypeVariableOwner::Type(ty));
        if let Some(class) = self.class_mut(ty) {
            class.type_variables = variables.clone();
        }
        let context = self.signature_context(ty)?;
        self.bind_signature_bounds(&signature.type_parameters, &variables, &context)
    }

    fn bind_signature_bounds(
        &mut self,
        parameters: &[TypeParameterSig],
        variables: &[TypeId],
        context: &SignatureContext,
    ) -> LookupResult<()> {
        for (parameter, &variable) in parameters.iter().zip(variables) {
            let class_bound = match &parameter.class_bound {
                Some(bound) => Some(self.type_from_signature(bound, context)?),
                None => None,
            };
            let mut interfaces = Vec::with_capacity(parameter.interface_bounds.len());
            for bound in &parameter.interface_bounds {
                interfaces.push(self.type_from_signature(bound, context)?);
            }
            self.set_type_variable_bounds(variable, class_bound, interfaces)?;
        }
        Ok(())
    }

    /// Allocate unbounded type variables for a declaration
    pub(crate) fn create_type_variables(&mut self, names: &[String], owner: TypeVariableOwner) -> Vec<TypeId> {
        names
            .iter()
            .enumerate()
            .map(|(rank, name)| {
                self.alloc_type(TypeBinding::TypeVariable(TypeVariableBinding {
                    name: name.clone(),
                    rank: rank as u32,
                    owner,
                    first_bound: None,
                    superclass: None,
                    super_interfaces: Vec::new(),
                }))
            })
            .collect()
    }

    /// Install the bounds of a type variable
    ///
    /// Without a class bound the superclass is `java.lang.Object` and the
    /// first bound is the first interface bound.
    pub(crate) fn set_type_variable_bounds(
        &mut self,
        variable: TypeId,
        class_bound: Option<TypeId>,
        interfaces: Vec<TypeId>,
    ) -> LookupResult<()> {
        let object = self.object_type()?;
        let first_bound = class_bound.or_else(|| interfaces.first().copied());
        let superclass = class_bound.unwrap_or(object);
        let mut components = interfaces.clone();
        components.push(superclass);
        if let TypeBinding::TypeVariable(tv) = self.ty_mut(variable) {
            tv.first_bound = first_bound;
            tv.superclass = Some(superclass);
            tv.super_interfaces = interfaces;
        }
        self.note_referrers(variable, &components);
        Ok(())
    }

    /// Type variables in scope for signatures of `ty`: enclosing types first
    pub(crate) fn signature_context(&mut self, ty: TypeId) -> LookupResult<SignatureContext> {
        let mut chain = Vec::new();
        let mut current = Some(ty);
        while let Some(id) = current {
            let id = self.resolved(id)?;
            let Some(class) = self.class(id) else {
                break;
            };
            if chain.contains(&id) {
                break;
            }
            chain.push(id);
            current = class.enclosing;
        }
        let mut context = SignatureContext::default();
        for id in chain.into_iter().rev() {
            if let Some(class) = self.class(id) {
                for &variable in &class.type_variables {
                    if let Some(tv) = self.ty(variable).as_type_variable() {
                        context.type_variables.push((tv.name.clone(), variable));
                    }
                }
            }
        }
        Ok(context)
    }

    pub(crate) fn type_from_signature(&mut self, signature: &TypeSig, context: &SignatureContext) -> LookupResult<TypeId> {
        match signature {
            TypeSig::Base(base) => Ok(self.base_type(*base)),
            TypeSig::Array(component) => {
                let component = self.type_from_signature(component, context)?;
                Ok(self.create_array_type(component, 1))
            }
            TypeSig::TypeVariable(name) => match context.lookup(name) {
                Some(variable) => Ok(variable),
                None => Ok(self.create_problem_type(
                    CompoundName::from_dotted(name),
                    ProblemReason::NotFound,
                    None,
                )),
            },
            TypeSig::Class(class) => self.class_type_from_signature(class, context),
        }
    }

    fn class_type_from_signature(&mut self, signature: &ClassTypeSig, context: &SignatureContext) -> LookupResult<TypeId> {
        let generics = self.options().generics_enabled();
        let outer = self.type_or_placeholder(&CompoundName::from_internal(&signature.name));
        let mut current = if generics && !signature.arguments.is_empty() {
            let arguments = self.type_arguments_from_signature(outer, &signature.arguments, context)?;
            self.create_parameterized_type(outer, arguments, None)
        } else {
            outer
        };
        let mut binary_name = signature.name.clone();
        for inner in &signature.inner {
            binary_name.push('$');
            binary_name.push_str(&inner.name);
            let member = self.type_or_placeholder(&CompoundName::from_internal(&binary_name));
            let enclosing_is_parameterized = matches!(self.ty(current), TypeBinding::Parameterized(_));
            current = if generics && (!inner.arguments.is_empty() || enclosing_is_parameterized) {
                let arguments = self.type_arguments_from_signature(member, &inner.arguments, context)?;
                let enclosing = enclosing_is_parameterized.then_some(current);
                self.create_parameterized_type(member, arguments, enclosing)
            } else {
                member
            };
        }
        Ok(current)
    }

    fn type_arguments_from_signature(
        &mut self,
        generic: TypeId,
        arguments: &[TypeArgSig],
        context: &SignatureContext,
    ) -> LookupResult<Vec<TypeId>> {
        let mut result = Vec::with_capacity(arguments.len());
        for (rank, argument) in arguments.iter().enumerate() {
            let rank = rank as u32;
            let id = match argument {
                TypeArgSig::Unbound => self.create_wildcard(Some(generic), rank, None, Vec::new(), WildcardKind::Unbound),
                TypeArgSig::Extends(bound) => {
                    let bound = self.type_from_signature(bound, context)?;
                    self.create_wildcard(Some(generic), rank, Some(bound), Vec::new(), WildcardKind::Extends)
                }
                TypeArgSig::Super(bound) => {
                    let bound = self.type_from_signature(bound, context)?;
                    self.create_wildcard(Some(generic), rank, Some(bound), Vec::new(), WildcardKind::Super)
                }
                TypeArgSig::Exact(ty) => self.type_from_signature(ty, context)?,
            };
            result.push(id);
        }
        Ok(result)
    }

    fn binary_class_signature(&mut self, ty: TypeId) -> Option<ClassSignature> {
        let class = self.class(ty)?;
        let signature = class.binary.as_ref()?.generic_signature.clone()?;
        let name = class.compound_name.clone();
        match parse_class_signature(&signature) {
            Ok(parsed) => Some(parsed),
            Err(error) => {
                self.report_corrupted(&name, &error);
                None
            }
        }
    }

    fn take_state(&mut self, ty: TypeId, bit: TypeState) -> bool {
        match self.class_mut(ty) {
            Some(class) if class.state.contains(bit) => {
                class.state.remove(bit);
                true
            }
            _ => false,
        }
    }

    /// Build the superclass of a binary type
    pub(crate) fn complete_binary_superclass(&mut self, ty: TypeId) -> LookupResult<()> {
        if !self.take_state(ty, TypeState::UNRESOLVED_SUPERCLASS) {
            return Ok(());
        }
        self.stats.binary_supertype_completions += 1;
        let superclass = match self.binary_class_signature(ty) {
            Some(signature) => {
                let context = self.signature_context(ty)?;
                Some(self.type_from_signature(&signature.superclass, &context)?)
            }
            None => {
                let name = self
                    .class(ty)
                    .and_then(|class| class.binary.as_ref())
                    .and_then(|descriptor| descriptor.superclass_name.clone());
                name.map(|name| self.type_or_placeholder(&CompoundName::from_internal(&name)))
            }
        };
        if let Some(class) = self.class_mut(ty) {
            class.superclass = superclass;
        }
        if let Some(superclass) = superclass {
            self.note_referrers(ty, &[superclass]);
        }
        trace!(ty = %ty, "completed binary superclass");
        Ok(())
    }

    /// Build the superinterfaces of a binary type
    pub(crate) fn complete_binary_super_interfaces(&mut self, ty: TypeId) -> LookupResult<()> {
        if !self.take_state(ty, TypeState::UNRESOLVED_SUPERINTERFACES) {
            return Ok(());
        }
        self.stats.binary_supertype_completions += 1;
        let mut interfaces = Vec::new();
        match self.binary_class_signature(ty) {
            Some(signature) => {
                let context = self.signature_context(ty)?;
                for interface in &signature.interfaces {
                    interfaces.push(self.type_from_signature(interface, &context)?);
                }
            }
            None => {
                let names = self
                    .class(ty)
                    .and_then(|class| class.binary.as_ref())
                    .map(|descriptor| descriptor.interface_names.clone())
                    .unwrap_or_default();
                for name in names {
                    interfaces.push(self.type_or_placeholder(&CompoundName::from_internal(&name)));
                }
            }
        }
        self.note_referrers(ty, &interfaces);
        if let Some(class) = self.class_mut(ty) {
            class.super_interfaces = interfaces;
        }
        trace!(ty = %ty, "completed binary superinterfaces");
        Ok(())
    }

    /// Build the member types of a binary type
    pub(crate) fn complete_binary_member_types(&mut self, ty: TypeId) -> LookupResult<()> {
        if !self.take_state(ty, TypeState::UNRESOLVED_MEMBER_TYPES) {
            return Ok(());
        }
        self.stats.binary_member_type_completions += 1;
        let names = self
            .class(ty)
            .and_then(|class| class.binary.as_ref())
            .map(|descriptor| descriptor.member_type_names.clone())
            .unwrap_or_default();
        let mut members = Vec::with_capacity(names.len());
        for name in names {
            let placeholder = self.type_or_placeholder(&CompoundName::from_internal(&name));
            let member = self.resolved(placeholder)?;
            if self.class(member).is_some() {
                members.push(member);
            }
        }
        if let Some(class) = self.class_mut(ty) {
            class.member_types = members;
        }
        Ok(())
    }

    /// Build the fields and methods of a binary type
    pub(crate) fn complete_binary_members(&mut self, ty: TypeId) -> LookupResult<()> {
        if !self.take_state(ty, TypeState::UNRESOLVED_MEMBERS) {
            return Ok(());
        }
        self.stats.binary_member_completions += 1;
        let Some((name, descriptor)) = self
            .class(ty)
            .and_then(|class| Some((class.compound_name.clone(), class.binary.as_ref()?.clone())))
        else {
            return Ok(());
        };
        trace!(ty = %ty, name = %name, "completing binary members");
        let generics = self.options().generics_enabled();
        let context = self.signature_context(ty)?;

        let mut fields = Vec::with_capacity(descriptor.fields.len());
        for field in &descriptor.fields {
            if field.modifiers.contains(Modifiers::SYNTHETIC) {
                continue;
            }
            let text = match (&field.generic_signature, generics) {
                (Some(signature), true) => signature.as_str(),
                _ => field.descriptor.as_str(),
            };
            let field_type = match parse_field_signature(text).or_else(|_| parse_field_signature(&field.descriptor)) {
                Ok(signature) => self.type_from_signature(&signature, &context)?,
                Err(error) => {
                    self.report_corrupted(&name, &error);
                    self.create_problem_type(name.child(&field.name), ProblemReason::NotFound, None)
                }
            };
            let id = self.alloc_field(FieldBinding {
                name: field.name.clone(),
                modifiers: field.modifiers,
                ty: field_type,
                declaring_class: ty,
                original: None,
            });
            self.note_field_referrer(id, field_type);
            fields.push(id);
        }

        let mut methods = Vec::with_capacity(descriptor.methods.len());
        for method in &descriptor.methods {
            if method.modifiers.contains(Modifiers::SYNTHETIC) {
                continue;
            }
            let id = self.build_binary_method(ty, &name, method, &context, generics)?;
            methods.push(id);
        }

        if let Some(class) = self.class_mut(ty) {
            class.fields = fields;
            class.methods = methods;
        }
        Ok(())
    }

    fn build_binary_method(
        &mut self,
        ty: TypeId,
        type_name: &CompoundName,
        method: &crate::provider::BinaryMethod,
        context: &SignatureContext,
        generics: bool,
    ) -> LookupResult<MethodId> {
        let void = self.base_type(crate::binding::BaseType::Void);
        let id = self.alloc_method(MethodBinding {
            selector: method.selector.clone(),
            modifiers: method.modifiers,
            declaring_class: ty,
            return_type: void,
            parameters: Vec::new(),
            thrown_exceptions: Vec::new(),
            type_variables: Vec::new(),
            origin: MethodOrigin::Declared,
            is_raw: false,
        });

        let parsed = match (&method.generic_signature, generics) {
            (Some(signature), true) => match parse_method_signature(signature) {
                Ok(parsed) => Ok(parsed),
                Err(error) => {
                    self.report_corrupted(type_name, &error);
                    parse_method_signature(&method.descriptor)
                }
            },
            _ => parse_method_signature(&method.descriptor),
        };
        let signature = match parsed {
            Ok(signature) => signature,
            Err(error) => {
                self.report_corrupted(type_name, &error);
                return Ok(id);
            }
        };

        let mut context = context.clone();
        let names: Vec<String> = signature.type_parameters.iter().map(|p| p.name.clone()).collect();
        let variables = self.create_type_variables(&names, TypeVariableOwner::Method(id));
        context.extend(&signature.type_parameters, &variables);
        self.bind_signature_bounds(&signature.type_parameters, &variables, &context)?;

        let mut parameters = Vec::with_capacity(signature.parameters.len());
        for parameter in &signature.parameters {
            parameters.push(self.type_from_signature(parameter, &context)?);
        }
        let return_type = self.type_from_signature(&signature.return_type, &context)?;
        let mut thrown_exceptions = Vec::new();
        if signature.exceptions.is_empty() {
            for exception in &method.exceptions {
                thrown_exceptions.push(self.type_or_placeholder(&CompoundName::from_internal(exception)));
            }
        } else {
            for exception in &signature.exceptions {
                thrown_exceptions.push(self.type_from_signature(exception, &context)?);
            }
        }

        let binding = self.method_mut(id);
        binding.parameters = parameters;
        binding.return_type = return_type;
        binding.thrown_exceptions = thrown_exceptions;
        binding.type_variables = variables;
        self.note_method_referrers(id);
        Ok(id)
    }
}
