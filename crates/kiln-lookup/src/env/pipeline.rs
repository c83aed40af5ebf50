//! Staged completion pipeline for source units
//!
//! Stage 1 (type shells) runs when a unit is registered. The remaining
//! stages run for every registered unit, one stage at a time, when
//! [`LookupEnvironment::complete_type_bindings`] is called. Each stage is
//! idempotent per unit.

use super::LookupEnvironment;
use crate::binding::{
    BaseType, ClassBinding, ClassKind, ClassOrigin, FieldBinding, MethodBinding, MethodId, MethodOrigin,
    Modifiers, PackageId, ScopeId, TypeBinding, TypeId, TypeState, TypeVariableOwner, UnitId,
};
use crate::decl::{CompilationUnitDecl, MethodDecl, TypeDecl, TypeRef};
use crate::error::LookupResult;
use crate::names::well_known;
use crate::reporter::ProblemId;
use crate::scope::imports::ImportTable;
use crate::scope::{Scope, ScopeKind};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::rc::Rc;
use tracing::debug;

/// Pipeline stage a unit has completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompletionStage {
    /// Type shells, packages, class scopes and type variables exist
    TypesBuilt,
    /// Imports are resolved
    ImportsResolved,
    /// Supertypes and type variable bounds are connected
    HierarchyConnected,
    /// Fields and methods are built
    MembersBuilt,
}

impl CompletionStage {
    fn next(self) -> Option<CompletionStage> {
        match self {
            CompletionStage::TypesBuilt => Some(CompletionStage::ImportsResolved),
            CompletionStage::ImportsResolved => Some(CompletionStage::HierarchyConnected),
            CompletionStage::HierarchyConnected => Some(CompletionStage::MembersBuilt),
            CompletionStage::MembersBuilt => None,
        }
    }
}

/// What remains of a unit once it is registered
///
/// The declaration itself lives in the environment's registry only until
/// the unit finishes stage 4.
#[derive(Debug, Clone)]
pub(crate) struct UnitRecord {
    pub(crate) file_name: String,
    pub(crate) package: PackageId,
    pub(crate) scope: ScopeId,
    pub(crate) types: Vec<TypeId>,
    pub(crate) stage: CompletionStage,
    pub(crate) imports: ImportTable,
}

/// A unit that went through every stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedUnit {
    /// Unit handle
    pub unit: UnitId,
    /// File name from the declaration
    pub file_name: String,
    /// Compilation-unit scope
    pub scope: ScopeId,
    /// Top-level types
    pub types: Vec<TypeId>,
}

impl LookupEnvironment {
    /// Stage 1: create the type shells of a unit and register it
    pub fn build_type_bindings(&mut self, decl: CompilationUnitDecl) -> UnitId {
        let package = self.create_package(&decl.package);
        let unit = UnitId::new(self.units.len() as u32);
        let scope = self.alloc_scope(Scope::new(ScopeKind::CompilationUnit { unit, package }, None));
        let decl = Rc::new(decl);
        self.units.push(UnitRecord {
            file_name: decl.file_name.clone(),
            package,
            scope,
            types: Vec::new(),
            stage: CompletionStage::TypesBuilt,
            imports: ImportTable::default(),
        });
        let mut types = Vec::with_capacity(decl.types.len());
        for (index, type_decl) in decl.types.iter().enumerate() {
            let path = SmallVec::from_slice(&[index as u32]);
            if let Some(ty) = self.build_source_type(unit, package, scope, None, type_decl, path) {
                types.push(ty);
            }
        }
        self.units[unit.index()].types = types;
        self.unit_decls.insert(unit, Rc::clone(&decl));
        self.pending_units.push(unit);
        debug!(unit = %unit, file = %decl.file_name, "registered compilation unit");
        unit
    }

    fn build_source_type(
        &mut self,
        unit: UnitId,
        package: PackageId,
        parent_scope: ScopeId,
        enclosing: Option<TypeId>,
        decl: &TypeDecl,
        path: SmallVec<[u32; 4]>,
    ) -> Option<TypeId> {
        let compound_name = match enclosing.and_then(|e| self.class(e)) {
            Some(outer) => outer.compound_name.child(&decl.name),
            None => self.package(package).compound_name.child(&decl.name),
        };
        let duplicate = match enclosing {
            Some(outer) => self.class(outer).is_some_and(|outer| {
                outer.source_name == decl.name
                    || outer
                        .member_types
                        .iter()
                        .any(|&m| self.class(m).is_some_and(|m| m.source_name == decl.name))
            }),
            None => self
                .package(package)
                .known_type(&decl.name)
                .is_some_and(|existing| self.class(existing).is_some()),
        };
        if duplicate {
            self.report(ProblemId::DuplicateType, vec![compound_name.dotted()]);
            return None;
        }

        let mut modifiers = decl.modifiers;
        if decl.kind.is_interface() {
            modifiers |= Modifiers::INTERFACE | Modifiers::ABSTRACT;
        }
        if let Some(outer) = enclosing.and_then(|e| self.class(e)) {
            if outer.is_interface() {
                modifiers |= Modifiers::PUBLIC | Modifiers::STATIC;
            }
            if decl.kind != ClassKind::Class {
                modifiers |= Modifiers::STATIC;
            }
        }

        let id = self.alloc_type(TypeBinding::Class(ClassBinding {
            compound_name,
            source_name: decl.name.clone(),
            package,
            modifiers,
            kind: decl.kind,
            origin: ClassOrigin::Source { unit, path: path.clone() },
            enclosing,
            type_variables: Vec::new(),
            state: TypeState::empty(),
            superclass: None,
            super_interfaces: Vec::new(),
            member_types: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            scope: None,
            binary: None,
        }));
        let class_scope = self.alloc_scope(Scope::new(ScopeKind::Class { ty: id }, Some(parent_scope)));
        if enclosing.is_none() {
            self.register_type(package, &decl.name, id);
        }

        let variables = if self.options().generics_enabled() {
            let names: Vec<String> = decl.type_parameters.iter().map(|p| p.name.clone()).collect();
            self.create_type_variables(&names, TypeVariableOwner::Type(id))
        } else {
            Vec::new()
        };
        if let Some(class) = self.class_mut(id) {
            class.scope = Some(class_scope);
            class.type_variables = variables;
        }

        for (index, member) in decl.member_types.iter().enumerate() {
            let mut member_path = path.clone();
            member_path.push(index as u32);
            if let Some(member) = self.build_source_type(unit, package, class_scope, Some(id), member, member_path) {
                if let Some(class) = self.class_mut(id) {
                    class.member_types.push(member);
                }
            }
        }
        Some(id)
    }

    /// Register a unit supplied by the provider
    ///
    /// During a pipeline run the unit catches up with the current stage;
    /// otherwise it is completed right away.
    pub(crate) fn accept_provided_unit(&mut self, decl: CompilationUnitDecl) -> LookupResult<()> {
        let unit = self.build_type_bindings(decl);
        match self.pipeline_stage {
            Some(stage) => self.bring_unit_to(unit, stage),
            None => {
                self.bring_unit_to(unit, CompletionStage::MembersBuilt)?;
                self.pending_units.retain(|pending| *pending != unit);
                self.release_unit(unit);
                Ok(())
            }
        }
    }

    fn bring_unit_to(&mut self, unit: UnitId, target: CompletionStage) -> LookupResult<()> {
        while self.units[unit.index()].stage < target {
            let Some(next) = self.units[unit.index()].stage.next() else {
                break;
            };
            match next {
                CompletionStage::TypesBuilt => {}
                CompletionStage::ImportsResolved => self.resolve_imports(unit)?,
                CompletionStage::HierarchyConnected => {
                    for ty in self.unit_types_deep(unit) {
                        self.connect_type_hierarchy(ty)?;
                    }
                }
                CompletionStage::MembersBuilt => {
                    for ty in self.unit_types_deep(unit) {
                        self.build_fields_and_methods(ty)?;
                    }
                }
            }
            self.units[unit.index()].stage = next;
        }
        Ok(())
    }

    /// Stages 2-4 for every registered unit, in registration order
    pub fn complete_type_bindings(&mut self) -> LookupResult<Vec<CompletedUnit>> {
        let result = self.run_pipeline();
        self.pipeline_stage = None;
        self.deferred_bound_checks = None;
        result?;

        let pending = std::mem::take(&mut self.pending_units);
        Ok(pending
            .into_iter()
            .map(|unit| {
                self.release_unit(unit);
                let record = &self.units[unit.index()];
                CompletedUnit {
                    unit,
                    file_name: record.file_name.clone(),
                    scope: record.scope,
                    types: record.types.clone(),
                }
            })
            .collect())
    }

    /// Drop the declaration of a unit that went through stage 4
    fn release_unit(&mut self, unit: UnitId) {
        if self.unit_decls.remove(&unit).is_some() {
            self.stats.units_completed += 1;
            debug!(unit = %unit, "released compilation unit");
        }
    }

    /// Units whose declarations are still held (not yet through stage 4)
    pub fn registered_unit_count(&self) -> usize {
        self.unit_decls.len()
    }

    fn run_pipeline(&mut self) -> LookupResult<()> {
        for stage in [
            CompletionStage::ImportsResolved,
            CompletionStage::HierarchyConnected,
            CompletionStage::MembersBuilt,
        ] {
            debug!(?stage, units = self.pending_units.len(), "running pipeline stage");
            self.pipeline_stage = Some(stage);
            if stage == CompletionStage::HierarchyConnected {
                self.deferred_bound_checks = Some(Vec::new());
            }
            let mut i = 0;
            while i < self.pending_units.len() {
                let unit = self.pending_units[i];
                self.bring_unit_to(unit, stage)?;
                i += 1;
            }
            if stage == CompletionStage::HierarchyConnected {
                self.run_deferred_bound_checks()?;
                let mut i = 0;
                while i < self.pending_units.len() {
                    for ty in self.unit_types_deep(self.pending_units[i]) {
                        self.check_superinterface_collisions(ty)?;
                    }
                    i += 1;
                }
            }
        }
        Ok(())
    }

    /// Compilation-unit scope of a registered unit
    pub fn unit_scope(&self, unit: UnitId) -> ScopeId {
        self.units[unit.index()].scope
    }

    /// Stage the unit has completed
    pub fn unit_stage(&self, unit: UnitId) -> CompletionStage {
        self.units[unit.index()].stage
    }

    /// Top-level types of a unit
    pub fn unit_types(&self, unit: UnitId) -> &[TypeId] {
        &self.units[unit.index()].types
    }

    /// Class scope of a source type
    pub fn class_scope(&self, ty: TypeId) -> Option<ScopeId> {
        self.class(ty).and_then(|class| class.scope)
    }

    /// All types of a unit, member types after their enclosing type
    pub(crate) fn unit_types_deep(&self, unit: UnitId) -> Vec<TypeId> {
        let mut result = Vec::new();
        let mut stack: Vec<TypeId> = self.units[unit.index()].types.iter().rev().copied().collect();
        while let Some(ty) = stack.pop() {
            result.push(ty);
            if let Some(class) = self.class(ty) {
                stack.extend(class.member_types.iter().rev().copied());
            }
        }
        result
    }

    /// Stage reached by the unit declaring a source type
    pub(crate) fn source_stage(&self, ty: TypeId) -> Option<CompletionStage> {
        match &self.class(ty)?.origin {
            ClassOrigin::Source { unit, .. } => Some(self.units[unit.index()].stage),
            ClassOrigin::Binary => None,
        }
    }

    /// Declaring unit of a source type, with the unit declaration and the
    /// index path of the type inside it
    ///
    /// `None` for binary types and for units already released.
    pub(crate) fn source_decl(&self, ty: TypeId) -> Option<(UnitId, Rc<CompilationUnitDecl>, SmallVec<[u32; 4]>)> {
        match &self.class(ty)?.origin {
            ClassOrigin::Source { unit, path } => {
                let decl = self.unit_decls.get(unit)?;
                Some((*unit, Rc::clone(decl), path.clone()))
            }
            ClassOrigin::Binary => None,
        }
    }

    /// Stage 4 for one source type; also runs lazily on first member access
    pub(crate) fn build_fields_and_methods(&mut self, ty: TypeId) -> LookupResult<()> {
        let Some(class) = self.class(ty) else {
            return Ok(());
        };
        if class.state.contains(TypeState::FIELDS_AND_METHODS_BUILT) || class.is_binary() {
            return Ok(());
        }
        let Some(scope) = class.scope else {
            return Ok(());
        };
        let is_interface = class.is_interface();
        let kind = class.kind;
        let type_modifiers = class.modifiers;
        let type_name = class.compound_name.dotted();
        let Some((_, unit_decl, path)) = self.source_decl(ty) else {
            return Ok(());
        };
        let Some(decl) = unit_decl.type_at(&path) else {
            return Ok(());
        };
        if let Some(class) = self.class_mut(ty) {
            class.state.insert(TypeState::FIELDS_AND_METHODS_BUILT);
        }
        if self.class(ty).is_some_and(|c| !c.state.contains(TypeState::END_HIERARCHY_CHECK)) {
            self.connect_type_hierarchy(ty)?;
        }

        let mut fields = Vec::with_capacity(decl.fields.len());
        let mut field_names = FxHashSet::default();
        for field in &decl.fields {
            if !field_names.insert(field.name.as_str()) {
                self.report(ProblemId::DuplicateField, vec![field.name.clone(), type_name.clone()]);
                continue;
            }
            let field_type = self.resolve_type_ref(scope, &field.ty)?;
            let mut modifiers = field.modifiers;
            if is_interface {
                modifiers |= Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL;
            }
            fields.push(self.alloc_field(FieldBinding {
                name: field.name.clone(),
                modifiers,
                ty: field_type,
                declaring_class: ty,
                original: None,
            }));
        }

        let mut methods: Vec<MethodId> = Vec::with_capacity(decl.methods.len() + 1);
        for method in &decl.methods {
            let id = self.build_source_method(ty, scope, is_interface, method)?;
            let erased = self.erased_parameters(id)?;
            let mut duplicate = false;
            for &existing in &methods {
                if self.method(existing).selector == method.selector && self.erased_parameters(existing)? == erased {
                    duplicate = true;
                    break;
                }
            }
            if duplicate {
                let signature = self.method_signature_name(id);
                self.report(ProblemId::DuplicateMethod, vec![signature, type_name.clone()]);
                continue;
            }
            methods.push(id);
        }

        let void = self.base_type(BaseType::Void);
        if matches!(kind, ClassKind::Class | ClassKind::Enum) && !decl.declares_constructor() {
            let modifiers = if kind == ClassKind::Enum {
                Modifiers::PRIVATE
            } else {
                type_modifiers & Modifiers::ACCESS_MASK
            };
            methods.push(self.alloc_method(MethodBinding {
                selector: well_known::INIT.to_string(),
                modifiers,
                declaring_class: ty,
                return_type: void,
                parameters: Vec::new(),
                thrown_exceptions: Vec::new(),
                type_variables: Vec::new(),
                origin: MethodOrigin::DefaultConstructor,
                is_raw: false,
            }));
        }
        if kind == ClassKind::Enum {
            let array = self.create_array_type(ty, 1);
            methods.push(self.alloc_method(MethodBinding {
                selector: "values".to_string(),
                modifiers: Modifiers::PUBLIC | Modifiers::STATIC,
                declaring_class: ty,
                return_type: array,
                parameters: Vec::new(),
                thrown_exceptions: Vec::new(),
                type_variables: Vec::new(),
                origin: MethodOrigin::Declared,
                is_raw: false,
            }));
            if let Some(string) = self.well_known_type(well_known::JAVA_LANG_STRING)? {
                methods.push(self.alloc_method(MethodBinding {
                    selector: "valueOf".to_string(),
                    modifiers: Modifiers::PUBLIC | Modifiers::STATIC,
                    declaring_class: ty,
                    return_type: ty,
                    parameters: vec![string],
                    thrown_exceptions: Vec::new(),
                    type_variables: Vec::new(),
                    origin: MethodOrigin::Declared,
                    is_raw: false,
                }));
            }
        }

        if let Some(class) = self.class_mut(ty) {
            class.fields = fields;
            class.methods = methods;
        }
        Ok(())
    }

    fn build_source_method(
        &mut self,
        ty: TypeId,
        class_scope: ScopeId,
        in_interface: bool,
        decl: &MethodDecl,
    ) -> LookupResult<MethodId> {
        let mut modifiers = decl.modifiers;
        if in_interface {
            modifiers |= Modifiers::PUBLIC;
            if !modifiers.contains(Modifiers::STATIC) {
                modifiers |= Modifiers::ABSTRACT;
            }
        }
        let last_is_array = decl
            .parameters
            .last()
            .is_some_and(|p| matches!(p.ty, TypeRef::Array { .. }));
        if !last_is_array || !self.options().varargs_enabled() {
            modifiers.remove(Modifiers::VARARGS);
        }

        let void = self.base_type(BaseType::Void);
        let id = self.alloc_method(MethodBinding {
            selector: decl.selector.clone(),
            modifiers,
            declaring_class: ty,
            return_type: void,
            parameters: Vec::new(),
            thrown_exceptions: Vec::new(),
            type_variables: Vec::new(),
            origin: MethodOrigin::Declared,
            is_raw: false,
        });

        let variables = if self.options().generics_enabled() {
            let names: Vec<String> = decl.type_parameters.iter().map(|p| p.name.clone()).collect();
            self.create_type_variables(&names, TypeVariableOwner::Method(id))
        } else {
            Vec::new()
        };
        let is_static = modifiers.contains(Modifiers::STATIC);
        let scope = self.new_method_scope(class_scope, Some(id), is_static);
        if let ScopeKind::Method { type_variables, .. } = &mut self.scopes[scope.index()].kind {
            *type_variables = variables.clone();
        }
        self.method_scopes.insert(id, scope);
        if !variables.is_empty() {
            self.connect_type_variable_bounds(scope, &decl.type_parameters, &variables)?;
        }

        let mut parameters = Vec::with_capacity(decl.parameters.len());
        for parameter in &decl.parameters {
            let parameter_type = self.resolve_type_ref(scope, &parameter.ty)?;
            self.declare_argument(scope, &parameter.name, parameter_type);
            parameters.push(parameter_type);
        }
        let return_type = match &decl.return_type {
            Some(return_type) => self.resolve_type_ref(scope, return_type)?,
            None => void,
        };
        let mut thrown_exceptions = Vec::with_capacity(decl.thrown.len());
        for thrown in &decl.thrown {
            thrown_exceptions.push(self.resolve_type_ref(scope, thrown)?);
        }

        let binding = self.method_mut(id);
        binding.parameters = parameters;
        binding.return_type = return_type;
        binding.thrown_exceptions = thrown_exceptions;
        binding.type_variables = variables;
        Ok(id)
    }

    fn erased_parameters(&mut self, method: MethodId) -> LookupResult<Vec<TypeId>> {
        let parameters = self.method(method).parameters.clone();
        let mut erased = Vec::with_capacity(parameters.len());
        for parameter in parameters {
            erased.push(self.erasure(parameter)?);
        }
        Ok(erased)
    }
}
