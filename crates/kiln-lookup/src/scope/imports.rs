//! Import resolution (pipeline stage 2)

use crate::binding::{PackageId, TypeId, UnitId};
use crate::env::LookupEnvironment;
use crate::error::LookupResult;
use crate::names::{well_known, CompoundName};
use crate::reporter::ProblemId;
use rustc_hash::FxHashMap;
use std::rc::Rc;
use tracing::trace;

/// Target of an on-demand import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDemandImport {
    /// `import p.*;`
    Package(PackageId),
    /// `import p.Outer.*;`
    Type(TypeId),
}

/// Resolved imports of one compilation unit
#[derive(Debug, Clone, Default)]
pub struct ImportTable {
    /// Single-type imports by simple name
    pub single_types: FxHashMap<String, TypeId>,
    /// On-demand imports in source order; `java.lang` comes last
    pub on_demand: Vec<OnDemandImport>,
    /// Static single imports: declaring type and member name
    pub static_single: Vec<(TypeId, String)>,
    /// Static on-demand imports
    pub static_on_demand: Vec<TypeId>,
    resolved: bool,
}

impl ImportTable {
    /// Single-type import for a simple name
    pub fn single_type(&self, name: &str) -> Option<TypeId> {
        self.single_types.get(name).copied()
    }
}

impl LookupEnvironment {
    /// Resolve the imports of a unit; later calls are no-ops
    pub(crate) fn resolve_imports(&mut self, unit: UnitId) -> LookupResult<()> {
        if self.units[unit.index()].imports.resolved {
            return Ok(());
        }
        self.units[unit.index()].imports.resolved = true;
        let Some(decl) = self.unit_decls.get(&unit).map(Rc::clone) else {
            return Ok(());
        };
        let own_package = self.units[unit.index()].package;
        let own_types = self.units[unit.index()].types.clone();
        let mut table = ImportTable {
            resolved: true,
            ..ImportTable::default()
        };

        for import in &decl.imports {
            let dotted = import.name.dotted();
            match (import.is_static, import.on_demand) {
                (false, false) => {
                    let Some(ty) = self.get_type(&import.name)? else {
                        self.report(ProblemId::ImportNotFound, vec![dotted]);
                        continue;
                    };
                    if !self.is_type_visible_in_package(ty, own_package) {
                        self.report(ProblemId::ImportNotVisible, vec![dotted]);
                        continue;
                    }
                    let simple = import.name.last().unwrap_or_default().to_string();
                    let clashes_with_own = own_types
                        .iter()
                        .any(|&own| own != ty && self.class(own).is_some_and(|c| c.source_name == simple));
                    let clashes_with_import = table.single_type(&simple).is_some_and(|existing| existing != ty);
                    if clashes_with_own || clashes_with_import {
                        self.report(ProblemId::ConflictingImport, vec![dotted]);
                        continue;
                    }
                    table.single_types.insert(simple, ty);
                }
                (false, true) => {
                    if let Some(package) = self.get_package(&import.name) {
                        table.on_demand.push(OnDemandImport::Package(package));
                    } else if let Some(ty) = self.get_type(&import.name)? {
                        table.on_demand.push(OnDemandImport::Type(ty));
                    } else {
                        self.report(ProblemId::ImportNotFound, vec![dotted]);
                    }
                }
                (true, false) => {
                    let member = import.name.last().unwrap_or_default().to_string();
                    let Some(ty) = self.get_type(&import.name.parent())? else {
                        self.report(ProblemId::ImportNotFound, vec![dotted]);
                        continue;
                    };
                    let is_binary = self.class(ty).is_some_and(|c| c.is_binary());
                    if is_binary && !self.declares_static_member(ty, &member)? {
                        self.report(ProblemId::ImportNotFound, vec![dotted]);
                        continue;
                    }
                    table.static_single.push((ty, member));
                }
                (true, true) => match self.get_type(&import.name)? {
                    Some(ty) => table.static_on_demand.push(ty),
                    None => self.report(ProblemId::ImportNotFound, vec![dotted]),
                },
            }
        }

        let java_lang = CompoundName::new(well_known::JAVA_LANG.iter().map(|s| s.to_string()).collect());
        if let Some(package) = self.get_package(&java_lang) {
            if !table.on_demand.contains(&OnDemandImport::Package(package)) && package != own_package {
                table.on_demand.push(OnDemandImport::Package(package));
            }
        }
        trace!(
            unit = %unit,
            single = table.single_types.len(),
            on_demand = table.on_demand.len(),
            "resolved imports"
        );
        self.units[unit.index()].imports = table;
        Ok(())
    }

    fn declares_static_member(&mut self, ty: TypeId, name: &str) -> LookupResult<bool> {
        for field in self.fields(ty)? {
            let field = self.field(field);
            if field.name == name && field.is_static() {
                return Ok(true);
            }
        }
        for method in self.methods(ty)? {
            let method = self.method(method);
            if method.selector == name && method.is_static() {
                return Ok(true);
            }
        }
        for member in self.member_types(ty)? {
            if self.class(member).is_some_and(|c| c.source_name == name) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Resolved imports of a unit
    pub fn imports(&self, unit: UnitId) -> &ImportTable {
        &self.units[unit.index()].imports
    }
}
