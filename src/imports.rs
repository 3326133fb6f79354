use crate::{
    errors::{ResolveError, ResolveResult},
    syntax::{FileId, ImportSpec, Module, Program},
};
use std::rc::Rc;
use tracing::debug;

/// Maps an alias used in `usage_file` to the id of the module it refers to.
///
/// Aliases are file scoped: the import table of the file holding the usage
/// site is consulted first, then the module's dependency identifiers.
pub fn absolute_import(
    program: &Program,
    alias: &str,
    usage_file: FileId,
    module: &Module,
) -> ResolveResult<String> {
    if alias == module.id {
        return Ok(module.id.clone());
    }
    if let Some(file) = module.file(usage_file) {
        for import in &file.imports {
            if import_alias(program, import) == alias {
                return Ok(import.path.clone());
            }
        }
    }
    if let Some(id) = module.dependencies.get(alias) {
        debug!(alias, module = %module.id, "import resolved through dependency fallback");
        return Ok(id.clone());
    }
    Err(ResolveError::UnknownImport {
        alias: alias.to_string(),
        module: module.id.clone(),
    })
}

/// Name an import is visible under: its explicit alias, else the short name
/// declared by the imported module.
pub fn import_alias<'p>(program: &'p Program, import: &'p ImportSpec) -> &'p str {
    if let Some(alias) = &import.alias {
        return alias;
    }
    program
        .module(&import.path)
        .map(|imported| imported.name.as_str())
        .unwrap_or_else(|| import.last_segment())
}

/// Finds a module reachable from `module` by id or dependency identifier.
pub fn import_by_name<'p>(
    program: &'p Program,
    module: &Module,
    name: &str,
) -> ResolveResult<&'p Rc<Module>> {
    let id = if name == module.id {
        name
    } else {
        module
            .dependencies
            .get(name)
            .map(String::as_str)
            .unwrap_or(name)
    };
    program.module(id).ok_or_else(|| ResolveError::UnknownModule {
        module: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{SourceFile, SourceMap};

    fn program() -> (Program, FileId, FileId) {
        let mut sources = SourceMap::new();
        let first = sources.add_file("provider/a.go");
        let second = sources.add_file("provider/b.go");
        let mut program = Program::new(sources);

        program.add_module(Module::new("example.com/sdk/v2/helper/schema", "schema"));
        program.add_module(Module::new("example.com/golang/v1/client", "golangsdk"));

        let mut provider = Module::new("example.com/provider", "provider");
        provider.files.push(SourceFile {
            id: first,
            imports: vec![
                ImportSpec::new("example.com/sdk/v2/helper/schema"),
                ImportSpec::new("example.com/golang/v1/client"),
            ],
        });
        provider.files.push(SourceFile {
            id: second,
            imports: vec![ImportSpec::aliased(
                "example.com/sdk/v2/helper/schema",
                "sdkschema",
            )],
        });
        provider.dependencies.insert(
            "client".into(),
            "example.com/golang/v1/client".into(),
        );
        program.add_module(provider);
        (program, first, second)
    }

    #[test]
    fn aliases_are_file_scoped() {
        let (program, first, second) = program();
        let provider = program.module("example.com/provider").expect("provider");

        let resolved = absolute_import(&program, "schema", first, provider).expect("schema");
        assert_eq!(resolved, "example.com/sdk/v2/helper/schema");
        let resolved = absolute_import(&program, "sdkschema", second, provider).expect("alias");
        assert_eq!(resolved, "example.com/sdk/v2/helper/schema");
        assert!(absolute_import(&program, "sdkschema", first, provider).is_err());
    }

    #[test]
    fn declared_module_name_is_the_default_alias() {
        let (program, first, _) = program();
        let provider = program.module("example.com/provider").expect("provider");
        let resolved = absolute_import(&program, "golangsdk", first, provider).expect("name");
        assert_eq!(resolved, "example.com/golang/v1/client");
    }

    #[test]
    fn falls_back_to_dependency_identifiers() {
        let (program, _, second) = program();
        let provider = program.module("example.com/provider").expect("provider");
        let resolved = absolute_import(&program, "client", second, provider).expect("fallback");
        assert_eq!(resolved, "example.com/golang/v1/client");
        assert_eq!(
            absolute_import(&program, "example.com/provider", second, provider)
                .expect("self reference"),
            "example.com/provider"
        );
        assert!(matches!(
            absolute_import(&program, "missing", second, provider),
            Err(ResolveError::UnknownImport { .. })
        ));
    }
}
