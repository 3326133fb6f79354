use super::fixture::{self, at, define, ident, schema_entry, set, set_key, PROVIDER, SOURCE_PATH};
use crate::{
    config::LintConfig,
    lint::{
        resource::ResourceDefinition, schema::ResourceSchema, validate_program, SetterDiagnostic,
        SetterValidator,
    },
    scope::ResolutionContext,
    syntax::{Binding, Expr, ExprKind, FieldDecl, FuncDecl, Span, Stmt},
    types::Category,
};
use miette::Diagnostic;
use std::rc::Rc;

fn check(schema: ResourceSchema, operating_fns: Vec<Rc<FuncDecl>>) -> Vec<SetterDiagnostic> {
    let (program, _) = fixture::program_with(operating_fns.clone(), vec![]);
    let mut target = ResourceDefinition::new("resourceInstance", PROVIDER, schema);
    target.operating_fns = operating_fns;
    let config = LintConfig::default();
    let mut ctx = ResolutionContext::new();
    match SetterValidator::new(&program, &mut ctx, &config).validate(&target) {
        Ok(()) => Vec::new(),
        Err(diagnostics) => diagnostics.into_iter().collect(),
    }
}

fn string_map() -> Expr {
    Expr::composite(
        Some(Expr::map_of(ident("string"), ident("string"))),
        vec![],
        Span::default(),
    )
}

#[test]
fn matching_literal_passes() {
    let read = fixture::operating_fn(
        "resourceRead",
        vec![set_key("name", Expr::string_lit("x", at(3)), 3)],
    );
    let schema = ResourceSchema::new().with_field("name", Category::String, false);
    assert!(check(schema, vec![read]).is_empty());
}

#[test]
fn mismatched_value_names_inferred_and_expected_types() {
    let (assign, value) = define("name", Expr::string_lit("x", at(4)), 4);
    let read = fixture::operating_fn("resourceRead", vec![assign, set_key("count", value, 5)]);
    let schema = ResourceSchema::new().with_field("count", Category::Int, false);

    let diagnostics = check(schema, vec![read]);
    assert_eq!(diagnostics.len(), 1);
    match &diagnostics[0] {
        SetterDiagnostic::TypeMismatch {
            key,
            found,
            expected,
            location,
        } => {
            assert_eq!(key, "count");
            assert_eq!(found, "string");
            assert_eq!(expected, "int");
            assert_eq!(location.line, 5);
        }
        other => panic!("unexpected diagnostic {other:?}"),
    }
    assert_eq!(
        diagnostics[0].to_string(),
        format!("{SOURCE_PATH}:5 - field `count` has invalid type `string`, expected `int`")
    );
}

#[test]
fn unknown_key_is_missing_from_schema() {
    let read = fixture::operating_fn(
        "resourceRead",
        vec![set_key("missing_field", ident("v"), 4)],
    );
    let schema = ResourceSchema::new().with_field("name", Category::String, false);

    let diagnostics = check(schema, vec![read]);
    assert_eq!(diagnostics.len(), 1);
    assert!(matches!(
        &diagnostics[0],
        SetterDiagnostic::MissingField { key, .. } if key == "missing_field"
    ));
    assert_eq!(
        diagnostics[0].to_string(),
        format!(
            "{SOURCE_PATH}:4 - broken setter for field `missing_field`: \
             field missing in the schema defined in `resourceInstance`"
        )
    );
}

#[test]
fn maps_match_map_fields_and_arrays_do_not() {
    let schema = ResourceSchema::new().with_field("tags", Category::Map, false);
    let (assign, tags) = define("tags", string_map(), 2);
    let read = fixture::operating_fn("resourceRead", vec![assign, set_key("tags", tags, 3)]);
    assert!(check(schema.clone(), vec![read]).is_empty());

    let list = Expr::composite(
        Some(Expr::array_of(ident("string"))),
        vec![],
        Span::default(),
    );
    let read = fixture::operating_fn("resourceRead", vec![set_key("tags", list, 3)]);
    let diagnostics = check(schema, vec![read]);
    assert_eq!(diagnostics.len(), 1);
    assert!(matches!(
        &diagnostics[0],
        SetterDiagnostic::TypeMismatch { found, .. } if found == "array:string"
    ));
}

#[test]
fn computed_keys_are_skipped() {
    let read = fixture::operating_fn(
        "resourceRead",
        vec![set("d", ident("key"), Expr::lit(crate::syntax::LitKind::Int, "1", at(3)), 3)],
    );
    let schema = ResourceSchema::new().with_field("name", Category::String, false);
    assert!(check(schema, vec![read]).is_empty());
}

#[test]
fn findings_accumulate_across_operating_functions() {
    let schema = ResourceSchema::new().with_field("name", Category::String, false);
    let create = fixture::operating_fn(
        "resourceCreate",
        vec![set_key("name", Expr::string_lit("x", at(2)), 2)],
    );
    let read = fixture::operating_fn(
        "resourceRead",
        vec![set_key("name", Expr::lit(crate::syntax::LitKind::Int, "1", at(9)), 9)],
    );
    let diagnostics = check(schema, vec![create, read]);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].key(), Some("name"));
}

#[test]
fn holder_position_follows_the_signature() {
    let schema = ResourceSchema::new().with_field("name", Category::String, false);
    let legacy = fixture::func(
        "resourceRead",
        vec![
            FieldDecl::named("rd", Expr::star(fixture::selector("schema", "ResourceData"))),
            FieldDecl::named("meta", Expr::new(ExprKind::InterfaceType, Span::default())),
        ],
        vec![],
        vec![set("rd", Expr::string_lit("other", at(3)), ident("v"), 3)],
    );
    let diagnostics = check(schema.clone(), vec![legacy]);
    assert!(matches!(
        diagnostics.as_slice(),
        [SetterDiagnostic::MissingField { key, .. }] if key == "other"
    ));

    let broken = fixture::func(
        "resourceUpdate",
        vec![FieldDecl::named("d", ident("int"))],
        vec![],
        vec![set_key("other", ident("v"), 3)],
    );
    let diagnostics = check(schema.clone(), vec![broken]);
    assert!(matches!(
        diagnostics.as_slice(),
        [SetterDiagnostic::UnsupportedSignature { arity: 1, .. }]
    ));

    let anonymous = fixture::func(
        "resourceCreate",
        vec![
            FieldDecl::unnamed(ident("ctx")),
            FieldDecl::unnamed(ident("data")),
            FieldDecl::unnamed(ident("meta")),
        ],
        vec![],
        vec![set_key("other", ident("v"), 3)],
    );
    assert!(check(schema, vec![anonymous]).is_empty());
}

#[test]
fn unresolvable_values_are_reported() {
    let schema = ResourceSchema::new().with_field("name", Category::String, false);
    let read = fixture::operating_fn(
        "resourceRead",
        vec![
            set_key("name", fixture::selector("client", "Name"), 3),
            set_key("name", Expr::new(ExprKind::Bad, at(4)), 4),
            Stmt::Expr(Expr::call(
                Expr::selector(Expr::ident("d", at(5)), "Set"),
                vec![Expr::string_lit("name", at(5))],
            )),
        ],
    );
    let diagnostics = check(schema, vec![read]);
    assert_eq!(diagnostics.len(), 2);
    assert!(matches!(diagnostics[0], SetterDiagnostic::Unresolved { .. }));
    assert!(matches!(diagnostics[1], SetterDiagnostic::Undetermined { .. }));
    assert_eq!(
        diagnostics[0].code().map(|code| code.to_string()).as_deref(),
        Some("setter_lint::unresolved")
    );
}

#[test]
fn whole_program_validation_reports_every_generator() {
    let (assign, count) = define("count", Expr::string_lit("three", at(10)), 10);
    let read = fixture::operating_fn(
        "resourceRead",
        vec![
            assign,
            set_key("name", Expr::string_lit("web", at(11)), 11),
            set_key("count", count, 12),
        ],
    );
    let generator = fixture::generator(
        "resourceInstance",
        "schema",
        vec![
            schema_entry("name", "TypeString", true),
            schema_entry("count", "TypeInt", true),
        ],
        vec![("Read", read.clone())],
    );
    let broken = fixture::generator(
        "resourceBroken",
        "schema",
        vec![Expr::string_lit("loose", at(20))],
        vec![],
    );
    let (program, _) = fixture::program_with(vec![generator, broken, read], vec![]);

    let diagnostics = validate_program(&program, &LintConfig::default())
        .err()
        .expect("diagnostics");
    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics.to_string(), "found 2 broken setter(s)");
    assert_eq!(diagnostics.related().map(|related| related.count()), Some(2));

    let codes: Vec<_> = diagnostics
        .iter()
        .filter_map(|diagnostic| diagnostic.code().map(|code| code.to_string()))
        .collect();
    assert_eq!(
        codes,
        vec!["setter_lint::type_mismatch", "setter_lint::definition"]
    );
}

#[test]
fn untyped_schema_field_does_not_hide_sibling_findings() {
    let read = fixture::operating_fn(
        "resourceRead",
        vec![set_key("name", Expr::lit(crate::syntax::LitKind::Int, "1", at(7)), 7)],
    );
    let untyped = Expr::key_value(
        Expr::string_lit("legacy", at(3)),
        Expr::composite(
            None,
            vec![Expr::key_value(ident("Computed"), ident("true"))],
            at(3),
        ),
    );
    let generator = fixture::generator(
        "resourceInstance",
        "schema",
        vec![schema_entry("name", "TypeString", true), untyped],
        vec![("Read", read.clone())],
    );
    let (program, _) = fixture::program_with(vec![generator, read], vec![]);

    let diagnostics = validate_program(&program, &LintConfig::default())
        .err()
        .expect("diagnostics");
    let items: Vec<_> = diagnostics.iter().collect();
    assert!(matches!(
        items.as_slice(),
        [SetterDiagnostic::TypeMismatch { key, found, expected, .. }]
            if key == "name" && found == "int" && expected == "string"
    ));
}

#[test]
fn struct_values_are_reported_as_mismatches() {
    let config = fixture::type_decl(
        "Config",
        fixture::struct_type(vec![FieldDecl::named("Name", ident("string"))]),
    );
    let value = Expr::composite(
        Some(Expr::bound("Config", Binding::Type(config.clone()), at(4))),
        vec![],
        at(4),
    );
    let (assign, value) = define("cfg", value, 4);
    let read = fixture::operating_fn(
        "resourceRead",
        vec![
            assign,
            set_key("settings", value.clone(), 5),
            set_key("name", Expr::selector(value, "Name"), 6),
        ],
    );
    let (program, _) = fixture::program_with(vec![read.clone()], vec![config]);
    let schema = ResourceSchema::new()
        .with_field("settings", Category::Map, false)
        .with_field("name", Category::String, false);
    let mut target = ResourceDefinition::new("resourceInstance", PROVIDER, schema);
    target.operating_fns = vec![read];

    let config = LintConfig::default();
    let mut ctx = ResolutionContext::new();
    let diagnostics: Vec<_> = SetterValidator::new(&program, &mut ctx, &config)
        .validate(&target)
        .err()
        .expect("diagnostics")
        .into_iter()
        .collect();
    assert_eq!(diagnostics.len(), 1);
    assert!(matches!(
        &diagnostics[0],
        SetterDiagnostic::TypeMismatch { key, found, expected, location }
            if key == "settings"
                && found == &format!("{PROVIDER}.Config")
                && expected == "map"
                && location.line == 5
    ));
}

#[test]
fn clean_program_passes() {
    let read = fixture::operating_fn(
        "resourceRead",
        vec![set_key("name", Expr::string_lit("web", at(3)), 3)],
    );
    let generator = fixture::generator(
        "resourceInstance",
        "schema",
        vec![schema_entry("name", "TypeString", true)],
        vec![("ReadContext", read.clone())],
    );
    let (program, _) = fixture::program_with(vec![generator, read], vec![]);
    assert!(validate_program(&program, &LintConfig::default()).is_ok());
}
