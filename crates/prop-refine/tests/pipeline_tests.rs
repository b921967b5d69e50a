//! End-to-end pipeline tests: extract -> validate -> plan -> apply against
//! real call-site argument shapes.

use prop_refine::{
    apply_patches, consolidate, extract_root, refine_call_site, ComponentMatcher, Data, Entries,
    NoPreserved, PatchGroups, PatchOp, PreservedKeys, RefineError, RefineOptions, Rule,
    SiteOutcome, Validation,
};
use prop_refine_expr::{ArrayElem, Expr, Prop};
use prop_refine_path::Step;

fn entries(pairs: Vec<(&str, Data)>) -> Entries {
    pairs.into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
}

/// A schema in the spirit of the real collaborators: coerces `size` from
/// string to number, passes everything else through, and tolerates
/// placeholders.
fn coercing_schema(data: &Data) -> Validation {
    let Some(obj) = data.as_obj() else {
        return Validation::issue(Vec::new(), "expected an object");
    };
    let mut out = obj.clone();
    let size = match out.get("size") {
        Some(Data::Str(s)) => Some(s.clone()),
        _ => None,
    };
    if let Some(size) = size {
        match size.parse::<f64>() {
            Ok(n) => {
                out.insert("size".to_owned(), Data::Num(n));
            }
            Err(_) => {
                return Validation::issue(vec![Step::key("size")], "not a numeric string");
            }
        }
    }
    Validation::value(Data::obj(out))
}

#[test]
fn full_pipeline_coerces_derives_and_prunes() {
    let mut arg = Expr::object(vec![
        Prop::entry("size", Expr::str("42")),
        Prop::entry("label", Expr::str("Save")),
        Prop::entry("debug", Expr::bool(true)),
        Prop::entry("hash", Expr::null()),
        Prop::entry("children", Expr::call(Expr::ident("jsx"), vec![Expr::ident("Icon")])),
        Prop::spread(Expr::ident("rest")),
    ]);

    let rule = Rule::new(ComponentMatcher::exact("Button"))
        .with_schema(coercing_schema)
        .with_derive(|validated: &Data, emit: &mut dyn FnMut(Entries)| {
            let label_len = validated
                .as_obj()
                .and_then(|o| o.get("label"))
                .and_then(|v| match v {
                    Data::Str(s) => Some(s.len() as f64),
                    _ => None,
                })
                .unwrap_or(0.0);
            emit(entries(vec![("hash", Data::Num(label_len))]));
        })
        .with_prune(["debug"]);

    let outcome = refine_call_site(&mut arg, &rule, &RefineOptions::default()).unwrap();
    assert!(matches!(outcome, SiteOutcome::Applied { .. }));

    assert_eq!(
        arg,
        Expr::object(vec![
            Prop::entry("size", Expr::num(42.0)),
            Prop::entry("label", Expr::str("Save")),
            Prop::entry("hash", Expr::num(4.0)),
            Prop::entry(
                "children",
                Expr::call(Expr::ident("jsx"), vec![Expr::ident("Icon")])
            ),
            Prop::spread(Expr::ident("rest")),
        ])
    );
}

#[test]
fn dynamic_slots_pass_through_untouched() {
    // The dynamic `width` slot is invisible to the logical view; the
    // pipeline edits its siblings around it.
    let mut arg = Expr::object(vec![
        Prop::entry("width", Expr::member(Expr::ident("theme"), "width")),
        Prop::entry("size", Expr::str("7")),
    ]);
    let rule = Rule::new(ComponentMatcher::exact("Box")).with_schema(coercing_schema);
    refine_call_site(&mut arg, &rule, &RefineOptions::default()).unwrap();
    assert_eq!(
        arg,
        Expr::object(vec![
            Prop::entry("width", Expr::member(Expr::ident("theme"), "width")),
            Prop::entry("size", Expr::num(7.0)),
        ])
    );
}

#[test]
fn validation_failure_aborts_without_mutation() {
    let mut arg = Expr::object(vec![Prop::entry("size", Expr::str("huge"))]);
    let snapshot = arg.clone();
    let rule = Rule::new(ComponentMatcher::exact("Button")).with_schema(coercing_schema);
    let err = refine_call_site(&mut arg, &rule, &RefineOptions::default()).unwrap_err();
    assert!(matches!(err, RefineError::Validation { .. }));
    assert_eq!(arg, snapshot);
}

#[test]
fn extraction_roundtrips_through_the_encoder() {
    // Extract a fully static container, write it back unchanged through a
    // set patch, and extract again: structurally equal data.
    let tree = Expr::object(vec![Prop::entry(
        "cfg",
        Expr::object(vec![
            Prop::entry("name", Expr::str("x")),
            Prop::entry("flags", Expr::items(vec![Expr::bool(true), Expr::null()])),
            Prop::entry(
                "sparse",
                Expr::array(vec![ArrayElem::Item(Expr::num(1.0)), ArrayElem::Hole]),
            ),
            Prop::entry("re", Expr::regex("a+", "i")),
            Prop::entry("nothing", Expr::ident("undefined")),
        ]),
    )]);
    let preserved = PreservedKeys::default();
    let first = extract_root(&tree, &preserved).unwrap();
    let cfg = first.data.as_obj().unwrap()["cfg"].clone();

    let mut rebuilt = Expr::object(vec![Prop::entry("cfg", Expr::null())]);
    let consolidated = consolidate(PatchGroups {
        diff: vec![PatchOp::set(vec![Step::key("cfg")], cfg.clone())],
        derive: vec![],
        prune: vec![],
    });
    let outcome =
        apply_patches(&mut rebuilt, &consolidated, &preserved, &first.side_channel).unwrap();
    assert!(outcome.fully_applied());

    let second = extract_root(&rebuilt, &preserved).unwrap();
    assert_eq!(second.data.as_obj().unwrap()["cfg"], cfg);
}

#[test]
fn reapplying_a_consolidated_set_is_a_no_op() {
    let mut arg = Expr::object(vec![
        Prop::entry("a", Expr::num(1.0)),
        Prop::entry("b", Expr::str("x")),
    ]);
    let consolidated = consolidate(PatchGroups {
        diff: vec![
            PatchOp::set(vec![Step::key("a")], Data::Num(2.0)),
            PatchOp::set(vec![Step::key("b")], Data::str("y")),
        ],
        derive: vec![],
        prune: vec![],
    });
    let preserved = PreservedKeys::default();
    let first = apply_patches(&mut arg, &consolidated, &preserved, &NoPreserved).unwrap();
    assert!(first.fully_applied());
    let snapshot = arg.clone();
    let second = apply_patches(&mut arg, &consolidated, &preserved, &NoPreserved).unwrap();
    assert!(second.fully_applied());
    assert_eq!(arg, snapshot);
}

#[test]
fn preserved_subtrees_survive_container_rewrites() {
    // The validator replaces the whole `slots` object; the preserved child
    // inside it must ride along via the side channel.
    let child = Expr::call(Expr::ident("jsx"), vec![Expr::ident("Icon")]);
    let mut arg = Expr::object(vec![Prop::entry(
        "slots",
        Expr::object(vec![
            Prop::entry("children", child.clone()),
            Prop::entry("align", Expr::str("start")),
        ]),
    )]);

    let rule = Rule::new(ComponentMatcher::exact("Card")).with_schema(|data: &Data| {
        let obj = data.as_obj().unwrap();
        let slots = obj["slots"].as_obj().unwrap();
        let mut new_slots = slots.clone();
        new_slots.insert("align".to_owned(), Data::str("center"));
        let mut out = obj.clone();
        out.insert("slots".to_owned(), Data::obj(new_slots));
        Validation::value(Data::obj(out))
    });

    refine_call_site(&mut arg, &rule, &RefineOptions::default()).unwrap();
    assert_eq!(
        arg,
        Expr::object(vec![Prop::entry(
            "slots",
            Expr::object(vec![
                Prop::entry("children", child),
                Prop::entry("align", Expr::str("center")),
            ]),
        )])
    );
}

#[test]
fn derived_preserved_keys_are_dropped_before_the_patcher() {
    let child = Expr::call(Expr::ident("jsx"), vec![Expr::ident("Icon")]);
    let mut arg = Expr::object(vec![
        Prop::entry("label", Expr::str("x")),
        Prop::entry("children", child.clone()),
    ]);
    let rule = Rule::new(ComponentMatcher::exact("Button")).with_derive(
        |_: &Data, emit: &mut dyn FnMut(Entries)| {
            emit(entries(vec![("children", Data::str("nope"))]));
        },
    );
    // Rejected, not unapplied: the site completes and the subtree stands.
    let outcome = refine_call_site(&mut arg, &rule, &RefineOptions::default()).unwrap();
    assert!(matches!(outcome, SiteOutcome::Applied { .. }));
    assert_eq!(
        arg,
        Expr::object(vec![
            Prop::entry("label", Expr::str("x")),
            Prop::entry("children", child),
        ])
    );
}

#[test]
fn strict_arrays_block_whole_container_only() {
    let mut arg = Expr::object(vec![
        Prop::entry(
            "sizes",
            Expr::items(vec![Expr::num(1.0), Expr::ident("dynamicSize")]),
        ),
        Prop::entry("size", Expr::str("3")),
    ]);
    let rule = Rule::new(ComponentMatcher::exact("Grid")).with_schema(coercing_schema);
    refine_call_site(&mut arg, &rule, &RefineOptions::default()).unwrap();
    // `sizes` was non-static and untouched; `size` still coerced.
    assert_eq!(
        arg,
        Expr::object(vec![
            Prop::entry(
                "sizes",
                Expr::items(vec![Expr::num(1.0), Expr::ident("dynamicSize")]),
            ),
            Prop::entry("size", Expr::num(3.0)),
        ])
    );
}

#[test]
fn custom_preserved_keys_are_respected() {
    let handler = Expr::ident("onPress");
    let mut arg = Expr::object(vec![
        Prop::entry("render", handler.clone()),
        Prop::entry("size", Expr::str("2")),
    ]);
    let options = RefineOptions {
        preserved: PreservedKeys::new(["render"]),
        ..RefineOptions::default()
    };
    let rule = Rule::new(ComponentMatcher::exact("List")).with_schema(coercing_schema);
    refine_call_site(&mut arg, &rule, &options).unwrap();
    assert_eq!(
        arg,
        Expr::object(vec![
            Prop::entry("render", handler),
            Prop::entry("size", Expr::num(2.0)),
        ])
    );
}
