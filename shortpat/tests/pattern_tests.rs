//! End-to-end behavior of the pattern language
//!
//! Parsing, validation, matching, generation and storage exercised through
//! the public API only.

use shortpat::{
    CompileError, CompiledPatternRecord, ConstraintError, HeuristicOptions, HeuristicRecord,
    ParseErrorKind, PatternCompiler, PatternError, PatternHeuristic, PatternSet, TypeError,
    ValidationError, Value, ValueError, compile,
};

const PAGE: &str = "PAGE{uid:int(min=1)}(-{lang:int(min=0,default=0)})";

mod matching {
    use super::*;

    #[test]
    fn test_page_with_default_language() {
        let result = compile(PAGE).unwrap().match_str("PAGE5").unwrap();
        assert!(!result.is_failed());
        assert_eq!(result.get("uid"), Some(&Value::Int(5)));
        assert_eq!(result.get("lang"), Some(&Value::Int(0)));
    }

    #[test]
    fn test_page_with_language() {
        let result = compile(PAGE).unwrap().match_str("PAGE5-2").unwrap();
        assert_eq!(result.get("uid"), Some(&Value::Int(5)));
        assert_eq!(result.get("lang"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_constraint_violation_is_not_a_structural_failure() {
        let result = compile(PAGE).unwrap().match_str("PAGE0").unwrap();
        assert!(result.is_failed());
        assert_eq!(result.errors()[0].group, "uid");
        assert!(matches!(result.errors()[0].error, ValueError::Violation { .. }));
        assert_eq!(result.get("lang"), Some(&Value::Int(0)));
    }

    #[test]
    fn test_empty_input_never_matches() {
        for pattern in [PAGE, "({a:int})", "(x)", "(a)(b)"] {
            assert!(compile(pattern).unwrap().match_str("").is_none(), "{}", pattern);
        }
    }

    #[test]
    fn test_negative_numbers() {
        let pattern = compile("t{n:int}x").unwrap();
        assert_eq!(pattern.match_str("t-12x").unwrap().get("n"), Some(&Value::Int(-12)));
        assert!(compile("t{n:int(min=0)}x").unwrap().match_str("t-12x").is_none());
    }

    #[test]
    fn test_max_bounds_digit_width() {
        let pattern = compile("p{a:int(max=99)}{b:int}").unwrap();
        let result = pattern.match_str("p12345").unwrap();
        assert_eq!(result.get("a"), Some(&Value::Int(12)));
        assert_eq!(result.get("b"), Some(&Value::Int(345)));
    }

    #[test]
    fn test_max_does_not_bound_negative_values() {
        let pattern = compile("n{v:int(max=5)}").unwrap();
        let generated = pattern.generate([("v", -100i64)]).unwrap();
        assert_eq!(generated, "n-100");
        let result = pattern.match_str(&generated).unwrap();
        assert_eq!(result.get("v"), Some(&Value::Int(-100)));
        assert!(pattern.match_str("n10").is_none());
    }

    #[test]
    fn test_non_ascii_digits_do_not_match() {
        assert!(compile("PAGE{uid:int}").unwrap().match_str("PAGE\u{0663}").is_none());

        let compiler = PatternCompiler::default();
        let set = PatternSet::new(vec![
            compiler.compile("x{n:int}").unwrap(),
            compiler.compile("x{rest:string(minLen=1)}").unwrap(),
        ]);
        assert!(set.find("x\u{0663}").is_none());
        let (index, _) = set.find("x3").unwrap();
        assert_eq!(index, 0);
    }

    #[test]
    fn test_string_constraints() {
        let pattern = compile("u/{name:string(minLen=3,startsWith=a)}").unwrap();
        assert!(pattern.match_str("u/ab").is_none());
        assert!(pattern.match_str("u/bob").unwrap().is_failed());
        let result = pattern.match_str("u/alice").unwrap();
        assert_eq!(result.get("name"), Some(&Value::from("alice")));
    }

    #[test]
    fn test_quoted_constraint_values() {
        let pattern = compile(r#"x{s:string(maxLen=4, default="home")}?"#).unwrap();
        assert_eq!(pattern.match_str("x").unwrap().get("s"), Some(&Value::from("home")));
        assert_eq!(pattern.group_constraints()["s"]["default"], "home");
    }

    #[test]
    fn test_nested_optional_sections() {
        let pattern = compile("a{x:int}(-{y:int}(-{z:int}))").unwrap();
        assert_eq!(pattern.regex(), r"^a(?P<g1>-?[0-9]+)(?:\-(?P<g2>-?[0-9]+)(?:\-(?P<g3>-?[0-9]+))?)?$");
        let result = pattern.match_str("a1-2-3").unwrap();
        assert_eq!(result.get("z"), Some(&Value::Int(3)));
        assert!(pattern.match_str("a1-2-").is_none());
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let pattern = compile("a.b+{n:int}").unwrap();
        assert!(pattern.match_str("a.b+1").is_some());
        assert!(pattern.match_str("axbb1").is_none());
    }
}

mod syntax {
    use super::*;

    #[test]
    fn test_group_sugar_is_equivalent() {
        let sugar = compile("a{x:int}?").unwrap();
        let explicit = compile("a({x:int})").unwrap();
        assert_eq!(sugar.regex(), explicit.regex());
        assert_eq!(sugar.ast(), explicit.ast());
    }

    #[test]
    fn test_unterminated_group() {
        match compile("PAGE{uid:int") {
            Err(PatternError::Parse(err)) => {
                assert_eq!(err.kind, ParseErrorKind::UnterminatedGroup);
                assert_eq!(err.offset, 4);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_optional() {
        assert!(matches!(
            compile("PAGE(-{a:int}"),
            Err(PatternError::Parse(err)) if err.kind == ParseErrorKind::UnterminatedOptional
        ));
    }

    #[test]
    fn test_unknown_type_lists_valid_types() {
        let err = compile("{x:float}").unwrap_err();
        match &err {
            PatternError::Type(TypeError::UnknownType { available, .. }) => {
                assert_eq!(available, "int, string");
            }
            other => panic!("expected type error, got {:?}", other),
        }
        assert!(err.to_string().contains("float"));
    }

    #[test]
    fn test_unknown_constraint() {
        assert!(matches!(
            compile("{x:int(maxLen=3)}"),
            Err(PatternError::Constraint(ConstraintError::Unknown { .. }))
        ));
    }

    #[test]
    fn test_default_must_convert() {
        assert!(matches!(
            compile("x{a:int(default=abc)}"),
            Err(PatternError::Constraint(ConstraintError::InvalidParameter { .. }))
        ));
        assert!(compile("x{a:int(default=-3)}").is_ok());
    }

    #[test]
    fn test_contradicting_bounds() {
        assert!(matches!(
            compile("{x:int(min=5,max=1)}"),
            Err(PatternError::Constraint(ConstraintError::Contradiction { .. }))
        ));
    }
}

mod validation {
    use super::*;

    #[test]
    fn test_duplicate_group_names() {
        assert_eq!(
            compile("{a:int}{a:string}").unwrap_err(),
            PatternError::Validation(ValidationError::DuplicateGroupName("a".to_string()))
        );
        assert!(matches!(
            compile("{a:int}-({a:int})"),
            Err(PatternError::Validation(ValidationError::DuplicateGroupName(_)))
        ));
    }

    #[test]
    fn test_adjacent_greedy_groups() {
        let err = compile("{g1:int}{g2:int}").unwrap_err();
        assert_eq!(
            err,
            PatternError::Validation(ValidationError::AdjacentGreedyGroups {
                first: "g1".to_string(),
                second: "g2".to_string(),
            })
        );
    }

    #[test]
    fn test_empty_optional_section() {
        assert_eq!(
            compile("PAGE()").unwrap_err(),
            PatternError::Validation(ValidationError::EmptyOptionalSection)
        );
    }
}

mod generation {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_generate_skips_unbound_optional() {
        let pattern = compile(PAGE).unwrap();
        assert_eq!(pattern.generate([("uid", 5i64)]).unwrap(), "PAGE5");
        assert_eq!(pattern.generate([("uid", 5i64), ("lang", 2)]).unwrap(), "PAGE5-2");
    }

    #[test]
    fn test_generate_from_match_result() {
        let pattern = compile(PAGE).unwrap();
        for input in ["PAGE7-3", "PAGE42-0"] {
            let result = pattern.match_str(input).unwrap();
            assert_eq!(pattern.generate(result.groups()).unwrap(), input);
            assert_eq!(pattern.generate(result.to_array()).unwrap(), input);
        }
    }

    #[test]
    fn test_generate_ignores_unknown_keys() {
        let pattern = compile("n{id:int}").unwrap();
        let mut values = BTreeMap::new();
        values.insert("id", Value::Int(3));
        values.insert("other", Value::from("x"));
        assert_eq!(pattern.generate(values).unwrap(), "n3");
    }

    #[test]
    fn test_generate_string_values() {
        let pattern = compile("u/{name:string}(/{tab:string})").unwrap();
        assert_eq!(
            pattern.generate([("name", "alice"), ("tab", "posts")]).unwrap(),
            "u/alice/posts"
        );
    }
}

mod storage {
    use super::*;

    #[test]
    fn test_compiled_pattern_round_trip() {
        let compiler = PatternCompiler::default();
        let pattern = compiler.compile(PAGE).unwrap();
        let json = pattern.to_record().to_json().unwrap();
        let restored = compiler
            .from_record(&CompiledPatternRecord::from_json(&json).unwrap())
            .unwrap();

        assert_eq!(restored.regex(), pattern.regex());
        assert_eq!(restored.named_groups(), pattern.named_groups());
        assert_eq!(restored.group_types(), pattern.group_types());
        assert_eq!(restored.group_constraints(), pattern.group_constraints());
        for input in ["PAGE5", "PAGE5-2", "PAGE0", "PAGE"] {
            assert_eq!(restored.match_str(input), pattern.match_str(input), "{}", input);
        }
    }

    #[test]
    fn test_corrupt_json() {
        let err = PatternCompiler::default().from_json("{\"version\":1}").unwrap_err();
        assert!(matches!(err, PatternError::Compile(CompileError::Corrupt(_))));
    }

    #[test]
    fn test_heuristic_round_trip() {
        let set = PatternSet::compile(
            &PatternCompiler::default(),
            [PAGE, "NEWS{id:int}", "{slug:string}.html"],
        )
        .unwrap();
        let json = set.heuristic().to_record().to_json().unwrap();
        let restored = PatternHeuristic::from_record(HeuristicRecord::from_json(&json).unwrap()).unwrap();
        assert_eq!(&restored, set.heuristic());

        let rebuilt = PatternSet::from_parts(set.patterns().to_vec(), restored);
        let (index, _) = rebuilt.find("about.html").unwrap();
        assert_eq!(index, 2);
    }

    #[test]
    fn test_single_character_literal_option() {
        let options = HeuristicOptions {
            min_literal_length: 1,
            ..HeuristicOptions::default()
        };
        let set = PatternSet::with_options(vec![compile("p{uid:int}").unwrap()], options);
        let (_, result) = set.find("p1").unwrap();
        assert_eq!(result.get("uid"), Some(&Value::Int(1)));
    }
}
