//! Property tests for descent, arity and keyword precedence

use http::Method;
use nsrouter::binder::{Coerce, ParamType};
use nsrouter::registry::{HandlerDescriptor, HandlerGroupBuilder, HandlerRegistry};
use nsrouter::transport::Params;
use nsrouter::{BoundArguments, ErrorKind, ParamBinder, PathResolver, Reply};
use proptest::prelude::*;
use serde_json::Value;
use std::collections::HashSet;

const PREFIXES: [&str; 5] = ["/a", "/a/b", "/a/b/c", "/b", "/b/a/d"];

fn noop() -> HandlerDescriptor {
    HandlerDescriptor::new(Method::GET, |_: BoundArguments| Ok(Reply::new(Value::Null)))
}

fn tree() -> HandlerRegistry {
    PREFIXES
        .iter()
        .fold(HandlerRegistry::builder(), |b, p| {
            b.group(p, HandlerGroupBuilder::fallback().handler(noop()))
        })
        .build()
        .unwrap()
}

/// Every namespace path in the tree, intermediates included
fn namespace_paths() -> HashSet<String> {
    let mut paths = HashSet::from(["/".to_string()]);
    for p in PREFIXES {
        let segs: Vec<&str> = p.split('/').filter(|s| !s.is_empty()).collect();
        for i in 1..=segs.len() {
            paths.insert(format!("/{}", segs[..i].join("/")));
        }
    }
    paths
}

fn params(entries: &[(String, String)]) -> Params {
    entries
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect()
}

fn descriptor(k: usize, m: usize, variadic: bool) -> HandlerDescriptor {
    let mut desc = noop().required((0..k).map(|i| format!("r{i}")));
    for i in 0..m {
        desc = desc.optional(&format!("o{i}"), Value::Null);
    }
    if variadic {
        desc = desc.variadic_keyword();
    }
    desc
}

fn segments(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("s{i}")).collect()
}

proptest! {
    #[test]
    fn descent_takes_longest_registered_prefix(
        segs in prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "d", "x"]), 0..7)
    ) {
        let reg = tree();
        let segs: Vec<String> = segs.into_iter().map(str::to_string).collect();
        let (node, consumed) = PathResolver::for_registry(&reg).descend(&segs);

        prop_assert!(consumed <= segs.len());
        let expected_path = if consumed == 0 {
            "/".to_string()
        } else {
            format!("/{}", segs[..consumed].join("/"))
        };
        prop_assert_eq!(node.path().as_ref(), expected_path.as_str());

        let known = namespace_paths();
        if consumed < segs.len() {
            let longer = format!("/{}", segs[..=consumed].join("/"));
            prop_assert!(!known.contains(&longer));
        }
    }

    #[test]
    fn arity_bounds(k in 0usize..4, m in 0usize..4, n in 0usize..10) {
        let desc = descriptor(k, m, false);
        let result = ParamBinder::bind(&segments(n), Params::new(), &desc);
        if n < k {
            prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::MissingPathParam);
        } else if n > k + m {
            prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::TooManyPathParams);
        } else {
            let args = result.unwrap();
            prop_assert_eq!(args.positional.len(), n);
            // unfilled optionals fall back to their defaults
            prop_assert_eq!(args.keyword.len(), k + m - n);
        }
    }

    #[test]
    fn rest_absorbs_and_validates_every_extra_segment(
        k in 0usize..3,
        m in 0usize..3,
        extra in 0usize..6,
        bad in any::<prop::sample::Index>(),
    ) {
        let desc = descriptor(k, m, false)
            .rest("tail")
            .validator(Coerce::new("tail", ParamType::Integer));
        let n = k + m + extra;
        let mut segs: Vec<String> = (0..n).map(|i| i.to_string()).collect();

        let args = ParamBinder::bind(&segs, Params::new(), &desc).unwrap();
        prop_assert_eq!(args.positional.len(), n);
        let tail: Vec<&Value> = args.values("tail").collect();
        prop_assert_eq!(tail.len(), extra);
        for (i, value) in tail.into_iter().enumerate() {
            prop_assert_eq!(value.as_u64(), Some((k + m + i) as u64));
        }

        if extra > 0 {
            segs[k + m + bad.index(extra)] = "x".to_string();
            let err = ParamBinder::bind(&segs, Params::new(), &desc).unwrap_err();
            prop_assert_eq!(err.kind(), ErrorKind::InvalidParam);
        }
    }

    #[test]
    fn variadic_absorbs_keywords_not_segments(
        k in 0usize..3,
        extra in prop::collection::btree_map("[x-z][a-z]{0,4}", "[a-z0-9]{0,6}", 0..5),
    ) {
        let desc = descriptor(k, 0, true);
        let kw: Params = extra.iter().map(|(a, b)| (a.clone(), Value::String(b.clone()))).collect();

        let args = ParamBinder::bind(&segments(k), kw.clone(), &desc).unwrap();
        prop_assert_eq!(&args.keyword, &kw);

        let too_many = ParamBinder::bind(&segments(k + 1), kw, &desc);
        prop_assert_eq!(too_many.unwrap_err().kind(), ErrorKind::TooManyPathParams);
    }

    #[test]
    fn body_overrides_query(
        query in prop::collection::vec(("[a-e]", "[a-z]{1,4}"), 0..6),
        body in prop::collection::vec(("[a-e]", "[A-Z]{1,4}"), 0..6),
    ) {
        let query = params(&query);
        let body = params(&body);
        let merged = ParamBinder::merge(&query, &body);

        for (key, value) in &merged {
            match body.get(key) {
                Some(b) => prop_assert_eq!(value, b),
                None => prop_assert_eq!(Some(value), query.get(key)),
            }
        }
        prop_assert!(query.keys().chain(body.keys()).all(|k| merged.contains_key(k)));

        let twice = ParamBinder::merge(&merged, &body);
        prop_assert_eq!(twice, merged);
    }
}
