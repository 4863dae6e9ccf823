//! Matching and URL building through the public router API.

use waymark::navigation::ErrorKind;
use waymark::routing::{resolve, Location};
use waymark::{optional, param, params, path, query, query_optional, ParamValue, Route, Router, Schema};

mod common;

#[test]
fn test_build_then_match_round_trips() {
    let app = common::App::new();
    let router = app.router();

    let url = router.build(&app.user, &params! { "id" => 42 }).unwrap();
    assert_eq!(url, "/users/42");

    let tree = router.match_url(&url).unwrap().unwrap();
    let leaf = tree.leaf();
    assert!(leaf.route.ptr_eq(&app.user));
    assert_eq!(leaf.params["id"], ParamValue::Number(42.0));
    assert_eq!(leaf.route.build(&leaf.params).as_deref(), Some("/users/42"));
}

#[test]
fn test_round_trip_with_query_and_encoding() {
    let route = Route::new([
        path("search"),
        param("term", Schema::text()),
        query("page", Schema::integer()),
        query_optional("sort", Schema::one_of(["asc", "desc"])),
    ])
    .unwrap();

    let url = route
        .build(&params! { "term" => "rust lang", "page" => 2 })
        .unwrap();
    assert_eq!(url, "/search/rust%20lang?page=2");

    let tree = resolve(&[route.clone()], &Location::parse(&url).unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(tree.params["term"], ParamValue::from("rust lang"));
    assert_eq!(tree.params["page"], ParamValue::Number(2.0));
    assert!(!tree.params.contains_key("sort"));
}

#[test]
fn test_missing_or_invalid_param_is_unbuildable() {
    let app = common::App::new();
    let router = app.router();

    assert_eq!(router.build(&app.user, &params! {}), None);
    assert_eq!(router.build(&app.user, &params! { "id" => "abc" }), None);
    assert_eq!(router.build_named("files", &params! { "path" => Vec::<String>::new() }), None);
    assert_eq!(router.build_named("nope", &params! {}), None);
    assert_eq!(router.build_named("root", &params! {}).as_deref(), Some("/"));
}

#[test]
fn test_missing_or_invalid_query_is_unbuildable() {
    let search = Route::new([path("search"), query("q", Schema::any())]).unwrap();
    assert_eq!(search.build(&params! {}), None);
    assert_eq!(search.build(&params! { "q" => "rust" }).as_deref(), Some("/search?q=rust"));

    let paged = Route::parse("/list?page<integer>&[sort]").unwrap();
    assert_eq!(paged.build(&params! { "page" => "two" }), None);
    assert_eq!(paged.build(&params! { "page" => 3 }).as_deref(), Some("/list?page=3"));
}

#[test]
fn test_literal_with_sub_delimiters_matches_raw_and_built_forms() {
    let route = Route::new([path("a!b")]).unwrap();
    let routes = [route.clone()];

    let raw = resolve(&routes, &Location::parse("/a!b").unwrap()).unwrap();
    assert!(raw.is_some_and(|tree| tree.route.ptr_eq(&route)));

    let built = route.build(&params! {}).unwrap();
    assert!(resolve(&routes, &Location::parse(&built).unwrap())
        .unwrap()
        .is_some());
}

#[test]
fn test_registry_order_breaks_ties() {
    let first = Route::parse("/about").unwrap().named("first");
    let second = Route::parse("/about").unwrap().named("second");
    let router = Router::builder().route(first).route(second).build();

    let tree = router.match_url("/about").unwrap().unwrap();
    assert_eq!(tree.route.name(), Some("first"));
    assert!(tree.child.is_none());
}

#[test]
fn test_wildcard_captures_remaining_segments() {
    let app = common::App::new();
    let router = app.router();

    let tree = router.match_url("/files/docs/2024/report.pdf").unwrap().unwrap();
    let leaf = tree.leaf();
    assert!(leaf.route.ptr_eq(&app.files));
    assert_eq!(
        leaf.params["path"].as_list().unwrap(),
        ["docs", "2024", "report.pdf"]
    );
    assert_eq!(
        router.build(&app.files, &leaf.params).as_deref(),
        Some("/files/docs/2024/report.pdf")
    );

    // A wildcard needs at least one segment.
    let bare = router.match_url("/files").unwrap().unwrap();
    assert!(bare.route.ptr_eq(&app.root));
    assert!(bare.child.is_none());
}

#[test]
fn test_parent_child_tree() {
    let app = common::App::new();
    let router = app.router();

    let tree = router.match_url("/users/7?tab=posts#bio").unwrap().unwrap();
    assert!(tree.route.ptr_eq(&app.root));
    assert_eq!(tree.pathname, "/");

    // Child is the first strictly-longer success in registry order.
    let child = tree.child.as_deref().unwrap();
    assert!(child.route.ptr_eq(&app.users));
    assert_eq!(child.pathname, "/users");
    assert_eq!(child.search, "tab=posts");
    assert_eq!(child.hash, "bio");
    assert_eq!(tree.depth(), 2);

    let nested = router.match_nested("/users/7").unwrap().unwrap();
    let names: Vec<_> = nested.iter().filter_map(|n| n.route.name()).collect();
    assert_eq!(names, vec!["root", "users", "user"]);
}

#[test]
fn test_optional_segment_and_terminator() {
    let edit = Route::parse("/posts/:id/[edit]$").unwrap();

    let with = resolve(&[edit.clone()], &Location::parse("/posts/3/edit").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(with.params["edit"], ParamValue::Flag(true));

    let without = resolve(&[edit.clone()], &Location::parse("/posts/3").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(without.params["edit"], ParamValue::Flag(false));

    // The terminator rejects leftover path.
    assert!(resolve(&[edit], &Location::parse("/posts/3/edit/more").unwrap())
        .unwrap()
        .is_none());

    let manual = Route::new([path("a"), optional("b"), waymark::end()]).unwrap();
    assert_eq!(manual.pattern(), "/a/[b]$");
}

#[test]
fn test_path_validation_excludes_route_silently() {
    let app = common::App::new();
    let router = app.router();

    let tree = router.match_url("/users/abc").unwrap().unwrap();
    // `/users/:id<integer>` rejected the token; `/users` is the deepest match.
    assert!(tree.leaf().route.ptr_eq(&app.users));
    assert_eq!(tree.leaf().pathname, "/users");
}

#[test]
fn test_query_validation_failure_is_an_error() {
    let search = Route::parse("/search?page<integer>").unwrap();
    let router = Router::builder().route(search).build();

    let err = router.match_url("/search?page=two").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    assert!(router.match_url("/search?page=2").unwrap().is_some());
    // Required query value missing.
    assert!(router.match_url("/search").is_err());
}

#[test]
fn test_no_match() {
    let router = Router::builder().route(Route::parse("/only").unwrap()).build();
    assert!(router.match_url("/other").unwrap().is_none());
}
