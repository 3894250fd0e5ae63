use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use fedq_query::{MatchFieldQuery, Pagination, Query, SortOption};
use serde_json::json;

use super::{
    CompoundSearcher, SearcherSpec, SpecTable, build::Planner, condense::condense, execute::execute,
    sorting::add_sorting,
    tree::{RequestNode, SpecId},
};
use crate::{
    context::Context,
    error::SearchError,
    memory::MemorySearcher,
    options::{CombinedOptions, DataType, FieldRegistry, OptionsMap},
    result::SearchResult,
    searcher::{Searcher, Transformation},
};

/// A backend that returns canned results and records every query it gets.
#[derive(Debug, Default)]
struct MockSearcher {
    results: Vec<SearchResult>,
    fail: bool,
    calls: AtomicUsize,
    queries: Mutex<Vec<Query>>,
}

impl MockSearcher {
    fn returning(ids: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            results: ids.iter().map(|id| SearchResult::new(*id)).collect(),
            ..Self::default()
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn queries(&self) -> Vec<Query> {
        self.queries.lock().unwrap().clone()
    }
}

impl Searcher for MockSearcher {
    fn search(&self, _ctx: &Context, query: &Query) -> Result<Vec<SearchResult>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        if self.fail {
            return Err(SearchError::Backend {
                backend: "mock".into(),
                message: "boom".into(),
            });
        }
        Ok(self.results.clone())
    }

    fn count(&self, ctx: &Context, query: &Query) -> Result<usize, SearchError> {
        Ok(self.search(ctx, query)?.len())
    }
}

fn registry(category: &str, labels: &[&str]) -> Arc<FieldRegistry> {
    let mut builder = FieldRegistry::builder(category);
    for label in labels {
        builder = builder.field(*label, label.to_lowercase());
    }
    Arc::new(builder.build().unwrap())
}

fn mock_spec(name: &str, searcher: Arc<MockSearcher>, labels: &[&str]) -> SearcherSpec {
    SearcherSpec::new(name, searcher, registry(name, labels))
}

/// A table of empty mock specs, one per label list; the first is default.
pub(crate) fn table(fields: &[&[&str]]) -> SpecTable {
    let specs: Vec<Arc<SearcherSpec>> = fields
        .iter()
        .enumerate()
        .map(|(i, labels)| {
            let spec = mock_spec(&format!("s{i}"), MockSearcher::returning(&[]), labels);
            Arc::new(if i == 0 { spec.as_default() } else { spec })
        })
        .collect();
    SpecTable::new(&specs)
}

fn table_of(specs: Vec<SearcherSpec>) -> SpecTable {
    let specs: Vec<Arc<SearcherSpec>> = specs.into_iter().map(Arc::new).collect();
    SpecTable::new(&specs)
}

fn built(query: &Query, table: &mut SpecTable) -> Option<RequestNode> {
    super::build::build(query, table).unwrap()
}

fn ids(results: &[SearchResult]) -> Vec<&str> {
    results.iter().map(|r| r.id.as_str()).collect()
}

fn deployments() -> Arc<MemorySearcher> {
    let registry = FieldRegistry::builder("deployments")
        .field("Deployment", "name")
        .field("Cluster", "cluster")
        .typed_field("Replicas", "replicas", DataType::Numeric)
        .build()
        .unwrap();
    Arc::new(
        MemorySearcher::new(
            Arc::new(registry),
            vec![
                json!({"id": "d1", "name": "web", "cluster": "prod", "replicas": 3}),
                json!({"id": "d2", "name": "cache", "cluster": "prod", "replicas": 1}),
                json!({"id": "d3", "name": "api", "cluster": "staging", "replicas": 10}),
                json!({"id": "d4", "name": "batch", "cluster": "staging"}),
            ],
        )
        .unwrap(),
    )
}

fn images() -> Arc<MemorySearcher> {
    let registry = FieldRegistry::builder("images")
        .field("Image", "name")
        .field("Image Tag", "tag")
        .build()
        .unwrap();
    Arc::new(
        MemorySearcher::new(
            Arc::new(registry),
            vec![
                json!({"id": "i1", "name": "nginx", "tag": "1.25", "deployment_ids": ["d1"]}),
                json!({"id": "i2", "name": "redis", "tag": "latest", "deployment_ids": ["d2"]}),
                json!({"id": "i3", "name": "nginx", "tag": "latest", "deployment_ids": ["d3"]}),
                json!({"id": "i4", "name": "envoy", "tag": "latest", "deployment_ids": ["d1", "d3"]}),
            ],
        )
        .unwrap(),
    )
}

/// Deployments (default) and images linked to deployments.
fn fixture_specs() -> Vec<SearcherSpec> {
    let deployments = deployments();
    let images = images();
    let link = images.link_transformation("deployment_ids");
    vec![
        SearcherSpec::new("deployments", deployments.clone(), deployments.registry()).as_default(),
        SearcherSpec::new("images", images.clone(), images.registry())
            .with_transformation(Arc::clone(&link))
            .with_link_to_prev(link),
    ]
}

fn fixture() -> CompoundSearcher {
    CompoundSearcher::new(fixture_specs()).unwrap()
}

fn search(searcher: &CompoundSearcher, query: &Query) -> Vec<String> {
    searcher
        .search(&Context::background(), query)
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect()
}

fn sorted_by(field: &str) -> Pagination {
    Pagination::sorted_by(vec![SortOption::asc(field)])
}

mod construction {
    use super::*;

    #[test]
    fn rejects_empty_spec_list() {
        assert!(matches!(
            CompoundSearcher::new(vec![]),
            Err(SearchError::NoSearcherSpecs)
        ));
    }

    #[test]
    fn rejects_multiple_defaults() {
        let specs = vec![
            mock_spec("a", MockSearcher::returning(&[]), &["A"]).as_default(),
            mock_spec("b", MockSearcher::returning(&[]), &["B"]).as_default(),
        ];
        assert!(matches!(
            CompoundSearcher::new(specs),
            Err(SearchError::MultipleDefaultSpecs(2))
        ));
    }
}

mod planning {
    use super::*;

    #[test]
    fn single_spec_takes_the_whole_query() {
        let mut table = table(&[&["A"]]);
        let query = Query::conjunction(vec![
            Query::match_field("A", "x"),
            Query::match_field("Unknown", "y"),
        ]);
        assert_eq!(
            built(&query, &mut table),
            Some(RequestNode::base(SpecId(0), query.clone()))
        );
    }

    #[test]
    fn field_goes_to_first_spec_that_knows_it() {
        let mut table = table(&[&["A"], &["B"], &["B"]]);
        let query = Query::match_field("b", "x");
        assert_eq!(
            built(&query, &mut table),
            Some(RequestNode::base(SpecId(1), query))
        );
    }

    #[test]
    fn unknown_field_falls_back_to_default_unchanged() {
        let mut table = table(&[&["A"], &["B"]]);
        let query = Query::match_field("C", "x");
        assert_eq!(
            built(&query, &mut table),
            Some(RequestNode::base(SpecId(0), query))
        );
    }

    #[test]
    fn unknown_field_without_default_is_an_error() {
        let mut table = table_of(vec![
            mock_spec("a", MockSearcher::returning(&[]), &["A"]),
            mock_spec("b", MockSearcher::returning(&[]), &["B"]),
        ]);
        let err = super::super::build::build(&Query::match_field("C", "x"), &mut table).unwrap_err();
        assert!(matches!(err, SearchError::NoDefaultSpec(_)));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn doc_ids_and_match_none_go_to_default() {
        let mut table = table(&[&["A"], &["B"]]);
        let ids = Query::doc_ids(["1"]);
        assert_eq!(
            built(&ids, &mut table),
            Some(RequestNode::base(SpecId(0), ids))
        );
        assert_eq!(
            built(&Query::match_none(), &mut table),
            Some(RequestNode::base(SpecId(0), Query::match_none()))
        );
    }

    #[test]
    fn composites_wrap_children() {
        let mut table = table(&[&["A"], &["B"]]);
        let query = Query::disjunction(vec![Query::match_field("A", "x"), Query::match_field("B", "y")]);
        assert_eq!(
            built(&query, &mut table),
            Some(RequestNode::Or(vec![
                RequestNode::base(SpecId(0), Query::match_field("A", "x")),
                RequestNode::base(SpecId(1), Query::match_field("B", "y")),
            ]))
        );
    }

    #[test]
    fn boolean_without_must_is_no_constraint() {
        let mut table = table(&[&["A"], &["B"]]);
        let void = Query::boolean(vec![], vec![Query::match_field("A", "x")]);
        assert_eq!(built(&void, &mut table), None);

        let query = Query::conjunction(vec![Query::match_field("B", "y"), void]);
        assert_eq!(
            built(&query, &mut table),
            Some(RequestNode::And(vec![RequestNode::base(
                SpecId(1),
                Query::match_field("B", "y")
            )]))
        );
    }

    #[test]
    fn empty_composite_is_no_constraint() {
        let mut table = table(&[&["A"], &["B"]]);
        assert_eq!(built(&Query::conjunction(vec![]), &mut table), None);
        assert_eq!(
            built(&Query::disjunction(vec![Query::boolean(vec![], vec![])]), &mut table),
            None
        );
    }

    #[test]
    fn unconstrained_query_plans_as_match_all() {
        let plan = fixture().plan(&Query::conjunction(vec![])).unwrap();
        assert_eq!(plan.built, None);
        assert_eq!(plan.executable, RequestNode::base(SpecId(0), Query::empty()));
    }

    #[test]
    fn linked_fields_prefer_a_covering_spec() {
        let mut table = table(&[&["A"], &["B", "C"]]);
        let query = Query::match_linked_fields(vec![
            MatchFieldQuery::new("B", "x"),
            MatchFieldQuery::new("C", "y"),
        ]);
        assert_eq!(
            built(&query, &mut table),
            Some(RequestNode::base(SpecId(1), query))
        );
    }

    #[test]
    fn linked_fields_across_specs_synthesize_a_chain() {
        let searcher = fixture();
        let query = Query::match_linked_fields(vec![
            MatchFieldQuery::new("Cluster", "prod"),
            MatchFieldQuery::new("Image Tag", "\"latest\""),
        ]);
        let plan = searcher.plan(&query).unwrap();
        assert_eq!(plan.synthesized(), 1);
        assert_eq!(
            plan.built,
            Some(RequestNode::base(
                SpecId(2),
                Query::conjunction(vec![
                    Query::match_field("Cluster", "prod"),
                    Query::match_field("Image Tag", "\"latest\""),
                ])
            ))
        );
        assert_eq!(plan.spec_name(SpecId(2)), "linked(deployments > images)");
    }

    #[test]
    fn linked_fields_nobody_knows_go_to_default() {
        let mut table = table(&[&["A"], &["B"]]);
        let query = Query::match_linked_fields(vec![
            MatchFieldQuery::new("X", "1"),
            MatchFieldQuery::new("Y", "2"),
        ]);
        assert_eq!(
            built(&query, &mut table),
            Some(RequestNode::base(SpecId(0), query))
        );
    }

    #[test]
    fn linked_fields_without_fields_are_unsupported() {
        let mut table = table(&[&["A"], &["B"]]);
        let err = super::super::build::build(&Query::match_linked_fields(vec![]), &mut table).unwrap_err();
        assert!(matches!(err, SearchError::UnsupportedQueryType(_)));
    }
}

mod condensing {
    use super::*;

    #[test]
    fn merges_same_spec_children_of_a_built_tree() {
        let mut table = table(&[&["A", "C"], &["B"]]);
        let query = Query::conjunction(vec![
            Query::match_field("A", "1"),
            Query::match_field("B", "2"),
            Query::match_field("C", "3"),
        ]);
        let tree = built(&query, &mut table).unwrap();
        assert_eq!(
            condense(tree).unwrap(),
            RequestNode::And(vec![
                RequestNode::base(
                    SpecId(0),
                    Query::conjunction(vec![Query::match_field("A", "1"), Query::match_field("C", "3")])
                ),
                RequestNode::base(SpecId(1), Query::match_field("B", "2")),
            ])
        );
    }

    #[test]
    fn condensing_preserves_results() {
        let queries = [
            Query::conjunction(vec![
                Query::match_field("Deployment", "web"),
                Query::match_field("Image", "nginx"),
                Query::match_field("Cluster", "prod"),
            ]),
            Query::disjunction(vec![
                Query::match_field("Deployment", "web"),
                Query::match_field("Deployment", "cache"),
                Query::match_field("Image", "redis"),
            ]),
            Query::boolean(
                vec![Query::match_field("Cluster", "staging")],
                vec![Query::match_field("Image", "envoy")],
            ),
            Query::boolean(
                vec![Query::match_field("Cluster", "prod")],
                vec![
                    Query::match_field("Deployment", "cache"),
                    Query::match_field("Replicas", ">5"),
                ],
            ),
        ];
        let ctx = Context::background();
        for query in &queries {
            let mut table = table_of(fixture_specs());
            let tree = built(query, &mut table).unwrap();
            let plain = execute(&ctx, &tree, &table).unwrap().into_results();
            let condensed = execute(&ctx, &condense(tree.clone()).unwrap(), &table)
                .unwrap()
                .into_results();
            assert_eq!(ids(&plain), ids(&condensed), "query:\n{query}");
        }
    }

    #[test]
    fn condensing_is_a_fixed_point() {
        let mut table = table_of(fixture_specs());
        let query = Query::conjunction(vec![
            Query::match_field("Deployment", "web"),
            Query::disjunction(vec![
                Query::match_field("Image", "nginx"),
                Query::match_field("Cluster", "prod"),
                Query::match_field("Image Tag", "latest"),
            ]),
            Query::match_field("Cluster", "prod"),
        ]);
        let once = condense(built(&query, &mut table).unwrap()).unwrap();
        assert_eq!(condense(once.clone()).unwrap(), once);
    }

    #[test]
    fn condensing_saves_backend_calls() {
        let a = MockSearcher::returning(&["1", "2"]);
        let b = MockSearcher::returning(&["2"]);
        let searcher = CompoundSearcher::new(vec![
            mock_spec("a", Arc::clone(&a), &["A"]).as_default(),
            mock_spec("b", Arc::clone(&b), &["B"]),
        ])
        .unwrap();
        let query = Query::conjunction(vec![
            Query::match_field("A", "x"),
            Query::match_field("B", "y"),
            Query::match_field("A", "z"),
        ]);
        let results = searcher.search(&Context::background(), &query).unwrap();
        assert_eq!(ids(&results), vec!["2"]);
        assert_eq!(a.calls(), 1);
        assert_eq!(b.calls(), 1);
        assert_eq!(
            a.queries()[0],
            Query::conjunction(vec![Query::match_field("A", "x"), Query::match_field("A", "z")])
        );
    }
}

mod sorting {
    use super::*;

    #[test]
    fn attaches_to_a_sortable_root_leaf() {
        let table = table(&[&["A"], &["B"]]);
        let tree = RequestNode::base(SpecId(1), Query::match_field("B", "x"));
        let pagination = sorted_by("B").with_limit(5).with_offset(2);
        assert_eq!(
            add_sorting(tree, Some(&pagination), &table).unwrap(),
            RequestNode::base(SpecId(1), Query::match_field("B", "x").with_pagination(sorted_by("B")))
        );
    }

    #[test]
    fn attaches_to_a_direct_child_of_and() {
        let table = table(&[&["A"], &["B"]]);
        let tree = RequestNode::And(vec![
            RequestNode::base(SpecId(0), Query::match_field("A", "x")),
            RequestNode::base(SpecId(1), Query::match_field("B", "y")),
        ]);
        assert_eq!(
            add_sorting(tree, Some(&sorted_by("B")), &table).unwrap(),
            RequestNode::And(vec![
                RequestNode::base(SpecId(0), Query::match_field("A", "x")),
                RequestNode::base(SpecId(1), Query::match_field("B", "y").with_pagination(sorted_by("B"))),
            ])
        );
    }

    #[test]
    fn wraps_in_a_left_join_otherwise() {
        let table = table(&[&["A"], &["B"]]);
        let tree = RequestNode::Or(vec![
            RequestNode::base(SpecId(0), Query::match_field("A", "x")),
            RequestNode::base(SpecId(1), Query::match_field("B", "y")),
        ]);
        assert_eq!(
            add_sorting(tree.clone(), Some(&sorted_by("B")), &table).unwrap(),
            RequestNode::LeftJoinWithRightOrder {
                left: Box::new(tree),
                right: Box::new(RequestNode::base(
                    SpecId(1),
                    Query::empty().with_pagination(sorted_by("B"))
                )),
            }
        );
    }

    #[test]
    fn unsortable_field_is_an_error() {
        let table = table(&[&["A"], &["B"]]);
        let tree = RequestNode::base(SpecId(0), Query::match_field("A", "x"));
        let pagination = Pagination::sorted_by(vec![SortOption::asc("A"), SortOption::asc("B")]);
        assert!(matches!(
            add_sorting(tree, Some(&pagination), &table),
            Err(SearchError::NoMatchingSortSpec(fields)) if fields == vec!["A".to_string(), "B".to_string()]
        ));
    }

    #[test]
    fn sorts_and_pages_on_one_backend() {
        let searcher = fixture();
        let query = Query::match_field("Cluster", "*").with_pagination(
            Pagination::sorted_by(vec![SortOption::desc("Replicas")]).with_limit(2),
        );
        assert_eq!(search(&searcher, &query), vec!["d3", "d1"]);
        assert_eq!(searcher.count(&Context::background(), &query).unwrap(), 4);

        let next = query.clone().with_pagination(
            Pagination::sorted_by(vec![SortOption::desc("Replicas")])
                .with_limit(2)
                .with_offset(2),
        );
        assert_eq!(search(&searcher, &next), vec!["d2", "d4"]);
    }

    #[test]
    fn sorts_by_another_backend() {
        let searcher = fixture();
        let query = Query::match_field("Image", "*").with_pagination(sorted_by("Deployment"));
        assert_eq!(search(&searcher, &query), vec!["d3", "d2", "d1"]);
    }
}

mod execution {
    use super::*;

    #[test]
    fn federated_queries_over_linked_entities() {
        let searcher = fixture();
        assert_eq!(search(&searcher, &Query::match_field("Image", "nginx")), vec!["d1", "d3"]);
        assert_eq!(
            search(
                &searcher,
                &Query::conjunction(vec![
                    Query::match_field("Cluster", "prod"),
                    Query::match_field("Image", "nginx"),
                ])
            ),
            vec!["d1"]
        );
        assert_eq!(
            search(
                &searcher,
                &Query::boolean(
                    vec![Query::match_field("Cluster", "staging")],
                    vec![Query::match_field("Image", "envoy")],
                )
            ),
            vec!["d4"]
        );
        assert_eq!(
            search(
                &searcher,
                &Query::disjunction(vec![
                    Query::match_field("Deployment", "cache"),
                    Query::match_field("Image", "envoy"),
                ])
            ),
            vec!["d1", "d2", "d3"]
        );
        assert_eq!(search(&searcher, &Query::empty()).len(), 4);
    }

    #[test]
    fn linked_fields_across_backends() {
        let searcher = fixture();
        let chained = Query::match_linked_fields(vec![
            MatchFieldQuery::new("Cluster", "prod"),
            MatchFieldQuery::new("Image Tag", "\"latest\""),
        ]);
        assert_eq!(search(&searcher, &chained), vec!["d1", "d2"]);

        let covered = Query::match_linked_fields(vec![
            MatchFieldQuery::new("Image", "nginx"),
            MatchFieldQuery::new("Image Tag", "\"latest\""),
        ]);
        assert_eq!(search(&searcher, &covered), vec!["d3"]);
    }

    #[test]
    fn single_spec_matches_the_backend() {
        let backend = deployments();
        let searcher = CompoundSearcher::new(vec![
            SearcherSpec::new("deployments", backend.clone(), backend.registry()).as_default(),
        ])
        .unwrap();
        let ctx = Context::background();
        let queries = [
            Query::match_field("Cluster", "prod"),
            Query::boolean(
                vec![Query::match_field("Cluster", "*")],
                vec![Query::match_field("Deployment", "web")],
            ),
            Query::match_field("Replicas", ">=1").with_pagination(
                Pagination::sorted_by(vec![SortOption::desc("Deployment")]).with_limit(2),
            ),
            Query::empty().with_pagination(Pagination::default().with_offset(1)),
        ];
        for query in &queries {
            let direct = backend.search(&ctx, query).unwrap();
            let compound = searcher.search(&ctx, query).unwrap();
            assert_eq!(ids(&direct), ids(&compound), "query:\n{query}");
        }
    }

    /// Runs a planned tree over `table`; `None` when nothing was planned.
    fn run_planned(tree: Option<RequestNode>, table: &SpecTable) -> Option<Vec<String>> {
        let tree = condense(tree?).unwrap();
        let results = execute(&Context::background(), &tree, table).unwrap();
        Some(results.into_results().into_iter().map(|r| r.id).collect())
    }

    #[test]
    fn single_spec_shortcut_agrees_with_general_planning() {
        let backend = deployments();
        let one_spec = || {
            table_of(vec![
                SearcherSpec::new("deployments", backend.clone(), backend.registry()).as_default(),
            ])
        };
        let queries = [
            Query::match_field("Cluster", "prod"),
            Query::conjunction(vec![
                Query::match_field("Cluster", "prod"),
                Query::match_field("Replicas", ">=2"),
            ]),
            Query::disjunction(vec![
                Query::match_field("Deployment", "api"),
                Query::match_field("Deployment", "batch"),
            ]),
            Query::boolean(
                vec![Query::match_field("Cluster", "*")],
                vec![Query::match_field("Deployment", "web")],
            ),
        ];
        for query in &queries {
            let mut short = one_spec();
            let shortcut = run_planned(built(query, &mut short), &short);
            let mut general = one_spec();
            let planned = Planner { table: &mut general }.plan(query).unwrap();
            assert_eq!(shortcut, run_planned(planned, &general), "query:\n{query}");
        }
    }

    #[test]
    fn boolean_without_must_diverges_from_the_shortcut() {
        let backend = deployments();
        let one_spec = || {
            table_of(vec![
                SearcherSpec::new("deployments", backend.clone(), backend.registry()).as_default(),
            ])
        };
        let query = Query::boolean(vec![], vec![Query::match_field("Deployment", "web")]);

        let mut short = one_spec();
        let shortcut = run_planned(built(&query, &mut short), &short);
        assert_eq!(shortcut.unwrap(), vec!["d2", "d3", "d4"]);

        // An empty must side places no constraint, so the general planner
        // drops the whole boolean.
        let mut general = one_spec();
        assert!(Planner { table: &mut general }.plan(&query).unwrap().is_none());
    }

    #[test]
    fn empty_intersection_skips_later_backends() {
        let a = MockSearcher::returning(&[]);
        let b = MockSearcher::returning(&["1"]);
        let searcher = CompoundSearcher::new(vec![
            mock_spec("a", Arc::clone(&a), &["A"]).as_default(),
            mock_spec("b", Arc::clone(&b), &["B"]),
        ])
        .unwrap();
        let query = Query::conjunction(vec![Query::match_field("A", "x"), Query::match_field("B", "y")]);
        assert!(searcher.search(&Context::background(), &query).unwrap().is_empty());
        assert_eq!(a.calls(), 1);
        assert_eq!(b.calls(), 0);
    }

    #[test]
    fn union_visits_every_child() {
        let a = MockSearcher::returning(&[]);
        let b = MockSearcher::returning(&["1"]);
        let searcher = CompoundSearcher::new(vec![
            mock_spec("a", Arc::clone(&a), &["A"]).as_default(),
            mock_spec("b", Arc::clone(&b), &["B"]),
        ])
        .unwrap();
        let query = Query::disjunction(vec![Query::match_field("A", "x"), Query::match_field("B", "y")]);
        let results = searcher.search(&Context::background(), &query).unwrap();
        assert_eq!(ids(&results), vec!["1"]);
        assert_eq!(b.calls(), 1);
    }

    #[test]
    fn left_join_uses_right_order_only_when_sorted() {
        let left = MockSearcher::returning(&["1", "3", "6"]);
        let right = MockSearcher::returning(&["6", "2", "1"]);
        let table = table_of(vec![
            mock_spec("left", left, &["L"]).as_default(),
            mock_spec("right", right, &["R"]),
        ]);
        let ctx = Context::background();
        let join = |right_query: Query| RequestNode::LeftJoinWithRightOrder {
            left: Box::new(RequestNode::base(SpecId(0), Query::match_field("L", "x"))),
            right: Box::new(RequestNode::base(SpecId(1), right_query)),
        };

        let unordered = execute(&ctx, &join(Query::empty()), &table).unwrap().into_results();
        assert_eq!(ids(&unordered), vec!["1", "3", "6"]);

        let ordered = execute(&ctx, &join(Query::empty().with_pagination(sorted_by("R"))), &table)
            .unwrap()
            .into_results();
        assert_eq!(ids(&ordered), vec!["6", "3", "1"]);
    }

    #[test]
    fn left_join_with_empty_left_skips_right() {
        let left = MockSearcher::returning(&[]);
        let right = MockSearcher::returning(&["1"]);
        let table = table_of(vec![
            mock_spec("left", left, &["L"]).as_default(),
            mock_spec("right", Arc::clone(&right), &["R"]),
        ]);
        let node = RequestNode::LeftJoinWithRightOrder {
            left: Box::new(RequestNode::base(SpecId(0), Query::empty())),
            right: Box::new(RequestNode::base(SpecId(1), Query::empty().with_pagination(sorted_by("R")))),
        };
        assert!(execute(&Context::background(), &node, &table).unwrap().is_empty());
        assert_eq!(right.calls(), 0);
    }

    #[test]
    fn boolean_with_empty_exclusion_returns_must() {
        let must = MockSearcher::returning(&["2", "1"]);
        let must_not = MockSearcher::returning(&[]);
        let table = table_of(vec![
            mock_spec("must", must, &["M"]).as_default(),
            mock_spec("must_not", Arc::clone(&must_not), &["N"]),
        ]);
        let node = RequestNode::Boolean {
            must: Box::new(RequestNode::base(SpecId(0), Query::empty())),
            must_not: Box::new(RequestNode::base(SpecId(1), Query::empty())),
        };
        let results = execute(&Context::background(), &node, &table).unwrap().into_results();
        assert_eq!(ids(&results), vec!["1", "2"]);
        assert_eq!(must_not.calls(), 1);
    }

    #[test]
    fn transformation_remaps_ids() {
        let backend = MockSearcher::returning(&["c1", "c2"]);
        let transformation: Transformation = Arc::new(|_: &Context, id: &str| match id {
            "c1" => vec!["i2".to_string(), "i1".to_string()],
            _ => vec!["i2".to_string()],
        });
        let table = table_of(vec![
            mock_spec("components", backend, &["C"])
                .as_default()
                .with_transformation(transformation),
        ]);
        let node = RequestNode::base(SpecId(0), Query::empty());
        let results = execute(&Context::background(), &node, &table).unwrap().into_results();
        assert_eq!(ids(&results), vec!["i1", "i2"]);
    }

    #[test]
    fn empty_composite_node_is_an_error() {
        let table = table(&[&["A"]]);
        assert!(matches!(
            execute(&Context::background(), &RequestNode::Or(vec![]), &table),
            Err(SearchError::EmptyExecutionTree)
        ));
    }

    #[test]
    fn backend_errors_abort_the_search() {
        let ok = MockSearcher::returning(&["1"]);
        let searcher = CompoundSearcher::new(vec![
            mock_spec("a", MockSearcher::failing(), &["A"]).as_default(),
            mock_spec("b", Arc::clone(&ok), &["B"]),
        ])
        .unwrap();
        let query = Query::disjunction(vec![Query::match_field("A", "x"), Query::match_field("B", "y")]);
        let err = searcher.search(&Context::background(), &query).unwrap_err();
        assert!(matches!(err, SearchError::Backend { .. }));
        assert_eq!(ok.calls(), 0);
    }

    #[test]
    fn cancelled_context_calls_no_backend() {
        let a = MockSearcher::returning(&["1"]);
        let searcher =
            CompoundSearcher::new(vec![mock_spec("a", Arc::clone(&a), &["A"]).as_default()]).unwrap();
        let ctx = Context::background();
        ctx.cancel();
        assert!(matches!(
            searcher.search(&ctx, &Query::match_field("A", "x")),
            Err(SearchError::Cancelled)
        ));
        assert_eq!(a.calls(), 0);
    }

    #[test]
    fn compound_searchers_nest() {
        let inner = fixture();
        let maps: Vec<Arc<dyn OptionsMap>> = vec![
            deployments().registry() as Arc<dyn OptionsMap>,
            images().registry() as Arc<dyn OptionsMap>,
        ];
        let outer = CompoundSearcher::new(vec![
            SearcherSpec::new("inventory", Arc::new(inner), Arc::new(CombinedOptions::new(maps)))
                .as_default(),
        ])
        .unwrap();
        let query = Query::conjunction(vec![
            Query::match_field("Cluster", "prod"),
            Query::match_field("Image", "nginx"),
        ]);
        assert_eq!(search(&outer, &query), vec!["d1"]);
    }

    #[test]
    fn repeated_searches_are_identical() {
        let searcher = fixture();
        let query = Query::disjunction(vec![
            Query::match_field("Image", "*"),
            Query::match_field("Cluster", "staging"),
        ])
        .with_pagination(sorted_by("Deployment"));
        let first = search(&searcher, &query);
        for _ in 0..5 {
            assert_eq!(search(&searcher, &query), first);
        }
        assert_eq!(first, vec!["d3", "d4", "d2", "d1"]);
    }
}
