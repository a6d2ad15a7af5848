//! Unit tests for yamll modules

mod common;

mod resolve_test {
    use crate::common::{MockFetcher, roots};
    use yamll::error::Error;
    use yamll::graph::resolve;

    #[tokio::test]
    async fn test_only_caller_roots_are_entry_roots() {
        let fetcher = MockFetcher::new()
            .with_fragment("R1.yaml", "##++X.yaml\nr1: 1")
            .with_fragment("R2.yaml", "r2: 2")
            .with_fragment("X.yaml", "x: 1");

        let graph = resolve(&fetcher, &roots(&["R1.yaml", "R2.yaml"]))
            .await
            .unwrap();

        assert_eq!(graph.roots(), ["R1.yaml", "R2.yaml"]);
        assert!(graph.get("R1.yaml").unwrap().is_entry_root);
        assert!(graph.get("R2.yaml").unwrap().is_entry_root);
        assert!(!graph.get("X.yaml").unwrap().is_entry_root);
        assert_eq!(graph.len(), 3);
    }

    #[tokio::test]
    async fn test_diamond_fetches_each_fragment_once() {
        // R -> A -> C, R -> B -> C
        let fetcher = MockFetcher::new()
            .with_fragment("R.yaml", "##++A.yaml\n##++B.yaml\nr: 1")
            .with_fragment("A.yaml", "##++C.yaml\na: 1")
            .with_fragment("B.yaml", "##++C.yaml\nb: 1")
            .with_fragment("C.yaml", "c: 1");

        let graph = resolve(&fetcher, &roots(&["R.yaml"])).await.unwrap();

        assert_eq!(graph.len(), 4);
        assert_eq!(fetcher.fetch_count("C.yaml"), 1);
        assert_eq!(
            fetcher.fetch_calls(),
            ["R.yaml", "A.yaml", "C.yaml", "B.yaml"]
        );
    }

    #[tokio::test]
    async fn test_root_imported_by_earlier_root_stays_plain() {
        let fetcher = MockFetcher::new()
            .with_fragment("R1.yaml", "##++R2.yaml\nr1: 1")
            .with_fragment("R2.yaml", "r2: 2");

        let graph = resolve(&fetcher, &roots(&["R1.yaml", "R2.yaml"]))
            .await
            .unwrap();

        assert_eq!(graph.roots(), ["R1.yaml"]);
        assert!(!graph.get("R2.yaml").unwrap().is_entry_root);
        assert_eq!(fetcher.fetch_count("R2.yaml"), 1);
    }

    #[tokio::test]
    async fn test_body_excludes_directives() {
        let fetcher = MockFetcher::new()
            .with_fragment("R.yaml", "##++A.yaml\n\nkey: value\n\nother: 1\n")
            .with_fragment("A.yaml", "a: 1");

        let graph = resolve(&fetcher, &roots(&["R.yaml"])).await.unwrap();
        let root = graph.get("R.yaml").unwrap();

        assert_eq!(root.body, "key: value\nother: 1");
        assert!(root.imports("A.yaml"));
    }

    #[tokio::test]
    async fn test_fetch_error_stops_resolution() {
        let fetcher = MockFetcher::new()
            .with_fragment("R.yaml", "##++A.yaml\n##++B.yaml\nr: 1")
            .with_fragment("B.yaml", "b: 1");
        fetcher.fail_on("A.yaml", "connection refused");

        let err = resolve(&fetcher, &roots(&["R.yaml"])).await.unwrap_err();

        assert!(matches!(err, Error::Fetch { ref path, .. } if path == "A.yaml"));
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(fetcher.fetch_count("B.yaml"), 0);
    }

    #[tokio::test]
    async fn test_malformed_credentials_fail() {
        let fetcher = MockFetcher::new()
            .with_fragment("R.yaml", "##++https://example.com/a.yaml;{not json\nr: 1");

        let err = resolve(&fetcher, &roots(&["R.yaml"])).await.unwrap_err();

        assert!(matches!(err, Error::Directive { .. }));
        assert_eq!(fetcher.fetch_calls(), ["R.yaml"]);
    }
}

mod merge_test {
    use crate::common::{MockFetcher, roots};
    use yamll::error::Error;
    use yamll::graph::resolve;
    use yamll::merge::{CycleCheck, MergeOptions, merge_routes};

    async fn merged(
        fetcher: &MockFetcher,
        files: &[&str],
        options: &MergeOptions,
    ) -> yamll::Result<String> {
        let mut graph = resolve(fetcher, &roots(files)).await?;
        merge_routes(&mut graph, options)
    }

    fn sources(text: &str) -> Vec<&str> {
        text.lines()
            .filter_map(|line| line.strip_prefix("# Source: "))
            .collect()
    }

    #[tokio::test]
    async fn test_imports_precede_importer() {
        let fetcher = MockFetcher::new()
            .with_fragment("R.yaml", "##++A.yaml\nroot: true")
            .with_fragment("A.yaml", "a: 1");

        let out = merged(&fetcher, &["R.yaml"], &MergeOptions::default())
            .await
            .unwrap();

        insta::assert_snapshot!(out, @r"
        ---
        # Source: A.yaml
        a: 1
        ---
        # Source: R.yaml
        root: true
        ");
    }

    #[tokio::test]
    async fn test_diamond_emits_shared_fragment_once() {
        let fetcher = MockFetcher::new()
            .with_fragment("R.yaml", "##++A.yaml\n##++B.yaml\nr: 1")
            .with_fragment("A.yaml", "##++C.yaml\na: 1")
            .with_fragment("B.yaml", "##++C.yaml\nb: 1")
            .with_fragment("C.yaml", "c: 1");

        let out = merged(&fetcher, &["R.yaml"], &MergeOptions::default())
            .await
            .unwrap();

        assert_eq!(sources(&out), ["C.yaml", "A.yaml", "B.yaml", "R.yaml"]);
    }

    #[tokio::test]
    async fn test_declaration_order_is_kept() {
        let fetcher = MockFetcher::new()
            .with_fragment("R.yaml", "##++B.yaml\n##++A.yaml\nr: 1")
            .with_fragment("A.yaml", "a: 1")
            .with_fragment("B.yaml", "b: 1");

        let out = merged(&fetcher, &["R.yaml"], &MergeOptions::default())
            .await
            .unwrap();

        assert_eq!(sources(&out), ["B.yaml", "A.yaml", "R.yaml"]);
    }

    #[tokio::test]
    async fn test_roots_follow_caller_order() {
        let fetcher = MockFetcher::new()
            .with_fragment("R1.yaml", "##++X.yaml\nr1: 1")
            .with_fragment("R2.yaml", "##++X.yaml\nr2: 2")
            .with_fragment("X.yaml", "x: 1");

        let out = merged(&fetcher, &["R1.yaml", "R2.yaml"], &MergeOptions::default())
            .await
            .unwrap();

        assert_eq!(sources(&out), ["X.yaml", "R1.yaml", "R2.yaml"]);
    }

    #[tokio::test]
    async fn test_root_imported_by_earlier_root_emitted_once() {
        let fetcher = MockFetcher::new()
            .with_fragment("R1.yaml", "##++R2.yaml\nr1: 1")
            .with_fragment("R2.yaml", "r2: 2");

        let out = merged(&fetcher, &["R1.yaml", "R2.yaml"], &MergeOptions::default())
            .await
            .unwrap();

        assert_eq!(sources(&out), ["R2.yaml", "R1.yaml"]);
    }

    #[tokio::test]
    async fn test_custom_limiter() {
        let fetcher = MockFetcher::new()
            .with_fragment("R.yaml", "##++A.yaml\nr: 1")
            .with_fragment("A.yaml", "a: 1");
        let options = MergeOptions {
            limiter: "--- # next".to_string(),
            ..MergeOptions::default()
        };

        let out = merged(&fetcher, &["R.yaml"], &options).await.unwrap();

        assert_eq!(
            out,
            "--- # next\n# Source: A.yaml\na: 1\n--- # next\n# Source: R.yaml\nr: 1\n"
        );
    }

    #[tokio::test]
    async fn test_mutual_import_rejected() {
        let fetcher = MockFetcher::new()
            .with_fragment("A.yaml", "##++B.yaml\na: 1")
            .with_fragment("B.yaml", "##++A.yaml\nb: 1");

        let err = merged(&fetcher, &["A.yaml"], &MergeOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::MutualImport { ref file, ref dependency }
                if file == "A.yaml" && dependency == "B.yaml"
        ));
    }

    #[tokio::test]
    async fn test_long_cycle_exceeds_depth_by_default() {
        // A -> B -> C -> A
        let fetcher = MockFetcher::new()
            .with_fragment("A.yaml", "##++B.yaml\na: 1")
            .with_fragment("B.yaml", "##++C.yaml\nb: 1")
            .with_fragment("C.yaml", "##++A.yaml\nc: 1");

        let err = merged(&fetcher, &["A.yaml"], &MergeOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ImportDepthExceeded { limit: 3, .. }));
    }

    #[tokio::test]
    async fn test_long_cycle_reported_with_full_check() {
        let fetcher = MockFetcher::new()
            .with_fragment("A.yaml", "##++B.yaml\na: 1")
            .with_fragment("B.yaml", "##++C.yaml\nb: 1")
            .with_fragment("C.yaml", "##++A.yaml\nc: 1");
        let options = MergeOptions {
            cycle_check: CycleCheck::Full,
            ..MergeOptions::default()
        };

        let err = merged(&fetcher, &["A.yaml"], &options).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            Error::ImportCycle {
                chain: vec![
                    "A.yaml".to_string(),
                    "B.yaml".to_string(),
                    "C.yaml".to_string(),
                    "A.yaml".to_string(),
                ],
            }
            .to_string()
        );
    }

    #[tokio::test]
    async fn test_acyclic_graph_passes_full_check() {
        let fetcher = MockFetcher::new()
            .with_fragment("R.yaml", "##++A.yaml\n##++B.yaml\nr: 1")
            .with_fragment("A.yaml", "##++B.yaml\na: 1")
            .with_fragment("B.yaml", "b: 1");
        let options = MergeOptions {
            cycle_check: CycleCheck::Full,
            ..MergeOptions::default()
        };

        let out = merged(&fetcher, &["R.yaml"], &options).await.unwrap();

        assert_eq!(sources(&out), ["B.yaml", "A.yaml", "R.yaml"]);
    }
}

mod effective_test {
    use crate::common::{MockFetcher, pipeline};
    use yaml_rust2::YamlLoader;
    use yamll::PostProcess;
    use yamll::error::Error;

    #[tokio::test]
    async fn test_importer_overrides_imports() {
        let fetcher = MockFetcher::new()
            .with_fragment("A.yaml", "a: 1\nb:\n  x: 1")
            .with_fragment("R.yaml", "##++A.yaml\na: 2\nb:\n  y: 2");

        let out = pipeline(&fetcher, &["R.yaml"], PostProcess::EffectiveMerge)
            .import()
            .await
            .unwrap();

        assert_eq!(out, "a: 2\nb:\n  x: 1\n  y: 2\n");
    }

    #[tokio::test]
    async fn test_anchors_resolve_across_fragments() {
        let fetcher = MockFetcher::new()
            .with_fragment("A.yaml", "base: &base\n  k: v")
            .with_fragment("R.yaml", "##++A.yaml\nuse:\n  <<: *base\n  extra: 1");

        let out = pipeline(&fetcher, &["R.yaml"], PostProcess::EffectiveMerge)
            .import()
            .await
            .unwrap();

        let docs = YamlLoader::load_from_str(&out).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["base"]["k"].as_str(), Some("v"));
        assert_eq!(docs[0]["use"]["k"].as_str(), Some("v"));
        assert_eq!(docs[0]["use"]["extra"].as_i64(), Some(1));
    }

    #[tokio::test]
    async fn test_inline_document_in_fragment_is_merged() {
        let fetcher = MockFetcher::new()
            .with_fragment("A.yaml", "a: 1\n--- {b: 2}\n")
            .with_fragment("R.yaml", "##++A.yaml\nc: 3");

        let out = pipeline(&fetcher, &["R.yaml"], PostProcess::EffectiveMerge)
            .import()
            .await
            .unwrap();

        assert_eq!(out, "a: 1\nb: 2\nc: 3\n");
    }

    #[tokio::test]
    async fn test_scalar_document_rejected() {
        let fetcher = MockFetcher::new()
            .with_fragment("A.yaml", "- just\n- a list")
            .with_fragment("R.yaml", "##++A.yaml\nr: 1");

        let err = pipeline(&fetcher, &["R.yaml"], PostProcess::EffectiveMerge)
            .import()
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Yaml { ref document, .. } if document == "'A.yaml'"));
    }
}

mod explode_test {
    use crate::common::{MockFetcher, pipeline};
    use yaml_rust2::YamlLoader;
    use yamll::PostProcess;
    use yamll::error::Error;

    #[tokio::test]
    async fn test_output_has_no_anchors_or_aliases() {
        let fetcher = MockFetcher::new()
            .with_fragment("A.yaml", "base: &base\n  k: v\nlist: &items\n  - 1\n  - 2")
            .with_fragment(
                "R.yaml",
                "##++A.yaml\nuse:\n  <<: *base\n  extra: 1\ncopy: *items",
            );

        let out = pipeline(&fetcher, &["R.yaml"], PostProcess::Explode)
            .import()
            .await
            .unwrap();

        assert!(!out.contains('&'));
        assert!(!out.contains('*'));
        assert!(!out.contains("<<"));

        let docs = YamlLoader::load_from_str(&out).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1]["use"]["k"].as_str(), Some("v"));
        assert_eq!(docs[1]["use"]["extra"].as_i64(), Some(1));
        assert_eq!(docs[1]["copy"], docs[0]["list"]);
    }

    #[tokio::test]
    async fn test_headers_are_kept() {
        let fetcher = MockFetcher::new()
            .with_fragment("A.yaml", "a: &x 1")
            .with_fragment("R.yaml", "##++A.yaml\nr: *x");

        let out = pipeline(&fetcher, &["R.yaml"], PostProcess::Explode)
            .import()
            .await
            .unwrap();

        assert_eq!(out, "---\n# Source: A.yaml\na: 1\n---\n# Source: R.yaml\nr: 1\n");
    }

    #[tokio::test]
    async fn test_fragment_opening_with_document_marker_keeps_header() {
        let fetcher = MockFetcher::new()
            .with_fragment("A.yaml", "---\na: &x 1\n")
            .with_fragment("R.yaml", "##++A.yaml\nr: *x");

        let out = pipeline(&fetcher, &["R.yaml"], PostProcess::Explode)
            .import()
            .await
            .unwrap();

        assert_eq!(out, "---\n# Source: A.yaml\na: 1\n---\n# Source: R.yaml\nr: 1\n");
    }

    #[tokio::test]
    async fn test_unknown_alias_fails() {
        let fetcher = MockFetcher::new().with_fragment("R.yaml", "r: *missing");

        let err = pipeline(&fetcher, &["R.yaml"], PostProcess::Explode)
            .import()
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Yaml { .. }));
        assert!(err.to_string().contains("missing"));
    }
}

mod build_test {
    use crate::common::{MockFetcher, pipeline};
    use yamll::PostProcess;

    #[tokio::test]
    async fn test_build_emits_only_roots() {
        let fetcher = MockFetcher::new()
            .with_fragment("A.yaml", "base: &base\n  k: v")
            .with_fragment("R.yaml", "##++A.yaml\nuse: *base");

        let out = pipeline(&fetcher, &["R.yaml"], PostProcess::None)
            .build()
            .await
            .unwrap();

        assert_eq!(out, "---\n# Source: R.yaml\nuse:\n  k: v\n");
    }

    #[tokio::test]
    async fn test_build_one_document_per_root() {
        let fetcher = MockFetcher::new()
            .with_fragment("A.yaml", "port: &port 8080")
            .with_fragment("R1.yaml", "##++A.yaml\none: *port")
            .with_fragment("R2.yaml", "##++A.yaml\ntwo: *port");

        let out = pipeline(&fetcher, &["R1.yaml", "R2.yaml"], PostProcess::None)
            .build()
            .await
            .unwrap();

        assert_eq!(
            out,
            "---\n# Source: R1.yaml\none: 8080\n---\n# Source: R2.yaml\ntwo: 8080\n"
        );
    }

    #[tokio::test]
    async fn test_build_keeps_every_document_of_a_root() {
        let fetcher = MockFetcher::new()
            .with_fragment("A.yaml", "p: &p 5")
            .with_fragment("R.yaml", "##++A.yaml\none: *p\n---\ntwo: *p\n");

        let out = pipeline(&fetcher, &["R.yaml"], PostProcess::None)
            .build()
            .await
            .unwrap();

        assert_eq!(out, "---\n# Source: R.yaml\none: 5\n---\ntwo: 5\n");
    }

    #[tokio::test]
    async fn test_build_skips_directive_only_root() {
        let fetcher = MockFetcher::new()
            .with_fragment("A.yaml", "a: 1")
            .with_fragment("R.yaml", "##++A.yaml\n");

        let out = pipeline(&fetcher, &["R.yaml"], PostProcess::None)
            .build()
            .await
            .unwrap();

        assert_eq!(out, "");
    }
}

mod tree_test {
    use crate::common::{MockFetcher, pipeline};
    use yamll::PostProcess;

    #[tokio::test]
    async fn test_tree_of_diamond() {
        let fetcher = MockFetcher::new()
            .with_fragment("R.yaml", "##++A.yaml\n##++B.yaml\nr: 1")
            .with_fragment("A.yaml", "##++C.yaml\na: 1")
            .with_fragment("B.yaml", "##++C.yaml\nb: 1")
            .with_fragment("C.yaml", "c: 1");

        let out = pipeline(&fetcher, &["R.yaml"], PostProcess::None)
            .tree()
            .await
            .unwrap();

        insta::assert_snapshot!(out, @r"
        R.yaml
        ├── A.yaml
        │   └── C.yaml
        └── B.yaml
            └── C.yaml
        ");
    }

    #[tokio::test]
    async fn test_tree_marks_cycles() {
        let fetcher = MockFetcher::new()
            .with_fragment("A.yaml", "##++B.yaml\na: 1")
            .with_fragment("B.yaml", "##++A.yaml\nb: 1");

        let out = pipeline(&fetcher, &["A.yaml"], PostProcess::None)
            .tree()
            .await
            .unwrap();

        assert_eq!(out, "A.yaml\n└── B.yaml\n    └── A.yaml (cycle)\n");
    }
}

mod env_test {
    use serial_test::serial;
    use yamll::directive::{parse_directive, parse_fragment};

    const VAR: &str = "YAMLL_TEST_USER";

    #[test]
    #[serial]
    #[allow(unsafe_code)]
    fn test_credentials_read_environment() {
        // SAFETY: serialised with every other test touching the environment
        unsafe { std::env::set_var(VAR, "bob") };

        let dep = parse_directive(&format!(
            "##++https://example.com/a.yaml;{{\"user_name\":\"${{{VAR}}}\"}}"
        ))
        .unwrap()
        .unwrap();

        // SAFETY: as above
        unsafe { std::env::remove_var(VAR) };

        assert_eq!(dep.auth.username.as_deref(), Some("bob"));
    }

    #[test]
    #[serial]
    #[allow(unsafe_code)]
    fn test_unset_variable_becomes_empty() {
        // SAFETY: serialised with every other test touching the environment
        unsafe { std::env::remove_var(VAR) };

        let fragment = parse_fragment(&format!(
            "##++https://example.com/a.yaml;{{\"user_name\":\"${{{VAR}}}\"}}\nk: v"
        ))
        .unwrap();

        assert_eq!(fragment.body, "k: v");
        assert_eq!(fragment.dependencies[0].auth.username.as_deref(), Some(""));
    }
}
