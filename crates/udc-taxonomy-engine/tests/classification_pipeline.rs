use pretty_assertions::assert_eq;
use tempfile::TempDir;
use udc_taxonomy_engine::codec::{Codec, CodecError};
use udc_taxonomy_engine::extensions::{ExtensionError, ExtensionStore};
use udc_taxonomy_engine::hierarchy::{self, EdgeKind, Hierarchy};
use udc_taxonomy_engine::io;
use udc_taxonomy_engine::models::Node;
use udc_taxonomy_engine::parsing::parse_records;

const CANONICAL: &str = "udc_full.yaml";

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap()
}

fn build_fixture() -> Hierarchy {
    hierarchy::build(parse_records(&fixture("classtree.html"), false))
}

fn codes_of(nodes: &[Node]) -> Vec<&str> {
    nodes.iter().map(|n| n.code.as_str()).collect()
}

/// Writes the fixture's forest as the canonical file of a fresh data dir.
fn data_dir_with_canonical() -> (TempDir, ExtensionStore, Codec) {
    let dir = tempfile::tempdir().unwrap();
    let store = ExtensionStore::new(dir.path(), CANONICAL);
    let codec = Codec::from_nodes(build_fixture().roots).unwrap();
    io::save_nodes(store.canonical_path(), &codec.to_nodes()).unwrap();
    (dir, store, codec)
}

#[test]
fn page_builds_single_rooted_tree() {
    let records = parse_records(&fixture("classtree.html"), false);
    assert_eq!(records.len(), 14);

    let hierarchy = hierarchy::build(records);

    assert_eq!(codes_of(&hierarchy.roots), vec!["TOP"]);
    insta::assert_debug_snapshot!(codes_of(&hierarchy.roots[0].children), @r#"
    [
        "0",
        "1",
        "=...",
        "=1",
        "(1)",
        "-0",
    ]
    "#);

    let fallback: Vec<_> = hierarchy.fallback_edges().collect();
    assert_eq!(fallback.len(), 1);
    assert_eq!(fallback[0].child, "(540)");
    assert_eq!(fallback[0].parent, "(1)");
    assert_eq!(
        hierarchy.edge_for("001.1").map(|e| e.kind),
        Some(EdgeKind::Inferred)
    );
}

#[test]
fn codec_answers_queries_over_built_tree() {
    let codec = Codec::from_nodes(build_fixture().roots).unwrap();

    assert_eq!(codec.len(), 14);
    assert_eq!(codec.lookup("01"), Some("Bibliography & bibliographies. Catalogues"));
    assert_eq!(codec.lookup("(540)"), Some("India"));

    let ancestry: Vec<_> = codec
        .ancestry("001.1")
        .unwrap()
        .iter()
        .map(|e| e.code())
        .collect();
    assert_eq!(ancestry, vec!["TOP", "0", "00", "001", "001.1"]);

    let germanic: Vec<_> = codec.search("germanic").iter().map(|e| e.code()).collect();
    assert_eq!(germanic, vec!["=11"]);

    assert!(codec.validate("001.1:01(540)").is_ok());
    assert!(matches!(
        codec.validate("001.1:02"),
        Err(CodecError::UnknownCode(code)) if code == "02"
    ));
}

#[test]
fn saved_tree_reloads_with_identical_lookups() {
    let (_dir, store, original) = data_dir_with_canonical();

    let reloaded = Codec::load(store.canonical_path(), &store).unwrap();

    assert_eq!(reloaded.len(), original.len());
    for node in original.to_nodes() {
        for code in node.codes() {
            assert_eq!(reloaded.lookup(code), original.lookup(code), "lookup of {code}");
        }
    }
    assert_eq!(reloaded.to_nodes(), original.to_nodes());
}

#[test]
fn addendum_extends_loaded_codec() {
    let (_dir, store, _) = data_dir_with_canonical();
    store
        .add(
            "local",
            &[Node::new("(540.1)", "Local site").with_children(vec![Node::new(
                "(540.11)",
                "Workshop",
            )])],
        )
        .unwrap();

    let codec = Codec::load(store.canonical_path(), &store).unwrap();

    assert_eq!(codec.len(), 16);
    assert_eq!(codec.roots().len(), 2);
    assert_eq!(codec.lookup("(540.11)"), Some("Workshop"));
    assert!(codec.validate("001.1(540.11)").is_ok());
}

#[test]
fn overlapping_addendum_aborts_load() {
    let (dir, store, _) = data_dir_with_canonical();
    let loaded = Codec::load(store.canonical_path(), &store).unwrap();
    std::fs::write(
        dir.path().join("udc_addendum_clash.yaml"),
        "- code: '9'\n  title: Geography\n- code: '001'\n  title: Clash\n",
    )
    .unwrap();

    let result = Codec::load(store.canonical_path(), &store);

    assert!(matches!(
        result,
        Err(CodecError::Extension(ExtensionError::Overlap { code, .. })) if code == "001"
    ));
    assert_eq!(loaded.len(), 14);
    assert_eq!(loaded.lookup("9"), None);
    assert_eq!(
        loaded.lookup("001"),
        Some("Science and knowledge in general. Organization of intellectual work")
    );
}
