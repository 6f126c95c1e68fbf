//! Cross-crate end-to-end scenarios exercising `KnowledgeGraph` as a whole
//! rather than any one collaborator crate in isolation.

use kgraph::{
    BasicSearchFilters, Direction, EngineConfig, Entity, KnowledgeGraph, MergeStrategy, NeighbourOptions, Pagination,
    PageRankOptions, Relation, TraversalOptions,
};
use tempfile::tempdir;

fn open(dir: &std::path::Path, name: &str) -> KnowledgeGraph {
    KnowledgeGraph::open(dir.join(name), EngineConfig::default()).unwrap()
}

#[test]
fn alice_bob_knows_end_to_end() {
    let dir = tempdir().unwrap();
    let kg = open(dir.path(), "graph.jsonl");

    kg.create_entity(Entity::new("Alice", "person", vec!["Engineer".into()])).unwrap();
    kg.create_entity(Entity::new("Bob", "person", vec!["Manager".into()])).unwrap();
    kg.create_relation(Relation::new("Alice", "Bob", "knows")).unwrap();

    let result = kg.search_basic("Alice", &BasicSearchFilters::default(), &Pagination { offset: 0, limit: 10 });
    assert_eq!(result.entities.len(), 1);
    assert_eq!(result.entities[0].name, "Alice");
    assert_eq!(result.relations.len(), 1);

    let neighbours = kg.neighbours("Alice", &NeighbourOptions::default());
    assert_eq!(neighbours.len(), 1);
    assert_eq!(neighbours[0].0, "Bob");

    let path = kg.shortest_path("Alice", "Bob", &TraversalOptions::default()).unwrap();
    assert_eq!(path.nodes, vec!["Alice".to_string(), "Bob".to_string()]);
}

#[test]
fn reopening_after_many_mutations_preserves_state_across_compaction() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("graph.jsonl");
    {
        let kg = KnowledgeGraph::open(&path, EngineConfig::default()).unwrap();
        // Comfortably past the default compaction threshold (min_pending=100),
        // so this exercises at least one automatic compaction mid-run.
        for i in 0..150 {
            kg.create_entity(Entity::new(format!("Entity{i}"), "thing", vec![])).unwrap();
        }
    }
    let kg2 = KnowledgeGraph::open(&path, EngineConfig::default()).unwrap();
    let result = kg2.search_basic("", &BasicSearchFilters::default(), &Pagination { offset: 0, limit: 1000 });
    assert_eq!(result.total_matched, 150);
}

#[test]
fn boolean_query_combines_type_and_negation() {
    let dir = tempdir().unwrap();
    let kg = open(dir.path(), "graph.jsonl");
    kg.create_entity(Entity::new("Alice", "person", vec!["Engineer".into()])).unwrap();
    kg.create_entity(Entity::new("Bob", "person", vec!["Manager".into()])).unwrap();
    kg.create_entity(Entity::new("Acme", "company", vec![])).unwrap();

    let result = kg.search_boolean("type:person AND NOT Manager").unwrap();
    assert!(result.contains("Alice"));
    assert!(!result.contains("Bob"));
    assert!(!result.contains("Acme"));
}

#[tokio::test]
async fn hybrid_search_redistributes_weight_when_a_layer_is_empty() {
    let dir = tempdir().unwrap();
    let kg = open(dir.path(), "graph.jsonl");
    kg.create_entity(Entity::new("Alice", "person", vec!["Engineer".into()])).unwrap();
    kg.create_entity(Entity::new("Bob", "person", vec!["Manager".into()])).unwrap();

    // No embeddings have been indexed, so the semantic layer is empty and
    // the hybrid scorer must fall back to lexical+symbolic only.
    let results = kg.search_hybrid("Engineer", None, 10).unwrap();
    assert!(!results.is_empty());
    let top = &results[0];
    assert_eq!(top.name, "Alice");
    assert!(!top.matched_layers.contains(&kgraph::Layer::Semantic));
}

#[test]
fn shortest_path_and_all_paths_agree_on_reachability() {
    let dir = tempdir().unwrap();
    let kg = open(dir.path(), "graph.jsonl");
    for name in ["A", "B", "C", "D"] {
        kg.create_entity(Entity::new(name, "node", vec![])).unwrap();
    }
    kg.create_relation(Relation::new("A", "B", "edge")).unwrap();
    kg.create_relation(Relation::new("B", "C", "edge")).unwrap();
    kg.create_relation(Relation::new("A", "C", "edge")).unwrap();
    kg.create_relation(Relation::new("C", "D", "edge")).unwrap();

    let shortest = kg.shortest_path("A", "D", &TraversalOptions::default()).unwrap();
    assert_eq!(shortest.length, 2); // A -> C -> D

    let cancel = kgraph::CancellationToken::new();
    let all = kg.all_paths("A", "D", 10, &TraversalOptions::default(), &cancel).unwrap();
    assert!(all.iter().any(|p| p.nodes == vec!["A", "B", "C", "D"]));
    assert!(all.iter().any(|p| p.nodes == vec!["A", "C", "D"]));
    assert!(all.iter().all(|p| p.length >= shortest.length));
}

#[test]
fn failed_transaction_leaves_the_store_untouched() {
    let dir = tempdir().unwrap();
    let kg = open(dir.path(), "graph.jsonl");
    kg.create_entity(Entity::new("Alice", "person", vec![])).unwrap();

    let mut txn = kg.begin_transaction();
    txn.create_entity(Entity::new("Bob", "person", vec![])).unwrap();
    // Alice already exists in the snapshot; staging a second create for her
    // must fail, leaving the transaction un-committed.
    let err = txn.create_entity(Entity::new("Alice", "person", vec![])).unwrap_err();
    assert!(matches!(err, kgraph::Error::DuplicateEntity { .. }));
    drop(txn); // neither commit nor explicit rollback: still discards staged work

    let result = kg.search_basic("", &BasicSearchFilters::default(), &Pagination { offset: 0, limit: 10 });
    assert_eq!(result.total_matched, 1);
    assert_eq!(result.entities[0].name, "Alice");
}

#[test]
fn import_with_skip_strategy_keeps_existing_records() {
    let dir = tempdir().unwrap();
    let kg = open(dir.path(), "graph.jsonl");
    kg.create_entity(Entity::new("Alice", "person", vec!["Engineer".into()])).unwrap();

    let other = Entity::new("Alice", "person", vec!["Overwritten".into()]);
    let json = format!(
        r#"{{"entities":[{}],"relations":[]}}"#,
        serde_json::to_string(&other).unwrap()
    );

    let report = kg.import_json(&json, MergeStrategy::Skip).unwrap();
    assert_eq!(report.entities_skipped, 1);

    let result = kg.search_basic("Alice", &BasicSearchFilters::default(), &Pagination { offset: 0, limit: 10 });
    assert_eq!(result.entities[0].observations, vec!["Engineer".to_string()]);
}

#[test]
fn degree_centrality_and_pagerank_rank_the_hub_first() {
    let dir = tempdir().unwrap();
    let kg = open(dir.path(), "graph.jsonl");
    for name in ["Hub", "Spoke1", "Spoke2", "Spoke3"] {
        kg.create_entity(Entity::new(name, "node", vec![])).unwrap();
    }
    for spoke in ["Spoke1", "Spoke2", "Spoke3"] {
        kg.create_relation(Relation::new("Hub", spoke, "connects")).unwrap();
        kg.create_relation(Relation::new(spoke, "Hub", "connects")).unwrap();
    }

    let degree = kg.degree_centrality(Direction::Both, 1);
    assert_eq!(degree[0].0, "Hub");

    let ranks = kg.pagerank(&PageRankOptions::default());
    let hub_rank = ranks["Hub"];
    assert!(ranks.iter().all(|(name, rank)| name == "Hub" || *rank <= hub_rank));
}

#[test]
fn batch_builder_commits_atomically_across_entities_and_relations() {
    let dir = tempdir().unwrap();
    let kg = open(dir.path(), "graph.jsonl");
    let batch = kg
        .batch()
        .create_entity(Entity::new("Alice", "person", vec![]))
        .create_entity(Entity::new("Bob", "person", vec![]))
        .create_relation(Relation::new("Alice", "Bob", "knows"));
    let report = kg.commit_batch(batch);
    assert!(report.success);
    assert_eq!(report.operations_executed, 3);

    let result = kg.search_basic("", &BasicSearchFilters::default(), &Pagination { offset: 0, limit: 10 });
    assert_eq!(result.entities.len(), 2);
    assert_eq!(result.relations.len(), 1);
}

#[test]
fn connected_components_separates_disjoint_islands() {
    let dir = tempdir().unwrap();
    let kg = open(dir.path(), "graph.jsonl");
    kg.create_entity(Entity::new("A", "node", vec![])).unwrap();
    kg.create_entity(Entity::new("B", "node", vec![])).unwrap();
    kg.create_relation(Relation::new("A", "B", "edge")).unwrap();
    kg.create_entity(Entity::new("C", "node", vec![])).unwrap();

    let components = kg.connected_components();
    assert_eq!(components.len(), 2);
    assert!(components.iter().any(|c| c.size() == 2));
    assert!(components.iter().any(|c| c.size() == 1));
}

#[test]
fn saved_search_round_trips_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("graph.jsonl");
    {
        let kg = KnowledgeGraph::open(&path, EngineConfig::default()).unwrap();
        kg.save_search(kgraph::SavedSearch::new("engineers", "type:person AND Engineer")).unwrap();
    }
    let kg2 = KnowledgeGraph::open(&path, EngineConfig::default()).unwrap();
    let saved = kg2.list_saved_searches();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].query, "type:person AND Engineer");

    assert!(kg2.delete_saved_search("engineers").unwrap());
    assert!(kg2.list_saved_searches().is_empty());
}
