use super::pgvector_sql;
use super::reference::split_list;
use super::Location;

#[test]
fn test_pgvector_sql_substitutes_dimensions() {
    let sql = pgvector_sql(1536);
    assert!(sql.contains("VECTOR(1536)"));
    assert!(!sql.contains("{dimensions}"));
    assert!(sql.contains("CREATE EXTENSION IF NOT EXISTS vector"));
}

#[test]
fn test_split_list() {
    assert_eq!(
        split_list(Some("IRC, library ,, Information Resource Center")),
        vec!["IRC", "library", "Information Resource Center"]
    );
    assert!(split_list(None).is_empty());
    assert!(split_list(Some("  ")).is_empty());
}

#[test]
fn test_location_from_row() {
    let loc = Location::from_row((
        7,
        "Ocean Lab".into(),
        Some("oceanlab, ocean laboratory".into()),
        Some("research,lab".into()),
        Some(53.1669),
        Some(8.6516),
        Some("".into()),
    ));
    assert_eq!(loc.aliases, vec!["oceanlab", "ocean laboratory"]);
    assert_eq!(loc.tags, vec!["research", "lab"]);
    assert_eq!(loc.address, None);
}
