//! End-to-end tests for the streaming transformer.
//!
//! Runs complete documents through `StreamParser` using the feed fixture
//! schema and a handful of inline schemas for the smaller scenarios.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use pretty_assertions::assert_eq;
use serde_json::json;

use regelrecht_xml_stream::{
    parse_reader, parse_str, ResultEvent, SchemaRegistry, StreamError, StreamParser, Value,
};

/// Load fixture file content.
fn load_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

fn feed_schema() -> SchemaRegistry {
    SchemaRegistry::from_yaml_str(&load_fixture("feed.yaml")).expect("Failed to load feed schema")
}

/// Feed `xml` in chunks of `size` bytes and collect every result.
fn parse_chunked(schema: &SchemaRegistry, xml: &str, size: usize) -> Vec<ResultEvent> {
    let mut parser = StreamParser::new(schema);
    let mut results = Vec::new();
    for chunk in xml.as_bytes().chunks(size) {
        results.extend(parser.write(chunk).expect("write failed"));
    }
    results.extend(parser.end().expect("end failed"));
    results
}

fn to_json(results: &[ResultEvent]) -> serde_json::Value {
    serde_json::to_value(results).expect("results serialize")
}

#[test]
fn test_feed_fixture() {
    let schema = feed_schema();
    let results = parse_str(&schema, &load_fixture("feed.xml")).unwrap();

    let expected = json!([{
        "type": "feed",
        "body": {
            "title": "Regelrecht updates",
            "updated": "2024-03-01T12:00:00.000Z",
            "authors": [{"name": "MinBZK"}],
            "entry": [
                {
                    "entryId": 1,
                    "title": "Zorgtoeslag",
                    "rating": 4.5,
                    "category": ["zorg", "toeslag"],
                    "href": "https://example.org/1",
                    "price": 10.5,
                    "content": {
                        "children": [
                            {"@elementType": "p", "@value": "First paragraph"},
                            {"@elementType": "img", "@value": "chart.png"},
                            {"@elementType": "p", "@value": "Second & last paragraph"}
                        ]
                    }
                },
                {
                    "entryId": 2,
                    "title": "Huurtoeslag",
                    "published": "2024-02-29T00:00:00.000Z",
                    "price": 7.0,
                    "content": {"text": "Summary only"}
                }
            ]
        }
    }]);

    assert_eq!(to_json(&results), expected);
}

#[test]
fn test_feed_fixture_preserves_document_order() {
    let schema = feed_schema();
    let results = parse_str(&schema, &load_fixture("feed.xml")).unwrap();
    let body = results[0].body.as_object().unwrap();

    let keys: Vec<&str> = body.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["title", "updated", "authors", "entry"]);
}

#[test]
fn test_chunk_boundaries_do_not_change_results() {
    let schema = feed_schema();
    let xml = load_fixture("feed.xml");
    let whole = parse_str(&schema, &xml).unwrap();

    for size in [1, 2, 3, 7, 16, 64, 1024] {
        assert_eq!(parse_chunked(&schema, &xml, size), whole, "chunk size {size}");
    }
}

#[test]
fn test_parse_reader_streams_fixture() {
    let schema = feed_schema();
    let xml = load_fixture("feed.xml");

    let mut seen = Vec::new();
    let count = parse_reader(&schema, Cursor::new(xml.as_bytes()), 5, |result| {
        seen.push(result);
        Ok(())
    })
    .unwrap();

    assert_eq!(count, 1);
    assert_eq!(seen, parse_str(&schema, &xml).unwrap());
}

#[test]
fn test_scenario_array_of_entries() {
    let schema = SchemaRegistry::from_yaml_str(
        r"
feed:
  type: object
  children:
    entry:
      type: object
      array: true
      properties:
        title: {type: string}
",
    )
    .unwrap();

    let results = parse_str(
        &schema,
        "<feed><entry><title>A</title></entry><entry><title>B</title></entry></feed>",
    )
    .unwrap();

    assert_eq!(
        to_json(&results),
        json!([{"type": "feed", "body": {"entry": [{"title": "A"}, {"title": "B"}]}}])
    );
}

#[test]
fn test_scenario_attribute_integer() {
    let schema =
        SchemaRegistry::from_yaml_str("id: {from: attributes, attribute: value, type: integer}")
            .unwrap();

    let results = parse_str(&schema, r#"<id value="42"/>"#).unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].element_type, "id");
    assert_eq!(results[0].body, Value::Int(42));
}

#[test]
fn test_multiple_roots_in_document_order() {
    let schema =
        SchemaRegistry::from_yaml_str("id: {from: attributes, attribute: value, type: integer}")
            .unwrap();

    let results = parse_str(&schema, r#"<id value="1"/><id value="2"/><id value="3"/>"#).unwrap();

    let values: Vec<Option<i64>> = results.iter().map(|r| r.body.as_int()).collect();
    assert_eq!(values, vec![Some(1), Some(2), Some(3)]);
}

#[test]
fn test_array_collects_every_item() {
    let schema = SchemaRegistry::from_yaml_str(
        "list: {type: object, properties: {item: {type: integer, array: true}}}",
    )
    .unwrap();
    let items: String = (0..50).map(|i| format!("<item>{i}</item>")).collect();

    let results = parse_str(&schema, &format!("<list>{items}</list>")).unwrap();

    let collected: Vec<i64> = results[0]
        .body
        .get("item")
        .and_then(Value::as_array)
        .unwrap()
        .iter()
        .filter_map(Value::as_int)
        .collect();
    assert_eq!(collected, (0..50).collect::<Vec<_>>());
}

#[test]
fn test_empty_children_are_dropped() {
    let schema = feed_schema();

    let results = parse_str(
        &schema,
        "<feed><title></title><author></author><entry><content/></entry></feed>",
    )
    .unwrap();

    assert_eq!(to_json(&results), json!([{"type": "feed", "body": {}}]));
}

#[test]
fn test_recursive_definitions_resolve_by_name() {
    let schema = SchemaRegistry::from_yaml_str(
        r"
section:
  type: object
  properties:
    heading: {}
  children:
    section: {type: object, array: true, renameTo: sections}
",
    )
    .unwrap();

    let xml = "<section><heading>1</heading>\
               <section><heading>1.1</heading>\
               <section><heading>1.1.1</heading></section>\
               </section>\
               <section><heading>1.2</heading></section>\
               </section>";
    let results = parse_str(&schema, xml).unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(
        to_json(&results)[0]["body"],
        json!({
            "heading": "1",
            "sections": [
                {"heading": "1.1", "sections": [{"heading": "1.1.1"}]},
                {"heading": "1.2"}
            ]
        })
    );
}

#[test]
fn test_unzoned_timestamp_matches_utc() {
    let schema = SchemaRegistry::from_yaml_str("stamp: {type: date}").unwrap();

    let local = parse_str(&schema, "<stamp>2020-01-01T00:00:00</stamp>").unwrap();
    let zoned = parse_str(&schema, "<stamp>2020-01-01T00:00:00Z</stamp>").unwrap();

    assert!(local[0].body.as_date().is_some());
    assert_eq!(local[0].body, zoned[0].body);
    assert_eq!(
        to_json(&local),
        json!([{"type": "stamp", "body": "2020-01-01T00:00:00.000Z"}])
    );
}

#[test]
fn test_invalid_values_are_kept_as_sentinels() {
    let schema = SchemaRegistry::from_yaml_str(
        "row: {type: object, properties: {count: {type: integer}, when: {type: date}}}",
    )
    .unwrap();

    let results = parse_str(&schema, "<row><count>n/a</count><when>someday</when></row>").unwrap();
    let body = &results[0].body;

    assert!(body.get("count").and_then(Value::as_float).unwrap().is_nan());
    assert_eq!(body.get("when"), Some(&Value::Null));
}

#[test]
fn test_unknown_wrapper_is_transparent() {
    let schema = feed_schema();

    let results = parse_str(
        &schema,
        "<feed><group><entry id=\"9\"><title>Inside</title></entry></group></feed>",
    )
    .unwrap();

    assert_eq!(
        to_json(&results)[0]["body"],
        json!({"entry": [{"entryId": 9, "title": "Inside"}]})
    );
}

#[test]
fn test_root_nested_in_unregistered_element_is_ignored() {
    let schema = feed_schema();

    let results = parse_str(&schema, "<archive><feed><title>x</title></feed></archive>").unwrap();

    assert!(results.is_empty());
}

#[test]
fn test_truncated_document_reports_open_root() {
    let schema = feed_schema();
    let mut parser = StreamParser::new(&schema);

    parser.write("<feed><entry><title>Half").unwrap();
    let err = parser.end().unwrap_err();

    assert!(matches!(
        err,
        StreamError::TruncatedDocument { ref element, open: 3 } if element == "feed"
    ));
    assert!(!parser.is_open());
}

#[test]
fn test_syntax_error_halts_stream() {
    let schema = feed_schema();
    let mut parser = StreamParser::new(&schema);

    let err = parser.write("<feed><title>&bogus;</title>").unwrap_err();
    assert!(matches!(err, StreamError::Syntax { .. }));

    assert!(matches!(parser.write("</feed>"), Err(StreamError::Halted)));
    assert!(matches!(parser.end(), Err(StreamError::Halted)));
}

#[test]
fn test_results_emitted_as_roots_close() {
    let schema =
        SchemaRegistry::from_yaml_str("id: {from: attributes, attribute: value, type: integer}")
            .unwrap();
    let mut parser = StreamParser::new(&schema);

    assert_eq!(parser.write(r#"<id value="1"/><id val"#).unwrap().len(), 1);
    assert_eq!(parser.write(r#"ue="2"/>"#).unwrap().len(), 1);
    assert!(parser.end().unwrap().is_empty());
}

#[test]
fn test_json_schema_matches_yaml_schema() {
    let yaml = SchemaRegistry::from_yaml_str(
        "entry: {type: object, properties: {title: {}}, attributes: {id: {type: integer}}}",
    )
    .unwrap();
    let json = SchemaRegistry::from_json_str(
        r#"{"entry": {"type": "object", "properties": {"title": {}}, "attributes": {"id": {"type": "integer"}}}}"#,
    )
    .unwrap();
    let xml = r#"<entry id="4"><title>Same</title></entry>"#;

    assert_eq!(parse_str(&yaml, xml).unwrap(), parse_str(&json, xml).unwrap());
}
