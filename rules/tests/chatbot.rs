use std::path::{Path, PathBuf};
use std::sync::Arc;

use fwchat_rules::{
    Chatbot, ExtractedEntities, MatchOptions, MatchResult, NO_ENTITIES_MESSAGE, NO_MATCH_MESSAGE,
    Predicate, RuleTable,
};

fn testdata(rel: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../testdata")
        .join(rel)
}

fn chatbot(opts: MatchOptions) -> Chatbot {
    let table = RuleTable::load(&testdata("rules.csv")).unwrap();
    Chatbot::new(table, opts).unwrap()
}

const REQUEST: &str = r#"Allow access for IP "10.0.0.5" from "10.0.0.1" source and "LAN" zone to "DMZ" zone with Service "HTTP""#;

#[test]
fn loads_testdata_table() {
    let bot = chatbot(MatchOptions::default());
    assert_eq!(bot.table().len(), 4);
    assert!(bot.table().rules()[2].entities.contains_address("203.0.113.7"));
}

#[test]
fn matches_canonical_request() {
    let bot = chatbot(MatchOptions::default());
    let result = bot.process(REQUEST);

    assert_eq!(
        result,
        MatchResult::Success {
            entities: ExtractedEntities {
                ip_addresses: vec!["10.0.0.5".to_string(), "10.0.0.1".to_string()],
                source_zone: Some("LAN".to_string()),
                destination_zone: Some("DMZ".to_string()),
                service: Some("HTTP".to_string()),
            }
        }
    );
}

#[test]
fn every_table_prompt_matches_its_own_row_or_an_earlier_one() {
    let bot = chatbot(MatchOptions::default());

    for (i, rule) in bot.table().iter().enumerate() {
        let entities = bot.extract(&rule.prompt);
        let (index, _) = bot
            .matcher()
            .find(&entities)
            .unwrap_or_else(|| panic!("row {i} did not match"));
        assert!(index <= i, "row {i} matched later row {index}");
    }
}

#[test]
fn shared_address_resolves_to_first_row() {
    let bot = chatbot(MatchOptions::default());
    let text = r#"Allow access for IP "192.168.1.20" from "10.0.0.1" source and "WAN" zone to "LAN" zone with Service "SSH""#;

    let (index, rule) = bot.matcher().find(&bot.extract(text)).unwrap();
    assert_eq!(index, 0);
    assert_eq!(rule.entities.service.as_deref(), Some("HTTP"));
}

#[test]
fn zone_predicate_breaks_the_tie_when_enabled() {
    let bot = chatbot(MatchOptions::new().with_predicates([Predicate::Ip, Predicate::SourceZone]));
    let text = r#"Allow access for IP "192.168.1.20" from "10.0.0.1" source and "WAN" zone to "LAN" zone with Service "SSH""#;

    let (index, _) = bot.matcher().find(&bot.extract(text)).unwrap();
    assert_eq!(index, 1);
}

#[test]
fn unknown_addresses_fail_with_partial_entities() {
    let bot = chatbot(MatchOptions::default());
    let result = bot.process(r#"Allow access for IP "8.8.8.8" to "WAN" zone"#);

    assert_eq!(result.status(), "error");
    assert_eq!(result.message(), Some(NO_MATCH_MESSAGE));
    assert_eq!(result.entities().ip_addresses, ["8.8.8.8"]);
    assert_eq!(result.entities().destination_zone.as_deref(), Some("WAN"));
}

#[test]
fn empty_request_fails_with_empty_entities() {
    let bot = chatbot(MatchOptions::default());
    let result = bot.process("please help me");

    assert_eq!(
        result,
        MatchResult::Failure {
            entities: ExtractedEntities::default(),
            message: Some(NO_ENTITIES_MESSAGE.to_string()),
        }
    );
}

#[test]
fn repeated_runs_are_identical() {
    let bot = chatbot(MatchOptions::default());
    let table_before = bot.table().clone();

    let first = serde_json::to_string(&bot.process(REQUEST)).unwrap();
    let second = serde_json::to_string(&bot.process(REQUEST)).unwrap();
    assert_eq!(first, second);
    assert_eq!(bot.table(), &table_before);
}

#[test]
fn concurrent_requests_share_one_chatbot() {
    let bot = Arc::new(chatbot(MatchOptions::default()));
    let expected = bot.process(REQUEST);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let bot = Arc::clone(&bot);
            std::thread::spawn(move || bot.process(REQUEST))
        })
        .collect();

    for h in handles {
        assert_eq!(h.join().unwrap(), expected);
    }
}
