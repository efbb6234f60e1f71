//! Integration tests for graphette_codec

use graphette_codec::decode::{self, Decoder};
use graphette_codec::encode;
use graphette_codec::response::{
    classify, classify_with_partial_errors, Outcome, RawResponse, ResponseMeta, TransportError,
};
use graphette_codec::Id;
use serde_json::json;
use std::collections::HashMap;

/// The response shape of a `hero` query against a Star-Wars-style schema,
/// with a polymorphic character at the root.
#[derive(Debug, Clone, PartialEq)]
enum Character {
    Human {
        id: Id,
        name: String,
        home_planet: Option<String>,
    },
    Droid {
        id: Id,
        name: String,
        primary_function: String,
    },
}

fn character_decoder() -> Decoder<Character> {
    decode::interface(vec![
        decode::variant(
            "Human",
            decode::object(|id, name, home_planet| (id, name, home_planet))
                .field("id", decode::id())
                .field("name", decode::string())
                .field("homePlanet", decode::maybe(decode::string()))
                .build(),
            |(id, name, home_planet)| Character::Human {
                id,
                name,
                home_planet,
            },
        ),
        decode::variant(
            "Droid",
            decode::object(|id, name, primary_function| (id, name, primary_function))
                .field("id", decode::id())
                .field("name", decode::string())
                .field("primaryFunction", decode::string())
                .build(),
            |(id, name, primary_function)| Character::Droid {
                id,
                name,
                primary_function,
            },
        ),
    ])
}

fn hero_decoder() -> Decoder<Character> {
    decode::object(|hero| hero)
        .field("hero", character_decoder())
        .build::<Character>()
}

fn response(status_code: u16, body: serde_json::Value) -> RawResponse {
    RawResponse::Status {
        meta: ResponseMeta {
            url: "http://localhost:4000/graphql".into(),
            status_code,
            status_text: if status_code == 200 { "OK" } else { "" }.into(),
            headers: HashMap::from([("content-type".into(), "application/json".into())]),
        },
        body: body.to_string(),
    }
}

#[test]
fn test_hero_query_end_to_end() {
    let outcome = classify(
        &hero_decoder(),
        response(
            200,
            json!({
                "data": {
                    "hero": {
                        "__typename": "Droid",
                        "id": 2001,
                        "name": "R2-D2",
                        "primaryFunction": "Astromech"
                    }
                }
            }),
        ),
    );

    assert_eq!(
        outcome.data(),
        Some(Character::Droid {
            id: Id::new("2001"),
            name: "R2-D2".into(),
            primary_function: "Astromech".into(),
        })
    );
}

#[test]
fn test_human_branch_with_absent_optional_field() {
    let outcome = classify(
        &hero_decoder(),
        response(
            200,
            json!({
                "data": {
                    "hero": { "__typename": "Human", "id": "1000", "name": "Luke" }
                }
            }),
        ),
    );

    assert_eq!(
        outcome.data(),
        Some(Character::Human {
            id: Id::new("1000"),
            name: "Luke".into(),
            home_planet: None,
        })
    );
}

#[test]
fn test_partial_errors_carry_both_halves() {
    let outcome = classify_with_partial_errors(
        &hero_decoder(),
        response(
            200,
            json!({
                "data": {
                    "hero": {
                        "__typename": "Droid",
                        "id": "2001",
                        "name": "R2-D2",
                        "primaryFunction": "Astromech"
                    }
                },
                "errors": [{
                    "message": "friend missing",
                    "path": ["hero", "friends", 0]
                }]
            }),
        ),
    );

    match outcome {
        Outcome::PartialSuccess(data, errors) => {
            assert!(matches!(data, Character::Droid { .. }));
            assert_eq!(errors[0].message, "friend missing");
            assert_eq!(errors[0].to_string(), "friend missing at hero.friends[0]");
        }
        other => panic!("expected partial success, got {other:?}"),
    }
}

#[test]
fn test_validation_errors_without_data() {
    let outcome = classify(
        &hero_decoder(),
        response(
            200,
            json!({
                "errors": [{
                    "message": "Cannot query field \"nam\" on type \"Character\".",
                    "locations": [{ "line": 1, "column": 18 }]
                }]
            }),
        ),
    );

    match outcome {
        Outcome::ValidationErrors(errors) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].locations[0].line, 1);
        }
        other => panic!("expected validation errors, got {other:?}"),
    }
}

#[test]
fn test_server_error_with_decodable_data_is_transport() {
    let nullable_hero = decode::object(|hero| hero)
        .field("hero", decode::maybe(character_decoder()))
        .build::<Option<Character>>();

    let outcome = classify(&nullable_hero, response(500, json!({ "data": { "hero": null } })));
    match outcome {
        Outcome::Transport(TransportError::BadStatus { meta, .. }) => {
            assert_eq!(meta.status_code, 500);
            assert_eq!(meta.url, "http://localhost:4000/graphql");
        }
        other => panic!("expected bad status, got {other:?}"),
    }
}

#[test]
fn test_timeout_wins_over_everything() {
    assert_eq!(
        classify(&hero_decoder(), RawResponse::Timeout),
        Outcome::Transport(TransportError::Timeout)
    );
}

#[test]
fn test_variables_payload_matches_the_wire_shape() {
    // What an application would attach to a `createReview` mutation.
    let review = encode::input(vec![
        ("episode", encode::enumeration(|e: &&str| (*e).to_owned(), &"JEDI")),
        ("stars", encode::int(5)),
        ("commentary", encode::maybe(|c: &&str| encode::string(*c), None)),
        (
            "tags",
            encode::list(|t: &&str| encode::string(*t), &["canon"]),
        ),
    ]);

    assert_eq!(
        serde_json::to_value(&review).unwrap(),
        json!({
            "episode": "JEDI",
            "stars": 5,
            "commentary": null,
            "tags": ["canon"]
        })
    );
}

#[test]
fn test_scalar_round_trips() {
    let text = encode::string("hello");
    assert_eq!(
        decode::string()
            .decode(&serde_json::to_value(&text).unwrap())
            .unwrap(),
        "hello"
    );

    let number = encode::int(-7);
    assert_eq!(
        decode::int()
            .decode(&serde_json::to_value(&number).unwrap())
            .unwrap(),
        -7
    );

    let ratio = encode::float(0.25);
    assert_eq!(
        decode::float()
            .decode(&serde_json::to_value(&ratio).unwrap())
            .unwrap(),
        0.25
    );

    let flag = encode::boolean(true);
    assert!(decode::boolean()
        .decode(&serde_json::to_value(&flag).unwrap())
        .unwrap());

    let ident = Id::new("2001");
    let encoded = encode::id(&ident);
    assert_eq!(
        decode::id()
            .decode(&serde_json::to_value(&encoded).unwrap())
            .unwrap(),
        ident
    );
}
