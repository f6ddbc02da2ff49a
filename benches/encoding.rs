//! Benchmarks for encoding / decoding logic.

use chrono::{Duration, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::json;
use uuid::Uuid;

use jwt_lite::{Algorithm, Token, TokenBuilder, Validator};

// Fairly small list of claims.
fn create_token(algorithm: &Algorithm, key_id: &str) -> TokenBuilder<'_> {
    let now = Utc::now();
    Token::builder(algorithm)
        .with_header("kid", key_id)
        .unwrap()
        .with_audience(["content_management"])
        .with_subject(Uuid::new_v4().to_string())
        .with_id(Uuid::new_v4().to_string())
        .with_issued_at(now)
        .with_expiration_time(now + Duration::minutes(10))
        .with_not_before(now - Duration::minutes(10))
        .with_claim("name", "John Doe")
        .unwrap()
        .with_claim("email", "john.doe@example.com")
        .unwrap()
        .with_claim("roles", json!(["content_manager"]))
        .unwrap()
}

fn encoding_benches(criterion: &mut Criterion) {
    let algorithm = Algorithm::hs256(b"super_secret_key_donut_steel");
    let key_id = Uuid::new_v4().to_string();

    criterion.bench_function("encoding/full", |bencher| {
        bencher.iter(|| create_token(&algorithm, &key_id).sign().unwrap());
    });
}

fn decoding_benches(criterion: &mut Criterion) {
    let algorithm = Algorithm::hs256(b"super_secret_key_donut_steel");
    let key_id = Uuid::new_v4().to_string();
    let token = create_token(&algorithm, &key_id).sign().unwrap();
    let validator = Validator::default()
        .with_one_of_audience(["content_management"])
        .with_claim_predicate("roles", serde_json::Value::is_array);

    criterion.bench_function("decoding/parse", |bencher| {
        bencher.iter(|| Token::parse(&algorithm, &token).unwrap());
    });
    criterion.bench_function("decoding/full", |bencher| {
        bencher.iter(|| {
            let token = Token::parse(&algorithm, &token).unwrap();
            token.validate_with(&validator).unwrap();
        });
    });
}

criterion_group!(benches, encoding_benches, decoding_benches);
criterion_main!(benches);
