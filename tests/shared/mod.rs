//! Functionality shared by `algorithms` and `rsa` tests.

use assert_matches::assert_matches;
use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::{seq::index::sample as sample_indexes, thread_rng};
use serde_json::json;

use jwt_lite::{prelude::*, TokenBuilder};

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 9, 1, 10, 0, 0).single().unwrap()
}

pub fn validator() -> Validator {
    Validator::new(TimeOptions::new(Duration::zero(), now as fn() -> _))
}

pub fn create_token(algorithm: &Algorithm) -> TokenBuilder<'_> {
    Token::builder(algorithm)
        .with_issuer("https://issuer.example.com/")
        .with_subject("1234567890")
        .with_audience(["api"])
        .with_issued_at(now())
        .with_expiration_time(now() + Duration::days(7))
        .with_claim("name", "John Doe")
        .unwrap()
        .with_claim("roles", json!(["reader"]))
        .unwrap()
}

pub fn test_algorithm(algorithm: &Algorithm) {
    // Maximum number of signature bits mangled.
    const MAX_MANGLED_BITS: usize = 128;

    // Successful case.
    let token_string = create_token(algorithm).sign().unwrap();
    let token = Token::parse(algorithm, &token_string).unwrap();
    let validator = validator()
        .with_issuer("https://issuer.example.com/")
        .with_one_of_audience(["api", "admin"]);
    token.validate_with(&validator).unwrap();
    assert_eq!(token.payload().subject().unwrap(), Some("1234567890"));
    assert_eq!(token.payload().issued_at().unwrap(), Some(now()));
    assert_eq!(
        token.payload().get_as::<Vec<String>>("roles").unwrap(),
        Some(vec!["reader".to_owned()])
    );

    // Mutate signature bits.
    let signature = token_string.rsplit('.').next().unwrap();
    let signature_start = token_string.rfind('.').unwrap() + 1;
    let signature = Base64UrlUnpadded::decode_vec(signature).unwrap();
    let signature_bits = signature.len() * 8;

    let mangled_bits: Box<dyn Iterator<Item = usize>> = if signature_bits <= MAX_MANGLED_BITS {
        Box::new(0..signature_bits)
    } else {
        let indexes = sample_indexes(&mut thread_rng(), signature_bits, MAX_MANGLED_BITS);
        Box::new(indexes.into_iter())
    };

    for i in mangled_bits {
        let mut mangled_signature = signature.clone();
        mangled_signature[i / 8] ^= 1 << (i % 8) as u8;
        let mangled_signature = Base64UrlUnpadded::encode_string(&mangled_signature);

        let mut mangled_str = token_string.clone();
        mangled_str.replace_range(signature_start.., &mangled_signature);
        let token = Token::parse(algorithm, &mangled_str).unwrap();
        let err = token.validate_with(&validator).unwrap_err();
        assert_matches!(err, Error::InvalidSignature);
    }

    // Truncated signature.
    let mut mangled_str = token_string.clone();
    mangled_str.truncate(token_string.len() - 4);
    let token = Token::parse(algorithm, &mangled_str).unwrap();
    assert_matches!(
        token.validate_with(&validator).unwrap_err(),
        Error::InvalidSignature
    );

    // Mutate header: same claims, different serialization.
    let mangled_header = format!(r#"{{"typ":"JWT","alg":"{}"}}"#, algorithm.name());
    let mangled_header = Base64UrlUnpadded::encode_string(mangled_header.as_bytes());
    let header_end = token_string.find('.').unwrap();
    assert_ne!(mangled_header, &token_string[..header_end]);
    let mut mangled_str = token_string.clone();
    mangled_str.replace_range(..header_end, &mangled_header);
    let token = Token::parse(algorithm, &mangled_str).unwrap();
    assert_matches!(
        token.validate_with(&validator).unwrap_err(),
        Error::InvalidSignature
    );

    // Mutate claims.
    let mangled_payload = create_token(algorithm)
        .with_issued_at(now() + Duration::seconds(1))
        .build()
        .unwrap();
    let payload_string = mangled_payload.signing_input().split('.').nth(1).unwrap();
    assert_ne!(
        payload_string,
        &token_string[(header_end + 1)..(signature_start - 1)]
    );
    let mut mangled_str = token_string.clone();
    mangled_str.replace_range((header_end + 1)..(signature_start - 1), payload_string);
    let token = Token::parse(algorithm, &mangled_str).unwrap();
    assert_matches!(
        token.validate_with(&validator).unwrap_err(),
        Error::InvalidSignature
    );
}
