use std::time::Duration;

use frontdesk_token::{Credentials, TokenError, TokenIssuer, verify};

fn issuer() -> TokenIssuer {
    TokenIssuer::new(
        Credentials {
            api_key: "APIkey123".to_string(),
            api_secret: "very-secret-value".to_string(),
            url: "wss://voice.example.test".to_string(),
        },
        "ai_voice_room",
        Duration::from_secs(3_600),
    )
}

#[test]
fn issued_token_grants_room_join_for_identity() {
    let issued = issuer()
        .issue_for("caller_4321", 1_760_000_000)
        .expect("issue");
    assert_eq!(issued.identity, "caller_4321");
    assert_eq!(issued.room, "ai_voice_room");
    assert_eq!(issued.url, "wss://voice.example.test");

    let claims = verify(&issued.token, "very-secret-value").expect("verify");
    assert_eq!(claims.iss, "APIkey123");
    assert_eq!(claims.sub, "caller_4321");
    assert_eq!(claims.nbf, 1_760_000_000);
    assert_eq!(claims.exp, 1_760_003_600);
    assert!(claims.video.room_join);
    assert_eq!(claims.video.room, "ai_voice_room");
}

#[test]
fn grant_uses_camel_case_keys() {
    let issued = issuer().issue_for("caller_1000", 0).expect("issue");
    let payload = issued.token.split('.').nth(1).expect("payload");
    let raw = base64::Engine::decode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, payload)
        .expect("b64 payload");
    let json: serde_json::Value = serde_json::from_slice(&raw).expect("json");
    assert_eq!(json["video"]["roomJoin"], true);
}

#[test]
fn wrong_secret_fails_verification() {
    let issued = issuer().issue().expect("issue");
    let err = verify(&issued.token, "other-secret").expect_err("must fail");
    assert!(matches!(err, TokenError::BadSignature));
}

#[test]
fn tampered_payload_fails_verification() {
    let issued = issuer().issue_for("caller_1111", 0).expect("issue");
    let other = issuer().issue_for("caller_2222", 0).expect("issue");
    let mut parts: Vec<&str> = issued.token.split('.').collect();
    parts[1] = other.token.split('.').nth(1).expect("payload");
    let forged = parts.join(".");
    assert!(matches!(
        verify(&forged, "very-secret-value"),
        Err(TokenError::BadSignature)
    ));
    assert!(matches!(
        verify("not-a-jwt", "very-secret-value"),
        Err(TokenError::Malformed)
    ));
}

#[test]
fn missing_env_credentials_are_reported_by_name() {
    let err = Credentials::from_env(
        "FRONTDESK_TEST_UNSET_KEY_7f3a",
        "FRONTDESK_TEST_UNSET_SECRET_7f3a",
        "FRONTDESK_TEST_UNSET_URL_7f3a",
    )
    .expect_err("unset vars");
    assert!(err.to_string().contains("FRONTDESK_TEST_UNSET_KEY_7f3a"));
}
