//! Session database behavior: persistence, migrations, XUID decoding.

use std::fs;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::json;
use tempfile::TempDir;

use pocketmc::auth::{self, AuthDatabase, AuthSession, SessionKind, YggdrasilSession};


fn fake_jwt(payload: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_string(payload).unwrap());
    format!("{header}.{payload}.sig")
}

fn database_in(tmp_dir: &TempDir) -> AuthDatabase {
    AuthDatabase::new(
        tmp_dir.path().join("auth.json"),
        tmp_dir.path().join("tokens"))
}

#[test]
fn jwt_xuid_decoding() {

    let jwt = fake_jwt(&json!({ "xuid": "2535123", "exp": 1000 }));
    let payload = auth::decode_jwt_payload(&jwt).unwrap();
    assert_eq!(payload["xuid"], "2535123");

    assert!(auth::decode_jwt_payload("garbage").is_none());

}

#[test]
fn microsoft_xuid_backfill() {

    let tmp_dir = TempDir::new().unwrap();
    let jwt = fake_jwt(&json!({ "xuid": "2535123", "exp": 1000 }));

    // An old database layout: 'client_id' holding the application id, no
    // 'xuid' stored yet.
    fs::write(tmp_dir.path().join("auth.json"), serde_json::to_string(&json!({
        "client_id": "11111111-2222-3333-4444-555555555555",
        "microsoft": {
            "sessions": {
                "player@example.com": {
                    "access_token": jwt,
                    "username": "Player",
                    "uuid": "123e4567e89b12d3a456426614174000",
                    "client_id": "",
                    "refresh_token": "refresh",
                    "redirect_uri": "http://localhost:7969",
                },
            },
        },
    })).unwrap()).unwrap();

    let mut db = database_in(&tmp_dir);
    db.load();

    let session = db.get(SessionKind::Microsoft, "player@example.com").unwrap();
    assert_eq!(session.xuid(), "2535123");
    assert_eq!(session.user_type(), "msa");

    // An empty per-session client id is replaced by a fresh UUID.
    assert_eq!(session.client_id().len(), 36);

    match session {
        AuthSession::Microsoft(session) => {
            assert_eq!(session.username, "Player");
            assert_eq!(session.refresh_token, "refresh");
        }
        other => panic!("unexpected session: {other:?}"),
    }

}

#[test]
fn yggdrasil_client_token_migration() {

    let tmp_dir = TempDir::new().unwrap();

    fs::write(tmp_dir.path().join("auth.json"), serde_json::to_string(&json!({
        "yggdrasil": {
            "sessions": {
                "player@example.com": {
                    "access_token": "token",
                    "username": "Player",
                    "uuid": "123e4567e89b12d3a456426614174000",
                    "client_token": "legacy-client-token",
                },
            },
        },
    })).unwrap()).unwrap();

    let mut db = database_in(&tmp_dir);
    db.load();

    let session = db.get(SessionKind::Yggdrasil, "player@example.com").unwrap();
    assert_eq!(session.client_id(), "legacy-client-token");
    assert_eq!(session.user_type(), "mojang");
    assert_eq!(session.xuid(), "");

    assert_eq!(session.format_token_argument(false), "token");
    assert_eq!(session.format_token_argument(true), "token:token:123e4567e89b12d3a456426614174000");

}

#[test]
fn client_id_stable_across_save_cycles() {

    let tmp_dir = TempDir::new().unwrap();

    let mut db = database_in(&tmp_dir);
    db.load();

    let client_id = db.get_client_id().to_string();
    assert_eq!(client_id.len(), 36);
    db.save().unwrap();

    let mut db = database_in(&tmp_dir);
    db.load();
    assert_eq!(db.get_client_id(), client_id);

}

#[test]
fn legacy_file_imported_once() {

    let tmp_dir = TempDir::new().unwrap();
    let legacy_file = tmp_dir.path().join("tokens");

    fs::write(&legacy_file,
        "player@example.com client-token Player 123e4567e89b12d3a456426614174000 access-token\n").unwrap();

    let mut db = database_in(&tmp_dir);
    db.load();

    // The legacy file is consumed by the import.
    assert!(!legacy_file.is_file());

    let session = db.get(SessionKind::Yggdrasil, "player@example.com").unwrap();
    assert_eq!(session.access_token(), "access-token");
    assert_eq!(session.username(), "Player");
    assert_eq!(session.uuid(), "123e4567e89b12d3a456426614174000");
    assert_eq!(session.client_id(), "client-token");

    // Once saved to the structured database, a reload keeps the session.
    db.save().unwrap();
    let mut db = database_in(&tmp_dir);
    db.load();
    assert!(db.get(SessionKind::Yggdrasil, "player@example.com").is_some());

}

#[test]
fn put_remove_roundtrip() {

    let tmp_dir = TempDir::new().unwrap();
    let mut db = database_in(&tmp_dir);

    db.put("player@example.com", AuthSession::Yggdrasil(YggdrasilSession {
        access_token: "token".to_string(),
        username: "Player".to_string(),
        uuid: "123e4567e89b12d3a456426614174000".to_string(),
        client_id: "client".to_string(),
    }));

    assert_eq!(db.sessions().count(), 1);
    assert!(db.get(SessionKind::Yggdrasil, "player@example.com").is_some());
    assert!(db.get(SessionKind::Microsoft, "player@example.com").is_none());

    let removed = db.remove(SessionKind::Yggdrasil, "player@example.com").unwrap();
    assert_eq!(removed.username(), "Player");
    assert!(db.remove(SessionKind::Yggdrasil, "player@example.com").is_none());

}
