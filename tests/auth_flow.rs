use crux_core::testing::AppTester;

use xemarket_core::capabilities::{
    HttpError, HttpOperation, HttpResponse, StorageOperation, StorageOutput,
};
use xemarket_core::model::Route;
use xemarket_core::session::{SessionSnapshot, SessionState};
use xemarket_core::{App, Effect, Event, Model};

fn tester() -> AppTester<App, Effect> {
    AppTester::default()
}

fn user_json(id: &str) -> serde_json::Value {
    serde_json::json!({
        "_id": id,
        "full_name": "Nguyễn Văn A",
        "email": "a@example.com",
        "phone_number": "0123456789",
        "favorites": []
    })
}

fn snapshot_bytes(token: &str, with_user: bool) -> Vec<u8> {
    let snapshot = serde_json::json!({
        "token": token,
        "user": if with_user { user_json("u1") } else { serde_json::Value::Null },
    });
    serde_json::to_vec(&snapshot).unwrap()
}

/// Boot the app and resolve the session-restore storage read, feeding the
/// resulting events back into the model. Returns any follow-up effects.
fn boot_with_snapshot(
    app: &AppTester<App, Effect>,
    model: &mut Model,
    stored: Option<Vec<u8>>,
) -> Vec<Effect> {
    let update = app.update(
        Event::AppStarted {
            api_url: Some("https://api.example.com/api".into()),
        },
        model,
    );
    assert_eq!(model.session.state, SessionState::Loading);

    let mut storage_request = update
        .effects
        .into_iter()
        .find_map(|e| match e {
            Effect::Storage(request) => Some(request),
            _ => None,
        })
        .expect("boot reads the stored session");

    assert!(matches!(
        &storage_request.operation,
        StorageOperation::Get { .. }
    ));

    let update = app
        .resolve(&mut storage_request, Ok(StorageOutput::Value(stored)))
        .expect("resolve storage read");

    let mut effects = Vec::new();
    for event in update.events {
        effects.extend(app.update(event, model).effects);
    }
    effects
}

fn pending_profile_request(effects: Vec<Effect>) -> crux_core::Request<HttpOperation> {
    effects
        .into_iter()
        .find_map(|e| match e {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .expect("a profile fetch is outstanding")
}

#[test]
fn boot_without_stored_session_settles_anonymous() {
    let app = tester();
    let mut model = Model::default();

    let effects = boot_with_snapshot(&app, &mut model, None);

    assert_eq!(model.session.state, SessionState::Anonymous);
    assert!(!effects.iter().any(|e| matches!(e, Effect::Http(_))));
}

#[test]
fn network_failure_with_cached_profile_keeps_the_session() {
    let app = tester();
    let mut model = Model::default();

    let effects = boot_with_snapshot(&app, &mut model, Some(snapshot_bytes("tok", true)));
    assert!(model.session.is_refreshing);

    let mut request = pending_profile_request(effects);
    let update = app
        .resolve(
            &mut request,
            Err(HttpError::Connection {
                host: "api.example.com".into(),
                message: "unreachable".into(),
            }),
        )
        .expect("resolve profile fetch");
    for event in update.events {
        app.update(event, &mut model);
    }

    assert_eq!(model.session.state, SessionState::Authenticated);
    assert!(!model.session.is_refreshing);
    assert!(model.session.token.is_some());
    assert_eq!(
        model.session.user.as_ref().map(|u| u.id.as_str()),
        Some("u1")
    );
}

#[test]
fn network_failure_without_cached_profile_goes_anonymous() {
    let app = tester();
    let mut model = Model::default();

    let effects = boot_with_snapshot(&app, &mut model, Some(snapshot_bytes("tok", false)));

    let mut request = pending_profile_request(effects);
    let update = app
        .resolve(&mut request, Err(HttpError::Timeout { timeout_ms: 30_000 }))
        .expect("resolve profile fetch");
    for event in update.events {
        app.update(event, &mut model);
    }

    assert_eq!(model.session.state, SessionState::Anonymous);
}

#[test]
fn unauthorized_profile_response_clears_the_session_despite_cache() {
    let app = tester();
    let mut model = Model::default();

    let effects = boot_with_snapshot(&app, &mut model, Some(snapshot_bytes("tok", true)));

    let mut request = pending_profile_request(effects);
    let update = app
        .resolve(
            &mut request,
            Ok(HttpResponse::new(
                401,
                Default::default(),
                br#"{"message": "jwt expired"}"#.to_vec(),
            )),
        )
        .expect("resolve profile fetch");

    let mut followup = Vec::new();
    for event in update.events {
        followup.extend(app.update(event, &mut model).effects);
    }

    assert_eq!(model.session.state, SessionState::Anonymous);
    assert!(model.session.token.is_none());
    assert!(model.session.user.is_none());
    assert_eq!(model.pending_navigation, Some(Route::Login));

    // The stale snapshot is deleted from durable storage.
    let deletes = followup.iter().any(|e| {
        matches!(
            e,
            Effect::Storage(request)
                if matches!(&request.operation, StorageOperation::Delete { .. })
        )
    });
    assert!(deletes, "401 must remove the persisted snapshot");
}

#[test]
fn concurrent_refreshes_collapse_into_one_request() {
    let app = tester();
    let mut model = Model::default();

    let effects = boot_with_snapshot(&app, &mut model, Some(snapshot_bytes("tok", true)));
    let mut first = pending_profile_request(effects);

    // A second caller while the first is in flight is a no-op.
    let update = app.update(Event::RefreshUserData, &mut model);
    let second_request = update
        .effects
        .iter()
        .any(|e| matches!(e, Effect::Http(_)));
    assert!(!second_request, "guarded refresh must not send again");

    let update = app
        .resolve(
            &mut first,
            Ok(HttpResponse::ok(
                serde_json::to_vec(&user_json("u1")).unwrap(),
            )),
        )
        .expect("resolve profile fetch");
    for event in update.events {
        app.update(event, &mut model);
    }

    assert_eq!(model.session.state, SessionState::Authenticated);
    assert!(!model.session.is_refreshing);

    // The guard is released: a later refresh goes out again.
    let update = app.update(Event::RefreshUserData, &mut model);
    assert!(update.effects.iter().any(|e| matches!(e, Effect::Http(_))));
}

#[test]
fn login_persists_the_session_and_logout_discards_it() {
    let app = tester();
    let mut model = Model::default();
    boot_with_snapshot(&app, &mut model, None);

    let update = app.update(
        Event::LoginRequested {
            email: "a@example.com".into(),
            password: "secret".into(),
        },
        &mut model,
    );

    let mut login_request = update
        .effects
        .into_iter()
        .find_map(|e| match e {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .expect("login request sent");

    {
        let HttpOperation::Execute(request) = &login_request.operation;
        assert!(request.url().as_str().ends_with("/users/login"));
    }

    let body = serde_json::json!({"token": "tok-123", "user": user_json("u1")});
    let update = app
        .resolve(
            &mut login_request,
            Ok(HttpResponse::ok(serde_json::to_vec(&body).unwrap())),
        )
        .expect("resolve login");

    let mut followup = Vec::new();
    for event in update.events {
        followup.extend(app.update(event, &mut model).effects);
    }

    assert_eq!(model.session.state, SessionState::Authenticated);
    assert_eq!(model.session.token.as_deref(), Some("tok-123"));

    let wrote_snapshot = followup.iter().any(|e| {
        matches!(
            e,
            Effect::Storage(request)
                if matches!(&request.operation, StorageOperation::Set { .. })
        )
    });
    assert!(wrote_snapshot, "login must persist the session snapshot");

    let update = app.update(Event::LogoutRequested, &mut model);
    assert_eq!(model.session.state, SessionState::Anonymous);
    assert!(model.session.token.is_none());
    assert_eq!(model.pending_navigation, Some(Route::Landing));

    let deleted = update.effects.iter().any(|e| {
        matches!(
            e,
            Effect::Storage(request)
                if matches!(&request.operation, StorageOperation::Delete { .. })
        )
    });
    assert!(deleted, "logout must delete the session snapshot");
}

#[test]
fn failed_login_surfaces_an_error_and_stays_anonymous() {
    let app = tester();
    let mut model = Model::default();
    boot_with_snapshot(&app, &mut model, None);

    let update = app.update(
        Event::LoginRequested {
            email: "a@example.com".into(),
            password: "wrong".into(),
        },
        &mut model,
    );

    let mut request = update
        .effects
        .into_iter()
        .find_map(|e| match e {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .expect("login request sent");

    let update = app
        .resolve(
            &mut request,
            Ok(HttpResponse::new(
                401,
                Default::default(),
                br#"{"message": "Invalid credentials"}"#.to_vec(),
            )),
        )
        .expect("resolve login");
    for event in update.events {
        app.update(event, &mut model);
    }

    assert_eq!(model.session.state, SessionState::Anonymous);
    assert!(model.active_error.is_some());
}

#[test]
fn snapshot_restores_round_trip() {
    // The snapshot shape written at login is the one the boot path reads.
    let snapshot: SessionSnapshot =
        serde_json::from_slice(&snapshot_bytes("tok", true)).unwrap();
    assert_eq!(snapshot.token, "tok");
    assert!(snapshot.user.is_some());
}
