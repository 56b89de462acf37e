use crux_core::testing::AppTester;

use xemarket_core::capabilities::{HttpOperation, HttpResponse};
use xemarket_core::media::StagedFile;
use xemarket_core::model::{Route, User, VehicleType};
use xemarket_core::wizard::{BasicInfoPatch, SpecsPatch, WizardStep};
use xemarket_core::{App, Effect, Event, Model};

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

fn tester() -> AppTester<App, Effect> {
    AppTester::default()
}

fn authenticated_model() -> Model {
    let mut model = Model::default();
    let user: User = serde_json::from_value(serde_json::json!({
        "_id": "u1",
        "full_name": "Seller",
        "email": "seller@example.com"
    }))
    .unwrap();
    model.session.apply_login("tok".into(), Some(user));
    model
}

fn http_request(effects: Vec<Effect>) -> crux_core::Request<HttpOperation> {
    effects
        .into_iter()
        .find_map(|e| match e {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .expect("an HTTP request was sent")
}

fn drive_motorcycle_to_media(app: &AppTester<App, Effect>, model: &mut Model) {
    app.update(Event::WizardOpened, model);
    assert!(model.wizard.is_some());

    app.update(
        Event::WizardTypeSelected(VehicleType::Motorcycle),
        model,
    );
    app.update(Event::WizardNextStep, model);

    app.update(
        Event::WizardBasicEdited(BasicInfoPatch {
            title: Some("Honda Wave 2022, như mới".into()),
            description: Some("Xe chính chủ, bảo dưỡng định kỳ".into()),
            year: Some(2022),
        }),
        model,
    );
    app.update(Event::WizardMakeSelected("Honda".into()), model);
    app.update(Event::WizardModelSelected("Wave".into()), model);
    app.update(Event::WizardNextStep, model);

    app.update(
        Event::WizardSpecsEdited(SpecsPatch {
            mileage: Some(5000),
            engine_capacity: Some("125".into()),
            ..SpecsPatch::default()
        }),
        model,
    );
    app.update(Event::WizardNextStep, model);

    app.update(Event::WizardPriceChanged(20_000_000), model);
    app.update(Event::WizardLocationChanged("Hà Nội".into()), model);
    app.update(Event::WizardNextStep, model);

    assert_eq!(model.wizard.as_ref().unwrap().step, WizardStep::Media);
}

#[test]
fn wizard_requires_authentication() {
    let app = tester();
    let mut model = Model::default();

    app.update(Event::WizardOpened, &mut model);

    assert!(model.wizard.is_none());
    assert_eq!(model.pending_navigation, Some(Route::Login));
}

#[test]
fn advancing_is_blocked_per_step_until_its_fields_are_complete() {
    let app = tester();
    let mut model = authenticated_model();

    app.update(Event::WizardOpened, &mut model);

    // Step 1 without a type selection.
    app.update(Event::WizardNextStep, &mut model);
    {
        let wizard = model.wizard.as_ref().unwrap();
        assert_eq!(wizard.step, WizardStep::VehicleType);
        assert!(!wizard.step_errors.is_empty());
    }

    app.update(Event::WizardTypeSelected(VehicleType::Car), &mut model);
    app.update(Event::WizardNextStep, &mut model);
    assert_eq!(model.wizard.as_ref().unwrap().step, WizardStep::BasicInfo);

    // Step 2 partially filled: blocked, data kept.
    app.update(
        Event::WizardBasicEdited(BasicInfoPatch {
            title: Some("Toyota Camry 2018".into()),
            description: None,
            year: Some(2018),
        }),
        &mut model,
    );
    app.update(Event::WizardNextStep, &mut model);
    {
        let wizard = model.wizard.as_ref().unwrap();
        assert_eq!(wizard.step, WizardStep::BasicInfo);
        assert_eq!(wizard.basic.title, "Toyota Camry 2018");
    }
}

#[test]
fn image_upload_appends_returned_urls_to_the_draft() {
    let app = tester();
    let mut model = authenticated_model();
    drive_motorcycle_to_media(&app, &mut model);

    let update = app.update(
        Event::WizardImagesSelected(vec![StagedFile {
            name: "photo.png".into(),
            data: PNG_MAGIC.to_vec(),
        }]),
        &mut model,
    );
    assert_eq!(model.wizard.as_ref().unwrap().uploads_in_flight, 1);

    let mut request = http_request(update.effects);
    {
        let HttpOperation::Execute(request) = &request.operation;
        assert!(request.url().as_str().ends_with("/vehicles/upload"));
        assert!(request
            .headers()
            .get("content-type")
            .unwrap()
            .starts_with("multipart/form-data; boundary="));
    }

    let body = serde_json::json!({"urls": ["https://cdn.example.com/uploads/1.png"]});
    let update = app
        .resolve(
            &mut request,
            Ok(HttpResponse::ok(serde_json::to_vec(&body).unwrap())),
        )
        .expect("resolve upload");
    for event in update.events {
        app.update(event, &mut model);
    }

    let wizard = model.wizard.as_ref().unwrap();
    assert_eq!(wizard.uploads_in_flight, 0);
    assert_eq!(wizard.images, ["https://cdn.example.com/uploads/1.png"]);
}

#[test]
fn submission_without_an_image_is_blocked() {
    let app = tester();
    let mut model = authenticated_model();
    drive_motorcycle_to_media(&app, &mut model);

    let update = app.update(Event::WizardSubmitRequested, &mut model);

    assert!(!update.effects.iter().any(|e| matches!(e, Effect::Http(_))));
    let wizard = model.wizard.as_ref().unwrap();
    assert!(wizard.step_errors.iter().any(|e| e.field == "images"));
}

#[test]
fn motorcycle_submission_defaults_transmission_and_fuel() {
    let app = tester();
    let mut model = authenticated_model();
    drive_motorcycle_to_media(&app, &mut model);

    model
        .wizard
        .as_mut()
        .unwrap()
        .add_images(["https://cdn.example.com/uploads/1.png".to_string()]);

    let update = app.update(Event::WizardSubmitRequested, &mut model);
    assert!(model.wizard.as_ref().unwrap().submitting);

    let mut request = http_request(update.effects);
    let submitted: serde_json::Value = {
        let HttpOperation::Execute(request) = &request.operation;
        assert!(request.url().as_str().ends_with("/vehicles"));
        assert_eq!(request.timeout_ms(), 60_000);
        serde_json::from_slice(request.body().expect("submission has a body")).unwrap()
    };

    assert_eq!(submitted["type"], "motorcycle");
    assert_eq!(submitted["make"], "Honda");
    assert_eq!(submitted["model"], "Wave");
    assert_eq!(submitted["year"], 2022);
    assert_eq!(submitted["mileage"], 5000);
    assert_eq!(submitted["engine_capacity"], "125");
    assert_eq!(submitted["price"], serde_json::json!(20_000_000));
    assert_eq!(submitted["location"], "Hà Nội");
    // Fields the motorcycle form never asked for arrive defaulted.
    assert_eq!(submitted["transmission"], "Số sàn");
    assert_eq!(submitted["fuel_type"], "Xăng");
    assert_eq!(submitted["body_type"], "Xe số");

    let body = serde_json::json!({"_id": "v9", "message": "Đăng tin thành công"});
    let update = app
        .resolve(
            &mut request,
            Ok(HttpResponse::new(
                201,
                Default::default(),
                serde_json::to_vec(&body).unwrap(),
            )),
        )
        .expect("resolve submission");

    let mut followup = Vec::new();
    for event in update.events {
        followup.extend(app.update(event, &mut model).effects);
    }

    // Draft discarded, redirect to the user's own listings, which are
    // re-fetched immediately.
    assert!(model.wizard.is_none());
    assert_eq!(model.pending_navigation, Some(Route::MyVehicles));
    let refetch = followup.into_iter().any(|e| {
        matches!(
            &e,
            Effect::Http(request)
                if {
                    let HttpOperation::Execute(r) = &request.operation;
                    r.url().as_str().ends_with("/vehicles/user")
                }
        )
    });
    assert!(refetch);
}

#[test]
fn submission_truncates_the_image_list_to_five() {
    let app = tester();
    let mut model = authenticated_model();
    drive_motorcycle_to_media(&app, &mut model);

    model
        .wizard
        .as_mut()
        .unwrap()
        .add_images((1..=7).map(|i| format!("https://cdn.example.com/uploads/{i}.png")));

    let update = app.update(Event::WizardSubmitRequested, &mut model);
    let request = http_request(update.effects);

    let HttpOperation::Execute(request) = &request.operation;
    let submitted: serde_json::Value =
        serde_json::from_slice(request.body().expect("submission has a body")).unwrap();

    let images = submitted["images"].as_array().unwrap();
    assert_eq!(images.len(), 5);
    assert_eq!(images[0], "https://cdn.example.com/uploads/1.png");
    assert_eq!(images[4], "https://cdn.example.com/uploads/5.png");
}

#[test]
fn server_validation_errors_keep_the_draft_for_correction() {
    let app = tester();
    let mut model = authenticated_model();
    drive_motorcycle_to_media(&app, &mut model);

    model
        .wizard
        .as_mut()
        .unwrap()
        .add_images(["https://cdn.example.com/uploads/1.png".to_string()]);

    let update = app.update(Event::WizardSubmitRequested, &mut model);
    let mut request = http_request(update.effects);

    let body = serde_json::json!({
        "message": "Validation failed",
        "errors": ["price is out of range"]
    });
    let update = app
        .resolve(
            &mut request,
            Ok(HttpResponse::new(
                400,
                Default::default(),
                serde_json::to_vec(&body).unwrap(),
            )),
        )
        .expect("resolve submission");
    for event in update.events {
        app.update(event, &mut model);
    }

    // Draft intact, error surfaced field by field.
    let wizard = model.wizard.as_ref().unwrap();
    assert!(!wizard.submitting);
    assert_eq!(wizard.images.len(), 1);
    let error = model.active_error.as_ref().unwrap();
    assert_eq!(error.field_errors, ["price is out of range"]);
}

#[test]
fn oversized_payload_gets_the_reduce_images_hint() {
    let app = tester();
    let mut model = authenticated_model();
    drive_motorcycle_to_media(&app, &mut model);

    model
        .wizard
        .as_mut()
        .unwrap()
        .add_images(["https://cdn.example.com/uploads/1.png".to_string()]);

    let update = app.update(Event::WizardSubmitRequested, &mut model);
    let mut request = http_request(update.effects);

    let update = app
        .resolve(
            &mut request,
            Ok(HttpResponse::new(413, Default::default(), Vec::new())),
        )
        .expect("resolve submission");
    for event in update.events {
        app.update(event, &mut model);
    }

    let error = model.active_error.as_ref().unwrap();
    assert!(error.user_facing_message().contains("reduce"));
}

#[test]
fn cancelling_discards_the_draft() {
    let app = tester();
    let mut model = authenticated_model();
    drive_motorcycle_to_media(&app, &mut model);

    app.update(Event::WizardCancelled, &mut model);
    assert!(model.wizard.is_none());

    // Re-opening starts from a clean first step.
    app.update(Event::WizardOpened, &mut model);
    let wizard = model.wizard.as_ref().unwrap();
    assert_eq!(wizard.step, WizardStep::VehicleType);
    assert!(wizard.images.is_empty());
}
