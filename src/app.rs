use tracing::{debug, error, warn};

use crate::api::{
    ApiClient, AvatarUploadResponse, CoverImageUploadResponse, CreateVehicleResponse,
    KycUploadResponse, LoginResponse, UploadImagesResponse,
};
use crate::capabilities::{
    Capabilities, HttpError, HttpRequest, HttpResult, StorageKey, StorageOutput,
};
use crate::chat::{Conversation, Message};
use crate::event::Event;
use crate::media::{validate_document, validate_image, MultipartForm, StagedFile};
use crate::model::{Model, Route, ToastKind, User, Vehicle};
use crate::session::SessionSnapshot;
use crate::view::{self, ViewModel};
use crate::wizard::ListingWizard;
use crate::{get_current_time_ms, year_of_unix_ms, AppError, ErrorKind, SESSION_SNAPSHOT_KEY};

#[derive(Default)]
pub struct App;

impl App {
    fn api(model: &mut Model) -> Option<ApiClient> {
        match ApiClient::new(&model.api_url) {
            Ok(client) => Some(client),
            Err(e) => {
                error!(url = %model.api_url, "invalid API base URL: {e}");
                model.set_error(AppError::new(ErrorKind::InvalidState, e.to_string()));
                None
            }
        }
    }

    /// Bearer token, or an authentication error on the model.
    fn token(model: &mut Model) -> Option<String> {
        match model.session.bearer_token() {
            Some(token) => Some(token.to_string()),
            None => {
                model.set_error(AppError::new(
                    ErrorKind::Authentication,
                    "Please sign in to continue",
                ));
                model.pending_navigation = Some(Route::Login);
                None
            }
        }
    }

    /// The wizard caps production years at "next year".
    fn max_listing_year() -> u16 {
        year_of_unix_ms(get_current_time_ms()) + 1
    }

    fn session_key() -> Option<StorageKey> {
        match StorageKey::session(SESSION_SNAPSHOT_KEY) {
            Ok(key) => Some(key),
            Err(e) => {
                error!("session storage key rejected: {e}");
                None
            }
        }
    }

    /// Write (or remove, when logged out) the durable session snapshot.
    fn persist_session(model: &Model, caps: &Capabilities) {
        let Some(key) = Self::session_key() else {
            return;
        };

        match model.session.snapshot() {
            Some(snapshot) => match serde_json::to_vec(&snapshot) {
                Ok(bytes) => {
                    caps.storage
                        .set(key, bytes, |r| Event::SessionPersisted(Box::new(r)));
                }
                Err(e) => error!("session snapshot serialization failed: {e}"),
            },
            None => {
                caps.storage
                    .delete(key, |r| Event::SessionPersisted(Box::new(r)));
            }
        }
    }

    fn send(model: &mut Model, caps: &Capabilities, request: Result<HttpRequest, HttpError>, make_event: fn(HttpResult) -> Event) -> bool {
        match request {
            Ok(request) => {
                caps.http.send(request, make_event);
                true
            }
            Err(e) => {
                error!("failed to build request: {e}");
                model.set_error(Self::classify_transport_error(&e));
                false
            }
        }
    }

    fn classify_transport_error(e: &HttpError) -> AppError {
        let kind = match e {
            HttpError::Timeout { .. } => ErrorKind::Timeout,
            HttpError::Connection { .. } => ErrorKind::Network,
            HttpError::BodyTooLarge { .. } => ErrorKind::PayloadTooLarge,
            HttpError::Serialization { .. } => ErrorKind::Serialization,
            HttpError::InvalidResponse { .. } => ErrorKind::Deserialization,
            _ => ErrorKind::Internal,
        };
        AppError::new(kind, e.to_string())
    }

    /// `None` for a 2xx response, the classified error otherwise.
    fn error_of(result: &HttpResult) -> Option<AppError> {
        match result {
            Ok(response) if response.is_success() => None,
            Ok(response) => Some(AppError::from_http_status(
                response.status(),
                Some(response.body()),
            )),
            Err(e) => Some(Self::classify_transport_error(e)),
        }
    }

    fn parse_success<T: serde::de::DeserializeOwned>(
        result: &HttpResult,
    ) -> Result<T, AppError> {
        match result {
            Ok(response) if response.is_success() => response
                .json::<T>()
                .map_err(|e| AppError::new(ErrorKind::Deserialization, e.to_string())),
            Ok(response) => Err(AppError::from_http_status(
                response.status(),
                Some(response.body()),
            )),
            Err(e) => Err(Self::classify_transport_error(e)),
        }
    }

    // --- session / auth ---

    fn handle_profile_response(&self, result: &HttpResult, model: &mut Model, caps: &Capabilities) {
        model.session.finish_refresh();

        match Self::parse_success::<User>(result) {
            Ok(user) => {
                model.session.apply_profile(user);
                Self::persist_session(model, caps);
            }
            Err(error) if error.kind.is_session_fatal() => {
                // 401/403 ends the session no matter what is cached.
                model.session.apply_auth_failure();
                Self::persist_session(model, caps);
                model.pending_navigation = Some(Route::Login);
                warn!("profile fetch rejected, session cleared");
            }
            Err(error) => {
                let had_cache = model.session.user.is_some();
                model.session.apply_network_failure();
                if had_cache && model.session.state.is_authenticated() {
                    debug!("profile fetch failed, serving cached profile: {error}");
                    model.show_toast("Offline - showing saved profile data", ToastKind::Warning);
                } else {
                    model.set_error(error);
                }
            }
        }
    }

    fn upload_single_file(
        model: &mut Model,
        caps: &Capabilities,
        file: &StagedFile,
        field: &str,
        build: impl FnOnce(&ApiClient, &str, String, Vec<u8>) -> Result<HttpRequest, HttpError>,
        make_event: fn(HttpResult) -> Event,
    ) {
        let Some(api) = Self::api(model) else { return };
        let Some(token) = Self::token(model) else { return };

        let mime = match validate_image(&file.data) {
            Ok(mime) => mime,
            Err(e) => {
                model.set_error(e);
                return;
            }
        };

        let mut form = MultipartForm::new();
        form.add_file(field, &file.name, mime, &file.data);
        let (content_type, body) = form.finish();

        let request = build(&api, &token, content_type, body);
        Self::send(model, caps, request, make_event);
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        debug!(event = event.name(), "update");

        match event {
            Event::Noop => {}

            Event::AppStarted { api_url } => {
                if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
                    model.api_url = url;
                }
                model.session.begin_restore();

                if let Some(key) = Self::session_key() {
                    caps.storage
                        .get(key, |r| Event::SessionRestored(Box::new(r)));
                }
                caps.render.render();
            }

            Event::SessionRestored(result) => {
                match *result {
                    Ok(StorageOutput::Value(Some(bytes))) => {
                        match serde_json::from_slice::<SessionSnapshot>(&bytes) {
                            Ok(snapshot) => {
                                model.session.restore(snapshot);
                                // Reconcile the cached profile with the API.
                                self.update(Event::RefreshUserData, model, caps);
                            }
                            Err(e) => {
                                warn!("stored session snapshot unreadable, discarding: {e}");
                                if let Some(key) = Self::session_key() {
                                    caps.storage
                                        .delete(key, |r| Event::SessionPersisted(Box::new(r)));
                                }
                                model.session.settle_anonymous();
                            }
                        }
                    }
                    Ok(_) => model.session.settle_anonymous(),
                    Err(e) => {
                        warn!("session restore failed: {e}");
                        model.session.settle_anonymous();
                    }
                }
                caps.render.render();
            }

            Event::SessionPersisted(result) => {
                if let Err(e) = *result {
                    error!("session persistence failed: {e}");
                }
            }

            Event::LoginRequested { email, password } => {
                let Some(api) = Self::api(model) else { return };
                model.clear_error();
                model.session.begin_restore();

                let request = api.login(&crate::api::LoginRequest { email, password });
                Self::send(model, caps, request, |r| Event::LoginResponse(Box::new(r)));
                caps.render.render();
            }

            Event::LoginResponse(result) => {
                match Self::parse_success::<LoginResponse>(&result) {
                    Ok(response) => {
                        let fetch_profile = response.user.is_none();
                        model.session.apply_login(response.token, response.user);
                        Self::persist_session(model, caps);

                        if fetch_profile {
                            self.update(Event::RefreshUserData, model, caps);
                        } else {
                            model.show_toast("Signed in", ToastKind::Success);
                        }
                    }
                    Err(error) => {
                        model.session.settle_anonymous();
                        model.set_error(error);
                    }
                }
                caps.render.render();
            }

            Event::RegisterRequested(payload) => {
                let Some(api) = Self::api(model) else { return };
                model.clear_error();

                let request = api.register(&payload);
                Self::send(model, caps, request, |r| Event::RegisterResponse(Box::new(r)));
                caps.render.render();
            }

            Event::RegisterResponse(result) => {
                match Self::error_of(&result) {
                    // Success does not log the user in.
                    None => {
                        model.show_toast(
                            "Registration successful. Please sign in.",
                            ToastKind::Success,
                        );
                        model.pending_navigation = Some(Route::Login);
                    }
                    Some(error) => model.set_error(error),
                }
                caps.render.render();
            }

            Event::RefreshUserData => {
                if model.session.token.is_none() {
                    model.session.user = None;
                    model.session.settle_anonymous();
                    caps.render.render();
                    return;
                }

                // Concurrent callers collapse into the outstanding request.
                if !model.session.begin_refresh() {
                    debug!("profile refresh already in flight");
                    return;
                }

                let Some(api) = Self::api(model) else {
                    model.session.finish_refresh();
                    return;
                };
                let token = model.session.bearer_token().unwrap_or_default().to_string();

                let request = api.profile(&token);
                if !Self::send(model, caps, request, |r| Event::ProfileResponse(Box::new(r))) {
                    model.session.finish_refresh();
                }
                caps.render.render();
            }

            Event::ProfileResponse(result) => {
                self.handle_profile_response(&result, model, caps);
                caps.render.render();
            }

            Event::LogoutRequested => {
                model.session.logout();
                Self::persist_session(model, caps);

                model.my_vehicles.clear();
                model.conversations.clear();
                model.selected_conversation = None;
                model.wizard = None;
                model.pending_kyc = None;
                model.pending_navigation = Some(Route::Landing);

                caps.render.render();
            }

            // --- profile / KYC / favorites ---

            Event::ProfileUpdateSubmitted(payload) => {
                let Some(api) = Self::api(model) else { return };
                let Some(token) = Self::token(model) else { return };

                let request = api.update_profile(&token, &payload);
                Self::send(model, caps, request, |r| {
                    Event::ProfileUpdateResponse(Box::new(r))
                });
            }

            Event::ProfileUpdateResponse(result) => {
                match Self::parse_success::<User>(&result) {
                    Ok(user) => {
                        model.session.apply_profile(user);
                        Self::persist_session(model, caps);
                        model.show_toast("Profile updated", ToastKind::Success);
                    }
                    Err(error) => model.set_error(error),
                }
                caps.render.render();
            }

            Event::AvatarSelected(file) => {
                Self::upload_single_file(
                    model,
                    caps,
                    &file,
                    "avatar",
                    |api, token, content_type, body| {
                        api.upload_avatar(token, &content_type, body)
                    },
                    |r| Event::AvatarUploadResponse(Box::new(r)),
                );
            }

            Event::AvatarUploadResponse(result) => {
                match Self::parse_success::<AvatarUploadResponse>(&result) {
                    Ok(response) => {
                        if let Some(user) = model.session.user.as_mut() {
                            user.avatar_url = Some(response.avatar_url);
                        }
                        Self::persist_session(model, caps);
                        model.show_toast("Avatar updated", ToastKind::Success);
                    }
                    Err(error) => model.set_error(error),
                }
                caps.render.render();
            }

            Event::CoverImageSelected(file) => {
                Self::upload_single_file(
                    model,
                    caps,
                    &file,
                    "coverImage",
                    |api, token, content_type, body| {
                        api.upload_cover_image(token, &content_type, body)
                    },
                    |r| Event::CoverImageUploadResponse(Box::new(r)),
                );
            }

            Event::CoverImageUploadResponse(result) => {
                match Self::parse_success::<CoverImageUploadResponse>(&result) {
                    Ok(response) => {
                        if let Some(user) = model.session.user.as_mut() {
                            user.cover_image_url = Some(response.cover_image_url);
                        }
                        Self::persist_session(model, caps);
                        model.show_toast("Cover image updated", ToastKind::Success);
                    }
                    Err(error) => model.set_error(error),
                }
                caps.render.render();
            }

            Event::KycFormSubmitted { form, front, back } => {
                let Some(api) = Self::api(model) else { return };
                let Some(token) = Self::token(model) else { return };

                if front.is_none() && back.is_none() {
                    let request = api.update_kyc(&token, &form);
                    Self::send(model, caps, request, |r| {
                        Event::KycUpdateResponse(Box::new(r))
                    });
                    return;
                }

                let mut multipart = MultipartForm::new();
                for (field, file) in [("front", front), ("back", back)] {
                    if let Some(file) = file {
                        match validate_image(&file.data) {
                            Ok(mime) => {
                                multipart.add_file(field, &file.name, mime, &file.data);
                            }
                            Err(e) => {
                                model.set_error(e);
                                caps.render.render();
                                return;
                            }
                        }
                    }
                }

                let (content_type, body) = multipart.finish();
                model.pending_kyc = Some(form);

                let request = api.upload_kyc_documents(&token, &content_type, body);
                if !Self::send(model, caps, request, |r| Event::KycUploadResponse(Box::new(r))) {
                    model.pending_kyc = None;
                }
            }

            Event::KycUploadResponse(result) => {
                match Self::parse_success::<KycUploadResponse>(&result) {
                    Ok(response) => {
                        let Some(mut form) = model.pending_kyc.take() else {
                            warn!("KYC upload finished without a pending form");
                            return;
                        };
                        form.identity_document_images = Some(response.urls);

                        let Some(api) = Self::api(model) else { return };
                        let Some(token) = Self::token(model) else { return };
                        let request = api.update_kyc(&token, &form);
                        Self::send(model, caps, request, |r| {
                            Event::KycUpdateResponse(Box::new(r))
                        });
                    }
                    Err(error) => {
                        model.pending_kyc = None;
                        model.set_error(error);
                        caps.render.render();
                    }
                }
            }

            Event::KycUpdateResponse(result) => {
                match Self::error_of(&result) {
                    None => {
                        model.show_toast(
                            "Verification submitted. We'll review your documents shortly.",
                            ToastKind::Success,
                        );
                        // The profile now carries kyc_status = pending.
                        self.update(Event::RefreshUserData, model, caps);
                    }
                    Some(error) => model.set_error(error),
                }
                caps.render.render();
            }

            Event::FavoriteToggled(vehicle_id) => {
                let Some(api) = Self::api(model) else { return };
                let Some(token) = Self::token(model) else { return };
                let Some(user) = model.session.user.as_ref() else {
                    return;
                };

                let added = !user.is_favorite(&vehicle_id);
                let request = if added {
                    api.add_favorite(&token, &vehicle_id)
                } else {
                    api.remove_favorite(&token, &vehicle_id)
                };

                let id_for_event = vehicle_id.clone();
                match request {
                    Ok(request) => caps.http.send(request, move |r| Event::FavoriteResponse {
                        vehicle_id: id_for_event,
                        added,
                        result: Box::new(r),
                    }),
                    Err(e) => model.set_error(Self::classify_transport_error(&e)),
                }
            }

            Event::FavoriteResponse {
                vehicle_id,
                added,
                result,
            } => {
                match Self::error_of(&result) {
                    None => {
                        if let Some(user) = model.session.user.as_mut() {
                            if added {
                                if !user.favorites.contains(&vehicle_id) {
                                    user.favorites.push(vehicle_id);
                                }
                            } else {
                                user.favorites.retain(|id| id != &vehicle_id);
                            }
                        }
                        Self::persist_session(model, caps);
                    }
                    Some(error) => model.set_error(error),
                }
                caps.render.render();
            }

            // --- catalog ---

            Event::VehiclesRequested { vehicle_type } => {
                let Some(api) = Self::api(model) else { return };
                model.is_loading_vehicles = true;

                let request = match vehicle_type {
                    Some(t) => api.vehicles_by_type(t),
                    None => api.vehicles(),
                };
                Self::send(model, caps, request, |r| Event::VehiclesResponse(Box::new(r)));
                caps.render.render();
            }

            Event::VehiclesResponse(result) => {
                model.is_loading_vehicles = false;

                match Self::error_of(&result) {
                    None => {
                        if let Ok(response) = &*result {
                            match crate::api::parse_vehicle_list(response.body()) {
                                Ok(vehicles) => {
                                    model.vehicles = vehicles;
                                    model.enforce_collection_limits();
                                }
                                Err(e) => {
                                    model.set_error(AppError::new(
                                        ErrorKind::Deserialization,
                                        e.to_string(),
                                    ));
                                }
                            }
                        }
                    }
                    Some(error) => model.set_error(error),
                }
                caps.render.render();
            }

            Event::VehicleDetailRequested(vehicle_id) => {
                let Some(api) = Self::api(model) else { return };
                model.selected_vehicle = None;

                let request = api.vehicle(&vehicle_id);
                Self::send(model, caps, request, |r| {
                    Event::VehicleDetailResponse(Box::new(r))
                });
                caps.render.render();
            }

            Event::VehicleDetailResponse(result) => {
                match Self::parse_success::<Vehicle>(&result) {
                    Ok(vehicle) => model.selected_vehicle = Some(vehicle),
                    Err(error) => model.set_error(error),
                }
                caps.render.render();
            }

            Event::MyVehiclesRequested => {
                let Some(api) = Self::api(model) else { return };
                let Some(token) = Self::token(model) else { return };

                let request = api.my_vehicles(&token);
                Self::send(model, caps, request, |r| {
                    Event::MyVehiclesResponse(Box::new(r))
                });
            }

            Event::MyVehiclesResponse(result) => {
                match Self::error_of(&result) {
                    None => {
                        if let Ok(response) = &*result {
                            match crate::api::parse_vehicle_list(response.body()) {
                                Ok(vehicles) => model.my_vehicles = vehicles,
                                Err(e) => model.set_error(AppError::new(
                                    ErrorKind::Deserialization,
                                    e.to_string(),
                                )),
                            }
                        }
                    }
                    Some(error) if error.kind.is_session_fatal() => {
                        model.session.apply_auth_failure();
                        Self::persist_session(model, caps);
                        model.pending_navigation = Some(Route::Login);
                        model.set_error(error);
                    }
                    Some(error) => model.set_error(error),
                }
                caps.render.render();
            }

            Event::DeleteVehicleRequested(vehicle_id) => {
                let Some(api) = Self::api(model) else { return };
                let Some(token) = Self::token(model) else { return };

                let id_for_event = vehicle_id.clone();
                match api.delete_vehicle(&token, &vehicle_id) {
                    Ok(request) => {
                        caps.http.send(request, move |r| Event::DeleteVehicleResponse {
                            vehicle_id: id_for_event,
                            result: Box::new(r),
                        });
                    }
                    Err(e) => model.set_error(Self::classify_transport_error(&e)),
                }
            }

            Event::DeleteVehicleResponse { vehicle_id, result } => {
                match Self::error_of(&result) {
                    None => {
                        model.my_vehicles.retain(|v| v.id != vehicle_id);
                        model.vehicles.retain(|v| v.id != vehicle_id);
                        model.show_toast("Listing removed", ToastKind::Success);
                    }
                    Some(error) => model.set_error(error),
                }
                caps.render.render();
            }

            // --- catalog filters (pure, recomputed in view) ---

            Event::PriceRangeChanged { min, max } => {
                model.filter.price_min = min;
                model.filter.price_max = max;
                caps.render.render();
            }

            Event::YearRangeChanged { min, max } => {
                model.filter.year_min = min;
                model.filter.year_max = max;
                caps.render.render();
            }

            Event::BrandToggled(brand) => {
                model.filter.toggle_brand(brand);
                caps.render.render();
            }

            Event::ConditionChanged(condition) => {
                model.filter.condition = condition;
                caps.render.render();
            }

            Event::LocationFilterChanged(location) => {
                model.filter.location = location.filter(|l| !l.trim().is_empty());
                caps.render.render();
            }

            Event::EngineBucketChanged(bucket) => {
                model.filter.engine_bucket = bucket;
                caps.render.render();
            }

            Event::FiltersCleared => {
                model.filter.clear();
                caps.render.render();
            }

            // --- listing wizard ---

            Event::WizardOpened => {
                if model.is_authenticated() {
                    model.wizard = Some(ListingWizard::new());
                } else {
                    model.pending_navigation = Some(Route::Login);
                }
                caps.render.render();
            }

            Event::WizardEditRequested(vehicle_id) => {
                if !model.is_authenticated() {
                    model.pending_navigation = Some(Route::Login);
                    caps.render.render();
                    return;
                }

                let vehicle = model
                    .my_vehicles
                    .iter()
                    .find(|v| v.id == vehicle_id)
                    .or(model.selected_vehicle.as_ref().filter(|v| v.id == vehicle_id))
                    .cloned();

                match vehicle {
                    Some(vehicle) => model.wizard = Some(ListingWizard::from_vehicle(&vehicle)),
                    None => model.set_error(AppError::new(
                        ErrorKind::NotFound,
                        "Listing not found",
                    )),
                }
                caps.render.render();
            }

            Event::WizardCancelled => {
                // The draft is transient; navigating away discards it.
                model.wizard = None;
                caps.render.render();
            }

            Event::WizardTypeSelected(vehicle_type) => {
                if let Some(wizard) = model.wizard.as_mut() {
                    wizard.select_type(vehicle_type);
                }
                caps.render.render();
            }

            Event::WizardMakeSelected(make) => {
                if let Some(wizard) = model.wizard.as_mut() {
                    wizard.select_make(make);
                }
                caps.render.render();
            }

            Event::WizardModelSelected(vehicle_model) => {
                if let Some(wizard) = model.wizard.as_mut() {
                    wizard.select_model(vehicle_model);
                }
                caps.render.render();
            }

            Event::WizardBasicEdited(patch) => {
                if let Some(wizard) = model.wizard.as_mut() {
                    wizard.apply_basic_patch(patch);
                }
            }

            Event::WizardSpecsEdited(patch) => {
                if let Some(wizard) = model.wizard.as_mut() {
                    wizard.apply_specs_patch(patch);
                }
            }

            Event::WizardPriceChanged(price) => {
                if let Some(wizard) = model.wizard.as_mut() {
                    wizard.set_price(price);
                }
            }

            Event::WizardLocationChanged(location) => {
                if let Some(wizard) = model.wizard.as_mut() {
                    wizard.set_location(location);
                }
            }

            Event::WizardVideoUrlChanged(url) => {
                if let Some(wizard) = model.wizard.as_mut() {
                    wizard.video_url = url.filter(|u| !u.trim().is_empty());
                }
            }

            Event::WizardNextStep => {
                let max_year = Self::max_listing_year();
                if let Some(wizard) = model.wizard.as_mut() {
                    if !wizard.advance(max_year) {
                        debug!(step = wizard.step.number(), "wizard advance blocked");
                    }
                }
                caps.render.render();
            }

            Event::WizardPrevStep => {
                if let Some(wizard) = model.wizard.as_mut() {
                    wizard.back();
                }
                caps.render.render();
            }

            Event::WizardImagesSelected(files) => {
                if files.is_empty() {
                    return;
                }
                let Some(api) = Self::api(model) else { return };
                let Some(token) = Self::token(model) else { return };

                let mut multipart = MultipartForm::new();
                for file in &files {
                    match validate_image(&file.data) {
                        Ok(mime) => {
                            multipart.add_file("images", &file.name, mime, &file.data);
                        }
                        Err(e) => {
                            model.set_error(e);
                            caps.render.render();
                            return;
                        }
                    }
                }

                let (content_type, body) = multipart.finish();
                let request = api.upload_images(&token, &content_type, body);
                if Self::send(model, caps, request, |r| {
                    Event::WizardImageUploadResponse(Box::new(r))
                }) {
                    if let Some(wizard) = model.wizard.as_mut() {
                        wizard.uploads_in_flight = wizard.uploads_in_flight.saturating_add(1);
                    }
                }
                caps.render.render();
            }

            Event::WizardImageUploadResponse(result) => {
                if let Some(wizard) = model.wizard.as_mut() {
                    wizard.uploads_in_flight = wizard.uploads_in_flight.saturating_sub(1);
                }

                match Self::parse_success::<UploadImagesResponse>(&result) {
                    Ok(response) => {
                        let count = response.urls.len();
                        if let Some(wizard) = model.wizard.as_mut() {
                            wizard.add_images(response.urls);
                        }
                        model.show_toast(
                            format!("Uploaded {count} image(s)"),
                            ToastKind::Success,
                        );
                    }
                    Err(error) => model.set_error(error),
                }
                caps.render.render();
            }

            Event::WizardImageRemoved(index) => {
                if let Some(wizard) = model.wizard.as_mut() {
                    wizard.remove_image(index);
                }
                caps.render.render();
            }

            Event::WizardDocumentSelected { kind, file } => {
                let Some(api) = Self::api(model) else { return };
                let Some(token) = Self::token(model) else { return };

                let mime = match validate_document(&file.data) {
                    Ok(mime) => mime,
                    Err(e) => {
                        model.set_error(e);
                        caps.render.render();
                        return;
                    }
                };

                let mut multipart = MultipartForm::new();
                multipart.add_file("images", &file.name, mime, &file.data);
                let (content_type, body) = multipart.finish();

                match api.upload_images(&token, &content_type, body) {
                    Ok(request) => {
                        caps.http.send(request, move |r| {
                            Event::WizardDocumentUploadResponse {
                                kind,
                                result: Box::new(r),
                            }
                        });
                    }
                    Err(e) => model.set_error(Self::classify_transport_error(&e)),
                }
            }

            Event::WizardDocumentUploadResponse { kind, result } => {
                match Self::parse_success::<UploadImagesResponse>(&result) {
                    Ok(response) => match response.urls.into_iter().next() {
                        Some(url) => {
                            if let Some(wizard) = model.wizard.as_mut() {
                                wizard.set_document(kind, Some(url));
                            }
                            model.show_toast("Document uploaded", ToastKind::Success);
                        }
                        None => model.set_error(AppError::new(
                            ErrorKind::Deserialization,
                            "upload response contained no URL",
                        )),
                    },
                    Err(error) => model.set_error(error),
                }
                caps.render.render();
            }

            Event::WizardDocumentCleared(kind) => {
                if let Some(wizard) = model.wizard.as_mut() {
                    wizard.set_document(kind, None);
                }
                caps.render.render();
            }

            Event::WizardSubmitRequested => {
                if !model.is_authenticated() {
                    model.set_error(AppError::new(
                        ErrorKind::Authentication,
                        "Please sign in to publish a listing",
                    ));
                    model.pending_navigation = Some(Route::Login);
                    caps.render.render();
                    return;
                }

                let max_year = Self::max_listing_year();
                let payload = {
                    let Some(wizard) = model.wizard.as_mut() else {
                        return;
                    };
                    if wizard.submitting {
                        return;
                    }
                    match wizard.build_payload(max_year) {
                        Ok(payload) => payload,
                        Err(errors) => {
                            wizard.step_errors = errors;
                            caps.render.render();
                            return;
                        }
                    }
                };

                let Some(api) = Self::api(model) else { return };
                let Some(token) = Self::token(model) else { return };
                let editing = model.wizard.as_ref().and_then(|w| w.editing.clone());

                let request = match &editing {
                    Some(id) => api.update_vehicle(&token, id, &payload),
                    None => api.create_vehicle(&token, &payload),
                };

                if Self::send(model, caps, request, |r| {
                    Event::WizardSubmitResponse(Box::new(r))
                }) {
                    if let Some(wizard) = model.wizard.as_mut() {
                        wizard.submitting = true;
                    }
                }
                caps.render.render();
            }

            Event::WizardSubmitResponse(result) => {
                if let Some(wizard) = model.wizard.as_mut() {
                    wizard.submitting = false;
                }

                match Self::error_of(&result) {
                    None => {
                        let message = match &*result {
                            Ok(response) => response
                                .json::<CreateVehicleResponse>()
                                .ok()
                                .and_then(|r| r.message),
                            Err(_) => None,
                        }
                        .unwrap_or_else(|| "Listing published".to_string());

                        model.wizard = None;
                        model.show_toast(message, ToastKind::Success);
                        model.pending_navigation = Some(Route::MyVehicles);

                        self.update(Event::MyVehiclesRequested, model, caps);
                    }
                    Some(error) => {
                        // Input is preserved for correction; 413 carries the
                        // reduce-images hint in its user-facing message.
                        model.set_error(error);
                    }
                }
                caps.render.render();
            }

            // --- chat ---

            Event::ConversationsRequested => {
                let Some(api) = Self::api(model) else { return };
                let Some(token) = Self::token(model) else { return };

                let request = api.conversations(&token);
                Self::send(model, caps, request, |r| {
                    Event::ConversationsResponse(Box::new(r))
                });
            }

            Event::ConversationsResponse(result) => {
                match Self::parse_success::<Vec<Conversation>>(&result) {
                    Ok(conversations) => model.conversations = conversations,
                    Err(error) => model.set_error(error),
                }
                caps.render.render();
            }

            Event::ConversationOpened(conversation_id) => {
                let Some(api) = Self::api(model) else { return };
                let Some(token) = Self::token(model) else { return };

                model.selected_conversation = Some(conversation_id.clone());

                let request = api.conversation(&token, &conversation_id);
                Self::send(model, caps, request, |r| {
                    Event::ConversationResponse(Box::new(r))
                });
                caps.render.render();
            }

            Event::ConversationResponse(result) => {
                match Self::parse_success::<Conversation>(&result) {
                    Ok(mut conversation) => {
                        if let Some(me) = model.session.user.as_ref().map(|u| u.id.clone()) {
                            conversation.mark_read(&me);
                        }
                        match model
                            .conversations
                            .iter()
                            .position(|c| c.id == conversation.id)
                        {
                            Some(index) => model.conversations[index] = conversation,
                            None => model.conversations.push(conversation),
                        }
                    }
                    Err(error) => model.set_error(error),
                }
                caps.render.render();
            }

            Event::ChatSearchChanged(query) => {
                model.chat_search = query;
                caps.render.render();
            }

            Event::MessageComposed {
                conversation_id,
                content,
            } => {
                let content = content.trim().to_string();
                if content.is_empty() {
                    return;
                }
                let Some(api) = Self::api(model) else { return };
                let Some(token) = Self::token(model) else { return };

                let id_for_event = conversation_id.clone();
                match api.send_message(
                    &token,
                    &conversation_id,
                    &crate::api::SendMessageRequest { content },
                ) {
                    Ok(request) => caps.http.send(request, move |r| Event::MessageSendResponse {
                        conversation_id: id_for_event,
                        result: Box::new(r),
                    }),
                    Err(e) => model.set_error(Self::classify_transport_error(&e)),
                }
            }

            Event::MessageSendResponse {
                conversation_id,
                result,
            } => {
                match Self::parse_success::<Message>(&result) {
                    Ok(message) => {
                        if let Some(conversation) = model
                            .conversations
                            .iter_mut()
                            .find(|c| c.id == conversation_id)
                        {
                            conversation.push_message(message);
                        }
                    }
                    Err(error) if error.kind == ErrorKind::Deserialization => {
                        // Message accepted but echoed in an unknown shape;
                        // re-fetch the thread instead of guessing.
                        self.update(Event::ConversationOpened(conversation_id), model, caps);
                    }
                    Err(error) => model.set_error(error),
                }
                caps.render.render();
            }

            Event::RealtimeMessageReceived {
                conversation_id,
                message,
            } => {
                let me = model.session.user.as_ref().map(|u| u.id.clone());
                let is_open = model.selected_conversation.as_ref() == Some(&conversation_id);

                let mut delivered = false;
                if let Some(conversation) = model
                    .conversations
                    .iter_mut()
                    .find(|c| c.id == conversation_id)
                {
                    conversation.push_message(message);
                    if is_open {
                        if let Some(me) = &me {
                            conversation.mark_read(me);
                        }
                    }
                    delivered = true;
                }

                if !delivered {
                    // Thread not loaded yet; pull the list again.
                    self.update(Event::ConversationsRequested, model, caps);
                }
                caps.render.render();
            }

            // --- generic UI ---

            Event::DismissError => {
                model.clear_error();
                caps.render.render();
            }

            Event::DismissToast => {
                model.clear_toast();
                caps.render.render();
            }

            Event::NavigationHandled => {
                model.pending_navigation = None;
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        view::build(model)
    }
}
