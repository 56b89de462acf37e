//! Read-only projections handed to the shell. Everything here is plain
//! serialisable data; the shell renders it and never reaches into `Model`.

use serde::Serialize;

use crate::catalog::available_brands;
use crate::chat;
use crate::model::{KycStatus, Model, Route, ToastKind, ToastMessage, Vehicle, VehicleStatus, VehicleType};
use crate::session::SessionState;
use crate::wizard::{brands_for_type, FieldError, WizardStep};
use crate::{format_price, AppError, ErrorSeverity};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub state: SessionState,
    pub user_id: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub kyc_status: Option<KycStatus>,
    pub wallet_balance: Option<f64>,
    pub is_refreshing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleCardView {
    pub id: String,
    pub title: String,
    pub vehicle_type: &'static str,
    pub price_text: String,
    pub year: u16,
    pub location: String,
    pub primary_image: Option<String>,
    pub is_new: bool,
    pub is_favorite: bool,
    pub status: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleDetailView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price_text: String,
    pub year: u16,
    pub location: String,
    pub images: Vec<String>,
    pub mileage: Option<u32>,
    pub body_type: Option<String>,
    pub engine_capacity: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub seller_name: Option<String>,
    pub seller_rating: Option<f32>,
    pub is_favorite: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WizardView {
    pub step: u8,
    pub total_steps: u8,
    pub step_title: &'static str,
    pub vehicle_type: Option<&'static str>,
    pub available_brands: Vec<&'static str>,
    pub available_models: Vec<&'static str>,
    pub selected_make: String,
    pub selected_model: String,
    pub images: Vec<String>,
    pub uploads_in_flight: u8,
    pub submitting: bool,
    pub is_last_step: bool,
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationView {
    pub id: String,
    pub counterpart_name: String,
    pub counterpart_avatar: Option<String>,
    pub last_message: Option<String>,
    pub last_message_at: Option<String>,
    pub has_unread: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserFacingError {
    pub message: String,
    pub error_code: &'static str,
    pub is_transient: bool,
    pub is_retryable: bool,
    pub field_errors: Vec<String>,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            error_code: e.code(),
            is_transient: e.severity == ErrorSeverity::Transient,
            is_retryable: e.is_retryable(),
            field_errors: e.field_errors.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToastView {
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u64,
}

impl From<&ToastMessage> for ToastView {
    fn from(t: &ToastMessage) -> Self {
        Self {
            message: t.message.clone(),
            kind: t.kind,
            duration_ms: t.duration_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub session: SessionView,
    pub vehicles: Vec<VehicleCardView>,
    pub total_vehicle_count: usize,
    pub available_brands: Vec<String>,
    pub selected_vehicle: Option<VehicleDetailView>,
    pub my_vehicles: Vec<VehicleCardView>,
    pub is_loading_vehicles: bool,
    pub wizard: Option<WizardView>,
    pub conversations: Vec<ConversationView>,
    pub unread_conversations: usize,
    pub error: Option<UserFacingError>,
    pub toast: Option<ToastView>,
    pub navigation: Option<Route>,
}

#[must_use]
pub fn build(model: &Model) -> ViewModel {
    let favorites = model
        .session
        .user
        .as_ref()
        .map(|u| u.favorites.clone())
        .unwrap_or_default();

    let is_favorite = |vehicle: &Vehicle| favorites.contains(&vehicle.id);

    let vehicle_card = |vehicle: &Vehicle| VehicleCardView {
        id: vehicle.id.0.clone(),
        title: vehicle.display_title(),
        vehicle_type: vehicle.vehicle_type.as_str(),
        price_text: format_price(vehicle.price, &vehicle.currency),
        year: vehicle.year,
        location: vehicle.location.clone(),
        primary_image: vehicle.primary_image().map(String::from),
        is_new: vehicle.is_new(),
        is_favorite: is_favorite(vehicle),
        status: vehicle.status.map(VehicleStatus::as_str),
    };

    let session = SessionView {
        state: model.session.state,
        user_id: model.session.user.as_ref().map(|u| u.id.0.clone()),
        display_name: model.session.user.as_ref().map(|u| u.full_name.clone()),
        avatar_url: model
            .session
            .user
            .as_ref()
            .and_then(|u| u.avatar_url.clone()),
        kyc_status: model.session.user.as_ref().and_then(|u| u.kyc_status),
        wallet_balance: model.session.user.as_ref().and_then(|u| u.wallet_balance),
        is_refreshing: model.session.is_refreshing,
    };

    let filtered = model.filter.apply(&model.vehicles);

    let wizard = model.wizard.as_ref().map(|w| WizardView {
        step: w.step.number(),
        total_steps: WizardStep::TOTAL,
        step_title: w.step.title(),
        vehicle_type: w.vehicle_type.map(VehicleType::as_str),
        available_brands: w
            .vehicle_type
            .map(brands_for_type)
            .unwrap_or_default(),
        available_models: w.available_models.clone(),
        selected_make: w.basic.make.clone(),
        selected_model: w.basic.model.clone(),
        images: w.images.clone(),
        uploads_in_flight: w.uploads_in_flight,
        submitting: w.submitting,
        is_last_step: w.step.is_last(),
        errors: w.step_errors.clone(),
    });

    let me = model.session.user.as_ref().map(|u| u.id.clone());
    let conversations = match &me {
        Some(me) => chat::search(&model.conversations, me, &model.chat_search)
            .into_iter()
            .map(|c| {
                let counterpart = c.other_participant(me);
                ConversationView {
                    id: c.id.0.clone(),
                    counterpart_name: counterpart
                        .map_or_else(|| "Conversation".to_string(), |p| p.name.clone()),
                    counterpart_avatar: counterpart.and_then(|p| p.avatar.clone()),
                    last_message: c.last_message.as_ref().map(|m| m.content.clone()),
                    last_message_at: c.last_message.as_ref().map(|m| m.timestamp.clone()),
                    has_unread: c.has_unread_from_others(me),
                }
            })
            .collect(),
        None => Vec::new(),
    };

    let unread = me
        .as_ref()
        .map_or(0, |me| chat::unread_count(&model.conversations, me));

    ViewModel {
        session,
        total_vehicle_count: model.vehicles.len(),
        available_brands: available_brands(&model.vehicles),
        vehicles: filtered.iter().map(&vehicle_card).collect(),
        selected_vehicle: model.selected_vehicle.as_ref().map(|v| VehicleDetailView {
            id: v.id.0.clone(),
            title: v.display_title(),
            description: v.description.clone(),
            price_text: format_price(v.price, &v.currency),
            year: v.year,
            location: v.location.clone(),
            images: v.images.clone(),
            mileage: v.mileage,
            body_type: v.body_type.clone(),
            engine_capacity: v.engine_capacity.clone(),
            fuel_type: v.fuel_type.clone(),
            transmission: v.transmission.clone(),
            seller_name: v.user.as_ref().map(|u| u.display_name().to_string()),
            seller_rating: v.user.as_ref().and_then(|u| u.rating),
            is_favorite: is_favorite(v),
        }),
        my_vehicles: model.my_vehicles.iter().map(&vehicle_card).collect(),
        is_loading_vehicles: model.is_loading_vehicles,
        wizard,
        conversations,
        unread_conversations: unread,
        error: model.active_error.as_ref().map(UserFacingError::from),
        toast: model.active_toast.as_ref().map(ToastView::from),
        navigation: model.pending_navigation.clone(),
    }
}
