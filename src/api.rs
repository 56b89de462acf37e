//! Endpoint catalogue and request constructors for the marketplace REST
//! API. The base URL comes from the shell's environment; everything else
//! is fixed paths.

use serde::{Deserialize, Serialize};

use crate::capabilities::{HttpError, HttpRequest};
use crate::model::{IdentityDocumentImages, User, Vehicle, VehicleType};
use crate::{ConversationId, VehicleId, SUBMIT_LISTING_TIMEOUT, UPLOAD_TIMEOUT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, HttpError> {
        let base_url = base_url.into();
        // Validate eagerly so a bad environment value fails at startup, not
        // on the first request.
        crate::capabilities::ValidatedUrl::new(&base_url)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    // --- auth ---

    pub fn login(&self, payload: &LoginRequest) -> Result<HttpRequest, HttpError> {
        HttpRequest::post(self.url("/users/login"))?.with_json(payload)
    }

    pub fn register(&self, payload: &RegisterRequest) -> Result<HttpRequest, HttpError> {
        HttpRequest::post(self.url("/users/register"))?.with_json(payload)
    }

    pub fn profile(&self, token: &str) -> Result<HttpRequest, HttpError> {
        HttpRequest::get(self.url("/users/profile"))?.with_bearer(token)
    }

    pub fn update_profile(
        &self,
        token: &str,
        payload: &ProfileUpdateRequest,
    ) -> Result<HttpRequest, HttpError> {
        HttpRequest::put(self.url("/users/profile"))?
            .with_bearer(token)?
            .with_json(payload)
    }

    pub fn upload_avatar(
        &self,
        token: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<HttpRequest, HttpError> {
        HttpRequest::post(self.url("/users/avatar"))?
            .with_bearer(token)?
            .with_body(body, content_type)?
            .with_timeout(UPLOAD_TIMEOUT)
    }

    pub fn upload_cover_image(
        &self,
        token: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<HttpRequest, HttpError> {
        HttpRequest::post(self.url("/users/cover-image"))?
            .with_bearer(token)?
            .with_body(body, content_type)?
            .with_timeout(UPLOAD_TIMEOUT)
    }

    // --- KYC ---

    pub fn upload_kyc_documents(
        &self,
        token: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<HttpRequest, HttpError> {
        HttpRequest::post(self.url("/users/upload-kyc-documents"))?
            .with_bearer(token)?
            .with_body(body, content_type)?
            .with_timeout(UPLOAD_TIMEOUT)
    }

    pub fn update_kyc(
        &self,
        token: &str,
        payload: &KycUpdateRequest,
    ) -> Result<HttpRequest, HttpError> {
        HttpRequest::put(self.url("/users/update-kyc"))?
            .with_bearer(token)?
            .with_json(payload)
    }

    // --- favorites ---

    pub fn add_favorite(&self, token: &str, id: &VehicleId) -> Result<HttpRequest, HttpError> {
        HttpRequest::post(self.url(&format!("/users/favorites/{id}")))?.with_bearer(token)
    }

    pub fn remove_favorite(&self, token: &str, id: &VehicleId) -> Result<HttpRequest, HttpError> {
        HttpRequest::delete(self.url(&format!("/users/favorites/{id}")))?.with_bearer(token)
    }

    // --- vehicles ---

    pub fn vehicles(&self) -> Result<HttpRequest, HttpError> {
        HttpRequest::get(self.url("/vehicles"))
    }

    pub fn vehicles_by_type(&self, vehicle_type: VehicleType) -> Result<HttpRequest, HttpError> {
        HttpRequest::get(self.url(&format!("/vehicles/type/{}", vehicle_type.as_str())))
    }

    pub fn vehicle(&self, id: &VehicleId) -> Result<HttpRequest, HttpError> {
        HttpRequest::get(self.url(&format!("/vehicles/{id}")))
    }

    pub fn my_vehicles(&self, token: &str) -> Result<HttpRequest, HttpError> {
        HttpRequest::get(self.url("/vehicles/user"))?.with_bearer(token)
    }

    pub fn create_vehicle(
        &self,
        token: &str,
        payload: &CreateVehicleRequest,
    ) -> Result<HttpRequest, HttpError> {
        HttpRequest::post(self.url("/vehicles"))?
            .with_bearer(token)?
            .with_json(payload)?
            .with_timeout(SUBMIT_LISTING_TIMEOUT)
    }

    pub fn update_vehicle(
        &self,
        token: &str,
        id: &VehicleId,
        payload: &CreateVehicleRequest,
    ) -> Result<HttpRequest, HttpError> {
        HttpRequest::put(self.url(&format!("/vehicles/{id}")))?
            .with_bearer(token)?
            .with_json(payload)?
            .with_timeout(SUBMIT_LISTING_TIMEOUT)
    }

    pub fn delete_vehicle(&self, token: &str, id: &VehicleId) -> Result<HttpRequest, HttpError> {
        HttpRequest::delete(self.url(&format!("/vehicles/{id}")))?.with_bearer(token)
    }

    /// Multipart upload, field name `images`. Used for listing photos and
    /// for registration/inspection documents alike.
    pub fn upload_images(
        &self,
        token: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<HttpRequest, HttpError> {
        HttpRequest::post(self.url("/vehicles/upload"))?
            .with_bearer(token)?
            .with_body(body, content_type)?
            .with_timeout(UPLOAD_TIMEOUT)
    }

    // --- chat ---

    pub fn conversations(&self, token: &str) -> Result<HttpRequest, HttpError> {
        HttpRequest::get(self.url("/chat"))?.with_bearer(token)
    }

    pub fn conversation(&self, token: &str, id: &ConversationId) -> Result<HttpRequest, HttpError> {
        HttpRequest::get(self.url(&format!("/chat/{id}")))?.with_bearer(token)
    }

    pub fn send_message(
        &self,
        token: &str,
        id: &ConversationId,
        payload: &SendMessageRequest,
    ) -> Result<HttpRequest, HttpError> {
        HttpRequest::post(self.url(&format!("/chat/{id}/messages")))?
            .with_bearer(token)?
            .with_json(payload)
    }
}

// --- wire DTOs ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<User>,
}

/// Registration payload. Confirmation-only fields from the form never
/// appear here, so they cannot leak to the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProfileUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KycUpdateRequest {
    pub identity_document_type: String,
    pub identity_document_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_document_images: Option<IdentityDocumentImages>,
    pub bank_account_name: String,
    pub bank_account_number: String,
    pub bank_name: String,
    /// Always submitted as `pending`; adjudication happens server-side.
    pub kyc_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KycUploadResponse {
    pub urls: IdentityDocumentImages,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarUploadResponse {
    pub avatar_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverImageUploadResponse {
    pub cover_image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadImagesResponse {
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateVehicleRequest {
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
    pub title: String,
    pub description: String,
    pub make: String,
    pub model: String,
    pub year: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mileage: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_capacity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transmission: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vin: Option<String>,
    pub price: u64,
    pub currency: String,
    pub location: String,
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_papers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspection_papers: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVehicleResponse {
    #[serde(rename = "_id", default)]
    pub id: Option<VehicleId>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PaginatedVehicles {
    vehicles: Vec<Vehicle>,
    #[serde(default)]
    pagination: Option<PaginationInfo>,
}

/// The list endpoints answer either a bare array (legacy) or a paginated
/// wrapper; accept both.
pub fn parse_vehicle_list(body: &[u8]) -> Result<Vec<Vehicle>, HttpError> {
    if let Ok(vehicles) = serde_json::from_slice::<Vec<Vehicle>>(body) {
        return Ok(vehicles);
    }

    serde_json::from_slice::<PaginatedVehicles>(body)
        .map(|p| p.vehicles)
        .map_err(|e| HttpError::InvalidResponse {
            reason: format!("unexpected vehicle list shape: {e}"),
        })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}
