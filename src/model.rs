use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::CatalogFilter;
use crate::chat::Conversation;
use crate::session::Session;
use crate::wizard::ListingWizard;
use crate::{
    get_current_time_ms, AppError, ConversationId, UserId, VehicleId, DEFAULT_API_URL,
    MAX_CACHED_VEHICLES,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Car,
    Motorcycle,
    Bicycle,
    Truck,
    Other,
}

impl VehicleType {
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "car" => Some(Self::Car),
            "motorcycle" | "motorbike" => Some(Self::Motorcycle),
            "bicycle" | "bike" => Some(Self::Bicycle),
            "truck" => Some(Self::Truck),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Car => "car",
            Self::Motorcycle => "motorcycle",
            Self::Bicycle => "bicycle",
            Self::Truck => "truck",
            Self::Other => "other",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Car => "Car",
            Self::Motorcycle => "Motorcycle",
            Self::Bicycle => "Bicycle",
            Self::Truck => "Truck",
            Self::Other => "Other",
        }
    }

    /// Whether listings of this type carry an odometer reading.
    #[must_use]
    pub const fn has_mileage(self) -> bool {
        !matches!(self, Self::Bicycle)
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Pending,
    Approved,
    Rejected,
    Sold,
    Removed,
}

impl VehicleStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Sold => "sold",
            Self::Removed => "removed",
        }
    }

    /// A listing the marketplace no longer shows to buyers.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Sold | Self::Removed)
    }

    #[must_use]
    pub const fn is_visible_in_catalog(self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// Seller details embedded in a vehicle payload. The API is loose about
/// which of `name`/`full_name` and `phone`/`phone_number` it sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VehicleOwner {
    #[serde(rename = "_id", default)]
    pub id: Option<UserId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default)]
    pub total_listings: Option<u32>,
}

impl VehicleOwner {
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("Unknown seller")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    #[serde(rename = "_id")]
    pub id: VehicleId,
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
    #[serde(default)]
    pub make: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub year: u16,
    #[serde(default)]
    pub price: u64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Ordered; the first entry is the primary image.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub mileage: Option<u32>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub body_type: Option<String>,
    #[serde(default)]
    pub engine_capacity: Option<String>,
    #[serde(default)]
    pub fuel_type: Option<String>,
    #[serde(default)]
    pub transmission: Option<String>,
    #[serde(default)]
    pub payload: Option<f64>,
    #[serde(default)]
    pub registration_papers: Option<String>,
    #[serde(default)]
    pub inspection_papers: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub status: Option<VehicleStatus>,
    #[serde(default)]
    pub user: Option<VehicleOwner>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub views_count: Option<u64>,
}

fn default_currency() -> String {
    "VND".to_string()
}

impl Vehicle {
    #[must_use]
    pub fn display_title(&self) -> String {
        self.title
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("{} {} {}", self.make, self.model, self.year))
    }

    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    #[must_use]
    pub fn is_new(&self) -> bool {
        self.condition.as_deref() == Some("new")
    }

    /// Numeric engine capacity in cc, when the free-text field parses.
    /// Bicycle frame sizes ("M", "700c") intentionally come back `None`.
    #[must_use]
    pub fn engine_capacity_cc(&self) -> Option<u32> {
        let raw = self.engine_capacity.as_deref()?.trim();
        let digits: String = raw
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if digits.is_empty() {
            return None;
        }
        digits.parse().ok()
    }

    #[must_use]
    pub fn description_preview(&self, max_len: usize) -> String {
        if self.description.len() <= max_len {
            self.description.clone()
        } else {
            let mut preview: String = self
                .description
                .chars()
                .take(max_len.saturating_sub(3))
                .collect();
            preview.push_str("...");
            preview
        }
    }

    #[must_use]
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.user
            .as_ref()
            .and_then(|u| u.id.as_ref())
            .map_or(false, |id| id == user_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    Pending,
    Verified,
    Rejected,
}

impl KycStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }

    #[must_use]
    pub const fn is_verified(self) -> bool {
        matches!(self, Self::Verified)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IdentityDocumentImages {
    #[serde(default)]
    pub front: Option<String>,
    #[serde(default)]
    pub back: Option<String>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub rating: f32,
    /// Absent until the user has started identity verification.
    #[serde(default)]
    pub kyc_status: Option<KycStatus>,
    #[serde(default)]
    pub identity_document_type: Option<String>,
    #[serde(default)]
    pub identity_document_number: Option<String>,
    #[serde(default)]
    pub identity_document_images: Option<IdentityDocumentImages>,
    #[serde(default)]
    pub wallet_balance: Option<f64>,
    #[serde(default)]
    pub favorites: Vec<VehicleId>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

// Redact debug output because this holds contact and identity-document data.
impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("kyc_status", &self.kyc_status)
            .field("email_present", &!self.email.is_empty())
            .field("phone_present", &!self.phone_number.is_empty())
            .field("favorites", &self.favorites.len())
            .finish_non_exhaustive()
    }
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    #[must_use]
    pub fn is_favorite(&self, vehicle_id: &VehicleId) -> bool {
        self.favorites.contains(vehicle_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToastMessage {
    pub message: String,
    pub kind: ToastKind,
    pub created_at_ms: u64,
    pub duration_ms: u64,
}

impl ToastMessage {
    #[must_use]
    pub fn new(message: impl Into<String>, kind: ToastKind) -> Self {
        Self {
            message: message.into(),
            kind,
            created_at_ms: get_current_time_ms(),
            duration_ms: kind.default_duration_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl ToastKind {
    #[must_use]
    pub const fn default_duration_ms(self) -> u64 {
        match self {
            Self::Info => 3000,
            Self::Success => 2000,
            Self::Warning => 4000,
            Self::Error => 5000,
        }
    }
}

/// Navigation the shell should perform after the next render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Landing,
    Login,
    MyVehicles,
    VehicleDetail(VehicleId),
}

pub struct Model {
    pub api_url: String,
    pub session: Session,

    // Catalog
    pub vehicles: Vec<Vehicle>,
    pub filter: CatalogFilter,
    pub selected_vehicle: Option<Vehicle>,
    pub my_vehicles: Vec<Vehicle>,
    pub is_loading_vehicles: bool,

    // Listing creation
    pub wizard: Option<ListingWizard>,

    // Chat
    pub conversations: Vec<Conversation>,
    pub selected_conversation: Option<ConversationId>,
    pub chat_search: String,

    /// KYC form held while its document images are still uploading.
    pub pending_kyc: Option<crate::api::KycUpdateRequest>,

    // Generic UI state
    pub active_error: Option<AppError>,
    pub active_toast: Option<ToastMessage>,
    pub pending_navigation: Option<Route>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            session: Session::default(),
            vehicles: Vec::new(),
            filter: CatalogFilter::default(),
            selected_vehicle: None,
            my_vehicles: Vec::new(),
            is_loading_vehicles: false,
            wizard: None,
            conversations: Vec::new(),
            selected_conversation: None,
            chat_search: String::new(),
            pending_kyc: None,
            active_error: None,
            active_toast: None,
            pending_navigation: None,
        }
    }
}

impl Model {
    pub fn set_error(&mut self, error: AppError) {
        self.active_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.active_error = None;
    }

    pub fn show_toast(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.active_toast = Some(ToastMessage::new(message, kind));
    }

    pub fn clear_toast(&mut self) {
        self.active_toast = None;
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.state.is_authenticated()
    }

    pub fn enforce_collection_limits(&mut self) {
        if self.vehicles.len() > MAX_CACHED_VEHICLES {
            self.vehicles.truncate(MAX_CACHED_VEHICLES);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_deserializes_from_api_shape() {
        let json = serde_json::json!({
            "_id": "v1",
            "type": "motorcycle",
            "make": "Honda",
            "model": "Wave",
            "year": 2022,
            "price": 20_000_000_u64,
            "description": "Well maintained",
            "images": ["https://cdn.example.com/1.jpg"],
            "location": "Hà Nội",
            "engine_capacity": "125",
            "user": {"_id": "u1", "full_name": "Seller"}
        });

        let vehicle: Vehicle = serde_json::from_value(json).unwrap();
        assert_eq!(vehicle.vehicle_type, VehicleType::Motorcycle);
        assert_eq!(vehicle.currency, "VND");
        assert_eq!(vehicle.engine_capacity_cc(), Some(125));
        assert_eq!(vehicle.primary_image(), Some("https://cdn.example.com/1.jpg"));
        assert!(vehicle.is_owned_by(&UserId::new("u1")));
    }

    #[test]
    fn engine_capacity_parsing_ignores_units_and_frame_sizes() {
        let mut vehicle: Vehicle = serde_json::from_value(serde_json::json!({
            "_id": "v2", "type": "motorcycle"
        }))
        .unwrap();

        vehicle.engine_capacity = Some("150 cc".into());
        assert_eq!(vehicle.engine_capacity_cc(), Some(150));

        vehicle.engine_capacity = Some("M".into());
        assert_eq!(vehicle.engine_capacity_cc(), None);

        vehicle.engine_capacity = None;
        assert_eq!(vehicle.engine_capacity_cc(), None);
    }

    #[test]
    fn user_debug_redacts_contact_details() {
        let user: User = serde_json::from_value(serde_json::json!({
            "_id": "u1",
            "full_name": "Nguyễn Văn A",
            "email": "a@example.com",
            "phone_number": "0123456789"
        }))
        .unwrap();

        let debug = format!("{user:?}");
        assert!(!debug.contains("a@example.com"));
        assert!(!debug.contains("0123456789"));
    }

    #[test]
    fn kyc_status_defaults_to_unset() {
        let user: User =
            serde_json::from_value(serde_json::json!({"_id": "u1"})).unwrap();
        assert!(user.kyc_status.is_none());
    }
}
