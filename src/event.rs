use crate::api::{KycUpdateRequest, ProfileUpdateRequest, RegisterRequest};
use crate::capabilities::{HttpResult, StorageResult};
use crate::catalog::{ConditionFilter, EngineCapacityBucket};
use crate::chat::Message;
use crate::media::StagedFile;
use crate::model::VehicleType;
use crate::wizard::{BasicInfoPatch, DocumentKind, SpecsPatch};
use crate::{ConversationId, VehicleId};

#[derive(Debug, Clone)]
pub enum Event {
    Noop,

    /// Fired once by the shell; carries the configured API base URL.
    AppStarted {
        api_url: Option<String>,
    },

    // --- session / auth ---
    SessionRestored(Box<StorageResult>),
    SessionPersisted(Box<StorageResult>),
    LoginRequested {
        email: String,
        password: String,
    },
    LoginResponse(Box<HttpResult>),
    RegisterRequested(RegisterRequest),
    RegisterResponse(Box<HttpResult>),
    RefreshUserData,
    ProfileResponse(Box<HttpResult>),
    LogoutRequested,

    // --- profile / KYC / favorites ---
    ProfileUpdateSubmitted(ProfileUpdateRequest),
    ProfileUpdateResponse(Box<HttpResult>),
    AvatarSelected(StagedFile),
    AvatarUploadResponse(Box<HttpResult>),
    CoverImageSelected(StagedFile),
    CoverImageUploadResponse(Box<HttpResult>),
    KycFormSubmitted {
        form: KycUpdateRequest,
        front: Option<StagedFile>,
        back: Option<StagedFile>,
    },
    KycUploadResponse(Box<HttpResult>),
    KycUpdateResponse(Box<HttpResult>),
    FavoriteToggled(VehicleId),
    FavoriteResponse {
        vehicle_id: VehicleId,
        added: bool,
        result: Box<HttpResult>,
    },

    // --- catalog ---
    VehiclesRequested {
        vehicle_type: Option<VehicleType>,
    },
    VehiclesResponse(Box<HttpResult>),
    VehicleDetailRequested(VehicleId),
    VehicleDetailResponse(Box<HttpResult>),
    MyVehiclesRequested,
    MyVehiclesResponse(Box<HttpResult>),
    DeleteVehicleRequested(VehicleId),
    DeleteVehicleResponse {
        vehicle_id: VehicleId,
        result: Box<HttpResult>,
    },

    // --- catalog filters ---
    PriceRangeChanged {
        min: Option<u64>,
        max: Option<u64>,
    },
    YearRangeChanged {
        min: Option<u16>,
        max: Option<u16>,
    },
    BrandToggled(String),
    ConditionChanged(ConditionFilter),
    LocationFilterChanged(Option<String>),
    EngineBucketChanged(Option<EngineCapacityBucket>),
    FiltersCleared,

    // --- listing wizard ---
    WizardOpened,
    /// Open the wizard prefilled with one of the caller's own listings.
    WizardEditRequested(VehicleId),
    WizardCancelled,
    WizardTypeSelected(VehicleType),
    WizardMakeSelected(String),
    WizardModelSelected(String),
    WizardBasicEdited(BasicInfoPatch),
    WizardSpecsEdited(SpecsPatch),
    WizardPriceChanged(u64),
    WizardLocationChanged(String),
    WizardVideoUrlChanged(Option<String>),
    WizardNextStep,
    WizardPrevStep,
    WizardImagesSelected(Vec<StagedFile>),
    WizardImageUploadResponse(Box<HttpResult>),
    WizardImageRemoved(usize),
    WizardDocumentSelected {
        kind: DocumentKind,
        file: StagedFile,
    },
    WizardDocumentUploadResponse {
        kind: DocumentKind,
        result: Box<HttpResult>,
    },
    WizardDocumentCleared(DocumentKind),
    WizardSubmitRequested,
    WizardSubmitResponse(Box<HttpResult>),

    // --- chat ---
    ConversationsRequested,
    ConversationsResponse(Box<HttpResult>),
    ConversationOpened(ConversationId),
    ConversationResponse(Box<HttpResult>),
    ChatSearchChanged(String),
    MessageComposed {
        conversation_id: ConversationId,
        content: String,
    },
    MessageSendResponse {
        conversation_id: ConversationId,
        result: Box<HttpResult>,
    },
    /// Pushed in by the shell's realtime channel.
    RealtimeMessageReceived {
        conversation_id: ConversationId,
        message: Message,
    },

    // --- generic UI ---
    DismissError,
    DismissToast,
    /// The shell performed the pending navigation.
    NavigationHandled,
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::AppStarted { .. } => "app_started",
            Self::SessionRestored(_) => "session_restored",
            Self::SessionPersisted(_) => "session_persisted",
            Self::LoginRequested { .. } => "login_requested",
            Self::LoginResponse(_) => "login_response",
            Self::RegisterRequested(_) => "register_requested",
            Self::RegisterResponse(_) => "register_response",
            Self::RefreshUserData => "refresh_user_data",
            Self::ProfileResponse(_) => "profile_response",
            Self::LogoutRequested => "logout_requested",
            Self::ProfileUpdateSubmitted(_) => "profile_update_submitted",
            Self::ProfileUpdateResponse(_) => "profile_update_response",
            Self::AvatarSelected(_) => "avatar_selected",
            Self::AvatarUploadResponse(_) => "avatar_upload_response",
            Self::CoverImageSelected(_) => "cover_image_selected",
            Self::CoverImageUploadResponse(_) => "cover_image_upload_response",
            Self::KycFormSubmitted { .. } => "kyc_form_submitted",
            Self::KycUploadResponse(_) => "kyc_upload_response",
            Self::KycUpdateResponse(_) => "kyc_update_response",
            Self::FavoriteToggled(_) => "favorite_toggled",
            Self::FavoriteResponse { .. } => "favorite_response",
            Self::VehiclesRequested { .. } => "vehicles_requested",
            Self::VehiclesResponse(_) => "vehicles_response",
            Self::VehicleDetailRequested(_) => "vehicle_detail_requested",
            Self::VehicleDetailResponse(_) => "vehicle_detail_response",
            Self::MyVehiclesRequested => "my_vehicles_requested",
            Self::MyVehiclesResponse(_) => "my_vehicles_response",
            Self::DeleteVehicleRequested(_) => "delete_vehicle_requested",
            Self::DeleteVehicleResponse { .. } => "delete_vehicle_response",
            Self::PriceRangeChanged { .. } => "price_range_changed",
            Self::YearRangeChanged { .. } => "year_range_changed",
            Self::BrandToggled(_) => "brand_toggled",
            Self::ConditionChanged(_) => "condition_changed",
            Self::LocationFilterChanged(_) => "location_filter_changed",
            Self::EngineBucketChanged(_) => "engine_bucket_changed",
            Self::FiltersCleared => "filters_cleared",
            Self::WizardOpened => "wizard_opened",
            Self::WizardEditRequested(_) => "wizard_edit_requested",
            Self::WizardCancelled => "wizard_cancelled",
            Self::WizardTypeSelected(_) => "wizard_type_selected",
            Self::WizardMakeSelected(_) => "wizard_make_selected",
            Self::WizardModelSelected(_) => "wizard_model_selected",
            Self::WizardBasicEdited(_) => "wizard_basic_edited",
            Self::WizardSpecsEdited(_) => "wizard_specs_edited",
            Self::WizardPriceChanged(_) => "wizard_price_changed",
            Self::WizardLocationChanged(_) => "wizard_location_changed",
            Self::WizardVideoUrlChanged(_) => "wizard_video_url_changed",
            Self::WizardNextStep => "wizard_next_step",
            Self::WizardPrevStep => "wizard_prev_step",
            Self::WizardImagesSelected(_) => "wizard_images_selected",
            Self::WizardImageUploadResponse(_) => "wizard_image_upload_response",
            Self::WizardImageRemoved(_) => "wizard_image_removed",
            Self::WizardDocumentSelected { .. } => "wizard_document_selected",
            Self::WizardDocumentUploadResponse { .. } => "wizard_document_upload_response",
            Self::WizardDocumentCleared(_) => "wizard_document_cleared",
            Self::WizardSubmitRequested => "wizard_submit_requested",
            Self::WizardSubmitResponse(_) => "wizard_submit_response",
            Self::ConversationsRequested => "conversations_requested",
            Self::ConversationsResponse(_) => "conversations_response",
            Self::ConversationOpened(_) => "conversation_opened",
            Self::ConversationResponse(_) => "conversation_response",
            Self::ChatSearchChanged(_) => "chat_search_changed",
            Self::MessageComposed { .. } => "message_composed",
            Self::MessageSendResponse { .. } => "message_send_response",
            Self::RealtimeMessageReceived { .. } => "realtime_message_received",
            Self::DismissError => "dismiss_error",
            Self::DismissToast => "dismiss_toast",
            Self::NavigationHandled => "navigation_handled",
        }
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::Noop
    }
}
