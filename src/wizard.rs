//! Five-step listing wizard.
//!
//! Step order is fixed; advancing out of a step validates only that step's
//! required fields and never discards entered data. The field set of step 3
//! is a tagged union keyed by vehicle type, so validation is one dispatch on
//! the tag instead of scattered type-string comparisons. Only the final
//! submit performs a network write.

use serde::{Deserialize, Serialize};

use crate::api::CreateVehicleRequest;
use crate::model::VehicleType;
use crate::{MAX_LISTING_IMAGES, MIN_LISTING_YEAR};

pub const DEFAULT_CURRENCY: &str = "VND";

pub const CAR_BODY_TYPES: &[&str] = &[
    "Sedan",
    "SUV",
    "Hatchback",
    "MPV",
    "Pickup",
    "Coupe",
    "Convertible",
    "Wagon",
    "Van",
    "Other",
];

pub const MOTORCYCLE_CATEGORIES: &[&str] = &[
    "Xe số",
    "Xe tay ga",
    "Xe côn tay",
    "Xe thể thao",
    "Xe phân khối lớn",
    "Other",
];

pub const BICYCLE_CATEGORIES: &[&str] = &[
    "Đường phố",
    "Đua",
    "Địa hình",
    "Gấp",
    "Trẻ em",
    "Fixgear",
    "Điện",
    "Other",
];

pub const FUEL_TYPES: &[&str] = &["Xăng", "Dầu", "Hybrid", "Điện", "LPG", "Other"];

pub const TRANSMISSIONS: &[&str] = &["Số sàn", "Số tự động", "CVT", "Bán tự động", "DCT", "Other"];

pub const FRAME_SIZES: &[&str] = &[
    "XS", "S", "M", "L", "XL", "XXL", "24", "26", "27.5", "29", "700c", "Other",
];

pub const LOCATIONS: &[&str] = &[
    "Tp Hồ Chí Minh",
    "Hà Nội",
    "Đà Nẵng",
    "Cần Thơ",
    "Hải Phòng",
    "Bình Dương",
    "Đồng Nai",
    "Bà Rịa - Vũng Tàu",
    "Quảng Ninh",
    "Huế",
];

// Defaults filled in silently for fields a vehicle type does not ask for.
const MOTORCYCLE_DEFAULT_CATEGORY: &str = "Xe số";
const MOTORCYCLE_DEFAULT_FUEL: &str = "Xăng";
const MOTORCYCLE_DEFAULT_TRANSMISSION: &str = "Số sàn";
const BICYCLE_DEFAULT_FUEL: &str = "Other";
const BICYCLE_DEFAULT_TRANSMISSION: &str = "Other";
const TRUCK_DEFAULT_BODY: &str = "Van";
const TRUCK_DEFAULT_TRANSMISSION: &str = "Số sàn";

const CAR_BRANDS: &[&str] = &[
    "Toyota",
    "Honda",
    "Ford",
    "Hyundai",
    "Kia",
    "Mercedes-Benz",
    "BMW",
    "Audi",
    "Mazda",
    "Nissan",
    "Mitsubishi",
    "VinFast",
    "Other",
];

const MOTORCYCLE_BRANDS: &[&str] = &[
    "Honda",
    "Yamaha",
    "Suzuki",
    "SYM",
    "Piaggio",
    "Kawasaki",
    "Ducati",
    "BMW",
    "Harley-Davidson",
    "Triumph",
    "Benelli",
    "KTM",
    "VinFast",
    "Other",
];

const TRUCK_BRANDS: &[&str] = &[
    "Isuzu", "Hino", "Hyundai", "Kia", "Thaco", "Mitsubishi", "Ford", "Dongfeng", "JAC", "Veam",
    "Other",
];

const BICYCLE_BRANDS: &[&str] = &[
    "Giant",
    "Trek",
    "Specialized",
    "Cannondale",
    "Merida",
    "Scott",
    "Jett",
    "Trinx",
    "Galaxy",
    "Asama",
    "Maruishi",
    "Fornix",
    "Other",
];

#[must_use]
pub fn brands_for_type(vehicle_type: VehicleType) -> Vec<&'static str> {
    match vehicle_type {
        VehicleType::Car => CAR_BRANDS.to_vec(),
        VehicleType::Motorcycle => MOTORCYCLE_BRANDS.to_vec(),
        VehicleType::Bicycle => BICYCLE_BRANDS.to_vec(),
        VehicleType::Truck => TRUCK_BRANDS.to_vec(),
        VehicleType::Other => {
            let mut merged: Vec<&'static str> = Vec::new();
            for brand in CAR_BRANDS
                .iter()
                .chain(MOTORCYCLE_BRANDS)
                .chain(BICYCLE_BRANDS)
            {
                if !merged.contains(brand) {
                    merged.push(brand);
                }
            }
            merged
        }
    }
}

/// Models registered for a `(make, vehicle type)` pair. Honda and VinFast
/// sell in more than one segment, so the type disambiguates.
#[must_use]
pub fn models_for(make: &str, vehicle_type: VehicleType) -> &'static [&'static str] {
    match (make, vehicle_type) {
        ("Honda", VehicleType::Car) => &["Civic", "Accord", "CR-V", "City", "HR-V", "Brio"],
        ("Honda", _) => &[
            "Wave", "Vision", "Lead", "SH", "Winner", "Air Blade", "Future", "Rebel", "CB", "CBR",
        ],
        ("VinFast", VehicleType::Car) => {
            &["Lux A2.0", "Lux SA2.0", "Fadil", "VF e34", "VF 8", "VF 9"]
        }
        ("VinFast", _) => &["Klara", "Feliz", "Theon", "Vento", "Impes", "Ludo"],

        ("Toyota", _) => &[
            "Camry", "Corolla", "RAV4", "Vios", "Fortuner", "Innova", "Land Cruiser",
        ],
        ("Ford", _) => &["Ranger", "Everest", "EcoSport", "Transit", "Explorer"],
        ("Hyundai", _) => &["Accent", "Elantra", "Tucson", "Santa Fe", "i10", "Kona"],
        ("Kia", _) => &["Cerato", "Seltos", "Sorento", "Morning", "Soluto"],
        ("Mercedes-Benz", _) => &["C-Class", "E-Class", "S-Class", "GLC", "GLE", "GLB"],
        ("BMW", _) => &["3 Series", "5 Series", "7 Series", "X3", "X5", "X7"],
        ("Audi", _) => &["A4", "A6", "Q5", "Q7", "A3", "Q3"],
        ("Mazda", _) => &["Mazda3", "Mazda6", "CX-5", "CX-8", "BT-50"],
        ("Nissan", _) => &["Navara", "Terra", "X-Trail", "Sunny", "Almera"],
        ("Mitsubishi", _) => &["Xpander", "Outlander", "Pajero Sport", "Attrage", "Triton"],

        ("Yamaha", _) => &[
            "Exciter", "Sirius", "Jupiter", "NVX", "Janus", "Grande", "MT", "R15", "R3", "TFX",
        ],
        ("Suzuki", _) => &[
            "Raider", "Impulse", "Satria", "GD", "Address", "GSX", "Intruder", "Hayabusa",
        ],
        ("SYM", _) => &["Attila", "Elite", "Galaxy", "Star", "Fancy", "Abela", "Angela"],
        ("Piaggio", _) => &["Vespa", "Liberty", "Medley", "Zip", "Beverly", "Fly", "MP3"],
        ("Kawasaki", _) => &["Ninja", "Z", "Versys", "Vulcan", "W", "KLX", "KX"],
        ("Ducati", _) => &[
            "Panigale",
            "Monster",
            "Multistrada",
            "Scrambler",
            "Diavel",
            "XDiavel",
            "Streetfighter",
        ],
        ("Harley-Davidson", _) => &["Sportster", "Softail", "Touring", "Street", "Dyna", "CVO"],
        ("Triumph", _) => &[
            "Street Triple",
            "Speed Triple",
            "Bonneville",
            "Thruxton",
            "Tiger",
            "Rocket",
        ],
        ("Benelli", _) => &["TNT", "TRK", "Leoncino", "302", "502", "752"],
        ("KTM", _) => &["Duke", "RC", "Adventure", "EXC", "SX", "SMC"],

        ("Giant", _) => &["ATX", "Escape", "Talon", "TCR", "Propel", "Defy", "Revolt"],
        ("Trek", _) => &[
            "FX", "Domane", "Marlin", "Émonda", "Checkpoint", "Madone", "Powerfly",
        ],
        ("Specialized", _) => &[
            "Rockhopper",
            "Allez",
            "Diverge",
            "Roubaix",
            "Stumpjumper",
            "Tarmac",
            "Turbo",
        ],
        ("Cannondale", _) => &[
            "CAAD", "SuperSix", "Trail", "Topstone", "Synapse", "Scalpel", "Quick",
        ],
        ("Merida", _) => &[
            "Big Nine",
            "Scultura",
            "Big Trail",
            "Silex",
            "eSpeeder",
            "Reacto",
            "Crossway",
        ],
        ("Scott", _) => &[
            "Scale", "Addict", "Aspect", "Speedster", "Contessa", "Spark", "Genius",
        ],
        ("Jett", _) => &["Cycle", "Strada", "Viper", "Nitro", "Rangers", "Mach", "Duke"],
        ("Trinx", _) => &["M100", "M136", "M500", "M600", "Free", "Junior", "X1"],
        ("Galaxy", _) => &["LP300", "LP500", "RL200", "MT16", "CT30", "H2", "TH19"],
        ("Asama", _) => &["AMT", "TRK", "MTB", "CL", "SW", "VC", "FCB"],
        ("Maruishi", _) => &["WH", "AL", "HB", "MT", "V7", "P17", "CR15"],
        ("Fornix", _) => &["BH802", "FB20", "M20", "S20", "X26", "D100", "MS50"],

        ("Isuzu", _) => &["D-Max", "MU-X", "QKR", "VM", "NPR", "NQR", "FTR"],
        ("Hino", _) => &["XZU", "300 Series", "500 Series", "700 Series"],
        ("Thaco", _) => &["Towner", "Frontier", "Ollin", "Forland", "Auman"],
        ("JAC", _) => &["X5", "N200", "N350", "N800", "N900"],
        ("Veam", _) => &["VT", "HD", "VPT", "Bull", "Motor"],
        ("Dongfeng", _) => &["Hoàng Huy", "Trường Giang", "K"],

        _ => &[],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum WizardStep {
    #[default]
    VehicleType,
    BasicInfo,
    Specs,
    PriceLocation,
    Media,
}

impl WizardStep {
    pub const TOTAL: u8 = 5;

    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::VehicleType => 1,
            Self::BasicInfo => 2,
            Self::Specs => 3,
            Self::PriceLocation => 4,
            Self::Media => 5,
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::VehicleType => "Vehicle type",
            Self::BasicInfo => "Basic info",
            Self::Specs => "Technical specs",
            Self::PriceLocation => "Price & location",
            Self::Media => "Images & documents",
        }
    }

    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::VehicleType => Some(Self::BasicInfo),
            Self::BasicInfo => Some(Self::Specs),
            Self::Specs => Some(Self::PriceLocation),
            Self::PriceLocation => Some(Self::Media),
            Self::Media => None,
        }
    }

    #[must_use]
    pub const fn prev(self) -> Option<Self> {
        match self {
            Self::VehicleType => None,
            Self::BasicInfo => Some(Self::VehicleType),
            Self::Specs => Some(Self::BasicInfo),
            Self::PriceLocation => Some(Self::Specs),
            Self::Media => Some(Self::PriceLocation),
        }
    }

    #[must_use]
    pub const fn is_last(self) -> bool {
        matches!(self, Self::Media)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn required(field: &'static str, label: &str) -> Self {
        Self {
            field,
            message: format!("{label} is required"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BasicInfo {
    pub title: String,
    pub description: String,
    pub make: String,
    pub model: String,
    pub year: Option<u16>,
}

/// Step-3 field set, keyed by vehicle type. Each variant carries only the
/// fields that are meaningful for its type; switching type replaces the
/// whole variant, which is what nulls out irrelevant fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypeSpecs {
    Car {
        mileage: Option<u32>,
        body_type: Option<String>,
        fuel_type: Option<String>,
        transmission: Option<String>,
        license_plate: Option<String>,
        vin: Option<String>,
    },
    Motorcycle {
        mileage: Option<u32>,
        engine_capacity: Option<String>,
        category: Option<String>,
        license_plate: Option<String>,
    },
    Bicycle {
        category: Option<String>,
        frame_size: Option<String>,
    },
    Truck {
        mileage: Option<u32>,
        fuel_type: Option<String>,
        payload: Option<f64>,
        license_plate: Option<String>,
    },
    Other {
        mileage: Option<u32>,
        body_type: Option<String>,
    },
}

impl TypeSpecs {
    #[must_use]
    pub const fn for_type(vehicle_type: VehicleType) -> Self {
        match vehicle_type {
            VehicleType::Car => Self::Car {
                mileage: None,
                body_type: None,
                fuel_type: None,
                transmission: None,
                license_plate: None,
                vin: None,
            },
            VehicleType::Motorcycle => Self::Motorcycle {
                mileage: None,
                engine_capacity: None,
                category: None,
                license_plate: None,
            },
            VehicleType::Bicycle => Self::Bicycle {
                category: None,
                frame_size: None,
            },
            VehicleType::Truck => Self::Truck {
                mileage: None,
                fuel_type: None,
                payload: None,
                license_plate: None,
            },
            VehicleType::Other => Self::Other {
                mileage: None,
                body_type: None,
            },
        }
    }

    #[must_use]
    pub const fn vehicle_type(&self) -> VehicleType {
        match self {
            Self::Car { .. } => VehicleType::Car,
            Self::Motorcycle { .. } => VehicleType::Motorcycle,
            Self::Bicycle { .. } => VehicleType::Bicycle,
            Self::Truck { .. } => VehicleType::Truck,
            Self::Other { .. } => VehicleType::Other,
        }
    }

    /// One validation dispatch on the tag.
    #[must_use]
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        match self {
            Self::Car {
                mileage,
                body_type,
                fuel_type,
                transmission,
                ..
            } => {
                if !matches!(mileage, Some(m) if *m > 0) {
                    errors.push(FieldError::required("mileage", "Mileage"));
                }
                if body_type.as_deref().map_or(true, str::is_empty) {
                    errors.push(FieldError::required("body_type", "Body type"));
                }
                if fuel_type.as_deref().map_or(true, str::is_empty) {
                    errors.push(FieldError::required("fuel_type", "Fuel type"));
                }
                if transmission.as_deref().map_or(true, str::is_empty) {
                    errors.push(FieldError::required("transmission", "Transmission"));
                }
            }
            Self::Motorcycle {
                mileage,
                engine_capacity,
                ..
            } => {
                if !matches!(mileage, Some(m) if *m > 0) {
                    errors.push(FieldError::required("mileage", "Mileage"));
                }
                if engine_capacity.as_deref().map_or(true, str::is_empty) {
                    errors.push(FieldError::required("engine_capacity", "Engine capacity"));
                }
            }
            Self::Bicycle { category, .. } => {
                if category.as_deref().map_or(true, str::is_empty) {
                    errors.push(FieldError::required("body_type", "Bicycle category"));
                }
            }
            Self::Truck {
                mileage,
                fuel_type,
                payload,
                ..
            } => {
                if !matches!(mileage, Some(m) if *m > 0) {
                    errors.push(FieldError::required("mileage", "Mileage"));
                }
                if fuel_type.as_deref().map_or(true, str::is_empty) {
                    errors.push(FieldError::required("fuel_type", "Fuel type"));
                }
                if !matches!(payload, Some(p) if *p > 0.0) {
                    errors.push(FieldError::required("payload", "Payload"));
                }
            }
            Self::Other { .. } => {}
        }
        errors
    }
}

/// Partial edit of the current step-3 variant. Fields that do not apply to
/// the active vehicle type are ignored.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecsPatch {
    pub mileage: Option<u32>,
    pub body_type: Option<String>,
    pub engine_capacity: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub payload: Option<f64>,
    pub frame_size: Option<String>,
    pub license_plate: Option<String>,
    pub vin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BasicInfoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub year: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Registration,
    Inspection,
}

impl DocumentKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Registration => "registration",
            Self::Inspection => "inspection",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingWizard {
    pub step: WizardStep,
    pub vehicle_type: Option<VehicleType>,
    pub basic: BasicInfo,
    pub specs: Option<TypeSpecs>,
    pub price: Option<u64>,
    pub currency: String,
    pub location: Option<String>,
    /// Uploaded image URLs in selection order.
    pub images: Vec<String>,
    pub registration_papers: Option<String>,
    pub inspection_papers: Option<String>,
    pub video_url: Option<String>,
    pub available_models: Vec<&'static str>,
    pub uploads_in_flight: u8,
    pub submitting: bool,
    /// Errors from the last blocked advance, keyed to the step they belong
    /// to; cleared on the next successful transition.
    pub step_errors: Vec<FieldError>,
    /// Set when editing an existing listing rather than creating one.
    pub editing: Option<crate::VehicleId>,
}

impl Default for ListingWizard {
    fn default() -> Self {
        Self {
            step: WizardStep::VehicleType,
            vehicle_type: None,
            basic: BasicInfo::default(),
            specs: None,
            price: None,
            currency: DEFAULT_CURRENCY.to_string(),
            location: None,
            images: Vec::new(),
            registration_papers: None,
            inspection_papers: None,
            video_url: None,
            available_models: Vec::new(),
            uploads_in_flight: 0,
            submitting: false,
            step_errors: Vec::new(),
            editing: None,
        }
    }
}

impl ListingWizard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefill the wizard from an existing listing for the edit flow.
    #[must_use]
    pub fn from_vehicle(vehicle: &crate::model::Vehicle) -> Self {
        let specs = match vehicle.vehicle_type {
            VehicleType::Car => TypeSpecs::Car {
                mileage: vehicle.mileage,
                body_type: vehicle.body_type.clone(),
                fuel_type: vehicle.fuel_type.clone(),
                transmission: vehicle.transmission.clone(),
                license_plate: None,
                vin: None,
            },
            VehicleType::Motorcycle => TypeSpecs::Motorcycle {
                mileage: vehicle.mileage,
                engine_capacity: vehicle.engine_capacity.clone(),
                category: vehicle.body_type.clone(),
                license_plate: None,
            },
            VehicleType::Bicycle => TypeSpecs::Bicycle {
                category: vehicle.body_type.clone(),
                frame_size: vehicle.engine_capacity.clone(),
            },
            VehicleType::Truck => TypeSpecs::Truck {
                mileage: vehicle.mileage,
                fuel_type: vehicle.fuel_type.clone(),
                payload: vehicle.payload,
                license_plate: None,
            },
            VehicleType::Other => TypeSpecs::Other {
                mileage: vehicle.mileage,
                body_type: vehicle.body_type.clone(),
            },
        };

        Self {
            vehicle_type: Some(vehicle.vehicle_type),
            basic: BasicInfo {
                title: vehicle.title.clone().unwrap_or_default(),
                description: vehicle.description.clone(),
                make: vehicle.make.clone(),
                model: vehicle.model.clone(),
                year: (vehicle.year > 0).then_some(vehicle.year),
            },
            specs: Some(specs),
            price: (vehicle.price > 0).then_some(vehicle.price),
            currency: vehicle.currency.clone(),
            location: (!vehicle.location.is_empty()).then(|| vehicle.location.clone()),
            images: vehicle.images.clone(),
            registration_papers: vehicle.registration_papers.clone(),
            inspection_papers: vehicle.inspection_papers.clone(),
            video_url: vehicle.video_url.clone(),
            available_models: models_for(&vehicle.make, vehicle.vehicle_type).to_vec(),
            editing: Some(vehicle.id.clone()),
            ..Self::default()
        }
    }

    /// Switching type resets make and model and replaces the specs variant.
    pub fn select_type(&mut self, vehicle_type: VehicleType) {
        self.vehicle_type = Some(vehicle_type);
        self.basic.make.clear();
        self.basic.model.clear();
        self.available_models.clear();
        self.specs = Some(TypeSpecs::for_type(vehicle_type));
        self.step_errors.clear();
    }

    /// Selecting a make resets the model and repopulates the model list for
    /// `(make, vehicle type)`.
    pub fn select_make(&mut self, make: impl Into<String>) {
        let make = make.into();
        self.basic.model.clear();
        self.available_models = self
            .vehicle_type
            .map(|t| models_for(&make, t).to_vec())
            .unwrap_or_default();
        self.basic.make = make;
    }

    pub fn select_model(&mut self, model: impl Into<String>) {
        self.basic.model = model.into();
    }

    pub fn apply_basic_patch(&mut self, patch: BasicInfoPatch) {
        if let Some(title) = patch.title {
            self.basic.title = title;
        }
        if let Some(description) = patch.description {
            self.basic.description = description;
        }
        if let Some(year) = patch.year {
            self.basic.year = Some(year);
        }
    }

    pub fn apply_specs_patch(&mut self, patch: SpecsPatch) {
        let Some(specs) = self.specs.as_mut() else {
            return;
        };

        match specs {
            TypeSpecs::Car {
                mileage,
                body_type,
                fuel_type,
                transmission,
                license_plate,
                vin,
            } => {
                if patch.mileage.is_some() {
                    *mileage = patch.mileage;
                }
                if patch.body_type.is_some() {
                    *body_type = patch.body_type;
                }
                if patch.fuel_type.is_some() {
                    *fuel_type = patch.fuel_type;
                }
                if patch.transmission.is_some() {
                    *transmission = patch.transmission;
                }
                if patch.license_plate.is_some() {
                    *license_plate = patch.license_plate;
                }
                if patch.vin.is_some() {
                    *vin = patch.vin;
                }
            }
            TypeSpecs::Motorcycle {
                mileage,
                engine_capacity,
                category,
                license_plate,
            } => {
                if patch.mileage.is_some() {
                    *mileage = patch.mileage;
                }
                if patch.engine_capacity.is_some() {
                    *engine_capacity = patch.engine_capacity;
                }
                if patch.body_type.is_some() {
                    *category = patch.body_type;
                }
                if patch.license_plate.is_some() {
                    *license_plate = patch.license_plate;
                }
            }
            TypeSpecs::Bicycle {
                category,
                frame_size,
            } => {
                if patch.body_type.is_some() {
                    *category = patch.body_type;
                }
                if patch.frame_size.is_some() {
                    *frame_size = patch.frame_size;
                }
            }
            TypeSpecs::Truck {
                mileage,
                fuel_type,
                payload,
                license_plate,
            } => {
                if patch.mileage.is_some() {
                    *mileage = patch.mileage;
                }
                if patch.fuel_type.is_some() {
                    *fuel_type = patch.fuel_type;
                }
                if patch.payload.is_some() {
                    *payload = patch.payload;
                }
                if patch.license_plate.is_some() {
                    *license_plate = patch.license_plate;
                }
            }
            TypeSpecs::Other { mileage, body_type } => {
                if patch.mileage.is_some() {
                    *mileage = patch.mileage;
                }
                if patch.body_type.is_some() {
                    *body_type = patch.body_type;
                }
            }
        }
    }

    pub fn set_price(&mut self, price: u64) {
        self.price = Some(price);
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.location = Some(location.into());
    }

    pub fn add_images(&mut self, urls: impl IntoIterator<Item = String>) {
        self.images.extend(urls);
    }

    pub fn remove_image(&mut self, index: usize) {
        if index < self.images.len() {
            self.images.remove(index);
        }
    }

    pub fn set_document(&mut self, kind: DocumentKind, url: Option<String>) {
        match kind {
            DocumentKind::Registration => self.registration_papers = url,
            DocumentKind::Inspection => self.inspection_papers = url,
        }
    }

    #[must_use]
    pub fn validate_step(&self, step: WizardStep, max_year: u16) -> Vec<FieldError> {
        let mut errors = Vec::new();

        match step {
            WizardStep::VehicleType => {
                if self.vehicle_type.is_none() {
                    errors.push(FieldError::required("type", "Vehicle type"));
                }
            }
            WizardStep::BasicInfo => {
                if self.basic.title.trim().is_empty() {
                    errors.push(FieldError::required("title", "Listing title"));
                }
                if self.basic.description.trim().is_empty() {
                    errors.push(FieldError::required("description", "Description"));
                }
                if self.basic.make.is_empty() {
                    errors.push(FieldError::required("make", "Make"));
                }
                if self.basic.model.is_empty() {
                    errors.push(FieldError::required("model", "Model"));
                }
                match self.basic.year {
                    None => errors.push(FieldError::required("year", "Production year")),
                    Some(year) if year < MIN_LISTING_YEAR || year > max_year => {
                        errors.push(FieldError {
                            field: "year",
                            message: format!(
                                "Production year must be between {MIN_LISTING_YEAR} and {max_year}"
                            ),
                        });
                    }
                    Some(_) => {}
                }
            }
            WizardStep::Specs => match &self.specs {
                Some(specs) => errors.extend(specs.validate()),
                None => errors.push(FieldError::required("type", "Vehicle type")),
            },
            WizardStep::PriceLocation => {
                if !matches!(self.price, Some(p) if p > 0) {
                    errors.push(FieldError::required("price", "Price"));
                }
                if self.location.as_deref().map_or(true, str::is_empty) {
                    errors.push(FieldError::required("location", "Location"));
                }
            }
            WizardStep::Media => {
                if self.images.is_empty() {
                    errors.push(FieldError {
                        field: "images",
                        message: "At least one image is required".into(),
                    });
                }
            }
        }

        errors
    }

    /// Validate the current step and move forward. Returns false when
    /// validation blocks the transition; entered data is kept either way.
    pub fn advance(&mut self, max_year: u16) -> bool {
        let errors = self.validate_step(self.step, max_year);
        if !errors.is_empty() {
            self.step_errors = errors;
            return false;
        }

        self.step_errors.clear();
        if let Some(next) = self.step.next() {
            self.step = next;
        }
        true
    }

    pub fn back(&mut self) {
        if let Some(prev) = self.step.prev() {
            self.step = prev;
            self.step_errors.clear();
        }
    }

    /// Build the submission payload. Every step is re-validated, per-type
    /// defaults are filled in, and the image list is capped at
    /// `MAX_LISTING_IMAGES` entries.
    pub fn build_payload(&self, max_year: u16) -> Result<CreateVehicleRequest, Vec<FieldError>> {
        let mut errors = Vec::new();
        for step in [
            WizardStep::VehicleType,
            WizardStep::BasicInfo,
            WizardStep::Specs,
            WizardStep::PriceLocation,
            WizardStep::Media,
        ] {
            errors.extend(self.validate_step(step, max_year));
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        // Validation above guarantees these are present.
        let specs = self.specs.clone().ok_or_else(Vec::new)?;
        let vehicle_type = specs.vehicle_type();

        let (mileage, body_type, engine_capacity, fuel_type, transmission, payload, license_plate, vin) =
            match specs {
                TypeSpecs::Car {
                    mileage,
                    body_type,
                    fuel_type,
                    transmission,
                    license_plate,
                    vin,
                } => (mileage, body_type, None, fuel_type, transmission, None, license_plate, vin),
                TypeSpecs::Motorcycle {
                    mileage,
                    engine_capacity,
                    category,
                    license_plate,
                } => (
                    mileage,
                    Some(category.unwrap_or_else(|| MOTORCYCLE_DEFAULT_CATEGORY.into())),
                    engine_capacity,
                    Some(MOTORCYCLE_DEFAULT_FUEL.into()),
                    Some(MOTORCYCLE_DEFAULT_TRANSMISSION.into()),
                    None,
                    license_plate,
                    None,
                ),
                TypeSpecs::Bicycle {
                    category,
                    frame_size,
                } => (
                    Some(0),
                    category,
                    frame_size,
                    Some(BICYCLE_DEFAULT_FUEL.into()),
                    Some(BICYCLE_DEFAULT_TRANSMISSION.into()),
                    None,
                    None,
                    None,
                ),
                TypeSpecs::Truck {
                    mileage,
                    fuel_type,
                    payload,
                    license_plate,
                } => (
                    mileage,
                    Some(TRUCK_DEFAULT_BODY.into()),
                    None,
                    fuel_type,
                    Some(TRUCK_DEFAULT_TRANSMISSION.into()),
                    payload,
                    license_plate,
                    None,
                ),
                TypeSpecs::Other { mileage, body_type } => {
                    (mileage, body_type, None, None, None, None, None, None)
                }
            };

        let mut images = self.images.clone();
        images.truncate(MAX_LISTING_IMAGES);

        Ok(CreateVehicleRequest {
            vehicle_type,
            title: self.basic.title.clone(),
            description: self.basic.description.clone(),
            make: self.basic.make.clone(),
            model: self.basic.model.clone(),
            year: self.basic.year.unwrap_or_default(),
            mileage,
            body_type,
            engine_capacity,
            fuel_type,
            transmission,
            payload,
            license_plate,
            vin,
            price: self.price.unwrap_or_default(),
            currency: self.currency.clone(),
            location: self.location.clone().unwrap_or_default(),
            images,
            video_url: self.video_url.clone(),
            registration_papers: self.registration_papers.clone(),
            inspection_papers: self.inspection_papers.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX_YEAR: u16 = 2027;

    fn wizard_through_basic(vehicle_type: VehicleType, make: &str, model: &str) -> ListingWizard {
        let mut wizard = ListingWizard::new();
        wizard.select_type(vehicle_type);
        assert!(wizard.advance(MAX_YEAR));

        wizard.apply_basic_patch(BasicInfoPatch {
            title: Some("Test listing".into()),
            description: Some("Description".into()),
            year: Some(2022),
        });
        wizard.select_make(make);
        wizard.select_model(model);
        wizard
    }

    #[test]
    fn step_one_requires_a_type() {
        let mut wizard = ListingWizard::new();
        assert!(!wizard.advance(MAX_YEAR));
        assert_eq!(wizard.step, WizardStep::VehicleType);
        assert!(!wizard.step_errors.is_empty());

        wizard.select_type(VehicleType::Car);
        assert!(wizard.advance(MAX_YEAR));
        assert_eq!(wizard.step, WizardStep::BasicInfo);
    }

    #[test]
    fn blocked_advance_keeps_entered_data() {
        let mut wizard = wizard_through_basic(VehicleType::Car, "Toyota", "Camry");
        wizard.basic.model.clear();

        assert!(!wizard.advance(MAX_YEAR));
        assert_eq!(wizard.step, WizardStep::BasicInfo);
        assert_eq!(wizard.basic.title, "Test listing");
        assert_eq!(wizard.basic.make, "Toyota");
    }

    #[test]
    fn year_bounds_are_enforced() {
        let mut wizard = wizard_through_basic(VehicleType::Car, "Toyota", "Camry");
        wizard.basic.year = Some(1999);
        assert!(!wizard.advance(MAX_YEAR));

        wizard.basic.year = Some(MAX_YEAR + 1);
        assert!(!wizard.advance(MAX_YEAR));

        wizard.basic.year = Some(2022);
        assert!(wizard.advance(MAX_YEAR));
    }

    #[test]
    fn make_change_resets_model_and_repopulates_models() {
        let mut wizard = ListingWizard::new();
        wizard.select_type(VehicleType::Motorcycle);
        wizard.select_make("Honda");
        wizard.select_model("Wave");

        assert!(wizard.available_models.contains(&"Wave"));
        assert!(!wizard.available_models.contains(&"Civic"));

        wizard.select_make("Yamaha");
        assert!(wizard.basic.model.is_empty());
        assert!(wizard.available_models.contains(&"Exciter"));
    }

    #[test]
    fn honda_models_depend_on_vehicle_type() {
        assert!(models_for("Honda", VehicleType::Car).contains(&"Civic"));
        assert!(models_for("Honda", VehicleType::Motorcycle).contains(&"Wave"));
        assert!(!models_for("Honda", VehicleType::Motorcycle).contains(&"Civic"));
    }

    #[test]
    fn type_change_resets_make_and_model() {
        let mut wizard = ListingWizard::new();
        wizard.select_type(VehicleType::Car);
        wizard.select_make("Honda");
        wizard.select_model("Civic");

        wizard.select_type(VehicleType::Motorcycle);
        assert!(wizard.basic.make.is_empty());
        assert!(wizard.basic.model.is_empty());
        assert!(wizard.available_models.is_empty());
        assert!(matches!(wizard.specs, Some(TypeSpecs::Motorcycle { .. })));
    }

    #[test]
    fn car_specs_require_full_drivetrain_fields() {
        let mut wizard = wizard_through_basic(VehicleType::Car, "Toyota", "Camry");
        assert!(wizard.advance(MAX_YEAR));
        assert_eq!(wizard.step, WizardStep::Specs);

        wizard.apply_specs_patch(SpecsPatch {
            mileage: Some(50_000),
            body_type: Some("Sedan".into()),
            fuel_type: Some("Xăng".into()),
            ..SpecsPatch::default()
        });
        assert!(!wizard.advance(MAX_YEAR));
        assert!(wizard
            .step_errors
            .iter()
            .any(|e| e.field == "transmission"));

        wizard.apply_specs_patch(SpecsPatch {
            transmission: Some("Số tự động".into()),
            ..SpecsPatch::default()
        });
        assert!(wizard.advance(MAX_YEAR));
    }

    #[test]
    fn motorcycle_specs_require_mileage_and_capacity_only() {
        let mut wizard = wizard_through_basic(VehicleType::Motorcycle, "Honda", "Wave");
        assert!(wizard.advance(MAX_YEAR));

        assert!(!wizard.advance(MAX_YEAR));

        wizard.apply_specs_patch(SpecsPatch {
            mileage: Some(5000),
            engine_capacity: Some("125".into()),
            ..SpecsPatch::default()
        });
        assert!(wizard.advance(MAX_YEAR));
    }

    #[test]
    fn bicycle_specs_require_category_only() {
        let mut wizard = wizard_through_basic(VehicleType::Bicycle, "Giant", "Escape");
        assert!(wizard.advance(MAX_YEAR));

        assert!(!wizard.advance(MAX_YEAR));

        wizard.apply_specs_patch(SpecsPatch {
            body_type: Some("Đường phố".into()),
            ..SpecsPatch::default()
        });
        assert!(wizard.advance(MAX_YEAR));
    }

    #[test]
    fn truck_specs_require_payload() {
        let mut wizard = wizard_through_basic(VehicleType::Truck, "Isuzu", "QKR");
        assert!(wizard.advance(MAX_YEAR));

        wizard.apply_specs_patch(SpecsPatch {
            mileage: Some(80_000),
            fuel_type: Some("Dầu".into()),
            ..SpecsPatch::default()
        });
        assert!(!wizard.advance(MAX_YEAR));
        assert!(wizard.step_errors.iter().any(|e| e.field == "payload"));

        wizard.apply_specs_patch(SpecsPatch {
            payload: Some(1.5),
            ..SpecsPatch::default()
        });
        assert!(wizard.advance(MAX_YEAR));
    }

    #[test]
    fn media_step_requires_one_image() {
        let mut wizard = wizard_through_basic(VehicleType::Motorcycle, "Honda", "Wave");
        assert!(wizard.advance(MAX_YEAR));
        wizard.apply_specs_patch(SpecsPatch {
            mileage: Some(5000),
            engine_capacity: Some("125".into()),
            ..SpecsPatch::default()
        });
        assert!(wizard.advance(MAX_YEAR));
        wizard.set_price(20_000_000);
        wizard.set_location("Hà Nội");
        assert!(wizard.advance(MAX_YEAR));
        assert_eq!(wizard.step, WizardStep::Media);

        assert!(wizard.build_payload(MAX_YEAR).is_err());

        wizard.add_images(["https://cdn.example.com/1.jpg".to_string()]);
        assert!(wizard.build_payload(MAX_YEAR).is_ok());
    }

    #[test]
    fn motorcycle_payload_gets_silent_defaults() {
        let mut wizard = wizard_through_basic(VehicleType::Motorcycle, "Honda", "Wave");
        assert!(wizard.advance(MAX_YEAR));
        wizard.apply_specs_patch(SpecsPatch {
            mileage: Some(5000),
            engine_capacity: Some("125".into()),
            ..SpecsPatch::default()
        });
        assert!(wizard.advance(MAX_YEAR));
        wizard.set_price(20_000_000);
        wizard.set_location("Hà Nội");
        assert!(wizard.advance(MAX_YEAR));
        wizard.add_images(["https://cdn.example.com/1.jpg".to_string()]);

        let payload = wizard.build_payload(MAX_YEAR).unwrap();
        assert_eq!(payload.transmission.as_deref(), Some("Số sàn"));
        assert_eq!(payload.fuel_type.as_deref(), Some("Xăng"));
        assert_eq!(payload.body_type.as_deref(), Some("Xe số"));
        assert_eq!(payload.mileage, Some(5000));
    }

    #[test]
    fn bicycle_payload_forces_mileage_to_zero() {
        let mut wizard = wizard_through_basic(VehicleType::Bicycle, "Giant", "Escape");
        assert!(wizard.advance(MAX_YEAR));
        wizard.apply_specs_patch(SpecsPatch {
            body_type: Some("Đua".into()),
            ..SpecsPatch::default()
        });
        assert!(wizard.advance(MAX_YEAR));
        wizard.set_price(5_000_000);
        wizard.set_location("Đà Nẵng");
        assert!(wizard.advance(MAX_YEAR));
        wizard.add_images(["https://cdn.example.com/1.jpg".to_string()]);

        let payload = wizard.build_payload(MAX_YEAR).unwrap();
        assert_eq!(payload.mileage, Some(0));
        assert_eq!(payload.fuel_type.as_deref(), Some("Other"));
        assert_eq!(payload.transmission.as_deref(), Some("Other"));
    }

    #[test]
    fn payload_truncates_images_to_cap() {
        let mut wizard = wizard_through_basic(VehicleType::Motorcycle, "Honda", "Wave");
        assert!(wizard.advance(MAX_YEAR));
        wizard.apply_specs_patch(SpecsPatch {
            mileage: Some(5000),
            engine_capacity: Some("125".into()),
            ..SpecsPatch::default()
        });
        assert!(wizard.advance(MAX_YEAR));
        wizard.set_price(20_000_000);
        wizard.set_location("Hà Nội");
        assert!(wizard.advance(MAX_YEAR));

        wizard.add_images((1..=7).map(|i| format!("https://cdn.example.com/{i}.jpg")));

        let payload = wizard.build_payload(MAX_YEAR).unwrap();
        assert_eq!(payload.images.len(), MAX_LISTING_IMAGES);
        assert_eq!(payload.images[0], "https://cdn.example.com/1.jpg");
        assert_eq!(payload.images[4], "https://cdn.example.com/5.jpg");
    }

    #[test]
    fn editing_prefills_a_submittable_draft_from_a_listing() {
        let vehicle: crate::model::Vehicle = serde_json::from_value(serde_json::json!({
            "_id": "v1",
            "type": "motorcycle",
            "title": "Honda Wave 2022",
            "description": "Well maintained",
            "make": "Honda",
            "model": "Wave",
            "year": 2022,
            "price": 20_000_000_u64,
            "mileage": 5000,
            "engine_capacity": "125",
            "body_type": "Xe số",
            "location": "Hà Nội",
            "images": ["https://cdn.example.com/1.jpg"]
        }))
        .unwrap();

        let wizard = ListingWizard::from_vehicle(&vehicle);

        assert_eq!(wizard.editing, Some(crate::VehicleId::new("v1")));
        assert_eq!(wizard.step, WizardStep::VehicleType);
        assert!(matches!(wizard.specs, Some(TypeSpecs::Motorcycle { .. })));
        assert!(wizard.available_models.contains(&"Wave"));

        // The prefilled draft is already complete enough to resubmit.
        let payload = wizard.build_payload(MAX_YEAR).unwrap();
        assert_eq!(payload.make, "Honda");
        assert_eq!(payload.mileage, Some(5000));
        assert_eq!(payload.images.len(), 1);
    }

    #[test]
    fn other_type_merges_brand_lists_without_duplicates() {
        let brands = brands_for_type(VehicleType::Other);
        let honda_count = brands.iter().filter(|b| **b == "Honda").count();
        assert_eq!(honda_count, 1);
        assert!(brands.contains(&"Giant"));
    }
}
