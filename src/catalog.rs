//! Client-side catalog filtering.
//!
//! One fetch per screen; every filter change recomputes the visible set
//! from the full in-memory collection. Filtering is a pure conjunction of
//! per-vehicle predicates and never mutates the fetched collection, so it
//! is idempotent and order-independent by construction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::Vehicle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConditionFilter {
    #[default]
    All,
    New,
    Used,
}

impl ConditionFilter {
    fn matches(self, vehicle: &Vehicle) -> bool {
        match self {
            Self::All => true,
            Self::New => vehicle.is_new(),
            Self::Used => !vehicle.is_new(),
        }
    }
}

/// Engine-capacity bands offered by the filter sidebar. Values are cc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineCapacityBucket {
    Under50,
    From50To100,
    From100To175,
    Over175,
}

impl EngineCapacityBucket {
    pub const ALL: [Self; 4] = [
        Self::Under50,
        Self::From50To100,
        Self::From100To175,
        Self::Over175,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Under50 => "Dưới 50 cc",
            Self::From50To100 => "50 - 100 cc",
            Self::From100To175 => "100 - 175 cc",
            Self::Over175 => "Trên 175 cc",
        }
    }

    #[must_use]
    pub const fn contains(self, cc: u32) -> bool {
        match self {
            Self::Under50 => cc < 50,
            Self::From50To100 => cc >= 50 && cc < 100,
            Self::From100To175 => cc >= 100 && cc <= 175,
            Self::Over175 => cc > 175,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CatalogFilter {
    pub price_min: Option<u64>,
    pub price_max: Option<u64>,
    pub year_min: Option<u16>,
    pub year_max: Option<u16>,
    pub brands: BTreeSet<String>,
    pub condition: ConditionFilter,
    pub location: Option<String>,
    pub engine_bucket: Option<EngineCapacityBucket>,
}

impl CatalogFilter {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn toggle_brand(&mut self, brand: impl Into<String>) {
        let brand = brand.into();
        if !self.brands.remove(&brand) {
            self.brands.insert(brand);
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether one vehicle passes every active filter.
    ///
    /// A missing or zero price/year is excluded from the numeric comparison
    /// rather than compared as zero, so incomplete listings are not hidden
    /// by a range filter. The capacity bucket is the exception: picking a cc
    /// band only ever shows vehicles whose capacity is known to be in it.
    #[must_use]
    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        if vehicle.price > 0 {
            if let Some(min) = self.price_min {
                if vehicle.price < min {
                    return false;
                }
            }
            if let Some(max) = self.price_max {
                if vehicle.price > max {
                    return false;
                }
            }
        }

        if vehicle.year > 0 {
            if let Some(min) = self.year_min {
                if vehicle.year < min {
                    return false;
                }
            }
            if let Some(max) = self.year_max {
                if vehicle.year > max {
                    return false;
                }
            }
        }

        if !self.brands.is_empty() && !self.brands.contains(&vehicle.make) {
            return false;
        }

        if !self.condition.matches(vehicle) {
            return false;
        }

        if let Some(location) = &self.location {
            if !vehicle.location.contains(location.as_str()) {
                return false;
            }
        }

        if let Some(bucket) = self.engine_bucket {
            match vehicle.engine_capacity_cc() {
                Some(cc) => {
                    if !bucket.contains(cc) {
                        return false;
                    }
                }
                None => return false,
            }
        }

        true
    }

    /// Recompute the visible set from the full fetched collection.
    #[must_use]
    pub fn apply(&self, vehicles: &[Vehicle]) -> Vec<Vehicle> {
        vehicles
            .iter()
            .filter(|v| self.matches(v))
            .cloned()
            .collect()
    }
}

/// Distinct makes present in a collection, for the brand checkboxes.
#[must_use]
pub fn available_brands(vehicles: &[Vehicle]) -> Vec<String> {
    let mut brands: BTreeSet<&str> = BTreeSet::new();
    for vehicle in vehicles {
        if !vehicle.make.is_empty() {
            brands.insert(vehicle.make.as_str());
        }
    }
    brands.into_iter().map(String::from).collect()
}

/// Min/max over the priced vehicles, for the slider bounds.
#[must_use]
pub fn price_bounds(vehicles: &[Vehicle]) -> Option<(u64, u64)> {
    let mut bounds: Option<(u64, u64)> = None;
    for vehicle in vehicles {
        if vehicle.price == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (vehicle.price, vehicle.price),
            Some((min, max)) => (min.min(vehicle.price), max.max(vehicle.price)),
        });
    }
    bounds
}

#[must_use]
pub fn year_bounds(vehicles: &[Vehicle]) -> Option<(u16, u16)> {
    let mut bounds: Option<(u16, u16)> = None;
    for vehicle in vehicles {
        if vehicle.year == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (vehicle.year, vehicle.year),
            Some((min, max)) => (min.min(vehicle.year), max.max(vehicle.year)),
        });
    }
    bounds
}
