//! Vehicle: immutable once created, a tagged variant of {Sedan, SUV, Truck}.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ids::{new_id, EntityId, Version};

/// The vehicle body style. Construction dispatches on this tag rather than
/// on an inheritance hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleKind {
    Sedan,
    Suv,
    Truck,
}

/// Variant-specific attributes. Unlike the shared fields, these never fail
/// to construct: a request that omits or mismatches them falls back to the
/// defaults below rather than rejecting the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VehicleDetails {
    Sedan { doors: u8, sunroof: bool },
    Suv { seating: u8, four_wheel_drive: bool, cargo_capacity: Decimal },
    Truck { load_capacity: Decimal, bed_length: Decimal, four_wheel_drive: bool },
}

/// Raw variant-specific attributes as received at the command boundary.
/// Any field that doesn't apply to the resolved `kind`, or is missing, is
/// silently dropped in favor of [`VehicleDetails::default_for`] — attribute
/// coercion failures fall back to defaults, they never reject the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtraAttributes {
    pub doors: Option<u8>,
    pub sunroof: Option<bool>,
    pub seating: Option<u8>,
    pub four_wheel_drive: Option<bool>,
    pub cargo_capacity: Option<Decimal>,
    pub load_capacity: Option<Decimal>,
    pub bed_length: Option<Decimal>,
}

fn coerce_details(kind: VehicleKind, extra: &ExtraAttributes) -> VehicleDetails {
    match kind {
        VehicleKind::Sedan => VehicleDetails::Sedan {
            doors: extra.doors.unwrap_or(4),
            sunroof: extra.sunroof.unwrap_or(false),
        },
        VehicleKind::Suv => VehicleDetails::Suv {
            seating: extra.seating.unwrap_or(5),
            four_wheel_drive: extra.four_wheel_drive.unwrap_or(false),
            cargo_capacity: extra.cargo_capacity.unwrap_or(Decimal::ZERO),
        },
        VehicleKind::Truck => VehicleDetails::Truck {
            load_capacity: extra.load_capacity.unwrap_or(Decimal::ZERO),
            bed_length: extra.bed_length.unwrap_or(Decimal::ZERO),
            four_wheel_drive: extra.four_wheel_drive.unwrap_or(false),
        },
    }
}

/// Request DTO for `CreateVehicle`. Field bounds are enumerated in the
/// external interface contract; this crate enforces them itself since the
/// outer request-validation layer is out of scope here.
#[derive(Debug, Clone)]
pub struct CreateVehicleRequest {
    pub kind: VehicleKind,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub vin: String,
    pub mileage: Decimal,
    pub color: String,
    pub extra: ExtraAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: EntityId,
    pub created_at: DateTime<Utc>,
    /// Always `None`: a vehicle never mutates after construction.
    pub updated_at: Option<DateTime<Utc>>,
    /// Always `1`: a vehicle never mutates after construction.
    pub version: Version,
    pub kind: VehicleKind,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub vin: String,
    pub mileage: Decimal,
    pub color: String,
    pub details: VehicleDetails,
}

const MAKE_MODEL_LEN: std::ops::RangeInclusive<usize> = 1..=100;
const COLOR_LEN: std::ops::RangeInclusive<usize> = 1..=50;
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=2100;

impl Vehicle {
    pub fn new(req: CreateVehicleRequest) -> Result<Self> {
        if !MAKE_MODEL_LEN.contains(&req.make.len()) {
            return Err(Error::InvalidInput(format!(
                "make must be 1-100 chars, got {}",
                req.make.len()
            )));
        }
        if !MAKE_MODEL_LEN.contains(&req.model.len()) {
            return Err(Error::InvalidInput(format!(
                "model must be 1-100 chars, got {}",
                req.model.len()
            )));
        }
        if !YEAR_RANGE.contains(&req.year) {
            return Err(Error::InvalidInput(format!(
                "year must be in 1900-2100, got {}",
                req.year
            )));
        }
        if req.vin.chars().count() != 17 {
            return Err(Error::InvalidInput(format!(
                "vin must be exactly 17 chars, got {}",
                req.vin.chars().count()
            )));
        }
        if req.mileage < Decimal::ZERO || req.mileage > Decimal::from(10_000_000u32) {
            return Err(Error::InvalidInput(format!(
                "mileage must be in 0-10,000,000, got {}",
                req.mileage
            )));
        }
        if !COLOR_LEN.contains(&req.color.len()) {
            return Err(Error::InvalidInput(format!(
                "color must be 1-50 chars, got {}",
                req.color.len()
            )));
        }

        let details = coerce_details(req.kind, &req.extra);

        Ok(Vehicle {
            id: new_id(),
            created_at: Utc::now(),
            updated_at: None,
            version: 1,
            kind: req.kind,
            make: req.make,
            model: req.model,
            year: req.year,
            vin: req.vin,
            mileage: req.mileage,
            color: req.color,
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn base_request(kind: VehicleKind, extra: ExtraAttributes) -> CreateVehicleRequest {
        CreateVehicleRequest {
            kind,
            make: "Honda".into(),
            model: "Civic".into(),
            year: 2020,
            vin: "2HGFC2F59KH500001".into(),
            mileage: Decimal::new(10_000, 0),
            color: "White".into(),
            extra,
        }
    }

    #[test]
    fn coerces_sedan_defaults_when_extras_absent() {
        let vehicle = Vehicle::new(base_request(VehicleKind::Sedan, ExtraAttributes::default())).unwrap();
        assert_eq!(
            vehicle.details,
            VehicleDetails::Sedan { doors: 4, sunroof: false }
        );
    }

    #[test]
    fn coerces_suv_and_truck_attributes_when_present() {
        let suv = Vehicle::new(base_request(
            VehicleKind::Suv,
            ExtraAttributes {
                seating: Some(7),
                four_wheel_drive: Some(true),
                cargo_capacity: Some(Decimal::new(200, 0)),
                ..Default::default()
            },
        ))
        .unwrap();
        assert_eq!(
            suv.details,
            VehicleDetails::Suv {
                seating: 7,
                four_wheel_drive: true,
                cargo_capacity: Decimal::new(200, 0),
            }
        );

        let truck = Vehicle::new(base_request(
            VehicleKind::Truck,
            ExtraAttributes {
                load_capacity: Some(Decimal::new(1_500, 0)),
                bed_length: Some(Decimal::new(72, 0)),
                four_wheel_drive: Some(true),
                ..Default::default()
            },
        ))
        .unwrap();
        assert_eq!(
            truck.details,
            VehicleDetails::Truck {
                load_capacity: Decimal::new(1_500, 0),
                bed_length: Decimal::new(72, 0),
                four_wheel_drive: true,
            }
        );
    }

    #[test]
    fn mismatched_extras_fall_back_to_defaults_instead_of_rejecting() {
        // A Sedan request carrying SUV-only attributes: the SUV fields are
        // simply irrelevant, construction still succeeds with Sedan defaults.
        let vehicle = Vehicle::new(base_request(
            VehicleKind::Sedan,
            ExtraAttributes { seating: Some(7), ..Default::default() },
        ))
        .unwrap();
        assert_eq!(
            vehicle.details,
            VehicleDetails::Sedan { doors: 4, sunroof: false }
        );
    }

    #[test]
    fn rejects_out_of_bounds_make_model_year_vin_mileage_color() {
        assert!(Vehicle::new(CreateVehicleRequest {
            make: String::new(),
            ..base_request(VehicleKind::Sedan, ExtraAttributes::default())
        })
        .is_err());
        assert!(Vehicle::new(CreateVehicleRequest {
            model: "x".repeat(101),
            ..base_request(VehicleKind::Sedan, ExtraAttributes::default())
        })
        .is_err());
        assert!(Vehicle::new(CreateVehicleRequest {
            year: 1899,
            ..base_request(VehicleKind::Sedan, ExtraAttributes::default())
        })
        .is_err());
        assert!(Vehicle::new(CreateVehicleRequest {
            vin: "SHORTVIN".into(),
            ..base_request(VehicleKind::Sedan, ExtraAttributes::default())
        })
        .is_err());
        assert!(Vehicle::new(CreateVehicleRequest {
            mileage: Decimal::new(-1, 0),
            ..base_request(VehicleKind::Sedan, ExtraAttributes::default())
        })
        .is_err());
        assert!(Vehicle::new(CreateVehicleRequest {
            color: String::new(),
            ..base_request(VehicleKind::Sedan, ExtraAttributes::default())
        })
        .is_err());
    }

    #[test]
    fn is_immutable_once_created() {
        let vehicle = Vehicle::new(base_request(VehicleKind::Sedan, ExtraAttributes::default())).unwrap();
        assert_eq!(vehicle.version, 1);
        assert!(vehicle.updated_at.is_none());
    }
}
