//! Core material request record and reference types
use super::error::ValidationError;
use chrono::{DateTime, TimeZone, Utc};

/// Lifecycle status of a material request. The only legal path is
/// `PendingApproval -> PendingIma -> CompletedByIma`, with the email step
/// optional; no transition ever moves a record backward.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    #[n(0)]
    PendingApproval,
    #[n(1)]
    PendingIma,
    #[n(2)]
    CompletedByIma,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Status::PendingApproval => "pendingApproval",
            Status::PendingIma => "pendingIMA",
            Status::CompletedByIma => "completedByIMA",
        };
        f.write_str(name)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .unwrap()
            .into()
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

/// The central record. `material_id` and `request_id` are assigned by the
/// record store at creation; `material_number` stays empty until an approver
/// closes the request.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct MaterialRequest {
    #[n(0)]
    pub material_id: String,
    #[n(1)]
    pub request_id: String,
    #[n(2)]
    pub material_number: String,
    #[n(3)]
    pub material_name: String,
    #[n(4)]
    pub material_description: String,
    #[n(5)]
    pub vendor: String,
    #[n(6)]
    pub plant: String,
    #[n(7)]
    pub status: Status,
    #[n(8)]
    pub created_at: TimeStamp<Utc>,
    #[n(9)]
    pub created_by: String,
    #[n(10)]
    pub modified_at: TimeStamp<Utc>,
    #[n(11)]
    pub modified_by: String,
    #[n(12)]
    pub first_name: String,
    #[n(13)]
    pub last_name: String,
    #[n(14)]
    pub email: String,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Vendor {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub name: String,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Plant {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub name: String,
}

/// Resolve a vendor id to its display name, falling back to the raw id.
pub fn vendor_display_name(vendors: &[Vendor], id: &str) -> String {
    vendors
        .iter()
        .find(|v| v.id == id)
        .map(|v| v.name.clone())
        .unwrap_or_else(|| id.to_string())
}

/// Resolve a plant id to its display name, falling back to the raw id.
pub fn plant_display_name(plants: &[Plant], id: &str) -> String {
    plants
        .iter()
        .find(|p| p.id == id)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| id.to_string())
}

pub const MATERIAL_ID_PREFIX: &str = "MAT_REQ_";

/// Extract the numeric suffix of a `MAT_REQ_<digits>` id.
pub fn parse_request_suffix(material_id: &str) -> Option<u64> {
    material_id
        .strip_prefix(MATERIAL_ID_PREFIX)
        .and_then(|digits| digits.parse().ok())
}

pub fn format_material_id(suffix: u64) -> String {
    format!("{MATERIAL_ID_PREFIX}{suffix:06}")
}

/// Next id after the highest suffix present in `records`. This scan is how a
/// single writer picks the follow-up id; stores that may serve several
/// writers at once seed an atomic counter from it instead of re-running the
/// scan per creation.
pub fn next_material_id(records: &[MaterialRequest]) -> String {
    let max = records
        .iter()
        .filter_map(|r| parse_request_suffix(&r.material_id))
        .max()
        .unwrap_or(0);
    format_material_id(max + 1)
}

// Also used for constructing drafts in dialogs; build() is the validation
// gate before anything reaches the store.
#[derive(Debug, Default)]
pub struct RequestDraft {
    material_name: Option<String>,
    material_description: Option<String>,
    vendor: Option<String>,
    plant: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
}

/// A fully validated creation payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRequest {
    pub material_name: String,
    pub material_description: String,
    pub vendor: String,
    pub plant: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl RequestDraft {
    /// Construct a new builder object, this becomes the basis for a draft
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_material_name(mut self, name: &str) -> Self {
        self.material_name = Some(name.to_string());
        self
    }
    pub fn set_material_description(mut self, description: &str) -> Self {
        self.material_description = Some(description.to_string());
        self
    }
    pub fn set_vendor(mut self, vendor: &str) -> Self {
        self.vendor = Some(vendor.to_string());
        self
    }
    pub fn set_plant(mut self, plant: &str) -> Self {
        self.plant = Some(plant.to_string());
        self
    }
    pub fn set_first_name(mut self, first_name: &str) -> Self {
        self.first_name = Some(first_name.to_string());
        self
    }
    pub fn set_last_name(mut self, last_name: &str) -> Self {
        self.last_name = Some(last_name.to_string());
        self
    }
    pub fn set_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    // Checks fields and performs validation; every required field must be
    // present and non-blank.
    pub fn build(self) -> Result<NewRequest, ValidationError> {
        Ok(NewRequest {
            material_name: required(self.material_name, "material name")?,
            material_description: required(self.material_description, "material description")?,
            vendor: required(self.vendor, "vendor")?,
            plant: required(self.plant, "plant")?,
            first_name: required(self.first_name, "first name")?,
            last_name: required(self.last_name, "last name")?,
            email: required(self.email, "email")?,
        })
    }
}

fn required(field: Option<String>, name: &'static str) -> Result<String, ValidationError> {
    match field {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ValidationError::MissingField(name)),
    }
}

impl NewRequest {
    /// Turn the validated payload into a fresh record. Ids are left blank for
    /// the store to assign; the lifecycle always starts at `PendingApproval`
    /// with an empty material number.
    pub fn into_record(self, created_by: &str, at: TimeStamp<Utc>) -> MaterialRequest {
        MaterialRequest {
            material_id: String::new(),
            request_id: String::new(),
            material_number: String::new(),
            material_name: self.material_name,
            material_description: self.material_description,
            vendor: self.vendor,
            plant: self.plant,
            status: Status::PendingApproval,
            created_at: at.clone(),
            created_by: created_by.to_string(),
            modified_at: at,
            modified_by: created_by.to_string(),
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
        }
    }
}
