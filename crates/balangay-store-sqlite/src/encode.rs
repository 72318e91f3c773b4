//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings, calendar dates as
//! `YYYY-MM-DD`. Enums are stored as their lowercase discriminants. JSON
//! snapshots (history, staged payloads, outbox envelopes) are compact
//! `serde_json`. UUIDs are stored as hyphenated lowercase strings.

use balangay_core::{
  Error, Result,
  address::Address,
  business::{Business, BusinessFile, BusinessOwner, BusinessStatus},
  history::{AddressLink, BusinessHistory, PersonHistory},
  household::{Family, FamilyComposition, FamilyRole, Household, OccupancyType},
  medicine::Medicine,
  person::{CivilStatus, Person, Sex},
  registration::{RequestComposition, RequestRegistration},
  resident::ResidentProfile,
  staff::{Assignment, Staff, StaffRole},
  sync::{SyncEnvelope, SyncOp},
};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> {
  Uuid::parse_str(s).map_err(|e| Error::Storage(format!("bad uuid {s:?}: {e}")))
}

// ─── Timestamps and dates ────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Storage(format!("bad timestamp {s:?}: {e}")))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Storage(format!("bad date {s:?}: {e}")))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_sex(s: Sex) -> &'static str {
  match s {
    Sex::Male => "male",
    Sex::Female => "female",
  }
}

pub fn decode_sex(s: &str) -> Result<Sex> {
  match s {
    "male" => Ok(Sex::Male),
    "female" => Ok(Sex::Female),
    other => Err(Error::Storage(format!("unknown sex: {other:?}"))),
  }
}

pub fn encode_civil_status(c: CivilStatus) -> &'static str {
  match c {
    CivilStatus::Single => "single",
    CivilStatus::Married => "married",
    CivilStatus::Widowed => "widowed",
    CivilStatus::Separated => "separated",
  }
}

pub fn decode_civil_status(s: &str) -> Result<CivilStatus> {
  match s {
    "single" => Ok(CivilStatus::Single),
    "married" => Ok(CivilStatus::Married),
    "widowed" => Ok(CivilStatus::Widowed),
    "separated" => Ok(CivilStatus::Separated),
    other => Err(Error::Storage(format!("unknown civil status: {other:?}"))),
  }
}

pub fn encode_staff_role(r: StaffRole) -> &'static str {
  match r {
    StaffRole::Admin => "admin",
    StaffRole::Staff => "staff",
  }
}

pub fn decode_staff_role(s: &str) -> Result<StaffRole> {
  match s {
    "admin" => Ok(StaffRole::Admin),
    "staff" => Ok(StaffRole::Staff),
    other => Err(Error::Storage(format!("unknown staff role: {other:?}"))),
  }
}

pub fn encode_assignment(a: Assignment) -> &'static str {
  match a {
    Assignment::Profiling => "profiling",
    Assignment::Clinic => "clinic",
    Assignment::Unassigned => "unassigned",
  }
}

pub fn decode_assignment(s: &str) -> Result<Assignment> {
  match s {
    "profiling" => Ok(Assignment::Profiling),
    "clinic" => Ok(Assignment::Clinic),
    "unassigned" => Ok(Assignment::Unassigned),
    other => Err(Error::Storage(format!("unknown assignment: {other:?}"))),
  }
}

pub fn encode_occupancy(o: OccupancyType) -> &'static str {
  match o {
    OccupancyType::Owner => "owner",
    OccupancyType::Renter => "renter",
    OccupancyType::Sharer => "sharer",
  }
}

pub fn decode_occupancy(s: &str) -> Result<OccupancyType> {
  match s {
    "owner" => Ok(OccupancyType::Owner),
    "renter" => Ok(OccupancyType::Renter),
    "sharer" => Ok(OccupancyType::Sharer),
    other => Err(Error::Storage(format!("unknown occupancy: {other:?}"))),
  }
}

pub fn encode_family_role(r: FamilyRole) -> &'static str {
  match r {
    FamilyRole::Independent => "independent",
    FamilyRole::Mother => "mother",
    FamilyRole::Father => "father",
    FamilyRole::Dependent => "dependent",
    FamilyRole::Guardian => "guardian",
  }
}

pub fn decode_family_role(s: &str) -> Result<FamilyRole> {
  match s {
    "independent" => Ok(FamilyRole::Independent),
    "mother" => Ok(FamilyRole::Mother),
    "father" => Ok(FamilyRole::Father),
    "dependent" => Ok(FamilyRole::Dependent),
    "guardian" => Ok(FamilyRole::Guardian),
    other => Err(Error::Storage(format!("unknown family role: {other:?}"))),
  }
}

pub fn encode_business_status(s: BusinessStatus) -> &'static str {
  match s {
    BusinessStatus::Active => "active",
    BusinessStatus::Inactive => "inactive",
    BusinessStatus::Closed => "closed",
  }
}

pub fn decode_business_status(s: &str) -> Result<BusinessStatus> {
  match s {
    "active" => Ok(BusinessStatus::Active),
    "inactive" => Ok(BusinessStatus::Inactive),
    "closed" => Ok(BusinessStatus::Closed),
    other => Err(Error::Storage(format!("unknown business status: {other:?}"))),
  }
}

pub fn encode_sync_op(op: SyncOp) -> &'static str {
  match op {
    SyncOp::Create => "create",
    SyncOp::Update => "update",
    SyncOp::Delete => "delete",
  }
}

pub fn decode_sync_op(s: &str) -> Result<SyncOp> {
  match s {
    "create" => Ok(SyncOp::Create),
    "update" => Ok(SyncOp::Update),
    "delete" => Ok(SyncOp::Delete),
    other => Err(Error::Storage(format!("unknown sync op: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `persons` row.
pub struct RawPerson {
  pub person_id:    String,
  pub first_name:   String,
  pub middle_name:  Option<String>,
  pub last_name:    String,
  pub suffix:       Option<String>,
  pub birth_date:   String,
  pub sex:          String,
  pub civil_status: String,
  pub contact_no:   Option<String>,
  pub email:        Option<String>,
  pub created_at:   String,
}

impl RawPerson {
  pub const COLUMNS: &'static str = "person_id, first_name, middle_name, \
     last_name, suffix, birth_date, sex, civil_status, contact_no, email, \
     created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      person_id:    row.get(0)?,
      first_name:   row.get(1)?,
      middle_name:  row.get(2)?,
      last_name:    row.get(3)?,
      suffix:       row.get(4)?,
      birth_date:   row.get(5)?,
      sex:          row.get(6)?,
      civil_status: row.get(7)?,
      contact_no:   row.get(8)?,
      email:        row.get(9)?,
      created_at:   row.get(10)?,
    })
  }

  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      person_id:    decode_uuid(&self.person_id)?,
      first_name:   self.first_name,
      middle_name:  self.middle_name,
      last_name:    self.last_name,
      suffix:       self.suffix,
      birth_date:   decode_date(&self.birth_date)?,
      sex:          decode_sex(&self.sex)?,
      civil_status: decode_civil_status(&self.civil_status)?,
      contact_no:   self.contact_no,
      email:        self.email,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `addresses` row.
pub struct RawAddress {
  pub address_id:     String,
  pub province:       String,
  pub city:           String,
  pub barangay:       String,
  pub street:         String,
  pub sitio_id:       Option<String>,
  pub external_sitio: Option<String>,
}

impl RawAddress {
  pub const COLUMNS: &'static str =
    "address_id, province, city, barangay, street, sitio_id, external_sitio";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      address_id:     row.get(0)?,
      province:       row.get(1)?,
      city:           row.get(2)?,
      barangay:       row.get(3)?,
      street:         row.get(4)?,
      sitio_id:       row.get(5)?,
      external_sitio: row.get(6)?,
    })
  }

  pub fn into_address(self) -> Result<Address> {
    Ok(Address {
      address_id:     decode_uuid(&self.address_id)?,
      province:       self.province,
      city:           self.city,
      barangay:       self.barangay,
      street:         self.street,
      sitio_id:       self.sitio_id.as_deref().map(decode_uuid).transpose()?,
      external_sitio: self.external_sitio,
    })
  }
}

/// Raw strings read directly from a `staff` row.
pub struct RawStaff {
  pub staff_id:   String,
  pub name:       String,
  pub role:       String,
  pub assignment: String,
  pub rp_id:      Option<String>,
  pub created_at: String,
}

impl RawStaff {
  pub const COLUMNS: &'static str =
    "staff_id, name, role, assignment, rp_id, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      staff_id:   row.get(0)?,
      name:       row.get(1)?,
      role:       row.get(2)?,
      assignment: row.get(3)?,
      rp_id:      row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_staff(self) -> Result<Staff> {
    Ok(Staff {
      staff_id:   decode_uuid(&self.staff_id)?,
      name:       self.name,
      role:       decode_staff_role(&self.role)?,
      assignment: decode_assignment(&self.assignment)?,
      rp_id:      self.rp_id,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `residents` row.
pub struct RawResident {
  pub rp_id:         String,
  pub person_id:     String,
  pub staff_id:      String,
  pub voter:         bool,
  pub registered_at: String,
}

impl RawResident {
  pub const COLUMNS: &'static str =
    "rp_id, person_id, staff_id, voter, registered_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      rp_id:         row.get(0)?,
      person_id:     row.get(1)?,
      staff_id:      row.get(2)?,
      voter:         row.get(3)?,
      registered_at: row.get(4)?,
    })
  }

  pub fn into_resident(self) -> Result<ResidentProfile> {
    Ok(ResidentProfile {
      rp_id:         self.rp_id,
      person_id:     decode_uuid(&self.person_id)?,
      staff_id:      decode_uuid(&self.staff_id)?,
      voter:         self.voter,
      registered_at: decode_dt(&self.registered_at)?,
    })
  }
}

/// Raw strings read directly from a `households` row.
pub struct RawHousehold {
  pub hh_id:         String,
  pub address_id:    String,
  pub owner_rp_id:   String,
  pub staff_id:      String,
  pub registered_at: String,
}

impl RawHousehold {
  pub const COLUMNS: &'static str =
    "hh_id, address_id, owner_rp_id, staff_id, registered_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      hh_id:         row.get(0)?,
      address_id:    row.get(1)?,
      owner_rp_id:   row.get(2)?,
      staff_id:      row.get(3)?,
      registered_at: row.get(4)?,
    })
  }

  pub fn into_household(self) -> Result<Household> {
    Ok(Household {
      hh_id:         self.hh_id,
      address_id:    decode_uuid(&self.address_id)?,
      owner_rp_id:   self.owner_rp_id,
      staff_id:      decode_uuid(&self.staff_id)?,
      registered_at: decode_dt(&self.registered_at)?,
    })
  }
}

/// Raw strings read directly from a `families` row.
pub struct RawFamily {
  pub fam_id:        String,
  pub hh_id:         String,
  pub occupancy:     String,
  pub registered_at: String,
}

impl RawFamily {
  pub const COLUMNS: &'static str = "fam_id, hh_id, occupancy, registered_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      fam_id:        row.get(0)?,
      hh_id:         row.get(1)?,
      occupancy:     row.get(2)?,
      registered_at: row.get(3)?,
    })
  }

  pub fn into_family(self) -> Result<Family> {
    Ok(Family {
      fam_id:        self.fam_id,
      hh_id:         self.hh_id,
      occupancy:     decode_occupancy(&self.occupancy)?,
      registered_at: decode_dt(&self.registered_at)?,
    })
  }
}

/// Raw strings read directly from a `family_compositions` row.
pub struct RawComposition {
  pub composition_id: String,
  pub fam_id:         String,
  pub rp_id:          String,
  pub role:           String,
  pub joined_at:      String,
}

impl RawComposition {
  pub const COLUMNS: &'static str =
    "composition_id, fam_id, rp_id, role, joined_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      composition_id: row.get(0)?,
      fam_id:         row.get(1)?,
      rp_id:          row.get(2)?,
      role:           row.get(3)?,
      joined_at:      row.get(4)?,
    })
  }

  pub fn into_composition(self) -> Result<FamilyComposition> {
    Ok(FamilyComposition {
      composition_id: decode_uuid(&self.composition_id)?,
      fam_id:         self.fam_id,
      rp_id:          self.rp_id,
      role:           decode_family_role(&self.role)?,
      joined_at:      decode_dt(&self.joined_at)?,
    })
  }
}

/// Raw strings read directly from a `businesses` row.
pub struct RawBusiness {
  pub bus_id:        String,
  pub name:          String,
  pub nature:        String,
  pub status:        String,
  pub owner_rp_id:   Option<String>,
  pub owner_br_id:   Option<String>,
  pub verified_on:   String,
  pub staff_id:      String,
  pub registered_at: String,
}

impl RawBusiness {
  pub const COLUMNS: &'static str = "bus_id, name, nature, status, \
     owner_rp_id, owner_br_id, verified_on, staff_id, registered_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      bus_id:        row.get(0)?,
      name:          row.get(1)?,
      nature:        row.get(2)?,
      status:        row.get(3)?,
      owner_rp_id:   row.get(4)?,
      owner_br_id:   row.get(5)?,
      verified_on:   row.get(6)?,
      staff_id:      row.get(7)?,
      registered_at: row.get(8)?,
    })
  }

  pub fn into_business(self) -> Result<Business> {
    let owner = match (self.owner_rp_id, self.owner_br_id) {
      (Some(rp_id), None) => BusinessOwner::Resident { rp_id },
      (None, Some(br_id)) => BusinessOwner::External { br_id },
      _ => {
        return Err(Error::Storage(format!(
          "business {} has no single owner",
          self.bus_id
        )));
      }
    };
    Ok(Business {
      bus_id:        self.bus_id,
      name:          self.name,
      nature:        self.nature,
      status:        decode_business_status(&self.status)?,
      owner,
      verified_on:   decode_date(&self.verified_on)?,
      staff_id:      decode_uuid(&self.staff_id)?,
      registered_at: decode_dt(&self.registered_at)?,
    })
  }
}

/// Raw strings read directly from a `business_files` row.
pub struct RawBusinessFile {
  pub file_id:    String,
  pub bus_id:     String,
  pub name:       String,
  pub media_type: String,
  pub url:        String,
}

impl RawBusinessFile {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      file_id:    row.get(0)?,
      bus_id:     row.get(1)?,
      name:       row.get(2)?,
      media_type: row.get(3)?,
      url:        row.get(4)?,
    })
  }

  pub fn into_file(self) -> Result<BusinessFile> {
    Ok(BusinessFile {
      file_id:    decode_uuid(&self.file_id)?,
      bus_id:     self.bus_id,
      name:       self.name,
      media_type: self.media_type,
      url:        self.url,
    })
  }
}

/// Raw strings from a history row; generic over the parent key type.
pub struct RawHistory {
  pub parent_id:     String,
  pub history_id:    i64,
  pub staff_id:      String,
  pub reason:        Option<String>,
  pub snapshot_json: String,
  pub recorded_at:   String,
}

impl RawHistory {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      parent_id:     row.get(0)?,
      history_id:    row.get(1)?,
      staff_id:      row.get(2)?,
      reason:        row.get(3)?,
      snapshot_json: row.get(4)?,
      recorded_at:   row.get(5)?,
    })
  }

  pub fn into_person_history(self) -> Result<PersonHistory> {
    Ok(PersonHistory {
      person_id:   decode_uuid(&self.parent_id)?,
      history_id:  self.history_id,
      staff_id:    decode_uuid(&self.staff_id)?,
      reason:      self.reason,
      snapshot:    serde_json::from_str(&self.snapshot_json)?,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }

  pub fn into_business_history(self) -> Result<BusinessHistory> {
    Ok(BusinessHistory {
      bus_id:      self.parent_id,
      history_id:  self.history_id,
      staff_id:    decode_uuid(&self.staff_id)?,
      reason:      self.reason,
      snapshot:    serde_json::from_str(&self.snapshot_json)?,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw strings read directly from a `person_address_history` row.
pub struct RawAddressLink {
  pub person_id:   String,
  pub address_id:  String,
  pub history_id:  i64,
  pub recorded_at: String,
}

impl RawAddressLink {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      person_id:   row.get(0)?,
      address_id:  row.get(1)?,
      history_id:  row.get(2)?,
      recorded_at: row.get(3)?,
    })
  }

  pub fn into_link(self) -> Result<AddressLink> {
    Ok(AddressLink {
      person_id:   decode_uuid(&self.person_id)?,
      address_id:  decode_uuid(&self.address_id)?,
      history_id:  self.history_id,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw strings read directly from a `medicines` row.
pub struct RawMedicine {
  pub medicine_id: String,
  pub name:        String,
  pub unit:        String,
  pub quantity:    i64,
}

impl RawMedicine {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      medicine_id: row.get(0)?,
      name:        row.get(1)?,
      unit:        row.get(2)?,
      quantity:    row.get(3)?,
    })
  }

  pub fn into_medicine(self) -> Result<Medicine> {
    Ok(Medicine {
      medicine_id: decode_uuid(&self.medicine_id)?,
      name:        self.name,
      unit:        self.unit,
      quantity:    self.quantity,
    })
  }
}

/// Raw strings from a `requests` row plus its composition rows.
pub struct RawRequest {
  pub request_id:   String,
  pub payload_json: String,
  pub created_at:   String,
  pub compositions: Vec<(String, String)>, // (rp_id, role)
}

impl RawRequest {
  pub fn into_request(self) -> Result<RequestRegistration> {
    let compositions = self
      .compositions
      .into_iter()
      .map(|(rp_id, role)| {
        Ok(RequestComposition { rp_id, role: decode_family_role(&role)? })
      })
      .collect::<Result<Vec<_>>>()?;
    Ok(RequestRegistration {
      request_id: decode_uuid(&self.request_id)?,
      payload: serde_json::from_str(&self.payload_json)?,
      compositions,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `sync_outbox` row.
pub struct RawSyncEnvelope {
  pub sync_id:      i64,
  pub op:           String,
  pub entity:       String,
  pub entity_id:    String,
  pub payload_json: String,
  pub created_at:   String,
  pub attempts:     i64,
  pub last_error:   Option<String>,
}

impl RawSyncEnvelope {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      sync_id:      row.get(0)?,
      op:           row.get(1)?,
      entity:       row.get(2)?,
      entity_id:    row.get(3)?,
      payload_json: row.get(4)?,
      created_at:   row.get(5)?,
      attempts:     row.get(6)?,
      last_error:   row.get(7)?,
    })
  }

  pub fn into_envelope(self) -> Result<SyncEnvelope> {
    Ok(SyncEnvelope {
      sync_id:    self.sync_id,
      op:         decode_sync_op(&self.op)?,
      entity:     self.entity,
      entity_id:  self.entity_id,
      payload:    serde_json::from_str(&self.payload_json)?,
      created_at: decode_dt(&self.created_at)?,
      attempts:   self.attempts,
      last_error: self.last_error,
    })
  }
}
