//! Transaction-side helpers and the cascading registration.
//!
//! Everything here runs on the database thread inside an open
//! `rusqlite::Transaction` (passed as `&rusqlite::Connection`, which a
//! transaction derefs to). Helpers return [`CallResult`] so both rusqlite
//! and domain errors propagate out of the enclosing `conn.call` closure;
//! any error aborts the whole transaction.

use balangay_core::{
  Error,
  address::{Address, NewAddress, Sitio},
  business::{
    Business, BusinessOwner, BusinessRespondent, BusinessStatus,
    NewBusinessFile, NewRespondent,
  },
  household::{Family, FamilyComposition, FamilyRole, Household, OccupancyType},
  ids::{self, SequenceKind},
  notify::{NotificationDraft, NotificationKind, Route},
  person::{NewPerson, Person},
  registration::{
    HOME_BARANGAY, HOME_CITY, HOME_PROVINCE, HouseholdRef, PersonRef,
    RegistrationOutcome, RegistrationRequest,
  },
  resident::ResidentProfile,
  sync::SyncOp,
};
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use serde::Serialize;
use uuid::Uuid;

use crate::{
  encode::{
    RawAddress, RawFamily, RawPerson, encode_civil_status, encode_date,
    encode_dt, encode_family_role, encode_occupancy, encode_sex,
    encode_sync_op, encode_uuid,
  },
  error::{CallResult, domain, is_constraint},
};

// ─── Lookups ─────────────────────────────────────────────────────────────────

pub(crate) fn require_staff(
  conn: &rusqlite::Connection,
  staff_id: Uuid,
) -> CallResult<()> {
  let found: Option<bool> = conn
    .query_row(
      "SELECT 1 FROM staff WHERE staff_id = ?1",
      rusqlite::params![encode_uuid(staff_id)],
      |_| Ok(true),
    )
    .optional()?;
  if found.is_some() {
    Ok(())
  } else {
    Err(domain(Error::StaffNotFound(staff_id)))
  }
}

pub(crate) fn require_resident(
  conn: &rusqlite::Connection,
  rp_id: &str,
) -> CallResult<()> {
  let found: Option<bool> = conn
    .query_row(
      "SELECT 1 FROM residents WHERE rp_id = ?1",
      rusqlite::params![rp_id],
      |_| Ok(true),
    )
    .optional()?;
  if found.is_some() {
    Ok(())
  } else {
    Err(domain(Error::ResidentNotFound(rp_id.to_owned())))
  }
}

pub(crate) fn fetch_person(
  conn: &rusqlite::Connection,
  person_id: Uuid,
) -> CallResult<Option<Person>> {
  let raw: Option<RawPerson> = conn
    .query_row(
      &format!("SELECT {} FROM persons WHERE person_id = ?1", RawPerson::COLUMNS),
      rusqlite::params![encode_uuid(person_id)],
      RawPerson::from_row,
    )
    .optional()?;
  raw.map(RawPerson::into_person).transpose().map_err(domain)
}

pub(crate) fn fetch_family(
  conn: &rusqlite::Connection,
  fam_id: &str,
) -> CallResult<Option<Family>> {
  let raw: Option<RawFamily> = conn
    .query_row(
      &format!("SELECT {} FROM families WHERE fam_id = ?1", RawFamily::COLUMNS),
      rusqlite::params![fam_id],
      RawFamily::from_row,
    )
    .optional()?;
  raw.map(RawFamily::into_family).transpose().map_err(domain)
}

// ─── Sequences ───────────────────────────────────────────────────────────────

/// Claim the next sequence number for `kind` — an atomic
/// increment-and-return against the counter table. Safe under concurrent
/// writers because it happens inside the inserting transaction.
pub(crate) fn claim_seq(
  conn: &rusqlite::Connection,
  kind: SequenceKind,
) -> CallResult<u64> {
  let seq: i64 = conn.query_row(
    "INSERT INTO id_sequences (entity_kind, next_seq) VALUES (?1, 2)
     ON CONFLICT(entity_kind) DO UPDATE SET next_seq = next_seq + 1
     RETURNING next_seq - 1",
    rusqlite::params![kind.key()],
    |row| row.get(0),
  )?;
  Ok(seq as u64)
}

// ─── Outbox ──────────────────────────────────────────────────────────────────

/// Queue a mirror operation in the same transaction as the entity change.
pub(crate) fn enqueue_sync<T: Serialize>(
  conn: &rusqlite::Connection,
  op: SyncOp,
  entity: &str,
  entity_id: &str,
  payload: &T,
  now: DateTime<Utc>,
) -> CallResult<()> {
  let payload_json =
    serde_json::to_string(payload).map_err(|e| domain(Error::Serialization(e)))?;
  conn.execute(
    "INSERT INTO sync_outbox (op, entity, entity_id, payload_json, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    rusqlite::params![
      encode_sync_op(op),
      entity,
      entity_id,
      payload_json,
      encode_dt(now),
    ],
  )?;
  Ok(())
}

// ─── Addresses ───────────────────────────────────────────────────────────────

/// Look up a sitio by name, creating (and mirroring) it on first sight.
pub(crate) fn get_or_create_sitio(
  conn: &rusqlite::Connection,
  name: &str,
  now: DateTime<Utc>,
) -> CallResult<Uuid> {
  let existing: Option<String> = conn
    .query_row(
      "SELECT sitio_id FROM sitios WHERE name = ?1",
      rusqlite::params![name],
      |row| row.get(0),
    )
    .optional()?;
  if let Some(id) = existing {
    return Uuid::parse_str(&id)
      .map_err(|e| domain(Error::Storage(format!("bad sitio uuid: {e}"))));
  }
  let sitio = Sitio { sitio_id: Uuid::new_v4(), name: name.to_owned() };
  conn.execute(
    "INSERT INTO sitios (sitio_id, name) VALUES (?1, ?2)",
    rusqlite::params![encode_uuid(sitio.sitio_id), sitio.name],
  )?;
  enqueue_sync(conn, SyncOp::Create, "sitio", &encode_uuid(sitio.sitio_id), &sitio, now)?;
  Ok(sitio.sitio_id)
}

/// Deduplicate on the full field tuple: return the existing row or insert a
/// new one. `IS` comparison makes the nullable columns part of the key.
pub(crate) fn get_or_create_address(
  conn: &rusqlite::Connection,
  input: &NewAddress,
  now: DateTime<Utc>,
) -> CallResult<Address> {
  let sitio_str = input.sitio_id.map(encode_uuid);
  let existing: Option<RawAddress> = conn
    .query_row(
      &format!(
        "SELECT {} FROM addresses
         WHERE province = ?1 AND city = ?2 AND barangay = ?3 AND street = ?4
           AND sitio_id IS ?5 AND external_sitio IS ?6",
        RawAddress::COLUMNS
      ),
      rusqlite::params![
        input.province,
        input.city,
        input.barangay,
        input.street,
        sitio_str,
        input.external_sitio,
      ],
      RawAddress::from_row,
    )
    .optional()?;
  if let Some(raw) = existing {
    return raw.into_address().map_err(domain);
  }

  let address = Address {
    address_id:     Uuid::new_v4(),
    province:       input.province.clone(),
    city:           input.city.clone(),
    barangay:       input.barangay.clone(),
    street:         input.street.clone(),
    sitio_id:       input.sitio_id,
    external_sitio: input.external_sitio.clone(),
  };
  conn.execute(
    "INSERT INTO addresses (address_id, province, city, barangay, street,
       sitio_id, external_sitio)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    rusqlite::params![
      encode_uuid(address.address_id),
      address.province,
      address.city,
      address.barangay,
      address.street,
      sitio_str,
      address.external_sitio,
    ],
  )?;
  enqueue_sync(
    conn,
    SyncOp::Create,
    "address",
    &encode_uuid(address.address_id),
    &address,
    now,
  )?;
  Ok(address)
}

// ─── History versions ────────────────────────────────────────────────────────

/// The person's current history version: 0 before any mutation.
pub(crate) fn latest_person_version(
  conn: &rusqlite::Connection,
  person_id: Uuid,
) -> CallResult<i64> {
  let version: i64 = conn.query_row(
    "SELECT COALESCE(MAX(history_id), 0) FROM person_history WHERE person_id = ?1",
    rusqlite::params![encode_uuid(person_id)],
    |row| row.get(0),
  )?;
  Ok(version)
}

/// Append the prior state of `person` to the ledger; returns the new version.
pub(crate) fn append_person_history(
  conn: &rusqlite::Connection,
  person: &Person,
  staff_id: Uuid,
  reason: Option<&str>,
  now: DateTime<Utc>,
) -> CallResult<i64> {
  let version = latest_person_version(conn, person.person_id)? + 1;
  let snapshot =
    serde_json::to_string(person).map_err(|e| domain(Error::Serialization(e)))?;
  conn.execute(
    "INSERT INTO person_history (person_id, history_id, staff_id, reason,
       snapshot_json, recorded_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    rusqlite::params![
      encode_uuid(person.person_id),
      version,
      encode_uuid(staff_id),
      reason,
      snapshot,
      encode_dt(now),
    ],
  )?;
  Ok(version)
}

/// Append the prior state of `business` to the ledger; returns the new
/// version.
pub(crate) fn append_business_history(
  conn: &rusqlite::Connection,
  business: &Business,
  staff_id: Uuid,
  reason: Option<&str>,
  now: DateTime<Utc>,
) -> CallResult<i64> {
  let version: i64 = conn.query_row(
    "SELECT COALESCE(MAX(history_id), 0) + 1 FROM business_history WHERE bus_id = ?1",
    rusqlite::params![business.bus_id],
    |row| row.get(0),
  )?;
  let snapshot =
    serde_json::to_string(business).map_err(|e| domain(Error::Serialization(e)))?;
  conn.execute(
    "INSERT INTO business_history (bus_id, history_id, staff_id, reason,
       snapshot_json, recorded_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    rusqlite::params![
      business.bus_id,
      version,
      encode_uuid(staff_id),
      reason,
      snapshot,
      encode_dt(now),
    ],
  )?;
  Ok(version)
}

// ─── Entity inserts ──────────────────────────────────────────────────────────

/// Link an address to a person, journalling the link with the person's
/// current history version.
pub(crate) fn link_person_address(
  conn: &rusqlite::Connection,
  person_id: Uuid,
  address_id: Uuid,
  version: i64,
  now: DateTime<Utc>,
) -> CallResult<()> {
  conn.execute(
    "INSERT OR IGNORE INTO person_addresses (person_id, address_id) VALUES (?1, ?2)",
    rusqlite::params![encode_uuid(person_id), encode_uuid(address_id)],
  )?;
  conn.execute(
    "INSERT INTO person_address_history (person_id, address_id, history_id, recorded_at)
     VALUES (?1, ?2, ?3, ?4)",
    rusqlite::params![
      encode_uuid(person_id),
      encode_uuid(address_id),
      version,
      encode_dt(now),
    ],
  )?;
  Ok(())
}

/// Insert a person with deduplicated, journalled address links.
pub(crate) fn insert_person(
  conn: &rusqlite::Connection,
  input: &NewPerson,
  now: DateTime<Utc>,
) -> CallResult<Person> {
  let person = Person {
    person_id:    Uuid::new_v4(),
    first_name:   input.first_name.clone(),
    middle_name:  input.middle_name.clone(),
    last_name:    input.last_name.clone(),
    suffix:       input.suffix.clone(),
    birth_date:   input.birth_date,
    sex:          input.sex,
    civil_status: input.civil_status,
    contact_no:   input.contact_no.clone(),
    email:        input.email.clone(),
    created_at:   now,
  };
  conn.execute(
    "INSERT INTO persons (person_id, first_name, middle_name, last_name,
       suffix, birth_date, sex, civil_status, contact_no, email, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    rusqlite::params![
      encode_uuid(person.person_id),
      person.first_name,
      person.middle_name,
      person.last_name,
      person.suffix,
      encode_date(person.birth_date),
      encode_sex(person.sex),
      encode_civil_status(person.civil_status),
      person.contact_no,
      person.email,
      encode_dt(person.created_at),
    ],
  )?;

  // A fresh person is at history version 0.
  let version = latest_person_version(conn, person.person_id)?;
  for addr_input in &input.addresses {
    let address = get_or_create_address(conn, addr_input, now)?;
    link_person_address(conn, person.person_id, address.address_id, version, now)?;
  }

  enqueue_sync(
    conn,
    SyncOp::Create,
    "person",
    &encode_uuid(person.person_id),
    &person,
    now,
  )?;
  Ok(person)
}

pub(crate) fn insert_resident(
  conn: &rusqlite::Connection,
  person_id: Uuid,
  staff_id: Uuid,
  voter: bool,
  now: DateTime<Utc>,
) -> CallResult<ResidentProfile> {
  let existing: Option<String> = conn
    .query_row(
      "SELECT rp_id FROM residents WHERE person_id = ?1",
      rusqlite::params![encode_uuid(person_id)],
      |row| row.get(0),
    )
    .optional()?;
  if let Some(rp_id) = existing {
    return Err(domain(Error::AlreadyProfiled { person_id, rp_id }));
  }

  let seq = claim_seq(conn, SequenceKind::Resident)?;
  let resident = ResidentProfile {
    rp_id: ids::resident_id(now.date_naive(), seq),
    person_id,
    staff_id,
    voter,
    registered_at: now,
  };
  let inserted = conn.execute(
    "INSERT INTO residents (rp_id, person_id, staff_id, voter, registered_at)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    rusqlite::params![
      resident.rp_id,
      encode_uuid(person_id),
      encode_uuid(staff_id),
      resident.voter,
      encode_dt(now),
    ],
  );
  match inserted {
    Ok(_) => {}
    Err(e) if is_constraint(&e) => {
      return Err(domain(Error::DisplayIdConflict(resident.rp_id)));
    }
    Err(e) => return Err(e.into()),
  }

  enqueue_sync(conn, SyncOp::Create, "resident", &resident.rp_id, &resident, now)?;
  Ok(resident)
}

pub(crate) fn insert_household(
  conn: &rusqlite::Connection,
  address_id: Uuid,
  owner_rp_id: &str,
  staff_id: Uuid,
  now: DateTime<Utc>,
) -> CallResult<Household> {
  let seq = claim_seq(conn, SequenceKind::Household)?;
  let household = Household {
    hh_id: ids::household_id(now.date_naive(), seq),
    address_id,
    owner_rp_id: owner_rp_id.to_owned(),
    staff_id,
    registered_at: now,
  };
  let inserted = conn.execute(
    "INSERT INTO households (hh_id, address_id, owner_rp_id, staff_id, registered_at)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    rusqlite::params![
      household.hh_id,
      encode_uuid(address_id),
      household.owner_rp_id,
      encode_uuid(staff_id),
      encode_dt(now),
    ],
  );
  match inserted {
    Ok(_) => {}
    Err(e) if is_constraint(&e) => {
      return Err(domain(Error::DisplayIdConflict(household.hh_id)));
    }
    Err(e) => return Err(e.into()),
  }

  enqueue_sync(conn, SyncOp::Create, "household", &household.hh_id, &household, now)?;
  Ok(household)
}

pub(crate) fn insert_family(
  conn: &rusqlite::Connection,
  hh_id: &str,
  occupancy: OccupancyType,
  now: DateTime<Utc>,
) -> CallResult<Family> {
  let seq = claim_seq(conn, SequenceKind::Family)?;
  let family = Family {
    fam_id: ids::family_id(now.date_naive(), seq, occupancy),
    hh_id: hh_id.to_owned(),
    occupancy,
    registered_at: now,
  };
  let inserted = conn.execute(
    "INSERT INTO families (fam_id, hh_id, occupancy, registered_at)
     VALUES (?1, ?2, ?3, ?4)",
    rusqlite::params![
      family.fam_id,
      family.hh_id,
      encode_occupancy(occupancy),
      encode_dt(now),
    ],
  );
  match inserted {
    Ok(_) => {}
    Err(e) if is_constraint(&e) => {
      return Err(domain(Error::DisplayIdConflict(family.fam_id)));
    }
    Err(e) => return Err(e.into()),
  }

  enqueue_sync(conn, SyncOp::Create, "family", &family.fam_id, &family, now)?;
  Ok(family)
}

pub(crate) fn insert_composition(
  conn: &rusqlite::Connection,
  fam_id: &str,
  rp_id: &str,
  role: FamilyRole,
  now: DateTime<Utc>,
) -> CallResult<FamilyComposition> {
  let composition = FamilyComposition {
    composition_id: Uuid::new_v4(),
    fam_id: fam_id.to_owned(),
    rp_id: rp_id.to_owned(),
    role,
    joined_at: now,
  };
  conn.execute(
    "INSERT INTO family_compositions (composition_id, fam_id, rp_id, role, joined_at)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    rusqlite::params![
      encode_uuid(composition.composition_id),
      composition.fam_id,
      composition.rp_id,
      encode_family_role(role),
      encode_dt(now),
    ],
  )?;
  Ok(composition)
}

pub(crate) fn insert_respondent(
  conn: &rusqlite::Connection,
  input: &NewRespondent,
  now: DateTime<Utc>,
) -> CallResult<BusinessRespondent> {
  let seq = claim_seq(conn, SequenceKind::Respondent)?;
  let respondent = BusinessRespondent {
    br_id:      ids::respondent_id(now.date_naive(), seq),
    first_name: input.first_name.clone(),
    last_name:  input.last_name.clone(),
    contact_no: input.contact_no.clone(),
  };
  let inserted = conn.execute(
    "INSERT INTO respondents (br_id, first_name, last_name, contact_no)
     VALUES (?1, ?2, ?3, ?4)",
    rusqlite::params![
      respondent.br_id,
      respondent.first_name,
      respondent.last_name,
      respondent.contact_no,
    ],
  );
  match inserted {
    Ok(_) => {}
    Err(e) if is_constraint(&e) => {
      return Err(domain(Error::DisplayIdConflict(respondent.br_id)));
    }
    Err(e) => return Err(e.into()),
  }

  enqueue_sync(conn, SyncOp::Create, "respondent", &respondent.br_id, &respondent, now)?;
  Ok(respondent)
}

/// Insert a business (status forced active, verification stamped today) and
/// attach its already-uploaded files.
pub(crate) fn insert_business(
  conn: &rusqlite::Connection,
  name: &str,
  nature: &str,
  owner: BusinessOwner,
  files: &[NewBusinessFile],
  staff_id: Uuid,
  now: DateTime<Utc>,
) -> CallResult<Business> {
  let seq = claim_seq(conn, SequenceKind::Business)?;
  let business = Business {
    bus_id: ids::business_id(now.date_naive(), seq),
    name: name.to_owned(),
    nature: nature.to_owned(),
    status: BusinessStatus::Active,
    owner,
    verified_on: now.date_naive(),
    staff_id,
    registered_at: now,
  };
  let (owner_rp, owner_br) = match &business.owner {
    BusinessOwner::Resident { rp_id } => (Some(rp_id.as_str()), None),
    BusinessOwner::External { br_id } => (None, Some(br_id.as_str())),
  };
  let inserted = conn.execute(
    "INSERT INTO businesses (bus_id, name, nature, status, owner_rp_id,
       owner_br_id, verified_on, staff_id, registered_at)
     VALUES (?1, ?2, ?3, 'active', ?4, ?5, ?6, ?7, ?8)",
    rusqlite::params![
      business.bus_id,
      business.name,
      business.nature,
      owner_rp,
      owner_br,
      encode_date(business.verified_on),
      encode_uuid(staff_id),
      encode_dt(now),
    ],
  );
  match inserted {
    Ok(_) => {}
    Err(e) if is_constraint(&e) => {
      return Err(domain(Error::DisplayIdConflict(business.bus_id)));
    }
    Err(e) => return Err(e.into()),
  }

  for file in files {
    conn.execute(
      "INSERT INTO business_files (file_id, bus_id, name, media_type, url)
       VALUES (?1, ?2, ?3, ?4, ?5)",
      rusqlite::params![
        encode_uuid(Uuid::new_v4()),
        business.bus_id,
        file.name,
        file.media_type,
        file.url,
      ],
    )?;
  }

  enqueue_sync(conn, SyncOp::Create, "business", &business.bus_id, &business, now)?;
  Ok(business)
}

// ─── Notification fan-out ────────────────────────────────────────────────────

/// Resident profiles of profiling staff and admins, minus the acting staff
/// member and any staff without a profile to address.
pub(crate) fn staff_recipients(
  conn: &rusqlite::Connection,
  actor: Uuid,
) -> CallResult<Vec<String>> {
  let mut stmt = conn.prepare(
    "SELECT rp_id FROM staff
     WHERE rp_id IS NOT NULL
       AND (assignment = 'profiling' OR role = 'admin')
       AND staff_id != ?1",
  )?;
  let rows = stmt
    .query_map(rusqlite::params![encode_uuid(actor)], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(rows)
}

pub(crate) fn family_member_rps(
  conn: &rusqlite::Connection,
  fam_id: &str,
) -> CallResult<Vec<String>> {
  let mut stmt = conn.prepare(
    "SELECT DISTINCT rp_id FROM family_compositions WHERE fam_id = ?1",
  )?;
  let rows = stmt
    .query_map(rusqlite::params![fam_id], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(rows)
}

fn person_display_name(person: &Person) -> String {
  match &person.middle_name {
    Some(mid) => format!("{} {} {}", person.first_name, mid, person.last_name),
    None => format!("{} {}", person.first_name, person.last_name),
  }
}

// ─── The cascading registration ──────────────────────────────────────────────

/// Run the whole registration bundle inside the caller's open transaction.
///
/// Step order is fixed: person → resident profile → account → households →
/// family (solo or join) → business. Each step depends on the previous
/// step's output; any failure unwinds everything, including the outbox rows
/// queued along the way.
pub(crate) fn run_registration(
  conn: &rusqlite::Connection,
  request: &RegistrationRequest,
  now: DateTime<Utc>,
) -> CallResult<RegistrationOutcome> {
  // Validate before the first write.
  require_staff(conn, request.staff_id)?;
  let parsed_houses = request
    .houses
    .iter()
    .map(|house| house.parse_location().map_err(domain))
    .collect::<CallResult<Vec<_>>>()?;
  if let Some(solo) = &request.living_solo
    && let HouseholdRef::Created { index } = solo.household
    && index >= request.houses.len()
  {
    return Err(domain(Error::HouseIndexOutOfRange {
      index,
      created: request.houses.len(),
    }));
  }

  // 1. Resolve or create the person.
  let person = match &request.person {
    PersonRef::Existing { person_id } => fetch_person(conn, *person_id)?
      .ok_or_else(|| domain(Error::PersonNotFound(*person_id)))?,
    PersonRef::New(input) => insert_person(conn, input, now)?,
  };

  // 2. Resident profile.
  let resident =
    insert_resident(conn, person.person_id, request.staff_id, false, now)?;

  // 3. Optional login account.
  if let Some(account) = &request.account {
    let account_id = Uuid::new_v4();
    let inserted = conn.execute(
      "INSERT INTO accounts (account_id, rp_id, username, secret_hash, created_at)
       VALUES (?1, ?2, ?3, ?4, ?5)",
      rusqlite::params![
        encode_uuid(account_id),
        resident.rp_id,
        account.username,
        account.secret_hash,
        encode_dt(now),
      ],
    );
    match inserted {
      Ok(_) => {}
      Err(e) if is_constraint(&e) => {
        return Err(domain(Error::UsernameTaken(account.username.clone())));
      }
      Err(e) => return Err(e.into()),
    }
    // Mirror the account without its credential hash.
    enqueue_sync(
      conn,
      SyncOp::Create,
      "account",
      &encode_uuid(account_id),
      &serde_json::json!({
        "account_id": account_id,
        "rp_id": resident.rp_id,
        "username": account.username,
      }),
      now,
    )?;
  }

  // 4. Households, one per house, all owned by the new resident.
  let mut households = Vec::with_capacity(parsed_houses.len());
  for (sitio_name, street) in &parsed_houses {
    let sitio_id = get_or_create_sitio(conn, sitio_name, now)?;
    let address = get_or_create_address(
      conn,
      &NewAddress {
        province:       HOME_PROVINCE.to_owned(),
        city:           HOME_CITY.to_owned(),
        barangay:       HOME_BARANGAY.to_owned(),
        street:         street.clone(),
        sitio_id:       Some(sitio_id),
        external_sitio: None,
      },
      now,
    )?;
    households.push(insert_household(
      conn,
      address.address_id,
      &resident.rp_id,
      request.staff_id,
      now,
    )?);
  }

  // 5/6. Family: either a new one-person family or joining an existing one.
  let mut family = None;
  let mut composition = None;
  if let Some(solo) = &request.living_solo {
    let hh_id = match &solo.household {
      HouseholdRef::Created { index } => households[*index].hh_id.clone(),
      HouseholdRef::Existing { hh_id } => {
        let found: Option<bool> = conn
          .query_row(
            "SELECT 1 FROM households WHERE hh_id = ?1",
            rusqlite::params![hh_id],
            |_| Ok(true),
          )
          .optional()?;
        if found.is_none() {
          return Err(domain(Error::HouseholdNotFound(hh_id.clone())));
        }
        hh_id.clone()
      }
    };
    let fam = insert_family(conn, &hh_id, solo.occupancy, now)?;
    composition = Some(insert_composition(
      conn,
      &fam.fam_id,
      &resident.rp_id,
      FamilyRole::Independent,
      now,
    )?);
    family = Some(fam);
  } else if let Some(join) = &request.join_family {
    let fam = fetch_family(conn, &join.fam_id)?
      .ok_or_else(|| domain(Error::FamilyNotFound(join.fam_id.clone())))?;
    composition =
      Some(insert_composition(conn, &fam.fam_id, &resident.rp_id, join.role, now)?);
    enqueue_sync(conn, SyncOp::Update, "family", &fam.fam_id, &fam, now)?;
    family = Some(fam);
  }

  // 7. Business, owned by the new resident.
  let business = match &request.business {
    Some(input) => Some(insert_business(
      conn,
      &input.name,
      &input.nature,
      BusinessOwner::Resident { rp_id: resident.rp_id.clone() },
      &input.files,
      request.staff_id,
      now,
    )?),
    None => None,
  };

  // Notification drafts, dispatched by the caller after commit.
  let staff_set = staff_recipients(conn, request.staff_id)?;
  let full_name = person_display_name(&person);
  let mut notifications = Vec::new();

  notifications.push(NotificationDraft {
    title:      "New resident registered".to_owned(),
    message:    format!("{full_name} is now resident {}", resident.rp_id),
    recipients: staff_set.clone(),
    kind:       NotificationKind::Registration,
    web:        Route::new(
      "resident-detail",
      serde_json::json!({ "rp_id": resident.rp_id }),
    ),
    mobile:     Route::new(
      "ResidentDetail",
      serde_json::json!({ "rpId": resident.rp_id }),
    ),
  });

  for household in &households {
    notifications.push(NotificationDraft {
      title:      "Household registered".to_owned(),
      message:    format!("{full_name} registered household {}", household.hh_id),
      recipients: staff_set.clone(),
      kind:       NotificationKind::Household,
      web:        Route::new(
        "household-detail",
        serde_json::json!({ "hh_id": household.hh_id }),
      ),
      mobile:     Route::new(
        "HouseholdDetail",
        serde_json::json!({ "hhId": household.hh_id }),
      ),
    });
  }

  if let Some(fam) = &family {
    // Existing members hear about their new member; a fresh solo family has
    // only the new resident.
    let mut recipients = family_member_rps(conn, &fam.fam_id)?;
    recipients.retain(|rp| rp != &resident.rp_id);
    recipients.extend(staff_set.iter().cloned());
    notifications.push(NotificationDraft {
      title:      "Family updated".to_owned(),
      message:    format!("{full_name} joined family {}", fam.fam_id),
      recipients,
      kind:       NotificationKind::Family,
      web:        Route::new(
        "family-detail",
        serde_json::json!({ "fam_id": fam.fam_id }),
      ),
      mobile:     Route::new(
        "FamilyDetail",
        serde_json::json!({ "famId": fam.fam_id }),
      ),
    });
  }

  if let Some(bus) = &business {
    notifications.push(NotificationDraft {
      title:      "Business registered".to_owned(),
      message:    format!("{} registered under {}", bus.name, resident.rp_id),
      recipients: staff_set,
      kind:       NotificationKind::Business,
      web:        Route::new(
        "business-detail",
        serde_json::json!({ "bus_id": bus.bus_id }),
      ),
      mobile:     Route::new(
        "BusinessDetail",
        serde_json::json!({ "busId": bus.bus_id }),
      ),
    });
  }

  Ok(RegistrationOutcome {
    person,
    resident,
    households,
    family,
    composition,
    business,
    notifications,
  })
}
