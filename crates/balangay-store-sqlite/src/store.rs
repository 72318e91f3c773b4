//! [`SqliteStore`] — the SQLite implementation of [`RegistryStore`].

use std::path::Path;

use balangay_core::{
  Error, Result,
  address::{Address, NewSitio, Sitio},
  business::{
    Business, BusinessFile, BusinessOwner, BusinessUpdate, NewBusiness,
    NewBusinessOwner,
  },
  history::{AddressLink, BusinessHistory, PersonHistory},
  household::{Family, FamilyComposition, FamilyRole, Household, NewHousehold},
  medicine::{Dispense, DispenseRequest, Medicine, NewMedicine},
  person::{NewPerson, Person, PersonUpdate},
  registration::{
    NewRequest, RegistrationOutcome, RegistrationRequest, RequestRegistration,
  },
  resident::ResidentProfile,
  staff::{NewStaff, Staff},
  store::{RegistryStore, ResidentQuery},
  sync::{SyncEnvelope, SyncOp},
};
use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  encode::{
    RawAddress, RawAddressLink, RawBusiness, RawBusinessFile, RawComposition,
    RawFamily, RawHistory, RawHousehold, RawMedicine, RawPerson, RawRequest,
    RawResident, RawStaff, RawSyncEnvelope, decode_uuid, encode_assignment,
    encode_business_status, encode_civil_status, encode_date, encode_dt,
    encode_family_role, encode_sex, encode_staff_role, encode_uuid,
  },
  error::{call_error, domain},
  registration::{
    append_business_history, append_person_history, enqueue_sync, fetch_family,
    fetch_person, get_or_create_address, insert_business, insert_composition,
    insert_household, insert_person, insert_respondent, require_resident,
    require_staff, run_registration,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Balangay registry store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(call_error)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(call_error)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
      .map_err(call_error)
  }
}

// ─── RegistryStore impl ──────────────────────────────────────────────────────

impl RegistryStore for SqliteStore {
  // ── Persons ───────────────────────────────────────────────────────────────

  async fn create_person(&self, input: NewPerson, staff_id: Uuid) -> Result<Person> {
    let now = Utc::now();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        require_staff(&tx, staff_id)?;
        let person = insert_person(&tx, &input, now)?;
        tx.commit()?;
        Ok(person)
      })
      .await
      .map_err(call_error)
  }

  async fn get_person(&self, id: Uuid) -> Result<Option<Person>> {
    self
      .conn
      .call(move |conn| fetch_person(conn, id))
      .await
      .map_err(call_error)
  }

  async fn list_persons(&self) -> Result<Vec<Person>> {
    let raws: Vec<RawPerson> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM persons ORDER BY created_at",
          RawPerson::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawPerson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(call_error)?;
    raws.into_iter().map(RawPerson::into_person).collect()
  }

  async fn update_person(
    &self,
    id: Uuid,
    changes: PersonUpdate,
    staff_id: Uuid,
    reason: Option<String>,
  ) -> Result<Person> {
    let now = Utc::now();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        require_staff(&tx, staff_id)?;
        let current =
          fetch_person(&tx, id)?.ok_or_else(|| domain(Error::PersonNotFound(id)))?;

        // Snapshot the prior state, then apply.
        append_person_history(&tx, &current, staff_id, reason.as_deref(), now)?;
        let updated = changes.apply(&current);
        tx.execute(
          "UPDATE persons SET first_name = ?2, middle_name = ?3, last_name = ?4,
             suffix = ?5, birth_date = ?6, sex = ?7, civil_status = ?8,
             contact_no = ?9, email = ?10
           WHERE person_id = ?1",
          rusqlite::params![
            encode_uuid(id),
            updated.first_name,
            updated.middle_name,
            updated.last_name,
            updated.suffix,
            encode_date(updated.birth_date),
            encode_sex(updated.sex),
            encode_civil_status(updated.civil_status),
            updated.contact_no,
            updated.email,
          ],
        )?;
        enqueue_sync(&tx, SyncOp::Update, "person", &encode_uuid(id), &updated, now)?;
        tx.commit()?;
        Ok(updated)
      })
      .await
      .map_err(call_error)
  }

  async fn person_history(&self, id: Uuid) -> Result<Vec<PersonHistory>> {
    let raws: Vec<RawHistory> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT person_id, history_id, staff_id, reason, snapshot_json, recorded_at
           FROM person_history WHERE person_id = ?1 ORDER BY history_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![encode_uuid(id)], RawHistory::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(call_error)?;
    raws.into_iter().map(RawHistory::into_person_history).collect()
  }

  async fn person_addresses(&self, id: Uuid) -> Result<Vec<Address>> {
    let raws: Vec<RawAddress> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM addresses a
           JOIN person_addresses pa ON pa.address_id = a.address_id
           WHERE pa.person_id = ?1",
          RawAddress::COLUMNS
            .split(", ")
            .map(|c| format!("a.{c}"))
            .collect::<Vec<_>>()
            .join(", ")
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![encode_uuid(id)], RawAddress::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(call_error)?;
    raws.into_iter().map(RawAddress::into_address).collect()
  }

  async fn address_links_at(&self, id: Uuid, history_id: i64) -> Result<Vec<AddressLink>> {
    let raws: Vec<RawAddressLink> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT person_id, address_id, history_id, recorded_at
           FROM person_address_history
           WHERE person_id = ?1 AND history_id <= ?2
           ORDER BY recorded_at",
        )?;
        let rows = stmt
          .query_map(
            rusqlite::params![encode_uuid(id), history_id],
            RawAddressLink::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(call_error)?;
    raws.into_iter().map(RawAddressLink::into_link).collect()
  }

  // ── Sitios ────────────────────────────────────────────────────────────────

  async fn create_sitio(&self, input: NewSitio) -> Result<Sitio> {
    let now = Utc::now();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let id = crate::registration::get_or_create_sitio(&tx, &input.name, now)?;
        tx.commit()?;
        Ok(Sitio { sitio_id: id, name: input.name })
      })
      .await
      .map_err(call_error)
  }

  async fn list_sitios(&self) -> Result<Vec<Sitio>> {
    let rows: Vec<(String, String)> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT sitio_id, name FROM sitios ORDER BY name")?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(call_error)?;
    rows
      .into_iter()
      .map(|(id, name)| Ok(Sitio { sitio_id: decode_uuid(&id)?, name }))
      .collect()
  }

  // ── Staff ─────────────────────────────────────────────────────────────────

  async fn create_staff(&self, input: NewStaff) -> Result<Staff> {
    let now = Utc::now();
    let staff = Staff {
      staff_id:   Uuid::new_v4(),
      name:       input.name,
      role:       input.role,
      assignment: input.assignment,
      rp_id:      input.rp_id,
      created_at: now,
    };
    let row = staff.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO staff (staff_id, name, role, assignment, rp_id, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            encode_uuid(row.staff_id),
            row.name,
            encode_staff_role(row.role),
            encode_assignment(row.assignment),
            row.rp_id,
            encode_dt(row.created_at),
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(call_error)?;
    Ok(staff)
  }

  async fn get_staff(&self, id: Uuid) -> Result<Option<Staff>> {
    let raw: Option<RawStaff> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM staff WHERE staff_id = ?1", RawStaff::COLUMNS),
              rusqlite::params![encode_uuid(id)],
              RawStaff::from_row,
            )
            .optional()?,
        )
      })
      .await
      .map_err(call_error)?;
    raw.map(RawStaff::into_staff).transpose()
  }

  // ── Registration ──────────────────────────────────────────────────────────

  async fn register(&self, request: RegistrationRequest) -> Result<RegistrationOutcome> {
    let now = Utc::now();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let outcome = run_registration(&tx, &request, now)?;
        tx.commit()?;
        Ok(outcome)
      })
      .await
      .map_err(call_error)
  }

  // ── Residents ─────────────────────────────────────────────────────────────

  async fn get_resident(&self, rp_id: &str) -> Result<Option<ResidentProfile>> {
    let rp_id = rp_id.to_owned();
    let raw: Option<RawResident> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM residents WHERE rp_id = ?1",
                RawResident::COLUMNS
              ),
              rusqlite::params![rp_id],
              RawResident::from_row,
            )
            .optional()?,
        )
      })
      .await
      .map_err(call_error)?;
    raw.map(RawResident::into_resident).transpose()
  }

  async fn search_residents(&self, query: &ResidentQuery) -> Result<Vec<ResidentProfile>> {
    let text_pattern = query.text.as_deref().map(|t| format!("%{t}%"));
    let sitio_str = query.sitio_id.map(encode_uuid);
    let voter = query.voter;
    let limit_val = query.limit.unwrap_or(100) as i64;
    let offset_val = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawResident> = self
      .conn
      .call(move |conn| {
        // Build the FROM and WHERE clauses dynamically.
        let mut sql = String::from(
          "SELECT DISTINCT r.rp_id, r.person_id, r.staff_id, r.voter, r.registered_at
           FROM residents r
           JOIN persons p ON p.person_id = r.person_id",
        );
        if sitio_str.is_some() {
          sql.push_str(
            " JOIN person_addresses pa ON pa.person_id = r.person_id
              JOIN addresses a ON a.address_id = pa.address_id",
          );
        }

        let mut conds: Vec<&'static str> = vec![];
        if text_pattern.is_some() {
          conds.push(
            "(p.first_name LIKE ?1 OR p.middle_name LIKE ?1 OR p.last_name LIKE ?1)",
          );
        }
        if sitio_str.is_some() {
          conds.push("a.sitio_id = ?2");
        }
        if voter.is_some() {
          conds.push("r.voter = ?3");
        }
        if !conds.is_empty() {
          sql.push_str(" WHERE ");
          sql.push_str(&conds.join(" AND "));
        }
        sql.push_str(" ORDER BY r.rp_id LIMIT ?4 OFFSET ?5");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              text_pattern.as_deref(),
              sitio_str.as_deref(),
              voter,
              limit_val,
              offset_val,
            ],
            RawResident::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(call_error)?;
    raws.into_iter().map(RawResident::into_resident).collect()
  }

  async fn current_family(&self, rp_id: &str) -> Result<Option<Family>> {
    let rp_id = rp_id.to_owned();
    let raw: Option<RawFamily> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM families f
                 JOIN family_compositions c ON c.fam_id = f.fam_id
                 WHERE c.rp_id = ?1
                 ORDER BY c.joined_at DESC LIMIT 1",
                RawFamily::COLUMNS
                  .split(", ")
                  .map(|c| format!("f.{c}"))
                  .collect::<Vec<_>>()
                  .join(", ")
              ),
              rusqlite::params![rp_id],
              RawFamily::from_row,
            )
            .optional()?,
        )
      })
      .await
      .map_err(call_error)?;
    raw.map(RawFamily::into_family).transpose()
  }

  // ── Households ────────────────────────────────────────────────────────────

  async fn create_household(&self, input: NewHousehold, staff_id: Uuid) -> Result<Household> {
    let now = Utc::now();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        require_staff(&tx, staff_id)?;
        require_resident(&tx, &input.owner_rp_id)?;
        let address = get_or_create_address(&tx, &input.address, now)?;
        let household =
          insert_household(&tx, address.address_id, &input.owner_rp_id, staff_id, now)?;
        tx.commit()?;
        Ok(household)
      })
      .await
      .map_err(call_error)
  }

  async fn get_household(&self, hh_id: &str) -> Result<Option<Household>> {
    let hh_id = hh_id.to_owned();
    let raw: Option<RawHousehold> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM households WHERE hh_id = ?1",
                RawHousehold::COLUMNS
              ),
              rusqlite::params![hh_id],
              RawHousehold::from_row,
            )
            .optional()?,
        )
      })
      .await
      .map_err(call_error)?;
    raw.map(RawHousehold::into_household).transpose()
  }

  async fn list_households(&self) -> Result<Vec<Household>> {
    let raws: Vec<RawHousehold> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM households ORDER BY hh_id",
          RawHousehold::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawHousehold::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(call_error)?;
    raws.into_iter().map(RawHousehold::into_household).collect()
  }

  // ── Families ──────────────────────────────────────────────────────────────

  async fn get_family(&self, fam_id: &str) -> Result<Option<Family>> {
    let fam_id = fam_id.to_owned();
    self
      .conn
      .call(move |conn| fetch_family(conn, &fam_id))
      .await
      .map_err(call_error)
  }

  async fn family_members(&self, fam_id: &str) -> Result<Vec<FamilyComposition>> {
    let fam_id = fam_id.to_owned();
    let raws: Vec<RawComposition> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM family_compositions WHERE fam_id = ?1 ORDER BY joined_at",
          RawComposition::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![fam_id], RawComposition::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(call_error)?;
    raws.into_iter().map(RawComposition::into_composition).collect()
  }

  async fn join_family(
    &self,
    fam_id: &str,
    rp_id: &str,
    role: FamilyRole,
  ) -> Result<FamilyComposition> {
    let now = Utc::now();
    let fam_id = fam_id.to_owned();
    let rp_id = rp_id.to_owned();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let family = fetch_family(&tx, &fam_id)?
          .ok_or_else(|| domain(Error::FamilyNotFound(fam_id.clone())))?;
        require_resident(&tx, &rp_id)?;
        let composition = insert_composition(&tx, &fam_id, &rp_id, role, now)?;
        enqueue_sync(&tx, SyncOp::Update, "family", &fam_id, &family, now)?;
        tx.commit()?;
        Ok(composition)
      })
      .await
      .map_err(call_error)
  }

  // ── Businesses ────────────────────────────────────────────────────────────

  async fn create_business(&self, input: NewBusiness, staff_id: Uuid) -> Result<Business> {
    let now = Utc::now();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        require_staff(&tx, staff_id)?;
        let owner = match &input.owner {
          NewBusinessOwner::Resident { rp_id } => {
            require_resident(&tx, rp_id)?;
            BusinessOwner::Resident { rp_id: rp_id.clone() }
          }
          NewBusinessOwner::External(respondent) => {
            let row = insert_respondent(&tx, respondent, now)?;
            BusinessOwner::External { br_id: row.br_id }
          }
        };
        let business = insert_business(
          &tx,
          &input.name,
          &input.nature,
          owner,
          &input.files,
          staff_id,
          now,
        )?;
        tx.commit()?;
        Ok(business)
      })
      .await
      .map_err(call_error)
  }

  async fn get_business(&self, bus_id: &str) -> Result<Option<Business>> {
    let bus_id = bus_id.to_owned();
    let raw: Option<RawBusiness> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM businesses WHERE bus_id = ?1",
                RawBusiness::COLUMNS
              ),
              rusqlite::params![bus_id],
              RawBusiness::from_row,
            )
            .optional()?,
        )
      })
      .await
      .map_err(call_error)?;
    raw.map(RawBusiness::into_business).transpose()
  }

  async fn list_businesses(&self) -> Result<Vec<Business>> {
    let raws: Vec<RawBusiness> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM businesses ORDER BY bus_id",
          RawBusiness::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawBusiness::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(call_error)?;
    raws.into_iter().map(RawBusiness::into_business).collect()
  }

  async fn update_business(
    &self,
    bus_id: &str,
    changes: BusinessUpdate,
    staff_id: Uuid,
    reason: Option<String>,
  ) -> Result<Business> {
    let now = Utc::now();
    let bus_id = bus_id.to_owned();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        require_staff(&tx, staff_id)?;
        let raw: Option<RawBusiness> = tx
          .query_row(
            &format!(
              "SELECT {} FROM businesses WHERE bus_id = ?1",
              RawBusiness::COLUMNS
            ),
            rusqlite::params![bus_id],
            RawBusiness::from_row,
          )
          .optional()?;
        let current = raw
          .ok_or_else(|| domain(Error::BusinessNotFound(bus_id.clone())))?
          .into_business()
          .map_err(domain)?;

        append_business_history(&tx, &current, staff_id, reason.as_deref(), now)?;
        let updated = changes.apply(&current);
        tx.execute(
          "UPDATE businesses SET name = ?2, nature = ?3, status = ?4 WHERE bus_id = ?1",
          rusqlite::params![
            bus_id,
            updated.name,
            updated.nature,
            encode_business_status(updated.status),
          ],
        )?;
        enqueue_sync(&tx, SyncOp::Update, "business", &bus_id, &updated, now)?;
        tx.commit()?;
        Ok(updated)
      })
      .await
      .map_err(call_error)
  }

  async fn business_history(&self, bus_id: &str) -> Result<Vec<BusinessHistory>> {
    let bus_id = bus_id.to_owned();
    let raws: Vec<RawHistory> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT bus_id, history_id, staff_id, reason, snapshot_json, recorded_at
           FROM business_history WHERE bus_id = ?1 ORDER BY history_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![bus_id], RawHistory::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(call_error)?;
    raws.into_iter().map(RawHistory::into_business_history).collect()
  }

  async fn business_files(&self, bus_id: &str) -> Result<Vec<BusinessFile>> {
    let bus_id = bus_id.to_owned();
    let raws: Vec<RawBusinessFile> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT file_id, bus_id, name, media_type, url
           FROM business_files WHERE bus_id = ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![bus_id], RawBusinessFile::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(call_error)?;
    raws.into_iter().map(RawBusinessFile::into_file).collect()
  }

  // ── Staged requests ───────────────────────────────────────────────────────

  async fn submit_request(&self, input: NewRequest) -> Result<RequestRegistration> {
    let now = Utc::now();
    let request = RequestRegistration {
      request_id:   Uuid::new_v4(),
      payload:      input.payload,
      compositions: input.compositions,
      created_at:   now,
    };
    let payload_json = serde_json::to_string(&request.payload)?;
    let row = request.clone();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO requests (request_id, payload_json, created_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![
            encode_uuid(row.request_id),
            payload_json,
            encode_dt(row.created_at),
          ],
        )?;
        for composition in &row.compositions {
          require_resident(&tx, &composition.rp_id)?;
          tx.execute(
            "INSERT INTO request_compositions (request_id, rp_id, role)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![
              encode_uuid(row.request_id),
              composition.rp_id,
              encode_family_role(composition.role),
            ],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await
      .map_err(call_error)?;
    Ok(request)
  }

  async fn list_requests(&self) -> Result<Vec<RequestRegistration>> {
    let raws: Vec<RawRequest> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT request_id, payload_json, created_at FROM requests
           ORDER BY created_at",
        )?;
        let heads = stmt
          .query_map([], |row| {
            Ok((
              row.get::<_, String>(0)?,
              row.get::<_, String>(1)?,
              row.get::<_, String>(2)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut comp_stmt = conn.prepare(
          "SELECT rp_id, role FROM request_compositions WHERE request_id = ?1",
        )?;
        let mut raws = Vec::with_capacity(heads.len());
        for (request_id, payload_json, created_at) in heads {
          let compositions = comp_stmt
            .query_map(rusqlite::params![request_id], |row| {
              Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          raws.push(RawRequest { request_id, payload_json, created_at, compositions });
        }
        Ok(raws)
      })
      .await
      .map_err(call_error)?;
    raws.into_iter().map(RawRequest::into_request).collect()
  }

  async fn approve_request(&self, id: Uuid) -> Result<RegistrationOutcome> {
    let now = Utc::now();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let payload_json: Option<String> = tx
          .query_row(
            "SELECT payload_json FROM requests WHERE request_id = ?1",
            rusqlite::params![encode_uuid(id)],
            |row| row.get(0),
          )
          .optional()?;
        let payload_json =
          payload_json.ok_or_else(|| domain(Error::RequestNotFound(id)))?;
        let payload: RegistrationRequest = serde_json::from_str(&payload_json)
          .map_err(|e| domain(Error::Serialization(e)))?;

        let outcome = run_registration(&tx, &payload, now)?;
        tx.execute(
          "DELETE FROM requests WHERE request_id = ?1",
          rusqlite::params![encode_uuid(id)],
        )?;
        tx.commit()?;
        Ok(outcome)
      })
      .await
      .map_err(call_error)
  }

  async fn delete_request(&self, id: Uuid) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let deleted = conn.execute(
          "DELETE FROM requests WHERE request_id = ?1",
          rusqlite::params![encode_uuid(id)],
        )?;
        if deleted == 0 {
          return Err(domain(Error::RequestNotFound(id)));
        }
        Ok(())
      })
      .await
      .map_err(call_error)
  }

  async fn sweep_expired_requests(&self, cutoff: chrono::DateTime<Utc>) -> Result<u64> {
    self
      .conn
      .call(move |conn| {
        let deleted = conn.execute(
          "DELETE FROM requests WHERE created_at <= ?1",
          rusqlite::params![encode_dt(cutoff)],
        )?;
        Ok(deleted as u64)
      })
      .await
      .map_err(call_error)
  }

  // ── Medicines ─────────────────────────────────────────────────────────────

  async fn create_medicine(&self, input: NewMedicine) -> Result<Medicine> {
    let medicine = Medicine {
      medicine_id: Uuid::new_v4(),
      name:        input.name,
      unit:        input.unit,
      quantity:    input.quantity,
    };
    let row = medicine.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO medicines (medicine_id, name, unit, quantity)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![
            encode_uuid(row.medicine_id),
            row.name,
            row.unit,
            row.quantity,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(call_error)?;
    Ok(medicine)
  }

  async fn list_medicines(&self) -> Result<Vec<Medicine>> {
    let raws: Vec<RawMedicine> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT medicine_id, name, unit, quantity FROM medicines ORDER BY name",
        )?;
        let rows = stmt
          .query_map([], RawMedicine::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(call_error)?;
    raws.into_iter().map(RawMedicine::into_medicine).collect()
  }

  async fn dispense_medicine(&self, request: DispenseRequest) -> Result<Dispense> {
    let now = Utc::now();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        require_staff(&tx, request.staff_id)?;
        require_resident(&tx, &request.rp_id)?;

        let on_hand: Option<i64> = tx
          .query_row(
            "SELECT quantity FROM medicines WHERE medicine_id = ?1",
            rusqlite::params![encode_uuid(request.medicine_id)],
            |row| row.get(0),
          )
          .optional()?;
        let on_hand =
          on_hand.ok_or_else(|| domain(Error::MedicineNotFound(request.medicine_id)))?;
        if on_hand < request.quantity {
          return Err(domain(Error::InsufficientStock {
            medicine_id: request.medicine_id,
            on_hand,
            requested: request.quantity,
          }));
        }

        tx.execute(
          "UPDATE medicines SET quantity = quantity - ?2 WHERE medicine_id = ?1",
          rusqlite::params![encode_uuid(request.medicine_id), request.quantity],
        )?;
        let dispense = Dispense {
          dispense_id:  Uuid::new_v4(),
          medicine_id:  request.medicine_id,
          rp_id:        request.rp_id.clone(),
          staff_id:     request.staff_id,
          quantity:     request.quantity,
          dispensed_at: now,
        };
        tx.execute(
          "INSERT INTO dispenses (dispense_id, medicine_id, rp_id, staff_id,
             quantity, dispensed_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            encode_uuid(dispense.dispense_id),
            encode_uuid(dispense.medicine_id),
            dispense.rp_id,
            encode_uuid(dispense.staff_id),
            dispense.quantity,
            encode_dt(now),
          ],
        )?;
        tx.commit()?;
        Ok(dispense)
      })
      .await
      .map_err(call_error)
  }

  // ── Outbox ────────────────────────────────────────────────────────────────

  async fn pending_sync(&self, limit: usize) -> Result<Vec<SyncEnvelope>> {
    let limit = limit as i64;
    let raws: Vec<RawSyncEnvelope> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT sync_id, op, entity, entity_id, payload_json, created_at,
             attempts, last_error
           FROM sync_outbox WHERE delivered_at IS NULL
           ORDER BY sync_id LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit], RawSyncEnvelope::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(call_error)?;
    raws.into_iter().map(RawSyncEnvelope::into_envelope).collect()
  }

  async fn mark_delivered(&self, sync_id: i64) -> Result<()> {
    let now = Utc::now();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE sync_outbox SET delivered_at = ?2 WHERE sync_id = ?1",
          rusqlite::params![sync_id, encode_dt(now)],
        )?;
        Ok(())
      })
      .await
      .map_err(call_error)
  }

  async fn record_sync_failure(&self, sync_id: i64, error: &str) -> Result<()> {
    let error = error.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE sync_outbox SET attempts = attempts + 1, last_error = ?2
           WHERE sync_id = ?1",
          rusqlite::params![sync_id, error],
        )?;
        Ok(())
      })
      .await
      .map_err(call_error)
  }
}
