//! Integration tests for `SqliteStore` against an in-memory database.

use balangay_core::{
  Error,
  business::{BusinessOwner, BusinessStatus, BusinessUpdate, NewBusiness, NewBusinessOwner, NewRespondent},
  household::{FamilyRole, OccupancyType},
  ids,
  medicine::{DispenseRequest, NewMedicine},
  person::{CivilStatus, NewPerson, PersonUpdate, Sex},
  registration::{
    HouseholdRef, JoinFamily, LivingSolo, NewAccount, NewHouse, NewRequest,
    PersonRef, RegistrationRequest, RequestComposition,
  },
  staff::{Assignment, NewStaff, StaffRole},
  store::{RegistryStore, ResidentQuery},
};
use chrono::{Datelike as _, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory().await.expect("in-memory store")
}

async fn profiling_staff(s: &SqliteStore) -> Uuid {
  s.create_staff(NewStaff {
    name:       "Ana Reyes".into(),
    role:       StaffRole::Staff,
    assignment: Assignment::Profiling,
    rp_id:      None,
  })
  .await
  .unwrap()
  .staff_id
}

fn new_person(first: &str, last: &str) -> NewPerson {
  NewPerson {
    first_name:   first.into(),
    middle_name:  None,
    last_name:    last.into(),
    suffix:       None,
    birth_date:   NaiveDate::from_ymd_opt(1990, 5, 14).unwrap(),
    sex:          Sex::Female,
    civil_status: CivilStatus::Single,
    contact_no:   Some("09171234567".into()),
    email:        None,
    addresses:    Vec::new(),
  }
}

fn solo_registration(staff_id: Uuid, first: &str, last: &str) -> RegistrationRequest {
  RegistrationRequest {
    person:      PersonRef::New(new_person(first, last)),
    account:     None,
    houses:      vec![NewHouse { location: "Mahogany - Purok 3".into() }],
    living_solo: Some(LivingSolo {
      household: HouseholdRef::Created { index: 0 },
      occupancy: OccupancyType::Owner,
    }),
    join_family: None,
    business:    None,
    staff_id,
  }
}

// ─── Display-id sequencing ───────────────────────────────────────────────────

#[tokio::test]
async fn sequential_resident_ids_are_distinct_and_ordered() {
  let s = store().await;
  let staff = profiling_staff(&s).await;

  let mut rp_ids = Vec::new();
  for n in 0..8 {
    let outcome = s
      .register(solo_registration(staff, &format!("Resident{n}"), "Cruz"))
      .await
      .unwrap();
    rp_ids.push(outcome.resident.rp_id);
  }

  for (n, rp_id) in rp_ids.iter().enumerate() {
    let (_, seq) = ids::parse_resident_id(rp_id).unwrap();
    assert_eq!(seq, n as u64 + 1);
  }
  // Same-day IDs sort lexicographically in creation order.
  for pair in rp_ids.windows(2) {
    assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
  }
  // All distinct.
  let mut unique = rp_ids.clone();
  unique.sort();
  unique.dedup();
  assert_eq!(unique.len(), rp_ids.len());
}

#[tokio::test]
async fn generated_ids_roundtrip_their_date_and_sequence() {
  let s = store().await;
  let staff = profiling_staff(&s).await;
  let outcome = s.register(solo_registration(staff, "Lina", "Ramos")).await.unwrap();

  let today = outcome.resident.registered_at.date_naive();
  let (date, seq) = ids::parse_resident_id(&outcome.resident.rp_id).unwrap();
  assert_eq!(date, today);
  assert_eq!(seq, 1);

  let fam = outcome.family.unwrap();
  let (fam_date, fam_seq, occupancy) = ids::parse_family_id(&fam.fam_id).unwrap();
  assert_eq!(fam_date, today);
  assert_eq!(fam_seq, 1);
  assert_eq!(occupancy, OccupancyType::Owner);

  let (yy, mm, hh_seq) = ids::parse_household_id(&outcome.households[0].hh_id).unwrap();
  assert_eq!((yy, mm), (today.year(), today.month()));
  assert_eq!(hh_seq, 1);
}

#[tokio::test]
async fn owner_family_id_ends_with_o() {
  let s = store().await;
  let staff = profiling_staff(&s).await;
  let outcome = s.register(solo_registration(staff, "Pia", "Lim")).await.unwrap();
  assert!(outcome.family.unwrap().fam_id.ends_with("-O"));
}

// ─── Cascading registration ──────────────────────────────────────────────────

#[tokio::test]
async fn full_registration_creates_every_entity() {
  let s = store().await;
  let staff = profiling_staff(&s).await;

  let mut request = solo_registration(staff, "Jose", "Garcia");
  request.account = Some(NewAccount {
    username:    "jose.garcia".into(),
    secret_hash: "opaque".into(),
  });
  request.business = Some(balangay_core::registration::RegistrationBusiness {
    name:   "Garcia Sari-sari".into(),
    nature: "Retail".into(),
    files:  Vec::new(),
  });

  let outcome = s.register(request).await.unwrap();

  assert_eq!(outcome.households.len(), 1);
  let resident = s.get_resident(&outcome.resident.rp_id).await.unwrap().unwrap();
  assert_eq!(resident.person_id, outcome.person.person_id);

  let household = s.get_household(&outcome.households[0].hh_id).await.unwrap().unwrap();
  assert_eq!(household.owner_rp_id, resident.rp_id);

  let family = outcome.family.unwrap();
  let members = s.family_members(&family.fam_id).await.unwrap();
  assert_eq!(members.len(), 1);
  assert_eq!(members[0].role, FamilyRole::Independent);

  let business = outcome.business.unwrap();
  assert_eq!(business.status, BusinessStatus::Active);
  assert_eq!(
    business.owner,
    BusinessOwner::Resident { rp_id: resident.rp_id.clone() }
  );

  // The house location was split into a registered sitio plus street.
  let sitios = s.list_sitios().await.unwrap();
  assert_eq!(sitios.len(), 1);
  assert_eq!(sitios[0].name, "Mahogany");
}

#[tokio::test]
async fn failed_late_step_rolls_back_every_row() {
  let s = store().await;
  let staff = profiling_staff(&s).await;

  // Person, profile, and household are created in earlier steps; the
  // join-family lookup then fails and must unwind all of them.
  let request = RegistrationRequest {
    person:      PersonRef::New(new_person("Nilo", "Torres")),
    account:     None,
    houses:      vec![NewHouse { location: "Acacia - Purok 1".into() }],
    living_solo: None,
    join_family: Some(JoinFamily { fam_id: "9901010001-O".into(), role: FamilyRole::Father }),
    business:    None,
    staff_id:    staff,
  };

  let err = s.register(request).await.unwrap_err();
  assert!(matches!(err, Error::FamilyNotFound(_)));

  assert!(s.list_persons().await.unwrap().is_empty());
  assert!(s.list_households().await.unwrap().is_empty());
  assert!(
    s.search_residents(&ResidentQuery::default()).await.unwrap().is_empty()
  );
  // The outbox rows queued along the way rolled back too.
  assert!(s.pending_sync(100).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_staff_writes_nothing() {
  let s = store().await;
  let err = s
    .register(solo_registration(Uuid::new_v4(), "Tala", "Diaz"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::StaffNotFound(_)));
  assert!(s.list_persons().await.unwrap().is_empty());
}

#[tokio::test]
async fn bad_house_location_is_rejected_before_any_write() {
  let s = store().await;
  let staff = profiling_staff(&s).await;
  let mut request = solo_registration(staff, "Bea", "Uy");
  request.houses = vec![NewHouse { location: "no delimiter here".into() }];

  let err = s.register(request).await.unwrap_err();
  assert!(matches!(err, Error::InvalidHouseAddress(_)));
  assert!(s.list_persons().await.unwrap().is_empty());
}

#[tokio::test]
async fn house_index_out_of_range_is_rejected() {
  let s = store().await;
  let staff = profiling_staff(&s).await;
  let mut request = solo_registration(staff, "Caloy", "Reyes");
  request.living_solo = Some(LivingSolo {
    household: HouseholdRef::Created { index: 3 },
    occupancy: OccupancyType::Renter,
  });

  let err = s.register(request).await.unwrap_err();
  assert!(matches!(err, Error::HouseIndexOutOfRange { index: 3, created: 1 }));
}

#[tokio::test]
async fn same_address_tuple_is_stored_once() {
  let s = store().await;
  let staff = profiling_staff(&s).await;

  let first = s.register(solo_registration(staff, "Ely", "Santos")).await.unwrap();
  let second = s.register(solo_registration(staff, "Fe", "Santos")).await.unwrap();

  // Same sitio + street tuple resolves to the same address row.
  assert_eq!(
    first.households[0].address_id,
    second.households[0].address_id
  );
  assert_eq!(s.list_sitios().await.unwrap().len(), 1);
}

#[tokio::test]
async fn person_can_only_be_profiled_once() {
  let s = store().await;
  let staff = profiling_staff(&s).await;
  let outcome = s.register(solo_registration(staff, "Gina", "Chua")).await.unwrap();

  let request = RegistrationRequest {
    person:      PersonRef::Existing { person_id: outcome.person.person_id },
    account:     None,
    houses:      Vec::new(),
    living_solo: None,
    join_family: None,
    business:    None,
    staff_id:    staff,
  };
  let err = s.register(request).await.unwrap_err();
  assert!(matches!(err, Error::AlreadyProfiled { .. }));
}

#[tokio::test]
async fn duplicate_username_fails_the_whole_registration() {
  let s = store().await;
  let staff = profiling_staff(&s).await;

  let mut first = solo_registration(staff, "Hugo", "Tan");
  first.account = Some(NewAccount { username: "hugo".into(), secret_hash: "x".into() });
  s.register(first).await.unwrap();

  let mut second = solo_registration(staff, "Hugo", "Ong");
  second.account = Some(NewAccount { username: "hugo".into(), secret_hash: "y".into() });
  let err = s.register(second).await.unwrap_err();
  assert!(matches!(err, Error::UsernameTaken(_)));

  // Only the first registration's person remains.
  assert_eq!(s.list_persons().await.unwrap().len(), 1);
}

#[tokio::test]
async fn joining_family_records_supplied_role_and_notifies_members() {
  let s = store().await;
  let staff = profiling_staff(&s).await;
  let founder = s.register(solo_registration(staff, "Ines", "Velez")).await.unwrap();
  let fam_id = founder.family.unwrap().fam_id;

  let request = RegistrationRequest {
    person:      PersonRef::New(new_person("Karla", "Velez")),
    account:     None,
    houses:      Vec::new(),
    living_solo: None,
    join_family: Some(JoinFamily { fam_id: fam_id.clone(), role: FamilyRole::Dependent }),
    business:    None,
    staff_id:    staff,
  };
  let outcome = s.register(request).await.unwrap();

  let members = s.family_members(&fam_id).await.unwrap();
  assert_eq!(members.len(), 2);
  assert!(members.iter().any(|m| m.role == FamilyRole::Dependent));

  // The family draft addresses the existing member, not the newcomer.
  let family_draft = outcome
    .notifications
    .iter()
    .find(|d| d.kind == balangay_core::notify::NotificationKind::Family)
    .unwrap();
  assert!(family_draft.recipients.contains(&founder.resident.rp_id));
  assert!(!family_draft.recipients.contains(&outcome.resident.rp_id));
}

#[tokio::test]
async fn current_family_is_latest_composition() {
  let s = store().await;
  let staff = profiling_staff(&s).await;
  let first = s.register(solo_registration(staff, "Luz", "Abad")).await.unwrap();
  let second = s.register(solo_registration(staff, "Mira", "Abad")).await.unwrap();
  let second_fam = second.family.unwrap().fam_id;

  // Luz later joins Mira's family; that composition becomes current.
  s.join_family(&second_fam, &first.resident.rp_id, FamilyRole::Mother)
    .await
    .unwrap();

  let current = s.current_family(&first.resident.rp_id).await.unwrap().unwrap();
  assert_eq!(current.fam_id, second_fam);
}

// ─── History capture ─────────────────────────────────────────────────────────

#[tokio::test]
async fn person_updates_append_monotonic_history() {
  let s = store().await;
  let staff = profiling_staff(&s).await;
  let person = s.create_person(new_person("Nora", "Diaz"), staff).await.unwrap();

  s.update_person(
    person.person_id,
    PersonUpdate { first_name: Some("Norah".into()), ..Default::default() },
    staff,
    Some("spelling fix".into()),
  )
  .await
  .unwrap();
  s.update_person(
    person.person_id,
    PersonUpdate { first_name: Some("Noreen".into()), ..Default::default() },
    staff,
    None,
  )
  .await
  .unwrap();

  let history = s.person_history(person.person_id).await.unwrap();
  assert_eq!(history.len(), 2);
  assert_eq!(history[0].history_id, 1);
  assert_eq!(history[1].history_id, 2);

  // The original value is recoverable from the first snapshot.
  assert_eq!(history[0].snapshot.first_name, "Nora");
  assert_eq!(history[0].reason.as_deref(), Some("spelling fix"));
  assert_eq!(history[1].snapshot.first_name, "Norah");

  let current = s.get_person(person.person_id).await.unwrap().unwrap();
  assert_eq!(current.first_name, "Noreen");
}

#[tokio::test]
async fn business_updates_append_history() {
  let s = store().await;
  let staff = profiling_staff(&s).await;
  let business = s
    .create_business(
      NewBusiness {
        name:   "Torres Bakery".into(),
        nature: "Food".into(),
        owner:  NewBusinessOwner::External(NewRespondent {
          first_name: "Olga".into(),
          last_name:  "Torres".into(),
          contact_no: None,
        }),
        files:  Vec::new(),
      },
      staff,
    )
    .await
    .unwrap();

  s.update_business(
    &business.bus_id,
    BusinessUpdate { status: Some(BusinessStatus::Closed), ..Default::default() },
    staff,
    Some("ceased trading".into()),
  )
  .await
  .unwrap();

  let history = s.business_history(&business.bus_id).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].history_id, 1);
  assert_eq!(history[0].snapshot.status, BusinessStatus::Active);

  let current = s.get_business(&business.bus_id).await.unwrap().unwrap();
  assert_eq!(current.status, BusinessStatus::Closed);
}

#[tokio::test]
async fn address_links_carry_the_history_version() {
  let s = store().await;
  let staff = profiling_staff(&s).await;
  let mut input = new_person("Paz", "Rivera");
  input.addresses.push(balangay_core::address::NewAddress {
    province:       "Cebu".into(),
    city:           "Balamban".into(),
    barangay:       "Buanoy".into(),
    street:         "Purok 5".into(),
    sitio_id:       None,
    external_sitio: Some("Upper Creek".into()),
  });
  let person = s.create_person(input, staff).await.unwrap();

  // Linked at creation, so tagged with version 0.
  let links = s.address_links_at(person.person_id, 0).await.unwrap();
  assert_eq!(links.len(), 1);
  assert_eq!(links[0].history_id, 0);

  let addresses = s.person_addresses(person.person_id).await.unwrap();
  assert_eq!(addresses.len(), 1);
  assert_eq!(addresses[0].external_sitio.as_deref(), Some("Upper Creek"));
}

// ─── Staged requests and expiry ──────────────────────────────────────────────

async fn backdate_request(s: &SqliteStore, id: Uuid, by: Duration) {
  let id_str = id.hyphenated().to_string();
  s.conn
    .call(move |conn| {
      let created: String = conn.query_row(
        "SELECT created_at FROM requests WHERE request_id = ?1",
        rusqlite::params![id_str],
        |row| row.get(0),
      )?;
      let shifted = chrono::DateTime::parse_from_rfc3339(&created).unwrap()
        .with_timezone(&Utc)
        - by;
      conn.execute(
        "UPDATE requests SET created_at = ?2 WHERE request_id = ?1",
        rusqlite::params![id_str, shifted.to_rfc3339()],
      )?;
      Ok(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn sweep_deletes_only_requests_past_thirty_days() {
  let s = store().await;
  let staff = profiling_staff(&s).await;

  let stale = s
    .submit_request(NewRequest {
      payload:      solo_registration(staff, "Queenie", "Sy"),
      compositions: Vec::new(),
    })
    .await
    .unwrap();
  let fresh = s
    .submit_request(NewRequest {
      payload:      solo_registration(staff, "Ruth", "Sy"),
      compositions: Vec::new(),
    })
    .await
    .unwrap();

  // One request is 30 days 10 minutes old, the other 29 days.
  backdate_request(&s, stale.request_id, Duration::days(30) + Duration::minutes(10)).await;
  backdate_request(&s, fresh.request_id, Duration::days(29)).await;

  let removed = s
    .sweep_expired_requests(Utc::now() - Duration::days(30))
    .await
    .unwrap();
  assert_eq!(removed, 1);

  let remaining = s.list_requests().await.unwrap();
  assert_eq!(remaining.len(), 1);
  assert_eq!(remaining[0].request_id, fresh.request_id);
}

#[tokio::test]
async fn approving_a_request_replays_it_and_clears_the_staging_row() {
  let s = store().await;
  let staff = profiling_staff(&s).await;

  let request = s
    .submit_request(NewRequest {
      payload:      solo_registration(staff, "Sol", "Ramos"),
      compositions: Vec::new(),
    })
    .await
    .unwrap();

  let outcome = s.approve_request(request.request_id).await.unwrap();
  assert_eq!(outcome.person.first_name, "Sol");
  assert!(s.get_resident(&outcome.resident.rp_id).await.unwrap().is_some());
  assert!(s.list_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn request_compositions_require_known_residents() {
  let s = store().await;
  let staff = profiling_staff(&s).await;

  let err = s
    .submit_request(NewRequest {
      payload:      solo_registration(staff, "Tess", "Go"),
      compositions: vec![RequestComposition {
        rp_id: "26010100001".into(),
        role:  FamilyRole::Mother,
      }],
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ResidentNotFound(_)));
  assert!(s.list_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_a_missing_request_is_not_found() {
  let s = store().await;
  let err = s.delete_request(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::RequestNotFound(_)));
}

// ─── Medicines ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn dispensing_decrements_stock_and_records_the_handout() {
  let s = store().await;
  let staff = profiling_staff(&s).await;
  let resident = s
    .register(solo_registration(staff, "Vera", "Ong"))
    .await
    .unwrap()
    .resident;
  let medicine = s
    .create_medicine(NewMedicine {
      name:     "Paracetamol".into(),
      unit:     "tablet".into(),
      quantity: 20,
    })
    .await
    .unwrap();

  let dispense = s
    .dispense_medicine(DispenseRequest {
      medicine_id: medicine.medicine_id,
      rp_id:       resident.rp_id.clone(),
      staff_id:    staff,
      quantity:    8,
    })
    .await
    .unwrap();
  assert_eq!(dispense.quantity, 8);

  let medicines = s.list_medicines().await.unwrap();
  assert_eq!(medicines[0].quantity, 12);
}

#[tokio::test]
async fn dispensing_more_than_on_hand_fails_and_leaves_stock_alone() {
  let s = store().await;
  let staff = profiling_staff(&s).await;
  let resident = s
    .register(solo_registration(staff, "Wilma", "Paz"))
    .await
    .unwrap()
    .resident;
  let medicine = s
    .create_medicine(NewMedicine {
      name:     "Amoxicillin".into(),
      unit:     "capsule".into(),
      quantity: 5,
    })
    .await
    .unwrap();

  let err = s
    .dispense_medicine(DispenseRequest {
      medicine_id: medicine.medicine_id,
      rp_id:       resident.rp_id,
      staff_id:    staff,
      quantity:    6,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::InsufficientStock { on_hand: 5, requested: 6, .. }));

  assert_eq!(s.list_medicines().await.unwrap()[0].quantity, 5);
}

// ─── Outbox ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn registration_queues_one_envelope_per_created_entity() {
  let s = store().await;
  let staff = profiling_staff(&s).await;
  s.register(solo_registration(staff, "Yoly", "Cruz")).await.unwrap();

  let pending = s.pending_sync(100).await.unwrap();
  let entities: Vec<&str> = pending.iter().map(|e| e.entity.as_str()).collect();
  assert_eq!(
    entities,
    ["person", "resident", "sitio", "address", "household", "family"]
  );
}

#[tokio::test]
async fn delivered_envelopes_leave_the_pending_set() {
  let s = store().await;
  let staff = profiling_staff(&s).await;
  s.register(solo_registration(staff, "Zeny", "Lopez")).await.unwrap();

  let pending = s.pending_sync(1).await.unwrap();
  assert_eq!(pending.len(), 1);
  s.mark_delivered(pending[0].sync_id).await.unwrap();

  let rest = s.pending_sync(100).await.unwrap();
  assert!(rest.iter().all(|e| e.sync_id != pending[0].sync_id));
}

#[tokio::test]
async fn sync_failures_accumulate_attempts() {
  let s = store().await;
  let staff = profiling_staff(&s).await;
  s.register(solo_registration(staff, "Abe", "Santos")).await.unwrap();

  let pending = s.pending_sync(1).await.unwrap();
  s.record_sync_failure(pending[0].sync_id, "connection refused").await.unwrap();
  s.record_sync_failure(pending[0].sync_id, "HTTP 502").await.unwrap();

  let again = s.pending_sync(1).await.unwrap();
  assert_eq!(again[0].attempts, 2);
  assert_eq!(again[0].last_error.as_deref(), Some("HTTP 502"));
}

// ─── Search ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn search_residents_by_name_fragment() {
  let s = store().await;
  let staff = profiling_staff(&s).await;
  let maria = s.register(solo_registration(staff, "Maria", "Delgado")).await.unwrap();
  s.register(solo_registration(staff, "Pedro", "Ibanez")).await.unwrap();

  let results = s
    .search_residents(&ResidentQuery {
      text: Some("mar".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(results.len(), 1);
  assert_eq!(results[0].rp_id, maria.resident.rp_id);
}

#[tokio::test]
async fn search_residents_by_sitio() {
  let s = store().await;
  let staff = profiling_staff(&s).await;
  s.register(solo_registration(staff, "Carmen", "Flores")).await.unwrap();

  let mut elsewhere = solo_registration(staff, "Dario", "Flores");
  elsewhere.houses = vec![NewHouse { location: "Narra - Purok 9".into() }];
  s.register(elsewhere).await.unwrap();

  let sitios = s.list_sitios().await.unwrap();
  let narra = sitios.iter().find(|s| s.name == "Narra").unwrap();

  let results = s
    .search_residents(&ResidentQuery {
      sitio_id: Some(narra.sitio_id),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(results.len(), 1);
}
