//! Display-ID formatting and parsing.
//!
//! Every registry entity with a human-readable identifier uses one canonical
//! format, applied at every creation path. Sequence numbers are claimed from
//! the store's counter table, never derived from row counts; this module only
//! turns `(date, sequence)` into a string and back.
//!
//! Zero-padded sequences make IDs generated on the same day sort
//! lexicographically in creation order.

use chrono::NaiveDate;

use crate::{Error, Result, household::OccupancyType};

/// The entity scopes with their own sequence counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
  Resident,
  Household,
  Family,
  Business,
  Respondent,
}

impl SequenceKind {
  /// Key used in the store's `id_sequences` counter table.
  pub fn key(self) -> &'static str {
    match self {
      Self::Resident => "resident",
      Self::Household => "household",
      Self::Family => "family",
      Self::Business => "business",
      Self::Respondent => "respondent",
    }
  }
}

fn date_part(date: NaiveDate) -> String { date.format("%y%m%d").to_string() }

fn month_part(date: NaiveDate) -> String { date.format("%y%m").to_string() }

fn parse_date_part(s: &str, original: &str) -> Result<NaiveDate> {
  if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
    return Err(Error::InvalidDisplayId(original.to_owned()));
  }
  let yy: i32 = s[0..2].parse().map_err(|_| Error::InvalidDisplayId(original.to_owned()))?;
  let mm: u32 = s[2..4].parse().map_err(|_| Error::InvalidDisplayId(original.to_owned()))?;
  let dd: u32 = s[4..6].parse().map_err(|_| Error::InvalidDisplayId(original.to_owned()))?;
  NaiveDate::from_ymd_opt(2000 + yy, mm, dd)
    .ok_or_else(|| Error::InvalidDisplayId(original.to_owned()))
}

fn parse_seq(s: &str, original: &str) -> Result<u64> {
  if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
    return Err(Error::InvalidDisplayId(original.to_owned()));
  }
  s.parse().map_err(|_| Error::InvalidDisplayId(original.to_owned()))
}

// ─── Resident ────────────────────────────────────────────────────────────────

/// `{YY}{MM}{DD}{seq:05}`, e.g. `26080400007`.
pub fn resident_id(date: NaiveDate, seq: u64) -> String {
  format!("{}{seq:05}", date_part(date))
}

pub fn parse_resident_id(id: &str) -> Result<(NaiveDate, u64)> {
  if id.len() < 7 {
    return Err(Error::InvalidDisplayId(id.to_owned()));
  }
  let date = parse_date_part(&id[..6], id)?;
  let seq = parse_seq(&id[6..], id)?;
  Ok((date, seq))
}

// ─── Household ───────────────────────────────────────────────────────────────

/// `HH-{YY}{MM}-{seq:05}`, e.g. `HH-2608-00007`.
pub fn household_id(date: NaiveDate, seq: u64) -> String {
  format!("HH-{}-{seq:05}", month_part(date))
}

/// Recovers the year/month (day is not encoded) and sequence.
pub fn parse_household_id(id: &str) -> Result<(i32, u32, u64)> {
  let rest = id
    .strip_prefix("HH-")
    .ok_or_else(|| Error::InvalidDisplayId(id.to_owned()))?;
  let (ym, seq) = rest
    .split_once('-')
    .ok_or_else(|| Error::InvalidDisplayId(id.to_owned()))?;
  if ym.len() != 4 || !ym.bytes().all(|b| b.is_ascii_digit()) {
    return Err(Error::InvalidDisplayId(id.to_owned()));
  }
  let yy: i32 = ym[..2].parse().map_err(|_| Error::InvalidDisplayId(id.to_owned()))?;
  let mm: u32 = ym[2..].parse().map_err(|_| Error::InvalidDisplayId(id.to_owned()))?;
  if mm == 0 || mm > 12 {
    return Err(Error::InvalidDisplayId(id.to_owned()));
  }
  Ok((2000 + yy, mm, parse_seq(seq, id)?))
}

// ─── Family ──────────────────────────────────────────────────────────────────

/// `{YY}{MM}{DD}{seq:04}-{O|R|S}`, e.g. `2608040007-O`.
pub fn family_id(date: NaiveDate, seq: u64, occupancy: OccupancyType) -> String {
  format!("{}{seq:04}-{}", date_part(date), occupancy.code())
}

pub fn parse_family_id(id: &str) -> Result<(NaiveDate, u64, OccupancyType)> {
  let (body, code) = id
    .rsplit_once('-')
    .ok_or_else(|| Error::InvalidDisplayId(id.to_owned()))?;
  if body.len() < 7 {
    return Err(Error::InvalidDisplayId(id.to_owned()));
  }
  let date = parse_date_part(&body[..6], id)?;
  let seq = parse_seq(&body[6..], id)?;
  let mut chars = code.chars();
  let occupancy = match (chars.next(), chars.next()) {
    (Some(c), None) => OccupancyType::from_code(c)
      .ok_or_else(|| Error::InvalidDisplayId(id.to_owned()))?,
    _ => return Err(Error::InvalidDisplayId(id.to_owned())),
  };
  Ok((date, seq, occupancy))
}

// ─── Business ────────────────────────────────────────────────────────────────

/// `BUS-{YY}{MM}-{seq:05}`, e.g. `BUS-2608-00007`.
pub fn business_id(date: NaiveDate, seq: u64) -> String {
  format!("BUS-{}-{seq:05}", month_part(date))
}

pub fn parse_business_id(id: &str) -> Result<(i32, u32, u64)> {
  let rest = id
    .strip_prefix("BUS-")
    .ok_or_else(|| Error::InvalidDisplayId(id.to_owned()))?;
  parse_household_id(&format!("HH-{rest}")).map_err(|_| Error::InvalidDisplayId(id.to_owned()))
}

// ─── Business respondent ─────────────────────────────────────────────────────

/// `BR-{YY}{MM}{DD}-{seq:05}`, e.g. `BR-260804-00007`.
pub fn respondent_id(date: NaiveDate, seq: u64) -> String {
  format!("BR-{}-{seq:05}", date_part(date))
}

pub fn parse_respondent_id(id: &str) -> Result<(NaiveDate, u64)> {
  let rest = id
    .strip_prefix("BR-")
    .ok_or_else(|| Error::InvalidDisplayId(id.to_owned()))?;
  let (ymd, seq) = rest
    .split_once('-')
    .ok_or_else(|| Error::InvalidDisplayId(id.to_owned()))?;
  Ok((parse_date_part(ymd, id)?, parse_seq(seq, id)?))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn day() -> NaiveDate { NaiveDate::from_ymd_opt(2026, 8, 4).unwrap() }

  #[test]
  fn resident_id_roundtrip() {
    let id = resident_id(day(), 7);
    assert_eq!(id, "26080400007");
    assert_eq!(parse_resident_id(&id).unwrap(), (day(), 7));
  }

  #[test]
  fn resident_ids_sort_within_a_day() {
    let ids: Vec<String> = (1..=120).map(|n| resident_id(day(), n)).collect();
    for pair in ids.windows(2) {
      assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
    }
  }

  #[test]
  fn resident_id_wide_sequence_still_parses() {
    // Past 99999 the sequence simply grows beyond the padding.
    let id = resident_id(day(), 123_456);
    assert_eq!(id, "260804123456");
    assert_eq!(parse_resident_id(&id).unwrap(), (day(), 123_456));
  }

  #[test]
  fn household_id_roundtrip() {
    let id = household_id(day(), 42);
    assert_eq!(id, "HH-2608-00042");
    assert_eq!(parse_household_id(&id).unwrap(), (2026, 8, 42));
  }

  #[test]
  fn family_id_roundtrip_all_occupancies() {
    for occ in [OccupancyType::Owner, OccupancyType::Renter, OccupancyType::Sharer] {
      let id = family_id(day(), 7, occ);
      let (date, seq, parsed) = parse_family_id(&id).unwrap();
      assert_eq!((date, seq, parsed), (day(), 7, occ));
    }
  }

  #[test]
  fn family_owner_code_is_o() {
    assert!(family_id(day(), 1, OccupancyType::Owner).ends_with("-O"));
  }

  #[test]
  fn business_and_respondent_roundtrip() {
    let bus = business_id(day(), 3);
    assert_eq!(bus, "BUS-2608-00003");
    assert_eq!(parse_business_id(&bus).unwrap(), (2026, 8, 3));

    let br = respondent_id(day(), 9);
    assert_eq!(br, "BR-260804-00009");
    assert_eq!(parse_respondent_id(&br).unwrap(), (day(), 9));
  }

  #[test]
  fn malformed_ids_are_rejected() {
    assert!(parse_resident_id("garbage").is_err());
    assert!(parse_resident_id("26130100001").is_err()); // month 13
    assert!(parse_household_id("HH-260800042").is_err());
    assert!(parse_family_id("2608040007-X").is_err());
    assert!(parse_family_id("2608040007").is_err());
    assert!(parse_business_id("BR-2608-00003").is_err());
  }

  #[test]
  fn sequence_kind_keys_are_distinct() {
    let keys = [
      SequenceKind::Resident,
      SequenceKind::Household,
      SequenceKind::Family,
      SequenceKind::Business,
      SequenceKind::Respondent,
    ]
    .map(SequenceKind::key);
    for (i, a) in keys.iter().enumerate() {
      for b in &keys[i + 1..] {
        assert_ne!(a, b);
      }
    }
  }
}
