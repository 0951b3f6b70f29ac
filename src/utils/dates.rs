use chrono::NaiveDate;

const UNIX_EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(1970, 1, 1) {
    Some(d) => d,
    None => panic!("invalid epoch"),
};

const SAS_EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(1960, 1, 1) {
    Some(d) => d,
    None => panic!("invalid epoch"),
};

/// Arrow `Date32` representation of `date`.
pub fn days_since_unix_epoch(date: NaiveDate) -> i32 {
    (date - UNIX_EPOCH).num_days() as i32
}

/// Inverse of [`days_since_unix_epoch`].
pub fn date_from_unix_days(days: i32) -> Option<NaiveDate> {
    UNIX_EPOCH.checked_add_signed(chrono::Duration::try_days(days as i64)?)
}

/// Calendar date of an I94 day offset (days since 1960-01-01).
///
/// Only used for diagnostics; persisted datasets keep the raw offsets.
pub fn sas_offset_to_date(offset: i64) -> Option<NaiveDate> {
    SAS_EPOCH.checked_add_signed(chrono::Duration::try_days(offset)?)
}
