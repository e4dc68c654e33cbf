//! Running total of study time.

use studylog_core::remote_store::Record;

/// Sum of `time` across `records`; 0 for no records
///
/// ```
/// use studylog::aggregate::total;
/// use studylog_core::remote_store::{Record, RecordId};
///
/// let records = [
///     Record::new(RecordId::new(2), "History", 1.5),
///     Record::new(RecordId::new(1), "Algebra", 2.0),
/// ];
/// assert!((total(&records) - 3.5).abs() < f64::EPSILON);
/// assert_eq!(total(&[]), 0.0);
/// ```
pub fn total<'a>(records: impl IntoIterator<Item = &'a Record>) -> f64 {
    records.into_iter().fold(0.0, |sum, record| sum + record.time)
}
