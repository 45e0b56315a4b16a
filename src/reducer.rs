//! Result reducer: pair verdicts with their source records and keep the
//! accepted ones.

use crate::types::{AcceptedRecord, SourceRecord, Verdict};
use crate::{Error, Result};

/// Zip `records` with `verdicts` by position and emit the accepted subset in
/// original order.
///
/// Unequal lengths are a contract violation and fail with
/// [`Error::LengthMismatch`] instead of truncating.
pub fn reduce<I>(records: I, verdicts: &[Verdict]) -> Result<Vec<AcceptedRecord>>
where
    I: IntoIterator<Item = SourceRecord>,
    I::IntoIter: ExactSizeIterator,
{
    let records = records.into_iter();
    if records.len() != verdicts.len() {
        return Err(Error::LengthMismatch {
            records: records.len(),
            verdicts: verdicts.len(),
        });
    }

    Ok(records
        .zip(verdicts)
        .filter(|(_, v)| v.accepted)
        .map(|(record, v)| AcceptedRecord::new(record, &v.raw_text))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VERDICT_FIELD;
    use serde_json::json;

    fn rec(id: u32) -> SourceRecord {
        json!({"id": id, "text": format!("post {id}")})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_keeps_accepted_in_order() {
        let records = vec![rec(0), rec(1), rec(2), rec(3)];
        let verdicts = vec![
            Verdict::new(true, "yes a"),
            Verdict::new(false, "no"),
            Verdict::missing(),
            Verdict::new(true, "yes d"),
        ];
        let out = reduce(records, &verdicts).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].fields()["id"], json!(0));
        assert_eq!(out[0].fields()[VERDICT_FIELD], json!("yes a"));
        assert_eq!(out[1].fields()["id"], json!(3));
    }

    #[test]
    fn test_length_mismatch_is_fatal() {
        let err = reduce(vec![rec(0), rec(1)], &[Verdict::new(true, "yes")]).unwrap_err();
        assert!(matches!(
            err,
            Error::LengthMismatch {
                records: 2,
                verdicts: 1
            }
        ));
    }

    #[test]
    fn test_empty_inputs() {
        assert!(reduce(Vec::new(), &[]).unwrap().is_empty());
    }
}
