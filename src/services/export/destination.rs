/*
 * Responsibility
 * - 出力先 (destination) が `s3://<bucket>/<key>` 形式かどうかの判定
 * - 正規化はしない。形式が合わなければそのまま拒否する
 */
use thiserror::Error;

pub const S3_SCHEME: &str = "s3://";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DestinationError {
    #[error("destination must start with {S3_SCHEME}")]
    MissingScheme,
    #[error("destination is missing a bucket")]
    MissingBucket,
    #[error("destination is missing an object key")]
    MissingKey,
}

/// A destination that has passed the format check. Borrows from the request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct S3Destination<'a> {
    pub bucket: &'a str,
    pub key: &'a str,
}

impl<'a> S3Destination<'a> {
    pub fn parse(raw: &'a str) -> Result<Self, DestinationError> {
        let rest = raw
            .strip_prefix(S3_SCHEME)
            .ok_or(DestinationError::MissingScheme)?;

        let (bucket, key) = rest.split_once('/').ok_or(DestinationError::MissingKey)?;
        if bucket.is_empty() {
            return Err(DestinationError::MissingBucket);
        }
        if key.is_empty() {
            return Err(DestinationError::MissingKey);
        }

        Ok(Self { bucket, key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bucket_and_key() {
        let dest = S3Destination::parse("s3://bucket/key").unwrap();
        assert_eq!(dest.bucket, "bucket");
        assert_eq!(dest.key, "key");

        let nested = S3Destination::parse("s3://exports/2024/01/out.parquet").unwrap();
        assert_eq!(nested.key, "2024/01/out.parquet");
    }

    #[test]
    fn rejects_missing_bucket() {
        assert_eq!(
            S3Destination::parse("s3:///key"),
            Err(DestinationError::MissingBucket)
        );
    }

    #[test]
    fn rejects_missing_or_empty_key() {
        assert_eq!(
            S3Destination::parse("s3://bucket"),
            Err(DestinationError::MissingKey)
        );
        assert_eq!(
            S3Destination::parse("s3://bucket/"),
            Err(DestinationError::MissingKey)
        );
    }

    #[test]
    fn rejects_other_schemes_without_normalizing() {
        for raw in ["", "bucket/key", "gs://bucket/key", "S3://bucket/key", " s3://bucket/key"] {
            assert!(S3Destination::parse(raw).is_err(), "{raw:?} should be rejected");
        }
    }
}
