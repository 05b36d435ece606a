//! S3 reads and writes for uploaded candidate files.

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use tracing::info;

use crate::errors::AppError;

/// Writes a document to S3 under the given key.
pub async fn put_document(
    s3: &S3Client,
    bucket: &str,
    key: &str,
    bytes: Vec<u8>,
    content_type: &str,
) -> Result<(), AppError> {
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(bytes))
        .content_type(content_type)
        .send()
        .await
        .map_err(|e| AppError::S3(format!("Upload of '{key}' failed: {e}")))?;

    info!("Stored s3://{bucket}/{key}");
    Ok(())
}

/// Reads a document from S3 into memory.
pub async fn get_document(s3: &S3Client, bucket: &str, key: &str) -> Result<Vec<u8>, AppError> {
    let output = s3
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| AppError::S3(format!("Fetch of '{key}' failed: {e}")))?;

    let data = output
        .body
        .collect()
        .await
        .map_err(|e| AppError::S3(format!("Read of '{key}' failed: {e}")))?;

    Ok(data.into_bytes().to_vec())
}
