use anyhow::{Context, Result};
use aws_sdk_s3::primitives::ByteStream;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::io::Write;
use tracing::info;

/// Builds an S3 client from the ambient AWS configuration.
///
/// When `endpoint` is set (e.g. a Cloudflare R2 account endpoint) requests are
/// sent there with path-style addressing instead of to AWS.
pub async fn s3_client(endpoint: Option<&str>) -> aws_sdk_s3::Client {
    let config = aws_config::load_from_env().await;

    match endpoint {
        Some(endpoint) => {
            let s3_config = aws_sdk_s3::config::Builder::from(&config)
                .endpoint_url(endpoint)
                .force_path_style(true)
                .build();
            aws_sdk_s3::Client::from_conf(s3_config)
        }
        None => aws_sdk_s3::Client::new(&config),
    }
}

/// Serializes `value` as JSON, gzip-compressing it when `gzip` is set.
///
/// Returns the body and the object key to store it under (`.gz` appended
/// when compressed).
pub fn encode_json(key: &str, value: &impl Serialize, gzip: bool) -> Result<(Vec<u8>, String)> {
    let body = serde_json::to_vec(value)?;

    if gzip {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&body)?;
        Ok((encoder.finish()?, format!("{key}.gz")))
    } else {
        Ok((body, key.to_string()))
    }
}

/// Uploads a value as JSON with `application/json` content type.
#[tracing::instrument(skip(client, value))]
pub async fn upload_json(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    value: &impl Serialize,
    gzip: bool,
) -> Result<String> {
    let (body, key) = encode_json(key, value, gzip)?;
    let size = body.len();

    let mut request = client
        .put_object()
        .bucket(bucket)
        .key(&key)
        .body(ByteStream::from(body))
        .content_type("application/json");
    if gzip {
        request = request.content_encoding("gzip");
    }

    request
        .send()
        .await
        .with_context(|| format!("failed to upload '{key}' to bucket '{bucket}'"))?;

    info!(key = %key, bytes = size, "Report uploaded");
    Ok(key)
}
